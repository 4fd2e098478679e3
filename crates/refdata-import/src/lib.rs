//! 대량 임포트 엔진.
//!
//! CSV/XLSX 파일을 파싱하여 참조 데이터(주가, 환율, 재무지표 등)를
//! 배치 upsert하는 핵심 모듈입니다.
//!
//! # 처리 흐름
//!
//! 1. [`parser`]가 파일 바이트를 행 단위로 읽어 정규화된 레코드 생성
//!    ([`columns`]로 헤더 정규화, [`coerce`]로 숫자/날짜 변환)
//! 2. [`validate`]가 참조 엔티티(종목 코드, 통화 코드) 존재 여부를 일괄 확인
//! 3. [`engine`]이 유효 레코드를 배치 단위로 upsert
//! 4. 대용량 입력은 [`ledger`]에 잡을 등록하고 백그라운드에서 처리,
//!    호출자는 잡 ID로 상태를 폴링
//!
//! 행 단위 오류(필드 누락, 잘못된 숫자/날짜, 미등록 코드)는 예외가 아니라
//! [`record::RowError`]로 수집되며, 한 행의 실패가 파일 전체를 중단시키지
//! 않습니다. 파일 자체를 읽을 수 없는 경우에만 [`error::ImportError`]를
//! 반환합니다.

pub mod columns;
pub mod coerce;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod parser;
pub mod record;
pub mod validate;

pub use engine::{BatchImporter, ImportStrategy, UpsertOutcome};
pub use error::{ImportError, Result};
pub use ledger::{FileJobStore, ImportJob, JobLedger, JobStatus, JobStore};
pub use parser::{FileFormat, ParsedFile};
pub use record::{
    BatchResult, CellValue, CurrencyRecord, MetricRecord, ParsedRow, PriceRecord, ProfileRecord,
    RawRow, RowError, SelectedStockRecord,
};
pub use validate::ReferenceLookup;
