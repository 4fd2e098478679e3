//! 임포트 모듈 오류 타입.
//!
//! 파일 전체 수준의 오류만 여기에 해당합니다. 행 단위 데이터 오류는
//! [`crate::record::RowError`]로 수집되며 오류 타입으로 전파되지 않습니다.

use thiserror::Error;

/// 임포트 관련 오류.
#[derive(Debug, Error)]
pub enum ImportError {
    /// 지원하지 않는 파일 형식
    #[error("Unsupported file format: {0}. Only CSV and XLSX/XLS files are supported")]
    UnsupportedFormat(String),

    /// 파일 파싱 실패 (파일 전체가 읽을 수 없는 상태)
    #[error("Failed to parse file: {0}")]
    ParseError(String),

    /// 빈 파일 또는 헤더만 있는 파일
    #[error("File contains no data rows")]
    EmptyFile,

    /// 참조 데이터 조회 실패
    #[error("Reference lookup failed: {0}")]
    LookupError(String),

    /// 잡 저장소 오류
    #[error("Job store error: {0}")]
    JobStoreError(String),

    /// 존재하지 않는 잡
    #[error("Job not found: {0}")]
    JobNotFound(String),
}

/// 임포트 Result 타입 별칭.
pub type Result<T> = std::result::Result<T, ImportError>;
