//! 임포트 레코드 타입.
//!
//! 파일에서 읽은 원시 셀 값부터 정규화된 도메인 레코드까지,
//! 임포트 파이프라인을 흐르는 데이터 형태를 정의합니다.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 파일에서 읽은 셀 값.
///
/// CSV는 모든 셀이 텍스트로, XLSX는 숫자 셀이 네이티브 숫자로 도착합니다.
/// 두 경로가 이 타입으로 수렴한 뒤 [`crate::coerce`]에서 동일하게 처리됩니다.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// 텍스트 셀
    Text(String),
    /// 숫자 셀 (XLSX 네이티브 숫자, 날짜 시리얼 포함)
    Number(f64),
    /// 불리언 셀
    Bool(bool),
}

impl CellValue {
    /// 텍스트 값 참조를 반환합니다.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// 헤더 정규화가 끝난 원시 행.
///
/// 빈 셀은 필드 맵에 들어가지 않으므로 `fields.get(..)` 부재가
/// 곧 "값 없음"입니다.
#[derive(Debug, Clone)]
pub struct RawRow {
    /// 1-based 소스 행 번호 (헤더를 1행으로 계산, 첫 데이터 행은 2)
    pub row: usize,
    /// 정규화된 컬럼명 → 셀 값
    pub fields: HashMap<String, CellValue>,
}

impl RawRow {
    /// 필드 값을 조회합니다.
    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.fields.get(key)
    }
}

/// 행 단위 오류.
///
/// 수집될 뿐 던져지지 않습니다. 행 하나의 실패는 배치를 중단시키지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowError {
    /// 1-based 소스 행 번호 (헤더 포함)
    pub row: usize,
    /// 사람이 읽을 수 있는 실패 사유
    pub reason: String,
}

impl RowError {
    pub fn new(row: usize, reason: impl Into<String>) -> Self {
        Self {
            row,
            reason: reason.into(),
        }
    }
}

/// 파싱/검증 단계의 행 결과.
///
/// 행은 완전히 유효하거나 정확히 하나의 종결 오류를 갖습니다.
/// 다운스트림 단계는 undefined 필드를 더듬는 대신 이 열거형을 매칭합니다.
#[derive(Debug, Clone)]
pub enum ParsedRow<T> {
    /// 모든 필수 필드가 존재하고 변환 가능하며 참조가 해소된 행
    Valid {
        /// 1-based 소스 행 번호
        row: usize,
        /// 정규화된 도메인 레코드
        record: T,
    },
    /// 종결 오류를 가진 행
    Invalid(RowError),
}

impl<T> ParsedRow<T> {
    /// 유효 행이면 레코드 참조를 반환합니다.
    pub fn as_valid(&self) -> Option<&T> {
        match self {
            ParsedRow::Valid { record, .. } => Some(record),
            ParsedRow::Invalid(_) => None,
        }
    }

    /// 유효 행 여부.
    pub fn is_valid(&self) -> bool {
        matches!(self, ParsedRow::Valid { .. })
    }
}

/// 유효 행과 오류를 분리합니다.
pub fn split_rows<T>(rows: Vec<ParsedRow<T>>) -> (Vec<T>, Vec<RowError>) {
    let mut records = Vec::new();
    let mut errors = Vec::new();
    for row in rows {
        match row {
            ParsedRow::Valid { record, .. } => records.push(record),
            ParsedRow::Invalid(e) => errors.push(e),
        }
    }
    (records, errors)
}

/// 임포트 집계 결과.
///
/// 동기 임포트 응답과 잡 종결 상태가 같은 형태를 공유합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    /// 새로 생성된 레코드 수
    pub created: usize,
    /// 기존 키를 덮어쓴 레코드 수
    pub updated: usize,
    /// 중복 등으로 건너뛴 레코드 수
    pub skipped: usize,
    /// 행 단위 오류 목록
    pub errors: Vec<RowError>,
}

impl BatchResult {
    /// 처리된 총 레코드 수 (오류 포함).
    pub fn total_processed(&self) -> usize {
        self.created + self.updated + self.skipped + self.errors.len()
    }

    /// 다른 결과를 이 결과에 병합합니다.
    pub fn merge(&mut self, other: BatchResult) {
        self.created += other.created;
        self.updated += other.updated;
        self.skipped += other.skipped;
        self.errors.extend(other.errors);
    }
}

// ==================== 정규화된 도메인 레코드 ====================

/// 가격 레코드 (주가/환율 공용).
///
/// 소스 파일 형식과 무관하게 동일한 형태로 정규화됩니다.
/// `code`는 주가 파일에서는 종목 심볼, 환율 파일에서는 통화 코드입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRecord {
    /// 엔티티 코드 (종목 심볼 또는 통화 코드)
    pub code: String,
    /// 거래일
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    /// 거래량 (환율 파일에는 보통 없음)
    pub volume: Option<i64>,
    /// 보조 지표
    pub trend_q: Option<Decimal>,
    pub fq: Option<Decimal>,
    pub band_down: Option<Decimal>,
    pub band_up: Option<Decimal>,
}

/// 재무지표 레코드.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricRecord {
    pub symbol: String,
    pub year: i32,
    /// 분기 (1-4, 없으면 연간 지표)
    pub quarter: Option<i32>,
    pub eps: Option<Decimal>,
    pub eps_industry: Option<Decimal>,
    pub pe: Option<Decimal>,
    pub pe_industry: Option<Decimal>,
    pub roa: Option<Decimal>,
    pub roe: Option<Decimal>,
    pub roa_industry: Option<Decimal>,
    pub roe_industry: Option<Decimal>,
    pub revenue: Option<Decimal>,
    pub margin: Option<Decimal>,
    pub total_debt_to_equity: Option<Decimal>,
    pub total_assets_to_equity: Option<Decimal>,
}

/// 통화 레코드 (통화 목록 임포트용).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyRecord {
    pub code: String,
    pub name: String,
}

/// 종목 프로필 레코드.
///
/// 심볼 단독이 자연 키입니다 — 프로필은 종목당 한 건이고 날짜 축이
/// 없습니다. 심볼 외 모든 필드는 선택입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub symbol: String,
    pub price: Option<Decimal>,
    pub profit: Option<Decimal>,
    pub volume: Option<Decimal>,
    pub pe: Option<Decimal>,
    pub eps: Option<Decimal>,
    pub roa: Option<Decimal>,
    pub roe: Option<Decimal>,
}

/// 선정 종목 레코드 (대량 등록용).
///
/// (symbol, date)가 자연 키입니다. `return` 필드는 Rust 예약어라
/// `return_rate`로 이름을 바꾸고 직렬화 이름만 유지합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedStockRecord {
    pub symbol: String,
    pub date: NaiveDate,
    pub close: Option<Decimal>,
    #[serde(rename = "return")]
    pub return_rate: Option<Decimal>,
    pub q_index: Option<Decimal>,
    pub volume: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_rows() {
        let rows: Vec<ParsedRow<i32>> = vec![
            ParsedRow::Valid { row: 2, record: 10 },
            ParsedRow::Invalid(RowError::new(3, "Missing date field")),
            ParsedRow::Valid { row: 4, record: 20 },
        ];

        let (records, errors) = split_rows(rows);
        assert_eq!(records, vec![10, 20]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].row, 3);
    }

    #[test]
    fn test_batch_result_merge() {
        let mut a = BatchResult {
            created: 5,
            updated: 1,
            skipped: 0,
            errors: vec![RowError::new(2, "x")],
        };
        let b = BatchResult {
            created: 3,
            updated: 2,
            skipped: 1,
            errors: vec![RowError::new(7, "y")],
        };

        a.merge(b);
        assert_eq!(a.created, 8);
        assert_eq!(a.updated, 3);
        assert_eq!(a.skipped, 1);
        assert_eq!(a.errors.len(), 2);
        assert_eq!(a.total_processed(), 14);
    }
}
