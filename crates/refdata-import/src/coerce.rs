//! 필드 값 변환.
//!
//! 쉼표 소수점, 복수 날짜 형식, XLSX 날짜 시리얼 등 이질적인 입력을
//! 관대하게 처리합니다. 변환 실패는 `None`으로 표현되는 데이터이지
//! 제어 흐름이 아닙니다 — 호출자가 행 단위 오류로 수집합니다.

use chrono::{Duration, NaiveDate};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::record::CellValue;

/// 숫자 값으로 변환합니다.
///
/// 이미 숫자인 셀은 그대로 반환하고, 문자열은 쉼표를 마침표로 치환한 뒤
/// 파싱합니다. `"1234,56"`과 `"1234.56"`은 같은 값이 됩니다.
/// 천 단위 구분자가 섞인 필드(`"1.234,56"`)는 파싱되지 않습니다 —
/// 알려진 제한이며 조용히 "고치지" 않습니다.
pub fn coerce_decimal(value: &CellValue) -> Option<Decimal> {
    match value {
        CellValue::Number(n) => Decimal::from_f64(*n),
        CellValue::Text(s) => {
            let normalized = s.trim().replace(',', ".");
            normalized.parse::<Decimal>().ok()
        }
        CellValue::Bool(_) => None,
    }
}

/// 정수 값으로 변환합니다 (거래량 등).
///
/// 소수부가 붙은 표현(`"1200.0"`, XLSX 숫자 셀)도 절사하여 허용합니다.
pub fn coerce_i64(value: &CellValue) -> Option<i64> {
    match value {
        CellValue::Number(n) => {
            if n.is_finite() {
                Some(*n as i64)
            } else {
                None
            }
        }
        CellValue::Text(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.replace(',', ".").parse::<f64>().ok().map(|f| f as i64))
        }
        CellValue::Bool(_) => None,
    }
}

/// i32 값으로 변환합니다 (연도, 분기 등).
pub fn coerce_i32(value: &CellValue) -> Option<i32> {
    coerce_i64(value).and_then(|v| i32::try_from(v).ok())
}

/// 날짜 값으로 변환합니다.
///
/// 시도 순서:
/// - `/` 포함 문자열: 월/일/년 우선, 실패하면 일/월/년 폴백.
///   `"13/01/2024"`처럼 월 범위를 벗어나는 값이 폴백으로 해소됩니다.
/// - `-` 포함 문자열: ISO 형식 (`YYYY-MM-DD`)
/// - 숫자 셀: XLSX 날짜 시리얼 (1899-12-30 기준 경과 일수)
/// - 그 외: 소수의 일반 형식 시도
///
/// 모든 시도가 실패하면 `None` — 조용히 틀린 날짜를 만들지 않습니다.
pub fn coerce_date(value: &CellValue) -> Option<NaiveDate> {
    match value {
        CellValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.contains('/') {
                NaiveDate::parse_from_str(trimmed, "%m/%d/%Y")
                    .or_else(|_| NaiveDate::parse_from_str(trimmed, "%d/%m/%Y"))
                    .ok()
            } else if trimmed.contains('-') {
                NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()
            } else {
                // 구분자 없는 일반 형식
                NaiveDate::parse_from_str(trimmed, "%Y%m%d")
                    .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y.%m.%d"))
                    .ok()
            }
        }
        CellValue::Number(serial) => excel_serial_to_date(*serial),
        CellValue::Bool(_) => None,
    }
}

/// XLSX 날짜 시리얼을 날짜로 변환합니다.
///
/// Excel은 날짜를 1899-12-30 기준 경과 일수로 저장합니다
/// (1900년 윤년 버그 보정 포함).
fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > 2_958_465.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.trunc() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_comma_and_dot_decimals_are_equivalent() {
        assert_eq!(coerce_decimal(&text("1234,56")), Some(dec!(1234.56)));
        assert_eq!(coerce_decimal(&text("1234.56")), Some(dec!(1234.56)));
    }

    #[test]
    fn test_native_number_passes_through() {
        assert_eq!(coerce_decimal(&CellValue::Number(42.5)), Some(dec!(42.5)));
    }

    #[test]
    fn test_thousands_separator_is_a_documented_failure() {
        // "1.234,56" → "1.234.56" → 파싱 불가
        assert_eq!(coerce_decimal(&text("1.234,56")), None);
    }

    #[test]
    fn test_invalid_decimal() {
        assert_eq!(coerce_decimal(&text("abc")), None);
        assert_eq!(coerce_decimal(&text("")), None);
    }

    #[test]
    fn test_volume_coercion() {
        assert_eq!(coerce_i64(&text("12345")), Some(12345));
        assert_eq!(coerce_i64(&text("1200.0")), Some(1200));
        assert_eq!(coerce_i64(&CellValue::Number(98765.0)), Some(98765));
        assert_eq!(coerce_i64(&text("n/a")), None);
    }

    #[test]
    fn test_slash_date_month_day_first() {
        // 유효한 월/일 → 월/일/년으로 해석
        assert_eq!(
            coerce_date(&text("01/13/2024")),
            NaiveDate::from_ymd_opt(2024, 1, 13)
        );
    }

    #[test]
    fn test_slash_date_falls_back_to_day_month() {
        // 월 13은 범위 밖 → 일/월/년 폴백으로 같은 달력 날짜에 도달
        assert_eq!(
            coerce_date(&text("13/01/2024")),
            NaiveDate::from_ymd_opt(2024, 1, 13)
        );
    }

    #[test]
    fn test_iso_date() {
        assert_eq!(
            coerce_date(&text("2024-03-15")),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
    }

    #[test]
    fn test_excel_serial_date() {
        // 2024-01-02 = 시리얼 45293
        assert_eq!(
            coerce_date(&CellValue::Number(45293.0)),
            NaiveDate::from_ymd_opt(2024, 1, 2)
        );
    }

    #[test]
    fn test_unparseable_date_is_none() {
        assert_eq!(coerce_date(&text("not a date")), None);
        assert_eq!(coerce_date(&text("99/99/9999")), None);
    }

    proptest! {
        /// 소수점 표기와 쉼표 표기는 항상 같은 값으로 수렴한다.
        #[test]
        fn prop_comma_dot_equivalence(int in 0i64..1_000_000, frac in 0u32..100) {
            let dotted = format!("{}.{:02}", int, frac);
            let commaed = format!("{},{:02}", int, frac);
            prop_assert_eq!(
                coerce_decimal(&CellValue::Text(dotted)),
                coerce_decimal(&CellValue::Text(commaed))
            );
        }
    }
}
