//! 파일 파서.
//!
//! CSV/XLSX 바이트를 행 단위로 읽어 정규화된 레코드를 생성합니다.
//!
//! - CSV: 헤더 행의 쉼표/세미콜론 개수를 비교하여 구분자를 자동 감지합니다.
//!   세미콜론 구분 + 쉼표 소수점을 쓰는 로케일의 내보내기 파일을 처리하기
//!   위함입니다. 따옴표 필드와 들쭉날쭉한 컬럼 수를 허용합니다.
//! - XLSX: 첫 번째 시트를 행 단위로 읽습니다. 숫자 셀은 네이티브 숫자로,
//!   텍스트 셀은 문자열로 도착하지만 두 경로 모두 [`CellValue`]로 수렴하여
//!   동일한 정규화 출력을 만듭니다.
//!
//! 모든 행은 정확히 한 번 방문됩니다. 구조적 필수 필드가 없는 행은 1-based
//! 행 번호(헤더가 1행)와 누락 필드를 담은 [`RowError`]로 거부되고 다음 행
//! 처리가 계속됩니다 — 잘못된 행 하나가 파일을 중단시키지 않습니다.

use std::collections::HashMap;
use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use tracing::{debug, warn};

use crate::coerce::{coerce_date, coerce_decimal, coerce_i32, coerce_i64};
use crate::error::{ImportError, Result};
use crate::record::{
    CellValue, CurrencyRecord, MetricRecord, ParsedRow, PriceRecord, ProfileRecord, RawRow,
    RowError,
};
use crate::columns;

/// 지원 파일 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Xlsx,
}

impl FileFormat {
    /// 파일명 확장자로 형식을 판별합니다.
    ///
    /// 지원하지 않는 확장자는 파일 전체 오류입니다 — 부분 처리를 시도하지
    /// 않습니다.
    pub fn from_file_name(name: &str) -> Result<Self> {
        let ext = name
            .rsplit('.')
            .next()
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" => Ok(FileFormat::Csv),
            "xlsx" | "xls" => Ok(FileFormat::Xlsx),
            _ => Err(ImportError::UnsupportedFormat(name.to_string())),
        }
    }
}

/// 정규화까지 끝난 파일 파싱 결과의 원시 행 목록.
#[derive(Debug)]
pub struct ParsedFile {
    pub rows: Vec<RawRow>,
    /// csv 라이브러리 수준에서 읽지 못한 행들
    pub read_errors: Vec<RowError>,
}

/// CSV 구분자 자동 감지.
///
/// 헤더 행에서 세미콜론이 쉼표보다 많으면 `;`, 아니면 `,`.
pub fn detect_delimiter(content: &str) -> u8 {
    let header = content.lines().next().unwrap_or("");
    let commas = header.matches(',').count();
    let semicolons = header.matches(';').count();

    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

/// 파일 바이트를 정규화된 원시 행으로 파싱합니다.
///
/// `normalize`는 엔티티 계열별 컬럼 정규화 함수입니다. 빈 셀은 필드 맵에서
/// 제외되므로 이후 단계에서 "값 없음"으로 취급됩니다.
pub fn parse_rows(
    bytes: &[u8],
    format: FileFormat,
    normalize: fn(&str) -> String,
) -> Result<ParsedFile> {
    let parsed = match format {
        FileFormat::Csv => parse_csv(bytes, normalize)?,
        FileFormat::Xlsx => parse_xlsx(bytes, normalize)?,
    };

    if parsed.rows.is_empty() && parsed.read_errors.is_empty() {
        return Err(ImportError::EmptyFile);
    }

    debug!(
        rows = parsed.rows.len(),
        read_errors = parsed.read_errors.len(),
        "파일 파싱 완료"
    );

    Ok(parsed)
}

fn parse_csv(bytes: &[u8], normalize: fn(&str) -> String) -> Result<ParsedFile> {
    let content = String::from_utf8_lossy(bytes);
    let delimiter = detect_delimiter(&content);
    debug!(delimiter = %(delimiter as char), "CSV 구분자 자동 감지");

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ImportError::ParseError(e.to_string()))?
        .iter()
        .map(normalize)
        .collect();

    if headers.is_empty() {
        return Err(ImportError::EmptyFile);
    }

    let mut rows = Vec::new();
    let mut read_errors = Vec::new();

    for (index, result) in reader.records().enumerate() {
        // 헤더가 1행이므로 첫 데이터 행은 2행
        let row_number = index + 2;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                read_errors.push(RowError::new(
                    row_number,
                    format!("Unreadable row: {}", e),
                ));
                continue;
            }
        };

        let mut fields = HashMap::new();
        for (i, header) in headers.iter().enumerate() {
            if let Some(value) = record.get(i) {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    fields.insert(header.clone(), CellValue::Text(trimmed.to_string()));
                }
            }
        }

        if !fields.is_empty() {
            rows.push(RawRow {
                row: row_number,
                fields,
            });
        }
    }

    Ok(ParsedFile { rows, read_errors })
}

fn parse_xlsx(bytes: &[u8], normalize: fn(&str) -> String) -> Result<ParsedFile> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook = open_workbook_auto_from_rs(cursor)
        .map_err(|e| ImportError::ParseError(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ImportError::ParseError("Workbook has no sheets".to_string()))?
        .map_err(|e| ImportError::ParseError(e.to_string()))?;

    let mut row_iter = range.rows();
    let headers: Vec<String> = match row_iter.next() {
        Some(header_row) => header_row
            .iter()
            .map(|cell| normalize(&cell.to_string()))
            .collect(),
        None => return Err(ImportError::EmptyFile),
    };

    let mut rows = Vec::new();

    for (index, data_row) in row_iter.enumerate() {
        let row_number = index + 2;

        let mut fields = HashMap::new();
        for (i, header) in headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            let Some(cell) = data_row.get(i) else { continue };
            let Some(value) = cell_to_value(cell) else { continue };
            fields.insert(header.clone(), value);
        }

        if !fields.is_empty() {
            rows.push(RawRow {
                row: row_number,
                fields,
            });
        }
    }

    Ok(ParsedFile {
        rows,
        read_errors: Vec::new(),
    })
}

/// calamine 셀을 공용 셀 값으로 변환합니다.
///
/// 빈 셀과 오류 셀은 `None` — "값 없음"으로 수렴합니다.
fn cell_to_value(cell: &Data) -> Option<CellValue> {
    match cell {
        Data::Empty => None,
        Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(CellValue::Text(trimmed.to_string()))
            }
        }
        Data::Float(f) => Some(CellValue::Number(*f)),
        Data::Int(i) => Some(CellValue::Number(*i as f64)),
        Data::Bool(b) => Some(CellValue::Bool(*b)),
        // 날짜 셀은 시리얼 숫자로 수렴시켜 coerce_date가 처리
        Data::DateTime(dt) => Some(CellValue::Number(dt.as_f64())),
        Data::DateTimeIso(s) => Some(CellValue::Text(s.clone())),
        Data::DurationIso(s) => Some(CellValue::Text(s.clone())),
        Data::Error(e) => {
            warn!(error = ?e, "XLSX 오류 셀 무시");
            None
        }
    }
}

// ==================== 엔티티별 레코드 빌더 ====================

/// 원시 행을 가격 레코드로 변환합니다.
///
/// `id_column`은 행 내 식별자 컬럼("symbol" 또는 "currency_code"),
/// `fallback_code`는 호출자가 제공한 식별자입니다. 행 내 값이 항상
/// 우선하고, 둘 다 없으면 행이 거부됩니다.
pub fn build_price_row(
    raw: &RawRow,
    id_column: &str,
    id_label: &str,
    fallback_code: Option<&str>,
) -> ParsedRow<PriceRecord> {
    if raw.get("date").is_none() {
        return ParsedRow::Invalid(RowError::new(raw.row, "Missing date field"));
    }

    for field in ["open", "high", "low", "close"] {
        if raw.get(field).is_none() {
            return ParsedRow::Invalid(RowError::new(
                raw.row,
                "Missing required price fields (open, high, low, or close)",
            ));
        }
    }

    // 행 내 식별자가 호출자 제공 식별자보다 우선
    let code = match raw.get(id_column).and_then(|v| v.as_text()) {
        Some(c) => c.to_string(),
        None => match fallback_code {
            Some(c) => c.to_string(),
            None => {
                return ParsedRow::Invalid(RowError::new(
                    raw.row,
                    format!("No {} provided in file or as parameter", id_label),
                ));
            }
        },
    };

    let prices: Vec<_> = ["open", "high", "low", "close"]
        .iter()
        .map(|f| raw.get(f).and_then(coerce_decimal))
        .collect();

    let (Some(open), Some(high), Some(low), Some(close)) =
        (prices[0], prices[1], prices[2], prices[3])
    else {
        return ParsedRow::Invalid(RowError::new(raw.row, "Invalid price format"));
    };

    let Some(date) = raw.get("date").and_then(coerce_date) else {
        return ParsedRow::Invalid(RowError::new(raw.row, "Invalid date format"));
    };

    ParsedRow::Valid {
        row: raw.row,
        record: PriceRecord {
            code,
            date,
            open,
            high,
            low,
            close,
            volume: raw.get("volume").and_then(coerce_i64),
            trend_q: raw.get("trend_q").and_then(coerce_decimal),
            fq: raw.get("fq").and_then(coerce_decimal),
            band_down: raw.get("band_down").and_then(coerce_decimal),
            band_up: raw.get("band_up").and_then(coerce_decimal),
        },
    }
}

/// 원시 행을 재무지표 레코드로 변환합니다.
pub fn build_metric_row(raw: &RawRow, fallback_symbol: Option<&str>) -> ParsedRow<MetricRecord> {
    let symbol = match raw.get("symbol").and_then(|v| v.as_text()) {
        Some(s) => s.to_string(),
        None => match fallback_symbol {
            Some(s) => s.to_string(),
            None => {
                return ParsedRow::Invalid(RowError::new(
                    raw.row,
                    "No symbol provided in file or as parameter",
                ));
            }
        },
    };

    let Some(year) = raw.get("year").and_then(coerce_i32) else {
        return ParsedRow::Invalid(RowError::new(raw.row, "Missing or invalid year field"));
    };

    let quarter = match raw.get("quarter") {
        None => None,
        Some(v) => match coerce_i32(v) {
            Some(q) if (1..=4).contains(&q) => Some(q),
            _ => {
                return ParsedRow::Invalid(RowError::new(
                    raw.row,
                    "Invalid quarter (expected 1-4)",
                ));
            }
        },
    };

    let decimal_of = |field: &str| raw.get(field).and_then(coerce_decimal);

    ParsedRow::Valid {
        row: raw.row,
        record: MetricRecord {
            symbol,
            year,
            quarter,
            eps: decimal_of("eps"),
            eps_industry: decimal_of("eps_industry"),
            pe: decimal_of("pe"),
            pe_industry: decimal_of("pe_industry"),
            roa: decimal_of("roa"),
            roe: decimal_of("roe"),
            roa_industry: decimal_of("roa_industry"),
            roe_industry: decimal_of("roe_industry"),
            revenue: decimal_of("revenue"),
            margin: decimal_of("margin"),
            total_debt_to_equity: decimal_of("total_debt_to_equity"),
            total_assets_to_equity: decimal_of("total_assets_to_equity"),
        },
    }
}

/// 원시 행을 종목 프로필 레코드로 변환합니다.
///
/// 심볼만 필수입니다. 지표 필드는 값이 없거나 숫자로 변환되지 않으면
/// 비워 둡니다 — 프로필은 부분 갱신이 정상 경로입니다.
pub fn build_profile_row(raw: &RawRow) -> ParsedRow<ProfileRecord> {
    let Some(symbol) = raw.get("symbol").and_then(|v| v.as_text()) else {
        return ParsedRow::Invalid(RowError::new(raw.row, "Missing symbol field"));
    };

    let decimal_of = |field: &str| raw.get(field).and_then(coerce_decimal);

    ParsedRow::Valid {
        row: raw.row,
        record: ProfileRecord {
            symbol: symbol.to_string(),
            price: decimal_of("price"),
            profit: decimal_of("profit"),
            volume: decimal_of("volume"),
            pe: decimal_of("pe"),
            eps: decimal_of("eps"),
            roa: decimal_of("roa"),
            roe: decimal_of("roe"),
        },
    }
}

/// 원시 행을 통화 레코드로 변환합니다.
pub fn build_currency_row(raw: &RawRow) -> ParsedRow<CurrencyRecord> {
    let Some(code) = raw.get("code").and_then(|v| v.as_text()) else {
        return ParsedRow::Invalid(RowError::new(raw.row, "Missing code field"));
    };
    let Some(name) = raw.get("name").and_then(|v| v.as_text()) else {
        return ParsedRow::Invalid(RowError::new(raw.row, "Missing name field"));
    };

    ParsedRow::Valid {
        row: raw.row,
        record: CurrencyRecord {
            code: code.to_uppercase(),
            name: name.to_string(),
        },
    }
}

// ==================== 파일 단위 진입점 ====================

/// 주가 파일을 파싱합니다.
pub fn parse_price_file(
    bytes: &[u8],
    format: FileFormat,
    fallback_symbol: Option<&str>,
) -> Result<Vec<ParsedRow<PriceRecord>>> {
    let parsed = parse_rows(bytes, format, columns::normalize_price_column)?;
    Ok(collect_rows(parsed, |raw| {
        build_price_row(raw, "symbol", "symbol", fallback_symbol)
    }))
}

/// 환율 파일을 파싱합니다.
pub fn parse_currency_price_file(
    bytes: &[u8],
    format: FileFormat,
    fallback_code: Option<&str>,
) -> Result<Vec<ParsedRow<PriceRecord>>> {
    let parsed = parse_rows(bytes, format, columns::normalize_currency_price_column)?;
    Ok(collect_rows(parsed, |raw| {
        build_price_row(raw, "currency_code", "currency code", fallback_code)
    }))
}

/// 통화 목록 파일을 파싱합니다.
pub fn parse_currency_file(
    bytes: &[u8],
    format: FileFormat,
) -> Result<Vec<ParsedRow<CurrencyRecord>>> {
    let parsed = parse_rows(bytes, format, columns::normalize_currency_column)?;
    Ok(collect_rows(parsed, build_currency_row))
}

/// 종목 프로필 파일을 파싱합니다.
pub fn parse_profile_file(
    bytes: &[u8],
    format: FileFormat,
) -> Result<Vec<ParsedRow<ProfileRecord>>> {
    let parsed = parse_rows(bytes, format, columns::normalize_profile_column)?;
    Ok(collect_rows(parsed, build_profile_row))
}

/// 재무지표 파일을 파싱합니다.
pub fn parse_metric_file(
    bytes: &[u8],
    format: FileFormat,
    fallback_symbol: Option<&str>,
) -> Result<Vec<ParsedRow<MetricRecord>>> {
    let parsed = parse_rows(bytes, format, columns::normalize_metric_column)?;
    Ok(collect_rows(parsed, |raw| {
        build_metric_row(raw, fallback_symbol)
    }))
}

fn collect_rows<T>(
    parsed: ParsedFile,
    build: impl Fn(&RawRow) -> ParsedRow<T>,
) -> Vec<ParsedRow<T>> {
    let mut out: Vec<ParsedRow<T>> = parsed
        .read_errors
        .into_iter()
        .map(ParsedRow::Invalid)
        .collect();
    out.extend(parsed.rows.iter().map(build));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::split_rows;
    use rust_decimal_macros::dec;

    #[test]
    fn test_detect_delimiter_comma_majority() {
        assert_eq!(detect_delimiter("date,open,high,low,close\n1;2"), b',');
    }

    #[test]
    fn test_detect_delimiter_semicolon_majority() {
        assert_eq!(detect_delimiter("date;open;high;low;close"), b';');
    }

    #[test]
    fn test_file_format_detection() {
        assert_eq!(FileFormat::from_file_name("prices.csv").unwrap(), FileFormat::Csv);
        assert_eq!(FileFormat::from_file_name("PRICES.XLSX").unwrap(), FileFormat::Xlsx);
        assert_eq!(FileFormat::from_file_name("legacy.xls").unwrap(), FileFormat::Xlsx);
        assert!(FileFormat::from_file_name("data.pdf").is_err());
    }

    #[test]
    fn test_parse_semicolon_csv_with_comma_decimals() {
        let csv = "date;open;high;low;close\n2024-01-02;100,5;110,0;99,5;105,25\n";
        let rows = parse_price_file(csv.as_bytes(), FileFormat::Csv, Some("ABC")).unwrap();

        let (records, errors) = split_rows(rows);
        assert!(errors.is_empty());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].code, "ABC");
        assert_eq!(records[0].open, dec!(100.5));
        assert_eq!(records[0].close, dec!(105.25));
    }

    #[test]
    fn test_row_symbol_wins_over_fallback() {
        let csv = "date,open,high,low,close,symbol\n2024-01-02,1,2,0.5,1.5,XYZ\n";
        let rows = parse_price_file(csv.as_bytes(), FileFormat::Csv, Some("ABC")).unwrap();

        let (records, _) = split_rows(rows);
        assert_eq!(records[0].code, "XYZ");
    }

    #[test]
    fn test_no_identifier_rejected() {
        let csv = "date,open,high,low,close\n2024-01-02,1,2,0.5,1.5\n";
        let rows = parse_price_file(csv.as_bytes(), FileFormat::Csv, None).unwrap();

        let (records, errors) = split_rows(rows);
        assert!(records.is_empty());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].reason.contains("No symbol provided"));
    }

    #[test]
    fn test_blank_close_reports_missing_price_fields() {
        // 스프레드시트에서 값을 지운 셀은 빈 문자열로 내보내진다
        let csv = "date,open,high,low,close\n\
                   2024-01-02,1,2,0.5,1.5\n\
                   2024-01-03,1,2,0.5,\n\
                   2024-01-04,1,2,0.5,1.8\n";
        let rows = parse_price_file(csv.as_bytes(), FileFormat::Csv, Some("ABC")).unwrap();

        let (records, errors) = split_rows(rows);
        assert_eq!(records.len(), 2);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].row, 3);
        assert!(errors[0].reason.contains("required price fields"));
    }

    #[test]
    fn test_missing_date_row_number_counts_header() {
        let csv = "date,open,high,low,close\n,1,2,0.5,1.5\n";
        let rows = parse_price_file(csv.as_bytes(), FileFormat::Csv, Some("ABC")).unwrap();

        let (_, errors) = split_rows(rows);
        assert_eq!(errors[0].row, 2);
        assert_eq!(errors[0].reason, "Missing date field");
    }

    #[test]
    fn test_bad_row_does_not_abort_file() {
        let csv = "date,open,high,low,close\n\
                   2024-01-02,1,2,0.5,1.5\n\
                   2024-01-03,abc,2,0.5,1.5\n\
                   2024-01-04,1,2,0.5,1.8\n";
        let rows = parse_price_file(csv.as_bytes(), FileFormat::Csv, Some("ABC")).unwrap();

        let (records, errors) = split_rows(rows);
        assert_eq!(records.len(), 2);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].reason, "Invalid price format");
    }

    #[test]
    fn test_ragged_rows_tolerated() {
        let csv = "date,open,high,low,close,volume\n\
                   2024-01-02,1,2,0.5,1.5\n";
        let rows = parse_price_file(csv.as_bytes(), FileFormat::Csv, Some("ABC")).unwrap();

        let (records, errors) = split_rows(rows);
        assert!(errors.is_empty());
        assert_eq!(records[0].volume, None);
    }

    #[test]
    fn test_empty_file_is_whole_file_error() {
        let result = parse_price_file(b"date,open,high,low,close\n", FileFormat::Csv, Some("A"));
        assert!(matches!(result, Err(ImportError::EmptyFile)));
    }

    #[test]
    fn test_currency_file_parsing() {
        let csv = "Currency,Description\nusd,US Dollar\neur,Euro\n";
        let rows = parse_currency_file(csv.as_bytes(), FileFormat::Csv).unwrap();

        let (records, errors) = split_rows(rows);
        assert!(errors.is_empty());
        assert_eq!(records[0].code, "USD");
        assert_eq!(records[1].name, "Euro");
    }

    #[test]
    fn test_profile_file_parsing() {
        let csv = "Symbol,Price,PE,ROE\nABC,150.5,12.3,18.2\nXYZ,,,9.1\n";
        let rows = parse_profile_file(csv.as_bytes(), FileFormat::Csv).unwrap();

        let (records, errors) = split_rows(rows);
        assert!(errors.is_empty());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].symbol, "ABC");
        assert_eq!(records[0].price, Some(dec!(150.5)));
        assert_eq!(records[0].profit, None);
        assert_eq!(records[1].price, None);
        assert_eq!(records[1].roe, Some(dec!(9.1)));
    }

    #[test]
    fn test_profile_row_without_symbol_rejected() {
        let csv = "symbol,price\nABC,100\n,200\n";
        let rows = parse_profile_file(csv.as_bytes(), FileFormat::Csv).unwrap();

        let (records, errors) = split_rows(rows);
        assert_eq!(records.len(), 1);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].row, 3);
        assert_eq!(errors[0].reason, "Missing symbol field");
    }

    #[test]
    fn test_metric_file_parsing() {
        let csv = "symbol,year,quarter,eps,roe\nABC,2024,1,\"1,25\",15.3\nABC,2024,5,1,2\n";
        let rows = parse_metric_file(csv.as_bytes(), FileFormat::Csv, None).unwrap();

        let (records, errors) = split_rows(rows);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].quarter, Some(1));
        assert_eq!(records[0].eps, Some(dec!(1.25)));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].reason.contains("quarter"));
    }
}
