//! 참조 데이터 검증.
//!
//! 파싱된 행이 가리키는 참조 엔티티(종목, 통화)가 실제로 존재하는지
//! 일괄 확인합니다. 조회는 파일 전체에서 중복 제거한 코드 목록으로
//! 한 번만 수행합니다 — 행마다 질의하지 않습니다.

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::debug;

use crate::error::Result;
use crate::record::{ParsedRow, RowError};

/// 참조 엔티티 존재 확인 인터페이스.
///
/// 저장소 구현이 이 트레이트를 제공하고, 검증 로직은 저장소 세부사항을
/// 알지 못합니다. 테스트에서는 인메모리 집합으로 대체합니다.
#[async_trait]
pub trait ReferenceLookup: Send + Sync {
    /// 주어진 코드 중 실제로 존재하는 것들을 반환합니다.
    async fn existing_codes(&self, codes: &[String]) -> Result<HashSet<String>>;
}

/// 유효 행의 참조 코드를 일괄 검증합니다.
///
/// `code_of`는 각 레코드에서 참조 코드를 꺼내는 함수, `entity`는 오류
/// 메시지에 들어갈 엔티티 이름("Stock", "Currency")입니다. 미등록 코드를
/// 가진 행은 검증 오류로 전환되고 나머지 행은 그대로 통과합니다.
pub async fn validate_references<T>(
    rows: Vec<ParsedRow<T>>,
    lookup: &dyn ReferenceLookup,
    entity: &str,
    code_of: impl Fn(&T) -> &str,
) -> Result<Vec<ParsedRow<T>>> {
    let mut codes: Vec<String> = rows
        .iter()
        .filter_map(|r| r.as_valid())
        .map(|rec| code_of(rec).to_string())
        .collect();
    codes.sort();
    codes.dedup();

    if codes.is_empty() {
        return Ok(rows);
    }

    let existing = lookup.existing_codes(&codes).await?;
    debug!(
        entity,
        requested = codes.len(),
        found = existing.len(),
        "참조 코드 일괄 검증"
    );

    Ok(rows
        .into_iter()
        .map(|parsed| match parsed {
            ParsedRow::Valid { row, record } => {
                let code = code_of(&record);
                if existing.contains(code) {
                    ParsedRow::Valid { row, record }
                } else {
                    ParsedRow::Invalid(RowError::new(
                        row,
                        format!("{} with code \"{}\" not found", entity, code),
                    ))
                }
            }
            invalid => invalid,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::split_rows;

    struct FixedLookup(HashSet<String>);

    #[async_trait]
    impl ReferenceLookup for FixedLookup {
        async fn existing_codes(&self, codes: &[String]) -> Result<HashSet<String>> {
            Ok(codes
                .iter()
                .filter(|c| self.0.contains(*c))
                .cloned()
                .collect())
        }
    }

    fn lookup_of(codes: &[&str]) -> FixedLookup {
        FixedLookup(codes.iter().map(|s| s.to_string()).collect())
    }

    #[tokio::test]
    async fn test_unknown_code_becomes_row_error() {
        let rows = vec![
            ParsedRow::Valid {
                row: 2,
                record: "AAA".to_string(),
            },
            ParsedRow::Valid {
                row: 3,
                record: "ZZZ".to_string(),
            },
        ];

        let validated =
            validate_references(rows, &lookup_of(&["AAA"]), "Stock", |c: &String| c.as_str())
                .await
                .unwrap();

        let (records, errors) = split_rows(validated);
        assert_eq!(records, vec!["AAA".to_string()]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].row, 3);
        assert_eq!(errors[0].reason, "Stock with code \"ZZZ\" not found");
    }

    #[tokio::test]
    async fn test_already_invalid_rows_pass_through_unchanged() {
        let rows: Vec<ParsedRow<String>> = vec![ParsedRow::Invalid(RowError::new(
            2,
            "Missing date field",
        ))];

        let validated =
            validate_references(rows, &lookup_of(&[]), "Stock", |c: &String| c.as_str())
                .await
                .unwrap();

        let (_, errors) = split_rows(validated);
        assert_eq!(errors[0].reason, "Missing date field");
    }
}
