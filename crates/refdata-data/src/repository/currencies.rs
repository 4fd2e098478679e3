//! 통화 repository.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::Database;
use crate::error::{DataError, Result};

/// 통화 레코드. 코드가 자연 키입니다 (예: "USD").
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyRecord {
    pub code: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct CurrencyRepository {
    db: Database,
}

impl CurrencyRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// 전체 통화 목록을 조회합니다. 수가 적어 페이지네이션하지 않습니다.
    pub async fn list(&self) -> Result<Vec<CurrencyRecord>> {
        let rows = sqlx::query_as::<_, CurrencyRecord>("SELECT * FROM currencies ORDER BY code")
            .fetch_all(self.db.pool())
            .await?;
        Ok(rows)
    }

    /// 코드로 통화를 조회합니다.
    pub async fn get(&self, code: &str) -> Result<CurrencyRecord> {
        sqlx::query_as::<_, CurrencyRecord>(
            "SELECT * FROM currencies WHERE UPPER(code) = UPPER($1)",
        )
        .bind(code)
        .fetch_optional(self.db.pool())
        .await?
        .ok_or_else(|| DataError::NotFound(format!("Currency {}", code)))
    }

    /// 통화를 생성합니다.
    pub async fn create(&self, code: &str, name: &str) -> Result<CurrencyRecord> {
        let record = sqlx::query_as::<_, CurrencyRecord>(
            "INSERT INTO currencies (code, name) VALUES (UPPER($1), $2) RETURNING *",
        )
        .bind(code)
        .bind(name)
        .fetch_one(self.db.pool())
        .await?;
        Ok(record)
    }

    /// 통화 이름을 수정합니다.
    pub async fn update(&self, code: &str, name: &str) -> Result<CurrencyRecord> {
        sqlx::query_as::<_, CurrencyRecord>(
            r#"
            UPDATE currencies SET name = $2, updated_at = NOW()
            WHERE UPPER(code) = UPPER($1)
            RETURNING *
            "#,
        )
        .bind(code)
        .bind(name)
        .fetch_optional(self.db.pool())
        .await?
        .ok_or_else(|| DataError::NotFound(format!("Currency {}", code)))
    }

    /// 통화를 삭제합니다.
    pub async fn delete(&self, code: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM currencies WHERE UPPER(code) = UPPER($1)")
            .bind(code)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(DataError::NotFound(format!("Currency {}", code)));
        }
        Ok(())
    }

    /// 임포트용 삽입 — 이미 존재하는 코드는 건너뜁니다.
    ///
    /// 새로 생성되었으면 `true`를 반환합니다.
    pub async fn insert_if_absent(&self, code: &str, name: &str) -> Result<bool> {
        let inserted: Option<(String,)> = sqlx::query_as(
            r#"
            INSERT INTO currencies (code, name)
            VALUES (UPPER($1), $2)
            ON CONFLICT (code) DO NOTHING
            RETURNING code
            "#,
        )
        .bind(code)
        .bind(name)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(inserted.is_some())
    }

    /// 주어진 코드 중 등록된 것들을 반환합니다 (임포트 참조 검증용).
    pub async fn existing_codes(&self, codes: &[String]) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT code FROM currencies WHERE code = ANY($1)")
                .bind(codes)
                .fetch_all(self.db.pool())
                .await?;

        Ok(rows.into_iter().map(|(c,)| c).collect())
    }
}
