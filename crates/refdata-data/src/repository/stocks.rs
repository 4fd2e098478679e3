//! 종목 repository.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{Page, Pagination};
use crate::database::Database;
use crate::error::{DataError, Result};

/// 종목 레코드.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StockRecord {
    pub id: Uuid,
    pub symbol: String,
    pub name: String,
    pub exchange: Option<String>,
    pub industry: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 종목 생성 입력.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStock {
    pub symbol: String,
    pub name: String,
    pub exchange: Option<String>,
    pub industry: Option<String>,
    pub description: Option<String>,
}

/// 종목 수정 입력. `None` 필드는 기존 값을 유지합니다.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockUpdate {
    pub name: Option<String>,
    pub exchange: Option<String>,
    pub industry: Option<String>,
    pub description: Option<String>,
}

/// 종목 목록 필터.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StockFilter {
    /// 심볼/이름 부분 일치 검색어
    pub search: Option<String>,
    pub exchange: Option<String>,
    pub industry: Option<String>,
}

pub struct StockRepository {
    db: Database,
}

impl StockRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// 종목 목록을 조회합니다.
    pub async fn list(&self, filter: &StockFilter, pagination: Pagination) -> Result<Page<StockRecord>> {
        let pagination = pagination.clamped();

        let condition = r#"
            ($1::text IS NULL OR symbol ILIKE '%' || $1 || '%' OR name ILIKE '%' || $1 || '%')
            AND ($2::text IS NULL OR exchange = $2)
            AND ($3::text IS NULL OR industry = $3)
        "#;

        let total: (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM stocks WHERE {}",
            condition
        ))
        .bind(&filter.search)
        .bind(&filter.exchange)
        .bind(&filter.industry)
        .fetch_one(self.db.pool())
        .await?;

        let items = sqlx::query_as::<_, StockRecord>(&format!(
            "SELECT * FROM stocks WHERE {} ORDER BY symbol LIMIT $4 OFFSET $5",
            condition
        ))
        .bind(&filter.search)
        .bind(&filter.exchange)
        .bind(&filter.industry)
        .bind(pagination.limit)
        .bind(pagination.offset())
        .fetch_all(self.db.pool())
        .await?;

        Ok(Page::new(items, total.0, pagination))
    }

    /// 심볼로 종목을 조회합니다.
    pub async fn get_by_symbol(&self, symbol: &str) -> Result<StockRecord> {
        sqlx::query_as::<_, StockRecord>(
            "SELECT * FROM stocks WHERE UPPER(symbol) = UPPER($1)",
        )
        .bind(symbol)
        .fetch_optional(self.db.pool())
        .await?
        .ok_or_else(|| DataError::NotFound(format!("Stock {}", symbol)))
    }

    /// 종목을 생성합니다.
    pub async fn create(&self, input: &NewStock) -> Result<StockRecord> {
        let record = sqlx::query_as::<_, StockRecord>(
            r#"
            INSERT INTO stocks (symbol, name, exchange, industry, description)
            VALUES (UPPER($1), $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&input.symbol)
        .bind(&input.name)
        .bind(&input.exchange)
        .bind(&input.industry)
        .bind(&input.description)
        .fetch_one(self.db.pool())
        .await?;

        Ok(record)
    }

    /// 종목을 수정합니다.
    pub async fn update(&self, symbol: &str, update: &StockUpdate) -> Result<StockRecord> {
        sqlx::query_as::<_, StockRecord>(
            r#"
            UPDATE stocks SET
                name = COALESCE($2, name),
                exchange = COALESCE($3, exchange),
                industry = COALESCE($4, industry),
                description = COALESCE($5, description),
                updated_at = NOW()
            WHERE UPPER(symbol) = UPPER($1)
            RETURNING *
            "#,
        )
        .bind(symbol)
        .bind(&update.name)
        .bind(&update.exchange)
        .bind(&update.industry)
        .bind(&update.description)
        .fetch_optional(self.db.pool())
        .await?
        .ok_or_else(|| DataError::NotFound(format!("Stock {}", symbol)))
    }

    /// 종목을 삭제합니다.
    pub async fn delete(&self, symbol: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM stocks WHERE UPPER(symbol) = UPPER($1)")
            .bind(symbol)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(DataError::NotFound(format!("Stock {}", symbol)));
        }
        Ok(())
    }

    /// 주어진 심볼 중 등록된 것들을 반환합니다 (임포트 참조 검증용).
    pub async fn existing_symbols(&self, symbols: &[String]) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT symbol FROM stocks WHERE symbol = ANY($1)")
                .bind(symbols)
                .fetch_all(self.db.pool())
                .await?;

        Ok(rows.into_iter().map(|(s,)| s).collect())
    }
}
