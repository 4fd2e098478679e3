//! 선정 종목 repository.
//!
//! 전략이 날짜별로 뽑은 종목 스냅샷입니다. (symbol, date)가 자연 키이고
//! 대량 등록 upsert는 주가와 같은 `xmax = 0` 트릭을 씁니다.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use refdata_import::SelectedStockRecord;

use super::{Page, Pagination};
use crate::database::Database;
use crate::error::{DataError, Result};

/// 선정 종목 레코드.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SelectedStockRow {
    pub id: Uuid,
    pub symbol: String,
    pub date: NaiveDate,
    pub close: Option<Decimal>,
    #[serde(rename = "return")]
    pub return_rate: Option<Decimal>,
    pub q_index: Option<Decimal>,
    pub volume: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 선정 종목 목록 필터.
#[derive(Debug, Clone, Default)]
pub struct SelectedStockFilter {
    pub symbol: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

pub struct SelectedStockRepository {
    db: Database,
}

impl SelectedStockRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// 선정 종목을 날짜 내림차순으로 조회합니다.
    pub async fn list(
        &self,
        filter: &SelectedStockFilter,
        pagination: Pagination,
    ) -> Result<Page<SelectedStockRow>> {
        let pagination = pagination.clamped();

        let condition = r#"
            ($1::text IS NULL OR UPPER(symbol) = UPPER($1))
            AND ($2::date IS NULL OR date >= $2)
            AND ($3::date IS NULL OR date <= $3)
        "#;

        let total: (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM selected_stocks WHERE {}",
            condition
        ))
        .bind(&filter.symbol)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_one(self.db.pool())
        .await?;

        let items = sqlx::query_as::<_, SelectedStockRow>(&format!(
            "SELECT * FROM selected_stocks WHERE {} ORDER BY date DESC, symbol LIMIT $4 OFFSET $5",
            condition
        ))
        .bind(&filter.symbol)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(pagination.limit)
        .bind(pagination.offset())
        .fetch_all(self.db.pool())
        .await?;

        Ok(Page::new(items, total.0, pagination))
    }

    /// ID로 선정 종목을 조회합니다.
    pub async fn get(&self, id: Uuid) -> Result<SelectedStockRow> {
        sqlx::query_as::<_, SelectedStockRow>("SELECT * FROM selected_stocks WHERE id = $1")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| DataError::NotFound(format!("Selected stock {}", id)))
    }

    /// 선정 종목 하나를 생성합니다. (symbol, date) 중복은 DuplicateError.
    pub async fn create(&self, record: &SelectedStockRecord) -> Result<SelectedStockRow> {
        let row = sqlx::query_as::<_, SelectedStockRow>(
            r#"
            INSERT INTO selected_stocks (symbol, date, close, return_rate, q_index, volume)
            VALUES (UPPER($1), $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&record.symbol)
        .bind(record.date)
        .bind(record.close)
        .bind(record.return_rate)
        .bind(record.q_index)
        .bind(record.volume)
        .fetch_one(self.db.pool())
        .await?;

        Ok(row)
    }

    /// 선정 종목을 삭제합니다.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM selected_stocks WHERE id = $1")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(DataError::NotFound(format!("Selected stock {}", id)));
        }
        Ok(())
    }

    /// 대량 등록용 자연 키 upsert.
    ///
    /// 새로 삽입되었으면 `true`, 기존 행을 덮어썼으면 `false`.
    pub async fn upsert(&self, record: &SelectedStockRecord) -> Result<bool> {
        let (inserted,): (bool,) = sqlx::query_as(
            r#"
            INSERT INTO selected_stocks (symbol, date, close, return_rate, q_index, volume)
            VALUES (UPPER($1), $2, $3, $4, $5, $6)
            ON CONFLICT (symbol, date) DO UPDATE SET
                close = EXCLUDED.close,
                return_rate = EXCLUDED.return_rate,
                q_index = EXCLUDED.q_index,
                volume = EXCLUDED.volume,
                updated_at = NOW()
            RETURNING (xmax = 0)
            "#,
        )
        .bind(&record.symbol)
        .bind(record.date)
        .bind(record.close)
        .bind(record.return_rate)
        .bind(record.q_index)
        .bind(record.volume)
        .fetch_one(self.db.pool())
        .await?;

        Ok(inserted)
    }
}
