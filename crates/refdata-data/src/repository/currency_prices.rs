//! 환율 repository.
//!
//! 주가와 같은 (code, date) 자연 키 구조이지만 거래량/밴드 필드가 없고
//! 코드별 최신 시세 조회가 추가됩니다.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use refdata_import::PriceRecord;

use super::stock_prices::DateRange;
use super::{Page, Pagination};
use crate::database::Database;
use crate::error::{DataError, Result};

/// 환율 레코드.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyPriceRecord {
    pub id: Uuid,
    pub currency_code: String,
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub trend_q: Option<Decimal>,
    pub fq: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 환율 수정 입력.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyPriceUpdate {
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Option<Decimal>,
    pub trend_q: Option<Decimal>,
    pub fq: Option<Decimal>,
}

pub struct CurrencyPriceRepository {
    db: Database,
}

impl CurrencyPriceRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// 통화 코드별 환율을 날짜 내림차순으로 조회합니다.
    pub async fn list_by_code(
        &self,
        code: &str,
        range: DateRange,
        pagination: Pagination,
    ) -> Result<Page<CurrencyPriceRecord>> {
        let pagination = pagination.clamped();

        let condition = r#"
            UPPER(currency_code) = UPPER($1)
            AND ($2::date IS NULL OR date >= $2)
            AND ($3::date IS NULL OR date <= $3)
        "#;

        let total: (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM currency_prices WHERE {}",
            condition
        ))
        .bind(code)
        .bind(range.start_date)
        .bind(range.end_date)
        .fetch_one(self.db.pool())
        .await?;

        let items = sqlx::query_as::<_, CurrencyPriceRecord>(&format!(
            "SELECT * FROM currency_prices WHERE {} ORDER BY date DESC LIMIT $4 OFFSET $5",
            condition
        ))
        .bind(code)
        .bind(range.start_date)
        .bind(range.end_date)
        .bind(pagination.limit)
        .bind(pagination.offset())
        .fetch_all(self.db.pool())
        .await?;

        Ok(Page::new(items, total.0, pagination))
    }

    /// 통화별 최신 환율 한 건씩을 조회합니다.
    pub async fn latest_per_code(&self) -> Result<Vec<CurrencyPriceRecord>> {
        let rows = sqlx::query_as::<_, CurrencyPriceRecord>(
            r#"
            SELECT DISTINCT ON (currency_code) *
            FROM currency_prices
            ORDER BY currency_code, date DESC
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows)
    }

    /// ID로 환율을 조회합니다.
    pub async fn get(&self, id: Uuid) -> Result<CurrencyPriceRecord> {
        sqlx::query_as::<_, CurrencyPriceRecord>("SELECT * FROM currency_prices WHERE id = $1")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| DataError::NotFound(format!("Currency price {}", id)))
    }

    /// 환율 하나를 생성합니다.
    pub async fn create(&self, price: &PriceRecord) -> Result<CurrencyPriceRecord> {
        let record = sqlx::query_as::<_, CurrencyPriceRecord>(
            r#"
            INSERT INTO currency_prices
                (currency_code, date, open, high, low, close, trend_q, fq)
            VALUES (UPPER($1), $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&price.code)
        .bind(price.date)
        .bind(price.open)
        .bind(price.high)
        .bind(price.low)
        .bind(price.close)
        .bind(price.trend_q)
        .bind(price.fq)
        .fetch_one(self.db.pool())
        .await?;

        Ok(record)
    }

    /// 환율을 수정합니다.
    pub async fn update(
        &self,
        id: Uuid,
        update: &CurrencyPriceUpdate,
    ) -> Result<CurrencyPriceRecord> {
        sqlx::query_as::<_, CurrencyPriceRecord>(
            r#"
            UPDATE currency_prices SET
                open = COALESCE($2, open),
                high = COALESCE($3, high),
                low = COALESCE($4, low),
                close = COALESCE($5, close),
                trend_q = COALESCE($6, trend_q),
                fq = COALESCE($7, fq),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.open)
        .bind(update.high)
        .bind(update.low)
        .bind(update.close)
        .bind(update.trend_q)
        .bind(update.fq)
        .fetch_optional(self.db.pool())
        .await?
        .ok_or_else(|| DataError::NotFound(format!("Currency price {}", id)))
    }

    /// 환율을 삭제합니다.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM currency_prices WHERE id = $1")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(DataError::NotFound(format!("Currency price {}", id)));
        }
        Ok(())
    }

    /// 임포트용 자연 키 upsert. 새로 삽입되었으면 `true`.
    pub async fn upsert(&self, price: &PriceRecord) -> Result<bool> {
        let (inserted,): (bool,) = sqlx::query_as(
            r#"
            INSERT INTO currency_prices
                (currency_code, date, open, high, low, close, trend_q, fq)
            VALUES (UPPER($1), $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (currency_code, date) DO UPDATE SET
                open = EXCLUDED.open,
                high = EXCLUDED.high,
                low = EXCLUDED.low,
                close = EXCLUDED.close,
                trend_q = EXCLUDED.trend_q,
                fq = EXCLUDED.fq,
                updated_at = NOW()
            RETURNING (xmax = 0)
            "#,
        )
        .bind(&price.code)
        .bind(price.date)
        .bind(price.open)
        .bind(price.high)
        .bind(price.low)
        .bind(price.close)
        .bind(price.trend_q)
        .bind(price.fq)
        .fetch_one(self.db.pool())
        .await?;

        Ok(inserted)
    }
}
