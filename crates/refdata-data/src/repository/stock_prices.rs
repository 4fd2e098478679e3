//! 주가 repository.
//!
//! (symbol, date)가 자연 키입니다. 임포트 upsert는 `xmax = 0` 트릭으로
//! 생성/갱신을 구분합니다 — 삽입된 행의 `xmax`는 0, 갱신된 행은 0이
//! 아니므로 라운드트립 추가 없이 판별할 수 있습니다.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use refdata_import::PriceRecord;

use super::{Page, Pagination};
use crate::database::Database;
use crate::error::{DataError, Result};

/// 주가 레코드.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StockPriceRecord {
    pub id: Uuid,
    pub symbol: String,
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Option<i64>,
    pub trend_q: Option<Decimal>,
    pub fq: Option<Decimal>,
    pub band_down: Option<Decimal>,
    pub band_up: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 주가 수정 입력.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockPriceUpdate {
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Option<Decimal>,
    pub volume: Option<i64>,
    pub trend_q: Option<Decimal>,
    pub fq: Option<Decimal>,
    pub band_down: Option<Decimal>,
    pub band_up: Option<Decimal>,
}

/// 날짜 범위 필터.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

pub struct StockPriceRepository {
    db: Database,
}

impl StockPriceRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// 심볼별 주가를 날짜 내림차순으로 조회합니다.
    pub async fn list_by_symbol(
        &self,
        symbol: &str,
        range: DateRange,
        pagination: Pagination,
    ) -> Result<Page<StockPriceRecord>> {
        let pagination = pagination.clamped();

        let condition = r#"
            UPPER(symbol) = UPPER($1)
            AND ($2::date IS NULL OR date >= $2)
            AND ($3::date IS NULL OR date <= $3)
        "#;

        let total: (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM stock_prices WHERE {}",
            condition
        ))
        .bind(symbol)
        .bind(range.start_date)
        .bind(range.end_date)
        .fetch_one(self.db.pool())
        .await?;

        let items = sqlx::query_as::<_, StockPriceRecord>(&format!(
            "SELECT * FROM stock_prices WHERE {} ORDER BY date DESC LIMIT $4 OFFSET $5",
            condition
        ))
        .bind(symbol)
        .bind(range.start_date)
        .bind(range.end_date)
        .bind(pagination.limit)
        .bind(pagination.offset())
        .fetch_all(self.db.pool())
        .await?;

        Ok(Page::new(items, total.0, pagination))
    }

    /// ID로 주가를 조회합니다.
    pub async fn get(&self, id: Uuid) -> Result<StockPriceRecord> {
        sqlx::query_as::<_, StockPriceRecord>("SELECT * FROM stock_prices WHERE id = $1")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| DataError::NotFound(format!("Stock price {}", id)))
    }

    /// 주가 하나를 생성합니다. (symbol, date) 중복은 DuplicateError.
    pub async fn create(&self, price: &PriceRecord) -> Result<StockPriceRecord> {
        let record = sqlx::query_as::<_, StockPriceRecord>(
            r#"
            INSERT INTO stock_prices
                (symbol, date, open, high, low, close, volume, trend_q, fq, band_down, band_up)
            VALUES (UPPER($1), $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(&price.code)
        .bind(price.date)
        .bind(price.open)
        .bind(price.high)
        .bind(price.low)
        .bind(price.close)
        .bind(price.volume)
        .bind(price.trend_q)
        .bind(price.fq)
        .bind(price.band_down)
        .bind(price.band_up)
        .fetch_one(self.db.pool())
        .await?;

        Ok(record)
    }

    /// 주가를 수정합니다.
    pub async fn update(&self, id: Uuid, update: &StockPriceUpdate) -> Result<StockPriceRecord> {
        sqlx::query_as::<_, StockPriceRecord>(
            r#"
            UPDATE stock_prices SET
                open = COALESCE($2, open),
                high = COALESCE($3, high),
                low = COALESCE($4, low),
                close = COALESCE($5, close),
                volume = COALESCE($6, volume),
                trend_q = COALESCE($7, trend_q),
                fq = COALESCE($8, fq),
                band_down = COALESCE($9, band_down),
                band_up = COALESCE($10, band_up),
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
        .bind(update.volume)
        .bind(update.trend_q)
        .bind(update.fq)
        .bind(update.band_down)
        .bind(update.band_up)
        .fetch_optional(self.db.pool())
        .await?
        .ok_or_else(|| DataError::NotFound(format!("Stock price {}", id)))
    }

    /// 주가를 삭제합니다.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM stock_prices WHERE id = $1")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(DataError::NotFound(format!("Stock price {}", id)));
        }
        Ok(())
    }

    /// 임포트용 자연 키 upsert.
    ///
    /// 새로 삽입되었으면 `true`, 기존 행을 덮어썼으면 `false`.
    pub async fn upsert(&self, price: &PriceRecord) -> Result<bool> {
        let (inserted,): (bool,) = sqlx::query_as(
            r#"
            INSERT INTO stock_prices
                (symbol, date, open, high, low, close, volume, trend_q, fq, band_down, band_up)
            VALUES (UPPER($1), $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (symbol, date) DO UPDATE SET
                open = EXCLUDED.open,
                high = EXCLUDED.high,
                low = EXCLUDED.low,
                close = EXCLUDED.close,
                volume = EXCLUDED.volume,
                trend_q = EXCLUDED.trend_q,
                fq = EXCLUDED.fq,
                band_down = EXCLUDED.band_down,
                band_up = EXCLUDED.band_up,
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
        .bind(price.volume)
        .bind(price.trend_q)
        .bind(price.fq)
        .bind(price.band_down)
        .bind(price.band_up)
        .fetch_one(self.db.pool())
        .await?;

        Ok(inserted)
    }
}
