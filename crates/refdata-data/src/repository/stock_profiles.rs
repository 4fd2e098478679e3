//! 종목 프로필 repository.
//!
//! 심볼 단독이 자연 키입니다 — 종목당 프로필 한 건. 임포트 upsert는
//! 주가와 같은 `xmax = 0` 트릭으로 생성/갱신을 구분합니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use refdata_import::ProfileRecord;

use crate::database::Database;
use crate::error::{DataError, Result};

/// 종목 프로필 레코드.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StockProfileRecord {
    pub id: Uuid,
    pub symbol: String,
    pub price: Option<Decimal>,
    pub profit: Option<Decimal>,
    pub volume: Option<Decimal>,
    pub pe: Option<Decimal>,
    pub eps: Option<Decimal>,
    pub roa: Option<Decimal>,
    pub roe: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct StockProfileRepository {
    db: Database,
}

impl StockProfileRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// 전체 프로필을 심볼순으로 조회합니다.
    pub async fn list(&self) -> Result<Vec<StockProfileRecord>> {
        let rows =
            sqlx::query_as::<_, StockProfileRecord>("SELECT * FROM stock_profiles ORDER BY symbol")
                .fetch_all(self.db.pool())
                .await?;
        Ok(rows)
    }

    /// 심볼로 프로필을 조회합니다.
    pub async fn get_by_symbol(&self, symbol: &str) -> Result<StockProfileRecord> {
        sqlx::query_as::<_, StockProfileRecord>(
            "SELECT * FROM stock_profiles WHERE UPPER(symbol) = UPPER($1)",
        )
        .bind(symbol)
        .fetch_optional(self.db.pool())
        .await?
        .ok_or_else(|| DataError::NotFound(format!("Stock profile {}", symbol)))
    }

    /// 프로필을 생성합니다. 심볼 중복은 DuplicateError.
    pub async fn create(&self, profile: &ProfileRecord) -> Result<StockProfileRecord> {
        let record = sqlx::query_as::<_, StockProfileRecord>(
            r#"
            INSERT INTO stock_profiles
                (symbol, price, profit, volume, pe, eps, roa, roe)
            VALUES (UPPER($1), $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&profile.symbol)
        .bind(profile.price)
        .bind(profile.profit)
        .bind(profile.volume)
        .bind(profile.pe)
        .bind(profile.eps)
        .bind(profile.roa)
        .bind(profile.roe)
        .fetch_one(self.db.pool())
        .await?;

        Ok(record)
    }

    /// 프로필을 수정합니다. 비어 있는 필드는 기존 값을 유지합니다.
    pub async fn update(&self, symbol: &str, profile: &ProfileRecord) -> Result<StockProfileRecord> {
        sqlx::query_as::<_, StockProfileRecord>(
            r#"
            UPDATE stock_profiles SET
                price = COALESCE($2, price),
                profit = COALESCE($3, profit),
                volume = COALESCE($4, volume),
                pe = COALESCE($5, pe),
                eps = COALESCE($6, eps),
                roa = COALESCE($7, roa),
                roe = COALESCE($8, roe),
                updated_at = NOW()
            WHERE UPPER(symbol) = UPPER($1)
            RETURNING *
            "#,
        )
        .bind(symbol)
        .bind(profile.price)
        .bind(profile.profit)
        .bind(profile.volume)
        .bind(profile.pe)
        .bind(profile.eps)
        .bind(profile.roa)
        .bind(profile.roe)
        .fetch_optional(self.db.pool())
        .await?
        .ok_or_else(|| DataError::NotFound(format!("Stock profile {}", symbol)))
    }

    /// 프로필을 삭제합니다.
    pub async fn delete(&self, symbol: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM stock_profiles WHERE UPPER(symbol) = UPPER($1)")
            .bind(symbol)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(DataError::NotFound(format!("Stock profile {}", symbol)));
        }
        Ok(())
    }

    /// 임포트용 심볼 키 upsert.
    ///
    /// 새로 삽입되었으면 `true`, 기존 프로필을 덮어썼으면 `false`.
    pub async fn upsert(&self, profile: &ProfileRecord) -> Result<bool> {
        let (inserted,): (bool,) = sqlx::query_as(
            r#"
            INSERT INTO stock_profiles
                (symbol, price, profit, volume, pe, eps, roa, roe)
            VALUES (UPPER($1), $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (symbol) DO UPDATE SET
                price = EXCLUDED.price,
                profit = EXCLUDED.profit,
                volume = EXCLUDED.volume,
                pe = EXCLUDED.pe,
                eps = EXCLUDED.eps,
                roa = EXCLUDED.roa,
                roe = EXCLUDED.roe,
                updated_at = NOW()
            RETURNING (xmax = 0)
            "#,
        )
        .bind(&profile.symbol)
        .bind(profile.price)
        .bind(profile.profit)
        .bind(profile.volume)
        .bind(profile.pe)
        .bind(profile.eps)
        .bind(profile.roa)
        .bind(profile.roe)
        .fetch_one(self.db.pool())
        .await?;

        Ok(inserted)
    }
}
