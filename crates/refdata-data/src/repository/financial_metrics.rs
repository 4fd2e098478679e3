//! 재무지표 repository.
//!
//! (symbol, year, quarter)가 자연 키입니다. 대량 임포트는 기존 레코드를
//! 덮어쓰지 않고 건너뜁니다 — 지표는 정정 공시가 아니면 바뀌지 않으므로
//! 재임포트가 기존 데이터를 훼손하지 않게 합니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use refdata_import::MetricRecord;

use super::{Page, Pagination};
use crate::database::Database;
use crate::error::{DataError, Result};

/// 재무지표 레코드.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FinancialMetricRecord {
    pub id: Uuid,
    pub symbol: String,
    pub year: i32,
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 재무지표 목록 필터.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricFilter {
    pub symbol: Option<String>,
    pub year: Option<i32>,
    pub quarter: Option<i32>,
}

pub struct FinancialMetricRepository {
    db: Database,
}

impl FinancialMetricRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// 재무지표 목록을 조회합니다.
    pub async fn list(
        &self,
        filter: &MetricFilter,
        pagination: Pagination,
    ) -> Result<Page<FinancialMetricRecord>> {
        let pagination = pagination.clamped();

        let condition = r#"
            ($1::text IS NULL OR UPPER(symbol) = UPPER($1))
            AND ($2::int IS NULL OR year = $2)
            AND ($3::int IS NULL OR quarter = $3)
        "#;

        let total: (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM financial_metrics WHERE {}",
            condition
        ))
        .bind(&filter.symbol)
        .bind(filter.year)
        .bind(filter.quarter)
        .fetch_one(self.db.pool())
        .await?;

        let items = sqlx::query_as::<_, FinancialMetricRecord>(&format!(
            "SELECT * FROM financial_metrics WHERE {} \
             ORDER BY symbol, year DESC, quarter DESC NULLS LAST LIMIT $4 OFFSET $5",
            condition
        ))
        .bind(&filter.symbol)
        .bind(filter.year)
        .bind(filter.quarter)
        .bind(pagination.limit)
        .bind(pagination.offset())
        .fetch_all(self.db.pool())
        .await?;

        Ok(Page::new(items, total.0, pagination))
    }

    /// ID로 재무지표를 조회합니다.
    pub async fn get(&self, id: Uuid) -> Result<FinancialMetricRecord> {
        sqlx::query_as::<_, FinancialMetricRecord>(
            "SELECT * FROM financial_metrics WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?
        .ok_or_else(|| DataError::NotFound(format!("Financial metric {}", id)))
    }

    /// 재무지표를 생성합니다. 자연 키 중복은 DuplicateError.
    pub async fn create(&self, metric: &MetricRecord) -> Result<FinancialMetricRecord> {
        let record = sqlx::query_as::<_, FinancialMetricRecord>(
            r#"
            INSERT INTO financial_metrics
                (symbol, year, quarter, eps, eps_industry, pe, pe_industry,
                 roa, roe, roa_industry, roe_industry, revenue, margin,
                 total_debt_to_equity, total_assets_to_equity)
            VALUES (UPPER($1), $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(&metric.symbol)
        .bind(metric.year)
        .bind(metric.quarter)
        .bind(metric.eps)
        .bind(metric.eps_industry)
        .bind(metric.pe)
        .bind(metric.pe_industry)
        .bind(metric.roa)
        .bind(metric.roe)
        .bind(metric.roa_industry)
        .bind(metric.roe_industry)
        .bind(metric.revenue)
        .bind(metric.margin)
        .bind(metric.total_debt_to_equity)
        .bind(metric.total_assets_to_equity)
        .fetch_one(self.db.pool())
        .await?;

        Ok(record)
    }

    /// 재무지표를 수정합니다.
    pub async fn update(&self, id: Uuid, metric: &MetricRecord) -> Result<FinancialMetricRecord> {
        sqlx::query_as::<_, FinancialMetricRecord>(
            r#"
            UPDATE financial_metrics SET
                eps = $2, eps_industry = $3, pe = $4, pe_industry = $5,
                roa = $6, roe = $7, roa_industry = $8, roe_industry = $9,
                revenue = $10, margin = $11,
                total_debt_to_equity = $12, total_assets_to_equity = $13,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(metric.eps)
        .bind(metric.eps_industry)
        .bind(metric.pe)
        .bind(metric.pe_industry)
        .bind(metric.roa)
        .bind(metric.roe)
        .bind(metric.roa_industry)
        .bind(metric.roe_industry)
        .bind(metric.revenue)
        .bind(metric.margin)
        .bind(metric.total_debt_to_equity)
        .bind(metric.total_assets_to_equity)
        .fetch_optional(self.db.pool())
        .await?
        .ok_or_else(|| DataError::NotFound(format!("Financial metric {}", id)))
    }

    /// 재무지표를 삭제합니다.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM financial_metrics WHERE id = $1")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(DataError::NotFound(format!("Financial metric {}", id)));
        }
        Ok(())
    }

    /// 임포트용 삽입 — 자연 키가 이미 있으면 건너뜁니다.
    ///
    /// 새로 생성되었으면 `true`. quarter의 NULL도 키 값으로 비교합니다.
    pub async fn insert_if_absent(&self, metric: &MetricRecord) -> Result<bool> {
        let exists: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT id FROM financial_metrics
            WHERE UPPER(symbol) = UPPER($1)
              AND year = $2
              AND quarter IS NOT DISTINCT FROM $3
            "#,
        )
        .bind(&metric.symbol)
        .bind(metric.year)
        .bind(metric.quarter)
        .fetch_optional(self.db.pool())
        .await?;

        if exists.is_some() {
            return Ok(false);
        }

        self.create(metric).await?;
        Ok(true)
    }
}
