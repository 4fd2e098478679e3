//! 재무지표 endpoint.
//!
//! 대량 등록(`POST /bulk`)은 파일 대신 JSON 배열을 받습니다. 행 번호는
//! 배열의 1-based 인덱스이며, 심볼 검증과 동기/비동기 분기는 파일
//! 업로드와 동일하게 동작합니다.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use refdata_data::{
    FinancialMetricRecord, FinancialMetricRepository, MetricFilter, MetricImportStrategy, Page,
    Pagination, StockSymbolLookup,
};
use refdata_import::{validate, ImportJob, ImportStrategy, MetricRecord, ParsedRow};

use crate::auth::{require_role, JwtAuth, Role};
use crate::error::{bad_request, from_data_error, from_import_error, ApiResult};
use crate::routes::stock_prices::UploadAccepted;
use crate::state::AppState;

/// 목록 쿼리 파라미터.
#[derive(Debug, Default, Deserialize)]
pub struct MetricListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub symbol: Option<String>,
    pub year: Option<i32>,
    pub quarter: Option<i32>,
}

/// GET /api/v1/financial-metrics
pub async fn list_metrics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MetricListQuery>,
) -> ApiResult<Json<Page<FinancialMetricRecord>>> {
    let pagination = Pagination {
        page: query.page.unwrap_or(1),
        limit: query.limit.unwrap_or(20),
    };
    let filter = MetricFilter {
        symbol: query.symbol,
        year: query.year,
        quarter: query.quarter,
    };

    let repo = FinancialMetricRepository::new(state.db.clone());
    let page = repo
        .list(&filter, pagination)
        .await
        .map_err(from_data_error)?;
    Ok(Json(page))
}

/// GET /api/v1/financial-metrics/{id}
pub async fn get_metric(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<FinancialMetricRecord>> {
    let repo = FinancialMetricRepository::new(state.db.clone());
    let metric = repo.get(id).await.map_err(from_data_error)?;
    Ok(Json(metric))
}

/// POST /api/v1/financial-metrics
pub async fn create_metric(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Json(metric): Json<MetricRecord>,
) -> ApiResult<(StatusCode, Json<FinancialMetricRecord>)> {
    require_role(&claims, Role::Admin)?;

    if let Some(q) = metric.quarter {
        if !(1..=4).contains(&q) {
            return Err(bad_request("Invalid quarter (expected 1-4)"));
        }
    }

    let repo = FinancialMetricRepository::new(state.db.clone());
    let record = repo.create(&metric).await.map_err(from_data_error)?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /api/v1/financial-metrics/{id}
pub async fn update_metric(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Path(id): Path<Uuid>,
    Json(metric): Json<MetricRecord>,
) -> ApiResult<Json<FinancialMetricRecord>> {
    require_role(&claims, Role::Admin)?;

    let repo = FinancialMetricRepository::new(state.db.clone());
    let record = repo.update(id, &metric).await.map_err(from_data_error)?;
    Ok(Json(record))
}

/// DELETE /api/v1/financial-metrics/{id}
pub async fn delete_metric(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require_role(&claims, Role::Admin)?;

    let repo = FinancialMetricRepository::new(state.db.clone());
    repo.delete(id).await.map_err(from_data_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/financial-metrics/bulk
///
/// JSON 배열 대량 등록. 미등록 심볼 행은 행 오류로 수집되고 나머지는
/// 계속 처리됩니다.
pub async fn bulk_import(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Json(metrics): Json<Vec<MetricRecord>>,
) -> ApiResult<Response> {
    require_role(&claims, Role::Admin)?;

    if metrics.is_empty() {
        return Err(bad_request("Empty metric list"));
    }

    let rows: Vec<ParsedRow<MetricRecord>> = metrics
        .into_iter()
        .enumerate()
        .map(|(i, record)| ParsedRow::Valid {
            row: i + 1,
            record,
        })
        .collect();

    let lookup = StockSymbolLookup::new(state.db.clone());
    let rows = validate::validate_references(rows, &lookup, "Stock", |r: &MetricRecord| {
        r.symbol.as_str()
    })
    .await
    .map_err(from_import_error)?;

    let strategy = MetricImportStrategy::new(state.db.clone());

    if !state.needs_async(rows.len()) {
        let result = state
            .importer()
            .run(&strategy, rows)
            .await
            .map_err(from_import_error)?;
        return Ok((StatusCode::OK, Json(result)).into_response());
    }

    let total = rows.len();
    let job = state.ledger.create(strategy.entity(), total).await;
    state
        .importer()
        .spawn_job(Arc::new(strategy), rows, state.ledger.clone(), job.id.clone());

    Ok((
        StatusCode::ACCEPTED,
        Json(UploadAccepted {
            job_id: job.id,
            status: "pending".to_string(),
            total_records: total,
            message: "Import started. Poll the job endpoint for progress.".to_string(),
        }),
    )
        .into_response())
}

/// GET /api/v1/financial-metrics/jobs/{id}
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ImportJob>> {
    let job = state.ledger.get_status(&id).await.map_err(from_import_error)?;
    Ok(Json(job))
}

pub fn financial_metrics_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_metrics).post(create_metric))
        .route("/bulk", post(bulk_import))
        .route("/jobs/{id}", get(get_job))
        .route(
            "/{id}",
            get(get_metric).put(update_metric).delete(delete_metric),
        )
}
