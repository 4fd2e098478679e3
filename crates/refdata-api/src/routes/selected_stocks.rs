//! 선정 종목 endpoint.
//!
//! 대량 등록(`POST /bulk`)은 재무지표와 같이 JSON 배열을 받습니다.
//! 심볼 참조 검증은 하지 않습니다 — 선정 결과는 외부 전략 출력이라
//! 종목 등록 여부와 무관하게 기록합니다.

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
    Page, Pagination, SelectedStockFilter, SelectedStockImportStrategy, SelectedStockRepository,
    SelectedStockRow,
};
use refdata_import::{ImportJob, ImportStrategy, ParsedRow, SelectedStockRecord};

use crate::auth::{require_role, JwtAuth, Role};
use crate::error::{bad_request, from_data_error, from_import_error, ApiResult};
use crate::routes::stock_prices::UploadAccepted;
use crate::state::AppState;

/// 목록 쿼리 파라미터.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedStockQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub symbol: Option<String>,
    pub start_date: Option<chrono::NaiveDate>,
    pub end_date: Option<chrono::NaiveDate>,
}

/// GET /api/v1/selected-stocks
pub async fn list_selected(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SelectedStockQuery>,
) -> ApiResult<Json<Page<SelectedStockRow>>> {
    let pagination = Pagination {
        page: query.page.unwrap_or(1),
        limit: query.limit.unwrap_or(20),
    };
    let filter = SelectedStockFilter {
        symbol: query.symbol,
        start_date: query.start_date,
        end_date: query.end_date,
    };

    let repo = SelectedStockRepository::new(state.db.clone());
    let page = repo
        .list(&filter, pagination)
        .await
        .map_err(from_data_error)?;
    Ok(Json(page))
}

/// GET /api/v1/selected-stocks/{id}
pub async fn get_selected(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SelectedStockRow>> {
    let repo = SelectedStockRepository::new(state.db.clone());
    let row = repo.get(id).await.map_err(from_data_error)?;
    Ok(Json(row))
}

/// POST /api/v1/selected-stocks
pub async fn create_selected(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Json(record): Json<SelectedStockRecord>,
) -> ApiResult<(StatusCode, Json<SelectedStockRow>)> {
    require_role(&claims, Role::Admin)?;

    let repo = SelectedStockRepository::new(state.db.clone());
    let row = repo.create(&record).await.map_err(from_data_error)?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// DELETE /api/v1/selected-stocks/{id}
pub async fn delete_selected(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require_role(&claims, Role::Admin)?;

    let repo = SelectedStockRepository::new(state.db.clone());
    repo.delete(id).await.map_err(from_data_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/selected-stocks/bulk
///
/// JSON 배열 대량 등록. (symbol, date)가 같은 기존 행은 덮어씁니다.
pub async fn bulk_import(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Json(records): Json<Vec<SelectedStockRecord>>,
) -> ApiResult<Response> {
    require_role(&claims, Role::Admin)?;

    if records.is_empty() {
        return Err(bad_request("Empty selected stock list"));
    }

    let rows: Vec<ParsedRow<SelectedStockRecord>> = records
        .into_iter()
        .enumerate()
        .map(|(i, record)| ParsedRow::Valid {
            row: i + 1,
            record,
        })
        .collect();

    let strategy = SelectedStockImportStrategy::new(state.db.clone());

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

/// GET /api/v1/selected-stocks/jobs/{id}
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ImportJob>> {
    let job = state.ledger.get_status(&id).await.map_err(from_import_error)?;
    Ok(Json(job))
}

pub fn selected_stocks_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_selected).post(create_selected))
        .route("/bulk", post(bulk_import))
        .route("/jobs/{id}", get(get_job))
        .route("/{id}", get(get_selected).delete(delete_selected))
}
