//! 종목 프로필 endpoint.
//!
//! 프로필은 종목당 한 건이고 심볼 단독이 키입니다. 업로드 파일의 심볼은
//! 참조 검증 없이 그대로 upsert됩니다 — 프로필은 외부 소스 스냅샷이라
//! 종목 등록보다 먼저 도착할 수 있습니다.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use refdata_data::{StockProfileImportStrategy, StockProfileRecord, StockProfileRepository};
use refdata_import::{parser, FileFormat, ImportJob, ImportStrategy, ProfileRecord};

use crate::auth::{require_role, JwtAuth, Role};
use crate::error::{from_data_error, from_import_error, ApiResult};
use crate::routes::stock_prices::{read_upload, UploadAccepted};
use crate::state::AppState;

/// GET /api/v1/stock-profiles
pub async fn list_profiles(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<StockProfileRecord>>> {
    let repo = StockProfileRepository::new(state.db.clone());
    let profiles = repo.list().await.map_err(from_data_error)?;
    Ok(Json(profiles))
}

/// GET /api/v1/stock-profiles/{symbol}
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> ApiResult<Json<StockProfileRecord>> {
    let repo = StockProfileRepository::new(state.db.clone());
    let profile = repo.get_by_symbol(&symbol).await.map_err(from_data_error)?;
    Ok(Json(profile))
}

/// POST /api/v1/stock-profiles
pub async fn create_profile(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Json(profile): Json<ProfileRecord>,
) -> ApiResult<(StatusCode, Json<StockProfileRecord>)> {
    require_role(&claims, Role::Admin)?;

    let repo = StockProfileRepository::new(state.db.clone());
    let record = repo.create(&profile).await.map_err(from_data_error)?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /api/v1/stock-profiles/{symbol}
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Path(symbol): Path<String>,
    Json(profile): Json<ProfileRecord>,
) -> ApiResult<Json<StockProfileRecord>> {
    require_role(&claims, Role::Admin)?;

    let repo = StockProfileRepository::new(state.db.clone());
    let record = repo
        .update(&symbol, &profile)
        .await
        .map_err(from_data_error)?;
    Ok(Json(record))
}

/// DELETE /api/v1/stock-profiles/{symbol}
pub async fn delete_profile(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Path(symbol): Path<String>,
) -> ApiResult<StatusCode> {
    require_role(&claims, Role::Admin)?;

    let repo = StockProfileRepository::new(state.db.clone());
    repo.delete(&symbol).await.map_err(from_data_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/stock-profiles/import
///
/// CSV/XLSX 프로필 업로드. 심볼이 같은 행은 마지막 값으로 덮어씁니다.
pub async fn import_profiles(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    multipart: Multipart,
) -> ApiResult<Response> {
    require_role(&claims, Role::Admin)?;

    let payload = read_upload(multipart, "symbol").await?;
    let format = FileFormat::from_file_name(&payload.file_name).map_err(from_import_error)?;

    let rows = parser::parse_profile_file(&payload.bytes, format).map_err(from_import_error)?;

    let strategy = StockProfileImportStrategy::new(state.db.clone());

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

/// GET /api/v1/stock-profiles/jobs/{id}
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ImportJob>> {
    let job = state.ledger.get_status(&id).await.map_err(from_import_error)?;
    Ok(Json(job))
}

pub fn stock_profiles_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_profiles).post(create_profile))
        .route("/import", post(import_profiles))
        .route("/jobs/{id}", get(get_job))
        .route(
            "/{symbol}",
            get(get_profile).put(update_profile).delete(delete_profile),
        )
}
