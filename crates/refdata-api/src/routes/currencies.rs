//! 통화 endpoint.
//!
//! 통화 목록은 수십 건 규모라 임포트가 항상 동기로 처리됩니다 —
//! 업로드 응답에 결과 요약이 바로 담깁니다.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use refdata_data::{CurrencyImportStrategy, CurrencyRecord, CurrencyRepository};
use refdata_import::{parser, BatchResult, FileFormat};

use crate::auth::{require_role, JwtAuth, Role};
use crate::error::{from_data_error, from_import_error, ApiResult};
use crate::routes::stock_prices::read_upload;
use crate::state::AppState;

/// 통화 생성/수정 입력.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CurrencyInput {
    pub code: String,
    pub name: String,
}

/// GET /api/v1/currencies
pub async fn list_currencies(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<CurrencyRecord>>> {
    let repo = CurrencyRepository::new(state.db.clone());
    let currencies = repo.list().await.map_err(from_data_error)?;
    Ok(Json(currencies))
}

/// GET /api/v1/currencies/{code}
pub async fn get_currency(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> ApiResult<Json<CurrencyRecord>> {
    let repo = CurrencyRepository::new(state.db.clone());
    let currency = repo.get(&code).await.map_err(from_data_error)?;
    Ok(Json(currency))
}

/// POST /api/v1/currencies
pub async fn create_currency(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Json(input): Json<CurrencyInput>,
) -> ApiResult<(StatusCode, Json<CurrencyRecord>)> {
    require_role(&claims, Role::Admin)?;

    let repo = CurrencyRepository::new(state.db.clone());
    let currency = repo
        .create(&input.code, &input.name)
        .await
        .map_err(from_data_error)?;
    Ok((StatusCode::CREATED, Json(currency)))
}

/// PUT /api/v1/currencies/{code}
pub async fn update_currency(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Path(code): Path<String>,
    Json(input): Json<CurrencyInput>,
) -> ApiResult<Json<CurrencyRecord>> {
    require_role(&claims, Role::Admin)?;

    let repo = CurrencyRepository::new(state.db.clone());
    let currency = repo
        .update(&code, &input.name)
        .await
        .map_err(from_data_error)?;
    Ok(Json(currency))
}

/// DELETE /api/v1/currencies/{code}
pub async fn delete_currency(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Path(code): Path<String>,
) -> ApiResult<StatusCode> {
    require_role(&claims, Role::Admin)?;

    let repo = CurrencyRepository::new(state.db.clone());
    repo.delete(&code).await.map_err(from_data_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/currencies/import
///
/// CSV/XLSX 통화 목록 업로드. 이미 등록된 코드는 건너뛰고 결과의
/// `skipped`로 집계됩니다.
pub async fn import_currencies(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    multipart: Multipart,
) -> ApiResult<Json<BatchResult>> {
    require_role(&claims, Role::Admin)?;

    let payload = read_upload(multipart, "code").await?;
    let format = FileFormat::from_file_name(&payload.file_name).map_err(from_import_error)?;

    let rows = parser::parse_currency_file(&payload.bytes, format).map_err(from_import_error)?;

    let strategy = CurrencyImportStrategy::new(state.db.clone());
    let result = state
        .importer()
        .run(&strategy, rows)
        .await
        .map_err(from_import_error)?;

    Ok(Json(result))
}

pub fn currencies_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_currencies).post(create_currency))
        .route("/import", post(import_currencies))
        .route(
            "/{code}",
            get(get_currency).put(update_currency).delete(delete_currency),
        )
}
