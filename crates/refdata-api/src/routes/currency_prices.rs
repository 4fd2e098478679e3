//! 환율 endpoint.
//!
//! 주가와 같은 업로드/잡 폴링 구조에 통화별 최신 시세(`GET /latest`)가
//! 추가됩니다. 업로드 파일의 통화 코드는 먼저 통화 목록과 대조됩니다.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use uuid::Uuid;

use refdata_data::{
    CurrencyCodeLookup, CurrencyPriceImportStrategy, CurrencyPriceRecord,
    CurrencyPriceRepository, CurrencyPriceUpdate, Page,
};
use refdata_import::{parser, validate, FileFormat, ImportJob, ImportStrategy, PriceRecord};

use crate::auth::{require_role, JwtAuth, Role};
use crate::error::{from_data_error, from_import_error, ApiResult};
use crate::routes::stock_prices::{read_upload, PriceListQuery, UploadAccepted};
use crate::state::AppState;

/// GET /api/v1/currency-prices/{code}
pub async fn list_prices(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Query(query): Query<PriceListQuery>,
) -> ApiResult<Json<Page<CurrencyPriceRecord>>> {
    let repo = CurrencyPriceRepository::new(state.db.clone());
    let page = repo
        .list_by_code(&code, query.range(), query.pagination())
        .await
        .map_err(from_data_error)?;
    Ok(Json(page))
}

/// GET /api/v1/currency-prices/latest
///
/// 통화별 최신 환율 한 건씩.
pub async fn latest_prices(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<CurrencyPriceRecord>>> {
    let repo = CurrencyPriceRepository::new(state.db.clone());
    let rows = repo.latest_per_code().await.map_err(from_data_error)?;
    Ok(Json(rows))
}

/// POST /api/v1/currency-prices
pub async fn create_price(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Json(price): Json<PriceRecord>,
) -> ApiResult<(StatusCode, Json<CurrencyPriceRecord>)> {
    require_role(&claims, Role::Admin)?;

    let repo = CurrencyPriceRepository::new(state.db.clone());
    let record = repo.create(&price).await.map_err(from_data_error)?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /api/v1/currency-prices/{id}
pub async fn update_price(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Path(id): Path<Uuid>,
    Json(update): Json<CurrencyPriceUpdate>,
) -> ApiResult<Json<CurrencyPriceRecord>> {
    require_role(&claims, Role::Admin)?;

    let repo = CurrencyPriceRepository::new(state.db.clone());
    let record = repo.update(id, &update).await.map_err(from_data_error)?;
    Ok(Json(record))
}

/// DELETE /api/v1/currency-prices/{id}
pub async fn delete_price(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require_role(&claims, Role::Admin)?;

    let repo = CurrencyPriceRepository::new(state.db.clone());
    repo.delete(id).await.map_err(from_data_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/currency-prices/upload
///
/// 멀티파트 `file` 파트 필수, `currencyCode` 텍스트 파트는 파일에 코드
/// 컬럼이 없을 때의 폴백입니다.
pub async fn upload_prices(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    multipart: Multipart,
) -> ApiResult<Response> {
    require_role(&claims, Role::Admin)?;

    let payload = read_upload(multipart, "currencyCode").await?;
    let format = FileFormat::from_file_name(&payload.file_name).map_err(from_import_error)?;

    let rows =
        parser::parse_currency_price_file(&payload.bytes, format, payload.fallback_code.as_deref())
            .map_err(from_import_error)?;

    let lookup = CurrencyCodeLookup::new(state.db.clone());
    let rows = validate::validate_references(rows, &lookup, "Currency", |r: &PriceRecord| {
        r.code.as_str()
    })
    .await
    .map_err(from_import_error)?;

    let strategy = CurrencyPriceImportStrategy::new(state.db.clone());

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

/// GET /api/v1/currency-prices/jobs/{id}
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ImportJob>> {
    let job = state.ledger.get_status(&id).await.map_err(from_import_error)?;
    Ok(Json(job))
}

pub fn currency_prices_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_price))
        .route("/latest", get(latest_prices))
        .route("/upload", post(upload_prices))
        .route("/jobs/{id}", get(get_job))
        // GET은 통화 코드, PUT/DELETE는 레코드 ID를 같은 자리에서 받습니다
        .route(
            "/{id}",
            get(list_prices).put(update_price).delete(delete_price),
        )
}
