//! 주가 endpoint.
//!
//! CRUD 외에 대량 업로드(`POST /upload`)와 잡 폴링(`GET /jobs/{id}`)을
//! 제공합니다. 업로드는 파싱된 행 수가 임계치 미만이면 동기로 결과를
//! 반환하고, 이상이면 202와 잡 ID를 반환한 뒤 백그라운드에서 처리합니다.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use refdata_data::{
    DateRange, Page, Pagination, StockPriceRecord, StockPriceRepository, StockPriceImportStrategy,
    StockPriceUpdate, StockSymbolLookup,
};
use refdata_import::{parser, validate, FileFormat, ImportJob, ImportStrategy, PriceRecord};

use crate::auth::{require_role, JwtAuth, Role};
use crate::error::{bad_request, from_data_error, from_import_error, ApiResult};
use crate::state::AppState;

/// 날짜 범위 + 페이지네이션 쿼리.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub start_date: Option<chrono::NaiveDate>,
    pub end_date: Option<chrono::NaiveDate>,
}

impl PriceListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page.unwrap_or(1),
            limit: self.limit.unwrap_or(20),
        }
    }

    pub fn range(&self) -> DateRange {
        DateRange {
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

/// 202 응답 본문 — 비동기 잡 접수.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadAccepted {
    pub job_id: String,
    pub status: String,
    pub total_records: usize,
    pub message: String,
}

/// 멀티파트 업로드에서 추출한 파일과 부가 필드.
pub struct UploadPayload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// 파일에 식별자 컬럼이 없을 때 쓰는 폴백
    pub fallback_code: Option<String>,
}

/// 멀티파트 본문에서 업로드 페이로드를 추출합니다.
///
/// `file` 파트는 필수이고, `symbol`(또는 `currencyCode`) 텍스트 파트는
/// 선택입니다.
pub async fn read_upload(
    mut multipart: Multipart,
    code_field: &str,
) -> ApiResult<UploadPayload> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut fallback_code: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == "file" {
            let file_name = field
                .file_name()
                .map(|s| s.to_string())
                .ok_or_else(|| bad_request("File part is missing a filename"))?;
            let bytes = field
                .bytes()
                .await
                .map_err(|e| bad_request(format!("Failed to read file: {}", e)))?;
            file = Some((file_name, bytes.to_vec()));
        } else if name == code_field {
            let value = field
                .text()
                .await
                .map_err(|e| bad_request(format!("Failed to read field: {}", e)))?;
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                fallback_code = Some(trimmed.to_string());
            }
        }
    }

    let (file_name, bytes) = file.ok_or_else(|| bad_request("No file uploaded"))?;
    Ok(UploadPayload {
        file_name,
        bytes,
        fallback_code,
    })
}

/// GET /api/v1/stock-prices/{symbol}
pub async fn list_prices(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(query): Query<PriceListQuery>,
) -> ApiResult<Json<Page<StockPriceRecord>>> {
    let repo = StockPriceRepository::new(state.db.clone());
    let page = repo
        .list_by_symbol(&symbol, query.range(), query.pagination())
        .await
        .map_err(from_data_error)?;
    Ok(Json(page))
}

/// POST /api/v1/stock-prices
pub async fn create_price(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Json(price): Json<PriceRecord>,
) -> ApiResult<(StatusCode, Json<StockPriceRecord>)> {
    require_role(&claims, Role::Admin)?;

    let repo = StockPriceRepository::new(state.db.clone());
    let record = repo.create(&price).await.map_err(from_data_error)?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /api/v1/stock-prices/{id}
pub async fn update_price(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Path(id): Path<Uuid>,
    Json(update): Json<StockPriceUpdate>,
) -> ApiResult<Json<StockPriceRecord>> {
    require_role(&claims, Role::Admin)?;

    let repo = StockPriceRepository::new(state.db.clone());
    let record = repo.update(id, &update).await.map_err(from_data_error)?;
    Ok(Json(record))
}

/// DELETE /api/v1/stock-prices/{id}
pub async fn delete_price(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require_role(&claims, Role::Admin)?;

    let repo = StockPriceRepository::new(state.db.clone());
    repo.delete(id).await.map_err(from_data_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/stock-prices/upload
///
/// CSV/XLSX 주가 파일 업로드. 멀티파트 `file` 파트 필수, `symbol` 텍스트
/// 파트는 파일에 심볼 컬럼이 없을 때의 폴백입니다.
pub async fn upload_prices(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    multipart: Multipart,
) -> ApiResult<Response> {
    require_role(&claims, Role::Admin)?;

    let payload = read_upload(multipart, "symbol").await?;
    let format = FileFormat::from_file_name(&payload.file_name).map_err(from_import_error)?;

    let rows = parser::parse_price_file(&payload.bytes, format, payload.fallback_code.as_deref())
        .map_err(from_import_error)?;

    let lookup = StockSymbolLookup::new(state.db.clone());
    let rows = validate::validate_references(rows, &lookup, "Stock", |r: &PriceRecord| {
        r.code.as_str()
    })
    .await
    .map_err(from_import_error)?;

    let strategy = StockPriceImportStrategy::new(state.db.clone());

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

/// GET /api/v1/stock-prices/jobs/{id}
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ImportJob>> {
    let job = state.ledger.get_status(&id).await.map_err(from_import_error)?;
    Ok(Json(job))
}

pub fn stock_prices_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_price))
        .route("/upload", post(upload_prices))
        .route("/jobs/{id}", get(get_job))
        // GET은 심볼, PUT/DELETE는 레코드 ID를 같은 자리에서 받습니다
        .route(
            "/{id}",
            get(list_prices).put(update_price).delete(delete_price),
        )
}
