//! 이미지 메타데이터 endpoint.
//!
//! 레코드 자체는 업로드 파이프라인이 만들고, 여기서는 메타데이터 관리와
//! 대체 텍스트 수정만 제공합니다.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use refdata_data::{ImageRecord, ImageRepository, NewImage, Page, Pagination};

use crate::auth::{require_role, JwtAuth, Role};
use crate::error::{from_data_error, ApiResult};
use crate::state::AppState;

/// 목록 쿼리 파라미터.
#[derive(Debug, Default, Deserialize)]
pub struct ImageListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
}

/// 대체 텍스트 수정 입력.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AltTextUpdate {
    pub alt_text: Option<String>,
}

/// GET /api/v1/images
pub async fn list_images(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ImageListQuery>,
) -> ApiResult<Json<Page<ImageRecord>>> {
    let pagination = Pagination {
        page: query.page.unwrap_or(1),
        limit: query.limit.unwrap_or(20),
    };

    let repo = ImageRepository::new(state.db.clone());
    let page = repo
        .list(query.search.as_deref(), pagination)
        .await
        .map_err(from_data_error)?;
    Ok(Json(page))
}

/// GET /api/v1/images/{id}
pub async fn get_image(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> ApiResult<Json<ImageRecord>> {
    let repo = ImageRepository::new(state.db.clone());
    let image = repo.get(id).await.map_err(from_data_error)?;
    Ok(Json(image))
}

/// POST /api/v1/images
pub async fn create_image(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Json(input): Json<NewImage>,
) -> ApiResult<(StatusCode, Json<ImageRecord>)> {
    require_role(&claims, Role::Author)?;

    let repo = ImageRepository::new(state.db.clone());
    let image = repo.create(&input).await.map_err(from_data_error)?;
    Ok((StatusCode::CREATED, Json(image)))
}

/// PUT /api/v1/images/{id}
pub async fn update_image(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Path(id): Path<i32>,
    Json(update): Json<AltTextUpdate>,
) -> ApiResult<Json<ImageRecord>> {
    require_role(&claims, Role::Author)?;

    let repo = ImageRepository::new(state.db.clone());
    let image = repo
        .update_alt_text(id, update.alt_text.as_deref())
        .await
        .map_err(from_data_error)?;
    Ok(Json(image))
}

/// DELETE /api/v1/images/{id}
pub async fn delete_image(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Path(id): Path<i32>,
) -> ApiResult<StatusCode> {
    require_role(&claims, Role::Author)?;

    let repo = ImageRepository::new(state.db.clone());
    repo.delete(id).await.map_err(from_data_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn images_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_images).post(create_image))
        .route(
            "/{id}",
            get(get_image).put(update_image).delete(delete_image),
        )
}
