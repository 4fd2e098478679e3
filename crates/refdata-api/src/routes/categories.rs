//! 카테고리 endpoint. 관리 작업은 AUTHOR 이상입니다.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use refdata_data::{CategoryRecord, CategoryRepository, CategoryUpdate, NewCategory, Page, Pagination};

use crate::auth::{require_role, JwtAuth, Role};
use crate::error::{from_data_error, ApiResult};
use crate::state::AppState;

/// 목록 쿼리 파라미터.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
}

/// GET /api/v1/categories
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CategoryListQuery>,
) -> ApiResult<Json<Page<CategoryRecord>>> {
    let pagination = Pagination {
        page: query.page.unwrap_or(1),
        limit: query.limit.unwrap_or(20),
    };

    let repo = CategoryRepository::new(state.db.clone());
    let page = repo
        .list(query.search.as_deref(), pagination)
        .await
        .map_err(from_data_error)?;
    Ok(Json(page))
}

/// GET /api/v1/categories/{id}
pub async fn get_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<CategoryRecord>> {
    let repo = CategoryRepository::new(state.db.clone());
    let category = repo.get(id).await.map_err(from_data_error)?;
    Ok(Json(category))
}

/// POST /api/v1/categories
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Json(input): Json<NewCategory>,
) -> ApiResult<(StatusCode, Json<CategoryRecord>)> {
    require_role(&claims, Role::Author)?;

    let repo = CategoryRepository::new(state.db.clone());
    let category = repo.create(&input).await.map_err(from_data_error)?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// PUT /api/v1/categories/{id}
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Path(id): Path<Uuid>,
    Json(update): Json<CategoryUpdate>,
) -> ApiResult<Json<CategoryRecord>> {
    require_role(&claims, Role::Author)?;

    let repo = CategoryRepository::new(state.db.clone());
    let category = repo.update(id, &update).await.map_err(from_data_error)?;
    Ok(Json(category))
}

/// DELETE /api/v1/categories/{id}
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require_role(&claims, Role::Author)?;

    let repo = CategoryRepository::new(state.db.clone());
    repo.delete(id).await.map_err(from_data_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn categories_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/{id}",
            get(get_category).put(update_category).delete(delete_category),
        )
}
