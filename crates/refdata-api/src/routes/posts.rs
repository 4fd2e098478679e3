//! 게시물 endpoint. 작성/수정/삭제는 AUTHOR 이상입니다.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use refdata_data::{NewPost, Page, Pagination, PostFilter, PostRecord, PostRepository, PostUpdate};

use crate::auth::{require_role, JwtAuth, Role};
use crate::error::{bad_request, from_data_error, ApiResult};
use crate::state::AppState;

/// 목록 쿼리 파라미터.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub author_id: Option<Uuid>,
    pub published: Option<bool>,
}

/// GET /api/v1/posts
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PostListQuery>,
) -> ApiResult<Json<Page<PostRecord>>> {
    let pagination = Pagination {
        page: query.page.unwrap_or(1),
        limit: query.limit.unwrap_or(20),
    };
    let filter = PostFilter {
        search: query.search,
        author_id: query.author_id,
        published: query.published,
    };

    let repo = PostRepository::new(state.db.clone());
    let page = repo
        .list(&filter, pagination)
        .await
        .map_err(from_data_error)?;
    Ok(Json(page))
}

/// GET /api/v1/posts/{id}
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PostRecord>> {
    let repo = PostRepository::new(state.db.clone());
    let post = repo.get(id).await.map_err(from_data_error)?;
    Ok(Json(post))
}

/// POST /api/v1/posts
///
/// 작성자는 토큰의 사용자입니다.
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Json(input): Json<NewPost>,
) -> ApiResult<(StatusCode, Json<PostRecord>)> {
    require_role(&claims, Role::Author)?;

    let author_id: Uuid = claims
        .sub
        .parse()
        .map_err(|_| bad_request("Invalid user id in token"))?;

    let repo = PostRepository::new(state.db.clone());
    let post = repo
        .create(&input, author_id)
        .await
        .map_err(from_data_error)?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// PUT /api/v1/posts/{id}
pub async fn update_post(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Path(id): Path<Uuid>,
    Json(update): Json<PostUpdate>,
) -> ApiResult<Json<PostRecord>> {
    require_role(&claims, Role::Author)?;

    let repo = PostRepository::new(state.db.clone());
    let post = repo.update(id, &update).await.map_err(from_data_error)?;
    Ok(Json(post))
}

/// DELETE /api/v1/posts/{id}
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require_role(&claims, Role::Author)?;

    let repo = PostRepository::new(state.db.clone());
    repo.delete(id).await.map_err(from_data_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn posts_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/{id}", get(get_post).put(update_post).delete(delete_post))
}
