//! 사용자 관리 endpoint. 전부 ADMIN 전용입니다.
//!
//! 신규 사용자 생성은 인증 모듈의 회원 가입과 달리 역할을 지정할 수
//! 있습니다.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use refdata_data::{NewUser, Page, Pagination, UserRecord, UserRepository, UserUpdate};

use crate::auth::{hash_password, require_role, JwtAuth, Role};
use crate::error::{bad_request, from_data_error, ApiErrorResponse, ApiResult};
use crate::state::AppState;

/// 목록 쿼리 파라미터.
#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
}

/// 사용자 생성 입력 (관리자용).
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,
}

/// GET /api/v1/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Query(query): Query<UserListQuery>,
) -> ApiResult<Json<Page<UserRecord>>> {
    require_role(&claims, Role::Admin)?;

    let pagination = Pagination {
        page: query.page.unwrap_or(1),
        limit: query.limit.unwrap_or(20),
    };

    let repo = UserRepository::new(state.db.clone());
    let page = repo
        .list(query.search.as_deref(), pagination)
        .await
        .map_err(from_data_error)?;
    Ok(Json(page))
}

/// GET /api/v1/users/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserRecord>> {
    require_role(&claims, Role::Admin)?;

    let repo = UserRepository::new(state.db.clone());
    let user = repo.get(id).await.map_err(from_data_error)?;
    Ok(Json(user))
}

/// POST /api/v1/users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserRecord>)> {
    require_role(&claims, Role::Admin)?;

    if req.password.len() < 8 {
        return Err(bad_request("Password must be at least 8 characters"));
    }
    if !req.email.contains('@') {
        return Err(bad_request("Invalid email address"));
    }

    let password_hash = hash_password(&req.password).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiErrorResponse::new("HASH_ERROR", e.to_string())),
        )
    })?;

    let repo = UserRepository::new(state.db.clone());
    let user = repo
        .create(&NewUser {
            email: req.email,
            password_hash,
            full_name: req.full_name,
            phone: req.phone,
            role: req.role.to_string(),
        })
        .await
        .map_err(from_data_error)?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// PUT /api/v1/users/{id}
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Path(id): Path<Uuid>,
    Json(update): Json<UserUpdate>,
) -> ApiResult<Json<UserRecord>> {
    require_role(&claims, Role::Admin)?;

    if let Some(role) = &update.role {
        role.parse::<Role>().map_err(bad_request)?;
    }

    let repo = UserRepository::new(state.db.clone());
    let user = repo.update(id, &update).await.map_err(from_data_error)?;
    Ok(Json(user))
}

/// DELETE /api/v1/users/{id}
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require_role(&claims, Role::Admin)?;

    let repo = UserRepository::new(state.db.clone());
    repo.delete(id).await.map_err(from_data_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn users_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
}
