//! 인증 endpoint.
//!
//! 로그인은 이메일 존재 여부와 비밀번호 불일치를 구분하지 않습니다 —
//! 계정 존재 여부가 응답 시간 외로 새지 않게 균일한 실패를 반환합니다.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use refdata_data::{NewUser, UserRepository};

use crate::auth::{create_token, hash_password, verify_password, Claims, JwtAuth, Role};
use crate::error::{bad_request, from_data_error, ApiErrorResponse, ApiResult};
use crate::state::AppState;

/// 로그인 요청.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// 로그인 응답.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    /// 토큰 타입 (항상 "Bearer")
    pub token_type: String,
    /// 만료까지 남은 시간 (초)
    pub expires_in: i64,
}

/// 회원 가입 요청.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
}

/// 현재 사용자 정보.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: String,
    pub email: String,
    pub role: Role,
}

fn invalid_credentials() -> (StatusCode, Json<ApiErrorResponse>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(ApiErrorResponse::new(
            "INVALID_CREDENTIALS",
            "Invalid email or password",
        )),
    )
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let repo = UserRepository::new(state.db.clone());
    let user = repo
        .find_by_email(&req.email)
        .await
        .map_err(from_data_error)?
        .ok_or_else(invalid_credentials)?;

    if !verify_password(&req.password, &user.password_hash) {
        return Err(invalid_credentials());
    }

    let role: Role = user.role.parse().map_err(|_| invalid_credentials())?;
    let expiry_minutes = state.config.auth.token_expiry_minutes;
    let claims = Claims::new(user.id.to_string(), &user.email, role, expiry_minutes);
    let token = create_token(&claims, &state.config.auth.jwt_secret).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiErrorResponse::new("TOKEN_ERROR", e.to_string())),
        )
    })?;

    Ok(Json(LoginResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: expiry_minutes * 60,
    }))
}

/// POST /api/v1/auth/register
///
/// 가입 사용자는 USER 역할로 시작합니다. 역할 승격은 관리자 전용입니다.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<MeResponse>)> {
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
            role: Role::User.to_string(),
        })
        .await
        .map_err(from_data_error)?;

    Ok((
        StatusCode::CREATED,
        Json(MeResponse {
            id: user.id.to_string(),
            email: user.email,
            role: Role::User,
        }),
    ))
}

/// GET /api/v1/auth/me
pub async fn me(JwtAuth(claims): JwtAuth) -> Json<MeResponse> {
    Json(MeResponse {
        id: claims.sub,
        email: claims.email,
        role: claims.role,
    })
}

pub fn auth_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/me", get(me))
}
