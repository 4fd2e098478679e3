//! Axum용 JWT 인증 추출기.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use super::{decode_token, Claims, Role};
use crate::error::ApiErrorResponse;

/// JWT 인증 추출기.
///
/// # 사용 예시
///
/// ```rust,ignore
/// async fn protected_handler(
///     JwtAuth(claims): JwtAuth,
/// ) -> impl IntoResponse {
///     format!("Authenticated user: {}", claims.email)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct JwtAuth(pub Claims);

/// JWT 인증 에러.
#[derive(Debug, thiserror::Error)]
pub enum JwtAuthError {
    #[error("Authentication token required")]
    MissingToken,
    #[error("Invalid Authorization header format")]
    InvalidAuthHeader,
    #[error("Token expired")]
    TokenExpired,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Insufficient permission")]
    InsufficientPermission,
}

impl IntoResponse for JwtAuthError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            JwtAuthError::MissingToken => (StatusCode::UNAUTHORIZED, "MISSING_TOKEN"),
            JwtAuthError::InvalidAuthHeader => (StatusCode::UNAUTHORIZED, "INVALID_AUTH_HEADER"),
            JwtAuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED"),
            JwtAuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            JwtAuthError::InsufficientPermission => {
                (StatusCode::FORBIDDEN, "INSUFFICIENT_PERMISSION")
            }
        };

        (status, Json(ApiErrorResponse::new(code, self.to_string()))).into_response()
    }
}

/// JWT 비밀 키 저장소.
///
/// 서버 구성 시 `Extension`으로 주입되어 추출기가 접근합니다.
#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
}

impl<S> FromRequestParts<S> for JwtAuth
where
    S: Send + Sync,
{
    type Rejection = JwtAuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(JwtAuthError::MissingToken)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(JwtAuthError::InvalidAuthHeader)?;

        let jwt_secret = parts
            .extensions
            .get::<JwtConfig>()
            .map(|c| c.secret.clone())
            .ok_or(JwtAuthError::InvalidToken)?;

        let token_data = decode_token(token, &jwt_secret).map_err(|e| match e {
            super::jwt::JwtError::TokenExpired => JwtAuthError::TokenExpired,
            _ => JwtAuthError::InvalidToken,
        })?;

        Ok(JwtAuth(token_data.claims))
    }
}

/// 핸들러 내 역할 검사 헬퍼.
///
/// 추출기는 토큰 유효성만 보장하므로 역할 요건은 핸들러가 선언합니다.
/// `ApiResult` 핸들러에서 `?`로 바로 사용할 수 있습니다.
pub fn require_role(
    claims: &Claims,
    role: Role,
) -> Result<(), (StatusCode, Json<ApiErrorResponse>)> {
    if claims.has_role(role) {
        Ok(())
    } else {
        Err((
            StatusCode::FORBIDDEN,
            Json(ApiErrorResponse::new(
                "INSUFFICIENT_PERMISSION",
                format!("Requires {} role or higher", role),
            )),
        ))
    }
}
