//! 헬스 체크 endpoint.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::state::AppState;

/// 상세 헬스 체크 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// 전체 서비스 상태 ("healthy" | "unhealthy")
    pub status: String,
    /// API 버전
    pub version: String,
    /// 현재 시간 (ISO 8601)
    pub timestamp: String,
    /// 데이터베이스 상태 ("up" | "down")
    pub database: String,
}

/// 간단한 헬스 체크 (liveness probe용).
///
/// GET /health
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "서버 동작 중")
    )
)]
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// 상세 헬스 체크 (readiness probe용).
///
/// GET /health/ready
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "모든 구성 요소 정상", body = HealthResponse),
        (status = 503, description = "데이터베이스 연결 불가", body = HealthResponse)
    )
)]
pub async fn health_ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let db_ok = state.db.health_check().await.is_ok();

    let (status_code, status, database) = if db_ok {
        (StatusCode::OK, "healthy", "up")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy", "down")
    };

    (
        status_code,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            database: database.to_string(),
        }),
    )
}

pub fn health_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(health_check))
        .route("/ready", get(health_ready))
}
