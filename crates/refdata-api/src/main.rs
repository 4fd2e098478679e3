//! 참조 데이터 API 서버.
//!
//! Axum 기반 REST API 서버를 시작합니다.
//! 종목/통화/시세 참조 데이터, 대량 임포트, 콘텐츠 관리 엔드포인트를
//! 제공합니다.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, Extension, Router};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use refdata_api::openapi::swagger_ui_router;
use refdata_api::routes::create_api_router;
use refdata_api::state::AppState;
use refdata_api::JwtConfig;
use refdata_core::{init_logging, AppConfig, LogConfig, LogFormat};
use refdata_data::{Database, DatabaseConfig};

/// CORS 미들웨어 구성.
///
/// CORS_ORIGINS 환경변수가 설정되어 있으면 해당 origin만 허용합니다.
/// 설정되지 않으면 개발 모드로 간주하여 모든 origin을 허용합니다.
fn cors_layer() -> CorsLayer {
    let allow_origin = match std::env::var("CORS_ORIGINS") {
        Ok(origins) if !origins.is_empty() => {
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();

            if origins.is_empty() {
                warn!("CORS_ORIGINS is set but contains no valid origins, allowing any");
                AllowOrigin::any()
            } else {
                AllowOrigin::list(origins)
            }
        }
        _ => {
            warn!("CORS_ORIGINS not set, allowing any origin (development mode)");
            AllowOrigin::any()
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ])
}

/// 전체 라우터 구성.
fn create_router(state: Arc<AppState>, jwt_secret: String, timeout_secs: u64) -> Router {
    create_api_router()
        .merge(swagger_ui_router())
        .with_state(state)
        .layer(Extension(JwtConfig { secret: jwt_secret }))
        .layer(TraceLayer::new_for_http())
        // 전역 타임아웃 - 408 상태 코드 반환
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(timeout_secs),
        ))
        .layer(cors_layer())
}

/// 종료 시그널 대기 (Ctrl+C 또는 SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (없으면 무시)
    dotenvy::dotenv().ok();

    // 설정 로드
    let config = AppConfig::load_default()?;

    // tracing 초기화
    let format = config
        .logging
        .format
        .parse::<LogFormat>()
        .unwrap_or_default();
    init_logging(&LogConfig::new(config.logging.level.clone(), format));

    info!("Starting refdata API server...");

    if config.auth.jwt_secret == "change-me" {
        warn!("auth.jwt_secret is the default value (INSECURE, for development only)");
    }

    // 데이터베이스 연결 및 마이그레이션
    let db_config = DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        connect_timeout_secs: config.database.connect_timeout_secs,
        ..DatabaseConfig::default()
    };
    let db = Database::connect(&db_config).await?;
    db.migrate().await?;

    // 애플리케이션 상태 생성
    let jwt_secret = config.auth.jwt_secret.clone();
    let timeout_secs = config.server.request_timeout_secs;
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    let state = Arc::new(AppState::new(db, config));
    let app = create_router(state, jwt_secret, timeout_secs);

    // 서버 시작
    info!(%addr, "API server listening");
    info!("Swagger UI available at http://{}/swagger-ui", addr);
    info!("OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
