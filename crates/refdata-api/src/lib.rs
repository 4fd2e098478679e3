//! REST API 서버.
//!
//! 이 crate는 다음을 제공합니다:
//! - Axum 기반 REST API (참조 데이터, 콘텐츠, 임포트)
//! - JWT 인증 및 역할 기반 인가
//! - 헬스 체크 엔드포인트
//! - OpenAPI 문서 및 Swagger UI
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`auth`]: JWT 인증 및 권한 관리
//! - [`openapi`]: OpenAPI 문서 및 Swagger UI
//! - [`error`]: 통합 API 에러 응답

pub mod auth;
pub mod error;
pub mod openapi;
pub mod routes;
pub mod state;

pub use auth::{
    create_token, decode_token, hash_password, verify_password, Claims, JwtAuth, JwtAuthError,
    JwtConfig, Role,
};
pub use error::{ApiErrorResponse, ApiResult};
pub use openapi::swagger_ui_router;
pub use routes::create_api_router;
pub use state::AppState;
