//! refdata 백엔드 공통 기반 crate.
//!
//! 이 crate는 다음을 제공합니다:
//! - 애플리케이션 설정 로드 (파일 + 환경 변수)
//! - tracing 기반 로깅 초기화
//! - 공통 오류 타입

pub mod config;
pub mod error;
pub mod logging;

pub use config::{AppConfig, AuthConfig, ImportConfig, ServerConfig};
pub use error::{CoreError, Result};
pub use logging::{init_logging, LogConfig, LogFormat};
