//! 공통 오류 타입.
//!
//! 이 crate의 실패 표면은 설정 로드뿐입니다. 도메인별 오류는 각
//! crate가 자체 타입(DataError, ImportError)으로 정의합니다.

use thiserror::Error;

/// 기반 crate 오류.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 설정 파일/환경 변수 로드 실패
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// 공통 Result 타입 별칭.
pub type Result<T> = std::result::Result<T, CoreError>;

impl From<config::ConfigError> for CoreError {
    fn from(e: config::ConfigError) -> Self {
        CoreError::ConfigError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_conversion() {
        let source = config::ConfigError::Message("invalid port value".to_string());
        let e = CoreError::from(source);

        assert!(matches!(e, CoreError::ConfigError(_)));
        assert_eq!(e.to_string(), "Configuration error: invalid port value");
    }
}
