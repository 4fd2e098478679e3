//! 통합 API 에러 응답 타입.
//!
//! 모든 API 엔드포인트에서 일관된 에러 형식을 제공합니다.

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use refdata_data::DataError;
use refdata_import::ImportError;

/// 통합 API 에러 응답.
///
/// # 예시
///
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Stock AAPL not found",
///   "timestamp": 1738300800
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "DB_ERROR", "INVALID_FILE", "NOT_FOUND")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 에러 상세 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 에러 발생 타임스탬프 (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ApiErrorResponse {
    /// 기본 에러 생성 (타임스탬프 포함).
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }

    /// 상세 정보 포함 에러 생성.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details),
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiErrorResponse {}

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiErrorResponse>)>;

/// 데이터 계층 오류를 HTTP 응답으로 변환합니다.
pub fn from_data_error(e: DataError) -> (StatusCode, Json<ApiErrorResponse>) {
    match e {
        DataError::NotFound(msg) => (
            StatusCode::NOT_FOUND,
            Json(ApiErrorResponse::new("NOT_FOUND", msg)),
        ),
        DataError::DuplicateError(msg) => (
            StatusCode::CONFLICT,
            Json(ApiErrorResponse::new("DUPLICATE", msg)),
        ),
        DataError::InvalidData(msg) => (
            StatusCode::BAD_REQUEST,
            Json(ApiErrorResponse::new("INVALID_INPUT", msg)),
        ),
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiErrorResponse::new("DB_ERROR", other.to_string())),
        ),
    }
}

/// 임포트 계층 오류를 HTTP 응답으로 변환합니다.
///
/// 파일 전체 수준의 오류는 클라이언트 잘못(400)이고, 잡 조회 실패는 404,
/// 그 외 인프라 오류만 500입니다.
pub fn from_import_error(e: ImportError) -> (StatusCode, Json<ApiErrorResponse>) {
    match e {
        ImportError::UnsupportedFormat(_) | ImportError::ParseError(_) | ImportError::EmptyFile => {
            (
                StatusCode::BAD_REQUEST,
                Json(ApiErrorResponse::new("INVALID_FILE", e.to_string())),
            )
        }
        ImportError::JobNotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(ApiErrorResponse::new("JOB_NOT_FOUND", e.to_string())),
        ),
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiErrorResponse::new("IMPORT_ERROR", other.to_string())),
        ),
    }
}

/// 400 잘못된 요청.
pub fn bad_request(message: impl Into<String>) -> (StatusCode, Json<ApiErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiErrorResponse::new("INVALID_INPUT", message)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_response_new() {
        let error = ApiErrorResponse::new("TEST_ERROR", "Test message");
        assert_eq!(error.code, "TEST_ERROR");
        assert_eq!(error.message, "Test message");
        assert!(error.timestamp.is_some());
        assert!(error.details.is_none());
    }

    #[test]
    fn test_data_error_mapping() {
        let (status, _) = from_data_error(DataError::NotFound("Stock AAPL".to_string()));
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = from_data_error(DataError::DuplicateError("dup".to_string()));
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = from_data_error(DataError::QueryError("boom".to_string()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_import_error_mapping() {
        let (status, body) =
            from_import_error(ImportError::UnsupportedFormat("x.pdf".to_string()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.0.code, "INVALID_FILE");

        let (status, _) = from_import_error(ImportError::JobNotFound("j1".to_string()));
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
