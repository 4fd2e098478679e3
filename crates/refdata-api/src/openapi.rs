//! OpenAPI 문서 정의.
//!
//! utoipa 기반으로 API 문서를 자동 생성합니다.
//! Swagger UI는 `/swagger-ui`, JSON 스펙은 `/api-docs/openapi.json`에서
//! 제공됩니다.

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// ==================== 각 모듈에서 스키마 Import ====================

use crate::auth::Role;
use crate::error::ApiErrorResponse;
use crate::routes::auth::{LoginRequest, LoginResponse, MeResponse, RegisterRequest};
use crate::routes::currencies::CurrencyInput;
use crate::routes::health::HealthResponse;
use crate::routes::images::AltTextUpdate;
use crate::routes::stock_prices::UploadAccepted;
use crate::routes::users::CreateUserRequest;

// ==================== OpenAPI 문서 정의 ====================

/// Refdata API 문서.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Refdata API",
        version = "0.1.0",
        description = r#"
# 금융 참조 데이터 REST API

종목/통화/주가/환율/재무지표 참조 데이터와 콘텐츠(게시물, 카테고리,
이미지)를 관리하는 백엔드입니다.

## 대량 임포트

- CSV/XLSX 파일 업로드는 멀티파트 `file` 파트로 전달합니다.
- 행 수가 임계치 미만이면 응답에 결과 요약이 바로 담기고,
  이상이면 202와 잡 ID가 반환됩니다. `GET .../jobs/{id}`로 진행률을
  폴링하세요.

## 인증

쓰기 엔드포인트는 JWT Bearer 토큰 인증이 필요합니다.
`Authorization: Bearer <token>` 헤더를 포함하세요.
"#
    ),
    servers(
        (url = "http://localhost:3000", description = "로컬 개발 서버"),
    ),
    tags(
        (name = "health", description = "헬스 체크 - 서버 상태 확인"),
        (name = "auth", description = "인증 - 로그인/가입/토큰"),
        (name = "stocks", description = "종목 - 종목 참조 데이터 CRUD"),
        (name = "stock-profiles", description = "종목 프로필 - 지표 스냅샷 CRUD 및 임포트"),
        (name = "currencies", description = "통화 - 통화 목록 CRUD 및 임포트"),
        (name = "stock-prices", description = "주가 - 시세 조회 및 대량 업로드"),
        (name = "currency-prices", description = "환율 - 시세 조회 및 대량 업로드"),
        (name = "financial-metrics", description = "재무지표 - CRUD 및 대량 등록"),
        (name = "selected-stocks", description = "선정 종목 - 전략 선정 결과 조회 및 대량 등록"),
        (name = "settings", description = "설정 - 애플리케이션 키-값 설정"),
        (name = "posts", description = "게시물 - 콘텐츠 CRUD"),
        (name = "categories", description = "카테고리 - 콘텐츠 분류"),
        (name = "images", description = "이미지 - 메타데이터 관리"),
        (name = "users", description = "사용자 - 계정 관리 (관리자 전용)")
    ),
    // ==================== 스키마 등록 ====================
    components(
        schemas(
            // ===== Common =====
            ApiErrorResponse,

            // ===== Health =====
            HealthResponse,

            // ===== Auth =====
            Role,
            LoginRequest,
            LoginResponse,
            RegisterRequest,
            MeResponse,

            // ===== Import =====
            UploadAccepted,

            // ===== Entities =====
            CurrencyInput,
            AltTextUpdate,
            CreateUserRequest,
        )
    ),
    // ==================== 경로 등록 ====================
    paths(
        crate::routes::health::health_check,
        crate::routes::health::health_ready,
    )
)]
pub struct ApiDoc;

// ==================== Swagger UI 라우터 ====================

/// Swagger UI 라우터 생성.
///
/// 다음 경로에 문서 UI를 마운트합니다:
/// - `/swagger-ui` - Swagger UI 대화형 문서
/// - `/api-docs/openapi.json` - OpenAPI JSON 스펙
pub fn swagger_ui_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}

// ==================== 테스트 ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_builds() {
        let spec = ApiDoc::openapi();
        let json = spec.to_json().unwrap();
        assert!(json.contains("Refdata API"));
        assert!(json.contains("/health"));
    }
}
