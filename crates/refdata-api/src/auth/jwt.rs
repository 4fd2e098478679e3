//! JWT 토큰 처리.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};

use super::Role;

/// JWT Access Token 페이로드.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - 사용자 ID
    pub sub: String,
    /// 사용자 이메일
    pub email: String,
    /// 사용자 역할
    pub role: Role,
    /// Issued At (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// 새로운 Claims 생성.
    pub fn new(
        user_id: impl Into<String>,
        email: impl Into<String>,
        role: Role,
        expires_in_minutes: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.into(),
            email: email.into(),
            role,
            iat: now.timestamp(),
            exp: (now + Duration::minutes(expires_in_minutes)).timestamp(),
        }
    }

    /// 특정 역할 이상인지 확인.
    pub fn has_role(&self, required_role: Role) -> bool {
        self.role.level() >= required_role.level()
    }
}

/// JWT 처리 에러.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Token encoding failed: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),
    #[error("Token decoding failed")]
    DecodingError,
    #[error("Token expired")]
    TokenExpired,
    #[error("Invalid token")]
    InvalidToken,
}

/// Access Token 생성.
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(JwtError::from)
}

/// JWT 토큰 디코딩 및 검증.
pub fn decode_token(token: &str, secret: &str) -> Result<TokenData<Claims>, JwtError> {
    let mut validation = Validation::default();
    validation.validate_exp = true;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
        jsonwebtoken::errors::ErrorKind::InvalidToken => JwtError::InvalidToken,
        _ => JwtError::DecodingError,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "test-secret-key-for-jwt-testing-minimum-32-chars";

    #[test]
    fn test_create_and_decode_token() {
        let claims = Claims::new("user123", "admin@example.com", Role::Admin, 60);

        let token = create_token(&claims, TEST_SECRET).unwrap();
        assert!(!token.is_empty());

        let decoded = decode_token(&token, TEST_SECRET).unwrap();
        assert_eq!(decoded.claims.sub, "user123");
        assert_eq!(decoded.claims.email, "admin@example.com");
        assert_eq!(decoded.claims.role, Role::Admin);
    }

    #[test]
    fn test_claims_has_role() {
        let admin = Claims::new("a", "a@x.com", Role::Admin, 60);
        let author = Claims::new("b", "b@x.com", Role::Author, 60);

        assert!(admin.has_role(Role::Author));
        assert!(author.has_role(Role::User));
        assert!(!author.has_role(Role::Admin));
    }

    #[test]
    fn test_invalid_token() {
        assert!(decode_token("invalid.token.here", TEST_SECRET).is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let claims = Claims::new("user123", "u@x.com", Role::User, 60);
        let token = create_token(&claims, TEST_SECRET).unwrap();

        let result = decode_token(&token, "wrong-secret-key-for-testing-minimum-32-chars");
        assert!(result.is_err());
    }
}
