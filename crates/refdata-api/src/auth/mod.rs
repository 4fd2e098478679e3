//! 인증/인가.
//!
//! JWT 발급·검증, argon2 비밀번호 해싱, axum 인증 추출기를 제공합니다.

pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::{create_token, decode_token, Claims, JwtError};
pub use middleware::{require_role, JwtAuth, JwtAuthError, JwtConfig};
pub use password::{hash_password, verify_password};

use serde::{Deserialize, Serialize};

/// 사용자 역할.
///
/// 역할은 계층적입니다 — 상위 역할은 하위 역할의 권한을 포함합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// 읽기 전용 일반 사용자
    User,
    /// 콘텐츠 작성자 (게시물/카테고리/이미지 관리)
    Author,
    /// 관리자 (참조 데이터/임포트/사용자 관리)
    Admin,
}

impl Role {
    /// 역할 서열. 비교에 사용합니다.
    pub fn level(&self) -> u8 {
        match self {
            Role::User => 1,
            Role::Author => 2,
            Role::Admin => 3,
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "USER" => Ok(Role::User),
            "AUTHOR" => Ok(Role::Author),
            "ADMIN" => Ok(Role::Admin),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::User => "USER",
            Role::Author => "AUTHOR",
            Role::Admin => "ADMIN",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_hierarchy() {
        assert!(Role::Admin.level() > Role::Author.level());
        assert!(Role::Author.level() > Role::User.level());
    }

    #[test]
    fn test_role_round_trip() {
        for role in [Role::User, Role::Author, Role::Admin] {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
        }
        assert!("root".parse::<Role>().is_err());
    }
}
