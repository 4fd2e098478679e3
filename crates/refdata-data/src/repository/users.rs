//! 사용자 repository.
//!
//! 비밀번호 해시는 저장만 합니다 — 해싱/검증은 API 계층의 auth 모듈
//! 책임입니다. 직렬화 시 해시는 응답에 포함되지 않습니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{Page, Pagination};
use crate::database::Database;
use crate::error::{DataError, Result};

/// 사용자 레코드.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub phone: Option<String>,
    /// "USER" | "AUTHOR" | "ADMIN"
    pub role: String,
    pub verified: bool,
    pub thumbnail_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub verified: Option<bool>,
    pub thumbnail_id: Option<i32>,
}

pub struct UserRepository {
    db: Database,
}

impl UserRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list(&self, search: Option<&str>, pagination: Pagination) -> Result<Page<UserRecord>> {
        let pagination = pagination.clamped();

        let condition = r#"
            ($1::text IS NULL
             OR email ILIKE '%' || $1 || '%'
             OR full_name ILIKE '%' || $1 || '%')
        "#;

        let total: (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM users WHERE {}",
            condition
        ))
        .bind(search)
        .fetch_one(self.db.pool())
        .await?;

        let items = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT * FROM users WHERE {} ORDER BY created_at DESC LIMIT $2 OFFSET $3",
            condition
        ))
        .bind(search)
        .bind(pagination.limit)
        .bind(pagination.offset())
        .fetch_all(self.db.pool())
        .await?;

        Ok(Page::new(items, total.0, pagination))
    }

    pub async fn get(&self, id: Uuid) -> Result<UserRecord> {
        sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| DataError::NotFound(format!("User {}", id)))
    }

    /// 로그인용 조회. 없는 이메일은 `None` — 호출자가 균일한 인증 실패로
    /// 처리합니다.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            "SELECT * FROM users WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(self.db.pool())
        .await?;
        Ok(user)
    }

    pub async fn create(&self, input: &NewUser) -> Result<UserRecord> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (email, password_hash, full_name, phone, role)
            VALUES (LOWER($1), $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&input.email)
        .bind(&input.password_hash)
        .bind(&input.full_name)
        .bind(&input.phone)
        .bind(&input.role)
        .fetch_one(self.db.pool())
        .await?;

        Ok(record)
    }

    pub async fn update(&self, id: Uuid, update: &UserUpdate) -> Result<UserRecord> {
        sqlx::query_as::<_, UserRecord>(
            r#"
            UPDATE users SET
                full_name = COALESCE($2, full_name),
                phone = COALESCE($3, phone),
                role = COALESCE($4, role),
                verified = COALESCE($5, verified),
                thumbnail_id = COALESCE($6, thumbnail_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.full_name)
        .bind(&update.phone)
        .bind(&update.role)
        .bind(update.verified)
        .bind(update.thumbnail_id)
        .fetch_optional(self.db.pool())
        .await?
        .ok_or_else(|| DataError::NotFound(format!("User {}", id)))
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(DataError::NotFound(format!("User {}", id)));
        }
        Ok(())
    }
}
