//! 카테고리 repository. 게시물과 같은 소프트 삭제 구조입니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::posts::slugify;
use super::{Page, Pagination};
use crate::database::Database;
use crate::error::{DataError, Result};

/// 카테고리 레코드.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRecord {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub thumbnail_id: Option<i32>,
    pub parent_id: Option<Uuid>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub title: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub thumbnail_id: Option<i32>,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryUpdate {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub thumbnail_id: Option<i32>,
    pub parent_id: Option<Uuid>,
}

pub struct CategoryRepository {
    db: Database,
}

impl CategoryRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list(&self, search: Option<&str>, pagination: Pagination) -> Result<Page<CategoryRecord>> {
        let pagination = pagination.clamped();

        let condition = r#"
            deleted_at IS NULL
            AND ($1::text IS NULL OR title ILIKE '%' || $1 || '%')
        "#;

        let total: (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM categories WHERE {}",
            condition
        ))
        .bind(search)
        .fetch_one(self.db.pool())
        .await?;

        let items = sqlx::query_as::<_, CategoryRecord>(&format!(
            "SELECT * FROM categories WHERE {} ORDER BY title LIMIT $2 OFFSET $3",
            condition
        ))
        .bind(search)
        .bind(pagination.limit)
        .bind(pagination.offset())
        .fetch_all(self.db.pool())
        .await?;

        Ok(Page::new(items, total.0, pagination))
    }

    pub async fn get(&self, id: Uuid) -> Result<CategoryRecord> {
        sqlx::query_as::<_, CategoryRecord>(
            "SELECT * FROM categories WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?
        .ok_or_else(|| DataError::NotFound(format!("Category {}", id)))
    }

    pub async fn create(&self, input: &NewCategory) -> Result<CategoryRecord> {
        let slug = input
            .slug
            .clone()
            .unwrap_or_else(|| slugify(&input.title));

        let record = sqlx::query_as::<_, CategoryRecord>(
            r#"
            INSERT INTO categories (title, slug, description, thumbnail_id, parent_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&input.title)
        .bind(&slug)
        .bind(&input.description)
        .bind(input.thumbnail_id)
        .bind(input.parent_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(record)
    }

    pub async fn update(&self, id: Uuid, update: &CategoryUpdate) -> Result<CategoryRecord> {
        sqlx::query_as::<_, CategoryRecord>(
            r#"
            UPDATE categories SET
                title = COALESCE($2, title),
                slug = COALESCE($3, slug),
                description = COALESCE($4, description),
                thumbnail_id = COALESCE($5, thumbnail_id),
                parent_id = COALESCE($6, parent_id),
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.title)
        .bind(&update.slug)
        .bind(&update.description)
        .bind(update.thumbnail_id)
        .bind(update.parent_id)
        .fetch_optional(self.db.pool())
        .await?
        .ok_or_else(|| DataError::NotFound(format!("Category {}", id)))
    }

    /// 소프트 삭제.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "UPDATE categories SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DataError::NotFound(format!("Category {}", id)));
        }
        Ok(())
    }
}
