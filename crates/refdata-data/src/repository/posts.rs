//! 게시물 repository. 삭제는 소프트 삭제(`deleted_at`)입니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{Page, Pagination};
use crate::database::Database;
use crate::error::{DataError, Result};

/// 게시물 레코드.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub thumbnail_id: Option<i32>,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub author_id: Uuid,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub title: String,
    /// 생략 시 제목에서 생성
    pub slug: Option<String>,
    pub content: String,
    pub excerpt: Option<String>,
    pub thumbnail_id: Option<i32>,
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostUpdate {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub thumbnail_id: Option<i32>,
    pub published: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostFilter {
    pub search: Option<String>,
    pub author_id: Option<Uuid>,
    pub published: Option<bool>,
}

pub struct PostRepository {
    db: Database,
}

impl PostRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list(&self, filter: &PostFilter, pagination: Pagination) -> Result<Page<PostRecord>> {
        let pagination = pagination.clamped();

        let condition = r#"
            deleted_at IS NULL
            AND ($1::text IS NULL OR title ILIKE '%' || $1 || '%')
            AND ($2::uuid IS NULL OR author_id = $2)
            AND ($3::bool IS NULL OR published = $3)
        "#;

        let total: (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM posts WHERE {}",
            condition
        ))
        .bind(&filter.search)
        .bind(filter.author_id)
        .bind(filter.published)
        .fetch_one(self.db.pool())
        .await?;

        let items = sqlx::query_as::<_, PostRecord>(&format!(
            "SELECT * FROM posts WHERE {} ORDER BY created_at DESC LIMIT $4 OFFSET $5",
            condition
        ))
        .bind(&filter.search)
        .bind(filter.author_id)
        .bind(filter.published)
        .bind(pagination.limit)
        .bind(pagination.offset())
        .fetch_all(self.db.pool())
        .await?;

        Ok(Page::new(items, total.0, pagination))
    }

    pub async fn get(&self, id: Uuid) -> Result<PostRecord> {
        sqlx::query_as::<_, PostRecord>(
            "SELECT * FROM posts WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?
        .ok_or_else(|| DataError::NotFound(format!("Post {}", id)))
    }

    pub async fn create(&self, input: &NewPost, author_id: Uuid) -> Result<PostRecord> {
        let slug = input
            .slug
            .clone()
            .unwrap_or_else(|| slugify(&input.title));
        let published_at = input.published.then(Utc::now);

        let record = sqlx::query_as::<_, PostRecord>(
            r#"
            INSERT INTO posts
                (title, slug, content, excerpt, thumbnail_id, published, published_at, author_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&input.title)
        .bind(&slug)
        .bind(&input.content)
        .bind(&input.excerpt)
        .bind(input.thumbnail_id)
        .bind(input.published)
        .bind(published_at)
        .bind(author_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(record)
    }

    pub async fn update(&self, id: Uuid, update: &PostUpdate) -> Result<PostRecord> {
        sqlx::query_as::<_, PostRecord>(
            r#"
            UPDATE posts SET
                title = COALESCE($2, title),
                slug = COALESCE($3, slug),
                content = COALESCE($4, content),
                excerpt = COALESCE($5, excerpt),
                thumbnail_id = COALESCE($6, thumbnail_id),
                published = COALESCE($7, published),
                published_at = CASE
                    WHEN $7 = true AND published_at IS NULL THEN NOW()
                    ELSE published_at
                END,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.title)
        .bind(&update.slug)
        .bind(&update.content)
        .bind(&update.excerpt)
        .bind(update.thumbnail_id)
        .bind(update.published)
        .fetch_optional(self.db.pool())
        .await?
        .ok_or_else(|| DataError::NotFound(format!("Post {}", id)))
    }

    /// 소프트 삭제.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "UPDATE posts SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DataError::NotFound(format!("Post {}", id)));
        }
        Ok(())
    }
}

/// 제목을 URL 슬러그로 변환합니다.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_dash = true;

    for c in title.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }

    slug.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  Q1 2024: Market Review!  "), "q1-2024-market-review");
        assert_eq!(slugify("already-a-slug"), "already-a-slug");
    }
}
