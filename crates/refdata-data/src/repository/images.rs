//! 이미지 메타데이터 repository.
//!
//! 파일 본문 저장/서빙은 다루지 않고 메타데이터 레코드만 관리합니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{Page, Pagination};
use crate::database::Database;
use crate::error::{DataError, Result};

/// 이미지 메타데이터 레코드.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    pub id: i32,
    pub filename: String,
    pub processed_filename: String,
    pub path: String,
    pub url: String,
    pub alt_text: Option<String>,
    pub mimetype: Option<String>,
    pub size: Option<i64>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewImage {
    pub filename: String,
    pub processed_filename: String,
    pub path: String,
    pub url: String,
    pub alt_text: Option<String>,
    pub mimetype: Option<String>,
    pub size: Option<i64>,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

pub struct ImageRepository {
    db: Database,
}

impl ImageRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list(&self, search: Option<&str>, pagination: Pagination) -> Result<Page<ImageRecord>> {
        let pagination = pagination.clamped();

        let condition = "($1::text IS NULL OR filename ILIKE '%' || $1 || '%')";

        let total: (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM images WHERE {}",
            condition
        ))
        .bind(search)
        .fetch_one(self.db.pool())
        .await?;

        let items = sqlx::query_as::<_, ImageRecord>(&format!(
            "SELECT * FROM images WHERE {} ORDER BY created_at DESC LIMIT $2 OFFSET $3",
            condition
        ))
        .bind(search)
        .bind(pagination.limit)
        .bind(pagination.offset())
        .fetch_all(self.db.pool())
        .await?;

        Ok(Page::new(items, total.0, pagination))
    }

    pub async fn get(&self, id: i32) -> Result<ImageRecord> {
        sqlx::query_as::<_, ImageRecord>("SELECT * FROM images WHERE id = $1")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| DataError::NotFound(format!("Image {}", id)))
    }

    pub async fn create(&self, input: &NewImage) -> Result<ImageRecord> {
        let record = sqlx::query_as::<_, ImageRecord>(
            r#"
            INSERT INTO images
                (filename, processed_filename, path, url, alt_text, mimetype, size, width, height)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(&input.filename)
        .bind(&input.processed_filename)
        .bind(&input.path)
        .bind(&input.url)
        .bind(&input.alt_text)
        .bind(&input.mimetype)
        .bind(input.size)
        .bind(input.width)
        .bind(input.height)
        .fetch_one(self.db.pool())
        .await?;

        Ok(record)
    }

    /// 대체 텍스트만 수정 가능합니다.
    pub async fn update_alt_text(&self, id: i32, alt_text: Option<&str>) -> Result<ImageRecord> {
        sqlx::query_as::<_, ImageRecord>(
            "UPDATE images SET alt_text = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(alt_text)
        .fetch_optional(self.db.pool())
        .await?
        .ok_or_else(|| DataError::NotFound(format!("Image {}", id)))
    }

    pub async fn delete(&self, id: i32) -> Result<()> {
        let result = sqlx::query("DELETE FROM images WHERE id = $1")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(DataError::NotFound(format!("Image {}", id)));
        }
        Ok(())
    }
}
