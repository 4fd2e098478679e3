//! 애플리케이션 설정(키-값) repository.
//!
//! 키가 자연 키입니다. 키는 `group.name` 형태의 점 표기를 쓰므로
//! 그룹 단위 조회는 `group.` 접두사 매칭으로 처리합니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{DataError, Result};

/// 설정 레코드.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SettingRecord {
    pub id: Uuid,
    pub key: String,
    pub value: String,
    pub description: Option<String>,
    /// 값 해석 힌트 (text, number, boolean, json, image)
    pub setting_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 설정 생성 입력.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSetting {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
    #[serde(default = "default_setting_type")]
    pub setting_type: String,
}

fn default_setting_type() -> String {
    "text".to_string()
}

/// 설정 수정 입력. 비어 있는 필드는 기존 값을 유지합니다.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingUpdate {
    pub value: Option<String>,
    pub description: Option<String>,
    pub setting_type: Option<String>,
}

pub struct SettingRepository {
    db: Database,
}

impl SettingRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// 설정 목록을 키순으로 조회합니다. `group`이 주어지면 해당 그룹의
    /// 키(`group.` 접두사)만 반환합니다.
    pub async fn list(&self, group: Option<&str>) -> Result<Vec<SettingRecord>> {
        let prefix = group.map(|g| format!("{}.%", g));
        let rows = sqlx::query_as::<_, SettingRecord>(
            r#"
            SELECT * FROM settings
            WHERE ($1::text IS NULL OR key LIKE $1)
            ORDER BY key
            "#,
        )
        .bind(prefix)
        .fetch_all(self.db.pool())
        .await?;
        Ok(rows)
    }

    /// 키로 설정을 조회합니다.
    pub async fn get(&self, key: &str) -> Result<SettingRecord> {
        sqlx::query_as::<_, SettingRecord>("SELECT * FROM settings WHERE key = $1")
            .bind(key)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| DataError::NotFound(format!("Setting {}", key)))
    }

    /// 설정을 생성합니다. 키 중복은 DuplicateError.
    pub async fn create(&self, setting: &NewSetting) -> Result<SettingRecord> {
        let record = sqlx::query_as::<_, SettingRecord>(
            r#"
            INSERT INTO settings (key, value, description, setting_type)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&setting.key)
        .bind(&setting.value)
        .bind(&setting.description)
        .bind(&setting.setting_type)
        .fetch_one(self.db.pool())
        .await?;

        Ok(record)
    }

    /// 설정을 수정합니다.
    pub async fn update(&self, key: &str, update: &SettingUpdate) -> Result<SettingRecord> {
        sqlx::query_as::<_, SettingRecord>(
            r#"
            UPDATE settings SET
                value = COALESCE($2, value),
                description = COALESCE($3, description),
                setting_type = COALESCE($4, setting_type),
                updated_at = NOW()
            WHERE key = $1
            RETURNING *
            "#,
        )
        .bind(key)
        .bind(&update.value)
        .bind(&update.description)
        .bind(&update.setting_type)
        .fetch_optional(self.db.pool())
        .await?
        .ok_or_else(|| DataError::NotFound(format!("Setting {}", key)))
    }

    /// 설정을 삭제합니다.
    pub async fn delete(&self, key: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM settings WHERE key = $1")
            .bind(key)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(DataError::NotFound(format!("Setting {}", key)));
        }
        Ok(())
    }
}
