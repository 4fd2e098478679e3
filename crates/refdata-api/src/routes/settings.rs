//! 애플리케이션 설정 endpoint.
//!
//! 키-값 CRUD입니다. 키는 `group.name` 점 표기를 쓰며 `?group=`으로
//! 그룹 단위 조회가 가능합니다.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use refdata_data::{NewSetting, SettingRecord, SettingRepository, SettingUpdate};

use crate::auth::{require_role, JwtAuth, Role};
use crate::error::{bad_request, from_data_error, ApiResult};
use crate::state::AppState;

const SETTING_TYPES: [&str; 5] = ["text", "number", "boolean", "json", "image"];

fn check_setting_type(setting_type: &str) -> ApiResult<()> {
    if !SETTING_TYPES.contains(&setting_type) {
        return Err(bad_request(format!(
            "Invalid setting type: {} (expected one of text, number, boolean, json, image)",
            setting_type
        )));
    }
    Ok(())
}

/// 목록 쿼리 파라미터.
#[derive(Debug, Default, Deserialize)]
pub struct SettingListQuery {
    pub group: Option<String>,
}

/// GET /api/v1/settings
pub async fn list_settings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SettingListQuery>,
) -> ApiResult<Json<Vec<SettingRecord>>> {
    let repo = SettingRepository::new(state.db.clone());
    let settings = repo
        .list(query.group.as_deref())
        .await
        .map_err(from_data_error)?;
    Ok(Json(settings))
}

/// GET /api/v1/settings/{key}
pub async fn get_setting(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> ApiResult<Json<SettingRecord>> {
    let repo = SettingRepository::new(state.db.clone());
    let setting = repo.get(&key).await.map_err(from_data_error)?;
    Ok(Json(setting))
}

/// POST /api/v1/settings
pub async fn create_setting(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Json(input): Json<NewSetting>,
) -> ApiResult<(StatusCode, Json<SettingRecord>)> {
    require_role(&claims, Role::Admin)?;
    check_setting_type(&input.setting_type)?;

    if input.key.trim().is_empty() {
        return Err(bad_request("Setting key must not be empty"));
    }

    let repo = SettingRepository::new(state.db.clone());
    let setting = repo.create(&input).await.map_err(from_data_error)?;
    Ok((StatusCode::CREATED, Json(setting)))
}

/// PUT /api/v1/settings/{key}
pub async fn update_setting(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Path(key): Path<String>,
    Json(update): Json<SettingUpdate>,
) -> ApiResult<Json<SettingRecord>> {
    require_role(&claims, Role::Admin)?;
    if let Some(setting_type) = &update.setting_type {
        check_setting_type(setting_type)?;
    }

    let repo = SettingRepository::new(state.db.clone());
    let setting = repo.update(&key, &update).await.map_err(from_data_error)?;
    Ok(Json(setting))
}

/// DELETE /api/v1/settings/{key}
pub async fn delete_setting(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Path(key): Path<String>,
) -> ApiResult<StatusCode> {
    require_role(&claims, Role::Admin)?;

    let repo = SettingRepository::new(state.db.clone());
    repo.delete(&key).await.map_err(from_data_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn settings_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_settings).post(create_setting))
        .route(
            "/{key}",
            get(get_setting).put(update_setting).delete(delete_setting),
        )
}
