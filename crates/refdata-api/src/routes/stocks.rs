//! 종목 endpoint.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use refdata_data::{NewStock, Page, Pagination, StockFilter, StockRecord, StockRepository, StockUpdate};

use crate::auth::{require_role, JwtAuth, Role};
use crate::error::{from_data_error, ApiResult};
use crate::state::AppState;

/// 목록 쿼리 파라미터.
#[derive(Debug, Default, Deserialize)]
pub struct StockListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub exchange: Option<String>,
    pub industry: Option<String>,
}

/// GET /api/v1/stocks
pub async fn list_stocks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StockListQuery>,
) -> ApiResult<Json<Page<StockRecord>>> {
    let pagination = Pagination {
        page: query.page.unwrap_or(1),
        limit: query.limit.unwrap_or(20),
    };
    let filter = StockFilter {
        search: query.search,
        exchange: query.exchange,
        industry: query.industry,
    };

    let repo = StockRepository::new(state.db.clone());
    let page = repo
        .list(&filter, pagination)
        .await
        .map_err(from_data_error)?;
    Ok(Json(page))
}

/// GET /api/v1/stocks/{symbol}
pub async fn get_stock(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> ApiResult<Json<StockRecord>> {
    let repo = StockRepository::new(state.db.clone());
    let stock = repo.get_by_symbol(&symbol).await.map_err(from_data_error)?;
    Ok(Json(stock))
}

/// POST /api/v1/stocks
pub async fn create_stock(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Json(input): Json<NewStock>,
) -> ApiResult<(StatusCode, Json<StockRecord>)> {
    require_role(&claims, Role::Admin)?;

    let repo = StockRepository::new(state.db.clone());
    let stock = repo.create(&input).await.map_err(from_data_error)?;
    Ok((StatusCode::CREATED, Json(stock)))
}

/// PUT /api/v1/stocks/{symbol}
pub async fn update_stock(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Path(symbol): Path<String>,
    Json(update): Json<StockUpdate>,
) -> ApiResult<Json<StockRecord>> {
    require_role(&claims, Role::Admin)?;

    let repo = StockRepository::new(state.db.clone());
    let stock = repo
        .update(&symbol, &update)
        .await
        .map_err(from_data_error)?;
    Ok(Json(stock))
}

/// DELETE /api/v1/stocks/{symbol}
pub async fn delete_stock(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    Path(symbol): Path<String>,
) -> ApiResult<StatusCode> {
    require_role(&claims, Role::Admin)?;

    let repo = StockRepository::new(state.db.clone());
    repo.delete(&symbol).await.map_err(from_data_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn stocks_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_stocks).post(create_stock))
        .route(
            "/{symbol}",
            get(get_stock).put(update_stock).delete(delete_stock),
        )
}
