//! HTTP 라우트 구성.

pub mod auth;
pub mod categories;
pub mod currencies;
pub mod currency_prices;
pub mod financial_metrics;
pub mod health;
pub mod images;
pub mod posts;
pub mod selected_stocks;
pub mod settings;
pub mod stock_prices;
pub mod stock_profiles;
pub mod stocks;
pub mod users;

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

/// 전체 API 라우터를 구성합니다.
pub fn create_api_router() -> Router<Arc<AppState>> {
    let v1 = Router::new()
        .nest("/auth", auth::auth_router())
        .nest("/stocks", stocks::stocks_router())
        .nest("/stock-profiles", stock_profiles::stock_profiles_router())
        .nest("/currencies", currencies::currencies_router())
        .nest("/stock-prices", stock_prices::stock_prices_router())
        .nest("/currency-prices", currency_prices::currency_prices_router())
        .nest("/financial-metrics", financial_metrics::financial_metrics_router())
        .nest("/selected-stocks", selected_stocks::selected_stocks_router())
        .nest("/settings", settings::settings_router())
        .nest("/posts", posts::posts_router())
        .nest("/categories", categories::categories_router())
        .nest("/images", images::images_router())
        .nest("/users", users::users_router());

    Router::new()
        .nest("/health", health::health_router())
        .nest("/api/v1", v1)
}
