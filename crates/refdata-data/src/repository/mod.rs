//! 엔티티별 repository.
//!
//! 모든 repository는 [`crate::Database`]를 소유하며 런타임 바인딩 쿼리를
//! 사용합니다. 목록 조회는 공통 페이지네이션 타입을 공유합니다.

use serde::{Deserialize, Serialize};

pub mod categories;
pub mod currencies;
pub mod currency_prices;
pub mod financial_metrics;
pub mod images;
pub mod posts;
pub mod selected_stocks;
pub mod settings;
pub mod stock_prices;
pub mod stock_profiles;
pub mod stocks;
pub mod users;

/// 목록 조회 페이지네이션 파라미터.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}
fn default_limit() -> i64 {
    20
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 1, limit: 20 }
    }
}

impl Pagination {
    /// 페이지/한도를 유효 범위로 고정합니다. 한도 상한은 100.
    pub fn clamped(self) -> Self {
        Self {
            page: self.page.max(1),
            limit: self.limit.clamp(1, 100),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

/// 페이지네이션된 목록 결과.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, pagination: Pagination) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + pagination.limit - 1) / pagination.limit
        };
        Self {
            items,
            total,
            page: pagination.page,
            limit: pagination.limit,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_clamping() {
        let p = Pagination { page: 0, limit: 5000 }.clamped();
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, 100);
        assert_eq!(p.offset(), 0);

        let p = Pagination { page: 3, limit: 20 }.clamped();
        assert_eq!(p.offset(), 40);
    }

    #[test]
    fn test_page_total_pages() {
        let page = Page::new(vec![1, 2, 3], 41, Pagination { page: 1, limit: 20 });
        assert_eq!(page.total_pages, 3);

        let empty: Page<i32> = Page::new(vec![], 0, Pagination::default());
        assert_eq!(empty.total_pages, 0);
    }
}
