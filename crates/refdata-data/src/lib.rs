//! 영속성 계층.
//!
//! 이 crate는 다음을 제공합니다:
//! - PostgreSQL 연결 풀과 마이그레이션 ([`Database`])
//! - 엔티티별 repository (종목, 프로필, 통화, 주가, 환율, 재무지표,
//!   선정 종목, 설정, 게시물, 카테고리, 이미지, 사용자)
//! - 임포트 엔진용 [`refdata_import::ImportStrategy`] /
//!   [`refdata_import::ReferenceLookup`] 구현

pub mod database;
pub mod error;
pub mod import;
pub mod repository;

pub use database::{Database, DatabaseConfig};
pub use error::{DataError, Result};

pub use repository::categories::{CategoryRecord, CategoryRepository, CategoryUpdate, NewCategory};
pub use repository::currencies::{CurrencyRecord, CurrencyRepository};
pub use repository::currency_prices::{
    CurrencyPriceRecord, CurrencyPriceRepository, CurrencyPriceUpdate,
};
pub use repository::financial_metrics::{
    FinancialMetricRecord, FinancialMetricRepository, MetricFilter,
};
pub use repository::images::{ImageRecord, ImageRepository, NewImage};
pub use repository::posts::{NewPost, PostFilter, PostRecord, PostRepository, PostUpdate};
pub use repository::selected_stocks::{
    SelectedStockFilter, SelectedStockRepository, SelectedStockRow,
};
pub use repository::settings::{NewSetting, SettingRecord, SettingRepository, SettingUpdate};
pub use repository::stock_prices::{
    DateRange, StockPriceRecord, StockPriceRepository, StockPriceUpdate,
};
pub use repository::stock_profiles::{StockProfileRecord, StockProfileRepository};
pub use repository::stocks::{NewStock, StockFilter, StockRecord, StockRepository, StockUpdate};
pub use repository::users::{NewUser, UserRecord, UserRepository, UserUpdate};
pub use repository::{Page, Pagination};

pub use import::{
    CurrencyCodeLookup, CurrencyImportStrategy, CurrencyPriceImportStrategy,
    MetricImportStrategy, SelectedStockImportStrategy, StockPriceImportStrategy,
    StockProfileImportStrategy, StockSymbolLookup,
};
