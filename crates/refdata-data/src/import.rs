//! 임포트 엔진 연결부.
//!
//! refdata-import의 [`ImportStrategy`] / [`ReferenceLookup`] 트레이트를
//! sqlx repository로 구현합니다. 레코드 하나의 저장 실패는 행 오류
//! 문자열로 보고되어 배치가 계속됩니다 — 원장에는 해당 행만 실패로
//! 남습니다.

use std::collections::HashSet;

use async_trait::async_trait;

use refdata_import::{
    CurrencyRecord, ImportError, ImportStrategy, MetricRecord, PriceRecord, ProfileRecord,
    ReferenceLookup, SelectedStockRecord, UpsertOutcome,
};

use crate::database::Database;
use crate::repository::currencies::CurrencyRepository;
use crate::repository::currency_prices::CurrencyPriceRepository;
use crate::repository::financial_metrics::FinancialMetricRepository;
use crate::repository::selected_stocks::SelectedStockRepository;
use crate::repository::stock_prices::StockPriceRepository;
use crate::repository::stock_profiles::StockProfileRepository;
use crate::repository::stocks::StockRepository;

type RecordOutcome = std::result::Result<UpsertOutcome, String>;

/// 주가 업로드 전략 — (symbol, date) 키 덮어쓰기 upsert.
pub struct StockPriceImportStrategy {
    repo: StockPriceRepository,
}

impl StockPriceImportStrategy {
    pub fn new(db: Database) -> Self {
        Self {
            repo: StockPriceRepository::new(db),
        }
    }
}

#[async_trait]
impl ImportStrategy for StockPriceImportStrategy {
    type Record = PriceRecord;

    fn entity(&self) -> &'static str {
        "stock-price"
    }

    async fn upsert_batch(
        &self,
        records: &[PriceRecord],
    ) -> refdata_import::Result<Vec<RecordOutcome>> {
        let mut outcomes = Vec::with_capacity(records.len());
        for record in records {
            outcomes.push(match self.repo.upsert(record).await {
                Ok(true) => Ok(UpsertOutcome::Created),
                Ok(false) => Ok(UpsertOutcome::Updated),
                Err(e) => Err(e.to_string()),
            });
        }
        Ok(outcomes)
    }
}

/// 환율 업로드 전략 — (currency_code, date) 키 덮어쓰기 upsert.
pub struct CurrencyPriceImportStrategy {
    repo: CurrencyPriceRepository,
}

impl CurrencyPriceImportStrategy {
    pub fn new(db: Database) -> Self {
        Self {
            repo: CurrencyPriceRepository::new(db),
        }
    }
}

#[async_trait]
impl ImportStrategy for CurrencyPriceImportStrategy {
    type Record = PriceRecord;

    fn entity(&self) -> &'static str {
        "currency-price"
    }

    async fn upsert_batch(
        &self,
        records: &[PriceRecord],
    ) -> refdata_import::Result<Vec<RecordOutcome>> {
        let mut outcomes = Vec::with_capacity(records.len());
        for record in records {
            outcomes.push(match self.repo.upsert(record).await {
                Ok(true) => Ok(UpsertOutcome::Created),
                Ok(false) => Ok(UpsertOutcome::Updated),
                Err(e) => Err(e.to_string()),
            });
        }
        Ok(outcomes)
    }
}

/// 통화 목록 임포트 전략 — 기존 코드는 건너뜁니다.
pub struct CurrencyImportStrategy {
    repo: CurrencyRepository,
}

impl CurrencyImportStrategy {
    pub fn new(db: Database) -> Self {
        Self {
            repo: CurrencyRepository::new(db),
        }
    }
}

#[async_trait]
impl ImportStrategy for CurrencyImportStrategy {
    type Record = CurrencyRecord;

    fn entity(&self) -> &'static str {
        "currency"
    }

    async fn upsert_batch(
        &self,
        records: &[CurrencyRecord],
    ) -> refdata_import::Result<Vec<RecordOutcome>> {
        let mut outcomes = Vec::with_capacity(records.len());
        for record in records {
            outcomes.push(
                match self.repo.insert_if_absent(&record.code, &record.name).await {
                    Ok(true) => Ok(UpsertOutcome::Created),
                    Ok(false) => Ok(UpsertOutcome::Skipped),
                    Err(e) => Err(e.to_string()),
                },
            );
        }
        Ok(outcomes)
    }
}

/// 재무지표 대량 등록 전략 — 자연 키가 이미 있으면 건너뜁니다.
pub struct MetricImportStrategy {
    repo: FinancialMetricRepository,
}

impl MetricImportStrategy {
    pub fn new(db: Database) -> Self {
        Self {
            repo: FinancialMetricRepository::new(db),
        }
    }
}

#[async_trait]
impl ImportStrategy for MetricImportStrategy {
    type Record = MetricRecord;

    fn entity(&self) -> &'static str {
        "financial-metric"
    }

    async fn upsert_batch(
        &self,
        records: &[MetricRecord],
    ) -> refdata_import::Result<Vec<RecordOutcome>> {
        let mut outcomes = Vec::with_capacity(records.len());
        for record in records {
            outcomes.push(match self.repo.insert_if_absent(record).await {
                Ok(true) => Ok(UpsertOutcome::Created),
                Ok(false) => Ok(UpsertOutcome::Skipped),
                Err(e) => Err(e.to_string()),
            });
        }
        Ok(outcomes)
    }
}

/// 종목 프로필 임포트 전략 — 심볼 단독 키 덮어쓰기 upsert.
pub struct StockProfileImportStrategy {
    repo: StockProfileRepository,
}

impl StockProfileImportStrategy {
    pub fn new(db: Database) -> Self {
        Self {
            repo: StockProfileRepository::new(db),
        }
    }
}

#[async_trait]
impl ImportStrategy for StockProfileImportStrategy {
    type Record = ProfileRecord;

    fn entity(&self) -> &'static str {
        "stock-profile"
    }

    async fn upsert_batch(
        &self,
        records: &[ProfileRecord],
    ) -> refdata_import::Result<Vec<RecordOutcome>> {
        let mut outcomes = Vec::with_capacity(records.len());
        for record in records {
            outcomes.push(match self.repo.upsert(record).await {
                Ok(true) => Ok(UpsertOutcome::Created),
                Ok(false) => Ok(UpsertOutcome::Updated),
                Err(e) => Err(e.to_string()),
            });
        }
        Ok(outcomes)
    }
}

/// 선정 종목 대량 등록 전략 — (symbol, date) 키 덮어쓰기 upsert.
pub struct SelectedStockImportStrategy {
    repo: SelectedStockRepository,
}

impl SelectedStockImportStrategy {
    pub fn new(db: Database) -> Self {
        Self {
            repo: SelectedStockRepository::new(db),
        }
    }
}

#[async_trait]
impl ImportStrategy for SelectedStockImportStrategy {
    type Record = SelectedStockRecord;

    fn entity(&self) -> &'static str {
        "selected-stock"
    }

    async fn upsert_batch(
        &self,
        records: &[SelectedStockRecord],
    ) -> refdata_import::Result<Vec<RecordOutcome>> {
        let mut outcomes = Vec::with_capacity(records.len());
        for record in records {
            outcomes.push(match self.repo.upsert(record).await {
                Ok(true) => Ok(UpsertOutcome::Created),
                Ok(false) => Ok(UpsertOutcome::Updated),
                Err(e) => Err(e.to_string()),
            });
        }
        Ok(outcomes)
    }
}

// ==================== 참조 검증 lookup ====================

/// 종목 심볼 존재 확인.
pub struct StockSymbolLookup {
    repo: StockRepository,
}

impl StockSymbolLookup {
    pub fn new(db: Database) -> Self {
        Self {
            repo: StockRepository::new(db),
        }
    }
}

#[async_trait]
impl ReferenceLookup for StockSymbolLookup {
    async fn existing_codes(
        &self,
        codes: &[String],
    ) -> refdata_import::Result<HashSet<String>> {
        let found = self
            .repo
            .existing_symbols(codes)
            .await
            .map_err(|e| ImportError::LookupError(e.to_string()))?;
        Ok(found.into_iter().collect())
    }
}

/// 통화 코드 존재 확인.
pub struct CurrencyCodeLookup {
    repo: CurrencyRepository,
}

impl CurrencyCodeLookup {
    pub fn new(db: Database) -> Self {
        Self {
            repo: CurrencyRepository::new(db),
        }
    }
}

#[async_trait]
impl ReferenceLookup for CurrencyCodeLookup {
    async fn existing_codes(
        &self,
        codes: &[String],
    ) -> refdata_import::Result<HashSet<String>> {
        let found = self
            .repo
            .existing_codes(codes)
            .await
            .map_err(|e| ImportError::LookupError(e.to_string()))?;
        Ok(found.into_iter().collect())
    }
}
