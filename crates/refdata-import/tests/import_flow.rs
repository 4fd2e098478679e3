//! 파일 바이트에서 잡 종결까지의 임포트 파이프라인 통합 테스트.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use refdata_import::{
    parser, validate, BatchImporter, FileFormat, FileJobStore, ImportStrategy, JobLedger,
    JobStatus, ParsedRow, PriceRecord, ReferenceLookup, Result, UpsertOutcome,
};

/// (코드, 날짜)를 키로 쓰는 인메모리 가격 저장소.
struct InMemoryPriceStore {
    prices: Mutex<HashMap<(String, NaiveDate), PriceRecord>>,
}

impl InMemoryPriceStore {
    fn new() -> Self {
        Self {
            prices: Mutex::new(HashMap::new()),
        }
    }

    fn len(&self) -> usize {
        self.prices.lock().unwrap().len()
    }
}

#[async_trait]
impl ImportStrategy for InMemoryPriceStore {
    type Record = PriceRecord;

    fn entity(&self) -> &'static str {
        "stock-price"
    }

    async fn upsert_batch(
        &self,
        records: &[PriceRecord],
    ) -> Result<Vec<std::result::Result<UpsertOutcome, String>>> {
        let mut prices = self.prices.lock().unwrap();
        Ok(records
            .iter()
            .map(|r| {
                let key = (r.code.clone(), r.date);
                let outcome = if prices.insert(key, r.clone()).is_some() {
                    UpsertOutcome::Updated
                } else {
                    UpsertOutcome::Created
                };
                Ok(outcome)
            })
            .collect())
    }
}

struct KnownStocks(HashSet<String>);

#[async_trait]
impl ReferenceLookup for KnownStocks {
    async fn existing_codes(&self, codes: &[String]) -> Result<HashSet<String>> {
        Ok(codes
            .iter()
            .filter(|c| self.0.contains(*c))
            .cloned()
            .collect())
    }
}

fn known(codes: &[&str]) -> KnownStocks {
    KnownStocks(codes.iter().map(|s| s.to_string()).collect())
}

const SAMPLE_CSV: &str = "\
Date,Open,High,Low,Close,Volume,Symbol
2024-01-02,100.0,110.0,99.0,105.0,15000,AAA
2024-01-02,50.5,51.0,49.5,50.0,8000,BBB
2024-01-03,105.0,112.0,104.0,,9000,AAA
2024-01-03,\"50,25\",52.0,50.0,51.5,7000,BBB
";

#[tokio::test]
async fn end_to_end_sync_import() {
    let rows = parser::parse_price_file(SAMPLE_CSV.as_bytes(), FileFormat::Csv, None).unwrap();
    let rows = validate::validate_references(rows, &known(&["AAA", "BBB"]), "Stock", |r| {
        r.code.as_str()
    })
    .await
    .unwrap();

    let store = InMemoryPriceStore::new();
    let result = BatchImporter::new(2).run(&store, rows).await.unwrap();

    // 3행은 close가 비어 있어 탈락, 나머지 3개 생성
    assert_eq!(result.created, 3);
    assert_eq!(result.updated, 0);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].row, 4);
    assert!(result.errors[0]
        .reason
        .contains("required price fields"));
    assert_eq!(store.len(), 3);
}

#[tokio::test]
async fn reimport_is_idempotent() {
    let store = InMemoryPriceStore::new();
    let importer = BatchImporter::new(100);

    for pass in 0..2 {
        let rows =
            parser::parse_price_file(SAMPLE_CSV.as_bytes(), FileFormat::Csv, None).unwrap();
        let result = importer.run(&store, rows).await.unwrap();

        if pass == 0 {
            assert_eq!(result.created, 3);
        } else {
            assert_eq!(result.created, 0);
            assert_eq!(result.updated, 3);
        }
    }

    assert_eq!(store.len(), 3);
}

#[tokio::test]
async fn unknown_reference_gates_only_its_rows() {
    let rows = parser::parse_price_file(SAMPLE_CSV.as_bytes(), FileFormat::Csv, None).unwrap();
    let rows = validate::validate_references(rows, &known(&["AAA"]), "Stock", |r| {
        r.code.as_str()
    })
    .await
    .unwrap();

    let store = InMemoryPriceStore::new();
    let result = BatchImporter::new(100).run(&store, rows).await.unwrap();

    // BBB 행 2개는 참조 오류, AAA 1개 생성 + close 누락 1개
    assert_eq!(result.created, 1);
    assert_eq!(result.errors.len(), 3);
    assert!(result
        .errors
        .iter()
        .any(|e| e.reason == "Stock with code \"BBB\" not found"));
}

#[tokio::test]
async fn async_job_reaches_terminal_state_with_result() {
    let tmp = tempfile::tempdir().unwrap();
    let ledger = Arc::new(JobLedger::new(Arc::new(FileJobStore::new(tmp.path()))));

    let rows = parser::parse_price_file(SAMPLE_CSV.as_bytes(), FileFormat::Csv, None).unwrap();
    let job = ledger.create("stock-price", rows.len()).await;

    let handle = BatchImporter::new(1).spawn_job(
        Arc::new(InMemoryPriceStore::new()),
        rows,
        ledger.clone(),
        job.id.clone(),
    );
    handle.await.unwrap();

    let done = ledger.get_status(&job.id).await.unwrap();
    assert_eq!(done.status, JobStatus::Completed);
    assert_eq!(done.progress, 100);

    let result = done.result.unwrap();
    assert_eq!(result.created, 3);
    assert_eq!(result.errors.len(), 1);

    // 잡 파일이 디스크에 남아 재시작 후 폴링 가능
    let fresh = JobLedger::new(Arc::new(FileJobStore::new(tmp.path())));
    assert_eq!(
        fresh.get_status(&job.id).await.unwrap().status,
        JobStatus::Completed
    );
}

#[tokio::test]
async fn comma_decimal_row_parses_like_dot_decimal() {
    let rows = parser::parse_price_file(SAMPLE_CSV.as_bytes(), FileFormat::Csv, None).unwrap();
    let record = rows
        .iter()
        .filter_map(ParsedRow::as_valid)
        .find(|r| r.code == "BBB" && r.date == NaiveDate::from_ymd_opt(2024, 1, 3).unwrap())
        .unwrap()
        .clone();

    assert_eq!(record.open.to_string(), "50.25");
    assert_eq!(record.volume, Some(7000));
}
