//! 배치 임포트 엔진.
//!
//! 엔티티별 upsert 전략([`ImportStrategy`])을 받아 유효 레코드를 배치
//! 단위로 저장합니다. 엔진은 배치 분할, 결과 집계, 잡 진행률 갱신만
//! 담당하고 저장 방식은 전략이 결정합니다 — 주가는 덮어쓰기 upsert,
//! 재무지표는 중복 건너뛰기 같은 차이가 전략 구현에 들어갑니다.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::error::Result;
use crate::ledger::JobLedger;
use crate::record::{BatchResult, ParsedRow, RowError};

/// 레코드 하나의 upsert 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// 새 레코드 생성
    Created,
    /// 기존 키 덮어쓰기
    Updated,
    /// 중복 등으로 건너뜀
    Skipped,
}

/// 엔티티별 upsert 전략.
///
/// 구현은 레코드당 하나의 결과를 입력 순서대로 반환해야 합니다.
/// 레코드 하나의 실패는 `Err(String)` 항목으로 보고하고(행 오류로 수집됨),
/// 배치 전체를 처리할 수 없는 인프라 오류만 바깥 `Result`로 반환합니다.
#[async_trait]
pub trait ImportStrategy: Send + Sync {
    type Record: Send + Sync;

    /// 엔티티 이름 (잡 ID 접두사, 로그용).
    fn entity(&self) -> &'static str;

    /// 배치 하나를 upsert합니다.
    async fn upsert_batch(
        &self,
        records: &[Self::Record],
    ) -> Result<Vec<std::result::Result<UpsertOutcome, String>>>;
}

/// 배치 임포터.
#[derive(Debug, Clone, Copy)]
pub struct BatchImporter {
    batch_size: usize,
}

impl BatchImporter {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    /// 동기 임포트 — 전체 결과를 반환할 때까지 기다립니다.
    pub async fn run<S: ImportStrategy>(
        &self,
        strategy: &S,
        rows: Vec<ParsedRow<S::Record>>,
    ) -> Result<BatchResult> {
        self.execute(strategy, rows, None).await
    }

    /// 백그라운드 잡으로 실행합니다.
    ///
    /// 즉시 반환하며, 스폰된 태스크가 배치마다 원장 진행률을 갱신하고
    /// 종결 시 결과 또는 실패 사유를 기록합니다.
    pub fn spawn_job<S>(
        self,
        strategy: Arc<S>,
        rows: Vec<ParsedRow<S::Record>>,
        ledger: Arc<JobLedger>,
        job_id: String,
    ) -> tokio::task::JoinHandle<()>
    where
        S: ImportStrategy + 'static,
        S::Record: 'static,
    {
        tokio::spawn(async move {
            ledger.mark_processing(&job_id).await;

            match self
                .execute(strategy.as_ref(), rows, Some((&ledger, &job_id)))
                .await
            {
                Ok(result) => {
                    info!(
                        job_id = %job_id,
                        entity = strategy.entity(),
                        created = result.created,
                        updated = result.updated,
                        skipped = result.skipped,
                        errors = result.errors.len(),
                        "임포트 잡 완료"
                    );
                    ledger.complete(&job_id, result).await;
                }
                Err(e) => {
                    error!(job_id = %job_id, entity = strategy.entity(), error = %e, "임포트 잡 실패");
                    ledger.fail(&job_id, e.to_string()).await;
                }
            }
        })
    }

    async fn execute<S: ImportStrategy>(
        &self,
        strategy: &S,
        rows: Vec<ParsedRow<S::Record>>,
        progress: Option<(&JobLedger, &str)>,
    ) -> Result<BatchResult> {
        let mut row_nums: Vec<usize> = Vec::new();
        let mut records: Vec<S::Record> = Vec::new();
        let mut result = BatchResult::default();

        for parsed in rows {
            match parsed {
                ParsedRow::Valid { row, record } => {
                    row_nums.push(row);
                    records.push(record);
                }
                ParsedRow::Invalid(e) => result.errors.push(e),
            }
        }

        // 파싱/검증에서 이미 탈락한 행도 처리된 것으로 계산
        let mut processed = result.errors.len();
        if let Some((ledger, job_id)) = progress {
            ledger.advance(job_id, processed).await;
        }

        for (batch_rows, batch) in row_nums
            .chunks(self.batch_size)
            .zip(records.chunks(self.batch_size))
        {
            let outcomes = strategy.upsert_batch(batch).await?;
            debug_assert_eq!(outcomes.len(), batch.len());

            for (row, outcome) in batch_rows.iter().zip(outcomes) {
                match outcome {
                    Ok(UpsertOutcome::Created) => result.created += 1,
                    Ok(UpsertOutcome::Updated) => result.updated += 1,
                    Ok(UpsertOutcome::Skipped) => result.skipped += 1,
                    Err(reason) => result.errors.push(RowError::new(*row, reason)),
                }
            }

            processed += batch.len();
            if let Some((ledger, job_id)) = progress {
                ledger.advance(job_id, processed).await;
            }

            debug!(
                entity = strategy.entity(),
                batch = batch.len(),
                processed,
                "배치 처리"
            );
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImportError;
    use crate::ledger::{FileJobStore, JobStatus};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// 인메모리 키-값 upsert 전략. 같은 키 재삽입은 Updated로 보고.
    struct MapStrategy {
        store: Mutex<HashMap<String, i64>>,
        batch_sizes: Mutex<Vec<usize>>,
        fail_key: Option<String>,
    }

    impl MapStrategy {
        fn new() -> Self {
            Self {
                store: Mutex::new(HashMap::new()),
                batch_sizes: Mutex::new(Vec::new()),
                fail_key: None,
            }
        }
    }

    #[async_trait]
    impl ImportStrategy for MapStrategy {
        type Record = (String, i64);

        fn entity(&self) -> &'static str {
            "test"
        }

        async fn upsert_batch(
            &self,
            records: &[Self::Record],
        ) -> Result<Vec<std::result::Result<UpsertOutcome, String>>> {
            self.batch_sizes.lock().unwrap().push(records.len());
            let mut store = self.store.lock().unwrap();

            records
                .iter()
                .map(|(key, value)| {
                    if Some(key) == self.fail_key.as_ref() {
                        return Ok(Err(format!("Duplicate key: {}", key)));
                    }
                    let outcome = if store.insert(key.clone(), *value).is_some() {
                        UpsertOutcome::Updated
                    } else {
                        UpsertOutcome::Created
                    };
                    Ok(Ok(outcome))
                })
                .collect()
        }
    }

    fn valid_rows(keys: &[&str]) -> Vec<ParsedRow<(String, i64)>> {
        keys.iter()
            .enumerate()
            .map(|(i, k)| ParsedRow::Valid {
                row: i + 2,
                record: (k.to_string(), i as i64),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_second_run_reports_updates_not_creates() {
        let strategy = MapStrategy::new();
        let importer = BatchImporter::new(100);

        let first = importer
            .run(&strategy, valid_rows(&["a", "b", "c"]))
            .await
            .unwrap();
        assert_eq!(first.created, 3);
        assert_eq!(first.updated, 0);

        let second = importer
            .run(&strategy, valid_rows(&["a", "b", "c"]))
            .await
            .unwrap();
        assert_eq!(second.created, 0);
        assert_eq!(second.updated, 3);
    }

    #[tokio::test]
    async fn test_respects_batch_size() {
        let strategy = MapStrategy::new();
        let importer = BatchImporter::new(2);

        importer
            .run(&strategy, valid_rows(&["a", "b", "c", "d", "e"]))
            .await
            .unwrap();

        assert_eq!(*strategy.batch_sizes.lock().unwrap(), vec![2, 2, 1]);
    }

    #[tokio::test]
    async fn test_record_failure_does_not_abort_batch() {
        let mut strategy = MapStrategy::new();
        strategy.fail_key = Some("b".to_string());
        let importer = BatchImporter::new(100);

        let result = importer
            .run(&strategy, valid_rows(&["a", "b", "c"]))
            .await
            .unwrap();

        assert_eq!(result.created, 2);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].row, 3);
        assert!(result.errors[0].reason.contains("Duplicate key"));
    }

    #[tokio::test]
    async fn test_parse_errors_flow_into_result() {
        let strategy = MapStrategy::new();
        let importer = BatchImporter::new(100);

        let rows = vec![
            ParsedRow::Valid {
                row: 2,
                record: ("a".to_string(), 1),
            },
            ParsedRow::Invalid(RowError::new(3, "Missing date field")),
        ];

        let result = importer.run(&strategy, rows).await.unwrap();
        assert_eq!(result.created, 1);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.total_processed(), 2);
    }

    struct FailingStrategy;

    #[async_trait]
    impl ImportStrategy for FailingStrategy {
        type Record = String;

        fn entity(&self) -> &'static str {
            "test"
        }

        async fn upsert_batch(
            &self,
            _records: &[Self::Record],
        ) -> Result<Vec<std::result::Result<UpsertOutcome, String>>> {
            Err(ImportError::LookupError("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_spawned_job_completes_through_ledger() {
        let tmp = tempfile::tempdir().unwrap();
        let ledger = Arc::new(JobLedger::new(Arc::new(FileJobStore::new(tmp.path()))));

        let job = ledger.create("test", 3).await;
        let handle = BatchImporter::new(2).spawn_job(
            Arc::new(MapStrategy::new()),
            valid_rows(&["a", "b", "c"]),
            ledger.clone(),
            job.id.clone(),
        );
        handle.await.unwrap();

        let done = ledger.get_status(&job.id).await.unwrap();
        assert_eq!(done.status, JobStatus::Completed);
        assert_eq!(done.progress, 100);
        assert_eq!(done.result.unwrap().created, 3);
    }

    #[tokio::test]
    async fn test_spawned_job_failure_is_recorded() {
        let tmp = tempfile::tempdir().unwrap();
        let ledger = Arc::new(JobLedger::new(Arc::new(FileJobStore::new(tmp.path()))));

        let job = ledger.create("test", 1).await;
        let rows = vec![ParsedRow::Valid {
            row: 2,
            record: "a".to_string(),
        }];
        BatchImporter::new(10)
            .spawn_job(Arc::new(FailingStrategy), rows, ledger.clone(), job.id.clone())
            .await
            .unwrap();

        let failed = ledger.get_status(&job.id).await.unwrap();
        assert_eq!(failed.status, JobStatus::Failed);
        assert!(failed.error.unwrap().contains("connection refused"));
    }
}
