//! 잡 상태 원장.
//!
//! 비동기 임포트 잡의 상태를 2계층으로 관리합니다:
//! 인메모리 맵(빠른 폴링 응답)과 파일 저장소(프로세스 재시작 후에도
//! 완료된 잡 조회 가능). 메모리가 항상 우선이고, 저장소는 메모리에 없는
//! 잡의 폴백입니다.
//!
//! 저장소 쓰기 실패는 잡 진행을 중단시키지 않습니다 — 경고 로그만 남기고
//! 계속합니다. 내구성은 최선 노력이지 임포트의 전제 조건이 아닙니다.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::{ImportError, Result};
use crate::record::BatchResult;

/// 잡 수명주기 상태.
///
/// `Completed`와 `Failed`는 종결 상태입니다. 종결된 잡의 상태 전이는
/// 모두 무시됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// 종결 상태 여부.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// 임포트 잡 레코드.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportJob {
    /// 잡 식별자 (`<entity>-job-<millis>-<suffix>`)
    pub id: String,
    /// 대상 엔티티 (로그/진단용)
    pub entity: String,
    pub status: JobStatus,
    /// 진행률 0-100. 종결 전에는 99를 넘지 않습니다.
    pub progress: u8,
    /// 파싱된 총 레코드 수
    pub total_records: usize,
    /// 지금까지 처리된 레코드 수
    pub processed_records: usize,
    /// 종결 시에만 채워지는 집계 결과
    pub result: Option<BatchResult>,
    /// 실패 사유 (Failed 상태에서만)
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 잡 내구 저장소 인터페이스.
///
/// 프로세스 재시작 후에도 잡 상태를 조회할 수 있도록 종결/중간 상태를
/// 보존합니다. 테스트에서는 인메모리 구현으로 대체합니다.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn save(&self, job: &ImportJob) -> Result<()>;
    async fn load(&self, id: &str) -> Result<Option<ImportJob>>;
}

/// 잡 하나당 JSON 파일 하나를 쓰는 파일 저장소.
pub struct FileJobStore {
    dir: PathBuf,
}

impl FileJobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, id: &str) -> Option<PathBuf> {
        // 잡 ID는 우리가 생성하지만, 외부 입력으로도 조회되므로
        // 경로 구성 요소가 될 수 없는 문자는 거부합니다
        if id.is_empty()
            || !id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return None;
        }
        Some(self.dir.join(format!("{}.json", id)))
    }
}

#[async_trait]
impl JobStore for FileJobStore {
    async fn save(&self, job: &ImportJob) -> Result<()> {
        let path = self
            .path_for(&job.id)
            .ok_or_else(|| ImportError::JobStoreError(format!("invalid job id: {}", job.id)))?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ImportError::JobStoreError(e.to_string()))?;

        let json = serde_json::to_vec_pretty(job)
            .map_err(|e| ImportError::JobStoreError(e.to_string()))?;

        tokio::fs::write(&path, json)
            .await
            .map_err(|e| ImportError::JobStoreError(e.to_string()))
    }

    async fn load(&self, id: &str) -> Result<Option<ImportJob>> {
        let Some(path) = self.path_for(id) else {
            return Ok(None);
        };

        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let job = serde_json::from_slice(&bytes)
                    .map_err(|e| ImportError::JobStoreError(e.to_string()))?;
                Ok(Some(job))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ImportError::JobStoreError(e.to_string())),
        }
    }
}

/// 새 잡 ID를 생성합니다.
///
/// 밀리초 타임스탬프에 충돌 방지용 랜덤 접미사를 붙입니다.
pub fn new_job_id(entity: &str) -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: u32 = rand::thread_rng().gen();
    format!("{}-job-{}-{:08x}", entity, millis, suffix)
}

/// 2계층 잡 원장.
///
/// 핸들러와 백그라운드 태스크가 공유하므로 `Arc`로 감싸 사용합니다.
pub struct JobLedger {
    jobs: RwLock<HashMap<String, ImportJob>>,
    store: Arc<dyn JobStore>,
}

impl JobLedger {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            store,
        }
    }

    /// 새 잡을 등록합니다.
    pub async fn create(&self, entity: &str, total_records: usize) -> ImportJob {
        let now = Utc::now();
        let job = ImportJob {
            id: new_job_id(entity),
            entity: entity.to_string(),
            status: JobStatus::Pending,
            progress: 0,
            total_records,
            processed_records: 0,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        };

        self.jobs.write().await.insert(job.id.clone(), job.clone());
        self.persist(&job).await;
        info!(job_id = %job.id, entity, total_records, "임포트 잡 등록");
        job
    }

    /// 잡을 처리 중 상태로 전환합니다.
    pub async fn mark_processing(&self, id: &str) {
        self.update(id, |job| {
            job.status = JobStatus::Processing;
        })
        .await;
    }

    /// 진행 상황을 갱신합니다. 종결 전 진행률은 99가 상한입니다.
    pub async fn advance(&self, id: &str, processed_records: usize) {
        self.update(id, |job| {
            job.processed_records = processed_records;
            let pct = if job.total_records == 0 {
                99
            } else {
                (processed_records * 100 / job.total_records).min(99)
            };
            job.progress = pct as u8;
        })
        .await;
    }

    /// 잡을 완료 상태로 종결합니다.
    pub async fn complete(&self, id: &str, result: BatchResult) {
        self.update(id, |job| {
            job.status = JobStatus::Completed;
            job.progress = 100;
            job.processed_records = job.total_records;
            job.result = Some(result);
        })
        .await;
    }

    /// 잡을 실패 상태로 종결합니다.
    pub async fn fail(&self, id: &str, reason: impl Into<String>) {
        let reason = reason.into();
        self.update(id, |job| {
            job.status = JobStatus::Failed;
            job.error = Some(reason);
        })
        .await;
    }

    /// 잡 상태를 조회합니다.
    ///
    /// 메모리에 없으면 저장소에서 읽어 메모리에 되살립니다. 재시작 후에도
    /// 같은 ID로 계속 폴링할 수 있습니다.
    pub async fn get_status(&self, id: &str) -> Result<ImportJob> {
        if let Some(job) = self.jobs.read().await.get(id) {
            return Ok(job.clone());
        }

        match self.store.load(id).await? {
            Some(job) => {
                self.jobs.write().await.insert(id.to_string(), job.clone());
                Ok(job)
            }
            None => Err(ImportError::JobNotFound(id.to_string())),
        }
    }

    async fn update(&self, id: &str, apply: impl FnOnce(&mut ImportJob)) {
        let updated = {
            let mut jobs = self.jobs.write().await;
            match jobs.get_mut(id) {
                // 종결 상태는 흡수 상태 — 늦게 도착한 전이는 무시
                Some(job) if !job.status.is_terminal() => {
                    apply(job);
                    job.updated_at = Utc::now();
                    Some(job.clone())
                }
                _ => None,
            }
        };

        if let Some(job) = updated {
            self.persist(&job).await;
        }
    }

    async fn persist(&self, job: &ImportJob) {
        if let Err(e) = self.store.save(job).await {
            warn!(job_id = %job.id, error = %e, "잡 상태 저장 실패 (처리는 계속)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RowError;

    fn file_ledger(dir: &std::path::Path) -> JobLedger {
        JobLedger::new(Arc::new(FileJobStore::new(dir)))
    }

    #[tokio::test]
    async fn test_job_lifecycle() {
        let tmp = tempfile::tempdir().unwrap();
        let ledger = file_ledger(tmp.path());

        let job = ledger.create("stock-price", 200).await;
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.progress, 0);

        ledger.mark_processing(&job.id).await;
        ledger.advance(&job.id, 100).await;

        let mid = ledger.get_status(&job.id).await.unwrap();
        assert_eq!(mid.status, JobStatus::Processing);
        assert_eq!(mid.progress, 50);

        ledger
            .complete(
                &job.id,
                BatchResult {
                    created: 180,
                    updated: 15,
                    skipped: 0,
                    errors: vec![RowError::new(7, "Invalid price format")],
                },
            )
            .await;

        let done = ledger.get_status(&job.id).await.unwrap();
        assert_eq!(done.status, JobStatus::Completed);
        assert_eq!(done.progress, 100);
        assert_eq!(done.result.as_ref().unwrap().created, 180);
    }

    #[tokio::test]
    async fn test_progress_capped_at_99_before_completion() {
        let tmp = tempfile::tempdir().unwrap();
        let ledger = file_ledger(tmp.path());

        let job = ledger.create("stock-price", 100).await;
        ledger.advance(&job.id, 100).await;

        let status = ledger.get_status(&job.id).await.unwrap();
        assert_eq!(status.progress, 99);
    }

    #[tokio::test]
    async fn test_progress_never_decreases_across_polls() {
        let tmp = tempfile::tempdir().unwrap();
        let ledger = file_ledger(tmp.path());

        let job = ledger.create("stock-price", 10).await;
        ledger.mark_processing(&job.id).await;

        // 배치 처리를 한 단계씩 흉내 내며 매 단계 폴링
        let mut last = ledger.get_status(&job.id).await.unwrap().progress;
        for processed in [3, 3, 7, 10, 10] {
            ledger.advance(&job.id, processed).await;

            let polled = ledger.get_status(&job.id).await.unwrap();
            assert!(
                polled.progress >= last,
                "progress went backwards: {} -> {}",
                last,
                polled.progress
            );
            assert!(polled.progress < 100, "100 reported before completion");
            last = polled.progress;
        }

        ledger.complete(&job.id, BatchResult::default()).await;
        let done = ledger.get_status(&job.id).await.unwrap();
        assert_eq!(done.progress, 100);
        assert_eq!(done.status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn test_terminal_state_absorbs_later_transitions() {
        let tmp = tempfile::tempdir().unwrap();
        let ledger = file_ledger(tmp.path());

        let job = ledger.create("currency", 10).await;
        ledger.fail(&job.id, "Lookup failed").await;
        ledger.complete(&job.id, BatchResult::default()).await;
        ledger.advance(&job.id, 5).await;

        let status = ledger.get_status(&job.id).await.unwrap();
        assert_eq!(status.status, JobStatus::Failed);
        assert_eq!(status.error.as_deref(), Some("Lookup failed"));
        assert!(status.result.is_none());
    }

    #[tokio::test]
    async fn test_store_fallback_after_memory_loss() {
        let tmp = tempfile::tempdir().unwrap();
        let store = Arc::new(FileJobStore::new(tmp.path()));

        let job_id = {
            let ledger = JobLedger::new(store.clone());
            let job = ledger.create("financial-metric", 50).await;
            ledger.complete(&job.id, BatchResult::default()).await;
            job.id
        };

        // 새 원장 = 프로세스 재시작. 메모리는 비어 있고 파일에서 복원
        let fresh = JobLedger::new(store);
        let restored = fresh.get_status(&job_id).await.unwrap();
        assert_eq!(restored.status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn test_unknown_job_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let ledger = file_ledger(tmp.path());

        let err = ledger.get_status("no-such-job").await.unwrap_err();
        assert!(matches!(err, ImportError::JobNotFound(_)));
    }

    #[test]
    fn test_job_id_shape() {
        let id = new_job_id("stock-price");
        assert!(id.starts_with("stock-price-job-"));

        let other = new_job_id("stock-price");
        assert_ne!(id, other);
    }

    #[tokio::test]
    async fn test_file_store_rejects_path_traversal_ids() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileJobStore::new(tmp.path());

        assert!(store.load("../etc/passwd").await.unwrap().is_none());
    }
}
