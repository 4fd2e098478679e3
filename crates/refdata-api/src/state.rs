//! 모든 핸들러에서 공유되는 애플리케이션 상태.

use std::sync::Arc;

use refdata_core::AppConfig;
use refdata_data::Database;
use refdata_import::{BatchImporter, FileJobStore, JobLedger};

/// 애플리케이션 공유 상태.
///
/// Axum의 State extractor를 통해 핸들러에 주입됩니다.
#[derive(Clone)]
pub struct AppState {
    /// 데이터베이스 연결 풀 래퍼
    pub db: Database,

    /// 임포트 잡 원장 (인메모리 + 파일 내구 저장)
    pub ledger: Arc<JobLedger>,

    /// 애플리케이션 설정
    pub config: AppConfig,
}

impl AppState {
    pub fn new(db: Database, config: AppConfig) -> Self {
        let store = FileJobStore::new(&config.import.job_dir);
        let ledger = Arc::new(JobLedger::new(Arc::new(store)));
        Self { db, ledger, config }
    }

    /// 설정된 배치 크기의 임포터를 반환합니다.
    pub fn importer(&self) -> BatchImporter {
        BatchImporter::new(self.config.import.batch_size)
    }

    /// 파싱된 행 수가 비동기 처리 임계치를 넘는지 확인합니다.
    pub fn needs_async(&self, rows: usize) -> bool {
        rows >= self.config.import.async_threshold
    }
}
