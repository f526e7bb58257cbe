use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::Mutex;

use crate::dao::score_store::{ScoreRecord, ScoreStore, StorageResult};

/// Process-local score store.
///
/// The real deployment hands scores to the host platform's relational
/// database; that collaborator is outside this engine, so the default
/// installation keeps records in memory. Tests use it to observe what the
/// finalizers reported.
#[derive(Debug, Default, Clone)]
pub struct InMemoryScoreStore {
    records: Arc<Mutex<Vec<ScoreRecord>>>,
}

impl InMemoryScoreStore {
    /// Snapshot of everything recorded so far, in arrival order.
    pub async fn recorded(&self) -> Vec<ScoreRecord> {
        self.records.lock().await.clone()
    }
}

impl ScoreStore for InMemoryScoreStore {
    fn record_score(&self, record: ScoreRecord) -> BoxFuture<'static, StorageResult<()>> {
        let records = Arc::clone(&self.records);
        Box::pin(async move {
            records.lock().await.push(record);
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
