use std::error::Error;

use futures::future::BoxFuture;
use thiserror::Error;
use uuid::Uuid;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}

/// A finished game's outcome as handed to the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRecord {
    /// Host-app identity of the player.
    pub player_id: i64,
    /// Last fully completed level.
    pub score: u32,
    /// Tournament instance the run counted towards; `None` is free play.
    pub event_id: Option<Uuid>,
}

/// Abstraction over the persistence layer for finished-game scores.
///
/// Recording is fire-and-forget from the engine's perspective: failures are
/// logged by the caller and never retried.
pub trait ScoreStore: Send + Sync {
    fn record_score(&self, record: ScoreRecord) -> BoxFuture<'static, StorageResult<()>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
