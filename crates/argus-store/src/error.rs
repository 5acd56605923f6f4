use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The batch job slot is already held by a running job.
    #[error("Batch job slot is busy (run {0})")]
    SlotBusy(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
