use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectorError {
    /// Watermark persistence failed; unlike a feed query failure this aborts
    /// the pass, since continuing would corrupt the re-scan windows.
    #[error("Store error: {0}")]
    Store(#[from] argus_store::StoreError),
}

pub type Result<T> = std::result::Result<T, CollectorError>;
