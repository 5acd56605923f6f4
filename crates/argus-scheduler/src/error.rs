use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A job already holds the single slot. Surfaced to the caller, never
    /// retried; the existing queue and cursor are untouched.
    #[error("A batch job is already running (run {0})")]
    AlreadyRunning(String),

    /// Persisting the queue or cursor failed. Fatal to the job run; the
    /// engine tears the slot down rather than leaving an orphaned running
    /// state.
    #[error("Store error: {0}")]
    Store(#[from] argus_store::StoreError),

    /// The re-invocation port failed. Also fatal to the job run.
    #[error("Re-invocation scheduling failed: {0}")]
    Invoke(#[from] crate::invoker::InvokeError),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
