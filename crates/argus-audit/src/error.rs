use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    /// The group directory service failed a page query.
    #[error("group directory query failed: {0}")]
    Directory(String),

    /// The directory returned more pages than the defensive bound allows.
    #[error("group directory paging exceeded {0} pages")]
    PagingRunaway(usize),
}

pub type Result<T> = std::result::Result<T, AuditError>;
