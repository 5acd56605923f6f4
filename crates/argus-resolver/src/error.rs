//! Lookup error taxonomy.

use thiserror::Error;

/// Errors a metadata lookup can fail with.
///
/// `NotFound` and `PermissionDenied` are tolerated by the resolver and
/// degrade the produced path; `Backend` covers transport-level failures and
/// is treated the same way by the walk.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The resource does not exist (or has been deleted).
    #[error("resource not found: {0}")]
    NotFound(String),

    /// The resource exists but is not accessible to us.
    #[error("permission denied for resource: {0}")]
    PermissionDenied(String),

    /// The lookup service itself failed.
    #[error("metadata backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, LookupError>;
