//! Durable state for argus.
//!
//! All cross-invocation state lives here: per-resource watermarks, the
//! single batch job slot, per-item statuses and audit report rows. SQLite is
//! the default backend; `storage` defines the port traits plus in-memory
//! mocks for tests.

pub mod error;
pub mod storage;
pub mod store;

pub use error::{Result, StoreError};
pub use storage::{
    AuditReportSink, AuditRow, BatchJob, ItemStatusRow, JobStore, MockAuditSink, MockJobStore,
    MockStatusSink, MockWatermarkStore, StatusSink, WatermarkStore,
};
pub use store::SqliteStore;
