//! Storage abstraction traits for argus state.
//!
//! This module defines the port traits for everything the core persists or
//! reports, allowing different implementations (SQLite, mock, external
//! tabular display) to be used interchangeably.
//!
//! # Architecture
//!
//! ```text
//! WatermarkStore (trait)     - per-resource last-seen cursor
//! JobStore (trait)           - the single batch job slot
//! StatusSink (trait)         - per-item outcome reporting
//! AuditReportSink (trait)    - group -> shared path report rows
//!     └── SqliteStore        - default SQLite implementation of all four
//!     └── Mock*              - in-memory mocks for testing
//! ```

use std::collections::HashMap;
use std::sync::Mutex;

use argus_types::{ItemState, RunState, WorkItem};
use chrono::{DateTime, Utc};

use crate::{Result, StoreError};

// ── Data shapes ─────────────────────────────────────────────────────

/// The persisted batch job occupying the single global slot.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub run_id: String,
    pub items: Vec<WorkItem>,
    /// Next item index to process; `0 <= cursor <= items.len()`.
    pub cursor: usize,
    pub state: RunState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BatchJob {
    /// Items not yet processed.
    pub fn remaining(&self) -> &[WorkItem] {
        &self.items[self.cursor.min(self.items.len())..]
    }
}

/// One row of the per-item status display.
#[derive(Debug, Clone)]
pub struct ItemStatusRow {
    pub key: String,
    pub label: String,
    pub state: ItemState,
    pub detail: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// One shared item discovered for a group, with its resolved path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRow {
    pub group_key: String,
    pub item_id: String,
    pub item_name: String,
    /// Root-to-item path joined with " / ".
    pub path: String,
    pub depth: usize,
    pub container: String,
}

// ── Port traits ─────────────────────────────────────────────────────

/// Per-resource last-processed cursor. Durable and monotone: `advance` with
/// a timestamp older than the stored one is a no-op.
pub trait WatermarkStore: Send + Sync {
    fn last_seen(&self, resource_id: &str) -> Result<Option<DateTime<Utc>>>;

    fn advance(&self, resource_id: &str, to: DateTime<Utc>) -> Result<()>;
}

/// The single batch job slot.
///
/// `begin` is the atomic check-and-set transition guard: it claims the slot
/// for a new run or fails with [`StoreError::SlotBusy`] if a running job
/// already holds it.
pub trait JobStore: Send + Sync {
    fn begin(&self, items: &[WorkItem]) -> Result<BatchJob>;

    fn load(&self) -> Result<Option<BatchJob>>;

    /// Persist the cursor after a processed chunk.
    fn advance_cursor(&self, run_id: &str, cursor: usize) -> Result<()>;

    /// Tear the slot down (job drained or canceled). Idempotent.
    fn clear(&self) -> Result<()>;
}

/// Per-item outcome reporting, consumed by an external tabular display.
pub trait StatusSink: Send + Sync {
    fn set_status(
        &self,
        item: &WorkItem,
        state: ItemState,
        detail: Option<&str>,
        when: DateTime<Utc>,
    ) -> Result<()>;

    /// Drop all rows; called when a new job claims the slot so stale keys
    /// from a previous run do not linger in the display.
    fn reset(&self) -> Result<()>;
}

/// Report rows produced by the group audit worker.
pub trait AuditReportSink: Send + Sync {
    /// Replace all rows for one group with a fresh enumeration.
    fn replace_group_rows(&self, group_key: &str, rows: &[AuditRow]) -> Result<()>;
}

// ── Mocks ───────────────────────────────────────────────────────────

/// In-memory watermark store for testing.
#[derive(Debug, Default)]
pub struct MockWatermarkStore {
    inner: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl MockWatermarkStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WatermarkStore for MockWatermarkStore {
    fn last_seen(&self, resource_id: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self.inner.lock().unwrap().get(resource_id).copied())
    }

    fn advance(&self, resource_id: &str, to: DateTime<Utc>) -> Result<()> {
        let mut map = self.inner.lock().unwrap();
        let entry = map.entry(resource_id.to_string()).or_insert(to);
        if to > *entry {
            *entry = to;
        }
        Ok(())
    }
}

/// In-memory job slot for testing.
#[derive(Debug, Default)]
pub struct MockJobStore {
    slot: Mutex<Option<BatchJob>>,
}

impl MockJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobStore for MockJobStore {
    fn begin(&self, items: &[WorkItem]) -> Result<BatchJob> {
        let mut slot = self.slot.lock().unwrap();
        if let Some(existing) = slot.as_ref()
            && existing.state == RunState::Running
        {
            return Err(StoreError::SlotBusy(existing.run_id.clone()));
        }
        let now = Utc::now();
        let job = BatchJob {
            run_id: uuid::Uuid::new_v4().to_string(),
            items: items.to_vec(),
            cursor: 0,
            state: RunState::Running,
            created_at: now,
            updated_at: now,
        };
        *slot = Some(job.clone());
        Ok(job)
    }

    fn load(&self) -> Result<Option<BatchJob>> {
        Ok(self.slot.lock().unwrap().clone())
    }

    fn advance_cursor(&self, run_id: &str, cursor: usize) -> Result<()> {
        let mut slot = self.slot.lock().unwrap();
        if let Some(job) = slot.as_mut()
            && job.run_id == run_id
        {
            job.cursor = cursor;
            job.updated_at = Utc::now();
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot.lock().unwrap() = None;
        Ok(())
    }
}

/// In-memory status sink recording every call, for assertions.
#[derive(Debug, Default)]
pub struct MockStatusSink {
    rows: Mutex<HashMap<String, ItemStatusRow>>,
    calls: Mutex<Vec<(String, ItemState)>>,
}

impl MockStatusSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest state for an item key, if any status was recorded.
    pub fn state_of(&self, key: &str) -> Option<ItemState> {
        self.rows.lock().unwrap().get(key).map(|r| r.state)
    }

    /// Latest detail for an item key.
    pub fn detail_of(&self, key: &str) -> Option<String> {
        self.rows
            .lock()
            .unwrap()
            .get(key)
            .and_then(|r| r.detail.clone())
    }

    /// Number of items currently in the given state.
    pub fn count_in(&self, state: ItemState) -> usize {
        self.rows
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.state == state)
            .count()
    }

    /// Full call log, in order.
    pub fn calls(&self) -> Vec<(String, ItemState)> {
        self.calls.lock().unwrap().clone()
    }
}

impl StatusSink for MockStatusSink {
    fn set_status(
        &self,
        item: &WorkItem,
        state: ItemState,
        detail: Option<&str>,
        when: DateTime<Utc>,
    ) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((item.key.clone(), state));
        self.rows.lock().unwrap().insert(
            item.key.clone(),
            ItemStatusRow {
                key: item.key.clone(),
                label: item.label.clone(),
                state,
                detail: detail.map(String::from),
                updated_at: when,
            },
        );
        Ok(())
    }

    fn reset(&self) -> Result<()> {
        self.rows.lock().unwrap().clear();
        Ok(())
    }
}

/// In-memory audit report sink for testing.
#[derive(Debug, Default)]
pub struct MockAuditSink {
    rows: Mutex<HashMap<String, Vec<AuditRow>>>,
}

impl MockAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group_rows(&self, group_key: &str) -> Vec<AuditRow> {
        self.rows
            .lock()
            .unwrap()
            .get(group_key)
            .cloned()
            .unwrap_or_default()
    }
}

impl AuditReportSink for MockAuditSink {
    fn replace_group_rows(&self, group_key: &str, rows: &[AuditRow]) -> Result<()> {
        self.rows
            .lock()
            .unwrap()
            .insert(group_key.to_string(), rows.to_vec());
        Ok(())
    }
}
