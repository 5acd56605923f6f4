//! The batch scheduler state machine.

use std::time::Duration;

use argus_store::{BatchJob, JobStore, StatusSink, StoreError};
use argus_types::{ItemState, RunState, WorkItem};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::invoker::Invoker;
use crate::worker::ItemWorker;
use crate::{Result, SchedulerError};

/// Handler name under which chunk continuations are scheduled.
pub const CONTINUE_HANDLER: &str = "argus.audit.continue";

/// Engine tuning.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Items processed per invocation. `chunk_size * worst-case-per-item
    /// latency` must stay safely under the host's execution-time ceiling.
    pub chunk_size: usize,
    /// Delay before the next chunk invocation.
    pub continue_delay: Duration,
    /// Pause between items within a chunk; throttles the external API.
    pub item_pause: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunk_size: 25,
            continue_delay: Duration::from_secs(5),
            item_pause: Duration::from_millis(200),
        }
    }
}

/// Outcome of one `continue_chunk` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// No running job; a stale or duplicate timer fired.
    Noop,
    /// A chunk was processed.
    Processed {
        processed: usize,
        /// Items still queued after this chunk. Zero means the queue
        /// drained and the slot is idle again.
        remaining: usize,
    },
}

/// Generic resumable-queue engine over the durable job slot.
///
/// Exactly one job can hold the slot; all cross-invocation state lives in
/// the [`JobStore`], so the process can exit between chunks and resume from
/// the checkpoint.
pub struct BatchScheduler<'a> {
    jobs: &'a dyn JobStore,
    sink: &'a dyn StatusSink,
    invoker: &'a dyn Invoker,
    config: EngineConfig,
}

impl<'a> BatchScheduler<'a> {
    pub fn new(
        jobs: &'a dyn JobStore,
        sink: &'a dyn StatusSink,
        invoker: &'a dyn Invoker,
        config: EngineConfig,
    ) -> Self {
        Self {
            jobs,
            sink,
            invoker,
            config,
        }
    }

    /// Claim the slot for a new job and arrange the first chunk invocation.
    ///
    /// Fails with [`SchedulerError::AlreadyRunning`] if a job holds the
    /// slot, leaving the existing queue and cursor untouched. If arranging
    /// the re-invocation fails the slot is torn down again: a `Running`
    /// state with no pending re-invocation must never persist.
    pub fn start(&self, items: Vec<WorkItem>) -> Result<BatchJob> {
        let job = self.jobs.begin(&items).map_err(|e| match e {
            StoreError::SlotBusy(run_id) => SchedulerError::AlreadyRunning(run_id),
            other => SchedulerError::Store(other),
        })?;

        info!(run_id = %job.run_id, items = items.len(), "batch job started");

        if let Err(e) = self.arm(&job) {
            warn!(run_id = %job.run_id, error = %e, "job setup failed, tearing slot down");
            self.teardown(&job, job.cursor);
            return Err(e);
        }

        Ok(job)
    }

    fn arm(&self, job: &BatchJob) -> Result<()> {
        self.sink.reset()?;
        let now = Utc::now();
        for item in &job.items {
            self.sink.set_status(item, ItemState::Pending, None, now)?;
        }
        self.reschedule()?;
        Ok(())
    }

    /// The re-invocation entry point: process one chunk of the running job.
    ///
    /// No-ops when no job is running, defending against stale or duplicate
    /// external timers.
    pub fn continue_chunk(&self, worker: &dyn ItemWorker) -> Result<ChunkOutcome> {
        let Some(job) = self.jobs.load()? else {
            debug!("continue fired with empty slot, ignoring");
            return Ok(ChunkOutcome::Noop);
        };
        if job.state != RunState::Running {
            debug!(run_id = %job.run_id, state = %job.state, "continue fired on non-running job, ignoring");
            return Ok(ChunkOutcome::Noop);
        }

        match self.process_chunk(&job, worker) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                // Never leave Running behind with no pending re-invocation.
                warn!(run_id = %job.run_id, error = %e, "chunk failed, tearing slot down");
                self.teardown(&job, job.cursor);
                Err(e)
            }
        }
    }

    fn process_chunk(&self, job: &BatchJob, worker: &dyn ItemWorker) -> Result<ChunkOutcome> {
        let end = (job.cursor + self.config.chunk_size).min(job.items.len());
        let chunk = &job.items[job.cursor..end];

        for (offset, item) in chunk.iter().enumerate() {
            match worker.process(item) {
                Ok(()) => {
                    self.sink
                        .set_status(item, ItemState::Done, None, Utc::now())?;
                }
                Err(e) => {
                    warn!(item = %item.key, error = %e, "item worker failed");
                    let detail = e.to_string();
                    self.sink
                        .set_status(item, ItemState::Failed, Some(detail.as_str()), Utc::now())?;
                }
            }
            if offset + 1 < chunk.len() && !self.config.item_pause.is_zero() {
                std::thread::sleep(self.config.item_pause);
            }
        }

        self.jobs.advance_cursor(&job.run_id, end)?;
        let remaining = job.items.len() - end;

        if remaining > 0 {
            self.reschedule()?;
            debug!(run_id = %job.run_id, cursor = end, remaining, "chunk complete, continuation scheduled");
        } else {
            self.jobs.clear()?;
            info!(run_id = %job.run_id, items = job.items.len(), "batch job drained");
        }

        Ok(ChunkOutcome::Processed {
            processed: chunk.len(),
            remaining,
        })
    }

    /// Cancel the running job, if any.
    ///
    /// Not-yet-processed items are marked `Canceled` in the status sink;
    /// already-processed statuses stay untouched. A later stale continue is
    /// a no-op. Idempotent when the slot is already empty.
    pub fn cancel(&self) -> Result<()> {
        let Some(job) = self.jobs.load()? else {
            debug!("cancel with empty slot, nothing to do");
            return Ok(());
        };

        info!(run_id = %job.run_id, cursor = job.cursor, "canceling batch job");
        self.teardown(&job, job.cursor);
        Ok(())
    }

    /// Current slot contents, for display.
    pub fn status(&self) -> Result<Option<BatchJob>> {
        Ok(self.jobs.load()?)
    }

    /// Cancel any pending re-invocation and schedule exactly one.
    fn reschedule(&self) -> Result<()> {
        self.invoker.cancel_all(CONTINUE_HANDLER)?;
        self.invoker
            .schedule_after(CONTINUE_HANDLER, self.config.continue_delay)?;
        Ok(())
    }

    /// Tear the slot down to `Idle`: mark unprocessed items canceled, drop
    /// pending re-invocations, clear the slot. Best-effort on purpose — the
    /// slot must end empty even if the sink or invoker misbehaves.
    fn teardown(&self, job: &BatchJob, cursor: usize) {
        // The persisted cursor may be ahead of the caller's copy when a
        // chunk failed after checkpointing; already-processed items keep
        // their recorded statuses.
        let cursor = match self.jobs.load() {
            Ok(Some(current)) if current.run_id == job.run_id => current.cursor.max(cursor),
            _ => cursor,
        };
        let now = Utc::now();
        for item in &job.items[cursor.min(job.items.len())..] {
            if let Err(e) = self.sink.set_status(item, ItemState::Canceled, None, now) {
                warn!(item = %item.key, error = %e, "failed to mark item canceled");
            }
        }
        if let Err(e) = self.invoker.cancel_all(CONTINUE_HANDLER) {
            warn!(error = %e, "failed to cancel pending re-invocations");
        }
        if let Err(e) = self.jobs.clear() {
            warn!(error = %e, "failed to clear job slot");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argus_store::{MockJobStore, MockStatusSink};
    use crate::invoker::RecordingInvoker;

    fn items(n: usize) -> Vec<WorkItem> {
        (1..=n)
            .map(|i| WorkItem::new(format!("g{i}"), format!("group {i}")))
            .collect()
    }

    fn test_config(chunk_size: usize) -> EngineConfig {
        EngineConfig {
            chunk_size,
            continue_delay: Duration::from_millis(1),
            item_pause: Duration::ZERO,
        }
    }

    #[test]
    fn start_marks_items_pending_and_schedules_once() {
        let jobs = MockJobStore::new();
        let sink = MockStatusSink::new();
        let invoker = RecordingInvoker::new();
        let engine = BatchScheduler::new(&jobs, &sink, &invoker, test_config(3));

        engine.start(items(5)).unwrap();

        assert_eq!(sink.count_in(ItemState::Pending), 5);
        assert_eq!(invoker.pending(CONTINUE_HANDLER), 1);
    }

    #[test]
    fn schedule_failure_on_start_leaves_slot_idle() {
        let jobs = MockJobStore::new();
        let sink = MockStatusSink::new();
        let invoker = RecordingInvoker::failing();
        let engine = BatchScheduler::new(&jobs, &sink, &invoker, test_config(3));

        let err = engine.start(items(5)).unwrap_err();
        assert!(matches!(err, SchedulerError::Invoke(_)));

        // No orphaned Running state
        assert!(jobs.load().unwrap().is_none());
        assert_eq!(sink.count_in(ItemState::Canceled), 5);
    }

    #[test]
    fn continue_on_empty_slot_is_noop() {
        let jobs = MockJobStore::new();
        let sink = MockStatusSink::new();
        let invoker = RecordingInvoker::new();
        let engine = BatchScheduler::new(&jobs, &sink, &invoker, test_config(3));

        let worker = |_: &WorkItem| -> anyhow::Result<()> { panic!("must not run") };
        assert_eq!(engine.continue_chunk(&worker).unwrap(), ChunkOutcome::Noop);
    }

    #[test]
    fn inter_item_pause_skipped_when_zero() {
        let jobs = MockJobStore::new();
        let sink = MockStatusSink::new();
        let invoker = RecordingInvoker::new();
        let engine = BatchScheduler::new(&jobs, &sink, &invoker, test_config(10));

        engine.start(items(3)).unwrap();
        let ok = |_: &WorkItem| -> anyhow::Result<()> { Ok(()) };
        let started = std::time::Instant::now();
        engine.continue_chunk(&ok).unwrap();
        assert!(started.elapsed() < Duration::from_millis(100));
    }
}
