//! End-to-end engine behavior over the mock stores and recording invoker.

use std::sync::Mutex;
use std::time::Duration;

use argus_scheduler::{
    BatchScheduler, ChunkOutcome, EngineConfig, ItemWorker, RecordingInvoker, SchedulerError,
    CONTINUE_HANDLER,
};
use argus_store::{JobStore, MockJobStore, MockStatusSink};
use argus_types::{ItemState, WorkItem};

fn items(n: usize) -> Vec<WorkItem> {
    (1..=n)
        .map(|i| WorkItem::new(format!("g{i}"), format!("group {i}")))
        .collect()
}

fn config(chunk_size: usize) -> EngineConfig {
    EngineConfig {
        chunk_size,
        continue_delay: Duration::from_millis(1),
        item_pause: Duration::ZERO,
    }
}

/// Worker recording the keys it processed, with optional failure keys.
#[derive(Default)]
struct SpyWorker {
    processed: Mutex<Vec<String>>,
    fail_keys: Vec<String>,
}

impl SpyWorker {
    fn failing_on(keys: &[&str]) -> Self {
        Self {
            processed: Mutex::new(Vec::new()),
            fail_keys: keys.iter().map(|k| k.to_string()).collect(),
        }
    }

    fn processed(&self) -> Vec<String> {
        self.processed.lock().unwrap().clone()
    }
}

impl ItemWorker for SpyWorker {
    fn process(&self, item: &WorkItem) -> anyhow::Result<()> {
        self.processed.lock().unwrap().push(item.key.clone());
        if self.fail_keys.contains(&item.key) {
            anyhow::bail!("synthetic failure on {}", item.key);
        }
        Ok(())
    }
}

#[test]
fn ten_items_chunk_three_drain_in_four_calls() {
    let jobs = MockJobStore::new();
    let sink = MockStatusSink::new();
    let invoker = RecordingInvoker::new();
    let engine = BatchScheduler::new(&jobs, &sink, &invoker, config(3));
    let worker = SpyWorker::default();

    engine.start(items(10)).unwrap();

    let mut sizes = Vec::new();
    loop {
        assert!(invoker.fire(CONTINUE_HANDLER), "a re-invocation must be pending");
        match engine.continue_chunk(&worker).unwrap() {
            ChunkOutcome::Processed {
                processed,
                remaining,
            } => {
                sizes.push(processed);
                if remaining == 0 {
                    break;
                }
            }
            ChunkOutcome::Noop => panic!("unexpected noop mid-drain"),
        }
    }

    assert_eq!(sizes, vec![3, 3, 3, 1]);
    assert_eq!(worker.processed().len(), 10);
    // Slot is empty and idle again
    assert!(jobs.load().unwrap().is_none());
    assert_eq!(sink.count_in(ItemState::Done), 10);
    // No stray re-invocation left behind
    assert_eq!(invoker.pending(CONTINUE_HANDLER), 0);
}

#[test]
fn at_most_one_pending_reinvocation_at_any_time() {
    let jobs = MockJobStore::new();
    let sink = MockStatusSink::new();
    let invoker = RecordingInvoker::new();
    let engine = BatchScheduler::new(&jobs, &sink, &invoker, config(3));
    let worker = SpyWorker::default();

    engine.start(items(10)).unwrap();
    assert_eq!(invoker.pending(CONTINUE_HANDLER), 1);

    invoker.fire(CONTINUE_HANDLER);
    engine.continue_chunk(&worker).unwrap();
    assert_eq!(invoker.pending(CONTINUE_HANDLER), 1);
}

#[test]
fn start_while_running_fails_and_leaves_queue_untouched() {
    let jobs = MockJobStore::new();
    let sink = MockStatusSink::new();
    let invoker = RecordingInvoker::new();
    let engine = BatchScheduler::new(&jobs, &sink, &invoker, config(3));
    let worker = SpyWorker::default();

    let first = engine.start(items(10)).unwrap();
    invoker.fire(CONTINUE_HANDLER);
    engine.continue_chunk(&worker).unwrap();

    let err = engine.start(items(2)).unwrap_err();
    assert!(matches!(err, SchedulerError::AlreadyRunning(_)));

    let job = jobs.load().unwrap().unwrap();
    assert_eq!(job.run_id, first.run_id);
    assert_eq!(job.cursor, 3);
    assert_eq!(job.items.len(), 10);
}

#[test]
fn cancel_mid_run_marks_remaining_and_stale_continue_noops() {
    let jobs = MockJobStore::new();
    let sink = MockStatusSink::new();
    let invoker = RecordingInvoker::new();
    let engine = BatchScheduler::new(&jobs, &sink, &invoker, config(3));
    let worker = SpyWorker::default();

    engine.start(items(10)).unwrap();
    invoker.fire(CONTINUE_HANDLER);
    engine.continue_chunk(&worker).unwrap();

    engine.cancel().unwrap();

    assert!(jobs.load().unwrap().is_none());
    assert_eq!(sink.count_in(ItemState::Done), 3);
    assert_eq!(sink.count_in(ItemState::Canceled), 7);
    assert_eq!(invoker.pending(CONTINUE_HANDLER), 0);

    // A stale pending timer firing late is a no-op
    assert_eq!(
        engine.continue_chunk(&worker).unwrap(),
        ChunkOutcome::Noop
    );
    assert_eq!(worker.processed().len(), 3);
}

#[test]
fn cancel_on_idle_slot_is_idempotent() {
    let jobs = MockJobStore::new();
    let sink = MockStatusSink::new();
    let invoker = RecordingInvoker::new();
    let engine = BatchScheduler::new(&jobs, &sink, &invoker, config(3));

    engine.cancel().unwrap();
    engine.cancel().unwrap();
}

#[test]
fn worker_error_is_scoped_to_its_item() {
    let jobs = MockJobStore::new();
    let sink = MockStatusSink::new();
    let invoker = RecordingInvoker::new();
    let engine = BatchScheduler::new(&jobs, &sink, &invoker, config(3));
    let worker = SpyWorker::failing_on(&["g5"]);

    engine.start(items(10)).unwrap();
    loop {
        match engine.continue_chunk(&worker).unwrap() {
            ChunkOutcome::Processed { remaining: 0, .. } => break,
            ChunkOutcome::Processed { .. } => {}
            ChunkOutcome::Noop => panic!("unexpected noop"),
        }
    }

    assert_eq!(sink.state_of("g5"), Some(ItemState::Failed));
    assert!(sink
        .detail_of("g5")
        .unwrap()
        .contains("synthetic failure"));
    assert_eq!(sink.count_in(ItemState::Done), 9);
    // Items after the failure still processed
    assert_eq!(sink.state_of("g6"), Some(ItemState::Done));
    assert_eq!(sink.state_of("g10"), Some(ItemState::Done));
}

#[test]
fn restart_after_drain_reuses_the_slot() {
    let jobs = MockJobStore::new();
    let sink = MockStatusSink::new();
    let invoker = RecordingInvoker::new();
    let engine = BatchScheduler::new(&jobs, &sink, &invoker, config(5));
    let worker = SpyWorker::default();

    engine.start(items(4)).unwrap();
    engine.continue_chunk(&worker).unwrap();
    assert!(jobs.load().unwrap().is_none());

    // Second job claims the freed slot; statuses reset to the new run
    engine.start(items(2)).unwrap();
    assert_eq!(sink.count_in(ItemState::Pending), 2);
    assert_eq!(sink.count_in(ItemState::Done), 0);
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Draining any queue takes exactly ceil(n / chunk) invocations and
        /// processes every item exactly once, cursor never out of bounds.
        #[test]
        fn drain_invocation_count(n in 1usize..60, chunk in 1usize..10) {
            let jobs = MockJobStore::new();
            let sink = MockStatusSink::new();
            let invoker = RecordingInvoker::new();
            let engine = BatchScheduler::new(&jobs, &sink, &invoker, config(chunk));
            let worker = SpyWorker::default();

            engine.start(items(n)).unwrap();

            let mut calls = 0;
            loop {
                let outcome = engine.continue_chunk(&worker).unwrap();
                calls += 1;
                let job = jobs.load().unwrap();
                if let Some(job) = &job {
                    prop_assert!(job.cursor <= job.items.len());
                }
                match outcome {
                    ChunkOutcome::Processed { remaining: 0, .. } => break,
                    ChunkOutcome::Processed { .. } => {}
                    ChunkOutcome::Noop => prop_assert!(false, "noop mid-drain"),
                }
            }

            prop_assert_eq!(calls, n.div_ceil(chunk));
            prop_assert_eq!(worker.processed().len(), n);
            prop_assert!(jobs.load().unwrap().is_none());
        }
    }
}
