//! The re-invocation port.
//!
//! An external timer facility that calls back into the process after a
//! delay. The engine guarantees at most one pending re-invocation per
//! handler by always canceling before scheduling; implementations only need
//! at-least-once, best-effort delivery.

use std::collections::HashMap;
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

/// Scheduling or canceling a re-invocation failed.
#[derive(Debug, Error)]
#[error("invoker error: {0}")]
pub struct InvokeError(pub String);

/// Delayed re-invocation facility.
pub trait Invoker: Send + Sync {
    fn schedule_after(&self, handler: &str, delay: Duration)
        -> std::result::Result<(), InvokeError>;

    /// Remove every pending re-invocation for `handler`.
    fn cancel_all(&self, handler: &str) -> std::result::Result<(), InvokeError>;
}

/// One recorded invoker call, for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvokerCall {
    Schedule(String, Duration),
    CancelAll(String),
}

/// Test invoker that records calls instead of firing them.
#[derive(Debug, Default)]
pub struct RecordingInvoker {
    calls: Mutex<Vec<InvokerCall>>,
    pending: Mutex<HashMap<String, usize>>,
    fail_schedule: bool,
}

impl RecordingInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `schedule_after` call fail.
    pub fn failing() -> Self {
        Self {
            fail_schedule: true,
            ..Self::default()
        }
    }

    /// Full call log, in order.
    pub fn calls(&self) -> Vec<InvokerCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Re-invocations currently pending for a handler.
    pub fn pending(&self, handler: &str) -> usize {
        self.pending
            .lock()
            .unwrap()
            .get(handler)
            .copied()
            .unwrap_or(0)
    }

    /// Consume one pending re-invocation, simulating the timer firing.
    pub fn fire(&self, handler: &str) -> bool {
        let mut pending = self.pending.lock().unwrap();
        match pending.get_mut(handler) {
            Some(n) if *n > 0 => {
                *n -= 1;
                true
            }
            _ => false,
        }
    }
}

impl Invoker for RecordingInvoker {
    fn schedule_after(
        &self,
        handler: &str,
        delay: Duration,
    ) -> std::result::Result<(), InvokeError> {
        if self.fail_schedule {
            return Err(InvokeError("injected schedule failure".to_string()));
        }
        self.calls
            .lock()
            .unwrap()
            .push(InvokerCall::Schedule(handler.to_string(), delay));
        *self
            .pending
            .lock()
            .unwrap()
            .entry(handler.to_string())
            .or_insert(0) += 1;
        Ok(())
    }

    fn cancel_all(&self, handler: &str) -> std::result::Result<(), InvokeError> {
        self.calls
            .lock()
            .unwrap()
            .push(InvokerCall::CancelAll(handler.to_string()));
        self.pending.lock().unwrap().insert(handler.to_string(), 0);
        Ok(())
    }
}

/// Thread-backed invoker for in-process runs.
///
/// Each schedule spawns a sleeper thread that sends the handler name on a
/// channel when the delay elapses; the run loop drains the receiver and
/// re-enters the engine. Cancellation bumps a per-handler generation so
/// stale sleepers fall silent instead of firing.
pub struct ThreadInvoker {
    tx: Sender<String>,
    generations: Arc<Mutex<HashMap<String, u64>>>,
}

impl ThreadInvoker {
    /// Create the invoker and the receiver its callbacks arrive on.
    pub fn new() -> (Self, Receiver<String>) {
        let (tx, rx) = std::sync::mpsc::channel();
        (
            Self {
                tx,
                generations: Arc::new(Mutex::new(HashMap::new())),
            },
            rx,
        )
    }

    fn bump(&self, handler: &str) -> u64 {
        let mut generations = self.generations.lock().unwrap();
        let entry = generations.entry(handler.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }
}

impl Invoker for ThreadInvoker {
    fn schedule_after(
        &self,
        handler: &str,
        delay: Duration,
    ) -> std::result::Result<(), InvokeError> {
        let generation = self.bump(handler);
        let tx = self.tx.clone();
        let generations = Arc::clone(&self.generations);
        let handler = handler.to_string();

        std::thread::spawn(move || {
            std::thread::sleep(delay);
            let current = generations
                .lock()
                .unwrap()
                .get(&handler)
                .copied()
                .unwrap_or(0);
            if current != generation {
                debug!(handler = %handler, "stale timer suppressed");
                return;
            }
            // Receiver gone means the run loop exited; nothing to do.
            let _ = tx.send(handler);
        });
        Ok(())
    }

    fn cancel_all(&self, handler: &str) -> std::result::Result<(), InvokeError> {
        self.bump(handler);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_invoker_tracks_pending() {
        let invoker = RecordingInvoker::new();
        invoker.schedule_after("h", Duration::from_secs(1)).unwrap();
        invoker.schedule_after("h", Duration::from_secs(1)).unwrap();
        assert_eq!(invoker.pending("h"), 2);

        invoker.cancel_all("h").unwrap();
        assert_eq!(invoker.pending("h"), 0);
        assert!(!invoker.fire("h"));

        invoker.schedule_after("h", Duration::from_secs(1)).unwrap();
        assert!(invoker.fire("h"));
        assert_eq!(invoker.pending("h"), 0);
    }

    #[test]
    fn thread_invoker_fires_after_delay() {
        let (invoker, rx) = ThreadInvoker::new();
        invoker
            .schedule_after("tick", Duration::from_millis(10))
            .unwrap();

        let fired = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(fired, "tick");
    }

    #[test]
    fn thread_invoker_cancel_suppresses_pending() {
        let (invoker, rx) = ThreadInvoker::new();
        invoker
            .schedule_after("tick", Duration::from_millis(50))
            .unwrap();
        invoker.cancel_all("tick").unwrap();

        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn thread_invoker_reschedule_replaces_pending() {
        let (invoker, rx) = ThreadInvoker::new();
        invoker
            .schedule_after("tick", Duration::from_millis(50))
            .unwrap();
        // Rescheduling cancels the first sleeper implicitly
        invoker
            .schedule_after("tick", Duration::from_millis(10))
            .unwrap();

        assert!(rx.recv_timeout(Duration::from_secs(2)).is_ok());
        // Only the second fires
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }
}
