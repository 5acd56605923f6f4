//! Best-effort notification dispatch.
//!
//! The notification endpoint is an external collaborator; delivery failures
//! are logged and the event is dropped for this run. Nothing is requeued.

use std::sync::Mutex;

use argus_types::ChangeEvent;
use thiserror::Error;
use tracing::{info, warn};

use crate::collector::CollectedEvent;

/// The notification endpoint rejected or failed a delivery.
#[derive(Debug, Error)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Outbound notification endpoint.
pub trait Notifier {
    fn deliver(
        &self,
        event: &ChangeEvent,
        target: Option<&str>,
    ) -> std::result::Result<(), NotifyError>;
}

/// Forward a collected batch to the notifier. Returns the number of events
/// actually delivered; failures are logged per event and never retried.
pub fn dispatch(events: &[CollectedEvent], notifier: &dyn Notifier) -> usize {
    let mut delivered = 0;
    for collected in events {
        let event = &collected.event;
        match notifier.deliver(event, collected.notify_target.as_deref()) {
            Ok(()) => delivered += 1,
            Err(e) => {
                warn!(
                    target_id = %event.target_id,
                    entity = %event.entity.identifier,
                    error = %e,
                    "notification delivery failed, event dropped for this run"
                );
            }
        }
    }
    info!(delivered, total = events.len(), "notification dispatch complete");
    delivered
}

/// Recording notifier for tests, with optional failure injection.
#[derive(Debug, Default)]
pub struct MockNotifier {
    delivered: Mutex<Vec<(String, Option<String>)>>,
    fail_targets: Vec<String>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail deliveries for events on this target id.
    pub fn with_failing_target(mut self, target_id: &str) -> Self {
        self.fail_targets.push(target_id.to_string());
        self
    }

    /// Delivered (target_id, notify_target) pairs, in order.
    pub fn deliveries(&self) -> Vec<(String, Option<String>)> {
        self.delivered.lock().unwrap().clone()
    }
}

impl Notifier for MockNotifier {
    fn deliver(
        &self,
        event: &ChangeEvent,
        target: Option<&str>,
    ) -> std::result::Result<(), NotifyError> {
        if self.fail_targets.iter().any(|t| t == &event.target_id) {
            return Err(NotifyError("injected delivery failure".to_string()));
        }
        self.delivered
            .lock()
            .unwrap()
            .push((event.target_id.clone(), target.map(String::from)));
        Ok(())
    }
}
