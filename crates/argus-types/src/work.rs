//! Work items and batch run state.

use serde::{Deserialize, Serialize};

/// State of the single batch job slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    /// No job queued; `start` may claim the slot.
    Idle,
    /// A job holds the slot and a re-invocation is pending or imminent.
    Running,
    /// The job was canceled before draining; the slot is free again.
    Canceled,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Idle => write!(f, "idle"),
            RunState::Running => write!(f, "running"),
            RunState::Canceled => write!(f, "canceled"),
        }
    }
}

/// One unit of batch work, e.g. a directory group to audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Stable key used for status reporting.
    pub key: String,
    /// Human-readable label for display.
    pub label: String,
}

impl WorkItem {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

/// Per-item outcome recorded in the status sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    /// Queued, not yet reached by a chunk.
    Pending,
    /// Worker completed the item.
    Done,
    /// Worker errored on the item; the error stays with this item only.
    Failed,
    /// The job was canceled before this item was processed.
    Canceled,
}

impl std::fmt::Display for ItemState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemState::Pending => write!(f, "pending"),
            ItemState::Done => write!(f, "done"),
            ItemState::Failed => write!(f, "failed"),
            ItemState::Canceled => write!(f, "canceled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_state_display() {
        assert_eq!(format!("{}", RunState::Idle), "idle");
        assert_eq!(format!("{}", RunState::Running), "running");
        assert_eq!(format!("{}", RunState::Canceled), "canceled");
    }

    #[test]
    fn work_item_round_trips() {
        let item = WorkItem::new("grp-1", "engineering@example.com");
        let json = serde_json::to_string(&item).unwrap();
        let back: WorkItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
    }
}
