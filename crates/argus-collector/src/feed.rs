//! The activity feed port and its raw record shapes.
//!
//! Raw records mirror what the remote feed reports: untyped grantee hints
//! that [`crate::normalize`] turns into strict tagged entities.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

/// A feed query failed. Tolerated per resource: the pass logs, skips the
/// resource, and moves on.
#[derive(Debug, Error)]
#[error("activity feed query failed: {0}")]
pub struct FeedError(pub String);

pub type FeedResult<T> = std::result::Result<T, FeedError>;

/// A grantee as the feed reports it, hints only. A single record can carry
/// several hints; classification precedence resolves the ambiguity.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawGrantee {
    /// Email of a known user account.
    pub user_email: Option<String>,
    /// Email of a directory group.
    pub group_email: Option<String>,
    /// Domain-wide grant.
    pub domain: Option<String>,
    /// Anyone-with-link grant.
    pub anyone_with_link: bool,
    /// Opaque grantee id when nothing else is known.
    pub opaque_id: Option<String>,
}

/// One raw permission-change action from the feed.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAction {
    pub target_id: String,
    #[serde(default)]
    pub target_name: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub actor: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub added: Vec<RawGrantee>,
    #[serde(default)]
    pub removed: Vec<RawGrantee>,
}

/// External activity feed: permission-change actions on a subtree since a
/// timestamp.
pub trait ActivityFeed {
    fn changes_since(&self, subtree_id: &str, since: DateTime<Utc>)
        -> FeedResult<Vec<RawAction>>;
}

/// In-memory feed for testing: preloaded actions per subtree, per-subtree
/// failure injection, and a query log.
#[derive(Debug, Default)]
pub struct MockActivityFeed {
    actions: HashMap<String, Vec<RawAction>>,
    failing: Vec<String>,
    queries: Mutex<Vec<(String, DateTime<Utc>)>>,
}

impl MockActivityFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_actions(mut self, subtree_id: &str, actions: Vec<RawAction>) -> Self {
        self.actions
            .entry(subtree_id.to_string())
            .or_default()
            .extend(actions);
        self
    }

    /// Make queries for `subtree_id` fail.
    pub fn with_failing(mut self, subtree_id: &str) -> Self {
        self.failing.push(subtree_id.to_string());
        self
    }

    /// Query log: (subtree, since) pairs in call order.
    pub fn queries(&self) -> Vec<(String, DateTime<Utc>)> {
        self.queries.lock().unwrap().clone()
    }
}

impl ActivityFeed for MockActivityFeed {
    fn changes_since(
        &self,
        subtree_id: &str,
        since: DateTime<Utc>,
    ) -> FeedResult<Vec<RawAction>> {
        self.queries
            .lock()
            .unwrap()
            .push((subtree_id.to_string(), since));

        if self.failing.iter().any(|f| f == subtree_id) {
            return Err(FeedError(format!("injected failure for {subtree_id}")));
        }

        Ok(self
            .actions
            .get(subtree_id)
            .map(|actions| {
                actions
                    .iter()
                    .filter(|a| a.timestamp >= since)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn action_at(ts: DateTime<Utc>) -> RawAction {
        RawAction {
            target_id: "t1".into(),
            target_name: "Doc".into(),
            timestamp: ts,
            actor: None,
            role: None,
            added: vec![],
            removed: vec![],
        }
    }

    #[test]
    fn mock_feed_filters_by_since() {
        let now = Utc::now();
        let feed = MockActivityFeed::new().with_actions(
            "sub",
            vec![action_at(now - Duration::hours(2)), action_at(now)],
        );

        let hits = feed.changes_since("sub", now - Duration::hours(1)).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(feed.queries().len(), 1);
    }

    #[test]
    fn mock_feed_injected_failure() {
        let feed = MockActivityFeed::new().with_failing("bad");
        assert!(feed.changes_since("bad", Utc::now()).is_err());
    }
}
