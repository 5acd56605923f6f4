//! The shared-item search port.

use std::collections::HashMap;

use thiserror::Error;

/// A shared-item search failed for one principal. Fails that work item
/// only; the batch engine records it and moves on.
#[derive(Debug, Error)]
#[error("shared item search failed: {0}")]
pub struct SearchError(pub String);

/// One item shared with a principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedItem {
    pub id: String,
    pub name: String,
}

/// Finds every item shared with a principal (group or user).
pub trait SharedItemSearch {
    fn shared_with(&self, principal: &str) -> std::result::Result<Vec<SharedItem>, SearchError>;
}

/// In-memory search for testing.
#[derive(Debug, Default)]
pub struct MockSharedItemSearch {
    hits: HashMap<String, Vec<SharedItem>>,
    failing: Vec<String>,
}

impl MockSharedItemSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hit(mut self, principal: &str, id: &str, name: &str) -> Self {
        self.hits
            .entry(principal.to_string())
            .or_default()
            .push(SharedItem {
                id: id.to_string(),
                name: name.to_string(),
            });
        self
    }

    pub fn with_failing(mut self, principal: &str) -> Self {
        self.failing.push(principal.to_string());
        self
    }
}

impl SharedItemSearch for MockSharedItemSearch {
    fn shared_with(&self, principal: &str) -> std::result::Result<Vec<SharedItem>, SearchError> {
        if self.failing.iter().any(|p| p == principal) {
            return Err(SearchError(format!("injected failure for {principal}")));
        }
        Ok(self.hits.get(principal).cloned().unwrap_or_default())
    }
}
