//! The metadata lookup port.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::{LookupError, Result};

/// Metadata for one node of the remote hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathNode {
    pub id: String,
    pub name: String,
    /// Parent ids as listed by the remote service. The walk follows the
    /// first entry; the full list is retained so a caller can enumerate
    /// alternate locations.
    pub parent_ids: Vec<String>,
    /// Containing shared-drive id, if the node lives on one.
    pub container_id: Option<String>,
}

/// External "get metadata by id" operation.
pub trait MetadataLookup {
    fn metadata(&self, id: &str) -> Result<PathNode>;

    /// Display name of a container (shared drive). Separate from node
    /// metadata because containers live in a different namespace.
    fn container_name(&self, container_id: &str) -> Result<String>;
}

/// In-memory lookup for testing: preloaded nodes, optional per-id failures,
/// and a fetch counter for memoization assertions.
#[derive(Debug, Default)]
pub struct MockMetadataLookup {
    nodes: HashMap<String, PathNode>,
    containers: HashMap<String, String>,
    denied: Vec<String>,
    fetches: Mutex<Vec<String>>,
}

impl MockMetadataLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_node(
        mut self,
        id: &str,
        name: &str,
        parents: &[&str],
        container: Option<&str>,
    ) -> Self {
        self.nodes.insert(
            id.to_string(),
            PathNode {
                id: id.to_string(),
                name: name.to_string(),
                parent_ids: parents.iter().map(|p| p.to_string()).collect(),
                container_id: container.map(String::from),
            },
        );
        self
    }

    pub fn with_container(mut self, id: &str, name: &str) -> Self {
        self.containers.insert(id.to_string(), name.to_string());
        self
    }

    /// Make lookups for `id` fail with `PermissionDenied`.
    pub fn with_denied(mut self, id: &str) -> Self {
        self.denied.push(id.to_string());
        self
    }

    /// Ids fetched so far, in order, duplicates included.
    pub fn fetch_log(&self) -> Vec<String> {
        self.fetches.lock().unwrap().clone()
    }
}

impl MetadataLookup for MockMetadataLookup {
    fn metadata(&self, id: &str) -> Result<PathNode> {
        self.fetches.lock().unwrap().push(id.to_string());
        if self.denied.iter().any(|d| d == id) {
            return Err(LookupError::PermissionDenied(id.to_string()));
        }
        self.nodes
            .get(id)
            .cloned()
            .ok_or_else(|| LookupError::NotFound(id.to_string()))
    }

    fn container_name(&self, container_id: &str) -> Result<String> {
        self.containers
            .get(container_id)
            .cloned()
            .ok_or_else(|| LookupError::NotFound(container_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_serves_and_fails() {
        let lookup = MockMetadataLookup::new()
            .with_node("a", "A", &["b"], None)
            .with_denied("b");

        assert_eq!(lookup.metadata("a").unwrap().name, "A");
        assert!(matches!(
            lookup.metadata("b").unwrap_err(),
            LookupError::PermissionDenied(_)
        ));
        assert!(matches!(
            lookup.metadata("missing").unwrap_err(),
            LookupError::NotFound(_)
        ));
        assert_eq!(lookup.fetch_log(), vec!["a", "b", "missing"]);
    }
}
