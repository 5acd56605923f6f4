//! Root-to-node path reconstruction.

use tracing::warn;

use crate::cache::{CacheOutcome, LookupCache};
use crate::lookup::MetadataLookup;

/// Defensive bound on the ancestor walk. Ancestor chains are a tree by
/// construction in the source system; this guards against malformed data
/// producing an unbounded loop.
pub const MAX_DEPTH: usize = 1000;

/// A resolved root-to-node path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Names from root to node. Ancestors that could not be resolved appear
    /// as their raw id, so the path never silently truncates.
    pub parts: Vec<String>,
    /// Number of ancestors above the node in `parts`.
    pub depth: usize,
    /// Display name of the containing shared drive, empty when the node has
    /// no container or its name could not be resolved.
    pub container_name: String,
}

impl ResolvedPath {
    /// The path joined for display.
    pub fn joined(&self) -> String {
        self.parts.join(" / ")
    }
}

/// Walks ancestor chains to produce full paths.
///
/// One resolver instance is one resolution session: lookups (including
/// failed ones) are memoized for its lifetime, so resolving many nodes that
/// share ancestors costs one fetch per distinct ancestor.
pub struct PathResolver<'a, L: MetadataLookup> {
    cache: LookupCache<'a, L>,
    lookup: &'a L,
}

impl<'a, L: MetadataLookup> PathResolver<'a, L> {
    pub fn new(lookup: &'a L) -> Self {
        Self {
            cache: LookupCache::new(lookup),
            lookup,
        }
    }

    /// Resolve the full path of `id`.
    ///
    /// Walks the first listed parent of each node until a node has no
    /// parent, a lookup fails, or the depth bound is hit. Multi-parent nodes
    /// are treated as having one canonical location.
    pub fn resolve(&mut self, id: &str) -> ResolvedPath {
        let mut leaf_container = None;
        // Leaf-to-root order during the walk, reversed at the end.
        let mut parts = Vec::new();
        let mut current = id.to_string();

        for step in 0.. {
            if step >= MAX_DEPTH {
                warn!(id, "ancestor walk hit depth bound, truncating path");
                break;
            }

            match self.cache.get(&current) {
                CacheOutcome::Found(node) => {
                    if step == 0 {
                        leaf_container = node.container_id.clone();
                    }
                    parts.push(node.name.clone());
                    match node.parent_ids.first() {
                        Some(parent) => current = parent.clone(),
                        None => break,
                    }
                }
                CacheOutcome::Missing => {
                    // Raw id fallback keeps the unresolved ancestor visible.
                    parts.push(current.clone());
                    break;
                }
            }
        }

        parts.reverse();
        let depth = parts.len().saturating_sub(1);
        let container_name = leaf_container
            .and_then(|cid| self.container(&cid))
            .unwrap_or_default();

        ResolvedPath {
            parts,
            depth,
            container_name,
        }
    }

    fn container(&self, container_id: &str) -> Option<String> {
        match self.lookup.container_name(container_id) {
            Ok(name) => Some(name),
            Err(e) => {
                warn!(container_id, error = %e, "container name lookup failed");
                None
            }
        }
    }

    /// Distinct ids fetched so far in this session.
    pub fn session_len(&self) -> usize {
        self.cache.len()
    }
}
