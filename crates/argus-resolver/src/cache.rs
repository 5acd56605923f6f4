//! Session-scoped memoization of metadata lookups.

use std::collections::HashMap;

use tracing::debug;

use crate::lookup::{MetadataLookup, PathNode};
use crate::LookupError;

/// Outcome of a cached lookup.
///
/// Failures are memoized as `Missing` rather than retried, so repeated path
/// resolutions sharing ancestors do not re-issue failing requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOutcome {
    Found(PathNode),
    Missing,
}

/// Memoizing adapter over a [`MetadataLookup`].
///
/// Scoped to one resolution session: create it fresh per top-level
/// resolution pass and drop it afterwards. No eviction.
pub struct LookupCache<'a, L: MetadataLookup> {
    lookup: &'a L,
    entries: HashMap<String, CacheOutcome>,
}

impl<'a, L: MetadataLookup> LookupCache<'a, L> {
    pub fn new(lookup: &'a L) -> Self {
        Self {
            lookup,
            entries: HashMap::new(),
        }
    }

    /// Fetch metadata for `id`, consulting the cache first.
    pub fn get(&mut self, id: &str) -> CacheOutcome {
        if let Some(entry) = self.entries.get(id) {
            return entry.clone();
        }

        let outcome = match self.lookup.metadata(id) {
            Ok(node) => CacheOutcome::Found(node),
            Err(LookupError::NotFound(_)) | Err(LookupError::PermissionDenied(_)) => {
                debug!(id, "ancestor lookup failed, caching as missing");
                CacheOutcome::Missing
            }
            Err(LookupError::Backend(reason)) => {
                debug!(id, reason = %reason, "metadata backend error, caching as missing");
                CacheOutcome::Missing
            }
        };

        self.entries.insert(id.to_string(), outcome.clone());
        outcome
    }

    /// Number of distinct ids seen this session.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
