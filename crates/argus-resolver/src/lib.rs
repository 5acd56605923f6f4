//! Hierarchical path resolution for argus.
//!
//! Reconstructs a node's root-to-node path by walking its ancestor chain
//! through the [`MetadataLookup`] port. Lookups are memoized for the length
//! of one resolution session, failed lookups included, so repeated
//! resolutions sharing ancestors never re-issue failing requests.

pub mod cache;
pub mod error;
pub mod lookup;
pub mod resolver;

pub use cache::{CacheOutcome, LookupCache};
pub use error::{LookupError, Result};
pub use lookup::{MetadataLookup, MockMetadataLookup, PathNode};
pub use resolver::{PathResolver, ResolvedPath, MAX_DEPTH};
