//! Shared domain types for argus.
//!
//! Everything downstream of the collection and scheduling cores speaks these
//! types: watched resources from the config table, normalized permission
//! change events, and the work items / statuses flowing through the batch
//! engine.

pub mod event;
pub mod resource;
pub mod work;

pub use event::{ChangeEvent, ChangeKind, Entity, EntityKind};
pub use resource::WatchedResource;
pub use work::{ItemState, RunState, WorkItem};
