//! Group share auditing for argus.
//!
//! Assembles the batch job that enumerates directory groups and the folder
//! trees shared with them: the paginated group roster becomes the work-item
//! list, and the per-group worker resolves the full path of every item
//! shared with that group into report rows.

pub mod error;
pub mod roster;
pub mod search;
pub mod worker;

pub use error::{AuditError, Result};
pub use roster::{collect_groups, roster_items, Group, GroupDirectory, GroupPage, MockGroupDirectory};
pub use search::{MockSharedItemSearch, SearchError, SharedItem, SharedItemSearch};
pub use worker::GroupAuditWorker;
