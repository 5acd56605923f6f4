//! Watermark-based incremental event collection.
//!
//! Each collection pass queries the external activity feed per watched
//! resource since that resource's stored watermark, normalizes raw records
//! into typed [`argus_types::ChangeEvent`]s at the boundary, advances the
//! watermark, and deduplicates findings across the pass. A query failure for
//! one resource never aborts the others.

pub mod collector;
pub mod dedup;
pub mod error;
pub mod feed;
pub mod normalize;
pub mod notify;

pub use collector::{CollectedEvent, EventCollector};
pub use dedup::dedupe;
pub use error::{CollectorError, Result};
pub use feed::{ActivityFeed, FeedError, MockActivityFeed, RawAction, RawGrantee};
pub use normalize::{classify, normalize};
pub use notify::{dispatch, MockNotifier, Notifier, NotifyError};
