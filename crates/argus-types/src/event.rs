//! Normalized permission change events.
//!
//! Raw activity records are normalized into these types at the collector
//! boundary; nothing downstream inspects raw feed shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direction of a permission change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// A permission entry was granted.
    Added,
    /// A permission entry was revoked.
    Removed,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeKind::Added => write!(f, "added"),
            ChangeKind::Removed => write!(f, "removed"),
        }
    }
}

/// Who a permission entry grants access to.
///
/// Classification precedence at normalization time is user > group > domain
/// > anyone-with-link > unknown; a single raw record can carry several hints
/// and the first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A known user account.
    User,
    /// A directory group.
    Group,
    /// An entire domain.
    Domain,
    /// Anyone holding the link.
    Anyone,
    /// The record carried no recognizable hint.
    Unknown,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::User => write!(f, "user"),
            EntityKind::Group => write!(f, "group"),
            EntityKind::Domain => write!(f, "domain"),
            EntityKind::Anyone => write!(f, "anyone"),
            EntityKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// The grantee of a permission entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    pub kind: EntityKind,
    /// Email address, domain name, or a raw identifier for link/unknown
    /// grantees.
    pub identifier: String,
}

impl Entity {
    pub fn new(kind: EntityKind, identifier: impl Into<String>) -> Self {
        Self {
            kind,
            identifier: identifier.into(),
        }
    }
}

/// One permission entry added to or removed from a watched item.
///
/// Immutable once built; multiple raw records normalizing to the same
/// logical event collapse during the collector's dedup pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Remote id of the file or folder whose permissions changed.
    pub target_id: String,
    /// Display name of the target at the time of the change.
    pub target_name: String,
    pub kind: ChangeKind,
    pub entity: Entity,
    /// Role granted or revoked (reader, writer, owner, ...), as reported.
    pub role: String,
    /// Description of who made the change, as reported by the feed.
    pub actor: String,
    pub when: DateTime<Utc>,
}

impl ChangeEvent {
    /// Truncate the event time to its minute bucket, the granularity at
    /// which repeated raw records are considered the same logical event.
    pub fn minute_bucket(&self) -> i64 {
        self.when.timestamp() / 60
    }
}
