//! Watched resource rows.

use serde::{Deserialize, Serialize};

/// A subtree of the remote drive being monitored for permission changes.
///
/// Rows come from the `[[watch]]` table in the configuration file and are
/// read-only to the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchedResource {
    /// Remote identifier of the subtree root.
    pub id: String,
    /// Human-readable name shown in reports and notifications.
    pub display_name: String,
    /// Disabled rows are kept in config but skipped by every pass.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Delivery target for notifications about this subtree, if any.
    #[serde(default)]
    pub notify_target: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl WatchedResource {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            enabled: true,
            notify_target: None,
        }
    }
}
