//! Configuration types mapping to the TOML schema.
//!
//! Top-level config:
//! ```toml
//! [store]          # SQLite location
//! [api]            # remote drive API endpoint
//! [collector]      # grace window for first observation
//! [scheduler]      # chunk size, re-invocation delay, inter-item pause
//! [notify]         # webhook endpoint
//! [[watch]]        # one row per watched subtree
//! ```

use std::path::PathBuf;

use argus_types::WatchedResource;
use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

/// Root configuration structure.
///
/// All sections are optional in the file so partial configs (project-local
/// overrides) can be loaded and merged; accessors fill in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArgusConfig {
    /// SQLite store settings.
    pub store: Option<StoreConfig>,

    /// Remote drive API endpoint settings.
    pub api: Option<ApiConfig>,

    /// Event collection settings.
    pub collector: Option<CollectorConfig>,

    /// Batch scheduler settings.
    pub scheduler: Option<SchedulerConfig>,

    /// Notification endpoint settings.
    pub notify: Option<NotifyConfig>,

    /// Watched subtrees, in row order.
    #[serde(rename = "watch")]
    pub watches: Vec<WatchedResource>,
}

impl ArgusConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Merge another config on top of this one (other takes priority).
    ///
    /// Sections replace wholesale; a non-empty watch table in the overriding
    /// layer replaces the full table rather than appending, so a project
    /// config can narrow the watched set.
    pub fn merge(&mut self, other: ArgusConfig) {
        if other.store.is_some() {
            self.store = other.store;
        }
        if other.api.is_some() {
            self.api = other.api;
        }
        if other.collector.is_some() {
            self.collector = other.collector;
        }
        if other.scheduler.is_some() {
            self.scheduler = other.scheduler;
        }
        if other.notify.is_some() {
            self.notify = other.notify;
        }
        if !other.watches.is_empty() {
            self.watches = other.watches;
        }
    }

    /// Validate watch rows: ids must be present and unique.
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for row in &self.watches {
            if row.id.is_empty() {
                return Err(ConfigError::InvalidWatch {
                    id: row.display_name.clone(),
                    reason: "empty id".to_string(),
                });
            }
            if !seen.insert(row.id.as_str()) {
                return Err(ConfigError::InvalidWatch {
                    id: row.id.clone(),
                    reason: "duplicate id".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn store(&self) -> StoreConfig {
        self.store.clone().unwrap_or_default()
    }

    pub fn collector(&self) -> CollectorConfig {
        self.collector.clone().unwrap_or_default()
    }

    pub fn scheduler(&self) -> SchedulerConfig {
        self.scheduler.clone().unwrap_or_default()
    }
}

/// SQLite store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    pub db_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            db_path: base.join("argus").join("argus.db"),
        }
    }
}

/// Remote drive API endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the drive-like REST API.
    pub base_url: String,

    /// Environment variable holding the bearer token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

fn default_token_env() -> String {
    "ARGUS_API_TOKEN".to_string()
}

impl ApiConfig {
    /// Resolve the bearer token from the configured environment variable.
    pub fn token(&self) -> Result<String> {
        std::env::var(&self.token_env).map_err(|_| ConfigError::ApiTokenNotFound {
            env_var: self.token_env.clone(),
        })
    }
}

/// Event collection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// First observation of a resource scans back this far.
    pub grace_minutes: i64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self { grace_minutes: 60 }
    }
}

/// Batch scheduler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Items processed per invocation. Sized so a chunk stays well below a
    /// hosted execution-time ceiling.
    pub chunk_size: usize,

    /// Delay before the next chunk invocation, in seconds.
    pub continue_delay_secs: u64,

    /// Pause between items within a chunk, in milliseconds. A throttle for
    /// the external API, not a correctness requirement.
    pub item_pause_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 25,
            continue_delay_secs: 5,
            item_pause_ms: 200,
        }
    }
}

/// Notification endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Webhook URL events are posted to.
    pub webhook_url: String,
}
