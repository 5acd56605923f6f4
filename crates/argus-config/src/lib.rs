//! Configuration system for argus.
//!
//! Provides TOML-based configuration with:
//! - Typed sections for the store, collector, scheduler, API client and
//!   notification endpoint
//! - The `[[watch]]` table: the read-only list of watched subtrees
//! - Config file layering (XDG user config + project-local overrides)

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    load_config, load_config_file, load_config_with_options, xdg_config_dir, xdg_config_path,
    LoadedConfig,
};
pub use error::{ConfigError, Result};
pub use types::{
    ApiConfig, ArgusConfig, CollectorConfig, NotifyConfig, SchedulerConfig, StoreConfig,
};
