//! CLI subcommand implementations.

pub mod audit;
pub mod collect;
pub mod status;
pub mod watches;

use std::path::PathBuf;

use anyhow::Context as _;
use argus_config::ArgusConfig;
use argus_store::SqliteStore;

use crate::client::DriveApiClient;

/// Shared command context: the merged configuration.
pub struct Ctx {
    pub config: ArgusConfig,
}

impl Ctx {
    /// Load configuration, either from an explicit file or by discovery.
    pub fn load(config_path: Option<&PathBuf>) -> anyhow::Result<Self> {
        let config = match config_path {
            Some(path) => argus_config::load_config_file(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => argus_config::load_config(None)?.config,
        };
        Ok(Self { config })
    }

    /// Open the SQLite store at the configured path.
    pub fn open_store(&self) -> anyhow::Result<SqliteStore> {
        let store_config = self.config.store();
        SqliteStore::open(&store_config.db_path)
            .with_context(|| format!("opening store at {}", store_config.db_path.display()))
    }

    /// Build the drive API client from the `[api]` section.
    pub fn drive_client(&self) -> anyhow::Result<DriveApiClient> {
        let api = self
            .config
            .api
            .as_ref()
            .context("no [api] section configured — set base_url in your config")?;
        let token = api.token()?;
        DriveApiClient::new(api.base_url.as_str(), token)
    }
}
