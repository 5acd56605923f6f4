//! Config file discovery and layered merging.
//!
//! Resolution order (later overrides earlier):
//! 1. `~/.config/argus/config.toml` (XDG user config)
//! 2. `./argus.toml` (project-local)
//! 3. CLI arguments (handled externally)

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{ArgusConfig, ConfigError, Result};

/// Default config filename for project-local config.
const PROJECT_CONFIG_FILE: &str = "argus.toml";

/// Default config filename within the XDG config directory.
const USER_CONFIG_FILE: &str = "config.toml";

/// Application name for XDG directory resolution.
const APP_NAME: &str = "argus";

/// Environment variable overriding the user config directory.
const CONFIG_DIR_ENV: &str = "ARGUS_CONFIG_DIR";

/// Result of config discovery and loading.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The merged configuration.
    pub config: ArgusConfig,
    /// Files that were actually loaded, lowest precedence first.
    pub loaded_from: Vec<PathBuf>,
}

/// Load configuration by discovering and merging all config layers.
pub fn load_config(project_dir: Option<&Path>) -> Result<LoadedConfig> {
    load_config_with_options(project_dir, None)
}

/// Load configuration with explicit control over the user config directory.
///
/// `config_dir` overrides both `ARGUS_CONFIG_DIR` and the platform default.
pub fn load_config_with_options(
    project_dir: Option<&Path>,
    config_dir: Option<&Path>,
) -> Result<LoadedConfig> {
    let mut config = ArgusConfig::new();
    let mut loaded_from = Vec::new();

    // 1. User config — explicit override, then env var, then platform default
    let user_config_path = match config_dir {
        Some(dir) => Some(dir.join(USER_CONFIG_FILE)),
        None => xdg_config_path(),
    };
    if let Some(path) = user_config_path {
        if load_layer(&mut config, &path)? {
            loaded_from.push(path);
        }
    }

    // 2. Project-local config
    let project_path = project_dir
        .map(|d| d.join(PROJECT_CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG_FILE));
    if load_layer(&mut config, &project_path)? {
        loaded_from.push(project_path);
    }

    config.validate()?;

    Ok(LoadedConfig {
        config,
        loaded_from,
    })
}

/// Load config from a specific file path (no discovery, no merging).
pub fn load_config_file(path: &Path) -> Result<ArgusConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    let config = ArgusConfig::from_toml(&contents)?;
    config.validate()?;
    Ok(config)
}

/// Merge one file into `config` if it exists. Returns whether it was loaded.
fn load_layer(config: &mut ArgusConfig, path: &Path) -> Result<bool> {
    if !path.exists() {
        debug!(path = %path.display(), "config layer not present, skipping");
        return Ok(false);
    }

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    let layer = ArgusConfig::from_toml(&contents)?;
    config.merge(layer);
    debug!(path = %path.display(), "loaded config layer");
    Ok(true)
}

/// The user config directory (`~/.config/argus` or the env override).
pub fn xdg_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Full path to the user config file.
pub fn xdg_config_path() -> Option<PathBuf> {
    xdg_config_dir().map(|d| d.join(USER_CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn project_layer_overrides_user_layer() {
        let user_dir = tempdir().unwrap();
        let project_dir = tempdir().unwrap();

        fs::write(
            user_dir.path().join(USER_CONFIG_FILE),
            "[scheduler]\nchunk_size = 10\n\n[[watch]]\nid = \"u\"\ndisplay_name = \"User\"\n",
        )
        .unwrap();
        fs::write(
            project_dir.path().join(PROJECT_CONFIG_FILE),
            "[scheduler]\nchunk_size = 3\n",
        )
        .unwrap();

        let loaded =
            load_config_with_options(Some(project_dir.path()), Some(user_dir.path())).unwrap();

        assert_eq!(loaded.config.scheduler().chunk_size, 3);
        // Watch table survives from the user layer (overlay had none)
        assert_eq!(loaded.config.watches.len(), 1);
        assert_eq!(loaded.loaded_from.len(), 2);
    }

    #[test]
    fn missing_layers_yield_defaults() {
        let user_dir = tempdir().unwrap();
        let project_dir = tempdir().unwrap();

        let loaded =
            load_config_with_options(Some(project_dir.path()), Some(user_dir.path())).unwrap();

        assert!(loaded.loaded_from.is_empty());
        assert_eq!(loaded.config.scheduler().chunk_size, 25);
        assert!(loaded.config.watches.is_empty());
    }

    #[test]
    fn load_config_file_rejects_missing_path() {
        let dir = tempdir().unwrap();
        let err = load_config_file(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }
}
