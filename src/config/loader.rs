// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::model::{BootstrapConfig, RawBootstrapConfig};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw
/// `RawBootstrapConfig`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawBootstrapConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawBootstrapConfig = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<BootstrapConfig> {
    let raw_config = load_from_path(&path)?;
    let config = BootstrapConfig::try_from(raw_config)?;
    Ok(config)
}

/// Resolve the configuration the CLI asked for.
///
/// The default path is optional: when `Bootstrap.toml` is absent the built-in
/// defaults are used. An explicitly given path must exist.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<BootstrapConfig> {
    let path = path.as_ref();
    if path == default_config_path() && !path.exists() {
        info!(path = ?path, "no config file found; using built-in defaults");
        return BootstrapConfig::try_from(RawBootstrapConfig::default());
    }
    load_and_validate(path)
}

/// `Bootstrap.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Bootstrap.toml")
}
