//! Platform paths for shipwatch configuration.
//!
//! | Platform | Config Dir |
//! |----------|------------|
//! | **macOS** | `~/Library/Application Support/shipwatch` |
//! | **Linux** | `~/.config/shipwatch` (XDG_CONFIG_HOME) |
//! | **Windows** | `%APPDATA%\shipwatch` |
//!
//! `SHIPWATCH_CONFIG_DIR` overrides the directory for testing.

use crate::{Error, Result};
use std::path::PathBuf;

/// File name of the repository catalog inside the config directory.
pub const CATALOG_FILE_NAME: &str = "repositories.toml";

/// Get the configuration directory.
///
/// Resolution order:
/// 1. `SHIPWATCH_CONFIG_DIR` environment variable
/// 2. Platform config directory + `/shipwatch`
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("SHIPWATCH_CONFIG_DIR")
        && !dir.is_empty()
    {
        return Ok(PathBuf::from(dir));
    }

    let base = dirs::config_dir()
        .ok_or_else(|| Error::configuration("Could not determine config directory"))?;

    Ok(base.join("shipwatch"))
}

/// Default location of the repository catalog.
///
/// # Errors
///
/// Returns an error if the config directory cannot be determined.
pub fn catalog_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CATALOG_FILE_NAME))
}
