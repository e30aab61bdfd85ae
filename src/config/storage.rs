//! Persistence for settings.

use super::Settings;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory name under the platform config directory.
const APP_DIR: &str = "patchflow";

/// Filename for settings.
pub const CONFIG_FILE: &str = "config.toml";

/// Default settings path: `<config_dir>/patchflow/config.toml`.
pub fn default_settings_path() -> Result<PathBuf> {
    let base = dirs::config_dir()
        .ok_or_else(|| Error::Config("cannot determine the user config directory".to_string()))?;
    Ok(base.join(APP_DIR).join(CONFIG_FILE))
}

/// Load settings from disk.
///
/// Unlike most state, missing settings are an error: nothing works without
/// an API address.
pub fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Err(Error::Config(format!(
            "no configuration found at {}",
            path.display()
        )));
    }

    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

    let settings: Settings = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))?;

    Ok(settings)
}

/// Save settings to disk.
///
/// Creates the parent directory if it doesn't exist.
pub fn save_settings(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
        && !dir.exists()
    {
        fs::create_dir_all(dir)
            .map_err(|e| Error::Config(format!("failed to create {}: {e}", dir.display())))?;
    }

    let content = toml::to_string_pretty(settings)
        .map_err(|e| Error::Config(format!("failed to serialize settings: {e}")))?;

    let content_with_header = format!(
        "# patchflow settings\n# Written by 'patchflow setup' - safe to edit by hand\n\n{content}"
    );

    fs::write(path, content_with_header)
        .map_err(|e| Error::Config(format!("failed to write {}: {e}", path.display())))?;

    Ok(())
}
