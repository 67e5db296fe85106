//! Configuration paths
//!
//! Uses the directories crate for platform-appropriate locations.

use std::path::{Path, PathBuf};

/// Name used for the configuration directory
const APP_NAME: &str = "onesol-suite";

/// Get the configuration directory path
///
/// - Linux: `~/.config/onesol-suite/`
/// - macOS: `~/Library/Application Support/onesol-suite/`
/// - Windows: `%APPDATA%\onesol-suite\`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Resolve a path named in a suite file against the suite's directory
pub fn resolve_relative(base: &Path, path: &Path) -> PathBuf {
    if path.is_relative() {
        base.join(path)
    } else {
        path.to_path_buf()
    }
}
