//! Settings file discovery and loading

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::toml_schema::CeditToml;

pub const SETTINGS_FILE_NAME: &str = "cedit.toml";

/// Repository marker that ends the upward settings search
const DEFAULT_REPOSITORY_MARKER: &str = ".hg";

/// Error type for settings loading
#[derive(Debug, Error)]
pub enum SettingsError {
    /// IO error reading the file
    #[error("failed to read settings file: {0}")]
    Io(#[from] io::Error),
    /// TOML parsing error
    #[error("failed to parse settings file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Search upward from `start_dir` for an entry with the given name.
///
/// If `stop_marker` is given, stops searching after the first directory that
/// contains an entry with that name (the repository root).
/// Returns `None` if nothing is found.
pub fn find_file_upward(
    start_dir: &Path,
    filename: &str,
    stop_marker: Option<&str>,
) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let file_path = current.join(filename);
        if file_path.exists() {
            return Some(file_path);
        }

        if stop_marker.is_some_and(|marker| current.join(marker).exists()) {
            return None;
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Find cedit.toml by searching upward from the given directory.
///
/// Stops at the first `cedit.toml` found, or at the repository root
/// (directory containing `.hg`), whichever comes first.
pub fn find_settings_file(start_dir: &Path) -> Option<PathBuf> {
    find_file_upward(start_dir, SETTINGS_FILE_NAME, Some(DEFAULT_REPOSITORY_MARKER))
}

/// Load and parse cedit.toml from the given path.
pub fn load_settings(path: &Path) -> Result<CeditToml, SettingsError> {
    let content = fs::read_to_string(path)?;
    let settings: CeditToml = toml::from_str(&content)?;
    Ok(settings)
}
