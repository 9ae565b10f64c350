//! Settings for cedit itself.
//!
//! This module provides:
//! - Loading settings from `cedit.toml`
//! - Settings file discovery (search upward from current directory)
//! - Merging CLI args, settings file, and defaults
//! - Template generation with `--init`

mod file;
mod init;
mod merge;
mod toml_schema;

pub use file::{
    find_file_upward, find_settings_file, load_settings, SettingsError, SETTINGS_FILE_NAME,
};
pub use init::{generate_init_file, generate_init_file_in, CEDIT_TOML_TEMPLATE};
pub use merge::{expand_home, merge_settings, CliOverrides, Settings};
pub use toml_schema::{
    CeditToml, EnvironmentSection, PathsSection, RepositorySection, UiSection,
};
