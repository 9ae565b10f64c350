//! TOML schema definitions for cedit.toml

use serde::{Deserialize, Serialize};

/// Root structure for cedit.toml
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CeditToml {
    #[serde(default)]
    pub paths: PathsSection,

    #[serde(default)]
    pub repository: RepositorySection,

    #[serde(default)]
    pub environment: EnvironmentSection,

    #[serde(default)]
    pub ui: UiSection,
}

/// `[paths]` section in cedit.toml
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsSection {
    /// User-level configuration files, most specific last
    pub user: Option<Vec<String>>,

    /// System-wide configuration files or `*.rc` directories
    pub system: Option<Vec<String>>,

    /// File targeted by `--global`
    pub global: Option<String>,

    /// Additional files offered by the interactive editor
    pub extra: Option<Vec<String>>,
}

/// `[repository]` section in cedit.toml
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositorySection {
    /// Metadata directory marking a repository root (default: `.hg`)
    pub metadata_dir: Option<String>,

    /// Configuration file inside the metadata directory (default: `hgrc`)
    pub config_name: Option<String>,
}

/// `[environment]` section in cedit.toml
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentSection {
    /// Variable holding a search path list (default: `HGRCPATH`)
    pub variable: Option<String>,
}

/// `[ui]` section in cedit.toml
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UiSection {
    pub color: Option<bool>,
}
