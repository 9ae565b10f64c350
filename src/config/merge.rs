//! Settings merging logic
//!
//! Priority: CLI args > cedit.toml > defaults

use std::path::{Path, PathBuf};

use super::toml_schema::CeditToml;

/// CLI options that can override settings file values.
///
/// Uses `Option<T>` to distinguish "not specified" from "explicitly set".
#[derive(Debug, Default)]
pub struct CliOverrides {
    /// Some(true) for --color, Some(false) for --no-color
    pub color: Option<bool>,
}

/// Fully resolved settings used by path resolution and the terminal surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub user_paths: Vec<PathBuf>,
    pub system_paths: Vec<PathBuf>,
    pub global_path: PathBuf,
    pub extra_paths: Vec<PathBuf>,
    pub metadata_dir: String,
    pub config_name: String,
    pub rcpath_var: String,
    pub color: Option<bool>,
}

impl Settings {
    /// Built-in defaults for the current platform.
    pub fn defaults(home: Option<&Path>) -> Self {
        let user_names: &[&str] = if cfg!(windows) {
            &["mercurial.ini", ".hgrc"]
        } else {
            &[".hgrc"]
        };
        let user_paths = home
            .map(|h| user_names.iter().map(|name| h.join(name)).collect())
            .unwrap_or_default();

        let system_paths = if cfg!(unix) {
            vec![
                PathBuf::from("/etc/mercurial/hgrc"),
                PathBuf::from("/etc/mercurial/hgrc.d"),
            ]
        } else {
            Vec::new()
        };

        Self {
            user_paths,
            system_paths,
            global_path: PathBuf::from("/etc/mercurial/hgrc"),
            extra_paths: Vec::new(),
            metadata_dir: ".hg".to_string(),
            config_name: "hgrc".to_string(),
            rcpath_var: "HGRCPATH".to_string(),
            color: None,
        }
    }
}

/// Expand a leading `~/` against `home`.
pub fn expand_home(path: &str, home: Option<&Path>) -> PathBuf {
    match (path.strip_prefix("~/"), home) {
        (Some(rest), Some(home)) => home.join(rest),
        _ if path == "~" => home.map_or_else(|| PathBuf::from(path), Path::to_path_buf),
        _ => PathBuf::from(path),
    }
}

fn expand_all(paths: &[String], home: Option<&Path>) -> Vec<PathBuf> {
    paths.iter().map(|p| expand_home(p, home)).collect()
}

/// Merge settings from CLI, TOML, and defaults.
///
/// Priority: CLI > TOML > defaults
pub fn merge_settings(cli: &CliOverrides, toml: Option<&CeditToml>, home: Option<&Path>) -> Settings {
    let defaults = Settings::defaults(home);

    Settings {
        user_paths: toml
            .and_then(|t| t.paths.user.as_deref())
            .map_or(defaults.user_paths, |p| expand_all(p, home)),
        system_paths: toml
            .and_then(|t| t.paths.system.as_deref())
            .map_or(defaults.system_paths, |p| expand_all(p, home)),
        global_path: toml
            .and_then(|t| t.paths.global.as_deref())
            .map_or(defaults.global_path, |p| expand_home(p, home)),
        extra_paths: toml
            .and_then(|t| t.paths.extra.as_deref())
            .map_or(defaults.extra_paths, |p| expand_all(p, home)),
        metadata_dir: toml
            .and_then(|t| t.repository.metadata_dir.clone())
            .unwrap_or(defaults.metadata_dir),
        config_name: toml
            .and_then(|t| t.repository.config_name.clone())
            .unwrap_or(defaults.config_name),
        rcpath_var: toml
            .and_then(|t| t.environment.variable.clone())
            .unwrap_or(defaults.rcpath_var),
        color: cli.color.or_else(|| toml.and_then(|t| t.ui.color)),
    }
}
