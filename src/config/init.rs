//! Template generation for `--init` command

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::file::SETTINGS_FILE_NAME;

/// Template cedit.toml with documentation
pub const CEDIT_TOML_TEMPLATE: &str = r#"# cedit.toml - Settings for the cedit configuration editor
#
# cedit edits Mercurial-style hgrc files. The settings below control where
# it looks for them - uncomment and modify as needed. A leading "~/" is
# expanded to your home directory.

[paths]
# User-level configuration files. --user targets the last one.
# user = ["~/.hgrc"]

# System-wide configuration files. Directories contribute their *.rc files.
# system = ["/etc/mercurial/hgrc", "/etc/mercurial/hgrc.d"]

# File targeted by --global.
# global = "/etc/mercurial/hgrc"

# Additional files offered by the interactive editor.
# extra = []

[repository]
# Directory marking a repository root, searched upward from the current
# directory. --local targets <root>/<metadata_dir>/<config_name>.
# metadata_dir = ".hg"
# config_name = "hgrc"

[environment]
# Variable holding a search path list. --env targets its first entry.
# variable = "HGRCPATH"

[ui]
# Colored output. Default: automatic (off when NO_COLOR is set or output
# is not a terminal).
# color = true
"#;

/// Generate cedit.toml in the specified directory (or current directory if None).
///
/// Returns an error if cedit.toml already exists.
pub fn generate_init_file_in(dir: Option<&Path>) -> io::Result<PathBuf> {
    let path = dir.map_or_else(
        || PathBuf::from(SETTINGS_FILE_NAME),
        |d| d.join(SETTINGS_FILE_NAME),
    );

    if path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "cedit.toml already exists",
        ));
    }

    fs::write(&path, CEDIT_TOML_TEMPLATE)?;
    Ok(path)
}

/// Generate cedit.toml in the current directory.
///
/// Returns an error if cedit.toml already exists.
pub fn generate_init_file() -> io::Result<PathBuf> {
    generate_init_file_in(None)
}
