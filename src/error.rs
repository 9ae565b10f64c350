//! Error types shared across the editor

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::SettingsError;
use crate::grammar::GrammarError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Reading or writing a configuration file failed
    #[error("cannot access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file is not valid hgrc/INI text
    #[error("{}:{line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error("no repository found in '{}' (or any parent directory)", cwd.display())]
    NoRepository { cwd: PathBuf },

    #[error(
        "default system path only supported on POSIX-style systems, use '--file' to name a file"
    )]
    PlatformUnsupported,

    #[error("cannot determine the user configuration path (no home directory)")]
    NoUserPath,

    #[error("no {var} in environment")]
    NoRcPathVar { var: String },

    #[error("no section '{section}'")]
    NoSuchSection { section: String },

    #[error("no property '{property}' in section '{section}'")]
    NoSuchProperty { section: String, property: String },

    /// The interaction surface has no more input
    #[error("input closed")]
    Interrupted,

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl Error {
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Conditions that mean "already gone" rather than failure.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::NoSuchSection { .. } | Error::NoSuchProperty { .. }
        )
    }
}
