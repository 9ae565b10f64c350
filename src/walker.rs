use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::warn;

const RC_EXTENSION: &str = "rc";

/// Expand search paths the way the host tool reads them: a directory stands
/// for the `*.rc` files directly inside it (sorted by name), anything else
/// passes through unchanged, whether or not it exists.
pub fn expand_rc_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut expanded = vec![];

    for path in paths {
        if path.is_dir() {
            expanded.extend(rc_files_in(path));
        } else {
            expanded.push(path.clone());
        }
    }

    expanded
}

fn rc_files_in(dir: &Path) -> Vec<PathBuf> {
    let walker = WalkBuilder::new(dir)
        .max_depth(Some(1))
        .standard_filters(false) // rc directories are not source trees
        .build();

    let mut files = vec![];
    for entry in walker {
        match entry {
            Ok(entry) => {
                let is_file = entry.file_type().map(|ft| ft.is_file()).unwrap_or(false);
                let is_rc = entry.path().extension().is_some_and(|ext| ext == RC_EXTENSION);
                if is_file && is_rc {
                    files.push(entry.into_path());
                }
            }
            Err(e) => warn!(dir = %dir.display(), error = %e, "skipping unreadable entry"),
        }
    }

    files.sort();
    files
}
