//! Non-interactive edits: one parsed operation applied to many files.
//!
//! Every file is handled on its own. A failure is reported and recorded in
//! the [`BatchReport`], then the next file is attempted.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::diff::unified_diff;
use crate::document::ConfigDocument;
use crate::error::{Error, Result};
use crate::grammar::{parse_delete, parse_set, DeleteOperation, GrammarError};
use crate::paths::{create_empty, RcEnv, Scope};
use crate::surface::Surface;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOptions {
    /// Print a unified diff of every file that changes
    pub show_diff: bool,
    /// Compute changes without writing them
    pub dry_run: bool,
}

#[derive(Debug)]
pub enum Outcome {
    Written,
    WouldWrite,
    Unchanged,
    /// The section or property to delete was not there
    AlreadyAbsent,
    Failed(Error),
}

#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: Outcome,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
}

impl BatchReport {
    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileReport> {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, Outcome::Failed(_)))
    }

    pub fn outcome(&self, path: &Path) -> Option<&Outcome> {
        self.files.iter().find(|f| f.path == path).map(|f| &f.outcome)
    }
}

/// Apply `section.property = value` to every path.
///
/// The operation is parsed once up front; a grammar error touches no file.
pub fn apply_set(
    paths: &[PathBuf],
    input: &str,
    surface: &mut dyn Surface,
    opts: &BatchOptions,
) -> std::result::Result<BatchReport, GrammarError> {
    let op = parse_set(input)?;
    debug!(section = %op.section, property = %op.property, "batch set");

    Ok(apply_each(paths, surface, opts, "Property set in", |doc| {
        doc.set(&op.section, &op.property, &op.value);
        Ok(())
    }))
}

/// Remove a whole section or one property from every path. Something that
/// is already gone counts as success.
pub fn apply_delete(
    paths: &[PathBuf],
    input: &str,
    surface: &mut dyn Surface,
    opts: &BatchOptions,
) -> std::result::Result<BatchReport, GrammarError> {
    let op = parse_delete(input)?;
    debug!(?op, "batch delete");

    let done = match op {
        DeleteOperation::Section { .. } => "Section removed from",
        DeleteOperation::Property { .. } => "Property removed from",
    };
    Ok(apply_each(paths, surface, opts, done, |doc| delete(doc, &op)))
}

fn delete(doc: &mut ConfigDocument, op: &DeleteOperation) -> Result<()> {
    let missing_section = || Error::NoSuchSection {
        section: op.section().to_string(),
    };
    match op {
        DeleteOperation::Section { section } => {
            if !doc.remove_section(section) {
                return Err(missing_section());
            }
        }
        DeleteOperation::Property { section, property } => {
            if !doc.has_section(section) {
                return Err(missing_section());
            }
            if !doc.remove_property(section, property) {
                return Err(Error::NoSuchProperty {
                    section: section.clone(),
                    property: property.clone(),
                });
            }
        }
    }
    Ok(())
}

fn apply_each<F>(
    paths: &[PathBuf],
    surface: &mut dyn Surface,
    opts: &BatchOptions,
    done: &str,
    mut edit: F,
) -> BatchReport
where
    F: FnMut(&mut ConfigDocument) -> Result<()>,
{
    let mut report = BatchReport::default();
    if paths.is_empty() {
        surface.warn("No configuration files selected, nothing to do.");
        return report;
    }

    for path in paths {
        let outcome = match apply_to_file(path, surface, opts, &mut edit) {
            Ok(outcome) => outcome,
            Err(e) => Outcome::Failed(e),
        };

        match &outcome {
            Outcome::Written | Outcome::Unchanged => {
                surface.status(&format!("{done} {}", path.display()));
            }
            Outcome::WouldWrite => {
                surface.status(&format!("Would update {} (dry run)", path.display()));
            }
            Outcome::AlreadyAbsent => {}
            Outcome::Failed(e) => {
                debug!(path = %path.display(), error = %e, "batch edit failed");
                surface.warn(&format!("Failed to update {}: {e}", path.display()));
            }
        }
        report.files.push(FileReport {
            path: path.clone(),
            outcome,
        });
    }

    report
}

fn apply_to_file<F>(
    path: &Path,
    surface: &mut dyn Surface,
    opts: &BatchOptions,
    edit: &mut F,
) -> Result<Outcome>
where
    F: FnMut(&mut ConfigDocument) -> Result<()>,
{
    let mut doc = ConfigDocument::load(path)?;
    let original = doc.render();

    if let Err(e) = edit(&mut doc) {
        return match e {
            Error::NoSuchSection { section } => {
                surface.status(&format!(
                    "Success: No section '{section}' in {}, so it's already gone.",
                    path.display()
                ));
                Ok(Outcome::AlreadyAbsent)
            }
            Error::NoSuchProperty { section, property } => {
                surface.status(&format!(
                    "Success: No property '{property}' in section '{section}' of {}, so it's already gone.",
                    path.display()
                ));
                Ok(Outcome::AlreadyAbsent)
            }
            other => Err(other),
        };
    }

    let updated = doc.render_pretty();
    if updated == original {
        return Ok(Outcome::Unchanged);
    }
    if opts.show_diff {
        surface.status(&unified_diff(&path.display().to_string(), &original, &updated));
    }
    if opts.dry_run {
        return Ok(Outcome::WouldWrite);
    }

    doc.save_pretty(path)?;
    Ok(Outcome::Written)
}

/// Inputs of the `setuser` operation
#[derive(Debug, Clone, Default)]
pub struct Identity {
    pub name: Option<String>,
    pub email: Option<String>,
    /// Complete username, overrides name and email
    pub username: Option<String>,
    /// Write to the repository configuration
    pub local: bool,
}

/// `Name <email>`, or just the name when there is no email.
pub fn compose_username(name: &str, email: &str) -> String {
    let (name, email) = (name.trim(), email.trim());
    if email.is_empty() {
        name.to_string()
    } else if name.is_empty() {
        format!("<{email}>")
    } else {
        format!("{name} <{email}>")
    }
}

/// Where `setuser` writes: the repository configuration when `local`,
/// otherwise the first search path variable entry, otherwise the first
/// user path.
pub fn username_target(env: &RcEnv, local: bool) -> Result<PathBuf> {
    if local {
        return env.target_path(&Scope::Local);
    }
    if let Ok(path) = env.target_path(&Scope::Environment) {
        return Ok(path);
    }
    env.settings
        .user_paths
        .first()
        .map(|p| env.absolutize(p))
        .ok_or(Error::NoUserPath)
}

/// Set `ui.username`, prompting for whatever `identity` leaves out.
pub fn set_username(
    identity: &Identity,
    env: &RcEnv,
    surface: &mut dyn Surface,
) -> Result<PathBuf> {
    let path = username_target(env, identity.local)?;

    let username = match &identity.username {
        Some(username) => username.trim().to_string(),
        None => {
            let name = match &identity.name {
                Some(name) => name.clone(),
                None => surface.prompt_text("Enter your name:", "")?,
            };
            let email = match &identity.email {
                Some(email) => email.clone(),
                None => surface.prompt_text("Enter your email address:", "")?,
            };
            compose_username(&name, &email)
        }
    };

    if !path.exists() {
        create_empty(&path)?;
    }
    let mut doc = ConfigDocument::load(&path)?;
    doc.set("ui", "username", &username);
    doc.save_pretty(&path)?;

    surface.status(&format!("Username saved in {}", path.display()));
    Ok(path)
}
