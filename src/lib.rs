pub mod batch;
pub mod colors;
pub mod config;
pub mod diff;
pub mod document;
pub mod editor;
pub mod error;
pub mod grammar;
pub mod paths;
pub mod surface;
pub mod tidy;
pub mod walker;

pub use batch::{
    apply_delete, apply_set, compose_username, set_username, BatchOptions, BatchReport,
    Identity, Outcome,
};
pub use colors::{should_use_colors, Colors};
pub use config::{
    find_settings_file, generate_init_file, load_settings, merge_settings, CeditToml,
    CliOverrides, Settings, SettingsError, CEDIT_TOML_TEMPLATE,
};
pub use document::ConfigDocument;
pub use editor::{Action, Flow, Session};
pub use error::{Error, Result};
pub use grammar::{parse_delete, parse_set, DeleteOperation, GrammarError, SetOperation};
pub use paths::{collect_targets, dedupe_and_filter, resolve, PathClass, RcEnv, Scope, Targets};
pub use surface::{Choice, ScriptedSurface, Surface, TerminalSurface};

use tracing::info;

/// A scripted invocation: an optional set and an optional delete applied to
/// the selected targets.
#[derive(Debug, Clone, Default)]
pub struct EditRequest {
    pub set: Option<String>,
    pub delete: Option<String>,
    pub targets: Targets,
    pub options: BatchOptions,
}

/// Resolve the targets of `request` and apply its operations, the set
/// before the delete. A malformed operation is reported and skipped; the
/// other one still runs. Returns `Ok(false)` when some file failed.
pub fn run_edit(request: &EditRequest, env: &RcEnv, surface: &mut dyn Surface) -> Result<bool> {
    let set = well_formed(request.set.as_deref(), parse_set, surface);
    let delete = well_formed(request.delete.as_deref(), parse_delete, surface);
    if set.is_none() && delete.is_none() {
        return Ok(true);
    }

    let paths = collect_targets(&request.targets, env, surface)?;
    info!(targets = paths.len(), "applying scripted edit");

    let mut ok = true;
    if let Some(set) = set {
        ok &= !apply_set(&paths, set, surface, &request.options)?.has_failures();
    }
    if let Some(delete) = delete {
        ok &= !apply_delete(&paths, delete, surface, &request.options)?.has_failures();
    }
    Ok(ok)
}

fn well_formed<'r, T>(
    input: Option<&'r str>,
    parse: fn(&str) -> std::result::Result<T, GrammarError>,
    surface: &mut dyn Surface,
) -> Option<&'r str> {
    let input = input?;
    match parse(input) {
        Ok(_) => Some(input),
        Err(e) => {
            surface.warn(&format!("{e}, skipping."));
            None
        }
    }
}
