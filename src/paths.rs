//! Locating configuration files.
//!
//! [`RcEnv`] captures everything path resolution depends on (working
//! directory, home, the search path variable, settings) so it can be built
//! from the process environment in the binary and by hand in tests.

use std::env;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info};

use crate::config::{expand_home, find_file_upward, Settings};
use crate::error::{Error, Result};
use crate::surface::{Choice, Surface};
use crate::walker::expand_rc_paths;

/// Where a configuration file sits, for display next to its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    User,
    Global,
    Local,
    File,
    Environment,
    Repository,
    SystemWide,
    Other,
}

impl fmt::Display for PathClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            PathClass::User => "user",
            PathClass::Global => "global",
            PathClass::Local => "local",
            PathClass::File => "file",
            PathClass::Environment => "environment",
            PathClass::Repository => "repository",
            PathClass::SystemWide => "system-wide",
            PathClass::Other => "other",
        };
        write!(f, "[{tag}]")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathCandidate {
    pub path: PathBuf,
    pub class: PathClass,
}

impl fmt::Display for PathCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.path.display(), self.class)
    }
}

/// A requested target file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    User,
    Global,
    Local,
    File(PathBuf),
    /// First entry of the search path variable
    Environment,
}

impl Scope {
    pub fn label(&self) -> &'static str {
        match self {
            Scope::User => "user",
            Scope::Global => "global",
            Scope::Local => "local",
            Scope::File(_) => "file",
            Scope::Environment => "environment",
        }
    }
}

/// The target flags of a scripted invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Targets {
    pub user: bool,
    pub global: bool,
    pub local: bool,
    pub file: Option<PathBuf>,
    pub env: bool,
}

impl Targets {
    pub fn scopes(&self) -> Vec<Scope> {
        let mut scopes = vec![];
        if self.user {
            scopes.push(Scope::User);
        }
        if self.global {
            scopes.push(Scope::Global);
        }
        if self.local {
            scopes.push(Scope::Local);
        }
        if let Some(file) = &self.file {
            scopes.push(Scope::File(file.clone()));
        }
        if self.env {
            scopes.push(Scope::Environment);
        }
        scopes
    }
}

#[derive(Debug, Clone)]
pub struct RcEnv {
    pub cwd: PathBuf,
    pub home: Option<PathBuf>,
    /// Value of the search path variable, if set
    pub rcpath: Option<String>,
    pub settings: Settings,
    /// Whether the fixed system-wide path applies
    pub posix: bool,
}

impl RcEnv {
    pub fn new(cwd: impl Into<PathBuf>, home: Option<PathBuf>, settings: Settings) -> Self {
        Self {
            cwd: cwd.into(),
            home,
            rcpath: None,
            settings,
            posix: cfg!(unix),
        }
    }

    /// Read the working directory, home and search path variable of this process.
    pub fn from_process(settings: Settings) -> Result<Self> {
        let cwd = env::current_dir().map_err(|e| Error::io(".", e))?;
        let rcpath = env::var_os(&settings.rcpath_var).map(|v| v.to_string_lossy().into_owned());
        Ok(Self {
            rcpath,
            ..Self::new(cwd, dirs::home_dir(), settings)
        })
    }

    pub fn with_rcpath(mut self, value: Option<&str>) -> Self {
        self.rcpath = value.map(str::to_string);
        self
    }

    /// `path` made absolute against the working directory, then normalized.
    pub fn absolutize(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            normalize(path)
        } else {
            normalize(&self.cwd.join(path))
        }
    }

    /// Entries of the search path variable, or `None` when it is unset.
    pub fn rcpath_entries(&self) -> Option<Vec<PathBuf>> {
        let value = self.rcpath.as_ref()?;
        Some(
            env::split_paths(value)
                .filter(|p| !p.as_os_str().is_empty())
                .map(|p| self.absolutize(&p))
                .collect(),
        )
    }

    /// Directory containing the repository metadata directory, searching
    /// the working directory and its parents.
    pub fn repository_root(&self) -> Option<PathBuf> {
        find_file_upward(&self.cwd, &self.settings.metadata_dir, None)
            .filter(|p| p.is_dir())
            .and_then(|p| p.parent().map(Path::to_path_buf))
    }

    pub fn repository_config(&self) -> Result<PathBuf> {
        let root = self.repository_root().ok_or_else(|| Error::NoRepository {
            cwd: self.cwd.clone(),
        })?;
        Ok(root
            .join(&self.settings.metadata_dir)
            .join(&self.settings.config_name))
    }

    /// The path a scope refers to, without touching the filesystem beyond
    /// repository detection.
    pub fn target_path(&self, scope: &Scope) -> Result<PathBuf> {
        match scope {
            Scope::User => self
                .settings
                .user_paths
                .last()
                .map(|p| self.absolutize(p))
                .ok_or(Error::NoUserPath),
            Scope::Global => {
                if self.posix {
                    Ok(self.absolutize(&self.settings.global_path))
                } else {
                    Err(Error::PlatformUnsupported)
                }
            }
            Scope::Local => self.repository_config(),
            Scope::File(path) => {
                let path = expand_home(&path.to_string_lossy(), self.home.as_deref());
                Ok(self.absolutize(&path))
            }
            Scope::Environment => self
                .rcpath_entries()
                .and_then(|entries| entries.into_iter().next())
                .ok_or_else(|| Error::NoRcPathVar {
                    var: self.settings.rcpath_var.clone(),
                }),
        }
    }

    /// Every file the interactive editor may offer, before filtering:
    /// the variable's entries (or the system and user lists when it is
    /// unset), the system and user lists, the repository configuration and
    /// any extra paths.
    pub fn search_paths(&self) -> Vec<PathBuf> {
        let mut paths = vec![];
        let host_paths: Vec<PathBuf> = self
            .settings
            .system_paths
            .iter()
            .chain(&self.settings.user_paths)
            .cloned()
            .collect();

        match self.rcpath_entries() {
            Some(entries) => paths.extend(entries),
            None => paths.extend(host_paths.iter().cloned()),
        }
        paths.extend(host_paths);
        if let Ok(repo) = self.repository_config() {
            paths.push(repo);
        }
        paths.extend(self.settings.extra_paths.iter().cloned());

        expand_rc_paths(&paths)
            .iter()
            .map(|p| self.absolutize(p))
            .collect()
    }

    pub fn classify(&self, path: &Path) -> PathClass {
        let listed = |list: &[PathBuf]| {
            list.iter().any(|entry| {
                let entry = self.absolutize(entry);
                entry == path || (entry.is_dir() && path.parent() == Some(entry.as_path()))
            })
        };

        if listed(&self.settings.user_paths) {
            PathClass::User
        } else if listed(&self.settings.system_paths) {
            PathClass::SystemWide
        } else if self.rcpath_entries().is_some_and(|entries| listed(&entries)) {
            PathClass::Environment
        } else if self.repository_config().is_ok_and(|repo| repo == path) {
            PathClass::Repository
        } else {
            PathClass::Other
        }
    }

    pub fn candidates(&self, paths: &[PathBuf]) -> Vec<PathCandidate> {
        paths
            .iter()
            .map(|path| PathCandidate {
                path: path.clone(),
                class: self.classify(path),
            })
            .collect()
    }
}

/// Lexically clean a path: drop `.` components and fold `..` into the parent.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Drop duplicate paths (first occurrence wins) and paths that are not
/// existing regular files. Survivors are returned absolute.
pub fn dedupe_and_filter(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen: Vec<PathBuf> = vec![];

    for path in paths {
        let absolute = match std::path::absolute(path) {
            Ok(p) => normalize(&p),
            Err(_) => continue,
        };
        if !seen.contains(&absolute) && absolute.is_file() {
            seen.push(absolute);
        }
    }

    seen
}

/// Offer to create an empty file at `path` when nothing is there. Closed
/// input counts as the default answer, yes. Returns whether the file exists
/// afterwards.
pub fn offer_creation(path: &Path, label: &str, surface: &mut dyn Surface) -> Result<bool> {
    if path.is_file() {
        return Ok(true);
    }

    let question = format!(
        "No {label} configuration found at '{}'. Would you like to create this file [y n]?",
        path.display()
    );
    let create = match surface.prompt_choice(&question, &Choice::yes_no(), 0) {
        Ok(index) => index == 0,
        // no one to answer, so take the default
        Err(Error::Interrupted) => {
            debug!(path = %path.display(), "input closed, creating by default");
            true
        }
        Err(e) => return Err(e),
    };
    if !create {
        debug!(path = %path.display(), "creation declined");
        return Ok(false);
    }

    match create_empty(path) {
        Ok(()) => {
            info!(path = %path.display(), "created empty configuration file");
            Ok(true)
        }
        Err(e) => {
            surface.warn(&e.to_string());
            Ok(false)
        }
    }
}

pub(crate) fn create_empty(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::io(path, e))?;
    Ok(())
}

/// Resolve `scope` to an absolute path, offering to create the file when it
/// is missing. A declined offer still returns the path.
pub fn resolve(scope: &Scope, env: &RcEnv, surface: &mut dyn Surface) -> Result<PathBuf> {
    let path = env.target_path(scope)?;
    debug!(scope = scope.label(), path = %path.display(), "resolved target");
    offer_creation(&path, &format!("default {}", scope.label()), surface)?;
    Ok(path)
}

/// Resolve every requested target and keep the ones that exist.
///
/// An unsupported platform or an unset search path variable skips that
/// target with a warning; a missing repository aborts.
pub fn collect_targets(
    targets: &Targets,
    env: &RcEnv,
    surface: &mut dyn Surface,
) -> Result<Vec<PathBuf>> {
    let mut paths = vec![];

    for scope in targets.scopes() {
        match resolve(&scope, env, surface) {
            Ok(path) => paths.push(path),
            Err(Error::NoRcPathVar { var }) => {
                surface.warn(&format!("No {var} in environment, skipping."));
            }
            Err(e @ (Error::PlatformUnsupported | Error::NoUserPath)) => {
                surface.warn(&format!("{e}, skipping."));
            }
            Err(e) => return Err(e),
        }
    }

    Ok(dedupe_and_filter(&paths))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::ScriptedSurface;
    use tempfile::TempDir;

    fn settings(home: &Path) -> Settings {
        Settings {
            user_paths: vec![home.join(".hgrc")],
            system_paths: vec![],
            ..Settings::defaults(Some(home))
        }
    }

    fn env_in(dir: &TempDir) -> RcEnv {
        let home = dir.path().join("home");
        fs::create_dir_all(&home).unwrap();
        let work = dir.path().join("work");
        fs::create_dir_all(&work).unwrap();
        RcEnv::new(work, Some(home.clone()), settings(&home))
    }

    // ===========================================
    // PathSet
    // ===========================================

    #[test]
    fn test_dedupe_and_filter() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.rc");
        let b = dir.path().join("b.rc");
        fs::write(&a, "").unwrap();
        fs::write(&b, "").unwrap();

        let result = dedupe_and_filter(&[
            a.clone(),
            a.clone(),
            b.clone(),
            PathBuf::from("/nonexistent/hgrc"),
        ]);
        assert_eq!(result, vec![a, b]);
    }

    #[test]
    fn test_dedupe_uses_normalized_paths() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.rc");
        fs::write(&a, "").unwrap();
        let dotted = dir.path().join("sub/../a.rc");
        fs::create_dir(dir.path().join("sub")).unwrap();

        assert_eq!(dedupe_and_filter(&[dotted, a.clone()]), vec![a]);
    }

    #[test]
    fn test_filter_drops_directories() {
        let dir = TempDir::new().unwrap();
        assert!(dedupe_and_filter(&[dir.path().to_path_buf()]).is_empty());
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
    }

    // ===========================================
    // PathResolver
    // ===========================================

    #[test]
    fn test_user_scope_is_last_user_path() {
        let dir = TempDir::new().unwrap();
        let mut env = env_in(&dir);
        let home = env.home.clone().unwrap();
        env.settings.user_paths = vec![home.join("mercurial.ini"), home.join(".hgrc")];

        assert_eq!(env.target_path(&Scope::User).unwrap(), home.join(".hgrc"));
    }

    #[test]
    fn test_user_scope_without_home() {
        let dir = TempDir::new().unwrap();
        let mut env = env_in(&dir);
        env.settings.user_paths.clear();
        assert!(matches!(env.target_path(&Scope::User), Err(Error::NoUserPath)));
    }

    #[test]
    fn test_global_scope() {
        let dir = TempDir::new().unwrap();
        let mut env = env_in(&dir);
        env.posix = true;
        assert_eq!(
            env.target_path(&Scope::Global).unwrap(),
            PathBuf::from("/etc/mercurial/hgrc")
        );

        env.posix = false;
        assert!(matches!(
            env.target_path(&Scope::Global),
            Err(Error::PlatformUnsupported)
        ));
    }

    #[test]
    fn test_local_scope_requires_repository() {
        let dir = TempDir::new().unwrap();
        let env = env_in(&dir);
        assert!(matches!(
            env.target_path(&Scope::Local),
            Err(Error::NoRepository { .. })
        ));
    }

    #[test]
    fn test_local_scope_found_from_subdirectory() {
        let dir = TempDir::new().unwrap();
        let mut env = env_in(&dir);
        let root = env.cwd.clone();
        fs::create_dir(root.join(".hg")).unwrap();
        env.cwd = root.join("src/deep");
        fs::create_dir_all(&env.cwd).unwrap();

        assert_eq!(
            env.target_path(&Scope::Local).unwrap(),
            root.join(".hg").join("hgrc")
        );
    }

    #[test]
    fn test_file_scope_is_absolutized() {
        let dir = TempDir::new().unwrap();
        let env = env_in(&dir);
        let path = env
            .target_path(&Scope::File(PathBuf::from("./conf/../my.rc")))
            .unwrap();
        assert_eq!(path, env.cwd.join("my.rc"));
    }

    #[test]
    fn test_file_scope_expands_home() {
        let dir = TempDir::new().unwrap();
        let env = env_in(&dir);
        let path = env
            .target_path(&Scope::File(PathBuf::from("~/foo/bar.rc")))
            .unwrap();
        assert_eq!(path, env.home.clone().unwrap().join("foo/bar.rc"));
    }

    #[test]
    fn test_environment_scope_takes_first_entry() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("first.rc");
        let second = dir.path().join("second.rc");
        let joined = env::join_paths([&first, &second]).unwrap();
        let env = env_in(&dir).with_rcpath(joined.to_str());

        assert_eq!(env.target_path(&Scope::Environment).unwrap(), first);
    }

    #[test]
    fn test_environment_scope_unset() {
        let dir = TempDir::new().unwrap();
        let env = env_in(&dir);
        assert!(matches!(
            env.target_path(&Scope::Environment),
            Err(Error::NoRcPathVar { .. })
        ));
    }

    #[test]
    fn test_resolve_creates_file_on_yes() {
        let dir = TempDir::new().unwrap();
        let env = env_in(&dir);
        let mut surface = ScriptedSurface::new(["y"]);

        let path = resolve(&Scope::User, &env, &mut surface).unwrap();
        assert!(path.is_file());
        assert!(surface.prompts()[0].contains("No default user configuration"));
    }

    #[test]
    fn test_resolve_with_closed_input_takes_default() {
        let dir = TempDir::new().unwrap();
        let env = env_in(&dir);
        let mut surface = ScriptedSurface::new(Vec::<String>::new());

        let path = resolve(&Scope::User, &env, &mut surface).unwrap();
        assert!(path.is_file());
        assert_eq!(surface.prompts().len(), 1);
    }

    #[test]
    fn test_resolve_declined_returns_missing_path() {
        let dir = TempDir::new().unwrap();
        let env = env_in(&dir);
        let mut surface = ScriptedSurface::new(["n"]);

        let path = resolve(&Scope::User, &env, &mut surface).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_resolve_existing_file_does_not_prompt() {
        let dir = TempDir::new().unwrap();
        let env = env_in(&dir);
        fs::write(env.home.clone().unwrap().join(".hgrc"), "").unwrap();
        let mut surface = ScriptedSurface::new(Vec::<String>::new());

        resolve(&Scope::User, &env, &mut surface).unwrap();
        assert!(surface.prompts().is_empty());
    }

    #[test]
    fn test_collect_targets_skips_unset_environment() {
        let dir = TempDir::new().unwrap();
        let env = env_in(&dir);
        fs::write(env.home.clone().unwrap().join(".hgrc"), "").unwrap();
        let mut surface = ScriptedSurface::new(Vec::<String>::new());

        let targets = Targets {
            user: true,
            env: true,
            ..Default::default()
        };
        let paths = collect_targets(&targets, &env, &mut surface).unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(surface.warnings(), vec!["No HGRCPATH in environment, skipping."]);
    }

    #[test]
    fn test_collect_targets_without_repository_fails() {
        let dir = TempDir::new().unwrap();
        let env = env_in(&dir);
        let mut surface = ScriptedSurface::new(Vec::<String>::new());

        let targets = Targets {
            local: true,
            ..Default::default()
        };
        assert!(matches!(
            collect_targets(&targets, &env, &mut surface),
            Err(Error::NoRepository { .. })
        ));
    }

    #[test]
    fn test_collect_targets_dedupes_same_file() {
        let dir = TempDir::new().unwrap();
        let env = env_in(&dir);
        let user = env.home.clone().unwrap().join(".hgrc");
        fs::write(&user, "").unwrap();
        let mut surface = ScriptedSurface::new(Vec::<String>::new());

        let targets = Targets {
            user: true,
            file: Some(user.clone()),
            ..Default::default()
        };
        assert_eq!(collect_targets(&targets, &env, &mut surface).unwrap(), vec![user]);
    }

    // ===========================================
    // Candidates and classification
    // ===========================================

    #[test]
    fn test_search_paths_include_repository_and_rc_dirs() {
        let dir = TempDir::new().unwrap();
        let mut env = env_in(&dir);
        fs::create_dir(env.cwd.join(".hg")).unwrap();
        let rc_dir = dir.path().join("hgrc.d");
        fs::create_dir(&rc_dir).unwrap();
        fs::write(rc_dir.join("team.rc"), "").unwrap();
        env.settings.system_paths = vec![rc_dir.clone()];

        let paths = env.search_paths();
        assert!(paths.contains(&rc_dir.join("team.rc")));
        assert!(paths.contains(&env.cwd.join(".hg/hgrc")));
        assert!(paths.contains(&env.home.clone().unwrap().join(".hgrc")));
    }

    #[test]
    fn test_search_paths_prefer_environment_entries() {
        let dir = TempDir::new().unwrap();
        let custom = dir.path().join("custom.rc");
        let env = env_in(&dir).with_rcpath(custom.to_str());

        let paths = env.search_paths();
        assert_eq!(paths.first(), Some(&custom));
    }

    #[test]
    fn test_classify() {
        let dir = TempDir::new().unwrap();
        let mut env = env_in(&dir);
        fs::create_dir(env.cwd.join(".hg")).unwrap();
        let rc_dir = dir.path().join("hgrc.d");
        fs::create_dir(&rc_dir).unwrap();
        env.settings.system_paths = vec![rc_dir.clone()];
        let custom = dir.path().join("custom.rc");
        let env = env.with_rcpath(custom.to_str());
        let home = env.home.clone().unwrap();

        assert_eq!(env.classify(&home.join(".hgrc")), PathClass::User);
        assert_eq!(env.classify(&rc_dir.join("a.rc")), PathClass::SystemWide);
        assert_eq!(env.classify(&custom), PathClass::Environment);
        assert_eq!(env.classify(&env.cwd.join(".hg/hgrc")), PathClass::Repository);
        assert_eq!(env.classify(Path::new("/elsewhere")), PathClass::Other);
    }

    #[test]
    fn test_candidate_display() {
        let candidate = PathCandidate {
            path: PathBuf::from("/home/jane/.hgrc"),
            class: PathClass::User,
        };
        assert_eq!(candidate.to_string(), "/home/jane/.hgrc\t[user]");
    }
}
