//! Interactive editing session.
//!
//! A [`Session`] picks one configuration file, loads it and then loops over
//! menu actions until the user quits. The active path, the document and
//! its dirty flag live in the session; all I/O goes through the
//! [`Surface`] it was given.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::document::ConfigDocument;
use crate::error::{Error, Result};
use crate::grammar::validate_name;
use crate::paths::{dedupe_and_filter, offer_creation, RcEnv, Scope};
use crate::surface::{Choice, Surface};

pub const HELP: &str = "
Configuration editor for hgrc files.

A '*' before the prompt means there are unsaved changes. See 'man 5 hgrc'
for the meaning of sections and properties.

Commands:
a       add or modify a property
d       delete a section or a single property
v       view the configuration, including unsaved changes
l       reload a configuration from disk
w       write changes to the file
q       quit
h       show this help
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Add,
    Delete,
    View,
    Reload,
    Write,
    Quit,
    Help,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Action::Add,
        Action::Delete,
        Action::View,
        Action::Reload,
        Action::Write,
        Action::Quit,
        Action::Help,
    ];

    pub fn choice(self) -> Choice {
        let (key, label) = match self {
            Action::Add => ("a", "add"),
            Action::Delete => ("d", "delete"),
            Action::View => ("v", "view"),
            Action::Reload => ("l", "reload"),
            Action::Write => ("w", "write"),
            Action::Quit => ("q", "quit"),
            Action::Help => ("h", "help"),
        };
        Choice::new(key, label)
    }
}

/// What the main loop does after an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct Session<'a> {
    env: &'a RcEnv,
    surface: &'a mut dyn Surface,
    paths: Vec<PathBuf>,
    active: Option<PathBuf>,
    document: ConfigDocument,
}

impl<'a> Session<'a> {
    pub fn new(env: &'a RcEnv, surface: &'a mut dyn Surface) -> Self {
        Self {
            env,
            surface,
            paths: Vec::new(),
            active: None,
            document: ConfigDocument::default(),
        }
    }

    pub fn active_path(&self) -> Option<&Path> {
        self.active.as_deref()
    }

    pub fn document(&self) -> &ConfigDocument {
        &self.document
    }

    pub fn prompt(&self) -> &'static str {
        if self.document.is_dirty() {
            "*>"
        } else {
            ">"
        }
    }

    /// Run the whole session. Closed input ends it like a forced quit.
    pub fn run(&mut self) -> Result<()> {
        match self.run_loop() {
            Err(Error::Interrupted) => {
                if self.document.is_dirty() {
                    self.surface.warn("Input closed, unsaved changes discarded.");
                }
                Ok(())
            }
            other => other,
        }
    }

    fn run_loop(&mut self) -> Result<()> {
        if self.start()? == Flow::Exit {
            return Ok(());
        }

        let choices: Vec<Choice> = Action::ALL.iter().map(|a| a.choice()).collect();
        let help = Action::ALL.len() - 1;
        loop {
            let prompt = self.prompt();
            let index = self.surface.prompt_choice(prompt, &choices, help)?;
            if self.dispatch(Action::ALL[index])? == Flow::Exit {
                return Ok(());
            }
        }
    }

    /// Find candidate files, load one and show the help screen.
    pub fn start(&mut self) -> Result<Flow> {
        self.surface.status("Reading current configuration...");
        self.find_paths()?;
        if self.select_and_load()? == Flow::Exit {
            return Ok(Flow::Exit);
        }
        self.help()
    }

    pub fn dispatch(&mut self, action: Action) -> Result<Flow> {
        debug!(?action, "dispatch");
        match action {
            Action::Add => self.add(),
            Action::Delete => self.delete(),
            Action::View => self.view(),
            Action::Reload => self.reload(),
            Action::Write => self.write(),
            Action::Quit => self.quit(),
            Action::Help => self.help(),
        }
    }

    fn find_paths(&mut self) -> Result<()> {
        self.paths = dedupe_and_filter(&self.env.search_paths());

        if let Ok(repo) = self.env.repository_config() {
            if !self.paths.contains(&repo) && offer_creation(&repo, "repository", self.surface)? {
                self.paths.push(repo);
            }
        }
        debug!(count = self.paths.len(), "candidate configuration files");
        Ok(())
    }

    fn select_and_load(&mut self) -> Result<Flow> {
        self.paths = dedupe_and_filter(&self.paths);

        let path = match self.paths.len() {
            0 => {
                let default = self.env.target_path(&Scope::User)?;
                if !offer_creation(&default, "user", self.surface)? {
                    self.surface.status("No configuration to edit.");
                    return Ok(Flow::Exit);
                }
                self.paths.push(default.clone());
                default
            }
            1 => self.paths[0].clone(),
            n => {
                self.surface.status("Select configuration to edit:");
                for (i, candidate) in self.env.candidates(&self.paths).iter().enumerate() {
                    self.surface.status(&format!(" {i}.  {candidate}"));
                }
                let choices: Vec<Choice> = (0..n)
                    .map(|i| Choice::new(i.to_string(), i.to_string()))
                    .collect();
                let prompt = self.prompt();
                let index = self.surface.prompt_choice(prompt, &choices, n - 1)?;
                self.paths[index].clone()
            }
        };

        self.document = ConfigDocument::load(&path)?;
        self.surface
            .status(&format!("Configuration at '{}' loaded.", path.display()));
        self.active = Some(path);
        Ok(Flow::Continue)
    }

    fn ask_name(&mut self, message: &str) -> Result<Option<String>> {
        let name = self.surface.prompt_text(message, "")?;
        match validate_name(&name) {
            Ok(_) => Ok(Some(name)),
            Err(e) => {
                self.surface.warn(&e.to_string());
                Ok(None)
            }
        }
    }

    fn add(&mut self) -> Result<Flow> {
        let Some(section) = self.ask_name("Enter section name:")? else {
            return Ok(Flow::Continue);
        };
        let Some(property) = self.ask_name("Enter property name:")? else {
            return Ok(Flow::Continue);
        };

        let current = self
            .document
            .get(&section, &property)
            .ok()
            .map(str::to_string);
        let message = match &current {
            Some(value) => format!("Enter property value (currently '{value}'):"),
            None => "Enter property value:".to_string(),
        };
        let value = self
            .surface
            .prompt_text(&message, current.as_deref().unwrap_or_default())?;

        self.document.set(&section, &property, &value);
        self.surface.status("Value set.");
        Ok(Flow::Continue)
    }

    fn delete(&mut self) -> Result<Flow> {
        self.surface
            .status("Delete an entire (s)ection or a single (p)roperty [(m) return to main menu]?");
        let choices = [
            Choice::new("s", "section"),
            Choice::new("p", "property"),
            Choice::new("m", "main"),
        ];
        let prompt = self.prompt();
        let index = self.surface.prompt_choice(prompt, &choices, 2)?;

        match index {
            0 => {
                let Some(section) = self.ask_name("Enter section name:")? else {
                    return Ok(Flow::Continue);
                };
                if self.document.remove_section(&section) {
                    self.surface.status("Section removed.");
                } else {
                    self.surface
                        .warn(&format!("Section '{section}' not found, nothing to remove."));
                }
            }
            1 => {
                let Some(section) = self.ask_name("Enter section name:")? else {
                    return Ok(Flow::Continue);
                };
                let Some(property) = self.ask_name("Enter property name:")? else {
                    return Ok(Flow::Continue);
                };
                if !self.document.has_section(&section) {
                    self.surface
                        .warn(&format!("Section '{section}' not found, nothing to remove."));
                } else if self.document.remove_property(&section, &property) {
                    self.surface.status("Property removed.");
                } else {
                    self.surface
                        .warn(&format!("Property '{property}' not found, nothing to remove."));
                }
            }
            _ => {}
        }
        Ok(Flow::Continue)
    }

    fn view(&mut self) -> Result<Flow> {
        let location = self
            .active
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        self.surface.status(&format!("(Location: {location})"));
        self.surface.status("");
        if self.document.is_empty() {
            self.surface.status("(Empty configuration)");
        } else {
            let text = self.document.render();
            self.surface.status(text.trim_end());
        }
        Ok(Flow::Continue)
    }

    /// Ask before throwing away unsaved changes. True means go ahead.
    fn confirm_discard(&mut self, action: &str) -> Result<bool> {
        if !self.document.is_dirty() {
            return Ok(true);
        }
        self.surface.confirm(&format!(
            "You have unsaved changes.\nReally {action} before saving [y n]?"
        ))
    }

    fn reload(&mut self) -> Result<Flow> {
        if !self.confirm_discard("load a new configuration")? {
            return Ok(Flow::Continue);
        }
        self.select_and_load()
    }

    fn write(&mut self) -> Result<Flow> {
        let Some(path) = self.active.clone() else {
            self.surface.warn("No configuration loaded.");
            return Ok(Flow::Continue);
        };
        match self.document.write(&path) {
            Ok(()) => self
                .surface
                .status(&format!("Configuration written to {}", path.display())),
            Err(e) => self.surface.warn(&e.to_string()),
        }
        Ok(Flow::Continue)
    }

    fn quit(&mut self) -> Result<Flow> {
        if self.confirm_discard("quit")? {
            Ok(Flow::Exit)
        } else {
            Ok(Flow::Continue)
        }
    }

    fn help(&mut self) -> Result<Flow> {
        self.surface.status(HELP);
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::surface::ScriptedSurface;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        env: RcEnv,
        user_rc: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("home");
        let work = dir.path().join("work");
        fs::create_dir_all(&home).unwrap();
        fs::create_dir_all(&work).unwrap();
        let settings = Settings {
            user_paths: vec![home.join(".hgrc")],
            system_paths: vec![],
            ..Settings::defaults(Some(home.as_path()))
        };
        let user_rc = home.join(".hgrc");
        Fixture {
            env: RcEnv::new(work, Some(home), settings),
            user_rc,
            _dir: dir,
        }
    }

    fn run(env: &RcEnv, answers: &[&str]) -> ScriptedSurface {
        let mut surface = ScriptedSurface::new(answers.iter().copied());
        Session::new(env, &mut surface).run().unwrap();
        surface
    }

    #[test]
    fn test_action_keys_are_unique() {
        let mut keys: Vec<String> = Action::ALL
            .iter()
            .map(|a| a.choice().key().to_string())
            .collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), Action::ALL.len());
    }

    #[test]
    fn test_single_candidate_loads_and_views() {
        let fx = fixture();
        fs::write(&fx.user_rc, "[ui]\nusername = Jane\n").unwrap();

        let surface = run(&fx.env, &["v", "q"]);
        let statuses = surface.statuses();
        assert!(statuses.contains(&format!("(Location: {})", fx.user_rc.display()).as_str()));
        assert!(statuses.contains(&"[ui]\nusername = Jane"));
        assert_eq!(surface.remaining(), 0);
    }

    #[test]
    fn test_view_empty_configuration() {
        let fx = fixture();
        fs::write(&fx.user_rc, "").unwrap();

        let surface = run(&fx.env, &["v", "q"]);
        assert!(surface.statuses().contains(&"(Empty configuration)"));
    }

    #[test]
    fn test_add_write_and_keep_editing() {
        let fx = fixture();
        fs::write(&fx.user_rc, "").unwrap();

        let surface = run(
            &fx.env,
            &[
                "a", "ui", "username", "Jane Doe <jane@example.com>", //
                "w", //
                "a", "ui", "verbose", "true", //
                "q", "y",
            ],
        );

        assert_eq!(
            fs::read_to_string(&fx.user_rc).unwrap(),
            "[ui]\nusername = Jane Doe <jane@example.com>\n"
        );
        let prompts = surface.prompts();
        assert!(prompts.contains(&"*>"));
        assert!(prompts.iter().any(|p| p.starts_with("You have unsaved changes.")));
        assert_eq!(surface.remaining(), 0);
    }

    #[test]
    fn test_add_shows_current_value_and_keeps_it_on_empty_answer() {
        let fx = fixture();
        fs::write(&fx.user_rc, "[ui]\nverbose = true\n").unwrap();

        let surface = run(&fx.env, &["a", "ui", "verbose", "", "w", "q"]);
        assert!(surface
            .prompts()
            .contains(&"Enter property value (currently 'true'):"));
        assert_eq!(
            fs::read_to_string(&fx.user_rc).unwrap(),
            "[ui]\nverbose = true\n"
        );
    }

    #[test]
    fn test_add_rejects_invalid_name() {
        let fx = fixture();
        fs::write(&fx.user_rc, "").unwrap();

        let surface = run(&fx.env, &["a", "ui=x", "q"]);
        assert_eq!(surface.warnings().len(), 1);
        assert!(surface.warnings()[0].contains("invalid name"));
    }

    #[test]
    fn test_quit_declined_keeps_session() {
        let fx = fixture();
        fs::write(&fx.user_rc, "").unwrap();

        run(&fx.env, &["a", "ui", "x", "1", "q", "n", "w", "q"]);
        assert_eq!(fs::read_to_string(&fx.user_rc).unwrap(), "[ui]\nx = 1\n");
    }

    #[test]
    fn test_delete_section_and_property() {
        let fx = fixture();
        fs::write(
            &fx.user_rc,
            "[ui]\nusername = Jane\nverbose = true\n\n[alias]\nl = log\n",
        )
        .unwrap();

        let surface = run(
            &fx.env,
            &["d", "s", "alias", "d", "p", "ui", "verbose", "w", "q"],
        );
        assert_eq!(
            fs::read_to_string(&fx.user_rc).unwrap(),
            "[ui]\nusername = Jane\n"
        );
        assert!(surface.statuses().contains(&"Section removed."));
        assert!(surface.statuses().contains(&"Property removed."));
    }

    #[test]
    fn test_dotted_keys_can_be_edited_and_deleted() {
        let fx = fixture();
        fs::write(
            &fx.user_rc,
            "[merge-tools]\nkdiff3.args = $base $local\nkdiff3.priority = 1\n",
        )
        .unwrap();

        let surface = run(
            &fx.env,
            &[
                "d", "p", "merge-tools", "kdiff3.args", //
                "a", "extensions", "hgext.mq", "", //
                "w", "q",
            ],
        );
        assert!(surface.warnings().is_empty());
        assert_eq!(
            fs::read_to_string(&fx.user_rc).unwrap(),
            "[merge-tools]\nkdiff3.priority = 1\n\n[extensions]\nhgext.mq =\n"
        );
    }

    #[test]
    fn test_delete_missing_is_reported_not_fatal() {
        let fx = fixture();
        fs::write(&fx.user_rc, "[ui]\nusername = Jane\n").unwrap();

        let surface = run(
            &fx.env,
            &["d", "s", "alias", "d", "p", "ui", "nope", "d", "m", "q"],
        );
        let warnings = surface.warnings();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("Section 'alias' not found"));
        assert!(warnings[1].contains("Property 'nope' not found"));
        // nothing changed, so quit needs no confirmation
        assert_eq!(surface.remaining(), 0);
    }

    #[test]
    fn test_reload_confirmed_discards_changes() {
        let fx = fixture();
        fs::write(&fx.user_rc, "[ui]\nverbose = true\n").unwrap();

        let mut surface = ScriptedSurface::new(["ui", "verbose", "false", "y"]);
        let mut session = Session::new(&fx.env, &mut surface);
        assert_eq!(session.start().unwrap(), Flow::Continue);
        for action in [Action::Add, Action::Reload] {
            assert_eq!(session.dispatch(action).unwrap(), Flow::Continue);
        }
        assert!(!session.document().is_dirty());
        assert_eq!(session.document().get("ui", "verbose").unwrap(), "true");
    }

    #[test]
    fn test_reload_declined_keeps_changes() {
        let fx = fixture();
        fs::write(&fx.user_rc, "[ui]\nverbose = true\n").unwrap();

        let mut surface = ScriptedSurface::new(["ui", "verbose", "false", "n"]);
        let mut session = Session::new(&fx.env, &mut surface);
        session.start().unwrap();
        session.dispatch(Action::Add).unwrap();
        session.dispatch(Action::Reload).unwrap();
        assert!(session.document().is_dirty());
        assert_eq!(session.document().get("ui", "verbose").unwrap(), "false");
    }

    #[test]
    fn test_multiple_candidates_are_offered() {
        let fx = fixture();
        fs::write(&fx.user_rc, "[ui]\nusername = Jane\n").unwrap();
        let hg = fx.env.cwd.join(".hg");
        fs::create_dir(&hg).unwrap();
        fs::write(hg.join("hgrc"), "[paths]\ndefault = /srv/repo\n").unwrap();

        let mut surface = ScriptedSurface::new(["1", "q"]);
        {
            let mut session = Session::new(&fx.env, &mut surface);
            session.run().unwrap();
        }
        let statuses = surface.statuses();
        assert!(statuses.contains(&"Select configuration to edit:"));
        assert!(statuses.iter().any(|s| s.ends_with("[user]")));
        assert!(statuses.iter().any(|s| s.ends_with("[repository]")));
        assert!(statuses
            .iter()
            .any(|s| s.contains("hgrc' loaded.") && s.contains(".hg")));
    }

    #[test]
    fn test_missing_repository_config_is_offered() {
        let fx = fixture();
        fs::write(&fx.user_rc, "").unwrap();
        fs::create_dir(fx.env.cwd.join(".hg")).unwrap();

        // create the repository config, then pick it (index 1)
        let surface = run(&fx.env, &["y", "1", "q"]);
        assert!(fx.env.cwd.join(".hg/hgrc").is_file());
        assert!(surface.prompts()[0].starts_with("No repository configuration found"));
    }

    #[test]
    fn test_no_candidates_and_declined_creation_exits() {
        let fx = fixture();

        let surface = run(&fx.env, &["n"]);
        assert!(surface.statuses().contains(&"No configuration to edit."));
        assert!(!fx.user_rc.exists());
    }

    #[test]
    fn test_no_candidates_and_accepted_creation_loads() {
        let fx = fixture();

        let surface = run(&fx.env, &["y", "q"]);
        assert!(fx.user_rc.is_file());
        assert!(surface
            .statuses()
            .iter()
            .any(|s| s.ends_with("loaded.")));
    }

    #[test]
    fn test_closed_input_with_changes_warns() {
        let fx = fixture();
        fs::write(&fx.user_rc, "").unwrap();

        let surface = run(&fx.env, &["a", "ui", "x", "1"]);
        assert_eq!(
            surface.warnings(),
            vec!["Input closed, unsaved changes discarded."]
        );
        assert_eq!(fs::read_to_string(&fx.user_rc).unwrap(), "");
    }

    #[test]
    fn test_malformed_file_is_fatal() {
        let fx = fixture();
        fs::write(&fx.user_rc, "orphan = 1\n").unwrap();

        let mut surface = ScriptedSurface::new(["q"]);
        let result = Session::new(&fx.env, &mut surface).run();
        assert!(matches!(result, Err(Error::Parse { .. })));
    }

    #[test]
    fn test_help_is_default_action() {
        let fx = fixture();
        fs::write(&fx.user_rc, "").unwrap();

        let surface = run(&fx.env, &["", "q"]);
        let helps = surface.statuses().iter().filter(|s| **s == HELP).count();
        assert_eq!(helps, 2);
    }
}
