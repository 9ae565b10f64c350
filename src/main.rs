use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgGroup, Args, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use cedit::{
    find_settings_file, generate_init_file, load_settings, merge_settings, run_edit,
    set_username, should_use_colors, BatchOptions, CeditToml, CliOverrides, Colors, EditRequest,
    Identity, RcEnv, Session, Targets, TerminalSurface,
};

#[derive(Parser)]
#[command(name = "cedit")]
#[command(version, about = "Interactive and scriptable editor for hgrc configuration files")]
#[command(group(ArgGroup::new("operation").args(["add", "delete"]).multiple(true)))]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Set a property: "section.property = value"
    #[arg(short, long, value_name = "SETTING")]
    add: Option<String>,

    /// Delete a section or a property: "section" or "section.property"
    #[arg(short, long, value_name = "NAME")]
    delete: Option<String>,

    /// Edit the user configuration file
    #[arg(short, long, requires = "operation")]
    user: bool,

    /// Edit the system-wide configuration file
    #[arg(short, long, requires = "operation")]
    global: bool,

    /// Edit the repository configuration file
    #[arg(short, long, requires = "operation")]
    local: bool,

    /// Edit the first file named by HGRCPATH
    #[arg(short, long, requires = "operation")]
    env: bool,

    /// Edit the given file
    #[arg(short, long, value_name = "PATH", requires = "operation")]
    file: Option<PathBuf>,

    /// Show changes in diff format
    #[arg(long, requires = "operation")]
    diff: bool,

    /// Report changes without writing them
    #[arg(long, requires = "operation")]
    dry_run: bool,

    /// Specify settings file path (overrides auto-discovery)
    #[arg(long, value_name = "PATH")]
    settings: Option<PathBuf>,

    /// Force colored output
    #[arg(long, overrides_with = "no_color")]
    color: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Print debug logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Generate a template cedit.toml settings file
    #[arg(long, exclusive = true)]
    init: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Set ui.username
    Setuser(SetuserArgs),
}

#[derive(Args)]
struct SetuserArgs {
    /// Your full name
    #[arg(short, long)]
    name: Option<String>,

    /// Your email address
    #[arg(short, long)]
    email: Option<String>,

    /// Complete username, instead of name and email
    #[arg(short, long)]
    username: Option<String>,

    /// Write to the repository configuration file
    #[arg(short, long)]
    local: bool,
}

impl SetuserArgs {
    fn identity(&self) -> Identity {
        Identity {
            name: self.name.clone(),
            email: self.email.clone(),
            username: self.username.clone(),
            local: self.local,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.init {
        return handle_init();
    }

    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(e) => {
            eprintln!("Error: cannot read the working directory: {e}");
            return ExitCode::from(1);
        }
    };
    let toml = load_settings_file(cli.settings.as_deref(), &cwd);

    // --no-color wins over --color
    let color = if cli.no_color {
        Some(false)
    } else {
        cli.color.then_some(true)
    };
    let home = dirs::home_dir();
    let settings = merge_settings(&CliOverrides { color }, toml.as_ref(), home.as_deref());
    let colors = Colors::new(should_use_colors(settings.color));

    let env = match RcEnv::from_process(settings) {
        Ok(env) => env,
        Err(e) => return fail(&colors, &e),
    };
    let mut surface = TerminalSurface::stdio(colors);

    let result = match &cli.command {
        Some(Command::Setuser(args)) => {
            set_username(&args.identity(), &env, &mut surface).map(|_| true)
        }
        None if cli.add.is_some() || cli.delete.is_some() => {
            run_edit(&edit_request(&cli), &env, &mut surface)
        }
        None => Session::new(&env, &mut surface).run().map(|()| true),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => fail(&colors, &e),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn fail(colors: &Colors, error: &cedit::Error) -> ExitCode {
    eprintln!("{}", colors.paint(colors.error, &format!("Error: {error}")));
    ExitCode::from(1)
}

fn edit_request(cli: &Cli) -> EditRequest {
    EditRequest {
        set: cli.add.clone(),
        delete: cli.delete.clone(),
        targets: Targets {
            user: cli.user,
            global: cli.global,
            local: cli.local,
            file: cli.file.clone(),
            env: cli.env,
        },
        options: BatchOptions {
            show_diff: cli.diff,
            dry_run: cli.dry_run,
        },
    }
}

fn handle_init() -> ExitCode {
    match generate_init_file() {
        Ok(path) => {
            println!("Created {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

fn load_settings_file(explicit_path: Option<&Path>, cwd: &Path) -> Option<CeditToml> {
    let path = explicit_path
        .map(Path::to_path_buf)
        .or_else(|| find_settings_file(cwd));
    let Some(path) = path else {
        debug!("no settings file, using defaults");
        return None;
    };

    match load_settings(&path) {
        Ok(settings) => {
            info!(path = %path.display(), "using settings");
            Some(settings)
        }
        Err(e) => {
            eprintln!("Warning: Failed to load {}: {}", path.display(), e);
            None
        }
    }
}
