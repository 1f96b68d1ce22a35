//! Branch lineage workflow tool layered over git.
//!
//! Every command expands into a linear program of git operations that runs
//! atomically from the user's perspective: conflicts suspend the program to
//! disk, and `continue`/`skip`/`abort`/`undo` pick it back up.

use clap::{Parser, Subcommand};

use grove::cmd;
use grove::cmd::config_cmd::ConfigAction;
use grove::cmd::resume::ResumeAction;
use grove::io::dialog;

#[derive(Parser)]
#[command(name = "grove", version, about = "Branch lineage workflow tool for git")]
struct Cli {
    /// Print the git commands instead of running them.
    #[arg(long, global = true)]
    dry_run: bool,

    /// Verbose diagnostics on stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new feature branch off the main branch.
    Hack {
        /// Name of the new branch. Without it, promote the current
        /// contribution/observed/parked branch to a feature branch.
        name: Option<String>,
    },
    /// Create a new branch as a child of the current branch.
    Append { name: String },
    /// Insert a new branch between the current branch and its parent.
    Prepend { name: String },
    /// Update branches from their parents and tracking branches.
    Sync {
        /// Branches to sync; default is the current branch.
        branches: Vec<String>,
        /// Sync all branches in the lineage.
        #[arg(long)]
        all: bool,
    },
    /// Squash-merge a finished feature branch into its parent.
    Ship {
        branch: Option<String>,
        /// Commit message for the squash commit.
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Remove an obsolete branch locally and at the remote.
    Kill { branch: Option<String> },
    /// Push the current branch and print the new-proposal URL.
    #[command(alias = "new-pull-request")]
    Propose,
    /// Rename a branch everywhere it exists.
    RenameBranch {
        /// Old name; defaults to the current branch when NEW is omitted.
        old: String,
        new: Option<String>,
        /// Allow renaming perennial branches.
        #[arg(long)]
        force: bool,
    },
    /// Choose a new parent for the current branch.
    SetParent,
    /// Resume the suspended command after resolving conflicts.
    Continue,
    /// Skip the conflicting branch and resume the suspended command.
    Skip,
    /// Abort the suspended command and restore the initial state.
    Abort,
    /// Undo the suspended or most recently finished command.
    Undo,
    /// Show the persisted command state.
    Status,
    /// Show or change the grove configuration.
    Config {
        #[command(subcommand)]
        action: Option<ConfigCommand>,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print one setting.
    Get { key: String },
    /// Change one setting.
    Set {
        key: String,
        value: String,
        /// Write to the global git configuration.
        #[arg(long)]
        global: bool,
    },
    /// Remove all grove configuration from this repository.
    Reset,
}

fn main() {
    let cli = Cli::parse();
    grove::logging::init(cli.verbose);
    if let Err(err) = run(cli) {
        eprintln!("{err:#}");
        std::process::exit(err.exit_code());
    }
}

fn run(cli: Cli) -> grove::errors::Result<()> {
    let dir = std::env::current_dir()?;
    let mut dialog = dialog::from_environment();
    let dry_run = cli.dry_run;
    match cli.command {
        Command::Hack { name } => cmd::hack::run(&dir, name, dry_run, dialog.as_mut()),
        Command::Append { name } => cmd::append::run(&dir, name, dry_run, dialog.as_mut()),
        Command::Prepend { name } => cmd::prepend::run(&dir, name, dry_run, dialog.as_mut()),
        Command::Sync { branches, all } => {
            cmd::sync::run(&dir, branches, all, dry_run, dialog.as_mut())
        }
        Command::Ship { branch, message } => {
            // Hosting connectors are wired in by embedders; the CLI ships
            // through the local squash-merge path.
            cmd::ship::run(&dir, branch, message, dry_run, dialog.as_mut(), None)
        }
        Command::Kill { branch } => cmd::kill::run(&dir, branch, dry_run, dialog.as_mut()),
        Command::Propose => cmd::propose::run(&dir, dry_run, dialog.as_mut()),
        Command::RenameBranch { old, new, force } => {
            let (old, new) = match new {
                Some(new) => (Some(old), new),
                None => (None, old),
            };
            cmd::rename::run(&dir, old, new, force, dry_run, dialog.as_mut())
        }
        Command::SetParent => cmd::set_parent::run(&dir, dry_run, dialog.as_mut()),
        Command::Continue => cmd::resume::run(&dir, ResumeAction::Continue),
        Command::Skip => cmd::resume::run(&dir, ResumeAction::Skip),
        Command::Abort => cmd::resume::run(&dir, ResumeAction::Abort),
        Command::Undo => cmd::resume::run(&dir, ResumeAction::Undo),
        Command::Status => cmd::status::run(&dir),
        Command::Config { action } => {
            let action = match action {
                None => ConfigAction::Show,
                Some(ConfigCommand::Get { key }) => ConfigAction::Get { key },
                Some(ConfigCommand::Set { key, value, global }) => {
                    ConfigAction::Set { key, value, global }
                }
                Some(ConfigCommand::Reset) => ConfigAction::Reset,
            };
            cmd::config_cmd::run(&dir, action)
        }
    }
}
