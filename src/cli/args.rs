//! cli::args
//!
//! clap definitions for `lw` and its subcommands.
//!
//! `--cwd`, `--debug`, `--quiet` and the interactive switches are global,
//! so they may appear before or after the subcommand. Prompts default to
//! on only when stdin is a terminal.

use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;

/// Lockwatch - advisory Git LFS lock coordination for binary assets
#[derive(Parser, Debug)]
#[command(name = "lw")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if lw was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output; implies --no-interactive
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable interactive prompts
    #[arg(long = "interactive", global = true, conflicts_with = "no_interactive")]
    pub interactive_flag: bool,

    /// Disable interactive prompts
    #[arg(long, global = true)]
    pub no_interactive: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// Whether alerts and confirmations may block on the terminal.
    ///
    /// `--interactive` forces prompts on; `--no-interactive` and `--quiet`
    /// force them off.
    pub fn interactive(&self) -> bool {
        match (self.interactive_flag, self.no_interactive || self.quiet) {
            (true, _) => true,
            (false, true) => false,
            (false, false) => std::io::stdin().is_terminal(),
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List current locks
    #[command(
        name = "list",
        visible_alias = "ls",
        long_about = "Fetch the current lock listing and print it.\n\n\
            Runs one refresh cycle against the LFS server, then prints every lock. \
            Your own locks (per hostUsername) come first and are marked with '*'. \
            Conflicts with your uncommitted changes are reported as warnings.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Everything that is locked
    lw list

    # Only what you hold
    lw list --mine

    # Machine-readable
    lw list --json"
    )]
    List {
        /// Only locks held by you
        #[arg(long, conflicts_with = "others")]
        mine: bool,

        /// Only locks held by others
        #[arg(long)]
        others: bool,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Lock files
    #[command(
        name = "lock",
        long_about = "Lock one or more files on the LFS server.\n\n\
            Paths are sent in batches of at most maxFilesPerRequest. When \
            warnIfRemoteModified is on, files already changed upstream need \
            confirmation first; declining cancels the whole request.",
        after_help = "\
WORKFLOW EXAMPLES:
    lw lock Assets/Art/hero.png
    lw lock Assets/Scenes/*.unity"
    )]
    Lock {
        /// Repository-relative paths
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Release locks
    #[command(
        name = "unlock",
        long_about = "Release locks on the LFS server.\n\n\
            Without --force only your own locks can be released.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Release one file
    lw unlock Assets/Art/hero.png

    # Release everything you hold
    lw unlock --all-mine

    # Break someone else's lock (needs server permission)
    lw unlock --force Assets/Art/hero.png"
    )]
    Unlock {
        /// Repository-relative paths
        #[arg(required_unless_present = "all_mine", conflicts_with = "all_mine")]
        paths: Vec<String>,

        /// Release locks held by others too
        #[arg(long)]
        force: bool,

        /// Release every lock you hold
        #[arg(long)]
        all_mine: bool,
    },

    /// Show uncommitted files and conflicting locks
    #[command(name = "status")]
    Status,

    /// List files changed upstream but not merged locally
    #[command(
        name = "remote-modified",
        long_about = "List files modified on tracked remote branches but not merged locally.\n\n\
            Fetches the current branch and every branch in extraBranchesToCheck. \
            This talks to the remote for each branch and can be slow."
    )]
    RemoteModified,

    /// Keep the lock cache fresh in the foreground
    #[command(
        name = "watch",
        long_about = "Run the refresh loop until interrupted.\n\n\
            Refreshes every refreshIntervalMinutes while autoRefresh is on, \
            yields while git holds its index lock, and watches the working tree \
            so edits to locked files are noticed. On Ctrl-C, asks for \
            confirmation if you still hold locks (warnOnQuitWithOpenLocks). \
            Only one watcher may run per repository."
    )]
    Watch {
        /// Seconds between ticks
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
        tick: u64,
    },

    /// Get, set or list settings
    #[command(
        name = "config",
        after_help = "\
WORKFLOW EXAMPLES:
    # Tell lockwatch who you are on the LFS server
    lw config set hostUsername alice

    # Check additional branches for upstream changes
    lw config set extraBranchesToCheck develop,release

    # Where the settings live
    lw config path"
    )]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Check the git setup
    #[command(
        name = "doctor",
        long_about = "Check that git, git-lfs and lockwatch are set up correctly.\n\n\
            Reports the git version (2.30 or newer is needed for the bundled \
            credential manager), whether git-lfs is installed and whether \
            hostUsername is configured."
    )]
    Doctor {
        /// Configure credential.helper globally
        #[arg(long)]
        setup_credentials: bool,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
WORKFLOW EXAMPLES:
    # Bash (add to ~/.bashrc)
    lw completion bash >> ~/.bashrc

    # Zsh (add to ~/.zshrc)
    lw completion zsh >> ~/.zshrc"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Value to set
        value: String,
    },
    /// List all configuration values
    List,
    /// Print the config file location
    Path,
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
