//! Command-line interface for eeup.
//!
//! Every command loads the installation's settings file first, builds a
//! workflow from [`crate::workflow::plans`], and drives it to completion,
//! prompting on the terminal at each checkpoint.
//!
//! # Available Commands
//!
//! - `info` - Print the installed version
//! - `install` - Install a release into an empty location
//! - `update` - Upgrade the installation to the release in `ee_path`
//! - `update-addon` - Replace one add-on from its package
//! - `update-addons` - Replace every installed add-on, pausing in between
//! - `switch` - List backups or switch to one of them
//! - `backups` - List backups with their recorded metadata
//! - `clean` - Delete the installer directory
//!
//! # Typical Session
//!
//! ```bash
//! cd /srv/site
//! eeup info
//! eeup update               # backs up, dumps the database, installs, pauses
//! eeup update-addons
//! eeup switch --target 290  # roll back if something went wrong
//! ```
//!
//! # Global Options
//!
//! - `--root <DIR>`: installation root (default: current directory)
//! - `--settings <FILE>`: settings file, relative to the root (default: `settings.json`)
//! - `-v/--verbose`, `-q/--quiet`: log level; `RUST_LOG` overrides both

mod addon;
mod backups;
mod clean;
mod common;
mod info;
mod install;
mod switch;
mod update;

pub use common::{CommandContext, CommandExecutor, Prompter, drive, parse_answer};

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Runtime configuration derived from the global flags.
///
/// Separated from [`Cli`] so tests can build one without parsing arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Default log level, used when `RUST_LOG` is not set.
    pub log_level: Option<String>,
}

impl CliConfig {
    /// Create a new CLI configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the global tracing subscriber.
    ///
    /// `RUST_LOG` wins over the configured level. Logs go to stderr so the
    /// command output on stdout stays clean. Calling this twice is harmless.
    pub fn init_tracing(&self) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(self.log_level.as_deref().unwrap_or("warn"))
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// Main CLI application structure for eeup
#[derive(Parser, Debug)]
#[command(
    name = "eeup",
    about = "Install, upgrade and roll back ExpressionEngine installations and their add-ons",
    version,
    author,
    long_about = None
)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output (every copied file is logged)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Installation root directory
    ///
    /// All paths in the settings file are relative to this directory.
    /// Defaults to the current directory.
    #[arg(long, global = true, env = "EEUP_ROOT")]
    root: Option<PathBuf>,

    /// Settings file, relative to the root
    #[arg(long, global = true)]
    settings: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the installed ExpressionEngine version
    Info(info::InfoCommand),

    /// Install a release into an empty location
    Install(install::InstallCommand),

    /// Back up the installation and upgrade it to the release in `ee_path`
    Update(update::UpdateCommand),

    /// Back up and replace one add-on from its package
    UpdateAddon(addon::UpdateAddonCommand),

    /// Replace every installed add-on, pausing after each
    UpdateAddons(addon::UpdateAddonsCommand),

    /// List backups, or switch the installation to one with --target
    Switch(switch::SwitchCommand),

    /// List backups with the version and time they were taken
    Backups(backups::BackupsCommand),

    /// Delete the installer directory
    Clean(clean::CleanCommand),
}

impl Cli {
    /// Execute the parsed command.
    ///
    /// # Errors
    ///
    /// Returns the first error of the command; the caller turns it into a
    /// user-facing message and a non-zero exit code.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Build a [`CliConfig`] from the parsed CLI arguments.
    ///
    /// `--verbose` selects `debug`, `--quiet` selects `warn`, and the
    /// default is `info`.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        };

        CliConfig {
            log_level: Some(log_level.to_string()),
        }
    }

    /// Execute the CLI with a specific configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be loaded or the command fails.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_tracing();

        let ctx = CommandContext::load(self.root.as_deref(), self.settings.as_deref()).await?;

        match self.command {
            Commands::Info(cmd) => cmd.execute_with_context(ctx).await,
            Commands::Install(cmd) => cmd.execute_with_context(ctx).await,
            Commands::Update(cmd) => cmd.execute_with_context(ctx).await,
            Commands::UpdateAddon(cmd) => cmd.execute_with_context(ctx).await,
            Commands::UpdateAddons(cmd) => cmd.execute_with_context(ctx).await,
            Commands::Switch(cmd) => cmd.execute_with_context(ctx).await,
            Commands::Backups(cmd) => cmd.execute_with_context(ctx).await,
            Commands::Clean(cmd) => cmd.execute_with_context(ctx).await,
        }
    }
}
