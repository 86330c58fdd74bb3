//! Install a fresh release into an empty location.
//!
//! Copies the release from `ee_path` into the root, creates the web root,
//! and sets permissions on the cache directory and configuration files.
//! Fails without touching anything if a system directory already exists.
//!
//! ```bash
//! eeup install
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::common::{CommandContext, CommandExecutor, Prompter, drive};
use crate::workflow::{WorkflowRunner, plans};

/// Command to install a release where none exists yet
#[derive(Args, Debug, Default)]
pub struct InstallCommand {}

impl CommandExecutor for InstallCommand {
    async fn execute_with_context(self, ctx: CommandContext) -> Result<()> {
        let runner = WorkflowRunner::new(&ctx.settings, plans::install());
        let report = drive(runner, &mut Prompter::stdin(true)).await?;

        println!(
            "{} Installed {} into {} ({} files)",
            "✓".green(),
            ctx.settings.release_dir().display(),
            ctx.root.display(),
            report.files_copied
        );
        println!("Load the website in your browser to run the installer, then run 'eeup clean'.");
        Ok(())
    }
}
