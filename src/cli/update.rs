//! Upgrade an installation to the release in `ee_path`.
//!
//! The live system directory and themes move into a versioned backup, the
//! release is copied in, and the configuration carried over. The command
//! then pauses while the operator runs the upgrade in the browser; a yes
//! answer deletes the installer afterwards.
//!
//! ```bash
//! eeup update
//! eeup update --no-db-dump
//! eeup update --yes           # answer every prompt with yes
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::common::{CommandContext, CommandExecutor, Prompter, drive, print_backup_summary};
use crate::workflow::{WorkflowRunner, plans};

/// Command to upgrade the installation
#[derive(Args, Debug, Default)]
pub struct UpdateCommand {
    /// Answer yes at the browser-upgrade prompt
    #[arg(short, long)]
    yes: bool,

    /// Skip the database dump
    #[arg(long)]
    no_db_dump: bool,
}

impl CommandExecutor for UpdateCommand {
    async fn execute_with_context(self, ctx: CommandContext) -> Result<()> {
        let runner = WorkflowRunner::new(&ctx.settings, plans::update(!self.no_db_dump));
        let report = drive(runner, &mut Prompter::stdin(self.yes)).await?;

        print_backup_summary(&report);
        if let Some(version) = &report.version {
            println!("{} Updated from version {}", "✓".green(), version);
        }
        if report.installer_deleted {
            println!("{} Installer deleted", "✓".green());
        } else {
            println!(
                "{} Installer kept at {}; run 'eeup clean' once the browser upgrade is done",
                "!".yellow(),
                ctx.settings.installer_dir().display()
            );
        }
        Ok(())
    }
}
