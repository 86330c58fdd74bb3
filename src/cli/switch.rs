//! Switch the installation to an earlier backup.
//!
//! Without `--target` the available backups are listed. With one, the
//! live installation is backed up first and the target is copied into
//! place. Switching to the version that is already installed does nothing.
//!
//! ```bash
//! eeup switch
//! eeup switch --target 280
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::common::{CommandContext, CommandExecutor, Prompter, drive, print_backup_summary};
use crate::workflow::{WorkflowRunner, plans};

/// Command to roll back (or forward) to a backup
#[derive(Args, Debug, Default)]
pub struct SwitchCommand {
    /// Backup label to switch to, as listed without this option
    #[arg(short, long)]
    target: Option<String>,

    /// Skip the database dump of the current installation
    #[arg(long)]
    no_db_dump: bool,
}

impl CommandExecutor for SwitchCommand {
    async fn execute_with_context(self, ctx: CommandContext) -> Result<()> {
        let workflow = plans::switch(self.target.as_deref(), !self.no_db_dump);
        let runner = WorkflowRunner::new(&ctx.settings, workflow);
        let report = drive(runner, &mut Prompter::stdin(true)).await?;

        let Some(target) = self.target else {
            if report.backups.is_empty() {
                println!("No backups available to switch to");
            } else {
                println!("Available backups:");
                for label in &report.backups {
                    println!("  {}", label.cyan());
                }
                println!("Run 'eeup switch --target <label>' to switch.");
            }
            return Ok(());
        };

        if report.already_current {
            println!("{} {} is already installed; nothing to do", "✓".green(), target);
            return Ok(());
        }

        print_backup_summary(&report);
        println!("{} Switched to {}", "✓".green(), target.bold());
        Ok(())
    }
}
