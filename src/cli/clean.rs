//! Delete the installer directory left behind by an upgrade.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::common::{CommandContext, CommandExecutor, Prompter, drive};
use crate::workflow::{WorkflowRunner, plans};

/// Command to remove `<system>/installer`
#[derive(Args, Debug, Default)]
pub struct CleanCommand {}

impl CommandExecutor for CleanCommand {
    async fn execute_with_context(self, ctx: CommandContext) -> Result<()> {
        let runner = WorkflowRunner::new(&ctx.settings, plans::clean());
        let report = drive(runner, &mut Prompter::stdin(true)).await?;

        if report.installer_deleted {
            println!("{} Deleted {}", "✓".green(), ctx.settings.installer_dir().display());
        } else {
            println!("Nothing to clean");
        }
        Ok(())
    }
}
