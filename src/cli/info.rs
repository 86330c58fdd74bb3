//! Report the installed ExpressionEngine version.
//!
//! ```bash
//! eeup info
//! eeup --root /srv/site info
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::common::{CommandContext, CommandExecutor, Prompter, drive};
use crate::workflow::{WorkflowRunner, plans};

/// Command to print the installed version
#[derive(Args, Debug, Default)]
pub struct InfoCommand {}

impl CommandExecutor for InfoCommand {
    async fn execute_with_context(self, ctx: CommandContext) -> Result<()> {
        let runner = WorkflowRunner::new(&ctx.settings, plans::info());
        let report = drive(runner, &mut Prompter::stdin(true)).await?;

        if let Some(version) = &report.version {
            println!("Current EE version: {}", version.to_string().cyan().bold());
        }
        Ok(())
    }
}
