//! List backups with the metadata recorded when they were taken.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::common::{CommandContext, CommandExecutor};
use crate::backup::BackupPlanner;

/// Command to list backups
#[derive(Args, Debug, Default)]
pub struct BackupsCommand {}

impl CommandExecutor for BackupsCommand {
    async fn execute_with_context(self, ctx: CommandContext) -> Result<()> {
        let planner = BackupPlanner::new(&ctx.settings);
        let labels = planner.list_backups()?;

        if labels.is_empty() {
            println!("No backups in {}", planner.backups_dir().display());
            return Ok(());
        }

        for label in labels {
            let backup = planner.resolve(&label)?;
            match planner.read_record(&backup).await? {
                Some(record) => {
                    let reason = record.reason.map_or_else(String::new, |r| format!(" [{r}]"));
                    println!(
                        "{}  version {}  {}{}",
                        label.cyan(),
                        record.version,
                        record.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
                        reason.dimmed()
                    );
                }
                None => println!("{}  {}", label.cyan(), "(no backup record)".dimmed()),
            }
        }
        Ok(())
    }
}
