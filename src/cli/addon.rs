//! Replace add-ons with the packages in `ee_addons_path`.
//!
//! `update-addon` replaces one add-on after a backup (and, by default, a
//! database dump). `update-addons` walks every installed add-on, taking a
//! backup before each one and pausing in between so the operator can run
//! the add-on's own update in the control panel.
//!
//! ```bash
//! eeup update-addon --addon-name seo_lite
//! eeup update-addons
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::common::{CommandContext, CommandExecutor, Prompter, drive, print_backup_summary};
use crate::addon::AddonUpdate;
use crate::workflow::{WorkflowRunner, plans};

/// Command to replace a single add-on
#[derive(Args, Debug)]
pub struct UpdateAddonCommand {
    /// Add-on to replace (its directory name under the third-party directory)
    #[arg(long)]
    addon_name: String,

    /// Skip the database dump
    #[arg(long)]
    no_db_dump: bool,
}

impl CommandExecutor for UpdateAddonCommand {
    async fn execute_with_context(self, ctx: CommandContext) -> Result<()> {
        let workflow = plans::update_addon(&self.addon_name, !self.no_db_dump);
        let runner = WorkflowRunner::new(&ctx.settings, workflow);
        let report = drive(runner, &mut Prompter::stdin(true)).await?;

        print_backup_summary(&report);
        report.updated_addons.iter().for_each(print_update);
        Ok(())
    }
}

/// Command to replace every installed add-on in turn
#[derive(Args, Debug, Default)]
pub struct UpdateAddonsCommand {
    /// Continue after each add-on without asking
    #[arg(short, long)]
    yes: bool,
}

impl CommandExecutor for UpdateAddonsCommand {
    async fn execute_with_context(self, ctx: CommandContext) -> Result<()> {
        let runner = WorkflowRunner::new(&ctx.settings, plans::update_addons());
        let report = drive(runner, &mut Prompter::stdin(self.yes)).await?;

        report.updated_addons.iter().for_each(print_update);
        if report.aborted {
            println!("{} Aborted; remaining add-ons were not updated", "!".yellow());
        }
        Ok(())
    }
}

fn print_update(update: &AddonUpdate) {
    let theme = update
        .theme_files
        .map_or_else(String::new, |count| format!(", {count} theme file(s)"));
    println!(
        "{} {} updated ({} code file(s){theme}; {} file(s) backed up)",
        "✓".green(),
        update.name.bold(),
        update.code_files,
        update.backed_up
    );
}
