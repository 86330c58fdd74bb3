//! Common utilities and traits for CLI commands

use anyhow::{Context, Result};
use colored::Colorize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};

use crate::config::{Settings, settings_path};
use crate::workflow::{Checkpoint, Progress, Report, Resume, WorkflowRunner};

/// Common trait for CLI command execution pattern
pub trait CommandExecutor: Sized {
    /// Execute the command against a loaded installation context
    fn execute_with_context(
        self,
        ctx: CommandContext,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Installation root and the settings loaded for it
#[derive(Debug)]
pub struct CommandContext {
    /// Parsed settings, anchored at `root`
    pub settings: Settings,
    /// Path of the settings file that was read
    pub settings_path: PathBuf,
    /// Installation root directory
    pub root: PathBuf,
}

impl CommandContext {
    /// Load the settings for an installation.
    ///
    /// `root` defaults to the current directory; `settings` defaults to
    /// `settings.json` in the root.
    ///
    /// # Errors
    /// Returns an error if the current directory is unavailable or the
    /// settings file cannot be read or parsed
    pub async fn load(root: Option<&Path>, settings: Option<&Path>) -> Result<Self> {
        let root = match root {
            Some(root) => root.to_path_buf(),
            None => std::env::current_dir().context("Failed to determine current directory")?,
        };
        let settings_path = settings_path(&root, settings);
        let settings = Settings::load(&root, &settings_path).await?;

        Ok(Self {
            settings,
            settings_path,
            root,
        })
    }
}

/// Interpret an operator's answer at a checkpoint.
///
/// An empty answer continues. Returns `None` for anything unrecognised.
#[must_use]
pub fn parse_answer(answer: &str) -> Option<Resume> {
    match answer.trim().to_lowercase().as_str() {
        "" | "y" | "yes" | "c" | "continue" => Some(Resume::Continue),
        "n" | "no" | "a" | "abort" => Some(Resume::Abort),
        _ => None,
    }
}

/// Asks the operator how to proceed at each checkpoint.
///
/// One reader is kept for the whole run so piped answers are not lost
/// between prompts.
pub struct Prompter<R> {
    reader: R,
    assume_yes: bool,
}

impl Prompter<BufReader<Stdin>> {
    /// Prompt on standard input. With `assume_yes` nothing is read.
    #[must_use]
    pub fn stdin(assume_yes: bool) -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), assume_yes)
    }
}

impl<R: AsyncBufRead + Unpin + Send> Prompter<R> {
    /// Prompt on an arbitrary reader.
    pub const fn new(reader: R, assume_yes: bool) -> Self {
        Self {
            reader,
            assume_yes,
        }
    }

    /// Show the checkpoint and wait for an answer.
    ///
    /// End of input counts as abort.
    ///
    /// # Errors
    /// Returns an error if stdout cannot be flushed or the reader fails
    pub async fn ask(&mut self, checkpoint: &Checkpoint) -> Result<Resume> {
        println!();
        println!("{}", checkpoint.message().yellow().bold());

        if self.assume_yes {
            println!("{}", "Continuing (--yes)".dimmed());
            return Ok(Resume::Continue);
        }

        loop {
            print!("{} ", "Continue? [Y/n]:".green());
            io::stdout().flush()?;

            let mut response = String::new();
            if self.reader.read_line(&mut response).await? == 0 {
                println!();
                println!("{}", "No answer on input; aborting.".yellow());
                return Ok(Resume::Abort);
            }

            match parse_answer(&response) {
                Some(answer) => return Ok(answer),
                None => println!("Please answer y(es) or n(o)."),
            }
        }
    }
}

/// Run a workflow to completion, prompting at every checkpoint.
///
/// # Errors
/// Returns the first step failure, or [`EeupError::AddonFailures`] when a
/// bulk run skipped add-ons
///
/// [`EeupError::AddonFailures`]: crate::core::EeupError::AddonFailures
pub async fn drive<R: AsyncBufRead + Unpin + Send>(
    mut runner: WorkflowRunner<'_>,
    prompter: &mut Prompter<R>,
) -> Result<Report> {
    loop {
        match runner.run().await? {
            Progress::Suspended(checkpoint) => {
                let answer = prompter.ask(&checkpoint).await?;
                runner.resume(answer)?;
            }
            Progress::Completed(report) => return report.into_result(),
        }
    }
}

/// Print the one-line outcome shared by the mutating commands.
pub fn print_backup_summary(report: &Report) {
    if let Some(backup) = &report.backup {
        println!("{} Backup: {}", "✓".green(), backup.path().display());
    }
    if let Some(dump) = &report.dump_file {
        println!("{} Database dump: {}", "✓".green(), dump.display());
    }
}
