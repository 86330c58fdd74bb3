//! Builder for running the external programs eeup depends on.
//!
//! Two collaborators live outside the process: the PHP interpreter (for the
//! delegated version probe) and the MySQL dump tool. Both are run through
//! [`ToolCommand`], which gives them the same lookup, timeout, logging and
//! error mapping. Every failure becomes [`EeupError::ExternalProcessError`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use eeup_cli::process::ToolCommand;
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let output = ToolCommand::new("php")
//!     .args(["-r", "echo PHP_VERSION;"])
//!     .timeout(Duration::from_secs(10))
//!     .with_context("Checking PHP")
//!     .execute()
//!     .await?;
//! println!("{}", output.stdout);
//! # Ok(())
//! # }
//! ```

use anyhow::Result;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

use crate::core::EeupError;

/// Type-safe builder for constructing and executing an external command.
///
/// # Default Configuration
///
/// - **Timeout**: 5 minutes
/// - **Output capture**: stdout and stderr are captured
/// - **Environment**: inherited, plus anything added with [`secret_env`](Self::secret_env)
pub struct ToolCommand {
    /// Program name or path, resolved through `PATH`
    program: String,

    /// Arguments passed verbatim
    args: Vec<String>,

    /// Extra environment variables; values are never logged
    secret_env: Vec<(String, String)>,

    /// Maximum duration to wait for completion
    timeout_duration: Duration,

    /// Optional context string for log lines
    context: Option<String>,
}

impl ToolCommand {
    /// Creates a builder for `program` with default settings.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            secret_env: Vec::new(),
            timeout_duration: Duration::from_secs(300),
            context: None,
        }
    }

    /// Add several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable whose value is masked in logs.
    pub fn secret_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.secret_env.push((key.into(), value.into()));
        self
    }

    /// Override the timeout.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout_duration = duration;
        self
    }

    /// Attach a context string shown in log lines.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    fn failure(&self, reason: impl Into<String>) -> anyhow::Error {
        EeupError::ExternalProcessError {
            program: self.program.clone(),
            reason: reason.into(),
        }
        .into()
    }

    /// Execute the command and return its output.
    ///
    /// # Errors
    ///
    /// [`EeupError::ExternalProcessError`] when the program is not on
    /// `PATH`, cannot be spawned, times out, or exits non-zero.
    pub async fn execute(self) -> Result<ToolOutput> {
        let start = std::time::Instant::now();

        let resolved = which::which(&self.program)
            .map_err(|e| self.failure(format!("not found on PATH: {e}")))?;

        let mut cmd = Command::new(&resolved);
        cmd.args(&self.args);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let ctx = self.context.as_deref().unwrap_or("command");
        tracing::debug!(
            target: "process",
            "({}) Executing: {} {}",
            ctx,
            resolved.display(),
            self.args.join(" ")
        );

        for (key, value) in &self.secret_env {
            tracing::trace!(target: "process", "Setting env var: {}=***", key);
            cmd.env(key, value);
        }

        let duration = self.timeout_duration;
        let output = match timeout(duration, cmd.output()).await {
            Ok(result) => result.map_err(|e| self.failure(format!("failed to start: {e}")))?,
            Err(_) => {
                tracing::warn!(
                    target: "process",
                    "({}) {} timed out after {} seconds",
                    ctx,
                    self.program,
                    duration.as_secs()
                );
                return Err(self.failure(format!("timed out after {} seconds", duration.as_secs())));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            tracing::debug!(
                target: "process",
                "({}) {} exited with {:?}",
                ctx,
                self.program,
                output.status.code()
            );
            let reason = match (stderr.trim(), output.status.code()) {
                ("", Some(code)) => format!("exited with status {code}"),
                ("", None) => "terminated by a signal".to_string(),
                (text, _) => text.to_string(),
            };
            return Err(self.failure(reason));
        }

        if !stderr.trim().is_empty() {
            tracing::debug!(target: "process", "({}) {}", ctx, stderr.trim());
        }

        let elapsed = start.elapsed();
        if elapsed.as_secs() > 1 {
            tracing::info!(
                target: "process::perf",
                "({}) {} took {:.2}s",
                ctx,
                self.program,
                elapsed.as_secs_f64()
            );
        }

        Ok(ToolOutput {
            stdout,
            stderr,
        })
    }
}

/// Output from an external command
#[derive(Debug)]
pub struct ToolOutput {
    /// Standard output
    pub stdout: String,
    /// Standard error output
    pub stderr: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_is_external_process_error() {
        let err = ToolCommand::new("eeup-definitely-not-installed").execute().await.unwrap_err();
        match err.downcast_ref::<EeupError>() {
            Some(EeupError::ExternalProcessError { program, reason }) => {
                assert_eq!(program, "eeup-definitely-not-installed");
                assert!(reason.contains("PATH"));
            }
            other => panic!("Expected ExternalProcessError, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_captures_stdout() {
        let output = ToolCommand::new("sh").args(["-c", "echo hello"]).execute().await.unwrap();
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_reports_stderr() {
        let err = ToolCommand::new("sh")
            .args(["-c", "echo broken >&2; exit 3"])
            .execute()
            .await
            .unwrap_err();
        match err.downcast_ref::<EeupError>() {
            Some(EeupError::ExternalProcessError { reason, .. }) => assert_eq!(reason, "broken"),
            other => panic!("Expected ExternalProcessError, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_env_is_passed() {
        let output = ToolCommand::new("sh")
            .args(["-c", "printf %s \"$EEUP_TEST_SECRET\""])
            .secret_env("EEUP_TEST_SECRET", "s3cret")
            .execute()
            .await
            .unwrap();
        assert_eq!(output.stdout, "s3cret");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout() {
        let err = ToolCommand::new("sh")
            .args(["-c", "sleep 5"])
            .timeout(Duration::from_millis(100))
            .execute()
            .await
            .unwrap_err();
        assert!(format!("{:?}", err.downcast_ref::<EeupError>()).contains("timed out"));
    }
}
