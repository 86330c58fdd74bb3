//! Error handling for eeup
//!
//! This module provides the error taxonomy and the user-facing error report
//! for the tool. The design follows two rules:
//! 1. **Strongly-typed errors** raised close to their source, so workflows can
//!    react to them (a bulk add-on run, for instance, tolerates
//!    [`EeupError::AddonNotFound`] for one add-on and keeps going)
//! 2. **User-friendly messages** with an actionable suggestion when the error
//!    reaches the command line
//!
//! # Architecture
//!
//! - [`EeupError`] - Enumerated failure cases
//! - [`ErrorContext`] - Wrapper that adds details and a suggestion for display
//!
//! # Error Categories
//!
//! - **Configuration**: [`EeupError::ConfigError`]
//! - **Installation layout**: [`EeupError::MissingInstallation`],
//!   [`EeupError::InstallationExists`], [`EeupError::MissingSource`]
//! - **Version probing**: [`EeupError::VersionNotFound`],
//!   [`EeupError::ExternalProcessError`]
//! - **Backups**: [`EeupError::BackupNotFound`], [`EeupError::BackupNotReady`]
//! - **Renames**: [`EeupError::AlreadyRenamed`], [`EeupError::RenameTargetExists`]
//! - **Add-ons**: [`EeupError::AddonNotFound`], [`EeupError::AddonFailures`]
//!
//! Backup directory collisions are resolved by suffixing and never surface
//! as an error.
//!
//! # Examples
//!
//! ```rust,no_run
//! use eeup_cli::core::{EeupError, user_friendly_error};
//!
//! let error = EeupError::MissingInstallation {
//!     path: "./system".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display(); // Colored error with suggestion on stderr
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for eeup operations
#[derive(Error, Debug)]
pub enum EeupError {
    /// The settings file is missing, unreadable, or invalid.
    ///
    /// Always fatal: the run halts before any workflow starts.
    #[error("Configuration error in {path}: {reason}")]
    ConfigError {
        /// Path of the settings file
        path: String,
        /// What is wrong with it
        reason: String,
    },

    /// The installation's system directory does not exist.
    ///
    /// Raised before any backup directory is created, which guards against
    /// running a workflow from the wrong directory.
    #[error("Could not find system directory: {path}")]
    MissingInstallation {
        /// Expected path of the system directory
        path: String,
    },

    /// A fresh install was requested where an installation already exists.
    #[error("Directory '{path}' already exists")]
    InstallationExists {
        /// Path of the existing system directory
        path: String,
    },

    /// The installed version could not be determined.
    #[error("Could not load app_version from {file}")]
    VersionNotFound {
        /// The configuration file that was probed
        file: String,
    },

    /// An external program could not be run or exited unsuccessfully.
    #[error("External program '{program}' failed")]
    ExternalProcessError {
        /// Program name (e.g. "php", "mysqldump")
        program: String,
        /// Captured stderr or the spawn error
        reason: String,
    },

    /// The named add-on is not installed or has no source package.
    #[error("Could not find an add-on named '{name}' in {path}")]
    AddonNotFound {
        /// Add-on name
        name: String,
        /// The directory that was expected to hold it
        path: String,
        /// Closest existing add-on name, if any
        suggestion: Option<String>,
    },

    /// One or more add-ons failed during a bulk update.
    #[error("{} add-on(s) failed to update: {}", .names.len(), .names.join(", "))]
    AddonFailures {
        /// Names of the add-ons that failed
        names: Vec<String>,
    },

    /// The requested backup does not exist.
    #[error("Backup '{label}' not found")]
    BackupNotFound {
        /// Backup label that was requested
        label: String,
        /// Labels that do exist
        available: Vec<String>,
    },

    /// The backup exists but does not hold a full installation to switch to.
    ///
    /// Add-on backups hold a single add-on and are never switch targets.
    #[error("Backup '{label}' does not contain a complete installation: {missing} is missing")]
    IncompleteBackup {
        /// Backup label that was requested
        label: String,
        /// The file a complete backup would have
        missing: String,
    },

    /// The backup directory tree could not be fully created.
    #[error("Backup directory is not ready: {path}")]
    BackupNotReady {
        /// Directory that could not be created
        path: String,
        /// Underlying failure
        reason: String,
    },

    /// A manifest entry marked as required had nothing to copy or rename.
    #[error("Required source not found: {path}")]
    MissingSource {
        /// The missing path or pattern
        path: String,
    },

    /// The rename source is gone and its destination already exists.
    ///
    /// Typical after an interrupted run; nothing is overwritten.
    #[error("'{from}' appears to be renamed already: '{to}' exists")]
    AlreadyRenamed {
        /// Rename source
        from: String,
        /// Rename destination
        to: String,
    },

    /// The rename destination exists and holds files.
    #[error("Refusing to rename onto '{to}': destination already contains files")]
    RenameTargetExists {
        /// Rename source
        from: String,
        /// Rename destination
        to: String,
    },

    /// `resume` was called on a workflow that is not waiting at a checkpoint.
    #[error("Workflow is not waiting at a checkpoint")]
    WorkflowNotSuspended,

    /// File system error
    #[error("File system error: {operation}")]
    FileSystemError {
        /// The file system operation that failed
        operation: String,
        /// Path where the file system error occurred
        path: String,
    },

    /// Other error
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

/// Error context wrapper that provides user-friendly error information
///
/// Details are shown in yellow, suggestions in green, below the red error
/// line.
///
/// # Examples
///
/// ```rust,no_run
/// use eeup_cli::core::{EeupError, ErrorContext};
///
/// let context = ErrorContext::new(EeupError::WorkflowNotSuspended)
///     .with_suggestion("Run the workflow until it reports a checkpoint")
///     .with_details("resume() only applies to a suspended run");
/// context.display();
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: EeupError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: EeupError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// Recognizes [`EeupError`] (including one wrapped by `anyhow` context),
/// common [`std::io::Error`] kinds, and falls back to the full error chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    // Context added on top of a typed error would otherwise be lost.
    let outer = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(std::string::ToString::to_string).collect();

    let error = match error.downcast::<EeupError>() {
        Ok(typed) => {
            let ctx = create_error_context(typed);
            let rendered = ctx.error.to_string();
            if outer != rendered && ctx.details.is_none() {
                return ctx.with_details(outer);
            }
            return ctx;
        }
        Err(error) => error,
    };

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(EeupError::FileSystemError {
                    operation: "file access".to_string(),
                    path: "unknown".to_string(),
                })
                .with_suggestion(
                    "Check file ownership or run as the user that owns the installation",
                )
                .with_details(io_error.to_string());
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(EeupError::FileSystemError {
                    operation: "file access".to_string(),
                    path: "unknown".to_string(),
                })
                .with_suggestion("Check that the paths in your settings file are correct")
                .with_details(io_error.to_string());
            }
            _ => {}
        }
    }

    let mut message = outer;
    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(EeupError::Other {
        message,
    })
}

/// Attach the standard suggestion for each error variant.
fn create_error_context(error: EeupError) -> ErrorContext {
    match &error {
        EeupError::ConfigError { .. } => ErrorContext::new(error)
            .with_suggestion("Fix settings.json; required keys are system, webroot, third_party, ee_path, ee_addons_path, db_name, db_username, db_password, db_host"),

        EeupError::MissingInstallation { .. } => ErrorContext::new(error)
            .with_suggestion("If this is not the correct directory update your settings file or pass --root"),

        EeupError::InstallationExists { .. } => ErrorContext::new(error)
            .with_suggestion("'install' starts from an empty location; use 'update' for an existing installation"),

        EeupError::VersionNotFound { .. } => ErrorContext::new(error)
            .with_suggestion("Check that config.php sets $config['app_version'], or set \"version_probe\": \"php\""),

        EeupError::ExternalProcessError { program, reason } => {
            let details = reason.clone();
            let suggestion = format!("Make sure '{program}' is installed and on your PATH");
            ErrorContext::new(error).with_details(details).with_suggestion(suggestion)
        }

        EeupError::AddonNotFound { suggestion, .. } => {
            let hint = match suggestion {
                Some(name) => format!("Did you mean '{name}'? Use --addon-name={name}"),
                None => "Use --addon-name with the directory name of an installed add-on, e.g. --addon-name=seo_lite".to_string(),
            };
            ErrorContext::new(error).with_suggestion(hint)
        }

        EeupError::AddonFailures { .. } => ErrorContext::new(error)
            .with_suggestion("The other add-ons were updated; re-run update-addon for the failed ones"),

        EeupError::BackupNotFound { available, .. } => {
            let hint = if available.is_empty() {
                "No backups exist yet".to_string()
            } else {
                format!("Available backups: {}", available.join(", "))
            };
            ErrorContext::new(error).with_suggestion(hint)
        }

        EeupError::IncompleteBackup { .. } => ErrorContext::new(error)
            .with_suggestion("Pick a version backup from 'eeup switch'; '-before-update-' backups hold a single add-on"),

        EeupError::BackupNotReady { reason, .. } => {
            let details = reason.clone();
            ErrorContext::new(error)
                .with_details(details)
                .with_suggestion("Check free space and permissions on the backups directory; nothing was moved yet")
        }

        EeupError::AlreadyRenamed { from, to } => {
            let suggestion = format!("A previous run was interrupted. Inspect '{to}' and move it back to '{from}' manually before re-running");
            ErrorContext::new(error).with_suggestion(suggestion)
        }

        EeupError::RenameTargetExists { to, .. } => {
            let suggestion = format!("Move '{to}' out of the way; it is never overwritten");
            ErrorContext::new(error).with_suggestion(suggestion)
        }

        EeupError::MissingSource { .. } => ErrorContext::new(error)
            .with_suggestion("Check ee_path and the backup contents; files already copied were left in place and the backup is intact"),

        _ => ErrorContext::new(error),
    }
}
