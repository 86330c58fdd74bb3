//! Installed version detection.
//!
//! The installed ExpressionEngine version is only ever used as a label: it
//! names backup directories and lets `switch` notice that the requested
//! target is already installed. No ordering or semantic comparison is done.
//!
//! Two probes implement [`VersionProbe`]:
//!
//! - [`PatternProbe`] scans `config.php` for the `app_version` assignment
//! - [`PhpProbe`] asks the PHP interpreter to evaluate `config.php` and
//!   print the resulting `$config` array as JSON
//!
//! [`probe_for`] picks one according to [`Settings::version_probe`]. Tests
//! substitute their own implementation.

mod pattern;
mod php;

pub use pattern::PatternProbe;
pub use php::PhpProbe;

use anyhow::Result;
use std::fmt;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use crate::config::{ProbeMode, Settings};

/// Opaque version label of the live installation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstalledVersion(String);

impl InstalledVersion {
    /// Wrap a label.
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// The label as used in backup directory names.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstalledVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for InstalledVersion {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Reads the installed version from a configuration file.
pub trait VersionProbe: Send + Sync {
    /// Short name used in logs (e.g. "pattern", "php").
    fn name(&self) -> &str;

    /// Determine the version recorded in `config_file`.
    ///
    /// # Errors
    ///
    /// [`EeupError::VersionNotFound`](crate::core::EeupError::VersionNotFound)
    /// when no version can be found, and
    /// [`EeupError::ExternalProcessError`](crate::core::EeupError::ExternalProcessError)
    /// when a delegated probe cannot run.
    fn probe<'a>(
        &'a self,
        config_file: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<InstalledVersion>> + Send + 'a>>;
}

/// Build the probe selected by the settings.
#[must_use]
pub fn probe_for(settings: &Settings) -> Box<dyn VersionProbe> {
    match settings.version_probe {
        ProbeMode::Pattern => Box::new(PatternProbe::new()),
        ProbeMode::Php => Box::new(PhpProbe::new(settings.php_binary.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_installed_version_equality() {
        let version = InstalledVersion::new("290");
        assert!(version == "290");
        assert!(version != "291");
        assert_eq!(version.to_string(), "290");
    }
}
