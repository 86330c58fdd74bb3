//! Regex-based version probe.

use anyhow::Result;
use regex::Regex;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::LazyLock;
use tracing::debug;

use super::{InstalledVersion, VersionProbe};
use crate::core::EeupError;

/// Matches `$config['app_version'] = '290';` with either quote style.
static APP_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\$config\[\s*["']app_version["']\s*\]\s*=\s*["'](\d*)["']\s*;"#)
        .expect("app_version pattern is valid")
});

/// Scans the raw text of `config.php` for the version assignment.
#[derive(Debug, Default, Clone)]
pub struct PatternProbe;

impl PatternProbe {
    /// Create the probe.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Extract the version from configuration text.
    ///
    /// Returns `None` when there is no assignment or its value is empty.
    #[must_use]
    pub fn extract(content: &str) -> Option<InstalledVersion> {
        let captures = APP_VERSION.captures(content)?;
        let value = captures.get(1)?.as_str();
        if value.is_empty() {
            return None;
        }
        Some(InstalledVersion::new(value))
    }
}

impl VersionProbe for PatternProbe {
    fn name(&self) -> &str {
        "pattern"
    }

    fn probe<'a>(
        &'a self,
        config_file: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<InstalledVersion>> + Send + 'a>> {
        Box::pin(async move {
            let not_found = || EeupError::VersionNotFound {
                file: config_file.display().to_string(),
            };

            let content = tokio::fs::read_to_string(config_file).await.map_err(|e| {
                debug!("Cannot read {}: {}", config_file.display(), e);
                not_found()
            })?;

            Ok(Self::extract(&content).ok_or_else(not_found)?)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_extract_single_quotes() {
        let content = "<?php\n$config['app_version'] = '290';\n$config['site_label'] = 'x';\n";
        assert_eq!(PatternProbe::extract(content), Some(InstalledVersion::new("290")));
    }

    #[test]
    fn test_extract_double_quotes_and_spacing() {
        let content = "$config[\"app_version\"]   =  \"2101\" ;";
        assert_eq!(PatternProbe::extract(content), Some(InstalledVersion::new("2101")));
    }

    #[test]
    fn test_extract_missing() {
        assert_eq!(PatternProbe::extract("$config['site_label'] = 'x';"), None);
        assert_eq!(PatternProbe::extract("$config['app_version'] = '';"), None);
    }

    #[tokio::test]
    async fn test_probe_missing_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("config.php");
        let err = PatternProbe::new().probe(&file).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<EeupError>(), Some(EeupError::VersionNotFound { .. })));
    }

    #[tokio::test]
    async fn test_probe_reads_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("config.php");
        std::fs::write(&file, "<?php $config['app_version'] = '285';").unwrap();
        let version = PatternProbe::new().probe(&file).await.unwrap();
        assert_eq!(version, InstalledVersion::new("285"));
    }
}
