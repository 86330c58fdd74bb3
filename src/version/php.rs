//! Version probe delegated to the PHP interpreter.
//!
//! `config.php` guards itself with `if ( ! defined('BASEPATH')) exit(...)`, so
//! the snippet defines `BASEPATH` before including it and then prints the
//! populated `$config` array as JSON.

use anyhow::Result;
use serde_json::Value;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use tracing::debug;

use super::{InstalledVersion, VersionProbe};
use crate::constants::PHP_PROBE_TIMEOUT;
use crate::core::EeupError;
use crate::process::ToolCommand;

/// Evaluates `config.php` with `php -r` and reads `app_version` from the JSON output.
#[derive(Debug, Clone)]
pub struct PhpProbe {
    php_binary: String,
}

impl PhpProbe {
    /// Create a probe that runs `php_binary`.
    pub fn new(php_binary: impl Into<String>) -> Self {
        Self {
            php_binary: php_binary.into(),
        }
    }

    /// PHP source passed to `php -r`.
    #[must_use]
    pub fn script(config_file: &Path) -> String {
        let quoted = config_file.display().to_string().replace('\\', "\\\\").replace('\'', "\\'");
        format!(
            "define('BASEPATH', dirname(__FILE__)); $config = array(); include '{quoted}'; echo json_encode($config);"
        )
    }

    /// Read `app_version` from the interpreter's JSON output.
    ///
    /// Accepts a string or a number; anything else counts as absent.
    #[must_use]
    pub fn parse_output(stdout: &str) -> Option<InstalledVersion> {
        let value: Value = serde_json::from_str(stdout.trim()).ok()?;
        match value.get("app_version")? {
            Value::String(s) if !s.is_empty() => Some(InstalledVersion::new(s.clone())),
            Value::Number(n) => Some(InstalledVersion::new(n.to_string())),
            _ => None,
        }
    }
}

impl VersionProbe for PhpProbe {
    fn name(&self) -> &str {
        "php"
    }

    fn probe<'a>(
        &'a self,
        config_file: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<InstalledVersion>> + Send + 'a>> {
        Box::pin(async move {
            let output = ToolCommand::new(self.php_binary.clone())
                .args(["-r".to_string(), Self::script(config_file)])
                .timeout(PHP_PROBE_TIMEOUT)
                .with_context("version probe")
                .execute()
                .await?;

            debug!("php printed {} bytes of configuration", output.stdout.len());

            Self::parse_output(&output.stdout).ok_or_else(|| {
                EeupError::VersionNotFound {
                    file: config_file.display().to_string(),
                }
                .into()
            })
        })
    }
}
