//! Installation settings loaded once per run.
//!
//! The settings file describes where the installation lives, where new
//! releases and add-on packages are unpacked, and how to reach the
//! database. It is read at startup and never mutated; every component
//! receives a reference to the same [`Settings`].
//!
//! # File Format
//!
//! JSON (the default `settings.json`) or TOML when the file ends in `.toml`:
//!
//! ```json
//! {
//!   "system": "system",
//!   "webroot": "public",
//!   "third_party": "system/expressionengine/third_party",
//!   "ee_path": "~/releases/ee-2.9.0",
//!   "ee_addons_path": "~/releases/addons",
//!   "db_name": "site",
//!   "db_username": "site",
//!   "db_password": "secret",
//!   "db_host": "localhost",
//!   "version_probe": "pattern"
//! }
//! ```
//!
//! Relative paths are resolved against the installation root. `ee_path` and
//! `ee_addons_path` may use `~` and `$VAR`.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::constants::{
    CACHE_DIR, CONFIG_DIR, CONFIG_FILE, DATABASE_FILE, INSTALLER_DIR, THIRD_PARTY_ASIDE_SUFFIX,
};
use crate::core::EeupError;

/// How the installed version is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeMode {
    /// Scan `config.php` for the `app_version` assignment.
    #[default]
    Pattern,
    /// Ask the PHP interpreter to evaluate `config.php` and print it as JSON.
    Php,
}

/// Immutable installation settings.
///
/// Construct with [`Settings::load`]; the installation root is recorded at
/// load time so every path accessor returns an absolute, resolved path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// System directory name, relative to the root (e.g. `system`).
    pub system: String,

    /// Public web root, relative to the root (e.g. `public`).
    pub webroot: String,

    /// Third-party add-on directory, relative to the root.
    pub third_party: String,

    /// Unpacked release to install from.
    pub ee_path: String,

    /// Directory holding one unpacked package per add-on.
    pub ee_addons_path: String,

    /// Database name.
    pub db_name: String,

    /// Database user.
    pub db_username: String,

    /// Database password.
    pub db_password: String,

    /// Database host.
    pub db_host: String,

    /// Version probing strategy.
    #[serde(default)]
    pub version_probe: ProbeMode,

    /// PHP interpreter used by [`ProbeMode::Php`].
    #[serde(default = "default_php_binary")]
    pub php_binary: String,

    /// Dump tool used for database backups.
    #[serde(default = "default_mysqldump_binary")]
    pub mysqldump_binary: String,

    #[serde(skip)]
    root: PathBuf,
}

fn default_php_binary() -> String {
    "php".to_string()
}

fn default_mysqldump_binary() -> String {
    "mysqldump".to_string()
}

impl Settings {
    /// Load settings from `path`, resolving relative paths against `root`.
    ///
    /// # Errors
    ///
    /// Returns [`EeupError::ConfigError`] if the file is absent, cannot be
    /// parsed, lacks a required key, or leaves a directory name empty.
    pub async fn load(root: &Path, path: &Path) -> Result<Self> {
        let shown = path.display().to_string();
        let config_error = |reason: String| EeupError::ConfigError {
            path: shown.clone(),
            reason,
        };

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| config_error(format!("cannot read file: {e}")))?;

        let is_toml = path.extension().is_some_and(|ext| ext == "toml");
        let mut settings: Self = if is_toml {
            toml::from_str(&content).map_err(|e| config_error(e.to_string()))?
        } else {
            serde_json::from_str(&content).map_err(|e| config_error(e.to_string()))?
        };

        for (key, value) in [
            ("system", &settings.system),
            ("webroot", &settings.webroot),
            ("third_party", &settings.third_party),
        ] {
            if value.trim().is_empty() {
                return Err(config_error(format!("'{key}' must not be empty")).into());
            }
        }

        settings.ee_path = expand(&settings.ee_path).map_err(config_error)?;
        settings.ee_addons_path = expand(&settings.ee_addons_path).map_err(config_error)?;
        settings.root = root.to_path_buf();

        debug!("Loaded settings from {} (root {})", shown, root.display());
        Ok(settings)
    }

    /// Installation root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Live system directory.
    pub fn system_dir(&self) -> PathBuf {
        self.root.join(&self.system)
    }

    /// Live web root.
    pub fn webroot_dir(&self) -> PathBuf {
        self.root.join(&self.webroot)
    }

    /// Live third-party add-on directory.
    pub fn third_party_dir(&self) -> PathBuf {
        self.root.join(&self.third_party)
    }

    /// Where the third-party directory is parked during an upgrade.
    pub fn third_party_aside_dir(&self) -> PathBuf {
        self.root.join(format!("{}{}", self.third_party, THIRD_PARTY_ASIDE_SUFFIX))
    }

    /// Unpacked release directory.
    pub fn release_dir(&self) -> PathBuf {
        self.root.join(&self.ee_path)
    }

    /// Add-on packages directory.
    pub fn addons_source_dir(&self) -> PathBuf {
        self.root.join(&self.ee_addons_path)
    }

    /// Live `config.php`.
    pub fn config_file(&self) -> PathBuf {
        self.system_dir().join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Live `database.php`.
    pub fn database_file(&self) -> PathBuf {
        self.system_dir().join(CONFIG_DIR).join(DATABASE_FILE)
    }

    /// Live cache directory.
    pub fn cache_dir(&self) -> PathBuf {
        self.system_dir().join(CACHE_DIR)
    }

    /// Installer directory left behind by a release.
    pub fn installer_dir(&self) -> PathBuf {
        self.system_dir().join(INSTALLER_DIR)
    }
}

fn expand(value: &str) -> std::result::Result<String, String> {
    shellexpand::full(value)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| format!("cannot expand '{value}': {e}"))
}
