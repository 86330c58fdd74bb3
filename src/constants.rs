//! Global constants used throughout the eeup codebase.
//!
//! This module contains timeout durations, default file names, and the
//! fixed layout fragments of an ExpressionEngine installation. Defining
//! them centrally keeps the manifests and the add-on updater in agreement
//! about where things live.

use std::time::Duration;

/// Default settings file name, looked up in the installation root.
pub const DEFAULT_SETTINGS_FILE: &str = "settings.json";

/// Directory (relative to the installation root) holding every backup.
pub const BACKUPS_DIR: &str = "backups";

/// Metadata record written into each new backup directory.
pub const BACKUP_RECORD_FILE: &str = "backup.toml";

/// Subdirectory of a backup that receives the database dump.
pub const BACKUP_DB_DIR: &str = "db";

/// Application directory inside the system directory.
pub const APP_DIR: &str = "expressionengine";

/// Config directory relative to the system directory.
pub const CONFIG_DIR: &str = "expressionengine/config";

/// Cache directory relative to the system directory.
pub const CACHE_DIR: &str = "expressionengine/cache";

/// Main configuration file name.
pub const CONFIG_FILE: &str = "config.php";

/// Database configuration file name.
pub const DATABASE_FILE: &str = "database.php";

/// Installer directory relative to the system directory, removed after an upgrade.
pub const INSTALLER_DIR: &str = "installer";

/// Themes directory inside the web root.
pub const THEMES_DIR: &str = "themes";

/// Third-party themes directory relative to the web root.
pub const THIRD_PARTY_THEMES_DIR: &str = "themes/third_party";

/// Control panel stylesheet directory relative to the web root.
pub const CP_CSS_DIR: &str = "themes/cp_themes/default/css";

/// Control panel stylesheets that operators customise and that survive an upgrade.
pub const CP_OVERRIDE_FILES: [&str; 2] = ["override.css", "login.css"];

/// Suffix appended to the third-party directory while it is set aside.
pub const THIRD_PARTY_ASIDE_SUFFIX: &str = "-renamed_while_updating";

/// Where an add-on package keeps its code, relative to `<ee_addons_path>/<name>`.
pub const ADDON_CODE_SUBPATH: &str = "system/expressionengine/third_party";

/// Where an add-on package keeps its theme assets, relative to `<ee_addons_path>/<name>`.
pub const ADDON_THEME_SUBPATH: &str = "themes/third_party";

/// Unix mode applied to the cache directory.
pub const CACHE_DIR_MODE: u32 = 0o777;

/// Unix mode applied to `config.php` and `database.php`.
pub const CONFIG_FILE_MODE: u32 = 0o666;

/// Timeout for evaluating the configuration through the PHP interpreter (30 seconds).
pub const PHP_PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for a database dump (30 minutes).
///
/// Large sites can take a while; a hung connection must still end the run.
pub const DB_DUMP_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Maximum edit distance for "did you mean" add-on suggestions.
pub const ADDON_SUGGESTION_DISTANCE: usize = 3;
