//! eeup - ExpressionEngine upgrade tool
//!
//! eeup installs, upgrades and rolls back an ExpressionEngine installation
//! and its third-party add-ons. Every mutating run first moves the live
//! files into a versioned backup below `<root>/backups`, so a bad upgrade
//! can be undone with `eeup switch`.
//!
//! # Architecture Overview
//!
//! A run is a [`workflow::Workflow`]: an ordered list of steps executed by a
//! [`workflow::WorkflowRunner`]. The runner stops at checkpoints (for the
//! browser upgrade, and between add-ons of a bulk update) and the CLI
//! resumes it with the operator's answer.
//!
//! - **Settings** ([`config`]): the installation layout and database
//!   credentials, read once from `settings.json`
//! - **Version probing** ([`version`]): reads `app_version` from `config.php`
//! - **Backups** ([`backup`]): reserves `backups/<version>[_<suffix>][_<n>]`
//! - **Database dump** ([`db`]): `mysqldump` into the backup
//! - **File sync** ([`sync`]): declarative copy and rename manifests
//! - **Add-ons** ([`addon`]): replaces add-ons from their packages
//!
//! # Settings File
//!
//! ```json
//! {
//!     "system": "system",
//!     "webroot": "public_html",
//!     "third_party": "system/expressionengine/third_party",
//!     "ee_path": "~/downloads/ExpressionEngine2.10.0",
//!     "ee_addons_path": "~/downloads/addons",
//!     "db_name": "site",
//!     "db_username": "site",
//!     "db_password": "secret",
//!     "db_host": "localhost"
//! }
//! ```
//!
//! # Command-Line Usage
//!
//! ```bash
//! eeup info
//! eeup update
//! eeup update-addon --addon-name seo_lite
//! eeup update-addons
//! eeup switch --target 290
//! eeup clean
//! ```

// Entry points
pub mod cli;
pub mod workflow;

// Configuration and shared definitions
pub mod config;
pub mod constants;
pub mod core;

// Operations on an installation
pub mod addon;
pub mod backup;
pub mod db;
pub mod sync;
pub mod version;

// Supporting modules
pub mod pattern;
pub mod process;
pub mod utils;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
