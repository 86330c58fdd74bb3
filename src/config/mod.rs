//! Configuration loading for eeup.
//!
//! A single [`Settings`] value is read from the installation's settings file
//! at startup and passed by reference to every component. There is no
//! global configuration lookup.

mod settings;

pub use settings::{ProbeMode, Settings};

use crate::constants::DEFAULT_SETTINGS_FILE;
use std::path::{Path, PathBuf};

/// Resolve the settings file location.
///
/// An explicit path wins; relative explicit paths are taken relative to the
/// installation root. Without one, `settings.json` in the root is used.
///
/// # Examples
///
/// ```rust
/// use eeup_cli::config::settings_path;
/// use std::path::{Path, PathBuf};
///
/// let root = Path::new("/srv/site");
/// assert_eq!(settings_path(root, None), PathBuf::from("/srv/site/settings.json"));
/// assert_eq!(
///     settings_path(root, Some(Path::new("conf/eeup.toml"))),
///     PathBuf::from("/srv/site/conf/eeup.toml")
/// );
/// ```
#[must_use]
pub fn settings_path(root: &Path, explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(path) => root.join(path),
        None => root.join(DEFAULT_SETTINGS_FILE),
    }
}
