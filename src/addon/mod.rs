//! Replacing one third-party add-on with a newer package.
//!
//! An add-on package is unpacked under `<ee_addons_path>/<name>/` with the
//! same layout as an installation:
//!
//! ```text
//! <ee_addons_path>/seo_lite/
//! ├── system/expressionengine/third_party/seo_lite/   # code
//! └── themes/third_party/seo_lite/                    # theme assets (optional)
//! ```
//!
//! [`AddonUpdater::update`] backs the installed files up, empties the
//! add-on's directories and copies the package in. There is no rollback:
//! a failure part way leaves the backup as the way back, and every copied
//! file is logged at debug level.

use anyhow::Result;
use std::path::PathBuf;
use strsim::levenshtein;
use tracing::info;

use crate::backup::BackupDirectory;
use crate::config::Settings;
use crate::constants::{ADDON_CODE_SUBPATH, ADDON_SUGGESTION_DISTANCE, ADDON_THEME_SUBPATH, THIRD_PARTY_THEMES_DIR};
use crate::core::EeupError;
use crate::utils::fs::{copy_dir, ensure_dir, list_subdirs, remove_dir_all};

/// Where one add-on's files come from and go to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddonDescriptor {
    /// Directory name of the add-on
    pub name: String,
    /// Package code directory
    pub code_source: PathBuf,
    /// Package theme directory (may not exist)
    pub theme_source: PathBuf,
    /// Installed code directory
    pub code_dir: PathBuf,
    /// Installed theme directory
    pub theme_dir: PathBuf,
}

impl AddonDescriptor {
    /// Derive every path for `name` from the settings.
    pub fn new(name: &str, settings: &Settings) -> Self {
        let package = settings.addons_source_dir().join(name);
        Self {
            name: name.to_string(),
            code_source: package.join(ADDON_CODE_SUBPATH).join(name),
            theme_source: package.join(ADDON_THEME_SUBPATH).join(name),
            code_dir: settings.third_party_dir().join(name),
            theme_dir: settings.webroot_dir().join(THIRD_PARTY_THEMES_DIR).join(name),
        }
    }

    /// Whether the package ships theme files.
    pub fn has_theme(&self) -> bool {
        self.theme_source.is_dir()
    }
}

/// What an add-on update did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddonUpdate {
    /// Add-on name
    pub name: String,
    /// Installed files copied into the backup
    pub backed_up: usize,
    /// Package code files copied in
    pub code_files: usize,
    /// Package theme files copied in, if the package has a theme
    pub theme_files: Option<usize>,
}

/// Validates and updates add-ons of one installation.
pub struct AddonUpdater<'a> {
    settings: &'a Settings,
}

impl<'a> AddonUpdater<'a> {
    /// Create an updater for the installation described by `settings`.
    pub const fn new(settings: &'a Settings) -> Self {
        Self {
            settings,
        }
    }

    /// Names of the installed add-ons (subdirectories of the third-party directory), sorted.
    pub fn installed(&self) -> Result<Vec<String>> {
        list_subdirs(&self.settings.third_party_dir())
    }

    /// Names of the available add-on packages, sorted.
    pub fn packages(&self) -> Result<Vec<String>> {
        list_subdirs(&self.settings.addons_source_dir())
    }

    /// Check that `name` is installed and has a package, without touching anything.
    ///
    /// # Errors
    ///
    /// [`EeupError::AddonNotFound`] naming the missing directory, with the
    /// closest existing name as a suggestion.
    pub fn validate(&self, name: &str) -> Result<AddonDescriptor> {
        let addon = AddonDescriptor::new(name, self.settings);

        if name.is_empty() || name.contains(['/', '\\']) || !addon.code_dir.is_dir() {
            return Err(EeupError::AddonNotFound {
                name: name.to_string(),
                path: addon.code_dir.display().to_string(),
                suggestion: closest(name, &self.installed()?),
            }
            .into());
        }

        if !addon.code_source.is_dir() {
            return Err(EeupError::AddonNotFound {
                name: name.to_string(),
                path: addon.code_source.display().to_string(),
                suggestion: closest(name, &self.packages()?),
            }
            .into());
        }

        Ok(addon)
    }

    /// Replace the add-on's installed files with its package, backing them up into `backup`.
    ///
    /// Code is backed up to `<backup>/<third_party>/<name>`, theme files to
    /// `<backup>/<webroot>/themes/third_party/<name>`.
    pub fn update(&self, addon: &AddonDescriptor, backup: &BackupDirectory) -> Result<AddonUpdate> {
        info!("Updating: {}", addon.name);

        let code_backup = backup.join(&self.settings.third_party).join(&addon.name);
        let (backed_up, code_files) = replace_dir(&addon.code_dir, &addon.code_source, &code_backup)?;

        let mut update = AddonUpdate {
            name: addon.name.clone(),
            backed_up,
            code_files,
            theme_files: None,
        };

        if addon.has_theme() {
            let theme_backup =
                backup.join(&self.settings.webroot).join(THIRD_PARTY_THEMES_DIR).join(&addon.name);
            let (backed_up, theme_files) =
                replace_dir(&addon.theme_dir, &addon.theme_source, &theme_backup)?;
            update.backed_up += backed_up;
            update.theme_files = Some(theme_files);
        }

        info!("{} updated OK!", addon.name);
        info!(
            "Check the website frontend and control panel. Backups are in {}",
            backup.path().display()
        );
        Ok(update)
    }
}

/// Back `target` up into `backup`, then replace its contents with `source`.
fn replace_dir(
    target: &std::path::Path,
    source: &std::path::Path,
    backup: &std::path::Path,
) -> Result<(usize, usize)> {
    let backed_up = if target.is_dir() {
        info!("Backing up {}", target.display());
        copy_dir(target, backup, "Backup")?
    } else {
        0
    };

    info!("Deleting {} ...", target.display());
    remove_dir_all(target)?;
    ensure_dir(target)?;

    info!("Copying {} to {} ...", source.display(), target.display());
    let copied = copy_dir(source, target, "Copy")?;
    Ok((backed_up, copied))
}

/// The candidate closest to `name`, if it is within the suggestion distance.
fn closest(name: &str, candidates: &[String]) -> Option<String> {
    candidates
        .iter()
        .map(|candidate| (levenshtein(name, candidate), candidate))
        .filter(|(distance, _)| *distance <= ADDON_SUGGESTION_DISTANCE)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, candidate)| candidate.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::BackupPlanner;
    use crate::test_utils::{InstallationFixture, snapshot};
    use crate::version::InstalledVersion;
    use std::fs;

    #[test]
    fn test_closest_suggestion() {
        let candidates = vec!["low_vars".to_string(), "seo_lite".to_string()];
        assert_eq!(closest("seo_lit", &candidates), Some("seo_lite".to_string()));
        assert_eq!(closest("doesnotexist", &candidates), None);
    }

    #[tokio::test]
    async fn test_validate_unknown_addon_touches_nothing() {
        let fixture = InstallationFixture::new().await.unwrap();
        let settings = fixture.settings();
        let before = snapshot(fixture.root());

        let err = AddonUpdater::new(&settings).validate("doesnotexist").unwrap_err();
        match err.downcast_ref::<EeupError>() {
            Some(EeupError::AddonNotFound { name, suggestion, .. }) => {
                assert_eq!(name, "doesnotexist");
                assert_eq!(suggestion, &None);
            }
            other => panic!("Expected AddonNotFound, got {other:?}"),
        }
        assert_eq!(snapshot(fixture.root()), before);
    }

    #[tokio::test]
    async fn test_validate_suggests_installed_name() {
        let fixture = InstallationFixture::new().await.unwrap();
        let settings = fixture.settings();

        let err = AddonUpdater::new(&settings).validate("seo_lit").unwrap_err();
        match err.downcast_ref::<EeupError>() {
            Some(EeupError::AddonNotFound { suggestion, .. }) => {
                assert_eq!(suggestion.as_deref(), Some("seo_lite"));
            }
            other => panic!("Expected AddonNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_validate_requires_package() {
        let fixture = InstallationFixture::new().await.unwrap();
        let settings = fixture.settings();
        fs::create_dir_all(settings.third_party_dir().join("orphan")).unwrap();

        let err = AddonUpdater::new(&settings).validate("orphan").unwrap_err();
        match err.downcast_ref::<EeupError>() {
            Some(EeupError::AddonNotFound { path, .. }) => assert!(path.contains("addons")),
            other => panic!("Expected AddonNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_replaces_code_and_theme() {
        let fixture = InstallationFixture::new().await.unwrap();
        let settings = fixture.settings();
        let updater = AddonUpdater::new(&settings);
        let addon = updater.validate("seo_lite").unwrap();

        // A file the new package no longer ships
        fs::write(addon.code_dir.join("obsolete.php"), "old").unwrap();

        let backup = BackupPlanner::new(&settings)
            .plan(&InstalledVersion::new("290"), Some("before-update-seo_lite"))
            .await
            .unwrap();
        let update = updater.update(&addon, &backup).unwrap();

        assert_eq!(update.theme_files, Some(1));
        assert_eq!(
            fs::read_to_string(addon.code_dir.join("mod.seo_lite.php")).unwrap(),
            "seo_lite package"
        );
        assert!(!addon.code_dir.join("obsolete.php").exists());
        assert_eq!(fs::read_to_string(addon.theme_dir.join("seo.css")).unwrap(), "seo_lite theme package");

        let code_backup = backup.join(&settings.third_party).join("seo_lite");
        assert_eq!(fs::read_to_string(code_backup.join("obsolete.php")).unwrap(), "old");
        let theme_backup = backup.join("public/themes/third_party/seo_lite");
        assert_eq!(fs::read_to_string(theme_backup.join("seo.css")).unwrap(), "seo_lite theme");
    }

    #[tokio::test]
    async fn test_backup_then_restore_is_byte_identical() {
        let fixture = InstallationFixture::new().await.unwrap();
        let settings = fixture.settings();
        let updater = AddonUpdater::new(&settings);
        let addon = updater.validate("seo_lite").unwrap();

        fs::create_dir_all(addon.code_dir.join("language/english")).unwrap();
        fs::write(addon.code_dir.join("language/english/lang.php"), [0u8, 159, 146, 150]).unwrap();
        let original = snapshot(&addon.code_dir);

        let backup = BackupPlanner::new(&settings)
            .plan(&InstalledVersion::new("290"), Some("before-update-seo_lite"))
            .await
            .unwrap();
        updater.update(&addon, &backup).unwrap();
        assert_ne!(snapshot(&addon.code_dir), original);

        // Restore by hand the way an operator would
        let code_backup = backup.join(&settings.third_party).join("seo_lite");
        remove_dir_all(&addon.code_dir).unwrap();
        copy_dir(&code_backup, &addon.code_dir, "Restore").unwrap();

        assert_eq!(snapshot(&addon.code_dir), original);
    }

    #[tokio::test]
    async fn test_update_without_theme_package() {
        let fixture = InstallationFixture::new().await.unwrap();
        let settings = fixture.settings();
        let updater = AddonUpdater::new(&settings);
        let addon = updater.validate("low_vars").unwrap();
        assert!(!addon.has_theme());

        let backup =
            BackupPlanner::new(&settings).plan(&InstalledVersion::new("290"), None).await.unwrap();
        let update = updater.update(&addon, &backup).unwrap();

        assert_eq!(update.theme_files, None);
        assert_eq!(update.code_files, 1);
    }
}
