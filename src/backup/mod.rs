//! Backup directory planning.
//!
//! Every workflow that mutates the installation first reserves a fresh
//! directory under `backups/`. The planner composes its name from the
//! installed version and an optional suffix, picks `_1`, `_2`, ... when the
//! name is taken, and creates the scaffold the later phases copy into:
//!
//! ```text
//! backups/
//! └── 290-before-update-seo_lite/
//!     ├── backup.toml          # label, version, reason, creation time
//!     ├── db/                  # database dump
//!     ├── public/              # <webroot> mirror
//!     └── system/expressionengine/third_party/   # <third_party> mirror
//! ```
//!
//! An existing backup directory is never reused or overwritten.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::constants::{BACKUP_DB_DIR, BACKUP_RECORD_FILE, BACKUPS_DIR};
use crate::core::EeupError;
use crate::utils::fs::list_subdirs;
use crate::version::InstalledVersion;

/// A backup directory that exists on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupDirectory {
    label: String,
    path: PathBuf,
}

impl BackupDirectory {
    /// Directory name below `backups/`, e.g. `290_1`.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Absolute path of the backup.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where the database dump goes.
    pub fn db_dir(&self) -> PathBuf {
        self.path.join(BACKUP_DB_DIR)
    }

    /// A path inside the backup, mirroring `relative` in the live installation.
    pub fn join(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.path.join(relative)
    }
}

/// Metadata written to `backup.toml` in every new backup directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupRecord {
    /// Directory name of the backup
    pub label: String,
    /// Installed version at the time of the backup
    pub version: String,
    /// Why the backup was taken (the label suffix), if anything beyond a version backup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// When the directory was created
    pub created_at: DateTime<Utc>,
}

/// Reserves and creates backup directories below `<root>/backups`.
pub struct BackupPlanner<'a> {
    settings: &'a Settings,
}

impl<'a> BackupPlanner<'a> {
    /// Create a planner for the installation described by `settings`.
    pub const fn new(settings: &'a Settings) -> Self {
        Self {
            settings,
        }
    }

    /// The directory holding every backup.
    pub fn backups_dir(&self) -> PathBuf {
        self.settings.root().join(BACKUPS_DIR)
    }

    /// Reserve and create a new backup directory.
    ///
    /// The name is `<version>` or `<version>-<suffix>`; if that exists the
    /// first free `_N` variant is used instead.
    ///
    /// # Errors
    ///
    /// - [`EeupError::MissingInstallation`] if the system directory does not
    ///   exist; nothing is created in that case
    /// - [`EeupError::BackupNotReady`] if any part of the scaffold cannot be
    ///   created. Directories created before the failure stay on disk.
    pub async fn plan(
        &self,
        version: &InstalledVersion,
        suffix: Option<&str>,
    ) -> Result<BackupDirectory> {
        let system_dir = self.settings.system_dir();
        if !system_dir.is_dir() {
            return Err(EeupError::MissingInstallation {
                path: system_dir.display().to_string(),
            }
            .into());
        }

        let base_label = compose_label(version.as_str(), suffix);
        let backups_dir = self.backups_dir();
        let label = next_free_label(&backups_dir, &base_label);
        if label != base_label {
            warn!("Directory {base_label}/ already existed - chose {label}/ instead");
        }

        let path = backups_dir.join(&label);
        for dir in [
            path.clone(),
            path.join(BACKUP_DB_DIR),
            path.join(&self.settings.webroot),
            path.join(&self.settings.third_party),
        ] {
            fs::create_dir_all(&dir).await.map_err(|e| EeupError::BackupNotReady {
                path: dir.display().to_string(),
                reason: e.to_string(),
            })?;
        }

        let record = BackupRecord {
            label: label.clone(),
            version: version.to_string(),
            reason: suffix.map(str::to_string),
            created_at: Utc::now(),
        };
        write_record(&path, &record).await.map_err(|e| EeupError::BackupNotReady {
            path: path.join(BACKUP_RECORD_FILE).display().to_string(),
            reason: format!("{e:#}"),
        })?;

        info!("Backup directory ready: {}", path.display());
        Ok(BackupDirectory {
            label,
            path,
        })
    }

    /// Names of all existing backups, sorted.
    pub fn list_backups(&self) -> Result<Vec<String>> {
        list_subdirs(&self.backups_dir())
    }

    /// Look up an existing backup by label.
    ///
    /// # Errors
    ///
    /// [`EeupError::BackupNotFound`] listing the labels that do exist.
    pub fn resolve(&self, label: &str) -> Result<BackupDirectory> {
        let path = self.backups_dir().join(label);
        let plain = !matches!(label, "" | "." | "..") && !label.contains(['/', '\\']);
        if plain && path.is_dir() {
            return Ok(BackupDirectory {
                label: label.to_string(),
                path,
            });
        }

        Err(EeupError::BackupNotFound {
            label: label.to_string(),
            available: self.list_backups()?,
        }
        .into())
    }

    /// Read the metadata record of a backup, if it has one.
    ///
    /// Backups made by hand or by older tooling have no record.
    pub async fn read_record(&self, backup: &BackupDirectory) -> Result<Option<BackupRecord>> {
        let path = backup.join(BACKUP_RECORD_FILE);
        if !path.is_file() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let record = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(record))
    }
}

/// `<base>` or `<base>-<suffix>`.
fn compose_label(base: &str, suffix: Option<&str>) -> String {
    match suffix {
        Some(suffix) if !suffix.is_empty() => format!("{base}-{suffix}"),
        _ => base.to_string(),
    }
}

/// First of `label`, `label_1`, `label_2`, ... that does not exist in `dir`.
fn next_free_label(dir: &Path, label: &str) -> String {
    if !dir.join(label).exists() {
        return label.to_string();
    }

    let mut index = 1;
    loop {
        let candidate = format!("{label}_{index}");
        if !dir.join(&candidate).exists() {
            return candidate;
        }
        index += 1;
    }
}

async fn write_record(dir: &Path, record: &BackupRecord) -> Result<()> {
    let content = toml::to_string_pretty(record).context("Failed to serialize backup record")?;
    let path = dir.join(BACKUP_RECORD_FILE);
    fs::write(&path, content).await.with_context(|| format!("Failed to write {}", path.display()))?;
    debug!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::InstallationFixture;

    #[tokio::test]
    async fn test_plan_creates_scaffold_and_record() {
        let fixture = InstallationFixture::new().await.unwrap();
        let settings = fixture.settings();
        let planner = BackupPlanner::new(&settings);

        let backup = planner.plan(&InstalledVersion::new("290"), None).await.unwrap();

        assert_eq!(backup.label(), "290");
        assert!(backup.db_dir().is_dir());
        assert!(backup.join(&settings.webroot).is_dir());
        assert!(backup.join(&settings.third_party).is_dir());

        let record = planner.read_record(&backup).await.unwrap().unwrap();
        assert_eq!(record.label, "290");
        assert_eq!(record.version, "290");
        assert_eq!(record.reason, None);
    }

    #[tokio::test]
    async fn test_repeated_planning_never_reuses_a_directory() {
        let fixture = InstallationFixture::new().await.unwrap();
        let settings = fixture.settings();
        let planner = BackupPlanner::new(&settings);
        let version = InstalledVersion::new("290");

        let first = planner.plan(&version, None).await.unwrap();
        std::fs::write(first.db_dir().join("site.sql"), "dump one").unwrap();

        let second = planner.plan(&version, None).await.unwrap();
        let third = planner.plan(&version, None).await.unwrap();

        assert_eq!(first.label(), "290");
        assert_eq!(second.label(), "290_1");
        assert_eq!(third.label(), "290_2");
        assert_eq!(
            std::fs::read_to_string(first.db_dir().join("site.sql")).unwrap(),
            "dump one"
        );
        assert_eq!(planner.list_backups().unwrap(), vec!["290", "290_1", "290_2"]);
    }

    #[tokio::test]
    async fn test_suffix_is_appended_and_recorded() {
        let fixture = InstallationFixture::new().await.unwrap();
        let settings = fixture.settings();
        let planner = BackupPlanner::new(&settings);

        let backup = planner
            .plan(&InstalledVersion::new("290"), Some("before-update-seo_lite"))
            .await
            .unwrap();
        assert_eq!(backup.label(), "290-before-update-seo_lite");

        let record = planner.read_record(&backup).await.unwrap().unwrap();
        assert_eq!(record.reason.as_deref(), Some("before-update-seo_lite"));
    }

    #[tokio::test]
    async fn test_missing_installation_creates_nothing() {
        let fixture = InstallationFixture::empty().await.unwrap();
        let settings = fixture.settings();
        let planner = BackupPlanner::new(&settings);

        let err = planner.plan(&InstalledVersion::new("290"), None).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EeupError>(),
            Some(EeupError::MissingInstallation { .. })
        ));
        assert!(!planner.backups_dir().exists());
    }

    #[tokio::test]
    async fn test_blocked_backups_dir_is_not_ready() {
        let fixture = InstallationFixture::new().await.unwrap();
        let settings = fixture.settings();
        let planner = BackupPlanner::new(&settings);

        // A file where the backups directory should be
        std::fs::write(planner.backups_dir(), "not a directory").unwrap();

        let err = planner.plan(&InstalledVersion::new("290"), None).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<EeupError>(), Some(EeupError::BackupNotReady { .. })));
    }

    #[tokio::test]
    async fn test_resolve_unknown_lists_available() {
        let fixture = InstallationFixture::new().await.unwrap();
        let settings = fixture.settings();
        let planner = BackupPlanner::new(&settings);
        planner.plan(&InstalledVersion::new("280"), None).await.unwrap();

        assert_eq!(planner.resolve("280").unwrap().label(), "280");

        let err = planner.resolve("999").unwrap_err();
        match err.downcast_ref::<EeupError>() {
            Some(EeupError::BackupNotFound { available, .. }) => {
                assert_eq!(available, &vec!["280".to_string()]);
            }
            other => panic!("Expected BackupNotFound, got {other:?}"),
        }
        assert!(planner.resolve("../280").is_err());
    }

    #[tokio::test]
    async fn test_resolve_rejects_dot_labels() {
        let fixture = InstallationFixture::new().await.unwrap();
        let settings = fixture.settings();
        fixture.write("backups/280/system/index.php", "old").await.unwrap();
        let planner = BackupPlanner::new(&settings);

        for label in [".", ".."] {
            let err = planner.resolve(label).unwrap_err();
            assert!(
                matches!(err.downcast_ref::<EeupError>(), Some(EeupError::BackupNotFound { .. })),
                "{label} resolved"
            );
        }
    }

    #[test]
    fn test_compose_label() {
        assert_eq!(compose_label("290", None), "290");
        assert_eq!(compose_label("290", Some("")), "290");
        assert_eq!(compose_label("290", Some("x")), "290-x");
    }
}
