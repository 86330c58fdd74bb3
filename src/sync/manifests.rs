//! The copy and rename manifests used by the workflows.
//!
//! Paths are absolute, built from [`Settings`] and the backup directory the
//! current run reserved. Glob sources escape the configured directory names
//! so a name containing `[` is matched literally.

use glob::Pattern;
use std::path::PathBuf;

use super::{CopyEntry, CopyManifest, RenameEntry, RenameManifest};
use crate::backup::BackupDirectory;
use crate::config::Settings;
use crate::constants::{CONFIG_DIR, CONFIG_FILE, CP_CSS_DIR, CP_OVERRIDE_FILES, DATABASE_FILE, THEMES_DIR};

/// `<dir>/**/*`, selecting everything below `dir`.
fn everything_under(dir: &str) -> String {
    format!("{}/**/*", Pattern::escape(dir.trim_end_matches('/')))
}

/// Move the live system directory and web root themes into the backup.
pub fn move_live_to_backup(settings: &Settings, backup: &BackupDirectory) -> RenameManifest {
    RenameManifest::new("live installation to backup")
        .with(RenameEntry::new(settings.system_dir(), backup.join(&settings.system)))
        .with(
            RenameEntry::new(
                settings.webroot_dir().join(THEMES_DIR),
                backup.join(&settings.webroot).join(THEMES_DIR),
            )
            .optional(),
        )
}

/// Copy a release over the (moved-away) installation, keeping the site's
/// configuration and third-party themes from the backup.
pub fn install_release(settings: &Settings, backup: &BackupDirectory) -> CopyManifest {
    let release = settings.release_dir();
    let backup_config = backup.join(&settings.system).join(CONFIG_DIR);
    let live_config = settings.system_dir().join(CONFIG_DIR);

    CopyManifest::new("release")
        .with(CopyEntry::glob(&release, everything_under(&settings.system), settings.root()))
        .with(CopyEntry::glob(&release, everything_under(THEMES_DIR), settings.webroot_dir()))
        .with(
            CopyEntry::glob(
                backup.join(&settings.webroot).join(THEMES_DIR),
                everything_under("third_party"),
                settings.webroot_dir().join(THEMES_DIR),
            )
            .optional(),
        )
        .with(CopyEntry::glob(&release, everything_under("images"), settings.webroot_dir()).optional())
        .with(CopyEntry::file(&backup_config, CONFIG_FILE, &live_config))
        .with(CopyEntry::file(&backup_config, DATABASE_FILE, &live_config))
}

/// Copy a release into an empty location.
pub fn install_new(settings: &Settings) -> CopyManifest {
    let release = settings.release_dir();

    CopyManifest::new("new installation")
        .with(CopyEntry::glob(&release, everything_under(&settings.system), settings.root()))
        .with(CopyEntry::glob(&release, everything_under(THEMES_DIR), settings.webroot_dir()))
        .with(CopyEntry::glob(&release, everything_under("images"), settings.webroot_dir()).optional())
        .with(CopyEntry::glob(&release, "*.php", settings.webroot_dir()).optional())
}

/// Copy a previously backed-up installation back into place.
///
/// The backup is restored as it is, including the third-party directory it
/// contains.
pub fn restore_backup_target(settings: &Settings, target: &BackupDirectory) -> CopyManifest {
    CopyManifest::new(format!("backup {}", target.label()))
        .with(CopyEntry::glob(target.path(), everything_under(&settings.system), settings.root()))
        .with(
            CopyEntry::glob(target.path(), everything_under(&settings.webroot), settings.root())
                .optional(),
        )
}

/// Copy customised control panel stylesheets from the backup.
pub fn restore_cp_overrides(settings: &Settings, backup: &BackupDirectory) -> CopyManifest {
    let from = backup.join(&settings.webroot).join(CP_CSS_DIR);
    let to = settings.webroot_dir().join(CP_CSS_DIR);

    CP_OVERRIDE_FILES.iter().fold(CopyManifest::new("control panel overrides"), |manifest, name| {
        manifest.with(CopyEntry::file(&from, *name, &to).optional())
    })
}

/// Copy the backed-up third-party add-ons into the live third-party directory.
pub fn restore_third_party(settings: &Settings, backup: &BackupDirectory) -> CopyManifest {
    CopyManifest::new("third-party add-ons").with(
        CopyEntry::glob(backup.join(&settings.third_party), "**/*", settings.third_party_dir())
            .optional(),
    )
}

/// Park the live third-party directory so the upgrade runs without add-ons.
pub fn set_aside_third_party(settings: &Settings) -> RenameManifest {
    RenameManifest::new("set third-party aside")
        .with(RenameEntry::new(settings.third_party_dir(), settings.third_party_aside_dir()).optional())
}

/// Undo [`set_aside_third_party`].
pub fn bring_back_third_party(settings: &Settings) -> RenameManifest {
    RenameManifest::new("bring third-party back")
        .with(RenameEntry::new(settings.third_party_aside_dir(), settings.third_party_dir()).optional())
}

/// Files whose permissions are reset after files are copied in, with their mode.
pub fn permission_targets(settings: &Settings) -> Vec<(PathBuf, u32)> {
    use crate::constants::{CACHE_DIR_MODE, CONFIG_FILE_MODE};

    vec![
        (settings.cache_dir(), CACHE_DIR_MODE),
        (settings.config_file(), CONFIG_FILE_MODE),
        (settings.database_file(), CONFIG_FILE_MODE),
    ]
}
