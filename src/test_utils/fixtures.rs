//! Installation fixtures and collaborator stand-ins.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::fs;
use walkdir::WalkDir;

use crate::backup::BackupDirectory;
use crate::config::Settings;
use crate::constants::DEFAULT_SETTINGS_FILE;
use crate::db::DatabaseDumper;
use crate::version::{InstalledVersion, VersionProbe};

/// Settings written by every fixture.
const SETTINGS_JSON: &str = r#"{
    "system": "system",
    "webroot": "public",
    "third_party": "system/expressionengine/third_party",
    "ee_path": "release",
    "ee_addons_path": "addons",
    "db_name": "site",
    "db_username": "site_user",
    "db_password": "site_password",
    "db_host": "localhost"
}"#;

/// A throwaway installation in a temporary directory.
///
/// ```text
/// <root>/
/// ├── settings.json
/// ├── system/                        # installed version 290 (not in `empty()`)
/// │   ├── index.php
/// │   └── expressionengine/
/// │       ├── cache/
/// │       ├── config/{config.php, database.php}
/// │       └── third_party/{low_vars, seo_lite}/
/// ├── public/                        # not in `empty()`
/// │   ├── index.php
/// │   └── themes/{site.css, third_party/seo_lite/seo.css}
/// ├── release/                       # version 2100
/// │   ├── index.php, admin.php
/// │   ├── images/logo.png
/// │   ├── themes/cp_themes/default/css/global.css
/// │   └── system/
/// │       ├── index.php
/// │       ├── installer/index.php
/// │       └── expressionengine/{cache/, config/, third_party/}
/// └── addons/                        # packages for low_vars and seo_lite
/// ```
pub struct InstallationFixture {
    temp_dir: TempDir,
    settings: Settings,
}

impl InstallationFixture {
    /// Content of `system/index.php` in the release.
    pub const RELEASE_MARKER: &'static str = "release 2100 index";

    /// Version recorded in the installed `config.php`.
    pub const INSTALLED_VERSION: &'static str = "290";

    /// Installation, release and add-on packages.
    pub async fn new() -> Result<Self> {
        let fixture = Self::empty().await?;
        fixture.write_installation().await?;
        Ok(fixture)
    }

    /// Release and add-on packages, but no installation.
    pub async fn empty() -> Result<Self> {
        super::init_test_logging(None);

        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().to_path_buf();
        let settings_path = root.join(DEFAULT_SETTINGS_FILE);
        fs::write(&settings_path, SETTINGS_JSON).await?;

        let settings = Settings::load(&root, &settings_path).await?;
        let fixture = Self {
            temp_dir,
            settings,
        };
        fixture.write_release().await?;
        fixture.write_package("seo_lite", true).await?;
        fixture.write_package("low_vars", false).await?;
        Ok(fixture)
    }

    /// Installation root.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Settings anchored at the fixture root.
    pub fn settings(&self) -> Settings {
        self.settings.clone()
    }

    /// Write `content` to `relative` below the root, creating parents.
    pub async fn write(&self, relative: impl AsRef<Path>, content: impl AsRef<[u8]>) -> Result<PathBuf> {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, content).await.with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }

    /// Install an add-on and, if `packaged`, provide a package for it.
    pub async fn add_addon(&self, name: &str, packaged: bool) -> Result<()> {
        self.write(
            format!("system/expressionengine/third_party/{name}/mod.{name}.php"),
            format!("{name} installed"),
        )
        .await?;
        if packaged {
            self.write_package(name, false).await?;
        }
        Ok(())
    }

    async fn write_installation(&self) -> Result<()> {
        self.write("system/index.php", "installed index").await?;
        self.write(
            "system/expressionengine/config/config.php",
            format!(
                "<?php\n$config['site_label'] = 'Demo';\n$config['app_version'] = '{}';\n",
                Self::INSTALLED_VERSION
            ),
        )
        .await?;
        self.write("system/expressionengine/config/database.php", "<?php // site database\n")
            .await?;
        fs::create_dir_all(self.root().join("system/expressionengine/cache")).await?;
        self.write(
            "system/expressionengine/third_party/seo_lite/mod.seo_lite.php",
            "seo_lite installed",
        )
        .await?;
        self.write(
            "system/expressionengine/third_party/low_vars/mod.low_vars.php",
            "low_vars installed",
        )
        .await?;
        self.write("public/index.php", "public index").await?;
        self.write("public/themes/site.css", "site css").await?;
        self.write("public/themes/third_party/seo_lite/seo.css", "seo_lite theme").await?;
        Ok(())
    }

    async fn write_release(&self) -> Result<()> {
        self.write("release/index.php", "release entry").await?;
        self.write("release/admin.php", "release admin").await?;
        self.write("release/images/logo.png", [137u8, 80, 78, 71]).await?;
        self.write("release/themes/cp_themes/default/css/global.css", "release cp css").await?;
        self.write("release/system/index.php", Self::RELEASE_MARKER).await?;
        self.write("release/system/installer/index.php", "installer").await?;
        self.write(
            "release/system/expressionengine/config/config.php",
            "<?php\n$config['app_version'] = '2100';\n",
        )
        .await?;
        self.write("release/system/expressionengine/config/database.php", "<?php // default\n")
            .await?;
        self.write("release/system/expressionengine/cache/index.html", "").await?;
        self.write("release/system/expressionengine/third_party/index.html", "").await?;
        Ok(())
    }

    async fn write_package(&self, name: &str, with_theme: bool) -> Result<()> {
        self.write(
            format!("addons/{name}/system/expressionengine/third_party/{name}/mod.{name}.php"),
            format!("{name} package"),
        )
        .await?;
        if with_theme {
            self.write(
                format!("addons/{name}/themes/third_party/{name}/seo.css"),
                format!("{name} theme package"),
            )
            .await?;
        }
        Ok(())
    }
}

/// Every file below `root` with its content, keyed by relative path.
///
/// Directories appear with empty content so empty directories count too.
pub fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    let mut files = BTreeMap::new();
    for entry in WalkDir::new(root).min_depth(1).into_iter().filter_map(std::result::Result::ok) {
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path()).to_path_buf();
        let content = if entry.file_type().is_file() {
            std::fs::read(entry.path()).unwrap_or_default()
        } else {
            Vec::new()
        };
        files.insert(relative, content);
    }
    files
}

/// A version probe that always reports the same version.
pub struct FixedProbe(pub &'static str);

impl VersionProbe for FixedProbe {
    fn name(&self) -> &str {
        "fixed"
    }

    fn probe<'a>(
        &'a self,
        _config_file: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<InstalledVersion>> + Send + 'a>> {
        Box::pin(async move { Ok(InstalledVersion::new(self.0)) })
    }
}

/// A database dumper that writes a placeholder dump and remembers every call.
#[derive(Clone, Default)]
pub struct RecordingDumper {
    dumps: Arc<Mutex<Vec<PathBuf>>>,
}

impl RecordingDumper {
    /// Dump files written so far.
    pub fn dumps(&self) -> Vec<PathBuf> {
        self.dumps.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

impl DatabaseDumper for RecordingDumper {
    fn dump<'a>(
        &'a self,
        backup: &'a BackupDirectory,
    ) -> Pin<Box<dyn Future<Output = Result<PathBuf>> + Send + 'a>> {
        Box::pin(async move {
            let dump_file = backup.db_dir().join("site.sql");
            fs::write(&dump_file, "-- dump").await?;
            if let Ok(mut dumps) = self.dumps.lock() {
                dumps.push(dump_file.clone());
            }
            Ok(dump_file)
        })
    }
}
