use predicates::prelude::*;

mod common;
use common::{InstallationFixture, eeup};

/// The installed version is read from config.php
#[tokio::test]
async fn test_info_prints_version() {
    let fixture = InstallationFixture::new().await.unwrap();

    eeup(fixture.root())
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains("Current EE version: 290"));
}

/// Without a system directory nothing can be probed
#[tokio::test]
async fn test_info_without_installation() {
    let fixture = InstallationFixture::empty().await.unwrap();

    eeup(fixture.root())
        .arg("info")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Could not find system directory"));
}

/// A missing settings file stops every command before any work starts
#[test]
fn test_missing_settings_file() {
    let temp = tempfile::TempDir::new().unwrap();

    eeup(temp.path())
        .arg("info")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Configuration error"))
        .stderr(predicate::str::contains("settings.json"));
}

/// An explicit settings path is resolved against the root
#[tokio::test]
async fn test_explicit_settings_path() {
    let fixture = InstallationFixture::new().await.unwrap();
    std::fs::rename(fixture.root().join("settings.json"), fixture.root().join("eeup.json")).unwrap();

    eeup(fixture.root())
        .args(["--settings", "eeup.json", "info"])
        .assert()
        .success()
        .stdout(predicate::str::contains("290"));
}

/// The version cannot be found when config.php has no app_version
#[tokio::test]
async fn test_info_without_version() {
    let fixture = InstallationFixture::new().await.unwrap();
    fixture.write("system/expressionengine/config/config.php", "<?php\n").await.unwrap();

    eeup(fixture.root())
        .arg("info")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not load app_version"));
}
