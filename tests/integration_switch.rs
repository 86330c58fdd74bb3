use predicates::prelude::*;

mod common;
use common::{InstallationFixture, eeup, read, snapshot};

/// Without --target the backups are listed
#[tokio::test]
async fn test_switch_lists_backups() {
    let fixture = InstallationFixture::new().await.unwrap();

    eeup(fixture.root())
        .arg("switch")
        .assert()
        .success()
        .stdout(predicate::str::contains("No backups available"));

    fixture.write("backups/280/system/index.php", "old index").await.unwrap();
    eeup(fixture.root())
        .arg("switch")
        .assert()
        .success()
        .stdout(predicate::str::contains("280"));
}

/// Switching to the installed version changes nothing
#[tokio::test]
async fn test_switch_to_current_version() {
    let fixture = InstallationFixture::new().await.unwrap();
    let before = snapshot(fixture.root());

    eeup(fixture.root())
        .args(["switch", "--target", "290"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already installed"));

    assert_eq!(snapshot(fixture.root()), before);
}

/// An unknown target fails before the live installation is backed up
#[tokio::test]
async fn test_switch_to_unknown_backup() {
    let fixture = InstallationFixture::new().await.unwrap();
    let before = snapshot(fixture.root());

    eeup(fixture.root())
        .args(["switch", "--target", "999"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Backup '999' not found"));

    assert_eq!(snapshot(fixture.root()), before);
}

/// After an upgrade the previous version can be switched back in
#[tokio::test]
async fn test_switch_back_after_update() {
    let fixture = InstallationFixture::new().await.unwrap();
    let root = fixture.root();

    eeup(root).args(["update", "--yes", "--no-db-dump"]).assert().success();
    // What the browser upgrade would have done
    fixture
        .write("system/expressionengine/config/config.php", "<?php\n$config['app_version'] = '2100';\n")
        .await
        .unwrap();

    eeup(root)
        .args(["switch", "--target", "290", "--no-db-dump"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Switched to 290"));

    assert_eq!(read(root, "system/index.php"), "installed index");
    assert!(read(root, "system/expressionengine/config/config.php").contains("'290'"));
    assert_eq!(read(root, "backups/2100/system/index.php"), InstallationFixture::RELEASE_MARKER);

    eeup(root).arg("info").assert().success().stdout(predicate::str::contains("290"));
}

/// An add-on backup is not a full installation and is never switched to
#[tokio::test]
async fn test_switch_to_addon_backup() {
    let fixture = InstallationFixture::new().await.unwrap();
    let root = fixture.root();
    eeup(root)
        .args(["update-addon", "--addon-name", "seo_lite", "--no-db-dump"])
        .assert()
        .success();
    let before = snapshot(root);

    eeup(root)
        .args(["switch", "--target", "290-before-update-seo_lite", "--no-db-dump"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("does not contain a complete installation"));

    assert_eq!(snapshot(root), before);
    assert_eq!(read(root, "system/index.php"), "installed index");
}

/// Targets outside the backups directory are refused
#[tokio::test]
async fn test_switch_to_parent_directory() {
    let fixture = InstallationFixture::new().await.unwrap();
    let before = snapshot(fixture.root());

    eeup(fixture.root())
        .args(["switch", "--target", "..", "--no-db-dump"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Backup '..' not found"));

    assert_eq!(snapshot(fixture.root()), before);
}
