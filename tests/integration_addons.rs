use predicates::prelude::*;

mod common;
use common::{InstallationFixture, eeup, read, snapshot};

/// An unknown add-on fails before anything is touched
#[tokio::test]
async fn test_update_unknown_addon() {
    let fixture = InstallationFixture::new().await.unwrap();
    let before = snapshot(fixture.root());

    eeup(fixture.root())
        .args(["update-addon", "--addon-name", "doesnotexist"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Could not find an add-on"));

    assert_eq!(snapshot(fixture.root()), before);
}

/// A near miss gets a suggestion
#[tokio::test]
async fn test_update_addon_suggestion() {
    let fixture = InstallationFixture::new().await.unwrap();

    eeup(fixture.root())
        .args(["update-addon", "--addon-name", "seo_lit", "--no-db-dump"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Did you mean 'seo_lite'"));
}

/// The add-on code and theme are replaced and the old ones backed up
#[tokio::test]
async fn test_update_single_addon() {
    let fixture = InstallationFixture::new().await.unwrap();
    let root = fixture.root();

    eeup(root)
        .args(["update-addon", "--addon-name", "seo_lite", "--no-db-dump"])
        .assert()
        .success()
        .stdout(predicate::str::contains("seo_lite updated"));

    let third_party = "system/expressionengine/third_party";
    assert_eq!(read(root, &format!("{third_party}/seo_lite/mod.seo_lite.php")), "seo_lite package");
    assert_eq!(read(root, "public/themes/third_party/seo_lite/seo.css"), "seo_lite theme package");
    assert_eq!(
        read(root, &format!("backups/290-before-update-seo_lite/{third_party}/seo_lite/mod.seo_lite.php")),
        "seo_lite installed"
    );
    assert_eq!(read(root, &format!("{third_party}/low_vars/mod.low_vars.php")), "low_vars installed");
}

/// Every add-on is updated when the operator keeps going
#[tokio::test]
async fn test_update_all_addons() {
    let fixture = InstallationFixture::new().await.unwrap();
    let root = fixture.root();

    eeup(root)
        .arg("update-addons")
        .write_stdin("y\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("low_vars updated"))
        .stdout(predicate::str::contains("seo_lite updated"));

    assert!(root.join("backups/290-before-update-low_vars").is_dir());
    assert!(root.join("backups/290-before-update-seo_lite").is_dir());
}

/// Aborting after the first add-on leaves the rest alone
#[tokio::test]
async fn test_update_addons_abort() {
    let fixture = InstallationFixture::new().await.unwrap();
    let root = fixture.root();

    eeup(root)
        .arg("update-addons")
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("low_vars updated"))
        .stdout(predicate::str::contains("Aborted"));

    assert_eq!(
        read(root, "system/expressionengine/third_party/seo_lite/mod.seo_lite.php"),
        "seo_lite installed"
    );
    assert!(!root.join("backups/290-before-update-seo_lite").exists());
}

/// An installed add-on without a package is reported and the others still run
#[tokio::test]
async fn test_update_addons_missing_package() {
    let fixture = InstallationFixture::new().await.unwrap();
    fixture.add_addon("matrix", false).await.unwrap();

    eeup(fixture.root())
        .args(["update-addons", "--yes"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("1 add-on(s) failed to update: matrix"));

    assert_eq!(
        read(fixture.root(), "system/expressionengine/third_party/seo_lite/mod.seo_lite.php"),
        "seo_lite package"
    );
}
