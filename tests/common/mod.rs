//! Shared helpers for eeup integration tests

// Not every helper is used by every test file
#![allow(dead_code)]

use assert_cmd::Command;
use std::path::Path;

pub use eeup_cli::test_utils::{InstallationFixture, snapshot};

/// An `eeup` command rooted at `root`, with colours and ambient
/// configuration switched off.
pub fn eeup(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("eeup").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("EEUP_ROOT")
        .env("NO_COLOR", "1")
        .arg("--root")
        .arg(root);
    cmd
}

/// Read a file below `root` as a string.
pub fn read(root: &Path, relative: &str) -> String {
    std::fs::read_to_string(root.join(relative)).unwrap()
}
