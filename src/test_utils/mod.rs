//! Test utilities for eeup
//!
//! This module provides helpers shared by unit tests and the integration
//! tests in `tests/`:
//! - [`InstallationFixture`]: a throwaway installation with a release and
//!   add-on packages next to it
//! - [`FixedProbe`] and [`RecordingDumper`]: stand-ins for the version probe
//!   and the database dump
//! - [`snapshot`]: a byte-level picture of a directory tree for
//!   "nothing changed" assertions
//!
//! # Example
//!
//! ```rust,no_run
//! use eeup_cli::test_utils::InstallationFixture;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let fixture = InstallationFixture::new().await?;
//! let settings = fixture.settings();
//! assert!(settings.system_dir().is_dir());
//! # Ok(())
//! # }
//! ```

pub mod fixtures;

pub use fixtures::{FixedProbe, InstallationFixture, RecordingDumper, snapshot};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Initializes the tracing subscriber once regardless of how many times it
/// is called. Uses `level` if given, otherwise `RUST_LOG`; with neither,
/// tests run without log output.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
