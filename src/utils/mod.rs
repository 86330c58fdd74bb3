//! Utility modules shared across eeup.

pub mod fs;

pub use fs::{copy_dir, ensure_dir};
