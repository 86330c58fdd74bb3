//! Core types for eeup
//!
//! Everything that can fail in eeup eventually reports through the types in
//! this module:
//! - **Strongly-typed errors** ([`EeupError`]) raised where the failure is
//!   detected, so a workflow can decide whether it is fatal for the whole run
//!   or only for the current add-on
//! - **User-friendly contexts** ([`ErrorContext`]) with a suggestion for the
//!   operator, rendered by `main` before exiting non-zero
//!
//! # Examples
//!
//! ```rust
//! use eeup_cli::core::{EeupError, user_friendly_error};
//! use anyhow::Result;
//!
//! fn example_operation() -> Result<String> {
//!     Err(EeupError::WorkflowNotSuspended.into())
//! }
//!
//! if let Err(e) = example_operation() {
//!     let friendly = user_friendly_error(e);
//!     assert!(friendly.to_string().contains("checkpoint"));
//! }
//! ```

pub mod error;

pub use error::{EeupError, ErrorContext, user_friendly_error};
