//! # todoform-core
//!
//! Core types, settings, and error types shared by the todoform crates.
//! This crate has no dependency on the other workspace crates.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`utils`] - Utility types (`MultiValueDict`)
//! - [`settings`] - Settings and global configuration
//! - [`settings_loader`] - Loading settings from TOML, JSON, and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;
pub mod utils;

// Re-export the most commonly used types at the crate root.
pub use error::{ErrorKind, TodoformError, TodoformResult, ValidationError};
pub use settings::{Settings, SETTINGS};
