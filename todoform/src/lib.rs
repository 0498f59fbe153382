//! # todoform
//!
//! Turns browser form submissions into validated, typed data.
//!
//! This is the meta-crate that re-exports the workspace crates. Depend on
//! `todoform` for everything, or on individual crates for finer-grained
//! control.
//!
//! ```
//! use std::sync::Arc;
//!
//! use todoform::core::Settings;
//! use todoform::forms::FormData;
//! use todoform::todos::{MemoryTodoStore, TodoActions};
//!
//! let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! rt.block_on(async {
//!     let actions =
//!         TodoActions::from_settings(Arc::new(MemoryTodoStore::new()), &Settings::default())
//!             .unwrap();
//!
//!     let created = actions
//!         .create(&FormData::parse_urlencoded("title=Water+plants"))
//!         .await
//!         .unwrap();
//!     assert!(created.is_success());
//!
//!     let rejected = actions
//!         .create(&FormData::parse_urlencoded("title="))
//!         .await
//!         .unwrap();
//!     assert_eq!(rejected.status(), 400);
//! });
//! ```

/// Settings, logging, and error types.
pub use todoform_core as core;

/// Form parsing, casting, and schema validation.
pub use todoform_forms as forms;

/// The todo model, store, content filter, and actions.
#[cfg(feature = "todos")]
pub use todoform_todos as todos;

/// Third-party crates the public API exposes.
pub use async_trait;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tracing;
