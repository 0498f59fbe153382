//! # todoform-todos
//!
//! The todo list built on the form pipeline: the [`Todo`] model, a
//! [`TodoStore`] with an in-memory implementation, a [`ContentFilter`] for
//! user-entered text, and the [`TodoActions`] that turn form submissions into
//! store operations.
//!
//! ## Modules
//!
//! - [`model`] - `Todo` and its editable fields
//! - [`store`] - Storage trait and in-memory backend
//! - [`filter`] - Word-list content filter
//! - [`actions`] - Load, create, update and delete actions

pub mod actions;
pub mod filter;
pub mod model;
pub mod store;

pub use actions::{fail, todo_schema, ActionFailure, ActionResult, TodoActions};
pub use filter::{ContentFilter, WordListFilter};
pub use model::{record_id, Todo, TodoData, TodoPatch};
pub use store::{MemoryTodoStore, TodoStore};
