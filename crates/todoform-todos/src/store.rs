//! Todo persistence.
//!
//! [`TodoStore`] is the interface the actions talk to. [`MemoryTodoStore`]
//! keeps todos in process memory and is what the tests and examples use.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use todoform_core::{TodoformError, TodoformResult};

use crate::model::{Todo, TodoData, TodoPatch};

/// A backend that stores todos.
///
/// Operations addressing a missing id fail with
/// [`TodoformError::DoesNotExist`].
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Returns every todo ordered by ascending id.
    async fn list(&self) -> TodoformResult<Vec<Todo>>;

    /// Returns a todo by id.
    async fn get(&self, id: i64) -> TodoformResult<Todo>;

    /// Stores a new todo and returns it with its assigned id.
    async fn create(&self, data: TodoData) -> TodoformResult<Todo>;

    /// Applies a partial update to an existing todo and returns the result.
    /// Fields the patch leaves `None` keep their stored value.
    async fn update(&self, id: i64, patch: TodoPatch) -> TodoformResult<Todo>;

    /// Deletes a todo and returns it.
    async fn delete(&self, id: i64) -> TodoformResult<Todo>;
}

#[derive(Debug, Default)]
struct MemoryState {
    todos: BTreeMap<i64, Todo>,
    last_id: i64,
}

/// An in-memory todo store.
///
/// Ids are assigned sequentially from 1 and never reused.
#[derive(Debug, Default)]
pub struct MemoryTodoStore {
    state: RwLock<MemoryState>,
}

impl MemoryTodoStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn missing(id: i64) -> TodoformError {
    TodoformError::DoesNotExist(format!("Todo with id {id} does not exist"))
}

#[async_trait]
impl TodoStore for MemoryTodoStore {
    async fn list(&self) -> TodoformResult<Vec<Todo>> {
        let state = self.state.read().await;
        Ok(state.todos.values().cloned().collect())
    }

    async fn get(&self, id: i64) -> TodoformResult<Todo> {
        let state = self.state.read().await;
        state.todos.get(&id).cloned().ok_or_else(|| missing(id))
    }

    async fn create(&self, data: TodoData) -> TodoformResult<Todo> {
        let mut state = self.state.write().await;
        state.last_id += 1;
        let todo = data.into_todo(state.last_id);
        state.todos.insert(todo.id, todo.clone());
        Ok(todo)
    }

    async fn update(&self, id: i64, patch: TodoPatch) -> TodoformResult<Todo> {
        let mut state = self.state.write().await;
        let slot = state.todos.get_mut(&id).ok_or_else(|| missing(id))?;
        patch.apply(slot);
        Ok(slot.clone())
    }

    async fn delete(&self, id: i64) -> TodoformResult<Todo> {
        let mut state = self.state.write().await;
        state.todos.remove(&id).ok_or_else(|| missing(id))
    }
}
