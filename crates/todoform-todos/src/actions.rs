//! Form actions for the todo list page.
//!
//! Each action takes a raw [`FormData`] submission, casts and validates it,
//! and answers with an [`ActionResult`]: a JSON payload on success, or an
//! [`ActionFailure`] carrying an HTTP status and optional data.
//!
//! | Action   | Success payload       | Failures                                  |
//! |----------|-----------------------|-------------------------------------------|
//! | `create` | the created todo      | 400 with `{"errors"}`                     |
//! | `update` | the updated todo      | 400 with `{"id", "errors"}`, 404          |
//! | `delete` | `{"success": true}`   | 404                                       |
//!
//! Unexpected failures (a broken schema, a failing store) are returned as
//! `Err` rather than as a failed action.

use std::fmt;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::Instrument;

use todoform_core::logging::action_span;
use todoform_core::{Settings, TodoformError, TodoformResult};
use todoform_forms::{
    cast_form_data, validate_record, CastHint, CastHints, FieldSchema, FormData, FormResult,
    FormValue, Schema,
};

use crate::filter::{ContentFilter, WordListFilter};
use crate::model::{record_id, Todo, TodoData, TodoPatch};
use crate::store::TodoStore;

/// A failed action: an HTTP status plus optional data for the page.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionFailure {
    /// The HTTP status code.
    pub status: u16,
    /// Data returned to the page, typically the field errors.
    pub data: Option<Value>,
}

/// The outcome of a form action.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult {
    /// The action succeeded with a payload.
    Success(Value),
    /// The action failed.
    Failure(ActionFailure),
}

impl ActionResult {
    /// Returns `true` for a successful action.
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns the HTTP status: 200 on success, the failure status otherwise.
    pub const fn status(&self) -> u16 {
        match self {
            Self::Success(_) => 200,
            Self::Failure(failure) => failure.status,
        }
    }

    /// Returns the payload of a success or the data of a failure.
    pub const fn data(&self) -> Option<&Value> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure(failure) => failure.data.as_ref(),
        }
    }
}

/// Builds a failed action.
pub fn fail(status: u16, data: Option<Value>) -> ActionResult {
    ActionResult::Failure(ActionFailure { status, data })
}

/// The schema todos are created and updated with: a required `title`.
pub fn todo_schema() -> Schema {
    Schema::object().field("title", FieldSchema::string().required())
}

/// The create, update, delete and load actions over a [`TodoStore`].
///
/// Titles and descriptions are cleaned by a [`ContentFilter`] before they
/// are stored.
pub struct TodoActions {
    store: Arc<dyn TodoStore>,
    filter: Arc<dyn ContentFilter>,
    schema: Schema,
    strict_casting: bool,
}

impl fmt::Debug for TodoActions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TodoActions")
            .field("filter", &self.filter)
            .field("schema", &self.schema)
            .field("strict_casting", &self.strict_casting)
            .finish_non_exhaustive()
    }
}

impl TodoActions {
    /// Creates actions over a store and a content filter, using
    /// [`todo_schema`].
    pub fn new(store: Arc<dyn TodoStore>, filter: Arc<dyn ContentFilter>) -> Self {
        Self {
            store,
            filter,
            schema: todo_schema(),
            strict_casting: false,
        }
    }

    /// Creates actions configured from settings: the word-list filter from
    /// `profanity` and the casting mode from `forms.strict_casting`.
    pub fn from_settings(store: Arc<dyn TodoStore>, settings: &Settings) -> TodoformResult<Self> {
        let filter = WordListFilter::from_settings(&settings.profanity)?;
        Ok(Self::new(store, Arc::new(filter)).strict_casting(settings.forms.strict_casting))
    }

    /// Replaces the validation schema.
    #[must_use]
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    /// Casts unhinted fields as text instead of inferring numbers. `id` is
    /// then hinted as a number and `done` as a boolean.
    #[must_use]
    pub const fn strict_casting(mut self, strict: bool) -> Self {
        self.strict_casting = strict;
        self
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Arc<dyn TodoStore> {
        &self.store
    }

    /// Returns every todo ordered by id.
    pub async fn load(&self) -> TodoformResult<Vec<Todo>> {
        self.store.list().instrument(action_span("load")).await
    }

    /// Creates a todo from a submission.
    pub async fn create(&self, form: &FormData) -> TodoformResult<ActionResult> {
        self.run_create(form).instrument(action_span("create")).await
    }

    /// Updates the todo named by the submission's `id`.
    ///
    /// Only submitted fields change, except `done`, which an unchecked
    /// checkbox omits and so is reset to `false`.
    pub async fn update(&self, form: &FormData) -> TodoformResult<ActionResult> {
        self.run_update(form).instrument(action_span("update")).await
    }

    /// Deletes the todo named by the submission's `id`.
    ///
    /// Only a missing todo ([`TodoformError::DoesNotExist`]) answers 404;
    /// any other store failure is returned as `Err`.
    pub async fn delete(&self, form: &FormData) -> TodoformResult<ActionResult> {
        self.run_delete(form).instrument(action_span("delete")).await
    }

    async fn run_create(&self, form: &FormData) -> TodoformResult<ActionResult> {
        let record = cast_form_data(form, self.hints(true).as_ref());

        let valid = match validate_record(&record, &self.schema).await? {
            FormResult::Ok(valid) => valid,
            FormResult::Error(errors) => {
                tracing::debug!(fields = errors.len(), "Rejected new todo");
                let errors = serde_json::to_value(&errors)?;
                return Ok(fail(400, Some(json!({ "errors": errors }))));
            }
        };

        let mut data = TodoData::from_record(&valid);
        data.title = self.clean_text(&data.title);
        data.description = data.description.map(|d| self.clean_text(&d));

        let todo = self.store.create(data).await?;
        tracing::debug!(id = todo.id, "Created todo");
        Ok(ActionResult::Success(serde_json::to_value(&todo)?))
    }

    async fn run_update(&self, form: &FormData) -> TodoformResult<ActionResult> {
        let record = cast_form_data(form, self.hints(true).as_ref());

        let mut valid = match validate_record(&record, &self.schema).await? {
            FormResult::Ok(valid) => valid,
            FormResult::Error(errors) => {
                tracing::debug!(fields = errors.len(), "Rejected todo update");
                let id = record.get("id").map_or(Value::Null, FormValue::to_json);
                let errors = serde_json::to_value(&errors)?;
                return Ok(fail(400, Some(json!({ "id": id, "errors": errors }))));
            }
        };

        // An unchecked checkbox is not submitted at all.
        if !valid.get("done").is_some_and(FormValue::is_truthy) {
            valid.insert("done", false);
        }

        let Some(id) = record_id(&record) else {
            tracing::debug!("Update without a usable id");
            return Ok(fail(404, None));
        };

        let mut patch = TodoPatch::from_record(&valid);
        patch.title = patch.title.map(|t| self.clean_text(&t));
        patch.description = patch.description.map(|d| self.clean_text(&d));

        match self.store.update(id, patch).await {
            Ok(todo) => {
                tracing::debug!(id, "Updated todo");
                Ok(ActionResult::Success(serde_json::to_value(&todo)?))
            }
            Err(TodoformError::DoesNotExist(message)) => {
                tracing::debug!(id, %message, "Update of missing todo");
                Ok(fail(404, None))
            }
            Err(err) => Err(err),
        }
    }

    async fn run_delete(&self, form: &FormData) -> TodoformResult<ActionResult> {
        let record = cast_form_data(form, self.hints(false).as_ref());

        let Some(id) = record_id(&record) else {
            tracing::debug!("Delete without a usable id");
            return Ok(fail(404, None));
        };

        match self.store.delete(id).await {
            Ok(_) => {
                tracing::debug!(id, "Deleted todo");
                Ok(ActionResult::Success(json!({ "success": true })))
            }
            Err(TodoformError::DoesNotExist(message)) => {
                tracing::debug!(id, %message, "Delete of missing todo");
                Ok(fail(404, None))
            }
            Err(err) => Err(err),
        }
    }

    fn hints(&self, text_fields: bool) -> Option<CastHints> {
        let mut hints = CastHints::new();
        if text_fields {
            hints = hints
                .hint("title", CastHint::String)
                .hint("description", CastHint::String);
        }
        if self.strict_casting {
            return Some(
                hints
                    .hint("id", CastHint::Number)
                    .hint("done", CastHint::Boolean)
                    .strict(),
            );
        }
        text_fields.then_some(hints)
    }

    fn clean_text(&self, text: &str) -> String {
        if text.is_empty() {
            String::new()
        } else {
            self.filter.clean(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryTodoStore;

    fn actions() -> TodoActions {
        let filter = WordListFilter::new(["darn"], '*').unwrap();
        TodoActions::new(Arc::new(MemoryTodoStore::new()), Arc::new(filter))
    }

    fn form(body: &str) -> FormData {
        FormData::parse_urlencoded(body)
    }

    #[tokio::test]
    async fn test_create_keeps_numeric_title_as_text() {
        let result = actions().create(&form("title=42")).await.unwrap();
        assert_eq!(result.data().unwrap()["title"], "42");
    }

    #[tokio::test]
    async fn test_create_cleans_title_and_description() {
        let result = actions()
            .create(&form("title=darn+it&description=Darn+thing"))
            .await
            .unwrap();
        let data = result.data().unwrap();
        assert_eq!(data["title"], "**** it");
        assert_eq!(data["description"], "**** thing");
    }

    #[tokio::test]
    async fn test_update_error_includes_id() {
        let result = actions().update(&form("id=3&title=")).await.unwrap();
        assert_eq!(result.status(), 400);
        let data = result.data().unwrap();
        assert_eq!(data["id"], 3);
        assert!(data["id"].is_i64());
        assert_eq!(data["errors"]["title"]["kind"], "required");
    }

    #[tokio::test]
    async fn test_strict_casting_hints_id() {
        let actions = actions().strict_casting(true);
        let created = actions.create(&form("title=a")).await.unwrap();
        assert!(created.is_success());

        let result = actions.update(&form("id=1&title=b&done=on")).await.unwrap();
        assert_eq!(result.data().unwrap()["done"], true);

        let result = actions.delete(&form("id=1")).await.unwrap();
        assert!(result.is_success());
    }

    #[test]
    fn test_hints() {
        let plain = actions();
        assert!(plain.hints(false).is_none());
        let hints = plain.hints(true).unwrap();
        assert_eq!(hints.get("title"), Some(CastHint::String));
        assert_eq!(hints.get("id"), None);

        let strict = actions().strict_casting(true).hints(false).unwrap();
        assert_eq!(strict.get("id"), Some(CastHint::Number));
        assert_eq!(strict.get("title"), None);
    }

    #[test]
    fn test_action_result_accessors() {
        let ok = ActionResult::Success(json!({"success": true}));
        assert!(ok.is_success());
        assert_eq!(ok.status(), 200);

        let failed = fail(404, None);
        assert!(!failed.is_success());
        assert_eq!(failed.status(), 404);
        assert!(failed.data().is_none());
    }
}
