//! The todo record.

use serde::{Deserialize, Serialize};

use todoform_forms::{CoercedRecord, FormValue};

/// A stored todo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// Store-assigned identifier, ascending in creation order.
    pub id: i64,
    /// The title shown in the list.
    pub title: String,
    /// Optional longer text.
    pub description: Option<String>,
    /// Whether the todo is completed.
    pub done: bool,
}

/// The editable fields of a todo, as submitted by a form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoData {
    /// The title.
    pub title: String,
    /// The description; `None` when not submitted.
    #[serde(default)]
    pub description: Option<String>,
    /// The completion flag.
    #[serde(default)]
    pub done: bool,
}

impl TodoData {
    /// Creates data with a title only.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Reads the editable fields from a validated record.
    ///
    /// Non-text titles and descriptions are stringified; `done` follows the
    /// value's truthiness and is `false` when absent.
    pub fn from_record(record: &CoercedRecord) -> Self {
        Self {
            title: record.get("title").map(ToString::to_string).unwrap_or_default(),
            description: record.get("description").map(ToString::to_string),
            done: record.get("done").is_some_and(FormValue::is_truthy),
        }
    }

    pub(crate) fn into_todo(self, id: i64) -> Todo {
        Todo {
            id,
            title: self.title,
            description: self.description,
            done: self.done,
        }
    }
}

/// A partial update of a todo. `None` leaves the stored value unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoPatch {
    /// The new title.
    #[serde(default)]
    pub title: Option<String>,
    /// The new description.
    #[serde(default)]
    pub description: Option<String>,
    /// The new completion flag.
    #[serde(default)]
    pub done: Option<bool>,
}

impl TodoPatch {
    /// Reads the submitted fields from a validated record. Fields missing
    /// from the record stay `None`.
    pub fn from_record(record: &CoercedRecord) -> Self {
        Self {
            title: record.get("title").map(ToString::to_string),
            description: record.get("description").map(ToString::to_string),
            done: record.get("done").map(FormValue::is_truthy),
        }
    }

    pub(crate) fn apply(self, todo: &mut Todo) {
        if let Some(title) = self.title {
            todo.title = title;
        }
        if let Some(description) = self.description {
            todo.description = Some(description);
        }
        if let Some(done) = self.done {
            todo.done = done;
        }
    }
}

/// Reads a whole-number `id` from a record.
#[allow(clippy::cast_possible_truncation)]
pub fn record_id(record: &CoercedRecord) -> Option<i64> {
    let n = record.get("id")?.as_number()?;
    (n.is_finite() && n.fract() == 0.0).then_some(n as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_record() {
        let record: CoercedRecord = [
            ("id", FormValue::Number(3.0)),
            ("title", FormValue::from("Walk dog")),
            ("done", FormValue::Bool(true)),
        ]
        .into_iter()
        .collect();
        let data = TodoData::from_record(&record);
        assert_eq!(data.title, "Walk dog");
        assert_eq!(data.description, None);
        assert!(data.done);
    }

    #[test]
    fn test_from_record_stringifies_numbers() {
        let record: CoercedRecord = [("title", FormValue::Number(42.0))].into_iter().collect();
        assert_eq!(TodoData::from_record(&record).title, "42");
    }

    #[test]
    fn test_patch_keeps_unsent_fields() {
        let mut todo = TodoData {
            title: "Walk dog".into(),
            description: Some("around the park".into()),
            done: false,
        }
        .into_todo(1);
        let record: CoercedRecord = [
            ("title", FormValue::from("Walk cat")),
            ("done", FormValue::Bool(true)),
        ]
        .into_iter()
        .collect();

        TodoPatch::from_record(&record).apply(&mut todo);
        assert_eq!(todo.title, "Walk cat");
        assert_eq!(todo.description.as_deref(), Some("around the park"));
        assert!(todo.done);
    }

    #[test]
    fn test_record_id() {
        let id = |v: FormValue| record_id(&[("id", v)].into_iter().collect());
        assert_eq!(id(FormValue::Number(7.0)), Some(7));
        assert_eq!(id(FormValue::Number(7.5)), None);
        assert_eq!(id(FormValue::Number(f64::NAN)), None);
        assert_eq!(id(FormValue::from("7")), None);
        assert_eq!(record_id(&CoercedRecord::new()), None);
    }

    #[test]
    fn test_todo_serializes() {
        let todo = TodoData::new("Walk dog").into_todo(1);
        assert_eq!(
            serde_json::to_value(&todo).unwrap(),
            serde_json::json!({"id": 1, "title": "Walk dog", "description": null, "done": false})
        );
    }
}
