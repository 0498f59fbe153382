//! Schema validation of coerced records.
//!
//! [`validate_record`] and [`validate_form`] run a [`Schema`] over a
//! [`CoercedRecord`] collecting every violation, and translate the outcome
//! into a [`FormResult`]: the validated value, or a [`FormErrors`] map from
//! field path to what went wrong there. Only violations become a
//! `FormResult::Error`; failures of the engine itself are returned as `Err`.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use todoform_core::{ErrorKind, TodoformError, ValidationError};

use crate::cast::CoercedRecord;
use crate::schema::{Schema, SchemaError, ValidateOptions};

/// The violations found on one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    /// The field path.
    pub path: String,
    /// The kind of the first violation on this field.
    pub kind: ErrorKind,
    /// Every message reported for this field, in rule order.
    pub errors: Vec<String>,
}

/// Validation errors keyed by field path.
///
/// Errors without a path (raised against the record as a whole) are stored
/// under the empty path.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FormErrors {
    errors: BTreeMap<String, FieldError>,
}

impl FormErrors {
    /// Creates an empty error map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the map from an engine error, one entry per distinct path.
    pub fn from_validation_error(err: &ValidationError) -> Self {
        let mut errors = Self::new();
        for leaf in err.leaves() {
            errors.add(
                leaf.path.as_deref().unwrap_or_default(),
                leaf.kind.clone(),
                leaf.message.clone(),
            );
        }
        errors
    }

    /// Records a message for a path. The first message recorded for a path
    /// decides its kind.
    pub fn add(&mut self, path: &str, kind: ErrorKind, message: impl Into<String>) {
        self.errors
            .entry(path.to_string())
            .or_insert_with(|| FieldError {
                path: path.to_string(),
                kind,
                errors: Vec::new(),
            })
            .errors
            .push(message.into());
    }

    /// Returns the errors for a path.
    pub fn get(&self, path: &str) -> Option<&FieldError> {
        self.errors.get(path)
    }

    /// Returns `true` if the path has errors.
    pub fn contains(&self, path: &str) -> bool {
        self.errors.contains_key(path)
    }

    /// Iterates over the entries, sorted by path.
    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.values()
    }

    /// Returns the number of fields with errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns `true` if there are no errors.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

/// The outcome of validating a form: the validated value, or the errors.
#[derive(Debug, Clone, PartialEq)]
pub enum FormResult<T> {
    /// The data satisfied the schema.
    Ok(T),
    /// The data violated the schema.
    Error(FormErrors),
}

impl<T> FormResult<T> {
    /// Returns `true` for a successful validation.
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// Returns the errors of a failed validation.
    pub const fn errors(&self) -> Option<&FormErrors> {
        match self {
            Self::Ok(_) => None,
            Self::Error(errors) => Some(errors),
        }
    }

    /// Converts into a standard `Result`.
    ///
    /// # Errors
    ///
    /// Returns the [`FormErrors`] of a failed validation.
    pub fn into_result(self) -> Result<T, FormErrors> {
        match self {
            Self::Ok(value) => Ok(value),
            Self::Error(errors) => Err(errors),
        }
    }
}

/// Validates a record against a schema, reporting every violation.
///
/// # Errors
///
/// Returns an error only when the schema engine itself fails (an invalid
/// pattern, a custom test that errors). Violations are reported through
/// [`FormResult::Error`].
pub async fn validate_record(
    record: &CoercedRecord,
    schema: &Schema,
) -> Result<FormResult<CoercedRecord>, TodoformError> {
    match schema.validate(record, ValidateOptions::collect_all()).await {
        Ok(normalized) => Ok(FormResult::Ok(normalized)),
        Err(SchemaError::Invalid(err)) => {
            let errors = FormErrors::from_validation_error(&err);
            tracing::debug!(fields = errors.len(), "Form validation failed");
            Ok(FormResult::Error(errors))
        }
        Err(SchemaError::Engine(err)) => {
            tracing::warn!(error = %err, "Schema engine failed");
            Err(err)
        }
    }
}

/// Validates a record against a schema and deserializes the result into `T`.
///
/// `NaN` and infinite numbers in the validated record deserialize as `null`.
///
/// # Errors
///
/// Returns an error when the schema engine fails or the validated record
/// does not deserialize into `T`.
///
/// # Examples
///
/// ```
/// use serde::Deserialize;
/// use todoform_forms::{validate_form, CoercedRecord, FieldSchema, FormResult, Schema};
///
/// #[derive(Debug, Deserialize)]
/// struct NewTodo {
///     title: String,
/// }
///
/// let schema = Schema::object().field("title", FieldSchema::string().required());
/// let record: CoercedRecord = [("title", "Walk dog")].into_iter().collect();
///
/// let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// match rt.block_on(validate_form::<NewTodo>(&record, &schema)).unwrap() {
///     FormResult::Ok(todo) => assert_eq!(todo.title, "Walk dog"),
///     FormResult::Error(errors) => panic!("unexpected errors: {errors:?}"),
/// }
/// ```
pub async fn validate_form<T: DeserializeOwned>(
    record: &CoercedRecord,
    schema: &Schema,
) -> Result<FormResult<T>, TodoformError> {
    match validate_record(record, schema).await? {
        FormResult::Ok(normalized) => {
            let value = serde_json::from_value(normalized.to_json())?;
            Ok(FormResult::Ok(value))
        }
        FormResult::Error(errors) => Ok(FormResult::Error(errors)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cast::FormValue;
    use crate::schema::FieldSchema;

    fn title_schema() -> Schema {
        Schema::object().field("title", FieldSchema::string().required())
    }

    #[tokio::test]
    async fn test_empty_title_is_required_error() {
        let record: CoercedRecord = [("title", "")].into_iter().collect();
        let result = validate_record(&record, &title_schema()).await.unwrap();

        let errors = result.errors().unwrap();
        assert_eq!(errors.len(), 1);
        let title = errors.get("title").unwrap();
        assert_eq!(title.kind, ErrorKind::Required);
        assert_eq!(title.errors, vec!["title is a required field".to_string()]);
    }

    #[tokio::test]
    async fn test_valid_title_passes() {
        let record: CoercedRecord = [("title", "hello")].into_iter().collect();
        let result = validate_record(&record, &title_schema()).await.unwrap();
        assert_eq!(result, FormResult::Ok(record));
    }

    #[tokio::test]
    async fn test_every_violation_is_reported() {
        let schema = Schema::object()
            .field("title", FieldSchema::string().required())
            .field("description", FieldSchema::string().min_length(10).matches("^[A-Z]"))
            .field("priority", FieldSchema::number().max(3.0));
        let record: CoercedRecord = [
            ("description", FormValue::from("short")),
            ("priority", FormValue::Number(9.0)),
        ]
        .into_iter()
        .collect();

        let errors = validate_record(&record, &schema)
            .await
            .unwrap()
            .into_result()
            .unwrap_err();

        assert_eq!(errors.len(), 3);
        assert!(errors.contains("title"));
        assert!(errors.contains("priority"));
        let description = errors.get("description").unwrap();
        assert_eq!(description.kind, ErrorKind::Min);
        assert_eq!(description.errors.len(), 2);
    }

    #[tokio::test]
    async fn test_outcome_is_idempotent() {
        let record: CoercedRecord = [("title", "")].into_iter().collect();
        let schema = title_schema();
        let first = validate_record(&record, &schema).await.unwrap();
        let second = validate_record(&record, &schema).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_engine_failure_propagates() {
        let schema = Schema::object().field("title", FieldSchema::string().matches("["));
        let record: CoercedRecord = [("title", "x")].into_iter().collect();
        let err = validate_record(&record, &schema).await.unwrap_err();
        assert_eq!(err.status_code(), 500);
    }

    #[derive(Debug, serde::Deserialize, PartialEq)]
    struct Entry {
        title: String,
        done: bool,
    }

    #[tokio::test]
    async fn test_validate_form_deserializes() {
        let schema = title_schema().field("done", FieldSchema::boolean().default(false));
        let record: CoercedRecord = [("title", "Walk dog")].into_iter().collect();
        let result = validate_form::<Entry>(&record, &schema).await.unwrap();
        assert_eq!(
            result,
            FormResult::Ok(Entry {
                title: "Walk dog".into(),
                done: false
            })
        );
    }

    #[tokio::test]
    async fn test_validate_form_shape_mismatch_is_error() {
        let schema = Schema::object().field("title", FieldSchema::string());
        let record: CoercedRecord = [("title", "x")].into_iter().collect();
        let err = validate_form::<Entry>(&record, &schema).await.unwrap_err();
        assert!(matches!(err, TodoformError::SerializationError(_)));
    }

    #[derive(Debug, serde::Deserialize, PartialEq)]
    struct Row {
        id: i64,
        title: String,
        count: u32,
        ratio: f64,
        weight: f64,
    }

    #[tokio::test]
    async fn test_validate_form_fills_numeric_fields() {
        let data = crate::form_data::FormData::parse_urlencoded(
            "id=3&title=hello&count=12&ratio=0.25&weight=7",
        );
        let record = crate::cast::cast_form_data(&data, None);
        let schema = title_schema()
            .field("id", FieldSchema::number().integer().required())
            .field("count", FieldSchema::number().integer().min(0.0));

        let result = validate_form::<Row>(&record, &schema).await.unwrap();
        assert_eq!(
            result,
            FormResult::Ok(Row {
                id: 3,
                title: "hello".into(),
                count: 12,
                ratio: 0.25,
                weight: 7.0,
            })
        );
    }

    #[tokio::test]
    async fn test_validate_form_negative_integer() {
        #[derive(Debug, serde::Deserialize)]
        struct Offset {
            delta: i64,
        }

        let schema = Schema::object().field("delta", FieldSchema::number().integer());
        let record: CoercedRecord = [("delta", FormValue::Number(-40.0))].into_iter().collect();
        let result = validate_form::<Offset>(&record, &schema).await.unwrap();
        assert_eq!(result.into_result().unwrap().delta, -40);
    }

    #[test]
    fn test_form_errors_serialize_as_map() {
        let mut errors = FormErrors::new();
        errors.add("title", ErrorKind::Required, "title is a required field");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "title": {
                    "path": "title",
                    "kind": "required",
                    "errors": ["title is a required field"]
                }
            })
        );
    }

    #[test]
    fn test_pathless_error_uses_empty_key() {
        let err = ValidationError::new("record is invalid", ErrorKind::Custom("record".into()));
        let errors = FormErrors::from_validation_error(&err);
        assert!(errors.contains(""));
    }
}
