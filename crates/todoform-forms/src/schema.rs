//! Declarative object schemas.
//!
//! A [`Schema`] lists fields with a [`FieldSchema`] each: a target type plus
//! rules such as `required`, length and range bounds, patterns, allowed
//! values and async custom tests. [`Schema::validate`] casts each field to
//! its type, checks its rules and returns the normalized record.
//!
//! Violations are raised as [`SchemaError::Invalid`] carrying an aggregate
//! [`ValidationError`] with one leaf per violated rule. With
//! [`ValidateOptions::abort_early`] the first violation stops validation;
//! otherwise every violation across every field is collected. Anything that
//! goes wrong inside the engine itself (an invalid pattern, a custom test
//! that errors) is raised as [`SchemaError::Engine`].
//!
//! ```
//! use todoform_forms::{CoercedRecord, FieldSchema, Schema, ValidateOptions};
//!
//! let schema = Schema::object()
//!     .field("title", FieldSchema::string().trim().required())
//!     .field("priority", FieldSchema::number().integer().min(1.0).max(5.0).default(3_i64));
//!
//! let record: CoercedRecord = [("title", "  Buy milk ")].into_iter().collect();
//! let out = block_on(schema.validate(&record, ValidateOptions::collect_all())).unwrap();
//! assert_eq!(out.get("title").and_then(|v| v.as_text()), Some("Buy milk"));
//! assert_eq!(out.get("priority").and_then(|v| v.as_number()), Some(3.0));
//! # fn block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

use std::fmt;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use regex::Regex;
use thiserror::Error;

use todoform_core::{ErrorKind, TodoformError, ValidationError};

use crate::cast::{format_number, parse_number, CoercedRecord, FormValue};

/// The type a field is cast to before its rules run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Text; numbers and booleans are stringified.
    String,
    /// A finite or infinite number; numeric text is parsed.
    Number,
    /// A boolean; accepts `"true"`, `"false"`, `"1"`, `"0"`, `1` and `0`.
    Boolean,
    /// Any value, unchanged.
    Mixed,
}

impl FieldType {
    /// Returns the type name used in messages.
    pub const fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Mixed => "mixed",
        }
    }
}

/// A custom, possibly asynchronous, field test.
///
/// Tests run after the built-in rules, on the cast value. Return `Ok(None)`
/// when the value passes, `Ok(Some(message))` for a violation, and `Err` only
/// when the test itself could not run (e.g. a failed lookup); the error then
/// aborts validation.
#[async_trait]
pub trait FieldTest: Send + Sync + fmt::Debug {
    /// The name of the test, used as the error kind of its violations.
    fn name(&self) -> &str;

    /// Tests a value.
    async fn test(&self, path: &str, value: &FormValue) -> Result<Option<String>, TodoformError>;
}

/// A synchronous predicate wrapped as a [`FieldTest`].
///
/// `{path}` in the message is replaced by the field's label.
pub struct FnTest<F> {
    name: String,
    message: String,
    predicate: F,
}

impl<F> FnTest<F>
where
    F: Fn(&FormValue) -> bool + Send + Sync,
{
    /// Creates a test that fails with `message` when `predicate` is false.
    pub fn new(name: impl Into<String>, message: impl Into<String>, predicate: F) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            predicate,
        }
    }
}

impl<F> fmt::Debug for FnTest<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTest")
            .field("name", &self.name)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> FieldTest for FnTest<F>
where
    F: Fn(&FormValue) -> bool + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn test(&self, path: &str, value: &FormValue) -> Result<Option<String>, TodoformError> {
        if (self.predicate)(value) {
            Ok(None)
        } else {
            Ok(Some(self.message.replace("{path}", path)))
        }
    }
}

#[derive(Debug, Clone)]
enum Check {
    MinLength(usize),
    MaxLength(usize),
    Min(f64),
    Max(f64),
    Integer,
    Matches {
        pattern: String,
        compiled: OnceLock<Result<Regex, String>>,
    },
    OneOf(Vec<FormValue>),
}

#[derive(Debug, Clone)]
struct Rule {
    check: Check,
    message: Option<String>,
}

/// The definition of a single field.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    field_type: FieldType,
    label: Option<String>,
    required: bool,
    required_message: Option<String>,
    type_error_message: Option<String>,
    default: Option<FormValue>,
    trim: bool,
    rules: Vec<Rule>,
    tests: Vec<Arc<dyn FieldTest>>,
}

impl FieldSchema {
    /// Creates an optional field of the given type with no rules.
    pub const fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            label: None,
            required: false,
            required_message: None,
            type_error_message: None,
            default: None,
            trim: false,
            rules: Vec::new(),
            tests: Vec::new(),
        }
    }

    /// A text field.
    pub const fn string() -> Self {
        Self::new(FieldType::String)
    }

    /// A numeric field.
    pub const fn number() -> Self {
        Self::new(FieldType::Number)
    }

    /// A boolean field.
    pub const fn boolean() -> Self {
        Self::new(FieldType::Boolean)
    }

    /// A field of any type.
    pub const fn mixed() -> Self {
        Self::new(FieldType::Mixed)
    }

    /// Returns the field's type.
    pub const fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Returns `true` if the field is required.
    pub const fn is_required(&self) -> bool {
        self.required
    }

    /// Sets the name used in messages instead of the field path.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Rejects a missing or empty value.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Rejects a missing or empty value with a custom message.
    #[must_use]
    pub fn required_with(mut self, message: impl Into<String>) -> Self {
        self.required = true;
        self.required_message = Some(message.into());
        self
    }

    /// Uses a custom message when the value cannot be cast.
    #[must_use]
    pub fn type_error(mut self, message: impl Into<String>) -> Self {
        self.type_error_message = Some(message.into());
        self
    }

    /// Inserts `value` when the field is missing or empty.
    #[must_use]
    pub fn default(mut self, value: impl Into<FormValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Trims surrounding whitespace from text before any rule runs.
    #[must_use]
    pub const fn trim(mut self) -> Self {
        self.trim = true;
        self
    }

    /// Requires text of at least `n` characters.
    #[must_use]
    pub fn min_length(self, n: usize) -> Self {
        self.rule(Check::MinLength(n))
    }

    /// Requires text of at most `n` characters.
    #[must_use]
    pub fn max_length(self, n: usize) -> Self {
        self.rule(Check::MaxLength(n))
    }

    /// Requires a number greater than or equal to `n`.
    #[must_use]
    pub fn min(self, n: f64) -> Self {
        self.rule(Check::Min(n))
    }

    /// Requires a number less than or equal to `n`.
    #[must_use]
    pub fn max(self, n: f64) -> Self {
        self.rule(Check::Max(n))
    }

    /// Requires a whole number.
    #[must_use]
    pub fn integer(self) -> Self {
        self.rule(Check::Integer)
    }

    /// Requires text matching a regular expression.
    ///
    /// The pattern is compiled on first use; an invalid pattern is an
    /// engine failure, not a validation error.
    #[must_use]
    pub fn matches(self, pattern: impl Into<String>) -> Self {
        self.rule(Check::Matches {
            pattern: pattern.into(),
            compiled: OnceLock::new(),
        })
    }

    /// Requires one of the given values.
    #[must_use]
    pub fn one_of<V: Into<FormValue>>(self, values: impl IntoIterator<Item = V>) -> Self {
        self.rule(Check::OneOf(values.into_iter().map(Into::into).collect()))
    }

    /// Adds a custom test.
    #[must_use]
    pub fn test(mut self, test: Arc<dyn FieldTest>) -> Self {
        self.tests.push(test);
        self
    }

    /// Replaces the message of the most recently added rule.
    ///
    /// `{path}` in the message is replaced by the field's label.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        if let Some(rule) = self.rules.last_mut() {
            rule.message = Some(message.into());
        }
        self
    }

    fn rule(mut self, check: Check) -> Self {
        self.rules.push(Rule {
            check,
            message: None,
        });
        self
    }

    fn display_name<'a>(&'a self, path: &'a str) -> &'a str {
        self.label.as_deref().unwrap_or(path)
    }

    fn is_missing(&self, value: &FormValue) -> bool {
        match value {
            FormValue::Text(s) if self.trim || self.field_type != FieldType::String => {
                s.trim().is_empty()
            }
            FormValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Casts a present value to the field's type; `None` is a type error.
    fn cast(&self, value: &FormValue) -> Option<FormValue> {
        match (self.field_type, value) {
            (FieldType::Mixed, v) => Some(v.clone()),
            (FieldType::String, FormValue::Text(s)) => {
                let s = if self.trim { s.trim() } else { s.as_str() };
                Some(FormValue::Text(s.to_string()))
            }
            (FieldType::String, other) => Some(FormValue::Text(other.to_string())),
            (FieldType::Number, FormValue::Number(n)) => {
                (!n.is_nan()).then_some(FormValue::Number(*n))
            }
            (FieldType::Number, FormValue::Text(s)) => {
                let n = parse_number(s);
                (!n.is_nan()).then_some(FormValue::Number(n))
            }
            (FieldType::Number | FieldType::Boolean, FormValue::Bool(b)) => {
                (self.field_type == FieldType::Boolean).then_some(FormValue::Bool(*b))
            }
            (FieldType::Boolean, FormValue::Text(s)) => match s.trim() {
                "true" | "1" => Some(FormValue::Bool(true)),
                "false" | "0" => Some(FormValue::Bool(false)),
                _ => None,
            },
            (FieldType::Boolean, FormValue::Number(n)) => {
                if (n - 1.0).abs() < f64::EPSILON {
                    Some(FormValue::Bool(true))
                } else if n.abs() < f64::EPSILON {
                    Some(FormValue::Bool(false))
                } else {
                    None
                }
            }
        }
    }

    fn leaf(
        &self,
        path: &str,
        kind: ErrorKind,
        custom: Option<&String>,
        default_message: impl FnOnce(&str) -> String,
    ) -> ValidationError {
        let label = self.display_name(path);
        let message = custom.map_or_else(|| default_message(label), |m| m.replace("{path}", label));
        ValidationError::new(message, kind).with_path(path)
    }

    fn check(
        &self,
        path: &str,
        rule: &Rule,
        value: &FormValue,
    ) -> Result<Option<ValidationError>, TodoformError> {
        let custom = rule.message.as_ref();
        let err = match (&rule.check, value) {
            (Check::MinLength(n), FormValue::Text(s)) if s.chars().count() < *n => Some(
                self.leaf(path, ErrorKind::Min, custom, |l| {
                    format!("{l} must be at least {n} characters")
                })
                .with_param("min", n.to_string()),
            ),
            (Check::MaxLength(n), FormValue::Text(s)) if s.chars().count() > *n => Some(
                self.leaf(path, ErrorKind::Max, custom, |l| {
                    format!("{l} must be at most {n} characters")
                })
                .with_param("max", n.to_string()),
            ),
            (Check::Min(min), FormValue::Number(v)) if v < min => {
                let min = format_number(*min);
                Some(
                    self.leaf(path, ErrorKind::Min, custom, |l| {
                        format!("{l} must be greater than or equal to {min}")
                    })
                    .with_param("min", min),
                )
            }
            (Check::Max(max), FormValue::Number(v)) if v > max => {
                let max = format_number(*max);
                Some(
                    self.leaf(path, ErrorKind::Max, custom, |l| {
                        format!("{l} must be less than or equal to {max}")
                    })
                    .with_param("max", max),
                )
            }
            (Check::Integer, FormValue::Number(v)) if !v.is_finite() || v.fract().abs() > 0.0 => {
                Some(self.leaf(path, ErrorKind::Integer, custom, |l| {
                    format!("{l} must be an integer")
                }))
            }
            (Check::Matches { pattern, compiled }, FormValue::Text(s)) => {
                let re = compiled
                    .get_or_init(|| Regex::new(pattern).map_err(|e| e.to_string()))
                    .as_ref()
                    .map_err(|e| {
                        TodoformError::SchemaError(format!("Invalid pattern for '{path}': {e}"))
                    })?;
                (!re.is_match(s)).then(|| {
                    self.leaf(path, ErrorKind::Matches, custom, |l| {
                        format!("{l} must match the following: \"{pattern}\"")
                    })
                    .with_param("regex", pattern.clone())
                })
            }
            (Check::OneOf(allowed), v) if !allowed.contains(v) => {
                let values = allowed.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
                Some(self.leaf(path, ErrorKind::OneOf, custom, |l| {
                    format!("{l} must be one of the following values: {values}")
                }))
            }
            _ => None,
        };
        Ok(err)
    }

    /// Validates one field. Returns the normalized value to store (if it
    /// changed or was defaulted) and the violations found.
    async fn run(
        &self,
        path: &str,
        raw: Option<&FormValue>,
        abort_early: bool,
    ) -> Result<(Option<FormValue>, Vec<ValidationError>), TodoformError> {
        let Some(raw) = raw.filter(|v| !self.is_missing(v)) else {
            if let Some(default) = &self.default {
                return Ok((Some(default.clone()), Vec::new()));
            }
            if self.required {
                let err = self.leaf(path, ErrorKind::Required, self.required_message.as_ref(), |l| {
                    format!("{l} is a required field")
                });
                return Ok((None, vec![err]));
            }
            return Ok((None, Vec::new()));
        };

        let Some(value) = self.cast(raw) else {
            let type_name = self.field_type.name();
            let err = self.leaf(path, ErrorKind::TypeError, self.type_error_message.as_ref(), |l| {
                format!("{l} must be a `{type_name}` type, but the final value was: `{raw}`")
            });
            return Ok((None, vec![err]));
        };

        let mut errors = Vec::new();
        for rule in &self.rules {
            if let Some(err) = self.check(path, rule, &value)? {
                errors.push(err);
                if abort_early {
                    return Ok((Some(value), errors));
                }
            }
        }

        for test in &self.tests {
            if let Some(message) = test.test(self.display_name(path), &value).await? {
                errors.push(
                    ValidationError::new(message, ErrorKind::Custom(test.name().to_string()))
                        .with_path(path),
                );
                if abort_early {
                    break;
                }
            }
        }

        Ok((Some(value), errors))
    }
}

/// Options for a single validation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Stop at the first violation instead of collecting all of them.
    pub abort_early: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self { abort_early: true }
    }
}

impl ValidateOptions {
    /// Options that report every violation.
    pub const fn collect_all() -> Self {
        Self { abort_early: false }
    }
}

/// Why a validation pass failed.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The data violates the schema. This is the expected failure.
    #[error(transparent)]
    Invalid(ValidationError),
    /// The engine itself failed.
    #[error(transparent)]
    Engine(TodoformError),
}

/// An object schema: an ordered list of named fields.
///
/// Keys of the input that the schema does not declare pass through
/// unchanged unless [`strip_unknown`](Schema::strip_unknown) is set.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<(String, FieldSchema)>,
    strip_unknown: bool,
}

impl Schema {
    /// Creates an object schema with no fields.
    pub fn object() -> Self {
        Self::default()
    }

    /// Adds or replaces a field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, field: FieldSchema) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = field,
            None => self.fields.push((name, field)),
        }
        self
    }

    /// Drops keys the schema does not declare from the output.
    #[must_use]
    pub const fn strip_unknown(mut self) -> Self {
        self.strip_unknown = true;
        self
    }

    /// Returns the definition of a field.
    pub fn get(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, f)| f)
    }

    /// Returns the declared field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    /// Validates a record and returns its normalized form.
    ///
    /// # Errors
    ///
    /// [`SchemaError::Invalid`] when the data violates the schema,
    /// [`SchemaError::Engine`] when the engine itself fails.
    pub async fn validate(
        &self,
        record: &CoercedRecord,
        options: ValidateOptions,
    ) -> Result<CoercedRecord, SchemaError> {
        let mut output: CoercedRecord = if self.strip_unknown {
            record
                .iter()
                .filter(|(name, _)| self.get(name).is_some())
                .map(|(name, value)| (name, value.clone()))
                .collect()
        } else {
            record.clone()
        };

        let mut errors = Vec::new();
        for (path, field) in &self.fields {
            let (value, field_errors) = field
                .run(path, record.get(path), options.abort_early)
                .await
                .map_err(SchemaError::Engine)?;

            if let Some(value) = value {
                output.insert(path.as_str(), value);
            }
            errors.extend(field_errors);

            if options.abort_early && !errors.is_empty() {
                break;
            }
        }

        if errors.is_empty() {
            Ok(output)
        } else {
            Err(SchemaError::Invalid(ValidationError::aggregate(errors)))
        }
    }
}
