//! Casting raw form submissions into typed records.
//!
//! Browsers submit every field as text. [`cast_form_data`] turns a
//! [`FormData`] into a [`CoercedRecord`] of [`FormValue`]s, one per field
//! name, using these rules for each field's last submitted value:
//!
//! 1. `"on"` becomes `true` and `"off"` becomes `false` (checkboxes), whatever
//!    the hint.
//! 2. A field with a [`CastHint`] is cast by that hint.
//! 3. Any other field goes through the [`Fallback`] strategy.
//!
//! Casting never fails. A number that does not parse becomes `NaN`, and the
//! schema is expected to reject it.
//!
//! The numeric inference fallback ([`Fallback::Infer`]) is deprecated: a text
//! field that happens to hold digits silently becomes a number. Forms should
//! hint every field they care about, or opt into [`CastHints::strict`].

use std::collections::HashMap;
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::form_data::{FormData, FormEntryValue};

/// The type a field should be cast to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CastHint {
    /// Keep the text unchanged.
    String,
    /// Parse the text as a number; failures become `NaN`.
    Number,
    /// Empty text is `false`, any other text is `true`.
    Boolean,
}

/// What happens to fields that have no hint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fallback {
    /// Deprecated: non-empty text that parses as a number becomes a number.
    #[default]
    Infer,
    /// Keep the text unchanged.
    Text,
}

/// Per-field cast hints plus the fallback for unhinted fields.
///
/// # Examples
///
/// ```
/// use todoform_forms::{CastHint, CastHints, Fallback};
///
/// let hints = CastHints::new()
///     .hint("title", CastHint::String)
///     .hint("priority", CastHint::Number)
///     .strict();
/// assert_eq!(hints.get("title"), Some(CastHint::String));
/// assert_eq!(hints.fallback(), Fallback::Text);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CastHints {
    hints: HashMap<String, CastHint>,
    fallback: Fallback,
}

impl CastHints {
    /// Creates an empty hint set with the inferring fallback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the hint for a field.
    #[must_use]
    pub fn hint(mut self, field: impl Into<String>, hint: CastHint) -> Self {
        self.hints.insert(field.into(), hint);
        self
    }

    /// Keeps unhinted fields as text instead of inferring numbers.
    #[must_use]
    pub const fn strict(mut self) -> Self {
        self.fallback = Fallback::Text;
        self
    }

    /// Sets the fallback for unhinted fields.
    #[must_use]
    pub const fn with_fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// Returns the hint for a field, if any.
    pub fn get(&self, field: &str) -> Option<CastHint> {
        self.hints.get(field).copied()
    }

    /// Returns the fallback for unhinted fields.
    pub const fn fallback(&self) -> Fallback {
        self.fallback
    }
}

impl<K: Into<String>> FromIterator<(K, CastHint)> for CastHints {
    fn from_iter<I: IntoIterator<Item = (K, CastHint)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |hints, (field, hint)| hints.hint(field, hint))
    }
}

/// A cast form value.
///
/// `Number(NaN)` marks a number that failed to parse. Two `NaN`s compare
/// equal so that casting the same input twice yields equal records.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormValue {
    /// A boolean (checkboxes and boolean hints).
    Bool(bool),
    /// A number; serializes `NaN` as `null`.
    Number(f64),
    /// Unchanged text.
    Text(String),
}

impl FormValue {
    /// Returns the text, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the number, if this is a numeric value.
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the boolean, if this is a boolean value.
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns `true` for a number that failed to parse.
    pub fn is_nan(&self) -> bool {
        matches!(self, Self::Number(n) if n.is_nan())
    }

    /// Returns the value's truthiness: `false`, `0`, `NaN` and empty text
    /// are falsy, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Number(n) => !n.is_nan() && *n != 0.0,
            Self::Text(s) => !s.is_empty(),
        }
    }

    /// Converts to JSON; `NaN` and infinities become `null`.
    ///
    /// Whole numbers in `i64` range become JSON integers so they deserialize
    /// into integer fields.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n)
                if n.fract() == 0.0 && *n >= i64::MIN as f64 && *n < i64::MAX as f64 =>
            {
                serde_json::Value::Number(serde_json::Number::from(*n as i64))
            }
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl PartialEq for FormValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Self::Text(a), Self::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for FormValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => f.write_str(&format_number(*n)),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for FormValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for FormValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i64> for FormValue {
    #[allow(clippy::cast_precision_loss)]
    fn from(v: i64) -> Self {
        Self::Number(v as f64)
    }
}

impl From<&str> for FormValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for FormValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Formats a number the way a browser would print it: integral values
/// without a fractional part, `NaN` and `Infinity` spelled out.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let s = if n > 0.0 { "Infinity" } else { "-Infinity" };
        s.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        format!("{n}")
    }
}

/// A typed record keyed by field name, in first-submission order.
///
/// Each name appears exactly once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoercedRecord {
    entries: Vec<(String, FormValue)>,
}

impl CoercedRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value of a field.
    pub fn get(&self, field: &str) -> Option<&FormValue> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    /// Sets a field, replacing an existing value in place.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<FormValue>) {
        let field = field.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((field, value)),
        }
    }

    /// Removes a field and returns its value.
    pub fn remove(&mut self, field: &str) -> Option<FormValue> {
        let pos = self.entries.iter().position(|(name, _)| name == field)?;
        Some(self.entries.remove(pos).1)
    }

    /// Returns `true` if the field is present.
    pub fn contains_key(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Returns the field names in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Returns `(field, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FormValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Converts the record into a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.entries
                .iter()
                .map(|(name, value)| (name.clone(), value.to_json()))
                .collect(),
        )
    }
}

impl Serialize for CoercedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, &value.to_json())?;
        }
        map.end()
    }
}

impl<K: Into<String>, V: Into<FormValue>> FromIterator<(K, V)> for CoercedRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

/// Casts a whole submission into a record.
///
/// Every submitted name appears exactly once in the result, in the order it
/// first appeared. When a name was submitted several times the last value
/// wins.
pub fn cast_form_data(data: &FormData, hints: Option<&CastHints>) -> CoercedRecord {
    let mut record = CoercedRecord::new();
    for (name, values) in data.iter() {
        if let Some(value) = values.last() {
            record.insert(name, cast_value(name, value, hints));
        }
    }
    record
}

/// Casts a single submitted value.
///
/// A file has no text to cast and becomes its file name.
pub fn cast_value(field: &str, value: &FormEntryValue, hints: Option<&CastHints>) -> FormValue {
    let text = match value {
        FormEntryValue::Text(text) => text.as_str(),
        FormEntryValue::File(file) => return FormValue::Text(file.name.clone()),
    };

    match text {
        "on" => return FormValue::Bool(true),
        "off" => return FormValue::Bool(false),
        _ => {}
    }

    match hints.and_then(|h| h.get(field)) {
        Some(CastHint::String) => FormValue::Text(text.to_string()),
        Some(CastHint::Number) => FormValue::Number(parse_number(text)),
        Some(CastHint::Boolean) => FormValue::Bool(!text.is_empty()),
        None => match hints.map_or(Fallback::Infer, CastHints::fallback) {
            Fallback::Text => FormValue::Text(text.to_string()),
            Fallback::Infer => infer_value(field, text),
        },
    }
}

fn infer_value(field: &str, text: &str) -> FormValue {
    if text.is_empty() {
        return FormValue::Text(String::new());
    }
    let n = parse_number(text);
    if n.is_nan() {
        FormValue::Text(text.to_string())
    } else {
        tracing::trace!(field, text, "inferred number for unhinted field");
        FormValue::Number(n)
    }
}

/// Parses text the way a browser's `Number()` conversion does.
///
/// Surrounding whitespace is ignored and blank text is `0`. Decimal and
/// exponent notation with an optional sign, `0x`/`0o`/`0b` prefixes and
/// `Infinity` are accepted. Anything else is `NaN`.
///
/// # Examples
///
/// ```
/// use todoform_forms::parse_number;
///
/// assert_eq!(parse_number(" 42 "), 42.0);
/// assert_eq!(parse_number("0x1f"), 31.0);
/// assert_eq!(parse_number(""), 0.0);
/// assert!(parse_number("inf").is_nan());
/// assert!(parse_number("12abc").is_nan());
/// ```
pub fn parse_number(text: &str) -> f64 {
    let t = text.trim();
    if t.is_empty() {
        return 0.0;
    }

    match t {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    for (prefix, radix) in [("0x", 16), ("0o", 8), ("0b", 2)] {
        let lower = t.get(..2).map(str::to_ascii_lowercase);
        if lower.as_deref() == Some(prefix) {
            return parse_radix(&t[2..], radix);
        }
    }

    // f64::from_str also accepts "inf" and "nan", which a browser does not
    if !t
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
    {
        return f64::NAN;
    }
    t.parse::<f64>().unwrap_or(f64::NAN)
}

fn parse_radix(digits: &str, radix: u32) -> f64 {
    if digits.is_empty() {
        return f64::NAN;
    }
    digits
        .chars()
        .try_fold(0.0_f64, |acc, c| {
            c.to_digit(radix)
                .map(|d| acc.mul_add(f64::from(radix), f64::from(d)))
        })
        .unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::UploadedFile;

    fn hinted() -> CastHints {
        CastHints::new()
            .hint("title", CastHint::String)
            .hint("count", CastHint::Number)
            .hint("flag", CastHint::Boolean)
    }

    fn cast_one(field: &str, text: &str, hints: Option<&CastHints>) -> FormValue {
        cast_value(field, &FormEntryValue::from(text), hints)
    }

    #[test]
    fn test_on_off_ignore_hints() {
        let hints = hinted();
        for field in ["title", "count", "flag", "other"] {
            assert_eq!(cast_one(field, "on", Some(&hints)), FormValue::Bool(true));
            assert_eq!(cast_one(field, "off", Some(&hints)), FormValue::Bool(false));
        }
        assert_eq!(cast_one("x", "on", None), FormValue::Bool(true));
        assert_eq!(cast_one("x", "ON", None), FormValue::Text("ON".into()));
    }

    #[test]
    fn test_string_hint_keeps_digits_as_text() {
        let hints = hinted();
        assert_eq!(cast_one("title", "42", Some(&hints)), FormValue::Text("42".into()));
        assert_eq!(cast_one("title", "", Some(&hints)), FormValue::Text(String::new()));
    }

    #[test]
    fn test_number_hint() {
        let hints = hinted();
        assert_eq!(cast_one("count", "42", Some(&hints)), FormValue::Number(42.0));
        assert!(cast_one("count", "abc", Some(&hints)).is_nan());
        assert_eq!(cast_one("count", "", Some(&hints)), FormValue::Number(0.0));
    }

    #[test]
    fn test_boolean_hint_is_plain_truthiness() {
        let hints = hinted();
        assert_eq!(cast_one("flag", "", Some(&hints)), FormValue::Bool(false));
        assert_eq!(cast_one("flag", "yes", Some(&hints)), FormValue::Bool(true));
        assert_eq!(cast_one("flag", "false", Some(&hints)), FormValue::Bool(true));
        assert_eq!(cast_one("flag", "0", Some(&hints)), FormValue::Bool(true));
    }

    #[test]
    fn test_inference_without_hint() {
        assert_eq!(cast_one("x", "", None), FormValue::Text(String::new()));
        assert_eq!(cast_one("x", "7", None), FormValue::Number(7.0));
        assert_eq!(cast_one("x", "-2.5e1", None), FormValue::Number(-25.0));
        assert_eq!(cast_one("x", "seven", None), FormValue::Text("seven".into()));
        assert_eq!(cast_one("x", "NaN", None), FormValue::Text("NaN".into()));
        // Whitespace is not empty text, and blank text is numeric zero
        assert_eq!(cast_one("x", "  ", None), FormValue::Number(0.0));
    }

    #[test]
    fn test_strict_fallback_keeps_text() {
        let hints = CastHints::new().strict();
        assert_eq!(cast_one("x", "7", Some(&hints)), FormValue::Text("7".into()));
        assert_eq!(cast_one("x", "on", Some(&hints)), FormValue::Bool(true));
    }

    #[test]
    fn test_hint_for_other_field_still_infers() {
        let hints = hinted();
        assert_eq!(cast_one("id", "3", Some(&hints)), FormValue::Number(3.0));
    }

    #[test]
    fn test_file_becomes_its_name() {
        let file = FormEntryValue::File(UploadedFile::new("12.png", "image/png", vec![1, 2]));
        assert_eq!(cast_value("pic", &file, None), FormValue::Text("12.png".into()));
    }

    #[test]
    fn test_every_key_exactly_once_last_wins() {
        let data = FormData::parse_urlencoded("b=1&a=x&b=2&c=&a=on");
        let record = cast_form_data(&data, None);
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["b", "a", "c"]);
        assert_eq!(record.get("b"), Some(&FormValue::Number(2.0)));
        assert_eq!(record.get("a"), Some(&FormValue::Bool(true)));
        assert_eq!(record.get("c"), Some(&FormValue::Text(String::new())));
    }

    #[test]
    fn test_cast_is_idempotent() {
        let data = FormData::parse_urlencoded("n=abc&m=4");
        let hints = CastHints::new().hint("n", CastHint::Number);
        assert_eq!(
            cast_form_data(&data, Some(&hints)),
            cast_form_data(&data, Some(&hints))
        );
    }

    #[test]
    fn test_parse_number_forms() {
        assert_eq!(parse_number("1."), 1.0);
        assert_eq!(parse_number(".5"), 0.5);
        assert_eq!(parse_number("+3"), 3.0);
        assert_eq!(parse_number("1e3"), 1000.0);
        assert_eq!(parse_number("0B101"), 5.0);
        assert_eq!(parse_number("0o17"), 15.0);
        assert_eq!(parse_number("-Infinity"), f64::NEG_INFINITY);
        assert!(parse_number(".").is_nan());
        assert!(parse_number("1e").is_nan());
        assert!(parse_number("0x").is_nan());
        assert!(parse_number("-0x10").is_nan());
        assert!(parse_number("1_000").is_nan());
        assert!(parse_number("infinity").is_nan());
    }

    #[test]
    fn test_record_serializes_nan_as_null() {
        let record: CoercedRecord = [
            ("title", FormValue::from("hi")),
            ("n", FormValue::Number(f64::NAN)),
            ("done", FormValue::Bool(false)),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            serde_json::json!({"title": "hi", "n": null, "done": false})
        );
        assert_eq!(record.to_json(), serde_json::to_value(&record).unwrap());
    }

    #[test]
    fn test_whole_numbers_become_json_integers() {
        assert_eq!(FormValue::Number(3.0).to_json(), serde_json::json!(3));
        assert!(FormValue::Number(3.0).to_json().is_i64());
        assert_eq!(FormValue::Number(-0.0).to_json(), serde_json::json!(0));
        assert_eq!(FormValue::Number(2.5).to_json(), serde_json::json!(2.5));
        assert!(FormValue::Number(1e300).to_json().is_f64());
        assert!(FormValue::Number(f64::INFINITY).to_json().is_null());
    }

    #[test]
    fn test_record_insert_replaces_in_place() {
        let mut record = CoercedRecord::new();
        record.insert("a", 1_i64);
        record.insert("b", true);
        record.insert("a", "x");
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(record.remove("a"), Some(FormValue::Text("x".into())));
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(42.0), "42");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
    }

    #[test]
    fn test_truthiness() {
        assert!(FormValue::Bool(true).is_truthy());
        assert!(FormValue::Number(-1.0).is_truthy());
        assert!(FormValue::from("false").is_truthy());
        assert!(!FormValue::Bool(false).is_truthy());
        assert!(!FormValue::Number(0.0).is_truthy());
        assert!(!FormValue::Number(f64::NAN).is_truthy());
        assert!(!FormValue::from("").is_truthy());
    }

    #[test]
    fn test_hints_from_iter() {
        let hints: CastHints = [("title", CastHint::String), ("description", CastHint::String)]
            .into_iter()
            .collect();
        assert_eq!(hints.get("description"), Some(CastHint::String));
        assert_eq!(hints.get("done"), None);
        assert_eq!(hints.fallback(), Fallback::Infer);
    }
}
