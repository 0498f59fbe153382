//! Raw form submissions.
//!
//! [`FormData`] is the ordered multimap a browser produces when it submits a
//! form: field names mapped to text values or uploaded files, with repeated
//! names allowed. It can be parsed from an urlencoded or multipart body, or
//! built directly by the request-handling layer.

use todoform_core::utils::MultiValueDict;
use todoform_core::{TodoformError, TodoformResult};

use crate::upload::{extract_boundary, parse_multipart, UploadedFile};

/// A single submitted value: text, or an uploaded file.
#[derive(Debug, Clone, PartialEq)]
pub enum FormEntryValue {
    /// A plain text value.
    Text(String),
    /// A file part of a multipart submission.
    File(UploadedFile),
}

impl FormEntryValue {
    /// Returns the text, or `None` for a file.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::File(_) => None,
        }
    }

    /// Returns the file, or `None` for text.
    pub const fn as_file(&self) -> Option<&UploadedFile> {
        match self {
            Self::Text(_) => None,
            Self::File(f) => Some(f),
        }
    }
}

impl From<&str> for FormEntryValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FormEntryValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<UploadedFile> for FormEntryValue {
    fn from(f: UploadedFile) -> Self {
        Self::File(f)
    }
}

/// An ordered form submission.
///
/// Names iterate in the order they first appeared; [`get`](FormData::get)
/// returns the last value submitted under a name.
///
/// # Examples
///
/// ```
/// use todoform_forms::FormData;
///
/// let data = FormData::parse_urlencoded("tag=a&title=Buy+milk&tag=b");
/// assert_eq!(data.get_text("title"), Some("Buy milk"));
/// assert_eq!(data.get_all("tag").len(), 2);
/// assert_eq!(data.keys().collect::<Vec<_>>(), vec!["tag", "title"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormData {
    data: MultiValueDict<String, FormEntryValue>,
}

impl FormData {
    /// Creates an empty submission.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an `application/x-www-form-urlencoded` body or query string.
    ///
    /// `+` decodes to a space and percent sequences are decoded as UTF-8
    /// (lossily). A pair without `=` yields an empty value.
    pub fn parse_urlencoded(body: &str) -> Self {
        let mut data = Self::new();

        for pair in body.split('&') {
            if pair.is_empty() {
                continue;
            }

            let (key, value) = pair
                .find('=')
                .map_or((pair, ""), |eq_pos| (&pair[..eq_pos], &pair[eq_pos + 1..]));

            data.append_text(percent_decode(key), percent_decode(value));
        }

        data
    }

    /// Parses a `multipart/form-data` body split on `boundary`.
    ///
    /// # Errors
    ///
    /// Returns [`TodoformError::BadRequest`] if a file part is larger than
    /// `max_upload_size`.
    pub fn parse_multipart(
        body: &[u8],
        boundary: &str,
        max_upload_size: usize,
    ) -> TodoformResult<Self> {
        parse_multipart(body, boundary, max_upload_size)
    }

    /// Parses a request body according to its `Content-Type`.
    ///
    /// Supports `application/x-www-form-urlencoded` and `multipart/form-data`.
    ///
    /// # Errors
    ///
    /// Returns [`TodoformError::BadRequest`] for a missing or unsupported
    /// content type, a multipart type without a boundary, or a file part
    /// larger than `max_upload_size`.
    pub fn from_body(
        content_type: Option<&str>,
        body: &[u8],
        max_upload_size: usize,
    ) -> TodoformResult<Self> {
        let content_type = content_type
            .ok_or_else(|| TodoformError::BadRequest("Missing content type".to_string()))?;
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();

        match mime.as_str() {
            "application/x-www-form-urlencoded" => {
                Ok(Self::parse_urlencoded(&String::from_utf8_lossy(body)))
            }
            "multipart/form-data" => {
                let boundary = extract_boundary(content_type).ok_or_else(|| {
                    TodoformError::BadRequest("Multipart body without a boundary".to_string())
                })?;
                parse_multipart(body, boundary, max_upload_size)
            }
            other => Err(TodoformError::BadRequest(format!(
                "Unsupported content type '{other}'"
            ))),
        }
    }

    /// Appends a value under a name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<FormEntryValue>) {
        self.data.append(name.into(), value.into());
    }

    /// Appends a text value under a name.
    pub fn append_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.data
            .append(name.into(), FormEntryValue::Text(value.into()));
    }

    /// Appends an uploaded file under a name.
    pub fn append_file(&mut self, name: impl Into<String>, file: UploadedFile) {
        self.data.append(name.into(), FormEntryValue::File(file));
    }

    /// Returns the last value submitted under `name`.
    pub fn get(&self, name: &str) -> Option<&FormEntryValue> {
        self.data.get(&name.to_string())
    }

    /// Returns the last value under `name` if it is text.
    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FormEntryValue::as_text)
    }

    /// Returns every value submitted under `name`, in submission order.
    pub fn get_all(&self, name: &str) -> &[FormEntryValue] {
        self.data
            .get_list(&name.to_string())
            .map_or(&[], Vec::as_slice)
    }

    /// Returns `true` if any value was submitted under `name`.
    pub fn contains_key(&self, name: &str) -> bool {
        self.data.contains_key(&name.to_string())
    }

    /// Returns the distinct names in first-appearance order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    /// Returns `(name, values)` pairs in first-appearance order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[FormEntryValue])> {
        self.data
            .iter()
            .map(|(k, values)| (k.as_str(), values.as_slice()))
    }

    /// Returns the number of distinct names.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if nothing was submitted.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for FormData
where
    K: Into<String>,
    V: Into<FormEntryValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut data = Self::new();
        for (k, v) in iter {
            data.append(k, v);
        }
        data
    }
}

/// Decodes a form-encoded component.
fn percent_decode(input: &str) -> String {
    let plus_decoded = input.replace('+', " ");
    percent_encoding::percent_decode_str(&plus_decoded)
        .decode_utf8_lossy()
        .into_owned()
}
