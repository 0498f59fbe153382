//! Multipart form-data parsing.
//!
//! [`parse_multipart`] turns a `multipart/form-data` body into [`FormData`],
//! keeping text fields and uploaded files in submission order.

use todoform_core::{TodoformError, TodoformResult};

use crate::form_data::FormData;

/// An uploaded file from a multipart form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// The original filename as provided by the client.
    pub name: String,
    /// The MIME content type of the file.
    pub content_type: String,
    /// The size of the file content in bytes.
    pub size: usize,
    /// The raw file content.
    pub content: Vec<u8>,
}

impl UploadedFile {
    /// Creates an uploaded file, computing its size from the content.
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            size: content.len(),
            content,
        }
    }
}

/// Extracts the boundary string from a `Content-Type: multipart/form-data` header.
///
/// Returns `None` if the boundary is missing or empty.
pub fn extract_boundary(content_type: &str) -> Option<&str> {
    for part in content_type.split(';') {
        let trimmed = part.trim();
        if let Some(boundary) = trimmed.strip_prefix("boundary=") {
            let boundary = boundary.trim_matches('"');
            if boundary.is_empty() {
                return None;
            }
            return Some(boundary);
        }
    }
    None
}

/// Parses a multipart/form-data request body.
///
/// Each part's `Content-Disposition` decides whether it is a text field or
/// a file. An empty file input (no filename, no content) is skipped. The body
/// is split on bytes: file content is kept verbatim and only headers and
/// text fields are decoded as UTF-8 (lossily).
///
/// # Errors
///
/// Returns [`TodoformError::BadRequest`] if a file part exceeds
/// `max_upload_size` bytes.
pub fn parse_multipart(
    body: &[u8],
    boundary: &str,
    max_upload_size: usize,
) -> TodoformResult<FormData> {
    let mut data = FormData::new();
    let delimiter = format!("--{boundary}");

    for part in split_on(body, delimiter.as_bytes()) {
        let part = strip_line_break_suffix(strip_line_break_prefix(part));

        if part.is_empty() || part.starts_with(b"--") {
            continue;
        }

        let (headers, content) = if let Some(pos) = find(part, b"\r\n\r\n") {
            (&part[..pos], &part[pos + 4..])
        } else if let Some(pos) = find(part, b"\n\n") {
            (&part[..pos], &part[pos + 2..])
        } else {
            continue;
        };

        let mut field_name = None;
        let mut filename = None;
        let mut part_content_type = "text/plain".to_string();

        for header_line in String::from_utf8_lossy(headers).lines() {
            let header_line = header_line.trim();
            let Some((header, value)) = header_line.split_once(':') else {
                continue;
            };
            let value = value.trim();

            if header.eq_ignore_ascii_case("content-disposition") {
                field_name = extract_header_param(value, "name").or(field_name);
                filename = extract_header_param(value, "filename").or(filename);
            } else if header.eq_ignore_ascii_case("content-type") {
                part_content_type = value.to_string();
            }
        }

        let Some(name) = field_name else {
            continue;
        };

        match filename {
            Some(fname) if fname.is_empty() && content.is_empty() => {}
            Some(fname) => {
                if content.len() > max_upload_size {
                    return Err(TodoformError::BadRequest(format!(
                        "File '{fname}' exceeds maximum upload size of {max_upload_size} bytes"
                    )));
                }
                let file = UploadedFile::new(fname, part_content_type, content.to_vec());
                data.append_file(name, file);
            }
            None => data.append_text(name, String::from_utf8_lossy(content)),
        }
    }

    Ok(data)
}

/// Returns the position of the first occurrence of `needle`.
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

/// Splits `haystack` on every occurrence of a non-empty `delimiter`.
fn split_on<'a>(mut haystack: &'a [u8], delimiter: &[u8]) -> Vec<&'a [u8]> {
    let mut parts = Vec::new();
    while let Some(pos) = find(haystack, delimiter) {
        parts.push(&haystack[..pos]);
        haystack = &haystack[pos + delimiter.len()..];
    }
    parts.push(haystack);
    parts
}

fn strip_line_break_prefix(bytes: &[u8]) -> &[u8] {
    bytes
        .strip_prefix(b"\r\n")
        .or_else(|| bytes.strip_prefix(b"\n"))
        .unwrap_or(bytes)
}

fn strip_line_break_suffix(bytes: &[u8]) -> &[u8] {
    bytes
        .strip_suffix(b"\r\n")
        .or_else(|| bytes.strip_suffix(b"\n"))
        .unwrap_or(bytes)
}

/// Extracts a parameter value from a header value string.
///
/// For example, from `form-data; name="field1"; filename="file.txt"`,
/// `extract_header_param(value, "name")` returns `Some("field1")`.
fn extract_header_param(header_value: &str, param_name: &str) -> Option<String> {
    for param in header_value.split(';') {
        let Some((key, value)) = param.trim().split_once('=') else {
            continue;
        };
        if key.trim().eq_ignore_ascii_case(param_name) {
            return Some(value.trim().trim_matches('"').to_string());
        }
    }
    None
}
