//! # todoform-forms
//!
//! The form-handling pipeline: a raw submission ([`FormData`]) is cast into a
//! typed [`CoercedRecord`] by [`cast_form_data`], then checked against a
//! declarative [`Schema`] by [`validate_form`], which yields either the
//! normalized data or an exhaustive per-field error map.
//!
//! ```
//! use todoform_forms::{cast_form_data, CastHint, CastHints, FormData, FormValue};
//!
//! let data = FormData::parse_urlencoded("title=42&done=on&count=7");
//! let hints = CastHints::new().hint("title", CastHint::String);
//! let record = cast_form_data(&data, Some(&hints));
//!
//! assert_eq!(record.get("title"), Some(&FormValue::Text("42".into())));
//! assert_eq!(record.get("done"), Some(&FormValue::Bool(true)));
//! assert_eq!(record.get("count"), Some(&FormValue::Number(7.0)));
//! ```

pub mod cast;
pub mod form_data;
pub mod schema;
pub mod upload;
pub mod validation;

pub use cast::{
    cast_form_data, parse_number, CastHint, CastHints, CoercedRecord, Fallback, FormValue,
};
pub use form_data::{FormData, FormEntryValue};
pub use schema::{
    FieldSchema, FieldTest, FieldType, FnTest, Schema, SchemaError, ValidateOptions,
};
pub use upload::{extract_boundary, UploadedFile};
pub use validation::{validate_form, validate_record, FieldError, FormErrors, FormResult};
