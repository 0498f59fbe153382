//! Settings loading from configuration files.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML or JSON file (overriding defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `TODOFORM_DEBUG` | `debug` |
//! | `TODOFORM_LOG_LEVEL` | `log_level` |
//! | `TODOFORM_MAX_UPLOAD_SIZE` | `forms.max_upload_size` |
//! | `TODOFORM_STRICT_CASTING` | `forms.strict_casting` |
//! | `TODOFORM_PROFANITY_ENABLED` | `profanity.enabled` |
//! | `TODOFORM_PROFANITY_PLACEHOLDER` | `profanity.placeholder` |
//! | `TODOFORM_PROFANITY_EXTRA_WORDS` | `profanity.extra_words` (comma-separated) |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use todoform_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("config/todoform.toml").unwrap();
//! ```

use std::path::Path;

use crate::error::TodoformError;
use crate::settings::Settings;

/// Loads settings from a TOML string.
///
/// Any settings not present in the TOML keep their default values.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or cannot be deserialized.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, TodoformError> {
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| TodoformError::ConfigurationError(format!("Failed to parse TOML: {e}")))?;
    merge_into_defaults(toml_to_json(toml_value), "TOML")
}

/// Loads settings from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Settings, TodoformError> {
    from_toml_str(&read_config(path.as_ref(), "TOML")?)
}

/// Loads settings from a TOML file and then applies environment variable overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<Settings, TodoformError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from a JSON string.
///
/// # Errors
///
/// Returns an error if the JSON is malformed or cannot be deserialized.
pub fn from_json_str(json_str: &str) -> Result<Settings, TodoformError> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| TodoformError::ConfigurationError(format!("Failed to parse JSON: {e}")))?;
    merge_into_defaults(json_value, "JSON")
}

/// Loads settings from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the JSON is malformed.
pub fn from_json_file(path: impl AsRef<Path>) -> Result<Settings, TodoformError> {
    from_json_str(&read_config(path.as_ref(), "JSON")?)
}

/// Loads settings from a JSON file and then applies environment variable overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the JSON is malformed.
pub fn from_json_file_with_env(path: impl AsRef<Path>) -> Result<Settings, TodoformError> {
    let mut settings = from_json_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies `TODOFORM_*` environment variable overrides to a settings struct.
///
/// Unparseable numeric or character values leave the setting unchanged.
pub fn apply_env_overrides(settings: &mut Settings) {
    if let Ok(val) = std::env::var("TODOFORM_DEBUG") {
        settings.debug = parse_flag(&val);
    }

    if let Ok(val) = std::env::var("TODOFORM_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Ok(val) = std::env::var("TODOFORM_MAX_UPLOAD_SIZE") {
        if let Ok(size) = val.trim().parse::<usize>() {
            settings.forms.max_upload_size = size;
        }
    }

    if let Ok(val) = std::env::var("TODOFORM_STRICT_CASTING") {
        settings.forms.strict_casting = parse_flag(&val);
    }

    if let Ok(val) = std::env::var("TODOFORM_PROFANITY_ENABLED") {
        settings.profanity.enabled = parse_flag(&val);
    }

    if let Ok(val) = std::env::var("TODOFORM_PROFANITY_PLACEHOLDER") {
        let mut chars = val.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            settings.profanity.placeholder = c;
        }
    }

    if let Ok(val) = std::env::var("TODOFORM_PROFANITY_EXTRA_WORDS") {
        settings.profanity.extra_words = val
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
}

// ============================================================
// Helpers
// ============================================================

fn parse_flag(val: &str) -> bool {
    matches!(val.to_lowercase().as_str(), "true" | "1" | "yes")
}

fn read_config(path: &Path, format: &str) -> Result<String, TodoformError> {
    std::fs::read_to_string(path).map_err(|e| {
        TodoformError::ConfigurationError(format!(
            "Failed to read {format} file '{}': {e}",
            path.display()
        ))
    })
}

/// Overlays a parsed config document onto the serialized defaults, so that
/// keys missing from the document keep their default values.
fn merge_into_defaults(value: serde_json::Value, format: &str) -> Result<Settings, TodoformError> {
    let default_json = serde_json::to_value(Settings::default()).map_err(|e| {
        TodoformError::ConfigurationError(format!("Failed to serialize default settings: {e}"))
    })?;

    serde_json::from_value(merge_json(default_json, value)).map_err(|e| {
        TodoformError::ConfigurationError(format!(
            "Failed to deserialize settings from {format}: {e}"
        ))
    })
}

/// Converts a TOML value to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => {
            let map: serde_json::Map<String, serde_json::Value> = table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
    }
}

/// Deep-merges two JSON values. The `override_val` takes precedence.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = if let Some(base_v) = base_map.remove(&key) {
                    merge_json(base_v, override_v)
                } else {
                    override_v
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── TOML loading ────────────────────────────────────────────────

    #[test]
    fn test_from_toml_str_basic() {
        let toml = r#"
            debug = false
            log_level = "todoform_forms=trace"
        "#;

        let settings = from_toml_str(toml).unwrap();
        assert!(!settings.debug);
        assert_eq!(settings.log_level, "todoform_forms=trace");
        // Defaults preserved
        assert!(settings.profanity.enabled);
    }

    #[test]
    fn test_from_toml_str_nested_sections() {
        let toml = r##"
            [forms]
            strict_casting = true

            [profanity]
            placeholder = "#"
            extra_words = ["heck"]
        "##;

        let settings = from_toml_str(toml).unwrap();
        assert!(settings.forms.strict_casting);
        // Sibling keys in a partially specified section keep their defaults
        assert_eq!(
            settings.forms.max_upload_size,
            crate::settings::DEFAULT_MAX_UPLOAD_SIZE
        );
        assert_eq!(settings.profanity.placeholder, '#');
        assert_eq!(settings.profanity.extra_words, vec!["heck"]);
        assert!(!settings.profanity.words.is_empty());
    }

    #[test]
    fn test_from_toml_str_empty() {
        let settings = from_toml_str("").unwrap();
        assert!(settings.debug);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_from_toml_str_invalid() {
        let result = from_toml_str("[[invalid toml content");
        assert!(matches!(result, Err(TodoformError::ConfigurationError(_))));
    }

    #[test]
    fn test_from_toml_str_wrong_type() {
        let result = from_toml_str("debug = \"sometimes\"");
        assert!(result.is_err());
    }

    // ── JSON loading ────────────────────────────────────────────────

    #[test]
    fn test_from_json_str_basic() {
        let json = r#"{
            "debug": false,
            "forms": { "max_upload_size": 1024 }
        }"#;

        let settings = from_json_str(json).unwrap();
        assert!(!settings.debug);
        assert_eq!(settings.forms.max_upload_size, 1024);
        assert!(!settings.forms.strict_casting);
    }

    #[test]
    fn test_from_json_str_invalid() {
        assert!(from_json_str("{invalid json").is_err());
    }

    // ── File loading ────────────────────────────────────────────────

    #[test]
    fn test_from_toml_file() {
        let dir = std::env::temp_dir().join("todoform_test_toml");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.toml");
        std::fs::write(&path, "debug = false\n").unwrap();

        let settings = from_toml_file(&path).unwrap();
        assert!(!settings.debug);

        std::fs::remove_file(&path).ok();
        std::fs::remove_dir(&dir).ok();
    }

    #[test]
    fn test_from_json_file() {
        let dir = std::env::temp_dir().join("todoform_test_json");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.json");
        std::fs::write(&path, r#"{"log_level": "warn"}"#).unwrap();

        let settings = from_json_file(&path).unwrap();
        assert_eq!(settings.log_level, "warn");

        std::fs::remove_file(&path).ok();
        std::fs::remove_dir(&dir).ok();
    }

    #[test]
    fn test_from_file_missing() {
        assert!(from_toml_file("/nonexistent/path/settings.toml").is_err());
        assert!(from_json_file("/nonexistent/path/settings.json").is_err());
    }

    // ── Environment variable overrides ──────────────────────────────
    // Each test owns a distinct variable so they can run in parallel.

    #[test]
    fn test_apply_env_overrides_debug() {
        let mut settings = Settings::default();
        std::env::set_var("TODOFORM_DEBUG", "0");
        apply_env_overrides(&mut settings);
        assert!(!settings.debug);
        std::env::remove_var("TODOFORM_DEBUG");
    }

    #[test]
    fn test_apply_env_overrides_max_upload_size() {
        let mut settings = Settings::default();
        std::env::set_var("TODOFORM_MAX_UPLOAD_SIZE", "4096");
        apply_env_overrides(&mut settings);
        assert_eq!(settings.forms.max_upload_size, 4096);
        std::env::remove_var("TODOFORM_MAX_UPLOAD_SIZE");
    }

    #[test]
    fn test_apply_env_overrides_placeholder_rejects_multiple_chars() {
        let mut settings = Settings::default();
        std::env::set_var("TODOFORM_PROFANITY_PLACEHOLDER", "##");
        apply_env_overrides(&mut settings);
        assert_eq!(settings.profanity.placeholder, '*');
        std::env::remove_var("TODOFORM_PROFANITY_PLACEHOLDER");
    }

    #[test]
    fn test_apply_env_overrides_extra_words() {
        let mut settings = Settings::default();
        std::env::set_var("TODOFORM_PROFANITY_EXTRA_WORDS", "heck, gosh,,");
        apply_env_overrides(&mut settings);
        assert_eq!(settings.profanity.extra_words, vec!["heck", "gosh"]);
        std::env::remove_var("TODOFORM_PROFANITY_EXTRA_WORDS");
    }

    #[test]
    fn test_from_env_strict_casting() {
        std::env::set_var("TODOFORM_STRICT_CASTING", "yes");
        let settings = from_env();
        assert!(settings.forms.strict_casting);
        std::env::remove_var("TODOFORM_STRICT_CASTING");
    }

    // ── merge_json helper ───────────────────────────────────────────

    #[test]
    fn test_merge_json_nested() {
        let base = serde_json::json!({"outer": {"a": 1, "b": 2}, "c": 3});
        let over = serde_json::json!({"outer": {"b": 5}});
        let merged = merge_json(base, over);
        assert_eq!(merged["outer"]["a"], 1);
        assert_eq!(merged["outer"]["b"], 5);
        assert_eq!(merged["c"], 3);
    }

    #[test]
    fn test_merge_json_array_override() {
        let base = serde_json::json!({"list": [1, 2, 3]});
        let over = serde_json::json!({"list": [4]});
        assert_eq!(merge_json(base, over)["list"], serde_json::json!([4]));
    }
}
