//! Settings for todoform.
//!
//! This module provides the [`Settings`] struct, which holds all configuration,
//! and [`LazySettings`], a globally-accessible, lazily-initialized settings
//! instance.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Default maximum size of a single uploaded file (2.5 MB).
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 2_621_440;

/// Form parsing and casting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSettings {
    /// Maximum size in bytes of a single file part in a multipart body.
    pub max_upload_size: usize,
    /// When `true`, fields without a cast hint stay text instead of going
    /// through numeric inference.
    pub strict_casting: bool,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            strict_casting: false,
        }
    }
}

/// Profanity filter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfanitySettings {
    /// Whether submitted titles and descriptions are cleaned.
    pub enabled: bool,
    /// The character each letter of a masked word is replaced with.
    pub placeholder: char,
    /// The base word list.
    pub words: Vec<String>,
    /// Words added on top of the base list.
    pub extra_words: Vec<String>,
    /// Words removed from the base list.
    pub allowed_words: Vec<String>,
}

impl Default for ProfanitySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            placeholder: '*',
            words: [
                "arse", "ass", "asshole", "bastard", "bitch", "bollocks", "crap", "damn", "dick",
                "fuck", "piss", "shit", "slut", "wanker",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
            extra_words: Vec::new(),
            allowed_words: Vec::new(),
        }
    }
}

impl ProfanitySettings {
    /// Returns the effective word list: `words` plus `extra_words`, minus
    /// `allowed_words`, compared case-insensitively.
    pub fn effective_words(&self) -> Vec<String> {
        let allowed: Vec<String> = self.allowed_words.iter().map(|w| w.to_lowercase()).collect();
        let mut out: Vec<String> = Vec::new();
        for word in self.words.iter().chain(&self.extra_words) {
            let word = word.trim().to_lowercase();
            if word.is_empty() || allowed.contains(&word) || out.contains(&word) {
                continue;
            }
            out.push(word);
        }
        out
    }
}

/// The complete set of settings.
///
/// # Examples
///
/// ```
/// use todoform_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.log_level, "info");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled.
    pub debug: bool,

    // ── Logging ──────────────────────────────────────────────────────

    /// The log filter directive (e.g. "info", "todoform_forms=trace").
    pub log_level: String,

    // ── Forms ────────────────────────────────────────────────────────

    /// Form parsing and casting configuration.
    pub forms: FormSettings,

    // ── Profanity ────────────────────────────────────────────────────

    /// Profanity filter configuration.
    pub profanity: ProfanitySettings,

    // ── Escape hatch ─────────────────────────────────────────────────

    /// Custom settings that don't fit into the above categories.
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            log_level: "info".to_string(),
            forms: FormSettings::default(),
            profanity: ProfanitySettings::default(),
            extra: HashMap::new(),
        }
    }
}

/// A lazily-initialized, globally-accessible settings container.
///
/// Call [`configure`](LazySettings::configure) once at startup to set the
/// settings, then use [`get`](LazySettings::get) to access them.
pub struct LazySettings {
    inner: OnceLock<Settings>,
}

impl Default for LazySettings {
    fn default() -> Self {
        Self::new()
    }
}

impl LazySettings {
    /// Creates a new, unconfigured `LazySettings`.
    pub const fn new() -> Self {
        Self {
            inner: OnceLock::new(),
        }
    }

    /// Configures the global settings. Must be called exactly once.
    ///
    /// # Panics
    ///
    /// Panics if settings have already been configured.
    pub fn configure(&self, settings: Settings) {
        self.inner
            .set(settings)
            .expect("Settings have already been configured");
    }

    /// Returns a reference to the configured settings.
    ///
    /// # Panics
    ///
    /// Panics if settings have not been configured.
    pub fn get(&self) -> &Settings {
        self.inner
            .get()
            .expect("Settings have not been configured. Call SETTINGS.configure() first.")
    }

    /// Returns the configured settings, or `None` before configuration.
    pub fn try_get(&self) -> Option<&Settings> {
        self.inner.get()
    }

    /// Returns `true` if settings have been configured.
    pub fn is_configured(&self) -> bool {
        self.inner.get().is_some()
    }
}

/// The global settings instance.
pub static SETTINGS: LazySettings = LazySettings::new();
