//! Content filtering for user-entered text.
//!
//! Titles and descriptions pass through a [`ContentFilter`] before they are
//! stored. [`WordListFilter`] masks listed words with a placeholder
//! character, one placeholder per masked character.

use std::fmt;

use regex::{Captures, Regex, RegexBuilder};

use todoform_core::settings::ProfanitySettings;
use todoform_core::{TodoformError, TodoformResult};

/// Cleans user-entered text.
pub trait ContentFilter: Send + Sync + fmt::Debug {
    /// Returns the cleaned text.
    fn clean(&self, text: &str) -> String;
}

/// Masks whole words from a word list, case-insensitively.
///
/// # Examples
///
/// ```
/// use todoform_todos::{ContentFilter, WordListFilter};
///
/// let filter = WordListFilter::new(["darn"], '*').unwrap();
/// assert_eq!(filter.clean("Darn it, darnation"), "**** it, darnation");
/// ```
#[derive(Debug, Clone)]
pub struct WordListFilter {
    pattern: Option<Regex>,
    placeholder: char,
}

impl WordListFilter {
    /// Builds a filter for the given words.
    ///
    /// Words are matched literally; empty words are ignored.
    pub fn new<I, S>(words: I, placeholder: char) -> TodoformResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let alternatives: Vec<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_string())
            .filter(|w| !w.is_empty())
            .map(|w| regex::escape(&w))
            .collect();

        if alternatives.is_empty() {
            return Ok(Self::disabled());
        }

        let pattern = RegexBuilder::new(&format!(r"\b(?:{})\b", alternatives.join("|")))
            .case_insensitive(true)
            .build()
            .map_err(|e| TodoformError::ConfigurationError(format!("Invalid word list: {e}")))?;

        Ok(Self {
            pattern: Some(pattern),
            placeholder,
        })
    }

    /// Builds the filter described by the profanity settings.
    pub fn from_settings(settings: &ProfanitySettings) -> TodoformResult<Self> {
        if !settings.enabled {
            return Ok(Self::disabled());
        }
        Self::new(settings.effective_words(), settings.placeholder)
    }

    /// A filter that leaves text unchanged.
    pub const fn disabled() -> Self {
        Self {
            pattern: None,
            placeholder: '*',
        }
    }
}

impl ContentFilter for WordListFilter {
    fn clean(&self, text: &str) -> String {
        let Some(pattern) = &self.pattern else {
            return text.to_string();
        };
        pattern
            .replace_all(text, |caps: &Captures<'_>| {
                std::iter::repeat(self.placeholder)
                    .take(caps[0].chars().count())
                    .collect::<String>()
            })
            .into_owned()
    }
}
