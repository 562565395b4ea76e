//! `{KEY}` placeholder substitution
//!
//! Scripts reference environment-specific names through `{KEY}` tokens,
//! e.g. `USE DATABASE {DATABASE_NAME};`. Substitution happens once per
//! script, before scanning.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

static PLACEHOLDER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^{}]+)\}").expect("Invalid regex pattern"));

static CONVENTIONAL_KEY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Z][A-Z0-9_]*)\}").expect("Invalid regex pattern"));

/// Placeholder key for the target database name
pub const DATABASE_NAME: &str = "DATABASE_NAME";
/// Placeholder key for the target warehouse / compute pool name
pub const WAREHOUSE_NAME: &str = "WAREHOUSE_NAME";
/// Placeholder key for the deployment role name
pub const ROLE_NAME: &str = "ROLE_NAME";

/// Mapping from placeholder key (without braces) to its replacement literal
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderMap {
    values: HashMap<String, String>,
}

impl PlaceholderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a key, replacing any previous value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(key.into(), value.into())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Replace every `{KEY}` whose key is mapped.
    ///
    /// This is a single pass over the input: replacement values are copied
    /// into the output as-is and never re-scanned, so a value that itself
    /// looks like `{OTHER}` stays literal. Tokens with no mapping pass
    /// through unchanged.
    pub fn apply(&self, text: &str) -> String {
        if self.values.is_empty() {
            return text.to_string();
        }

        PLACEHOLDER_REGEX
            .replace_all(text, |caps: &Captures| match self.values.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Upper-case `{KEY}` tokens in `text` that have no mapping.
    ///
    /// Only tokens shaped like conventional placeholder keys are reported so
    /// that braces in procedure bodies are not mistaken for placeholders.
    pub fn unresolved(&self, text: &str) -> Vec<String> {
        let mut missing: Vec<String> = CONVENTIONAL_KEY_REGEX
            .captures_iter(text)
            .map(|caps| caps[1].to_string())
            .filter(|key| !self.values.contains_key(key))
            .collect();
        missing.sort();
        missing.dedup();
        missing
    }
}

impl<K, V> FromIterator<(K, V)> for PlaceholderMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
