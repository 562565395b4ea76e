//! Statement units produced by the scanner

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Number of characters of statement text shown in progress and error output
pub const PREVIEW_CHARS: usize = 100;

static CREATE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\bCREATE\s+(?:OR\s+REPLACE\s+)?(?:(?:SECURE|TEMPORARY|TEMP|TRANSIENT|MATERIALIZED|EXTERNAL|DYNAMIC|LOCAL|GLOBAL|VOLATILE)\s+)*(TASK|PROCEDURE|FUNCTION|TABLE|VIEW|SCHEMA|STREAM|STAGE|PIPE|SEQUENCE|DATABASE|WAREHOUSE|ROLE|FILE\s+FORMAT)\s+(?:IF\s+NOT\s+EXISTS\s+)?([\w$."]+)"#,
    )
    .expect("Invalid regex pattern")
});

static ALTER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)^\s*ALTER\s+(TASK|PROCEDURE|FUNCTION|TABLE|VIEW|SCHEMA|WAREHOUSE)\s+(?:IF\s+EXISTS\s+)?([\w$."]+)"#,
    )
    .expect("Invalid regex pattern")
});

/// One independently executable piece of SQL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementUnit {
    /// 1-based position in the script
    pub index: usize,
    /// 1-based source line where the statement starts
    pub line: usize,
    pub text: String,
    /// Object the statement creates or alters, e.g. `TASK load_orders`
    pub name: Option<String>,
}

impl StatementUnit {
    pub fn new(index: usize, line: usize, text: impl Into<String>) -> Self {
        let text = text.into();
        let name = extract_display_name(&text);
        Self {
            index,
            line,
            text,
            name,
        }
    }

    /// Display name, falling back to the statement's position
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("statement #{}", self.index),
        }
    }

    /// Single-line prefix of the statement text for diagnostics
    pub fn preview(&self) -> String {
        preview(&self.text, PREVIEW_CHARS)
    }
}

impl fmt::Display for StatementUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Find the object a statement creates (or alters) for display purposes
pub fn extract_display_name(text: &str) -> Option<String> {
    if let Some(caps) = CREATE_REGEX.captures(text) {
        return Some(format!("{} {}", normalize_kind(&caps[1]), &caps[2]));
    }
    ALTER_REGEX
        .captures(text)
        .map(|caps| format!("ALTER {} {}", normalize_kind(&caps[1]), &caps[2]))
}

fn normalize_kind(kind: &str) -> String {
    kind.split_whitespace()
        .map(str::to_ascii_uppercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Flatten line breaks and cut `text` to at most `max_chars` characters
pub fn preview(text: &str, max_chars: usize) -> String {
    let flat: String = text
        .chars()
        .filter(|c| *c != '\r')
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect();
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}
