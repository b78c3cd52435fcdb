//! Regular expression and well-known string format checks.

use crate::config::StringFormat;
use crate::error::{GuardError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email regex is valid")
});

static URI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*://[^\s/?#]+[^\s]*$").expect("uri regex is valid")
});

static UUID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("uuid regex is valid")
});

/// A configured `pattern` constraint that must match the whole value.
#[derive(Debug, Clone)]
pub struct FullMatch {
    pattern: String,
    regex: Regex,
}

impl FullMatch {
    /// Compiles `pattern` anchored at both ends.
    pub fn new(column: &str, pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        let regex =
            Regex::new(&format!("^(?:{pattern})$")).map_err(|source| GuardError::InvalidPattern {
                column: column.to_string(),
                pattern: pattern.clone(),
                source,
            })?;
        Ok(Self { pattern, regex })
    }

    /// The pattern as configured, without anchors.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

impl PartialEq for FullMatch {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

/// Returns true if `value` is well-formed for `format`.
pub fn matches_format(format: StringFormat, value: &str) -> bool {
    match format {
        StringFormat::Email => EMAIL.is_match(value),
        StringFormat::Uri => URI.is_match(value),
        StringFormat::Uuid => UUID.is_match(value),
    }
}
