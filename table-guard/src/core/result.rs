//! Validation result types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Message key for an empty required value.
pub const NOT_EMPTY: &str = "not-empty";
/// Message key for a value duplicated in exactly one other row.
pub const UNIQUE: &str = "unique";
/// Message key for a value duplicated in several other rows.
pub const UNIQUE_MULTIPLE: &str = "unique-multiple";
pub const INTEGER: &str = "integer";
pub const NUMBER: &str = "number";
pub const DATE_FORMAT: &str = "date-format";
pub const REGEXP: &str = "regexp";
pub const FORMAT: &str = "format";
pub const VALUE_OF: &str = "value-of";
pub const MIN_LENGTH: &str = "min-length";
pub const MAX_LENGTH: &str = "max-length";
pub const SCRIPT_ERROR: &str = "script-error";
pub const HEADER_LENGTH: &str = "header-length";
pub const HEADER_MATCH: &str = "header-match";

/// A machine-readable failure: a message key plus positional parameters.
///
/// Consumers resolve `key` against their own message table and substitute
/// `params` in order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidationMessage {
    pub key: String,
    #[serde(default)]
    pub params: Vec<String>,
}

impl ValidationMessage {
    /// Creates a message without parameters.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            params: Vec::new(),
        }
    }

    /// Creates a message with positional parameters.
    pub fn with_params<I, S>(key: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key: key.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for ValidationMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            write!(f, "{}", self.key)
        } else {
            write!(f, "{}({})", self.key, self.params.join(", "))
        }
    }
}

/// All failures for one cell, or for the header when `row` is `None`.
///
/// Never empty: builders return `None` instead of an error without messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub row: Option<usize>,
    pub column: Option<String>,
    pub messages: Vec<ValidationMessage>,
}

impl ValidationError {
    /// Wraps messages for a cell, returning `None` when there are none.
    pub fn for_cell(
        row: usize,
        column: impl Into<String>,
        messages: Vec<ValidationMessage>,
    ) -> Option<Self> {
        if messages.is_empty() {
            return None;
        }
        Some(Self {
            row: Some(row),
            column: Some(column.into()),
            messages,
        })
    }

    /// Wraps header messages, returning `None` when there are none.
    pub fn for_header(messages: Vec<ValidationMessage>) -> Option<Self> {
        if messages.is_empty() {
            return None;
        }
        Some(Self {
            row: None,
            column: None,
            messages,
        })
    }

    /// Returns true if this error describes the header rather than a cell.
    pub fn is_header_error(&self) -> bool {
        self.row.is_none()
    }

    /// The 1-based line number shown to users, if this is a cell error.
    pub fn line_number(&self) -> Option<usize> {
        self.row.map(|row| row + 1)
    }

    /// Returns true if any message carries `key`.
    pub fn has_key(&self, key: &str) -> bool {
        self.messages.iter().any(|m| m.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_messages_are_not_materialized() {
        assert!(ValidationError::for_cell(0, "a", Vec::new()).is_none());
        assert!(ValidationError::for_header(Vec::new()).is_none());
    }

    #[test]
    fn test_cell_error() {
        let error =
            ValidationError::for_cell(4, "email", vec![ValidationMessage::new(NOT_EMPTY)]).unwrap();
        assert_eq!(error.row, Some(4));
        assert_eq!(error.line_number(), Some(5));
        assert_eq!(error.column.as_deref(), Some("email"));
        assert!(error.has_key(NOT_EMPTY));
        assert!(!error.is_header_error());
    }

    #[test]
    fn test_message_equality_is_structural() {
        let a = ValidationMessage::with_params(MIN_LENGTH, ["3"]);
        let b = ValidationMessage::with_params(MIN_LENGTH.to_string(), vec!["3".to_string()]);
        assert_eq!(a, b);
        assert_ne!(a, ValidationMessage::with_params(MIN_LENGTH, ["4"]));
    }

    #[test]
    fn test_wire_shape() {
        let error = ValidationError::for_header(vec![ValidationMessage::with_params(
            HEADER_LENGTH,
            ["2", "1"],
        )])
        .unwrap();
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "row": null,
                "column": null,
                "messages": [ { "key": "header-length", "params": ["2", "1"] } ]
            })
        );
    }

    #[test]
    fn test_message_display() {
        assert_eq!(ValidationMessage::new(NOT_EMPTY).to_string(), "not-empty");
        assert_eq!(
            ValidationMessage::with_params(HEADER_MATCH, ["0", "a", "b"]).to_string(),
            "header-match(0, a, b)"
        );
    }
}
