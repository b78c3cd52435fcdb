//! Rendering of validation error lists.
//!
//! Two formatters ship with the crate: [`JsonFormatter`] for programmatic
//! consumers and [`HumanFormatter`] for consoles and logs. Neither resolves
//! message keys into localized text; messages render as `key(param, ...)`.
//!
//! # Examples
//!
//! ```rust
//! use table_guard::core::{ValidationError, ValidationMessage};
//! use table_guard::formatters::{HumanFormatter, ResultFormatter};
//!
//! let errors = ValidationError::for_cell(0, "id", vec![ValidationMessage::new("integer")])
//!     .into_iter()
//!     .collect::<Vec<_>>();
//! let output = HumanFormatter::new().format(&errors).unwrap();
//! assert!(output.contains("line 1, column 'id': integer"));
//! ```

use crate::core::ValidationError;
use crate::error::Result;
use serde::Serialize;
use std::collections::BTreeSet;

/// Configuration options for formatting error lists.
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    /// Include the summary block
    pub include_summary: bool,
    /// Include individual errors
    pub include_errors: bool,
    /// Maximum number of errors to display (`None` for all)
    pub max_errors: Option<usize>,
    /// Whether to use colorized output (for human formatter)
    pub use_colors: bool,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            include_summary: true,
            include_errors: true,
            max_errors: None,
            use_colors: true,
        }
    }
}

impl FormatterConfig {
    /// Creates a minimal configuration showing only the summary.
    pub fn minimal() -> Self {
        Self {
            include_summary: true,
            include_errors: false,
            max_errors: Some(0),
            use_colors: false,
        }
    }

    /// Creates a configuration suitable for CI environments.
    pub fn ci() -> Self {
        Self {
            include_summary: true,
            include_errors: true,
            max_errors: Some(50),
            use_colors: false,
        }
    }

    pub fn with_summary(mut self, include: bool) -> Self {
        self.include_summary = include;
        self
    }

    pub fn with_errors(mut self, include: bool) -> Self {
        self.include_errors = include;
        self
    }

    /// Sets the maximum number of errors to display.
    pub fn with_max_errors(mut self, max: usize) -> Self {
        self.max_errors = Some(max);
        self
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    fn visible<'a>(&self, errors: &'a [ValidationError]) -> &'a [ValidationError] {
        if !self.include_errors {
            return &[];
        }
        match self.max_errors {
            Some(max) => &errors[..max.min(errors.len())],
            None => errors,
        }
    }
}

/// Aggregate counts over an error list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorSummary {
    pub total_errors: usize,
    pub header_errors: usize,
    pub rows_with_errors: usize,
    pub total_messages: usize,
}

impl ErrorSummary {
    pub fn of(errors: &[ValidationError]) -> Self {
        let rows: BTreeSet<usize> = errors.iter().filter_map(|e| e.row).collect();
        Self {
            total_errors: errors.len(),
            header_errors: errors.iter().filter(|e| e.is_header_error()).count(),
            rows_with_errors: rows.len(),
            total_messages: errors.iter().map(|e| e.messages.len()).sum(),
        }
    }
}

/// Trait for formatting error lists into different output formats.
pub trait ResultFormatter {
    /// Formats `errors` with the formatter's own configuration.
    fn format(&self, errors: &[ValidationError]) -> Result<String>;

    /// Formats `errors` with a custom configuration.
    fn format_with_config(
        &self,
        errors: &[ValidationError],
        _config: &FormatterConfig,
    ) -> Result<String> {
        self.format(errors)
    }
}

/// Formats error lists as JSON.
///
/// The output is an object with an optional `summary` and the `errors` in
/// their wire shape (0-based `row`).
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    config: FormatterConfig,
    pretty: bool,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ErrorSummary>,
    errors: &'a [ValidationError],
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
            pretty: true,
        }
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            pretty: true,
        }
    }

    /// Sets whether to use pretty-printed JSON.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultFormatter for JsonFormatter {
    fn format(&self, errors: &[ValidationError]) -> Result<String> {
        self.format_with_config(errors, &self.config)
    }

    fn format_with_config(
        &self,
        errors: &[ValidationError],
        config: &FormatterConfig,
    ) -> Result<String> {
        let report = JsonReport {
            summary: config.include_summary.then(|| ErrorSummary::of(errors)),
            errors: config.visible(errors),
        };
        let json = if self.pretty {
            serde_json::to_string_pretty(&report)?
        } else {
            serde_json::to_string(&report)?
        };
        Ok(json)
    }
}

/// Formats error lists for reading in a terminal.
///
/// Rows are shown as 1-based line numbers.
#[derive(Debug, Clone)]
pub struct HumanFormatter {
    config: FormatterConfig,
}

impl HumanFormatter {
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
        }
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self { config }
    }

    fn describe(error: &ValidationError) -> String {
        let messages = error
            .messages
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        match (error.line_number(), error.column.as_deref()) {
            (Some(line), Some(column)) => format!("line {line}, column '{column}': {messages}"),
            (Some(line), None) => format!("line {line}: {messages}"),
            (None, Some(column)) => format!("column '{column}': {messages}"),
            (None, None) => format!("header: {messages}"),
        }
    }
}

impl Default for HumanFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultFormatter for HumanFormatter {
    fn format(&self, errors: &[ValidationError]) -> Result<String> {
        self.format_with_config(errors, &self.config)
    }

    fn format_with_config(
        &self,
        errors: &[ValidationError],
        config: &FormatterConfig,
    ) -> Result<String> {
        let mut output = String::new();
        let (red, green, reset) = if config.use_colors {
            ("\x1b[31m", "\x1b[32m", "\x1b[0m")
        } else {
            ("", "", "")
        };

        if errors.is_empty() {
            output.push_str(&format!("{green}Validation PASSED{reset}\n"));
        } else {
            output.push_str(&format!("{red}Validation FAILED{reset}\n"));
        }

        if config.include_summary {
            let summary = ErrorSummary::of(errors);
            output.push_str(&format!(
                "\nSummary:\n   Errors: {}\n   Header errors: {}\n   Rows with errors: {}\n   Messages: {}\n",
                summary.total_errors,
                summary.header_errors,
                summary.rows_with_errors,
                summary.total_messages
            ));
        }

        let visible = config.visible(errors);
        if !visible.is_empty() {
            output.push_str("\nErrors:\n");
            for error in visible {
                output.push_str(&format!("   {}\n", Self::describe(error)));
            }
            if visible.len() < errors.len() {
                output.push_str(&format!(
                    "   ... and {} more\n",
                    errors.len() - visible.len()
                ));
            }
        }

        Ok(output)
    }
}
