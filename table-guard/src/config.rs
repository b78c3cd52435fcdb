//! Column rule configuration.
//!
//! The configuration follows the shape of a JSON Table Schema `fields` list:
//!
//! ```json
//! { "fields": [
//!   { "name": "email", "type": "string", "format": "email",
//!     "constraints": { "required": true, "unique": false,
//!                      "minLength": 1, "maxLength": 255,
//!                      "pattern": null, "enum": null },
//!     "groovy": null }
//! ]}
//! ```
//!
//! Each [`Field`] names one column; its declared type, format and constraints
//! are compiled into rules by [`Validator`](crate::core::Validator).

use crate::error::{GuardError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Default pattern for `date` columns without an explicit format.
pub const DEFAULT_DATE_FORMAT: &str = "yyyy-MM-dd";
/// Default pattern for `datetime` columns without an explicit format.
pub const DEFAULT_DATETIME_FORMAT: &str = "yyyy-MM-dd'T'HH:mm:ss";
/// Default pattern for `time` columns without an explicit format.
pub const DEFAULT_TIME_FORMAT: &str = "HH:mm:ss";

/// The declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Number,
    Date,
    Datetime,
    Time,
    /// Any type name the engine has no rule for (e.g. `boolean`, `any`).
    #[serde(other)]
    Other,
}

impl FieldType {
    /// Returns the pattern used when a temporal column declares no format.
    pub fn default_format(&self) -> Option<&'static str> {
        match self {
            FieldType::Date => Some(DEFAULT_DATE_FORMAT),
            FieldType::Datetime => Some(DEFAULT_DATETIME_FORMAT),
            FieldType::Time => Some(DEFAULT_TIME_FORMAT),
            _ => None,
        }
    }

    /// Returns true for `date`, `datetime` and `time`.
    pub fn is_temporal(&self) -> bool {
        self.default_format().is_some()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Datetime => "datetime",
            FieldType::Time => "time",
            FieldType::Other => "other",
        };
        f.write_str(name)
    }
}

/// Well-known formats of `string` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StringFormat {
    Email,
    Uri,
    Uuid,
}

impl StringFormat {
    /// Parses a format name, returning `None` for names without a rule.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "email" => Some(StringFormat::Email),
            "uri" | "url" => Some(StringFormat::Uri),
            "uuid" => Some(StringFormat::Uuid),
            _ => None,
        }
    }

    /// The canonical name of this format.
    pub fn name(&self) -> &'static str {
        match self {
            StringFormat::Email => "email",
            StringFormat::Uri => "uri",
            StringFormat::Uuid => "uuid",
        }
    }
}

impl fmt::Display for StringFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-column constraints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enumeration: Option<Vec<String>>,
}

impl Constraints {
    pub fn required() -> Self {
        Self {
            required: true,
            ..Self::default()
        }
    }

    pub fn unique() -> Self {
        Self {
            unique: true,
            ..Self::default()
        }
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    pub fn with_min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    pub fn with_max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn with_enumeration<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enumeration = Some(values.into_iter().map(Into::into).collect());
        self
    }
}

/// The rule configuration of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Column name; unique within a configuration
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Constraints>,
    /// Script body evaluated against the bound variable `value`
    #[serde(
        rename = "groovy",
        alias = "script",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub script: Option<String>,
}

impl Field {
    /// Creates an untyped field without constraints.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: None,
            format: None,
            constraints: None,
            script: None,
        }
    }

    pub fn with_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = Some(constraints);
        self
    }

    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script = Some(script.into());
        self
    }

    /// The explicit format, ignoring blank values and the `default` keyword.
    pub fn explicit_format(&self) -> Option<&str> {
        self.format
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty() && !f.eq_ignore_ascii_case("default"))
    }

    /// The date/time pattern this column is checked against, if temporal.
    pub fn temporal_format(&self) -> Option<&str> {
        let field_type = self.field_type.filter(FieldType::is_temporal)?;
        self.explicit_format().or(field_type.default_format())
    }

    /// The string format this column is checked against, if any.
    pub fn string_format(&self) -> Option<StringFormat> {
        match self.field_type {
            Some(FieldType::String) => self.explicit_format().and_then(StringFormat::from_name),
            _ => None,
        }
    }

    /// The configured script, ignoring blank bodies.
    pub fn script_body(&self) -> Option<&str> {
        self.script.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Checks the field's constraints are consistent.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(GuardError::configuration("field name must not be empty"));
        }
        let Some(constraints) = &self.constraints else {
            return Ok(());
        };
        if let (Some(min), Some(max)) = (constraints.min_length, constraints.max_length) {
            if min > max {
                return Err(GuardError::configuration(format!(
                    "field '{}': minLength {min} exceeds maxLength {max}",
                    self.name
                )));
            }
        }
        if matches!(&constraints.enumeration, Some(values) if values.is_empty()) {
            return Err(GuardError::configuration(format!(
                "field '{}': enum must list at least one value",
                self.name
            )));
        }
        Ok(())
    }
}

/// A column-keyed rule configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleConfiguration {
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl RuleConfiguration {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Parses a configuration, injects default temporal formats and
    /// validates it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use table_guard::config::RuleConfiguration;
    ///
    /// let config = RuleConfiguration::from_json(
    ///     r#"{ "fields": [ { "name": "born", "type": "date" } ] }"#,
    /// ).unwrap();
    /// assert_eq!(config.field("born").unwrap().format.as_deref(), Some("yyyy-MM-dd"));
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let config: RuleConfiguration = serde_json::from_str(json)?;
        let config = config.with_default_formats();
        config.validate()?;
        Ok(config)
    }

    /// Renders the configuration in its wire shape.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Fills in the default pattern for temporal columns without a format.
    pub fn with_default_formats(mut self) -> Self {
        for field in &mut self.fields {
            if let Some(default) = field.field_type.and_then(|t| t.default_format()) {
                if field.explicit_format().is_none() {
                    field.format = Some(default.to_string());
                }
            }
        }
        self
    }

    /// Checks field names are unique and each field's constraints are
    /// consistent.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            field.validate()?;
            if !seen.insert(field.name.as_str()) {
                return Err(GuardError::configuration(format!(
                    "duplicate field name '{}'",
                    field.name
                )));
            }
        }
        Ok(())
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Inserts or replaces the field with the same name, keeping its position.
    pub fn upsert_field(&mut self, field: Field) {
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
    }

    /// The expected header: field names in declaration order.
    pub fn header_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}
