//! Executable validation rules.
//!
//! A [`Rule`] is one check of a fixed kind. Rules are compiled from a
//! [`Field`](crate::config::Field) by the [`Validator`](crate::core::Validator)
//! and stored per column, keyed by [`RuleKind`] so a column carries at most
//! one rule of each kind.
//!
//! ## Rule kinds
//!
//! | Kind | Source | Message key |
//! |---|---|---|
//! | `NotEmpty` | `constraints.required` | `not-empty` |
//! | `Unique` | `constraints.unique` | `unique` / `unique-multiple` |
//! | `Integer` | `type: integer` | `integer` |
//! | `Number` | `type: number` | `number` |
//! | `Date` | `type: date/datetime/time` + `format` | `date-format` |
//! | `MinLength` / `MaxLength` | `constraints.minLength/maxLength` | `min-length` / `max-length` |
//! | `Regexp` | `constraints.pattern` | `regexp` |
//! | `Format` | `type: string` + `format: email/uri/uuid` | `format` |
//! | `Enumeration` | `constraints.enum` | `value-of` |
//! | `Script` | `groovy` | verbatim result or `script-error` |
//!
//! `NotEmpty` is evaluated for every value. Every other rule treats a missing
//! or empty value as valid; required-ness belongs to `NotEmpty` alone.

pub mod datatype;
pub mod format;
pub mod length;
pub mod script;
pub mod uniqueness;
pub mod values;

pub use datatype::DatePattern;
pub use format::FullMatch;
pub use script::{FnScriptEngine, ScriptEngine, ScriptValue, SharedScriptEngine};
pub use uniqueness::UniquenessIndex;

use crate::config::StringFormat;
use crate::core::result::{
    DATE_FORMAT, FORMAT, INTEGER, MAX_LENGTH, MIN_LENGTH, NOT_EMPTY, NUMBER, REGEXP, VALUE_OF,
};
use crate::core::{ColumnValueProvider, ValidationMessage};
use std::fmt;

/// Identifies the kind of a [`Rule`].
///
/// The declaration order is the order rules run in, and therefore the order
/// of messages within one cell error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RuleKind {
    NotEmpty,
    Unique,
    Integer,
    Number,
    Date,
    MinLength,
    MaxLength,
    Regexp,
    Format,
    Enumeration,
    Script,
}

impl RuleKind {
    pub fn name(&self) -> &'static str {
        match self {
            RuleKind::NotEmpty => "not_empty",
            RuleKind::Unique => "unique",
            RuleKind::Integer => "integer",
            RuleKind::Number => "number",
            RuleKind::Date => "date",
            RuleKind::MinLength => "min_length",
            RuleKind::MaxLength => "max_length",
            RuleKind::Regexp => "regexp",
            RuleKind::Format => "format",
            RuleKind::Enumeration => "enumeration",
            RuleKind::Script => "script",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single validation check.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    NotEmpty,
    Unique,
    Integer,
    Number,
    Date(DatePattern),
    MinLength(usize),
    MaxLength(usize),
    Regexp(FullMatch),
    Format(StringFormat),
    Enumeration(Vec<String>),
    Script(String),
}

/// What a rule may consult besides the value under test.
pub struct RuleContext<'a> {
    /// Column the value belongs to
    pub column: &'a str,
    /// Table access for cross-row rules
    pub provider: Option<&'a dyn ColumnValueProvider>,
    /// Scratch state of the current pass
    pub uniqueness: &'a mut UniquenessIndex,
    pub scripts: Option<&'a dyn ScriptEngine>,
}

impl Rule {
    pub fn kind(&self) -> RuleKind {
        match self {
            Rule::NotEmpty => RuleKind::NotEmpty,
            Rule::Unique => RuleKind::Unique,
            Rule::Integer => RuleKind::Integer,
            Rule::Number => RuleKind::Number,
            Rule::Date(_) => RuleKind::Date,
            Rule::MinLength(_) => RuleKind::MinLength,
            Rule::MaxLength(_) => RuleKind::MaxLength,
            Rule::Regexp(_) => RuleKind::Regexp,
            Rule::Format(_) => RuleKind::Format,
            Rule::Enumeration(_) => RuleKind::Enumeration,
            Rule::Script(_) => RuleKind::Script,
        }
    }

    /// Returns true if the rule applies to `value` at all.
    pub fn can_be_checked(&self, value: Option<&str>) -> bool {
        match self {
            Rule::NotEmpty => true,
            _ => value.is_some_and(|v| !v.is_empty()),
        }
    }

    /// Checks `value` at `row`, returning the failure message if it does not
    /// pass.
    ///
    /// Callers are expected to consult [`Rule::can_be_checked`] first.
    pub fn evaluate(
        &self,
        ctx: &mut RuleContext<'_>,
        row: usize,
        value: Option<&str>,
    ) -> Option<ValidationMessage> {
        let Some(value) = value else {
            return matches!(self, Rule::NotEmpty).then(|| ValidationMessage::new(NOT_EMPTY));
        };

        match self {
            Rule::NotEmpty => value
                .trim()
                .is_empty()
                .then(|| ValidationMessage::new(NOT_EMPTY)),
            Rule::Unique => {
                let provider = ctx.provider?;
                let others = ctx
                    .uniqueness
                    .duplicates_of(provider, ctx.column, row, value);
                uniqueness::duplicate_message(value, &others)
            }
            Rule::Integer => {
                (!datatype::is_integer(value)).then(|| ValidationMessage::new(INTEGER))
            }
            Rule::Number => (!datatype::is_number(value)).then(|| ValidationMessage::new(NUMBER)),
            Rule::Date(pattern) => (!pattern.matches(value))
                .then(|| ValidationMessage::with_params(DATE_FORMAT, [pattern.pattern()])),
            Rule::MinLength(min) => (!length::satisfies_min(value, *min))
                .then(|| ValidationMessage::with_params(MIN_LENGTH, [min.to_string()])),
            Rule::MaxLength(max) => (!length::satisfies_max(value, *max))
                .then(|| ValidationMessage::with_params(MAX_LENGTH, [max.to_string()])),
            Rule::Regexp(pattern) => (!pattern.is_match(value))
                .then(|| ValidationMessage::with_params(REGEXP, [pattern.pattern()])),
            Rule::Format(string_format) => (!format::matches_format(*string_format, value))
                .then(|| ValidationMessage::with_params(FORMAT, [string_format.name()])),
            Rule::Enumeration(allowed) => (!values::is_allowed(value, allowed)).then(|| {
                ValidationMessage::with_params(
                    VALUE_OF,
                    [value.to_string(), values::describe(allowed)],
                )
            }),
            Rule::Script(body) => script::run_script(ctx.scripts, body, value),
        }
    }
}
