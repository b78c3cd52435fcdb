//! Prelude for commonly used types and traits in table-guard.

pub use crate::config::{Constraints, Field, FieldType, RuleConfiguration};
pub use crate::core::{
    ColumnValueProvider, RevalidationEvent, RevalidationScheduler, SchedulerConfig, TableSnapshot,
    ValidationError, ValidationMessage, Validator,
};
pub use crate::error::{GuardError, Result};
pub use crate::formatters::{FormatterConfig, HumanFormatter, JsonFormatter, ResultFormatter};
pub use crate::logging::LogConfig;
pub use crate::rules::{FnScriptEngine, ScriptEngine, ScriptValue};
