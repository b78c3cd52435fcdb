//! Scripted rules.
//!
//! The engine does not embed an interpreter. Hosts plug one in through
//! [`ScriptEngine`]; the script body is evaluated with the cell value bound to
//! the variable `value`.

use crate::core::result::SCRIPT_ERROR;
use crate::core::ValidationMessage;
use std::fmt;
use std::sync::Arc;

/// Detail reported when a script rule runs without an engine.
pub const NO_ENGINE: &str = "no script engine configured";

/// The result of evaluating a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptValue {
    Bool(bool),
    Text(String),
}

impl ScriptValue {
    /// `true` and `"true"` pass; everything else fails.
    pub fn passed(&self) -> bool {
        match self {
            ScriptValue::Bool(b) => *b,
            ScriptValue::Text(text) => text == "true",
        }
    }

    /// The textual form used as the failure message.
    pub fn into_text(self) -> String {
        match self {
            ScriptValue::Bool(b) => b.to_string(),
            ScriptValue::Text(text) => text,
        }
    }
}

impl From<bool> for ScriptValue {
    fn from(value: bool) -> Self {
        ScriptValue::Bool(value)
    }
}

impl From<String> for ScriptValue {
    fn from(value: String) -> Self {
        ScriptValue::Text(value)
    }
}

impl From<&str> for ScriptValue {
    fn from(value: &str) -> Self {
        ScriptValue::Text(value.to_string())
    }
}

/// An expression evaluator for scripted rules.
///
/// `Err` carries the compile or evaluation failure detail.
pub trait ScriptEngine: Send + Sync {
    fn evaluate(&self, script: &str, value: &str) -> Result<ScriptValue, String>;
}

/// A shared script engine.
pub type SharedScriptEngine = Arc<dyn ScriptEngine>;

/// Adapts a closure into a [`ScriptEngine`].
///
/// # Examples
///
/// ```rust
/// use table_guard::rules::{FnScriptEngine, ScriptEngine, ScriptValue};
///
/// let engine = FnScriptEngine::new(|_script: &str, value: &str| {
///     Ok(ScriptValue::Bool(value.len() > 3))
/// });
/// assert!(engine.evaluate("value.length() > 3", "abcd").unwrap().passed());
/// ```
pub struct FnScriptEngine<F> {
    f: F,
}

impl<F> FnScriptEngine<F>
where
    F: Fn(&str, &str) -> Result<ScriptValue, String> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> ScriptEngine for FnScriptEngine<F>
where
    F: Fn(&str, &str) -> Result<ScriptValue, String> + Send + Sync,
{
    fn evaluate(&self, script: &str, value: &str) -> Result<ScriptValue, String> {
        (self.f)(script, value)
    }
}

impl<F> fmt::Debug for FnScriptEngine<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnScriptEngine").finish_non_exhaustive()
    }
}

/// Runs `script` against `value`, converting every failure into a message.
///
/// A failing result is used verbatim as the message key; it is not looked up
/// in a message table.
pub fn run_script(
    engine: Option<&dyn ScriptEngine>,
    script: &str,
    value: &str,
) -> Option<ValidationMessage> {
    let Some(engine) = engine else {
        return Some(ValidationMessage::with_params(SCRIPT_ERROR, [script, NO_ENGINE]));
    };
    match engine.evaluate(script, value) {
        Ok(result) if result.passed() => None,
        Ok(result) => Some(ValidationMessage::new(result.into_text())),
        Err(detail) => Some(ValidationMessage::with_params(
            SCRIPT_ERROR,
            [script.to_string(), detail],
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn length_engine() -> FnScriptEngine<impl Fn(&str, &str) -> Result<ScriptValue, String>> {
        FnScriptEngine::new(|script: &str, value: &str| match script {
            "value.length() > 3" => Ok(ScriptValue::Bool(value.chars().count() > 3)),
            "describe" => Ok(ScriptValue::Text(format!("'{value}' is not allowed"))),
            "ok" => Ok(ScriptValue::from("true")),
            other => Err(format!("unknown expression: {other}")),
        })
    }

    #[test]
    fn test_passing_script() {
        let engine = length_engine();
        assert_eq!(run_script(Some(&engine), "value.length() > 3", "abcd"), None);
        assert_eq!(run_script(Some(&engine), "ok", ""), None);
    }

    #[test]
    fn test_false_result_is_verbatim_message() {
        let engine = length_engine();
        assert_eq!(
            run_script(Some(&engine), "value.length() > 3", "abc"),
            Some(ValidationMessage::new("false"))
        );
        assert_eq!(
            run_script(Some(&engine), "describe", "x"),
            Some(ValidationMessage::new("'x' is not allowed"))
        );
    }

    #[test]
    fn test_failure_carries_script_and_detail() {
        let engine = length_engine();
        assert_eq!(
            run_script(Some(&engine), "value.foo(", "x"),
            Some(ValidationMessage::with_params(
                SCRIPT_ERROR,
                ["value.foo(", "unknown expression: value.foo("]
            ))
        );
    }

    #[test]
    fn test_missing_engine() {
        assert_eq!(
            run_script(None, "value == 1", "1"),
            Some(ValidationMessage::with_params(
                SCRIPT_ERROR,
                ["value == 1", NO_ENGINE]
            ))
        );
    }

    #[test]
    fn test_script_value_conversions() {
        assert!(ScriptValue::from(true).passed());
        assert!(!ScriptValue::from("TRUE").passed());
        assert_eq!(ScriptValue::from(false).into_text(), "false");
    }
}
