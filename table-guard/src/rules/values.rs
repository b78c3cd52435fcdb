//! Enumerated value membership.

/// Returns true if `value` is one of `allowed`, compared exactly.
pub fn is_allowed(value: &str, allowed: &[String]) -> bool {
    allowed.iter().any(|candidate| candidate == value)
}

/// The allowed values as shown in messages.
pub fn describe(allowed: &[String]) -> String {
    allowed.join(", ")
}
