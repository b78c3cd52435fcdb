//! Error types for the table-guard validation engine.
//!
//! Rule-level failures are never errors: a value that does not satisfy a rule
//! becomes a [`ValidationMessage`](crate::core::ValidationMessage). The
//! variants here cover invalid configurations, malformed table snapshots and
//! internal faults caught at the boundary of a full pass.

use thiserror::Error;

/// The main error type for the table-guard library.
#[derive(Error, Debug)]
pub enum GuardError {
    /// The rule configuration is structurally invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A `pattern` constraint could not be compiled.
    #[error("Invalid pattern '{pattern}' for column '{column}': {source}")]
    InvalidPattern {
        /// Column carrying the pattern constraint
        column: String,
        /// The raw pattern as configured
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Error from serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A table snapshot violates its structural invariants.
    #[error("Invalid table snapshot: {0}")]
    InvalidSnapshot(String),

    /// An unexpected internal failure during a full pass.
    #[error("Engine fault: {0}")]
    EngineFault(String),

    /// The revalidation scheduler no longer accepts requests.
    #[error("Revalidation scheduler is shut down")]
    SchedulerClosed,
}

/// A type alias for `Result<T, GuardError>`.
pub type Result<T> = std::result::Result<T, GuardError>;

impl GuardError {
    /// Creates a new configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates a new engine fault.
    pub fn engine_fault(message: impl Into<String>) -> Self {
        Self::EngineFault(message.into())
    }

    /// Returns true if this error was raised by a full pass rather than by
    /// configuration or scheduling.
    pub fn is_engine_fault(&self) -> bool {
        matches!(self, Self::EngineFault(_) | Self::InvalidSnapshot(_))
    }
}
