//! Core validation types and the revalidation scheduler.
//!
//! - [`Validator`] compiles a [`RuleConfiguration`](crate::config::RuleConfiguration)
//!   into a [`RuleSet`] and checks single cells, headers and whole tables.
//! - [`ColumnValueProvider`] is the read access to the table that cross-row
//!   rules need; [`TableSnapshot`] is the in-memory implementation used for
//!   full passes.
//! - [`RevalidationScheduler`] runs full passes in the background and
//!   publishes only the result of the latest request.

pub mod provider;
pub mod result;
mod scheduler;
mod validator;

pub use provider::{ColumnValueProvider, Row, TableSnapshot};
pub use result::{ValidationError, ValidationMessage};
pub use scheduler::{
    PublishedErrors, RevalidationEvent, RevalidationScheduler, SchedulerConfig, SchedulerState,
};
pub use validator::{ColumnRules, RuleSet, Validator, ValidatorBuilder};
