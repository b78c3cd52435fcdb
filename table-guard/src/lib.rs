//! # table-guard - Configuration-driven validation for CSV-shaped tables
//!
//! table-guard checks the cells of an editable table against a per-column
//! rule configuration in the shape of a JSON Table Schema `fields` list. It
//! validates single cells inline as they are edited, checks the header row,
//! and re-validates the whole table in the background when a change can
//! affect other rows.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use table_guard::prelude::*;
//!
//! # fn example() -> table_guard::error::Result<()> {
//! let config = RuleConfiguration::from_json(r#"{ "fields": [
//!     { "name": "id", "type": "integer", "constraints": { "required": true, "unique": true } },
//!     { "name": "email", "type": "string", "format": "email" }
//! ] }"#)?;
//!
//! let table = Arc::new(TableSnapshot::from_records(
//!     ["id", "email"],
//!     [["1", "ada@example.com"], ["1", "not-an-email"]],
//! ));
//! let validator = Validator::build(config, table.clone())?;
//!
//! // A single edit on a non-unique column is checked inline.
//! let error = validator.is_valid(1, "email", Some("not-an-email")).unwrap();
//! assert!(error.has_key("format"));
//!
//! // Edits on unique columns need a full pass.
//! assert!(validator.needs_full_table_revalidation("id"));
//! let errors = validator.validate_table(&table)?;
//! println!("{}", HumanFormatter::new().format(&errors)?);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Rules
//!
//! Each configured field compiles into at most one rule per kind: not-empty,
//! unique, integer, number, date/time pattern, min/max length, regular
//! expression, string format (`email`, `uri`, `uuid`), enumeration and an
//! optional script. See [`rules`] for the exact semantics of each.
//!
//! Rule failures are data, never errors: they come back as
//! [`ValidationMessage`](core::ValidationMessage)s carrying a message key and
//! positional parameters, grouped per cell in a
//! [`ValidationError`](core::ValidationError).
//!
//! ## Background revalidation
//!
//! [`RevalidationScheduler`](core::RevalidationScheduler) runs full passes on
//! a single worker. Every request supersedes the previous one; only the result
//! of the latest request is published, and an engine fault leaves the
//! previously published list untouched.
//!
//! ## Logging
//!
//! The crate logs through `tracing`. Hosts without a subscriber can install
//! one with [`logging::setup::init_logging`].

pub mod config;
pub mod core;
pub mod error;
pub mod formatters;
pub mod logging;
pub mod prelude;
pub mod rules;
