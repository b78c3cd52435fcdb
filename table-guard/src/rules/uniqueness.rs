//! Cross-row uniqueness.
//!
//! Whether a value is unique depends on every other row, so the check reads
//! the column through a [`ColumnValueProvider`]. Each column is scanned once
//! per pass into a value → row index map; the map lives in a
//! [`UniquenessIndex`] owned by the pass and is dropped with it.

use crate::core::result::{UNIQUE, UNIQUE_MULTIPLE};
use crate::core::{ColumnValueProvider, ValidationMessage};
use std::collections::HashMap;

type ColumnIndex = HashMap<String, Vec<usize>>;

/// Per-pass scratch state for uniqueness checks.
#[derive(Debug, Default)]
pub struct UniquenessIndex {
    columns: HashMap<String, ColumnIndex>,
}

impl UniquenessIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of columns scanned so far.
    pub fn scanned_columns(&self) -> usize {
        self.columns.len()
    }

    /// Row indices other than `row` whose `column` holds `value`, ascending.
    pub fn duplicates_of(
        &mut self,
        provider: &dyn ColumnValueProvider,
        column: &str,
        row: usize,
        value: &str,
    ) -> Vec<usize> {
        let index = self
            .columns
            .entry(column.to_string())
            .or_insert_with(|| scan(provider, column));

        index
            .get(value)
            .map(|rows| rows.iter().copied().filter(|&r| r != row).collect())
            .unwrap_or_default()
    }
}

fn scan(provider: &dyn ColumnValueProvider, column: &str) -> ColumnIndex {
    let mut index = ColumnIndex::new();
    for position in 0..provider.row_count() {
        let Some(value) = provider.value(position, column) else {
            continue;
        };
        if value.is_empty() {
            continue;
        }
        index
            .entry(value)
            .or_default()
            .push(provider.row_index(position));
    }
    for rows in index.values_mut() {
        rows.sort_unstable();
    }
    index
}

/// Builds the failure message for `value` duplicated at `others`.
///
/// Row indices are reported as 1-based line numbers.
pub fn duplicate_message(value: &str, others: &[usize]) -> Option<ValidationMessage> {
    let lines: Vec<String> = others.iter().map(|r| (r + 1).to_string()).collect();
    match lines.len() {
        0 => None,
        1 => Some(ValidationMessage::with_params(
            UNIQUE,
            [value.to_string(), lines.join(", ")],
        )),
        _ => Some(ValidationMessage::with_params(
            UNIQUE_MULTIPLE,
            [value.to_string(), lines.join(", ")],
        )),
    }
}
