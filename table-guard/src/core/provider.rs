//! Read access to table cells for cross-row checks.

use crate::error::{GuardError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Capability for reading arbitrary cells of the table being validated.
///
/// Rows are addressed by position `0..row_count()`. The owner must keep the
/// values stable for the duration of one validation call.
pub trait ColumnValueProvider: Send + Sync {
    /// The value at `row` in `column`, `None` when the cell is absent.
    fn value(&self, row: usize, column: &str) -> Option<String>;

    /// Number of rows currently in the table.
    fn row_count(&self) -> usize;

    /// The stable row index of the row at `position`.
    ///
    /// Tables that never renumber rows can keep the default.
    fn row_index(&self, position: usize) -> usize {
        position
    }
}

/// One row of a [`TableSnapshot`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Stable 0-based index assigned when the row was created
    pub index: usize,
    #[serde(default)]
    pub values: HashMap<String, String>,
}

impl Row {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            values: HashMap::new(),
        }
    }

    /// Builds a row from `(column, value)` pairs.
    pub fn from_pairs<I, K, V>(index: usize, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            index,
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn with_value(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(column.into(), value.into());
        self
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }
}

/// An immutable copy of a table handed to a full pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub header: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Row>,
}

impl TableSnapshot {
    pub fn new<I, S>(header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Builds a snapshot from a header and positional records, assigning row
    /// indices in order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use table_guard::core::{ColumnValueProvider, TableSnapshot};
    ///
    /// let table = TableSnapshot::from_records(["id", "name"], [["1", "ada"], ["2", "bob"]]);
    /// assert_eq!(table.row_count(), 2);
    /// assert_eq!(table.value(1, "name").as_deref(), Some("bob"));
    /// ```
    pub fn from_records<H, S, R, C, V>(header: H, records: R) -> Self
    where
        H: IntoIterator<Item = S>,
        S: Into<String>,
        R: IntoIterator<Item = C>,
        C: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let mut snapshot = Self::new(header);
        for (index, record) in records.into_iter().enumerate() {
            let row = Row::from_pairs(
                index,
                snapshot
                    .header
                    .iter()
                    .cloned()
                    .zip(record.into_iter().map(Into::<String>::into)),
            );
            snapshot.rows.push(row);
        }
        snapshot
    }

    /// Appends a row.
    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Checks the header names are unique.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.header.len());
        for name in &self.header {
            if !seen.insert(name.as_str()) {
                return Err(GuardError::InvalidSnapshot(format!(
                    "duplicate header name '{name}'"
                )));
            }
        }
        Ok(())
    }
}

impl ColumnValueProvider for TableSnapshot {
    fn value(&self, row: usize, column: &str) -> Option<String> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(str::to_string)
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn row_index(&self, position: usize) -> usize {
        self.rows.get(position).map_or(position, |r| r.index)
    }
}
