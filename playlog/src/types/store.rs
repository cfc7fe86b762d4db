use std::collections::HashSet;

use crate::bail;
use crate::error::{ErrorKind, PlaylogResult};
use crate::types::event::PLAYED_AT_COLUMN;
use crate::types::played_at::PlayedAt;

/// A single store value. `None` is the null marker.
pub type Cell = Option<String>;

/// Ordered list of named cells produced for one event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    cells: Vec<(String, Cell)>,
}

impl Record {
    /// Appends a cell. Column names are expected to be unique within a record.
    pub fn push(&mut self, column: &str, value: Cell) {
        self.cells.push((column.to_string(), value));
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(column, _)| column.as_str())
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .and_then(|(_, value)| value.as_deref())
    }

    pub fn cells(&self) -> &[(String, Cell)] {
        &self.cells
    }
}

/// Ordered rows under a reconciled column schema.
///
/// Every row has exactly one cell per column. Adding a column pads all existing rows with the
/// null marker, so the column set only ever grows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Store {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Store {
    /// Creates an empty store with the given columns.
    pub fn with_columns<I, S>(columns: I) -> PlaylogResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_parts(columns.into_iter().map(Into::into).collect(), Vec::new())
    }

    /// Builds a store from decoded columns and rows.
    ///
    /// Fails with [`ErrorKind::StoreCorrupted`] when a column name repeats or a row width does
    /// not match the header.
    pub fn from_parts(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> PlaylogResult<Self> {
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.as_str()) {
                bail!(
                    ErrorKind::StoreCorrupted,
                    "Store has a duplicated column",
                    format!("column `{column}` appears more than once")
                );
            }
        }

        for (index, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                bail!(
                    ErrorKind::StoreCorrupted,
                    "Store row does not match the header",
                    format!(
                        "row {index} has {} cells, header has {} columns",
                        row.len(),
                        columns.len()
                    )
                );
            }
        }

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|name| name == column)
    }

    /// Returns the non-null value at `row` for `column`.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index)?.as_deref()
    }

    /// Returns the index of `column`, appending it when absent.
    pub fn ensure_column(&mut self, column: &str) -> usize {
        if let Some(index) = self.column_index(column) {
            return index;
        }

        self.columns.push(column.to_string());
        for row in &mut self.rows {
            row.push(None);
        }

        self.columns.len() - 1
    }

    /// Appends a record as a new row, growing the schema with any unseen column.
    pub fn push_record(&mut self, record: &Record) {
        for column in record.columns() {
            self.ensure_column(column);
        }

        let mut row = vec![None; self.columns.len()];
        for (column, value) in record.cells() {
            if let Some(index) = self.column_index(column) {
                row[index] = value.clone();
            }
        }

        self.rows.push(row);
    }

    /// Appends the rows of `other`, mapping cells by column name.
    ///
    /// Columns of `other` unknown to `self` are appended to the schema first.
    pub fn extend_from(&mut self, other: &Store) {
        for column in &other.columns {
            self.ensure_column(column);
        }

        let mapping: Vec<usize> = other
            .columns
            .iter()
            .filter_map(|column| self.column_index(column))
            .collect();

        for source in &other.rows {
            let mut row = vec![None; self.columns.len()];
            for (value, &target) in source.iter().zip(&mapping) {
                row[target] = value.clone();
            }
            self.rows.push(row);
        }
    }

    /// Computes the maximum `played_at` over all rows.
    ///
    /// Returns `None` for a store without rows. Fails with
    /// [`ErrorKind::WatermarkUnavailable`] when rows exist but any of them lacks a parseable
    /// `played_at`, since a partial maximum could admit duplicates.
    pub fn watermark(&self) -> PlaylogResult<Option<PlayedAt>> {
        if self.rows.is_empty() {
            return Ok(None);
        }

        let Some(index) = self.column_index(PLAYED_AT_COLUMN) else {
            bail!(
                ErrorKind::WatermarkUnavailable,
                "Store has no played_at column",
                format!("{} rows without a `{PLAYED_AT_COLUMN}` column", self.rows.len())
            );
        };

        let mut watermark: Option<PlayedAt> = None;
        for (row_index, row) in self.rows.iter().enumerate() {
            let Some(raw) = row[index].as_deref() else {
                bail!(
                    ErrorKind::WatermarkUnavailable,
                    "Store row has no played_at value",
                    format!("row {row_index}")
                );
            };

            let played_at = match PlayedAt::parse(raw) {
                Ok(played_at) => played_at,
                Err(err) => bail!(
                    ErrorKind::WatermarkUnavailable,
                    "Store row has an invalid played_at value",
                    format!("row {row_index}: `{raw}`: {err}")
                ),
            };

            if watermark.as_ref().is_none_or(|current| played_at > *current) {
                watermark = Some(played_at);
            }
        }

        Ok(watermark)
    }
}
