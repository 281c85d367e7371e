//! In-memory survey dataset
//!
//! A [`SurveyFrame`] is an ordered set of equally long named columns of
//! [`Cell`]s. Pipeline stages never mutate a frame they were handed: they
//! clone what they need and return a new frame.

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use rustc_hash::FxHashMap;

use crate::error::{Result, SurveyError};
use crate::models::cell::Cell;

/// A named column of cells
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    cells: Vec<Cell>,
}

impl Column {
    /// Create a new column
    pub fn new(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }

    /// Create a column with every cell set to the same value
    pub fn filled(name: impl Into<String>, value: &Cell, len: usize) -> Self {
        Self::new(name, vec![value.clone(); len])
    }

    /// Column name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column cells
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Number of cells
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the column has no cells
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// A column is numeric when every present cell is a number.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        self.cells
            .iter()
            .all(|cell| matches!(cell, Cell::Number(_) | Cell::Missing))
    }

    /// Numeric view of the column; non-numeric cells are `None`
    #[must_use]
    pub fn numbers(&self) -> Vec<Option<f64>> {
        self.cells.iter().map(Cell::as_f64).collect()
    }
}

/// An ordered collection of equally long named columns
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SurveyFrame {
    columns: Vec<Column>,
    index: FxHashMap<String, usize>,
    num_rows: usize,
}

impl SurveyFrame {
    /// Create a frame from columns.
    ///
    /// # Errors
    /// Fails when columns have different lengths or a name repeats.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let num_rows = columns.first().map_or(0, Column::len);
        let mut index = FxHashMap::default();
        for (position, column) in columns.iter().enumerate() {
            if column.len() != num_rows {
                return Err(SurveyError::invalid_data(format!(
                    "Column '{}' has {} rows, expected {num_rows}",
                    column.name(),
                    column.len()
                )));
            }
            if index.insert(column.name().to_string(), position).is_some() {
                return Err(SurveyError::invalid_data(format!(
                    "Duplicate column name '{}'",
                    column.name()
                )));
            }
        }
        Ok(Self {
            columns,
            index,
            num_rows,
        })
    }

    /// Create a frame from row-major data
    pub fn from_rows<S: AsRef<str>>(names: &[S], rows: Vec<Vec<Cell>>) -> Result<Self> {
        let mut columns: Vec<Vec<Cell>> = vec![Vec::with_capacity(rows.len()); names.len()];
        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != names.len() {
                return Err(SurveyError::invalid_data(format!(
                    "Row {row_idx} has {} cells, expected {}",
                    row.len(),
                    names.len()
                )));
            }
            for (column, cell) in columns.iter_mut().zip(row) {
                column.push(cell);
            }
        }
        Self::new(
            names
                .iter()
                .zip(columns)
                .map(|(name, cells)| Column::new(name.as_ref(), cells))
                .collect(),
        )
    }

    /// Number of rows
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Number of columns
    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Whether the frame has no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.num_rows == 0
    }

    /// Column names in order
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name().to_string()).collect()
    }

    /// All columns in order
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Whether a column exists
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Position of a column
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Look up a column by name
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.position(name).map(|idx| &self.columns[idx])
    }

    /// Cells of a column that must exist
    pub fn cells(&self, name: &str) -> Result<&[Cell]> {
        self.column(name)
            .map(Column::cells)
            .ok_or_else(|| SurveyError::ColumnNotFound(name.to_string()))
    }

    /// Replace a column with the same name, or append it.
    pub fn with_column(mut self, column: Column) -> Result<Self> {
        if column.len() != self.num_rows && !self.columns.is_empty() {
            return Err(SurveyError::invalid_data(format!(
                "Column '{}' has {} rows, expected {}",
                column.name(),
                column.len(),
                self.num_rows
            )));
        }
        if self.columns.is_empty() {
            self.num_rows = column.len();
        }
        match self.position(column.name()) {
            Some(idx) => self.columns[idx] = column,
            None => {
                self.index.insert(column.name().to_string(), self.columns.len());
                self.columns.push(column);
            }
        }
        Ok(self)
    }

    /// Apply a cell transform to one column, if present
    #[must_use]
    pub fn map_column<F>(mut self, name: &str, f: F) -> Self
    where
        F: FnMut(&Cell) -> Cell,
    {
        if let Some(idx) = self.position(name) {
            let cells = self.columns[idx].cells.iter().map(f).collect();
            self.columns[idx].cells = cells;
        }
        self
    }

    /// Apply a cell transform to every column
    #[must_use]
    pub fn map_cells<F>(mut self, mut f: F) -> Self
    where
        F: FnMut(&Cell) -> Cell,
    {
        for column in &mut self.columns {
            for cell in &mut column.cells {
                *cell = f(cell);
            }
        }
        self
    }

    /// Remove the named columns; unknown names are ignored
    #[must_use]
    pub fn without_columns<S: AsRef<str>>(self, names: &[S]) -> Self {
        let columns = self
            .columns
            .into_iter()
            .filter(|c| !names.iter().any(|n| n.as_ref() == c.name()))
            .collect::<Vec<_>>();
        let num_rows = self.num_rows;
        let mut frame = Self::new(columns).unwrap_or_default();
        if frame.columns.is_empty() {
            frame.num_rows = num_rows;
        }
        frame
    }

    /// Project the frame onto the named columns, in the given order
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Self> {
        let columns = names
            .iter()
            .map(|name| {
                self.column(name.as_ref())
                    .cloned()
                    .ok_or_else(|| SurveyError::ColumnNotFound(name.as_ref().to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(columns)
    }

    /// Keep the rows at the given indices, in the given order
    #[must_use]
    pub fn take(&self, rows: &[usize]) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|column| {
                Column::new(
                    column.name(),
                    rows.iter().map(|&row| column.cells[row].clone()).collect(),
                )
            })
            .collect::<Vec<_>>();
        Self {
            index: self.index.clone(),
            columns,
            num_rows: rows.len(),
        }
    }

    /// Keep the rows where `mask` is true
    pub fn filter(&self, mask: &[bool]) -> Result<Self> {
        if mask.len() != self.num_rows {
            return Err(SurveyError::invalid_data(format!(
                "Filter mask has {} entries, frame has {} rows",
                mask.len(),
                self.num_rows
            )));
        }
        let rows = mask
            .iter()
            .enumerate()
            .filter_map(|(row, keep)| keep.then_some(row))
            .collect::<Vec<_>>();
        Ok(self.take(&rows))
    }

    /// Stack frames vertically.
    ///
    /// Every frame must have exactly the column list of the first one, in
    /// the same order; harmonize before concatenating.
    pub fn concat(frames: &[Self]) -> Result<Self> {
        let Some(first) = frames.first() else {
            return Ok(Self::default());
        };
        let names = first.column_names();
        for (position, frame) in frames.iter().enumerate().skip(1) {
            if frame.column_names() != names {
                return Err(SurveyError::invalid_data(format!(
                    "Frame {position} does not share the column order of frame 0; harmonize before concatenating"
                )));
            }
        }
        let total = frames.iter().map(Self::num_rows).sum();
        let columns = names
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let mut cells = Vec::with_capacity(total);
                for frame in frames {
                    cells.extend_from_slice(frame.columns[idx].cells());
                }
                Column::new(name.as_str(), cells)
            })
            .collect();
        Self::new(columns)
    }

    /// Convert to an Arrow record batch.
    ///
    /// Numeric columns become `Float64`; every other column becomes `Utf8`
    /// with not-applicable cells written as `not_applicable_label`.
    pub fn to_record_batch(&self, not_applicable_label: &str) -> Result<RecordBatch> {
        let mut fields = Vec::with_capacity(self.columns.len());
        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(self.columns.len());

        for column in &self.columns {
            if column.is_numeric() {
                fields.push(Field::new(column.name(), DataType::Float64, true));
                arrays.push(Arc::new(Float64Array::from(column.numbers())));
            } else {
                fields.push(Field::new(column.name(), DataType::Utf8, true));
                let values = column
                    .cells()
                    .iter()
                    .map(|cell| match cell {
                        Cell::Missing => None,
                        Cell::NotApplicable => Some(not_applicable_label.to_string()),
                        other => Some(other.to_string()),
                    })
                    .collect::<Vec<_>>();
                arrays.push(Arc::new(StringArray::from(values)));
            }
        }

        Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
    }
}
