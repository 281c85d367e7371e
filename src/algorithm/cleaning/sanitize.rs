//! Sentinel code sanitization
//!
//! Survey extracts encode "not captured" with out-of-range codes such as 99
//! or 999999. Every column listed in the sentinel table is cleared of those
//! codes and coerced to numbers; values that cannot be read as numbers become
//! missing. Columns outside the table are left alone.

use std::collections::BTreeMap;

use crate::config::SentinelCodeTable;
use crate::models::{Cell, SurveyFrame};

/// What sanitization changed, per column
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanitizeReport {
    /// Sentinel codes replaced with missing
    pub replaced: BTreeMap<String, usize>,
    /// Non-numeric values coerced to missing
    pub coerced_to_missing: BTreeMap<String, usize>,
    /// Table columns the frame does not have
    pub absent_columns: Vec<String>,
}

impl SanitizeReport {
    /// Total sentinel replacements
    #[must_use]
    pub fn total_replaced(&self) -> usize {
        self.replaced.values().sum()
    }

    /// Total coercions to missing
    #[must_use]
    pub fn total_coerced(&self) -> usize {
        self.coerced_to_missing.values().sum()
    }
}

/// A sanitized frame and its report
#[derive(Debug, Clone)]
pub struct Sanitized {
    /// The sanitized frame
    pub frame: SurveyFrame,
    /// Counts of what changed
    pub report: SanitizeReport,
}

enum Outcome {
    Kept,
    Replaced,
    Coerced,
}

fn sanitize_cell(cell: &Cell, is_sentinel: impl Fn(f64) -> bool) -> (Cell, Outcome) {
    match cell {
        Cell::Missing | Cell::NotApplicable => (cell.clone(), Outcome::Kept),
        Cell::Number(value) if is_sentinel(*value) => (Cell::Missing, Outcome::Replaced),
        Cell::Number(_) => (cell.clone(), Outcome::Kept),
        Cell::Text(_) => match cell.coerce_f64() {
            Some(value) if is_sentinel(value) => (Cell::Missing, Outcome::Replaced),
            Some(value) => (Cell::Number(value), Outcome::Kept),
            None => (Cell::Missing, Outcome::Coerced),
        },
    }
}

/// Clear sentinel codes and coerce the listed columns to numbers
///
/// Applying this twice gives the same frame as applying it once.
///
/// # Arguments
/// * `frame` - The dataset to sanitize
/// * `table` - Sentinel codes per column
#[must_use]
pub fn sanitize(frame: &SurveyFrame, table: &SentinelCodeTable) -> Sanitized {
    let mut report = SanitizeReport::default();
    let mut result = frame.clone();

    for column in table.columns.keys() {
        if !frame.has_column(column) {
            report.absent_columns.push(column.clone());
            continue;
        }

        let mut replaced = 0;
        let mut coerced = 0;
        result = result.map_column(column, |cell| {
            let (cell, outcome) = sanitize_cell(cell, |value| table.is_sentinel(column, value));
            match outcome {
                Outcome::Replaced => replaced += 1,
                Outcome::Coerced => coerced += 1,
                Outcome::Kept => {}
            }
            cell
        });

        if replaced > 0 {
            report.replaced.insert(column.clone(), replaced);
        }
        if coerced > 0 {
            report.coerced_to_missing.insert(column.clone(), coerced);
        }
    }

    log::info!(
        "Sanitized {} columns (table v{}): {} sentinel codes replaced, {} values coerced to missing",
        table.columns.len() - report.absent_columns.len(),
        table.version,
        report.total_replaced(),
        report.total_coerced()
    );
    if !report.absent_columns.is_empty() {
        log::debug!("Sentinel columns not present: {:?}", report.absent_columns);
    }

    Sanitized {
        frame: result,
        report,
    }
}
