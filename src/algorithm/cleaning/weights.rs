//! Expansion weight combination
//!
//! Each quarterly extract carries its expansion factor in its own column
//! (`fa_<period>`), so after unification every row has at most one non-zero
//! weight column. The columns are summed into a single expansion weight and
//! rescaled by the number of periods so that pooled estimates describe an
//! average quarter.

use crate::config::ColumnConfig;
use crate::error::{Result, SurveyError};
use crate::models::{Cell, Column, SurveyFrame};

/// Data-quality counts from weight combination
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeightReport {
    /// Source weight columns that were combined
    pub source_columns: Vec<String>,
    /// Rows with more than one non-zero source weight
    pub multiple_nonzero_rows: usize,
    /// Rows whose combined weight is zero
    pub zero_total_rows: usize,
    /// Negative source values, which contribute nothing
    pub negative_values: usize,
}

/// A frame with combined weights and its report
#[derive(Debug, Clone)]
pub struct WeightCombination {
    /// The frame with the combined columns appended and sources dropped
    pub frame: SurveyFrame,
    /// Data-quality counts
    pub report: WeightReport,
}

/// Combine the per-period weight columns into one expansion weight
///
/// # Arguments
/// * `frame` - Unified dataset
/// * `prefix` - Prefix identifying source weight columns
/// * `period_count` - Number of source periods; the adjusted weight is the sum divided by this
/// * `columns` - Names of the combined and adjusted weight columns
///
/// # Errors
/// Returns a configuration error when `period_count` is zero
pub fn combine_expansion_weights(
    frame: &SurveyFrame,
    prefix: &str,
    period_count: usize,
    columns: &ColumnConfig,
) -> Result<WeightCombination> {
    if period_count == 0 {
        return Err(SurveyError::config(
            "Cannot rescale expansion weights over zero periods",
        ));
    }

    let source_columns = frame
        .column_names()
        .into_iter()
        .filter(|name| name.starts_with(prefix))
        .collect::<Vec<_>>();

    let mut report = WeightReport {
        source_columns: source_columns.clone(),
        ..WeightReport::default()
    };

    if source_columns.is_empty() {
        log::warn!("No expansion weight columns with prefix '{prefix}'; weights left unchanged");
        return Ok(WeightCombination {
            frame: frame.clone(),
            report,
        });
    }

    let sources = source_columns
        .iter()
        .map(|name| frame.cells(name))
        .collect::<Result<Vec<_>>>()?;

    let mut totals = Vec::with_capacity(frame.num_rows());
    for row in 0..frame.num_rows() {
        let mut total = 0.0;
        let mut nonzero = 0;
        for cells in &sources {
            let value = cells[row].coerce_f64().unwrap_or(0.0);
            if value < 0.0 {
                report.negative_values += 1;
                continue;
            }
            if value > 0.0 {
                nonzero += 1;
                total += value;
            }
        }
        if nonzero > 1 {
            report.multiple_nonzero_rows += 1;
        }
        if total == 0.0 {
            report.zero_total_rows += 1;
        }
        totals.push(total);
    }

    if report.negative_values > 0 {
        log::warn!(
            "{} negative expansion weights treated as zero",
            report.negative_values
        );
    }
    if report.multiple_nonzero_rows > 0 {
        log::warn!(
            "{} rows carry more than one non-zero expansion weight; the combined weight double counts them",
            report.multiple_nonzero_rows
        );
    }
    if report.zero_total_rows > 0 {
        log::warn!(
            "{} rows have a combined expansion weight of zero",
            report.zero_total_rows
        );
    }

    let divisor = period_count as f64;
    let adjusted = totals.iter().map(|w| Cell::Number(w / divisor)).collect();
    let combined = totals.into_iter().map(Cell::Number).collect();

    let frame = frame
        .clone()
        .without_columns(&source_columns)
        .with_column(Column::new(columns.expansion_weight.as_str(), combined))?
        .with_column(Column::new(columns.adjusted_weight.as_str(), adjusted))?;

    log::info!(
        "Combined {} expansion weight columns over {period_count} periods",
        source_columns.len()
    );

    Ok(WeightCombination { frame, report })
}
