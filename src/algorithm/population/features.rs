//! Derived features
//!
//! Age bands, the informality indicator, and the not-applicable marking of
//! job questions for respondents without a job.

use crate::config::{InformalityPolicy, SegregationConfig};
use crate::error::{Result, SurveyError};
use crate::models::{Cell, Column, SurveyFrame};

/// Left-closed age bands with an open-ended last band
#[derive(Debug, Clone, PartialEq)]
pub struct AgeBands {
    edges: Vec<f64>,
    labels: Vec<String>,
}

fn format_edge(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

impl AgeBands {
    /// Build bands from their lower edges.
    ///
    /// `[14, 18, 65]` gives `14-17`, `18-64` and `65+`.
    ///
    /// # Errors
    /// Fails when the edges are empty or not strictly increasing
    pub fn new(edges: &[f64]) -> Result<Self> {
        if edges.is_empty() || edges.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(SurveyError::config(format!(
                "Age band edges must be non-empty and strictly increasing: {edges:?}"
            )));
        }

        let labels = edges
            .iter()
            .enumerate()
            .map(|(idx, &lower)| match edges.get(idx + 1) {
                Some(&upper) if lower.fract() == 0.0 && upper.fract() == 0.0 => {
                    format!("{}-{}", format_edge(lower), format_edge(upper - 1.0))
                }
                Some(&upper) => format!("{}-{}", format_edge(lower), format_edge(upper)),
                None => format!("{}+", format_edge(lower)),
            })
            .collect();

        Ok(Self {
            edges: edges.to_vec(),
            labels,
        })
    }

    /// Band labels in ascending order
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Index of the band containing `age`; `None` below the first edge
    #[must_use]
    pub fn index_of(&self, age: f64) -> Option<usize> {
        if age.is_nan() || age < self.edges[0] {
            return None;
        }
        Some(self.edges.partition_point(|&edge| edge <= age) - 1)
    }

    /// Label of the band containing `age`
    #[must_use]
    pub fn label_of(&self, age: f64) -> Option<&str> {
        self.index_of(age).map(|idx| self.labels[idx].as_str())
    }
}

/// Append the age band column
pub fn add_age_band(
    frame: SurveyFrame,
    age_column: &str,
    band_column: &str,
    bands: &AgeBands,
) -> Result<SurveyFrame> {
    let cells = frame
        .cells(age_column)?
        .iter()
        .map(|cell| {
            cell.coerce_f64()
                .and_then(|age| bands.label_of(age))
                .map_or(Cell::Missing, Cell::text)
        })
        .collect();
    frame.with_column(Column::new(band_column, cells))
}

/// Whether an employment-status cell means "employed".
///
/// Accepts the recoded label or the raw code; anything else, including a
/// missing status, counts as not employed.
#[must_use]
pub fn is_employed(status: &Cell, config: &SegregationConfig) -> bool {
    match status {
        Cell::Text(label) => label == &config.employed_label,
        Cell::Number(_) => status.as_code() == Some(config.employed_code),
        Cell::Missing | Cell::NotApplicable => false,
    }
}

/// Informality indicator for one respondent
///
/// 1 when employed without social-security coverage, 0 when covered or not
/// employed. Employed respondents with unknown coverage follow the policy.
#[must_use]
pub fn informality(status: &Cell, coverage: Option<&Cell>, config: &SegregationConfig) -> Cell {
    if !is_employed(status, config) {
        return Cell::from(0);
    }
    match coverage.and_then(Cell::coerce_f64) {
        Some(code) if code == config.no_coverage_code as f64 => Cell::from(1),
        Some(_) => Cell::from(0),
        None => match config.informality_policy {
            InformalityPolicy::PropagateMissing => Cell::Missing,
            InformalityPolicy::DefaultFormal => Cell::from(0),
        },
    }
}

/// Append the informality indicator column
pub fn add_informality(
    frame: SurveyFrame,
    status_column: &str,
    coverage_column: &str,
    indicator_column: &str,
    config: &SegregationConfig,
) -> Result<SurveyFrame> {
    let status = frame.cells(status_column)?;
    let coverage = frame.column(coverage_column).map(Column::cells);
    if coverage.is_none() {
        log::warn!(
            "Coverage column {coverage_column} not found; employed respondents follow the {:?} policy",
            config.informality_policy
        );
    }

    let cells = status
        .iter()
        .enumerate()
        .map(|(row, status)| informality(status, coverage.map(|c| &c[row]), config))
        .collect::<Vec<_>>();

    let missing = cells.iter().filter(|c| c.is_missing()).count();
    if missing > 0 {
        log::info!("{missing} employed respondents have unknown informality (coverage missing)");
    }

    frame.with_column(Column::new(indicator_column, cells))
}

fn question_number(name: &str) -> Option<u32> {
    let digits = name
        .chars()
        .skip(1)
        .take_while(char::is_ascii_digit)
        .collect::<String>();
    digits.parse().ok()
}

/// Whether a column only applies to employed respondents
#[must_use]
pub fn is_employed_only_column(name: &str, config: &SegregationConfig) -> bool {
    if config.not_applicable_columns.iter().any(|c| c == name) {
        return true;
    }
    config
        .not_applicable_prefixes
        .iter()
        .any(|prefix| name.starts_with(prefix.as_str()))
        && config
            .not_applicable_min_question
            .is_none_or(|min| question_number(name).is_some_and(|q| q >= min))
}

/// Mark job questions as not applicable for respondents without a job
///
/// Returns the new frame and the number of cells marked.
pub fn fill_not_applicable(
    frame: SurveyFrame,
    status_column: &str,
    config: &SegregationConfig,
) -> Result<(SurveyFrame, usize)> {
    let not_employed = frame
        .cells(status_column)?
        .iter()
        .map(|status| !is_employed(status, config))
        .collect::<Vec<_>>();

    let targets = frame
        .column_names()
        .into_iter()
        .filter(|name| name != status_column && is_employed_only_column(name, config))
        .collect::<Vec<_>>();

    let mut marked = 0;
    let mut result = frame;
    for name in &targets {
        let mut row = 0;
        result = result.map_column(name, |cell| {
            let value = if not_employed[row] {
                marked += 1;
                Cell::NotApplicable
            } else {
                cell.clone()
            };
            row += 1;
            value
        });
    }

    log::info!(
        "Marked {marked} cells in {} employed-only columns as not applicable",
        targets.len()
    );
    Ok((result, marked))
}
