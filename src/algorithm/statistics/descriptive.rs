//! Descriptive statistics and cleaning evidence
//!
//! Column summaries taken before and after sanitization document what the
//! cleaning did to the key variables. The comparison is rendered as a
//! markdown table for the run's evidence folder.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::models::{Cell, SurveyFrame};

/// Storage kind of a column, as seen by the summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Every present value is a number
    Numeric,
    /// At least one present value is text or not applicable
    Mixed,
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Numeric => write!(f, "numeric"),
            Self::Mixed => write!(f, "mixed"),
        }
    }
}

/// Unweighted summary of one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    /// Column name
    pub column: String,
    /// Storage kind
    pub kind: ColumnKind,
    /// Cells with a value (numbers and text)
    pub non_null: usize,
    /// Missing cells
    pub null: usize,
    /// Cells marked not applicable
    pub not_applicable: usize,
    /// Mean, for numeric columns
    pub mean: Option<f64>,
    /// Sample standard deviation, for numeric columns with two or more values
    pub std_dev: Option<f64>,
    /// Minimum, for numeric columns
    pub min: Option<f64>,
    /// Maximum, for numeric columns
    pub max: Option<f64>,
}

impl ColumnSummary {
    /// Summarize a column of cells
    #[must_use]
    pub fn from_cells(column: &str, cells: &[Cell]) -> Self {
        let numeric = cells
            .iter()
            .all(|cell| matches!(cell, Cell::Number(_) | Cell::Missing));
        let null = cells.iter().filter(|c| c.is_missing()).count();
        let not_applicable = cells.iter().filter(|c| c.is_not_applicable()).count();

        let values = cells.iter().filter_map(Cell::as_f64).collect::<Vec<_>>();
        let (mean, std_dev, min, max) = if numeric && !values.is_empty() {
            let n = values.len() as f64;
            let mean = values.iter().sum::<f64>() / n;
            let std_dev = (values.len() > 1).then(|| {
                (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
            });
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            (Some(mean), std_dev, Some(min), Some(max))
        } else {
            (None, None, None, None)
        };

        Self {
            column: column.to_string(),
            kind: if numeric {
                ColumnKind::Numeric
            } else {
                ColumnKind::Mixed
            },
            non_null: cells.len() - null - not_applicable,
            null,
            not_applicable,
            mean,
            std_dev,
            min,
            max,
        }
    }
}

/// Summaries of the named columns; absent columns are skipped
#[must_use]
pub fn summarize_columns<S: AsRef<str>>(frame: &SurveyFrame, columns: &[S]) -> Vec<ColumnSummary> {
    columns
        .iter()
        .filter_map(|name| {
            let column = frame.column(name.as_ref());
            if column.is_none() {
                log::debug!("Column {} not present; no summary", name.as_ref());
            }
            column.map(|c| ColumnSummary::from_cells(c.name(), c.cells()))
        })
        .collect()
}

/// Before/after comparison of column summaries
#[derive(Debug, Clone, PartialEq)]
pub struct CleaningEvidence {
    /// Summaries before sanitization
    pub before: Vec<ColumnSummary>,
    /// Summaries after sanitization
    pub after: Vec<ColumnSummary>,
    /// When the evidence was taken
    pub generated_at: DateTime<Local>,
}

fn format_stat(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}

impl CleaningEvidence {
    /// Summarize `columns` in both frames
    #[must_use]
    pub fn new<S: AsRef<str>>(before: &SurveyFrame, after: &SurveyFrame, columns: &[S]) -> Self {
        Self {
            before: summarize_columns(before, columns),
            after: summarize_columns(after, columns),
            generated_at: Local::now(),
        }
    }

    /// Render the comparison as a markdown table
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# Resumen cuantitativo de la limpieza\n\n");
        out.push_str(&format!(
            "Generado: {}\n\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S")
        ));
        out.push_str("| Columna | Etapa | Tipo | No nulos | Nulos | No aplica | Media | Desv. estándar | Mínimo | Máximo |\n");
        out.push_str("|---|---|---|---:|---:|---:|---:|---:|---:|---:|\n");

        for (stage, summaries) in [("antes", &self.before), ("después", &self.after)] {
            for s in summaries {
                out.push_str(&format!(
                    "| {} | {} | {} | {} | {} | {} | {} | {} | {} | {} |\n",
                    s.column,
                    stage,
                    s.kind,
                    s.non_null,
                    s.null,
                    s.not_applicable,
                    format_stat(s.mean),
                    format_stat(s.std_dev),
                    format_stat(s.min),
                    format_stat(s.max),
                ));
            }
        }
        out
    }
}
