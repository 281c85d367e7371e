//! Record selection filters
//!
//! Filters narrow a processed population to a selection, e.g. the periods,
//! sexes and education levels picked in a dashboard.

use crate::error::Result;
use crate::models::{Cell, SurveyFrame};

/// Defines a criterion for filtering records
pub trait FilterCriteria<T: ?Sized> {
    /// Determine if an entity meets the filter criteria
    fn meets_criteria(&self, entity: &T) -> bool;
}

/// One row of a frame
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    frame: &'a SurveyFrame,
    row: usize,
}

impl<'a> Record<'a> {
    /// View row `row` of `frame`
    #[must_use]
    pub fn new(frame: &'a SurveyFrame, row: usize) -> Self {
        Self { frame, row }
    }

    /// Cell of a column in this row
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&'a Cell> {
        self.frame
            .column(column)
            .and_then(|c| c.cells().get(self.row))
    }
}

/// A filter that can be applied to a survey record
#[derive(Debug, Clone, PartialEq)]
pub enum RecordFilter {
    /// Keep records from the listed periods
    Periods {
        /// Period column
        column: String,
        /// Period labels to keep
        periods: Vec<String>,
    },
    /// Keep records whose category is one of the labels
    LabelIn {
        /// Category column
        column: String,
        /// Labels (or codes) to keep
        labels: Vec<String>,
    },
    /// Keep records within an age range
    AgeRange {
        /// Age column
        column: String,
        /// Minimum age (inclusive)
        min_age: Option<f64>,
        /// Maximum age (inclusive)
        max_age: Option<f64>,
    },
    /// Combined filter that requires all criteria to be met
    All(Vec<RecordFilter>),
    /// Combined filter that requires any criterion to be met
    Any(Vec<RecordFilter>),
}

impl FilterCriteria<Record<'_>> for RecordFilter {
    fn meets_criteria(&self, record: &Record<'_>) -> bool {
        match self {
            Self::Periods { column, periods } => record
                .get(column)
                .and_then(Cell::category_key)
                .is_some_and(|period| periods.contains(&period)),
            Self::LabelIn { column, labels } => record
                .get(column)
                .and_then(Cell::category_key)
                .is_some_and(|label| labels.contains(&label)),
            Self::AgeRange {
                column,
                min_age,
                max_age,
            } => record
                .get(column)
                .and_then(Cell::coerce_f64)
                .is_some_and(|age| {
                    min_age.is_none_or(|min| age >= min) && max_age.is_none_or(|max| age <= max)
                }),
            Self::All(filters) => filters.iter().all(|f| f.meets_criteria(record)),
            Self::Any(filters) => filters.iter().any(|f| f.meets_criteria(record)),
        }
    }
}

/// Keep the rows of a frame that meet the filter
pub fn apply_filter<F>(frame: &SurveyFrame, filter: &F) -> Result<SurveyFrame>
where
    F: for<'a> FilterCriteria<Record<'a>>,
{
    let mask = (0..frame.num_rows())
        .map(|row| filter.meets_criteria(&Record::new(frame, row)))
        .collect::<Vec<_>>();
    let selected = frame.filter(&mask)?;
    log::debug!(
        "Filter kept {} of {} rows",
        selected.num_rows(),
        frame.num_rows()
    );
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> SurveyFrame {
        SurveyFrame::from_rows(
            &["periodo", "C207", "C208"],
            vec![
                vec![Cell::text("2024-Q1"), Cell::text("Hombre"), Cell::from(20)],
                vec![Cell::text("2024-Q2"), Cell::text("Mujer"), Cell::from(40)],
                vec![Cell::text("2024-Q2"), Cell::text("Hombre"), Cell::Missing],
            ],
        )
        .unwrap()
    }

    fn periods(labels: &[&str]) -> RecordFilter {
        RecordFilter::Periods {
            column: "periodo".to_string(),
            periods: labels.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    #[test]
    fn test_period_and_label_filters() {
        let frame = frame();
        let selected = apply_filter(&frame, &periods(&["2024-Q2"])).unwrap();
        assert_eq!(selected.num_rows(), 2);

        let combined = RecordFilter::All(vec![
            periods(&["2024-Q2"]),
            RecordFilter::LabelIn {
                column: "C207".to_string(),
                labels: vec!["Hombre".to_string()],
            },
        ]);
        assert_eq!(apply_filter(&frame, &combined).unwrap().num_rows(), 1);

        // An empty selection selects nothing
        assert_eq!(apply_filter(&frame, &periods(&[])).unwrap().num_rows(), 0);
    }

    #[test]
    fn test_age_range_excludes_missing() {
        let filter = RecordFilter::AgeRange {
            column: "C208".to_string(),
            min_age: Some(18.0),
            max_age: None,
        };
        assert_eq!(apply_filter(&frame(), &filter).unwrap().num_rows(), 2);

        let any = RecordFilter::Any(vec![
            filter,
            RecordFilter::LabelIn {
                column: "C207".to_string(),
                labels: vec!["Hombre".to_string()],
            },
        ]);
        assert_eq!(apply_filter(&frame(), &any).unwrap().num_rows(), 3);
    }
}
