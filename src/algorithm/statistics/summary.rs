//! Key figures for a selection of respondents
//!
//! The figures a dashboard shows for the current filter selection. Values
//! that cannot be computed for the selection are `None` and should be shown
//! as "insufficient data".

use serde::{Deserialize, Serialize};

use crate::algorithm::population::is_employed;
use crate::config::{ColumnConfig, SegregationConfig};
use crate::error::Result;
use crate::models::SurveyFrame;

use super::weighted::{WeightedAggregator, insufficient_as_none, weighted_mean_of};

/// Key figures for a selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionSummary {
    /// Weighted mean monthly income
    pub mean_income: Option<f64>,
    /// Weighted informality rate among employed respondents, between 0 and 1
    pub informality_rate: Option<f64>,
    /// Respondents in the selection
    pub respondents: u64,
    /// Population the selection represents (sum of weights)
    pub represented_population: f64,
}

impl SelectionSummary {
    /// Compute the figures for a selection
    ///
    /// # Errors
    /// Fails when the income, status, informality or weight column is absent,
    /// or a weight is negative
    pub fn compute(
        frame: &SurveyFrame,
        aggregator: &WeightedAggregator,
        columns: &ColumnConfig,
        segregation: &SegregationConfig,
    ) -> Result<Self> {
        let rows = (0..frame.num_rows()).collect::<Vec<_>>();

        let income = aggregator.value_pairs(frame, &columns.income, &rows)?;
        let mean_income = insufficient_as_none(weighted_mean_of(income))?.map(|s| s.value);

        let status = frame.cells(&columns.employment_status)?;
        let employed = rows
            .iter()
            .copied()
            .filter(|&row| is_employed(&status[row], segregation))
            .collect::<Vec<_>>();
        let informality = aggregator.value_pairs(frame, &columns.informality, &employed)?;
        let informality_rate =
            insufficient_as_none(weighted_mean_of(informality))?.map(|s| s.value);

        let represented_population = aggregator
            .weights(frame)?
            .into_iter()
            .flatten()
            .filter(|w| *w > 0.0)
            .sum();

        Ok(Self {
            mean_income,
            informality_rate,
            respondents: frame.num_rows() as u64,
            represented_population,
        })
    }
}
