//! Period trends
//!
//! Weighted estimates computed separately for every survey period, in
//! chronological order. A period that is present in the data but has no
//! usable rows for the estimate stays in the series with no value, so charts
//! show a gap instead of silently joining neighbouring quarters.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Period, SurveyFrame};

use super::weighted::{
    CategoryShare, WeightedAggregator, WeightedStatistic, insufficient_as_none,
    weighted_mean_of, weighted_proportions_of,
};

/// One period of a trend
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendPoint {
    /// The period
    pub period: Period,
    /// The estimate, or `None` when the period has no usable rows
    pub statistic: Option<WeightedStatistic>,
}

/// Category shares for one period
#[derive(Debug, Clone, PartialEq)]
pub struct ProportionTrendPoint {
    /// The period
    pub period: Period,
    /// The shares, or `None` when the period has no usable rows
    pub shares: Option<Vec<CategoryShare>>,
}

/// Flat trend row for table output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendRecord {
    /// Period label
    pub periodo: String,
    /// Weighted estimate
    pub valor: Option<f64>,
    /// Sum of weights used
    pub peso_total: f64,
    /// Respondents used
    pub observaciones: u64,
}

impl From<&TrendPoint> for TrendRecord {
    fn from(point: &TrendPoint) -> Self {
        Self {
            periodo: point.period.label(),
            valor: point.statistic.map(|s| s.value),
            peso_total: point.statistic.map_or(0.0, |s| s.total_weight),
            observaciones: point.statistic.map_or(0, |s| s.observations as u64),
        }
    }
}

fn period_rows(frame: &SurveyFrame, period_column: &str) -> Result<BTreeMap<Period, Vec<usize>>> {
    let mut periods: BTreeMap<Period, Vec<usize>> = BTreeMap::new();
    for (row, cell) in frame.cells(period_column)?.iter().enumerate() {
        let period = cell
            .category_key()
            .and_then(|label| label.parse::<Period>().ok())
            .unwrap_or(Period::Unknown);
        periods.entry(period).or_default().push(row);
    }
    Ok(periods)
}

impl WeightedAggregator {
    /// Weighted mean of `column` for each period, in chronological order
    ///
    /// # Errors
    /// Fails on absent columns and negative weights
    pub fn trend(
        &self,
        frame: &SurveyFrame,
        column: &str,
        period_column: &str,
    ) -> Result<Vec<TrendPoint>> {
        period_rows(frame, period_column)?
            .into_iter()
            .map(|(period, rows)| -> Result<TrendPoint> {
                let pairs = self.value_pairs(frame, column, &rows)?;
                let statistic = insufficient_as_none(weighted_mean_of(pairs))?;
                Ok(TrendPoint { period, statistic })
            })
            .collect()
    }

    /// Weighted category shares of `column` for each period
    pub fn proportion_trend(
        &self,
        frame: &SurveyFrame,
        column: &str,
        period_column: &str,
    ) -> Result<Vec<ProportionTrendPoint>> {
        period_rows(frame, period_column)?
            .into_iter()
            .map(|(period, rows)| -> Result<ProportionTrendPoint> {
                let pairs = self.category_pairs(frame, column, &rows)?;
                let shares = insufficient_as_none(weighted_proportions_of(pairs))?;
                Ok(ProportionTrendPoint { period, shares })
            })
            .collect()
    }
}
