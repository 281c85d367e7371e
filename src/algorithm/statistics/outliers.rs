//! High-value outlier screening
//!
//! Uses the Tukey upper fence `Q3 + 1.5·IQR` on unweighted respondent values
//! as a screening rule, then describes the respondents above it with weighted
//! category shares.

use crate::error::Result;
use crate::models::{Cell, SurveyFrame};

use super::error::{StatError, StatResult};
use super::weighted::{
    CategoryShare, WeightedAggregator, insufficient_as_none, weighted_proportions_of,
};

/// Linear-interpolated quantile of sorted values
///
/// Returns `None` for an empty slice or `q` outside `[0, 1]`.
#[must_use]
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Interquartile-range fence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IqrFence {
    /// First quartile
    pub q1: f64,
    /// Third quartile
    pub q3: f64,
    /// `q3 - q1`
    pub iqr: f64,
    /// `q3 + 1.5 * iqr`
    pub upper: f64,
}

impl IqrFence {
    /// Compute the fence from unsorted values
    ///
    /// # Errors
    /// `NoObservations` for an empty slice
    pub fn from_values(values: &[f64]) -> StatResult<Self> {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let (Some(q1), Some(q3)) = (quantile(&sorted, 0.25), quantile(&sorted, 0.75)) else {
            return Err(StatError::NoObservations);
        };
        let iqr = q3 - q1;
        Ok(Self {
            q1,
            q3,
            iqr,
            upper: q3 + 1.5 * iqr,
        })
    }
}

/// Profile of the respondents above the fence
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierProfile {
    /// The fence used
    pub fence: IqrFence,
    /// Respondents with a value
    pub observations: usize,
    /// Respondents above the fence
    pub outliers: usize,
    /// Weighted shares of each profile column among the outliers
    pub shares: Vec<(String, Option<Vec<CategoryShare>>)>,
}

impl OutlierProfile {
    /// Most common category of a profile column among outliers
    #[must_use]
    pub fn top_category(&self, column: &str) -> Option<&CategoryShare> {
        self.shares
            .iter()
            .find(|(name, _)| name == column)
            .and_then(|(_, shares)| shares.as_ref())
            .and_then(|shares| shares.iter().max_by(|a, b| a.share.total_cmp(&b.share)))
    }
}

/// Screen `value_column` for high outliers and profile them
///
/// # Arguments
/// * `frame` - Population to screen
/// * `aggregator` - Weighted aggregator for the profile shares
/// * `value_column` - Numeric column to screen (e.g. income)
/// * `profile_columns` - Categorical columns to describe the outliers by
pub fn high_value_profile<S: AsRef<str>>(
    frame: &SurveyFrame,
    aggregator: &WeightedAggregator,
    value_column: &str,
    profile_columns: &[S],
) -> Result<OutlierProfile> {
    let values = frame
        .cells(value_column)?
        .iter()
        .map(Cell::coerce_f64)
        .collect::<Vec<_>>();
    let present = values.iter().flatten().copied().collect::<Vec<_>>();
    let fence = IqrFence::from_values(&present)?;

    let mask = values
        .iter()
        .map(|v| v.is_some_and(|v| v > fence.upper))
        .collect::<Vec<_>>();
    let outliers = frame.filter(&mask)?;
    log::info!(
        "{} of {} respondents have {value_column} above {:.2}",
        outliers.num_rows(),
        present.len(),
        fence.upper
    );

    let outlier_rows = (0..outliers.num_rows()).collect::<Vec<_>>();
    let mut shares = Vec::with_capacity(profile_columns.len());
    for column in profile_columns {
        let column = column.as_ref();
        if !frame.has_column(column) {
            log::warn!("Profile column {column} not found; skipped");
            continue;
        }
        let pairs = aggregator.category_pairs(&outliers, column, &outlier_rows)?;
        let column_shares = insufficient_as_none(weighted_proportions_of(pairs))?;
        shares.push((column.to_string(), column_shares));
    }

    Ok(OutlierProfile {
        fence,
        observations: present.len(),
        outliers: outliers.num_rows(),
        shares,
    })
}
