//! Weighted estimators
//!
//! Survey estimates weight every respondent by their expansion factor. Rows
//! with a zero weight represent nobody and are left out of the estimate, but
//! they are counted so the caller can see how many were dropped. A negative
//! weight is a data error.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Cell, SurveyFrame};

use super::error::{StatError, StatResult};

/// A weighted estimate and the rows behind it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedStatistic {
    /// The estimate
    pub value: f64,
    /// Sum of the weights used
    pub total_weight: f64,
    /// Rows with a value and a positive weight
    pub observations: usize,
    /// Rows with a value and a zero weight, left out
    pub zero_weight_rows: usize,
}

/// Weighted share of one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryShare {
    /// Category label
    pub category: String,
    /// Share of the total weight, between 0 and 1
    pub share: f64,
    /// Weight of the category
    pub weight: f64,
    /// Rows in the category with a positive weight
    pub observations: usize,
}

/// Weighted estimate for one group; `None` when the group has no usable rows
#[derive(Debug, Clone, PartialEq)]
pub struct GroupStatistic {
    /// Group label
    pub group: String,
    /// The estimate, or `None` for insufficient data
    pub statistic: Option<WeightedStatistic>,
}

/// Weighted mean of `(value, weight)` pairs
///
/// # Errors
/// `NoObservations` for no pairs, `ZeroTotalWeight` when every weight is zero,
/// `NegativeWeight` for any negative weight
pub fn weighted_mean_of<I>(pairs: I) -> StatResult<WeightedStatistic>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    let mut observations = 0;
    let mut zero_weight_rows = 0;

    for (index, (value, weight)) in pairs.into_iter().enumerate() {
        if weight < 0.0 {
            return Err(StatError::NegativeWeight { index, weight });
        }
        if weight == 0.0 {
            zero_weight_rows += 1;
            continue;
        }
        weighted_sum += value * weight;
        total_weight += weight;
        observations += 1;
    }

    if observations == 0 {
        return Err(if zero_weight_rows == 0 {
            StatError::NoObservations
        } else {
            StatError::ZeroTotalWeight {
                observations: zero_weight_rows,
            }
        });
    }

    Ok(WeightedStatistic {
        value: weighted_sum / total_weight,
        total_weight,
        observations,
        zero_weight_rows,
    })
}

/// Weighted mean: Σ(v·w) / Σw
///
/// # Errors
/// `LengthMismatch` when the slices differ in length, plus the errors of
/// [`weighted_mean_of`]
pub fn weighted_mean(values: &[f64], weights: &[f64]) -> StatResult<WeightedStatistic> {
    if values.len() != weights.len() {
        return Err(StatError::LengthMismatch {
            values: values.len(),
            weights: weights.len(),
        });
    }
    weighted_mean_of(values.iter().copied().zip(weights.iter().copied()))
}

/// Weighted shares of each category, in label order
///
/// The denominator is the total weight of every pair, so rows without a
/// category still count towards it.
///
/// # Errors
/// `NoObservations` when no pair has a category, `ZeroTotalWeight` when the
/// total weight is zero, `NegativeWeight` for any negative weight
pub fn weighted_proportions_of<I>(pairs: I) -> StatResult<Vec<CategoryShare>>
where
    I: IntoIterator<Item = (Option<String>, f64)>,
{
    let mut groups: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    let mut total_weight = 0.0;
    let mut zero_weight_rows = 0;
    let mut categorized = 0;

    for (index, (category, weight)) in pairs.into_iter().enumerate() {
        if weight < 0.0 {
            return Err(StatError::NegativeWeight { index, weight });
        }
        if category.is_some() {
            categorized += 1;
        }
        if weight == 0.0 {
            zero_weight_rows += 1;
            continue;
        }
        total_weight += weight;
        if let Some(category) = category {
            let entry = groups.entry(category).or_default();
            entry.0 += weight;
            entry.1 += 1;
        }
    }

    if categorized == 0 {
        return Err(StatError::NoObservations);
    }
    if total_weight == 0.0 {
        return Err(StatError::ZeroTotalWeight {
            observations: zero_weight_rows,
        });
    }

    Ok(groups
        .into_iter()
        .map(|(category, (weight, observations))| CategoryShare {
            category,
            share: weight / total_weight,
            weight,
            observations,
        })
        .collect())
}

/// Weighted shares of each category: Σw(category) / Σw(all rows)
pub fn weighted_proportions(
    categories: &[Option<String>],
    weights: &[f64],
) -> StatResult<Vec<CategoryShare>> {
    if categories.len() != weights.len() {
        return Err(StatError::LengthMismatch {
            values: categories.len(),
            weights: weights.len(),
        });
    }
    weighted_proportions_of(categories.iter().cloned().zip(weights.iter().copied()))
}

/// Frame-level weighted estimates bound to one weight column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightedAggregator {
    weight_column: String,
}

impl WeightedAggregator {
    /// Create an aggregator that weights by `weight_column`
    pub fn new(weight_column: impl Into<String>) -> Self {
        Self {
            weight_column: weight_column.into(),
        }
    }

    /// Name of the weight column
    #[must_use]
    pub fn weight_column(&self) -> &str {
        &self.weight_column
    }

    /// Weight of every row; missing or non-numeric weights are `None`
    pub(crate) fn weights(&self, frame: &SurveyFrame) -> Result<Vec<Option<f64>>> {
        Ok(frame
            .cells(&self.weight_column)?
            .iter()
            .map(Cell::coerce_f64)
            .collect())
    }

    /// Weights of the selected rows, failing on the first negative one with
    /// its frame row
    fn checked_weights(&self, frame: &SurveyFrame, rows: &[usize]) -> Result<Vec<Option<f64>>> {
        let weights = self.weights(frame)?;
        if let Some((index, weight)) = rows
            .iter()
            .find_map(|&row| weights[row].filter(|w| *w < 0.0).map(|w| (row, w)))
        {
            return Err(StatError::NegativeWeight { index, weight }.into());
        }
        Ok(weights)
    }

    /// `(value, weight)` pairs for rows selected by `rows` where both are present
    pub(crate) fn value_pairs(
        &self,
        frame: &SurveyFrame,
        column: &str,
        rows: &[usize],
    ) -> Result<Vec<(f64, f64)>> {
        let values = frame.cells(column)?;
        let weights = self.checked_weights(frame, rows)?;
        Ok(rows
            .iter()
            .filter_map(|&row| Some((values[row].coerce_f64()?, weights[row]?)))
            .collect())
    }

    /// `(category, weight)` pairs for rows selected by `rows` that carry a
    /// weight; the category is `None` for rows without one
    pub(crate) fn category_pairs(
        &self,
        frame: &SurveyFrame,
        column: &str,
        rows: &[usize],
    ) -> Result<Vec<(Option<String>, f64)>> {
        let categories = frame.cells(column)?;
        let weights = self.checked_weights(frame, rows)?;
        Ok(rows
            .iter()
            .filter_map(|&row| Some((categories[row].category_key(), weights[row]?)))
            .collect())
    }

    /// Row indices of each group, in label order; rows without a group are skipped
    pub(crate) fn group_rows(
        frame: &SurveyFrame,
        group_column: &str,
    ) -> Result<BTreeMap<String, Vec<usize>>> {
        let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (row, cell) in frame.cells(group_column)?.iter().enumerate() {
            if let Some(key) = cell.category_key() {
                groups.entry(key).or_default().push(row);
            }
        }
        Ok(groups)
    }

    fn all_rows(frame: &SurveyFrame) -> Vec<usize> {
        (0..frame.num_rows()).collect()
    }

    /// Weighted mean of a numeric column
    ///
    /// Missing and not-applicable values are skipped.
    pub fn mean(&self, frame: &SurveyFrame, column: &str) -> Result<WeightedStatistic> {
        let pairs = self.value_pairs(frame, column, &Self::all_rows(frame))?;
        Ok(weighted_mean_of(pairs)?)
    }

    /// Weighted rate of a 0/1 indicator column
    pub fn rate(&self, frame: &SurveyFrame, indicator: &str) -> Result<WeightedStatistic> {
        self.mean(frame, indicator)
    }

    /// Weighted shares of a categorical column
    pub fn proportions(&self, frame: &SurveyFrame, column: &str) -> Result<Vec<CategoryShare>> {
        let pairs = self.category_pairs(frame, column, &Self::all_rows(frame))?;
        Ok(weighted_proportions_of(pairs)?)
    }

    /// Weighted mean of `column` within each group of `group_column`
    ///
    /// Groups whose rows carry no usable value or weight get `None`.
    ///
    /// # Errors
    /// Fails on absent columns and negative weights
    pub fn mean_by_group(
        &self,
        frame: &SurveyFrame,
        column: &str,
        group_column: &str,
    ) -> Result<Vec<GroupStatistic>> {
        Self::group_rows(frame, group_column)?
            .into_iter()
            .map(|(group, rows)| -> Result<GroupStatistic> {
                let pairs = self.value_pairs(frame, column, &rows)?;
                let statistic = insufficient_as_none(weighted_mean_of(pairs))?;
                Ok(GroupStatistic { group, statistic })
            })
            .collect()
    }

    /// Weighted rate of an indicator within each group
    pub fn rate_by_group(
        &self,
        frame: &SurveyFrame,
        indicator: &str,
        group_column: &str,
    ) -> Result<Vec<GroupStatistic>> {
        self.mean_by_group(frame, indicator, group_column)
    }
}

/// Turn "no usable rows" into `None` and keep real errors
pub(crate) fn insufficient_as_none<T>(result: StatResult<T>) -> StatResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(StatError::NoObservations | StatError::ZeroTotalWeight { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}
