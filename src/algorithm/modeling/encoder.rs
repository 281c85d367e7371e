//! Feature encoding for the prediction models
//!
//! Numeric features are standardized with the population standard deviation
//! and categorical features are one-hot encoded. Categories not seen while
//! fitting encode as all zeros.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SurveyError};
use crate::models::{Cell, SurveyFrame};

/// Mean and scale of one numeric feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericScaler {
    pub column: String,
    pub mean: f64,
    /// Population standard deviation, or 1 for a constant column
    pub scale: f64,
}

impl NumericScaler {
    fn fit(column: &str, values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(SurveyError::invalid_data(format!(
                "numeric feature '{column}' has no values to fit"
            )));
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let scale = if variance > 0.0 { variance.sqrt() } else { 1.0 };
        Ok(Self {
            column: column.to_string(),
            mean,
            scale,
        })
    }

    #[must_use]
    pub fn transform(&self, value: f64) -> f64 {
        (value - self.mean) / self.scale
    }
}

/// Known levels of one categorical feature, sorted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryLevels {
    pub column: String,
    pub levels: Vec<String>,
}

impl CategoryLevels {
    fn one_hot(&self, key: Option<&str>, out: &mut Vec<f64>) {
        let hit = key.and_then(|key| self.levels.iter().position(|level| level == key));
        out.extend((0..self.levels.len()).map(|i| if Some(i) == hit { 1.0 } else { 0.0 }));
    }
}

/// A single set of feature values, typically entered on a dashboard form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionInput {
    values: BTreeMap<String, Cell>,
}

impl PredictionInput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_number(mut self, column: impl Into<String>, value: f64) -> Self {
        self.values.insert(column.into(), Cell::from(value));
        self
    }

    #[must_use]
    pub fn with_category(mut self, column: impl Into<String>, label: impl Into<String>) -> Self {
        self.values.insert(column.into(), Cell::text(label));
        self
    }

    /// Value entered for a feature
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.values.get(column)
    }

    /// Build an input from one row of a frame
    pub fn from_row(frame: &SurveyFrame, row: usize) -> Self {
        let values = frame
            .columns()
            .iter()
            .filter_map(|column| {
                column
                    .cells()
                    .get(row)
                    .map(|cell| (column.name().to_string(), cell.clone()))
            })
            .collect();
        Self { values }
    }
}

/// Fitted standard scaler and one-hot encoder
///
/// The encoded vector lists numeric features first, then the one-hot block
/// of each categorical feature in the order they were given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureEncoder {
    pub numeric: Vec<NumericScaler>,
    pub categorical: Vec<CategoryLevels>,
}

impl FeatureEncoder {
    /// Fit on the rows of a frame
    ///
    /// Numeric columns must be fully populated; impute before fitting.
    ///
    /// # Errors
    /// Fails on absent columns and on numeric columns without any value
    pub fn fit<S: AsRef<str>>(frame: &SurveyFrame, numeric: &[S], categorical: &[S]) -> Result<Self> {
        let numeric = numeric
            .iter()
            .map(|column| -> Result<NumericScaler> {
                let column = column.as_ref();
                let values: Vec<f64> = frame
                    .cells(column)?
                    .iter()
                    .filter_map(Cell::coerce_f64)
                    .collect();
                NumericScaler::fit(column, &values)
            })
            .collect::<Result<Vec<_>>>()?;

        let categorical = categorical
            .iter()
            .map(|column| -> Result<CategoryLevels> {
                let column = column.as_ref();
                let levels: BTreeSet<String> = frame
                    .cells(column)?
                    .iter()
                    .filter_map(Cell::category_key)
                    .collect();
                Ok(CategoryLevels {
                    column: column.to_string(),
                    levels: levels.into_iter().collect(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            numeric,
            categorical,
        })
    }

    /// Names of the encoded features, `column_level` for one-hot entries
    #[must_use]
    pub fn feature_names(&self) -> Vec<String> {
        self.numeric
            .iter()
            .map(|scaler| scaler.column.clone())
            .chain(self.categorical.iter().flat_map(|category| {
                category
                    .levels
                    .iter()
                    .map(move |level| format!("{}_{level}", category.column))
            }))
            .collect()
    }

    /// Length of an encoded vector
    #[must_use]
    pub fn width(&self) -> usize {
        self.numeric.len() + self.categorical.iter().map(|c| c.levels.len()).sum::<usize>()
    }

    /// Encode one input
    ///
    /// # Errors
    /// Fails when a numeric feature is absent or not a number. Missing or
    /// unknown categories are not errors.
    pub fn encode(&self, input: &PredictionInput) -> Result<Vec<f64>> {
        let mut out = Vec::with_capacity(self.width());
        for scaler in &self.numeric {
            let value = input
                .get(&scaler.column)
                .and_then(Cell::coerce_f64)
                .ok_or_else(|| {
                    SurveyError::invalid_data(format!(
                        "numeric feature '{}' is required",
                        scaler.column
                    ))
                })?;
            out.push(scaler.transform(value));
        }
        for category in &self.categorical {
            let key = input.get(&category.column).and_then(Cell::category_key);
            category.one_hot(key.as_deref(), &mut out);
        }
        Ok(out)
    }

    /// Encode every row of a frame
    pub fn transform(&self, frame: &SurveyFrame) -> Result<Vec<Vec<f64>>> {
        (0..frame.num_rows())
            .map(|row| self.encode(&PredictionInput::from_row(frame, row)))
            .collect()
    }
}
