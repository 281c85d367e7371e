//! Input shaping for the informality and income prediction models
//!
//! The models themselves are trained elsewhere. This module prepares what
//! they consume: the employed respondents with a known target, imputed
//! features, a fitted encoder and a reproducible train/test split.

pub mod encoder;
pub mod split;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::{ColumnConfig, SegregationConfig};
use crate::error::{Result, SurveyError};
use crate::models::{Cell, Column, SurveyFrame};

use super::population::is_employed;

pub use encoder::{CategoryLevels, FeatureEncoder, NumericScaler, PredictionInput};
pub use split::{DEFAULT_SEED, DEFAULT_TEST_FRACTION, SplitIndices, random_split, stratified_split};

/// Kind of target a model predicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// 0/1 class, split stratified by class
    Binary,
    /// Continuous value, split at random
    Continuous,
}

/// Features and target of a prediction model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub name: String,
    pub numeric_features: Vec<String>,
    pub categorical_features: Vec<String>,
    pub target: String,
    pub target_kind: TargetKind,
}

impl ModelSpec {
    /// Informality classifier: age band, sex, education, occupation and
    /// weekly hours predict the informality indicator
    #[must_use]
    pub fn informality(columns: &ColumnConfig) -> Self {
        Self {
            name: "informalidad".to_string(),
            numeric_features: vec![columns.hours.clone()],
            categorical_features: vec![
                columns.age_band.clone(),
                columns.sex.clone(),
                columns.education.clone(),
                columns.occupation.clone(),
            ],
            target: columns.informality.clone(),
            target_kind: TargetKind::Binary,
        }
    }

    /// Income regression: age and weekly hours plus sex, education and
    /// period predict total monthly income
    #[must_use]
    pub fn income_regression(columns: &ColumnConfig) -> Self {
        Self {
            name: "ingreso".to_string(),
            numeric_features: vec![columns.age.clone(), columns.hours.clone()],
            categorical_features: vec![
                columns.sex.clone(),
                columns.education.clone(),
                columns.period.clone(),
            ],
            target: columns.income.clone(),
            target_kind: TargetKind::Continuous,
        }
    }

    /// All feature columns, numeric first
    pub fn features(&self) -> impl Iterator<Item = &String> {
        self.numeric_features
            .iter()
            .chain(&self.categorical_features)
    }
}

/// Rows and preprocessing a model is trained on
#[derive(Debug, Clone)]
pub struct ModelFrame {
    pub spec: ModelSpec,
    /// Imputed feature columns of the retained rows
    pub features: SurveyFrame,
    pub target: Vec<f64>,
    pub encoder: FeatureEncoder,
    /// Employed rows dropped because the target was missing
    pub dropped_without_target: usize,
    /// Feature cells filled by imputation
    pub imputed_cells: usize,
}

impl ModelFrame {
    /// Select employed respondents with a known target and prepare features
    ///
    /// Missing numeric features take the column median and missing
    /// categorical features the most frequent label, both computed over the
    /// retained rows.
    ///
    /// # Errors
    /// Fails on absent columns, when no row is left, or when a feature has
    /// no value to impute from
    pub fn build(
        frame: &SurveyFrame,
        spec: &ModelSpec,
        columns: &ColumnConfig,
        segregation: &SegregationConfig,
    ) -> Result<Self> {
        let status = frame.cells(&columns.employment_status)?;
        let target_cells = frame.cells(&spec.target)?;

        let employed: Vec<usize> = (0..frame.num_rows())
            .filter(|&row| is_employed(&status[row], segregation))
            .collect();
        let rows: Vec<usize> = employed
            .iter()
            .copied()
            .filter(|&row| target_cells[row].coerce_f64().is_some())
            .collect();
        let dropped_without_target = employed.len() - rows.len();

        if rows.is_empty() {
            return Err(SurveyError::invalid_data(format!(
                "no employed respondents with a known '{}' to model",
                spec.target
            )));
        }
        if dropped_without_target > 0 {
            log::info!(
                "Model {}: dropped {dropped_without_target} employed rows without a target",
                spec.name
            );
        }

        let target = rows
            .iter()
            .filter_map(|&row| target_cells[row].coerce_f64())
            .collect();

        let selected = frame.take(&rows).select(&spec.features().collect::<Vec<_>>())?;
        let mut imputed_cells = 0;
        let mut features = selected.clone();
        for column in &spec.numeric_features {
            let (filled, count) = impute_numeric(&selected, column)?;
            features = features.with_column(filled)?;
            imputed_cells += count;
        }
        for column in &spec.categorical_features {
            let (filled, count) = impute_categorical(&selected, column)?;
            features = features.with_column(filled)?;
            imputed_cells += count;
        }

        let encoder = FeatureEncoder::fit(
            &features,
            &spec.numeric_features,
            &spec.categorical_features,
        )?;

        Ok(Self {
            spec: spec.clone(),
            features,
            target,
            encoder,
            dropped_without_target,
            imputed_cells,
        })
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.target.len()
    }

    /// Encoded feature matrix, one vector per row
    pub fn design_matrix(&self) -> Result<Vec<Vec<f64>>> {
        self.encoder.transform(&self.features)
    }

    /// Train/test split suited to the target kind
    pub fn split(&self, test_fraction: f64, seed: Option<u64>) -> Result<SplitIndices> {
        match self.spec.target_kind {
            TargetKind::Binary => {
                let labels: Vec<i64> = self.target.iter().map(|v| v.round() as i64).collect();
                stratified_split(&labels, test_fraction, seed)
            }
            TargetKind::Continuous => random_split(self.num_rows(), test_fraction, seed),
        }
    }
}

fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

/// Most frequent label; ties go to the smallest label
fn mode(cells: &[Cell]) -> Option<String> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for key in cells.iter().filter_map(Cell::category_key) {
        *counts.entry(key).or_default() += 1;
    }
    counts
        .into_iter()
        .fold(None, |best: Option<(String, usize)>, (key, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((key, count)),
        })
        .map(|(key, _)| key)
}

fn impute_numeric(frame: &SurveyFrame, column: &str) -> Result<(Column, usize)> {
    let cells = frame.cells(column)?;
    let mut present: Vec<f64> = cells.iter().filter_map(Cell::coerce_f64).collect();
    let fill = median(&mut present).ok_or_else(|| {
        SurveyError::invalid_data(format!("numeric feature '{column}' has no values"))
    })?;

    let mut count = 0;
    let filled = cells
        .iter()
        .map(|cell| match cell.coerce_f64() {
            Some(value) => Cell::from(value),
            None => {
                count += 1;
                Cell::from(fill)
            }
        })
        .collect();
    Ok((Column::new(column, filled), count))
}

fn impute_categorical(frame: &SurveyFrame, column: &str) -> Result<(Column, usize)> {
    let cells = frame.cells(column)?;
    let fill = mode(cells).ok_or_else(|| {
        SurveyError::invalid_data(format!("categorical feature '{column}' has no values"))
    })?;

    let mut count = 0;
    let filled = cells
        .iter()
        .map(|cell| match cell.category_key() {
            Some(key) => Cell::Text(key),
            None => {
                count += 1;
                Cell::text(fill.as_str())
            }
        })
        .collect();
    Ok((Column::new(column, filled), count))
}
