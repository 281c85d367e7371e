//! Reproducible train/test splits

use std::collections::BTreeMap;

use rand::prelude::*;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SurveyError};

/// Fraction of rows held out for testing
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;

/// Seed used when none is configured
pub const DEFAULT_SEED: u64 = 42;

/// Row indices of a train/test split, each sorted ascending
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

fn check_fraction(test_fraction: f64) -> Result<()> {
    if test_fraction > 0.0 && test_fraction < 1.0 {
        Ok(())
    } else {
        Err(SurveyError::invalid_data(format!(
            "test fraction must be between 0 and 1, got {test_fraction}"
        )))
    }
}

fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Number of rows of a group of `len` that go to the test side.
/// Both sides keep at least one row.
fn test_count(len: usize, test_fraction: f64) -> usize {
    let wanted = (len as f64 * test_fraction).round() as usize;
    wanted.clamp(1, len - 1)
}

/// Split rows so each class keeps its share on both sides
///
/// `labels` holds the class of every row. Classes are visited in sorted
/// order and shuffled with one generator, so a fixed seed always yields the
/// same split.
///
/// # Errors
/// Fails for a fraction outside (0, 1) or a class with fewer than two rows
pub fn stratified_split(
    labels: &[i64],
    test_fraction: f64,
    seed: Option<u64>,
) -> Result<SplitIndices> {
    check_fraction(test_fraction)?;

    let mut classes: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (row, label) in labels.iter().enumerate() {
        classes.entry(*label).or_default().push(row);
    }

    let mut rng = rng_for(seed);
    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::new();

    for (label, mut rows) in classes {
        if rows.len() < 2 {
            return Err(SurveyError::invalid_data(format!(
                "class {label} has {} row(s); stratified split needs at least 2",
                rows.len()
            )));
        }
        let n_test = test_count(rows.len(), test_fraction);
        let (picked, rest) = rows.partial_shuffle(&mut rng, n_test);
        test.extend_from_slice(picked);
        train.extend_from_slice(rest);
    }

    train.sort_unstable();
    test.sort_unstable();
    Ok(SplitIndices { train, test })
}

/// Split rows without stratification, for continuous targets
///
/// # Errors
/// Fails for a fraction outside (0, 1) or fewer than two rows
pub fn random_split(rows: usize, test_fraction: f64, seed: Option<u64>) -> Result<SplitIndices> {
    check_fraction(test_fraction)?;
    if rows < 2 {
        return Err(SurveyError::invalid_data(format!(
            "cannot split {rows} row(s) into train and test sets"
        )));
    }

    let mut indices: Vec<usize> = (0..rows).collect();
    let n_test = test_count(rows, test_fraction);
    let (picked, rest) = indices.partial_shuffle(&mut rng_for(seed), n_test);

    let mut test = picked.to_vec();
    let mut train = rest.to_vec();
    train.sort_unstable();
    test.sort_unstable();
    Ok(SplitIndices { train, test })
}
