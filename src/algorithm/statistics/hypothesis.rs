//! Hypothesis tests
//!
//! One-way ANOVA for a numeric outcome across categories, chi-square tests of
//! independence between two categorical variables, and Welch's t-test for two
//! independent samples. All three are unweighted: they run on respondent
//! counts, which is the usual approximation for design-based tests.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor, StudentsT};

use crate::error::Result;
use crate::models::SurveyFrame;

use super::error::{StatError, StatResult};

/// Default significance level
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Outcome of a hypothesis test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Test statistic (F, χ² or t)
    pub statistic: f64,
    /// Probability of a statistic at least this extreme under the null
    pub p_value: f64,
    /// Degrees of freedom (numerator for ANOVA)
    pub dof: f64,
    /// Denominator degrees of freedom, for F tests
    pub dof_denominator: Option<f64>,
    /// Whether `p_value < alpha`
    pub significant: bool,
}

impl TestResult {
    fn new(statistic: f64, p_value: f64, dof: f64, dof_denominator: Option<f64>, alpha: f64) -> Self {
        Self {
            statistic,
            p_value,
            dof,
            dof_denominator,
            significant: p_value < alpha,
        }
    }
}

fn check_alpha(alpha: f64) -> StatResult<()> {
    if alpha > 0.0 && alpha < 1.0 {
        Ok(())
    } else {
        Err(StatError::Distribution(format!(
            "significance level must be in (0, 1), got {alpha}"
        )))
    }
}

fn distribution_error(e: impl std::fmt::Display) -> StatError {
    StatError::Distribution(e.to_string())
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_variance(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() as f64 - 1.0)
}

/// One-way analysis of variance
///
/// Empty groups are ignored.
///
/// # Errors
/// `InsufficientGroups` with fewer than two non-empty groups; `Degenerate`
/// when there is no within-group degree of freedom or no variation at all
pub fn one_way_anova(groups: &[Vec<f64>], alpha: f64) -> StatResult<TestResult> {
    check_alpha(alpha)?;
    let groups = groups.iter().filter(|g| !g.is_empty()).collect::<Vec<_>>();
    if groups.len() < 2 {
        return Err(StatError::InsufficientGroups {
            found: groups.len(),
        });
    }

    let k = groups.len() as f64;
    let n = groups.iter().map(|g| g.len()).sum::<usize>() as f64;
    if n - k < 1.0 {
        return Err(StatError::Degenerate(
            "every group has a single observation".to_string(),
        ));
    }

    let grand_mean = groups.iter().flat_map(|g| g.iter()).sum::<f64>() / n;
    let ss_between = groups
        .iter()
        .map(|g| g.len() as f64 * (mean(g) - grand_mean).powi(2))
        .sum::<f64>();
    let ss_within = groups
        .iter()
        .map(|g| {
            let m = mean(g);
            g.iter().map(|v| (v - m).powi(2)).sum::<f64>()
        })
        .sum::<f64>();

    let df_between = k - 1.0;
    let df_within = n - k;

    if ss_within == 0.0 {
        if ss_between == 0.0 {
            return Err(StatError::Degenerate(
                "all observations are identical".to_string(),
            ));
        }
        return Ok(TestResult::new(
            f64::INFINITY,
            0.0,
            df_between,
            Some(df_within),
            alpha,
        ));
    }

    let f = (ss_between / df_between) / (ss_within / df_within);
    let dist = FisherSnedecor::new(df_between, df_within).map_err(distribution_error)?;
    Ok(TestResult::new(f, dist.sf(f), df_between, Some(df_within), alpha))
}

/// Two-way table of counts
#[derive(Debug, Clone, PartialEq)]
pub struct ContingencyTable {
    /// Row labels
    pub rows: Vec<String>,
    /// Column labels
    pub columns: Vec<String>,
    /// Counts, `counts[row][column]`
    pub counts: Vec<Vec<f64>>,
}

impl ContingencyTable {
    /// Build a table from counts
    ///
    /// # Errors
    /// `LengthMismatch` when the counts do not match the labels
    pub fn new(rows: Vec<String>, columns: Vec<String>, counts: Vec<Vec<f64>>) -> StatResult<Self> {
        if counts.len() != rows.len() {
            return Err(StatError::LengthMismatch {
                values: counts.len(),
                weights: rows.len(),
            });
        }
        if let Some(bad) = counts.iter().find(|r| r.len() != columns.len()) {
            return Err(StatError::LengthMismatch {
                values: bad.len(),
                weights: columns.len(),
            });
        }
        Ok(Self {
            rows,
            columns,
            counts,
        })
    }

    /// Cross-tabulate two label sequences; pairs with a missing side are skipped
    #[must_use]
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut cells: BTreeMap<(String, String), f64> = BTreeMap::new();
        for pair in pairs {
            *cells.entry(pair).or_default() += 1.0;
        }
        let mut rows = cells.keys().map(|(r, _)| r.clone()).collect::<Vec<_>>();
        rows.dedup();
        let mut columns = cells.keys().map(|(_, c)| c.clone()).collect::<Vec<_>>();
        columns.sort();
        columns.dedup();

        let counts = rows
            .iter()
            .map(|r| {
                columns
                    .iter()
                    .map(|c| {
                        cells
                            .get(&(r.clone(), c.clone()))
                            .copied()
                            .unwrap_or(0.0)
                    })
                    .collect()
            })
            .collect();

        Self {
            rows,
            columns,
            counts,
        }
    }

    /// Table without rows or columns whose total is zero
    #[must_use]
    pub fn without_empty(&self) -> Self {
        let keep_rows = (0..self.rows.len())
            .filter(|&r| self.counts[r].iter().sum::<f64>() > 0.0)
            .collect::<Vec<_>>();
        let keep_cols = (0..self.columns.len())
            .filter(|&c| keep_rows.iter().map(|&r| self.counts[r][c]).sum::<f64>() > 0.0)
            .collect::<Vec<_>>();

        Self {
            rows: keep_rows.iter().map(|&r| self.rows[r].clone()).collect(),
            columns: keep_cols.iter().map(|&c| self.columns[c].clone()).collect(),
            counts: keep_rows
                .iter()
                .map(|&r| keep_cols.iter().map(|&c| self.counts[r][c]).collect())
                .collect(),
        }
    }
}

/// Chi-square test of independence
///
/// All-zero rows and columns are dropped first. With one degree of freedom
/// the Yates continuity correction is applied.
///
/// # Errors
/// `InsufficientGroups` when fewer than two rows or columns remain
pub fn chi_square_independence(table: &ContingencyTable, alpha: f64) -> StatResult<TestResult> {
    check_alpha(alpha)?;
    let table = table.without_empty();
    let found = table.rows.len().min(table.columns.len());
    if found < 2 {
        return Err(StatError::InsufficientGroups { found });
    }

    let row_totals = table
        .counts
        .iter()
        .map(|r| r.iter().sum::<f64>())
        .collect::<Vec<_>>();
    let col_totals = (0..table.columns.len())
        .map(|c| table.counts.iter().map(|r| r[c]).sum::<f64>())
        .collect::<Vec<_>>();
    let total = row_totals.iter().sum::<f64>();

    let dof = ((table.rows.len() - 1) * (table.columns.len() - 1)) as f64;
    let yates = dof == 1.0;

    let mut statistic = 0.0;
    for (r, row) in table.counts.iter().enumerate() {
        for (c, &observed) in row.iter().enumerate() {
            let expected = row_totals[r] * col_totals[c] / total;
            let mut diff = (observed - expected).abs();
            if yates {
                diff -= diff.min(0.5);
            }
            statistic += diff * diff / expected;
        }
    }

    let dist = ChiSquared::new(dof).map_err(distribution_error)?;
    Ok(TestResult::new(statistic, dist.sf(statistic), dof, None, alpha))
}

/// Welch's two-sample t-test (unequal variances, two-sided)
///
/// # Errors
/// `InsufficientGroups` when a sample has fewer than two values; `Degenerate`
/// when both samples have zero variance
pub fn welch_t_test(a: &[f64], b: &[f64], alpha: f64) -> StatResult<TestResult> {
    check_alpha(alpha)?;
    let found = usize::from(a.len() >= 2) + usize::from(b.len() >= 2);
    if found < 2 {
        return Err(StatError::InsufficientGroups { found });
    }

    let (na, nb) = (a.len() as f64, b.len() as f64);
    let (va, vb) = (sample_variance(a) / na, sample_variance(b) / nb);
    let se2 = va + vb;
    if se2 == 0.0 {
        return Err(StatError::Degenerate(
            "both samples have zero variance".to_string(),
        ));
    }

    let t = (mean(a) - mean(b)) / se2.sqrt();
    let dof = se2.powi(2) / (va.powi(2) / (na - 1.0) + vb.powi(2) / (nb - 1.0));
    let dist = StudentsT::new(0.0, 1.0, dof).map_err(distribution_error)?;
    let p_value = (2.0 * dist.sf(t.abs())).min(1.0);
    Ok(TestResult::new(t, p_value, dof, None, alpha))
}

/// ANOVA of a numeric column across the categories of another
///
/// Rows missing either value are skipped.
pub fn anova_by_category(
    frame: &SurveyFrame,
    value_column: &str,
    category_column: &str,
    alpha: f64,
) -> Result<TestResult> {
    let values = frame.cells(value_column)?;
    let categories = frame.cells(category_column)?;

    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (value, category) in values.iter().zip(categories) {
        if let (Some(v), Some(key)) = (value.coerce_f64(), category.category_key()) {
            groups.entry(key).or_default().push(v);
        }
    }

    let groups = groups.into_values().collect::<Vec<_>>();
    Ok(one_way_anova(&groups, alpha)?)
}

/// Chi-square independence test between two categorical columns
pub fn chi_square_by_category(
    frame: &SurveyFrame,
    row_column: &str,
    column_column: &str,
    alpha: f64,
) -> Result<TestResult> {
    let rows = frame.cells(row_column)?;
    let columns = frame.cells(column_column)?;
    let table = ContingencyTable::from_pairs(
        rows.iter()
            .zip(columns)
            .filter_map(|(r, c)| Some((r.category_key()?, c.category_key()?))),
    );
    Ok(chi_square_independence(&table, alpha)?)
}

/// Welch's t-test of a numeric column between two labels of a group column
pub fn t_test_between(
    frame: &SurveyFrame,
    value_column: &str,
    group_column: &str,
    groups: (&str, &str),
    alpha: f64,
) -> Result<TestResult> {
    let values = frame.cells(value_column)?;
    let labels = frame.cells(group_column)?;

    let mut first = Vec::new();
    let mut second = Vec::new();
    for (value, label) in values.iter().zip(labels) {
        let (Some(v), Some(key)) = (value.coerce_f64(), label.category_key()) else {
            continue;
        };
        if key == groups.0 {
            first.push(v);
        } else if key == groups.1 {
            second.push(v);
        }
    }
    Ok(welch_t_test(&first, &second, alpha)?)
}
