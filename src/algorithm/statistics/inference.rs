//! Hypothesis tests reported by every run
//!
//! Income is compared across sex, education and period with one-way ANOVA,
//! informality is checked for independence from education and period, and
//! the gender pay gap gets a Welch t-test. A test the data cannot support is
//! kept in the report as not computable instead of failing the run.

use serde::{Deserialize, Serialize};

use crate::config::ColumnConfig;
use crate::error::{Result, SurveyError};
use crate::models::SurveyFrame;

use super::hypothesis::{TestResult, anova_by_category, chi_square_by_category, t_test_between};

/// Which test produced an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    /// One-way ANOVA of a numeric column across categories
    Anova,
    /// Chi-square test of independence
    ChiSquare,
    /// Welch's two-sample t-test
    WelchT,
}

impl TestKind {
    /// Label used in reports
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Anova => "anova",
            Self::ChiSquare => "chi_cuadrado",
            Self::WelchT => "t_welch",
        }
    }
}

/// One reported test
#[derive(Debug, Clone, PartialEq)]
pub struct HypothesisOutcome {
    /// The test
    pub kind: TestKind,
    /// Outcome column
    pub variable: String,
    /// Grouping column, with the compared labels for a t-test
    pub grouping: String,
    /// The result, or `None` when not computable
    pub result: Option<TestResult>,
    /// Why the test could not be computed
    pub not_computable: Option<String>,
}

impl HypothesisOutcome {
    /// Keep a computed result, or record a statistical failure as not
    /// computable. Structural errors still fail.
    fn from_attempt(
        kind: TestKind,
        variable: &str,
        grouping: String,
        attempt: Result<TestResult>,
    ) -> Result<Self> {
        let (result, not_computable) = match attempt {
            Ok(result) => (Some(result), None),
            Err(SurveyError::Statistic(e)) => {
                log::info!("{} of {variable} by {grouping} not computable: {e}", kind.label());
                (None, Some(e.to_string()))
            }
            Err(e) => return Err(e),
        };
        Ok(Self {
            kind,
            variable: variable.to_string(),
            grouping,
            result,
            not_computable,
        })
    }

    /// Whether the test rejected the null hypothesis
    #[must_use]
    pub fn is_significant(&self) -> bool {
        self.result.is_some_and(|r| r.significant)
    }
}

/// Flat row of the hypothesis test table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HypothesisRecord {
    /// Test label
    pub prueba: String,
    /// Outcome column
    pub variable: String,
    /// Grouping column
    pub grupo: String,
    /// Test statistic
    pub estadistico: Option<f64>,
    /// p-value
    pub p_valor: Option<f64>,
    /// Degrees of freedom
    pub gl: Option<f64>,
    /// Denominator degrees of freedom for F tests
    pub gl_denominador: Option<f64>,
    /// Whether the result is significant
    pub significativo: Option<bool>,
    /// "no calculable: ..." when the test could not be run
    pub nota: Option<String>,
}

impl From<&HypothesisOutcome> for HypothesisRecord {
    fn from(outcome: &HypothesisOutcome) -> Self {
        let result = outcome.result;
        Self {
            prueba: outcome.kind.label().to_string(),
            variable: outcome.variable.clone(),
            grupo: outcome.grouping.clone(),
            estadistico: result.map(|r| r.statistic),
            p_valor: result.map(|r| r.p_value),
            gl: result.map(|r| r.dof),
            gl_denominador: result.and_then(|r| r.dof_denominator),
            significativo: result.map(|r| r.significant),
            nota: outcome
                .not_computable
                .as_ref()
                .map(|reason| format!("no calculable: {reason}")),
        }
    }
}

/// Run the standard tests on employed respondents
///
/// Tests whose columns are absent from `frame` are skipped with a warning.
///
/// # Arguments
/// * `frame` - Employed respondents
/// * `columns` - Column names
/// * `pay_gap_groups` - The two sex labels compared by the t-test
/// * `alpha` - Significance level
pub fn standard_tests(
    frame: &SurveyFrame,
    columns: &ColumnConfig,
    pay_gap_groups: &[String; 2],
    alpha: f64,
) -> Result<Vec<HypothesisOutcome>> {
    let mut outcomes = Vec::new();
    let present = |a: &str, b: &str| {
        let ok = frame.has_column(a) && frame.has_column(b);
        if !ok {
            log::warn!("Skipping test of {a} by {b}: column not found");
        }
        ok
    };

    for grouping in [&columns.sex, &columns.education, &columns.period] {
        if present(columns.income.as_str(), grouping.as_str()) {
            outcomes.push(HypothesisOutcome::from_attempt(
                TestKind::Anova,
                &columns.income,
                grouping.clone(),
                anova_by_category(frame, &columns.income, grouping, alpha),
            )?);
        }
    }

    for grouping in [&columns.education, &columns.period] {
        if present(columns.informality.as_str(), grouping.as_str()) {
            outcomes.push(HypothesisOutcome::from_attempt(
                TestKind::ChiSquare,
                &columns.informality,
                grouping.clone(),
                chi_square_by_category(frame, &columns.informality, grouping, alpha),
            )?);
        }
    }

    if present(columns.income.as_str(), columns.sex.as_str()) {
        let [first, second] = pay_gap_groups;
        outcomes.push(HypothesisOutcome::from_attempt(
            TestKind::WelchT,
            &columns.income,
            format!("{} ({first} vs {second})", columns.sex),
            t_test_between(
                frame,
                &columns.income,
                &columns.sex,
                (first.as_str(), second.as_str()),
                alpha,
            ),
        )?);
    }

    Ok(outcomes)
}
