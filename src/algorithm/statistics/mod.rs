//! Weighted statistics and hypothesis tests
//!
//! Every population figure is weighted by the survey expansion weight.
//! Unweighted figures appear only in the cleaning evidence.

pub mod descriptive;
pub mod error;
pub mod hypothesis;
pub mod inference;
pub mod outliers;
pub mod summary;
pub mod temporal;
pub mod weighted;

pub use descriptive::{CleaningEvidence, ColumnKind, ColumnSummary, summarize_columns};
pub use error::{StatError, StatResult};
pub use hypothesis::{
    ContingencyTable, DEFAULT_ALPHA, TestResult, anova_by_category, chi_square_by_category,
    chi_square_independence, one_way_anova, t_test_between, welch_t_test,
};
pub use inference::{HypothesisOutcome, HypothesisRecord, TestKind, standard_tests};
pub use outliers::{IqrFence, OutlierProfile, high_value_profile, quantile};
pub use summary::SelectionSummary;
pub use temporal::{ProportionTrendPoint, TrendPoint, TrendRecord};
pub use weighted::{
    CategoryShare, GroupStatistic, WeightedAggregator, WeightedStatistic, weighted_mean,
    weighted_mean_of, weighted_proportions, weighted_proportions_of,
};
