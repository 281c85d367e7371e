//! Population segregation and feature engineering
//!
//! This module splits the cleaned dataset into the working-age and
//! below-working-age populations, recodes categories, and derives the age
//! band and informality features.

pub mod features;
pub mod filters;
pub mod recode;
pub mod segregate;

pub use features::{
    AgeBands, add_age_band, add_informality, fill_not_applicable, informality, is_employed,
    is_employed_only_column,
};
pub use filters::{FilterCriteria, Record, RecordFilter, apply_filter};
pub use recode::{RecodeAudit, recode};
pub use segregate::{AgeSplit, Segregation, segregate, split_by_age};
