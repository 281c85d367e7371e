//! Cleaning stages applied to the unified dataset
//!
//! Sentinel codes are cleared first, then the per-period expansion weights
//! are combined into one weight column.

pub mod sanitize;
pub mod weights;

pub use sanitize::{SanitizeReport, Sanitized, sanitize};
pub use weights::{WeightCombination, WeightReport, combine_expansion_weights};
