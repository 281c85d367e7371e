//! Data model for survey microdata
//!
//! Datasets are column-oriented [`SurveyFrame`]s of tagged [`Cell`]s, and rows
//! are tagged with the [`Period`] of the extract they came from.

pub mod cell;
pub mod frame;
pub mod period;

pub use cell::Cell;
pub use frame::{Column, SurveyFrame};
pub use period::{Period, UNKNOWN_PERIOD_LABEL};
