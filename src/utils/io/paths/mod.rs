//! Path utilities for locating and naming survey extracts

pub mod time_period;

pub use time_period::{PeriodLookup, extract_period};
