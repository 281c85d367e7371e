//! Cleaning, population and analysis stages
//!
//! Each stage is a function from a frame to a new frame plus a report of
//! what it changed.

pub mod cleaning;
pub mod modeling;
pub mod population;
pub mod statistics;
