//! Errors raised by statistical routines
//!
//! These errors mean "not computable for this selection". Callers report them
//! as insufficient data rather than aborting a run.

/// Error type for weighted statistics and hypothesis tests
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StatError {
    /// No rows with both a value and a weight
    #[error("No observations with both a value and a weight")]
    NoObservations,

    /// Every eligible row has zero weight
    #[error("Total weight is zero across {observations} observations")]
    ZeroTotalWeight {
        /// Rows that had a value and a zero weight
        observations: usize,
    },

    /// A negative weight was found
    #[error("Negative weight {weight} at row {index}")]
    NegativeWeight {
        /// Frame row of the offending weight, or its position in a plain
        /// slice of weights
        index: usize,
        /// The weight value
        weight: f64,
    },

    /// Values and weights have different lengths
    #[error("Length mismatch: {values} values but {weights} weights")]
    LengthMismatch {
        /// Number of values
        values: usize,
        /// Number of weights
        weights: usize,
    },

    /// A test needs at least two non-empty groups
    #[error("Not computable: need at least two non-empty groups, found {found}")]
    InsufficientGroups {
        /// Non-empty groups available
        found: usize,
    },

    /// The data has no variation the test can use
    #[error("Degenerate data: {0}")]
    Degenerate(String),

    /// A reference distribution could not be built or the level is invalid
    #[error("Distribution error: {0}")]
    Distribution(String),
}

/// Result type for statistical routines
pub type StatResult<T> = std::result::Result<T, StatError>;
