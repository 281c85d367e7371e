//! Error handling for the survey pipeline.
//!
//! Structural failures (no extracts, irreconcilable schemas, unreadable files)
//! surface as [`SurveyError`]. Cell-level problems such as sentinel codes or
//! unmapped category codes never reach this type: they become missing values
//! and are counted by the stage that found them.

use std::io;
use std::path::PathBuf;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

use crate::algorithm::statistics::StatError;
use crate::schema::SchemaDiff;

/// Specialized error type for the survey pipeline
#[derive(Debug, thiserror::Error)]
pub enum SurveyError {
    /// Error opening, reading or writing a file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error decoding or encoding Arrow data
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Error writing Parquet output
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// Invalid or inconsistent configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// No source extracts were found
    #[error("No input files found in {}", .0.display())]
    MissingInput(PathBuf),

    /// An extract's columns cannot be reconciled with the canonical schema
    #[error("Schema mismatch in {file}: {diff}")]
    SchemaMismatch {
        /// The extract that failed harmonization
        file: String,
        /// Missing and extra column names
        diff: SchemaDiff,
    },

    /// A column required by an operation is absent
    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    /// Data that cannot be represented (ragged columns, bad values)
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A statistic or hypothesis test could not be computed
    #[error(transparent)]
    Statistic(#[from] StatError),

    /// JSON or Arrow serialization failure
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SurveyError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid data error
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData(message.into())
    }

    /// Whether the error aborts a pipeline run.
    ///
    /// Statistic errors are recoverable: callers show "insufficient data"
    /// instead of a value.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Statistic(_))
    }
}

impl From<serde_json::Error> for SurveyError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(format!("JSON: {error}"))
    }
}

impl From<serde_arrow::Error> for SurveyError {
    fn from(error: serde_arrow::Error) -> Self {
        Self::Serialization(format!("Arrow records: {error}"))
    }
}

/// Result type for survey pipeline operations
pub type Result<T> = std::result::Result<T, SurveyError>;
