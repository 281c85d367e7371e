//! A Rust library for unifying, sanitizing and analysing quarterly
//! labor-force survey extracts weighted by survey expansion factors.

pub mod algorithm;
pub mod config;
pub mod error;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod reader;
pub mod schema;
pub mod utils;

// Re-export the most common types for easier use
// Core types
pub use config::{ColumnConfig, PipelineConfig, SegregationConfig};
pub use error::{Result, SurveyError};
pub use models::{Cell, Column, Period, SurveyFrame};
pub use schema::{ColumnSchema, HarmonizeMode, SchemaCompatibilityReport, SchemaDiff, SchemaIssue};

// Pipeline stages
pub use algorithm::cleaning::{combine_expansion_weights, sanitize};
pub use algorithm::population::{RecordFilter, apply_filter, segregate};
pub use loader::{UnifiedDataset, unify, unify_directory};
pub use pipeline::{PipelineOutput, process, run};
pub use reader::{SourceExtract, discover_extracts};

// Statistics
pub use algorithm::statistics::{
    HypothesisOutcome, SelectionSummary, StatError, TestResult, WeightedAggregator,
    WeightedStatistic,
};

// Arrow types
pub use arrow::record_batch::RecordBatch;
