//! IO utilities for file operations
//!
//! Reading survey extracts, writing processed populations as CSV and Parquet,
//! writing statistics tables, and mapping extract file names to periods.

pub mod csv;
pub mod parquet;
pub mod paths;
pub mod tables;

pub use csv::{find_files_with_extension, read_csv, validate_directory, write_csv};
pub use parquet::{read_parquet, write_parquet};
pub use paths::{PeriodLookup, extract_period};
pub use tables::{records_to_batch, write_records_csv};
