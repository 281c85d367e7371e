//! Statistics table output
//!
//! Trend series and summaries are plain serde records. They are turned into
//! Arrow record batches with serde_arrow and written with the Arrow CSV writer.

use std::path::Path;

use arrow::datatypes::FieldRef;
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};
use serde_arrow::schema::{SchemaLike, TracingOptions};

use crate::error::Result;
use crate::utils::io::csv::write_batch_csv;

/// Convert serde records into a record batch
///
/// The schema is traced from the record type, so an empty slice still
/// produces a batch with the right columns.
pub fn records_to_batch<T>(records: &[T]) -> Result<RecordBatch>
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    let fields = Vec::<FieldRef>::from_type::<T>(TracingOptions::default().allow_null_fields(true))?;
    Ok(serde_arrow::to_record_batch(&fields, &records)?)
}

/// Write serde records to a CSV file with a header row
///
/// # Arguments
/// * `records` - Rows of the table
/// * `path` - Destination file
pub fn write_records_csv<T>(records: &[T], path: &Path) -> Result<()>
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    let batch = records_to_batch(records)?;
    write_batch_csv(&batch, path)?;
    log::info!("Wrote {} table rows to {}", records.len(), path.display());
    Ok(())
}
