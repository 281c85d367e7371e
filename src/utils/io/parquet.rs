//! Parquet file operations
//!
//! Processed populations are persisted as Parquet next to the CSV outputs.
//! Numeric columns are stored as `Float64` and every other column as `Utf8`,
//! with not-applicable cells written as a configurable label.

use std::fs::File;
use std::path::Path;

use arrow::array::{Array, Float64Array, StringArray};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::error::{Result, SurveyError};
use crate::models::{Cell, Column, SurveyFrame};
use crate::utils::logging::{log_frame_read, log_read_start};

/// Write a survey frame to a Parquet file
///
/// # Arguments
/// * `frame` - The frame to write
/// * `path` - Destination file
/// * `not_applicable_label` - Text written for not-applicable cells
pub fn write_parquet(frame: &SurveyFrame, path: &Path, not_applicable_label: &str) -> Result<()> {
    let batch = frame.to_record_batch(not_applicable_label)?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    log::info!("Wrote {} rows to {}", frame.num_rows(), path.display());
    Ok(())
}

/// Read a Parquet file written by [`write_parquet`] back into a frame
///
/// # Arguments
/// * `path` - Path to the Parquet file
/// * `not_applicable_label` - Text that marks not-applicable cells
pub fn read_parquet(path: &Path, not_applicable_label: &str) -> Result<SurveyFrame> {
    let start = std::time::Instant::now();
    log_read_start("Parquet", path);

    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = builder.schema().clone();
    let reader = builder.build()?;

    let mut cells: Vec<Vec<Cell>> = vec![Vec::new(); schema.fields().len()];
    for batch in reader {
        append_batch(&batch?, &mut cells, not_applicable_label)?;
    }

    let frame = SurveyFrame::new(
        schema
            .fields()
            .iter()
            .zip(cells)
            .map(|(field, cells)| Column::new(field.name().as_str(), cells))
            .collect(),
    )?;
    log_frame_read(path, &frame, start.elapsed());
    Ok(frame)
}

fn append_batch(
    batch: &RecordBatch,
    cells: &mut [Vec<Cell>],
    not_applicable_label: &str,
) -> Result<()> {
    for (idx, target) in cells.iter_mut().enumerate() {
        let column = batch.column(idx);
        if let Some(array) = column.as_any().downcast_ref::<Float64Array>() {
            target.extend(
                (0..array.len())
                    .map(|row| Cell::from((!array.is_null(row)).then(|| array.value(row)))),
            );
        } else if let Some(array) = column.as_any().downcast_ref::<StringArray>() {
            target.extend((0..array.len()).map(|row| {
                if array.is_null(row) {
                    Cell::Missing
                } else if array.value(row) == not_applicable_label {
                    Cell::NotApplicable
                } else {
                    Cell::parse(array.value(row))
                }
            }));
        } else {
            return Err(SurveyError::invalid_data(format!(
                "Unsupported Parquet column type {} in column {idx}",
                column.data_type()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parquet_preserves_cell_tags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("poblacion.parquet");
        let frame = SurveyFrame::from_rows(
            &["C208", "INGTOT", "C207"],
            vec![
                vec![Cell::from(30), Cell::from(1500.5), Cell::text("Hombre")],
                vec![Cell::from(16), Cell::NotApplicable, Cell::Missing],
            ],
        )
        .unwrap();

        write_parquet(&frame, &path, "No Aplica").unwrap();
        let back = read_parquet(&path, "No Aplica").unwrap();

        assert_eq!(back.column_names(), frame.column_names());
        assert_eq!(back.cells("C208").unwrap(), frame.cells("C208").unwrap());
        assert_eq!(back.cells("INGTOT").unwrap()[1], Cell::NotApplicable);
        assert_eq!(back.cells("INGTOT").unwrap()[0], Cell::from(1500.5));
        assert_eq!(back.cells("C207").unwrap()[1], Cell::Missing);
    }
}
