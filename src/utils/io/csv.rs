//! CSV file operations
//!
//! Survey extracts arrive as CSV. They are decoded with the Arrow CSV reader
//! using an all-text schema taken from the header, so that every value is
//! parsed into a [`Cell`] by the same rule regardless of what Arrow would
//! have inferred for the column.

use std::fs::File;
use std::io::Seek;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Array, StringArray};
use arrow::csv::reader::Format;
use arrow::csv::{ReaderBuilder, WriterBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use itertools::Itertools;

use crate::error::{Result, SurveyError};
use crate::models::{Cell, Column, SurveyFrame};
use crate::utils::logging::{log_frame_read, log_read_start};

/// Default batch size for CSV reading
pub const DEFAULT_BATCH_SIZE: usize = 8192;

/// Validates that a directory exists and is a directory
///
/// # Errors
/// Returns an error if the directory does not exist or is not a directory
pub fn validate_directory(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Err(SurveyError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Directory does not exist: {}", dir.display()),
        )));
    }
    Ok(())
}

/// Find all files with the given extension in a directory, sorted by file name
///
/// # Arguments
/// * `dir` - Directory to search (not recursive)
/// * `extension` - File extension without the dot, compared case-insensitively
pub fn find_files_with_extension(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    validate_directory(dir)?;

    let files = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        })
        .sorted_by(|a, b| a.file_name().cmp(&b.file_name()))
        .collect_vec();

    Ok(files)
}

/// Read a CSV file with a header row into a [`SurveyFrame`]
///
/// # Arguments
/// * `path` - Path to the CSV file
///
/// # Errors
/// Returns an error if the file cannot be opened or is not well-formed CSV
pub fn read_csv(path: &Path) -> Result<SurveyFrame> {
    let start = std::time::Instant::now();
    log_read_start("CSV", path);

    let mut file = File::open(path)?;
    let (inferred, _) = Format::default()
        .with_header(true)
        .infer_schema(&mut file, Some(0))?;
    file.rewind()?;

    let text_fields = inferred
        .fields()
        .iter()
        .map(|field| Field::new(field.name(), DataType::Utf8, true))
        .collect::<Vec<_>>();
    let names = text_fields
        .iter()
        .map(|field| field.name().clone())
        .collect::<Vec<_>>();

    let reader = ReaderBuilder::new(Arc::new(Schema::new(text_fields)))
        .with_header(true)
        .with_batch_size(DEFAULT_BATCH_SIZE)
        .build(file)?;

    let mut cells: Vec<Vec<Cell>> = vec![Vec::new(); names.len()];
    for batch in reader {
        append_text_batch(&batch?, &mut cells)?;
    }

    let frame = SurveyFrame::new(
        names
            .into_iter()
            .zip(cells)
            .map(|(name, cells)| Column::new(name, cells))
            .collect(),
    )?;
    log_frame_read(path, &frame, start.elapsed());
    Ok(frame)
}

fn append_text_batch(batch: &RecordBatch, cells: &mut [Vec<Cell>]) -> Result<()> {
    for (idx, target) in cells.iter_mut().enumerate() {
        let array = batch
            .column(idx)
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| {
                SurveyError::invalid_data(format!("CSV column {idx} was not decoded as text"))
            })?;
        target.extend((0..array.len()).map(|row| {
            if array.is_null(row) {
                Cell::Missing
            } else {
                Cell::parse(array.value(row))
            }
        }));
    }
    Ok(())
}

/// Write a record batch to a CSV file with a header row
///
/// # Errors
/// Returns an error if the file cannot be created or written
pub fn write_batch_csv(batch: &RecordBatch, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = WriterBuilder::new().with_header(true).build(file);
    writer.write(batch)?;
    Ok(())
}

/// Write a survey frame to a CSV file
///
/// # Arguments
/// * `frame` - The frame to write
/// * `path` - Destination file
/// * `not_applicable_label` - Text written for not-applicable cells
pub fn write_csv(frame: &SurveyFrame, path: &Path, not_applicable_label: &str) -> Result<()> {
    let batch = frame.to_record_batch(not_applicable_label)?;
    write_batch_csv(&batch, path)?;
    log::info!("Wrote {} rows to {}", frame.num_rows(), path.display());
    Ok(())
}
