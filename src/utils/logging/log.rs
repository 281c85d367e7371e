//! Run log lines
//!
//! Frame reads, extract tagging and output writes go through these helpers
//! so the run log reports rows, columns and periods the same way everywhere.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::{Period, SurveyFrame};

/// File name of `path`, or the whole path when it has none
fn file_label(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

/// Log the start of a file read
///
/// # Arguments
/// * `format` - File format, e.g. "CSV"
/// * `path` - File being read
pub fn log_read_start(format: &str, path: &Path) {
    log::debug!("Reading {format} file {}", path.display());
}

/// Log the shape of a frame read from `path`
pub fn log_frame_read(path: &Path, frame: &SurveyFrame, elapsed: Duration) {
    log::info!(
        "Read {} rows and {} columns from {} in {elapsed:?}",
        frame.num_rows(),
        frame.num_columns(),
        file_label(path)
    );
}

/// Log the rows an extract contributes to the unified dataset
pub fn log_extract_tagged(file_name: &str, period: &Period, rows: usize) {
    log::info!("{file_name}: {rows} rows tagged {period}");
}

/// Log the files written by one run
///
/// # Arguments
/// * `output_dir` - Directory the files were written to
/// * `written` - Paths of the files, in write order
/// * `elapsed` - Time spent writing
pub fn log_outputs_written(output_dir: &Path, written: &[PathBuf], elapsed: Duration) {
    log::info!(
        "Wrote {} files to {} in {elapsed:?}",
        written.len(),
        output_dir.display()
    );
    for path in written {
        log::debug!("  {}", file_label(path));
    }
}

/// Log a problem with one extract that does not stop the run
pub fn log_extract_warning(path: &Path, message: &str) {
    log::warn!("{}: {message}", file_label(path));
}
