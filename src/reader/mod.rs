//! Module for discovering and reading survey extracts.
//!
//! An extract is one quarterly CSV file. Extracts are discovered in file-name
//! order, tagged with their period, and parsed in parallel while keeping that
//! order.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::error::{Result, SurveyError};
use crate::models::{Period, SurveyFrame};
use crate::schema::{SchemaCompatibilityReport, check_consistency};
use crate::utils::io::csv::{find_files_with_extension, read_csv};
use crate::utils::io::paths::PeriodLookup;
use crate::utils::logging::{create_main_progress_bar, finish_progress_bar, log_extract_warning};

/// A source extract and the period it covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceExtract {
    /// Full path of the file
    pub path: PathBuf,
    /// File name, used in logs and errors
    pub file_name: String,
    /// Period resolved from the file name
    pub period: Period,
}

impl SourceExtract {
    /// Create an extract, resolving its period through the lookup
    #[must_use]
    pub fn new(path: PathBuf, lookup: &PeriodLookup) -> Self {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let period = lookup.resolve(&path);
        Self {
            path,
            file_name,
            period,
        }
    }
}

/// List the CSV extracts in a directory, sorted by file name
///
/// # Errors
/// Returns `MissingInput` when the directory holds no CSV files
pub fn discover_extracts(dir: &Path, lookup: &PeriodLookup) -> Result<Vec<SourceExtract>> {
    let files = find_files_with_extension(dir, "csv")?;
    if files.is_empty() {
        return Err(SurveyError::MissingInput(dir.to_path_buf()));
    }

    let extracts = files
        .into_iter()
        .map(|path| SourceExtract::new(path, lookup))
        .collect::<Vec<_>>();
    for extract in &extracts {
        log::info!("Found extract {} ({})", extract.file_name, extract.period);
    }
    Ok(extracts)
}

/// Read one extract into a frame
pub fn read_extract(path: &Path) -> Result<SurveyFrame> {
    let frame = read_csv(path)?;
    if frame.num_columns() == 0 {
        log_extract_warning(path, "extract has no columns");
    }
    Ok(frame)
}

/// Read every extract in parallel; results keep the input order
pub fn read_extracts(extracts: &[SourceExtract]) -> Result<Vec<SurveyFrame>> {
    let pb = create_main_progress_bar(extracts.len() as u64, Some("Reading extracts"));
    let frames = extracts
        .par_iter()
        .map(|extract| {
            let frame = read_extract(&extract.path);
            pb.inc(1);
            frame
        })
        .collect::<Result<Vec<_>>>()?;
    finish_progress_bar(&pb, "Extracts read");
    Ok(frames)
}

/// Audit the column layout of every extract against the first one.
///
/// Never fails on a mismatch; inconsistencies are logged and returned.
pub fn schema_consistency_report(extracts: &[SourceExtract]) -> Result<SchemaCompatibilityReport> {
    let headers = extracts
        .par_iter()
        .map(|extract| {
            read_extract(&extract.path).map(|frame| (extract.file_name.clone(), frame.column_names()))
        })
        .collect::<Result<Vec<_>>>()?;

    let report = check_consistency(&headers);
    for issue in &report.issues {
        log::warn!("Schema inconsistency: {issue}");
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_discover_extracts_orders_and_tags() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Trim Jul-Ago-Set24.csv"), "a\n1\n").unwrap();
        fs::write(dir.path().join("Trim Abr-May-Jun24.csv"), "a\n1\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let extracts = discover_extracts(dir.path(), &PeriodLookup::default()).unwrap();
        assert_eq!(extracts.len(), 2);
        assert_eq!(extracts[0].file_name, "Trim Abr-May-Jun24.csv");
        assert_eq!(extracts[0].period, Period::quarter(2024, 2).unwrap());
        assert_eq!(extracts[1].period, Period::quarter(2024, 3).unwrap());
    }

    #[test]
    fn test_empty_directory_is_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover_extracts(dir.path(), &PeriodLookup::default()).unwrap_err();
        assert!(matches!(err, SurveyError::MissingInput(_)));
    }

    #[test]
    fn test_read_extracts_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        for (name, value) in [("a.csv", 1), ("b.csv", 2), ("c.csv", 3)] {
            fs::write(dir.path().join(name), format!("x\n{value}\n")).unwrap();
        }
        let extracts = discover_extracts(dir.path(), &PeriodLookup::default()).unwrap();
        let frames = read_extracts(&extracts).unwrap();
        let values = frames
            .iter()
            .map(|f| f.cells("x").unwrap()[0].as_code().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(values, vec![1, 2, 3]);
    }
}
