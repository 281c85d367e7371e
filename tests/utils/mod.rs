//! Shared fixtures for the integration tests
//!
//! Extracts are written as small CSV files into a temporary directory that
//! lives as long as the returned [`TempDir`].

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Header of the first-quarter extract
pub const Q1_HEADER: &str = "REGION,C207,C208,C300n,C310,C361_1,C366,OCUP300,INGTOT,whoraT,fa_ene24";

/// Header of the second-quarter extract: same columns, different order,
/// its own weight column
pub const Q2_HEADER: &str = "C208,C207,REGION,C300n,C310,C361_1,C366,OCUP300,INGTOT,whoraT,fa_abr24";

/// First quarter of 2024
///
/// * a covered employee (35, formal)
/// * an uncovered independent worker (28, informal)
/// * a child below working age (10)
/// * an inactive retiree with sentinel income and hours (70)
pub const Q1_ROWS: [&str; 4] = [
    "1,1,35,1,3,1,6,1,2000,40,100",
    "1,2,28,1,2,2,9,1,1500,30,150",
    "1,2,10,,,,,,,,80",
    "1,1,70,2,,,4,4,999999,99,120",
];

/// Second quarter of 2024
///
/// * an uncovered employer (45, informal)
/// * a respondent with a sentinel age (99), excluded from both populations
/// * a covered young employee outside Lima (16, formal)
pub const Q2_ROWS: [&str; 3] = [
    "45,1,1,1,1,2,11,1,5000,48,200",
    "99,2,1,2,,,6,4,,,110",
    "16,2,2,1,3,1,6,1,800,20,90",
];

/// File name of the first-quarter extract
pub const Q1_FILE: &str = "Trim Ene-Feb-Mar24.csv";
/// File name of the second-quarter extract
pub const Q2_FILE: &str = "Trim Abr-May-Jun24.csv";

/// Write a CSV extract with a header row
pub fn write_extract(dir: &Path, name: &str, header: &str, rows: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let mut content = String::from(header);
    content.push('\n');
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    fs::write(&path, content).unwrap();
    path
}

/// A directory with both quarterly extracts
#[must_use]
pub fn sample_extract_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_extract(dir.path(), Q1_FILE, Q1_HEADER, &Q1_ROWS);
    write_extract(dir.path(), Q2_FILE, Q2_HEADER, &Q2_ROWS);
    dir
}

/// Assert two floats agree to 1e-9
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
