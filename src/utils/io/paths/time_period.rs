//! Time period utilities for survey extract files
//!
//! Quarterly extracts are named after the three months they cover, e.g.
//! `Trim Ene-Feb-Mar24.csv`. This module maps file names to [`Period`]s,
//! first through an explicit lookup table and then, optionally, through a
//! pattern on the month triplet.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::Period;

static TRIMESTER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Trim ([A-Za-z-]+?)(\d{2})(?:\D|$)").expect("trimester pattern is a valid regex")
});

/// Month triplet → quarter, as used in extract file names
const MONTH_TRIPLETS: [(&str, u8); 5] = [
    ("Ene-Feb-Mar", 1),
    ("Abr-May-Jun", 2),
    ("Mar-Abr-May", 2),
    ("Jul-Ago-Set", 3),
    ("Set-Oct-Nov", 4),
];

/// Resolves extract file names to survey periods
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodLookup {
    /// Explicit file name → `YYYY-Qn` table
    pub files: BTreeMap<String, String>,
    /// Fall back to the `Trim <months><yy>` pattern for unlisted files
    pub infer_from_name: bool,
}

impl Default for PeriodLookup {
    fn default() -> Self {
        let files = [
            ("Trim Ene-Feb-Mar24.csv", "2024-Q1"),
            ("Trim Abr-May-Jun24.csv", "2024-Q2"),
            ("Trim Jul-Ago-Set24.csv", "2024-Q3"),
            ("Trim Set-Oct-Nov24.csv", "2024-Q4"),
            ("Trim Ene-Feb-Mar25.csv", "2025-Q1"),
            ("Trim Mar-Abr-May25.csv", "2025-Q2"),
        ]
        .into_iter()
        .map(|(file, period)| (file.to_string(), period.to_string()))
        .collect();

        Self {
            files,
            infer_from_name: true,
        }
    }
}

impl PeriodLookup {
    /// A lookup with only an explicit table and no pattern fallback
    #[must_use]
    pub fn explicit(files: BTreeMap<String, String>) -> Self {
        Self {
            files,
            infer_from_name: false,
        }
    }

    /// Resolve the period of a file.
    ///
    /// Never fails: unrecognized names resolve to [`Period::Unknown`].
    #[must_use]
    pub fn resolve(&self, path: &Path) -> Period {
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            return Period::Unknown;
        };

        if let Some(label) = self.files.get(file_name) {
            match label.parse::<Period>() {
                Ok(period) => return period,
                Err(e) => log::warn!("Ignoring period label for {file_name}: {e}"),
            }
        }

        if self.infer_from_name {
            if let Some(period) = extract_period(file_name) {
                return period;
            }
        }

        log::warn!("No period known for extract {file_name}; tagging rows as unknown");
        Period::Unknown
    }

    /// Check that every label in the table parses
    pub fn validate(&self) -> Result<(), String> {
        for (file, label) in &self.files {
            label
                .parse::<Period>()
                .map_err(|e| format!("Bad period for '{file}': {e}"))?;
        }
        Ok(())
    }
}

/// Extract a period from a `Trim <months><yy>` file name
#[must_use]
pub fn extract_period(file_name: &str) -> Option<Period> {
    let caps = TRIMESTER_PATTERN.captures(file_name)?;
    let months = caps.get(1)?.as_str();
    let year = caps.get(2)?.as_str().parse::<i32>().ok()?;
    let quarter = MONTH_TRIPLETS
        .iter()
        .find(|(triplet, _)| *triplet == months)
        .map(|(_, quarter)| *quarter)?;
    Period::quarter(2000 + year, quarter)
}
