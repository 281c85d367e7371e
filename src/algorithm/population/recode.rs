//! Categorical recoding
//!
//! Integer codes become their labels through the configured recode maps.
//! Codes without a label become missing and are counted per column, so a
//! stale data dictionary shows up in the run log instead of as silent gaps.

use std::collections::BTreeMap;

use crate::config::RecodeMaps;
use crate::models::SurveyFrame;

/// Unmapped values found while recoding
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecodeAudit {
    /// Unmapped values per column
    pub unmapped: BTreeMap<String, usize>,
}

impl RecodeAudit {
    /// Total unmapped values
    #[must_use]
    pub fn total(&self) -> usize {
        self.unmapped.values().sum()
    }

    /// Add the counts of another audit
    pub fn merge(&mut self, other: &Self) {
        for (column, count) in &other.unmapped {
            *self.unmapped.entry(column.clone()).or_default() += count;
        }
    }
}

/// Apply every recode map whose column exists, except the skipped ones
///
/// # Arguments
/// * `frame` - The frame to recode
/// * `maps` - Recode maps
/// * `skip` - Columns to leave untouched
#[must_use]
pub fn recode(frame: &SurveyFrame, maps: &RecodeMaps, skip: &[&str]) -> (SurveyFrame, RecodeAudit) {
    let mut audit = RecodeAudit::default();
    let mut result = frame.clone();

    for map in maps.iter() {
        if skip.contains(&map.column.as_str()) || !frame.has_column(&map.column) {
            continue;
        }
        let mut unmapped = 0;
        result = result.map_column(&map.column, |cell| {
            let (cell, was_unmapped) = map.apply(cell);
            unmapped += usize::from(was_unmapped);
            cell
        });
        if unmapped > 0 {
            log::warn!(
                "{unmapped} values in {} have no label (recode maps v{}) and were set to missing",
                map.column,
                maps.version
            );
            audit.unmapped.insert(map.column.clone(), unmapped);
        }
    }

    (result, audit)
}
