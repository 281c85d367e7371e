//! Survey extract unification
//!
//! Reads every quarterly extract, brings them onto one canonical column
//! layout, tags each row with its period and stacks them into one dataset.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::config::{PipelineConfig, RegionFilter};
use crate::error::{Result, SurveyError};
use crate::models::{Cell, Column, SurveyFrame};
use crate::reader::{SourceExtract, discover_extracts, read_extracts};
use crate::schema::{CanonicalSchema, canonical_schema_for, harmonize};
use crate::utils::logging::log_extract_tagged;

/// The unified dataset and how it was assembled
#[derive(Debug, Clone)]
pub struct UnifiedDataset {
    /// All extracts stacked in load order
    pub frame: SurveyFrame,
    /// The canonical layout every extract was harmonized to
    pub schema: CanonicalSchema,
    /// Extracts in load order
    pub extracts: Vec<SourceExtract>,
    /// Rows contributed by each extract, after any region restriction
    pub rows_per_extract: Vec<usize>,
}

impl UnifiedDataset {
    /// Number of source periods, used to rescale the combined weight
    #[must_use]
    pub fn period_count(&self) -> usize {
        self.extracts.len()
    }
}

/// Discover and unify every CSV extract in a directory
pub fn unify_directory(dir: &Path, config: &PipelineConfig) -> Result<UnifiedDataset> {
    let extracts = discover_extracts(dir, &config.periods)?;
    unify(extracts, config)
}

/// Unify a list of extracts
///
/// # Arguments
/// * `extracts` - Extracts in the order they should be stacked
/// * `config` - Pipeline configuration (harmonization, weight prefix, region)
///
/// # Errors
/// Fails on an empty extract list, unreadable files and extracts that cannot
/// be harmonized
pub fn unify(extracts: Vec<SourceExtract>, config: &PipelineConfig) -> Result<UnifiedDataset> {
    if extracts.is_empty() {
        return Err(SurveyError::MissingInput(PathBuf::new()));
    }
    let frames = read_extracts(&extracts)?;

    let column_lists = frames.iter().map(SurveyFrame::column_names).collect::<Vec<_>>();
    let schema = canonical_schema_for(&column_lists, &config.harmonization, &config.weight_prefix)?;
    log::info!(
        "Canonical schema: {} columns plus {} expansion weight columns",
        schema.columns.len(),
        schema.weight_columns.len()
    );

    let period_column = config.columns.period.as_str();
    let harmonized = frames
        .par_iter()
        .zip(extracts.par_iter())
        .map(|(frame, extract)| {
            let frame = harmonize(
                frame,
                &extract.file_name,
                &schema,
                config.harmonization.mode,
                &config.weight_prefix,
            )?;
            let frame = match &config.region {
                Some(filter) => restrict_to_region(&frame, &config.columns.region, filter)?,
                None => frame,
            };
            let rows = frame.num_rows();
            frame.with_column(Column::filled(
                period_column,
                &Cell::text(extract.period.label()),
                rows,
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    let rows_per_extract = harmonized.iter().map(SurveyFrame::num_rows).collect::<Vec<_>>();
    for (extract, rows) in extracts.iter().zip(&rows_per_extract) {
        log_extract_tagged(&extract.file_name, &extract.period, *rows);
    }

    let frame = SurveyFrame::concat(&harmonized)?.map_cells(|cell| {
        if cell.is_blank_text() {
            Cell::Missing
        } else {
            cell.clone()
        }
    });
    log::info!(
        "Unified {} extracts into {} rows and {} columns",
        extracts.len(),
        frame.num_rows(),
        frame.num_columns()
    );

    Ok(UnifiedDataset {
        frame,
        schema,
        extracts,
        rows_per_extract,
    })
}

/// Keep only rows whose region code is in the filter
///
/// # Errors
/// Fails when the region column is absent
pub fn restrict_to_region(
    frame: &SurveyFrame,
    region_column: &str,
    filter: &RegionFilter,
) -> Result<SurveyFrame> {
    let mask = frame
        .cells(region_column)?
        .iter()
        .map(|cell| cell.as_code().is_some_and(|code| filter.codes.contains(&code)))
        .collect::<Vec<_>>();
    frame.filter(&mask)
}
