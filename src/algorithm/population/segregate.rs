//! Population segregation
//!
//! Splits the cleaned dataset at the working-age threshold and prepares each
//! part: the potential workforce gets labels, not-applicable marking and
//! derived features; the population below working age keeps only the
//! household-roster questions that apply to it.

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::models::SurveyFrame;

use super::features::{AgeBands, add_age_band, add_informality, fill_not_applicable};
use super::recode::{RecodeAudit, recode};

/// The two populations and what happened while building them
#[derive(Debug, Clone)]
pub struct Segregation {
    /// Respondents at or above the working-age threshold
    pub workforce: SurveyFrame,
    /// Respondents below the working-age threshold
    pub below_working_age: SurveyFrame,
    /// Rows dropped because age was missing or not numeric
    pub excluded_missing_age: usize,
    /// Unmapped category codes in both populations
    pub recode_audit: RecodeAudit,
    /// Cells marked not applicable in the workforce
    pub not_applicable_cells: usize,
}

/// Row indices of each side of the age split
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgeSplit {
    /// Rows at or above the threshold
    pub at_or_above: Vec<usize>,
    /// Rows below the threshold
    pub below: Vec<usize>,
    /// Rows without a usable age
    pub excluded: Vec<usize>,
}

/// Partition rows by age
///
/// Every row lands in exactly one of the three lists.
pub fn split_by_age(frame: &SurveyFrame, age_column: &str, threshold: f64) -> Result<AgeSplit> {
    let mut split = AgeSplit::default();
    for (row, cell) in frame.cells(age_column)?.iter().enumerate() {
        match cell.coerce_f64() {
            Some(age) if age >= threshold => split.at_or_above.push(row),
            Some(_) => split.below.push(row),
            None => split.excluded.push(row),
        }
    }
    Ok(split)
}

/// Split and prepare both populations
///
/// # Arguments
/// * `frame` - Sanitized dataset with combined weights
/// * `config` - Pipeline configuration
///
/// # Errors
/// Fails when the age or employment-status column is absent, or the age band
/// edges are invalid
pub fn segregate(frame: &SurveyFrame, config: &PipelineConfig) -> Result<Segregation> {
    let settings = &config.segregation;
    let split = split_by_age(frame, &config.columns.age, settings.working_age_threshold)?;

    if !split.excluded.is_empty() {
        log::warn!(
            "{} rows without a usable age ({}) were excluded from both populations",
            split.excluded.len(),
            config.columns.age
        );
    }

    let (workforce, workforce_audit, not_applicable_cells) =
        prepare_workforce(frame.take(&split.at_or_above), config)?;
    let (below_working_age, below_audit) =
        prepare_below_working_age(&frame.take(&split.below), config);

    let mut recode_audit = workforce_audit;
    recode_audit.merge(&below_audit);

    log::info!(
        "Segregated {} rows: {} at or above age {}, {} below, {} excluded",
        frame.num_rows(),
        workforce.num_rows(),
        settings.working_age_threshold,
        below_working_age.num_rows(),
        split.excluded.len()
    );

    Ok(Segregation {
        workforce,
        below_working_age,
        excluded_missing_age: split.excluded.len(),
        recode_audit,
        not_applicable_cells,
    })
}

/// Mark not-applicable job questions, recode, and derive features
pub fn prepare_workforce(
    frame: SurveyFrame,
    config: &PipelineConfig,
) -> Result<(SurveyFrame, RecodeAudit, usize)> {
    let columns = &config.columns;
    let settings = &config.segregation;

    let (frame, marked) = fill_not_applicable(frame, &columns.employment_status, settings)?;
    let (frame, audit) = recode(&frame, &config.recode_maps, &[]);

    let bands = AgeBands::new(&settings.age_band_edges)?;
    let frame = add_age_band(frame, &columns.age, &columns.age_band, &bands)?;
    let frame = add_informality(
        frame,
        &columns.employment_status,
        &columns.coverage,
        &columns.informality,
        settings,
    )?;

    Ok((frame, audit, marked))
}

/// Keep the roster questions and weights, then recode everything except
/// employment status
#[must_use]
pub fn prepare_below_working_age(
    frame: &SurveyFrame,
    config: &PipelineConfig,
) -> (SurveyFrame, RecodeAudit) {
    let columns = &config.columns;
    let pruned = match frame.position(&config.segregation.boundary_column) {
        Some(boundary) => {
            let retained = [
                columns.period.as_str(),
                columns.expansion_weight.as_str(),
                columns.adjusted_weight.as_str(),
            ];
            let dropped = frame
                .column_names()
                .into_iter()
                .enumerate()
                .filter(|(idx, name)| *idx >= boundary && !retained.contains(&name.as_str()))
                .map(|(_, name)| name)
                .collect::<Vec<_>>();
            frame.clone().without_columns(&dropped)
        }
        None => {
            log::debug!(
                "Boundary column {} not found; below-working-age columns kept",
                config.segregation.boundary_column
            );
            frame.clone()
        }
    };

    recode(
        &pruned,
        &config.recode_maps,
        &[columns.employment_status.as_str()],
    )
}
