//! End-to-end processing of a directory of survey extracts
//!
//! Stages run in a fixed order, each taking the previous frame and returning
//! a new one:
//!
//! 1. unify the extracts onto one schema, tagged by period
//! 2. clear sentinel codes
//! 3. combine the per-period expansion weights
//! 4. split at the working-age threshold and derive features
//!
//! The resulting [`PipelineOutput`] is immutable and can be shared between
//! readers; re-running the pipeline is the only way to refresh it.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::algorithm::cleaning::{SanitizeReport, WeightReport, combine_expansion_weights, sanitize};
use crate::algorithm::population::{RecordFilter, Segregation, apply_filter, segregate};
use crate::algorithm::statistics::{
    CleaningEvidence, HypothesisOutcome, HypothesisRecord, OutlierProfile, SelectionSummary,
    StatError, TrendPoint, TrendRecord, WeightedAggregator, high_value_profile, standard_tests,
};
use crate::config::PipelineConfig;
use crate::error::{Result, SurveyError};
use crate::loader::{UnifiedDataset, unify_directory};
use crate::models::SurveyFrame;
use crate::reader::SourceExtract;
use crate::schema::CanonicalSchema;
use crate::utils::io::{write_csv, write_parquet, write_records_csv};
use crate::utils::logging::log_outputs_written;

/// Cleaned population at or above working age
pub const WORKFORCE_FILE: &str = "datos_limpios_poblacion_trabajo";
/// Cleaned population below working age
pub const BELOW_WORKING_AGE_FILE: &str = "datos_limpios_poblacion_no_trabajo";
/// Before/after cleaning summary
pub const CLEANING_SUMMARY_FILE: &str = "resumen_cuantitativo_limpieza.md";
/// Weighted mean income per period
pub const INCOME_TREND_FILE: &str = "tendencia_ingreso.csv";
/// Weighted informality rate per period
pub const INFORMALITY_TREND_FILE: &str = "tendencia_informalidad.csv";
/// Hypothesis tests on employed respondents
pub const HYPOTHESIS_TESTS_FILE: &str = "pruebas_hipotesis.csv";

/// Everything a pipeline run produces
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Extracts in load order
    pub extracts: Vec<SourceExtract>,
    /// Rows contributed by each extract
    pub rows_per_extract: Vec<usize>,
    /// Canonical layout of the unified dataset
    pub schema: CanonicalSchema,
    /// Sentinel replacements and coercions
    pub sanitize_report: SanitizeReport,
    /// Weight combination checks
    pub weight_report: WeightReport,
    /// The two populations
    pub segregation: Segregation,
    /// Key columns before and after sanitization
    pub evidence: CleaningEvidence,
    /// Pooled figures for the whole workforce
    pub summary: SelectionSummary,
    /// Weighted mean income of employed respondents per period
    pub income_trend: Vec<TrendPoint>,
    /// Weighted informality rate of employed respondents per period
    pub informality_trend: Vec<TrendPoint>,
    /// Respondents with unusually high income, if computable
    pub income_outliers: Option<OutlierProfile>,
    /// Income and informality tests on employed respondents
    pub hypothesis_tests: Vec<HypothesisOutcome>,
}

impl PipelineOutput {
    /// Population at or above working age
    #[must_use]
    pub fn workforce(&self) -> &SurveyFrame {
        &self.segregation.workforce
    }

    /// Population below working age
    #[must_use]
    pub fn below_working_age(&self) -> &SurveyFrame {
        &self.segregation.below_working_age
    }

    /// Write the populations, cleaning summary, trends and test table to `output_dir`
    ///
    /// # Returns
    /// Paths of the files written
    ///
    /// # Errors
    /// Fails when the directory cannot be created or a file cannot be written
    pub fn write_outputs(&self, output_dir: &Path, config: &PipelineConfig) -> Result<Vec<PathBuf>> {
        let start = Instant::now();
        fs::create_dir_all(output_dir)?;

        let label = config.not_applicable_label.as_str();
        let mut written = Vec::new();

        for (stem, frame) in [
            (WORKFORCE_FILE, self.workforce()),
            (BELOW_WORKING_AGE_FILE, self.below_working_age()),
        ] {
            let csv_path = output_dir.join(format!("{stem}.csv"));
            write_csv(frame, &csv_path, label)?;
            written.push(csv_path);

            let parquet_path = output_dir.join(format!("{stem}.parquet"));
            write_parquet(frame, &parquet_path, label)?;
            written.push(parquet_path);
        }

        let summary_path = output_dir.join(CLEANING_SUMMARY_FILE);
        fs::write(&summary_path, self.evidence.to_markdown())?;
        written.push(summary_path);

        for (file, trend) in [
            (INCOME_TREND_FILE, &self.income_trend),
            (INFORMALITY_TREND_FILE, &self.informality_trend),
        ] {
            let records = trend.iter().map(TrendRecord::from).collect::<Vec<_>>();
            let path = output_dir.join(file);
            write_records_csv(&records, &path)?;
            written.push(path);
        }

        let tests = self
            .hypothesis_tests
            .iter()
            .map(HypothesisRecord::from)
            .collect::<Vec<_>>();
        let tests_path = output_dir.join(HYPOTHESIS_TESTS_FILE);
        write_records_csv(&tests, &tests_path)?;
        written.push(tests_path);

        log_outputs_written(output_dir, &written, start.elapsed());
        Ok(written)
    }
}

/// Run every stage on the extracts in `input_dir`
///
/// # Errors
/// Fails on invalid configuration, a missing or empty input directory,
/// unreadable extracts, irreconcilable schemas and absent key columns
pub fn run(input_dir: &Path, config: &PipelineConfig) -> Result<PipelineOutput> {
    config.validate()?;
    let unified = unify_directory(input_dir, config)?;
    process(unified, config)
}

/// Run the cleaning, segregation and summary stages on a unified dataset
pub fn process(unified: UnifiedDataset, config: &PipelineConfig) -> Result<PipelineOutput> {
    let columns = &config.columns;
    let period_count = unified.period_count();

    let sanitized = sanitize(&unified.frame, &config.sentinels);
    log::info!(
        "Sanitized: {} sentinel codes cleared, {} values coerced to missing",
        sanitized.report.total_replaced(),
        sanitized.report.total_coerced()
    );

    let evidence = CleaningEvidence::new(
        &unified.frame,
        &sanitized.frame,
        &[&columns.age, &columns.income, &columns.hours],
    );

    let combined = combine_expansion_weights(
        &sanitized.frame,
        &config.weight_prefix,
        period_count,
        columns,
    )?;

    let segregation = segregate(&combined.frame, config)?;
    if segregation.recode_audit.total() > 0 {
        log::warn!(
            "{} category codes had no label and became missing",
            segregation.recode_audit.total()
        );
    }

    let pooled = WeightedAggregator::new(columns.adjusted_weight.as_str());
    let summary = SelectionSummary::compute(
        &segregation.workforce,
        &pooled,
        columns,
        &config.segregation,
    )?;

    let employed = employed_only(&segregation.workforce, config)?;
    let per_period = WeightedAggregator::new(columns.expansion_weight.as_str());
    let income_trend = per_period.trend(&employed, &columns.income, &columns.period)?;
    let informality_trend = per_period.trend(&employed, &columns.informality, &columns.period)?;

    let income_outliers = match high_value_profile(
        &employed,
        &pooled,
        &columns.income,
        &[&columns.sex, &columns.education, &columns.occupation],
    ) {
        Ok(profile) => Some(profile),
        Err(SurveyError::Statistic(StatError::NoObservations)) => {
            log::info!("No income values; outlier profile skipped");
            None
        }
        Err(e) => return Err(e),
    };

    let hypothesis_tests = standard_tests(
        &employed,
        columns,
        &config.pay_gap_groups,
        config.significance_level,
    )?;
    let significant = hypothesis_tests.iter().filter(|t| t.is_significant()).count();
    log::info!(
        "{} hypothesis tests at alpha {}: {significant} significant",
        hypothesis_tests.len(),
        config.significance_level
    );

    Ok(PipelineOutput {
        extracts: unified.extracts,
        rows_per_extract: unified.rows_per_extract,
        schema: unified.schema,
        sanitize_report: sanitized.report,
        weight_report: combined.report,
        segregation,
        evidence,
        summary,
        income_trend,
        informality_trend,
        income_outliers,
        hypothesis_tests,
    })
}

/// Employed respondents of a population
pub fn employed_only(frame: &SurveyFrame, config: &PipelineConfig) -> Result<SurveyFrame> {
    let settings = &config.segregation;
    let filter = RecordFilter::LabelIn {
        column: config.columns.employment_status.clone(),
        labels: vec![
            settings.employed_label.clone(),
            settings.employed_code.to_string(),
        ],
    };
    apply_filter(frame, &filter)
}
