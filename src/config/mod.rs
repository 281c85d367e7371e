//! Configuration for the survey pipeline.
//!
//! Every mapping table and column name the pipeline depends on lives in
//! [`PipelineConfig`]. Defaults reproduce the quarterly labor-force extracts;
//! a JSON file can override any part of it.

pub mod tables;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SurveyError};
use crate::schema::HarmonizeOptions;
use crate::utils::io::paths::PeriodLookup;

pub use tables::{RecodeMap, RecodeMaps, SentinelCodeTable, SentinelSet};

/// Names of the columns the pipeline reads or creates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    /// Respondent age in years
    pub age: String,
    /// Sex code / label
    pub sex: String,
    /// Education level code / label
    pub education: String,
    /// Occupation type code / label
    pub occupation: String,
    /// Employment status code / label
    pub employment_status: String,
    /// Social-security (health insurance) coverage code
    pub coverage: String,
    /// Total monthly income
    pub income: String,
    /// Weekly hours worked
    pub hours: String,
    /// Region code / label
    pub region: String,
    /// Period tag stamped by the unifier
    pub period: String,
    /// Unified expansion weight
    pub expansion_weight: String,
    /// Expansion weight divided by the number of source periods
    pub adjusted_weight: String,
    /// Derived age band
    pub age_band: String,
    /// Derived informality indicator
    pub informality: String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            age: "C208".to_string(),
            sex: "C207".to_string(),
            education: "C366".to_string(),
            occupation: "C310".to_string(),
            employment_status: "OCUP300".to_string(),
            coverage: "C361_1".to_string(),
            income: "INGTOT".to_string(),
            hours: "whoraT".to_string(),
            region: "REGION".to_string(),
            period: "periodo".to_string(),
            expansion_weight: "factor_expansion".to_string(),
            adjusted_weight: "factor_ajustado".to_string(),
            age_band: "grupo_edad".to_string(),
            informality: "es_informal".to_string(),
        }
    }
}

/// What the informality indicator does when coverage is unknown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InformalityPolicy {
    /// Employed respondents with unknown coverage get a missing indicator
    #[default]
    PropagateMissing,
    /// Unknown coverage counts as formal (0), matching the legacy output
    DefaultFormal,
}

/// Settings for splitting and preparing the populations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegregationConfig {
    /// Minimum age of the potential workforce (inclusive)
    pub working_age_threshold: f64,
    /// Employment-status label meaning "employed"
    pub employed_label: String,
    /// Employment-status code meaning "employed", for unrecoded data
    pub employed_code: i64,
    /// Coverage code meaning "not covered"
    pub no_coverage_code: i64,
    /// Column prefixes that only apply to employed respondents
    pub not_applicable_prefixes: Vec<String>,
    /// When set, only prefixed columns whose question number is at least
    /// this value are filled (e.g. 308 keeps `C301_*` untouched)
    pub not_applicable_min_question: Option<u32>,
    /// Further employed-only columns
    pub not_applicable_columns: Vec<String>,
    /// Columns from this one onward are dropped for the below-working-age
    /// population
    pub boundary_column: String,
    /// Lower edges of the age bands; the last band is open-ended
    pub age_band_edges: Vec<f64>,
    /// Handling of unknown coverage for employed respondents
    pub informality_policy: InformalityPolicy,
}

impl Default for SegregationConfig {
    fn default() -> Self {
        Self {
            working_age_threshold: 14.0,
            employed_label: "Ocupado".to_string(),
            employed_code: 1,
            no_coverage_code: 2,
            not_applicable_prefixes: vec!["C3".to_string(), "I3".to_string(), "D3".to_string()],
            not_applicable_min_question: None,
            not_applicable_columns: vec![
                "INGTOT".to_string(),
                "INGTOTP".to_string(),
                "ingtrabw".to_string(),
                "whoraT".to_string(),
            ],
            boundary_column: "C300n".to_string(),
            age_band_edges: vec![14.0, 18.0, 25.0, 35.0, 45.0, 55.0, 65.0],
            informality_policy: InformalityPolicy::PropagateMissing,
        }
    }
}

/// Keep only rows from selected regions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionFilter {
    /// Region codes to keep
    pub codes: Vec<i64>,
}

/// Configuration for a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Column names
    pub columns: ColumnConfig,
    /// Prefix of the per-period expansion weight columns
    pub weight_prefix: String,
    /// Sentinel codes to clear before any numeric work
    pub sentinels: SentinelCodeTable,
    /// Category labels
    pub recode_maps: RecodeMaps,
    /// File name → period resolution
    pub periods: PeriodLookup,
    /// Column harmonization across extracts
    pub harmonization: HarmonizeOptions,
    /// Optional region restriction applied while loading
    pub region: Option<RegionFilter>,
    /// Population split and feature engineering
    pub segregation: SegregationConfig,
    /// Significance level for hypothesis tests
    pub significance_level: f64,
    /// Sex labels compared by the pay-gap t-test
    pub pay_gap_groups: [String; 2],
    /// Text written for not-applicable cells in outputs
    pub not_applicable_label: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            columns: ColumnConfig::default(),
            weight_prefix: "fa_".to_string(),
            sentinels: SentinelCodeTable::default(),
            recode_maps: RecodeMaps::default(),
            periods: PeriodLookup::default(),
            harmonization: HarmonizeOptions::default(),
            region: None,
            segregation: SegregationConfig::default(),
            significance_level: 0.05,
            pay_gap_groups: ["Hombre".to_string(), "Mujer".to_string()],
            not_applicable_label: "No Aplica".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a JSON file; missing fields take defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        log::info!(
            "Loaded configuration from {} (sentinels v{}, recode maps v{})",
            path.display(),
            config.sentinels.version,
            config.recode_maps.version
        );
        Ok(config)
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.significance_level) || self.significance_level == 0.0 {
            return Err(SurveyError::config(format!(
                "significance_level must be in (0, 1), got {}",
                self.significance_level
            )));
        }
        if self.weight_prefix.is_empty() {
            return Err(SurveyError::config("weight_prefix must not be empty"));
        }
        if self.pay_gap_groups[0] == self.pay_gap_groups[1] {
            return Err(SurveyError::config(
                "pay_gap_groups must name two different labels",
            ));
        }

        let edges = &self.segregation.age_band_edges;
        if edges.is_empty() {
            return Err(SurveyError::config("age_band_edges must not be empty"));
        }
        if edges.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(SurveyError::config(
                "age_band_edges must be strictly increasing",
            ));
        }

        self.periods.validate().map_err(SurveyError::Config)?;
        Ok(())
    }
}
