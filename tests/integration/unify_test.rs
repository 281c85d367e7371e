//! Tests for extract discovery, harmonization and unification

use survey_etl::config::{PipelineConfig, RegionFilter};
use survey_etl::reader::schema_consistency_report;
use survey_etl::schema::HarmonizeMode;
use survey_etl::{Cell, Period, SurveyError, discover_extracts, unify, unify_directory};

use crate::utils::{Q1_FILE, Q1_HEADER, Q1_ROWS, Q2_FILE, sample_extract_dir, write_extract};

#[test]
fn test_discovery_resolves_periods_in_name_order() -> survey_etl::Result<()> {
    let dir = sample_extract_dir();
    let extracts = discover_extracts(dir.path(), &PipelineConfig::default().periods)?;

    let names: Vec<&str> = extracts.iter().map(|e| e.file_name.as_str()).collect();
    assert_eq!(names, vec![Q2_FILE, Q1_FILE]);
    assert_eq!(extracts[0].period, Period::quarter(2024, 2).unwrap());
    assert_eq!(extracts[1].period, Period::quarter(2024, 1).unwrap());
    Ok(())
}

#[test]
fn test_reordered_extracts_share_one_layout() -> survey_etl::Result<()> {
    let dir = sample_extract_dir();
    let unified = unify_directory(dir.path(), &PipelineConfig::default())?;

    assert_eq!(unified.frame.num_rows(), 7);
    assert_eq!(unified.rows_per_extract, vec![3, 4]);
    assert_eq!(
        unified.frame.column_names(),
        vec![
            "C208", "C207", "REGION", "C300n", "C310", "C361_1", "C366", "OCUP300", "INGTOT",
            "whoraT", "fa_abr24", "fa_ene24", "periodo"
        ]
    );

    // The Q1 rows keep their values after reordering
    let ages = unified.frame.cells("C208")?;
    assert_eq!(ages[3], Cell::Number(35.0));
    let weights = unified.frame.cells("fa_ene24")?;
    assert_eq!(weights[3], Cell::Number(100.0));
    assert!(weights[0].is_missing());

    let periods = unified.frame.cells("periodo")?;
    assert_eq!(periods[0], Cell::text("2024-Q2"));
    assert_eq!(periods[6], Cell::text("2024-Q1"));
    Ok(())
}

#[test]
fn test_identical_extracts_double_the_rows() -> survey_etl::Result<()> {
    let dir = tempfile::tempdir().unwrap();
    write_extract(dir.path(), "Trim Ene-Feb-Mar24.csv", Q1_HEADER, &Q1_ROWS);
    let reordered = "C208,REGION,C207,C300n,C310,C361_1,C366,OCUP300,INGTOT,whoraT,fa_ene24";
    let rows = Q1_ROWS
        .iter()
        .map(|row| {
            let mut fields: Vec<&str> = row.split(',').collect();
            fields.swap(0, 2);
            fields.swap(1, 2);
            fields.join(",")
        })
        .collect::<Vec<_>>();
    let rows = rows.iter().map(String::as_str).collect::<Vec<_>>();
    write_extract(dir.path(), "Trim Ene-Feb-Mar25.csv", reordered, &rows);

    let unified = unify_directory(dir.path(), &PipelineConfig::default())?;
    assert_eq!(unified.frame.num_rows(), 2 * Q1_ROWS.len());

    let regions = unified.frame.cells("REGION")?;
    let ages = unified.frame.cells("C208")?;
    for row in 0..Q1_ROWS.len() {
        assert_eq!(regions[row], regions[row + Q1_ROWS.len()]);
        assert_eq!(ages[row], ages[row + Q1_ROWS.len()]);
    }
    Ok(())
}

#[test]
fn test_strict_mode_rejects_reordered_extract() {
    let dir = sample_extract_dir();
    let mut config = PipelineConfig::default();
    config.harmonization.mode = HarmonizeMode::Strict;

    let err = unify_directory(dir.path(), &config).unwrap_err();
    match err {
        SurveyError::SchemaMismatch { file, diff } => {
            assert_eq!(file, Q1_FILE);
            assert!(diff.order_differs);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_lenient_mode_rejects_missing_columns() {
    let dir = sample_extract_dir();
    write_extract(dir.path(), "Trim Jul-Ago-Set24.csv", "C208,C207,fa_jul24", &["30,1,50"]);

    let err = unify_directory(dir.path(), &PipelineConfig::default()).unwrap_err();
    assert!(matches!(err, SurveyError::SchemaMismatch { .. }));
}

#[test]
fn test_empty_directory_is_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let err = unify_directory(dir.path(), &PipelineConfig::default()).unwrap_err();
    assert!(matches!(err, SurveyError::MissingInput(_)));
}

#[test]
fn test_region_restriction() -> survey_etl::Result<()> {
    let dir = sample_extract_dir();
    let config = PipelineConfig {
        region: Some(RegionFilter { codes: vec![2] }),
        ..PipelineConfig::default()
    };
    let extracts = discover_extracts(dir.path(), &config.periods)?;
    let unified = unify(extracts, &config)?;

    assert_eq!(unified.rows_per_extract, vec![1, 0]);
    assert_eq!(unified.frame.cells("C208")?[0], Cell::Number(16.0));
    Ok(())
}

#[test]
fn test_consistency_report_lists_drift() -> survey_etl::Result<()> {
    let dir = sample_extract_dir();
    let extracts = discover_extracts(dir.path(), &PipelineConfig::default().periods)?;
    let report = schema_consistency_report(&extracts)?;

    assert!(!report.compatible);
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].file_path, Q1_FILE);
    Ok(())
}
