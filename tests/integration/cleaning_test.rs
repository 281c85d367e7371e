//! Tests for sentinel sanitization and expansion weight combination

use survey_etl::config::{ColumnConfig, PipelineConfig, SentinelCodeTable};
use survey_etl::{Cell, SurveyFrame, combine_expansion_weights, sanitize, unify_directory};

use crate::utils::{assert_close, sample_extract_dir};

fn ages(values: Vec<Cell>) -> SurveyFrame {
    SurveyFrame::from_rows(&["age"], values.into_iter().map(|cell| vec![cell]).collect()).unwrap()
}

#[test]
fn test_sentinel_age_becomes_missing() {
    let table = SentinelCodeTable::new("test").with_column("age", &[99]);
    let sanitized = sanitize(&ages(vec![Cell::from(99), Cell::from(45)]), &table);

    let cells = sanitized.frame.cells("age").unwrap();
    assert!(cells[0].is_missing());
    assert_eq!(cells[1], Cell::Number(45.0));
    assert_eq!(sanitized.report.total_replaced(), 1);
}

#[test]
fn test_sanitize_is_idempotent() {
    let table = SentinelCodeTable::new("test").with_column("age", &[99]);
    let frame = ages(vec![
        Cell::from(99),
        Cell::from(45),
        Cell::text("No Aplica"),
        Cell::text(" 30 "),
        Cell::NotApplicable,
        Cell::Missing,
    ]);

    let once = sanitize(&frame, &table);
    let twice = sanitize(&once.frame, &table);
    assert_eq!(once.frame.cells("age").unwrap(), twice.frame.cells("age").unwrap());
    assert_eq!(twice.report.total_replaced(), 0);
    assert_eq!(twice.report.total_coerced(), 0);
}

#[test]
fn test_unlisted_columns_are_untouched() {
    let table = SentinelCodeTable::new("test").with_column("age", &[99]);
    let frame = SurveyFrame::from_rows(
        &["age", "C203"],
        vec![vec![Cell::from(40), Cell::from(99)]],
    )
    .unwrap();
    let sanitized = sanitize(&frame, &table);
    assert_eq!(sanitized.frame.cells("C203").unwrap()[0], Cell::Number(99.0));
}

#[test]
fn test_default_table_on_sample_extracts() -> survey_etl::Result<()> {
    let dir = sample_extract_dir();
    let config = PipelineConfig::default();
    let unified = unify_directory(dir.path(), &config)?;
    let sanitized = sanitize(&unified.frame, &config.sentinels);

    // age 99, income 999999 and hours 99
    assert_eq!(sanitized.report.total_replaced(), 3);
    assert_eq!(sanitized.report.replaced.get("C208"), Some(&1));
    assert!(sanitized.frame.cells("C208")?[1].is_missing());
    Ok(())
}

#[test]
fn test_weights_combine_and_rescale() -> survey_etl::Result<()> {
    let dir = sample_extract_dir();
    let config = PipelineConfig::default();
    let unified = unify_directory(dir.path(), &config)?;
    let combined = combine_expansion_weights(
        &unified.frame,
        &config.weight_prefix,
        unified.period_count(),
        &config.columns,
    )?;

    let report = &combined.report;
    assert_eq!(report.source_columns, vec!["fa_abr24", "fa_ene24"]);
    assert_eq!(report.multiple_nonzero_rows, 0);
    assert_eq!(report.zero_total_rows, 0);

    let frame = &combined.frame;
    assert!(!frame.has_column("fa_abr24"));
    assert!(!frame.has_column("fa_ene24"));

    let expansion = frame.cells("factor_expansion")?;
    let adjusted = frame.cells("factor_ajustado")?;
    let expected = [200.0, 110.0, 90.0, 100.0, 150.0, 80.0, 120.0];
    for (row, weight) in expected.iter().enumerate() {
        assert_close(expansion[row].as_f64().unwrap(), *weight);
        assert_close(adjusted[row].as_f64().unwrap(), weight / 2.0);
    }
    Ok(())
}

#[test]
fn test_overlapping_weights_are_reported() -> survey_etl::Result<()> {
    let frame = SurveyFrame::from_rows(
        &["C208", "fa_ene24", "fa_abr24"],
        vec![
            vec![Cell::from(30), Cell::from(100), Cell::from(50)],
            vec![Cell::from(40), Cell::from(0), Cell::from(0)],
        ],
    )?;
    let combined = combine_expansion_weights(&frame, "fa_", 2, &ColumnConfig::default())?;

    assert_eq!(combined.report.multiple_nonzero_rows, 1);
    assert_eq!(combined.report.zero_total_rows, 1);
    assert_close(
        combined.frame.cells("factor_expansion")?[0].as_f64().unwrap(),
        150.0,
    );
    Ok(())
}

#[test]
fn test_zero_periods_is_a_config_error() {
    let frame = ages(vec![Cell::from(30)]);
    assert!(combine_expansion_weights(&frame, "fa_", 0, &ColumnConfig::default()).is_err());
}
