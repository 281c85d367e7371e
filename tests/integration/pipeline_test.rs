//! End-to-end tests of a pipeline run and its outputs

use std::fs;

use survey_etl::algorithm::statistics::TestKind;
use survey_etl::pipeline::{
    BELOW_WORKING_AGE_FILE, CLEANING_SUMMARY_FILE, HYPOTHESIS_TESTS_FILE, INCOME_TREND_FILE,
    INFORMALITY_TREND_FILE, WORKFORCE_FILE,
};
use survey_etl::utils::io::{read_csv, read_parquet};
use survey_etl::{Cell, Period, PipelineConfig, run};

use crate::utils::{assert_close, sample_extract_dir};

#[test]
fn test_run_sample() -> survey_etl::Result<()> {
    let dir = sample_extract_dir();
    let output = run(dir.path(), &PipelineConfig::default())?;

    assert_eq!(output.rows_per_extract, vec![3, 4]);
    assert_eq!(output.sanitize_report.total_replaced(), 3);
    assert_eq!(output.weight_report.multiple_nonzero_rows, 0);
    assert_eq!(output.workforce().num_rows(), 5);
    assert_eq!(output.below_working_age().num_rows(), 1);

    let summary = &output.summary;
    assert_eq!(summary.respondents, 5);
    assert_close(summary.represented_population, 330.0);
    assert_close(summary.mean_income.unwrap(), 748_500.0 / 270.0);
    assert_close(summary.informality_rate.unwrap(), 175.0 / 270.0);
    Ok(())
}

#[test]
fn test_trends_are_chronological() -> survey_etl::Result<()> {
    let dir = sample_extract_dir();
    let output = run(dir.path(), &PipelineConfig::default())?;

    let periods: Vec<Period> = output.income_trend.iter().map(|p| p.period).collect();
    assert_eq!(
        periods,
        vec![Period::quarter(2024, 1).unwrap(), Period::quarter(2024, 2).unwrap()]
    );

    let income: Vec<f64> = output
        .income_trend
        .iter()
        .map(|p| p.statistic.unwrap().value)
        .collect();
    assert_close(income[0], 1700.0);
    assert_close(income[1], 1_072_000.0 / 290.0);

    let informality: Vec<f64> = output
        .informality_trend
        .iter()
        .map(|p| p.statistic.unwrap().value)
        .collect();
    assert_close(informality[0], 0.6);
    assert_close(informality[1], 200.0 / 290.0);
    Ok(())
}

#[test]
fn test_cleaning_evidence() -> survey_etl::Result<()> {
    let dir = sample_extract_dir();
    let output = run(dir.path(), &PipelineConfig::default())?;

    let before_age = &output.evidence.before[0];
    let after_age = &output.evidence.after[0];
    assert_eq!(before_age.column, "C208");
    assert_eq!(before_age.max, Some(99.0));
    assert_eq!(after_age.max, Some(70.0));
    assert_eq!(after_age.null, before_age.null + 1);

    let markdown = output.evidence.to_markdown();
    assert!(markdown.starts_with("# Resumen cuantitativo de la limpieza"));
    assert!(markdown.contains("| C208 | después |"));
    Ok(())
}

#[test]
fn test_outputs_are_written() -> survey_etl::Result<()> {
    let input = sample_extract_dir();
    let config = PipelineConfig::default();
    let output = run(input.path(), &config)?;

    let out_dir = tempfile::tempdir().unwrap();
    let target = out_dir.path().join("processed");
    let written = output.write_outputs(&target, &config)?;
    assert_eq!(written.len(), 8);
    assert!(written.iter().all(|path| path.exists()));

    let workforce = read_csv(&target.join(format!("{WORKFORCE_FILE}.csv")))?;
    assert_eq!(workforce.num_rows(), 5);
    assert_eq!(workforce.cells("INGTOT")?[4], Cell::text("No Aplica"));

    let below = read_parquet(
        &target.join(format!("{BELOW_WORKING_AGE_FILE}.parquet")),
        &config.not_applicable_label,
    )?;
    assert_eq!(below.num_rows(), 1);
    assert_eq!(below.cells("C208")?[0], Cell::Number(10.0));

    let summary = fs::read_to_string(target.join(CLEANING_SUMMARY_FILE))?;
    assert!(summary.contains("C208"));

    let income = fs::read_to_string(target.join(INCOME_TREND_FILE))?;
    let mut lines = income.lines();
    assert_eq!(
        lines.next(),
        Some("periodo,valor,peso_total,observaciones")
    );
    assert!(lines.next().is_some_and(|line| line.starts_with("2024-Q1,1700")));

    let informality = fs::read_to_string(target.join(INFORMALITY_TREND_FILE))?;
    assert_eq!(informality.lines().count(), 3);

    let tests = fs::read_to_string(target.join(HYPOTHESIS_TESTS_FILE))?;
    let mut lines = tests.lines();
    assert_eq!(
        lines.next(),
        Some("prueba,variable,grupo,estadistico,p_valor,gl,gl_denominador,significativo,nota")
    );
    assert_eq!(lines.count(), 6);
    Ok(())
}

#[test]
fn test_hypothesis_tests_run_on_employed() -> survey_etl::Result<()> {
    let dir = sample_extract_dir();
    let output = run(dir.path(), &PipelineConfig::default())?;

    let tests = &output.hypothesis_tests;
    assert_eq!(tests.len(), 6);
    assert_eq!(
        tests.iter().map(|t| t.kind).collect::<Vec<_>>(),
        vec![
            TestKind::Anova,
            TestKind::Anova,
            TestKind::Anova,
            TestKind::ChiSquare,
            TestKind::ChiSquare,
            TestKind::WelchT
        ]
    );
    assert_eq!(tests[0].grouping, "C207");
    assert!(tests.iter().all(|t| t.result.is_some()));

    // two men and two women are employed, one of each per quarter
    let anova = tests[0].result.unwrap();
    assert_close(anova.dof, 1.0);
    assert_eq!(anova.dof_denominator, Some(2.0));
    Ok(())
}

#[test]
fn test_single_sex_selection_is_not_computable() -> survey_etl::Result<()> {
    let dir = sample_extract_dir();
    let config = PipelineConfig {
        pay_gap_groups: ["Hombre".to_string(), "Otro".to_string()],
        ..PipelineConfig::default()
    };
    let output = run(dir.path(), &config)?;

    let welch = output.hypothesis_tests.last().unwrap();
    assert_eq!(welch.kind, TestKind::WelchT);
    assert!(welch.result.is_none());
    assert!(welch.not_computable.is_some());
    Ok(())
}

#[test]
fn test_run_on_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let result = run(&dir.path().join("absent"), &PipelineConfig::default());
    assert!(result.is_err());
}
