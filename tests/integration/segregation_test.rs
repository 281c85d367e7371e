//! Tests for population segregation and derived features

use survey_etl::algorithm::population::{AgeBands, RecordFilter, informality, split_by_age};
use survey_etl::config::{InformalityPolicy, PipelineConfig, SegregationConfig};
use survey_etl::{Cell, SurveyFrame, apply_filter, combine_expansion_weights, sanitize, segregate, unify_directory};

use crate::utils::sample_extract_dir;

fn cleaned_sample() -> (SurveyFrame, PipelineConfig) {
    let dir = sample_extract_dir();
    let config = PipelineConfig::default();
    let unified = unify_directory(dir.path(), &config).unwrap();
    let sanitized = sanitize(&unified.frame, &config.sentinels);
    let combined = combine_expansion_weights(
        &sanitized.frame,
        &config.weight_prefix,
        unified.period_count(),
        &config.columns,
    )
    .unwrap();
    (combined.frame, config)
}

#[test]
fn test_split_is_a_partition() -> survey_etl::Result<()> {
    let (frame, config) = cleaned_sample();
    let split = split_by_age(&frame, "C208", config.segregation.working_age_threshold)?;

    let mut rows: Vec<usize> = split
        .at_or_above
        .iter()
        .chain(&split.below)
        .chain(&split.excluded)
        .copied()
        .collect();
    rows.sort_unstable();
    assert_eq!(rows, (0..frame.num_rows()).collect::<Vec<_>>());
    assert_eq!(split.excluded, vec![1]);
    Ok(())
}

#[test]
fn test_segregate_sample() -> survey_etl::Result<()> {
    let (frame, config) = cleaned_sample();
    let segregation = segregate(&frame, &config)?;

    assert_eq!(segregation.workforce.num_rows(), 5);
    assert_eq!(segregation.below_working_age.num_rows(), 1);
    assert_eq!(segregation.excluded_missing_age, 1);
    assert_eq!(
        segregation.workforce.num_rows()
            + segregation.below_working_age.num_rows()
            + segregation.excluded_missing_age,
        frame.num_rows()
    );
    assert_eq!(segregation.recode_audit.total(), 0);
    Ok(())
}

#[test]
fn test_workforce_labels_and_features() -> survey_etl::Result<()> {
    let (frame, config) = cleaned_sample();
    let workforce = segregate(&frame, &config)?.workforce;

    // Rows: 45 (Q2), 16 (Q2), 35, 28, 70 (Q1)
    assert_eq!(
        workforce.cells("OCUP300")?,
        &[
            Cell::text("Ocupado"),
            Cell::text("Ocupado"),
            Cell::text("Ocupado"),
            Cell::text("Ocupado"),
            Cell::text("Inactivo pleno"),
        ]
    );
    assert_eq!(workforce.cells("C207")?[0], Cell::text("Hombre"));
    assert_eq!(workforce.cells("REGION")?[1], Cell::text("Resto Urbano"));

    assert_eq!(
        workforce.cells("grupo_edad")?,
        &[
            Cell::text("45-54"),
            Cell::text("14-17"),
            Cell::text("35-44"),
            Cell::text("25-34"),
            Cell::text("65+"),
        ]
    );
    assert_eq!(
        workforce.cells("es_informal")?,
        &[
            Cell::from(1),
            Cell::from(0),
            Cell::from(0),
            Cell::from(1),
            Cell::from(0),
        ]
    );

    // Job questions of the inactive respondent are not applicable
    assert!(workforce.cells("INGTOT")?[4].is_not_applicable());
    assert!(workforce.cells("whoraT")?[4].is_not_applicable());
    assert!(workforce.cells("C310")?[4].is_not_applicable());
    assert_eq!(workforce.cells("INGTOT")?[0], Cell::Number(5000.0));
    Ok(())
}

#[test]
fn test_below_working_age_keeps_roster_columns() -> survey_etl::Result<()> {
    let (frame, config) = cleaned_sample();
    let below = segregate(&frame, &config)?.below_working_age;

    assert_eq!(
        below.column_names(),
        vec!["C208", "C207", "REGION", "periodo", "factor_expansion", "factor_ajustado"]
    );
    assert_eq!(below.cells("C207")?[0], Cell::text("Mujer"));
    Ok(())
}

#[test]
fn test_eighteen_is_in_the_adult_band() {
    let bands = AgeBands::new(&[14.0, 18.0, 25.0, 35.0, 45.0, 55.0, 65.0]).unwrap();
    assert_eq!(bands.label_of(18.0), Some("18-24"));
    assert_eq!(bands.label_of(17.9), Some("14-17"));
    assert_eq!(bands.label_of(13.0), None);
}

#[test]
fn test_age_bands_are_monotonic_and_cover_working_ages() {
    let bands = AgeBands::new(&[14.0, 18.0, 25.0, 35.0, 45.0, 55.0, 65.0]).unwrap();
    let mut previous = 0;
    for age in 14..=110 {
        let index = bands.index_of(f64::from(age)).unwrap();
        assert!(index >= previous);
        previous = index;
    }
    assert_eq!(previous, bands.labels().len() - 1);
}

#[test]
fn test_informality_is_deterministic() {
    let config = SegregationConfig::default();
    let employed = Cell::text("Ocupado");
    let uncovered = Cell::from(2);

    let first = informality(&employed, Some(&uncovered), &config);
    for _ in 0..10 {
        assert_eq!(informality(&employed, Some(&uncovered), &config), first);
    }
    assert_eq!(first, Cell::from(1));
    assert_eq!(
        informality(&Cell::text("Desocupado abierto"), Some(&uncovered), &config),
        Cell::from(0)
    );
}

#[test]
fn test_unknown_coverage_follows_policy() {
    let employed = Cell::from(1);
    let propagate = SegregationConfig::default();
    assert!(informality(&employed, Some(&Cell::Missing), &propagate).is_missing());

    let default_formal = SegregationConfig {
        informality_policy: InformalityPolicy::DefaultFormal,
        ..SegregationConfig::default()
    };
    assert_eq!(
        informality(&employed, Some(&Cell::Missing), &default_formal),
        Cell::from(0)
    );
}

#[test]
fn test_selection_filters() -> survey_etl::Result<()> {
    let (frame, config) = cleaned_sample();
    let workforce = segregate(&frame, &config)?.workforce;

    let q1_women = RecordFilter::All(vec![
        RecordFilter::Periods {
            column: "periodo".to_string(),
            periods: vec!["2024-Q1".to_string()],
        },
        RecordFilter::LabelIn {
            column: "C207".to_string(),
            labels: vec!["Mujer".to_string()],
        },
    ]);
    let selected = apply_filter(&workforce, &q1_women)?;
    assert_eq!(selected.num_rows(), 1);
    assert_eq!(selected.cells("C208")?[0], Cell::Number(28.0));

    let young = RecordFilter::AgeRange {
        column: "C208".to_string(),
        min_age: None,
        max_age: Some(30.0),
    };
    assert_eq!(apply_filter(&workforce, &young)?.num_rows(), 2);

    let nobody = RecordFilter::Periods {
        column: "periodo".to_string(),
        periods: Vec::new(),
    };
    assert!(apply_filter(&workforce, &nobody)?.is_empty());
    Ok(())
}
