//! Tests for weighted estimates and hypothesis tests

use rand::prelude::*;
use survey_etl::algorithm::statistics::{
    ContingencyTable, DEFAULT_ALPHA, StatError, WeightedAggregator, anova_by_category,
    chi_square_independence, high_value_profile, one_way_anova, t_test_between, weighted_mean,
    weighted_proportions,
};
use survey_etl::{Cell, SurveyFrame};

use crate::utils::assert_close;

fn table(counts: [[f64; 2]; 2]) -> ContingencyTable {
    ContingencyTable::new(
        vec!["Hombre".to_string(), "Mujer".to_string()],
        vec!["formal".to_string(), "informal".to_string()],
        counts.iter().map(|row| row.to_vec()).collect(),
    )
    .unwrap()
}

#[test]
fn test_weighted_mean_example() {
    let stat = weighted_mean(&[10.0, 20.0, 30.0], &[1.0, 1.0, 2.0]).unwrap();
    assert_close(stat.value, 22.5);
    assert_close(stat.total_weight, 4.0);
    assert_eq!(stat.observations, 3);
}

#[test]
fn test_weighted_mean_stays_within_value_range() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..200 {
        let len = rng.random_range(1..50);
        let values: Vec<f64> = (0..len).map(|_| rng.random_range(-1000.0..1000.0)).collect();
        let weights: Vec<f64> = (0..len).map(|_| rng.random_range(0.01..10.0)).collect();

        let stat = weighted_mean(&values, &weights).unwrap();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert!(stat.value >= min - 1e-9 && stat.value <= max + 1e-9);
    }
}

#[test]
fn test_weighted_mean_errors() {
    assert!(matches!(
        weighted_mean(&[], &[]),
        Err(StatError::NoObservations)
    ));
    assert!(matches!(
        weighted_mean(&[1.0, 2.0], &[0.0, 0.0]),
        Err(StatError::ZeroTotalWeight { observations: 2 })
    ));
    assert!(matches!(
        weighted_mean(&[1.0, 2.0], &[1.0, -1.0]),
        Err(StatError::NegativeWeight { index: 1, .. })
    ));
    assert!(matches!(
        weighted_mean(&[1.0], &[1.0, 2.0]),
        Err(StatError::LengthMismatch { values: 1, weights: 2 })
    ));
}

#[test]
fn test_weighted_proportions_share_the_total_weight() {
    let categories = vec![
        Some("Hombre".to_string()),
        Some("Mujer".to_string()),
        None,
        Some("Mujer".to_string()),
    ];
    let shares = weighted_proportions(&categories, &[1.0, 2.0, 5.0, 1.0]).unwrap();

    assert_eq!(shares.len(), 2);
    assert_eq!(shares[0].category, "Hombre");
    assert_close(shares[0].share, 1.0 / 9.0);
    assert_close(shares[1].share, 3.0 / 9.0);
    // the uncategorized row keeps its part of the total
    assert_close(shares.iter().map(|s| s.share).sum::<f64>(), 4.0 / 9.0);
}

#[test]
fn test_independent_table_is_not_significant() {
    let result = chi_square_independence(&table([[50.0, 50.0], [50.0, 50.0]]), DEFAULT_ALPHA).unwrap();
    assert!(result.p_value > 0.05);
    assert!(!result.significant);
    assert_close(result.dof, 1.0);
}

#[test]
fn test_associated_table_is_significant() {
    let result = chi_square_independence(&table([[90.0, 10.0], [10.0, 90.0]]), DEFAULT_ALPHA).unwrap();
    assert!(result.p_value < 0.001);
    assert!(result.significant);
}

#[test]
fn test_single_row_table_is_not_computable() {
    let result = chi_square_independence(&table([[50.0, 50.0], [0.0, 0.0]]), DEFAULT_ALPHA);
    assert!(matches!(result, Err(StatError::InsufficientGroups { found: 1 })));
}

#[test]
fn test_anova_detects_separated_groups() {
    let groups = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]];
    let result = one_way_anova(&groups, DEFAULT_ALPHA).unwrap();
    assert_close(result.statistic, 13.5);
    assert_eq!(result.dof_denominator, Some(4.0));
    assert!(result.significant);

    let single = one_way_anova(&[vec![1.0, 2.0], Vec::new()], DEFAULT_ALPHA);
    assert!(matches!(single, Err(StatError::InsufficientGroups { found: 1 })));
}

fn income_frame() -> SurveyFrame {
    let rows = [
        (1500, "Mujer", "Secundaria completa", 10),
        (1700, "Mujer", "Secundaria completa", 20),
        (1600, "Mujer", "Superior universitaria completa", 10),
        (2500, "Hombre", "Superior universitaria completa", 30),
        (2700, "Hombre", "Secundaria completa", 10),
        (2600, "Hombre", "Superior universitaria completa", 20),
        (9000, "Hombre", "Superior universitaria completa", 5),
    ];
    SurveyFrame::from_rows(
        &["INGTOT", "C207", "C366", "factor_expansion"],
        rows.iter()
            .map(|(income, sex, education, weight)| {
                vec![
                    Cell::from(*income),
                    Cell::from(*sex),
                    Cell::from(*education),
                    Cell::from(*weight),
                ]
            })
            .collect(),
    )
    .unwrap()
}

#[test]
fn test_frame_level_tests() -> survey_etl::Result<()> {
    let frame = income_frame();

    let anova = anova_by_category(&frame, "INGTOT", "C207", DEFAULT_ALPHA)?;
    assert_close(anova.dof, 1.0);
    assert_eq!(anova.dof_denominator, Some(5.0));

    let t = t_test_between(&frame, "INGTOT", "C207", ("Hombre", "Mujer"), DEFAULT_ALPHA)?;
    assert!(t.statistic > 0.0);

    let missing_group = t_test_between(&frame, "INGTOT", "C207", ("Hombre", "Otro"), DEFAULT_ALPHA);
    assert!(missing_group.is_err());
    Ok(())
}

#[test]
fn test_aggregator_by_group() -> survey_etl::Result<()> {
    let frame = income_frame();
    let aggregator = WeightedAggregator::new("factor_expansion");

    let by_sex = aggregator.mean_by_group(&frame, "INGTOT", "C207")?;
    assert_eq!(by_sex.len(), 2);
    assert_eq!(by_sex[0].group, "Hombre");
    let women = by_sex[1].statistic.unwrap();
    assert_close(women.value, (1500.0 * 10.0 + 1700.0 * 20.0 + 1600.0 * 10.0) / 40.0);

    let shares = aggregator.proportions(&frame, "C207")?;
    assert_close(shares[0].share, 65.0 / 105.0);
    Ok(())
}

#[test]
fn test_high_income_profile() -> survey_etl::Result<()> {
    let frame = income_frame();
    let aggregator = WeightedAggregator::new("factor_expansion");
    let profile = high_value_profile(&frame, &aggregator, "INGTOT", &["C207", "C366"])?;

    assert_eq!(profile.observations, 7);
    assert_eq!(profile.outliers, 1);
    let top = profile.top_category("C366").unwrap();
    assert_eq!(top.category, "Superior universitaria completa");
    assert_close(top.share, 1.0);
    Ok(())
}
