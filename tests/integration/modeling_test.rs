//! Tests for model input shaping on the processed workforce

use survey_etl::algorithm::modeling::{
    DEFAULT_SEED, DEFAULT_TEST_FRACTION, ModelFrame, ModelSpec, PredictionInput,
};
use survey_etl::PipelineConfig;

use crate::utils::sample_extract_dir;

fn workforce() -> (survey_etl::SurveyFrame, PipelineConfig) {
    let dir = sample_extract_dir();
    let config = PipelineConfig::default();
    let output = survey_etl::run(dir.path(), &config).unwrap();
    (output.segregation.workforce, config)
}

#[test]
fn test_informality_model_frame() -> survey_etl::Result<()> {
    let (workforce, config) = workforce();
    let spec = ModelSpec::informality(&config.columns);
    let model = ModelFrame::build(&workforce, &spec, &config.columns, &config.segregation)?;

    // Four employed respondents, all with a known informality status
    assert_eq!(model.num_rows(), 4);
    assert_eq!(model.dropped_without_target, 0);
    assert_eq!(model.target, vec![1.0, 0.0, 0.0, 1.0]);

    let names = model.encoder.feature_names();
    assert_eq!(names[0], "whoraT");
    assert!(names.contains(&"C207_Mujer".to_string()));
    assert!(names.contains(&"grupo_edad_14-17".to_string()));

    let matrix = model.design_matrix()?;
    assert_eq!(matrix.len(), 4);
    assert!(matrix.iter().all(|row| row.len() == model.encoder.width()));
    Ok(())
}

#[test]
fn test_dashboard_input_encoding() -> survey_etl::Result<()> {
    let (workforce, config) = workforce();
    let spec = ModelSpec::informality(&config.columns);
    let model = ModelFrame::build(&workforce, &spec, &config.columns, &config.segregation)?;

    let input = PredictionInput::new()
        .with_number("whoraT", 40.0)
        .with_category("grupo_edad", "25-34")
        .with_category("C207", "Mujer")
        .with_category("C366", "Doctorado honoris causa")
        .with_category("C310", "Trabajador independiente");
    let encoded = model.encoder.encode(&input)?;
    let names = model.encoder.feature_names();

    assert_eq!(encoded.len(), names.len());
    let hot: Vec<&str> = names
        .iter()
        .zip(&encoded)
        .filter(|(_, value)| **value == 1.0)
        .map(|(name, _)| name.as_str())
        .collect();
    // The unknown education level sets no indicator
    assert_eq!(
        hot,
        vec!["grupo_edad_25-34", "C207_Mujer", "C310_Trabajador independiente"]
    );
    Ok(())
}

#[test]
fn test_income_model_split_is_reproducible() -> survey_etl::Result<()> {
    let (workforce, config) = workforce();
    let spec = ModelSpec::income_regression(&config.columns);
    let model = ModelFrame::build(&workforce, &spec, &config.columns, &config.segregation)?;

    assert_eq!(model.num_rows(), 4);
    let first = model.split(DEFAULT_TEST_FRACTION, Some(DEFAULT_SEED))?;
    let second = model.split(DEFAULT_TEST_FRACTION, Some(DEFAULT_SEED))?;
    assert_eq!(first, second);
    assert_eq!(first.test.len(), 1);
    assert_eq!(first.train.len(), 3);
    Ok(())
}
