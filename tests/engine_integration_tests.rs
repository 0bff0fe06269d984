// Engine Integration Tests
//
// Purpose: Train a small forest on the fixture CSV and run the engine end to end
// Run with: cargo test --test engine_integration_tests

use approx::assert_relative_eq;
use crop_recommender_rust::classifier::{train_from_csv, TrainingReport};
use crop_recommender_rust::{
    recommend, Advisory, CropClassifier, EnvironmentReading, FeatureVector, RandomForestModel,
    SoilSample, TrainingConfig,
};
use std::path::Path;

const FIXTURE: &str = "tests/fixtures/crop_sample.csv";

fn small_config() -> TrainingConfig {
    TrainingConfig {
        n_estimators: 25,
        ..TrainingConfig::default()
    }
}

fn train() -> TrainingReport {
    train_from_csv(Path::new(FIXTURE), &small_config()).expect("fixture should train")
}

fn rice_like() -> (SoilSample, EnvironmentReading) {
    (
        SoilSample::new(82.0, 44.0, 41.0, 6.5),
        EnvironmentReading::new(23.0, 83.0, 228.0),
    )
}

// =========================================================================
// Section 1: Training
// =========================================================================

#[test]
fn test_training_report() {
    let report = train();

    assert_eq!(report.n_train + report.n_test, 60);
    assert_eq!(report.n_test, 12);
    assert_eq!(report.classes, vec!["chickpea", "maize", "rice"]);
    assert_eq!(report.model.n_trees(), 25);
    // Fixture classes are well separated
    assert!(report.accuracy >= 0.9, "accuracy {}", report.accuracy);
}

#[test]
fn test_training_is_deterministic() {
    let a = train();
    let b = train();

    let (sample, env) = rice_like();
    let features = FeatureVector::assemble(&sample, &env);
    assert_eq!(
        a.model.predict_proba(&features).unwrap(),
        b.model.predict_proba(&features).unwrap()
    );
    assert_eq!(a.accuracy, b.accuracy);
}

#[test]
fn test_missing_csv() {
    let err = train_from_csv(Path::new("tests/fixtures/nope.csv"), &small_config()).unwrap_err();
    assert!(format!("{:#}", err).contains("nope.csv"));
}

// =========================================================================
// Section 2: Prediction through the engine
// =========================================================================

#[test]
fn test_probabilities_sum_to_one() {
    let model = train().model;
    let (sample, env) = rice_like();

    let probs = model
        .predict_probabilities(&FeatureVector::assemble(&sample, &env))
        .unwrap()
        .unwrap();

    assert_eq!(probs.len(), 3);
    let total: f64 = probs.iter().map(|p| p.probability).sum();
    assert_relative_eq!(total, 1.0, epsilon = 1e-9);
}

#[test]
fn test_recommend_rice_like_sample() {
    let model = train().model;
    let (sample, env) = rice_like();

    let rec = recommend(&sample, &env, &model).unwrap();

    assert!(rec.top_crops.len() <= 3);
    assert_eq!(rec.top_crops.top().unwrap().label, "rice");
    let percents: Vec<f64> = rec.top_crops.iter().map(|c| c.probability_percent).collect();
    assert!(percents.windows(2).all(|w| w[0] >= w[1]));
    assert!(rec.fertilizer.is_balanced());
}

#[test]
fn test_recommend_chickpea_like_sample() {
    let model = train().model;
    let sample = SoilSample::new(38.0, 70.0, 79.0, 7.3);
    let env = EnvironmentReading::new(19.0, 16.0, 82.0);

    let rec = recommend(&sample, &env, &model).unwrap();

    assert_eq!(rec.top_crops.top().unwrap().label, "chickpea");
    assert_eq!(rec.fertilizer.advisories(), &[Advisory::LowNitrogen]);
}

#[test]
fn test_non_finite_input_rejected() {
    let model = train().model;
    let sample = SoilSample::new(f64::NAN, 40.0, 40.0, 6.5);
    let env = EnvironmentReading::new(25.0, 70.0, 100.0);

    assert!(recommend(&sample, &env, &model).is_err());
}

// =========================================================================
// Section 3: Persistence
// =========================================================================

#[test]
fn test_saved_model_predicts_identically() {
    let model = train().model;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("crop_model.json");

    model.save(&path).unwrap();
    let loaded = RandomForestModel::load(&path).unwrap();

    let (sample, env) = rice_like();
    assert_eq!(
        recommend(&sample, &env, &model).unwrap(),
        recommend(&sample, &env, &loaded).unwrap()
    );
    assert_eq!(loaded.class_labels(), model.class_labels());
}
