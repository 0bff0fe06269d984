//! Train the crop classifier from the crop dataset CSV
//!
//! Fits a 100-tree random forest on an 80/20 split, prints held-out accuracy,
//! and writes the model JSON loaded by the front-ends.
//!
//! Usage:
//!   cargo run --release --bin train_model [DATA_PATH] [MODEL_PATH]
//!
//! Paths default to the DATA_PATH / MODEL_PATH environment variables.

use crop_recommender_rust::classifier::train_from_csv;
use crop_recommender_rust::data::LABEL_COLUMN;
use crop_recommender_rust::types::FEATURE_NAMES;
use crop_recommender_rust::{AppConfig, TrainingConfig};
use std::path::PathBuf;
use std::time::Instant;

fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    let mut args = std::env::args().skip(1);
    let data_path = args.next().map(PathBuf::from).unwrap_or(config.data_path);
    let model_path = args.next().map(PathBuf::from).unwrap_or(config.model_path);

    println!("\n{}", "=".repeat(70));
    println!("Crop Classifier Training");
    println!("{}", "=".repeat(70));
    println!();
    println!("  Data:  {}", data_path.display());
    println!("  Model: {}", model_path.display());
    println!();

    let training = TrainingConfig::default();
    let start = Instant::now();
    let report = train_from_csv(&data_path, &training)?;

    println!("Dataset shape: ({}, {})", report.n_train + report.n_test, FEATURE_NAMES.len() + 1);
    println!("  Columns:    {}, {}", FEATURE_NAMES.join(", "), LABEL_COLUMN);
    println!("  Train rows: {}", report.n_train);
    println!("  Test rows:  {}", report.n_test);
    println!("  Classes:    {}", report.classes.len());
    println!();
    println!("Trees: {} (avg depth {:.1}, {} nodes)",
        report.model.n_trees(),
        report.model.avg_depth(),
        report.model.total_nodes()
    );
    println!("Accuracy: {:.4}", report.accuracy);
    println!("Training time: {:.2}s", start.elapsed().as_secs_f64());

    report.model.save(&model_path)?;
    println!();
    println!("✓ Model saved to {}", model_path.display());

    Ok(())
}
