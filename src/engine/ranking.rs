//! Top-k crop ranking
//!
//! Assembles the feature vector, asks the classifier for per-class
//! probabilities and keeps the three most likely crops.

use crate::classifier::CropClassifier;
use crate::error::{ClassifierError, PredictionError};
use crate::types::{
    ClassProbability, CropRanking, EnvironmentReading, FeatureVector, RankedCrop, SoilSample,
};

/// Number of crops reported in a ranking.
pub const TOP_K: usize = 3;

/// Predict the most suitable crops for a soil sample and environment.
///
/// Falls back to a single 100% entry when the classifier exposes no
/// per-class probabilities.
pub fn predict_top_crops<C>(
    sample: &SoilSample,
    environment: &EnvironmentReading,
    classifier: &C,
) -> Result<CropRanking, PredictionError>
where
    C: CropClassifier + ?Sized,
{
    let features = FeatureVector::assemble(sample, environment);

    match classifier.predict_probabilities(&features)? {
        Some(probabilities) => {
            tracing::debug!("Ranking {} class probabilities", probabilities.len());
            rank_probabilities(probabilities, TOP_K)
        }
        None => {
            let label = classifier.predict(&features)?;
            tracing::debug!("Classifier reports label only: {}", label);
            Ok(CropRanking::single(label))
        }
    }
}

/// Keep the `k` highest probabilities, descending.
///
/// The sort is stable, so ties keep the classifier's class order.
pub fn rank_probabilities(
    mut probabilities: Vec<ClassProbability>,
    k: usize,
) -> Result<CropRanking, PredictionError> {
    if let Some(bad) = probabilities.iter().find(|c| !c.probability.is_finite()) {
        return Err(ClassifierError::Numeric(format!(
            "probability for '{}' is {}",
            bad.label, bad.probability
        ))
        .into());
    }

    probabilities.sort_by(|a, b| b.probability.total_cmp(&a.probability));
    probabilities.truncate(k);

    let crops = probabilities
        .into_iter()
        .map(|c| RankedCrop {
            label: c.label,
            probability_percent: to_percent(c.probability),
        })
        .collect();

    Ok(CropRanking::from_sorted(crops))
}

/// Probability in [0, 1] → percentage rounded to 2 decimals.
#[inline]
pub fn to_percent(probability: f64) -> f64 {
    (probability * 100.0 * 100.0).round() / 100.0
}
