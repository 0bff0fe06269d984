//! Recommendation engine
//!
//! Pure, synchronous decision functions:
//! - `ranking`: feature assembly + top-k crop ranking via a classifier
//! - `fertilizer`: threshold rules for NPK and pH amendments

pub mod fertilizer;
pub mod ranking;

pub use fertilizer::{recommend_fertilizer, recommend_fertilizer_with, FertilizerRules};
pub use ranking::{predict_top_crops, rank_probabilities, to_percent, TOP_K};

use crate::classifier::CropClassifier;
use crate::error::PredictionError;
use crate::types::{EnvironmentReading, Recommendation, SoilSample};

/// Run both engine operations with the canonical fertilizer rules.
pub fn recommend<C>(
    sample: &SoilSample,
    environment: &EnvironmentReading,
    classifier: &C,
) -> Result<Recommendation, PredictionError>
where
    C: CropClassifier + ?Sized,
{
    recommend_with(sample, environment, classifier, &FertilizerRules::default())
}

/// Run both engine operations with a custom fertilizer rule set.
pub fn recommend_with<C>(
    sample: &SoilSample,
    environment: &EnvironmentReading,
    classifier: &C,
    rules: &FertilizerRules,
) -> Result<Recommendation, PredictionError>
where
    C: CropClassifier + ?Sized,
{
    let top_crops = predict_top_crops(sample, environment, classifier)?;
    let fertilizer = recommend_fertilizer_with(sample, rules);

    Ok(Recommendation {
        top_crops,
        fertilizer,
    })
}
