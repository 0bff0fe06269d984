//! Threshold-based fertilizer rules
//!
//! Each nutrient rule is independent; the two pH rules are mutually
//! exclusive (acidic is checked first).

use serde::{Deserialize, Serialize};

use crate::types::{Advisory, FertilizerAdvisory, SoilSample};

/// Rule thresholds. All comparisons are strict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FertilizerRules {
    /// N below this → nitrogen advisory
    pub nitrogen_min: f64,
    /// P below this → phosphorus advisory
    pub phosphorus_min: f64,
    /// K below this → potassium advisory
    pub potassium_min: f64,
    /// pH below this → lime
    pub ph_min: f64,
    /// pH above this → sulfur
    pub ph_max: f64,
}

impl Default for FertilizerRules {
    /// Canonical thresholds: 40/40/40 for NPK, pH 5.5 to 7.5.
    fn default() -> Self {
        Self {
            nitrogen_min: 40.0,
            phosphorus_min: 40.0,
            potassium_min: 40.0,
            ph_min: 5.5,
            ph_max: 7.5,
        }
    }
}

/// Recommend amendments using the canonical rule set.
pub fn recommend_fertilizer(sample: &SoilSample) -> FertilizerAdvisory {
    recommend_fertilizer_with(sample, &FertilizerRules::default())
}

/// Recommend amendments using a custom rule set.
///
/// Total over the reals. A NaN field fails every comparison, so no rule
/// fires for it.
pub fn recommend_fertilizer_with(sample: &SoilSample, rules: &FertilizerRules) -> FertilizerAdvisory {
    let mut fired = Vec::with_capacity(4);

    if sample.n < rules.nitrogen_min {
        fired.push(Advisory::LowNitrogen);
    }
    if sample.p < rules.phosphorus_min {
        fired.push(Advisory::LowPhosphorus);
    }
    if sample.k < rules.potassium_min {
        fired.push(Advisory::LowPotassium);
    }
    if sample.ph < rules.ph_min {
        fired.push(Advisory::AcidicSoil);
    } else if sample.ph > rules.ph_max {
        fired.push(Advisory::AlkalineSoil);
    }

    FertilizerAdvisory::from_fired(fired)
}
