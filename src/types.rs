//! Core data types shared by the engine, classifier and front-ends.
//!
//! Everything here lives for a single request/response cycle. Nothing is
//! persisted by the engine itself.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of features the crop classifier is trained on.
pub const FEATURE_COUNT: usize = 7;

/// Feature names in training order. Also the CSV column names.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] =
    ["N", "P", "K", "temperature", "humidity", "ph", "rainfall"];

/// One soil measurement set.
///
/// N, P and K are soil nutrient levels (≥ 0 by convention) and `ph` lies in
/// [0, 14]. The engine does not reject out-of-range values; all fertilizer
/// thresholds are one-sided.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoilSample {
    /// Nitrogen
    pub n: f64,
    /// Phosphorus
    pub p: f64,
    /// Potassium
    pub k: f64,
    /// Soil pH
    pub ph: f64,
}

impl SoilSample {
    pub const fn new(n: f64, p: f64, k: f64, ph: f64) -> Self {
        Self { n, p, k, ph }
    }
}

/// Environmental conditions, either looked up by city or entered manually.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentReading {
    /// Air temperature (°C)
    pub temperature: f64,
    /// Relative humidity (%)
    pub humidity: f64,
    /// Rainfall (mm)
    pub rainfall: f64,
}

impl EnvironmentReading {
    pub const fn new(temperature: f64, humidity: f64, rainfall: f64) -> Self {
        Self {
            temperature,
            humidity,
            rainfall,
        }
    }
}

/// Fixed-order feature tuple fed to the classifier:
/// `(N, P, K, temperature, humidity, ph, rainfall)`.
///
/// The classifier has no self-describing schema, so this order must match
/// the order the model was trained on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Assemble features from a soil sample and an environment reading.
    pub fn assemble(sample: &SoilSample, environment: &EnvironmentReading) -> Self {
        Self([
            sample.n,
            sample.p,
            sample.k,
            environment.temperature,
            environment.humidity,
            sample.ph,
            environment.rainfall,
        ])
    }

    pub const fn from_array(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Name of the first NaN/infinite feature, if any.
    pub fn first_non_finite(&self) -> Option<&'static str> {
        self.0
            .iter()
            .zip(FEATURE_NAMES)
            .find(|(value, _)| !value.is_finite())
            .map(|(_, name)| name)
    }
}

/// Probability assigned to one class by the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassProbability {
    pub label: String,
    /// In [0, 1]
    pub probability: f64,
}

impl ClassProbability {
    pub fn new(label: impl Into<String>, probability: f64) -> Self {
        Self {
            label: label.into(),
            probability,
        }
    }
}

/// One entry of a crop ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCrop {
    pub label: String,
    /// Probability × 100, rounded to 2 decimals
    pub probability_percent: f64,
}

/// Crops ordered by descending probability, at most three entries.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CropRanking {
    crops: Vec<RankedCrop>,
}

impl CropRanking {
    /// Caller guarantees `crops` is already sorted descending.
    pub(crate) fn from_sorted(crops: Vec<RankedCrop>) -> Self {
        Self { crops }
    }

    /// Ranking for a classifier that only reports its best label.
    pub fn single(label: impl Into<String>) -> Self {
        Self {
            crops: vec![RankedCrop {
                label: label.into(),
                probability_percent: 100.0,
            }],
        }
    }

    pub fn crops(&self) -> &[RankedCrop] {
        &self.crops
    }

    pub fn len(&self) -> usize {
        self.crops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crops.is_empty()
    }

    /// Best crop, if the classifier knows any class.
    pub fn top(&self) -> Option<&RankedCrop> {
        self.crops.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RankedCrop> {
        self.crops.iter()
    }
}

/// A single fertilizer recommendation triggered by a threshold rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Advisory {
    LowNitrogen,
    LowPhosphorus,
    LowPotassium,
    AcidicSoil,
    AlkalineSoil,
    /// Sentinel emitted when no rule fired
    Balanced,
}

impl Advisory {
    /// Canonical advisory text.
    pub fn message(self) -> &'static str {
        match self {
            Advisory::LowNitrogen => "Add high-nitrogen amendment",
            Advisory::LowPhosphorus => "Add phosphorus-source amendment",
            Advisory::LowPotassium => "Add potassium-source amendment",
            Advisory::AcidicSoil => "Apply lime (raise pH)",
            Advisory::AlkalineSoil => "Apply elemental sulfur (lower pH)",
            Advisory::Balanced => "Soil nutrients appear balanced.",
        }
    }

    /// Example products for this amendment.
    pub fn products(self) -> &'static [&'static str] {
        match self {
            Advisory::LowNitrogen => &["Urea", "Compost"],
            Advisory::LowPhosphorus => &["DAP", "SSP", "Bone meal"],
            Advisory::LowPotassium => &["MOP", "Wood ash"],
            Advisory::AcidicSoil => &["Agricultural lime"],
            Advisory::AlkalineSoil => &["Elemental sulfur", "Gypsum"],
            Advisory::Balanced => &[],
        }
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Advisories in rule-check order (N, P, K, pH-low, pH-high).
///
/// Never empty: when no rule fires it holds exactly [`Advisory::Balanced`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FertilizerAdvisory {
    advisories: Vec<Advisory>,
}

impl FertilizerAdvisory {
    /// Wrap fired advisories, substituting the balanced sentinel for none.
    pub(crate) fn from_fired(fired: Vec<Advisory>) -> Self {
        if fired.is_empty() {
            Self {
                advisories: vec![Advisory::Balanced],
            }
        } else {
            Self { advisories: fired }
        }
    }

    pub fn advisories(&self) -> &[Advisory] {
        &self.advisories
    }

    pub fn len(&self) -> usize {
        self.advisories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.advisories.is_empty()
    }

    pub fn contains(&self, advisory: Advisory) -> bool {
        self.advisories.contains(&advisory)
    }

    pub fn is_balanced(&self) -> bool {
        self.advisories == [Advisory::Balanced]
    }

    pub fn messages(&self) -> Vec<&'static str> {
        self.advisories.iter().map(|a| a.message()).collect()
    }
}

/// Both engine outputs for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub top_crops: CropRanking,
    pub fertilizer: FertilizerAdvisory,
}
