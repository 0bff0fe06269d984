//! Front-end request assembly
//!
//! Shared by the web form and the interactive terminal app: parses raw form
//! fields, applies soil presets, defaults and the weather fallback, rejects
//! missing soil nutrients, then runs the engine.
//!
//! Precedence for environmental values:
//!   weather lookup (if a city was given and it succeeded) → form → default
//! Precedence for soil values:
//!   form → soil preset → default (pH only; N/P/K are required)

use serde::{Deserialize, Serialize};

use crate::classifier::CropClassifier;
use crate::engine::{recommend_with, FertilizerRules};
use crate::error::{MissingInputError, PredictionError, WeatherError};
use crate::soil_presets::{find_preset, SoilPreset};
use crate::types::{EnvironmentReading, Recommendation, SoilSample};

pub const DEFAULT_TEMPERATURE: f64 = 25.0;
pub const DEFAULT_HUMIDITY: f64 = 70.0;
pub const DEFAULT_RAINFALL: f64 = 100.0;
pub const DEFAULT_PH: f64 = 6.5;

/// Raw form fields as submitted (all optional strings).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdviceForm {
    pub city: Option<String>,
    pub soil_preset: Option<String>,
    #[serde(rename = "N")]
    pub n: Option<String>,
    #[serde(rename = "P")]
    pub p: Option<String>,
    #[serde(rename = "K")]
    pub k: Option<String>,
    pub ph: Option<String>,
    pub temperature: Option<String>,
    pub humidity: Option<String>,
    pub rainfall: Option<String>,
}

impl AdviceForm {
    /// Trimmed city name, `None` when blank.
    pub fn city(&self) -> Option<&str> {
        self.city.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }

    /// Selected preset, if the key is known.
    pub fn preset(&self) -> Option<&'static SoilPreset> {
        self.soil_preset.as_deref().and_then(find_preset)
    }
}

/// Parse a numeric form field. Blank, unparsable and non-finite values are
/// treated as absent.
pub fn parse_field(value: Option<&str>) -> Option<f64> {
    let v = value?.trim();
    if v.is_empty() {
        return None;
    }
    v.parse::<f64>().ok().filter(|x| x.is_finite())
}

/// Engine inputs after defaults and fallbacks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedInputs {
    pub sample: SoilSample,
    pub environment: EnvironmentReading,
    /// Whether the environment came from a weather lookup
    pub from_weather: bool,
    /// Non-fatal problem to show the user (failed weather lookup)
    pub warning: Option<String>,
}

/// Resolve form fields into engine inputs.
///
/// `weather` is the outcome of looking up `form.city()`, or `None` when no
/// lookup was attempted.
pub fn resolve_inputs(
    form: &AdviceForm,
    weather: Option<Result<EnvironmentReading, WeatherError>>,
) -> Result<ResolvedInputs, MissingInputError> {
    let preset = form.preset();

    let n = parse_field(form.n.as_deref()).or(preset.map(|p| p.n));
    let p = parse_field(form.p.as_deref()).or(preset.map(|p| p.p));
    let k = parse_field(form.k.as_deref()).or(preset.map(|p| p.k));
    let ph = parse_field(form.ph.as_deref())
        .or(preset.map(|p| p.ph))
        .unwrap_or(DEFAULT_PH);

    let (n, p, k) = match (n, p, k) {
        (Some(n), Some(p), Some(k)) => (n, p, k),
        _ => {
            let fields = [("N", n), ("P", p), ("K", k)]
                .into_iter()
                .filter(|(_, v)| v.is_none())
                .map(|(name, _)| name)
                .collect();
            return Err(MissingInputError { fields });
        }
    };

    let mut warning = None;
    let looked_up = match weather {
        Some(Ok(reading)) => Some(reading),
        Some(Err(e)) => {
            let city = form.city().unwrap_or_default();
            tracing::warn!("Weather lookup for '{}' failed: {}", city, e);
            warning = Some(format!(
                "Could not fetch weather for '{}'. Either API key missing/invalid or city not found. \
                 You can still enter values manually.",
                city
            ));
            None
        }
        None => None,
    };

    let environment = looked_up.unwrap_or_else(|| {
        EnvironmentReading::new(
            parse_field(form.temperature.as_deref()).unwrap_or(DEFAULT_TEMPERATURE),
            parse_field(form.humidity.as_deref()).unwrap_or(DEFAULT_HUMIDITY),
            parse_field(form.rainfall.as_deref()).unwrap_or(DEFAULT_RAINFALL),
        )
    });

    Ok(ResolvedInputs {
        sample: SoilSample::new(n, p, k, ph),
        environment,
        from_weather: looked_up.is_some(),
        warning,
    })
}

/// Resolved inputs together with the engine output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Advice {
    pub inputs: ResolvedInputs,
    pub recommendation: Recommendation,
}

/// Run the engine on resolved inputs.
pub fn advise<C>(
    classifier: &C,
    rules: &FertilizerRules,
    inputs: ResolvedInputs,
) -> Result<Advice, PredictionError>
where
    C: CropClassifier + ?Sized,
{
    let recommendation = recommend_with(&inputs.sample, &inputs.environment, classifier, rules)?;
    Ok(Advice {
        inputs,
        recommendation,
    })
}

/// Look up the form's city, if any.
#[cfg(feature = "weather")]
pub async fn fetch_environment(
    weather: &dyn crate::weather::WeatherLookup,
    form: &AdviceForm,
) -> Option<Result<EnvironmentReading, WeatherError>> {
    let city = form.city()?;
    tracing::debug!("Looking up weather for '{}'", city);
    Some(weather.lookup(city).await)
}

// ============================================================================
// Interactive input bounds
// ============================================================================

/// Range and default of one interactive numeric input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputBounds {
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
    pub default: f64,
}

impl InputBounds {
    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }
}

pub const NITROGEN_INPUT: InputBounds = InputBounds { label: "Nitrogen (N)", min: 0.0, max: 200.0, default: 50.0 };
pub const PHOSPHORUS_INPUT: InputBounds = InputBounds { label: "Phosphorus (P)", min: 0.0, max: 200.0, default: 50.0 };
pub const POTASSIUM_INPUT: InputBounds = InputBounds { label: "Potassium (K)", min: 0.0, max: 200.0, default: 50.0 };
pub const PH_INPUT: InputBounds = InputBounds { label: "Soil pH", min: 0.0, max: 14.0, default: 6.5 };
pub const TEMPERATURE_INPUT: InputBounds = InputBounds { label: "Temperature (°C)", min: -10.0, max: 50.0, default: 25.0 };
pub const HUMIDITY_INPUT: InputBounds = InputBounds { label: "Humidity (%)", min: 0.0, max: 100.0, default: 50.0 };
pub const RAINFALL_INPUT: InputBounds = InputBounds { label: "Rainfall (mm)", min: 0.0, max: 300.0, default: 100.0 };
