// Page handlers for HTML rendering with Askama

use axum::extract::{Form, State};
use axum::response::{Html, IntoResponse};
use askama::Template;

use crate::advisor::{AdviceForm, ResolvedInputs};
use crate::api_server::AppState;
use crate::soil_presets::{SoilPreset, ALL_PRESETS};
use crate::types::RankedCrop;

// ============================================================================
// Home Page
// ============================================================================

/// One fertilizer line as shown on the page.
pub struct AdvisoryView {
    pub message: &'static str,
    pub products: String,
}

#[derive(Template)]
#[template(path = "pages/index.html")]
pub struct IndexTemplate {
    pub title: String,
    pub presets: &'static [SoilPreset],
    /// Submitted values, echoed back into the form
    pub form: FormEcho,
    pub crops: Vec<RankedCrop>,
    pub advisories: Vec<AdvisoryView>,
    pub error: String,
    pub warning: String,
    /// Set when the environment came from a city lookup
    pub weather_note: String,
}

/// Form values as plain strings (askama renders these directly).
#[derive(Default)]
pub struct FormEcho {
    pub city: String,
    pub soil_preset: String,
    pub n: String,
    pub p: String,
    pub k: String,
    pub ph: String,
    pub temperature: String,
    pub humidity: String,
    pub rainfall: String,
}

impl From<&AdviceForm> for FormEcho {
    fn from(form: &AdviceForm) -> Self {
        let s = |v: &Option<String>| v.as_deref().unwrap_or_default().trim().to_string();
        Self {
            city: s(&form.city),
            soil_preset: s(&form.soil_preset),
            n: s(&form.n),
            p: s(&form.p),
            k: s(&form.k),
            ph: s(&form.ph),
            temperature: s(&form.temperature),
            humidity: s(&form.humidity),
            rainfall: s(&form.rainfall),
        }
    }
}

impl FormEcho {
    /// Values the engine actually ran on. City and preset stay as submitted.
    fn resolved(form: &AdviceForm, inputs: &ResolvedInputs) -> Self {
        let echo = Self::from(form);
        let (sample, env) = (inputs.sample, inputs.environment);
        Self {
            n: sample.n.to_string(),
            p: sample.p.to_string(),
            k: sample.k.to_string(),
            ph: sample.ph.to_string(),
            temperature: env.temperature.to_string(),
            humidity: env.humidity.to_string(),
            rainfall: env.rainfall.to_string(),
            ..echo
        }
    }
}

impl IndexTemplate {
    fn empty(form: FormEcho) -> Self {
        Self {
            title: "Crop Recommender".to_string(),
            presets: &ALL_PRESETS,
            form,
            crops: Vec::new(),
            advisories: Vec::new(),
            error: String::new(),
            warning: String::new(),
            weather_note: String::new(),
        }
    }

    fn render_html(&self) -> Html<String> {
        Html(self.render().unwrap_or_else(|e| {
            format!("Template error: {}", e)
        }))
    }
}

pub async fn home_page() -> impl IntoResponse {
    IndexTemplate::empty(FormEcho::default()).render_html()
}

/// Form submit: re-renders the page with results, error or warning.
pub async fn predict_page(
    State(state): State<AppState>,
    Form(form): Form<AdviceForm>,
) -> impl IntoResponse {
    let mut page = IndexTemplate::empty(FormEcho::from(&form));

    match state.run_advice(form.clone()).await {
        Ok(advice) => {
            page.form = FormEcho::resolved(&form, &advice.inputs);
            if advice.inputs.from_weather {
                let env = advice.inputs.environment;
                page.weather_note = format!(
                    "Weather fetched for {}: {}°C, {}% humidity, {} mm rain",
                    page.form.city, env.temperature, env.humidity, env.rainfall
                );
            }
            page.warning = advice.inputs.warning.unwrap_or_default();
            page.crops = advice.recommendation.top_crops.crops().to_vec();
            page.advisories = advice
                .recommendation
                .fertilizer
                .advisories()
                .iter()
                .map(|a| AdvisoryView {
                    message: a.message(),
                    products: a.products().join(", "),
                })
                .collect();
        }
        Err(e) => {
            page.error = e.message().to_string();
        }
    }

    page.render_html()
}
