//! Interactive terminal front-end
//!
//! Prompts for soil values (or a soil type), optionally looks up the weather
//! for a city, and prints the crop ranking and fertilizer advice.
//!
//! Usage:
//!   cargo run --features cli --bin advise

use anyhow::Context;
use crop_recommender_rust::advisor::{
    advise, fetch_environment, resolve_inputs, AdviceForm, InputBounds, HUMIDITY_INPUT,
    NITROGEN_INPUT, PHOSPHORUS_INPUT, PH_INPUT, POTASSIUM_INPUT, RAINFALL_INPUT,
    TEMPERATURE_INPUT,
};
use crop_recommender_rust::soil_presets::ALL_PRESETS;
use crop_recommender_rust::weather::weather_from_config;
use crop_recommender_rust::{AppConfig, FertilizerRules, RandomForestModel};
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};

/// Prompt for a number within `bounds`, re-asking until it is valid.
fn prompt_number(theme: &ColorfulTheme, bounds: &InputBounds) -> anyhow::Result<String> {
    let value: f64 = Input::with_theme(theme)
        .with_prompt(format!("{} [{}-{}]", bounds.label, bounds.min, bounds.max))
        .default(bounds.default)
        .validate_with(|v: &f64| -> Result<(), String> {
            if bounds.contains(*v) {
                Ok(())
            } else {
                Err(format!("must be between {} and {}", bounds.min, bounds.max))
            }
        })
        .interact_text()?;
    Ok(value.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let config = AppConfig::from_env();
    let model = RandomForestModel::load(&config.model_path)
        .with_context(|| "Train a model first: cargo run --release --bin train_model")?;
    let weather = weather_from_config(&config.weather)?;

    let theme = ColorfulTheme::default();
    let mut form = AdviceForm::default();

    println!("Crop Recommender ({} crops known)", model.classes().len());
    println!();

    // Soil
    let mut choices = vec!["Enter lab values".to_string()];
    choices.extend(ALL_PRESETS.iter().map(|p| p.name.to_string()));
    let choice = Select::with_theme(&theme)
        .with_prompt("Soil")
        .items(&choices)
        .default(0)
        .interact()?;

    if choice == 0 {
        form.n = Some(prompt_number(&theme, &NITROGEN_INPUT)?);
        form.p = Some(prompt_number(&theme, &PHOSPHORUS_INPUT)?);
        form.k = Some(prompt_number(&theme, &POTASSIUM_INPUT)?);
        form.ph = Some(prompt_number(&theme, &PH_INPUT)?);
    } else {
        form.soil_preset = Some(ALL_PRESETS[choice - 1].key.to_string());
    }

    // Environment
    let use_city = Confirm::with_theme(&theme)
        .with_prompt("Look up current weather for a city?")
        .default(true)
        .interact()?;

    if use_city {
        let city: String = Input::with_theme(&theme)
            .with_prompt("City")
            .interact_text()?;
        form.city = Some(city);
    }

    let mut weather_result = fetch_environment(&weather, &form).await;
    if !matches!(weather_result, Some(Ok(_))) {
        if let Some(Err(e)) = &weather_result {
            println!("⚠ Could not fetch weather ({}). Enter values manually.", e);
        }
        form.temperature = Some(prompt_number(&theme, &TEMPERATURE_INPUT)?);
        form.humidity = Some(prompt_number(&theme, &HUMIDITY_INPUT)?);
        form.rainfall = Some(prompt_number(&theme, &RAINFALL_INPUT)?);
        weather_result = None;
    }

    let inputs = resolve_inputs(&form, weather_result)?;
    let env = inputs.environment;
    if inputs.from_weather {
        println!(
            "Weather: {:.1}°C, {:.0}% humidity, {:.1} mm rain",
            env.temperature, env.humidity, env.rainfall
        );
    }

    let advice = advise(&model, &FertilizerRules::default(), inputs)?;

    println!();
    println!("Recommended crops:");
    for (i, crop) in advice.recommendation.top_crops.iter().enumerate() {
        println!("  {}. {:<15} {:>6.2}%", i + 1, crop.label, crop.probability_percent);
    }

    println!();
    println!("Fertilizer advice:");
    for advisory in advice.recommendation.fertilizer.advisories() {
        let products = advisory.products();
        if products.is_empty() {
            println!("  - {}", advisory.message());
        } else {
            println!("  - {} ({})", advisory.message(), products.join(", "));
        }
    }

    Ok(())
}
