//! Soil presets
//!
//! Typical nutrient and pH profiles for common soil types. Front-ends use
//! them to fill N, P, K and pH when the user picks a soil type instead of
//! entering lab values.

use serde::Serialize;

/// Typical soil profile used to autofill the soil inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SoilPreset {
    /// Form value (e.g., "alluvial")
    pub key: &'static str,

    /// Display name (e.g., "Alluvial (river plains)")
    pub name: &'static str,

    pub n: f64,
    pub p: f64,
    pub k: f64,
    pub ph: f64,
}

// ============================================================================
// Built-in presets
// ============================================================================

/// Alluvial - river plains, fertile, near-neutral
pub const ALLUVIAL: SoilPreset = SoilPreset {
    key: "alluvial",
    name: "Alluvial (river plains)",
    n: 80.0,
    p: 45.0,
    k: 45.0,
    ph: 7.0,
};

/// Black (regur) - clay-rich, potassium-rich, mildly alkaline
pub const BLACK: SoilPreset = SoilPreset {
    key: "black",
    name: "Black (regur)",
    n: 55.0,
    p: 35.0,
    k: 65.0,
    ph: 7.8,
};

/// Red - iron-rich, low nitrogen and phosphorus, slightly acidic
pub const RED: SoilPreset = SoilPreset {
    key: "red",
    name: "Red",
    n: 35.0,
    p: 25.0,
    k: 40.0,
    ph: 6.2,
};

/// Laterite - heavily leached, nutrient-poor, acidic
pub const LATERITE: SoilPreset = SoilPreset {
    key: "laterite",
    name: "Laterite",
    n: 30.0,
    p: 20.0,
    k: 25.0,
    ph: 5.2,
};

/// Sandy (desert) - low organic matter, alkaline
pub const SANDY: SoilPreset = SoilPreset {
    key: "sandy",
    name: "Sandy (arid)",
    n: 25.0,
    p: 30.0,
    k: 35.0,
    ph: 8.2,
};

/// All built-in presets, in display order
pub static ALL_PRESETS: [SoilPreset; 5] = [ALLUVIAL, BLACK, RED, LATERITE, SANDY];

/// Look up a preset by its key (case-insensitive, surrounding whitespace ignored).
pub fn find_preset(key: &str) -> Option<&'static SoilPreset> {
    let key = key.trim();
    ALL_PRESETS.iter().find(|p| p.key.eq_ignore_ascii_case(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::recommend_fertilizer;
    use crate::types::{Advisory, SoilSample};

    #[test]
    fn test_find_preset() {
        assert_eq!(find_preset("laterite"), Some(&LATERITE));
        assert_eq!(find_preset("  Black "), Some(&BLACK));
        assert_eq!(find_preset("peat"), None);
        assert_eq!(find_preset(""), None);
    }

    #[test]
    fn test_keys_unique() {
        for (i, a) in ALL_PRESETS.iter().enumerate() {
            for b in &ALL_PRESETS[i + 1..] {
                assert_ne!(a.key, b.key);
            }
        }
    }

    #[test]
    fn test_presets_exercise_ph_rules() {
        let advice = |p: &SoilPreset| recommend_fertilizer(&SoilSample::new(p.n, p.p, p.k, p.ph));

        assert!(advice(&ALLUVIAL).is_balanced());
        assert!(advice(&LATERITE).contains(Advisory::AcidicSoil));
        assert!(advice(&BLACK).contains(Advisory::AlkalineSoil));
    }
}
