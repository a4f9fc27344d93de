// Tunable heuristics for the processors.
//
// Every number that encodes a domain assumption (intensity multipliers,
// sector employment weights, age-bracket proxies) lives here so it can be
// recalibrated from a TOML file without touching the processors. Missing
// keys fall back to the defaults below.
use serde::Deserialize;
use std::path::Path;

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    pub construction: ConstructionHeuristics,
    pub economics: EconomicsHeuristics,
}

impl ProcessorConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }
}

/// Inputs to the construction intensity index and the supply pipeline.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConstructionHeuristics {
    pub baseline_index: f64,

    // Permit-count YoY trend (percent) → multiplicative bump.
    pub permit_trend_strong: f64,
    pub permit_trend_moderate: f64,
    pub strong_growth_multiplier: f64,
    pub moderate_growth_multiplier: f64,
    pub moderate_decline_multiplier: f64,
    pub strong_decline_multiplier: f64,

    // Residential surface YoY trend (percent) → additive bump.
    pub surface_trend_strong: f64,
    pub surface_trend_moderate: f64,
    pub surface_strong_bump: f64,
    pub surface_moderate_bump: f64,

    // New residential dwellings (count) → additive bump.
    pub dwellings_strong: f64,
    pub dwellings_moderate: f64,
    pub dwellings_strong_bump: f64,
    pub dwellings_moderate_bump: f64,

    pub strong_growth_above: f64,
    pub moderate_growth_above: f64,
    pub stagnation_below: f64,
    pub slowdown_below: f64,

    pub pipeline_multiplier: f64,
    pub completion_timeframe: String,
    pub high_impact_units: f64,
    pub low_impact_units: f64,
}

impl Default for ConstructionHeuristics {
    fn default() -> Self {
        Self {
            baseline_index: 1.0,
            permit_trend_strong: 20.0,
            permit_trend_moderate: 10.0,
            strong_growth_multiplier: 1.2,
            moderate_growth_multiplier: 1.1,
            moderate_decline_multiplier: 0.8,
            strong_decline_multiplier: 0.7,
            surface_trend_strong: 10.0,
            surface_trend_moderate: 5.0,
            surface_strong_bump: 0.1,
            surface_moderate_bump: 0.05,
            dwellings_strong: 10.0,
            dwellings_moderate: 5.0,
            dwellings_strong_bump: 0.1,
            dwellings_moderate_bump: 0.05,
            strong_growth_above: 1.2,
            moderate_growth_above: 1.05,
            stagnation_below: 0.95,
            slowdown_below: 0.8,
            pipeline_multiplier: 1.5,
            completion_timeframe: "18 months".to_string(),
            high_impact_units: 200.0,
            low_impact_units: 50.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EconomicsHeuristics {
    /// Static population shares reported as the income distribution.
    pub income_categories: IncomeCategories,
    pub age_proxy: AgeProxyMultipliers,
    pub employment: EmploymentIndexWeights,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct IncomeCategories {
    pub low_income: f64,
    pub middle_income: f64,
    pub high_income: f64,
}

impl Default for IncomeCategories {
    fn default() -> Self {
        Self {
            low_income: 0.15,
            middle_income: 0.55,
            high_income: 0.30,
        }
    }
}

/// Share of the overall unemployment rate assumed for a bracket the source
/// does not report.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AgeProxyMultipliers {
    pub under_25: f64,
    pub from_25_to_50: f64,
    pub over_50: f64,
}

impl Default for AgeProxyMultipliers {
    fn default() -> Self {
        Self {
            under_25: 1.5,
            from_25_to_50: 0.9,
            over_50: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EmploymentIndexWeights {
    /// Canonical sector names weighted at `neutral_weight`.
    pub neutral_sectors: Vec<String>,
    pub neutral_weight: f64,
    /// Canonical sector names weighted at `high_weight`.
    pub high_sectors: Vec<String>,
    pub high_weight: f64,
    pub default_weight: f64,
    /// Fraction of the sector's YoY enterprise trend folded into the index.
    pub trend_weight: f64,
}

impl Default for EmploymentIndexWeights {
    fn default() -> Self {
        Self {
            neutral_sectors: vec![
                "construction".to_string(),
                "health_social".to_string(),
                "other_services".to_string(),
            ],
            neutral_weight: 1.0,
            high_sectors: vec![
                "agriculture".to_string(),
                "it_communication".to_string(),
                "finance".to_string(),
            ],
            high_weight: 1.2,
            default_weight: 0.9,
            trend_weight: 0.5,
        }
    }
}
