//! Engine configuration
//!
//! Every threshold used by the scorer, the risk engine and the suggestion
//! engine lives here. `EngineConfig::default()` reproduces the reference
//! values; a TOML file can override any subset of them.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::ComputeError;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub scoring: ScoringConfig,
    pub risk: RiskConfig,
    pub suggestions: SuggestionConfig,
    pub classifier: ClassifierConfig,
}

/// Curve for a component with an optimal range around a peak
///
/// Below `optimal_min` the score ramps linearly from 0 up to
/// `below_min_fraction` of the weight. Inside the range it rises from
/// `edge_fraction` to the full weight at `peak`, then falls back to
/// `edge_fraction` at `optimal_max`. Above the range it starts from
/// `over_max_base` of the weight and loses `over_max_rate` points per excess
/// hour, at most `over_max_penalty_cap` of the weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeCurve {
    pub weight: f64,
    pub optimal_min: f64,
    pub peak: f64,
    pub optimal_max: f64,
    pub below_min_fraction: f64,
    pub edge_fraction: f64,
    pub over_max_base: f64,
    pub over_max_rate: f64,
    pub over_max_penalty_cap: f64,
}

/// Inverse curve for screen time (less is better)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenCurve {
    pub weight: f64,
    /// Upper bound of the "good" range
    pub good_max: f64,
    /// Fraction of weight lost across the good range
    pub good_decline: f64,
    /// Upper bound of the moderate range; heavy penalty starts here
    pub penalty_start: f64,
    /// Fraction of weight lost across the moderate range
    pub moderate_decline: f64,
    /// Fraction of weight remaining when the heavy range begins
    pub heavy_base: f64,
    /// Points lost per hour beyond `penalty_start`
    pub heavy_rate: f64,
    /// Maximum heavy penalty as a fraction of weight
    pub heavy_penalty_cap: f64,
}

/// Productivity scorer configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub study: RangeCurve,
    pub sleep: RangeCurve,
    #[serde(rename = "break")]
    pub break_time: RangeCurve,
    pub screen: ScreenCurve,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            study: RangeCurve {
                weight: 30.0,
                optimal_min: 4.0,
                peak: 6.0,
                optimal_max: 8.0,
                below_min_fraction: 0.5,
                edge_fraction: 0.0,
                over_max_base: 0.5,
                over_max_rate: 5.0,
                over_max_penalty_cap: 0.5,
            },
            sleep: RangeCurve {
                weight: 30.0,
                optimal_min: 7.0,
                peak: 8.0,
                optimal_max: 9.0,
                below_min_fraction: 0.7,
                edge_fraction: 0.7,
                over_max_base: 0.6,
                over_max_rate: 3.0,
                over_max_penalty_cap: 0.4,
            },
            break_time: RangeCurve {
                weight: 20.0,
                optimal_min: 1.0,
                peak: 2.0,
                optimal_max: 3.0,
                below_min_fraction: 0.6,
                edge_fraction: 0.6,
                over_max_base: 0.5,
                over_max_rate: 4.0,
                over_max_penalty_cap: 0.5,
            },
            screen: ScreenCurve {
                weight: 20.0,
                good_max: 6.0,
                good_decline: 0.2,
                penalty_start: 8.0,
                moderate_decline: 0.5,
                heavy_base: 0.3,
                heavy_rate: 2.0,
                heavy_penalty_cap: 0.7,
            },
        }
    }
}

impl ScoringConfig {
    /// Sum of all component weights
    pub fn max_total(&self) -> f64 {
        self.study.weight + self.sleep.weight + self.break_time.weight + self.screen.weight
    }
}

/// Inclusive confidence band used when blending rule and classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBand {
    pub min: f64,
    pub max: f64,
}

impl ConfidenceBand {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Place a classifier confidence (percent) proportionally inside the band
    pub fn blend(&self, model_confidence: f64) -> f64 {
        let blended = self.min + (model_confidence / 100.0) * (self.max - self.min);
        blended.clamp(self.min, self.max)
    }
}

/// Burnout risk engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Sleep below this is critical (rules 1 and 2)
    pub critical_sleep_hours: f64,
    /// Screen time above this aggravates critical sleep (rule 1)
    pub critical_screen_hours: f64,
    /// Study above this is overwork (rule 3)
    pub overstudy_hours: f64,
    /// Sleep below this combined with overwork is high risk (rule 3)
    pub overstudy_sleep_hours: f64,
    /// Minimum sleep for the healthy-balance rule (rule 4)
    pub healthy_min_sleep_hours: f64,
    /// Study range for the healthy-balance rule (rule 4)
    pub healthy_min_study_hours: f64,
    pub healthy_max_study_hours: f64,

    /// Global confidence bounds
    pub confidence_floor: f64,
    pub confidence_ceiling: f64,

    /// Locked High rule, classifier agrees
    pub locked_agree: ConfidenceBand,
    /// Locked High rule, classifier disagrees
    pub locked_disagree: ConfidenceBand,
    /// Non-locked rule, classifier agrees
    pub rule_agree: ConfidenceBand,
    /// Non-locked rule, classifier disagrees
    pub rule_disagree: ConfidenceBand,

    /// Fixed confidence without a classifier
    pub unassisted_locked_confidence: f64,
    pub unassisted_healthy_confidence: f64,
    pub unassisted_rule_confidence: f64,
    pub fallback_confidence: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            critical_sleep_hours: 4.0,
            critical_screen_hours: 8.0,
            overstudy_hours: 9.0,
            overstudy_sleep_hours: 5.0,
            healthy_min_sleep_hours: 7.0,
            healthy_min_study_hours: 4.0,
            healthy_max_study_hours: 7.0,
            confidence_floor: 70.0,
            confidence_ceiling: 95.0,
            locked_agree: ConfidenceBand::new(88.0, 95.0),
            locked_disagree: ConfidenceBand::new(80.0, 88.0),
            rule_agree: ConfidenceBand::new(85.0, 95.0),
            rule_disagree: ConfidenceBand::new(75.0, 85.0),
            unassisted_locked_confidence: 85.0,
            unassisted_healthy_confidence: 80.0,
            unassisted_rule_confidence: 75.0,
            fallback_confidence: 70.0,
        }
    }
}

/// Suggestion engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionConfig {
    pub max_suggestions: usize,

    pub sleep_critical_below: f64,
    pub sleep_low_below: f64,
    pub sleep_excess_above: f64,

    pub study_excess_above: f64,
    pub study_high_above: f64,
    pub study_low_below: f64,

    pub break_critical_below: f64,
    pub break_low_below: f64,
    pub break_excess_above: f64,

    pub screen_excess_above: f64,
    pub screen_high_above: f64,

    /// Number of concerning factors that triggers the rebalance suggestion
    pub rebalance_min_factors: usize,
    /// Productivity score below which the productivity suggestion fires
    pub productivity_below: f64,

    /// Healthy ranges for positive reinforcement
    pub healthy_sleep_min: f64,
    pub healthy_sleep_max: f64,
    pub healthy_study_min: f64,
    pub healthy_study_max: f64,
    pub healthy_break_min: f64,
    pub healthy_break_max: f64,
    pub healthy_screen_max: f64,
    pub reinforcement_min_factors: usize,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            max_suggestions: 5,
            sleep_critical_below: 6.0,
            sleep_low_below: 7.0,
            sleep_excess_above: 10.0,
            study_excess_above: 10.0,
            study_high_above: 8.0,
            study_low_below: 3.0,
            break_critical_below: 0.5,
            break_low_below: 1.0,
            break_excess_above: 5.0,
            screen_excess_above: 12.0,
            screen_high_above: 10.0,
            rebalance_min_factors: 3,
            productivity_below: 60.0,
            healthy_sleep_min: 7.0,
            healthy_sleep_max: 9.0,
            healthy_study_min: 4.0,
            healthy_study_max: 8.0,
            healthy_break_min: 1.0,
            healthy_break_max: 3.0,
            healthy_screen_max: 8.0,
            reinforcement_min_factors: 3,
        }
    }
}

/// Default inference budget in milliseconds
pub const DEFAULT_INFERENCE_BUDGET_MS: u64 = 250;

/// Lowest confidence any assessment may report
pub const MIN_CONFIDENCE: f64 = 70.0;

/// Highest confidence any assessment may report
pub const MAX_CONFIDENCE: f64 = 95.0;

/// Upper bound of the productivity score
pub const MAX_TOTAL_SCORE: f64 = 100.0;

/// External classifier configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Path to the model artifact; `None` runs rules-only
    pub model_path: Option<PathBuf>,
    /// Inference calls slower than this are treated as unavailable
    pub inference_budget_ms: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            inference_budget_ms: DEFAULT_INFERENCE_BUDGET_MS,
        }
    }
}

impl EngineConfig {
    /// Parse configuration from TOML, filling missing keys with defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ComputeError> {
        let config: EngineConfig =
            toml::from_str(content).map_err(|e| ComputeError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load_from_path(path: &Path) -> Result<Self, ComputeError> {
        debug!("Loading engine configuration from {:?}", path);
        let content = fs::read_to_string(path).map_err(|e| {
            ComputeError::ConfigError(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded engine configuration from {:?}", path);
        Ok(config)
    }

    /// Render the configuration as TOML
    pub fn to_toml_string(&self) -> Result<String, ComputeError> {
        toml::to_string_pretty(self).map_err(|e| ComputeError::ConfigError(e.to_string()))
    }

    /// Reject values that would break scoring or confidence invariants
    pub fn validate(&self) -> Result<(), ComputeError> {
        for (name, curve) in [
            ("study", &self.scoring.study),
            ("sleep", &self.scoring.sleep),
            ("break", &self.scoring.break_time),
        ] {
            if curve.weight <= 0.0 {
                return Err(invalid(format!("scoring.{name}.weight must be positive")));
            }
            if !(0.0 < curve.optimal_min
                && curve.optimal_min < curve.peak
                && curve.peak < curve.optimal_max)
            {
                return Err(invalid(format!(
                    "scoring.{name} requires 0 < optimal_min < peak < optimal_max"
                )));
            }
        }

        let screen = &self.scoring.screen;
        if screen.weight <= 0.0 {
            return Err(invalid("scoring.screen.weight must be positive".to_string()));
        }
        if !(0.0 < screen.good_max && screen.good_max < screen.penalty_start) {
            return Err(invalid(
                "scoring.screen requires 0 < good_max < penalty_start".to_string(),
            ));
        }

        if self.scoring.max_total() > MAX_TOTAL_SCORE {
            return Err(invalid(format!(
                "scoring weights sum to {}, at most {} allowed",
                self.scoring.max_total(),
                MAX_TOTAL_SCORE
            )));
        }

        let risk = &self.risk;
        if risk.confidence_floor < MIN_CONFIDENCE || risk.confidence_ceiling > MAX_CONFIDENCE {
            return Err(invalid(format!(
                "risk confidence bounds must lie within [{MIN_CONFIDENCE}, {MAX_CONFIDENCE}]"
            )));
        }
        if risk.confidence_floor > risk.confidence_ceiling {
            return Err(invalid(
                "risk.confidence_floor must not exceed risk.confidence_ceiling".to_string(),
            ));
        }
        for (name, value) in [
            ("unassisted_locked_confidence", risk.unassisted_locked_confidence),
            ("unassisted_healthy_confidence", risk.unassisted_healthy_confidence),
            ("unassisted_rule_confidence", risk.unassisted_rule_confidence),
            ("fallback_confidence", risk.fallback_confidence),
        ] {
            if !(risk.confidence_floor..=risk.confidence_ceiling).contains(&value) {
                return Err(invalid(format!(
                    "risk.{name} must lie within [confidence_floor, confidence_ceiling]"
                )));
            }
        }
        for (name, band) in [
            ("locked_agree", &risk.locked_agree),
            ("locked_disagree", &risk.locked_disagree),
            ("rule_agree", &risk.rule_agree),
            ("rule_disagree", &risk.rule_disagree),
        ] {
            if band.min > band.max
                || band.min < risk.confidence_floor
                || band.max > risk.confidence_ceiling
            {
                return Err(invalid(format!(
                    "risk.{name} must lie within [confidence_floor, confidence_ceiling]"
                )));
            }
        }

        if self.suggestions.max_suggestions == 0 {
            return Err(invalid(
                "suggestions.max_suggestions must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

fn invalid(message: String) -> ComputeError {
    ComputeError::ConfigError(message)
}
