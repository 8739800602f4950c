//! Productivity scoring
//!
//! This module turns the four hours metrics into a 0-100 productivity score:
//! - Study, sleep and break time score best around a peak inside an optimal range
//! - Screen time is scored inversely (less is better)
//!
//! Every component is clamped to `[0, weight]`, so the total can never leave
//! `[0, 100]` with the default weights.

use crate::config::{RangeCurve, ScoringConfig, ScreenCurve};
use crate::types::{DailyMetrics, ScoreBreakdown};

/// Scorer for computing productivity scores
#[derive(Debug, Clone, Default)]
pub struct ProductivityScorer {
    config: ScoringConfig,
}

impl ProductivityScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score a day's metrics. Mood does not contribute.
    pub fn score(&self, metrics: &DailyMetrics) -> ScoreBreakdown {
        let study = range_score(&self.config.study, metrics.study_hours);
        let sleep = range_score(&self.config.sleep, metrics.sleep_hours);
        let breaks = range_score(&self.config.break_time, metrics.break_time);
        let screen = screen_score(&self.config.screen, metrics.screen_time);

        ScoreBreakdown {
            total_score: round1(study + sleep + breaks + screen),
            study_score: round1(study),
            sleep_score: round1(sleep),
            break_score: round1(breaks),
            screen_score: round1(screen),
        }
    }
}

/// Score a component with an optimal range, clamped to `[0, weight]`
fn range_score(curve: &RangeCurve, hours: f64) -> f64 {
    let weight = curve.weight;

    let score = if hours < curve.optimal_min {
        (hours / curve.optimal_min) * weight * curve.below_min_fraction
    } else if hours <= curve.optimal_max {
        let rise = 1.0 - curve.edge_fraction;
        if hours <= curve.peak {
            weight * (curve.edge_fraction + rise * (hours / curve.peak))
        } else {
            let past_peak = (hours - curve.peak) / (curve.optimal_max - curve.peak);
            weight * (1.0 - rise * past_peak)
        }
    } else {
        let excess = hours - curve.optimal_max;
        let penalty = (excess * curve.over_max_rate).min(weight * curve.over_max_penalty_cap);
        (weight * curve.over_max_base - penalty).max(0.0)
    };

    score.clamp(0.0, weight)
}

/// Score screen time, clamped to `[0, weight]`
fn screen_score(curve: &ScreenCurve, hours: f64) -> f64 {
    let weight = curve.weight;

    let score = if hours <= curve.good_max {
        weight * (1.0 - (hours / curve.good_max) * curve.good_decline)
    } else if hours <= curve.penalty_start {
        let excess = hours - curve.good_max;
        let penalty =
            (excess / (curve.penalty_start - curve.good_max)) * weight * curve.moderate_decline;
        weight * (1.0 - curve.good_decline) - penalty
    } else {
        let excess = hours - curve.penalty_start;
        let penalty = (excess * curve.heavy_rate).min(weight * curve.heavy_penalty_cap);
        (weight * curve.heavy_base - penalty).max(0.0)
    };

    score.clamp(0.0, weight)
}

/// Round to one decimal place
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
