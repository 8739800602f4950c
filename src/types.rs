//! Core data types for the LearnSmart engine
//!
//! This module defines the value types that flow between the scorer, the
//! burnout risk engine and the suggestion engine. Every type here is a
//! transient value computed per call; persistence is handled elsewhere.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Self-reported mood for the day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoodLevel {
    Low,
    Medium,
    High,
}

impl MoodLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            MoodLevel::Low => "Low",
            MoodLevel::Medium => "Medium",
            MoodLevel::High => "High",
        }
    }

    /// Parse a mood label. Labels are case-sensitive, matching the submission form.
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "Low" => Some(MoodLevel::Low),
            "Medium" => Some(MoodLevel::Medium),
            "High" => Some(MoodLevel::High),
            _ => None,
        }
    }
}

impl fmt::Display for MoodLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Integer mood proxy on a 1-10 scale, used only as a classifier feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MoodScore(u8);

impl MoodScore {
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl From<MoodLevel> for MoodScore {
    fn from(level: MoodLevel) -> Self {
        match level {
            MoodLevel::Low => MoodScore(3),
            MoodLevel::Medium => MoodScore(6),
            MoodLevel::High => MoodScore(9),
        }
    }
}

/// Burnout risk category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// All levels in canonical order
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "Low" => Some(RiskLevel::Low),
            "Medium" => Some(RiskLevel::Medium),
            "High" => Some(RiskLevel::High),
            _ => None,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One day of activity metrics for a student
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyMetrics {
    /// Hours spent studying
    pub study_hours: f64,
    /// Hours of sleep
    pub sleep_hours: f64,
    /// Hours of breaks/rest
    pub break_time: f64,
    /// Total screen time in hours
    pub screen_time: f64,
    /// Self-reported mood
    pub mood_level: MoodLevel,
}

impl DailyMetrics {
    pub fn new(
        study_hours: f64,
        sleep_hours: f64,
        break_time: f64,
        screen_time: f64,
        mood_level: MoodLevel,
    ) -> Self {
        Self {
            study_hours,
            sleep_hours,
            break_time,
            screen_time,
            mood_level,
        }
    }

    pub fn mood_score(&self) -> MoodScore {
        MoodScore::from(self.mood_level)
    }

    /// Classifier feature vector `[study, sleep, break, screen, mood_score]`
    pub fn features(&self) -> FeatureVector {
        FeatureVector([
            self.study_hours,
            self.sleep_hours,
            self.break_time,
            self.screen_time,
            f64::from(self.mood_score().value()),
        ])
    }
}

/// Number of classifier input features
pub const FEATURE_COUNT: usize = 5;

/// Feature names in vector order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "study_hours",
    "sleep_hours",
    "break_time",
    "screen_time",
    "mood_score",
];

/// Five-feature classifier input
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(pub [f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// Productivity score with per-component breakdown
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Composite score (0-100)
    pub total_score: f64,
    /// Study component (0-30 by default)
    pub study_score: f64,
    /// Sleep component (0-30 by default)
    pub sleep_score: f64,
    /// Break component (0-20 by default)
    pub break_score: f64,
    /// Screen component (0-20 by default)
    pub screen_score: f64,
}

/// Per-class probabilities reported by a classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassProbabilities {
    #[serde(rename = "Low")]
    pub low: f64,
    #[serde(rename = "Medium")]
    pub medium: f64,
    #[serde(rename = "High")]
    pub high: f64,
}

impl ClassProbabilities {
    pub fn new(low: f64, medium: f64, high: f64) -> Self {
        Self { low, medium, high }
    }

    pub fn get(&self, level: RiskLevel) -> f64 {
        match level {
            RiskLevel::Low => self.low,
            RiskLevel::Medium => self.medium,
            RiskLevel::High => self.high,
        }
    }

    pub fn sum(&self) -> f64 {
        self.low + self.medium + self.high
    }

    /// Most probable level; ties resolve towards the lower level
    pub fn most_likely(&self) -> RiskLevel {
        let mut best = RiskLevel::Low;
        for level in RiskLevel::ALL {
            if self.get(level) > self.get(best) {
                best = level;
            }
        }
        best
    }
}

/// Identifier of a burnout risk rule, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RiskRule {
    /// Severe sleep deprivation combined with heavy screen use
    SleepScreenCritical,
    /// Severe sleep deprivation
    SleepCritical,
    /// Long study hours on short sleep
    OverstudyUnderslept,
    /// Enough sleep and a moderate study load
    HealthyBalance,
}

impl RiskRule {
    /// Rules in evaluation order
    pub const ORDERED: [RiskRule; 4] = [
        RiskRule::SleepScreenCritical,
        RiskRule::SleepCritical,
        RiskRule::OverstudyUnderslept,
        RiskRule::HealthyBalance,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            RiskRule::SleepScreenCritical => "rule_1",
            RiskRule::SleepCritical => "rule_2",
            RiskRule::OverstudyUnderslept => "rule_3",
            RiskRule::HealthyBalance => "rule_4",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ORDERED.into_iter().find(|rule| rule.id() == id)
    }

    /// Human-readable label used in rationales
    pub fn label(&self) -> &'static str {
        match self {
            RiskRule::SleepScreenCritical => "Rule 1: Sleep < 4h AND Screen > 8h",
            RiskRule::SleepCritical => "Rule 2: Sleep < 4h",
            RiskRule::OverstudyUnderslept => "Rule 3: Study > 9h AND Sleep < 5h",
            RiskRule::HealthyBalance => "Rule 4: Healthy Balance",
        }
    }
}

/// What produced the final risk category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum DecisionSource {
    /// A rule matched and its category stands
    Rule(RiskRule),
    /// The classifier decided a borderline case
    Model,
    /// Borderline case with no classifier available; degraded default
    Default,
}

impl DecisionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionSource::Rule(rule) => rule.id(),
            DecisionSource::Model => "model",
            DecisionSource::Default => "default",
        }
    }
}

impl From<DecisionSource> for String {
    fn from(source: DecisionSource) -> Self {
        source.as_str().to_string()
    }
}

impl TryFrom<String> for DecisionSource {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "model" => Ok(DecisionSource::Model),
            "default" => Ok(DecisionSource::Default),
            other => RiskRule::from_id(other)
                .map(DecisionSource::Rule)
                .ok_or_else(|| format!("unknown decision source: {other}")),
        }
    }
}

/// Whether the classifier took part in an assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelStatus {
    /// Classifier answered within budget
    Available,
    /// Classifier was configured but failed or timed out
    Error,
    /// No classifier configured or artifact missing
    NotAvailable,
}

/// Burnout risk assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurnoutAssessment {
    /// Final risk category
    pub risk_level: RiskLevel,
    /// Confidence percentage, always within [70, 95]
    pub confidence: f64,
    /// Human-readable explanation
    pub rationale: String,
    /// Rule id, "model" or "default"
    pub decision_source: DecisionSource,
    /// Whether a locking rule fixed the category
    pub locked: bool,
    /// Classifier label, when the classifier answered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_prediction: Option<RiskLevel>,
    /// Classifier probabilities, when the classifier answered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_probabilities: Option<ClassProbabilities>,
    /// Classifier participation
    pub model_status: ModelStatus,
    /// Features sent (or that would have been sent) to the classifier
    pub features: FeatureVector,
}

/// Suggestion priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Sort rank: high first
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

/// Area a suggestion addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionCategory {
    Sleep,
    Study,
    Break,
    Screen,
    Balance,
    Mood,
}

/// A single improvement suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub category: SuggestionCategory,
    pub icon: String,
    /// Id of the rule that produced this suggestion
    pub rule: String,
}

/// Everything computed for one student on one calendar day
///
/// `(user_id, study_date)` is the natural key; a resubmission for the same
/// date replaces the earlier record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub user_id: String,
    pub study_date: NaiveDate,
    pub metrics: DailyMetrics,
    pub score: ScoreBreakdown,
    pub assessment: BurnoutAssessment,
    pub suggestions: Vec<Suggestion>,
    pub computed_at_utc: DateTime<Utc>,
}
