//! Burnout risk decision engine
//!
//! Ordered rules run first and the first match wins. A High rule locks the
//! category; the classifier may then only adjust confidence. Cases no rule
//! covers are deferred to the classifier, and fall back to a degraded Medium
//! when it cannot answer.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::classifier::{BurnoutClassifier, ClassifierError};
use crate::config::{RiskConfig, DEFAULT_INFERENCE_BUDGET_MS};
use crate::scorer::round1;
use crate::types::{
    BurnoutAssessment, ClassProbabilities, DailyMetrics, DecisionSource, FeatureVector,
    ModelStatus, RiskLevel, RiskRule,
};

/// Tolerance when checking that classifier probabilities sum to 1
const PROBABILITY_SUM_TOLERANCE: f64 = 1e-6;

/// Outcome of the rule stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// A High rule matched; the category is fixed
    Locked(RiskRule),
    /// A non-locking rule matched with this category
    Ruled(RiskRule, RiskLevel),
    /// No rule matched; the classifier decides
    Deferred,
}

impl Decision {
    pub fn rule(&self) -> Option<RiskRule> {
        match self {
            Decision::Locked(rule) | Decision::Ruled(rule, _) => Some(*rule),
            Decision::Deferred => None,
        }
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, Decision::Locked(_))
    }
}

/// What the classifier said about one feature vector
#[derive(Debug, Clone, Copy, PartialEq)]
struct ModelOpinion {
    prediction: RiskLevel,
    probabilities: ClassProbabilities,
    /// Probability of the predicted label as a percentage, clamped to the global bounds
    confidence: f64,
}

/// Rule-first burnout risk engine with optional classifier support
#[derive(Clone)]
pub struct BurnoutRiskEngine {
    config: RiskConfig,
    classifier: Option<Arc<dyn BurnoutClassifier>>,
    budget: Duration,
}

impl Default for BurnoutRiskEngine {
    fn default() -> Self {
        Self::new(RiskConfig::default())
    }
}

impl std::fmt::Debug for BurnoutRiskEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BurnoutRiskEngine")
            .field("config", &self.config)
            .field(
                "classifier",
                &self.classifier.as_ref().map(|c| c.describe()),
            )
            .field("budget", &self.budget)
            .finish()
    }
}

impl BurnoutRiskEngine {
    /// Rules-only engine
    pub fn new(config: RiskConfig) -> Self {
        Self {
            config,
            classifier: None,
            budget: Duration::from_millis(DEFAULT_INFERENCE_BUDGET_MS),
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn BurnoutClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Classifier answers slower than this are discarded.
    ///
    /// The call runs on the caller's thread and is timed after it returns;
    /// a classifier that blocks still blocks `assess`.
    pub fn with_inference_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    pub fn has_classifier(&self) -> bool {
        self.classifier.is_some()
    }

    /// Run the ordered rules
    pub fn decide(&self, metrics: &DailyMetrics) -> Decision {
        let c = &self.config;
        let sleep = metrics.sleep_hours;
        let study = metrics.study_hours;

        if sleep < c.critical_sleep_hours && metrics.screen_time > c.critical_screen_hours {
            Decision::Locked(RiskRule::SleepScreenCritical)
        } else if sleep < c.critical_sleep_hours {
            Decision::Locked(RiskRule::SleepCritical)
        } else if study > c.overstudy_hours && sleep < c.overstudy_sleep_hours {
            Decision::Locked(RiskRule::OverstudyUnderslept)
        } else if sleep >= c.healthy_min_sleep_hours
            && (c.healthy_min_study_hours..=c.healthy_max_study_hours).contains(&study)
        {
            Decision::Ruled(RiskRule::HealthyBalance, RiskLevel::Low)
        } else {
            Decision::Deferred
        }
    }

    /// Assess burnout risk for one day
    pub fn assess(&self, metrics: &DailyMetrics) -> BurnoutAssessment {
        let decision = self.decide(metrics);
        let features = metrics.features();
        match decision.rule() {
            Some(rule) => debug!("Burnout rule matched: {}", rule.label()),
            None => debug!("No burnout rule matched, deferring to classifier"),
        }

        let (opinion, model_status) = match self.consult(&features) {
            None => (None, ModelStatus::NotAvailable),
            Some(Ok(opinion)) => (Some(opinion), ModelStatus::Available),
            Some(Err(ClassifierError::ArtifactMissing(path))) => {
                warn!("Classifier artifact missing at {:?}", path);
                (None, ModelStatus::NotAvailable)
            }
            Some(Err(e)) => {
                warn!("Classifier unavailable: {}", e);
                (None, ModelStatus::Error)
            }
        };

        let c = &self.config;
        let (risk_level, confidence, decision_source, rationale) = match (decision, opinion) {
            (Decision::Locked(rule), Some(op)) => {
                let band = if op.prediction == RiskLevel::High {
                    c.locked_agree
                } else {
                    c.locked_disagree
                };
                (
                    RiskLevel::High,
                    band.blend(op.confidence),
                    DecisionSource::Rule(rule),
                    rule_rationale(rule, metrics),
                )
            }
            (Decision::Locked(rule), None) => (
                RiskLevel::High,
                c.unassisted_locked_confidence,
                DecisionSource::Rule(rule),
                rule_rationale(rule, metrics),
            ),
            (Decision::Ruled(rule, level), Some(op)) => {
                let band = if op.prediction == level {
                    c.rule_agree
                } else {
                    c.rule_disagree
                };
                (
                    level,
                    band.blend(op.confidence),
                    DecisionSource::Rule(rule),
                    rule_rationale(rule, metrics),
                )
            }
            (Decision::Ruled(rule, level), None) => {
                let confidence = if rule == RiskRule::HealthyBalance {
                    c.unassisted_healthy_confidence
                } else {
                    c.unassisted_rule_confidence
                };
                (
                    level,
                    confidence,
                    DecisionSource::Rule(rule),
                    rule_rationale(rule, metrics),
                )
            }
            (Decision::Deferred, Some(op)) => (
                op.prediction,
                op.confidence,
                DecisionSource::Model,
                model_rationale(op.prediction, &op.probabilities, metrics),
            ),
            (Decision::Deferred, None) => (
                RiskLevel::Medium,
                c.fallback_confidence,
                DecisionSource::Default,
                degraded_rationale(model_status, metrics),
            ),
        };

        BurnoutAssessment {
            risk_level,
            confidence: round1(confidence.clamp(c.confidence_floor, c.confidence_ceiling)),
            rationale,
            decision_source,
            locked: decision.is_locked(),
            model_prediction: opinion.map(|op| op.prediction),
            model_probabilities: opinion.map(|op| op.probabilities),
            model_status,
            features,
        }
    }

    /// Ask the classifier and check its elapsed time against the budget
    fn consult(&self, features: &FeatureVector) -> Option<Result<ModelOpinion, ClassifierError>> {
        let classifier = self.classifier.as_ref()?;

        let started = Instant::now();
        let result = classifier
            .predict(features)
            .and_then(|prediction| Ok((prediction, classifier.predict_proba(features)?)));
        let elapsed = started.elapsed();

        if elapsed > self.budget {
            return Some(Err(ClassifierError::DeadlineExceeded {
                elapsed_ms: millis(elapsed),
                budget_ms: millis(self.budget),
            }));
        }

        Some(result.and_then(|(prediction, probabilities)| {
            check_probabilities(&probabilities)?;
            let confidence = (probabilities.get(prediction) * 100.0)
                .clamp(self.config.confidence_floor, self.config.confidence_ceiling);
            Ok(ModelOpinion {
                prediction,
                probabilities,
                confidence,
            })
        }))
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn check_probabilities(probs: &ClassProbabilities) -> Result<(), ClassifierError> {
    let values = [probs.low, probs.medium, probs.high];
    if values.iter().any(|p| !p.is_finite() || !(0.0..=1.0).contains(p)) {
        return Err(ClassifierError::Inference(format!(
            "probabilities out of range: {:?}",
            values
        )));
    }
    if (probs.sum() - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
        return Err(ClassifierError::Inference(format!(
            "probabilities sum to {}, expected 1",
            probs.sum()
        )));
    }
    Ok(())
}

fn rule_rationale(rule: RiskRule, m: &DailyMetrics) -> String {
    match rule {
        RiskRule::SleepScreenCritical => format!(
            "{}. High risk: only {:.1} hours of sleep together with {:.1} hours of screen time. \
             Severe sleep loss combined with heavy screen exposure strongly raises burnout risk.",
            rule.label(),
            m.sleep_hours,
            m.screen_time
        ),
        RiskRule::SleepCritical => format!(
            "{}. High risk: only {:.1} hours of sleep. Sleeping less than 4 hours seriously \
             impairs focus and recovery.",
            rule.label(),
            m.sleep_hours
        ),
        RiskRule::OverstudyUnderslept => format!(
            "{}. High risk: {:.1} hours of study on {:.1} hours of sleep. Long study days \
             without enough rest are a typical burnout pattern.",
            rule.label(),
            m.study_hours,
            m.sleep_hours
        ),
        RiskRule::HealthyBalance => format!(
            "{}. Low risk: {:.1} hours of sleep and {:.1} hours of study is a healthy balance. \
             7-9 hours of sleep with 4-7 hours of focused study supports performance without \
             burnout.",
            rule.label(),
            m.sleep_hours,
            m.study_hours
        ),
    }
}

fn model_rationale(level: RiskLevel, probs: &ClassProbabilities, m: &DailyMetrics) -> String {
    format!(
        "Classifier analysis (borderline case): sleep {:.1}h, study {:.1}h, breaks {:.1}h, \
         screen {:.1}h, mood {} indicate {} burnout risk. \
         Probabilities: Low {:.1}%, Medium {:.1}%, High {:.1}%.",
        m.sleep_hours,
        m.study_hours,
        m.break_time,
        m.screen_time,
        m.mood_level,
        level,
        probs.low * 100.0,
        probs.medium * 100.0,
        probs.high * 100.0
    )
}

fn degraded_rationale(status: ModelStatus, m: &DailyMetrics) -> String {
    let reason = match status {
        ModelStatus::Error => "Classifier analysis failed",
        _ => "Classifier not available",
    };
    format!(
        "{}; defaulting to Medium risk. Your pattern: sleep {:.1}h, study {:.1}h, \
         breaks {:.1}h, screen {:.1}h. Aim for 7-9h sleep, 4-8h study, 1-3h breaks \
         and at most 8h of screen time.",
        reason, m.sleep_hours, m.study_hours, m.break_time, m.screen_time
    )
}
