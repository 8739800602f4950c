//! Burnout classifier capability
//!
//! The risk engine consults a pre-trained three-class classifier for
//! borderline cases and to calibrate confidence on rule decisions. The
//! classifier is injected as a trait object so that callers can plug in
//! any model; this module ships two artifact-backed implementations.

mod artifact;
mod logistic;
mod tree;

pub use artifact::{
    ArtifactClassifier, LazyArtifactClassifier, LoadedModel, ModelArtifact, ARTIFACT_FORMAT_VERSION,
};
pub use logistic::LogisticRegressionModel;
pub use tree::{DecisionTreeModel, TreeNode};

use std::path::PathBuf;
use thiserror::Error;

use crate::types::{ClassProbabilities, RiskLevel};

pub use crate::types::FeatureVector;

/// A pre-trained three-class burnout classifier
///
/// Implementations must be safe to share across threads; the engine holds
/// them behind an `Arc`.
pub trait BurnoutClassifier: Send + Sync {
    /// Most likely risk level for the features
    fn predict(&self, features: &FeatureVector) -> Result<RiskLevel, ClassifierError> {
        Ok(self.predict_proba(features)?.most_likely())
    }

    /// Per-level probabilities, summing to 1
    fn predict_proba(
        &self,
        features: &FeatureVector,
    ) -> Result<ClassProbabilities, ClassifierError>;

    /// Short model description for diagnostics
    fn describe(&self) -> String {
        "custom classifier".to_string()
    }
}

/// Reasons the classifier could not answer
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifierError {
    #[error("Model artifact not found: {0:?}")]
    ArtifactMissing(PathBuf),

    #[error("Model artifact is corrupt: {0}")]
    ArtifactCorrupt(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Inference took {elapsed_ms} ms, budget is {budget_ms} ms")]
    DeadlineExceeded { elapsed_ms: u64, budget_ms: u64 },
}

/// Map class weights given in artifact `classes` order onto probabilities
///
/// Weights must be finite and non-negative with a positive sum.
pub(crate) fn normalize_weights(
    classes: &[RiskLevel; 3],
    weights: &[f64],
) -> Result<ClassProbabilities, ClassifierError> {
    if weights.len() != classes.len() {
        return Err(ClassifierError::Inference(format!(
            "expected {} class weights, got {}",
            classes.len(),
            weights.len()
        )));
    }
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(ClassifierError::Inference(
            "class weights must be finite and non-negative".to_string(),
        ));
    }
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Err(ClassifierError::Inference("class weights sum to zero".to_string()));
    }

    let mut probs = ClassProbabilities::new(0.0, 0.0, 0.0);
    for (level, weight) in classes.iter().zip(weights) {
        let p = weight / total;
        match level {
            RiskLevel::Low => probs.low = p,
            RiskLevel::Medium => probs.medium = p,
            RiskLevel::High => probs.high = p,
        }
    }
    Ok(probs)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(ClassProbabilities);

    impl BurnoutClassifier for Fixed {
        fn predict_proba(&self, _: &FeatureVector) -> Result<ClassProbabilities, ClassifierError> {
            Ok(self.0)
        }
    }

    #[test]
    fn test_default_predict_uses_probabilities() {
        let model = Fixed(ClassProbabilities::new(0.1, 0.7, 0.2));
        let features = FeatureVector([6.0, 6.0, 1.0, 5.0, 6.0]);
        assert_eq!(model.predict(&features).unwrap(), RiskLevel::Medium);
    }

    #[test]
    fn test_normalize_weights_follows_class_order() {
        let classes = [RiskLevel::High, RiskLevel::Low, RiskLevel::Medium];
        let probs = normalize_weights(&classes, &[40.0, 2.0, 8.0]).unwrap();
        assert!((probs.high - 0.8).abs() < 1e-12);
        assert!((probs.low - 0.04).abs() < 1e-12);
        assert!((probs.medium - 0.16).abs() < 1e-12);
        assert!((probs.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_weights_rejects_bad_input() {
        let classes = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];
        assert!(normalize_weights(&classes, &[0.0, 0.0, 0.0]).is_err());
        assert!(normalize_weights(&classes, &[1.0, -1.0, 2.0]).is_err());
        assert!(normalize_weights(&classes, &[1.0, 2.0]).is_err());
        assert!(normalize_weights(&classes, &[f64::NAN, 1.0, 1.0]).is_err());
    }
}
