//! Multinomial logistic regression classifier

use super::ClassifierError;
use crate::types::{ClassProbabilities, FeatureVector, RiskLevel, FEATURE_COUNT};

/// Validated softmax model with one coefficient row per class
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticRegressionModel {
    classes: [RiskLevel; 3],
    coefficients: [[f64; FEATURE_COUNT]; 3],
    intercepts: [f64; 3],
}

impl LogisticRegressionModel {
    pub fn new(
        classes: [RiskLevel; 3],
        coefficients: &[Vec<f64>],
        intercepts: &[f64],
    ) -> Result<Self, ClassifierError> {
        if coefficients.len() != classes.len() {
            return Err(corrupt(format!(
                "expected {} coefficient rows, got {}",
                classes.len(),
                coefficients.len()
            )));
        }
        if intercepts.len() != classes.len() {
            return Err(corrupt(format!(
                "expected {} intercepts, got {}",
                classes.len(),
                intercepts.len()
            )));
        }

        let mut rows = [[0.0; FEATURE_COUNT]; 3];
        for (k, row) in coefficients.iter().enumerate() {
            if row.len() != FEATURE_COUNT {
                return Err(corrupt(format!(
                    "coefficient row {k} has {} entries, expected {FEATURE_COUNT}",
                    row.len()
                )));
            }
            rows[k].copy_from_slice(row);
        }

        let mut bias = [0.0; 3];
        bias.copy_from_slice(intercepts);

        if rows.iter().flatten().chain(bias.iter()).any(|v| !v.is_finite()) {
            return Err(corrupt("coefficients and intercepts must be finite".to_string()));
        }

        Ok(Self {
            classes,
            coefficients: rows,
            intercepts: bias,
        })
    }

    pub fn classes(&self) -> &[RiskLevel; 3] {
        &self.classes
    }

    pub fn coefficients(&self) -> &[[f64; FEATURE_COUNT]; 3] {
        &self.coefficients
    }

    pub fn intercepts(&self) -> &[f64; 3] {
        &self.intercepts
    }

    pub fn predict_proba(

        &self,

        features: &FeatureVector,

    ) -> Result<ClassProbabilities, ClassifierError> {
        if features.as_slice().iter().any(|x| !x.is_finite()) {
            return Err(ClassifierError::Inference("features must be finite".to_string()));
        }

        let mut logits = [0.0; 3];
        for (k, logit) in logits.iter_mut().enumerate() {
            *logit = self.intercepts[k]
                + self.coefficients[k]
                    .iter()
                    .zip(features.as_slice())
                    .map(|(w, x)| w * x)
                    .sum::<f64>();
        }

        // Shift by the max logit so exp() cannot overflow
        let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exps = logits.map(|z| (z - max).exp());
        let total: f64 = exps.iter().sum();

        let mut probs = ClassProbabilities::new(0.0, 0.0, 0.0);
        for (level, e) in self.classes.iter().zip(exps) {
            let p = e / total;
            match level {
                RiskLevel::Low => probs.low = p,
                RiskLevel::Medium => probs.medium = p,
                RiskLevel::High => probs.high = p,
            }
        }
        Ok(probs)
    }
}

fn corrupt(message: String) -> ClassifierError {
    ClassifierError::ArtifactCorrupt(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLASSES: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];

    fn sleep_driven() -> LogisticRegressionModel {
        // More sleep favours Low, more screen favours High
        LogisticRegressionModel::new(
            CLASSES,
            &[
                vec![0.0, 1.0, 0.0, -0.5, 0.0],
                vec![0.0, 0.0, 0.0, 0.0, 0.0],
                vec![0.0, -1.0, 0.0, 0.5, 0.0],
            ],
            &[-6.0, 0.0, 6.0],
        )
        .unwrap()
    }

    #[test]
    fn test_zero_model_is_uniform() {
        let model = LogisticRegressionModel::new(
            CLASSES,
            &[vec![0.0; 5], vec![0.0; 5], vec![0.0; 5]],
            &[0.0, 0.0, 0.0],
        )
        .unwrap();
        let probs = model.predict_proba(&FeatureVector([1.0; 5])).unwrap();
        assert!((probs.low - 1.0 / 3.0).abs() < 1e-12);
        assert!((probs.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_softmax_direction() {
        let model = sleep_driven();
        let rested = model
            .predict_proba(&FeatureVector([5.0, 9.0, 1.0, 2.0, 6.0]))
            .unwrap();
        assert_eq!(rested.most_likely(), RiskLevel::Low);

        let tired = model
            .predict_proba(&FeatureVector([5.0, 4.5, 1.0, 10.0, 6.0]))
            .unwrap();
        assert_eq!(tired.most_likely(), RiskLevel::High);
        assert!((tired.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_large_logits_do_not_overflow() {
        let model = LogisticRegressionModel::new(
            CLASSES,
            &[vec![1000.0, 0.0, 0.0, 0.0, 0.0], vec![0.0; 5], vec![0.0; 5]],
            &[0.0, 0.0, 0.0],
        )
        .unwrap();
        let probs = model.predict_proba(&FeatureVector([20.0, 0.0, 0.0, 0.0, 0.0])).unwrap();
        assert!(probs.low.is_finite());
        assert!((probs.low - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_bad_shapes() {
        let two_rows = [vec![0.0; 5], vec![0.0; 5]];
        assert!(LogisticRegressionModel::new(CLASSES, &two_rows, &[0.0; 3]).is_err());

        let short_row = [vec![0.0; 5], vec![0.0; 4], vec![0.0; 5]];
        assert!(LogisticRegressionModel::new(CLASSES, &short_row, &[0.0; 3]).is_err());

        let full = [vec![0.0; 5], vec![0.0; 5], vec![0.0; 5]];
        assert!(LogisticRegressionModel::new(CLASSES, &full, &[0.0; 2]).is_err());
        assert!(LogisticRegressionModel::new(
            CLASSES,
            &[vec![f64::INFINITY, 0.0, 0.0, 0.0, 0.0], vec![0.0; 5], vec![0.0; 5]],
            &[0.0; 3]
        )
        .is_err());
    }
}
