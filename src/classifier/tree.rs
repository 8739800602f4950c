//! Decision tree classifier
//!
//! Nodes are stored as a flat array. Node 0 is the root and every child index
//! points strictly forward, which rules out cycles and bounds traversal by the
//! node count.

use serde::{Deserialize, Serialize};

use super::{normalize_weights, ClassifierError};
use crate::types::{ClassProbabilities, FeatureVector, RiskLevel, FEATURE_COUNT};

/// A node of a serialized decision tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Go to `left` when `features[feature] <= threshold`, else to `right`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Per-class weights in the artifact's class order
    Leaf { value: Vec<f64> },
}

/// Validated decision tree
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTreeModel {
    classes: [RiskLevel; 3],
    nodes: Vec<TreeNode>,
}

impl DecisionTreeModel {
    pub fn new(classes: [RiskLevel; 3], nodes: Vec<TreeNode>) -> Result<Self, ClassifierError> {
        validate_nodes(&nodes, classes.len())?;
        Ok(Self { classes, nodes })
    }

    pub fn classes(&self) -> &[RiskLevel; 3] {
        &self.classes
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn predict_proba(

        &self,

        features: &FeatureVector,

    ) -> Result<ClassProbabilities, ClassifierError> {
        if features.as_slice().iter().any(|x| !x.is_finite()) {
            return Err(ClassifierError::Inference("features must be finite".to_string()));
        }

        let mut index = 0;
        loop {
            match self.nodes.get(index) {
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let x = features.get(*feature).ok_or_else(|| {
                        ClassifierError::Inference(format!("feature index {feature} out of range"))
                    })?;
                    index = if x <= *threshold { *left } else { *right };
                }
                Some(TreeNode::Leaf { value }) => return normalize_weights(&self.classes, value),
                None => {
                    return Err(ClassifierError::Inference(format!(
                        "node index {index} out of range"
                    )))
                }
            }
        }
    }
}

fn validate_nodes(nodes: &[TreeNode], class_count: usize) -> Result<(), ClassifierError> {
    if nodes.is_empty() {
        return Err(corrupt("decision tree has no nodes".to_string()));
    }

    for (index, node) in nodes.iter().enumerate() {
        match node {
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if *feature >= FEATURE_COUNT {
                    return Err(corrupt(format!(
                        "node {index}: feature index {feature} must be below {FEATURE_COUNT}"
                    )));
                }
                if !threshold.is_finite() {
                    return Err(corrupt(format!("node {index}: threshold must be finite")));
                }
                for child in [*left, *right] {
                    if child <= index || child >= nodes.len() {
                        return Err(corrupt(format!(
                            "node {index}: child index {child} must point forward within {} nodes",
                            nodes.len()
                        )));
                    }
                }
            }
            TreeNode::Leaf { value } => {
                if value.len() != class_count {
                    return Err(corrupt(format!(
                        "node {index}: leaf has {} weights, expected {class_count}",
                        value.len()
                    )));
                }
                if value.iter().any(|w| !w.is_finite() || *w < 0.0) {
                    return Err(corrupt(format!(
                        "node {index}: leaf weights must be finite and non-negative"
                    )));
                }
                if value.iter().sum::<f64>() <= 0.0 {
                    return Err(corrupt(format!("node {index}: leaf weights sum to zero")));
                }
            }
        }
    }

    Ok(())
}

fn corrupt(message: String) -> ClassifierError {
    ClassifierError::ArtifactCorrupt(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLASSES: [RiskLevel; 3] = [RiskLevel::High, RiskLevel::Low, RiskLevel::Medium];

    fn split(feature: usize, threshold: f64, left: usize, right: usize) -> TreeNode {
        TreeNode::Split {
            feature,
            threshold,
            left,
            right,
        }
    }

    fn leaf(value: [f64; 3]) -> TreeNode {
        TreeNode::Leaf {
            value: value.to_vec(),
        }
    }

    fn sleep_tree() -> DecisionTreeModel {
        DecisionTreeModel::new(
            CLASSES,
            vec![
                split(1, 5.5, 1, 2),
                leaf([40.0, 2.0, 8.0]),
                split(3, 8.0, 3, 4),
                leaf([1.0, 30.0, 9.0]),
                leaf([5.0, 5.0, 30.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_traversal_goes_left_on_threshold() {
        let tree = sleep_tree();

        let probs = tree
            .predict_proba(&FeatureVector([6.0, 5.5, 1.0, 9.0, 6.0]))
            .unwrap();
        assert_eq!(probs.most_likely(), RiskLevel::High);
        assert!((probs.high - 0.8).abs() < 1e-12);

        let probs = tree
            .predict_proba(&FeatureVector([6.0, 6.5, 1.0, 8.0, 6.0]))
            .unwrap();
        assert_eq!(probs.most_likely(), RiskLevel::Low);

        let probs = tree
            .predict_proba(&FeatureVector([6.0, 6.5, 1.0, 8.5, 6.0]))
            .unwrap();
        assert_eq!(probs.most_likely(), RiskLevel::Medium);
        assert!((probs.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_node_json_shapes() {
        let nodes: Vec<TreeNode> = serde_json::from_str(
            r#"[{"feature": 1, "threshold": 5.5, "left": 1, "right": 2}, {"value": [1, 2, 3]}, {"value": [3, 2, 1]}]"#,
        )
        .unwrap();
        assert_eq!(nodes[0], split(1, 5.5, 1, 2));
        assert_eq!(nodes[2], leaf([3.0, 2.0, 1.0]));
    }

    #[test]
    fn test_rejects_backward_child() {
        let err = DecisionTreeModel::new(
            CLASSES,
            vec![split(0, 1.0, 1, 2), split(0, 2.0, 0, 2), leaf([1.0, 1.0, 1.0])],
        )
        .unwrap_err();
        assert!(matches!(err, ClassifierError::ArtifactCorrupt(_)));
    }

    #[test]
    fn test_rejects_bad_feature_and_leaf() {
        let bad_feature = vec![split(5, 1.0, 1, 2), leaf([1.0; 3]), leaf([1.0; 3])];
        assert!(DecisionTreeModel::new(CLASSES, bad_feature).is_err());

        let short_leaf = vec![TreeNode::Leaf {
            value: vec![1.0, 2.0],
        }];
        assert!(DecisionTreeModel::new(CLASSES, short_leaf).is_err());
        assert!(DecisionTreeModel::new(CLASSES, vec![leaf([0.0, 0.0, 0.0])]).is_err());
        assert!(DecisionTreeModel::new(CLASSES, vec![]).is_err());
    }

    #[test]
    fn test_non_finite_features_fail_inference() {
        let tree = sleep_tree();
        let err = tree
            .predict_proba(&FeatureVector([6.0, f64::NAN, 1.0, 8.0, 6.0]))
            .unwrap_err();
        assert!(matches!(err, ClassifierError::Inference(_)));
    }
}
