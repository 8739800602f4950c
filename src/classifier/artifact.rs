//! Model artifacts on disk
//!
//! An artifact is a JSON document describing a trained model. It is parsed
//! into [`ModelArtifact`], validated, and wrapped in a classifier that is
//! either loaded eagerly ([`ArtifactClassifier`]) or on first use
//! ([`LazyArtifactClassifier`]).

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

use super::{
    BurnoutClassifier, ClassifierError, DecisionTreeModel, LogisticRegressionModel, TreeNode,
};
use crate::types::{ClassProbabilities, FeatureVector, RiskLevel};

/// Artifact format version understood by this crate
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Serialized model artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    DecisionTree {
        format_version: u32,
        classes: Vec<String>,
        nodes: Vec<TreeNode>,
    },
    LogisticRegression {
        format_version: u32,
        classes: Vec<String>,
        coefficients: Vec<Vec<f64>>,
        intercepts: Vec<f64>,
    },
}

impl ModelArtifact {
    pub fn from_json(json: &str) -> Result<Self, ClassifierError> {
        serde_json::from_str(json).map_err(|e| ClassifierError::ArtifactCorrupt(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, ClassifierError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ClassifierError::ArtifactCorrupt(e.to_string()))
    }

    /// Read an artifact file. A missing file maps to `ArtifactMissing`.
    pub fn read(path: &Path) -> Result<Self, ClassifierError> {
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ClassifierError::ArtifactMissing(path.to_path_buf()),
            _ => ClassifierError::ArtifactCorrupt(format!("failed to read {:?}: {}", path, e)),
        })?;
        Self::from_json(&content)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ModelArtifact::DecisionTree { .. } => "decision_tree",
            ModelArtifact::LogisticRegression { .. } => "logistic_regression",
        }
    }

    /// Validate the artifact and build the model it describes
    pub fn into_model(self) -> Result<LoadedModel, ClassifierError> {
        match self {
            ModelArtifact::DecisionTree {
                format_version,
                classes,
                nodes,
            } => {
                check_version(format_version)?;
                let classes = parse_classes(&classes)?;
                Ok(LoadedModel::DecisionTree(DecisionTreeModel::new(classes, nodes)?))
            }
            ModelArtifact::LogisticRegression {
                format_version,
                classes,
                coefficients,
                intercepts,
            } => {
                check_version(format_version)?;
                let classes = parse_classes(&classes)?;
                Ok(LoadedModel::LogisticRegression(LogisticRegressionModel::new(
                    classes,
                    &coefficients,
                    &intercepts,
                )?))
            }
        }
    }
}

fn check_version(version: u32) -> Result<(), ClassifierError> {
    if version != ARTIFACT_FORMAT_VERSION {
        return Err(ClassifierError::ArtifactCorrupt(format!(
            "unsupported format_version {version}, expected {ARTIFACT_FORMAT_VERSION}"
        )));
    }
    Ok(())
}

/// Artifact classes must be exactly Low, Medium and High, in any order
fn parse_classes(labels: &[String]) -> Result<[RiskLevel; 3], ClassifierError> {
    let parsed: Vec<RiskLevel> = labels
        .iter()
        .map(|label| {
            RiskLevel::parse(label).ok_or_else(|| {
                ClassifierError::ArtifactCorrupt(format!("unknown class label {label:?}"))
            })
        })
        .collect::<Result<_, _>>()?;

    let classes: [RiskLevel; 3] = parsed.try_into().map_err(|v: Vec<RiskLevel>| {
        ClassifierError::ArtifactCorrupt(format!("expected 3 classes, got {}", v.len()))
    })?;

    for level in RiskLevel::ALL {
        if !classes.contains(&level) {
            return Err(ClassifierError::ArtifactCorrupt(format!(
                "class {level} missing from artifact"
            )));
        }
    }
    Ok(classes)
}

/// A validated model
#[derive(Debug, Clone, PartialEq)]
pub enum LoadedModel {
    DecisionTree(DecisionTreeModel),
    LogisticRegression(LogisticRegressionModel),
}

impl LoadedModel {
    fn predict_proba(
        &self,
        features: &FeatureVector,
    ) -> Result<ClassProbabilities, ClassifierError> {
        match self {
            LoadedModel::DecisionTree(model) => model.predict_proba(features),
            LoadedModel::LogisticRegression(model) => model.predict_proba(features),
        }
    }

    fn describe(&self) -> String {
        match self {
            LoadedModel::DecisionTree(model) => {
                format!("decision_tree ({} nodes)", model.node_count())
            }
            LoadedModel::LogisticRegression(_) => "logistic_regression".to_string(),
        }
    }
}

/// Classifier backed by an artifact loaded up front
#[derive(Debug, Clone)]
pub struct ArtifactClassifier {
    model: LoadedModel,
    source: Option<PathBuf>,
}

impl ArtifactClassifier {
    /// Load and validate an artifact file
    pub fn load(path: &Path) -> Result<Self, ClassifierError> {
        debug!("Loading classifier artifact from {:?}", path);
        let artifact = ModelArtifact::read(path)?;
        let kind = artifact.kind();
        let model = artifact.into_model()?;
        info!("Loaded {} classifier from {:?}", kind, path);
        Ok(Self {
            model,
            source: Some(path.to_path_buf()),
        })
    }

    pub fn from_json(json: &str) -> Result<Self, ClassifierError> {
        Self::from_artifact(ModelArtifact::from_json(json)?)
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, ClassifierError> {
        Ok(Self {
            model: artifact.into_model()?,
            source: None,
        })
    }

    pub fn model(&self) -> &LoadedModel {
        &self.model
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

impl BurnoutClassifier for ArtifactClassifier {
    fn predict_proba(
        &self,
        features: &FeatureVector,
    ) -> Result<ClassProbabilities, ClassifierError> {
        self.model.predict_proba(features)
    }

    fn describe(&self) -> String {
        match &self.source {
            Some(path) => format!("{} from {}", self.model.describe(), path.display()),
            None => self.model.describe(),
        }
    }
}

/// Classifier that reads its artifact on the first prediction
///
/// The load outcome is cached, including failures, so a missing artifact is
/// reported once and then answered from the cache.
#[derive(Debug)]
pub struct LazyArtifactClassifier {
    path: PathBuf,
    loaded: OnceLock<Result<ArtifactClassifier, ClassifierError>>,
}

impl LazyArtifactClassifier {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            loaded: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.loaded.get(), Some(Ok(_)))
    }

    fn get(&self) -> Result<&ArtifactClassifier, ClassifierError> {
        self.loaded
            .get_or_init(|| {
                let result = ArtifactClassifier::load(&self.path);
                if let Err(e) = &result {
                    warn!("Classifier artifact unavailable: {}", e);
                }
                result
            })
            .as_ref()
            .map_err(Clone::clone)
    }
}

impl BurnoutClassifier for LazyArtifactClassifier {
    fn predict_proba(
        &self,
        features: &FeatureVector,
    ) -> Result<ClassProbabilities, ClassifierError> {
        self.get()?.predict_proba(features)
    }

    fn describe(&self) -> String {
        match self.loaded.get() {
            Some(Ok(model)) => model.describe(),
            Some(Err(e)) => format!("unavailable ({e})"),
            None => format!("not yet loaded from {}", self.path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TREE_JSON: &str = r#"{
        "format_version": 1,
        "kind": "decision_tree",
        "classes": ["High", "Low", "Medium"],
        "nodes": [
            {"feature": 1, "threshold": 5.5, "left": 1, "right": 2},
            {"value": [40, 2, 8]},
            {"value": [2, 10, 28]}
        ]
    }"#;

    const LOGISTIC_JSON: &str = r#"{
        "format_version": 1,
        "kind": "logistic_regression",
        "classes": ["Low", "Medium", "High"],
        "coefficients": [[0, 1, 0, -0.5, 0], [0, 0, 0, 0, 0], [0, -1, 0, 0.5, 0]],
        "intercepts": [-6, 0, 6]
    }"#;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_tree_artifact() {
        let file = write_temp(TREE_JSON);
        let classifier = ArtifactClassifier::load(file.path()).unwrap();
        assert!(matches!(classifier.model(), LoadedModel::DecisionTree(_)));

        let features = FeatureVector([6.0, 5.0, 1.0, 6.0, 6.0]);
        assert_eq!(classifier.predict(&features).unwrap(), RiskLevel::High);
        let features = FeatureVector([6.0, 6.0, 1.0, 6.0, 6.0]);
        assert_eq!(classifier.predict(&features).unwrap(), RiskLevel::Medium);
    }

    #[test]
    fn test_load_logistic_artifact() {
        let classifier = ArtifactClassifier::from_json(LOGISTIC_JSON).unwrap();
        let features = FeatureVector([5.0, 9.0, 1.0, 2.0, 6.0]);
        assert_eq!(classifier.predict(&features).unwrap(), RiskLevel::Low);
        assert_eq!(classifier.describe(), "logistic_regression");
    }

    #[test]
    fn test_missing_artifact() {
        let path = Path::new("/nonexistent/burnout_tree.json");
        assert_eq!(
            ArtifactClassifier::load(path).unwrap_err(),
            ClassifierError::ArtifactMissing(path.to_path_buf())
        );
    }

    #[test]
    fn test_rejects_wrong_version_and_classes() {
        let json = TREE_JSON.replace("\"format_version\": 1", "\"format_version\": 2");
        assert!(matches!(
            ArtifactClassifier::from_json(&json),
            Err(ClassifierError::ArtifactCorrupt(_))
        ));

        let json = TREE_JSON.replace("\"Medium\"", "\"Low\"");
        assert!(matches!(
            ArtifactClassifier::from_json(&json),
            Err(ClassifierError::ArtifactCorrupt(_))
        ));

        let json = TREE_JSON.replace("\"Medium\"", "\"Severe\"");
        assert!(ArtifactClassifier::from_json(&json).is_err());
    }

    #[test]
    fn test_rejects_unknown_kind() {
        let json = TREE_JSON.replace("decision_tree", "random_forest");
        assert!(matches!(
            ModelArtifact::from_json(&json),
            Err(ClassifierError::ArtifactCorrupt(_))
        ));
    }

    #[test]
    fn test_artifact_json_round_trip() {
        let artifact = ModelArtifact::from_json(LOGISTIC_JSON).unwrap();
        let rendered = artifact.to_json().unwrap();
        assert_eq!(ModelArtifact::from_json(&rendered).unwrap(), artifact);
    }

    #[test]
    fn test_lazy_loads_on_first_use() {
        let file = write_temp(TREE_JSON);
        let classifier = LazyArtifactClassifier::new(file.path());
        assert!(!classifier.is_loaded());

        let features = FeatureVector([6.0, 5.0, 1.0, 6.0, 6.0]);
        assert_eq!(classifier.predict(&features).unwrap(), RiskLevel::High);
        assert!(classifier.is_loaded());
    }

    #[test]
    fn test_lazy_missing_artifact_is_cached_error() {
        let classifier = LazyArtifactClassifier::new("/nonexistent/model.json");
        let features = FeatureVector([6.0, 5.0, 1.0, 6.0, 6.0]);
        assert!(matches!(
            classifier.predict_proba(&features),
            Err(ClassifierError::ArtifactMissing(_))
        ));
        assert!(classifier.predict_proba(&features).is_err());
        assert!(!classifier.is_loaded());
        assert!(classifier.describe().starts_with("unavailable"));
    }

    #[test]
    fn test_bundled_artifact_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("models/burnout_tree.json");
        let classifier = ArtifactClassifier::load(&path).unwrap();
        let healthy = FeatureVector([5.0, 8.0, 2.0, 4.0, 9.0]);
        assert_eq!(classifier.predict(&healthy).unwrap(), RiskLevel::Low);
    }
}
