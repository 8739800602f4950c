//! Pipeline orchestration
//!
//! This module provides the public API for the LearnSmart engine.
//! It runs validated metrics through the scorer, the burnout risk engine and
//! the suggestion engine, and records the result per student and date.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::classifier::{BurnoutClassifier, LazyArtifactClassifier};
use crate::config::EngineConfig;
use crate::encoder::{check_record, ReportEncoder};
use crate::error::ComputeError;
use crate::history::{
    sleep_vs_productivity, weekly_study_hours, InMemoryRecordStore, RecordStore,
    SleepVsProductivity, WeeklyStudyHours,
};
use crate::risk::BurnoutRiskEngine;
use crate::schema::{validate_metrics, MetricsSubmission, SubmissionAdapter};
use crate::scorer::ProductivityScorer;
use crate::suggestions::SuggestionEngine;
use crate::types::{BurnoutAssessment, DailyMetrics, DailyRecord, ScoreBreakdown, Suggestion};

/// Score, risk and suggestions for one day of metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAnalysis {
    pub metrics: DailyMetrics,
    pub score: ScoreBreakdown,
    pub assessment: BurnoutAssessment,
    pub suggestions: Vec<Suggestion>,
}

/// The three engines wired together
#[derive(Debug, Clone, Default)]
pub struct LearnSmartEngine {
    scorer: ProductivityScorer,
    risk: BurnoutRiskEngine,
    suggestions: SuggestionEngine,
}

impl LearnSmartEngine {
    /// Rules-only engine; `config.classifier` is ignored
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            scorer: ProductivityScorer::new(config.scoring),
            risk: BurnoutRiskEngine::new(config.risk).with_inference_budget(Duration::from_millis(
                config.classifier.inference_budget_ms,
            )),
            suggestions: SuggestionEngine::new(config.suggestions),
        }
    }

    /// Engine with the classifier described by `config.classifier`, loaded on first use
    pub fn from_config(config: &EngineConfig) -> Self {
        let engine = Self::new(config);
        match &config.classifier.model_path {
            Some(path) => {
                debug!("Classifier artifact configured at {:?}", path);
                engine.with_classifier(Arc::new(LazyArtifactClassifier::new(path.clone())))
            }
            None => engine,
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn BurnoutClassifier>) -> Self {
        self.risk = self.risk.with_classifier(classifier);
        self
    }

    pub fn scorer(&self) -> &ProductivityScorer {
        &self.scorer
    }

    pub fn risk_engine(&self) -> &BurnoutRiskEngine {
        &self.risk
    }

    pub fn suggestion_engine(&self) -> &SuggestionEngine {
        &self.suggestions
    }

    /// Analyze already-typed metrics, rejecting out-of-range values
    pub fn analyze(&self, metrics: &DailyMetrics) -> Result<DailyAnalysis, ComputeError> {
        validate_metrics(metrics)?;

        let score = self.scorer.score(metrics);
        let assessment = self.risk.assess(metrics);
        let suggestions = self
            .suggestions
            .suggest(metrics, Some(&score), Some(assessment.risk_level));

        Ok(DailyAnalysis {
            metrics: *metrics,
            score,
            assessment,
            suggestions,
        })
    }
}

/// Analyze one submission JSON with the default rules-only engine.
///
/// # Arguments
/// * `raw_json` - Submission with the four hours fields and `mood_level`
///
/// # Returns
/// JSON-encoded [`DailyAnalysis`]
///
/// # Example
/// ```ignore
/// let analysis = analyze_daily_json(
///     r#"{"study_hours": 6, "sleep_hours": 8, "break_time": 2, "screen_time": 5, "mood_level": "High"}"#
///         .to_string(),
/// )?;
/// ```
pub fn analyze_daily_json(raw_json: String) -> Result<String, ComputeError> {
    let submission = SubmissionAdapter::parse_one(&raw_json)?;
    let metrics = submission.validate_metrics()?;
    let analysis = LearnSmartEngine::default().analyze(&metrics)?;
    serde_json::to_string(&analysis).map_err(ComputeError::JsonError)
}

/// Stateful processor keeping one record per student and date.
///
/// Use this when records must survive across calls, e.g. to draw the
/// dashboard series.
pub struct StudyProcessor<S: RecordStore = InMemoryRecordStore> {
    engine: LearnSmartEngine,
    store: S,
    encoder: ReportEncoder,
}

impl Default for StudyProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl StudyProcessor {
    /// Create a rules-only processor with default settings
    pub fn new() -> Self {
        Self::with_engine(LearnSmartEngine::default())
    }

    /// Create a processor from configuration, including its classifier artifact
    pub fn with_config(config: &EngineConfig) -> Self {
        Self::with_engine(LearnSmartEngine::from_config(config))
    }

    pub fn with_engine(engine: LearnSmartEngine) -> Self {
        Self::with_store(engine, InMemoryRecordStore::new())
    }

    /// Load history from JSON
    pub fn load_history(&mut self, json: &str) -> Result<(), ComputeError> {
        self.store = InMemoryRecordStore::from_json(json)?;
        info!("Loaded {} daily records", self.store.len());
        Ok(())
    }

    /// Save history to JSON
    pub fn save_history(&self) -> Result<String, ComputeError> {
        self.store.to_json()
    }
}

impl<S: RecordStore> StudyProcessor<S> {
    /// Create a processor over an existing record store
    pub fn with_store(engine: LearnSmartEngine, store: S) -> Self {
        Self {
            engine,
            store,
            encoder: ReportEncoder::new(),
        }
    }

    pub fn engine(&self) -> &LearnSmartEngine {
        &self.engine
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Process one keyed submission JSON, store the record and return the report JSON
    pub fn process(&mut self, raw_json: &str) -> Result<String, ComputeError> {
        let submission = SubmissionAdapter::parse_one(raw_json)?;
        let record = self.build_record(&submission)?;
        let report = self.encoder.encode_to_json(&record)?;
        self.store_record(record)?;
        Ok(report)
    }

    /// Process NDJSON submissions in order; a later line for the same date replaces an earlier one.
    ///
    /// Every line is analyzed and encoded before any record is stored, so a
    /// failing line leaves the store untouched.
    pub fn process_ndjson(&mut self, ndjson: &str) -> Result<Vec<String>, ComputeError> {
        let submissions = SubmissionAdapter::parse_ndjson(ndjson)?;
        let records = self.build_records(&submissions)?;

        let reports = records
            .iter()
            .map(|record| self.encoder.encode_to_json(record))
            .collect::<Result<Vec<_>, _>>()?;

        for record in records {
            self.store_record(record)?;
        }
        Ok(reports)
    }

    /// Validate, analyze and store a submission
    pub fn record_submission(
        &mut self,
        submission: &MetricsSubmission,
    ) -> Result<DailyRecord, ComputeError> {
        let record = self.build_record(submission)?;
        self.store_record(record.clone())?;
        Ok(record)
    }

    /// Validate and analyze a batch, storing it only when every submission succeeds
    pub fn record_batch(
        &mut self,
        submissions: &[MetricsSubmission],
    ) -> Result<Vec<DailyRecord>, ComputeError> {
        let records = self.build_records(submissions)?;
        for record in &records {
            self.store_record(record.clone())?;
        }
        Ok(records)
    }

    fn build_records(
        &self,
        submissions: &[MetricsSubmission],
    ) -> Result<Vec<DailyRecord>, ComputeError> {
        submissions
            .iter()
            .map(|submission| self.build_record(submission))
            .collect()
    }

    /// Analyze a submission into a record that satisfies the report bounds
    fn build_record(&self, submission: &MetricsSubmission) -> Result<DailyRecord, ComputeError> {
        let entry = submission.validate_entry()?;
        let analysis = self.engine.analyze(&entry.metrics)?;

        let record = DailyRecord {
            user_id: entry.user_id,
            study_date: entry.study_date,
            metrics: analysis.metrics,
            score: analysis.score,
            assessment: analysis.assessment,
            suggestions: analysis.suggestions,
            computed_at_utc: Utc::now(),
        };
        check_record(&record)?;
        Ok(record)
    }

    fn store_record(&mut self, record: DailyRecord) -> Result<(), ComputeError> {
        let (user_id, study_date) = (record.user_id.clone(), record.study_date);
        if self.store.upsert(record)?.is_some() {
            debug!("Replaced record for {} on {}", user_id, study_date);
        }
        Ok(())
    }

    pub fn latest(&self, user_id: &str) -> Result<Option<DailyRecord>, ComputeError> {
        self.store.latest(user_id)
    }

    pub fn weekly_study_hours(&self, user_id: &str) -> Result<WeeklyStudyHours, ComputeError> {
        weekly_study_hours(&self.store, user_id)
    }

    pub fn sleep_vs_productivity(
        &self,
        user_id: &str,
    ) -> Result<SleepVsProductivity, ComputeError> {
        sleep_vs_productivity(&self.store, user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ClassifierError, FeatureVector};
    use crate::types::{ClassProbabilities, DecisionSource, ModelStatus, RiskLevel};
    use std::io::Write;

    fn sample_submission(user: &str, date: &str, sleep: f64) -> String {
        format!(
            r#"{{"user_id": "{user}", "study_date": "{date}", "study_hours": 6, "sleep_hours": {sleep}, "break_time": 2, "screen_time": 5, "mood_level": "High"}}"#
        )
    }

    struct AlwaysHigh;

    impl BurnoutClassifier for AlwaysHigh {
        fn predict_proba(&self, _: &FeatureVector) -> Result<ClassProbabilities, ClassifierError> {
            Ok(ClassProbabilities::new(0.05, 0.05, 0.9))
        }
    }

    #[test]
    fn test_analyze_daily_json() {
        let output = analyze_daily_json(
            r#"{"study_hours": "6", "sleep_hours": 8, "break_time": 2, "screen_time": 5, "mood_level": "High"}"#
                .to_string(),
        )
        .unwrap();

        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["score"]["total_score"], 96.7);
        assert_eq!(value["assessment"]["risk_level"], "Low");
        assert_eq!(value["assessment"]["confidence"], 80.0);
        assert_eq!(value["suggestions"][0]["title"], "Great Study Habits!");
    }

    #[test]
    fn test_invalid_input_is_rejected_before_computation() {
        let result = analyze_daily_json(
            r#"{"study_hours": 6, "sleep_hours": 25, "break_time": 2, "screen_time": 5, "mood_level": "High"}"#
                .to_string(),
        );
        assert!(matches!(result, Err(ComputeError::InvalidInput(_))));

        let result = analyze_daily_json("not valid json".to_string());
        assert!(matches!(result, Err(ComputeError::JsonError(_))));
    }

    #[test]
    fn test_analyze_rejects_non_finite_metrics() {
        let metrics = DailyMetrics::new(f64::NAN, 8.0, 2.0, 5.0, crate::types::MoodLevel::Low);
        assert!(LearnSmartEngine::default().analyze(&metrics).is_err());
    }

    #[test]
    fn test_processor_upserts_by_date() {
        let mut processor = StudyProcessor::new();
        processor.process(&sample_submission("s1", "2024-03-01", 8.0)).unwrap();
        processor.process(&sample_submission("s1", "2024-03-01", 3.0)).unwrap();
        processor.process(&sample_submission("s1", "2024-03-02", 8.0)).unwrap();

        assert_eq!(processor.store().len(), 2);
        let first = processor
            .store()
            .get("s1", chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(first.metrics.sleep_hours, 3.0);
        assert_eq!(first.assessment.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_processor_requires_key() {
        let mut processor = StudyProcessor::new();
        let result = processor.process(
            r#"{"study_hours": 6, "sleep_hours": 8, "break_time": 2, "screen_time": 5, "mood_level": "High"}"#,
        );
        assert!(matches!(result, Err(ComputeError::InvalidInput(_))));
        assert!(processor.store().is_empty());
    }

    #[test]
    fn test_processor_report_payload() {
        let mut processor = StudyProcessor::new();
        let report = processor.process(&sample_submission("s1", "2024-03-01", 8.0)).unwrap();

        let value: serde_json::Value = serde_json::from_str(&report).unwrap();
        assert_eq!(value["engine"]["name"], crate::PRODUCER_NAME);
        assert_eq!(value["record"]["user_id"], "s1");
        assert_eq!(value["record"]["assessment"]["model_status"], "not_available");
    }

    #[test]
    fn test_process_ndjson_and_series() {
        let ndjson = (1..=9)
            .map(|d| sample_submission("s1", &format!("2024-03-0{d}"), 7.0 + (d % 2) as f64))
            .collect::<Vec<_>>()
            .join("\n");

        let mut processor = StudyProcessor::new();
        let reports = processor.process_ndjson(&ndjson).unwrap();
        assert_eq!(reports.len(), 9);

        let weekly = processor.weekly_study_hours("s1").unwrap();
        assert_eq!(weekly.dates.len(), 7);
        assert_eq!(weekly.dates[0].to_string(), "2024-03-03");

        let sleep = processor.sleep_vs_productivity("s1").unwrap();
        assert_eq!(sleep.dates.len(), 9);
        assert_eq!(sleep.sleep_hours[0], 8.0);
    }

    #[test]
    fn test_failing_ndjson_line_stores_nothing() {
        let bad = r#"{"user_id": "s1", "study_date": "2024-03-02", "study_hours": 30, "sleep_hours": 8, "break_time": 2, "screen_time": 5, "mood_level": "High"}"#;
        let ndjson = format!("{}\n{}", sample_submission("s1", "2024-03-01", 8.0), bad);

        let mut processor = StudyProcessor::new();
        let result = processor.process_ndjson(&ndjson);
        assert!(matches!(result, Err(ComputeError::InvalidInput(_))));
        assert_eq!(processor.store().len(), 0);
    }

    #[test]
    fn test_record_batch_is_all_or_nothing() {
        let good =
            SubmissionAdapter::parse_one(&sample_submission("s1", "2024-03-01", 8.0)).unwrap();
        let unkeyed = SubmissionAdapter::parse_one(
            r#"{"study_hours": 6, "sleep_hours": 8, "break_time": 2, "screen_time": 5, "mood_level": "High"}"#,
        )
        .unwrap();

        let mut processor = StudyProcessor::new();
        assert!(processor.record_batch(&[good.clone(), unkeyed]).is_err());
        assert!(processor.store().is_empty());

        let records = processor.record_batch(&[good]).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(processor.store().len(), 1);
    }

    #[test]
    fn test_out_of_bounds_record_is_not_stored() {
        // Unvalidated config: weights sum past 100
        let mut config = EngineConfig::default();
        config.scoring.study.weight = 60.0;
        let mut processor = StudyProcessor::with_engine(LearnSmartEngine::new(&config));

        let result = processor.process(&sample_submission("s1", "2024-03-01", 8.0));
        assert!(matches!(result, Err(ComputeError::EncodingError(_))));
        assert!(processor.store().is_empty());
    }

    #[test]
    fn test_history_save_and_load() {
        let mut processor = StudyProcessor::new();
        processor.process(&sample_submission("s1", "2024-03-01", 8.0)).unwrap();
        processor.process(&sample_submission("s2", "2024-03-01", 6.0)).unwrap();

        let saved = processor.save_history().unwrap();

        let mut restored = StudyProcessor::new();
        restored.load_history(&saved).unwrap();
        assert_eq!(restored.store().len(), 2);
        assert_eq!(
            restored.latest("s2").unwrap().map(|r| r.metrics.sleep_hours),
            Some(6.0)
        );
    }

    #[test]
    fn test_injected_classifier_decides_borderline_cases() {
        let engine = LearnSmartEngine::default().with_classifier(Arc::new(AlwaysHigh));
        let metrics = DailyMetrics::new(8.0, 6.0, 1.0, 5.0, crate::types::MoodLevel::Medium);
        let analysis = engine.analyze(&metrics).unwrap();

        assert_eq!(analysis.assessment.risk_level, RiskLevel::High);
        assert_eq!(analysis.assessment.decision_source, DecisionSource::Model);
        assert_eq!(analysis.assessment.confidence, 90.0);
        assert!(analysis
            .suggestions
            .iter()
            .any(|s| s.title == "High Burnout Risk Detected"));
    }

    #[test]
    fn test_from_config_with_missing_artifact_degrades() {
        let mut config = EngineConfig::default();
        config.classifier.model_path = Some("/nonexistent/model.json".into());

        let engine = LearnSmartEngine::from_config(&config);
        let metrics = DailyMetrics::new(8.0, 6.0, 1.0, 5.0, crate::types::MoodLevel::Medium);
        let analysis = engine.analyze(&metrics).unwrap();
        assert_eq!(analysis.assessment.model_status, ModelStatus::NotAvailable);
        assert_eq!(analysis.assessment.risk_level, RiskLevel::Medium);
        assert_eq!(analysis.assessment.confidence, 70.0);
    }

    #[test]
    fn test_from_config_loads_artifact() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"format_version": 1, "kind": "decision_tree", "classes": ["Low", "Medium", "High"], "nodes": [{{"value": [1, 8, 1]}}]}}"#
        )
        .unwrap();

        let mut config = EngineConfig::default();
        config.classifier.model_path = Some(file.path().to_path_buf());

        let engine = LearnSmartEngine::from_config(&config);
        let metrics = DailyMetrics::new(8.0, 6.0, 1.0, 5.0, crate::types::MoodLevel::Medium);
        let analysis = engine.analyze(&metrics).unwrap();
        assert_eq!(analysis.assessment.model_status, ModelStatus::Available);
        assert_eq!(analysis.assessment.risk_level, RiskLevel::Medium);
        assert_eq!(analysis.assessment.confidence, 80.0);
    }
}
