//! Report encoding
//!
//! This module wraps a daily record with producer metadata into the JSON
//! report handed to callers. Records that break the output invariants are
//! rejected instead of being encoded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{MAX_CONFIDENCE, MAX_TOTAL_SCORE, MIN_CONFIDENCE};
use crate::error::ComputeError;
use crate::types::DailyRecord;
use crate::{ENGINE_VERSION, PRODUCER_NAME};

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

/// Producer metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineInfo {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Encoded daily report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    pub report_version: String,
    pub engine: EngineInfo,
    pub computed_at_utc: DateTime<Utc>,
    pub record: DailyRecord,
}

/// Encoder producing daily reports
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Encode a daily record into a report
    pub fn encode(&self, record: &DailyRecord) -> Result<DailyReport, ComputeError> {
        check_record(record)?;

        Ok(DailyReport {
            report_version: REPORT_VERSION.to_string(),
            engine: EngineInfo {
                name: PRODUCER_NAME.to_string(),
                version: ENGINE_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: record.computed_at_utc,
            record: record.clone(),
        })
    }

    /// Encode to JSON string
    pub fn encode_to_json(&self, record: &DailyRecord) -> Result<String, ComputeError> {
        let report = self.encode(record)?;
        serde_json::to_string_pretty(&report).map_err(ComputeError::JsonError)
    }
}

/// Reject records outside the score and confidence bounds
pub(crate) fn check_record(record: &DailyRecord) -> Result<(), ComputeError> {
    let score = &record.score;
    if !(0.0..=MAX_TOTAL_SCORE).contains(&score.total_score) {
        return Err(ComputeError::EncodingError(format!(
            "total_score {} outside [0, {}]",
            score.total_score, MAX_TOTAL_SCORE
        )));
    }
    for (name, value) in [
        ("study_score", score.study_score),
        ("sleep_score", score.sleep_score),
        ("break_score", score.break_score),
        ("screen_score", score.screen_score),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(ComputeError::EncodingError(format!(
                "{name} must be a non-negative number, got {value}"
            )));
        }
    }

    let confidence = record.assessment.confidence;
    if !(MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&confidence) {
        return Err(ComputeError::EncodingError(format!(
            "confidence {confidence} outside [{MIN_CONFIDENCE}, {MAX_CONFIDENCE}]"
        )));
    }

    Ok(())
}
