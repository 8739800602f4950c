//! Daily metrics submission
//!
//! A submission arrives from a form or an API client, so numeric fields may be
//! JSON numbers or numeric strings and any field may be missing.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{DailyMetrics, MoodLevel};

/// Smallest accepted value for an hours field
pub const MIN_HOURS: f64 = 0.0;

/// Largest accepted value for an hours field
pub const MAX_HOURS: f64 = 24.0;

/// Date format used by submissions and records
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Raw field value as received from the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Number(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl FieldValue {
    fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Other(v) => v.is_null(),
            FieldValue::Number(_) => false,
        }
    }

    fn describe(&self) -> String {
        match self {
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Text(s) => s.clone(),
            FieldValue::Other(v) => v.to_string(),
        }
    }
}

/// One day's submission before validation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSubmission {
    /// Owner of the record; required only when a record is produced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Calendar date (YYYY-MM-DD); required only when a record is produced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_date: Option<String>,
    #[serde(default)]
    pub study_hours: Option<FieldValue>,
    #[serde(default)]
    pub sleep_hours: Option<FieldValue>,
    #[serde(default)]
    pub break_time: Option<FieldValue>,
    #[serde(default)]
    pub screen_time: Option<FieldValue>,
    #[serde(default)]
    pub mood_level: Option<FieldValue>,
}

/// A validated submission bound to its natural key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyEntry {
    pub user_id: String,
    pub study_date: NaiveDate,
    pub metrics: DailyMetrics,
}

impl MetricsSubmission {
    /// Build a submission from already-typed values
    pub fn from_metrics(metrics: &DailyMetrics) -> Self {
        Self {
            user_id: None,
            study_date: None,
            study_hours: Some(metrics.study_hours.into()),
            sleep_hours: Some(metrics.sleep_hours.into()),
            break_time: Some(metrics.break_time.into()),
            screen_time: Some(metrics.screen_time.into()),
            mood_level: Some(metrics.mood_level.as_str().into()),
        }
    }

    pub fn with_key(mut self, user_id: impl Into<String>, study_date: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self.study_date = Some(study_date.into());
        self
    }

    /// Validate the metric fields
    pub fn validate_metrics(&self) -> Result<DailyMetrics, ValidationError> {
        let study_hours = parse_hours("study_hours", self.study_hours.as_ref())?;
        let sleep_hours = parse_hours("sleep_hours", self.sleep_hours.as_ref())?;
        let break_time = parse_hours("break_time", self.break_time.as_ref())?;
        let screen_time = parse_hours("screen_time", self.screen_time.as_ref())?;
        let mood_level = parse_mood(self.mood_level.as_ref())?;

        Ok(DailyMetrics {
            study_hours,
            sleep_hours,
            break_time,
            screen_time,
            mood_level,
        })
    }

    /// Validate metrics plus the `(user_id, study_date)` key
    pub fn validate_entry(&self) -> Result<DailyEntry, ValidationError> {
        let user_id = match self.user_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => return Err(ValidationError::MissingField("user_id")),
        };

        let study_date = match self.study_date.as_deref().map(str::trim) {
            Some(date) if !date.is_empty() => NaiveDate::parse_from_str(date, DATE_FORMAT)
                .map_err(|_| ValidationError::InvalidDate(date.to_string()))?,
            _ => return Err(ValidationError::MissingField("study_date")),
        };

        let metrics = self.validate_metrics()?;

        Ok(DailyEntry {
            user_id,
            study_date,
            metrics,
        })
    }
}

/// Check already-typed metrics against the accepted ranges
pub fn validate_metrics(metrics: &DailyMetrics) -> Result<(), ValidationError> {
    check_hours("study_hours", metrics.study_hours)?;
    check_hours("sleep_hours", metrics.sleep_hours)?;
    check_hours("break_time", metrics.break_time)?;
    check_hours("screen_time", metrics.screen_time)?;
    Ok(())
}

fn parse_hours(field: &'static str, value: Option<&FieldValue>) -> Result<f64, ValidationError> {
    let value = match value {
        Some(v) if !v.is_blank() => v,
        _ => return Err(ValidationError::MissingField(field)),
    };

    let hours = match value {
        FieldValue::Number(n) => *n,
        FieldValue::Text(s) => s.trim().parse::<f64>().map_err(|_| ValidationError::NonNumeric {
            field,
            value: s.clone(),
        })?,
        FieldValue::Other(_) => {
            return Err(ValidationError::NonNumeric {
                field,
                value: value.describe(),
            })
        }
    };

    check_hours(field, hours)?;
    Ok(hours)
}

fn check_hours(field: &'static str, hours: f64) -> Result<(), ValidationError> {
    if !hours.is_finite() {
        return Err(ValidationError::NonFinite { field });
    }
    if !(MIN_HOURS..=MAX_HOURS).contains(&hours) {
        return Err(ValidationError::OutOfRange {
            field,
            value: hours,
            min: MIN_HOURS,
            max: MAX_HOURS,
        });
    }
    Ok(())
}

fn parse_mood(value: Option<&FieldValue>) -> Result<MoodLevel, ValidationError> {
    match value {
        Some(v) if !v.is_blank() => match v {
            FieldValue::Text(label) => MoodLevel::parse(label.trim())
                .ok_or_else(|| ValidationError::InvalidMood(label.clone())),
            other => Err(ValidationError::InvalidMood(other.describe())),
        },
        _ => Err(ValidationError::MissingField("mood_level")),
    }
}

/// Validation errors for submissions
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Field {field} is not a number: {value}")]
    NonNumeric { field: &'static str, value: String },

    #[error("Field {field} must be a finite number")]
    NonFinite { field: &'static str },

    #[error("Field {field} must be between {min} and {max} hours, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid mood level: {0} (expected Low, Medium or High)")]
    InvalidMood(String),

    #[error("Invalid study date: {0} (expected YYYY-MM-DD)")]
    InvalidDate(String),
}
