//! Parsing helpers for batches of submissions
//!
//! Batches arrive either as a JSON array or as NDJSON (one submission per line).

use crate::error::ComputeError;
use crate::schema::submission::{MetricsSubmission, ValidationError};

/// Adapter for reading submissions in bulk
pub struct SubmissionAdapter;

impl SubmissionAdapter {
    /// Parse a single submission object
    pub fn parse_one(json: &str) -> Result<MetricsSubmission, ComputeError> {
        let submission: MetricsSubmission = serde_json::from_str(json)?;
        Ok(submission)
    }

    /// Parse a JSON string containing an array of submissions
    pub fn parse_array(json: &str) -> Result<Vec<MetricsSubmission>, ComputeError> {
        let submissions: Vec<MetricsSubmission> = serde_json::from_str(json)?;
        Ok(submissions)
    }

    /// Parse NDJSON (newline-delimited JSON) containing submissions
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<MetricsSubmission>, ComputeError> {
        let mut submissions = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<MetricsSubmission>(trimmed) {
                Ok(submission) => submissions.push(submission),
                Err(e) => {
                    return Err(ComputeError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(submissions)
    }

    /// Validate each submission (metrics and key) and collect the failures
    pub fn validate_all(submissions: &[MetricsSubmission]) -> Vec<ValidationResult> {
        submissions
            .iter()
            .enumerate()
            .filter_map(|(index, submission)| {
                submission.validate_entry().err().map(|error| ValidationResult {
                    index,
                    user_id: submission.user_id.clone(),
                    study_date: submission.study_date.clone(),
                    error,
                })
            })
            .collect()
    }
}

/// A submission that failed validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Position in the batch
    pub index: usize,
    pub user_id: Option<String>,
    pub study_date: Option<String>,
    pub error: ValidationError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ndjson_skips_blank_lines() {
        let ndjson = r#"
{"user_id": "s1", "study_date": "2024-03-01", "study_hours": 6, "sleep_hours": 8, "break_time": 2, "screen_time": 5, "mood_level": "High"}

{"user_id": "s1", "study_date": "2024-03-02", "study_hours": 9, "sleep_hours": 6, "break_time": 1, "screen_time": 9, "mood_level": "Medium"}
"#;
        let submissions = SubmissionAdapter::parse_ndjson(ndjson).unwrap();
        assert_eq!(submissions.len(), 2);
        assert_eq!(submissions[1].study_date.as_deref(), Some("2024-03-02"));
    }

    #[test]
    fn test_parse_ndjson_reports_line_number() {
        let ndjson = "{\"study_hours\": 6}\nnot json\n";
        let err = SubmissionAdapter::parse_ndjson(ndjson).unwrap_err();
        match err {
            ComputeError::ParseError(msg) => assert!(msg.contains("line 2")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_array() {
        let json = r#"[{"study_hours": 6}, {"study_hours": "7"}]"#;
        let submissions = SubmissionAdapter::parse_array(json).unwrap();
        assert_eq!(submissions.len(), 2);
    }

    #[test]
    fn test_validate_all_collects_failures() {
        let json = r#"[
            {"user_id": "s1", "study_date": "2024-03-01", "study_hours": 6, "sleep_hours": 8, "break_time": 2, "screen_time": 5, "mood_level": "High"},
            {"user_id": "s1", "study_date": "2024-03-02", "study_hours": 6, "sleep_hours": 30, "break_time": 2, "screen_time": 5, "mood_level": "High"},
            {"user_id": "s1", "study_date": "2024-03-03", "study_hours": 6, "sleep_hours": 8, "break_time": 2, "screen_time": 5, "mood_level": "Great"}
        ]"#;
        let submissions = SubmissionAdapter::parse_array(json).unwrap();
        let failures = SubmissionAdapter::validate_all(&submissions);

        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].index, 1);
        assert!(matches!(failures[0].error, ValidationError::OutOfRange { .. }));
        assert_eq!(failures[1].index, 2);
        assert!(matches!(failures[1].error, ValidationError::InvalidMood(_)));
    }
}
