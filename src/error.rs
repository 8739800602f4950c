//! Error types for the LearnSmart engine

use thiserror::Error;

use crate::classifier::ClassifierError;
use crate::schema::ValidationError;

/// Errors that can occur during computation
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    #[error("Classifier unavailable: {0}")]
    ClassifierUnavailable(#[from] ClassifierError),

    #[error("Failed to parse submission: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("History error: {0}")]
    HistoryError(String),
}
