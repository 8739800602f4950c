//! LearnSmart Engine - Deterministic compute engine for student wellbeing signals
//!
//! The engine turns one day of study metrics into three artifacts through a
//! one-directional pipeline: submission validation → productivity score →
//! burnout risk decision → ranked study suggestions.
//!
//! ## Modules
//!
//! - **Scoring**: Weighted piecewise productivity score with a per-component breakdown
//! - **Risk**: Ordered burnout rules, optionally refined by a pre-trained classifier
//! - **Suggestions**: Declarative rule table producing a capped, prioritized list
//! - **History**: Per-student daily records and the dashboard series derived from them

pub mod classifier;
pub mod config;
pub mod encoder;
pub mod error;
pub mod history;
pub mod pipeline;
pub mod risk;
pub mod schema;
pub mod scorer;
pub mod suggestions;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::EngineConfig;
pub use error::ComputeError;
pub use pipeline::{analyze_daily_json, DailyAnalysis, LearnSmartEngine, StudyProcessor};
pub use risk::{BurnoutRiskEngine, Decision};
pub use scorer::ProductivityScorer;
pub use suggestions::SuggestionEngine;

// Classifier exports
pub use classifier::{
    ArtifactClassifier, BurnoutClassifier, ClassifierError, LazyArtifactClassifier, ModelArtifact,
};

// History exports
pub use history::{InMemoryRecordStore, RecordStore};

pub use types::{
    BurnoutAssessment, DailyMetrics, DailyRecord, MoodLevel, RiskLevel, ScoreBreakdown, Suggestion,
};

/// Engine version embedded in all reports
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "learnsmart-engine";
