//! Daily record history
//!
//! One record is kept per `(user_id, study_date)`; storing a record for a
//! date that already exists replaces it. The dashboard series are derived
//! from the most recent records of a user.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ComputeError;
use crate::types::DailyRecord;

/// Records used by the weekly study hours series
pub const WEEKLY_WINDOW: usize = 7;

/// Records used by the sleep vs productivity series
pub const SLEEP_PRODUCTIVITY_WINDOW: usize = 14;

/// Persistence collaborator for daily records
pub trait RecordStore {
    /// Insert or replace the record for its `(user_id, study_date)`, returning the replaced one
    fn upsert(&mut self, record: DailyRecord) -> Result<Option<DailyRecord>, ComputeError>;

    fn get(
        &self,
        user_id: &str,
        study_date: NaiveDate,
    ) -> Result<Option<DailyRecord>, ComputeError>;

    /// Record with the latest study date for a user
    fn latest(&self, user_id: &str) -> Result<Option<DailyRecord>, ComputeError>;

    /// Up to `limit` records for a user, newest first
    fn recent(&self, user_id: &str, limit: usize) -> Result<Vec<DailyRecord>, ComputeError>;

    /// Total number of stored records
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory record store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InMemoryRecordStore {
    records: BTreeMap<String, BTreeMap<NaiveDate, DailyRecord>>,
}

/// Serialized form of the store
#[derive(Serialize, Deserialize)]
struct StoredHistory {
    records: Vec<DailyRecord>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Users with at least one record, in sorted order
    pub fn users(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Load from JSON. Later duplicates of a key replace earlier ones.
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let stored: StoredHistory = serde_json::from_str(json)
            .map_err(|e| ComputeError::HistoryError(format!("Failed to load history: {}", e)))?;
        let mut store = Self::new();
        for record in stored.records {
            store.insert(record);
        }
        Ok(store)
    }

    /// Serialize to JSON, ordered by user then date
    pub fn to_json(&self) -> Result<String, ComputeError> {
        let stored = StoredHistory {
            records: self
                .records
                .values()
                .flat_map(|days| days.values().cloned())
                .collect(),
        };
        serde_json::to_string(&stored)
            .map_err(|e| ComputeError::HistoryError(format!("Failed to save history: {}", e)))
    }

    fn insert(&mut self, record: DailyRecord) -> Option<DailyRecord> {
        self.records
            .entry(record.user_id.clone())
            .or_default()
            .insert(record.study_date, record)
    }
}

impl RecordStore for InMemoryRecordStore {
    fn upsert(&mut self, record: DailyRecord) -> Result<Option<DailyRecord>, ComputeError> {
        Ok(self.insert(record))
    }

    fn get(
        &self,
        user_id: &str,
        study_date: NaiveDate,
    ) -> Result<Option<DailyRecord>, ComputeError> {
        Ok(self
            .records
            .get(user_id)
            .and_then(|days| days.get(&study_date))
            .cloned())
    }

    fn latest(&self, user_id: &str) -> Result<Option<DailyRecord>, ComputeError> {
        Ok(self
            .records
            .get(user_id)
            .and_then(|days| days.values().next_back())
            .cloned())
    }

    fn recent(&self, user_id: &str, limit: usize) -> Result<Vec<DailyRecord>, ComputeError> {
        Ok(self
            .records
            .get(user_id)
            .map(|days| days.values().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    fn len(&self) -> usize {
        self.records.values().map(BTreeMap::len).sum()
    }
}

/// Study hours for the last week of records, oldest first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeeklyStudyHours {
    pub dates: Vec<NaiveDate>,
    pub study_hours: Vec<f64>,
}

/// Sleep hours against productivity score, oldest first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SleepVsProductivity {
    pub dates: Vec<NaiveDate>,
    pub sleep_hours: Vec<f64>,
    pub productivity_scores: Vec<f64>,
}

/// Last [`WEEKLY_WINDOW`] records of a user
pub fn weekly_study_hours<S: RecordStore + ?Sized>(
    store: &S,
    user_id: &str,
) -> Result<WeeklyStudyHours, ComputeError> {
    let mut series = WeeklyStudyHours::default();
    for record in store.recent(user_id, WEEKLY_WINDOW)?.into_iter().rev() {
        series.dates.push(record.study_date);
        series.study_hours.push(record.metrics.study_hours);
    }
    Ok(series)
}

/// Last [`SLEEP_PRODUCTIVITY_WINDOW`] records of a user
pub fn sleep_vs_productivity<S: RecordStore + ?Sized>(
    store: &S,
    user_id: &str,
) -> Result<SleepVsProductivity, ComputeError> {
    let mut series = SleepVsProductivity::default();
    for record in store.recent(user_id, SLEEP_PRODUCTIVITY_WINDOW)?.into_iter().rev() {
        series.dates.push(record.study_date);
        series.sleep_hours.push(record.metrics.sleep_hours);
        series.productivity_scores.push(record.score.total_score);
    }
    Ok(series)
}
