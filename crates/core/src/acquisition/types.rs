//! Types for stock acquisition.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::checkpoint::CheckpointError;
use crate::library::LibraryError;
use crate::topics::TopicError;

/// Errors that end an acquisition run or a curation call.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("acquisition is already running")]
    AlreadyRunning,

    #[error("stock catalog rejected credentials: {0}")]
    Unauthorized(String),

    #[error("stock catalog not configured: {0}")]
    NotConfigured(String),

    #[error("library error: {0}")]
    Library(#[from] LibraryError),

    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("topic catalog error: {0}")]
    Topics(#[from] TopicError),
}

/// Persisted acquisition cursor and counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquisitionState {
    /// Set while a run is in progress. Informational only; a crash can
    /// leave it set.
    #[serde(default)]
    pub running: bool,
    /// Next catalog page to search.
    #[serde(default = "first_page")]
    pub current_page: u32,
    #[serde(default)]
    pub total_downloaded: u64,
    #[serde(default)]
    pub errors: u64,
    #[serde(default)]
    pub last_run: Option<DateTime<Utc>>,
}

fn first_page() -> u32 {
    1
}

impl Default for AcquisitionState {
    fn default() -> Self {
        Self {
            running: false,
            current_page: first_page(),
            total_downloaded: 0,
            errors: 0,
            last_run: None,
        }
    }
}

/// One successful download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRecord {
    pub id: String,
    pub topic: String,
    pub category: String,
    pub title: String,
    pub downloaded_at: DateTime<Utc>,
}

/// Catalog IDs already handled.
///
/// `acquired` and `forgotten` are disjoint. Forgotten IDs belong to assets
/// the user deleted and are never acquired again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupRegistry {
    #[serde(default)]
    pub acquired: BTreeSet<String>,
    #[serde(default)]
    pub forgotten: BTreeSet<String>,
    #[serde(default)]
    pub downloads: Vec<DownloadRecord>,
}

impl DedupRegistry {
    /// True if the ID was acquired or forgotten.
    pub fn is_known(&self, id: &str) -> bool {
        self.acquired.contains(id) || self.forgotten.contains(id)
    }

    /// Record a download. Refused (returns false) for forgotten or
    /// already-acquired IDs.
    pub fn record_acquired(&mut self, record: DownloadRecord) -> bool {
        if self.is_known(&record.id) {
            return false;
        }
        self.acquired.insert(record.id.clone());
        self.downloads.push(record);
        true
    }

    /// Move an ID to the forgotten set and drop its download record.
    /// Returns false if it was already forgotten.
    pub fn forget(&mut self, id: &str) -> bool {
        self.acquired.remove(id);
        self.downloads.retain(|d| d.id != id);
        self.forgotten.insert(id.to_string())
    }

    /// Adopt IDs another writer forgot.
    pub fn absorb_forgotten(&mut self, other: &DedupRegistry) {
        for id in &other.forgotten {
            self.forget(id);
        }
    }
}

/// How a bulk run ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkOutcome {
    /// Page budget used up or the catalog ran out of results.
    #[default]
    Completed,
    /// The catalog rate-limited a search. Resume later from `next_page`.
    RateLimited,
    /// A stop request was honoured.
    Stopped,
}

/// Summary returned by a bulk run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquisitionReport {
    pub outcome: BulkOutcome,
    pub downloaded: u64,
    pub skipped: u64,
    pub errors: u64,
    pub pages: u32,
    /// Cursor persisted at the end of the run.
    pub next_page: u32,
}

/// Live and persisted view of acquisition for polling.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AcquisitionStatus {
    pub running: bool,
    pub stop_requested: bool,
    pub state: AcquisitionState,
    pub acquired: usize,
    pub forgotten: usize,
    /// Counters for the run in progress.
    pub current: Option<AcquisitionReport>,
    pub last_report: Option<AcquisitionReport>,
    pub last_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> DownloadRecord {
        DownloadRecord {
            id: id.to_string(),
            topic: "Burj Khalifa".to_string(),
            category: "attractions".to_string(),
            title: "Burj Khalifa at dusk".to_string(),
            downloaded_at: Utc::now(),
        }
    }

    #[test]
    fn test_state_defaults_to_first_page() {
        let state: AcquisitionState = serde_json::from_str("{}").unwrap();
        assert_eq!(state.current_page, 1);
        assert_eq!(AcquisitionState::default().current_page, 1);
    }

    #[test]
    fn test_record_and_forget() {
        let mut registry = DedupRegistry::default();
        assert!(registry.record_acquired(record("1")));
        assert!(!registry.record_acquired(record("1")));
        assert!(registry.is_known("1"));
        assert_eq!(registry.downloads.len(), 1);

        assert!(registry.forget("1"));
        assert!(!registry.acquired.contains("1"));
        assert!(registry.forgotten.contains("1"));
        assert!(registry.is_known("1"));
        assert!(registry.downloads.is_empty());
    }

    #[test]
    fn test_forgotten_never_reacquired() {
        let mut registry = DedupRegistry::default();
        registry.forget("7");
        assert!(!registry.record_acquired(record("7")));
        assert!(registry.acquired.is_empty());
    }

    #[test]
    fn test_absorb_forgotten_keeps_sets_disjoint() {
        let mut live = DedupRegistry::default();
        live.record_acquired(record("1"));
        live.record_acquired(record("2"));

        let mut stored = live.clone();
        stored.forget("2");

        live.absorb_forgotten(&stored);
        assert!(live.acquired.contains("1"));
        assert!(!live.acquired.contains("2"));
        assert!(live.forgotten.contains("2"));
        assert!(live.acquired.is_disjoint(&live.forgotten));
        let ids: Vec<_> = live.downloads.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["1"]);
    }

    #[test]
    fn test_outcome_serialization() {
        assert_eq!(
            serde_json::to_string(&BulkOutcome::RateLimited).unwrap(),
            r#""rate_limited""#
        );
    }
}
