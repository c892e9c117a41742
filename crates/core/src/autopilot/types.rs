//! Types for the autopilot.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::checkpoint::CheckpointError;
use crate::generator::GenerationError;
use crate::library::LibraryError;
use crate::topics::TopicError;

/// Errors that end an autopilot run.
#[derive(Debug, Error)]
pub enum AutopilotError {
    #[error("autopilot is already running")]
    AlreadyRunning,

    #[error("library error: {0}")]
    Library(#[from] LibraryError),

    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("topic catalog error: {0}")]
    Topics(#[from] TopicError),

    /// Fatal provider error other than quota exhaustion (bad credentials,
    /// nothing configured).
    #[error("provider error: {0}")]
    Provider(GenerationError),
}

/// Lifecycle of the scheduler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutopilotState {
    #[default]
    Idle,
    Running,
    Stopped,
    Completed,
}

/// How a run ended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every backlog topic was processed.
    #[default]
    Completed,
    /// A stop request was honoured.
    Stopped,
    /// Provider quota ran out. Progress is intact; rerun later.
    Halted { reason: String },
}

/// Summary returned by a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutopilotReport {
    pub outcome: RunOutcome,
    pub images_created: u64,
    pub topics_completed: u64,
    pub topics_processed: u64,
    pub rounds: u64,
    pub empty_rounds: u64,
}

/// Persisted autopilot progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutopilotProgress {
    /// Topics that reached the target. Never revisited, even if assets are
    /// later deleted.
    #[serde(default)]
    pub completed_topics: BTreeSet<String>,
    #[serde(default)]
    pub last_run: Option<DateTime<Utc>>,
}

/// Live view of the scheduler for polling.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutopilotStatus {
    pub state: AutopilotState,
    pub stop_requested: bool,
    pub current_topic: Option<String>,
    pub current_count: u64,
    pub target_per_topic: u64,
    pub backlog_size: usize,
    pub topics_processed: u64,
    pub images_created: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub last_report: Option<AutopilotReport>,
    pub last_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_serialization() {
        let halted = RunOutcome::Halted {
            reason: "budget".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&halted).unwrap(),
            r#"{"kind":"halted","reason":"budget"}"#
        );
        assert_eq!(
            serde_json::to_string(&RunOutcome::Completed).unwrap(),
            r#"{"kind":"completed"}"#
        );
    }

    #[test]
    fn test_status_default() {
        let status = AutopilotStatus::default();
        assert_eq!(status.state, AutopilotState::Idle);
        assert!(status.current_topic.is_none());
    }

    #[test]
    fn test_progress_tolerates_missing_fields() {
        let progress: AutopilotProgress = serde_json::from_str("{}").unwrap();
        assert!(progress.completed_topics.is_empty());
        assert!(progress.last_run.is_none());
    }
}
