//! Topic catalog: built-in topics merged with user-added ones.
//!
//! Also owns the per-round image type templates and the helpers that turn
//! a topic into tags, directories, and filenames.

mod builtin;
mod tagging;
mod types;

pub use builtin::builtin_topics;
pub use tagging::*;
pub use types::*;

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::info;

use crate::checkpoint::{keys, CheckpointError, CheckpointStore, CheckpointStoreExt};

#[derive(Debug, Error)]
pub enum TopicError {
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("Invalid topic: {0}")]
    Invalid(String),

    #[error("Topic already exists: {0}")]
    Duplicate(String),

    #[error("Topic not found: {0}")]
    NotFound(String),
}

/// Merge topic lists into one prioritised list.
///
/// Stable by priority (ties keep input order, built-in before custom) and
/// de-duplicated by name, keeping the first occurrence.
pub fn merge_topics(builtin: Vec<Topic>, custom: Vec<Topic>) -> Vec<Topic> {
    let mut seen = HashSet::new();
    let mut merged: Vec<Topic> = builtin
        .into_iter()
        .chain(custom)
        .filter(|t| seen.insert(t.name.to_lowercase()))
        .collect();
    merged.sort_by_key(|t| t.priority);
    merged
}

/// Built-in plus persisted custom topics.
pub struct TopicCatalog {
    checkpoints: Arc<dyn CheckpointStore>,
}

impl TopicCatalog {
    pub fn new(checkpoints: Arc<dyn CheckpointStore>) -> Self {
        Self { checkpoints }
    }

    pub fn custom_topics(&self) -> Result<Vec<CustomTopic>, TopicError> {
        let doc: CustomTopics = self.checkpoints.load(keys::CUSTOM_TOPICS)?;
        Ok(doc.topics)
    }

    /// Every known topic, prioritised.
    pub fn all_topics(&self) -> Result<Vec<Topic>, TopicError> {
        let custom = self
            .custom_topics()?
            .into_iter()
            .map(Topic::from)
            .collect();
        Ok(merge_topics(builtin_topics(), custom))
    }

    pub fn add_custom(&self, request: NewCustomTopic) -> Result<CustomTopic, TopicError> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(TopicError::Invalid("name cannot be empty".to_string()));
        }
        let category = request.category.trim().to_string();
        if category.is_empty() {
            return Err(TopicError::Invalid("category cannot be empty".to_string()));
        }
        let priority = request.priority.unwrap_or_else(types::default_custom_priority);
        if !(1..=10).contains(&priority) {
            return Err(TopicError::Invalid(format!(
                "priority must be between 1 and 10, got {}",
                priority
            )));
        }

        let mut doc: CustomTopics = self.checkpoints.load(keys::CUSTOM_TOPICS)?;
        let lower = name.to_lowercase();
        let clashes_builtin = builtin_topics()
            .iter()
            .any(|t| t.name.to_lowercase() == lower);
        let clashes_custom = doc.topics.iter().any(|t| t.name.to_lowercase() == lower);
        if clashes_builtin || clashes_custom {
            return Err(TopicError::Duplicate(name));
        }

        let topic = CustomTopic {
            name,
            category,
            keywords: request
                .keywords
                .into_iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
            priority,
            added_at: Utc::now(),
        };
        doc.topics.push(topic.clone());
        self.checkpoints.save(keys::CUSTOM_TOPICS, &doc)?;

        info!(topic = %topic.name, category = %topic.category, priority, "Custom topic added");
        Ok(topic)
    }

    pub fn remove_custom(&self, name: &str) -> Result<CustomTopic, TopicError> {
        let mut doc: CustomTopics = self.checkpoints.load(keys::CUSTOM_TOPICS)?;
        let position = doc
            .topics
            .iter()
            .position(|t| t.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| TopicError::NotFound(name.to_string()))?;
        let removed = doc.topics.remove(position);
        self.checkpoints.save(keys::CUSTOM_TOPICS, &doc)?;

        info!(topic = %removed.name, "Custom topic removed");
        Ok(removed)
    }
}
