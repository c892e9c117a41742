//! Persisted checkpoint documents.
//!
//! Loop state that must survive restarts (acquisition cursor, dedup registry,
//! completed topics, custom topics) is stored as whole JSON documents keyed by
//! name. Every save rewrites the full document.

mod sqlite;

pub use sqlite::SqliteCheckpointStore;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Well-known document keys.
pub mod keys {
    pub const ACQUISITION_STATE: &str = "acquisition_state";
    pub const DEDUP_REGISTRY: &str = "dedup_registry";
    pub const AUTOPILOT_PROGRESS: &str = "autopilot_progress";
    pub const CUSTOM_TOPICS: &str = "custom_topics";
}

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Checkpoint '{key}' is corrupt: {message}")]
    Corrupt { key: String, message: String },

    #[error("Failed to serialize checkpoint '{key}': {message}")]
    Serialize { key: String, message: String },
}

/// Raw document storage.
pub trait CheckpointStore: Send + Sync {
    /// Load a document body, `None` if it was never saved.
    fn load_document(&self, key: &str) -> Result<Option<String>, CheckpointError>;

    /// Replace a document body.
    fn save_document(&self, key: &str, body: &str) -> Result<(), CheckpointError>;
}

/// Typed access to checkpoint documents.
pub trait CheckpointStoreExt {
    /// Load and decode a document, falling back to `T::default()` when absent.
    /// A document that exists but does not decode is an error.
    fn load<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T, CheckpointError>;

    fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CheckpointError>;
}

impl<S: CheckpointStore + ?Sized> CheckpointStoreExt for S {
    fn load<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T, CheckpointError> {
        match self.load_document(key)? {
            Some(body) => serde_json::from_str(&body).map_err(|e| CheckpointError::Corrupt {
                key: key.to_string(),
                message: e.to_string(),
            }),
            None => Ok(T::default()),
        }
    }

    fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CheckpointError> {
        let body = serde_json::to_string(value).map_err(|e| CheckpointError::Serialize {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.save_document(key, &body)
    }
}
