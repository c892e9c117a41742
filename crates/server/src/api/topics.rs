//! Topic catalog API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

use mirage_core::autopilot::AutopilotProgress;
use mirage_core::checkpoint::keys;
use mirage_core::{CheckpointStoreExt, CustomTopic, NewCustomTopic, TopicError};

use super::handlers::{api_error, ApiError};
use crate::state::AppState;

/// A topic with its current progress.
#[derive(Debug, Serialize)]
pub struct TopicView {
    pub name: String,
    pub category: String,
    pub keywords: Vec<String>,
    pub priority: u8,
    pub custom: bool,
    /// Assets currently in the library for this topic.
    pub count: u64,
    /// In the completed set (skipped by the autopilot).
    pub completed: bool,
}

#[derive(Debug, Serialize)]
pub struct TopicListResponse {
    pub topics: Vec<TopicView>,
    pub total: usize,
}

fn topic_error(e: TopicError) -> ApiError {
    let status = match &e {
        TopicError::Invalid(_) => StatusCode::BAD_REQUEST,
        TopicError::Duplicate(_) => StatusCode::CONFLICT,
        TopicError::NotFound(_) => StatusCode::NOT_FOUND,
        TopicError::Checkpoint(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, e.to_string())
}

fn internal(e: impl ToString) -> ApiError {
    api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

/// GET /api/v1/topics
///
/// Built-in and custom topics in backlog order.
pub async fn list_topics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TopicListResponse>, ApiError> {
    let topics = state.topics().all_topics().map_err(topic_error)?;
    let custom: HashSet<String> = state
        .topics()
        .custom_topics()
        .map_err(topic_error)?
        .into_iter()
        .map(|t| t.name)
        .collect();
    let counts = state.library().count_by_topic().map_err(internal)?;
    let progress: AutopilotProgress = state
        .checkpoints()
        .load(keys::AUTOPILOT_PROGRESS)
        .map_err(internal)?;

    let topics: Vec<TopicView> = topics
        .into_iter()
        .map(|t| TopicView {
            count: counts.get(&t.name).copied().unwrap_or(0),
            completed: progress.completed_topics.contains(&t.name),
            custom: custom.contains(&t.name),
            name: t.name,
            category: t.category,
            keywords: t.keywords,
            priority: t.priority,
        })
        .collect();
    let total = topics.len();
    Ok(Json(TopicListResponse { topics, total }))
}

/// POST /api/v1/topics
pub async fn add_topic(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewCustomTopic>,
) -> Result<(StatusCode, Json<CustomTopic>), ApiError> {
    let topic = state.topics().add_custom(request).map_err(topic_error)?;
    Ok((StatusCode::CREATED, Json(topic)))
}

/// DELETE /api/v1/topics/{name}
///
/// Only custom topics can be removed.
pub async fn remove_topic(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<CustomTopic>, ApiError> {
    state
        .topics()
        .remove_custom(&name)
        .map(Json)
        .map_err(topic_error)
}
