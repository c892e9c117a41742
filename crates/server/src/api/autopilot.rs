//! Autopilot API handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use mirage_core::{AutopilotConfig, AutopilotError, AutopilotStatus};

use super::handlers::{api_error, message, ApiError, MessageResponse};
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

/// Autopilot status response
#[derive(Debug, Serialize)]
pub struct AutopilotStatusResponse {
    /// Whether the autopilot is available (an image provider is configured)
    pub available: bool,
    pub running: bool,
    /// Topics excluded from future runs
    pub completed_topics: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AutopilotStatus>,
}

/// Per-run overrides. Anything omitted comes from the server config.
#[derive(Debug, Default, Deserialize)]
pub struct StartAutopilotRequest {
    pub target_per_topic: Option<u64>,
    pub parallelism: Option<usize>,
    pub round_delay_ms: Option<u64>,
    pub max_topics: Option<usize>,
}

impl StartAutopilotRequest {
    fn apply(self, base: &AutopilotConfig) -> Result<AutopilotConfig, String> {
        let config = AutopilotConfig {
            target_per_topic: self.target_per_topic.unwrap_or(base.target_per_topic),
            parallelism: self.parallelism.unwrap_or(base.parallelism),
            round_delay_ms: self.round_delay_ms.unwrap_or(base.round_delay_ms),
            max_topics: self.max_topics.unwrap_or(base.max_topics),
            destination: base.destination.clone(),
        };
        if config.target_per_topic == 0 {
            return Err("target_per_topic must be at least 1".to_string());
        }
        if !(2..=4).contains(&config.parallelism) {
            return Err("parallelism must be between 2 and 4".to_string());
        }
        if config.max_topics == 0 {
            return Err("max_topics must be at least 1".to_string());
        }
        Ok(config)
    }
}

fn unavailable() -> ApiError {
    api_error(
        StatusCode::SERVICE_UNAVAILABLE,
        "Autopilot not available. Configure at least one image provider.",
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/autopilot
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AutopilotStatusResponse>, ApiError> {
    let Some(scheduler) = state.autopilot() else {
        return Ok(Json(AutopilotStatusResponse {
            available: false,
            running: false,
            completed_topics: 0,
            status: None,
        }));
    };

    let progress = scheduler
        .progress()
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(AutopilotStatusResponse {
        available: true,
        running: scheduler.is_running(),
        completed_topics: progress.completed_topics.len(),
        status: Some(scheduler.status().await),
    }))
}

/// POST /api/v1/autopilot/start
///
/// Starts a run in the background. The body is optional.
pub async fn start(
    State(state): State<Arc<AppState>>,
    body: Option<Json<StartAutopilotRequest>>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let scheduler = state.autopilot().ok_or_else(unavailable)?;
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let config = request
        .apply(scheduler.config())
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;

    match scheduler.spawn(config) {
        Ok(_) => Ok((StatusCode::ACCEPTED, message("Autopilot started"))),
        Err(AutopilotError::AlreadyRunning) => Err(api_error(
            StatusCode::CONFLICT,
            "Autopilot is already running",
        )),
        Err(e) => Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

/// POST /api/v1/autopilot/stop
///
/// The run stops at its next round boundary.
pub async fn stop(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MessageResponse>, ApiError> {
    let scheduler = state.autopilot().ok_or_else(unavailable)?;
    if scheduler.request_stop() {
        Ok(message("Autopilot stop requested"))
    } else {
        Err(api_error(StatusCode::CONFLICT, "Autopilot is not running"))
    }
}

/// POST /api/v1/autopilot/reset
///
/// Clears the completed-topic set so finished topics are revisited.
pub async fn reset(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MessageResponse>, ApiError> {
    let scheduler = state.autopilot().ok_or_else(unavailable)?;
    match scheduler.reset_progress() {
        Ok(()) => Ok(message("Autopilot progress reset")),
        Err(AutopilotError::AlreadyRunning) => Err(api_error(
            StatusCode::CONFLICT,
            "Autopilot is running",
        )),
        Err(e) => Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}
