//! Stock acquisition API handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use mirage_core::{AcquisitionError, AcquisitionStatus};

use super::handlers::{api_error, message, ApiError, MessageResponse};
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct AcquisitionStatusResponse {
    /// Whether the stock catalog is configured
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AcquisitionStatus>,
}

/// Per-run overrides. Anything omitted comes from the server config.
#[derive(Debug, Default, Deserialize)]
pub struct RunAcquisitionRequest {
    pub max_pages: Option<u32>,
    pub per_page_limit: Option<u32>,
    pub item_delay_ms: Option<u64>,
}

fn unavailable() -> ApiError {
    api_error(
        StatusCode::SERVICE_UNAVAILABLE,
        "Stock acquisition not available. Configure the [stock] section.",
    )
}

fn internal(e: AcquisitionError) -> ApiError {
    api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/acquisition
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AcquisitionStatusResponse>, ApiError> {
    let Some(queue) = state.acquisition() else {
        return Ok(Json(AcquisitionStatusResponse {
            available: false,
            status: None,
        }));
    };
    let status = queue.status().await.map_err(internal)?;
    Ok(Json(AcquisitionStatusResponse {
        available: true,
        status: Some(status),
    }))
}

/// POST /api/v1/acquisition/run
///
/// Starts a bulk run in the background from the persisted cursor.
pub async fn run(
    State(state): State<Arc<AppState>>,
    body: Option<Json<RunAcquisitionRequest>>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let queue = state.acquisition().ok_or_else(unavailable)?;
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let config = queue.config();

    let max_pages = request.max_pages.unwrap_or(config.max_pages);
    let per_page_limit = request.per_page_limit.unwrap_or(config.per_page_limit);
    let item_delay = Duration::from_millis(request.item_delay_ms.unwrap_or(config.item_delay_ms));
    if max_pages == 0 {
        return Err(api_error(StatusCode::BAD_REQUEST, "max_pages must be at least 1"));
    }
    if !(1..=100).contains(&per_page_limit) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "per_page_limit must be between 1 and 100",
        ));
    }

    match queue.spawn(max_pages, per_page_limit, item_delay) {
        Ok(_) => Ok((StatusCode::ACCEPTED, message("Bulk acquisition started"))),
        Err(AcquisitionError::AlreadyRunning) => Err(api_error(
            StatusCode::CONFLICT,
            "Bulk acquisition is already running",
        )),
        Err(e) => Err(internal(e)),
    }
}

/// POST /api/v1/acquisition/stop
///
/// The run stops at its next page boundary.
pub async fn stop(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MessageResponse>, ApiError> {
    let queue = state.acquisition().ok_or_else(unavailable)?;
    if queue.request_stop() {
        Ok(message("Bulk acquisition stop requested"))
    } else {
        Err(api_error(StatusCode::CONFLICT, "Bulk acquisition is not running"))
    }
}

/// POST /api/v1/acquisition/reset
///
/// Moves the cursor back to page 1. Handled resources stay skipped.
pub async fn reset(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MessageResponse>, ApiError> {
    let queue = state.acquisition().ok_or_else(unavailable)?;
    match queue.reset_cursor() {
        Ok(()) => Ok(message("Acquisition cursor reset")),
        Err(AcquisitionError::AlreadyRunning) => Err(api_error(
            StatusCode::CONFLICT,
            "Bulk acquisition is running",
        )),
        Err(e) => Err(internal(e)),
    }
}
