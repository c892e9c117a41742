//! Library API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use mirage_core::{AcquisitionError, Asset, AssetFilter, LibraryError, LibraryStats};

use super::handlers::{api_error, ApiError};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AssetListResponse {
    pub assets: Vec<Asset>,
    pub total: usize,
}

fn library_error(e: LibraryError) -> ApiError {
    match e {
        LibraryError::NotFound(id) => {
            api_error(StatusCode::NOT_FOUND, format!("Asset not found: {}", id))
        }
        other => api_error(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    }
}

/// GET /api/v1/library
///
/// List assets, optionally filtered by topic, category, or source.
pub async fn list_assets(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<AssetFilter>,
) -> Result<Json<AssetListResponse>, ApiError> {
    let assets = state.library().list(&filter).map_err(library_error)?;
    let total = assets.len();
    Ok(Json(AssetListResponse { assets, total }))
}

/// GET /api/v1/library/stats
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LibraryStats>, ApiError> {
    state.library().stats().map(Json).map_err(library_error)
}

/// GET /api/v1/library/{id}
pub async fn get_asset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Asset>, ApiError> {
    state.library().get(&id).map(Json).map_err(library_error)
}

/// DELETE /api/v1/library/{id}
///
/// Deletes the file and record. A stock asset's catalog ID is forgotten so
/// bulk acquisition never brings it back.
pub async fn remove_asset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Asset>, ApiError> {
    match mirage_core::remove_asset(state.library(), state.registry(), &id) {
        Ok(asset) => Ok(Json(asset)),
        Err(AcquisitionError::Library(e)) => Err(library_error(e)),
        Err(e) => Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}
