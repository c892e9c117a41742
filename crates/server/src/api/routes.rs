use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::{acquisition, autopilot, handlers, library, middleware::metrics_middleware, topics};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Autopilot
        .route("/autopilot", get(autopilot::get_status))
        .route("/autopilot/start", post(autopilot::start))
        .route("/autopilot/stop", post(autopilot::stop))
        .route("/autopilot/reset", post(autopilot::reset))
        // Stock acquisition
        .route("/acquisition", get(acquisition::get_status))
        .route("/acquisition/run", post(acquisition::run))
        .route("/acquisition/stop", post(acquisition::stop))
        .route("/acquisition/reset", post(acquisition::reset))
        // Library
        .route("/library", get(library::list_assets))
        .route("/library/stats", get(library::get_stats))
        .route("/library/{id}", get(library::get_asset))
        .route("/library/{id}", delete(library::remove_asset))
        // Topics
        .route("/topics", get(topics::list_topics))
        .route("/topics", post(topics::add_topic))
        .route("/topics/{name}", delete(topics::remove_topic));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
