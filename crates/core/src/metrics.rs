//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Generation (provider attempts, retries, batches)
//! - Autopilot (rounds, images created, topics completed)
//! - Stock acquisition (pages, downloads, errors)
//! - Library (assets added and removed)

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Generation Metrics
// =============================================================================

/// Provider calls by provider and outcome.
pub static GENERATION_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "mirage_generation_attempts_total",
            "Total image generation provider calls",
        ),
        // outcome: "success", "rate_limited", "quota_exhausted", "transient", "malformed", "unauthorized"
        &["provider", "outcome"],
    )
    .unwrap()
});

/// Backoff sleeps taken by the retrying invoker.
pub static GENERATION_RETRIES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "mirage_generation_retries_total",
            "Total generation retries after a failed attempt",
        ),
        &["provider"],
    )
    .unwrap()
});

/// Wall time of a single provider call.
pub static GENERATION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "mirage_generation_duration_seconds",
            "Duration of image generation provider calls",
        )
        .buckets(vec![1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 60.0, 120.0]),
        &["provider"],
    )
    .unwrap()
});

/// Images returned per dispatched batch.
pub static BATCH_YIELD: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "mirage_batch_yield",
            "Number of images returned per dispatched batch",
        )
        .buckets(vec![0.0, 1.0, 2.0, 3.0, 4.0]),
    )
    .unwrap()
});

// =============================================================================
// Autopilot Metrics
// =============================================================================

/// Autopilot rounds by result.
pub static AUTOPILOT_ROUNDS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mirage_autopilot_rounds_total", "Total autopilot rounds"),
        &["result"], // "produced", "empty"
    )
    .unwrap()
});

/// Images persisted by the autopilot.
pub static IMAGES_GENERATED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "mirage_images_generated_total",
        "Total generated images persisted to the library",
    )
    .unwrap()
});

/// Topics that reached their target.
pub static TOPICS_COMPLETED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "mirage_topics_completed_total",
        "Total topics that reached the per-topic target",
    )
    .unwrap()
});

/// Autopilot runs by outcome.
pub static AUTOPILOT_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mirage_autopilot_runs_total", "Total autopilot runs"),
        &["outcome"], // "completed", "stopped", "halted", "failed"
    )
    .unwrap()
});

// =============================================================================
// Stock Acquisition Metrics
// =============================================================================

/// Catalog pages processed by result.
pub static STOCK_PAGES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mirage_stock_pages_total", "Total stock catalog pages"),
        &["result"], // "processed", "empty", "rate_limited", "failed"
    )
    .unwrap()
});

/// Stock items downloaded.
pub static STOCK_DOWNLOADS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "mirage_stock_downloads_total",
        "Total stock images downloaded into the library",
    )
    .unwrap()
});

/// Stock items skipped because they were already acquired or forgotten.
pub static STOCK_SKIPPED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "mirage_stock_skipped_total",
        "Total stock items skipped by the dedup registry",
    )
    .unwrap()
});

/// Stock errors by stage.
pub static STOCK_ERRORS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mirage_stock_errors_total", "Total stock acquisition errors"),
        &["stage"], // "search", "resolve", "fetch", "persist"
    )
    .unwrap()
});

// =============================================================================
// Library Metrics
// =============================================================================

/// Library mutations by operation and source.
pub static LIBRARY_OPERATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "mirage_library_operations_total",
            "Total library index mutations",
        ),
        &["operation", "source"], // operation: "add", "remove"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Generation
        Box::new(GENERATION_ATTEMPTS.clone()),
        Box::new(GENERATION_RETRIES.clone()),
        Box::new(GENERATION_DURATION.clone()),
        Box::new(BATCH_YIELD.clone()),
        // Autopilot
        Box::new(AUTOPILOT_ROUNDS.clone()),
        Box::new(IMAGES_GENERATED.clone()),
        Box::new(TOPICS_COMPLETED.clone()),
        Box::new(AUTOPILOT_RUNS.clone()),
        // Stock
        Box::new(STOCK_PAGES.clone()),
        Box::new(STOCK_DOWNLOADS.clone()),
        Box::new(STOCK_SKIPPED.clone()),
        Box::new(STOCK_ERRORS.clone()),
        // Library
        Box::new(LIBRARY_OPERATIONS.clone()),
    ]
}
