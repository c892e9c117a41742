//! The bulk acquisition loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::config::AcquisitionConfig;
use super::registry::RegistryStore;
use super::types::{
    AcquisitionError, AcquisitionReport, AcquisitionState, AcquisitionStatus, BulkOutcome,
    DedupRegistry, DownloadRecord,
};
use crate::checkpoint::{keys, CheckpointStore, CheckpointStoreExt};
use crate::library::{Asset, AssetSource, LibraryIndex, NewAsset};
use crate::metrics;
use crate::stock::{StockCatalog, StockCatalogError, StockResource};
use crate::topics::{categorize, stock_dir, stock_filename, stock_tags, Topic, TopicCatalog};

/// Walks catalog pages and downloads unseen resources into the library.
///
/// Only one run may be active at a time.
pub struct AcquisitionQueue {
    config: AcquisitionConfig,
    catalog: Arc<dyn StockCatalog>,
    library: Arc<dyn LibraryIndex>,
    checkpoints: Arc<dyn CheckpointStore>,
    registry: Arc<RegistryStore>,
    topics: Arc<TopicCatalog>,
    running: AtomicBool,
    stop_requested: AtomicBool,
    finished: watch::Sender<()>,
    status: RwLock<AcquisitionStatus>,
}

impl AcquisitionQueue {
    pub fn new(
        config: AcquisitionConfig,
        catalog: Arc<dyn StockCatalog>,
        library: Arc<dyn LibraryIndex>,
        checkpoints: Arc<dyn CheckpointStore>,
        registry: Arc<RegistryStore>,
        topics: Arc<TopicCatalog>,
    ) -> Self {
        Self {
            config,
            catalog,
            library,
            checkpoints,
            registry,
            topics,
            running: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
            finished: watch::channel(()).0,
            status: RwLock::new(AcquisitionStatus::default()),
        }
    }

    pub fn config(&self) -> &AcquisitionConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Ask the active run to stop at the next page boundary.
    ///
    /// Returns false when nothing is running.
    pub fn request_stop(&self) -> bool {
        if !self.is_running() {
            return false;
        }
        info!("Acquisition stop requested");
        self.stop_requested.store(true, Ordering::SeqCst);
        true
    }

    /// Request a stop and wait until the active run has returned.
    pub async fn stop(&self) {
        let mut finished = self.finished.subscribe();
        if !self.request_stop() {
            return;
        }
        while self.is_running() {
            if finished.changed().await.is_err() {
                break;
            }
        }
    }

    /// Persisted state plus counters of the run in progress, if any.
    pub async fn status(&self) -> Result<AcquisitionStatus, AcquisitionError> {
        let mut status = self.status.read().await.clone();
        status.running = self.is_running();
        status.stop_requested = self.stop_requested.load(Ordering::SeqCst);
        status.state = self.checkpoints.load(keys::ACQUISITION_STATE)?;
        let registry = self.registry.load()?;
        status.acquired = registry.acquired.len();
        status.forgotten = registry.forgotten.len();
        Ok(status)
    }

    /// Move the cursor back to page 1. The dedup registry is kept, so
    /// already handled resources are skipped on the next pass.
    pub fn reset_cursor(&self) -> Result<(), AcquisitionError> {
        if self.is_running() {
            return Err(AcquisitionError::AlreadyRunning);
        }
        let mut state: AcquisitionState = self.checkpoints.load(keys::ACQUISITION_STATE)?;
        state.current_page = 1;
        state.running = false;
        self.checkpoints.save(keys::ACQUISITION_STATE, &state)?;
        info!("Acquisition cursor reset to page 1");
        Ok(())
    }

    /// Run with the configured page budget, page size and item delay.
    pub async fn run(&self) -> Result<AcquisitionReport, AcquisitionError> {
        let (max_pages, per_page_limit, item_delay) = self.defaults();
        self.run_bulk_acquire(max_pages, per_page_limit, item_delay)
            .await
    }

    /// Run up to `max_pages` pages starting at the persisted cursor.
    pub async fn run_bulk_acquire(
        &self,
        max_pages: u32,
        per_page_limit: u32,
        item_delay: Duration,
    ) -> Result<AcquisitionReport, AcquisitionError> {
        self.begin()?;
        self.run_claimed(max_pages, per_page_limit, item_delay)
            .await
    }

    /// Start a run on a background task. Fails immediately if a run is
    /// already active.
    pub fn spawn(
        self: &Arc<Self>,
        max_pages: u32,
        per_page_limit: u32,
        item_delay: Duration,
    ) -> Result<JoinHandle<Result<AcquisitionReport, AcquisitionError>>, AcquisitionError> {
        self.begin()?;
        let this = Arc::clone(self);
        Ok(tokio::spawn(async move {
            this.run_claimed(max_pages, per_page_limit, item_delay)
                .await
        }))
    }

    fn defaults(&self) -> (u32, u32, Duration) {
        (
            self.config.max_pages,
            self.config.per_page_limit,
            Duration::from_millis(self.config.item_delay_ms),
        )
    }

    fn begin(&self) -> Result<(), AcquisitionError> {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Acquisition already running");
            return Err(AcquisitionError::AlreadyRunning);
        }
        self.stop_requested.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn should_stop(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    async fn run_claimed(
        &self,
        max_pages: u32,
        per_page_limit: u32,
        item_delay: Duration,
    ) -> Result<AcquisitionReport, AcquisitionError> {
        info!(
            search_term = %self.config.search_term,
            max_pages,
            per_page_limit,
            "Bulk acquisition started"
        );
        self.status.write().await.current = Some(AcquisitionReport::default());

        let result = self.execute(max_pages, per_page_limit, item_delay).await;

        {
            let mut status = self.status.write().await;
            status.current = None;
            match &result {
                Ok(report) => {
                    status.last_report = Some(report.clone());
                    status.last_error = None;
                }
                Err(e) => status.last_error = Some(e.to_string()),
            }
        }

        match &result {
            Ok(report) => info!(
                outcome = ?report.outcome,
                downloaded = report.downloaded,
                skipped = report.skipped,
                errors = report.errors,
                next_page = report.next_page,
                "Bulk acquisition finished"
            ),
            Err(e) => error!(error = %e, "Bulk acquisition failed"),
        }

        self.stop_requested.store(false, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
        self.finished.send_replace(());
        result
    }

    async fn execute(
        &self,
        max_pages: u32,
        per_page_limit: u32,
        item_delay: Duration,
    ) -> Result<AcquisitionReport, AcquisitionError> {
        let mut state: AcquisitionState = self.checkpoints.load(keys::ACQUISITION_STATE)?;
        let mut registry = self.registry.load()?;
        let topics = self.topics.all_topics()?;

        if self.should_stop() {
            info!("Stop requested before the first page");
            return Ok(AcquisitionReport {
                outcome: BulkOutcome::Stopped,
                next_page: state.current_page,
                ..Default::default()
            });
        }

        state.running = true;
        state.last_run = Some(Utc::now());
        self.checkpoints.save(keys::ACQUISITION_STATE, &state)?;

        let mut report = AcquisitionReport {
            next_page: state.current_page,
            ..Default::default()
        };
        let page_delay = Duration::from_millis(self.config.page_delay_ms);

        for index in 0..max_pages {
            if self.should_stop() {
                report.outcome = BulkOutcome::Stopped;
                break;
            }
            if index > 0 && !page_delay.is_zero() {
                tokio::time::sleep(page_delay).await;
            }

            let page = state.current_page;
            debug!(page, "Searching catalog");

            let results = match self
                .catalog
                .search(&self.config.search_term, per_page_limit, page)
                .await
            {
                Ok(results) => results,
                Err(StockCatalogError::RateLimited) => {
                    warn!(page, "Catalog rate limit hit, stopping until next run");
                    metrics::STOCK_PAGES.with_label_values(&["rate_limited"]).inc();
                    metrics::STOCK_ERRORS.with_label_values(&["search"]).inc();
                    report.errors += 1;
                    state.errors += 1;
                    state.running = false;
                    self.checkpoint(&state, &mut registry)?;
                    report.outcome = BulkOutcome::RateLimited;
                    report.next_page = page;
                    return Ok(report);
                }
                Err(e) if e.is_fatal() => {
                    error!(page, error = %e, "Catalog search failed fatally");
                    metrics::STOCK_ERRORS.with_label_values(&["search"]).inc();
                    state.errors += 1;
                    state.running = false;
                    self.checkpoint(&state, &mut registry)?;
                    return Err(fatal_error(e));
                }
                Err(e) => {
                    warn!(page, error = %e, "Catalog search failed, skipping page");
                    metrics::STOCK_PAGES.with_label_values(&["failed"]).inc();
                    metrics::STOCK_ERRORS.with_label_values(&["search"]).inc();
                    report.errors += 1;
                    state.errors += 1;
                    state.current_page = page + 1;
                    report.pages += 1;
                    self.checkpoint(&state, &mut registry)?;
                    continue;
                }
            };

            if results.is_empty() {
                info!(page, "No more catalog results");
                metrics::STOCK_PAGES.with_label_values(&["empty"]).inc();
                break;
            }

            info!(page, resources = results.resources.len(), "Processing catalog page");

            for resource in &results.resources {
                if registry.is_known(&resource.id) {
                    debug!(resource_id = %resource.id, "Already handled, skipping");
                    metrics::STOCK_SKIPPED.inc();
                    report.skipped += 1;
                    continue;
                }

                match self.acquire(resource, &topics, &mut registry).await {
                    Ok(Some(_)) => {
                        report.downloaded += 1;
                        state.total_downloaded += 1;
                        self.publish(&report).await;
                        tokio::time::sleep(item_delay).await;
                    }
                    Ok(None) => {
                        report.errors += 1;
                        state.errors += 1;
                        self.publish(&report).await;
                    }
                    Err(e) => {
                        state.errors += 1;
                        state.running = false;
                        self.checkpoint(&state, &mut registry)?;
                        return Err(e);
                    }
                }
            }

            metrics::STOCK_PAGES.with_label_values(&["processed"]).inc();
            state.current_page = page + 1;
            report.pages += 1;
            self.checkpoint(&state, &mut registry)?;
            self.publish(&report).await;
        }

        state.running = false;
        self.checkpoint(&state, &mut registry)?;
        report.next_page = state.current_page;
        Ok(report)
    }

    /// Download one resource. `Ok(None)` is a counted, non-fatal failure.
    async fn acquire(
        &self,
        resource: &StockResource,
        topics: &[Topic],
        registry: &mut DedupRegistry,
    ) -> Result<Option<Asset>, AcquisitionError> {
        let url = match self.catalog.resolve_download_url(&resource.id).await {
            Ok(url) => url,
            Err(e) => return item_failure("resolve", resource, e),
        };
        let bytes = match self.catalog.fetch(&url).await {
            Ok(bytes) => bytes,
            Err(e) => return item_failure("fetch", resource, e),
        };

        let (topic, category) = categorize(topics, &resource.title, &resource.tags);
        let source_url = Some(resource.url.clone()).filter(|u| !u.is_empty());
        let asset = NewAsset {
            source: AssetSource::Stock,
            topic: topic.clone(),
            category: category.clone(),
            image_type: "stock".to_string(),
            style: None,
            provider: None,
            external_id: Some(resource.id.clone()),
            prompt: None,
            title: Some(resource.title.clone()),
            source_url,
            tags: stock_tags(&topic, &resource.tags, &self.config.destination),
            relative_dir: stock_dir(&topic),
            filename: stock_filename(&resource.id, &resource.title),
            bytes,
        };

        let asset = match self.library.add(asset) {
            Ok(asset) => asset,
            Err(e) => {
                error!(resource_id = %resource.id, error = %e, "Failed to store stock asset");
                metrics::STOCK_ERRORS.with_label_values(&["persist"]).inc();
                return Ok(None);
            }
        };

        registry.record_acquired(DownloadRecord {
            id: resource.id.clone(),
            topic,
            category,
            title: resource.title.clone(),
            downloaded_at: Utc::now(),
        });
        // The asset is already in the library, so the ID must be durable
        // before the next item or a resumed page downloads it twice.
        self.registry.merge_and_save(registry)?;
        metrics::STOCK_DOWNLOADS.inc();
        info!(
            resource_id = %resource.id,
            topic = %asset.topic,
            path = %asset.path,
            "Stock asset acquired"
        );
        Ok(Some(asset))
    }

    fn checkpoint(
        &self,
        state: &AcquisitionState,
        registry: &mut DedupRegistry,
    ) -> Result<(), AcquisitionError> {
        self.checkpoints.save(keys::ACQUISITION_STATE, state)?;
        self.registry.merge_and_save(registry)?;
        Ok(())
    }

    async fn publish(&self, report: &AcquisitionReport) {
        self.status.write().await.current = Some(report.clone());
    }
}

fn item_failure(
    stage: &str,
    resource: &StockResource,
    error: StockCatalogError,
) -> Result<Option<Asset>, AcquisitionError> {
    metrics::STOCK_ERRORS.with_label_values(&[stage]).inc();
    if error.is_fatal() {
        error!(resource_id = %resource.id, stage, error = %error, "Stock catalog failed fatally");
        return Err(fatal_error(error));
    }
    warn!(resource_id = %resource.id, stage, error = %error, "Stock item failed");
    Ok(None)
}

fn fatal_error(error: StockCatalogError) -> AcquisitionError {
    match error {
        StockCatalogError::NotConfigured(msg) => AcquisitionError::NotConfigured(msg),
        other => AcquisitionError::Unauthorized(other.to_string()),
    }
}
