//! The autopilot run loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::config::AutopilotConfig;
use super::tracker::TopicProgressTracker;
use super::types::{
    AutopilotError, AutopilotProgress, AutopilotReport, AutopilotState, AutopilotStatus,
    RunOutcome,
};
use crate::checkpoint::{keys, CheckpointStore, CheckpointStoreExt};
use crate::generator::{GeneratedImage, GenerationError, ParallelDispatcher};
use crate::library::{Asset, AssetSource, LibraryError, LibraryIndex, NewAsset};
use crate::metrics;
use crate::topics::{
    generated_dir, generated_filename, image_type_for_round, search_tags, ImageType, Topic,
    TopicCatalog,
};

/// Drives generation rounds until every backlog topic reaches its target.
///
/// Only one run may be active at a time. `run`/`spawn` fail with
/// [`AutopilotError::AlreadyRunning`] while another run is in progress.
pub struct AutopilotScheduler {
    config: AutopilotConfig,
    dispatcher: Arc<ParallelDispatcher>,
    library: Arc<dyn LibraryIndex>,
    checkpoints: Arc<dyn CheckpointStore>,
    topics: Arc<TopicCatalog>,
    running: AtomicBool,
    stop_requested: AtomicBool,
    finished: watch::Sender<()>,
    status: RwLock<AutopilotStatus>,
}

impl AutopilotScheduler {
    pub fn new(
        config: AutopilotConfig,
        dispatcher: Arc<ParallelDispatcher>,
        library: Arc<dyn LibraryIndex>,
        checkpoints: Arc<dyn CheckpointStore>,
        topics: Arc<TopicCatalog>,
    ) -> Self {
        let status = AutopilotStatus {
            target_per_topic: config.target_per_topic,
            ..Default::default()
        };
        Self {
            config,
            dispatcher,
            library,
            checkpoints,
            topics,
            running: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
            finished: watch::channel(()).0,
            status: RwLock::new(status),
        }
    }

    /// The configuration used when a run is started without overrides.
    pub fn config(&self) -> &AutopilotConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub async fn state(&self) -> AutopilotState {
        self.status.read().await.state
    }

    pub async fn status(&self) -> AutopilotStatus {
        self.status.read().await.clone()
    }

    /// Ask the active run to stop at the next round boundary.
    ///
    /// Returns false when nothing is running.
    pub fn request_stop(&self) -> bool {
        if !self.is_running() {
            return false;
        }
        info!("Autopilot stop requested");
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

    /// Load the persisted progress document.
    pub fn progress(&self) -> Result<AutopilotProgress, AutopilotError> {
        Ok(self.checkpoints.load(keys::AUTOPILOT_PROGRESS)?)
    }

    /// Forget which topics were completed so they can be revisited.
    pub fn reset_progress(&self) -> Result<(), AutopilotError> {
        if self.is_running() {
            return Err(AutopilotError::AlreadyRunning);
        }
        let progress = AutopilotProgress {
            completed_topics: Default::default(),
            ..self.progress()?
        };
        self.checkpoints
            .save(keys::AUTOPILOT_PROGRESS, &progress)?;
        info!("Autopilot progress reset");
        Ok(())
    }

    /// Run to completion with the default configuration.
    pub async fn run(&self) -> Result<AutopilotReport, AutopilotError> {
        self.run_with(self.config.clone()).await
    }

    /// Run to completion with an explicit configuration.
    pub async fn run_with(
        &self,
        config: AutopilotConfig,
    ) -> Result<AutopilotReport, AutopilotError> {
        self.begin()?;
        self.run_claimed(config).await
    }

    /// Start a run on a background task.
    ///
    /// The running check happens before the task is spawned, so a second
    /// call fails immediately instead of inside the task.
    pub fn spawn(
        self: &Arc<Self>,
        config: AutopilotConfig,
    ) -> Result<JoinHandle<Result<AutopilotReport, AutopilotError>>, AutopilotError> {
        self.begin()?;
        let this = Arc::clone(self);
        Ok(tokio::spawn(async move { this.run_claimed(config).await }))
    }

    fn begin(&self) -> Result<(), AutopilotError> {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Autopilot already running");
            return Err(AutopilotError::AlreadyRunning);
        }
        self.stop_requested.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn run_claimed(&self, config: AutopilotConfig) -> Result<AutopilotReport, AutopilotError> {
        {
            let mut status = self.status.write().await;
            *status = AutopilotStatus {
                state: AutopilotState::Running,
                target_per_topic: config.target_per_topic,
                started_at: Some(Utc::now()),
                last_report: status.last_report.take(),
                ..Default::default()
            };
        }

        info!(
            target_per_topic = config.target_per_topic,
            parallelism = config.parallelism,
            max_topics = config.max_topics,
            "Autopilot started"
        );

        let result = self.execute(&config).await;

        let (state, outcome) = match &result {
            Ok(report) => match &report.outcome {
                RunOutcome::Completed => (AutopilotState::Completed, "completed"),
                RunOutcome::Stopped => (AutopilotState::Stopped, "stopped"),
                RunOutcome::Halted { .. } => (AutopilotState::Stopped, "halted"),
            },
            Err(_) => (AutopilotState::Stopped, "failed"),
        };
        metrics::AUTOPILOT_RUNS.with_label_values(&[outcome]).inc();

        {
            let mut status = self.status.write().await;
            status.state = state;
            status.stop_requested = false;
            status.current_topic = None;
            status.finished_at = Some(Utc::now());
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
                outcome,
                images_created = report.images_created,
                topics_completed = report.topics_completed,
                rounds = report.rounds,
                "Autopilot finished"
            ),
            Err(e) => error!(error = %e, "Autopilot failed"),
        }

        self.stop_requested.store(false, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
        self.finished.send_replace(());
        result
    }

    fn should_stop(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    async fn execute(&self, config: &AutopilotConfig) -> Result<AutopilotReport, AutopilotError> {
        if !self.dispatcher.has_providers() {
            return Err(AutopilotError::Provider(GenerationError::NotConfigured(
                "no image provider configured".to_string(),
            )));
        }

        let mut progress = self.progress()?;
        let counts = self.library.count_by_topic()?;
        let topics = self.topics.all_topics()?;
        let mut tracker = TopicProgressTracker::new(
            counts,
            progress.completed_topics.clone(),
            config.target_per_topic,
        );
        let backlog = tracker.backlog(&topics, config.max_topics);
        info!(
            backlog = backlog.len(),
            completed = tracker.completed().len(),
            "Autopilot backlog built"
        );
        self.status.write().await.backlog_size = backlog.len();

        let mut report = AutopilotReport::default();
        let round_delay = Duration::from_millis(config.round_delay_ms);

        'topics: for topic in &backlog {
            if self.should_stop() {
                report.outcome = RunOutcome::Stopped;
                break;
            }

            info!(
                topic = %topic.name,
                count = tracker.count(&topic.name),
                target = tracker.target(),
                "Processing topic"
            );
            {
                let mut status = self.status.write().await;
                status.current_topic = Some(topic.name.clone());
                status.current_count = tracker.count(&topic.name);
            }

            let mut round = 0usize;
            while !tracker.is_complete(&topic.name) {
                if self.should_stop() {
                    report.outcome = RunOutcome::Stopped;
                    break 'topics;
                }

                let image_type = image_type_for_round(round);
                let batch_size = (config.parallelism.max(1) as u64)
                    .min(tracker.remaining(&topic.name)) as usize;
                let requests = self
                    .dispatcher
                    .plan_batch(&topic.name, &config.destination, image_type.prompt, batch_size)
                    .map_err(AutopilotError::Provider)?;

                let images = match self
                    .dispatcher
                    .dispatch_batch_with(requests, config.parallelism)
                    .await {
                    Ok(images) => images,
                    Err(GenerationError::QuotaExhausted(reason)) => {
                        error!(topic = %topic.name, %reason, "Provider quota exhausted, halting autopilot");
                        self.save_progress(&mut progress, &tracker)?;
                        report.outcome = RunOutcome::Halted { reason };
                        return Ok(report);
                    }
                    Err(e) => {
                        error!(topic = %topic.name, error = %e, "Fatal provider error");
                        self.save_progress(&mut progress, &tracker)?;
                        return Err(AutopilotError::Provider(e));
                    }
                };

                if images.is_empty() {
                    warn!(
                        topic = %topic.name,
                        image_type = image_type.name,
                        "Round produced no images"
                    );
                    report.empty_rounds += 1;
                    metrics::AUTOPILOT_ROUNDS.with_label_values(&["empty"]).inc();
                } else {
                    metrics::AUTOPILOT_ROUNDS.with_label_values(&["produced"]).inc();
                }

                for image in images {
                    let asset = self.persist(topic, &image_type, image, &config.destination)?;
                    let count = tracker.advance(&topic.name);
                    report.images_created += 1;
                    metrics::IMAGES_GENERATED.inc();
                    info!(
                        topic = %topic.name,
                        path = %asset.path,
                        count,
                        target = tracker.target(),
                        "Image saved"
                    );

                    let mut status = self.status.write().await;
                    status.current_count = count;
                    status.images_created = report.images_created;
                }

                report.rounds += 1;
                round += 1;
                tokio::time::sleep(round_delay).await;
            }

            report.topics_processed += 1;
            if tracker.is_complete(&topic.name) && tracker.mark_complete(&topic.name) {
                report.topics_completed += 1;
                metrics::TOPICS_COMPLETED.inc();
                info!(topic = %topic.name, "Topic complete");
                self.save_progress(&mut progress, &tracker)?;
            }
            self.status.write().await.topics_processed = report.topics_processed;
        }

        progress.last_run = Some(Utc::now());
        self.save_progress(&mut progress, &tracker)?;
        Ok(report)
    }

    fn persist(
        &self,
        topic: &Topic,
        image_type: &ImageType,
        image: GeneratedImage,
        destination: &str,
    ) -> Result<Asset, LibraryError> {
        let asset = NewAsset {
            source: AssetSource::Generated,
            topic: topic.name.clone(),
            category: topic.category.clone(),
            image_type: image_type.name.to_string(),
            style: Some(image.style.name.to_string()),
            provider: Some(image.provider.as_str().to_string()),
            external_id: None,
            prompt: Some(image.prompt),
            title: None,
            source_url: None,
            tags: search_tags(topic, image_type, destination),
            relative_dir: generated_dir(topic),
            filename: generated_filename(topic, image_type, image.style.name, destination),
            bytes: image.bytes,
        };
        self.library.add(asset)
    }

    fn save_progress(
        &self,
        progress: &mut AutopilotProgress,
        tracker: &TopicProgressTracker,
    ) -> Result<(), AutopilotError> {
        progress.completed_topics = tracker.completed().clone();
        self.checkpoints.save(keys::AUTOPILOT_PROGRESS, progress)?;
        Ok(())
    }
}
