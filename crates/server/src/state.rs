use std::sync::Arc;

use chrono::{DateTime, Utc};
use mirage_core::{
    AcquisitionQueue, AutopilotScheduler, CheckpointStore, Config, LibraryIndex, RegistryStore,
    SanitizedConfig, TopicCatalog,
};

/// Shared application state
pub struct AppState {
    config: Config,
    started_at: DateTime<Utc>,
    library: Arc<dyn LibraryIndex>,
    checkpoints: Arc<dyn CheckpointStore>,
    registry: Arc<RegistryStore>,
    topics: Arc<TopicCatalog>,
    /// Present when at least one image provider is configured.
    autopilot: Option<Arc<AutopilotScheduler>>,
    /// Present when the stock catalog is configured.
    acquisition: Option<Arc<AcquisitionQueue>>,
}

impl AppState {
    pub fn new(
        config: Config,
        library: Arc<dyn LibraryIndex>,
        checkpoints: Arc<dyn CheckpointStore>,
        registry: Arc<RegistryStore>,
        topics: Arc<TopicCatalog>,
        autopilot: Option<Arc<AutopilotScheduler>>,
        acquisition: Option<Arc<AcquisitionQueue>>,
    ) -> Self {
        Self {
            config,
            started_at: Utc::now(),
            library,
            checkpoints,
            registry,
            topics,
            autopilot,
            acquisition,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn library(&self) -> &dyn LibraryIndex {
        self.library.as_ref()
    }

    pub fn checkpoints(&self) -> &Arc<dyn CheckpointStore> {
        &self.checkpoints
    }

    pub fn registry(&self) -> &RegistryStore {
        self.registry.as_ref()
    }

    pub fn topics(&self) -> &TopicCatalog {
        self.topics.as_ref()
    }

    pub fn autopilot(&self) -> Option<&Arc<AutopilotScheduler>> {
        self.autopilot.as_ref()
    }

    pub fn acquisition(&self) -> Option<&Arc<AcquisitionQueue>> {
        self.acquisition.as_ref()
    }
}
