pub mod acquisition;
pub mod autopilot;
pub mod checkpoint;
pub mod config;
pub mod generator;
pub mod library;
pub mod metrics;
pub mod stock;
pub mod testing;
pub mod topics;

pub use acquisition::{
    remove_asset, AcquisitionConfig, AcquisitionError, AcquisitionQueue, AcquisitionReport,
    AcquisitionState, AcquisitionStatus, BulkOutcome, DedupRegistry, RegistryStore,
};
pub use autopilot::{
    AutopilotConfig, AutopilotError, AutopilotReport, AutopilotScheduler, AutopilotState,
    AutopilotStatus, RunOutcome,
};
pub use checkpoint::{CheckpointError, CheckpointStore, CheckpointStoreExt, SqliteCheckpointStore};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use generator::{
    GeminiClient, GenerationError, ImageProvider, OpenAiClient, ParallelDispatcher, ProviderKind,
    RetryConfig, RetryingInvoker,
};
pub use library::{Asset, AssetFilter, AssetSource, LibraryError, LibraryIndex, LibraryStats, SqliteLibrary};
pub use stock::{FreepikClient, StockCatalog, StockCatalogError};
pub use topics::{CustomTopic, NewCustomTopic, Topic, TopicCatalog, TopicError};
