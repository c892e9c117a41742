use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mirage_core::{
    load_config, validate_config, AcquisitionQueue, AutopilotScheduler, CheckpointStore,
    FreepikClient, GeminiClient, ImageProvider, LibraryIndex, OpenAiClient, ParallelDispatcher,
    RegistryStore, RetryingInvoker, SanitizedConfig, SqliteCheckpointStore, SqliteLibrary,
    StockCatalog, TopicCatalog,
};

use mirage_server::api::create_router;
use mirage_server::state::AppState;

/// Upper bound on how long shutdown waits for background loops.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("MIRAGE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    // Fingerprint of the non-secret settings, for correlating logs across restarts
    let sanitized = SanitizedConfig::from(&config);
    let config_json = serde_json::to_string(&sanitized).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(config_hash = &config_hash[..16], "Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);
    info!("Library root: {:?}", config.library.root);

    // Create SQLite library index
    let library: Arc<dyn LibraryIndex> = Arc::new(
        SqliteLibrary::new(&config.database.path, &config.library.root)
            .context("Failed to create library index")?,
    );
    info!("Library index initialized");

    // Create SQLite checkpoint store
    let checkpoints: Arc<dyn CheckpointStore> = Arc::new(
        SqliteCheckpointStore::new(&config.database.path)
            .context("Failed to create checkpoint store")?,
    );
    info!("Checkpoint store initialized");

    let registry = Arc::new(RegistryStore::new(Arc::clone(&checkpoints)));
    let topics = Arc::new(TopicCatalog::new(Arc::clone(&checkpoints)));

    // Create image providers if configured
    let mut providers: Vec<Arc<dyn ImageProvider>> = Vec::new();
    if let Some(gemini_config) = &config.providers.gemini {
        match GeminiClient::new(gemini_config.clone()) {
            Ok(client) => {
                info!("Initializing Gemini provider (model: {})", gemini_config.model);
                providers.push(Arc::new(client));
            }
            Err(e) => error!("Failed to create Gemini client: {}", e),
        }
    }
    if let Some(openai_config) = &config.providers.openai {
        match OpenAiClient::new(openai_config.clone()) {
            Ok(client) => {
                info!("Initializing OpenAI provider (model: {})", openai_config.model);
                providers.push(Arc::new(client));
            }
            Err(e) => error!("Failed to create OpenAI client: {}", e),
        }
    }

    // Create autopilot if any provider is available
    let autopilot = if providers.is_empty() {
        warn!("No image provider configured, autopilot disabled");
        None
    } else {
        let dispatcher = Arc::new(ParallelDispatcher::new(
            providers,
            RetryingInvoker::new(config.retry.clone()),
            config.autopilot.parallelism,
        ));
        info!(
            parallelism = config.autopilot.parallelism,
            target_per_topic = config.autopilot.target_per_topic,
            "Autopilot initialized"
        );
        Some(Arc::new(AutopilotScheduler::new(
            config.autopilot.clone(),
            dispatcher,
            Arc::clone(&library),
            Arc::clone(&checkpoints),
            Arc::clone(&topics),
        )))
    };

    // Create stock acquisition queue if the catalog is configured
    let acquisition = match &config.stock {
        Some(stock_config) => match FreepikClient::new(stock_config.clone()) {
            Ok(client) => {
                info!("Initializing stock catalog at {}", stock_config.base_url);
                let catalog: Arc<dyn StockCatalog> = Arc::new(client);
                Some(Arc::new(AcquisitionQueue::new(
                    config.acquisition.clone(),
                    catalog,
                    Arc::clone(&library),
                    Arc::clone(&checkpoints),
                    Arc::clone(&registry),
                    Arc::clone(&topics),
                )))
            }
            Err(e) => {
                error!("Failed to create stock catalog client: {}", e);
                None
            }
        },
        None => {
            info!("Stock catalog not configured, bulk acquisition disabled");
            None
        }
    };

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        library,
        checkpoints,
        registry,
        topics,
        autopilot.clone(),
        acquisition.clone(),
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Let running loops reach their next round or page boundary before the
    // runtime is dropped.
    info!("Server shutting down...");
    let stop_autopilot = async {
        if let Some(scheduler) = &autopilot {
            if scheduler.is_running() {
                info!("Stopping autopilot...");
            }
            scheduler.stop().await;
        }
    };
    let stop_acquisition = async {
        if let Some(queue) = &acquisition {
            if queue.is_running() {
                info!("Stopping bulk acquisition...");
            }
            queue.stop().await;
        }
    };
    let stop_loops = async {
        tokio::join!(stop_autopilot, stop_acquisition);
    };
    match tokio::time::timeout(SHUTDOWN_GRACE, stop_loops).await {
        Ok(()) => info!("Background loops stopped"),
        Err(_) => warn!(
            grace_secs = SHUTDOWN_GRACE.as_secs(),
            "Background loops still running at shutdown, abandoning them"
        ),
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
