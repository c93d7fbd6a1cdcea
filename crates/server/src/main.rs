use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gamekit_deploy_core::{
    load_config, validate_config, CommandProviderFactory, DeploymentOrchestrator, ProviderFactory,
};
use gamekit_deploy_server::api::create_router;
use gamekit_deploy_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

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
    let config_path = std::env::var("GAMEKIT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        version = VERSION,
        config_hash = &config_hash[..16],
        "Configuration loaded successfully"
    );
    info!("Provider command: {}", config.commands.program);

    // Build the orchestrator
    let graph = config
        .orchestrator
        .dependency_graph()
        .context("Invalid dependency table")?;
    let regions = config
        .region_mappings()
        .context("Invalid region table")?;
    info!(
        features = graph.features().len(),
        regions = regions.len(),
        "Dependency graph and region table ready"
    );

    let factory: Arc<dyn ProviderFactory> = Arc::new(CommandProviderFactory::new(
        config.commands.clone(),
        config.orchestrator.clone(),
    ));
    let orchestrator = Arc::new(
        DeploymentOrchestrator::new(factory)
            .with_graph(graph)
            .with_region_mappings(regions)
            .with_feature_settings(config.features.clone()),
    );

    // Apply the startup account, if any
    if let Some(account) = &config.account {
        let orch = Arc::clone(&orchestrator);
        let info = account.info();
        let credentials = account.credentials();
        tokio::task::spawn_blocking(move || -> Result<()> {
            orch.set_credentials(info, credentials)
                .context("Failed to apply [account] credentials")?;
            let response = orch.refresh_feature_statuses();
            if !response.is_success() {
                warn!(code = %response.result_code, "Initial status refresh failed");
            }
            Ok(())
        })
        .await
        .context("Startup account task failed")??;
        info!("Startup account applied");
    } else {
        info!("No [account] configured; waiting for PUT /api/v1/credentials");
    }

    // Create app state and router
    let state = Arc::new(AppState::new(config.clone(), orchestrator));
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

    info!("Server stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
