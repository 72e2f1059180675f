// Main entry point for the like relay

use anyhow::Context;
use like_relay::api::{create_router, AppState, CredentialSource, DispatchClient};
use like_relay::config::Config;
use like_relay::engine::{FanOutCoordinator, RandomSelector};
use like_relay::loader::credential_store::JsonCredentialStore;
use like_relay::loader::region_table::RegionTable;
use like_relay::proxy::DispatchClientImpl;

use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load and validate configuration first (before any logging)
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // 2. Initialize tracing subscriber with config values
    init_tracing(&config)?;

    info!(
        bind_address = %config.bind_address,
        port = config.port,
        shape = %config.dispatch_shape,
        default_region = %config.default_region,
        tls_verify = config.tls_verify,
        "Configuration loaded"
    );

    // 3. Load region table
    let regions = Arc::new(
        RegionTable::from_file(&config.regions_yaml_path)
            .map_err(|e| {
                error!(error = %e, path = ?config.regions_yaml_path, "Failed to load region table");
                e
            })?
    );

    info!(regions = ?regions.regions(), "Region table loaded");

    // 4. Credential store (re-reads files per invocation)
    let credential_store: Arc<dyn CredentialSource + Send + Sync> = Arc::new(JsonCredentialStore::new(
        config.tokens_dir.clone(),
        Arc::clone(&regions),
        config.key_material.clone(),
        &config.default_user_agent,
    ));

    // 5. Dispatch client
    let dispatch_client: Arc<dyn DispatchClient + Send + Sync> = Arc::new(
        DispatchClientImpl::new(config.dispatch_timeout_secs, config.tls_verify)
            .map_err(|e| {
                error!(error = %e, "Failed to create dispatch client");
                e
            })?
    );

    info!(timeout_secs = config.dispatch_timeout_secs, "Dispatch client initialized");

    // 6. Coordinator
    let coordinator = Arc::new(FanOutCoordinator::new(
        Arc::clone(&regions),
        credential_store,
        dispatch_client,
        Arc::new(RandomSelector),
    ));

    let app_state = AppState {
        coordinator,
        regions,
        config: Arc::new(config.clone()),
    };

    let router = create_router(&app_state).with_state(app_state);

    // 7. Start HTTP server
    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    info!(addr = %addr, "Server listening");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing subscriber based on configuration
fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    // RUST_LOG wins over LOG_LEVEL when set
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_env_filter(filter);

    if config.log_format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Ctrl+C received, starting graceful shutdown");
        },
        _ = terminate => {
            info!("SIGTERM received, starting graceful shutdown");
        },
    }
}
