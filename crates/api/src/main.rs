use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use intake_api::background::session_expiry;
use intake_api::config::ServerConfig;
use intake_api::sessions::SessionRegistry;
use intake_api::state::AppState;
use intake_db::{BestEffortDraftStore, FileDraftStore};
use intake_gateway::{HttpIpLookup, RestGateway};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "intake_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().context("Invalid server configuration")?;
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Draft storage ---
    let file_store = FileDraftStore::open(config.drafts_dir.clone()).with_context(|| {
        format!("Failed to open drafts directory {}", config.drafts_dir.display())
    })?;
    let drafts = Arc::new(BestEffortDraftStore::new(Arc::new(file_store)));
    tracing::info!(dir = %config.drafts_dir.display(), "Draft store ready");

    // --- Backend ---
    let backend = Arc::new(RestGateway::new(&config.backend_url, &config.backend_anon_key));
    let ip_lookup = Arc::new(HttpIpLookup::new(&config.ip_lookup_url));
    tracing::info!(backend_url = %config.backend_url, "Backend gateway configured");

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        sessions: Arc::new(SessionRegistry::new()),
        drafts,
        gateway: backend.clone(),
        consent_sink: backend,
        ip_lookup,
    };

    // --- Background jobs ---
    let expiry_handle = tokio::spawn(session_expiry::run(
        state.sessions.clone(),
        config.session_idle(),
        session_expiry::SWEEP_INTERVAL,
    ));

    let app = intake_api::build_app_router(state, &config);

    // --- Start server ---
    let host: std::net::IpAddr = config
        .host
        .parse()
        .with_context(|| format!("Invalid HOST address {}", config.host))?;
    let addr = SocketAddr::new(host, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    expiry_handle.abort();
    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for SIGINT or (on Unix) SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
