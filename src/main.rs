mod address;
mod api;
mod command;
mod config;
mod entities;
mod gateway;
mod poller;
mod registry;
mod state;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use tracing_subscriber::EnvFilter;

use api::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,grenton_bridge=debug")),
        )
        .init();

    tracing::info!("Starting Grenton bridge v{}", env!("CARGO_PKG_VERSION"));

    let config_path =
        std::env::var("GRENTON_CONFIG").unwrap_or_else(|_| "grenton.yaml".to_string());
    let config = config::load_config(Path::new(&config_path))
        .with_context(|| format!("failed to load config from {config_path}"))?;

    let state_machine = Arc::new(state::StateMachine::new(4096));

    // Entity construction fails fast on a malformed grenton_id.
    let registry = Arc::new(registry::EntityRegistry::from_config(
        &config,
        state_machine.clone(),
    )?);
    tracing::info!(
        "Loaded {} devices from {}",
        registry.len(),
        config_path
    );

    poller::start_poller(registry.clone(), config.poll_interval_secs);

    let app_state = Arc::new(AppState {
        state_machine,
        registry,
    });
    let app = api::router(app_state);

    // Bind to configured port
    let port: u16 = std::env::var("GRENTON_HTTP_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8126);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
