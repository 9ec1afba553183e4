use anyhow::Context;
use std::net::SocketAddr;

use catch_the_flag::{config::AppConfig, routes, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG overrides the default filter
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "catch_the_flag=info,tower_http=warn".into()),
        )
        .init();

    let config = AppConfig::from_env().context("Failed to load configuration")?;

    tracing::info!(
        "Catch the flag server starting ({:?}, rounds of {}s, cooldown {}s)",
        config.environment,
        config.round.duration.as_secs(),
        config.round.cooldown.as_secs()
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState::new(config);
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Server listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    tracing::info!("Shutting down game server");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
}
