//! Standalone REST API server binary.
//!
//! Runs the REST API on its own; the workspace's main `fhirlite-run` binary
//! is the usual entry point and does the same thing with the workspace-level
//! logging setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{ApiConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("fhirlite_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::from_env()?;
    let state = AppState::initialise(&config).await?;

    tracing::info!("-- Starting fhirlite REST API on {}", config.addr);

    let listener = tokio::net::TcpListener::bind(&config.addr).await?;
    axum::serve(listener, api_rest::router(state)).await?;

    Ok(())
}
