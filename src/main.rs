//! Main entry point for the fhirlite record server.
//!
//! Opens the store, provisions the schema if needed, and serves the REST API.
//!
//! # Environment Variables
//! - `FHIRLITE_ADDR`: server address (default: "0.0.0.0:8000")
//! - `DATABASE_URL`: SQLite database URL (default: "sqlite:fhirlite.db")
//! - `API_KEY`: shared secret for the `x-api-key` header (required)

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{ApiConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fhirlite=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("fhirlite_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::from_env()?;
    let state = AppState::initialise(&config).await?;

    tracing::info!("-- Starting fhirlite on {}", config.addr);
    tracing::info!("-- Swagger UI at /swagger-ui");

    let listener = tokio::net::TcpListener::bind(&config.addr).await?;
    axum::serve(listener, api_rest::router(state)).await?;

    Ok(())
}
