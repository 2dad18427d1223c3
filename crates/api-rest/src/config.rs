//! Environment-driven server configuration.

use anyhow::Context;

/// Settings the REST server reads at startup.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Socket address to bind.
    pub addr: String,
    /// SQLite database URL.
    pub database_url: String,
    /// Shared secret expected in the `x-api-key` header.
    pub api_key: String,
}

impl ApiConfig {
    /// Read configuration from the environment.
    ///
    /// `FHIRLITE_ADDR` and `DATABASE_URL` have development defaults;
    /// `API_KEY` has none, an unset secret is a refusal to start.
    pub fn from_env() -> anyhow::Result<Self> {
        let addr = std::env::var("FHIRLITE_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".into());
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:fhirlite.db".into());
        let api_key = std::env::var("API_KEY").context("API_KEY not set in environment")?;

        Ok(Self {
            addr,
            database_url,
            api_key,
        })
    }
}
