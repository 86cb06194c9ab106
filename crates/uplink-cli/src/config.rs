//! CLI configuration from the environment.

use anyhow::Context;

const DEFAULT_API_URL: &str = "https://web-api.uplink.example";

/// Connection settings resolved from environment variables (and `.env`).
pub struct CliConfig {
    pub database_url: String,
    pub api_url: String,
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
}

impl CliConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url =
            std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let api_url =
            std::env::var("UPLINK_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let token_url = std::env::var("UPLINK_TOKEN_URL")
            .unwrap_or_else(|_| format!("{}/auth/connect/token", api_url.trim_end_matches('/')));
        let client_id =
            std::env::var("UPLINK_CLIENT_ID").context("UPLINK_CLIENT_ID is not set")?;
        let client_secret =
            std::env::var("UPLINK_CLIENT_SECRET").context("UPLINK_CLIENT_SECRET is not set")?;

        Ok(Self {
            database_url,
            api_url,
            token_url,
            client_id,
            client_secret,
        })
    }
}
