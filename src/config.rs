//! Application configuration management.
//!
//! Configuration is read from environment variables with the `envy` crate,
//! after an optional `.env` file has been loaded.

use anyhow::Context;
use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;

/// Which storage backend holds secret records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// PostgreSQL via sqlx (production)
    #[default]
    Postgres,

    /// Process-local map, lost on exit. Local development only.
    Memory,
}

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (optional): PostgreSQL connection string
/// - `DB_ADDRESS`, `DB_LOGIN`, `DB_PASSWORD`, `DB_NAME`, `DB_PORT` (optional):
///   used to build connection options when `DATABASE_URL` is not set
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `DB_MAX_CONNECTIONS` (optional): pool size, defaults to 5
/// - `REQUEST_TIMEOUT_SECS` (optional): per-request timeout, defaults to 10
/// - `MAX_BODY_BYTES` (optional): request body limit, defaults to 64 KiB
/// - `STORE_BACKEND` (optional): `postgres` (default) or `memory`
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: Option<String>,

    pub db_address: Option<String>,
    pub db_login: Option<String>,
    pub db_password: Option<String>,
    pub db_name: Option<String>,
    pub db_port: Option<String>,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_max_connections")]
    pub db_max_connections: u32,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    #[serde(default)]
    pub store_backend: StoreBackend,
}

fn default_port() -> u16 {
    3000
}

fn default_max_connections() -> u32 {
    5
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    ///
    /// # Errors
    ///
    /// Returns an error if an environment variable value cannot be parsed
    /// into its expected type.
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();

        envy::from_env::<Config>()
    }

    /// Resolve PostgreSQL connection options.
    ///
    /// `DATABASE_URL` wins. Otherwise all five split `DB_*` variables must be
    /// set; they are applied field by field, so credentials containing URL
    /// metacharacters reach the server verbatim.
    pub fn connect_options(&self) -> anyhow::Result<PgConnectOptions> {
        if let Some(url) = &self.database_url {
            return url
                .parse::<PgConnectOptions>()
                .context("DATABASE_URL is not a valid PostgreSQL URL");
        }

        match (
            &self.db_address,
            &self.db_login,
            &self.db_password,
            &self.db_name,
            &self.db_port,
        ) {
            (Some(host), Some(user), Some(password), Some(name), Some(port)) => {
                let port: u16 = port.parse().context("DB_PORT is not a valid port")?;

                Ok(PgConnectOptions::new()
                    .host(host)
                    .port(port)
                    .username(user)
                    .password(password)
                    .database(name))
            }
            _ => anyhow::bail!(
                "DATABASE_URL is not set and DB_ADDRESS, DB_LOGIN, DB_PASSWORD, DB_NAME, DB_PORT are incomplete"
            ),
        }
    }
}
