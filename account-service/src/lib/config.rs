use std::env;

use auth::TokenLifetimes;
use chrono::Duration;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

/// Minimum signing key length for HS256
const MIN_SECRET_LENGTH: usize = 32;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub tokens: TokenConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Postgres connection string, the in-memory store is used when absent
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Deserialize, Clone)]
pub struct TokenConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    #[serde(default = "default_access_ttl_seconds")]
    pub access_ttl_seconds: i64,
    #[serde(default = "default_refresh_ttl_seconds")]
    pub refresh_ttl_seconds: i64,
}

fn default_max_connections() -> u32 {
    5
}

fn default_access_ttl_seconds() -> i64 {
    15 * 60
}

fn default_refresh_ttl_seconds() -> i64 {
    30 * 24 * 60 * 60
}

impl TokenConfig {
    /// Reject secrets that are too short or shared between token kinds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, secret) in [
            ("tokens.access_secret", &self.access_secret),
            ("tokens.refresh_secret", &self.refresh_secret),
        ] {
            if secret.len() < MIN_SECRET_LENGTH {
                return Err(ConfigError::Message(format!(
                    "{} must be at least {} bytes, got {}",
                    name,
                    MIN_SECRET_LENGTH,
                    secret.len()
                )));
            }
        }

        if self.access_secret == self.refresh_secret {
            return Err(ConfigError::Message(
                "tokens.access_secret and tokens.refresh_secret must differ".to_string(),
            ));
        }

        if self.access_ttl_seconds <= 0 || self.refresh_ttl_seconds <= 0 {
            return Err(ConfigError::Message(
                "token lifetimes must be positive".to_string(),
            ));
        }

        Ok(())
    }

    pub fn lifetimes(&self) -> TokenLifetimes {
        TokenLifetimes {
            access: Duration::seconds(self.access_ttl_seconds),
            refresh: Duration::seconds(self.refresh_ttl_seconds),
        }
    }
}

// Secrets stay out of logs
impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("access_ttl_seconds", &self.access_ttl_seconds)
            .field("refresh_ttl_seconds", &self.refresh_ttl_seconds)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (TOKENS__ACCESS_SECRET, SERVER__HTTP_PORT, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .set_default("server.http_port", 8080)?
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on environment-specific configuration
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Layer on environment variables (with __ as separator)
            // Example: DATABASE__URL=postgres://... overrides database.url
            .add_source(Environment::default().separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;
        config.tokens.validate()?;

        Ok(config)
    }
}
