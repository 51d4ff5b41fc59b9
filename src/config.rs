use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use tracing::info;
use validator::Validate;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;
const CONFIG_DIR: &str = "config";

/// When the warehouse ledger is debited for an outgoing shipment.
///
/// `DebitOnReceive` reproduces the historical behavior: stock moves only when
/// the outlet confirms receipt, so a shipment can fail `InsufficientStock`
/// late, at `receive`. `ReserveOnCreate` debits the warehouse when the
/// shipment is created and refunds it on cancellation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationPolicy {
    #[default]
    DebitOnReceive,
    ReserveOnCreate,
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// Database connection URL
    #[validate(length(min = 1))]
    pub database_url: String,

    /// Deployment environment name ("development", "production", ...)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Log level filter passed to the tracing subscriber
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Outgoing-goods stock reservation timing
    #[serde(default)]
    pub reservation_policy: ReservationPolicy,

    /// Capacity of the domain event channel
    #[serde(default = "default_event_buffer_size")]
    pub event_buffer_size: usize,
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_event_buffer_size() -> usize {
    DEFAULT_EVENT_BUFFER_SIZE
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            environment: default_environment(),
            log_level: default_log_level(),
            reservation_policy: ReservationPolicy::default(),
            event_buffer_size: default_event_buffer_size(),
        }
    }
}

impl AppConfig {
    /// Creates a configuration directly, mainly for tests and embedding.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }

    /// Loads configuration from `config/default.toml`, an environment-specific
    /// `config/<env>.toml` (both optional), and `APP__`-prefixed environment
    /// variables, in increasing order of precedence.
    pub fn load() -> Result<Self, ConfigError> {
        let environment = env::var("APP_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());

        let settings = Config::builder()
            .add_source(File::from(Path::new(CONFIG_DIR).join("default")).required(false))
            .add_source(File::from(Path::new(CONFIG_DIR).join(&environment)).required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        let app_config: AppConfig = settings.try_deserialize()?;
        app_config
            .validate()
            .map_err(|e| ConfigError::Message(format!("invalid configuration: {}", e)))?;

        info!(environment = %app_config.environment, "Configuration loaded");
        Ok(app_config)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
