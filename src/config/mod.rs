//! # Worker Configuration System
//!
//! Configuration for the compensation worker: database connection, Redis
//! connection, and queue/consumer-group settings. Values are loaded from
//! layered YAML files with environment-variable overrides and validated
//! after load; every field has a safe default so a bare deployment can boot
//! against local services.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use compensation_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load configuration (environment auto-detected)
//! let manager = ConfigManager::load()?;
//!
//! let database_url = manager.config().database.url();
//! let stream_key = manager.config().queue.stream_key();
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

use crate::constants::defaults;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Database connection and pooling configuration
    pub database: DatabaseConfig,

    /// Redis connection configuration
    pub redis: RedisConfig,

    /// Queue and consumer-group configuration
    pub queue: QueueConfig,
}

impl CoreConfig {
    /// Validate the loaded configuration, rejecting values the worker
    /// cannot run with
    pub fn validate(&self) -> ConfigResult<()> {
        if self.queue.key.is_empty() {
            return Err(ConfigurationError::validation(
                "queue.key",
                "queue key must not be empty",
            ));
        }
        if self.queue.group.is_empty() {
            return Err(ConfigurationError::validation(
                "queue.group",
                "consumer group name must not be empty",
            ));
        }
        if self.queue.count == 0 {
            return Err(ConfigurationError::validation(
                "queue.count",
                "batch count must be at least 1",
            ));
        }
        if self.queue.poll_interval_ms == 0 {
            return Err(ConfigurationError::validation(
                "queue.poll_interval_ms",
                "poll interval must be at least 1ms",
            ));
        }
        if self.database.pool == 0 {
            return Err(ConfigurationError::validation(
                "database.pool",
                "connection pool must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub pool: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5432,
            username: "postgres".to_string(),
            password: String::new(),
            database: "insbiz".to_string(),
            pool: 10,
        }
    }
}

impl DatabaseConfig {
    /// Build a PostgreSQL connection URL
    pub fn url(&self) -> String {
        if self.password.is_empty() {
            format!(
                "postgresql://{}@{}:{}/{}",
                self.username, self.host, self.port, self.database
            )
        } else {
            format!(
                "postgresql://{}:{}@{}:{}/{}",
                self.username, self.password, self.host, self.port, self.database
            )
        }
    }
}

/// Redis connection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub db: i64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            password: None,
            db: 0,
        }
    }
}

impl RedisConfig {
    /// Build a Redis connection URL
    pub fn url(&self) -> String {
        match &self.password {
            Some(password) if !password.is_empty() => format!(
                "redis://:{}@{}:{}/{}",
                password, self.host, self.port, self.db
            ),
            _ => format!("redis://{}:{}/{}", self.host, self.port, self.db),
        }
    }
}

/// Queue and consumer-group configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Queue name, combined with `key_prefix` to form the full stream key
    pub key: String,

    /// Application prefix applied to the queue key
    pub key_prefix: String,

    /// Consumer group name
    pub group: String,

    /// Maximum entries requested per batch read
    pub count: usize,

    /// Pause between poll cycles in milliseconds
    pub poll_interval_ms: u64,

    /// How long a batch read blocks waiting for entries in milliseconds
    pub block_ms: u64,

    /// Explicit consumer identity; generated at construction when absent
    pub consumer: Option<String>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            key: "auto-compensate".to_string(),
            key_prefix: defaults::STREAM_KEY_PREFIX.to_string(),
            group: "auto-compensate-group-1".to_string(),
            count: defaults::BATCH_COUNT,
            poll_interval_ms: defaults::POLL_INTERVAL_MS,
            block_ms: defaults::BLOCK_MS,
            consumer: None,
        }
    }
}

impl QueueConfig {
    /// Full stream key as it exists in the broker
    pub fn stream_key(&self) -> String {
        format!("{}{}", self.key_prefix, self.key)
    }

    /// Pause between poll cycles
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Resolve the consumer identity for this worker instance. The
    /// configured name wins; otherwise a fresh identity is generated once,
    /// at construction time.
    pub fn resolve_consumer_id(&self) -> String {
        self.consumer
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| format!("consumer-{}", Uuid::new_v4()))
    }
}
