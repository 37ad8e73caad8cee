//! Consumer configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use crate::DispatchOptions;

/// Denormalizer configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `DATABASE_URL`: PostgreSQL connection string (required by the binary)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: `5`)
/// - `CONSUMER_GROUP`: checkpoint owner (default: `"denormalizer"`)
/// - `BATCH_SIZE`: maximum records per poll (default: `10`)
/// - `POLL_INTERVAL_MS`: idle wait between empty polls (default: `500`)
/// - `MAX_CONCURRENCY`: aggregates projected in parallel (default: `4`)
/// - `METRICS_ADDR`: Prometheus listener (default: `"0.0.0.0:9000"`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub consumer_group: String,
    pub batch_size: usize,
    pub poll_interval: Duration,
    pub max_concurrency: usize,
    pub metrics_addr: String,
    pub log_level: String,
}

impl ConsumerConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            database_max_connections: parse(&lookup, "DATABASE_MAX_CONNECTIONS")
                .unwrap_or(defaults.database_max_connections),
            consumer_group: lookup("CONSUMER_GROUP").unwrap_or(defaults.consumer_group),
            batch_size: parse(&lookup, "BATCH_SIZE")
                .filter(|&n: &usize| n > 0)
                .unwrap_or(defaults.batch_size),
            poll_interval: parse(&lookup, "POLL_INTERVAL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
            max_concurrency: parse(&lookup, "MAX_CONCURRENCY")
                .filter(|&n: &usize| n > 0)
                .unwrap_or(defaults.max_concurrency),
            metrics_addr: lookup("METRICS_ADDR").unwrap_or(defaults.metrics_addr),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
        }
    }

    /// Options for the batch dispatcher.
    pub fn dispatch_options(&self) -> DispatchOptions {
        DispatchOptions {
            batch_size: self.batch_size,
            max_concurrency: self.max_concurrency,
            poll_interval: self.poll_interval,
        }
    }
}

fn parse<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|value| value.trim().parse().ok())
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            database_max_connections: 5,
            consumer_group: "denormalizer".to_string(),
            batch_size: 10,
            poll_interval: Duration::from_millis(500),
            max_concurrency: 4,
            metrics_addr: "0.0.0.0:9000".to_string(),
            log_level: "info".to_string(),
        }
    }
}
