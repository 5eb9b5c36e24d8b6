use common::clickhouse::ClickHouseConfig;
use common::domain::AnalyticsTarget;
use common::nats::ConsumerSettings;
use common::postgres::PostgresConfig;
use common::telemetry::TelemetryConfig;
use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};
use status_ingester::domain::IngestConfig;
use std::fmt;
use std::time::Duration;

#[derive(Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    // NATS configuration
    #[serde(default = "default_nats_url")]
    pub nats_url: String,

    /// JetStream stream carrying device status messages
    #[serde(default = "default_nats_stream")]
    pub nats_stream: String,

    /// Subject filter for the status consumer
    #[serde(default = "default_nats_subject")]
    pub nats_subject: String,

    /// Durable consumer name
    #[serde(default = "default_nats_consumer_name")]
    pub nats_consumer_name: String,

    #[serde(default = "default_nats_batch_size")]
    pub nats_batch_size: usize,

    /// Max wait time for batches in seconds
    #[serde(default = "default_nats_batch_wait_secs")]
    pub nats_batch_wait_secs: u64,

    /// Startup timeout for connecting stores and transport in seconds
    #[serde(default = "default_startup_timeout_secs")]
    pub startup_timeout_secs: u64,

    // PostgreSQL configuration (snapshot store)
    #[serde(default = "default_postgres_host")]
    pub postgres_host: String,

    #[serde(default = "default_postgres_port")]
    pub postgres_port: u16,

    #[serde(default = "default_postgres_database")]
    pub postgres_database: String,

    #[serde(default = "default_postgres_username")]
    pub postgres_username: String,

    #[serde(default = "default_postgres_password")]
    pub postgres_password: String,

    #[serde(default = "default_postgres_max_pool_size")]
    pub postgres_max_pool_size: usize,

    // ClickHouse configuration (analytics store)
    #[serde(default = "default_clickhouse_url")]
    pub clickhouse_url: String,

    #[serde(default = "default_clickhouse_username")]
    pub clickhouse_username: String,

    #[serde(default = "default_clickhouse_password")]
    pub clickhouse_password: String,

    /// Analytics dataset (ClickHouse database)
    #[serde(default = "default_analytics_dataset")]
    pub analytics_dataset: String,

    #[serde(default = "default_analytics_table")]
    pub analytics_table: String,

    /// Device id suffix whose envelopes are dropped; empty disables the filter
    #[serde(default)]
    pub ignore_suffix: String,

    // OpenTelemetry configuration
    #[serde(default = "default_otel_endpoint")]
    pub otel_endpoint: String,

    #[serde(default)]
    pub otel_enabled: bool,

    #[serde(default = "default_otel_service_name")]
    pub otel_service_name: String,
}

const REDACTED: &str = "<redacted>";

// passwords never reach the logs
impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("log_level", &self.log_level)
            .field("nats_url", &self.nats_url)
            .field("nats_stream", &self.nats_stream)
            .field("nats_subject", &self.nats_subject)
            .field("nats_consumer_name", &self.nats_consumer_name)
            .field("nats_batch_size", &self.nats_batch_size)
            .field("nats_batch_wait_secs", &self.nats_batch_wait_secs)
            .field("startup_timeout_secs", &self.startup_timeout_secs)
            .field("postgres_host", &self.postgres_host)
            .field("postgres_port", &self.postgres_port)
            .field("postgres_database", &self.postgres_database)
            .field("postgres_username", &self.postgres_username)
            .field("postgres_password", &REDACTED)
            .field("postgres_max_pool_size", &self.postgres_max_pool_size)
            .field("clickhouse_url", &self.clickhouse_url)
            .field("clickhouse_username", &self.clickhouse_username)
            .field("clickhouse_password", &REDACTED)
            .field("analytics_dataset", &self.analytics_dataset)
            .field("analytics_table", &self.analytics_table)
            .field("ignore_suffix", &self.ignore_suffix)
            .field("otel_endpoint", &self.otel_endpoint)
            .field("otel_enabled", &self.otel_enabled)
            .field("otel_service_name", &self.otel_service_name)
            .finish()
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("HYDROPONICS"))
            .build()?
            .try_deserialize()
    }

    pub fn ingest_config(&self) -> IngestConfig {
        IngestConfig {
            ignore_suffix: self.ignore_suffix.clone(),
            analytics: AnalyticsTarget {
                dataset: self.analytics_dataset.clone(),
                table: self.analytics_table.clone(),
            },
        }
    }

    pub fn consumer_settings(&self) -> ConsumerSettings {
        ConsumerSettings {
            stream_name: self.nats_stream.clone(),
            consumer_name: self.nats_consumer_name.clone(),
            subject_filter: self.nats_subject.clone(),
            batch_size: self.nats_batch_size,
            max_wait: Duration::from_secs(self.nats_batch_wait_secs),
        }
    }

    pub fn postgres_config(&self) -> PostgresConfig {
        PostgresConfig {
            host: self.postgres_host.clone(),
            port: self.postgres_port,
            database: self.postgres_database.clone(),
            username: self.postgres_username.clone(),
            password: self.postgres_password.clone(),
            max_pool_size: self.postgres_max_pool_size,
        }
    }

    pub fn clickhouse_config(&self) -> ClickHouseConfig {
        ClickHouseConfig {
            url: self.clickhouse_url.clone(),
            username: self.clickhouse_username.clone(),
            password: self.clickhouse_password.clone(),
        }
    }

    pub fn telemetry_config(&self) -> TelemetryConfig {
        TelemetryConfig {
            service_name: self.otel_service_name.clone(),
            otel_endpoint: self.otel_endpoint.clone(),
            otel_enabled: self.otel_enabled,
            log_level: self.log_level.clone(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_nats_url() -> String {
    "nats://localhost:4222".to_string()
}

fn default_nats_stream() -> String {
    "device_status".to_string()
}

fn default_nats_subject() -> String {
    "device_status.>".to_string()
}

fn default_nats_consumer_name() -> String {
    "status-ingester".to_string()
}

fn default_nats_batch_size() -> usize {
    30
}

fn default_nats_batch_wait_secs() -> u64 {
    5
}

fn default_startup_timeout_secs() -> u64 {
    30
}

fn default_postgres_host() -> String {
    "localhost".to_string()
}

fn default_postgres_port() -> u16 {
    5432
}

fn default_postgres_database() -> String {
    "hydroponics".to_string()
}

fn default_postgres_username() -> String {
    "hydroponics".to_string()
}

fn default_postgres_password() -> String {
    "hydroponics".to_string()
}

fn default_postgres_max_pool_size() -> usize {
    10
}

fn default_clickhouse_url() -> String {
    "http://localhost:8123".to_string()
}

fn default_clickhouse_username() -> String {
    "default".to_string()
}

fn default_clickhouse_password() -> String {
    "".to_string()
}

fn default_analytics_dataset() -> String {
    "hydroponics".to_string()
}

fn default_analytics_table() -> String {
    "telemetry".to_string()
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_otel_service_name() -> String {
    "hydroponics-all-in-one".to_string()
}
