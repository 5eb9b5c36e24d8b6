use crate::clickhouse::ClickHouseConfig;
use crate::domain::AnalyticsTarget;
use anyhow::{Context, Result};
use clickhouse::Client;
use tracing::info;

/// Backtick-quote a database or table name for use in a statement.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
}

/// ClickHouse HTTP client. Cloning is cheap; each clone shares the
/// underlying connection pool.
#[derive(Clone)]
pub struct ClickHouseClient {
    client: Client,
}

impl ClickHouseClient {
    pub fn new(config: &ClickHouseConfig) -> Self {
        let client = Client::default()
            .with_url(&config.url)
            .with_user(&config.username)
            .with_password(&config.password)
            .with_compression(clickhouse::Compression::Lz4);

        Self { client }
    }

    pub async fn ping(&self) -> Result<()> {
        self.client.query("SELECT 1").fetch_one::<u8>().await?;
        Ok(())
    }

    /// Client bound to the target's dataset (ClickHouse database)
    pub fn for_dataset(&self, dataset: &str) -> Client {
        self.client.clone().with_database(dataset)
    }

    /// Create the dataset and telemetry table if they do not exist yet.
    ///
    /// MergeTree keeps every inserted row; duplicates are not collapsed.
    pub async fn ensure_telemetry_table(&self, target: &AnalyticsTarget) -> Result<()> {
        self.client
            .query(&format!(
                "CREATE DATABASE IF NOT EXISTS {}",
                quote_identifier(&target.dataset)
            ))
            .execute()
            .await
            .context("failed to create analytics dataset")?;

        self.client
            .query(&format!(
                "CREATE TABLE IF NOT EXISTS {}.{} (
                    device_id String,
                    time DateTime('UTC'),
                    temp_indoor Float64,
                    temp_probe Float64,
                    humidity Float64,
                    pressure Float64,
                    eca_value Float64,
                    ecb_value Float64,
                    pha_value Float64,
                    phb_value Float64,
                    tanka_value Float64,
                    tankb_value Float64
                ) ENGINE = MergeTree ORDER BY (device_id, time)",
                quote_identifier(&target.dataset),
                quote_identifier(&target.table)
            ))
            .execute()
            .await
            .context("failed to create analytics telemetry table")?;

        info!(table = %target.qualified_table(), "analytics table ready");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("telemetry"), "`telemetry`");
        assert_eq!(quote_identifier("grow-room"), "`grow-room`");
        assert_eq!(
            quote_identifier("t` ; DROP TABLE x; --"),
            "`t\\` ; DROP TABLE x; --`"
        );
        assert_eq!(quote_identifier("a\\b"), "`a\\\\b`");
    }
}
