use crate::clickhouse::{quote_identifier, ClickHouseClient};
use crate::domain::{
    AnalyticsRepository, DomainError, DomainResult, InsertTelemetryRowRepoInput, TelemetrySample,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clickhouse::Row;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

#[derive(Debug, Clone, Row, Serialize, Deserialize)]
pub struct TelemetryRow {
    pub device_id: String,
    #[serde(with = "clickhouse::serde::chrono::datetime")]
    pub time: DateTime<Utc>,
    pub temp_indoor: f64,
    pub temp_probe: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub eca_value: f64,
    pub ecb_value: f64,
    pub pha_value: f64,
    pub phb_value: f64,
    pub tanka_value: f64,
    pub tankb_value: f64,
}

impl From<&TelemetrySample> for TelemetryRow {
    fn from(sample: &TelemetrySample) -> Self {
        TelemetryRow {
            device_id: sample.device_id.clone(),
            time: sample.timestamp,
            temp_indoor: sample.indoor_temperature,
            temp_probe: sample.probe_temperature,
            humidity: sample.humidity,
            pressure: sample.pressure,
            eca_value: sample.ec_a,
            ecb_value: sample.ec_b,
            pha_value: sample.ph_a,
            phb_value: sample.ph_b,
            tanka_value: sample.tank_a,
            tankb_value: sample.tank_b,
        }
    }
}

/// ClickHouse implementation of AnalyticsRepository
#[derive(Clone)]
pub struct ClickHouseTelemetryRepository {
    client: ClickHouseClient,
}

impl ClickHouseTelemetryRepository {
    pub fn new(client: ClickHouseClient) -> Self {
        Self { client }
    }
}

fn classify_insert_error(
    table: &str,
    row: &TelemetryRow,
    err: clickhouse::error::Error,
) -> DomainError {
    match err {
        clickhouse::error::Error::Network(_) | clickhouse::error::Error::TimedOut => {
            DomainError::AnalyticsUnavailable(err.into())
        }
        other => {
            let reason = other.to_string();
            DomainError::AnalyticsInsert {
                table: table.to_string(),
                row_errors: vec![format!(
                    "device_id={} time={}: {}",
                    row.device_id,
                    row.time.timestamp(),
                    reason
                )],
                reason,
            }
        }
    }
}

#[async_trait]
impl AnalyticsRepository for ClickHouseTelemetryRepository {
    #[instrument(skip(self, input), fields(device_id = %input.sample.device_id, table = %input.target.qualified_table()))]
    async fn insert_telemetry_row(&self, input: InsertTelemetryRowRepoInput) -> DomainResult<()> {
        let table = input.target.qualified_table();
        let row = TelemetryRow::from(&input.sample);
        let client = self.client.for_dataset(&input.target.dataset);

        let mut insert = client
            .insert::<TelemetryRow>(&quote_identifier(&input.target.table))
            .await
            .map_err(|e| {
                error!("failed to create ClickHouse insert: {}", e);
                classify_insert_error(&table, &row, e)
            })?;

        insert
            .write(&row)
            .await
            .map_err(|e| classify_insert_error(&table, &row, e))?;

        insert
            .end()
            .await
            .map_err(|e| classify_insert_error(&table, &row, e))?;

        debug!(time = row.time.timestamp(), "inserted telemetry row");
        Ok(())
    }
}
