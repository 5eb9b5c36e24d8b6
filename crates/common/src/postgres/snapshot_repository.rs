use crate::domain::{
    CreateTelemetryDocumentRepoInput, DomainError, DomainResult, MergeStateDocumentRepoInput,
    SnapshotRepository,
};
use crate::postgres::PostgresClient;
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, instrument};

// PostgreSQL error code 23505 is unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL implementation of SnapshotRepository
///
/// Telemetry documents are rows in `device_telemetry_snapshots` keyed by
/// (device_id, unix_ts); state documents are rows in
/// `device_state_snapshots` keyed by (device_id, kind).
#[derive(Clone)]
pub struct PostgresSnapshotRepository {
    client: PostgresClient,
}

impl PostgresSnapshotRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SnapshotRepository for PostgresSnapshotRepository {
    #[instrument(skip(self, input), fields(device_id = %input.sample.device_id, unix_ts = input.sample.unix_timestamp()))]
    async fn create_telemetry_document(
        &self,
        input: CreateTelemetryDocumentRepoInput,
    ) -> DomainResult<()> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::SnapshotUnavailable)?;

        let path = input.path();
        let sample = &input.sample;
        let unix_ts = sample.unix_timestamp();

        let result = conn
            .execute(
                "INSERT INTO device_telemetry_snapshots (device_id, unix_ts, document_path, ingested_at,
                    temp_indoor, temp_probe, humidity, pressure, ec_a, ec_b, ph_a, ph_b, tank_a, tank_b)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
                &[
                    &sample.device_id,
                    &unix_ts,
                    &path,
                    &sample.timestamp,
                    &sample.indoor_temperature,
                    &sample.probe_temperature,
                    &sample.humidity,
                    &sample.pressure,
                    &sample.ec_a,
                    &sample.ec_b,
                    &sample.ph_a,
                    &sample.ph_b,
                    &sample.tank_a,
                    &sample.tank_b,
                ],
            )
            .await;

        if let Err(e) = result {
            if let Some(db_err) = e.as_db_error() {
                if db_err.code().code() == UNIQUE_VIOLATION {
                    return Err(DomainError::SnapshotConflict(path));
                }
            }
            return Err(DomainError::SnapshotUnavailable(e.into()));
        }

        debug!(path = %path, "created telemetry document");
        Ok(())
    }

    #[instrument(skip(self, input), fields(device_id = %input.device_id, kind = %input.kind))]
    async fn merge_state_document(&self, input: MergeStateDocumentRepoInput) -> DomainResult<()> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::SnapshotUnavailable)?;

        let path = input.path();
        let now = Utc::now();

        // Only ingested_at, data and updated_at are touched on conflict
        conn.execute(
            "INSERT INTO device_state_snapshots (device_id, kind, document_path, ingested_at, data, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $6)
             ON CONFLICT (device_id, kind) DO UPDATE
             SET ingested_at = EXCLUDED.ingested_at,
                 data = EXCLUDED.data,
                 updated_at = EXCLUDED.updated_at",
            &[
                &input.device_id,
                &input.kind.as_str(),
                &path,
                &input.timestamp,
                &input.data,
                &now,
            ],
        )
        .await
        .map_err(|e| DomainError::SnapshotUnavailable(e.into()))?;

        debug!(path = %path, bytes = input.data.len(), "merged state document");
        Ok(())
    }
}
