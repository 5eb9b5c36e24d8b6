use crate::postgres::PostgresClient;
use anyhow::{Context, Result};
use tracing::info;

const SNAPSHOT_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS device_telemetry_snapshots (
    device_id     TEXT             NOT NULL,
    unix_ts       BIGINT           NOT NULL,
    document_path TEXT             NOT NULL,
    ingested_at   TIMESTAMPTZ      NOT NULL,
    temp_indoor   DOUBLE PRECISION NOT NULL,
    temp_probe    DOUBLE PRECISION NOT NULL,
    humidity      DOUBLE PRECISION NOT NULL,
    pressure      DOUBLE PRECISION NOT NULL,
    ec_a          DOUBLE PRECISION NOT NULL,
    ec_b          DOUBLE PRECISION NOT NULL,
    ph_a          DOUBLE PRECISION NOT NULL,
    ph_b          DOUBLE PRECISION NOT NULL,
    tank_a        DOUBLE PRECISION NOT NULL,
    tank_b        DOUBLE PRECISION NOT NULL,
    PRIMARY KEY (device_id, unix_ts)
);

CREATE TABLE IF NOT EXISTS device_state_snapshots (
    device_id     TEXT        NOT NULL,
    kind          TEXT        NOT NULL,
    document_path TEXT        NOT NULL,
    ingested_at   TIMESTAMPTZ NOT NULL,
    data          BYTEA       NOT NULL,
    label         TEXT,
    created_at    TIMESTAMPTZ NOT NULL,
    updated_at    TIMESTAMPTZ NOT NULL,
    PRIMARY KEY (device_id, kind)
);
"#;

/// Create the snapshot tables if they do not exist yet
pub async fn ensure_snapshot_schema(client: &PostgresClient) -> Result<()> {
    let conn = client.get_connection().await?;
    conn.batch_execute(SNAPSHOT_SCHEMA)
        .await
        .context("failed to create snapshot tables")?;
    info!("snapshot schema ready");
    Ok(())
}
