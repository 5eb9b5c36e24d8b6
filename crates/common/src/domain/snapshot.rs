use crate::domain::{DomainResult, StatusKind, TelemetrySample};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// `devices/{device_id}/telemetry/{unix_ts}`
pub fn telemetry_document_path(device_id: &str, unix_ts: i64) -> String {
    format!("devices/{}/telemetry/{}", device_id, unix_ts)
}

/// `devices/{device_id}/state/{kind}`
pub fn state_document_path(device_id: &str, kind: StatusKind) -> String {
    format!("devices/{}/state/{}", device_id, kind.as_str())
}

/// Input for creating a telemetry document (create semantics)
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTelemetryDocumentRepoInput {
    pub sample: TelemetrySample,
}

impl CreateTelemetryDocumentRepoInput {
    pub fn path(&self) -> String {
        telemetry_document_path(&self.sample.device_id, self.sample.unix_timestamp())
    }
}

/// Input for merging a latest-value state document (merge semantics)
#[derive(Debug, Clone, PartialEq)]
pub struct MergeStateDocumentRepoInput {
    pub device_id: String,
    pub kind: StatusKind,
    pub timestamp: DateTime<Utc>,
    pub data: Vec<u8>,
}

impl MergeStateDocumentRepoInput {
    pub fn path(&self) -> String {
        state_document_path(&self.device_id, self.kind)
    }
}

/// Repository trait for the latest-value snapshot store
/// Infrastructure layer (e.g., PostgreSQL) implements this trait
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// Create the telemetry document for one device and second.
    ///
    /// Fails with `SnapshotConflict` when the document already exists.
    async fn create_telemetry_document(
        &self,
        input: CreateTelemetryDocumentRepoInput,
    ) -> DomainResult<()>;

    /// Write `timestamp` and `data` onto the state document for
    /// (device, kind), creating it if needed. Other fields are preserved.
    async fn merge_state_document(&self, input: MergeStateDocumentRepoInput) -> DomainResult<()>;
}
