use chrono::{DateTime, Utc};
use common::domain::{DomainResult, MergeStateDocumentRepoInput, SnapshotRepository, StatusKind};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Keeps the latest non-telemetry report per device and kind.
///
/// Writes merge onto `devices/{device_id}/state/{kind}`, so replaying the
/// same report only refreshes `timestamp` and `data`.
pub struct SnapshotUpserter {
    repository: Arc<dyn SnapshotRepository>,
}

impl SnapshotUpserter {
    pub fn new(repository: Arc<dyn SnapshotRepository>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self, data), fields(device_id = %device_id, kind = %kind, bytes = data.len()))]
    pub async fn upsert(
        &self,
        device_id: &str,
        kind: StatusKind,
        timestamp: DateTime<Utc>,
        data: Vec<u8>,
    ) -> DomainResult<()> {
        let input = MergeStateDocumentRepoInput {
            device_id: device_id.to_string(),
            kind,
            timestamp,
            data,
        };
        let path = input.path();

        self.repository.merge_state_document(input).await?;

        debug!(path = %path, "merged state snapshot");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use common::domain::{DomainError, MockSnapshotRepository};

    #[tokio::test]
    async fn test_upsert_merges_state_document() {
        let mut repository = MockSnapshotRepository::new();
        let timestamp = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

        repository
            .expect_merge_state_document()
            .withf(move |input: &MergeStateDocumentRepoInput| {
                input.device_id == "grow-1"
                    && input.kind == StatusKind::OutputSet
                    && input.timestamp == timestamp
                    && input.data == vec![0x2a, 0x02]
                    && input.path() == "devices/grow-1/state/outputs"
            })
            .times(1)
            .return_once(|_| Ok(()));

        let upserter = SnapshotUpserter::new(Arc::new(repository));
        let result = upserter
            .upsert("grow-1", StatusKind::OutputSet, timestamp, vec![0x2a, 0x02])
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_upsert_surfaces_store_failure() {
        let mut repository = MockSnapshotRepository::new();
        repository
            .expect_merge_state_document()
            .times(1)
            .return_once(|_| {
                Err(DomainError::SnapshotUnavailable(anyhow::anyhow!(
                    "connection refused"
                )))
            });

        let upserter = SnapshotUpserter::new(Arc::new(repository));
        let result = upserter
            .upsert("grow-1", StatusKind::MemoryStats, Utc::now(), vec![])
            .await;

        assert!(matches!(result, Err(DomainError::SnapshotUnavailable(_))));
    }
}
