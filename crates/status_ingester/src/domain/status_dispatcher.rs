use crate::domain::{IngestConfig, SnapshotUpserter, StatusDecoder, TelemetryFanoutWriter};
use common::domain::{
    AnalyticsRepository, DomainError, DomainResult, SnapshotRepository, StatusEnvelope,
    StatusRecord, TelemetrySample,
};
use common::garde::validate_struct;
use std::sync::Arc;
use tracing::{debug, instrument};

/// What happened to an envelope that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The device id carries the ignore suffix; nothing was decoded or written.
    Ignored,
    /// The batch was walked to its end.
    Processed { records: usize },
}

/// The error that aborted a batch and where in the batch it happened.
#[derive(Debug)]
pub struct DispatchFailure {
    pub error: DomainError,
    /// Index of the failing record; `None` when the envelope failed before any record ran.
    pub record: Option<usize>,
    /// Records after the failing one that were never attempted.
    pub remaining: usize,
}

impl From<DomainError> for DispatchFailure {
    fn from(error: DomainError) -> Self {
        Self {
            error,
            record: None,
            remaining: 0,
        }
    }
}

/// Routes each record of a delivered envelope to its store.
///
/// Flow:
/// 1. Drop envelopes from devices carrying the ignore suffix
/// 2. Validate the envelope
/// 3. Decode the payload into a batch
/// 4. Walk the batch in order: telemetry goes to the fan-out writer,
///    everything else to the snapshot upserter
///
/// The first failing record aborts the batch. Records already written stay
/// written; redelivery relies on merge-safe snapshots and conflict-safe
/// telemetry.
pub struct StatusDispatcher {
    config: IngestConfig,
    decoder: Arc<dyn StatusDecoder>,
    upserter: SnapshotUpserter,
    fanout_writer: TelemetryFanoutWriter,
}

impl StatusDispatcher {
    pub fn new(
        config: IngestConfig,
        decoder: Arc<dyn StatusDecoder>,
        snapshot_repository: Arc<dyn SnapshotRepository>,
        analytics_repository: Arc<dyn AnalyticsRepository>,
    ) -> Self {
        let upserter = SnapshotUpserter::new(snapshot_repository.clone());
        let fanout_writer = TelemetryFanoutWriter::new(
            snapshot_repository,
            analytics_repository,
            config.analytics.clone(),
        );

        Self {
            config,
            decoder,
            upserter,
            fanout_writer,
        }
    }

    pub async fn dispatch(&self, envelope: &StatusEnvelope) -> DomainResult<DispatchOutcome> {
        self.dispatch_from(envelope, 0)
            .await
            .map_err(|failure| failure.error)
    }

    /// Dispatch the records of `envelope` starting at index `start`.
    ///
    /// Records before `start` are decoded but not written. Callers use this to
    /// resume a redelivered batch past a record that an earlier delivery
    /// already committed.
    #[instrument(skip(self, envelope), fields(device_id = %envelope.device_id, project_id = %envelope.project_id))]
    pub async fn dispatch_from(
        &self,
        envelope: &StatusEnvelope,
        start: usize,
    ) -> Result<DispatchOutcome, DispatchFailure> {
        if envelope.is_ignored(&self.config.ignore_suffix) {
            debug!(suffix = %self.config.ignore_suffix, "ignoring envelope from filtered device");
            return Ok(DispatchOutcome::Ignored);
        }

        validate_struct(envelope)?;

        let batch = self.decoder.decode(&envelope.payload)?;
        let records = batch.len();

        for (index, entry) in batch.entries.into_iter().enumerate().skip(start) {
            let kind = entry.record.kind();
            debug!(
                index,
                kind = %kind,
                device_timestamp = entry.device_timestamp,
                "dispatching record"
            );

            let result = match entry.record {
                StatusRecord::Telemetry(reading) => {
                    let sample = TelemetrySample::from_reading(
                        envelope.device_id.clone(),
                        envelope.ingested_at,
                        &reading,
                    );
                    self.fanout_writer.write(sample).await
                }
                _ => {
                    self.upserter
                        .upsert(&envelope.device_id, kind, envelope.ingested_at, entry.raw)
                        .await
                }
            };

            if let Err(error) = result {
                debug!(index, kind = %kind, error = %error, "record failed, aborting batch");
                return Err(DispatchFailure {
                    error,
                    record: Some(index),
                    remaining: records - index - 1,
                });
            }
        }

        debug!(records, start, "status batch dispatched");
        Ok(DispatchOutcome::Processed { records })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MockStatusDecoder;
    use chrono::{TimeZone, Utc};
    use common::domain::{
        AnalyticsTarget, BatchEntry, CreateTelemetryDocumentRepoInput, DomainError,
        MemoryStats, MergeStateDocumentRepoInput, MockAnalyticsRepository,
        MockSnapshotRepository, OutputGroup, OutputSet, StatusBatch, StatusKind,
        TelemetryReading,
    };
    use mockall::Sequence;

    fn config(ignore_suffix: &str) -> IngestConfig {
        IngestConfig {
            ignore_suffix: ignore_suffix.to_string(),
            analytics: AnalyticsTarget {
                dataset: "hydroponics".to_string(),
                table: "telemetry".to_string(),
            },
        }
    }

    fn envelope(device_id: &str) -> StatusEnvelope {
        StatusEnvelope {
            device_id: device_id.to_string(),
            project_id: "greenhouse".to_string(),
            ingested_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            payload: vec![0x0a, 0x00],
        }
    }

    fn entry(record: StatusRecord, raw: u8) -> BatchEntry {
        BatchEntry {
            record,
            device_timestamp: 0,
            raw: vec![raw],
        }
    }

    fn outputs() -> StatusRecord {
        StatusRecord::OutputSet(OutputSet {
            groups: vec![OutputGroup {
                outputs: vec![1, 2],
                state: 1,
            }],
        })
    }

    fn memory() -> StatusRecord {
        StatusRecord::MemoryStats(MemoryStats {
            min_free: 512,
            free: 2048,
        })
    }

    fn telemetry() -> StatusRecord {
        StatusRecord::Telemetry(TelemetryReading {
            temp_indoor: 21.5,
            ..Default::default()
        })
    }

    fn dispatcher(
        config: IngestConfig,
        decoder: MockStatusDecoder,
        snapshot: MockSnapshotRepository,
        analytics: MockAnalyticsRepository,
    ) -> StatusDispatcher {
        StatusDispatcher::new(
            config,
            Arc::new(decoder),
            Arc::new(snapshot),
            Arc::new(analytics),
        )
    }

    #[tokio::test]
    async fn test_ignored_device_is_never_decoded() {
        let mut decoder = MockStatusDecoder::new();
        decoder.expect_decode().times(0);

        let dispatcher = dispatcher(
            config("-test"),
            decoder,
            MockSnapshotRepository::new(),
            MockAnalyticsRepository::new(),
        );

        let result = dispatcher.dispatch(&envelope("grow-1-test")).await;
        assert_eq!(result.unwrap(), DispatchOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_empty_suffix_disables_filter() {
        let mut decoder = MockStatusDecoder::new();
        decoder
            .expect_decode()
            .times(1)
            .returning(|_| Ok(StatusBatch::default()));

        let dispatcher = dispatcher(
            config(""),
            decoder,
            MockSnapshotRepository::new(),
            MockAnalyticsRepository::new(),
        );

        let result = dispatcher.dispatch(&envelope("grow-1-test")).await;
        assert_eq!(result.unwrap(), DispatchOutcome::Processed { records: 0 });
    }

    #[tokio::test]
    async fn test_empty_device_id_fails_validation() {
        let mut decoder = MockStatusDecoder::new();
        decoder.expect_decode().times(0);

        let dispatcher = dispatcher(
            config("-test"),
            decoder,
            MockSnapshotRepository::new(),
            MockAnalyticsRepository::new(),
        );

        let result = dispatcher.dispatch(&envelope("")).await;
        assert!(matches!(result, Err(DomainError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_decode_failure_performs_no_writes() {
        let mut decoder = MockStatusDecoder::new();
        decoder
            .expect_decode()
            .times(1)
            .returning(|_| Err(DomainError::EmptyPayload));

        let mut snapshot = MockSnapshotRepository::new();
        snapshot.expect_create_telemetry_document().times(0);
        snapshot.expect_merge_state_document().times(0);
        let mut analytics = MockAnalyticsRepository::new();
        analytics.expect_insert_telemetry_row().times(0);

        let dispatcher = dispatcher(config(""), decoder, snapshot, analytics);

        let result = dispatcher.dispatch(&envelope("grow-1")).await;
        assert!(matches!(result, Err(DomainError::EmptyPayload)));
    }

    #[tokio::test]
    async fn test_records_are_routed_in_batch_order() {
        let mut decoder = MockStatusDecoder::new();
        decoder.expect_decode().times(1).returning(|_| {
            Ok(StatusBatch {
                entries: vec![entry(memory(), 1), entry(telemetry(), 2), entry(outputs(), 3)],
            })
        });

        let mut seq = Sequence::new();
        let mut snapshot = MockSnapshotRepository::new();
        let mut analytics = MockAnalyticsRepository::new();

        snapshot
            .expect_merge_state_document()
            .withf(|input: &MergeStateDocumentRepoInput| {
                input.kind == StatusKind::MemoryStats && input.data == vec![1]
            })
            .times(1)
            .in_sequence(&mut seq)
            .return_once(|_| Ok(()));
        snapshot
            .expect_create_telemetry_document()
            .withf(|input: &CreateTelemetryDocumentRepoInput| {
                input.sample.timestamp.timestamp() == 1_700_000_000
                    && input.sample.device_id == "grow-1"
            })
            .times(1)
            .in_sequence(&mut seq)
            .return_once(|_| Ok(()));
        snapshot
            .expect_merge_state_document()
            .withf(|input: &MergeStateDocumentRepoInput| {
                input.kind == StatusKind::OutputSet && input.data == vec![3]
            })
            .times(1)
            .in_sequence(&mut seq)
            .return_once(|_| Ok(()));
        analytics
            .expect_insert_telemetry_row()
            .times(1)
            .return_once(|_| Ok(()));

        let dispatcher = dispatcher(config(""), decoder, snapshot, analytics);

        let result = dispatcher.dispatch(&envelope("grow-1")).await;
        assert_eq!(result.unwrap(), DispatchOutcome::Processed { records: 3 });
    }

    #[tokio::test]
    async fn test_second_record_failure_stops_batch() {
        let mut decoder = MockStatusDecoder::new();
        decoder.expect_decode().times(1).returning(|_| {
            Ok(StatusBatch {
                entries: vec![entry(outputs(), 1), entry(telemetry(), 2), entry(memory(), 3)],
            })
        });

        let mut snapshot = MockSnapshotRepository::new();
        let mut analytics = MockAnalyticsRepository::new();

        snapshot
            .expect_merge_state_document()
            .withf(|input: &MergeStateDocumentRepoInput| input.kind == StatusKind::OutputSet)
            .times(1)
            .return_once(|_| Ok(()));
        snapshot
            .expect_create_telemetry_document()
            .times(1)
            .return_once(|input| Err(DomainError::SnapshotConflict(input.path())));
        analytics
            .expect_insert_telemetry_row()
            .times(1)
            .return_once(|_| Ok(()));
        snapshot
            .expect_merge_state_document()
            .withf(|input: &MergeStateDocumentRepoInput| input.kind == StatusKind::MemoryStats)
            .times(0);

        let dispatcher = dispatcher(config(""), decoder, snapshot, analytics);

        match dispatcher.dispatch(&envelope("grow-1")).await {
            Err(DomainError::SnapshotConflict(path)) => {
                assert_eq!(path, "devices/grow-1/telemetry/1700000000")
            }
            other => panic!("expected SnapshotConflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failure_reports_position_in_batch() {
        let mut decoder = MockStatusDecoder::new();
        decoder.expect_decode().times(1).returning(|_| {
            Ok(StatusBatch {
                entries: vec![entry(telemetry(), 1), entry(memory(), 2), entry(outputs(), 3)],
            })
        });

        let mut snapshot = MockSnapshotRepository::new();
        let mut analytics = MockAnalyticsRepository::new();
        snapshot
            .expect_create_telemetry_document()
            .times(1)
            .return_once(|input| Err(DomainError::SnapshotConflict(input.path())));
        analytics
            .expect_insert_telemetry_row()
            .times(1)
            .return_once(|_| Ok(()));
        snapshot.expect_merge_state_document().times(0);

        let dispatcher = dispatcher(config(""), decoder, snapshot, analytics);

        let failure = dispatcher
            .dispatch_from(&envelope("grow-1"), 0)
            .await
            .unwrap_err();
        assert!(matches!(failure.error, DomainError::SnapshotConflict(_)));
        assert_eq!(failure.record, Some(0));
        assert_eq!(failure.remaining, 2);
    }

    #[tokio::test]
    async fn test_dispatch_from_skips_earlier_records() {
        let mut decoder = MockStatusDecoder::new();
        decoder.expect_decode().times(1).returning(|_| {
            Ok(StatusBatch {
                entries: vec![entry(telemetry(), 1), entry(memory(), 2), entry(outputs(), 3)],
            })
        });

        let mut seq = Sequence::new();
        let mut snapshot = MockSnapshotRepository::new();
        let mut analytics = MockAnalyticsRepository::new();
        snapshot.expect_create_telemetry_document().times(0);
        analytics.expect_insert_telemetry_row().times(0);
        snapshot
            .expect_merge_state_document()
            .withf(|input: &MergeStateDocumentRepoInput| input.kind == StatusKind::MemoryStats)
            .times(1)
            .in_sequence(&mut seq)
            .return_once(|_| Ok(()));
        snapshot
            .expect_merge_state_document()
            .withf(|input: &MergeStateDocumentRepoInput| input.kind == StatusKind::OutputSet)
            .times(1)
            .in_sequence(&mut seq)
            .return_once(|_| Ok(()));

        let dispatcher = dispatcher(config(""), decoder, snapshot, analytics);

        let outcome = dispatcher.dispatch_from(&envelope("grow-1"), 1).await.unwrap();
        assert_eq!(outcome, DispatchOutcome::Processed { records: 3 });
    }

    #[tokio::test]
    async fn test_pre_record_failure_has_no_position() {
        let mut decoder = MockStatusDecoder::new();
        decoder
            .expect_decode()
            .times(1)
            .returning(|_| Err(DomainError::MalformedBatch("truncated".to_string())));

        let dispatcher = dispatcher(
            config(""),
            decoder,
            MockSnapshotRepository::new(),
            MockAnalyticsRepository::new(),
        );

        let failure = dispatcher
            .dispatch_from(&envelope("grow-1"), 0)
            .await
            .unwrap_err();
        assert!(matches!(failure.error, DomainError::MalformedBatch(_)));
        assert_eq!(failure.record, None);
    }
}
