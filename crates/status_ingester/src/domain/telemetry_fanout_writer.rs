use common::domain::{
    AnalyticsRepository, AnalyticsTarget, CreateTelemetryDocumentRepoInput, DomainError,
    DomainResult, InsertTelemetryRowRepoInput, SnapshotRepository, TelemetrySample,
};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Writes one telemetry sample to the snapshot store and the analytics store.
///
/// Both writes start together and always run to completion; neither is
/// cancelled when the other fails. When both fail the snapshot error wins.
/// There is no cross-store transaction, so one store may hold the sample
/// while the other does not.
pub struct TelemetryFanoutWriter {
    snapshot_repository: Arc<dyn SnapshotRepository>,
    analytics_repository: Arc<dyn AnalyticsRepository>,
    target: AnalyticsTarget,
}

impl TelemetryFanoutWriter {
    pub fn new(
        snapshot_repository: Arc<dyn SnapshotRepository>,
        analytics_repository: Arc<dyn AnalyticsRepository>,
        target: AnalyticsTarget,
    ) -> Self {
        Self {
            snapshot_repository,
            analytics_repository,
            target,
        }
    }

    #[instrument(skip(self, sample), fields(device_id = %sample.device_id, unix_ts = sample.unix_timestamp()))]
    pub async fn write(&self, sample: TelemetrySample) -> DomainResult<()> {
        let snapshot_write =
            self.snapshot_repository
                .create_telemetry_document(CreateTelemetryDocumentRepoInput {
                    sample: sample.clone(),
                });
        let analytics_write =
            self.analytics_repository
                .insert_telemetry_row(InsertTelemetryRowRepoInput {
                    target: self.target.clone(),
                    sample,
                });

        let (snapshot_result, analytics_result) = tokio::join!(snapshot_write, analytics_write);

        if let Err(DomainError::AnalyticsInsert {
            table, row_errors, ..
        }) = &analytics_result
        {
            for row_error in row_errors {
                warn!(table = %table, row_error = %row_error, "analytics store rejected row");
            }
        }

        match (snapshot_result, analytics_result) {
            (Ok(()), Ok(())) => {
                debug!("telemetry written to both stores");
                Ok(())
            }
            (Err(snapshot_err), Err(analytics_err)) => {
                warn!(
                    error = %analytics_err,
                    "analytics write also failed, reporting snapshot error"
                );
                Err(snapshot_err)
            }
            (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
        }
    }
}
