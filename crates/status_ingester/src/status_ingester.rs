use crate::domain::{IngestConfig, ProtobufStatusDecoder, StatusDispatcher};
use crate::nats::create_status_envelope_processor;
use async_nats::jetstream;
use common::domain::{AnalyticsRepository, SnapshotRepository};
use common::nats::{ConsumerSettings, NatsConsumer};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct StatusIngesterConfig {
    pub ingest: IngestConfig,
    pub consumer: ConsumerSettings,
}

/// Consumes device status messages and dispatches them to the stores
pub struct StatusIngester {
    consumer: NatsConsumer,
}

impl StatusIngester {
    pub async fn new(
        snapshot_repository: Arc<dyn SnapshotRepository>,
        analytics_repository: Arc<dyn AnalyticsRepository>,
        jetstream: &jetstream::Context,
        config: StatusIngesterConfig,
    ) -> anyhow::Result<Self> {
        info!(
            analytics_table = %config.ingest.analytics.qualified_table(),
            ignore_suffix = %config.ingest.ignore_suffix,
            "Initializing status ingester"
        );

        let dispatcher = Arc::new(StatusDispatcher::new(
            config.ingest,
            Arc::new(ProtobufStatusDecoder::new()),
            snapshot_repository,
            analytics_repository,
        ));

        let processor = create_status_envelope_processor(dispatcher);
        let consumer = NatsConsumer::new(jetstream, &config.consumer, processor).await?;

        info!("Status ingester initialized");
        Ok(Self { consumer })
    }

    pub async fn run(self, ctx: CancellationToken) -> anyhow::Result<()> {
        self.consumer.run(ctx).await
    }
}
