use anyhow::{Context, Result};
use async_nats::jetstream::{self, consumer::PullConsumer, Message};
use futures::{future::BoxFuture, StreamExt};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Result of processing a batch of messages.
///
/// Each index in the fetched batch should appear in exactly one list.
#[derive(Debug, Default, PartialEq)]
pub struct ProcessingResult {
    /// Messages that were handled and should be acknowledged (Ack)
    pub ack: Vec<usize>,
    /// Messages that failed transiently and should be redelivered (Nak)
    pub nak: Vec<(usize, Option<String>)>,
    /// Messages that can never succeed and must not be redelivered (Term)
    pub term: Vec<(usize, Option<String>)>,
}

impl ProcessingResult {
    pub fn nak_all(count: usize, error: Option<String>) -> Self {
        Self {
            nak: (0..count).map(|i| (i, error.clone())).collect(),
            ..Default::default()
        }
    }
}

/// Takes a slice of raw NATS messages and decides which to ack, nak or terminate
pub type BatchProcessor =
    Box<dyn Fn(&[Message]) -> BoxFuture<'static, Result<ProcessingResult>> + Send + Sync>;

/// Settings for a durable pull consumer
#[derive(Debug, Clone)]
pub struct ConsumerSettings {
    pub stream_name: String,
    pub consumer_name: String,
    pub subject_filter: String,
    pub batch_size: usize,
    pub max_wait: Duration,
}

/// Generic NATS JetStream consumer that processes batches of messages.
/// Fetching and acknowledgment live here; decoding and business logic belong to the processor.
pub struct NatsConsumer {
    consumer: PullConsumer,
    batch_size: usize,
    max_wait: Duration,
    processor: BatchProcessor,
}

impl NatsConsumer {
    pub async fn new(
        jetstream: &jetstream::Context,
        settings: &ConsumerSettings,
        processor: BatchProcessor,
    ) -> Result<Self> {
        debug!(
            stream = %settings.stream_name,
            consumer = %settings.consumer_name,
            subject = %settings.subject_filter,
            "Creating JetStream consumer"
        );

        let consumer = jetstream
            .create_consumer_on_stream(
                jetstream::consumer::pull::Config {
                    name: Some(settings.consumer_name.clone()),
                    durable_name: Some(settings.consumer_name.clone()),
                    filter_subject: settings.subject_filter.clone(),
                    ack_policy: jetstream::consumer::AckPolicy::Explicit,
                    ..Default::default()
                },
                settings.stream_name.as_str(),
            )
            .await
            .context("Failed to create consumer")?;

        info!(
            stream = %settings.stream_name,
            consumer = %settings.consumer_name,
            "Consumer created successfully"
        );

        Ok(Self {
            consumer,
            batch_size: settings.batch_size,
            max_wait: settings.max_wait,
            processor,
        })
    }

    pub async fn run(&self, ctx: CancellationToken) -> Result<()> {
        info!("Starting consumer loop");

        loop {
            tokio::select! {
                _ = ctx.cancelled() => {
                    info!("Received shutdown signal, stopping consumer");
                    break;
                }
                result = self.fetch_and_process_batch() => {
                    if let Err(e) = result {
                        error!(error = %e, "Error processing batch");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        }

        info!("Consumer stopped gracefully");
        Ok(())
    }

    async fn fetch_and_process_batch(&self) -> Result<()> {
        let mut messages = self
            .consumer
            .fetch()
            .max_messages(self.batch_size)
            .expires(self.max_wait)
            .messages()
            .await
            .context("Failed to fetch messages")?;

        let mut raw_messages = Vec::new();
        while let Some(result) = messages.next().await {
            match result {
                Ok(msg) => raw_messages.push(msg),
                Err(e) => warn!(error = %e, "Error receiving message from batch"),
            }
        }

        if raw_messages.is_empty() {
            debug!("No messages in batch");
            return Ok(());
        }

        debug!(message_count = raw_messages.len(), "Received message batch");

        let processing_result = match (self.processor)(&raw_messages).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "Processor returned error, rejecting all messages");
                ProcessingResult::nak_all(raw_messages.len(), Some(e.to_string()))
            }
        };

        for idx in processing_result.ack {
            match raw_messages.get(idx) {
                Some(msg) => {
                    if let Err(e) = msg.ack().await {
                        error!(error = %e, message_index = idx, "Failed to acknowledge message");
                    }
                }
                None => warn!(message_index = idx, "Invalid ack index in ProcessingResult"),
            }
        }

        for (idx, error_msg) in processing_result.nak {
            match raw_messages.get(idx) {
                Some(msg) => {
                    warn!(
                        message_index = idx,
                        subject = %msg.subject,
                        error = error_msg.as_deref().unwrap_or(""),
                        "Rejecting message for redelivery"
                    );
                    if let Err(e) = msg.ack_with(jetstream::AckKind::Nak(None)).await {
                        error!(error = %e, message_index = idx, "Failed to nak message");
                    }
                }
                None => warn!(message_index = idx, "Invalid nak index in ProcessingResult"),
            }
        }

        for (idx, error_msg) in processing_result.term {
            match raw_messages.get(idx) {
                Some(msg) => {
                    error!(
                        message_index = idx,
                        subject = %msg.subject,
                        error = error_msg.as_deref().unwrap_or(""),
                        "Terminating message that cannot be processed"
                    );
                    if let Err(e) = msg.ack_with(jetstream::AckKind::Term).await {
                        error!(error = %e, message_index = idx, "Failed to terminate message");
                    }
                }
                None => warn!(message_index = idx, "Invalid term index in ProcessingResult"),
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nak_all_carries_error() {
        let result = ProcessingResult::nak_all(2, Some("boom".to_string()));
        assert!(result.ack.is_empty());
        assert!(result.term.is_empty());
        assert_eq!(
            result.nak,
            vec![(0, Some("boom".to_string())), (1, Some("boom".to_string()))]
        );
    }
}
