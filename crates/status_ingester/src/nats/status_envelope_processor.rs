use crate::domain::{DispatchFailure, StatusDispatcher};
use anyhow::{anyhow, Result};
use async_nats::jetstream::Message;
use async_nats::HeaderMap;
use chrono::{DateTime, Utc};
use common::domain::{DomainError, StatusEnvelope};
use common::nats::{BatchProcessor, ProcessingResult};
use std::sync::Arc;
use tracing::{debug, error, warn};

pub const DEVICE_ID_HEADER: &str = "Device-Id";
pub const PROJECT_ID_HEADER: &str = "Project-Id";

/// How the transport should settle one delivered message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Ack,
    Nak(String),
    Term(String),
}

/// Build an envelope from the parts of a delivered message.
///
/// `published` is the JetStream publish time from the delivery metadata.
pub fn envelope_from_parts(
    headers: Option<&HeaderMap>,
    published: Option<DateTime<Utc>>,
    payload: &[u8],
) -> Result<StatusEnvelope> {
    let header = |name: &str| {
        headers
            .and_then(|h| h.get(name))
            .map(|value| value.as_str().to_string())
    };

    let device_id =
        header(DEVICE_ID_HEADER).ok_or_else(|| anyhow!("missing {} header", DEVICE_ID_HEADER))?;
    let project_id = header(PROJECT_ID_HEADER).unwrap_or_default();
    let ingested_at = published.ok_or_else(|| anyhow!("missing delivery metadata"))?;

    Ok(StatusEnvelope {
        device_id,
        project_id,
        ingested_at,
        payload: payload.to_vec(),
    })
}

/// Map a dispatch error to the settlement of its message
pub fn settle(error: &DomainError) -> Settlement {
    if error.is_permanent() {
        Settlement::Term(error.to_string())
    } else {
        Settlement::Nak(error.to_string())
    }
}

/// Dispatch one envelope and decide how its message is settled.
///
/// A telemetry conflict means an earlier delivery of this envelope already
/// committed that record. It is skipped and the batch resumes at the next
/// record, so records the earlier delivery never reached still get written.
pub async fn ingest_envelope(
    dispatcher: &StatusDispatcher,
    envelope: &StatusEnvelope,
) -> Settlement {
    let mut start = 0;

    loop {
        match dispatcher.dispatch_from(envelope, start).await {
            Ok(outcome) => {
                debug!(
                    device_id = %envelope.device_id,
                    outcome = ?outcome,
                    resumed_at = start,
                    "status message handled"
                );
                return Settlement::Ack;
            }
            Err(DispatchFailure {
                error: DomainError::SnapshotConflict(path),
                record: Some(index),
                remaining,
            }) => {
                warn!(
                    device_id = %envelope.device_id,
                    path = %path,
                    record = index,
                    remaining,
                    "telemetry already ingested, skipping record"
                );
                if remaining == 0 {
                    return Settlement::Ack;
                }
                start = index + 1;
            }
            Err(failure) => return settle(&failure.error),
        }
    }
}

fn published_at(msg: &Message) -> Option<DateTime<Utc>> {
    let info = msg.info().ok()?;
    DateTime::from_timestamp(info.published.unix_timestamp(), info.published.nanosecond())
}

/// Create a BatchProcessor that dispatches each status message in delivery order
pub fn create_status_envelope_processor(dispatcher: Arc<StatusDispatcher>) -> BatchProcessor {
    Box::new(move |messages: &[Message]| {
        let dispatcher = Arc::clone(&dispatcher);

        // Message borrows from the slice, so pull out what the async block needs
        let envelopes: Vec<(usize, String, Result<StatusEnvelope>)> = messages
            .iter()
            .enumerate()
            .map(|(idx, msg)| {
                let envelope =
                    envelope_from_parts(msg.headers.as_ref(), published_at(msg), &msg.payload);
                (idx, msg.subject.to_string(), envelope)
            })
            .collect();

        Box::pin(async move {
            let mut result = ProcessingResult::default();

            for (idx, subject, envelope) in envelopes {
                let envelope = match envelope {
                    Ok(envelope) => envelope,
                    Err(e) => {
                        error!(error = %e, subject = %subject, "malformed status message");
                        result.term.push((idx, Some(e.to_string())));
                        continue;
                    }
                };

                match ingest_envelope(&dispatcher, &envelope).await {
                    Settlement::Ack => result.ack.push(idx),
                    Settlement::Nak(reason) => {
                        warn!(
                            device_id = %envelope.device_id,
                            error = %reason,
                            "status dispatch failed, requesting redelivery"
                        );
                        result.nak.push((idx, Some(reason)));
                    }
                    Settlement::Term(reason) => {
                        error!(
                            device_id = %envelope.device_id,
                            error = %reason,
                            "status message can never be ingested"
                        );
                        result.term.push((idx, Some(reason)));
                    }
                }
            }

            Ok(result)
        })
    })
}
