use common::domain::{BatchEntry, DomainError, DomainResult, StatusBatch};
use common::proto::hydroponics::{EncodedStates, State};
use common::proto::status_record_proto_to_domain;
use prost::Message;
use tracing::debug;

/// Turns a raw envelope body into an ordered batch of status records.
///
/// Implementations must not have side effects.
#[cfg_attr(test, mockall::automock)]
pub trait StatusDecoder: Send + Sync {
    /// Fails with `EmptyPayload` for an empty body and `MalformedBatch` when
    /// the bytes are not a valid batch. An empty batch is valid.
    fn decode(&self, payload: &[u8]) -> DomainResult<StatusBatch>;
}

/// Decoder for protobuf `hydroponics.States` bodies
#[derive(Debug, Default, Clone, Copy)]
pub struct ProtobufStatusDecoder;

impl ProtobufStatusDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl StatusDecoder for ProtobufStatusDecoder {
    fn decode(&self, payload: &[u8]) -> DomainResult<StatusBatch> {
        if payload.is_empty() {
            return Err(DomainError::EmptyPayload);
        }

        let encoded = EncodedStates::decode(payload)
            .map_err(|e| DomainError::MalformedBatch(e.to_string()))?;

        // each record keeps the bytes it was delivered with, unknown fields included
        let entries = encoded
            .state
            .into_iter()
            .enumerate()
            .map(|(index, raw)| {
                let malformed =
                    |e: String| DomainError::MalformedBatch(format!("record {}: {}", index, e));
                let state = State::decode(raw.as_slice()).map_err(|e| malformed(e.to_string()))?;
                let record =
                    status_record_proto_to_domain(&state).map_err(|e| malformed(e.to_string()))?;
                Ok(BatchEntry {
                    record,
                    device_timestamp: state.timestamp,
                    raw,
                })
            })
            .collect::<DomainResult<Vec<_>>>()?;

        debug!(records = entries.len(), "decoded status batch");
        Ok(StatusBatch { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::domain::{
        MemoryStats, StatusKind, StatusRecord, TaskRunState, TelemetryReading,
    };
    use common::proto::hydroponics::{
        state, StateMemory, StateReboot, StateTask, StateTasks, StateTelemetry, States,
    };

    fn encode(states: Vec<State>) -> Vec<u8> {
        States { state: states }.encode_to_vec()
    }

    #[test]
    fn test_empty_payload_is_rejected() {
        let decoder = ProtobufStatusDecoder::new();
        assert!(matches!(decoder.decode(&[]), Err(DomainError::EmptyPayload)));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let decoder = ProtobufStatusDecoder::new();
        // field 1, length-delimited, claims 16 bytes but only 1 follows
        let result = decoder.decode(&[0x0a, 0x10, 0x01]);
        assert!(matches!(result, Err(DomainError::MalformedBatch(_))));
    }

    #[test]
    fn test_state_without_report_is_malformed() {
        let decoder = ProtobufStatusDecoder::new();
        let payload = encode(vec![
            State {
                timestamp: 1,
                state: Some(state::State::Reboot(StateReboot {})),
            },
            State {
                timestamp: 2,
                state: None,
            },
        ]);

        match decoder.decode(&payload) {
            Err(DomainError::MalformedBatch(reason)) => assert!(reason.starts_with("record 1")),
            other => panic!("expected MalformedBatch, got {:?}", other),
        }
    }

    #[test]
    fn test_decodes_records_in_order_with_raw_bytes() {
        let decoder = ProtobufStatusDecoder::new();
        let memory = State {
            timestamp: 11,
            state: Some(state::State::Memory(StateMemory {
                min_free: 1024,
                free: 4096,
            })),
        };
        let telemetry = State {
            timestamp: 12,
            state: Some(state::State::Telemetry(StateTelemetry {
                temp_indoor: 21.5,
                humidity: 60.0,
                ..Default::default()
            })),
        };
        let payload = encode(vec![memory.clone(), telemetry.clone()]);

        let batch = decoder.decode(&payload).unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.entries[0].record.kind(), StatusKind::MemoryStats);
        assert_eq!(
            batch.entries[0].record,
            StatusRecord::MemoryStats(MemoryStats {
                min_free: 1024,
                free: 4096
            })
        );
        assert_eq!(batch.entries[0].device_timestamp, 11);
        assert_eq!(batch.entries[0].raw, memory.encode_to_vec());

        assert_eq!(
            batch.entries[1].record,
            StatusRecord::Telemetry(TelemetryReading {
                temp_indoor: 21.5,
                humidity: 60.0,
                ..Default::default()
            })
        );
        assert_eq!(batch.entries[1].raw, telemetry.encode_to_vec());
    }

    #[test]
    fn test_raw_bytes_are_the_delivered_bytes() {
        let decoder = ProtobufStatusDecoder::new();
        let mut raw = State {
            timestamp: 3,
            state: Some(state::State::Memory(StateMemory {
                min_free: 1,
                free: 2,
            })),
        }
        .encode_to_vec();
        // field 9, varint 7: unknown to this build
        raw.extend_from_slice(&[0x48, 0x07]);
        let payload = EncodedStates {
            state: vec![raw.clone()],
        }
        .encode_to_vec();

        let batch = decoder.decode(&payload).unwrap();

        assert_eq!(batch.len(), 1);
        assert_eq!(
            batch.entries[0].record,
            StatusRecord::MemoryStats(MemoryStats {
                min_free: 1,
                free: 2
            })
        );
        assert_eq!(batch.entries[0].raw, raw);
    }

    #[test]
    fn test_unknown_task_state_still_decodes() {
        let decoder = ProtobufStatusDecoder::new();
        let payload = encode(vec![
            State {
                timestamp: 4,
                state: Some(state::State::Tasks(StateTasks {
                    task: vec![StateTask {
                        name: "io".to_string(),
                        state: 5,
                        priority: 5,
                        runtime: 0,
                        stats: 0,
                        highwater: 256,
                    }],
                })),
            },
            State {
                timestamp: 4,
                state: Some(state::State::Telemetry(StateTelemetry::default())),
            },
        ]);

        let batch = decoder.decode(&payload).unwrap();

        assert_eq!(batch.len(), 2);
        match &batch.entries[0].record {
            StatusRecord::TaskList(list) => {
                assert_eq!(list.tasks[0].state, TaskRunState::Unknown(5))
            }
            other => panic!("expected a task list, got {:?}", other),
        }
        assert_eq!(batch.entries[1].record.kind(), StatusKind::Telemetry);
    }

    #[test]
    fn test_batch_without_states_is_empty() {
        let decoder = ProtobufStatusDecoder::new();
        // a lone unknown varint field decodes to a States with no entries
        let batch = decoder.decode(&[0x10, 0x01]).unwrap();
        assert!(batch.is_empty());
    }
}
