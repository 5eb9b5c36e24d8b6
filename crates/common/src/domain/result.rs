use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Status payload is empty")]
    EmptyPayload,

    #[error("Malformed status batch: {0}")]
    MalformedBatch(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Snapshot document already exists: {0}")]
    SnapshotConflict(String),

    #[error("Snapshot store unavailable: {0}")]
    SnapshotUnavailable(anyhow::Error),

    /// The analytics store rejected the insert. `row_errors` carries the
    /// store's per-row detail and is not part of the error identity.
    #[error("Analytics store rejected insert into {table}: {reason}")]
    AnalyticsInsert {
        table: String,
        reason: String,
        row_errors: Vec<String>,
    },

    #[error("Analytics store unavailable: {0}")]
    AnalyticsUnavailable(anyhow::Error),
}

impl DomainError {
    /// Errors raised before any write is attempted; redelivering the same
    /// envelope can never succeed.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            DomainError::EmptyPayload
                | DomainError::MalformedBatch(_)
                | DomainError::ValidationError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_errors_are_permanent() {
        assert!(DomainError::EmptyPayload.is_permanent());
        assert!(DomainError::MalformedBatch("truncated".to_string()).is_permanent());
        assert!(DomainError::ValidationError("device_id: length".to_string()).is_permanent());
    }

    #[test]
    fn test_store_errors_are_not_permanent() {
        assert!(!DomainError::SnapshotConflict("devices/a/telemetry/1".to_string()).is_permanent());
        assert!(!DomainError::SnapshotUnavailable(anyhow::anyhow!("pool closed")).is_permanent());
        assert!(!DomainError::AnalyticsUnavailable(anyhow::anyhow!("timeout")).is_permanent());
        assert!(!DomainError::AnalyticsInsert {
            table: "telemetry".to_string(),
            reason: "bad row".to_string(),
            row_errors: vec![],
        }
        .is_permanent());
    }

    #[test]
    fn test_analytics_insert_display_omits_row_detail() {
        let err = DomainError::AnalyticsInsert {
            table: "hydroponics.telemetry".to_string(),
            reason: "type mismatch".to_string(),
            row_errors: vec!["row 0: column humidity".to_string()],
        };

        let message = err.to_string();
        assert!(message.contains("hydroponics.telemetry"));
        assert!(!message.contains("row 0"));
    }
}
