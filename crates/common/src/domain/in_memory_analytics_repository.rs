use crate::domain::{
    AnalyticsRepository, AnalyticsTarget, DomainError, DomainResult, InsertTelemetryRowRepoInput,
    TelemetrySample,
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory append-only analytics store. Accepts duplicate rows.
pub struct InMemoryAnalyticsRepository {
    rows: Arc<RwLock<Vec<(AnalyticsTarget, TelemetrySample)>>>,
    rejection: Arc<RwLock<Option<String>>>,
}

impl InMemoryAnalyticsRepository {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(Vec::new())),
            rejection: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn rows(&self) -> Vec<(AnalyticsTarget, TelemetrySample)> {
        self.rows.read().await.clone()
    }

    /// While set, every insert is rejected with this reason and nothing is stored.
    pub async fn reject_inserts(&self, reason: Option<&str>) {
        *self.rejection.write().await = reason.map(str::to_string);
    }
}

impl Default for InMemoryAnalyticsRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnalyticsRepository for InMemoryAnalyticsRepository {
    async fn insert_telemetry_row(&self, input: InsertTelemetryRowRepoInput) -> DomainResult<()> {
        if let Some(reason) = self.rejection.read().await.clone() {
            return Err(DomainError::AnalyticsInsert {
                table: input.target.qualified_table(),
                row_errors: vec![format!(
                    "device_id={} time={}: {}",
                    input.sample.device_id,
                    input.sample.unix_timestamp(),
                    reason
                )],
                reason,
            });
        }

        self.rows.write().await.push((input.target, input.sample));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TelemetryReading;
    use chrono::{TimeZone, Utc};

    fn input(ts: i64) -> InsertTelemetryRowRepoInput {
        InsertTelemetryRowRepoInput {
            target: AnalyticsTarget {
                dataset: "hydroponics".to_string(),
                table: "telemetry".to_string(),
            },
            sample: TelemetrySample::from_reading(
                "grow-1",
                Utc.timestamp_opt(ts, 0).unwrap(),
                &TelemetryReading::default(),
            ),
        }
    }

    #[tokio::test]
    async fn test_rejected_insert_stores_nothing() {
        let repo = InMemoryAnalyticsRepository::new();
        repo.reject_inserts(Some("type mismatch")).await;

        let result = repo.insert_telemetry_row(input(100)).await;

        match result {
            Err(DomainError::AnalyticsInsert {
                table, row_errors, ..
            }) => {
                assert_eq!(table, "hydroponics.telemetry");
                assert_eq!(row_errors, vec!["device_id=grow-1 time=100: type mismatch"]);
            }
            other => panic!("expected AnalyticsInsert, got {:?}", other),
        }
        assert!(repo.rows().await.is_empty());

        repo.reject_inserts(None).await;
        repo.insert_telemetry_row(input(100)).await.unwrap();
        assert_eq!(repo.rows().await.len(), 1);
    }
}
