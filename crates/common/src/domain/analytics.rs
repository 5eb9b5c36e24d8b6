use crate::domain::{DomainResult, TelemetrySample};
use async_trait::async_trait;

/// Dataset and table that telemetry rows are appended to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsTarget {
    pub dataset: String,
    pub table: String,
}

impl AnalyticsTarget {
    pub fn qualified_table(&self) -> String {
        format!("{}.{}", self.dataset, self.table)
    }
}

/// Input for appending one telemetry row
#[derive(Debug, Clone, PartialEq)]
pub struct InsertTelemetryRowRepoInput {
    pub target: AnalyticsTarget,
    pub sample: TelemetrySample,
}

/// Repository trait for the append-only analytics store
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    /// Append one row. The store does not deduplicate.
    async fn insert_telemetry_row(&self, input: InsertTelemetryRowRepoInput) -> DomainResult<()>;
}
