use common::domain::AnalyticsTarget;

/// Per-dispatcher settings, fixed for the dispatcher's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestConfig {
    /// Envelopes from devices whose id ends with this suffix are dropped.
    /// Empty disables the filter.
    pub ignore_suffix: String,
    pub analytics: AnalyticsTarget,
}
