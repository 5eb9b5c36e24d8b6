use chrono::{DateTime, Utc};
use garde::Validate;

/// One delivered status message as handed over by the transport.
///
/// `ingested_at` comes from the transport's delivery metadata and is the only
/// source of time for everything written on behalf of this envelope.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct StatusEnvelope {
    #[garde(length(min = 1))]
    pub device_id: String,
    #[garde(skip)]
    pub project_id: String,
    #[garde(skip)]
    pub ingested_at: DateTime<Utc>,
    #[garde(skip)]
    pub payload: Vec<u8>,
}

impl StatusEnvelope {
    /// Whether the device id carries the configured ignore suffix.
    /// An empty suffix disables the filter.
    pub fn is_ignored(&self, ignore_suffix: &str) -> bool {
        !ignore_suffix.is_empty() && self.device_id.ends_with(ignore_suffix)
    }
}
