mod analytics;
mod envelope;
mod in_memory_analytics_repository;
mod in_memory_snapshot_repository;
mod result;
mod snapshot;
mod status;
mod telemetry_sample;

pub use analytics::*;
pub use envelope::*;
pub use in_memory_analytics_repository::*;
pub use in_memory_snapshot_repository::*;
pub use result::*;
pub use snapshot::*;
pub use status::*;
pub use telemetry_sample::*;
