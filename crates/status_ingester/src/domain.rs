mod ingest_config;
mod snapshot_upserter;
mod status_decoder;
mod status_dispatcher;
mod telemetry_fanout_writer;

pub use ingest_config::*;
pub use snapshot_upserter::*;
pub use status_decoder::*;
pub use status_dispatcher::*;
pub use telemetry_fanout_writer::*;
