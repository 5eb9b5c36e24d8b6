pub mod domain;
pub mod nats;
pub mod status_ingester;

pub use domain::*;
pub use nats::*;
pub use status_ingester::*;
