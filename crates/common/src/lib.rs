pub mod clickhouse;
pub mod domain;
pub mod garde;
pub mod nats;
pub mod postgres;
pub mod proto;
pub mod telemetry;
