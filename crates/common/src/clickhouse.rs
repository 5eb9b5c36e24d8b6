mod client;
mod config;
mod telemetry_repository;

pub use client::*;
pub use config::*;
pub use telemetry_repository::*;
