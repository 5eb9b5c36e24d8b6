mod client;
mod config;
mod schema;
mod snapshot_repository;

pub use client::*;
pub use config::*;
pub use schema::*;
pub use snapshot_repository::*;
