//! Glacier Cluster Library
//!
//! Health checking and load balancing over a fixed set of Glacier
//! connections:
//! - Per-connection latency and error bookkeeping
//! - Health-check rounds publishing the set of usable connections
//! - Random and lowest-latency connection selection

pub mod cluster;
pub mod health;

#[cfg(test)]
mod cluster_tests;

pub use cluster::Cluster;
pub use health::{ConnHealth, HealthSnapshot};
