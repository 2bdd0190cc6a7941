//! Process-level monitoring
//!
//! Prometheus metrics and the health check served on `/health`.

pub mod health;
pub mod metrics;
