//! Health checks and service diagnostics

use chrono::Duration as ChronoDuration;
use serde::Serialize;

use crate::core::AppState;
use crate::types::{now, Timestamp};

/// Overall service health
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    /// Everything is running
    Healthy,
    /// Serving requests, but a background task has stalled
    Degraded,
}

/// Body of `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// Overall status
    pub status: ServiceStatus,
    /// Crate version
    pub version: &'static str,
    /// Seconds since startup
    pub uptime_secs: u64,
    /// Whether the telemetry generator is configured to run
    pub telemetry_enabled: bool,
    /// Last completed telemetry tick
    pub last_telemetry_tick: Option<Timestamp>,
    /// Total records across collections
    pub records: usize,
}

/// Number of intervals after which a silent generator counts as stalled
const STALL_INTERVALS: i32 = 3;

/// Computes [`HealthStatus`] from application state
pub struct HealthChecker<'a> {
    state: &'a AppState,
}

impl<'a> HealthChecker<'a> {
    /// Checker over `state`
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Current health
    pub fn check(&self) -> HealthStatus {
        let telemetry = &self.state.config.telemetry;
        let last_tick = self.state.telemetry.last_tick();

        let status = if telemetry.enabled && self.telemetry_stalled(last_tick) {
            ServiceStatus::Degraded
        } else {
            ServiceStatus::Healthy
        };

        HealthStatus {
            status,
            version: crate::VERSION,
            uptime_secs: self.state.uptime_secs(),
            telemetry_enabled: telemetry.enabled,
            last_telemetry_tick: last_tick,
            records: self.state.store.stats().total,
        }
    }

    fn telemetry_stalled(&self, last_tick: Option<Timestamp>) -> bool {
        let interval = ChronoDuration::from_std(self.state.config.telemetry.interval)
            .unwrap_or_else(|_| ChronoDuration::seconds(60));
        let allowed = interval * STALL_INTERVALS;

        match last_tick {
            Some(at) => now() - at > allowed,
            // Give a fresh process one grace window before the first tick lands
            None => self.state.uptime_secs() as i64 > allowed.num_seconds(),
        }
    }
}
