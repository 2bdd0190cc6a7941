//! Synthetic telemetry rows written by the background generator

use serde::{Deserialize, Serialize};

use super::{new_id, now, RecordId, Timestamp};
use crate::storage::Record;

string_enum! {
    /// Health of a platform component
    pub enum ComponentState {
        /// Normal operation
        Operational => "operational",
        /// Reduced performance
        Degraded => "degraded",
        /// Not serving
        Outage => "outage",
    }
}

string_enum! {
    /// Security event severity
    pub enum Severity {
        /// Informational
        Low => "low",
        /// Should be looked at
        Medium => "medium",
        /// Needs attention today
        High => "high",
        /// Page someone
        Critical => "critical",
    }
}

/// Fleet-wide impact sample
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactMetric {
    /// Row id
    pub id: RecordId,
    /// Energy saved in the sample window
    pub energy_saved_kwh: f64,
    /// Emissions avoided in the sample window
    pub co2_reduced_kg: f64,
    /// Devices reporting
    pub active_devices: u32,
    /// Grid load, percent
    pub grid_load_pct: f64,
    /// Renewable share of supply, percent
    pub renewable_share_pct: f64,
    /// Sample time
    pub recorded_at: Timestamp,
}

impl Record for ImpactMetric {
    const COLLECTION: &'static str = "impact_metrics";

    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> Timestamp {
        self.recorded_at
    }
}

/// Totals and averages over stored impact samples
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImpactSummary {
    /// Samples aggregated
    pub samples: usize,
    /// Sum of energy saved
    pub total_energy_saved_kwh: f64,
    /// Sum of emissions avoided
    pub total_co2_reduced_kg: f64,
    /// Mean reporting devices
    pub avg_active_devices: f64,
    /// Mean grid load
    pub avg_grid_load_pct: f64,
    /// Mean renewable share
    pub avg_renewable_share_pct: f64,
    /// Newest sample time
    pub latest_at: Option<Timestamp>,
}

impl ImpactSummary {
    /// Aggregate samples; an empty input yields zeros
    pub fn from_metrics<'a>(metrics: impl IntoIterator<Item = &'a ImpactMetric>) -> Self {
        let mut summary = ImpactSummary::default();
        let mut devices = 0.0;
        let mut load = 0.0;
        let mut renewable = 0.0;

        for m in metrics {
            summary.samples += 1;
            summary.total_energy_saved_kwh += m.energy_saved_kwh;
            summary.total_co2_reduced_kg += m.co2_reduced_kg;
            devices += f64::from(m.active_devices);
            load += m.grid_load_pct;
            renewable += m.renewable_share_pct;
            if summary.latest_at.map_or(true, |t| m.recorded_at > t) {
                summary.latest_at = Some(m.recorded_at);
            }
        }

        if summary.samples > 0 {
            let n = summary.samples as f64;
            summary.avg_active_devices = devices / n;
            summary.avg_grid_load_pct = load / n;
            summary.avg_renewable_share_pct = renewable / n;
        }
        summary
    }
}

/// Component health sample
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemStatus {
    /// Row id
    pub id: RecordId,
    /// Component name, e.g. `grid`
    pub component: String,
    /// Health
    pub state: ComponentState,
    /// Uptime percent
    pub uptime_pct: f64,
    /// Response latency
    pub latency_ms: u32,
    /// Sample time
    pub recorded_at: Timestamp,
}

impl Record for SystemStatus {
    const COLLECTION: &'static str = "system_status";

    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> Timestamp {
        self.recorded_at
    }
}

/// Simulated security finding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityEvent {
    /// Event id
    pub id: RecordId,
    /// Event kind, e.g. `failed_login_burst`
    pub kind: String,
    /// Severity
    pub severity: Severity,
    /// Where it was observed
    pub source: String,
    /// Human readable description
    pub message: String,
    /// Acknowledged by an admin
    pub resolved: bool,
    /// Admin who resolved it
    pub resolved_by: Option<RecordId>,
    /// Detection time
    pub created_at: Timestamp,
    /// Last modification
    pub updated_at: Timestamp,
}

impl SecurityEvent {
    /// Unresolved event
    pub fn new(kind: &str, severity: Severity, source: &str, message: String) -> Self {
        let now = now();
        Self {
            id: new_id(),
            kind: kind.to_string(),
            severity,
            source: source.to_string(),
            message,
            resolved: false,
            resolved_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark as handled
    pub fn resolve(&mut self, by: RecordId) {
        self.resolved = true;
        self.resolved_by = Some(by);
        self.updated_at = now();
    }
}

impl Record for SecurityEvent {
    const COLLECTION: &'static str = "security_events";

    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(energy: f64, devices: u32, load: f64) -> ImpactMetric {
        ImpactMetric {
            id: new_id(),
            energy_saved_kwh: energy,
            co2_reduced_kg: energy * 0.4,
            active_devices: devices,
            grid_load_pct: load,
            renewable_share_pct: 50.0,
            recorded_at: now(),
        }
    }

    #[test]
    fn test_summary_of_nothing_is_zero() {
        let summary = ImpactSummary::from_metrics(std::iter::empty());
        assert_eq!(summary, ImpactSummary::default());
    }

    #[test]
    fn test_summary_averages() {
        let rows = [sample(100.0, 50, 20.0), sample(300.0, 150, 40.0)];
        let summary = ImpactSummary::from_metrics(&rows);
        assert_eq!(summary.samples, 2);
        assert!((summary.total_energy_saved_kwh - 400.0).abs() < 1e-9);
        assert!((summary.total_co2_reduced_kg - 160.0).abs() < 1e-9);
        assert!((summary.avg_active_devices - 100.0).abs() < 1e-9);
        assert!((summary.avg_grid_load_pct - 30.0).abs() < 1e-9);
        assert_eq!(summary.latest_at, Some(rows[1].recorded_at.max(rows[0].recorded_at)));
    }

    #[test]
    fn test_resolve_security_event() {
        let mut event = SecurityEvent::new("port_scan", Severity::Medium, "gateway-eu-1", "Scan detected".into());
        let admin = new_id();
        event.resolve(admin);
        assert!(event.resolved);
        assert_eq!(event.resolved_by, Some(admin));
    }
}
