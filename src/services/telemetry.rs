//! Synthetic telemetry
//!
//! A background task writes one impact sample and one status row per component
//! every interval, occasionally adds a security event, and trims each collection
//! to the configured retention. The numbers are random; nothing is measured.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::task::JoinHandle;

use crate::core::config::TelemetryConfig;
use crate::core::Result;
use crate::storage::{SharedStore, Store};
use crate::system::metrics;
use crate::types::{
    new_id, now, AuditAction, ComponentState, ImpactMetric, ImpactSummary, ListParams, Page, RecordId,
    SecurityEvent, Severity, SystemStatus, Timestamp,
};

/// Impact samples returned when no limit is given
pub const DEFAULT_IMPACT_LIMIT: usize = 24;

const SECURITY_SCENARIOS: &[(&str, &str, &str)] = &[
    ("failed_login_burst", "auth-gateway", "Repeated failed logins from a single address"),
    ("port_scan", "edge-firewall", "Sequential port probes against a device gateway"),
    ("certificate_expiry", "device-pki", "Device certificate expires within 14 days"),
    ("firmware_mismatch", "fleet-manager", "Device reported unsigned firmware version"),
    ("anomalous_dispatch", "vpp-scheduler", "Dispatch command outside expected load window"),
];

/// What one tick wrote
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    /// When the tick ran
    pub at: Timestamp,
    /// Status rows written
    pub statuses: usize,
    /// Whether a security event was generated
    pub security_event: bool,
    /// Rows removed by retention across collections
    pub trimmed: usize,
}

/// Generator progress, read by the health check
#[derive(Debug, Default)]
pub struct TelemetryMonitor {
    last_tick: RwLock<Option<Timestamp>>,
    ticks: AtomicU64,
}

impl TelemetryMonitor {
    /// Time of the last completed tick
    pub fn last_tick(&self) -> Option<Timestamp> {
        *self.last_tick.read()
    }

    /// Ticks completed since start
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    fn record(&self, at: Timestamp) {
        *self.last_tick.write() = Some(at);
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }
}

/// Writes synthetic rows into the store
pub struct TelemetryGenerator {
    store: SharedStore,
    config: TelemetryConfig,
    monitor: Arc<TelemetryMonitor>,
}

impl TelemetryGenerator {
    /// Generator over `store`, reporting progress to `monitor`
    pub fn new(store: SharedStore, config: TelemetryConfig, monitor: Arc<TelemetryMonitor>) -> Self {
        Self { store, config, monitor }
    }

    /// Run one tick with the thread-local RNG
    pub fn tick(&self) -> Result<TickReport> {
        self.tick_with(&mut rand::rng())
    }

    /// Run one tick with a caller-supplied RNG
    pub fn tick_with<R: Rng>(&self, rng: &mut R) -> Result<TickReport> {
        let at = now();
        let store = &self.store;

        store.impact_metrics.insert(random_impact(rng, at))?;
        for component in &self.config.components {
            store.system_status.insert(random_status(rng, component, at))?;
        }

        let security_event = rng.random_bool(self.config.security_event_probability);
        if security_event {
            let event = store.security_events.insert(random_security_event(rng))?;
            tracing::warn!(kind = %event.kind, severity = %event.severity, "synthetic security event");
        }

        let keep = self.config.retention;
        let mut trimmed = store.impact_metrics.retain_newest(keep) + store.security_events.retain_newest(keep);
        // Status rows are kept per component
        for component in &self.config.components {
            trimmed += store
                .system_status
                .retain_newest_matching(keep, |s| &s.component == component);
        }

        self.monitor.record(at);
        metrics::record_telemetry_tick(security_event, trimmed);
        tracing::debug!(statuses = self.config.components.len(), security_event, trimmed, "telemetry tick");

        Ok(TickReport {
            at,
            statuses: self.config.components.len(),
            security_event,
            trimmed,
        })
    }

    /// Tick every interval until the task is aborted
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.config.interval);
            tracing::info!(interval = ?self.config.interval, "telemetry generator started");
            loop {
                interval.tick().await;
                if let Err(e) = self.tick() {
                    tracing::error!("telemetry tick failed: {}", e);
                }
            }
        })
    }
}

fn random_impact<R: Rng>(rng: &mut R, at: Timestamp) -> ImpactMetric {
    let energy = round1(rng.random_range(100.0..5000.0));
    ImpactMetric {
        id: new_id(),
        energy_saved_kwh: energy,
        co2_reduced_kg: round1(energy * 0.4),
        active_devices: rng.random_range(50..500),
        grid_load_pct: round1(rng.random_range(20.0..95.0)),
        renewable_share_pct: round1(rng.random_range(30.0..90.0)),
        recorded_at: at,
    }
}

fn random_status<R: Rng>(rng: &mut R, component: &str, at: Timestamp) -> SystemStatus {
    let state = match rng.random_range(0..100) {
        0..=89 => ComponentState::Operational,
        90..=97 => ComponentState::Degraded,
        _ => ComponentState::Outage,
    };
    SystemStatus {
        id: new_id(),
        component: component.to_string(),
        state,
        uptime_pct: (rng.random_range(97.0..100.0_f64) * 100.0).round() / 100.0,
        latency_ms: rng.random_range(5..250),
        recorded_at: at,
    }
}

fn random_security_event<R: Rng>(rng: &mut R) -> SecurityEvent {
    let (kind, source, message) = SECURITY_SCENARIOS[rng.random_range(0..SECURITY_SCENARIOS.len())];
    let severity = match rng.random_range(0..100) {
        0..=49 => Severity::Low,
        50..=79 => Severity::Medium,
        80..=94 => Severity::High,
        _ => Severity::Critical,
    };
    SecurityEvent::new(kind, severity, source, message.to_string())
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Newest impact samples first
pub fn latest_impact(store: &Store, limit: Option<usize>) -> Vec<ImpactMetric> {
    store.impact_metrics.latest(limit.unwrap_or(DEFAULT_IMPACT_LIMIT).clamp(1, 1440))
}

/// Totals and averages over every retained sample
pub fn impact_summary(store: &Store) -> ImpactSummary {
    let metrics = store.impact_metrics.find(|_| true);
    ImpactSummary::from_metrics(&metrics)
}

/// Most recent status row of each component, by component name
pub fn current_status(store: &Store) -> Vec<SystemStatus> {
    let mut latest: Vec<SystemStatus> = Vec::new();
    for row in store.system_status.find(|_| true) {
        match latest.iter_mut().find(|r| r.component == row.component) {
            Some(existing) if existing.recorded_at < row.recorded_at => *existing = row,
            Some(_) => {}
            None => latest.push(row),
        }
    }
    latest.sort_by(|a, b| a.component.cmp(&b.component));
    latest
}

/// Query of `GET /api/telemetry/security`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecurityFilter {
    /// Only resolved (`true`) or open (`false`) events
    pub resolved: Option<bool>,
    /// Minimum severity
    pub severity: Option<Severity>,
}

/// Security events, newest first
pub fn list_security_events(store: &Store, filter: &SecurityFilter, params: &ListParams) -> Result<Page<SecurityEvent>> {
    let mut events = store.security_events.find(|e| {
        filter.resolved.map_or(true, |r| e.resolved == r) && filter.severity.map_or(true, |s| e.severity >= s)
    });
    events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Page::paginate(events, params)
}

/// Mark an event handled
pub fn resolve_security_event(store: &Store, admin_id: RecordId, id: RecordId) -> Result<SecurityEvent> {
    let event = store.security_events.update(id, |e| {
        e.resolve(admin_id);
        Ok(())
    })?;
    super::audit::record(store, Some(admin_id), AuditAction::Update, &event, json!({ "resolved": true }));
    Ok(event)
}
