//! Prometheus metrics for Eco-Grid
//!
//! Metrics live in a private registry that `/metrics` renders. Recording helpers
//! are no-ops until [`init_registry`] has run, which keeps unit tests free of
//! global setup.

use crate::core::Result;
use once_cell::sync::{Lazy, OnceCell};
use prometheus::{
    register_histogram_vec_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, HistogramVec, IntCounter, IntCounterVec, Registry,
};
use std::time::Instant;

/// Global metrics registry
static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

static METRICS: OnceCell<Metrics> = OnceCell::new();

/// HTTP request metrics
pub struct HttpMetrics {
    /// Requests by method, route class and status
    pub requests: IntCounterVec,
    /// Request latency by route class
    pub duration: HistogramVec,
}

/// Domain activity counters
pub struct ActivityMetrics {
    /// Records created, by collection
    pub content_created: IntCounterVec,
    /// Chat messages answered, by matched intent
    pub chat_messages: IntCounterVec,
    /// AI writer calls, by outcome
    pub ai_generations: IntCounterVec,
    /// Requests refused by a feature gate, by feature
    pub feature_denials: IntCounterVec,
}

/// Telemetry generator counters
pub struct TelemetryMetrics {
    /// Generator ticks completed
    pub ticks: IntCounter,
    /// Security events generated
    pub security_events: IntCounter,
    /// Rows dropped by retention
    pub rows_trimmed: IntCounter,
}

/// Centralized metrics collection
pub struct Metrics {
    /// HTTP layer
    pub http: HttpMetrics,
    /// Content, chat and AI activity
    pub activity: ActivityMetrics,
    /// Background telemetry
    pub telemetry: TelemetryMetrics,
}

impl Metrics {
    fn new() -> Result<Self> {
        let r = &*REGISTRY;
        Ok(Self {
            http: HttpMetrics {
                requests: register_int_counter_vec_with_registry!(
                    "eco_http_requests_total",
                    "Total HTTP requests",
                    &["method", "route", "status"],
                    r
                )?,
                duration: register_histogram_vec_with_registry!(
                    "eco_http_request_duration_seconds",
                    "HTTP request duration in seconds",
                    &["route"],
                    vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0],
                    r
                )?,
            },
            activity: ActivityMetrics {
                content_created: register_int_counter_vec_with_registry!(
                    "eco_content_created_total",
                    "Records created through the API",
                    &["collection"],
                    r
                )?,
                chat_messages: register_int_counter_vec_with_registry!(
                    "eco_chat_messages_total",
                    "Chat messages answered",
                    &["intent"],
                    r
                )?,
                ai_generations: register_int_counter_vec_with_registry!(
                    "eco_ai_generations_total",
                    "AI writer generations",
                    &["outcome"],
                    r
                )?,
                feature_denials: register_int_counter_vec_with_registry!(
                    "eco_feature_denials_total",
                    "Requests refused by a subscription limit",
                    &["feature"],
                    r
                )?,
            },
            telemetry: TelemetryMetrics {
                ticks: register_int_counter_with_registry!(
                    "eco_telemetry_ticks_total",
                    "Telemetry generator ticks",
                    r
                )?,
                security_events: register_int_counter_with_registry!(
                    "eco_telemetry_security_events_total",
                    "Synthetic security events generated",
                    r
                )?,
                rows_trimmed: register_int_counter_with_registry!(
                    "eco_telemetry_rows_trimmed_total",
                    "Telemetry rows removed by retention",
                    r
                )?,
            },
        })
    }

    /// The global instance, once initialized
    pub fn global() -> Option<&'static Metrics> {
        METRICS.get()
    }
}

/// Register every metric; safe to call more than once
pub fn init_registry() -> Result<&'static Metrics> {
    METRICS.get_or_try_init(Metrics::new)
}

/// Get the Prometheus registry
pub fn registry() -> &'static Registry {
    &REGISTRY
}

/// Collect and return all metrics as a Prometheus-formatted string
pub fn collect_metrics() -> Result<String> {
    let encoder = prometheus::TextEncoder::new();
    let metric_families = registry().gather();
    Ok(encoder.encode_to_string(&metric_families)?)
}

/// Timer for measuring request duration with automatic histogram recording
pub struct Timer {
    start: Instant,
    route: &'static str,
}

impl Timer {
    /// Start timing a request to `route`
    pub fn start(route: &'static str) -> Self {
        Self {
            start: Instant::now(),
            route,
        }
    }

    /// Record the request and its duration
    pub fn finish(self, method: &str, status: u16) {
        if let Some(m) = Metrics::global() {
            let status = status.to_string();
            m.http
                .requests
                .with_label_values(&[method, self.route, status.as_str()])
                .inc();
            m.http
                .duration
                .with_label_values(&[self.route])
                .observe(self.start.elapsed().as_secs_f64());
        }
    }
}

/// Count a record created through the API
pub fn record_created(collection: &str) {
    if let Some(m) = Metrics::global() {
        m.activity.content_created.with_label_values(&[collection]).inc();
    }
}

/// Count an answered chat message
pub fn record_chat_message(intent: &str) {
    if let Some(m) = Metrics::global() {
        m.activity.chat_messages.with_label_values(&[intent]).inc();
    }
}

/// Count an AI writer call by outcome (`ok`, `unavailable`, `invalid`, `error`)
pub fn record_ai_generation(outcome: &str) {
    if let Some(m) = Metrics::global() {
        m.activity.ai_generations.with_label_values(&[outcome]).inc();
    }
}

/// Count a feature gate denial
pub fn record_feature_denial(feature: &str) {
    if let Some(m) = Metrics::global() {
        m.activity.feature_denials.with_label_values(&[feature]).inc();
    }
}

/// Count a telemetry tick and what it produced
pub fn record_telemetry_tick(security_event: bool, trimmed: usize) {
    if let Some(m) = Metrics::global() {
        m.telemetry.ticks.inc();
        if security_event {
            m.telemetry.security_events.inc();
        }
        m.telemetry.rows_trimmed.inc_by(trimmed as u64);
    }
}
