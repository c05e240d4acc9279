//! Application metrics collection and reporting.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use serde::Serialize;

/// Which endpoint served a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Map,
    Parcel,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Map => "map",
            Endpoint::Parcel => "parcel",
        }
    }
}

/// Metrics collector for the map service.
///
/// Counters are mirrored into the `metrics` recorder so they show up at
/// `/metrics` when a Prometheus exporter is installed.
#[derive(Debug)]
pub struct MetricsCollector {
    pub map_requests: AtomicU64,
    pub parcel_requests: AtomicU64,
    pub rejections: AtomicU64,
    pub invalid_requests: AtomicU64,
    pub upstream_failures: AtomicU64,
    pub render_failures: AtomicU64,
    pub renders_total: AtomicU64,

    /// Render timing in microseconds
    render_time_total_us: AtomicU64,
    render_time_max_us: AtomicU64,

    start_time: Instant,
}

/// Point-in-time copy of the collector.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub map_requests: u64,
    pub parcel_requests: u64,
    pub rejections: u64,
    pub invalid_requests: u64,
    pub upstream_failures: u64,
    pub render_failures: u64,
    pub renders_total: u64,
    pub avg_render_ms: f64,
    pub max_render_ms: f64,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            map_requests: AtomicU64::new(0),
            parcel_requests: AtomicU64::new(0),
            rejections: AtomicU64::new(0),
            invalid_requests: AtomicU64::new(0),
            upstream_failures: AtomicU64::new(0),
            render_failures: AtomicU64::new(0),
            renders_total: AtomicU64::new(0),
            render_time_total_us: AtomicU64::new(0),
            render_time_max_us: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_request(&self, endpoint: Endpoint) {
        match endpoint {
            Endpoint::Map => self.map_requests.fetch_add(1, Ordering::Relaxed),
            Endpoint::Parcel => self.parcel_requests.fetch_add(1, Ordering::Relaxed),
        };
        counter!("map_requests_total", "endpoint" => endpoint.as_str()).increment(1);
    }

    /// Record an admission rejection (area over the cap)
    pub fn record_rejection(&self) {
        self.rejections.fetch_add(1, Ordering::Relaxed);
        counter!("map_rejections_total").increment(1);
    }

    pub fn record_invalid_request(&self) {
        self.invalid_requests.fetch_add(1, Ordering::Relaxed);
        counter!("map_invalid_requests_total").increment(1);
    }

    pub fn record_upstream_failure(&self) {
        self.upstream_failures.fetch_add(1, Ordering::Relaxed);
        counter!("map_upstream_failures_total").increment(1);
    }

    pub fn record_render_failure(&self) {
        self.render_failures.fetch_add(1, Ordering::Relaxed);
        counter!("map_render_failures_total").increment(1);
    }

    /// Record a completed render (rasterization up to a ready PNG stream)
    pub fn record_render(&self, duration: Duration) {
        let us = duration.as_micros().min(u64::MAX as u128) as u64;
        self.renders_total.fetch_add(1, Ordering::Relaxed);
        self.render_time_total_us.fetch_add(us, Ordering::Relaxed);
        self.render_time_max_us.fetch_max(us, Ordering::Relaxed);
        histogram!("map_render_duration_seconds").record(duration.as_secs_f64());
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let renders = self.renders_total.load(Ordering::Relaxed);
        let total_us = self.render_time_total_us.load(Ordering::Relaxed);
        let avg_render_ms = if renders == 0 {
            0.0
        } else {
            (total_us as f64 / renders as f64) / 1000.0
        };

        MetricsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            map_requests: self.map_requests.load(Ordering::Relaxed),
            parcel_requests: self.parcel_requests.load(Ordering::Relaxed),
            rejections: self.rejections.load(Ordering::Relaxed),
            invalid_requests: self.invalid_requests.load(Ordering::Relaxed),
            upstream_failures: self.upstream_failures.load(Ordering::Relaxed),
            render_failures: self.render_failures.load(Ordering::Relaxed),
            renders_total: renders,
            avg_render_ms,
            max_render_ms: self.render_time_max_us.load(Ordering::Relaxed) as f64 / 1000.0,
        }
    }
}
