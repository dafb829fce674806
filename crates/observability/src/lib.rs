use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

/// Process-wide request counters. Also forwarded to the `metrics` facade
/// so an installed recorder can export them.
#[derive(Debug, Default)]
pub struct AppMetrics {
    requests_total: AtomicU64,
    validation_failures_total: AtomicU64,
    inference_failures_total: AtomicU64,
    enhanced_total: AtomicU64,
    fallback_total: AtomicU64,
    total_latency_millis: AtomicU64,
    latency_samples_total: AtomicU64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub validation_failures_total: u64,
    pub inference_failures_total: u64,
    pub enhanced_total: u64,
    pub fallback_total: u64,
    pub latency_samples_total: u64,
    pub avg_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("teller_predict_requests_total").increment(1);
    }

    pub fn inc_validation_failure(&self) {
        self.validation_failures_total
            .fetch_add(1, Ordering::Relaxed);
        metrics::counter!("teller_validation_failures_total").increment(1);
    }

    pub fn inc_inference_failure(&self) {
        self.inference_failures_total
            .fetch_add(1, Ordering::Relaxed);
        metrics::counter!("teller_inference_failures_total").increment(1);
    }

    pub fn inc_enhanced(&self) {
        self.enhanced_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("teller_enhanced_total").increment(1);
    }

    pub fn inc_fallback(&self) {
        self.fallback_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("teller_fallback_total").increment(1);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
        self.latency_samples_total.fetch_add(1, Ordering::Relaxed);
        metrics::histogram!("teller_predict_latency_seconds").record(duration.as_secs_f64());
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests = self.requests_total.load(Ordering::Relaxed);
        let latency = self.total_latency_millis.load(Ordering::Relaxed);
        let samples = self.latency_samples_total.load(Ordering::Relaxed);

        MetricsSnapshot {
            requests_total: requests,
            validation_failures_total: self.validation_failures_total.load(Ordering::Relaxed),
            inference_failures_total: self.inference_failures_total.load(Ordering::Relaxed),
            enhanced_total: self.enhanced_total.load(Ordering::Relaxed),
            fallback_total: self.fallback_total.load(Ordering::Relaxed),
            latency_samples_total: samples,
            avg_latency_millis: if samples == 0 {
                0.0
            } else {
                latency as f64 / samples as f64
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,teller_api=info,teller_agents=info,teller_llm=info,teller_ml=info",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .init();
    });
}
