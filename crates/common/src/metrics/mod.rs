//! In-process metrics collection
//!
//! Counters, gauges, and histograms keyed by name plus tag set. Histograms
//! keep a bounded window of recent samples for percentile estimation while
//! lifetime count, sum, min, and max cover every sample ever recorded, so a
//! long-running series reports stable totals next to recent latency shape.
//!
//! Collection is in-memory only. Exposition to an external system happens by
//! draining [`MetricsCollector::all_metrics`] elsewhere.

mod key;
pub mod names;

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::json;

pub use key::{metric_key, Tags};

use crate::log_context;
use crate::logging::Logger;

/// Samples retained per histogram series for percentile estimation.
const HISTOGRAM_WINDOW: usize = 1000;

/// Point-in-time summary of one histogram series.
///
/// `count`, `sum`, `min`, `max`, and `avg` are lifetime aggregates;
/// the percentiles are estimated from the bounded sample window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramStats {
    pub count: u64,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
}

/// Everything the collector currently holds, for exposition or debugging.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub counters: HashMap<String, f64>,
    pub histograms: HashMap<String, HistogramStats>,
    pub gauges: HashMap<String, f64>,
}

#[derive(Debug, Clone, Copy)]
struct Counter {
    count: f64,
    last_increment: DateTime<Utc>,
}

#[derive(Debug)]
struct HistogramData {
    window: VecDeque<f64>,
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
}

impl HistogramData {
    fn new() -> Self {
        Self {
            window: VecDeque::with_capacity(HISTOGRAM_WINDOW),
            count: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    // Eviction only trims the percentile window; the lifetime aggregates
    // keep counting.
    fn record(&mut self, value: f64) {
        if self.window.len() == HISTOGRAM_WINDOW {
            self.window.pop_front();
        }
        self.window.push_back(value);

        self.count += 1;
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    fn stats(&self) -> HistogramStats {
        let mut sorted: Vec<f64> = self.window.iter().copied().collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        HistogramStats {
            count: self.count,
            sum: self.sum,
            min: self.min,
            max: self.max,
            avg: round2(self.sum / self.count as f64),
            p50: percentile(&sorted, 0.5),
            p95: percentile(&sorted, 0.95),
            p99: percentile(&sorted, 0.99),
        }
    }
}

/// Nearest-rank percentile over an ascending sample slice.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (sorted.len() as f64 * p).ceil() as usize;
    sorted[rank.saturating_sub(1).min(sorted.len() - 1)]
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Thread-safe metrics registry.
///
/// Cheap to share behind an [`Arc`]; every operation takes `&self`.
pub struct MetricsCollector {
    counters: RwLock<HashMap<String, Counter>>,
    histograms: RwLock<HashMap<String, HistogramData>>,
    gauges: RwLock<HashMap<String, f64>>,
    logger: Arc<Logger>,
}

impl MetricsCollector {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self {
            counters: RwLock::new(HashMap::new()),
            histograms: RwLock::new(HashMap::new()),
            gauges: RwLock::new(HashMap::new()),
            logger,
        }
    }

    /// Add `value` to a counter series, creating it at zero first, and stamp
    /// its last-increment time.
    pub fn increment_counter(&self, name: &str, value: f64, tags: Option<&Tags>) {
        let key = metric_key(name, tags);
        let total = {
            let mut counters = self.counters.write();
            let counter = counters
                .entry(key)
                .or_insert(Counter { count: 0.0, last_increment: Utc::now() });
            counter.count += value;
            counter.last_increment = Utc::now();
            counter.count
        };
        self.debug_echo(format!("Counter incremented: {name}"), name, total, tags);
    }

    /// Increment a counter by one.
    pub fn increment(&self, name: &str, tags: Option<&Tags>) {
        self.increment_counter(name, 1.0, tags);
    }

    /// Record one sample into a histogram series.
    pub fn record_histogram(&self, name: &str, value: f64, tags: Option<&Tags>) {
        let key = metric_key(name, tags);
        self.histograms
            .write()
            .entry(key)
            .or_insert_with(HistogramData::new)
            .record(value);
        self.debug_echo(format!("Histogram recorded: {name}"), name, value, tags);
    }

    /// Set a gauge series to an absolute value.
    pub fn set_gauge(&self, name: &str, value: f64, tags: Option<&Tags>) {
        let key = metric_key(name, tags);
        self.gauges.write().insert(key, value);
        self.debug_echo(format!("Gauge set: {name}"), name, value, tags);
    }

    fn debug_echo(&self, message: String, name: &str, value: f64, tags: Option<&Tags>) {
        let mut context = log_context! { "name" => name, "value" => value };
        if let Some(tags) = tags {
            context.insert("tags".to_string(), json!(tags));
        }
        self.logger.debug(message, Some(context));
    }

    /// Current counter total, zero if the series was never incremented.
    pub fn get_counter(&self, name: &str, tags: Option<&Tags>) -> f64 {
        self.counters
            .read()
            .get(&metric_key(name, tags))
            .map(|counter| counter.count)
            .unwrap_or(0.0)
    }

    /// When the counter series was last incremented, if ever.
    pub fn counter_last_increment(&self, name: &str, tags: Option<&Tags>) -> Option<DateTime<Utc>> {
        self.counters
            .read()
            .get(&metric_key(name, tags))
            .map(|counter| counter.last_increment)
    }

    /// Last value set on a gauge series, if any.
    pub fn get_gauge(&self, name: &str, tags: Option<&Tags>) -> Option<f64> {
        self.gauges.read().get(&metric_key(name, tags)).copied()
    }

    /// Summary statistics for a histogram series, `None` if no sample was
    /// ever recorded for it.
    pub fn get_histogram_stats(&self, name: &str, tags: Option<&Tags>) -> Option<HistogramStats> {
        self.histograms
            .read()
            .get(&metric_key(name, tags))
            .map(HistogramData::stats)
    }

    /// Snapshot of every series currently held. Counter series export their
    /// totals; the last-increment stamps stay internal.
    pub fn all_metrics(&self) -> MetricsSnapshot {
        let counters = self
            .counters
            .read()
            .iter()
            .map(|(key, counter)| (key.clone(), counter.count))
            .collect();
        let gauges = self.gauges.read().clone();
        let histograms = self
            .histograms
            .read()
            .iter()
            .map(|(key, data)| (key.clone(), data.stats()))
            .collect();

        MetricsSnapshot { counters, histograms, gauges }
    }

    /// Drop every series. Lifetime aggregates start over too.
    pub fn reset(&self) {
        self.counters.write().clear();
        self.histograms.write().clear();
        self.gauges.write().clear();
        self.logger.info("Metrics reset", None);
    }
}

impl std::fmt::Debug for MetricsCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsCollector")
            .field("counters", &self.counters.read().len())
            .field("histograms", &self.histograms.read().len())
            .field("gauges", &self.gauges.read().len())
            .finish()
    }
}

/// Time an async operation and record its duration as a histogram sample.
///
/// Failed operations are recorded under the same name with a `status:error`
/// tag added, so success and failure latency stay separable. The result is
/// returned unchanged either way.
pub async fn measure_execution_time<F, Fut, T, E>(
    metrics: &MetricsCollector,
    name: &str,
    tags: Option<Tags>,
    f: F,
) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let start = Instant::now();
    let result = f().await;
    let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

    match &result {
        Ok(_) => metrics.record_histogram(name, duration_ms, tags.as_ref()),
        Err(_) => {
            let mut tags = tags.unwrap_or_default();
            tags.insert("status".to_string(), "error".to_string());
            metrics.record_histogram(name, duration_ms, Some(&tags));
        }
    }

    result
}
