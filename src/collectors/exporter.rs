//! Self-observation metrics for the exporter itself.

use super::registry::ScrapeResult;
use anyhow::Result;
use prometheus::{CounterVec, Gauge, IntCounter, IntGauge, Opts, Registry};

use super::projector::{NAMESPACE, SUBSYSTEM};

/// Scrape bookkeeping exported next to the container series.
#[derive(Clone)]
pub struct ExporterMetrics {
    daemon_up: IntGauge,
    container_num: IntGauge,
    last_scrape_duration: Gauge,
    last_scrape_error: IntGauge,
    scrapes_total: IntCounter,
    scrape_errors_total: CounterVec,
}

impl ExporterMetrics {
    /// # Panics
    ///
    /// Panics if metric creation fails (should never happen with valid metric names)
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        let daemon_up = IntGauge::with_opts(
            Opts::new("up", "Whether the docker daemon is reachable").namespace(NAMESPACE),
        )
        .expect("valid metric name");

        let container_num = IntGauge::with_opts(
            Opts::new("container_num", "Number of containers seen in the last scrape")
                .namespace(NAMESPACE)
                .subsystem(SUBSYSTEM),
        )
        .expect("valid metric name");

        let last_scrape_duration = Gauge::with_opts(
            Opts::new(
                "last_scrape_duration_seconds",
                "Duration of the last scrape cycle in seconds",
            )
            .namespace(NAMESPACE)
            .subsystem(SUBSYSTEM),
        )
        .expect("valid metric name");

        let last_scrape_error = IntGauge::with_opts(
            Opts::new(
                "last_scrape_error",
                "Whether the last scrape cycle failed to enumerate containers",
            )
            .namespace(NAMESPACE)
            .subsystem(SUBSYSTEM),
        )
        .expect("valid metric name");

        let scrapes_total = IntCounter::with_opts(
            Opts::new("scrapes_total", "Total scrape cycles since start")
                .namespace(NAMESPACE)
                .subsystem(SUBSYSTEM),
        )
        .expect("valid metric name");

        let scrape_errors_total = CounterVec::new(
            Opts::new(
                "scrape_errors_total",
                "Total collector failures since start",
            )
            .namespace(NAMESPACE)
            .subsystem(SUBSYSTEM),
            &["collector"],
        )
        .expect("valid metric name and labels");

        Self {
            daemon_up,
            container_num,
            last_scrape_duration,
            last_scrape_error,
            scrapes_total,
            scrape_errors_total,
        }
    }

    /// Register all metrics with the registry
    ///
    /// # Errors
    ///
    /// Returns an error if any metric fails to register
    pub fn register(&self, registry: &Registry) -> Result<()> {
        registry.register(Box::new(self.daemon_up.clone()))?;
        registry.register(Box::new(self.container_num.clone()))?;
        registry.register(Box::new(self.last_scrape_duration.clone()))?;
        registry.register(Box::new(self.last_scrape_error.clone()))?;
        registry.register(Box::new(self.scrapes_total.clone()))?;
        registry.register(Box::new(self.scrape_errors_total.clone()))?;
        Ok(())
    }

    pub fn inc_scrapes(&self) {
        self.scrapes_total.inc();
    }

    pub fn inc_collector_error(&self, collector: &str) {
        self.scrape_errors_total.with_label_values(&[collector]).inc();
    }

    /// Record the outcome of one finished scrape cycle.
    pub fn observe_cycle(&self, result: &ScrapeResult) {
        self.daemon_up.set(i64::from(result.daemon_up));
        self.container_num
            .set(i64::try_from(result.containers).unwrap_or(i64::MAX));
        self.last_scrape_duration.set(result.duration.as_secs_f64());
        self.last_scrape_error.set(i64::from(result.error));
    }
}

impl Default for ExporterMetrics {
    fn default() -> Self {
        Self::new()
    }
}
