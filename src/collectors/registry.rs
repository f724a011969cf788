use crate::collectors::all_factories;
use crate::collectors::config::CollectorConfig;
use crate::collectors::cycle::{self, Cycle};
use crate::collectors::exporter::ExporterMetrics;
use crate::collectors::{Collector, CollectorType};
use crate::docker::DockerClient;
use anyhow::Result;
use prometheus::{Registry, TextEncoder};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Outcome of one scrape cycle, fed back into the self-metrics.
pub struct ScrapeResult {
    pub duration: Duration,
    /// Whether container enumeration failed and the cycle degraded.
    pub error: bool,
    pub daemon_up: bool,
    pub containers: usize,
    pub failed_containers: Vec<String>,
}

/// Owns the enabled collectors and drives the scrape cycle end to end.
pub struct CollectorRegistry {
    collectors: Vec<CollectorType>,
    registry: Registry,
    metrics: ExporterMetrics,
    /// Cycles never overlap, and the encode of one cycle's output is
    /// serialized with the next cycle's reset. Held across scrape + encode.
    cycle_lock: Mutex<()>,
}

impl CollectorRegistry {
    /// Instantiate the enabled collectors and register their metrics.
    ///
    /// # Errors
    ///
    /// Returns an error if any metric fails to register
    pub fn new(config: &CollectorConfig) -> Result<Self> {
        let factories = all_factories();
        let collectors: Vec<CollectorType> = config
            .enabled_collectors
            .iter()
            .filter_map(|name| factories.get(name.as_str()).map(|f| f(&config.settings)))
            .collect();

        let registry = Registry::new();
        for collector in &collectors {
            collector.register_metrics(&registry)?;
        }

        let metrics = ExporterMetrics::new();
        metrics.register(&registry)?;

        Ok(Self {
            collectors,
            registry,
            metrics,
            cycle_lock: Mutex::new(()),
        })
    }

    #[must_use]
    pub fn collector_names(&self) -> Vec<&'static str> {
        self.collectors.iter().map(Collector::name).collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collectors.is_empty()
    }

    /// Run one full scrape cycle and encode the registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the gathered metrics cannot be encoded
    pub async fn run_cycle(&self, client: &Arc<DockerClient>) -> Result<String> {
        // The guard must cover the encode as well: a cycle starting
        // mid-gather would reset the per-container vectors under the
        // reader and tear the exported set.
        let _guard = self.cycle_lock.lock().await;
        let result = self.scrape(client).await;
        debug!(
            duration_ms = result.duration.as_millis() as u64,
            containers = result.containers,
            failed = result.failed_containers.len(),
            "scrape cycle finished"
        );

        let encoder = TextEncoder::new();
        Ok(encoder.encode_to_string(&self.registry.gather())?)
    }

    async fn scrape(&self, client: &Arc<DockerClient>) -> ScrapeResult {
        let started = Instant::now();
        self.metrics.inc_scrapes();

        // Enumerate exactly once; every collector works from this list.
        let enumeration = cycle::enumerate(client).await;
        let containers = enumeration.containers.len();
        let cycle = Cycle::new(Arc::clone(client), enumeration.containers);

        let mut failed_containers = Vec::new();
        for collector in &self.collectors {
            match collector.collect(&cycle).await {
                Ok(summary) => failed_containers.extend(summary.failed_containers),
                Err(e) => {
                    warn!(collector = collector.name(), error = %e, "collector failed");
                    self.metrics.inc_collector_error(collector.name());
                }
            }
        }

        let result = ScrapeResult {
            duration: started.elapsed(),
            error: enumeration.failed,
            daemon_up: enumeration.daemon_up,
            containers,
            failed_containers,
        };
        self.metrics.observe_cycle(&result);
        result
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn full_config() -> CollectorConfig {
        CollectorConfig::new().with_enabled(&["status".to_string(), "stats".to_string()])
    }

    fn dead_client() -> Arc<DockerClient> {
        Arc::new(DockerClient::new("/nonexistent/docker.sock"))
    }

    #[test]
    fn test_unknown_collector_names_are_ignored() {
        let config = CollectorConfig::new().with_enabled(&["nonexistent".to_string()]);
        let registry = CollectorRegistry::new(&config).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_collector_names_reflect_config() {
        let registry = CollectorRegistry::new(&full_config()).unwrap();
        let mut names = registry.collector_names();
        names.sort_unstable();
        assert_eq!(names, vec!["stats", "status"]);
    }

    #[tokio::test]
    async fn test_run_cycle_degrades_when_daemon_unreachable() {
        let registry = CollectorRegistry::new(&full_config()).unwrap();

        let text = registry.run_cycle(&dead_client()).await.unwrap();
        assert!(text.contains("docker_up 0"));
        assert!(text.contains("docker_exporter_last_scrape_error 1"));
        assert!(text.contains("docker_exporter_container_num 0"));
    }

    #[tokio::test]
    async fn test_encode_is_serialized_with_cycles() {
        let registry = Arc::new(CollectorRegistry::new(&full_config()).unwrap());
        let client = dead_client();
        registry.run_cycle(&client).await.unwrap();

        // While a cycle holds the lock, a concurrent request must not
        // gather the registry.
        let guard = registry.cycle_lock.lock().await;
        let reader = Arc::clone(&registry);
        let reader_client = Arc::clone(&client);
        let mut pending = tokio::spawn(async move { reader.run_cycle(&reader_client).await });

        let blocked = tokio::time::timeout(Duration::from_millis(100), &mut pending).await;
        assert!(blocked.is_err());

        drop(guard);
        let text = pending.await.unwrap().unwrap();
        assert!(text.contains("docker_exporter_scrapes_total 2"));
    }

    #[tokio::test]
    async fn test_scrapes_total_counts_cycles() {
        let registry = CollectorRegistry::new(&full_config()).unwrap();
        let client = dead_client();

        registry.run_cycle(&client).await.unwrap();
        let text = registry.run_cycle(&client).await.unwrap();
        assert!(text.contains("docker_exporter_scrapes_total 2"));
    }
}
