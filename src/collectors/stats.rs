//! Resource stats orchestration: concurrent per-container fan-out with a
//! bounded fan-in.
//!
//! Each eligible container gets its own fetch task; results converge on a
//! channel the collector drains until either every task reported or the
//! cycle deadline passes. One slow or broken container never blocks the
//! rest and never pushes the scrape past the deadline.

use super::cycle::Cycle;
use super::projector::{NAMESPACE, Projector, SUBSYSTEM};
use super::{CollectSummary, Collector, CollectorSettings};
use crate::docker::{ContainerRef, DockerClient, LifecycleState, ResourceSnapshot};
use anyhow::Result;
use prometheus::{IntCounter, Opts, Registry};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, timeout_at};
use tracing::{info_span, warn};
use tracing_futures::Instrument;

/// Upper bound on one fan-in: results arriving later are dropped.
const FAN_IN_TIMEOUT: Duration = Duration::from_secs(10);

type FetchResult = (ContainerRef, Option<ResourceSnapshot>);

#[derive(Clone)]
pub struct StatsCollector {
    projector: Projector,
    fan_in_timeout: Duration,
    fetch_failures: IntCounter,
    fanin_timeouts: IntCounter,
}

impl StatsCollector {
    /// # Panics
    ///
    /// Panics if metric creation fails (should never happen with valid metric names)
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new(settings: &CollectorSettings) -> Self {
        let fetch_failures = IntCounter::with_opts(
            Opts::new(
                "stats_fetch_failures_total",
                "Total per-container stats fetches that failed or did not decode",
            )
            .namespace(NAMESPACE)
            .subsystem(SUBSYSTEM),
        )
        .expect("valid metric name");

        let fanin_timeouts = IntCounter::with_opts(
            Opts::new(
                "stats_fanin_timeouts_total",
                "Total scrape cycles whose stats fan-in hit the deadline",
            )
            .namespace(NAMESPACE)
            .subsystem(SUBSYSTEM),
        )
        .expect("valid metric name");

        Self {
            projector: Projector::new(&settings.container_labels),
            fan_in_timeout: FAN_IN_TIMEOUT,
            fetch_failures,
            fanin_timeouts,
        }
    }

    /// Drain fetch results until the channel closes or the deadline passes.
    async fn drain(
        &self,
        mut rx: mpsc::Receiver<FetchResult>,
        deadline: Instant,
    ) -> (CollectSummary, bool) {
        let mut failed_containers = Vec::new();
        let mut timed_out = false;

        loop {
            match timeout_at(deadline, rx.recv()).await {
                Ok(Some((container, Some(snapshot)))) => {
                    self.projector.project(&container, &snapshot);
                }
                Ok(Some((container, None))) => {
                    self.fetch_failures.inc();
                    failed_containers.push(container.canonical_name().to_string());
                }
                Ok(None) => break,
                Err(_) => {
                    timed_out = true;
                    break;
                }
            }
        }

        (CollectSummary { failed_containers }, timed_out)
    }
}

/// Only running containers have stats worth fetching.
fn eligible(containers: &[ContainerRef]) -> Vec<ContainerRef> {
    containers
        .iter()
        .filter(|container| container.lifecycle() == LifecycleState::Up)
        .cloned()
        .collect()
}

async fn fetch_snapshot(
    client: &DockerClient,
    container: &ContainerRef,
) -> Option<ResourceSnapshot> {
    let decoded = client
        .container_stats(&container.id)
        .await
        .and_then(|stats| ResourceSnapshot::decode(&container.id, &stats));

    match decoded {
        Ok(snapshot) => Some(snapshot),
        Err(err) => {
            warn!(id = %container.id, error = %err, "stats fetch failed");
            None
        }
    }
}

impl Collector for StatsCollector {
    fn name(&self) -> &'static str {
        "stats"
    }

    fn register_metrics(&self, registry: &Registry) -> Result<()> {
        self.projector.register(registry)?;
        registry.register(Box::new(self.fetch_failures.clone()))?;
        registry.register(Box::new(self.fanin_timeouts.clone()))?;
        Ok(())
    }

    async fn collect(&self, cycle: &Cycle) -> Result<CollectSummary> {
        self.projector.reset();

        let targets = eligible(cycle.containers());
        if targets.is_empty() {
            return Ok(CollectSummary::default());
        }

        let deadline = Instant::now() + self.fan_in_timeout;
        let (tx, rx) = mpsc::channel(targets.len());

        for container in targets {
            let tx = tx.clone();
            let client = Arc::clone(cycle.client());
            let span = info_span!("stats_fetch", id = %container.id);
            tokio::spawn(
                async move {
                    let snapshot = fetch_snapshot(&client, &container).await;
                    // A closed channel means the cycle moved on; drop the result.
                    let _ = tx.send((container, snapshot)).await;
                }
                .instrument(span),
            );
        }
        drop(tx);

        let (summary, timed_out) = self.drain(rx, deadline).await;
        if timed_out {
            self.fanin_timeouts.inc();
            warn!(
                timeout_secs = self.fan_in_timeout.as_secs(),
                "stats fan-in deadline hit, dropping outstanding fetches"
            );
        }

        Ok(summary)
    }

    fn enabled_by_default(&self) -> bool {
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::docker::stats::{CpuSample, MemorySample};
    use std::collections::{BTreeMap, HashMap};

    fn container(id: &str, status: &str) -> ContainerRef {
        ContainerRef {
            id: id.to_string(),
            names: vec![format!("/{id}")],
            image: "nginx:latest".to_string(),
            image_id: "sha256:deadbeef".to_string(),
            status: status.to_string(),
            labels: HashMap::new(),
        }
    }

    fn snapshot() -> ResourceSnapshot {
        ResourceSnapshot {
            cpu: CpuSample {
                total_usage: 987_654_321,
                per_core: Vec::new(),
                kernel_mode: 120_000_000,
                user_mode: 867_654_321,
                system_usage: None,
            },
            memory: MemorySample {
                usage: 8_589_934_592,
                limit: 17_179_869_184,
                max_usage: None,
                failcnt: 0,
            },
            blkio: BTreeMap::new(),
            networks: BTreeMap::new(),
        }
    }

    fn samples_for(registry: &Registry, name: &str) -> usize {
        registry
            .gather()
            .iter()
            .filter(|family| family.name() == name)
            .map(|family| family.get_metric().len())
            .sum()
    }

    #[test]
    fn test_eligible_keeps_only_running_containers() {
        let containers = vec![
            container("web-1", "Up 2 hours"),
            container("job-1", "Exited (0) 1 day ago"),
            container("new-1", "Created"),
        ];

        let targets = eligible(&containers);
        assert_eq!(targets.len(), 1);
        assert_eq!(targets.first().unwrap().id, "web-1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_deadline_discards_late_results() {
        let collector = StatsCollector::new(&CollectorSettings::default());
        let (tx, rx) = mpsc::channel(2);
        let deadline = Instant::now() + FAN_IN_TIMEOUT;

        tx.send((container("web-1", "Up 2 hours"), Some(snapshot())))
            .await
            .unwrap();

        // The sender stays alive past the deadline, simulating a stuck fetch.
        let (summary, timed_out) = collector.drain(rx, deadline).await;
        assert!(timed_out);
        assert!(summary.failed_containers.is_empty());

        // The receiver is gone; a straggler's send fails instead of blocking.
        assert!(
            tx.send((container("slow-1", "Up 1 hour"), None))
                .await
                .is_err()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_failed_fetch_does_not_poison_the_batch() {
        let registry = Registry::new();
        let collector = StatsCollector::new(&CollectorSettings::default());
        collector.register_metrics(&registry).unwrap();

        let (tx, rx) = mpsc::channel(2);
        tx.send((container("web-1", "Up 2 hours"), Some(snapshot())))
            .await
            .unwrap();
        tx.send((container("web-2", "Up 1 hour"), None))
            .await
            .unwrap();
        drop(tx);

        let deadline = Instant::now() + FAN_IN_TIMEOUT;
        let (summary, timed_out) = collector.drain(rx, deadline).await;

        assert!(!timed_out);
        assert_eq!(summary.failed_containers, vec!["web-2".to_string()]);
        assert_eq!(collector.fetch_failures.get(), 1);
        assert_eq!(samples_for(&registry, "docker_container_mem_usage"), 1);
    }

    #[tokio::test]
    async fn test_collect_with_no_running_containers_is_a_no_op() {
        let registry = Registry::new();
        let collector = StatsCollector::new(&CollectorSettings::default());
        collector.register_metrics(&registry).unwrap();

        let client = Arc::new(DockerClient::new("/nonexistent/docker.sock"));
        let cycle = Cycle::new(client, vec![container("job-1", "Exited (0) 1 day ago")]);

        let summary = collector.collect(&cycle).await.unwrap();
        assert!(summary.failed_containers.is_empty());
        assert_eq!(samples_for(&registry, "docker_container_mem_usage"), 0);
    }
}
