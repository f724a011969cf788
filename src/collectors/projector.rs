//! Projection of decoded snapshots into the labeled metric space.
//!
//! All per-container series share one label schema fixed at startup: the
//! identity labels plus the configured docker label keys. The projector owns
//! the gauge vectors and resets them at the start of every cycle, so series
//! for containers that disappeared decay immediately instead of going stale.

use crate::docker::{ContainerRef, ResourceSnapshot};
use anyhow::Result;
use prometheus::{IntGaugeVec, Opts, Registry};

pub const NAMESPACE: &str = "docker";
pub const SUBSYSTEM: &str = "exporter";

/// Identity labels present on every per-container series.
pub const BASE_LABELS: [&str; 4] = ["id", "name", "image", "image_id"];

/// Map a raw label key into the metric label charset.
///
/// Idempotent: sanitizing a sanitized key is a no-op.
#[must_use]
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Clamp an unsigned sample into the gauge's integer range.
fn as_gauge(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Gauge vectors for all resource series, one label schema across them.
#[derive(Clone)]
pub struct Projector {
    /// Raw docker label key paired with its sanitized metric label name.
    extra_labels: Vec<(String, String)>,

    mem_usage: IntGaugeVec,
    mem_limit: IntGaugeVec,
    mem_max_usage: IntGaugeVec,
    mem_failcnt: IntGaugeVec,
    cpu_usage_total: IntGaugeVec,
    cpu_usage_kernelmode: IntGaugeVec,
    cpu_usage_usermode: IntGaugeVec,
    cpu_system_usage: IntGaugeVec,
    cpu_usage_percpu: IntGaugeVec,
    network_rx_bytes: IntGaugeVec,
    network_tx_bytes: IntGaugeVec,
    network_rx_errors: IntGaugeVec,
    network_tx_errors: IntGaugeVec,
    blkio_bytes: IntGaugeVec,
}

impl Projector {
    /// Build the vectors with the startup-fixed label schema.
    ///
    /// # Panics
    ///
    /// Panics if metric creation fails (should never happen with valid metric names)
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new(container_labels: &[String]) -> Self {
        let extra_labels: Vec<(String, String)> = container_labels
            .iter()
            .map(|raw| (raw.clone(), sanitize(raw)))
            .collect();

        let labels: Vec<&str> = BASE_LABELS
            .iter()
            .copied()
            .chain(extra_labels.iter().map(|(_, name)| name.as_str()))
            .collect();

        let vec = |name: &str, help: &str, extra_dim: Option<&str>| {
            let mut dims = labels.clone();
            if let Some(dim) = extra_dim {
                dims.push(dim);
            }
            IntGaugeVec::new(Opts::new(name, help).namespace(NAMESPACE), &dims)
                .expect("valid metric name and labels")
        };

        Self {
            mem_usage: vec("container_mem_usage", "Container memory usage in bytes", None),
            mem_limit: vec("container_mem_limit", "Container memory limit in bytes", None),
            mem_max_usage: vec(
                "container_mem_max_usage",
                "Container peak memory usage in bytes",
                None,
            ),
            mem_failcnt: vec(
                "container_mem_failcnt",
                "Number of times the container hit its memory limit",
                None,
            ),
            cpu_usage_total: vec(
                "container_cpu_usage_total",
                "Cumulative container CPU time in nanoseconds",
                None,
            ),
            cpu_usage_kernelmode: vec(
                "container_cpu_usage_kernelmode",
                "Cumulative container CPU time spent in kernel mode in nanoseconds",
                None,
            ),
            cpu_usage_usermode: vec(
                "container_cpu_usage_usermode",
                "Cumulative container CPU time spent in user mode in nanoseconds",
                None,
            ),
            cpu_system_usage: vec(
                "container_cpu_system_usage",
                "Cumulative host CPU time in nanoseconds as seen at sample time",
                None,
            ),
            cpu_usage_percpu: vec(
                "container_cpu_usage_percpu",
                "Cumulative container CPU time per core in nanoseconds",
                Some("cpu"),
            ),
            network_rx_bytes: vec(
                "container_network_rx_bytes",
                "Container network bytes received per interface",
                Some("interface"),
            ),
            network_tx_bytes: vec(
                "container_network_tx_bytes",
                "Container network bytes transmitted per interface",
                Some("interface"),
            ),
            network_rx_errors: vec(
                "container_network_rx_errors",
                "Container network receive errors per interface",
                Some("interface"),
            ),
            network_tx_errors: vec(
                "container_network_tx_errors",
                "Container network transmit errors per interface",
                Some("interface"),
            ),
            blkio_bytes: vec(
                "container_blkio_bytes",
                "Container cumulative block I/O bytes per operation",
                Some("op"),
            ),
            extra_labels,
        }
    }

    fn all_vecs(&self) -> [&IntGaugeVec; 14] {
        [
            &self.mem_usage,
            &self.mem_limit,
            &self.mem_max_usage,
            &self.mem_failcnt,
            &self.cpu_usage_total,
            &self.cpu_usage_kernelmode,
            &self.cpu_usage_usermode,
            &self.cpu_system_usage,
            &self.cpu_usage_percpu,
            &self.network_rx_bytes,
            &self.network_tx_bytes,
            &self.network_rx_errors,
            &self.network_tx_errors,
            &self.blkio_bytes,
        ]
    }

    /// Register all vectors with the registry.
    ///
    /// # Errors
    ///
    /// Returns an error if any metric fails to register
    pub fn register(&self, registry: &Registry) -> Result<()> {
        for vec in self.all_vecs() {
            registry.register(Box::new(vec.clone()))?;
        }
        Ok(())
    }

    /// Drop every series; containers gone since the last cycle decay here.
    pub fn reset(&self) {
        for vec in self.all_vecs() {
            vec.reset();
        }
    }

    /// Label values for one container in schema order.
    ///
    /// A configured docker label the container does not carry projects as
    /// the empty string, keeping the schema uniform across containers.
    #[must_use]
    pub fn label_values<'a>(&'a self, container: &'a ContainerRef) -> Vec<&'a str> {
        let mut values = vec![
            container.id.as_str(),
            container.canonical_name(),
            container.image.as_str(),
            container.image_id.as_str(),
        ];
        for (raw, _) in &self.extra_labels {
            values.push(container.labels.get(raw).map_or("", String::as_str));
        }
        values
    }

    /// Set all series for one container from its decoded snapshot.
    pub fn project(&self, container: &ContainerRef, snapshot: &ResourceSnapshot) {
        let base = self.label_values(container);

        self.mem_usage
            .with_label_values(&base)
            .set(as_gauge(snapshot.memory.usage));
        self.mem_limit
            .with_label_values(&base)
            .set(as_gauge(snapshot.memory.limit));
        if let Some(max_usage) = snapshot.memory.max_usage {
            self.mem_max_usage
                .with_label_values(&base)
                .set(as_gauge(max_usage));
        }
        self.mem_failcnt
            .with_label_values(&base)
            .set(as_gauge(snapshot.memory.failcnt));

        self.cpu_usage_total
            .with_label_values(&base)
            .set(as_gauge(snapshot.cpu.total_usage));
        self.cpu_usage_kernelmode
            .with_label_values(&base)
            .set(as_gauge(snapshot.cpu.kernel_mode));
        self.cpu_usage_usermode
            .with_label_values(&base)
            .set(as_gauge(snapshot.cpu.user_mode));
        if let Some(system_usage) = snapshot.cpu.system_usage {
            self.cpu_system_usage
                .with_label_values(&base)
                .set(as_gauge(system_usage));
        }
        for (core, usage) in snapshot.cpu.per_core.iter().enumerate() {
            let core = core.to_string();
            let mut labels = base.clone();
            labels.push(core.as_str());
            self.cpu_usage_percpu
                .with_label_values(&labels)
                .set(as_gauge(*usage));
        }

        for (interface, net) in &snapshot.networks {
            let mut labels = base.clone();
            labels.push(interface.as_str());
            self.network_rx_bytes
                .with_label_values(&labels)
                .set(as_gauge(net.rx_bytes));
            self.network_tx_bytes
                .with_label_values(&labels)
                .set(as_gauge(net.tx_bytes));
            self.network_rx_errors
                .with_label_values(&labels)
                .set(as_gauge(net.rx_errors));
            self.network_tx_errors
                .with_label_values(&labels)
                .set(as_gauge(net.tx_errors));
        }

        for (op, bytes) in &snapshot.blkio {
            let mut labels = base.clone();
            labels.push(op.as_str());
            self.blkio_bytes
                .with_label_values(&labels)
                .set(as_gauge(*bytes));
        }
    }
}
