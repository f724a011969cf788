//! Schema mapping from the daemon's stats document to [`ResourceSnapshot`].
//!
//! The mapping is explicit and all-or-nothing: a document missing a required
//! field yields a structured [`DockerError::Decode`] instead of a snapshot
//! with silent zero fields.

use crate::docker::error::DockerError;
use bollard::container::Stats;
use std::collections::BTreeMap;

/// Decoded point-in-time resource stats for one container.
///
/// Owned by the fetch that produced it until handed to the projector; never
/// mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSnapshot {
    pub cpu: CpuSample,
    pub memory: MemorySample,
    /// Cumulative block-I/O bytes folded by operation (lowercased).
    pub blkio: BTreeMap<String, u64>,
    /// Per-interface network counters.
    pub networks: BTreeMap<String, NetworkSample>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuSample {
    /// Cumulative CPU time in nanoseconds, all cores combined.
    pub total_usage: u64,
    /// Cumulative CPU time per core; empty on cgroup v2 hosts.
    pub per_core: Vec<u64>,
    pub kernel_mode: u64,
    pub user_mode: u64,
    /// Host-wide CPU time, absent on the first sample after daemon start.
    pub system_usage: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemorySample {
    pub usage: u64,
    pub limit: u64,
    /// Peak usage; not reported on cgroup v2 hosts.
    pub max_usage: Option<u64>,
    pub failcnt: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkSample {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub rx_errors: u64,
    pub tx_errors: u64,
}

impl ResourceSnapshot {
    /// Map one stats document into the snapshot schema.
    ///
    /// # Errors
    ///
    /// Returns [`DockerError::Decode`] when memory accounting is missing,
    /// which the daemon reports for containers that stopped between
    /// enumeration and fetch.
    pub fn decode(id: &str, stats: &Stats) -> Result<Self, DockerError> {
        let usage = stats.memory_stats.usage.ok_or(DockerError::Decode {
            id: id.to_string(),
            field: "memory_stats.usage",
        })?;
        let limit = stats.memory_stats.limit.ok_or(DockerError::Decode {
            id: id.to_string(),
            field: "memory_stats.limit",
        })?;

        let mut blkio: BTreeMap<String, u64> = BTreeMap::new();
        for entry in stats.blkio_stats.io_service_bytes_recursive.iter().flatten() {
            *blkio.entry(entry.op.to_ascii_lowercase()).or_insert(0) += entry.value;
        }

        let networks = stats
            .networks
            .iter()
            .flatten()
            .map(|(interface, net)| {
                (
                    interface.clone(),
                    NetworkSample {
                        rx_bytes: net.rx_bytes,
                        tx_bytes: net.tx_bytes,
                        rx_errors: net.rx_errors,
                        tx_errors: net.tx_errors,
                    },
                )
            })
            .collect();

        Ok(Self {
            cpu: CpuSample {
                total_usage: stats.cpu_stats.cpu_usage.total_usage,
                per_core: stats
                    .cpu_stats
                    .cpu_usage
                    .percpu_usage
                    .clone()
                    .unwrap_or_default(),
                kernel_mode: stats.cpu_stats.cpu_usage.usage_in_kernelmode,
                user_mode: stats.cpu_stats.cpu_usage.usage_in_usermode,
                system_usage: stats.cpu_stats.system_cpu_usage,
            },
            memory: MemorySample {
                usage,
                limit,
                max_usage: stats.memory_stats.max_usage,
                failcnt: stats.memory_stats.failcnt.unwrap_or(0),
            },
            blkio,
            networks,
        })
    }
}
