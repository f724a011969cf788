//! One scrape cycle's shared view of the daemon.
//!
//! Enumeration happens exactly once per cycle; every collector then works
//! from the same frozen container list, so a container appearing or
//! vanishing mid-cycle cannot skew one collector against another.

use crate::docker::{ContainerRef, DockerClient, DockerError};
use std::sync::Arc;
use tracing::warn;

/// Result of the per-cycle container enumeration.
pub struct Enumeration {
    pub containers: Vec<ContainerRef>,
    /// Whether the daemon itself is considered reachable.
    pub daemon_up: bool,
    /// Whether the enumeration failed and the cycle degrades to empty.
    pub failed: bool,
}

/// Enumerate all containers for this cycle.
///
/// Never fails the cycle: an unreachable or unreadable daemon degrades to
/// an empty container list with the failure recorded on the result.
pub async fn enumerate(client: &DockerClient) -> Enumeration {
    match client.list_containers().await {
        Ok(containers) => Enumeration {
            containers,
            daemon_up: true,
            failed: false,
        },
        Err(err) => {
            warn!(error = %err, "container enumeration failed");
            // A connect failure means the daemon is down; a listing failure
            // on an established connection leaves the daemon itself up.
            let daemon_up = !matches!(err, DockerError::Connection(_)) && client.is_connected();
            Enumeration {
                containers: Vec::new(),
                daemon_up,
                failed: true,
            }
        }
    }
}

/// Frozen per-cycle context handed to every collector.
#[derive(Clone)]
pub struct Cycle {
    client: Arc<DockerClient>,
    containers: Arc<[ContainerRef]>,
}

impl Cycle {
    #[must_use]
    pub fn new(client: Arc<DockerClient>, containers: Vec<ContainerRef>) -> Self {
        Self {
            client,
            containers: containers.into(),
        }
    }

    #[must_use]
    pub fn client(&self) -> &Arc<DockerClient> {
        &self.client
    }

    #[must_use]
    pub fn containers(&self) -> &[ContainerRef] {
        &self.containers
    }
}
