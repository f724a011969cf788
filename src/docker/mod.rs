//! Client adapter over the Docker Engine API on the local unix socket.
//!
//! The adapter owns no concurrency of its own: it hands out a lazily
//! established, process-wide connection handle and exposes the two calls the
//! scrape cycle needs (list containers, one-shot stats for one container).

use bollard::API_DEFAULT_VERSION;
use bollard::Docker;
use bollard::container::{ListContainersOptions, Stats, StatsOptions};
use futures::StreamExt;
use tokio::sync::OnceCell;
use tracing::debug;

pub mod container;
pub mod error;
pub mod stats;

pub use container::{ContainerRef, LifecycleState};
pub use error::DockerError;
pub use stats::ResourceSnapshot;

/// Seconds bollard waits on daemon requests before giving up.
const CLIENT_TIMEOUT_SECS: u64 = 30;

/// Connector over the local Docker socket.
///
/// The handle is established on first use and cached for the lifetime of the
/// process. A failed attempt is not cached, so the next scrape cycle retries;
/// concurrent first callers cannot race the initialization, the cell hands
/// the slot to exactly one of them.
#[derive(Debug)]
pub struct DockerClient {
    socket: String,
    handle: OnceCell<Docker>,
}

impl DockerClient {
    #[must_use]
    pub fn new(socket: &str) -> Self {
        Self {
            socket: socket.to_string(),
            handle: OnceCell::new(),
        }
    }

    /// Socket path this client talks to.
    #[must_use]
    pub fn socket(&self) -> &str {
        &self.socket
    }

    /// Whether a connection has been established at some point.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.handle.initialized()
    }

    /// Connect once and return the cached handle.
    ///
    /// The connection is only considered established after the daemon
    /// answers a ping, so a dangling socket path fails here instead of on
    /// the first real call.
    ///
    /// # Errors
    ///
    /// Returns [`DockerError::Connection`] when the socket cannot be opened
    /// or the daemon does not answer.
    pub async fn handle(&self) -> Result<&Docker, DockerError> {
        self.handle
            .get_or_try_init(|| async {
                let docker = Docker::connect_with_unix(
                    &self.socket,
                    CLIENT_TIMEOUT_SECS,
                    API_DEFAULT_VERSION,
                )
                .map_err(DockerError::Connection)?;
                docker.ping().await.map_err(DockerError::Connection)?;
                debug!(socket = %self.socket, "connected to docker daemon");
                Ok(docker)
            })
            .await
    }

    /// List all containers known to the daemon, running or not.
    ///
    /// # Errors
    ///
    /// Returns [`DockerError::Connection`] when the daemon is unreachable,
    /// [`DockerError::List`] when it answers but the listing fails.
    pub async fn list_containers(&self) -> Result<Vec<ContainerRef>, DockerError> {
        let docker = self.handle().await?;
        let options = ListContainersOptions::<String> {
            all: true,
            ..Default::default()
        };

        let summaries = docker
            .list_containers(Some(options))
            .await
            .map_err(DockerError::List)?;

        Ok(summaries
            .into_iter()
            .map(ContainerRef::from_summary)
            .collect())
    }

    /// Fetch exactly one stats document for the given container.
    ///
    /// Uses the one-shot variant of the stats endpoint: the call blocks
    /// until the daemon returns a single document, never a stream.
    ///
    /// # Errors
    ///
    /// Returns [`DockerError::Connection`] when the daemon is unreachable,
    /// [`DockerError::Fetch`] when the per-container request fails, and
    /// [`DockerError::Decode`] when the daemon closes the stream without a
    /// document.
    pub async fn container_stats(&self, id: &str) -> Result<Stats, DockerError> {
        let docker = self.handle().await?;
        let options = StatsOptions {
            stream: false,
            one_shot: true,
        };

        let mut stream = docker.stats(id, Some(options));
        match stream.next().await {
            Some(Ok(stats)) => Ok(stats),
            Some(Err(source)) => Err(DockerError::Fetch {
                id: id.to_string(),
                source,
            }),
            None => Err(DockerError::Decode {
                id: id.to_string(),
                field: "stats document",
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dead_client() -> DockerClient {
        DockerClient::new("/nonexistent/docker.sock")
    }

    #[tokio::test]
    async fn test_handle_fails_without_daemon() {
        let client = dead_client();

        let err = client.handle().await.unwrap_err();
        assert!(matches!(err, DockerError::Connection(_)));
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn test_failed_connect_is_retried_not_cached() {
        let client = dead_client();

        assert!(client.handle().await.is_err());
        // A failed attempt must not poison the cell; the next cycle retries.
        assert!(client.handle().await.is_err());
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn test_list_containers_surfaces_connection_error() {
        let client = dead_client();

        let err = client.list_containers().await.unwrap_err();
        assert!(err.is_daemon_level());
    }

    #[test]
    fn test_socket_is_kept_verbatim() {
        let client = DockerClient::new("/var/run/docker.sock");
        assert_eq!(client.socket(), "/var/run/docker.sock");
    }
}
