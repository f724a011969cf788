use thiserror::Error;

/// Failure taxonomy for the runtime adapter.
///
/// `Connection` and `List` degrade the whole scrape cycle (the daemon is
/// treated as down or unreadable); `Fetch` and `Decode` are scoped to a
/// single container and never abort the batch.
#[derive(Debug, Error)]
pub enum DockerError {
    #[error("cannot reach docker daemon: {0}")]
    Connection(#[source] bollard::errors::Error),

    #[error("listing containers failed: {0}")]
    List(#[source] bollard::errors::Error),

    #[error("stats fetch for container {id} failed: {source}")]
    Fetch {
        id: String,
        #[source]
        source: bollard::errors::Error,
    },

    #[error("stats document for container {id} is missing {field}")]
    Decode { id: String, field: &'static str },
}

impl DockerError {
    /// True when the daemon itself is unreachable or unreadable, as opposed
    /// to a single container misbehaving.
    #[must_use]
    pub const fn is_daemon_level(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::List(_))
    }
}
