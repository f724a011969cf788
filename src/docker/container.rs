use bollard::models::ContainerSummary;
use std::collections::HashMap;

/// Identity snapshot for one container, taken at enumeration time.
///
/// Immutable for the rest of the scrape cycle: every snapshot fetched during
/// a cycle is paired with the `ContainerRef` from that same cycle's
/// enumeration, never with a refreshed one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRef {
    pub id: String,
    /// Display names as reported by the daemon; the first one is canonical.
    pub names: Vec<String>,
    pub image: String,
    pub image_id: String,
    /// Raw human-readable status string, e.g. "Up 2 hours".
    pub status: String,
    /// Docker labels attached to the container.
    pub labels: HashMap<String, String>,
}

impl ContainerRef {
    #[must_use]
    pub fn from_summary(summary: ContainerSummary) -> Self {
        Self {
            id: summary.id.unwrap_or_default(),
            names: summary.names.unwrap_or_default(),
            image: summary.image.unwrap_or_default(),
            image_id: summary.image_id.unwrap_or_default(),
            status: summary.status.unwrap_or_default(),
            labels: summary.labels.unwrap_or_default(),
        }
    }

    /// First display name, without the leading slash the daemon prepends.
    #[must_use]
    pub fn canonical_name(&self) -> &str {
        self.names
            .first()
            .map_or("", |name| name.strip_prefix('/').unwrap_or(name))
    }

    #[must_use]
    pub fn lifecycle(&self) -> LifecycleState {
        LifecycleState::classify(&self.status)
    }
}

/// Coarse classification of a container's runtime status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Up,
    Exited,
    Errored,
    Unknown,
}

impl LifecycleState {
    /// The daemon reports free-form status strings ("Up 2 hours",
    /// "Exited (0) 1 day ago", "Error"), so classification is by substring.
    /// Anything unrecognised is `Unknown`: excluded from resource sampling
    /// and left without a status sample.
    #[must_use]
    pub fn classify(status: &str) -> Self {
        if status.contains("Up") {
            Self::Up
        } else if status.contains("Exited") {
            Self::Exited
        } else if status.contains("Error") {
            Self::Errored
        } else {
            Self::Unknown
        }
    }

    /// Value for the status gauge; `None` keeps the series absent.
    #[must_use]
    pub const fn gauge_value(self) -> Option<i64> {
        match self {
            Self::Up => Some(1),
            Self::Exited => Some(0),
            Self::Errored => Some(-1),
            Self::Unknown => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_running() {
        assert_eq!(LifecycleState::classify("Up 2 hours"), LifecycleState::Up);
        assert_eq!(
            LifecycleState::classify("Up 3 seconds (health: starting)"),
            LifecycleState::Up
        );
    }

    #[test]
    fn test_classify_exited() {
        assert_eq!(
            LifecycleState::classify("Exited (0) 1 day ago"),
            LifecycleState::Exited
        );
        assert_eq!(
            LifecycleState::classify("Exited (137) 2 minutes ago"),
            LifecycleState::Exited
        );
    }

    #[test]
    fn test_classify_errored() {
        assert_eq!(LifecycleState::classify("Error"), LifecycleState::Errored);
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(LifecycleState::classify("Created"), LifecycleState::Unknown);
        assert_eq!(
            LifecycleState::classify("Restarting (1) 5 seconds ago"),
            LifecycleState::Unknown
        );
        assert_eq!(LifecycleState::classify(""), LifecycleState::Unknown);
    }

    #[test]
    fn test_gauge_values() {
        assert_eq!(LifecycleState::Up.gauge_value(), Some(1));
        assert_eq!(LifecycleState::Exited.gauge_value(), Some(0));
        assert_eq!(LifecycleState::Errored.gauge_value(), Some(-1));
        assert_eq!(LifecycleState::Unknown.gauge_value(), None);
    }

    #[test]
    fn test_canonical_name_strips_leading_slash() {
        let container = ContainerRef {
            id: "abc".to_string(),
            names: vec!["/web-1".to_string(), "/compose_web-1".to_string()],
            image: "nginx:latest".to_string(),
            image_id: "sha256:deadbeef".to_string(),
            status: "Up 2 hours".to_string(),
            labels: HashMap::new(),
        };

        assert_eq!(container.canonical_name(), "web-1");
    }

    #[test]
    fn test_canonical_name_empty_when_unnamed() {
        let container = ContainerRef {
            id: "abc".to_string(),
            names: Vec::new(),
            image: String::new(),
            image_id: String::new(),
            status: String::new(),
            labels: HashMap::new(),
        };

        assert_eq!(container.canonical_name(), "");
    }

    #[test]
    fn test_from_summary_defaults_missing_fields() {
        let container = ContainerRef::from_summary(ContainerSummary::default());

        assert_eq!(container.id, "");
        assert!(container.names.is_empty());
        assert_eq!(container.lifecycle(), LifecycleState::Unknown);
    }
}
