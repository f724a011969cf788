use crate::collectors::CollectorSettings;
use std::collections::HashSet;

#[derive(Clone, Debug, Default)]
pub struct CollectorConfig {
    pub enabled_collectors: HashSet<String>,
    pub settings: CollectorSettings,
}

impl CollectorConfig {
    /// Create an empty config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable collectors by name
    #[must_use]
    pub fn with_enabled(mut self, collectors: &[String]) -> Self {
        self.enabled_collectors = collectors.iter().cloned().collect();
        self
    }

    /// Attach the shared collector settings
    #[must_use]
    pub fn with_settings(mut self, settings: CollectorSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Check if a collector is enabled
    #[must_use]
    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled_collectors.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_enabled() {
        let config = CollectorConfig::new()
            .with_enabled(&["status".to_string(), "stats".to_string()]);

        assert!(config.is_enabled("status"));
        assert!(config.is_enabled("stats"));
        assert!(!config.is_enabled("events"));
    }

    #[test]
    fn test_with_settings() {
        let config = CollectorConfig::new().with_settings(CollectorSettings {
            container_labels: vec!["com.example.team".to_string()],
        });

        assert_eq!(config.settings.container_labels.len(), 1);
    }
}
