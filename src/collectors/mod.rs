use anyhow::Result;
use prometheus::Registry;
use std::collections::HashMap;

#[macro_use]
mod register_macro;

use self::cycle::Cycle;

pub trait Collector {
    fn name(&self) -> &'static str;

    fn enabled_by_default(&self) -> bool;

    /// Register this collector's metric families with the registry.
    fn register_metrics(&self, registry: &Registry) -> Result<()>;

    /// Run one collection pass against the given scrape cycle.
    fn collect(
        &self,
        cycle: &Cycle,
    ) -> impl std::future::Future<Output = Result<CollectSummary>> + Send;
}

/// Startup-time knobs shared by all collector factories.
#[derive(Clone, Debug, Default)]
pub struct CollectorSettings {
    /// Docker label keys projected as extra dimensions on per-container
    /// series. Fixed at startup so the label schema stays stable.
    pub container_labels: Vec<String>,
}

/// Outcome of one collection pass.
#[derive(Debug, Default)]
pub struct CollectSummary {
    /// Canonical names of containers whose stats could not be sampled.
    pub failed_containers: Vec<String>,
}

// THIS IS THE ONLY PLACE YOU NEED TO ADD NEW COLLECTORS ✨
register_collectors! {
    status => StatusCollector,
    stats => StatsCollector,
    // Add more collectors here - just follow the same pattern!
}

// Other modules
pub mod config;
pub mod cycle;
pub mod exporter;
pub mod projector;
pub mod registry;
