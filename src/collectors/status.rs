use super::cycle::Cycle;
use super::projector::{BASE_LABELS, NAMESPACE};
use super::{CollectSummary, Collector, CollectorSettings};
use anyhow::Result;
use prometheus::{IntGaugeVec, Opts, Registry};
use tracing::debug;

/// Lifecycle gauge per container: 1 running, 0 exited, -1 errored.
///
/// Carries only the identity labels; containers whose status cannot be
/// classified get no sample at all rather than a guessed one.
#[derive(Clone)]
pub struct StatusCollector {
    container_up: IntGaugeVec,
}

impl StatusCollector {
    /// # Panics
    ///
    /// Panics if metric creation fails (should never happen with valid metric names)
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new(_settings: &CollectorSettings) -> Self {
        let container_up = IntGaugeVec::new(
            Opts::new(
                "container_up",
                "Container lifecycle state (1=up, 0=exited, -1=errored)",
            )
            .namespace(NAMESPACE),
            &BASE_LABELS,
        )
        .expect("valid metric name and labels");

        Self { container_up }
    }
}

impl Collector for StatusCollector {
    fn name(&self) -> &'static str {
        "status"
    }

    fn register_metrics(&self, registry: &Registry) -> Result<()> {
        registry.register(Box::new(self.container_up.clone()))?;
        Ok(())
    }

    async fn collect(&self, cycle: &Cycle) -> Result<CollectSummary> {
        self.container_up.reset();

        for container in cycle.containers() {
            match container.lifecycle().gauge_value() {
                Some(value) => {
                    self.container_up
                        .with_label_values(&[
                            container.id.as_str(),
                            container.canonical_name(),
                            container.image.as_str(),
                            container.image_id.as_str(),
                        ])
                        .set(value);
                }
                None => {
                    debug!(
                        id = %container.id,
                        status = %container.status,
                        "container status not classifiable, skipping sample"
                    );
                }
            }
        }

        Ok(CollectSummary::default())
    }

    fn enabled_by_default(&self) -> bool {
        true
    }
}
