use crate::cli::actions::Action;
use crate::collectors::{CollectorSettings, config::CollectorConfig};
use crate::exporter::new;
use anyhow::Result;

/// Handle the run action
///
/// # Errors
///
/// Returns an error if the exporter fails to start
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Run {
            port,
            listen,
            telemetry_path,
            docker_socket,
            container_labels,
            collectors,
        } => {
            let config = CollectorConfig::new()
                .with_enabled(&collectors)
                .with_settings(CollectorSettings { container_labels });

            new(port, listen, telemetry_path, docker_socket, config).await?;
        }
    }

    Ok(())
}
