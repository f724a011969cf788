use crate::{
    cli::actions::Action,
    collectors::{COLLECTOR_NAMES, Collector, CollectorSettings, all_factories},
};
use anyhow::{Result, anyhow};
use clap::ArgMatches;

/// Map parsed CLI matches to the action to run.
///
/// # Errors
///
/// Returns an error when a required argument is missing.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    // Get the port or return an error
    let port = matches
        .get_one::<u16>("port")
        .copied()
        .ok_or_else(|| anyhow!("Port is required. Please provide it using the --port flag."))?;

    // Get the listen address (None means auto-detect)
    let listen = matches.get_one::<String>("listen").map(ToString::to_string);

    let telemetry_path = matches
        .get_one::<String>("telemetry-path")
        .map(ToString::to_string)
        .ok_or_else(|| {
            anyhow!("Telemetry path is required. Please provide it using the --telemetry-path flag.")
        })?;

    let docker_socket = matches
        .get_one::<String>("docker-socket")
        .map(ToString::to_string)
        .ok_or_else(|| {
            anyhow!("Docker socket is required. Please provide it using the --docker-socket flag.")
        })?;

    Ok(Action::Run {
        port,
        listen,
        telemetry_path,
        docker_socket,
        container_labels: get_container_labels(matches),
        collectors: get_enabled_collectors(matches),
    })
}

fn get_container_labels(matches: &ArgMatches) -> Vec<String> {
    matches
        .get_many::<String>("container-label")
        .map(|vals| {
            vals.map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

#[must_use]
pub fn get_enabled_collectors(matches: &ArgMatches) -> Vec<String> {
    let factories = all_factories();
    let settings = CollectorSettings::default();

    COLLECTOR_NAMES
        .iter()
        .filter(|&name| {
            let enable_flag = format!("collector.{name}");
            let disable_flag = format!("no-collector.{name}");

            // If explicitly disabled, skip it
            if matches.get_flag(&disable_flag) {
                return false;
            }

            // If explicitly enabled, include it
            if matches.get_flag(&enable_flag) {
                return true;
            }

            // Otherwise, check the collector's default setting
            if let Some(factory) = factories.get(name) {
                let collector = factory(&settings);
                collector.enabled_by_default()
            } else {
                false // Fallback if collector not found
            }
        })
        .map(|&name| name.to_string())
        .collect()
}
