//! Prometheus exporter for Docker container metrics.
//!
//! Each scrape runs one cycle: enumerate the containers on the local daemon,
//! fan out concurrent stats fetches for the running ones, fan the results in
//! under a deadline, and project them into a labeled metric space.

pub mod cli;
pub mod collectors;
pub mod docker;
pub mod exporter;
