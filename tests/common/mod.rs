#![allow(dead_code)]

use docker_exporter::collectors::config::CollectorConfig;
use tempfile::TempDir;
use tokio::task::JoinHandle;

/// Socket path inside a fresh temp dir; nothing listens there, so the
/// exporter under test always sees the daemon as down.
pub fn dead_docker_socket() -> (TempDir, String) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir
        .path()
        .join("docker.sock")
        .to_string_lossy()
        .into_owned();
    (dir, path)
}

/// Config with every collector enabled
pub fn full_config() -> CollectorConfig {
    CollectorConfig::new().with_enabled(&["status".to_string(), "stats".to_string()])
}

/// Spawn the exporter against a dead docker socket
///
/// Returns the temp dir guard (keeps the socket path valid) and the server
/// task handle; abort the handle when done.
pub fn spawn_exporter(port: u16, telemetry_path: &str) -> (TempDir, JoinHandle<anyhow::Result<()>>) {
    let (dir, socket) = dead_docker_socket();
    let path = telemetry_path.to_string();

    let handle = tokio::spawn(async move {
        docker_exporter::exporter::new(port, None, path, socket, full_config()).await
    });

    (dir, handle)
}

/// Find an available port for testing (returns port > 1024)
pub fn get_available_port() -> u16 {
    use std::net::TcpListener;

    // Bind to port 0 lets the OS assign an available ephemeral port
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind to random port");
    let port = listener
        .local_addr()
        .expect("Failed to get local addr")
        .port();

    // Ephemeral ports are typically > 1024, usually 32768-60999 on Linux
    assert!(port > 1024, "Assigned port {} should be > 1024", port);

    port
}

/// Wait for server to be ready on the given port
///
/// # Arguments
/// * `port` - The port number to connect to (should be > 1024)
/// * `max_attempts` - Maximum number of connection attempts (e.g., 50 = 5 seconds at 100ms intervals)
pub async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    use tokio::time::{Duration, sleep};

    for attempt in 1..=max_attempts {
        // Use localhost which will try both IPv4 and IPv6
        if tokio::net::TcpStream::connect(format!("localhost:{}", port))
            .await
            .is_ok()
        {
            return true;
        }

        if attempt % 10 == 0 {
            eprintln!(
                "Still waiting for server on port {} (attempt {}/{})",
                port, attempt, max_attempts
            );
        }

        sleep(Duration::from_millis(100)).await;
    }

    eprintln!(
        "Failed to connect to server on port {} after {} attempts",
        port, max_attempts
    );
    false
}

/// Get base URL for test server
pub fn get_test_url(port: u16) -> String {
    format!("http://localhost:{}", port)
}
