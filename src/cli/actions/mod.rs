pub mod run;

#[derive(Debug)]
pub enum Action {
    Run {
        port: u16,
        listen: Option<String>,
        telemetry_path: String,
        docker_socket: String,
        container_labels: Vec<String>,
        collectors: Vec<String>,
    },
}
