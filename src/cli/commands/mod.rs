use clap::{
    Arg, ArgAction, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

mod collectors;

pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let cmd = Command::new("docker_exporter")
        .about("Docker container metric exporter for Prometheus")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(built_info::GIT_COMMIT_HASH.to_owned())
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8888")
                .env("DOCKER_EXPORTER_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("listen")
                .long("listen")
                .help("Address to bind to (IPv4 or IPv6, default: auto)")
                .env("DOCKER_EXPORTER_LISTEN")
                .value_name("ADDR"),
        )
        .arg(
            Arg::new("telemetry-path")
                .long("telemetry-path")
                .help("HTTP path the metrics are served on")
                .default_value("/metrics")
                .env("DOCKER_EXPORTER_TELEMETRY_PATH")
                .value_name("PATH"),
        )
        .arg(
            Arg::new("docker-socket")
                .long("docker-socket")
                .help("Path to the docker daemon unix socket")
                .default_value("/var/run/docker.sock")
                .env("DOCKER_EXPORTER_SOCKET")
                .value_name("SOCKET"),
        )
        .arg(
            Arg::new("container-label")
                .long("container-label")
                .help("Docker label keys added as labels on per-container metrics")
                .env("DOCKER_EXPORTER_CONTAINER_LABELS")
                .value_name("com.example.team,...")
                .value_delimiter(',') // split CLI and env values by comma
                .action(ArgAction::Append), // allow repeated flags if desired
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase verbosity, -vv for debug")
                .action(ArgAction::Count),
        );

    collectors::add_collectors_args(cmd)
}
