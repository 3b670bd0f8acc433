use clap::{Arg, Command};
use sniffer_core::SnifferConfig;
use stats_daemon::DaemonOptions;
use std::path::PathBuf;
use tracing::info;

fn validate_port(value: &str) -> Result<u16, String> {
    value
        .parse::<u16>()
        .map_err(|_| "Invalid port number".to_owned())
}

fn validate_existing_file(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if path.is_file() {
        Ok(path)
    } else {
        Err(format!("No such capture file: {value}"))
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let matches = Command::new("stats-daemon")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Serve per-path, per-ip and per-auth request statistics over HTTP")
        .arg(
            Arg::new("file")
                .help("The pcap-ng capture file to replay")
                .short('f')
                .long("file")
                .value_parser(validate_existing_file)
                .required(true),
        )
        .arg(
            Arg::new("port")
                .help("The server's client port")
                .short('p')
                .long("port")
                .value_parser(validate_port)
                .default_value("2181"),
        )
        .arg(
            Arg::new("http_bind")
                .help("Address to serve the JSON endpoints on")
                .long("http-bind")
                .default_value("0.0.0.0:7070"),
        )
        .arg(
            Arg::new("queue_cap")
                .help("Bounded queue size; the oldest event is dropped on overflow")
                .long("queue-cap")
                .value_parser(clap::value_parser!(usize))
                .default_value("10000"),
        )
        .get_matches();

    let config = SnifferConfig {
        zk_port: *matches.get_one::<u16>("port").expect("port has a default"),
        queue_cap: *matches
            .get_one::<usize>("queue_cap")
            .expect("queue_cap has a default"),
        ..SnifferConfig::default()
    };

    let options = DaemonOptions {
        config,
        file: matches
            .get_one::<PathBuf>("file")
            .expect("file is required")
            .clone(),
        http_bind: matches
            .get_one::<String>("http_bind")
            .expect("http_bind has a default")
            .clone(),
    };

    info!(version = env!("CARGO_PKG_VERSION"), "stats-daemon starting");
    std::process::exit(stats_daemon::run(options).await);
}
