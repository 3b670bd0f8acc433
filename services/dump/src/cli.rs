//! Argument parsing shared by the dump binaries.

use crate::{DumpOptions, SourceSpec, Tool};
use clap::{Arg, ArgAction, Command};
use sniffer_core::SnifferConfig;
use std::path::PathBuf;
use std::time::Duration;

fn validate_port(value: &str) -> Result<u16, String> {
    value
        .parse::<u16>()
        .map_err(|_| "Invalid port number".to_owned())
}

fn validate_sampling(value: &str) -> Result<f64, String> {
    let sampling = value
        .parse::<f64>()
        .map_err(|_| "Invalid sampling fraction".to_owned())?;
    if (0.0..=1.0).contains(&sampling) {
        Ok(sampling)
    } else {
        Err("Sampling must be within [0, 1]".to_owned())
    }
}

fn validate_existing_file(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if path.is_file() {
        Ok(path)
    } else {
        Err(format!("No such capture file: {value}"))
    }
}

/// Build the command line shared by every dump tool. `port_help` is `None`
/// for omni-dump, which discovers ports instead of being told.
pub fn base_command(name: &'static str, about: &'static str, port_help: Option<&'static str>) -> Command {
    let mut command = Command::new(name)
        .version(env!("CARGO_PKG_VERSION"))
        .about(about)
        .arg(
            Arg::new("file")
                .help("Replay a pcap-ng capture file instead of sniffing live")
                .short('f')
                .long("file")
                .value_parser(validate_existing_file)
                .conflicts_with("iface"),
        )
        .arg(
            Arg::new("iface")
                .help("The interface to sniff on (needs the live feature and privileges)")
                .short('i')
                .long("iface"),
        )
        .arg(
            Arg::new("sampling")
                .help("Fraction of frames to decode; below 1.0 latency pairing degrades")
                .long("sampling")
                .value_parser(validate_sampling)
                .default_value("1.0"),
        )
        .arg(
            Arg::new("queue_cap")
                .help("Bounded queue size; the oldest event is dropped on overflow")
                .long("queue-cap")
                .value_parser(clap::value_parser!(usize))
                .default_value("10000"),
        )
        .arg(
            Arg::new("read_timeout_ms")
                .help("Read timeout for the live capture handle, in milliseconds")
                .long("read-timeout")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("dump_bad_packets")
                .help("Log frames dropped as uninteresting or malformed")
                .long("dump-bad-packets")
                .action(ArgAction::SetTrue),
        );
    if let Some(help) = port_help {
        command = command.arg(
            Arg::new("port")
                .help(help)
                .short('p')
                .long("port")
                .value_parser(validate_port),
        );
    }
    command
}

/// Extra flags for the tools that watch the client protocol.
pub fn with_zk_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("client_port")
                .help("Only watch traffic from this client port")
                .long("client-port")
                .value_parser(validate_port)
                .default_value("0"),
        )
        .arg(
            Arg::new("latency")
                .help("Pair requests with replies and print latencies")
                .long("latency")
                .action(ArgAction::SetTrue),
        )
}

/// Turn parsed matches into run options for `tool`.
pub fn options_from_matches(tool: Tool, matches: &clap::ArgMatches) -> Result<DumpOptions, String> {
    let mut config = SnifferConfig::default();
    if let Some(&port) = matches.try_get_one::<u16>("port").ok().flatten() {
        match tool {
            Tool::Zk => config.zk_port = port,
            Tool::Zab => config.zab_port = port,
            Tool::Fle => config.fle_port = port,
            Tool::Omni => {}
        }
    }
    if let Some(&client_port) = matches.try_get_one::<u16>("client_port").ok().flatten() {
        config.client_port = client_port;
    }
    config.sampling = *matches
        .get_one::<f64>("sampling")
        .expect("sampling has a default");
    config.queue_cap = *matches
        .get_one::<usize>("queue_cap")
        .expect("queue_cap has a default");
    config.xid_cap = config.queue_cap;
    config.dump_bad_packets = matches.get_flag("dump_bad_packets");
    config.read_timeout = matches
        .get_one::<u64>("read_timeout_ms")
        .map(|&ms| Duration::from_millis(ms));

    let source = if let Some(path) = matches.get_one::<PathBuf>("file") {
        SourceSpec::File(path.clone())
    } else if let Some(iface) = matches.get_one::<String>("iface") {
        SourceSpec::Interface(iface.clone())
    } else {
        return Err("one of --file or --iface is required".to_owned());
    };

    let latency = matches
        .try_get_one::<bool>("latency")
        .ok()
        .flatten()
        .copied()
        .unwrap_or(false);

    Ok(DumpOptions {
        config,
        source,
        latency,
    })
}
