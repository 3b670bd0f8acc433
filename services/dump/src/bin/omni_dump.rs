use dump::{Tool, cli};
use tracing::info;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // No port flag: omni discovers the topology from election traffic.
    let matches = cli::with_zk_args(cli::base_command(
        "omni-dump",
        "Dump all three ensemble protocols, discovering the topology from election traffic",
        None,
    ))
    .get_matches();

    let options = match cli::options_from_matches(Tool::Omni, &matches) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("omni-dump: {e}");
            std::process::exit(2);
        }
    };

    info!(version = env!("CARGO_PKG_VERSION"), "omni-dump starting");
    std::process::exit(dump::run(Tool::Omni, options).await);
}
