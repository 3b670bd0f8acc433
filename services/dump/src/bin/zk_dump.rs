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

    let matches = cli::with_zk_args(cli::base_command(
        "zk-dump",
        "Dump client-protocol traffic of a ZooKeeper server",
        Some("The server's client port (default 2181)"),
    ))
    .get_matches();

    let options = match cli::options_from_matches(Tool::Zk, &matches) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("zk-dump: {e}");
            std::process::exit(2);
        }
    };

    info!(version = env!("CARGO_PKG_VERSION"), "zk-dump starting");
    std::process::exit(dump::run(Tool::Zk, options).await);
}
