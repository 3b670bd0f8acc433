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

    let matches = cli::base_command(
        "fle-dump",
        "Dump leader-election traffic between ensemble members",
        Some("The election port (default 3888)"),
    )
    .get_matches();

    let options = match cli::options_from_matches(Tool::Fle, &matches) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("fle-dump: {e}");
            std::process::exit(2);
        }
    };

    info!(version = env!("CARGO_PKG_VERSION"), "fle-dump starting");
    std::process::exit(dump::run(Tool::Fle, options).await);
}
