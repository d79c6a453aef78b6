//! Strongbox CLI entry point.

use clap::Parser;
use strongbox_cli::{run, Cli, LogFormat};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging on stderr; stdout carries command output
    let default_filter = match cli.verbose {
        0 => "strongbox=info",
        1 => "strongbox=debug,tower_http=debug",
        _ => "strongbox=trace,tower_http=trace,sqlx=debug",
    };
    let json = cli.log_format == LogFormat::Json;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().with_writer(std::io::stderr)))
        .init();

    // Run the command
    run(cli).await
}
