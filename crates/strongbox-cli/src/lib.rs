//! Strongbox command-line interface.

pub mod commands;
pub mod render;

use clap::{Parser, Subcommand, ValueEnum};
use strongbox_core::env::vars;

/// Strongbox - per-user encrypted secret storage
#[derive(Parser)]
#[command(name = "strongbox")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase logging verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Path to the client config file
    #[arg(short, long, global = true, env = vars::CONFIG)]
    pub config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Log line format on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the secret server
    Server(commands::server::ServerArgs),

    /// Create the local cache and client config
    Init(commands::init::InitArgs),

    /// Log in (or register) and store the session token
    Login(commands::login::LoginArgs),

    /// Manage secrets
    Secret(commands::secret::SecretArgs),

    /// Show version information
    Version,
}

/// Run the CLI with the given arguments.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = commands::Context::new(cli.config);

    match cli.command {
        Commands::Server(args) => commands::server::run(args).await,
        Commands::Init(args) => commands::init::run(&ctx, args).await,
        Commands::Login(args) => commands::login::run(&ctx, args).await,
        Commands::Secret(args) => commands::secret::run(&ctx, args).await,
        Commands::Version => {
            println!("strongbox {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
