//! Init command.

use super::Context;
use clap::Args;
use console::style;
use strongbox_client::SecretCache;
use strongbox_core::env::vars;

/// Init command arguments.
#[derive(Args)]
pub struct InitArgs {
    /// Server URL to store in the client config
    #[arg(long, env = vars::SERVER)]
    pub server: Option<String>,

    /// Drop all cached secrets
    #[arg(long)]
    pub force: bool,
}

/// Create the client config and the local cache.
pub async fn run(ctx: &Context, args: InitArgs) -> anyhow::Result<()> {
    let mut config = ctx.load_config()?;
    if let Some(server) = args.server {
        config.server = server;
    }
    let config_path = ctx.save_config(&config)?;

    let cache_path = config.cache_path()?;
    let cache = SecretCache::init(&cache_path).await?;
    if args.force {
        let dropped = cache.clear().await?;
        println!("Dropped {} cached secret(s).", dropped);
    }

    println!("{} Config: {}", style("*").green(), config_path.display());
    println!("{} Cache:  {}", style("*").green(), cache_path.display());
    println!("Server: {}", config.server);
    Ok(())
}
