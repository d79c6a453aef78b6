//! Login command.

use super::{prompt_secret, Context};
use clap::Args;
use strongbox_client::RpcClient;
use strongbox_core::env::vars;
use tracing::info;

/// Login command arguments.
#[derive(Args)]
pub struct LoginArgs {
    /// Login name
    #[arg(short, long)]
    pub user: String,

    /// Create the account instead of logging in
    #[arg(long)]
    pub register: bool,

    /// Server URL; saved for later commands
    #[arg(long, env = vars::SERVER)]
    pub server: Option<String>,
}

/// Prompt for the password, obtain a session token and save it.
pub async fn run(ctx: &Context, args: LoginArgs) -> anyhow::Result<()> {
    if args.user.is_empty() {
        anyhow::bail!("Login name must not be empty");
    }

    let mut config = ctx.load_config()?;
    if let Some(server) = args.server {
        config.server = server;
    }

    let password = prompt_secret(&format!("Password for '{}': ", args.user))?;
    if args.register {
        let confirm = prompt_secret("Repeat password: ")?;
        if confirm != password {
            anyhow::bail!("Passwords do not match");
        }
    }

    let client = RpcClient::new(&config.server, config.timeout())?;
    let token = if args.register {
        client.register(&args.user, password).await?
    } else {
        client.login(&args.user, password).await?
    };

    config.token = Some(token);
    let path = ctx.save_config(&config)?;
    info!(user = %args.user, server = %config.server, "Session token saved");

    if args.register {
        println!("Registered and logged in as '{}'.", args.user);
    } else {
        println!("Logged in as '{}'.", args.user);
    }
    println!("Token saved to {}", path.display());
    Ok(())
}
