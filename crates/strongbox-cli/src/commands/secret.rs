//! Secret management commands.
//!
//! `strongbox secret add|get|list|delete|sync` against the server, with
//! `get` and `list` served from the local cache when the server is down.

use super::{prompt_secret, Context};
use crate::render;
use anyhow::Context as _;
use clap::{ArgGroup, Args};
use std::io::Write;
use std::path::{Path, PathBuf};
use strongbox_client::{OfflineFallback, SecretCache, Source, Synchronizer};
use strongbox_core::env::vars;
use strongbox_core::{Card, ClientConfig, Secret, SecretKind, SecretString};

/// Secret command arguments.
#[derive(Args)]
pub struct SecretArgs {
    /// Passphrase for the secret envelope; prompted for when needed
    #[arg(short, long, env = vars::SECRET_KEY, hide_env_values = true)]
    pub key: Option<String>,

    #[command(subcommand)]
    pub command: SecretCommand,
}

#[derive(clap::Subcommand)]
pub enum SecretCommand {
    /// Store a secret, or replace it with --update
    Add(AddArgs),

    /// Fetch and print a secret
    Get {
        /// Secret name
        name: String,

        /// Write the payload to a file instead (text and binary only)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// List secret names, types and versions
    List,

    /// Delete a secret
    Delete {
        /// Secret name
        name: String,
    },

    /// Bring the local cache in line with the server
    Sync,
}

/// Arguments for `secret add`.
#[derive(Args)]
#[command(group(ArgGroup::new("payload").args(["data", "file"])))]
pub struct AddArgs {
    /// Secret name
    #[arg(short, long)]
    pub name: String,

    /// Secret type (text, binary, card, file)
    #[arg(short = 't', long = "type", default_value = "text", value_parser = parse_kind)]
    pub kind: SecretKind,

    /// Free-form description
    #[arg(short, long, default_value = "")]
    pub meta: String,

    /// Payload given inline
    #[arg(short, long)]
    pub data: Option<String>,

    /// Payload read from a file
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Replace an existing secret instead of adding
    #[arg(short, long)]
    pub update: bool,

    /// Card number (type card)
    #[arg(long)]
    pub card_number: Option<String>,

    /// Card holder (type card)
    #[arg(long)]
    pub card_holder: Option<String>,

    /// Card expiry as MM/YY (type card)
    #[arg(long)]
    pub card_expires: Option<String>,

    /// Card verification code (type card)
    #[arg(long)]
    pub card_cvc: Option<String>,
}

impl AddArgs {
    fn has_card_fields(&self) -> bool {
        self.card_number.is_some()
            || self.card_holder.is_some()
            || self.card_expires.is_some()
            || self.card_cvc.is_some()
    }
}

fn parse_kind(s: &str) -> Result<SecretKind, String> {
    s.parse()
}

/// Run the secret command.
pub async fn run(ctx: &Context, args: SecretArgs) -> anyhow::Result<()> {
    let config = ctx.load_config()?;
    let client = ctx.authed_client(&config)?;

    match args.command {
        SecretCommand::Add(add) => {
            let secret = build_secret(&add)?;
            let key = require_key(args.key, &config)?;
            let client = client.with_secret_key(key);

            if add.update {
                let version = client.update(&secret).await?;
                println!("Secret '{}' updated to version {}.", secret.name, version);
            } else {
                client.add(&secret).await?;
                println!("Secret '{}' stored.", secret.name);
            }
        }

        SecretCommand::Get { name, out } => {
            let key = require_key(args.key, &config)?;
            let client = client.with_secret_key(key);

            let fetched = OfflineFallback::new(config.cache_path()?)
                .get(&client, &name)
                .await?;
            if fetched.source == Source::Cache {
                render::cache_notice();
            }

            match out {
                Some(path) => {
                    export(&fetched.value, &path)?;
                    println!("Secret '{}' written to {}", name, path.display());
                }
                None => render::print_secret(&fetched.value),
            }
        }

        SecretCommand::List => {
            let fetched = OfflineFallback::new(config.cache_path()?)
                .list(&client)
                .await?;
            if fetched.source == Source::Cache {
                render::cache_notice();
            }
            render::print_items(&fetched.value);
        }

        SecretCommand::Delete { name } => {
            client.delete(&name).await?;
            println!("Secret '{}' deleted.", name);
        }

        SecretCommand::Sync => {
            let key = require_key(args.key, &config)?;
            let client = client.with_secret_key(key);
            let cache = SecretCache::open(&config.cache_path()?).await?;

            match Synchronizer::new(&client, &cache).run().await {
                Ok(report) => render::print_report(&report),
                Err(e) => {
                    render::print_report(&e.report);
                    return Err(e.into());
                }
            }
        }
    }

    Ok(())
}

/// Passphrase from the flag, then the config, then a prompt.
fn require_key(flag: Option<String>, config: &ClientConfig) -> anyhow::Result<SecretString> {
    if let Some(key) = flag.filter(|k| !k.is_empty()) {
        return Ok(key.into());
    }
    if let Some(key) = config.secret_key.as_ref().filter(|k| !k.is_empty()) {
        return Ok(key.clone());
    }
    prompt_secret("Secret key: ")
}

/// Assemble the secret to send from `add` arguments.
fn build_secret(args: &AddArgs) -> anyhow::Result<Secret> {
    if args.name.is_empty() {
        anyhow::bail!("Secret name must not be empty");
    }

    let mut meta = args.meta.clone();
    let data = if args.kind == SecretKind::Card {
        card_payload(args)?
    } else if args.has_card_fields() {
        anyhow::bail!("Card fields require --type card");
    } else if let Some(data) = &args.data {
        data.clone().into_bytes()
    } else if let Some(path) = &args.file {
        if meta.is_empty() {
            if let Some(file_name) = path.file_name() {
                meta = file_name.to_string_lossy().into_owned();
            }
        }
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?
    } else if args.kind == SecretKind::Text {
        let value = prompt_secret(&format!("Value for '{}': ", args.name))?;
        value.as_bytes().to_vec()
    } else {
        anyhow::bail!("Provide the payload with --data or --file");
    };

    Ok(Secret::new(args.name.clone(), args.kind, data).with_meta(meta))
}

fn card_payload(args: &AddArgs) -> anyhow::Result<Vec<u8>> {
    if args.data.is_some() || args.file.is_some() {
        anyhow::bail!("Card secrets take --card-* fields, not --data or --file");
    }

    let field = |value: &Option<String>, flag: &str| {
        value
            .clone()
            .ok_or_else(|| anyhow::anyhow!("Missing --{} for card secret", flag))
    };
    let number = field(&args.card_number, "card-number")?;
    let card = Card::new(
        &number,
        field(&args.card_holder, "card-holder")?,
        field(&args.card_expires, "card-expires")?,
        field(&args.card_cvc, "card-cvc")?,
    )?;
    Ok(card.to_bytes()?)
}

/// Write a text or binary payload to `path`, readable by the owner only.
fn export(secret: &Secret, path: &Path) -> anyhow::Result<()> {
    if !secret.kind.is_exportable() {
        anyhow::bail!(
            "Secrets of type '{}' cannot be exported to a file",
            secret.kind
        );
    }

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    file.write_all(&secret.data)?;

    // mode() only applies to newly created files
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}
