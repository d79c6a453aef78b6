//! Terminal rendering for command output.

use console::style;
use strongbox_client::SyncReport;
use strongbox_core::{Card, Secret, SecretItem, SecretKind};

/// Warn that data came from the local cache.
pub fn cache_notice() {
    eprintln!(
        "{} Server unavailable, showing local cache (may be stale)",
        style("!").yellow().bold()
    );
}

/// Print a listing as a table.
pub fn print_items(items: &[SecretItem]) {
    if items.is_empty() {
        println!("No secrets stored.");
        return;
    }

    println!("{:<32} {:<8} {}", "NAME", "TYPE", "VERSION");
    println!("{}", "-".repeat(50));
    for item in items {
        println!("{:<32} {:<8} {}", item.name, item.kind, item.version);
    }
    println!("\n{} secret(s) total.", items.len());
}

/// Print one secret. Binary payloads are summarised, cards masked.
pub fn print_secret(secret: &Secret) {
    eprintln!(
        "{} {} (v{})",
        style(&secret.name).bold(),
        style(secret.kind).dim(),
        secret.version
    );
    if !secret.meta.is_empty() {
        eprintln!("{}", style(&secret.meta).dim());
    }

    match secret.kind {
        SecretKind::Text => println!("{}", String::from_utf8_lossy(&secret.data)),
        SecretKind::Card => match Card::from_bytes(&secret.data) {
            Ok(card) => {
                println!("Number:  {}", card.masked_number());
                println!("Holder:  {}", card.holder);
                println!("Expires: {}", card.expires);
            }
            Err(_) => println!("<{} bytes, not a valid card record>", secret.data.len()),
        },
        SecretKind::Binary | SecretKind::File | SecretKind::Unknown => {
            println!("<{} bytes>", secret.data.len());
        }
    }
}

/// Print a sync report line by line.
pub fn print_report(report: &SyncReport) {
    for name in &report.added {
        println!("  {} {}", style("+").green(), name);
    }
    for name in &report.updated {
        println!("  {} {}", style("~").yellow(), name);
    }
    for name in &report.removed {
        println!("  {} {}", style("-").red(), name);
    }
    println!("{}", report);
}
