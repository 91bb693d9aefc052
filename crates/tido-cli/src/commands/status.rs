//! Status command

use anyhow::Result;
use tido_core::{Auth, Config};

use crate::output::Output;

/// Show sync configuration and sign-in state
pub fn show(config: &Config, output: &Output) -> Result<()> {
    let auth = Auth::with_config(config.clone());
    let owner = if auth.is_signed_in() {
        Some(auth.sign_in()?.owner().to_string())
    } else {
        None
    };

    if output.is_json() {
        println!(
            "{}",
            serde_json::json!({
                "sync_enabled": config.sync_enabled,
                "sync_url": config.sync_url,
                "owner": owner,
                "data_dir": config.data_dir,
            })
        );
        return Ok(());
    }

    if output.is_quiet() {
        if let Some(owner) = owner {
            println!("{}", owner);
        }
        return Ok(());
    }

    println!(
        "Sync:      {}",
        if config.sync_enabled { "enabled" } else { "disabled" }
    );
    println!(
        "Server:    {}",
        config.sync_url.as_deref().unwrap_or("(not set)")
    );
    match owner {
        Some(owner) => println!("Signed in: yes ({})", owner),
        None => println!("Signed in: no"),
    }
    println!("Data dir:  {}", config.data_dir.display());
    Ok(())
}
