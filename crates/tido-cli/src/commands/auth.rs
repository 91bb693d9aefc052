//! Auth commands: signup, login, logout

use anyhow::Result;
use tido_core::{Auth, OwnerId};

use crate::output::{Output, OutputFormat};

/// Create a new owner identity on this device
pub fn signup(output: &Output) -> Result<()> {
    let auth = Auth::new()?;
    let session = auth.sign_up()?;

    match output.format {
        OutputFormat::Human => {
            println!("Signed up. Owner key: {}", session.owner());
            println!();
            println!("Use this key to sign in on another device:");
            println!("  tido login {}", session.owner());
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({ "owner": session.owner().as_str() })
            );
        }
        OutputFormat::Quiet => println!("{}", session.owner()),
    }
    Ok(())
}

/// Sign in with stored credentials, or adopt an owner key from another device
pub fn login(owner: Option<String>, output: &Output) -> Result<()> {
    let auth = Auth::new()?;
    let session = match owner {
        Some(key) => auth.sign_in_as(OwnerId::from(key))?,
        None => auth.sign_in()?,
    };
    output.success(&format!("Signed in as {}", session.owner()));
    Ok(())
}

/// Remove stored credentials
pub fn logout(output: &Output) -> Result<()> {
    let auth = Auth::new()?;
    auth.sign_out()?;
    output.success("Signed out");
    Ok(())
}
