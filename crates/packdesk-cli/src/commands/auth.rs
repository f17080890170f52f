use std::io::{self, Write};

use anyhow::{bail, Result};
use tracing::{info, warn};

use packdesk_core::auth::{CredentialStore, SessionData};
use packdesk_core::config::Config;

use super::Context;

pub fn login(ctx: &mut Context, username: Option<String>, avatar: Option<String>) -> Result<()> {
    let username = match username.or_else(|| ctx.config.last_username.clone()) {
        Some(name) => name,
        None => prompt_username()?,
    };
    if username.is_empty() {
        bail!("Username required");
    }

    let token = rpassword::prompt_password("API token: ")?;
    if token.trim().is_empty() {
        bail!("API token required");
    }
    CredentialStore::store_token(&username, token.trim())?;

    ctx.session.update(SessionData::new(username.clone(), avatar));
    ctx.session.save()?;

    ctx.config.last_username = Some(username.clone());
    if let Err(e) = Config::save_last_username(&username) {
        warn!(error = %e, "Failed to save config");
    }

    info!(user = %username, "Signed in");
    println!("Signed in as {}", username);
    Ok(())
}

pub fn logout(ctx: &mut Context) -> Result<()> {
    let Some(username) = ctx.session.username().map(str::to_string) else {
        println!("Not signed in");
        return Ok(());
    };

    if let Err(e) = CredentialStore::delete(&username) {
        warn!(error = %e, "Failed to delete stored token");
    }
    ctx.session.clear()?;

    info!(user = %username, "Signed out");
    println!("Signed out {}", username);
    Ok(())
}

fn prompt_username() -> Result<String> {
    print!("Username: ");
    io::stdout().flush()?;

    let mut username = String::new();
    io::stdin().read_line(&mut username)?;
    Ok(username.trim().to_string())
}
