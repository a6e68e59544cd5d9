//! Dropbox credential commands.

use super::app::{App, block_on};
use crate::cli::AuthCommands;
use crate::clock::format_ms;
use crate::error::{Error, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct AuthStatusOutput {
    configured: bool,
    stored: bool,
    valid: bool,
    token_expiry: Option<i64>,
}

/// Execute auth commands.
pub fn execute(command: &AuthCommands, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let app = App::open(db_path)?;
    match command {
        AuthCommands::Status => status(&app, json),
        AuthCommands::Login {
            refresh_token,
            code,
        } => login(&app, refresh_token.as_deref(), code.as_deref(), json),
        AuthCommands::Url => url(&app, json),
        AuthCommands::Logout => logout(&app, json),
    }
}

fn status(app: &App, json: bool) -> Result<()> {
    let tokens = app.tokens();
    let output = AuthStatusOutput {
        configured: app.config.client_id.is_some(),
        stored: tokens.load()?.is_some(),
        valid: tokens.is_valid_at(app.clock.now()),
        token_expiry: tokens.expiry()?,
    };

    if json {
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    let configured = if output.configured {
        "configured".green()
    } else {
        "not configured (set DROPBOX_CLIENT_ID)".red()
    };
    println!("App key:     {configured}");
    match (output.stored, output.valid, output.token_expiry) {
        (true, true, Some(expiry)) => {
            println!("Credentials: {} until {}", "valid".green(), format_ms(expiry));
        }
        (true, _, expiry) => println!(
            "Credentials: {} (expired {}, refreshed on next sync)",
            "stored".yellow(),
            expiry.map_or_else(|| "unknown".to_string(), format_ms)
        ),
        (false, _, _) => println!("Credentials: {}", "none".dimmed()),
    }
    Ok(())
}

fn login(app: &App, refresh_token: Option<&str>, code: Option<&str>, json: bool) -> Result<()> {
    let auth = app.dropbox_auth()?;
    block_on(async {
        match (code, refresh_token) {
            (Some(code), _) => auth.login_with_code(code).await?,
            (None, Some(token)) => auth.login_with_refresh_token(token).await?,
            (None, None) => {
                return Err(Error::InvalidArgument(
                    "pass a refresh token or --code".to_string(),
                ));
            }
        }
        Ok(())
    })?;

    let expiry = app.tokens().expiry()?;
    if json {
        println!(
            "{}",
            serde_json::json!({ "logged_in": true, "token_expiry": expiry })
        );
    } else {
        println!("{}", "Signed in to Dropbox.".green());
        if let Some(expiry) = expiry {
            println!("  Token valid until {}", format_ms(expiry));
        }
    }
    Ok(())
}

fn url(app: &App, json: bool) -> Result<()> {
    let url = app.dropbox_auth()?.refresher().authorize_url()?;
    if json {
        println!("{}", serde_json::json!({ "url": url }));
    } else {
        println!("Open this URL, approve access, then run:");
        println!("  startsync auth login --code <CODE>");
        println!();
        println!("{url}");
    }
    Ok(())
}

fn logout(app: &App, json: bool) -> Result<()> {
    app.tokens().clear()?;
    if json {
        println!("{}", serde_json::json!({ "logged_in": false }));
    } else {
        println!("Dropbox credentials removed.");
    }
    Ok(())
}
