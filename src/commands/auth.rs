//! Account commands: login, register, logout, status

use colored::Colorize;

use super::prompt::value_or_prompt;
use super::Context;
use crate::error::{Result, SecurepassError};

const MIN_USERNAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 8;

fn invalid(message: &str) -> anyhow::Error {
    SecurepassError::Validation {
        status: 400,
        message: message.to_string(),
    }
    .into()
}

/// Checks registration input before anything is sent.
pub fn validate_registration(username: &str, password: &str, confirmation: &str) -> Result<()> {
    if username.is_empty() || password.is_empty() {
        return Err(invalid("Please enter both username and password."));
    }
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(invalid("Username must be at least 3 characters long."));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(invalid("Password must be at least 8 characters long."));
    }
    if password != confirmation {
        return Err(invalid("Passwords do not match."));
    }
    Ok(())
}

/// Replaces an unhelpful server message with a generic one.
fn auth_failure(error: anyhow::Error, fallback: &str) -> anyhow::Error {
    let unhelpful = match error.downcast_ref::<SecurepassError>() {
        Some(SecurepassError::Validation { status, message })
        | Some(SecurepassError::AmbiguousAuth { status, message }) => {
            let reason = reqwest::StatusCode::from_u16(*status)
                .ok()
                .and_then(|s| s.canonical_reason());
            (message.is_empty() || reason == Some(message.as_str())).then_some(*status)
        }
        _ => None,
    };
    match unhelpful {
        Some(status) => SecurepassError::Validation {
            status,
            message: fallback.to_string(),
        }
        .into(),
        None => error,
    }
}

/// Signs in, prompting for anything not given.
pub async fn login(ctx: &mut Context, username: Option<String>, password: Option<String>) -> Result<()> {
    let username = value_or_prompt(username, "Username: ").await?;
    let password = value_or_prompt(password, "Password: ").await?;
    if username.is_empty() || password.is_empty() {
        return Err(invalid("Please enter both username and password."));
    }

    let display_name = ctx
        .vault
        .client()
        .login(&username, &password)
        .await
        .map_err(|e| auth_failure(e, "Login failed. Please check your credentials."))?;
    ctx.toasts.success(format!("Welcome back, {}!", display_name));
    Ok(())
}

/// Creates an account. Passwords given on the command line skip the
/// confirmation prompt.
pub async fn register(
    ctx: &mut Context,
    username: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let username = value_or_prompt(username, "Username: ").await?;
    let (password, confirmation) = match password {
        Some(p) => (p.clone(), p),
        None => {
            let p = value_or_prompt(None, "Password: ").await?;
            let c = value_or_prompt(None, "Confirm password: ").await?;
            (p, c)
        }
    };
    validate_registration(&username, &password, &confirmation)?;

    let display_name = ctx
        .vault
        .client()
        .register(&username, &password)
        .await
        .map_err(|e| auth_failure(e, "Registration failed. Please try again."))?;
    ctx.toasts.success(format!("Account created. Welcome, {}!", display_name));
    Ok(())
}

pub fn logout(ctx: &mut Context) {
    ctx.vault.client().logout();
    ctx.toasts.info("Signed out");
}

pub fn status(ctx: &Context) {
    match ctx.session.current_session() {
        Some(session) => {
            let local = session.expires_at.with_timezone(&chrono::Local);
            println!(
                "Signed in as {} (session valid until {})",
                session.display_name.green().bold(),
                local.format("%Y-%m-%d %H:%M")
            );
        }
        None => println!("{}", "Not signed in.".yellow()),
    }
    println!("Server: {}", ctx.config.api.base_url.cyan());
}
