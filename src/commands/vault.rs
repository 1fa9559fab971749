//! Vault commands: list, add, update, delete, dedupe, refresh

use std::time::Duration;

use colored::Colorize;
use prettytable::{format, Table};

use super::prompt::read_line;
use super::Context;
use crate::api::types::Credential;
use crate::confirm::ConfirmationOptions;
use crate::error::{Result, SecurepassError};
use crate::password::{generate_password, strength_label, StrengthLabel, DEFAULT_LENGTH};
use crate::toast::ToastKind;
use crate::vault::{find_duplicates, CredentialFilter, CredentialForm, VaultStats};

const MASK: &str = "••••••••";

fn strength_cell(password: Option<&str>) -> colored::ColoredString {
    match password.map(strength_label) {
        Some(StrengthLabel::Strong) => "Strong".green(),
        Some(StrengthLabel::Medium) => "Medium".yellow(),
        Some(StrengthLabel::Weak) => "Weak".red(),
        Some(StrengthLabel::Empty) | None => "-".dimmed(),
    }
}

fn print_table(credentials: &[&Credential], show_passwords: bool) {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(prettytable::row![
        "ID".bold(),
        "Site".bold(),
        "Username".bold(),
        "Password".bold(),
        "Strength".bold()
    ]);

    for cred in credentials {
        let password = match cred.password.as_deref() {
            Some(p) if show_passwords => p.to_string(),
            Some(_) => MASK.to_string(),
            None => "-".to_string(),
        };
        table.add_row(prettytable::row![
            cred.id.to_string().cyan(),
            cred.site,
            cred.username,
            password,
            strength_cell(cred.password.as_deref())
        ]);
    }
    table.printstd();
}

fn not_found(id: i64) -> anyhow::Error {
    SecurepassError::Validation {
        status: 404,
        message: format!("Credential {} not found", id),
    }
    .into()
}

async fn find(ctx: &Context, id: i64) -> Result<Credential> {
    ctx.vault
        .load()
        .await?
        .iter()
        .find(|c| c.id == id)
        .cloned()
        .ok_or_else(|| not_found(id))
}

pub async fn list(
    ctx: &mut Context,
    search: Option<String>,
    weak_only: bool,
    show_passwords: bool,
) -> Result<()> {
    ctx.require_session()?;
    let snapshot = ctx.vault.load().await?;
    let filter = CredentialFilter {
        query: search,
        weak_only,
    };
    let shown = filter.apply(&snapshot);
    let stats = VaultStats::of(&snapshot);

    println!(
        "\n{} credentials, {} strong, {} weak",
        stats.total.to_string().bold(),
        stats.strong.to_string().green(),
        stats.weak.to_string().red()
    );
    if shown.is_empty() {
        println!("{}", "No credentials to show.".yellow());
        return Ok(());
    }
    print_table(&shown, show_passwords);
    println!();
    Ok(())
}

pub async fn refresh(ctx: &mut Context) -> Result<()> {
    ctx.require_session()?;
    let snapshot = ctx.vault.load().await?;
    ctx.toasts.show(
        "Credentials refreshed",
        ToastKind::Success,
        Some(Duration::from_millis(2000)),
    );
    println!("{} credentials", snapshot.len());
    Ok(())
}

/// Picks the password for add/update: explicit, generated, or prompted.
async fn choose_password(password: Option<String>, generate: bool, prompt: &str) -> Result<(String, String)> {
    if generate {
        let generated = generate_password(DEFAULT_LENGTH);
        println!("Generated password: {}", generated.green());
        return Ok((String::new(), generated));
    }
    match password {
        Some(p) => Ok((p, String::new())),
        None => Ok((read_line(prompt).await?, String::new())),
    }
}

pub async fn add(
    ctx: &mut Context,
    site: String,
    username: String,
    password: Option<String>,
    generate: bool,
) -> Result<()> {
    ctx.require_session()?;
    let (password, generated) = choose_password(password, generate, "Password: ").await?;

    let form = CredentialForm::new();
    form.open(None);
    let submission = form.submission(&site, &username, &password, &generated)?;

    match ctx.vault.submit(&submission).await {
        Ok(_) => {
            ctx.toasts
                .success(format!("Credential \"{}\" created successfully", site));
            form.close();
            Ok(())
        }
        Err(e) => {
            ctx.toasts.error(format!(
                "Failed to create credential for \"{}\". Please try again.",
                site
            ));
            Err(e)
        }
    }
}

pub async fn update(
    ctx: &mut Context,
    id: i64,
    password: Option<String>,
    generate: bool,
) -> Result<()> {
    ctx.require_session()?;
    let existing = find(ctx, id).await?;
    let site = existing.site.clone();
    let (password, generated) =
        choose_password(password, generate, "New password (empty keeps the current one): ")
            .await?;

    let form = CredentialForm::new();
    form.open(Some(existing));
    let submission = form.submission("", "", &password, &generated)?;

    match ctx.vault.submit(&submission).await {
        Ok(_) => {
            ctx.toasts
                .success(format!("Credential \"{}\" updated successfully", site));
            form.close();
            Ok(())
        }
        Err(e) => {
            ctx.toasts
                .error(format!("Failed to update \"{}\". Please try again.", site));
            Err(e)
        }
    }
}

pub async fn delete(ctx: &mut Context, id: i64) -> Result<()> {
    ctx.require_session()?;
    let cred = find(ctx, id).await?;

    let mut handle = ctx.confirmations.open(
        ConfirmationOptions::new(
            "Delete Credential",
            format!("Delete {}? This cannot be undone.", cred.site),
        )
        .confirm_label("Delete"),
    );
    if handle.confirmed().await.is_err() {
        println!("{}", "Cancelled.".yellow());
        return Ok(());
    }

    handle.set_loading(true);
    let result = ctx.vault.delete(id).await;
    handle.close();

    match result {
        Ok(_) => {
            ctx.toasts
                .success(format!("Credential \"{}\" deleted successfully", cred.site));
            Ok(())
        }
        Err(e) => {
            ctx.toasts.error(format!(
                "Failed to delete \"{}\". Please try again.",
                cred.site
            ));
            Err(e)
        }
    }
}

pub async fn dedupe(ctx: &mut Context) -> Result<()> {
    ctx.require_session()?;
    let snapshot = ctx.vault.load().await?;
    let duplicates = find_duplicates(&snapshot);
    if duplicates.is_empty() {
        ctx.toasts.info("No duplicates found");
        return Ok(());
    }

    println!("\nDuplicates (the first entry of each site and username is kept):");
    print_table(&duplicates, false);

    let mut handle = ctx.confirmations.open(
        ConfirmationOptions::new(
            "Remove Duplicates",
            format!("Delete {} duplicate credentials?", duplicates.len()),
        )
        .confirm_label("Delete"),
    );
    if handle.confirmed().await.is_err() {
        println!("{}", "Cancelled.".yellow());
        return Ok(());
    }

    let ids: Vec<i64> = duplicates.iter().map(|c| c.id).collect();
    let report = ctx.vault.delete_many(&ids).await;
    if report.failed.is_empty() {
        ctx.toasts.success(report.summary());
    } else {
        ctx.toasts.error(report.summary());
    }
    Ok(())
}
