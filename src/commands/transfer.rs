//! Import and export commands

use std::path::Path;

use colored::Colorize;

use super::Context;
use crate::error::Result;
use crate::transfer::{self, explain_import_failure, Format};

pub async fn import(ctx: &mut Context, file: &Path, format: Option<Format>) -> Result<()> {
    ctx.require_session()?;
    let credentials = transfer::read_file(file, format).await?;
    println!(
        "Importing {} credentials from {}",
        credentials.len(),
        file.display().to_string().cyan()
    );

    match ctx.vault.bulk_import(&credentials).await {
        Ok(message) => {
            ctx.toasts.success(message);
            Ok(())
        }
        Err(e) => {
            tracing::debug!("Bulk import failed: {:#}", e);
            ctx.toasts.error(explain_import_failure(&e, &ctx.session));
            Err(e)
        }
    }
}

pub async fn export(ctx: &mut Context, file: &Path, format: Option<Format>) -> Result<()> {
    ctx.require_session()?;
    let snapshot = ctx.vault.load().await?;
    transfer::write_file(file, format, &snapshot).await?;
    ctx.toasts.success(format!(
        "Exported {} credentials to {}",
        snapshot.len(),
        file.display()
    ));
    Ok(())
}
