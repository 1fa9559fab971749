//! Terminal input
//!
//! Line prompts go through rustyline on a blocking thread. The confirmation
//! responder renders whichever request the [`ConfirmationService`] shows and
//! answers it by id.

use std::collections::HashSet;

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio::task::JoinHandle;

use crate::confirm::{ConfirmationRequest, ConfirmationService};
use crate::error::{Result, SecurepassError};

/// Reads one line from the terminal.
///
/// # Errors
///
/// [`SecurepassError::Cancelled`] on Ctrl-C or Ctrl-D,
/// [`SecurepassError::Prompt`] when the terminal cannot be read.
pub async fn read_line(prompt: &str) -> Result<String> {
    let prompt = prompt.to_string();
    tokio::task::spawn_blocking(move || -> Result<String> {
        let mut rl = DefaultEditor::new()
            .map_err(|e| SecurepassError::Prompt(format!("Cannot open terminal: {}", e)))?;
        match rl.readline(&prompt) {
            Ok(line) => Ok(line.trim().to_string()),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                Err(SecurepassError::Cancelled.into())
            }
            Err(err) => Err(SecurepassError::Prompt(err.to_string()).into()),
        }
    })
    .await
    .map_err(|e| SecurepassError::Prompt(format!("Prompt task failed: {}", e)))?
}

/// Returns `value` or asks for it.
pub async fn value_or_prompt(value: Option<String>, prompt: &str) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => read_line(prompt).await,
    }
}

async fn ask(request: &ConfirmationRequest) -> bool {
    println!("{}", request.title.bold());
    println!("{}", request.message);
    let prompt = format!(
        "{} / {} [y/N] ",
        request.confirm_label.red(),
        request.cancel_label
    );
    match read_line(&prompt).await {
        Ok(answer) => matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"),
        Err(e) => {
            tracing::debug!("Confirmation prompt ended: {}", e);
            false
        }
    }
}

/// Answers confirmation requests as they become visible.
///
/// With `assume_yes` every request is confirmed without asking. Each request
/// is answered once; updates to an answered request (such as its loading
/// flag) are ignored.
pub fn spawn_responder(service: ConfirmationService, assume_yes: bool) -> JoinHandle<()> {
    let mut rx = service.subscribe();
    tokio::spawn(async move {
        let mut answered = HashSet::new();
        loop {
            let visible = rx.borrow_and_update().clone();
            if let Some(request) = visible {
                if service.is_pending(&request.id) && answered.insert(request.id.clone()) {
                    let confirmed = assume_yes || ask(&request).await;
                    if confirmed {
                        service.confirm(&request.id);
                    } else {
                        service.cancel(&request.id);
                    }
                }
            }
            if rx.changed().await.is_err() {
                break;
            }
        }
    })
}
