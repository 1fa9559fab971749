//! Add/edit form state
//!
//! [`CredentialForm`] tracks whether the form is open and which credential,
//! if any, it is editing. Successful mutations are announced on a change
//! channel; [`crate::vault::Vault::attach_form`] turns every change into one
//! reload request.

use tokio::sync::{broadcast, watch};

use crate::api::types::{Credential, CredentialPayload};
use crate::error::{Result, SecurepassError};

/// What the form is doing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FormMode {
    /// Creating a new credential
    #[default]
    Add,
    /// Changing the password of an existing credential
    Edit(Credential),
}

/// Observable form state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub open: bool,
    pub mode: FormMode,
}

/// Request produced by submitting the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormSubmission {
    Create(CredentialPayload),
    Update { id: i64, payload: CredentialPayload },
}

/// Form open/edit state plus the change notification channel.
#[derive(Debug)]
pub struct CredentialForm {
    state: watch::Sender<FormState>,
    changes: broadcast::Sender<()>,
}

impl Default for CredentialForm {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialForm {
    pub fn new() -> Self {
        let (state, _) = watch::channel(FormState::default());
        let (changes, _) = broadcast::channel(16);
        Self { state, changes }
    }

    /// Opens the form. `None` opens it in add mode.
    pub fn open(&self, edit: Option<Credential>) {
        self.state.send_replace(FormState {
            open: true,
            mode: edit.map_or(FormMode::Add, FormMode::Edit),
        });
    }

    /// Closes the form and returns it to add mode.
    pub fn close(&self) {
        self.state.send_replace(FormState::default());
    }

    /// Flips the open flag. Closing also drops the edited credential.
    pub fn toggle(&self) {
        self.state.send_modify(|s| {
            s.open = !s.open;
            if !s.open {
                s.mode = FormMode::Add;
            }
        });
    }

    /// Current state.
    pub fn state(&self) -> FormState {
        self.state.borrow().clone()
    }

    pub fn watch_state(&self) -> watch::Receiver<FormState> {
        self.state.subscribe()
    }

    /// Announces that credentials changed.
    pub fn emit_change(&self) {
        // Nobody listening is fine.
        let _ = self.changes.send(());
    }

    pub fn subscribe_changes(&self) -> broadcast::Receiver<()> {
        self.changes.subscribe()
    }

    /// Builds the request for the current mode.
    ///
    /// `password` falls back to `generated` when empty. In edit mode the
    /// original site and username are always used and the password is sent
    /// only when one was supplied.
    ///
    /// # Errors
    ///
    /// Returns [`SecurepassError::Validation`] when adding without a site or
    /// without a password.
    pub fn submission(
        &self,
        site: &str,
        username: &str,
        password: &str,
        generated: &str,
    ) -> Result<FormSubmission> {
        let effective = if password.is_empty() { generated } else { password };
        let effective = (!effective.is_empty()).then(|| effective.to_string());

        match &self.state.borrow().mode {
            FormMode::Edit(original) => Ok(FormSubmission::Update {
                id: original.id,
                payload: CredentialPayload {
                    site: original.site.clone(),
                    username: original.username.clone(),
                    password: effective,
                },
            }),
            FormMode::Add => {
                if site.trim().is_empty() {
                    return Err(invalid("Site is required"));
                }
                let Some(password) = effective else {
                    return Err(invalid("Password is required"));
                };
                Ok(FormSubmission::Create(CredentialPayload {
                    site: site.to_string(),
                    username: username.to_string(),
                    password: Some(password),
                }))
            }
        }
    }
}

fn invalid(message: &str) -> anyhow::Error {
    SecurepassError::Validation {
        status: 400,
        message: message.to_string(),
    }
    .into()
}
