//! Credential vault
//!
//! [`Vault`] pairs the API client with the [`CredentialSynchronizer`]: every
//! successful mutation requests a reload, and readers see the list only
//! through the synchronizer's snapshot.
//!
//! # Module Layout
//!
//! - [`sync`]       -- debounced, deduplicated reload pipeline
//! - [`search`]     -- filtering and summary counts
//! - [`duplicates`] -- (site, username) duplicate detection
//! - [`form`]       -- add/edit form state

pub mod duplicates;
pub mod form;
pub mod search;
pub mod sync;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::api::types::{Credential, CredentialPayload};
use crate::api::VaultClient;
use crate::error::Result;

pub use duplicates::{find_duplicates, DedupeReport};
pub use form::{CredentialForm, FormMode, FormState, FormSubmission};
pub use search::{CredentialFilter, VaultStats};
pub use sync::{CredentialSource, CredentialSynchronizer, Snapshot};

/// API client plus the synchronized credential list.
#[derive(Debug)]
pub struct Vault {
    client: Arc<VaultClient>,
    sync: Arc<CredentialSynchronizer>,
}

impl Vault {
    /// Creates the vault and starts its reload driver. Needs a Tokio
    /// runtime.
    pub fn new(client: Arc<VaultClient>, debounce: Duration) -> Self {
        let source: Arc<dyn CredentialSource> = client.clone();
        let sync = Arc::new(CredentialSynchronizer::new(source, debounce));
        Self { client, sync }
    }

    pub fn client(&self) -> &Arc<VaultClient> {
        &self.client
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.sync.snapshot()
    }

    /// Receiver notified on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.sync.subscribe()
    }

    /// Asks for a reload without waiting.
    pub fn request_reload(&self) {
        self.sync.request_reload();
    }

    /// Reloads and waits for the result.
    ///
    /// A failed fetch shows up as an empty snapshot. Use [`load`](Self::load)
    /// when the caller must tell an empty vault from an unreachable one.
    pub async fn refresh(&self) -> Snapshot {
        self.sync.refresh().await
    }

    /// Fetches the list directly, deduplicated by id.
    ///
    /// # Errors
    ///
    /// Returns the fetch error unchanged. The reload pipeline is not
    /// involved.
    pub async fn load(&self) -> Result<Snapshot> {
        let list = self.client.list().await?;
        Ok(Arc::new(sync::dedupe_by_id(list)))
    }

    pub async fn add(&self, payload: &CredentialPayload) -> Result<String> {
        let message = self.client.add(payload).await?;
        self.sync.request_reload();
        Ok(message)
    }

    pub async fn update(&self, id: i64, payload: &CredentialPayload) -> Result<String> {
        let message = self.client.update(id, payload).await?;
        self.sync.request_reload();
        Ok(message)
    }

    pub async fn delete(&self, id: i64) -> Result<String> {
        let message = self.client.delete(id).await?;
        self.sync.request_reload();
        Ok(message)
    }

    pub async fn bulk_import(&self, credentials: &[Credential]) -> Result<String> {
        let message = self.client.bulk_import(credentials).await?;
        self.sync.request_reload();
        Ok(message)
    }

    /// Applies a form submission.
    pub async fn submit(&self, submission: &FormSubmission) -> Result<String> {
        match submission {
            FormSubmission::Create(payload) => self.add(payload).await,
            FormSubmission::Update { id, payload } => self.update(*id, payload).await,
        }
    }

    /// Deletes each id in turn, continuing past failures. One reload is
    /// requested at the end when anything was removed.
    pub async fn delete_many(&self, ids: &[i64]) -> DedupeReport {
        let mut report = DedupeReport::default();
        for &id in ids {
            match self.client.delete(id).await {
                Ok(_) => report.removed.push(id),
                Err(e) => {
                    tracing::warn!(id, "Failed to delete credential: {}", e);
                    report.failed.push((id, e.to_string()));
                }
            }
        }
        if !report.removed.is_empty() {
            self.sync.request_reload();
        }
        report
    }

    /// Forwards every change announced by `form` to the reload pipeline.
    ///
    /// The forwarder stops when the form or the vault is dropped.
    pub fn attach_form(&self, form: &CredentialForm) -> JoinHandle<()> {
        let mut changes = form.subscribe_changes();
        let sync = Arc::downgrade(&self.sync);
        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                        let Some(sync) = sync.upgrade() else { break };
                        sync.request_reload();
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}
