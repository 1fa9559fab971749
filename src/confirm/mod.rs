//! Awaitable confirmation requests
//!
//! Any caller can [`open`](ConfirmationService::open) a confirmation and
//! `await` the user's answer through the returned [`ConfirmationHandle`].
//! The service keeps one one-shot resolver per request id; whoever renders
//! the request answers it by id with [`confirm`](ConfirmationService::confirm)
//! or [`cancel`](ConfirmationService::cancel).
//!
//! Only one request is visible at a time. It is published through a
//! [`watch`] channel; opening a new request replaces the visible one, but
//! earlier handles stay resolvable through their ids.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{oneshot, watch};

use crate::error::{Result, SecurepassError};

/// Caller-supplied text; unset fields take the defaults.
#[derive(Debug, Clone, Default)]
pub struct ConfirmationOptions {
    pub title: Option<String>,
    pub message: Option<String>,
    pub confirm_label: Option<String>,
    pub cancel_label: Option<String>,
}

impl ConfirmationOptions {
    /// Options with a title and message and default labels.
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn confirm_label(mut self, label: impl Into<String>) -> Self {
        self.confirm_label = Some(label.into());
        self
    }
}

/// The request as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationRequest {
    pub id: String,
    pub title: String,
    pub message: String,
    pub confirm_label: String,
    pub cancel_label: String,
    /// Set while the confirmed action runs
    pub loading: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    Confirmed,
    Cancelled,
}

#[derive(Debug)]
struct Inner {
    pending: Mutex<HashMap<String, oneshot::Sender<Resolution>>>,
    slot: watch::Sender<Option<ConfirmationRequest>>,
}

/// Registry of pending confirmations and the visible-request slot.
#[derive(Debug, Clone)]
pub struct ConfirmationService {
    inner: Arc<Inner>,
}

impl Default for ConfirmationService {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfirmationService {
    pub fn new() -> Self {
        let (slot, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                pending: Mutex::new(HashMap::new()),
                slot,
            }),
        }
    }

    /// Registers a request, makes it the visible one and returns its handle.
    pub fn open(&self, options: ConfirmationOptions) -> ConfirmationHandle {
        let id = uuid::Uuid::new_v4().to_string();
        let request = ConfirmationRequest {
            id: id.clone(),
            title: options.title.unwrap_or_else(|| "Confirm".to_string()),
            message: options
                .message
                .unwrap_or_else(|| "Are you sure?".to_string()),
            confirm_label: options
                .confirm_label
                .unwrap_or_else(|| "Confirm".to_string()),
            cancel_label: options.cancel_label.unwrap_or_else(|| "Cancel".to_string()),
            loading: false,
        };

        let (tx, rx) = oneshot::channel();
        self.pending().insert(id.clone(), tx);
        tracing::debug!(id = %id, "Confirmation opened");
        self.inner.slot.send_replace(Some(request));

        ConfirmationHandle {
            id,
            service: self.clone(),
            outcome: rx,
            resolved: None,
        }
    }

    /// Resolves `id` as confirmed. Unknown or settled ids are ignored.
    pub fn confirm(&self, id: &str) {
        self.resolve(id, Resolution::Confirmed);
    }

    /// Resolves `id` as cancelled. Unknown or settled ids are ignored.
    pub fn cancel(&self, id: &str) {
        self.resolve(id, Resolution::Cancelled);
    }

    /// Whether `id` still awaits an answer.
    pub fn is_pending(&self, id: &str) -> bool {
        self.pending().contains_key(id)
    }

    /// The visible request, if any.
    pub fn active(&self) -> Option<ConfirmationRequest> {
        self.inner.slot.borrow().clone()
    }

    /// Receiver for the visible request.
    pub fn subscribe(&self) -> watch::Receiver<Option<ConfirmationRequest>> {
        self.inner.slot.subscribe()
    }

    fn resolve(&self, id: &str, resolution: Resolution) {
        if let Some(tx) = self.pending().remove(id) {
            tracing::debug!(id, ?resolution, "Confirmation resolved");
            // The handle may already be gone.
            let _ = tx.send(resolution);
        }
        self.inner.slot.send_if_modified(|slot| {
            if slot.as_ref().is_some_and(|r| r.id == id) {
                *slot = None;
                true
            } else {
                false
            }
        });
    }

    fn set_loading(&self, id: &str, loading: bool) {
        self.inner.slot.send_if_modified(|slot| match slot {
            Some(request) if request.id == id => {
                request.loading = loading;
                true
            }
            _ => false,
        });
    }

    fn pending(&self) -> std::sync::MutexGuard<'_, HashMap<String, oneshot::Sender<Resolution>>> {
        self.inner.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Caller's view of one confirmation request.
#[derive(Debug)]
pub struct ConfirmationHandle {
    id: String,
    service: ConfirmationService,
    outcome: oneshot::Receiver<Resolution>,
    resolved: Option<Resolution>,
}

impl ConfirmationHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Waits for the answer.
    ///
    /// # Errors
    ///
    /// [`SecurepassError::Cancelled`] when the request was cancelled or its
    /// resolver was dropped.
    pub async fn confirmed(&mut self) -> Result<()> {
        let resolution = match self.resolved {
            Some(r) => r,
            None => {
                let r = (&mut self.outcome)
                    .await
                    .unwrap_or(Resolution::Cancelled);
                self.resolved = Some(r);
                r
            }
        };
        match resolution {
            Resolution::Confirmed => Ok(()),
            Resolution::Cancelled => Err(SecurepassError::Cancelled.into()),
        }
    }

    /// Toggles the loading flag if this request is still the visible one.
    pub fn set_loading(&self, loading: bool) {
        self.service.set_loading(&self.id, loading);
    }

    /// Resolves as confirmed if still pending and hides the request.
    pub fn close(&self) {
        self.service.confirm(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_confirm_resolves() {
        let service = ConfirmationService::new();
        let mut handle = service.open(ConfirmationOptions::default());
        service.confirm(handle.id());
        assert!(handle.confirmed().await.is_ok());
        assert!(service.active().is_none());
    }

    #[tokio::test]
    async fn test_cancel_rejects() {
        let service = ConfirmationService::new();
        let mut handle = service.open(ConfirmationOptions::default());
        service.cancel(handle.id());
        let err = handle.confirmed().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SecurepassError>(),
            Some(SecurepassError::Cancelled)
        ));
    }

    #[tokio::test]
    async fn test_second_answer_is_ignored() {
        let service = ConfirmationService::new();
        let mut handle = service.open(ConfirmationOptions::default());
        let id = handle.id().to_string();
        service.confirm(&id);
        service.cancel(&id);
        service.confirm(&id);
        assert!(!service.is_pending(&id));
        assert!(handle.confirmed().await.is_ok());
        // Awaiting again replays the answer.
        assert!(handle.confirmed().await.is_ok());
    }

    #[test]
    fn test_unknown_id_is_noop() {
        let service = ConfirmationService::new();
        let handle = service.open(ConfirmationOptions::default());
        service.confirm("nope");
        assert!(service.is_pending(handle.id()));
        assert!(service.active().is_some());
    }

    #[test]
    fn test_defaults() {
        let service = ConfirmationService::new();
        service.open(ConfirmationOptions::default());
        let request = service.active().unwrap();
        assert_eq!(request.title, "Confirm");
        assert_eq!(request.message, "Are you sure?");
        assert_eq!(request.confirm_label, "Confirm");
        assert_eq!(request.cancel_label, "Cancel");
        assert!(!request.loading);
    }

    #[tokio::test]
    async fn test_newer_request_replaces_slot_but_older_stays_resolvable() {
        let service = ConfirmationService::new();
        let mut first = service.open(ConfirmationOptions::new("First", "one"));
        let second = service.open(ConfirmationOptions::new("Second", "two"));

        assert_eq!(service.active().unwrap().id, second.id());

        // Loading on a hidden request does not touch the visible one.
        first.set_loading(true);
        assert!(!service.active().unwrap().loading);
        second.set_loading(true);
        assert!(service.active().unwrap().loading);

        service.cancel(first.id());
        assert!(first.confirmed().await.is_err());
        assert_eq!(service.active().unwrap().id, second.id());
    }

    #[tokio::test]
    async fn test_close_force_confirms() {
        let service = ConfirmationService::new();
        let mut handle = service.open(ConfirmationOptions::default());
        handle.close();
        assert!(handle.confirmed().await.is_ok());
        assert!(service.active().is_none());
    }

    #[tokio::test]
    async fn test_subscribers_see_requests() {
        let service = ConfirmationService::new();
        let mut rx = service.subscribe();
        let handle = service.open(ConfirmationOptions::new("Delete", "Delete it?"));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref().unwrap().id, handle.id());
    }
}
