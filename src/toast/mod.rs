//! Ephemeral notifications
//!
//! [`ToastService`] numbers toasts and broadcasts them. A [`ToastTray`]
//! holds the toasts on display and drops each one once its duration elapses.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use colored::Colorize;
use tokio::sync::broadcast;

/// Duration used by [`ToastService::info`] unless configured otherwise.
pub const DEFAULT_DURATION: Duration = Duration::from_millis(3500);
const SUCCESS_DURATION: Duration = Duration::from_millis(3000);
const ERROR_DURATION: Duration = Duration::from_millis(4000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub kind: ToastKind,
    pub duration: Duration,
}

impl std::fmt::Display for Toast {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            ToastKind::Success => write!(f, "{} {}", "✓".green().bold(), self.message),
            ToastKind::Error => write!(f, "{} {}", "✗".red().bold(), self.message.red()),
            ToastKind::Info => write!(f, "{} {}", "i".cyan().bold(), self.message),
        }
    }
}

/// Publishes toasts to every subscriber.
#[derive(Debug, Clone)]
pub struct ToastService {
    next_id: Arc<AtomicU64>,
    default_duration: Duration,
    tx: broadcast::Sender<Toast>,
}

impl Default for ToastService {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION)
    }
}

impl ToastService {
    /// `default_duration` applies to [`info`](Self::info) and to
    /// [`show`](Self::show) without an explicit duration.
    pub fn new(default_duration: Duration) -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            next_id: Arc::new(AtomicU64::new(1)),
            default_duration,
            tx,
        }
    }

    /// Publishes a toast and returns it.
    pub fn show(
        &self,
        message: impl Into<String>,
        kind: ToastKind,
        duration: Option<Duration>,
    ) -> Toast {
        let toast = Toast {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            message: message.into(),
            kind,
            duration: duration.unwrap_or(self.default_duration),
        };
        // Nobody listening is fine.
        let _ = self.tx.send(toast.clone());
        toast
    }

    pub fn success(&self, message: impl Into<String>) -> Toast {
        self.show(message, ToastKind::Success, Some(SUCCESS_DURATION))
    }

    pub fn error(&self, message: impl Into<String>) -> Toast {
        self.show(message, ToastKind::Error, Some(ERROR_DURATION))
    }

    pub fn info(&self, message: impl Into<String>) -> Toast {
        self.show(message, ToastKind::Info, None)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Toast> {
        self.tx.subscribe()
    }
}

/// Currently displayed toasts.
#[derive(Debug, Clone, Default)]
pub struct ToastTray {
    active: Arc<Mutex<Vec<Toast>>>,
}

impl ToastTray {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a toast and schedules its removal.
    pub fn push(&self, toast: Toast) {
        let id = toast.id;
        let duration = toast.duration;
        self.lock().push(toast);

        let active = Arc::clone(&self.active);
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            active
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .retain(|t| t.id != id);
        });
    }

    pub fn active(&self) -> Vec<Toast> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Toast>> {
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }
}
