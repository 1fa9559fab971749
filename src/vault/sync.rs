//! Coalesced credential list reloads
//!
//! [`CredentialSynchronizer`] owns the credential snapshot. Callers never
//! fetch the list themselves; they call
//! [`request_reload`](CredentialSynchronizer::request_reload) and observe the
//! snapshot through a read-only [`watch`] receiver.
//!
//! A single driver task runs the scheduler:
//!
//! 1. Wait for a reload signal.
//! 2. Debounce: keep absorbing signals until none has arrived for the
//!    debounce window.
//! 3. Mark the fetch in flight and call the [`CredentialSource`]. Signals
//!    sent while the flag is set are dropped, not queued.
//! 4. Deduplicate by id (first occurrence wins), fingerprint the result and
//!    publish it only if the fingerprint differs from the last publication.
//!
//! A failed fetch publishes an empty list for that cycle; the error is only
//! logged, since the action that triggered the reload reports its own
//! outcome directly.
//!
//! # Metrics
//!
//! - `vault_reload_fetches_total`: fetches dispatched
//! - `vault_reload_failures_total`: fetches that failed
//! - `vault_reload_suppressed_total`: cycles whose result matched the last
//!   publication
//! - `vault_reload_dropped_total`: signals dropped while a fetch was in flight

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics::increment_counter;
use sha2::{Digest, Sha256};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::api::types::Credential;
use crate::error::Result;

/// Default debounce window for reload signals.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(50);

/// Immutable, shareable view of the credential list.
pub type Snapshot = Arc<Vec<Credential>>;

/// Where the synchronizer gets the authoritative list from.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Fetches the full credential list.
    async fn fetch_credentials(&self) -> Result<Vec<Credential>>;
}

/// Removes entries whose id was already seen, keeping server order.
///
/// # Examples
///
/// ```
/// use securepass::api::Credential;
/// use securepass::vault::sync::dedupe_by_id;
///
/// let mut a = Credential::new("a.com", "alice", None);
/// a.id = 1;
/// let mut b = Credential::new("b.com", "bob", None);
/// b.id = 2;
/// let mut a2 = Credential::new("a2.com", "alice", None);
/// a2.id = 1;
///
/// let deduped = dedupe_by_id(vec![a, b, a2]);
/// assert_eq!(deduped.len(), 2);
/// assert_eq!(deduped[0].site, "a.com");
/// ```
pub fn dedupe_by_id(list: Vec<Credential>) -> Vec<Credential> {
    let mut seen = HashSet::with_capacity(list.len());
    list.into_iter().filter(|c| seen.insert(c.id)).collect()
}

/// SHA-256 over the ordered ids and the serialized list.
pub fn fingerprint(list: &[Credential]) -> [u8; 32] {
    let ids = list
        .iter()
        .map(|c| c.id.to_string())
        .collect::<Vec<_>>()
        .join(",");
    let mut hasher = Sha256::new();
    hasher.update(ids.as_bytes());
    hasher.update(b"|");
    hasher.update(serde_json::to_vec(list).unwrap_or_default());
    hasher.finalize().into()
}

/// Shared state between the handle and the driver task.
struct Shared {
    in_flight: AtomicBool,
}

/// Owner of the credential snapshot and its reload scheduler.
///
/// Must be created inside a Tokio runtime; the driver task is aborted when
/// the synchronizer is dropped.
pub struct CredentialSynchronizer {
    signals: mpsc::UnboundedSender<()>,
    shared: Arc<Shared>,
    snapshot: watch::Receiver<Snapshot>,
    cycles: watch::Receiver<u64>,
    driver: JoinHandle<()>,
}

impl std::fmt::Debug for CredentialSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSynchronizer")
            .field("in_flight", &self.is_fetching())
            .field("entries", &self.snapshot.borrow().len())
            .finish()
    }
}

impl CredentialSynchronizer {
    /// Starts the driver task with an empty snapshot.
    pub fn new(source: Arc<dyn CredentialSource>, debounce: Duration) -> Self {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot::default());
        let (cycles_tx, cycles_rx) = watch::channel(0u64);
        let shared = Arc::new(Shared {
            in_flight: AtomicBool::new(false),
        });

        let driver = tokio::spawn(drive(
            signal_rx,
            source,
            Arc::clone(&shared),
            snapshot_tx,
            cycles_tx,
            debounce,
        ));

        Self {
            signals: signal_tx,
            shared,
            snapshot: snapshot_rx,
            cycles: cycles_rx,
            driver,
        }
    }

    /// Signals that the list should be reloaded.
    ///
    /// Signals within one debounce window collapse into one fetch. While a
    /// fetch is in flight the signal is dropped.
    pub fn request_reload(&self) {
        if self.shared.in_flight.load(Ordering::Acquire) {
            increment_counter!("vault_reload_dropped_total");
            tracing::debug!("Reload requested while fetch in flight; dropped");
            return;
        }
        if self.signals.send(()).is_err() {
            tracing::warn!("Reload driver has stopped; reload request ignored");
        }
    }

    /// Requests a reload and waits for the next fetch cycle to finish.
    ///
    /// Returns the snapshot afterwards. If the request is dropped because a
    /// fetch is already in flight, that fetch's completion is awaited
    /// instead.
    pub async fn refresh(&self) -> Snapshot {
        let mut cycles = self.cycles.clone();
        cycles.borrow_and_update();
        self.request_reload();
        if cycles.changed().await.is_err() {
            tracing::warn!("Reload driver has stopped; returning last snapshot");
        }
        self.snapshot()
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.snapshot.borrow())
    }

    /// A receiver notified on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot.clone()
    }

    /// Whether a fetch is currently in flight.
    pub fn is_fetching(&self) -> bool {
        self.shared.in_flight.load(Ordering::Acquire)
    }
}

impl Drop for CredentialSynchronizer {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

async fn drive(
    mut signals: mpsc::UnboundedReceiver<()>,
    source: Arc<dyn CredentialSource>,
    shared: Arc<Shared>,
    snapshot_tx: watch::Sender<Snapshot>,
    cycles_tx: watch::Sender<u64>,
    debounce: Duration,
) {
    let mut last_published: Option<[u8; 32]> = None;

    while signals.recv().await.is_some() {
        // Restart the window on every signal.
        while let Ok(Some(())) = tokio::time::timeout(debounce, signals.recv()).await {}

        shared.in_flight.store(true, Ordering::Release);
        increment_counter!("vault_reload_fetches_total");
        tracing::debug!("Fetching credential list");

        let fetched = match source.fetch_credentials().await {
            Ok(list) => list,
            Err(e) => {
                increment_counter!("vault_reload_failures_total");
                tracing::warn!("Credential reload failed; treating as empty: {}", e);
                Vec::new()
            }
        };

        let deduped = dedupe_by_id(fetched);
        let key = fingerprint(&deduped);
        if last_published == Some(key) {
            increment_counter!("vault_reload_suppressed_total");
            tracing::debug!(entries = deduped.len(), "Snapshot unchanged; not publishing");
        } else {
            tracing::debug!(entries = deduped.len(), "Publishing new snapshot");
            last_published = Some(key);
            snapshot_tx.send_replace(Arc::new(deduped));
        }

        // Anything that slipped in while the fetch ran is discarded.
        while signals.try_recv().is_ok() {
            increment_counter!("vault_reload_dropped_total");
        }
        shared.in_flight.store(false, Ordering::Release);
        cycles_tx.send_modify(|n| *n += 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    use crate::error::SecurepassError;

    fn cred(id: i64, site: &str) -> Credential {
        Credential {
            id,
            site: site.to_string(),
            username: "alice".to_string(),
            password: Some("pw".to_string()),
        }
    }

    /// Serves scripted responses; the last one repeats.
    struct ScriptedSource {
        responses: Mutex<Vec<Option<Vec<Credential>>>>,
        calls: AtomicUsize,
        delay: Duration,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Option<Vec<Credential>>>) -> Arc<Self> {
            Self::with_delay(responses, Duration::ZERO)
        }

        fn with_delay(responses: Vec<Option<Vec<Credential>>>, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses),
                calls: AtomicUsize::new(0),
                delay,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CredentialSource for ScriptedSource {
        async fn fetch_credentials(&self) -> Result<Vec<Credential>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let next = {
                let mut responses = self.responses.lock().unwrap();
                if responses.len() > 1 {
                    responses.remove(0)
                } else {
                    responses[0].clone()
                }
            };
            next.ok_or_else(|| {
                SecurepassError::Server {
                    status: 500,
                    message: "boom".to_string(),
                }
                .into()
            })
        }
    }

    #[test]
    fn test_dedupe_keeps_first_occurrence() {
        let deduped = dedupe_by_id(vec![cred(1, "first"), cred(2, "b"), cred(1, "second")]);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].site, "first");
        assert_eq!(deduped[1].id, 2);
    }

    #[test]
    fn test_fingerprint_depends_on_order_and_content() {
        let a = vec![cred(1, "a"), cred(2, "b")];
        let reordered = vec![cred(2, "b"), cred(1, "a")];
        let edited = vec![cred(1, "a"), cred(2, "changed")];
        assert_eq!(fingerprint(&a), fingerprint(&a.clone()));
        assert_ne!(fingerprint(&a), fingerprint(&reordered));
        assert_ne!(fingerprint(&a), fingerprint(&edited));
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_within_window_fetches_once() {
        let source = ScriptedSource::new(vec![Some(vec![cred(1, "a")])]);
        let sync = CredentialSynchronizer::new(source.clone(), DEFAULT_DEBOUNCE);

        for _ in 0..10 {
            sync.request_reload();
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(source.calls(), 1);
        assert_eq!(sync.snapshot().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_windows_fetch_separately() {
        let source = ScriptedSource::new(vec![Some(vec![cred(1, "a")])]);
        let sync = CredentialSynchronizer::new(source.clone(), DEFAULT_DEBOUNCE);

        sync.request_reload();
        tokio::time::sleep(Duration::from_millis(200)).await;
        sync.request_reload();
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_identical_fetches_notify_once() {
        let source = ScriptedSource::new(vec![Some(vec![cred(1, "a"), cred(2, "b")])]);
        let sync = CredentialSynchronizer::new(source.clone(), DEFAULT_DEBOUNCE);
        let mut observer = sync.subscribe();
        observer.borrow_and_update();

        sync.refresh().await;
        assert!(observer.has_changed().unwrap());
        observer.borrow_and_update();

        sync.refresh().await;
        assert_eq!(source.calls(), 2);
        assert!(!observer.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicates_in_payload_do_not_defeat_suppression() {
        let source = ScriptedSource::new(vec![
            Some(vec![cred(1, "a"), cred(2, "b")]),
            Some(vec![cred(1, "a"), cred(2, "b"), cred(1, "a")]),
        ]);
        let sync = CredentialSynchronizer::new(source.clone(), DEFAULT_DEBOUNCE);
        let mut observer = sync.subscribe();

        sync.refresh().await;
        observer.borrow_and_update();
        sync.refresh().await;

        assert!(!observer.has_changed().unwrap());
        assert_eq!(sync.snapshot().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_requests_during_fetch_are_dropped() {
        let source =
            ScriptedSource::with_delay(vec![Some(vec![cred(1, "a")])], Duration::from_millis(500));
        let sync = CredentialSynchronizer::new(source.clone(), DEFAULT_DEBOUNCE);

        sync.request_reload();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(sync.is_fetching());

        for _ in 0..5 {
            sync.request_reload();
        }
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(source.calls(), 1);
        assert!(!sync.is_fetching());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_failure_publishes_empty_snapshot() {
        let source = ScriptedSource::new(vec![Some(vec![cred(1, "a")]), None]);
        let sync = CredentialSynchronizer::new(source.clone(), DEFAULT_DEBOUNCE);

        assert_eq!(sync.refresh().await.len(), 1);
        assert!(sync.refresh().await.is_empty());

        // The pipeline keeps running after a failure.
        sync.refresh().await;
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_while_in_flight_waits_for_current_fetch() {
        let source =
            ScriptedSource::with_delay(vec![Some(vec![cred(7, "x")])], Duration::from_millis(300));
        let sync = CredentialSynchronizer::new(source.clone(), DEFAULT_DEBOUNCE);

        sync.request_reload();
        tokio::time::sleep(Duration::from_millis(100)).await;
        let snapshot = sync.refresh().await;

        assert_eq!(source.calls(), 1);
        assert_eq!(snapshot[0].id, 7);
    }
}
