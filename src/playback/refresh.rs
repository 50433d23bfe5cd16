//! Superseding delayed refresh
//!
//! Skips and context changes need a short settle delay before the provider
//! reports the new track. Only the most recent request may publish: each
//! schedule cancels the pending one and bumps a generation counter that
//! in-flight refreshes check before publishing.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Proof that a refresh was the latest one requested when it started
#[derive(Debug, Clone)]
pub struct RefreshTicket {
    generation: u64,
    latest: Arc<AtomicU64>,
}

impl RefreshTicket {
    /// `true` while no newer refresh has been requested
    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.generation
    }
}

struct Pending {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns at most one pending delayed refresh
pub struct RefreshScheduler {
    pending: Mutex<Option<Pending>>,
    latest: Arc<AtomicU64>,
}

impl Default for RefreshScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshScheduler {
    /// Creates a scheduler with nothing pending
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(None),
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Pending>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn next_ticket(&self) -> RefreshTicket {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        RefreshTicket {
            generation,
            latest: Arc::clone(&self.latest),
        }
    }

    /// Cancels any pending refresh and returns a ticket for an immediate one
    pub fn supersede(&self) -> RefreshTicket {
        let mut pending = self.lock();
        if let Some(old) = pending.take() {
            old.cancel.cancel();
        }
        self.next_ticket()
    }

    /// Runs `task` after `delay` unless superseded first
    ///
    /// Cancellation covers both the delay and the task itself.
    pub fn schedule<F, Fut>(&self, delay: Duration, task: F)
    where
        F: FnOnce(RefreshTicket) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut pending = self.lock();
        if let Some(old) = pending.take() {
            old.cancel.cancel();
        }

        let ticket = self.next_ticket();
        let cancel = CancellationToken::new();
        let child = cancel.clone();

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = child.cancelled() => {
                    tracing::debug!("Superseded refresh cancelled");
                }
                _ = async move {
                    tokio::time::sleep(delay).await;
                    task(ticket).await;
                } => {}
            }
        });

        *pending = Some(Pending { cancel, handle });
    }

    /// Whether a scheduled refresh has not finished yet
    pub fn has_pending(&self) -> bool {
        self.lock()
            .as_ref()
            .map(|p| !p.handle.is_finished())
            .unwrap_or(false)
    }

    /// Waits for the pending refresh, if any, to finish or be cancelled
    pub async fn settle(&self) {
        let pending = self.lock().take();
        if let Some(pending) = pending {
            let _ = pending.handle.await;
        }
    }
}
