//! Per-list task fetcher — owns one list's cache and polling schedule.
//!
//! Each fetcher runs a single spawned loop driven by a resettable interval.
//! A busy flag skips triggers that arrive while a fetch is in flight, so at
//! most one request per list is outstanding at any time. On failure the
//! previous cache is kept untouched; the next tick is the implicit retry.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

use crate::config::MIN_RELOAD_INTERVAL;
use crate::error::RemoteError;
use crate::model::{TaskRecord, normalize_tasks};
use crate::remote::RemoteTaskService;

/// Events a fetcher reports to the registry, delivered in completion order.
#[derive(Debug, Clone)]
pub enum FetcherEvent {
    /// The cache was refreshed (or re-broadcast) and a new snapshot should
    /// go out.
    Received { list_id: i64 },
    /// A fetch failed; the cache is unchanged and polling continues.
    Error { list_id: i64, error: RemoteError },
}

struct FetcherInner {
    list_id: i64,
    name: String,
    service: Arc<dyn RemoteTaskService>,
    events: mpsc::UnboundedSender<FetcherEvent>,
    /// Cache of normalized tasks in remote order. Replaced wholesale on a
    /// successful fetch, never partially mutated.
    cache: RwLock<Vec<TaskRecord>>,
    /// True while a fetch is in flight. Sole mutual exclusion for this list.
    busy: AtomicBool,
    /// True once the polling loop has been spawned.
    scheduled: AtomicBool,
    interval_tx: watch::Sender<Duration>,
}

impl FetcherInner {
    /// Run one fetch cycle unless one is already in flight.
    async fn trigger_fetch(&self) {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(list = %self.name, "Fetch already in flight, skipping trigger");
            return;
        }

        match self.service.list_tasks(self.list_id).await {
            Ok(raw) => {
                let items = normalize_tasks(raw);
                debug!(list = %self.name, count = items.len(), "Fetched tasks");
                // Writers only ever swap the whole Vec, so a poisoned lock
                // still holds a consistent value.
                *self.cache.write().unwrap_or_else(PoisonError::into_inner) = items;
                let _ = self.events.send(FetcherEvent::Received {
                    list_id: self.list_id,
                });
            }
            Err(e) => {
                error!(list = %self.name, error = %e, "Fetch failed, keeping previous cache");
                let _ = self.events.send(FetcherEvent::Error {
                    list_id: self.list_id,
                    error: e,
                });
            }
        }

        self.busy.store(false, Ordering::SeqCst);
    }
}

/// Fetcher for exactly one tracked list.
///
/// Cheap to clone; clones share the same cache, schedule, and busy flag.
#[derive(Clone)]
pub struct ListFetcher {
    inner: Arc<FetcherInner>,
}

impl ListFetcher {
    pub fn new(
        list_id: i64,
        name: impl Into<String>,
        reload_interval: Duration,
        service: Arc<dyn RemoteTaskService>,
        events: mpsc::UnboundedSender<FetcherEvent>,
    ) -> Self {
        let (interval_tx, _) = watch::channel(reload_interval.max(MIN_RELOAD_INTERVAL));
        Self {
            inner: Arc::new(FetcherInner {
                list_id,
                name: name.into(),
                service,
                events,
                cache: RwLock::new(Vec::new()),
                busy: AtomicBool::new(false),
                scheduled: AtomicBool::new(false),
                interval_tx,
            }),
        }
    }

    pub fn list_id(&self) -> i64 {
        self.inner.list_id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Start the polling schedule: one immediate fetch, then recurring
    /// fetches at the configured interval. Idempotent; a second call while
    /// scheduled does nothing. The loop runs until process shutdown.
    pub fn start_fetch(&self) {
        if self
            .inner
            .scheduled
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        let inner = Arc::clone(&self.inner);
        let period = *inner.interval_tx.borrow();
        info!(list = %inner.name, interval = ?period, "Starting task fetcher");

        tokio::spawn(async move {
            inner.trigger_fetch().await;

            let mut interval_rx = inner.interval_tx.subscribe();
            loop {
                let period = *interval_rx.borrow_and_update();
                tokio::select! {
                    _ = tokio::time::sleep(period) => inner.trigger_fetch().await,
                    // Interval retargeted: restart the wait with the new
                    // period instead of finishing a stale sleep.
                    _ = interval_rx.changed() => {}
                }
            }
        });
    }

    /// Retarget the recurring period. Never spawns a second loop and never
    /// interrupts a fetch in progress.
    pub fn set_reload_interval(&self, reload_interval: Duration) {
        let clamped = reload_interval.max(MIN_RELOAD_INTERVAL);
        self.inner.interval_tx.send_if_modified(|current| {
            if *current == clamped {
                return false;
            }
            let previous = *current;
            debug!(
                list = %self.inner.name,
                from = ?previous,
                to = ?clamped,
                "Retargeting reload interval"
            );
            *current = clamped;
            true
        });
    }

    /// Current cached items. Non-blocking snapshot read, safe from any
    /// context.
    pub fn items(&self) -> Vec<TaskRecord> {
        self.inner
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Re-emit a received event from the existing cache without touching
    /// the remote service.
    pub fn broadcast_items(&self) {
        let _ = self.inner.events.send(FetcherEvent::Received {
            list_id: self.inner.list_id,
        });
    }

    /// Run one fetch cycle now. Normally driven by the schedule; exposed so
    /// callers (and tests) can force a cycle without waiting for a tick.
    pub async fn trigger_fetch(&self) {
        self.inner.trigger_fetch().await;
    }
}
