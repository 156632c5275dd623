//! Fetcher registry — single source of truth mapping list IDs to fetchers.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::info;

use crate::fetch::{FetcherEvent, ListFetcher};
use crate::model::Snapshot;
use crate::remote::RemoteTaskService;

/// Owns every per-list fetcher and enforces one fetcher per list ID for
/// the process lifetime. Interval changes retarget the existing schedule
/// instead of spawning a duplicate timer chain.
pub struct FetcherRegistry {
    service: Arc<dyn RemoteTaskService>,
    events: mpsc::UnboundedSender<FetcherEvent>,
    fetchers: HashMap<i64, ListFetcher>,
}

impl FetcherRegistry {
    pub fn new(
        service: Arc<dyn RemoteTaskService>,
        events: mpsc::UnboundedSender<FetcherEvent>,
    ) -> Self {
        Self {
            service,
            events,
            fetchers: HashMap::new(),
        }
    }

    /// Create and start a fetcher for the list, or reuse the existing one.
    ///
    /// On reuse the interval is retargeted and the current cache is
    /// re-broadcast, so a reconfiguration is immediately visible without a
    /// remote call and without leaking a second timer.
    pub fn ensure_fetcher(&mut self, list_id: i64, name: &str, reload_interval: Duration) {
        match self.fetchers.entry(list_id) {
            Entry::Vacant(slot) => {
                info!(list = %name, interval = ?reload_interval, "Creating task fetcher");
                let fetcher = ListFetcher::new(
                    list_id,
                    name,
                    reload_interval,
                    Arc::clone(&self.service),
                    self.events.clone(),
                );
                fetcher.start_fetch();
                slot.insert(fetcher);
            }
            Entry::Occupied(slot) => {
                info!(list = %name, "Using existing task fetcher");
                let fetcher = slot.get();
                fetcher.set_reload_interval(reload_interval);
                fetcher.broadcast_items();
                fetcher.start_fetch();
            }
        }
    }

    /// Aggregate every fetcher's cache into a consumer-facing snapshot,
    /// keyed by list display name.
    pub fn snapshot(&self) -> Snapshot {
        self.fetchers
            .values()
            .map(|f| (f.name().to_string(), f.items()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.fetchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fetchers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::error::RemoteError;
    use crate::remote::{RemoteList, RemoteTask, RemoteUser};

    struct CountingService {
        task_calls: AtomicUsize,
    }

    #[async_trait]
    impl RemoteTaskService for CountingService {
        async fn list_all_lists(&self) -> Result<Vec<RemoteList>, RemoteError> {
            Ok(Vec::new())
        }

        async fn list_all_users(&self) -> Result<Vec<RemoteUser>, RemoteError> {
            Ok(Vec::new())
        }

        async fn list_tasks(&self, list_id: i64) -> Result<Vec<RemoteTask>, RemoteError> {
            self.task_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![RemoteTask {
                id: 100 + list_id,
                title: format!("task for {list_id}"),
                starred: false,
                due_date: None,
                assignee_id: None,
                list_id,
            }])
        }
    }

    fn registry_with_counter() -> (FetcherRegistry, Arc<CountingService>, mpsc::UnboundedReceiver<FetcherEvent>) {
        let service = Arc::new(CountingService {
            task_calls: AtomicUsize::new(0),
        });
        let (tx, rx) = mpsc::unbounded_channel();
        let registry = FetcherRegistry::new(Arc::clone(&service) as Arc<dyn RemoteTaskService>, tx);
        (registry, service, rx)
    }

    #[tokio::test]
    async fn ensure_fetcher_twice_keeps_one_instance() {
        let (mut registry, service, mut rx) = registry_with_counter();

        registry.ensure_fetcher(1, "Work", Duration::from_secs(60));
        // First event is the immediate fetch completing.
        assert!(matches!(
            rx.recv().await,
            Some(FetcherEvent::Received { list_id: 1 })
        ));
        assert_eq!(service.task_calls.load(Ordering::SeqCst), 1);

        registry.ensure_fetcher(1, "Work", Duration::from_secs(120));
        assert_eq!(registry.len(), 1);

        // Re-ensure broadcast the existing cache without a new remote call.
        assert!(matches!(
            rx.recv().await,
            Some(FetcherEvent::Received { list_id: 1 })
        ));
        assert_eq!(service.task_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fetchers_for_different_lists_are_independent() {
        let (mut registry, _service, mut rx) = registry_with_counter();

        registry.ensure_fetcher(1, "Work", Duration::from_secs(60));
        registry.ensure_fetcher(2, "Home", Duration::from_secs(60));
        assert_eq!(registry.len(), 2);

        let _ = rx.recv().await;
        let _ = rx.recv().await;

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot["Work"][0].list_id, 1);
        assert_eq!(snapshot["Home"][0].list_id, 2);
    }

    #[tokio::test]
    async fn snapshot_is_keyed_by_display_name() {
        let (mut registry, _service, mut rx) = registry_with_counter();
        registry.ensure_fetcher(5, "Groceries", Duration::from_secs(60));
        let _ = rx.recv().await;

        let snapshot = registry.snapshot();
        assert!(snapshot.contains_key("Groceries"));
        assert_eq!(snapshot["Groceries"][0].title, "task for 5");
    }
}
