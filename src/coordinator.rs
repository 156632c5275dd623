//! Coordinator — the consumer-facing message loop.
//!
//! Consumers talk to the coordinator over an opaque reliable ordered
//! channel: [`ConsumerMessage`] in, [`CoordinatorEvent`] out. The
//! coordinator owns the fetcher registry and a single event channel that
//! carries fetch completions in completion order, so snapshot broadcasts
//! always reflect whichever fetch actually finished last.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use crate::config::CoordinatorConfig;
use crate::fetch::{FetcherEvent, FetcherRegistry};
use crate::model::{Snapshot, UserDirectory, build_user_directory};
use crate::remote::{RemoteList, RemoteTaskService};

/// Builds the remote service once credentials arrive in the CONFIG message.
pub type ServiceFactory =
    Box<dyn Fn(&CoordinatorConfig) -> Arc<dyn RemoteTaskService> + Send>;

/// Messages from the display consumer to the coordinator.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConsumerMessage {
    /// Initial configuration. Idempotent: ignored once started.
    Config { config: CoordinatorConfig },
    /// Consumer (re)connected; wants an immediate snapshot.
    Connected,
    /// Resolve display names to list IDs and ensure fetchers exist.
    AddLists { lists: Vec<String> },
    /// Resolve the user directory now.
    GetUsers,
}

/// Events broadcast from the coordinator to all display consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoordinatorEvent {
    /// Configuration complete, remote lists resolved.
    Started,
    /// CONFIG was rejected (invalid payload or list resolution failed).
    /// The consumer may send a corrected CONFIG.
    ConfigRejected { error: String },
    /// Aggregated snapshot of every tracked list's cache.
    Tasks { lists: Snapshot },
    /// User directory resolution result.
    Users { users: UserDirectory },
    /// A fetch failed. Best-effort and non-fatal; stale data stays up.
    FetchError {
        list_id: i64,
        code: u16,
        error: String,
    },
}

/// Capacity of the consumer-facing broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Per-process coordinator: registry, remote service handle, and resolved
/// list directory. Constructed once and driven by [`Coordinator::run`].
pub struct Coordinator {
    service_factory: ServiceFactory,
    inbox: mpsc::UnboundedReceiver<ConsumerMessage>,
    fetcher_rx: mpsc::UnboundedReceiver<FetcherEvent>,
    fetcher_tx: mpsc::UnboundedSender<FetcherEvent>,
    events_tx: broadcast::Sender<CoordinatorEvent>,
    config: Option<CoordinatorConfig>,
    service: Option<Arc<dyn RemoteTaskService>>,
    registry: Option<FetcherRegistry>,
    remote_lists: Vec<RemoteList>,
    users: UserDirectory,
    started: bool,
}

impl Coordinator {
    /// Create a coordinator and the sender half of its inbox.
    pub fn new(service_factory: ServiceFactory) -> (Self, mpsc::UnboundedSender<ConsumerMessage>) {
        let (inbox_tx, inbox) = mpsc::unbounded_channel();
        let (fetcher_tx, fetcher_rx) = mpsc::unbounded_channel();
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let coordinator = Self {
            service_factory,
            inbox,
            fetcher_rx,
            fetcher_tx,
            events_tx,
            config: None,
            service: None,
            registry: None,
            remote_lists: Vec::new(),
            users: UserDirectory::new(),
            started: false,
        };
        (coordinator, inbox_tx)
    }

    /// Convenience constructor for a pre-built service (tests, fixed
    /// credentials).
    pub fn with_service(
        service: Arc<dyn RemoteTaskService>,
    ) -> (Self, mpsc::UnboundedSender<ConsumerMessage>) {
        Self::new(Box::new(move |_| Arc::clone(&service)))
    }

    /// Subscribe to outbound events. Call before `run` to not miss the
    /// STARTED event.
    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.events_tx.subscribe()
    }

    /// Drive the coordinator until the consumer channel closes.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                message = self.inbox.recv() => match message {
                    Some(message) => self.handle_message(message).await,
                    None => {
                        info!("Consumer channel closed, coordinator stopping");
                        return;
                    }
                },
                Some(event) = self.fetcher_rx.recv() => self.handle_fetcher_event(event),
            }
        }
    }

    async fn handle_message(&mut self, message: ConsumerMessage) {
        match message {
            ConsumerMessage::Config { config } => self.handle_config(config).await,
            ConsumerMessage::Connected => self.broadcast_snapshot(),
            ConsumerMessage::AddLists { lists } => self.add_lists(&lists),
            ConsumerMessage::GetUsers => self.resolve_users().await,
        }
    }

    async fn handle_config(&mut self, config: CoordinatorConfig) {
        if self.started {
            debug!("Already configured, ignoring CONFIG");
            return;
        }

        let config = match config.validate() {
            Ok(config) => config,
            Err(e) => {
                error!(error = %e, "Rejecting invalid configuration");
                self.emit(CoordinatorEvent::ConfigRejected {
                    error: e.to_string(),
                });
                return;
            }
        };

        let service = (self.service_factory)(&config);
        match service.list_all_lists().await {
            Ok(lists) => {
                info!(count = lists.len(), "Resolved remote lists");
                self.remote_lists = lists;
            }
            Err(e) => {
                // Not started: the consumer may send CONFIG again.
                error!(error = %e, "Failed to resolve remote lists");
                self.emit(CoordinatorEvent::ConfigRejected {
                    error: e.to_string(),
                });
                return;
            }
        }

        self.registry = Some(FetcherRegistry::new(
            Arc::clone(&service),
            self.fetcher_tx.clone(),
        ));
        self.service = Some(service);
        self.config = Some(config);
        self.started = true;
        self.emit(CoordinatorEvent::Started);
    }

    /// Resolve display names against the remote list directory and ensure a
    /// fetcher per match. Unknown names are skipped, not fatal.
    fn add_lists(&mut self, names: &[String]) {
        let Some(config) = &self.config else {
            warn!("addLists before CONFIG, ignoring");
            return;
        };
        let Some(registry) = &mut self.registry else {
            return;
        };
        let reload_interval = config.reload_interval();

        for name in names {
            match self.remote_lists.iter().find(|l| &l.title == name) {
                Some(list) => registry.ensure_fetcher(list.id, &list.title, reload_interval),
                None => warn!(list = %name, "Requested list not found remotely, skipping"),
            }
        }
    }

    /// Rebuild the user directory on demand. A failure keeps the previous
    /// (possibly empty) directory; assignee display is best-effort.
    async fn resolve_users(&mut self) {
        let Some(service) = &self.service else {
            warn!("getUsers before CONFIG, ignoring");
            return;
        };

        match service.list_all_users().await {
            Ok(raw) => {
                self.users = build_user_directory(raw);
                self.emit(CoordinatorEvent::Users {
                    users: self.users.clone(),
                });
            }
            Err(e) => {
                warn!(error = %e, "User directory resolution failed, keeping previous");
            }
        }
    }

    fn handle_fetcher_event(&mut self, event: FetcherEvent) {
        match event {
            FetcherEvent::Received { .. } => self.broadcast_snapshot(),
            FetcherEvent::Error { list_id, error } => {
                self.emit(CoordinatorEvent::FetchError {
                    list_id,
                    code: error.code(),
                    error: error.to_string(),
                });
            }
        }
    }

    /// Aggregate all fetcher caches and broadcast the result. A no-op until
    /// configured.
    fn broadcast_snapshot(&self) {
        let Some(registry) = &self.registry else {
            debug!("CONNECTED before CONFIG, nothing to broadcast");
            return;
        };
        let snapshot: Snapshot = registry.snapshot();
        self.emit(CoordinatorEvent::Tasks { lists: snapshot });
    }

    fn emit(&self, event: CoordinatorEvent) {
        // Send only fails when no consumer is subscribed; broadcasts are
        // best-effort.
        let _ = self.events_tx.send(event);
    }
}
