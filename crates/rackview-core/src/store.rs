// ── Collaborator seams and the reference-data store ──
//
// The node service, tag lookup, and SSH key source are external
// collaborators consumed through traits. Reference data lives in a
// concrete reactive store: transports feed it with `apply()`, the
// lifecycle controller subscribes and drives polling bookkeeping.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{broadcast, watch};

use crate::action::ActionName;
use crate::deps::{Dep, DepSet};
use crate::error::Error;
use crate::model::refdata::{Domain, KernelOption, OsCatalog, PowerType, RefData, Script, Zone};
use crate::model::{Node, PowerState, ServiceStatus, SystemId, Tag};

const CHANGE_CHANNEL_SIZE: usize = 64;

// ── Node service ────────────────────────────────────────────────────

/// Synchronous lookup of controller service statuses.
///
/// Split out of [`NodeService`] so the reconciliation pass can consume
/// it without an async context.
pub trait ServiceDirectory {
    fn service_status(&self, id: u64) -> Option<ServiceStatus>;
}

/// The external, authoritative store for the managed entity.
///
/// One implementation exists per node-type variant (machine, device,
/// controller managers); the lifecycle controller resolves which one
/// to talk to from the route discriminant.
#[async_trait]
pub trait NodeService: ServiceDirectory + Send + Sync {
    /// The currently active node, if any.
    fn active_item(&self) -> Option<Arc<Node>>;

    /// Subscribe to replacement of the active node.
    fn subscribe(&self) -> watch::Receiver<Option<Arc<Node>>>;

    /// Activate the node with the given system id and wait for it.
    async fn set_active_item(&self, id: &SystemId) -> Result<Arc<Node>, Error>;

    /// Submit a modified copy of the node.
    async fn update_item(&self, node: Node) -> Result<Arc<Node>, Error>;

    /// Submit a named action with its payload.
    async fn perform_action(
        &self,
        node: &Node,
        action: ActionName,
        payload: serde_json::Value,
    ) -> Result<(), Error>;

    /// Ask the BMC for the node's current power state.
    async fn check_power_state(&self, node: &Node) -> Result<PowerState, Error>;
}

/// A [`ServiceDirectory`] that knows no services. For node services
/// backing machines and devices, which carry none.
pub struct NoServices;

impl ServiceDirectory for NoServices {
    fn service_status(&self, _id: u64) -> Option<ServiceStatus> {
        None
    }
}

// ── Ancillary collaborators ─────────────────────────────────────────

/// Tag autocomplete backed by the tag catalog.
#[async_trait]
pub trait TagLookup: Send + Sync {
    async fn autocomplete(&self, query: &str) -> Result<Vec<Tag>, Error>;
}

/// The acting user's registered SSH credentials.
pub trait SshKeySource: Send + Sync {
    fn ssh_key_count(&self) -> usize;
}

// ── Reference-data store ────────────────────────────────────────────

/// Identifies one polled reference-data collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum RefDataKey {
    Architectures,
    KernelOptions,
    OsCatalog,
    PowerTypes,
    Zones,
    Domains,
    Scripts,
}

impl RefDataKey {
    pub fn dep(self) -> Dep {
        match self {
            Self::Architectures => Dep::Architectures,
            Self::KernelOptions => Dep::KernelOptions,
            Self::OsCatalog => Dep::OsCatalog,
            Self::PowerTypes => Dep::PowerTypes,
            Self::Zones => Dep::Zones,
            Self::Domains => Dep::Domains,
            Self::Scripts => Dep::Scripts,
        }
    }
}

/// A replacement for one reference-data collection.
#[derive(Debug, Clone)]
pub enum RefDataUpdate {
    Architectures(Vec<String>),
    KernelOptions(Vec<KernelOption>),
    OsCatalog(OsCatalog),
    PowerTypes(Vec<PowerType>),
    Zones(Vec<Zone>),
    Domains(Vec<Domain>),
    Scripts(Vec<Script>),
}

impl RefDataUpdate {
    pub fn key(&self) -> RefDataKey {
        match self {
            Self::Architectures(_) => RefDataKey::Architectures,
            Self::KernelOptions(_) => RefDataKey::KernelOptions,
            Self::OsCatalog(_) => RefDataKey::OsCatalog,
            Self::PowerTypes(_) => RefDataKey::PowerTypes,
            Self::Zones(_) => RefDataKey::Zones,
            Self::Domains(_) => RefDataKey::Domains,
            Self::Scripts(_) => RefDataKey::Scripts,
        }
    }
}

/// Reactive store for polled reference-data snapshots.
///
/// Holds one [`RefData`] snapshot behind a `watch` channel and
/// broadcasts which collection changed so the reconcile loop can map
/// updates onto the dependency graph. Polling is reference counted:
/// several live views may poll the same feed.
pub struct RefDataStore {
    data: watch::Sender<Arc<RefData>>,
    changes: broadcast::Sender<RefDataKey>,
    polling: Mutex<HashMap<RefDataKey, usize>>,
}

impl RefDataStore {
    pub fn new() -> Self {
        let (data, _) = watch::channel(Arc::new(RefData::default()));
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_SIZE);
        Self {
            data,
            changes,
            polling: Mutex::new(HashMap::new()),
        }
    }

    /// Current snapshot (cheap `Arc` clone).
    pub fn snapshot(&self) -> Arc<RefData> {
        self.data.borrow().clone()
    }

    /// Subscribe to snapshot replacement.
    pub fn subscribe(&self) -> watch::Receiver<Arc<RefData>> {
        self.data.subscribe()
    }

    /// Subscribe to per-collection change notices.
    pub fn subscribe_changes(&self) -> broadcast::Receiver<RefDataKey> {
        self.changes.subscribe()
    }

    /// Replace one collection and notify subscribers.
    pub fn apply(&self, update: RefDataUpdate) {
        let key = update.key();
        self.data.send_modify(|snapshot| {
            let mut next = RefData::clone(snapshot);
            match update {
                RefDataUpdate::Architectures(v) => next.architectures = v,
                RefDataUpdate::KernelOptions(v) => next.kernel_options = v,
                RefDataUpdate::OsCatalog(v) => next.os_catalog = v,
                RefDataUpdate::PowerTypes(v) => next.power_types = v,
                RefDataUpdate::Zones(v) => next.zones = v,
                RefDataUpdate::Domains(v) => next.domains = v,
                RefDataUpdate::Scripts(v) => next.scripts = v,
            }
            *snapshot = Arc::new(next);
        });
        let _ = self.changes.send(key);
    }

    // ── Polling bookkeeping ──────────────────────────────────────

    /// Mark a feed as polled by one more consumer.
    pub fn start_polling(&self, key: RefDataKey) {
        let mut polling = self.polling.lock().unwrap_or_else(|e| e.into_inner());
        *polling.entry(key).or_insert(0) += 1;
        tracing::debug!(feed = %key, "reference-data polling started");
    }

    /// Release one consumer's interest in a feed.
    pub fn stop_polling(&self, key: RefDataKey) {
        let mut polling = self.polling.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(count) = polling.get_mut(&key) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                polling.remove(&key);
            }
        }
        tracing::debug!(feed = %key, "reference-data polling stopped");
    }

    /// Whether any consumer currently polls the feed. Transports use
    /// this to decide which collections to keep refreshing.
    pub fn is_polling(&self, key: RefDataKey) -> bool {
        self.polling
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(&key)
    }
}

impl Default for RefDataStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a reference-data change notice onto the dependency graph.
pub fn refdata_change_set(key: RefDataKey) -> DepSet {
    DepSet::of(key.dep())
}
