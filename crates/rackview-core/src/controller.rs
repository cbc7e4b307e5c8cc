// ── Node view lifecycle ──
//
// Resolves the node-type-specific manager, activates the requested
// node, keeps the section view-models reconciled against node and
// reference-data changes, and routes saves and actions to the node
// service. Teardown cancels the reconcile loop and stops all polled
// feeds unconditionally — even when activation never succeeded.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::action::ActionName;
use crate::deps::{Dep, DepSet};
use crate::error::Error;
use crate::model::{DomainRef, Node, PowerState, SystemId, Tag, ZoneRef};
use crate::sections::{EditableSection, NodeView, ReconcileCtx};
use crate::store::{
    NodeService, RefDataKey, RefDataStore, SshKeySource, TagLookup, refdata_change_set,
};

/// The four feeds that change independently of the node and must stay
/// current for as long as the view is live.
const POLLED_FEEDS: [RefDataKey; 4] = [
    RefDataKey::Architectures,
    RefDataKey::KernelOptions,
    RefDataKey::OsCatalog,
    RefDataKey::PowerTypes,
];

// ── RouteKind ───────────────────────────────────────────────────────

/// Node-type discriminant supplied by the route. Unrecognized values
/// fall back to the machine manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Machine,
    Device,
    Controller,
}

impl RouteKind {
    pub fn from_discriminant(discriminant: &str) -> Self {
        match discriminant {
            "controller" => Self::Controller,
            "device" => Self::Device,
            _ => Self::Machine,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Machine => "Machine",
            Self::Device => "Device",
            Self::Controller => "Controller",
        }
    }
}

// ── Collaborators ───────────────────────────────────────────────────

/// External collaborators the view consumes. The node service is the
/// manager variant resolved for the route's node type.
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn NodeService>,
    pub refdata: Arc<RefDataStore>,
    pub tags: Arc<dyn TagLookup>,
    pub keys: Arc<dyn SshKeySource>,
}

/// What the UI should do after an action dispatch resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Completed,
    /// The node was deleted; the view no longer has a subject.
    NavigateAway,
    /// The dispatch failed; the detail is on `action.error`.
    Failed,
}

// ── NodeController ──────────────────────────────────────────────────

/// Lifecycle controller for one node view.
///
/// Cheaply cloneable via `Arc`. [`start()`](Self::start) activates the
/// node and spawns the reconcile loop; [`stop()`](Self::stop) tears
/// both down along with the polled feeds.
#[derive(Clone)]
pub struct NodeController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    collab: Collaborators,
    view: Mutex<NodeView>,
    route: RouteKind,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
    polls_stopped: AtomicBool,
}

impl NodeController {
    /// Start a node view: begin polling the independent feeds, resolve
    /// the active node (reusing a matching active item, otherwise
    /// activating by id), run the initial reconciliation, and spawn
    /// the reconcile loop.
    pub async fn start(
        collab: Collaborators,
        route: RouteKind,
        id: SystemId,
    ) -> Result<Self, Error> {
        // Polls begin before activation so teardown semantics are
        // uniform: stop() and the failure path below both stop them.
        for key in POLLED_FEEDS {
            collab.refdata.start_polling(key);
        }

        let already_active = collab
            .store
            .active_item()
            .filter(|node| node.system_id == id);
        let node = match already_active {
            Some(node) => node,
            None => match collab.store.set_active_item(&id).await {
                Ok(node) => node,
                Err(e) => {
                    for key in POLLED_FEEDS {
                        collab.refdata.stop_polling(key);
                    }
                    warn!(system_id = %id, error = %e, "node activation failed");
                    return Err(e);
                }
            },
        };
        info!(system_id = %node.system_id, kind = route.label(), "node view started");

        // Subscriptions are taken before the first reconcile so an
        // update landing in between is observed, not marked as seen.
        let node_rx = collab.store.subscribe();
        let changes = collab.refdata.subscribe_changes();

        let controller = Self {
            inner: Arc::new(ControllerInner {
                collab,
                view: Mutex::new(NodeView::new()),
                route,
                cancel: CancellationToken::new(),
                task: Mutex::new(None),
                polls_stopped: AtomicBool::new(false),
            }),
        };

        controller.inner.reconcile(DepSet::all()).await;

        let inner = Arc::clone(&controller.inner);
        let cancel = controller.inner.cancel.clone();
        let task = tokio::spawn(reconcile_task(inner, cancel, node_rx, changes));
        *controller.inner.task.lock().await = Some(task);

        Ok(controller)
    }

    /// Tear the view down: cancel the reconcile loop and stop all
    /// polled feeds. Safe to call more than once.
    pub async fn stop(&self) {
        self.inner.cancel.cancel();
        self.inner.stop_polls();
        if let Some(task) = self.inner.task.lock().await.take() {
            let _ = task.await;
        }
        debug!("node view stopped");
    }

    /// Human-readable label for the resolved node type.
    pub fn type_label(&self) -> &'static str {
        self.inner.route.label()
    }

    // ── View access ──────────────────────────────────────────────

    /// Read the current view-model state.
    pub async fn with_view<R>(&self, f: impl FnOnce(&NodeView) -> R) -> R {
        let view = self.inner.view.lock().await;
        f(&view)
    }

    /// Mutate edit buffers and transient selections. The per-section
    /// `editing` flags are the only guard; all mutation happens on the
    /// single logical thread.
    pub async fn update_view<R>(&self, f: impl FnOnce(&mut NodeView) -> R) -> R {
        let mut view = self.inner.view.lock().await;
        f(&mut view)
    }

    // ── Edit-mode guard ──────────────────────────────────────────

    pub async fn enter_edit(&self, section: EditableSection) {
        let Some(node) = self.inner.collab.store.active_item() else {
            return;
        };
        let refs = self.inner.collab.refdata.snapshot();
        let mut view = self.inner.view.lock().await;
        let ctx = ReconcileCtx {
            node: &node,
            refs: &refs,
            services: self.inner.collab.store.as_ref(),
        };
        view.enter_edit(section, &ctx);
    }

    pub async fn cancel_edit(&self, section: EditableSection) {
        let Some(node) = self.inner.collab.store.active_item() else {
            return;
        };
        let refs = self.inner.collab.refdata.snapshot();
        let mut view = self.inner.view.lock().await;
        let ctx = ReconcileCtx {
            node: &node,
            refs: &refs,
            services: self.inner.collab.store.as_ref(),
        };
        view.cancel_edit(section, &ctx);
    }

    // ── Saves ────────────────────────────────────────────────────

    /// Save the header section. Local-invalid blocks the save and
    /// leaves the section editing; local-valid exits edit mode
    /// optimistically before submitting. A submission failure does
    /// not reopen the guard but keeps the detail on the section.
    pub async fn save_header(&self) -> Result<(), Error> {
        let node = self.active_node()?;
        let updated = {
            let mut view = self.inner.view.lock().await;
            view.header.validate()?;
            view.header.editing = false;
            let mut copy = Node::clone(&node);
            copy.hostname.clone_from(&view.header.hostname);
            if let Some(domain) = &view.header.domain {
                copy.domain = DomainRef {
                    id: domain.id,
                    name: domain.name.clone(),
                };
            }
            copy
        };
        self.submit(updated, EditableSection::Header).await
    }

    /// Save the summary section (zone, architecture, kernel, tags).
    pub async fn save_summary(&self) -> Result<(), Error> {
        let node = self.active_node()?;
        let refs = self.inner.collab.refdata.snapshot();
        let updated = {
            let mut view = self.inner.view.lock().await;
            view.summary.validate(&refs)?;
            view.summary.editing = false;
            let mut copy = Node::clone(&node);
            copy.architecture.clone_from(&view.summary.architecture);
            copy.min_hwe_kernel.clone_from(&view.summary.min_hwe_kernel);
            copy.tags.clone_from(&view.summary.tags);
            if let Some(zone) = &view.summary.zone {
                copy.zone = ZoneRef {
                    id: zone.id,
                    name: zone.name.clone(),
                };
            }
            copy
        };
        self.submit(updated, EditableSection::Summary).await
    }

    /// Save the power section (driver and parameters).
    pub async fn save_power(&self) -> Result<(), Error> {
        let node = self.active_node()?;
        let updated = {
            let mut view = self.inner.view.lock().await;
            view.power.validate()?;
            view.power.editing = false;
            let mut copy = Node::clone(&node);
            if let Some(power_type) = &view.power.power_type {
                copy.power_type.clone_from(&power_type.name);
            }
            copy.power_parameters = serde_json::Value::Object(view.power.parameters.clone());
            copy
        };
        self.submit(updated, EditableSection::Power).await
    }

    // ── Actions ──────────────────────────────────────────────────

    /// Choose (or clear) the pending action.
    pub async fn select_action(&self, option: Option<ActionName>) {
        let refs = self.inner.collab.refdata.snapshot();
        let mut view = self.inner.view.lock().await;
        view.action.select(option, &refs);
    }

    /// Dispatch the chosen action against the node. A deploy with no
    /// OS catalog loaded is refused before anything is submitted.
    pub async fn take_action(&self) -> Result<DispatchOutcome, Error> {
        let node = self.active_node()?;
        let refs = self.inner.collab.refdata.snapshot();
        let (name, payload) = {
            let view = self.inner.view.lock().await;
            let Some(name) = view.action.option else {
                return Err(Error::LocalValidation("no action selected".into()));
            };
            if view.action.deploy_blocked(&refs) {
                return Err(Error::DataUnavailable("operating system catalog"));
            }
            (name, view.action.build_payload())
        };

        let result = self
            .inner
            .collab
            .store
            .perform_action(&node, name, payload)
            .await;

        // A late response after teardown must not touch the view.
        if self.inner.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        match result {
            Ok(()) => {
                let mut view = self.inner.view.lock().await;
                view.action.handle_success();
                if name == ActionName::Delete {
                    info!(system_id = %node.system_id, "node deleted, leaving view");
                    Ok(DispatchOutcome::NavigateAway)
                } else {
                    Ok(DispatchOutcome::Completed)
                }
            }
            Err(e) => {
                warn!(action = %name, error = %e, "action dispatch failed");
                let mut view = self.inner.view.lock().await;
                view.action.handle_failure(e.to_string());
                Ok(DispatchOutcome::Failed)
            }
        }
    }

    /// Whether deploy is pending but blocked on an unloaded OS
    /// catalog.
    pub async fn deploy_blocked(&self) -> bool {
        let refs = self.inner.collab.refdata.snapshot();
        let view = self.inner.view.lock().await;
        view.action.deploy_blocked(&refs)
    }

    /// Whether deploy is pending and the user has no SSH keys.
    pub async fn ssh_key_missing(&self) -> bool {
        let count = self.inner.collab.keys.ssh_key_count();
        let view = self.inner.view.lock().await;
        view.action.ssh_key_missing(count)
    }

    // ── Ancillary operations ─────────────────────────────────────

    /// Ask the BMC for the node's current power state.
    pub async fn check_power(&self) -> Result<PowerState, Error> {
        let node = self.active_node()?;
        match self.inner.collab.store.check_power_state(&node).await {
            Ok(state) => Ok(state),
            Err(e) => {
                warn!(system_id = %node.system_id, error = %e, "power check failed");
                Err(e)
            }
        }
    }

    /// Tag autocomplete for the summary editor.
    pub async fn tag_suggestions(&self, query: &str) -> Result<Vec<Tag>, Error> {
        self.inner.collab.tags.autocomplete(query).await
    }

    /// Re-derive the services section after an out-of-band service
    /// status change.
    pub async fn notify_services_changed(&self) {
        self.inner.reconcile(DepSet::of(Dep::Services)).await;
    }

    // ── Helpers ──────────────────────────────────────────────────

    fn active_node(&self) -> Result<Arc<Node>, Error> {
        self.inner
            .collab
            .store
            .active_item()
            .ok_or(Error::NoActiveNode)
    }

    /// Submit a modified node copy for a section save. The guard has
    /// already exited optimistically; a failure records the detail on
    /// the section without reopening edit mode.
    async fn submit(&self, updated: Node, section: EditableSection) -> Result<(), Error> {
        let result = self.inner.collab.store.update_item(updated).await;

        if self.inner.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let mut view = self.inner.view.lock().await;
        let slot = match section {
            EditableSection::Header => &mut view.header.error,
            EditableSection::Summary => &mut view.summary.error,
            EditableSection::Power => &mut view.power.error,
        };
        match result {
            Ok(_) => {
                *slot = None;
                Ok(())
            }
            Err(e) => {
                warn!(section = ?section, error = %e, "node save failed");
                *slot = Some(e.to_string());
                Err(e)
            }
        }
    }
}

impl ControllerInner {
    /// One reconciliation pass against the current node and
    /// reference-data snapshots.
    async fn reconcile(&self, changed: DepSet) {
        let Some(node) = self.collab.store.active_item() else {
            return;
        };
        let refs = self.collab.refdata.snapshot();
        let mut view = self.view.lock().await;
        let ctx = ReconcileCtx {
            node: &node,
            refs: &refs,
            services: self.collab.store.as_ref(),
        };
        view.reconcile(changed, &ctx);
    }

    fn stop_polls(&self) {
        if self.polls_stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        for key in POLLED_FEEDS {
            self.collab.refdata.stop_polling(key);
        }
    }
}

/// Reconcile loop: map every node replacement and reference-data
/// change notice onto the dependency graph until cancelled.
async fn reconcile_task(
    inner: Arc<ControllerInner>,
    cancel: CancellationToken,
    mut node_rx: watch::Receiver<Option<Arc<Node>>>,
    mut changes: broadcast::Receiver<RefDataKey>,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            changed = node_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                inner.reconcile(DepSet::of(Dep::Node)).await;
            }
            notice = changes.recv() => {
                use tokio::sync::broadcast::error::RecvError;
                match notice {
                    Ok(key) => inner.reconcile(refdata_change_set(key)).await,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "reconcile loop lagged, recomputing everything");
                        inner.reconcile(DepSet::all()).await;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }
    debug!("reconcile loop shut down");
}
