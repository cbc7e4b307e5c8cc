//! Integration tests for the node view lifecycle.
//!
//! These drive a [`NodeController`] against an in-memory node service
//! and reference-data store: activation and teardown, the reconcile
//! loop, save flows with the optimistic edit-mode exit, and action
//! dispatch outcomes — all without a live region controller.
#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::sync::{Mutex, watch};

use rackview_core::model::{
    DomainRef, Node, OsCatalog, OsEntry, ReleaseEntry, ServiceStatus, SystemId, Zone, ZoneRef,
};
use rackview_core::store::{
    NodeService, RefDataKey, RefDataStore, RefDataUpdate, ServiceDirectory, SshKeySource,
    TagLookup,
};
use rackview_core::{
    ActionName, Collaborators, DispatchOutcome, EditableSection, Error, NodeController,
    PowerState, RouteKind,
};

// ── In-memory collaborators ─────────────────────────────────────────

struct FakeNodeService {
    template: Node,
    active: watch::Sender<Option<Arc<Node>>>,
    fail_activation: bool,
    fail_updates: AtomicBool,
    fail_actions: AtomicBool,
    activations: AtomicUsize,
    updates: Mutex<Vec<Node>>,
    dispatches: Mutex<Vec<(ActionName, serde_json::Value)>>,
}

impl FakeNodeService {
    fn new(template: Node) -> Arc<Self> {
        Self::build(template, false)
    }

    fn failing_activation(template: Node) -> Arc<Self> {
        Self::build(template, true)
    }

    fn build(template: Node, fail_activation: bool) -> Arc<Self> {
        let (active, _) = watch::channel(None);
        Arc::new(Self {
            template,
            active,
            fail_activation,
            fail_updates: AtomicBool::new(false),
            fail_actions: AtomicBool::new(false),
            activations: AtomicUsize::new(0),
            updates: Mutex::new(Vec::new()),
            dispatches: Mutex::new(Vec::new()),
        })
    }

    /// Replace the published node, as a region-side update would.
    fn publish(&self, node: Node) {
        self.active.send_replace(Some(Arc::new(node)));
    }
}

impl ServiceDirectory for FakeNodeService {
    fn service_status(&self, _id: u64) -> Option<ServiceStatus> {
        None
    }
}

#[async_trait]
impl NodeService for FakeNodeService {
    fn active_item(&self) -> Option<Arc<Node>> {
        self.active.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<Arc<Node>>> {
        self.active.subscribe()
    }

    async fn set_active_item(&self, id: &SystemId) -> Result<Arc<Node>, Error> {
        self.activations.fetch_add(1, Ordering::SeqCst);
        if self.fail_activation {
            return Err(Error::Dispatch("region unreachable".into()));
        }
        if *id != self.template.system_id {
            return Err(Error::NotFound(id.to_string()));
        }
        let node = Arc::new(self.template.clone());
        self.active.send_replace(Some(Arc::clone(&node)));
        Ok(node)
    }

    async fn update_item(&self, node: Node) -> Result<Arc<Node>, Error> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(Error::Dispatch("hostname already in use".into()));
        }
        self.updates.lock().await.push(node.clone());
        let node = Arc::new(node);
        self.active.send_replace(Some(Arc::clone(&node)));
        Ok(node)
    }

    async fn perform_action(
        &self,
        _node: &Node,
        action: ActionName,
        payload: serde_json::Value,
    ) -> Result<(), Error> {
        self.dispatches.lock().await.push((action, payload));
        if self.fail_actions.load(Ordering::SeqCst) {
            return Err(Error::Dispatch("action refused".into()));
        }
        Ok(())
    }

    async fn check_power_state(&self, _node: &Node) -> Result<PowerState, Error> {
        Ok(PowerState::On)
    }
}

struct NoTags;

#[async_trait]
impl TagLookup for NoTags {
    async fn autocomplete(&self, _query: &str) -> Result<Vec<rackview_core::model::Tag>, Error> {
        Ok(Vec::new())
    }
}

struct FixedKeys(usize);

impl SshKeySource for FixedKeys {
    fn ssh_key_count(&self) -> usize {
        self.0
    }
}

// ── Fixtures ────────────────────────────────────────────────────────

fn machine() -> Node {
    Node {
        system_id: "abc123".into(),
        hostname: "web-01".into(),
        fqdn: "web-01.maas".into(),
        architecture: "amd64/generic".into(),
        power_type: "ipmi".into(),
        node_type: 0,
        domain: DomainRef {
            id: 1,
            name: "maas".into(),
        },
        zone: ZoneRef {
            id: 1,
            name: "default".into(),
        },
        permissions: vec!["edit".into()],
        actions: vec![ActionName::Deploy, ActionName::Commission, ActionName::Delete],
        ..Node::default()
    }
}

fn collaborators(store: Arc<FakeNodeService>) -> (Collaborators, Arc<RefDataStore>) {
    let refdata = Arc::new(RefDataStore::new());
    refdata.apply(RefDataUpdate::Architectures(vec!["amd64/generic".into()]));
    refdata.apply(RefDataUpdate::Zones(vec![Zone {
        id: 1,
        name: "default".into(),
    }]));
    let collab = Collaborators {
        store,
        refdata: Arc::clone(&refdata),
        tags: Arc::new(NoTags),
        keys: Arc::new(FixedKeys(1)),
    };
    (collab, refdata)
}

async fn start_machine(store: Arc<FakeNodeService>) -> (NodeController, Arc<RefDataStore>) {
    let (collab, refdata) = collaborators(store);
    let controller = NodeController::start(collab, RouteKind::Machine, "abc123".into())
        .await
        .unwrap();
    (controller, refdata)
}

/// Poll the view until the predicate holds. The reconcile loop runs
/// on its own task, so assertions about propagated changes have to
/// wait for delivery.
async fn wait_for_view(
    controller: &NodeController,
    predicate: impl Fn(&rackview_core::NodeView) -> bool,
) {
    for _ in 0..200 {
        if controller.with_view(|view| predicate(view)).await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("view never reached the expected state");
}

// ── Lifecycle ───────────────────────────────────────────────────────

#[tokio::test]
async fn start_activates_and_stop_releases_the_polled_feeds() {
    let store = FakeNodeService::new(machine());
    let (controller, refdata) = start_machine(Arc::clone(&store)).await;

    assert_eq!(controller.type_label(), "Machine");
    for key in [
        RefDataKey::Architectures,
        RefDataKey::KernelOptions,
        RefDataKey::OsCatalog,
        RefDataKey::PowerTypes,
    ] {
        assert!(refdata.is_polling(key), "{key} should be polled while live");
    }
    controller
        .with_view(|view| assert_eq!(view.header.hostname, "web-01"))
        .await;

    controller.stop().await;
    for key in [
        RefDataKey::Architectures,
        RefDataKey::KernelOptions,
        RefDataKey::OsCatalog,
        RefDataKey::PowerTypes,
    ] {
        assert!(!refdata.is_polling(key), "{key} should stop with the view");
    }
}

#[tokio::test]
async fn failed_activation_still_releases_the_polled_feeds() {
    let store = FakeNodeService::failing_activation(machine());
    let (collab, refdata) = collaborators(store);

    let result = NodeController::start(collab, RouteKind::Machine, "abc123".into()).await;
    assert!(result.is_err());
    assert!(!refdata.is_polling(RefDataKey::Architectures));
    assert!(!refdata.is_polling(RefDataKey::PowerTypes));
}

#[tokio::test]
async fn start_reuses_a_matching_active_node_without_reactivating() {
    let store = FakeNodeService::new(machine());
    store.publish(machine());
    let (controller, _refdata) = start_machine(Arc::clone(&store)).await;

    assert_eq!(store.activations.load(Ordering::SeqCst), 0);
    controller
        .with_view(|view| assert_eq!(view.header.hostname, "web-01"))
        .await;
    controller.stop().await;
}

// ── Reconcile loop ──────────────────────────────────────────────────

#[tokio::test]
async fn node_replacement_propagates_to_viewing_sections() {
    let store = FakeNodeService::new(machine());
    let (controller, _refdata) = start_machine(Arc::clone(&store)).await;

    let mut renamed = machine();
    renamed.hostname = "web-02".into();
    store.publish(renamed);

    wait_for_view(&controller, |view| view.header.hostname == "web-02").await;
    controller.stop().await;
}

#[tokio::test]
async fn updates_published_right_after_start_are_not_lost() {
    let store = FakeNodeService::new(machine());
    let (controller, refdata) = start_machine(Arc::clone(&store)).await;

    // No awaits between start() returning and these publishes, so the
    // background loop has not polled yet. Both channels must have been
    // subscribed during start() for the changes to be seen at all.
    let mut renamed = machine();
    renamed.hostname = "web-02".into();
    store.publish(renamed);
    refdata.apply(RefDataUpdate::Architectures(vec!["arm64/generic".into()]));

    wait_for_view(&controller, |view| view.header.hostname == "web-02").await;
    wait_for_view(&controller, |view| view.summary.editing).await;
    controller.stop().await;
}

#[tokio::test]
async fn node_replacement_leaves_editing_sections_alone() {
    let store = FakeNodeService::new(machine());
    let (controller, _refdata) = start_machine(Arc::clone(&store)).await;

    controller.enter_edit(EditableSection::Header).await;
    controller
        .update_view(|view| view.header.hostname = "half-typed".into())
        .await;

    let mut renamed = machine();
    renamed.hostname = "web-02".into();
    renamed.events = vec![rackview_core::model::NodeEvent {
        id: 1,
        created: chrono::Utc::now(),
        type_description: "Node changed status".into(),
        description: String::new(),
    }];
    store.publish(renamed);

    // The non-editing events section picks the replacement up; the
    // header edit buffer must survive the same pass.
    wait_for_view(&controller, |view| view.events.events.len() == 1).await;
    controller
        .with_view(|view| {
            assert!(view.header.editing);
            assert_eq!(view.header.hostname, "half-typed");
        })
        .await;
    controller.stop().await;
}

#[tokio::test]
async fn reference_data_changes_reach_dependent_sections() {
    let store = FakeNodeService::new(machine());
    let (controller, refdata) = start_machine(Arc::clone(&store)).await;

    // Drop the node's architecture from the catalog: the summary's
    // force-edit rule must engage once the change propagates.
    refdata.apply(RefDataUpdate::Architectures(vec!["arm64/generic".into()]));

    wait_for_view(&controller, |view| view.summary.editing).await;
    controller.stop().await;
}

// ── Saves ───────────────────────────────────────────────────────────

#[tokio::test]
async fn save_header_submits_a_modified_copy_and_exits_editing() {
    let store = FakeNodeService::new(machine());
    let (controller, _refdata) = start_machine(Arc::clone(&store)).await;

    controller.enter_edit(EditableSection::Header).await;
    controller
        .update_view(|view| view.header.hostname = "web-09".into())
        .await;
    controller.save_header().await.unwrap();

    let updates = store.updates.lock().await;
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].hostname, "web-09");
    drop(updates);

    controller
        .with_view(|view| {
            assert!(!view.header.editing);
            assert_eq!(view.header.error, None);
        })
        .await;
    controller.stop().await;
}

#[tokio::test]
async fn invalid_hostname_blocks_the_save_locally() {
    let store = FakeNodeService::new(machine());
    let (controller, _refdata) = start_machine(Arc::clone(&store)).await;

    controller.enter_edit(EditableSection::Header).await;
    controller
        .update_view(|view| view.header.hostname = "-bad-label-".into())
        .await;

    let result = controller.save_header().await;
    assert!(matches!(result, Err(Error::LocalValidation(_))));
    assert!(store.updates.lock().await.is_empty());
    controller
        .with_view(|view| assert!(view.header.editing, "local-invalid keeps editing"))
        .await;
    controller.stop().await;
}

#[tokio::test]
async fn rejected_save_records_the_error_without_reopening_edit_mode() {
    let store = FakeNodeService::new(machine());
    store.fail_updates.store(true, Ordering::SeqCst);
    let (controller, _refdata) = start_machine(Arc::clone(&store)).await;

    controller.enter_edit(EditableSection::Header).await;
    controller
        .update_view(|view| view.header.hostname = "web-09".into())
        .await;

    let result = controller.save_header().await;
    assert!(matches!(result, Err(Error::Dispatch(_))));
    controller
        .with_view(|view| {
            assert!(!view.header.editing, "the optimistic exit stands");
            assert_eq!(
                view.header.error.as_deref(),
                Some("dispatch failed: hostname already in use")
            );
        })
        .await;
    controller.stop().await;
}

#[tokio::test]
async fn save_summary_carries_zone_architecture_kernel_and_tags() {
    let store = FakeNodeService::new(machine());
    let (controller, _refdata) = start_machine(Arc::clone(&store)).await;

    controller.enter_edit(EditableSection::Summary).await;
    controller
        .update_view(|view| {
            view.summary.min_hwe_kernel = "hwe-24.04".into();
            view.summary.tags = vec!["virtual".into(), "gpu".into()];
        })
        .await;
    controller.save_summary().await.unwrap();

    let updates = store.updates.lock().await;
    assert_eq!(updates[0].min_hwe_kernel, "hwe-24.04");
    assert_eq!(updates[0].tags, vec!["virtual".to_owned(), "gpu".to_owned()]);
    assert_eq!(updates[0].zone.name, "default");
    controller.stop().await;
}

// ── Actions ─────────────────────────────────────────────────────────

fn ubuntu_catalog() -> OsCatalog {
    OsCatalog {
        osystems: vec![OsEntry {
            name: "ubuntu".into(),
            title: "Ubuntu".into(),
        }],
        releases: vec![ReleaseEntry {
            key: "ubuntu/noble".into(),
            title: "Ubuntu 24.04 LTS".into(),
        }],
        default_osystem: Some("ubuntu".into()),
        default_release: Some("noble".into()),
    }
}

#[tokio::test]
async fn deploy_dispatch_sends_the_built_payload_and_completes() {
    let store = FakeNodeService::new(machine());
    let (controller, refdata) = start_machine(Arc::clone(&store)).await;
    refdata.apply(RefDataUpdate::OsCatalog(ubuntu_catalog()));

    controller.select_action(Some(ActionName::Deploy)).await;
    controller
        .update_view(|view| {
            view.action.deploy.osystem = "ubuntu".into();
            view.action.deploy.release = "ubuntu/noble".into();
        })
        .await;

    let outcome = controller.take_action().await.unwrap();
    assert_eq!(outcome, DispatchOutcome::Completed);

    let dispatches = store.dispatches.lock().await;
    assert_eq!(dispatches.len(), 1);
    assert_eq!(dispatches[0].0, ActionName::Deploy);
    assert_eq!(dispatches[0].1["osystem"], json!("ubuntu"));
    assert_eq!(dispatches[0].1["distro_series"], json!("noble"));
    drop(dispatches);

    controller
        .with_view(|view| assert_eq!(view.action.option, None))
        .await;
    controller.stop().await;
}

#[tokio::test]
async fn deploy_without_a_loaded_catalog_is_refused_before_dispatch() {
    let store = FakeNodeService::new(machine());
    let (controller, _refdata) = start_machine(Arc::clone(&store)).await;

    controller.select_action(Some(ActionName::Deploy)).await;
    let result = controller.take_action().await;
    assert!(matches!(result, Err(Error::DataUnavailable(_))));
    assert!(store.dispatches.lock().await.is_empty());
    controller.stop().await;
}

#[tokio::test]
async fn delete_success_asks_the_caller_to_navigate_away() {
    let store = FakeNodeService::new(machine());
    let (controller, _refdata) = start_machine(Arc::clone(&store)).await;

    controller.select_action(Some(ActionName::Delete)).await;
    let outcome = controller.take_action().await.unwrap();
    assert_eq!(outcome, DispatchOutcome::NavigateAway);
    controller.stop().await;
}

#[tokio::test]
async fn failed_dispatch_keeps_the_selection_and_stores_the_detail() {
    let store = FakeNodeService::new(machine());
    store.fail_actions.store(true, Ordering::SeqCst);
    let (controller, _refdata) = start_machine(Arc::clone(&store)).await;

    controller.select_action(Some(ActionName::Commission)).await;
    controller
        .update_view(|view| view.action.commission.enable_ssh = true)
        .await;

    let outcome = controller.take_action().await.unwrap();
    assert_eq!(outcome, DispatchOutcome::Failed);
    controller
        .with_view(|view| {
            assert_eq!(view.action.option, Some(ActionName::Commission));
            assert!(view.action.commission.enable_ssh, "transients survive");
            assert!(view.action.error.is_some());
        })
        .await;
    controller.stop().await;
}

#[tokio::test]
async fn take_action_without_a_selection_is_a_local_error() {
    let store = FakeNodeService::new(machine());
    let (controller, _refdata) = start_machine(Arc::clone(&store)).await;

    let result = controller.take_action().await;
    assert!(matches!(result, Err(Error::LocalValidation(_))));
    assert!(store.dispatches.lock().await.is_empty());
    controller.stop().await;
}

// ── Ancillary operations ────────────────────────────────────────────

#[tokio::test]
async fn check_power_reports_the_bmc_state() {
    let store = FakeNodeService::new(machine());
    let (controller, _refdata) = start_machine(Arc::clone(&store)).await;

    assert_eq!(controller.check_power().await.unwrap(), PowerState::On);
    controller.stop().await;
}

#[tokio::test]
async fn deploy_warnings_track_the_catalog_and_key_count() {
    let store = FakeNodeService::new(machine());
    let (controller, _refdata) = start_machine(Arc::clone(&store)).await;

    controller.select_action(Some(ActionName::Deploy)).await;
    // The fixture catalog has no operating systems loaded.
    assert!(controller.deploy_blocked().await);
    // One registered key, so no missing-key warning.
    assert!(!controller.ssh_key_missing().await);
    controller.stop().await;
}
