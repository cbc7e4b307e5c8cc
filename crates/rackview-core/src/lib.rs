//! Reactive view layer for a managed node's details page.
//!
//! This crate owns the section view-models, change propagation, and
//! lifecycle management behind a node details view:
//!
//! - **[`NodeController`]** — Lifecycle facade:
//!   [`start()`](NodeController::start) resolves the manager for the
//!   route's node type, activates the node, starts the polled
//!   reference-data feeds, and spawns the reconcile loop;
//!   [`stop()`](NodeController::stop) tears everything down.
//!
//! - **[`NodeView`]** — The per-section view-models (header, summary,
//!   power, services, output, devices, events, action) plus the change
//!   propagator that recomputes only the sections whose declared
//!   dependencies intersect what changed. Sections in edit mode guard
//!   their selection fields against refresh.
//!
//! - **[`RefDataStore`]** — Reactive reference-data storage built on
//!   `tokio::sync::watch` snapshots plus a `broadcast` change-notice
//!   channel, with refcounted polling per feed.
//!
//! - **[`ActionSelection`]** — The per-node-type action catalog and
//!   the option payload builders (deploy, commission, test, release).
//!
//! - **Domain model** ([`model`]) — The node projection
//!   ([`Node`]) and the reference-data catalog ([`RefData`]).

pub mod action;
pub mod controller;
pub mod deps;
pub mod error;
pub mod model;
pub mod sections;
pub mod store;
pub mod text;

// ── Primary re-exports ──────────────────────────────────────────────
pub use action::{
    ActionName, ActionSelection, CommissionOptions, DeployOptions, ReleaseOptions, ScriptOptions,
    ScriptSelection,
};
pub use controller::{Collaborators, DispatchOutcome, NodeController, RouteKind};
pub use deps::{Dep, DepSet};
pub use error::Error;
pub use sections::{EditableSection, NodeView, ReconcileCtx};
pub use store::{NodeService, RefDataKey, RefDataStore, ServiceDirectory, SshKeySource, TagLookup};

// Re-export model types at the crate root for ergonomics.
pub use model::{Node, NodeKind, PowerState, RefData, SystemId};
