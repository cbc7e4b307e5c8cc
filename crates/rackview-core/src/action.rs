// ── Action selection and dispatch payloads ──
//
// The action picker: which actions the server allows on this node,
// which one the user chose, the action-specific payload to submit,
// and the interpretation of success/failure into UI-visible state.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::deps::{Dep, DepSet};
use crate::model::{Node, NodeKind, RefData, Script, ScriptType};

/// Script-list sentinel meaning "run none". An empty list would be
/// read by the receiver as "run the default set", which is a
/// different request entirely.
const RUN_NONE: &str = "none";

// ── ActionName ──────────────────────────────────────────────────────

/// A named operation submittable against a node.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ActionName {
    Commission,
    Acquire,
    Deploy,
    Release,
    Abort,
    Test,
    RescueMode,
    ExitRescueMode,
    MarkBroken,
    MarkFixed,
    OverrideFailedTesting,
    Lock,
    Unlock,
    On,
    Off,
    SetZone,
    ImportImages,
    Delete,
}

const MACHINE_ACTIONS: &[ActionName] = &[
    ActionName::Commission,
    ActionName::Acquire,
    ActionName::Deploy,
    ActionName::Release,
    ActionName::Abort,
    ActionName::Test,
    ActionName::RescueMode,
    ActionName::ExitRescueMode,
    ActionName::MarkBroken,
    ActionName::MarkFixed,
    ActionName::OverrideFailedTesting,
    ActionName::Lock,
    ActionName::Unlock,
    ActionName::On,
    ActionName::Off,
    ActionName::SetZone,
    ActionName::Delete,
];

const DEVICE_ACTIONS: &[ActionName] = &[ActionName::SetZone, ActionName::Delete];

const CONTROLLER_ACTIONS: &[ActionName] = &[
    ActionName::ImportImages,
    ActionName::Test,
    ActionName::OverrideFailedTesting,
    ActionName::On,
    ActionName::Off,
    ActionName::SetZone,
    ActionName::Delete,
];

/// Zone changes are handled by a dedicated picker elsewhere in the
/// UI, never through the action dropdown.
const EXCLUDED: &[ActionName] = &[ActionName::SetZone];

/// Full action catalog for a node kind. `None` (an out-of-range
/// node-type code) gets no actions — the upstream system treats such
/// values the same way, so this is a preserved fallback.
pub fn catalog(kind: Option<NodeKind>) -> &'static [ActionName] {
    match kind {
        Some(NodeKind::Machine) => MACHINE_ACTIONS,
        Some(NodeKind::Device) => DEVICE_ACTIONS,
        Some(
            NodeKind::RackController
            | NodeKind::RegionController
            | NodeKind::RegionAndRackController,
        ) => CONTROLLER_ACTIONS,
        None => &[],
    }
}

// ── Transient per-action state ──────────────────────────────────────

/// Deploy picks. `release` is the catalog key `<os>/<release>`; only
/// the trailing release segment is submitted.
#[derive(Debug, Clone, Default)]
pub struct DeployOptions {
    pub osystem: String,
    pub release: String,
    /// Optional kernel hint; submitted only when it matches a
    /// recognized hardware-enablement or GA kernel name.
    pub hwe_kernel: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CommissionOptions {
    pub enable_ssh: bool,
    pub skip_networking: bool,
    pub skip_storage: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReleaseOptions {
    pub erase: bool,
    pub secure_erase: bool,
    pub quick_erase: bool,
}

/// Selected script names for commissioning and testing runs.
#[derive(Debug, Clone, Default)]
pub struct ScriptSelection {
    pub commissioning: Vec<String>,
    pub testing: Vec<String>,
}

/// Script names the catalog currently offers, split by run stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptOptions {
    pub commissioning: Vec<String>,
    pub testing: Vec<String>,
}

impl ScriptOptions {
    fn from_catalog(scripts: &[Script]) -> Self {
        let mut options = Self::default();
        for script in scripts {
            match script.script_type {
                ScriptType::Commissioning => options.commissioning.push(script.name.clone()),
                ScriptType::Testing => options.testing.push(script.name.clone()),
            }
        }
        options
    }

    /// Drop selected scripts the catalog no longer offers. A stage
    /// with no catalog entries prunes nothing; the selection may
    /// simply predate the load.
    fn prune_selection(&self, selection: &mut ScriptSelection) {
        if !self.commissioning.is_empty() {
            selection
                .commissioning
                .retain(|name| self.commissioning.contains(name));
        }
        if !self.testing.is_empty() {
            selection.testing.retain(|name| self.testing.contains(name));
        }
    }
}

// ── ActionSelection ─────────────────────────────────────────────────

/// The action picker's full state: available options, the chosen one,
/// the last dispatch failure, and per-action transient selections.
#[derive(Debug, Default)]
pub struct ActionSelection {
    pub option: Option<ActionName>,
    pub available: Vec<ActionName>,
    /// Last dispatch failure. Cleared whenever the selection changes.
    pub error: Option<String>,

    pub deploy: DeployOptions,
    pub commission: CommissionOptions,
    pub release: ReleaseOptions,
    pub scripts: ScriptSelection,
    pub script_options: ScriptOptions,
}

impl ActionSelection {
    pub const DEPS: DepSet = DepSet::of(Dep::Node).with(Dep::Scripts);

    /// Recompute the available options: the server's allowed actions
    /// intersected with the catalog for the node's kind, minus the
    /// excluded ones. A chosen action that is no longer available is
    /// dropped (which also clears any stale error). Script options
    /// track the script catalog, and selections the catalog dropped
    /// are pruned with them.
    pub(crate) fn refresh_available(&mut self, node: &Node, refs: &RefData) {
        self.available = catalog(node.kind())
            .iter()
            .copied()
            .filter(|a| !EXCLUDED.contains(a))
            .filter(|a| node.actions.contains(a))
            .collect();

        self.script_options = ScriptOptions::from_catalog(&refs.scripts);
        self.script_options.prune_selection(&mut self.scripts);

        if let Some(chosen) = self.option {
            if !self.available.contains(&chosen) {
                self.select(None, refs);
            }
        }
    }

    /// Choose an action (or clear the choice). Always clears the last
    /// dispatch error; seeds deploy defaults from the OS catalog when
    /// deploy is first chosen.
    pub fn select(&mut self, option: Option<ActionName>, refs: &RefData) {
        self.option = option;
        self.error = None;

        if option == Some(ActionName::Deploy) && self.deploy.osystem.is_empty() {
            if let Some(default_os) = refs.os_catalog.default_osystem.clone() {
                if let Some(default_release) = refs.os_catalog.default_release.as_deref() {
                    self.deploy.release = format!("{default_os}/{default_release}");
                }
                self.deploy.osystem = default_os;
            }
        }
    }

    /// Build the action-specific payload for the current choice.
    pub fn build_payload(&self) -> Value {
        match self.option {
            Some(ActionName::Deploy) => {
                let mut payload = json!({
                    "osystem": self.deploy.osystem,
                    "distro_series": trailing_release(&self.deploy.release),
                });
                if kernel_hint_recognized(&self.deploy.hwe_kernel) {
                    payload["hwe_kernel"] = Value::from(self.deploy.hwe_kernel.as_str());
                }
                payload
            }
            Some(ActionName::Commission) => json!({
                "enable_ssh": self.commission.enable_ssh,
                "skip_networking": self.commission.skip_networking,
                "skip_storage": self.commission.skip_storage,
                "commissioning_scripts": scripts_or_none(&self.scripts.commissioning),
                "testing_scripts": scripts_or_none(&self.scripts.testing),
            }),
            Some(ActionName::Test) => json!({
                "enable_ssh": self.commission.enable_ssh,
                "testing_scripts": scripts_or_none(&self.scripts.testing),
            }),
            Some(ActionName::Release) => json!({
                "erase": self.release.erase,
                "secure_erase": self.release.secure_erase,
                "quick_erase": self.release.quick_erase,
            }),
            _ => json!({}),
        }
    }

    /// A successful dispatch clears the selection, the error, and all
    /// transient per-action state.
    pub(crate) fn handle_success(&mut self) {
        self.option = None;
        self.error = None;
        self.reset_transients();
    }

    /// A failed dispatch keeps the selection and transients so the
    /// user can retry without re-entering them.
    pub(crate) fn handle_failure(&mut self, detail: String) {
        self.error = Some(detail);
    }

    pub(crate) fn reset_transients(&mut self) {
        self.deploy = DeployOptions::default();
        self.commission = CommissionOptions::default();
        self.release = ReleaseOptions::default();
        self.scripts = ScriptSelection::default();
    }

    // ── Derived predicates (never stored) ────────────────────────

    /// Deploy is pending but the OS catalog has nothing to offer. A
    /// present dispatch error takes priority in the UI and suppresses
    /// this condition.
    pub fn deploy_blocked(&self, refs: &RefData) -> bool {
        self.error.is_none()
            && self.option == Some(ActionName::Deploy)
            && refs.os_catalog.osystems.is_empty()
    }

    /// Deploy is pending and the user has no registered SSH keys.
    /// Suppressed by a present dispatch error, like `deploy_blocked`.
    pub fn ssh_key_missing(&self, key_count: usize) -> bool {
        self.error.is_none() && self.option == Some(ActionName::Deploy) && key_count == 0
    }
}

/// Trailing segment of a `<os>/<release>` catalog key.
fn trailing_release(release: &str) -> &str {
    release.rsplit('/').next().unwrap_or_default()
}

/// Whether a kernel hint names a recognized hardware-enablement or
/// general-availability kernel.
fn kernel_hint_recognized(hint: &str) -> bool {
    !hint.is_empty() && (hint.starts_with("hwe-") || hint.starts_with("ga-"))
}

/// Chosen script names, or the "run none" sentinel for an empty pick.
fn scripts_or_none(selected: &[String]) -> Vec<String> {
    if selected.is_empty() {
        vec![RUN_NONE.to_owned()]
    } else {
        selected.to_vec()
    }
}
