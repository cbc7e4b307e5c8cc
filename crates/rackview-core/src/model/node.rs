// ── Node domain types ──
//
// The authoritative entity owned by the external node service. The
// engine never mutates a stored Node in place; every save operates on
// a deep copy (`Node: Clone`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::action::ActionName;

// ── SystemId ────────────────────────────────────────────────────────

/// Canonical identifier for a node, machine or controller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SystemId(String);

impl SystemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SystemId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_owned()))
    }
}

impl From<&str> for SystemId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ── NodeKind ────────────────────────────────────────────────────────

/// Closed variant type for the node-type discriminant.
///
/// Replaces the wire's numeric type codes (0–4). Out-of-range codes
/// decode to `None`, which maps to an empty action catalog rather than
/// an error — intent for such values is unspecified upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Machine,
    Device,
    RackController,
    RegionController,
    RegionAndRackController,
}

impl NodeKind {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Machine),
            1 => Some(Self::Device),
            2 => Some(Self::RackController),
            3 => Some(Self::RegionController),
            4 => Some(Self::RegionAndRackController),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Machine => "Machine",
            Self::Device => "Device",
            Self::RackController => "Rack controller",
            Self::RegionController => "Region controller",
            Self::RegionAndRackController => "Region and rack controller",
        }
    }

    pub fn is_controller(self) -> bool {
        matches!(
            self,
            Self::RackController | Self::RegionController | Self::RegionAndRackController
        )
    }
}

// ── Power ───────────────────────────────────────────────────────────

/// Last reported power state of the node's BMC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerState {
    On,
    Off,
    Error,
    #[default]
    Unknown,
}

// ── Embedded references ─────────────────────────────────────────────

/// Lightweight domain reference carried on the node. The header
/// section resolves the full record from reference data by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainRef {
    pub id: u64,
    pub name: String,
}

/// Lightweight zone reference carried on the node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneRef {
    pub id: u64,
    pub name: String,
}

// ── Events and script results ───────────────────────────────────────

/// One entry from the node's event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeEvent {
    pub id: u64,
    pub created: DateTime<Utc>,
    pub type_description: String,
    pub description: String,
}

/// Outcome of one commissioning or installation script run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptResult {
    pub id: u64,
    pub name: String,
    pub status: String,
}

// ── Child devices ───────────────────────────────────────────────────

/// A device attached to the node, with its interface/link tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildDevice {
    pub fqdn: String,
    pub interfaces: Vec<ChildInterface>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildInterface {
    pub mac_address: String,
    pub links: Vec<InterfaceLink>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceLink {
    pub ip_address: Option<String>,
}

// ── Services ────────────────────────────────────────────────────────

/// Status of one controller service (rackd processes and friends).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub id: u64,
    pub name: String,
    pub status: String,
    pub status_info: String,
}

// ── Node ────────────────────────────────────────────────────────────

/// The managed node record as delivered by the node service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Node {
    pub system_id: SystemId,
    pub hostname: String,
    pub fqdn: String,
    pub domain: DomainRef,
    pub zone: ZoneRef,

    pub architecture: String,
    pub min_hwe_kernel: String,
    pub osystem: String,
    pub distro_series: String,
    pub tags: Vec<String>,

    // Power / BMC
    pub power_type: String,
    pub power_parameters: serde_json::Value,
    pub power_state: PowerState,
    /// How many other nodes share this node's BMC.
    pub power_bmc_node_count: u32,

    /// Raw node-type discriminant from the wire; decode with
    /// [`NodeKind::from_code`].
    pub node_type: u8,

    /// Permission strings granted to the acting user.
    pub permissions: Vec<String>,
    /// Actions the server currently allows on this node.
    pub actions: Vec<ActionName>,

    pub events: Vec<NodeEvent>,
    pub commissioning_results: Vec<ScriptResult>,
    pub installation_results: Vec<ScriptResult>,
    pub summary_xml: Option<String>,
    pub summary_yaml: Option<String>,

    pub devices: Vec<ChildDevice>,
    pub service_ids: Vec<u64>,
}

impl Node {
    pub fn kind(&self) -> Option<NodeKind> {
        NodeKind::from_code(self.node_type)
    }

    /// Whether the acting user may edit this node.
    pub fn can_edit(&self) -> bool {
        self.permissions.iter().any(|p| p == "edit")
    }
}

impl Default for SystemId {
    fn default() -> Self {
        Self(String::new())
    }
}
