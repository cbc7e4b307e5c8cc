// ── Power section ──
//
// Power driver selection and its parameter map. Like the summary's
// architecture rule, a node without a power type is forced into edit
// mode so the gap is visible for correction.

use serde_json::{Map, Value};

use crate::deps::{Dep, DepSet};
use crate::error::Error;
use crate::model::{Node, PowerType, RefData};

#[derive(Debug, Default)]
pub struct PowerSection {
    pub editing: bool,
    /// Matching power-driver descriptor, resolved by name.
    pub power_type: Option<PowerType>,
    /// Driver parameters; an empty map when the node carries none.
    pub parameters: Map<String, Value>,
    /// How many other nodes share this node's BMC.
    pub bmc_node_count: u32,
    /// Last submission failure, kept visible across the guard exit.
    pub error: Option<String>,
}

impl PowerSection {
    pub const DEPS: DepSet = DepSet::of(Dep::Node).with(Dep::PowerTypes);

    pub(crate) fn refresh(&mut self, node: &Node, refs: &RefData) {
        if !self.editing {
            self.power_type = refs.power_type(&node.power_type).cloned();
            self.parameters = node
                .power_parameters
                .as_object()
                .cloned()
                .unwrap_or_default();
            self.bmc_node_count = node.power_bmc_node_count;
        }

        if node.can_edit() && node.power_type.is_empty() {
            self.editing = true;
        }
    }

    /// Local validation for a power save: a driver must be selected.
    pub fn validate(&self) -> Result<(), Error> {
        if self.power_type.is_some() {
            Ok(())
        } else {
            Err(Error::LocalValidation("no power type selected".into()))
        }
    }
}
