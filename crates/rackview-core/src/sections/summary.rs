// ── Summary section ──
//
// Zone, architecture, minimum-kernel and tag selections. An invalid
// architecture must always be visible for correction, so the refresh
// forces the section into edit mode rather than hiding the problem
// behind a read view.

use crate::deps::{Dep, DepSet};
use crate::error::Error;
use crate::model::{Node, RefData, Zone};

#[derive(Debug, Default)]
pub struct SummarySection {
    pub editing: bool,
    pub zone: Option<Zone>,
    pub architecture: String,
    pub min_hwe_kernel: String,
    pub tags: Vec<String>,
    /// Last submission failure, kept visible across the guard exit.
    pub error: Option<String>,
}

impl SummarySection {
    pub const DEPS: DepSet = DepSet::of(Dep::Node)
        .with(Dep::Architectures)
        .with(Dep::KernelOptions)
        .with(Dep::Zones);

    pub(crate) fn refresh(&mut self, node: &Node, refs: &RefData) {
        if !self.editing {
            self.zone = refs.zone(node.zone.id).cloned();
            self.architecture.clone_from(&node.architecture);
            self.min_hwe_kernel.clone_from(&node.min_hwe_kernel);
            self.tags.clone_from(&node.tags);
        }

        // A node whose architecture is empty or no longer in the
        // allowed set cannot be hidden behind the read view.
        if node.can_edit()
            && !refs.architectures.is_empty()
            && !architecture_allowed(&node.architecture, &refs.architectures)
        {
            self.editing = true;
        }
    }

    /// Local validation for a summary save: the architecture selection
    /// must be non-empty and currently allowed.
    pub fn validate(&self, refs: &RefData) -> Result<(), Error> {
        if architecture_allowed(&self.architecture, &refs.architectures) {
            Ok(())
        } else {
            Err(Error::LocalValidation(format!(
                "architecture {:?} is not in the allowed set",
                self.architecture
            )))
        }
    }
}

fn architecture_allowed(architecture: &str, allowed: &[String]) -> bool {
    !architecture.is_empty() && allowed.iter().any(|a| a == architecture)
}
