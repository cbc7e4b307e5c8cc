// ── Events section ──
//
// Newest-first projection of the node's event log, capped at a
// visible limit the user can raise in steps.

use crate::deps::{Dep, DepSet};
use crate::model::{Node, NodeEvent};

const INITIAL_LIMIT: usize = 10;
const LIMIT_STEP: usize = 10;

#[derive(Debug)]
pub struct EventsSection {
    pub limit: usize,
    pub events: Vec<NodeEvent>,
}

impl Default for EventsSection {
    fn default() -> Self {
        Self {
            limit: INITIAL_LIMIT,
            events: Vec::new(),
        }
    }
}

impl EventsSection {
    pub const DEPS: DepSet = DepSet::of(Dep::Node);

    pub(crate) fn refresh(&mut self, node: &Node) {
        let mut events = node.events.clone();
        events.sort_by(|a, b| b.created.cmp(&a.created));
        events.truncate(self.limit);
        self.events = events;
    }

    /// Raise the visible limit and reproject.
    pub fn load_more(&mut self, node: &Node) {
        self.limit += LIMIT_STEP;
        self.refresh(node);
    }

    /// Whether the node has more events than are currently shown.
    pub fn has_more(&self, node: &Node) -> bool {
        node.events.len() > self.events.len()
    }
}
