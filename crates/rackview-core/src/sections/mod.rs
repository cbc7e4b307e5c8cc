// ── Section view-models and the reconciliation pass ──
//
// One independently editable projection of the node per UI section,
// plus the change propagator that keeps them in sync with the
// authoritative node without clobbering in-progress edits.

pub mod devices;
pub mod events;
pub mod header;
pub mod output;
pub mod power;
pub mod services;
pub mod summary;

pub use devices::{DeviceRow, DevicesSection};
pub use events::EventsSection;
pub use header::HeaderSection;
pub use output::{MachineOutputSection, OutputView};
pub use power::PowerSection;
pub use services::ServicesSection;
pub use summary::SummarySection;

use crate::action::ActionSelection;
use crate::deps::DepSet;
use crate::model::{Node, RefData};
use crate::store::ServiceDirectory;

/// Sections with an edit mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditableSection {
    Header,
    Summary,
    Power,
}

/// Everything the reconciliation pass reads. Recomputation is a pure
/// function of this context plus the per-section editing flags, so
/// arrival order of node and reference-data updates is irrelevant —
/// the end state converges either way.
pub struct ReconcileCtx<'a> {
    pub node: &'a Node,
    pub refs: &'a RefData,
    pub services: &'a dyn ServiceDirectory,
}

/// The full set of section view-models for one node view.
#[derive(Default)]
pub struct NodeView {
    pub header: HeaderSection,
    pub summary: SummarySection,
    pub power: PowerSection,
    pub services: ServicesSection,
    pub output: MachineOutputSection,
    pub devices: DevicesSection,
    pub events: EventsSection,
    pub action: ActionSelection,
}

impl NodeView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Change propagator: recompute every section whose declared
    /// dependencies intersect the changed set. Sections in edit mode
    /// guard their own selection fields inside `refresh`.
    pub fn reconcile(&mut self, changed: DepSet, ctx: &ReconcileCtx<'_>) {
        if changed.is_empty() {
            return;
        }
        if HeaderSection::DEPS.intersects(changed) {
            self.header.refresh(ctx.node, ctx.refs);
        }
        if SummarySection::DEPS.intersects(changed) {
            self.summary.refresh(ctx.node, ctx.refs);
        }
        if PowerSection::DEPS.intersects(changed) {
            self.power.refresh(ctx.node, ctx.refs);
        }
        if ServicesSection::DEPS.intersects(changed) {
            self.services.refresh(ctx.node, ctx.services);
        }
        if MachineOutputSection::DEPS.intersects(changed) {
            self.output.refresh(ctx.node);
        }
        if DevicesSection::DEPS.intersects(changed) {
            self.devices.refresh(ctx.node);
        }
        if EventsSection::DEPS.intersects(changed) {
            self.events.refresh(ctx.node);
        }
        if ActionSelection::DEPS.intersects(changed) {
            self.action.refresh_available(ctx.node, ctx.refs);
        }
    }

    // ── Edit-mode guard transitions ──────────────────────────────

    /// Enter edit mode for a section. Requires edit rights; a no-op
    /// when the section is already editing. The edit buffers already
    /// mirror the view-model, which was synced while viewing.
    pub fn enter_edit(&mut self, section: EditableSection, ctx: &ReconcileCtx<'_>) {
        if !ctx.node.can_edit() {
            return;
        }
        match section {
            EditableSection::Header => self.header.editing = true,
            EditableSection::Summary => self.summary.editing = true,
            EditableSection::Power => self.power.editing = true,
        }
    }

    /// Leave edit mode without saving and resync from the node. For
    /// summary and power the refresh reasserts edit mode when the
    /// node's own value is still invalid — the guard refuses to hide
    /// a broken required field behind a read view.
    pub fn cancel_edit(&mut self, section: EditableSection, ctx: &ReconcileCtx<'_>) {
        match section {
            EditableSection::Header => {
                self.header.editing = false;
                self.header.refresh(ctx.node, ctx.refs);
            }
            EditableSection::Summary => {
                self.summary.editing = false;
                self.summary.refresh(ctx.node, ctx.refs);
            }
            EditableSection::Power => {
                self.power.editing = false;
                self.power.refresh(ctx.node, ctx.refs);
            }
        }
    }
}
