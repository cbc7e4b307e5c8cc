// ── Machine output section ──
//
// Visibility and sub-view selection for commissioning/installation
// output. The previously selected sub-view survives node updates as
// long as it still exists.

use crate::deps::{Dep, DepSet};
use crate::model::Node;

/// A viewable machine-output sub-view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputView {
    Summary,
    Commissioning,
    Installation,
}

impl OutputView {
    pub fn name(self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Commissioning => "commissioning",
            Self::Installation => "installation",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Summary => "Commissioning Summary",
            Self::Commissioning => "Commissioning Output",
            Self::Installation => "Installation Output",
        }
    }
}

#[derive(Debug, Default)]
pub struct MachineOutputSection {
    /// Whether the section renders at all.
    pub visible: bool,
    /// Sub-views currently viewable for this node.
    pub views: Vec<OutputView>,
    pub selected: Option<OutputView>,
    /// The XML/YAML format toggle only applies to the summary view.
    pub show_summary_toggle: bool,
}

impl MachineOutputSection {
    pub const DEPS: DepSet = DepSet::of(Dep::Node);

    pub(crate) fn refresh(&mut self, node: &Node) {
        let has_summary = non_empty(node.summary_xml.as_deref())
            || non_empty(node.summary_yaml.as_deref());
        let has_commissioning = !node.commissioning_results.is_empty();
        let has_installation = !node.installation_results.is_empty();

        self.visible = has_summary || has_commissioning || has_installation;

        self.views.clear();
        if has_summary {
            self.views.push(OutputView::Summary);
        }
        if has_commissioning {
            self.views.push(OutputView::Commissioning);
        }
        if has_installation {
            self.views.push(OutputView::Installation);
        }

        // Keep the current selection by name if it still exists, else
        // prefer installation, else the first available view.
        let kept = self
            .selected
            .filter(|sel| self.views.iter().any(|v| v.name() == sel.name()));
        self.selected = kept
            .or_else(|| {
                self.views
                    .iter()
                    .copied()
                    .find(|v| *v == OutputView::Installation)
            })
            .or_else(|| self.views.first().copied());

        self.show_summary_toggle = self.selected == Some(OutputView::Summary);
    }

    /// Select a sub-view by name; unknown names are ignored.
    pub fn select(&mut self, name: &str) {
        if let Some(view) = self.views.iter().copied().find(|v| v.name() == name) {
            self.selected = Some(view);
            self.show_summary_toggle = view == OutputView::Summary;
        }
    }
}

fn non_empty(text: Option<&str>) -> bool {
    text.is_some_and(|t| !t.is_empty())
}
