// ── Services section ──
//
// Name-keyed statuses of the processes running on a controller. Only
// populated when the node actually is one; machines and devices keep
// the map empty.

use std::collections::BTreeMap;

use crate::deps::{Dep, DepSet};
use crate::model::{Node, NodeKind, ServiceStatus};
use crate::store::ServiceDirectory;

#[derive(Debug, Default)]
pub struct ServicesSection {
    pub services: BTreeMap<String, ServiceStatus>,
}

impl ServicesSection {
    pub const DEPS: DepSet = DepSet::of(Dep::Node).with(Dep::Services);

    pub(crate) fn refresh(&mut self, node: &Node, directory: &dyn ServiceDirectory) {
        self.services.clear();
        if !node.kind().is_some_and(NodeKind::is_controller) {
            return;
        }
        for id in &node.service_ids {
            if let Some(status) = directory.service_status(*id) {
                self.services.insert(status.name.clone(), status);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeDirectory;

    impl ServiceDirectory for FakeDirectory {
        fn service_status(&self, id: u64) -> Option<ServiceStatus> {
            match id {
                10 => Some(ServiceStatus {
                    id,
                    name: "rackd".into(),
                    status: "running".into(),
                    status_info: String::new(),
                }),
                11 => Some(ServiceStatus {
                    id,
                    name: "dhcpd".into(),
                    status: "off".into(),
                    status_info: "not enabled".into(),
                }),
                _ => None,
            }
        }
    }

    #[test]
    fn controller_services_are_keyed_by_name() {
        let node = Node {
            node_type: 2, // rack controller
            service_ids: vec![10, 11, 99],
            ..Node::default()
        };
        let mut section = ServicesSection::default();
        section.refresh(&node, &FakeDirectory);

        assert_eq!(section.services.len(), 2);
        assert_eq!(
            section.services.get("rackd").map(|s| s.status.as_str()),
            Some("running")
        );
        assert_eq!(
            section.services.get("dhcpd").map(|s| s.status_info.as_str()),
            Some("not enabled")
        );
    }

    #[test]
    fn machines_never_populate_services() {
        let node = Node {
            node_type: 0,
            service_ids: vec![10],
            ..Node::default()
        };
        let mut section = ServicesSection::default();
        section.refresh(&node, &FakeDirectory);
        assert!(section.services.is_empty());
    }

    #[test]
    fn refresh_drops_services_no_longer_referenced() {
        let mut node = Node {
            node_type: 2,
            service_ids: vec![10, 11],
            ..Node::default()
        };
        let mut section = ServicesSection::default();
        section.refresh(&node, &FakeDirectory);
        assert_eq!(section.services.len(), 2);

        node.service_ids = vec![10];
        section.refresh(&node, &FakeDirectory);
        assert_eq!(section.services.len(), 1);
        assert!(section.services.contains_key("rackd"));
    }
}
