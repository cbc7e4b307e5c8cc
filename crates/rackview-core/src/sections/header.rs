// ── Header section ──
//
// Editable hostname plus the domain selection. The node only carries a
// lightweight domain reference, so the selection is resolved by id
// against the full reference-data record — never by trusting the
// embedded partial object.

use crate::deps::{Dep, DepSet};
use crate::error::Error;
use crate::model::{Domain, Node, RefData};

const MAX_HOSTNAME_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

#[derive(Debug, Default)]
pub struct HeaderSection {
    pub editing: bool,
    /// Edit buffer for the display name.
    pub hostname: String,
    /// Resolved domain record with the same id as the node's reference.
    pub domain: Option<Domain>,
    /// Last submission failure, kept visible across the guard exit.
    pub error: Option<String>,
}

impl HeaderSection {
    pub const DEPS: DepSet = DepSet::of(Dep::Node).with(Dep::Domains);

    pub(crate) fn refresh(&mut self, node: &Node, refs: &RefData) {
        if self.editing {
            return;
        }
        self.hostname.clone_from(&node.hostname);
        self.domain = refs.domain(node.domain.id).cloned();
    }

    /// Local validation for a header save. Violations block the save
    /// before anything reaches the node service.
    pub fn validate(&self) -> Result<(), Error> {
        if self.hostname.is_empty() {
            return Err(Error::LocalValidation("hostname cannot be empty".into()));
        }
        if !is_valid_hostname(&self.hostname) {
            return Err(Error::LocalValidation(format!(
                "invalid hostname: {}",
                self.hostname
            )));
        }
        Ok(())
    }
}

/// Hostname syntax check: dot-separated labels of alphanumerics and
/// hyphens, no leading or trailing hyphen per label, labels at most 63
/// characters, 253 characters overall.
pub fn is_valid_hostname(hostname: &str) -> bool {
    if hostname.is_empty() || hostname.len() > MAX_HOSTNAME_LEN {
        return false;
    }
    hostname.split('.').all(is_valid_label)
}

fn is_valid_label(label: &str) -> bool {
    if label.is_empty() || label.len() > MAX_LABEL_LEN {
        return false;
    }
    if label.starts_with('-') || label.ends_with('-') {
        return false;
    }
    label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DomainRef;

    fn node_with_domain(id: u64) -> Node {
        Node {
            hostname: "web-01".into(),
            domain: DomainRef {
                id,
                name: "stale-name".into(),
            },
            ..Node::default()
        }
    }

    fn refs_with_domains() -> RefData {
        RefData {
            domains: vec![
                Domain {
                    id: 1,
                    name: "maas".into(),
                },
                Domain {
                    id: 2,
                    name: "internal".into(),
                },
            ],
            ..RefData::default()
        }
    }

    #[test]
    fn refresh_resolves_domain_by_id_not_embedded_name() {
        let mut header = HeaderSection::default();
        header.refresh(&node_with_domain(2), &refs_with_domains());
        assert_eq!(header.hostname, "web-01");
        assert_eq!(header.domain.as_ref().map(|d| d.name.as_str()), Some("internal"));
    }

    #[test]
    fn refresh_leaves_unknown_domain_unselected() {
        let mut header = HeaderSection::default();
        header.refresh(&node_with_domain(9), &refs_with_domains());
        assert!(header.domain.is_none());
    }

    #[test]
    fn refresh_skipped_while_editing() {
        let mut header = HeaderSection {
            editing: true,
            hostname: "typed-so-far".into(),
            ..HeaderSection::default()
        };
        header.refresh(&node_with_domain(1), &refs_with_domains());
        assert_eq!(header.hostname, "typed-so-far");
    }

    #[test]
    fn hostname_syntax() {
        assert!(is_valid_hostname("web-01"));
        assert!(is_valid_hostname("a"));
        assert!(is_valid_hostname("web-01.maas.internal"));

        assert!(!is_valid_hostname(""));
        assert!(!is_valid_hostname("-leading"));
        assert!(!is_valid_hostname("trailing-"));
        assert!(!is_valid_hostname("under_score"));
        assert!(!is_valid_hostname("sp ace"));
        assert!(!is_valid_hostname("dots..inside"));
        assert!(!is_valid_hostname(&"x".repeat(64)));
        assert!(is_valid_hostname(&"x".repeat(63)));
    }

    #[test]
    fn validate_blocks_bad_hostnames() {
        let mut header = HeaderSection::default();
        assert!(matches!(
            header.validate(),
            Err(Error::LocalValidation(_))
        ));

        header.hostname = "ok-name".into();
        assert!(header.validate().is_ok());
    }
}
