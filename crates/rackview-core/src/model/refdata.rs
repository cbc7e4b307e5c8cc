// ── Reference-data records ──
//
// Externally owned, polled catalogs. The engine treats these as
// read-only snapshots and re-derives validity on every change.

use serde::{Deserialize, Serialize};

/// Physical zone record from reference data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: u64,
    pub name: String,
}

/// DNS domain record from reference data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub id: u64,
    pub name: String,
}

/// A tag known to the tag catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
}

/// One configurable parameter of a power driver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerField {
    pub name: String,
    pub label: String,
    pub required: bool,
}

/// Power driver descriptor (BMC type) from reference data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerType {
    pub name: String,
    pub description: String,
    pub fields: Vec<PowerField>,
    /// Host packages that must be installed before this driver works.
    pub missing_packages: Vec<String>,
}

/// A selectable minimum-kernel choice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelOption {
    pub key: String,
    pub label: String,
}

/// An operating system known to the image catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsEntry {
    pub name: String,
    pub title: String,
}

/// A deployable release, keyed `<os>/<release>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseEntry {
    pub key: String,
    pub title: String,
}

/// The OS catalog: deployable operating systems and releases, with
/// server-side defaults for new deployments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsCatalog {
    pub osystems: Vec<OsEntry>,
    pub releases: Vec<ReleaseEntry>,
    pub default_osystem: Option<String>,
    pub default_release: Option<String>,
}

impl OsCatalog {
    /// Human title for an `<os>`/`<release>` pair, falling back to the
    /// raw key when the catalog has no matching entry.
    pub fn release_title(&self, osystem: &str, series: &str) -> String {
        let key = format!("{osystem}/{series}");
        self.releases
            .iter()
            .find(|r| r.key == key)
            .map_or(key, |r| r.title.clone())
    }
}

/// Whether a script runs during commissioning or during testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptType {
    Commissioning,
    Testing,
}

/// A script from the script catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub name: String,
    pub script_type: ScriptType,
}

/// One coherent snapshot of every reference-data collection the
/// engine consumes. Collections arrive independently; absent ones are
/// simply empty.
#[derive(Debug, Clone, Default)]
pub struct RefData {
    pub architectures: Vec<String>,
    pub kernel_options: Vec<KernelOption>,
    pub os_catalog: OsCatalog,
    pub power_types: Vec<PowerType>,
    pub zones: Vec<Zone>,
    pub domains: Vec<Domain>,
    pub scripts: Vec<Script>,
}

impl RefData {
    pub fn power_type(&self, name: &str) -> Option<&PowerType> {
        self.power_types.iter().find(|p| p.name == name)
    }

    pub fn domain(&self, id: u64) -> Option<&Domain> {
        self.domains.iter().find(|d| d.id == id)
    }

    pub fn zone(&self, id: u64) -> Option<&Zone> {
        self.zones.iter().find(|z| z.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_title_prefers_catalog_entry() {
        let catalog = OsCatalog {
            releases: vec![ReleaseEntry {
                key: "ubuntu/noble".into(),
                title: "Ubuntu 24.04 LTS".into(),
            }],
            ..OsCatalog::default()
        };
        assert_eq!(catalog.release_title("ubuntu", "noble"), "Ubuntu 24.04 LTS");
        assert_eq!(catalog.release_title("ubuntu", "jammy"), "ubuntu/jammy");
    }
}
