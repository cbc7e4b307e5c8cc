// ── Devices section ──
//
// Flattens each child device's interface/link tree into one row per
// (device, MAC, IP) combination, suppressing repeated keys the way a
// tabular natural join renders: device name only on the device's
// first row, MAC only on an interface's first row.

use crate::deps::{Dep, DepSet};
use crate::model::Node;

/// One table row. Empty strings mean "same as the row above" for the
/// suppressed key columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceRow {
    pub name: String,
    pub mac: String,
    pub ip: String,
}

#[derive(Debug, Default)]
pub struct DevicesSection {
    pub rows: Vec<DeviceRow>,
}

impl DevicesSection {
    pub const DEPS: DepSet = DepSet::of(Dep::Node);

    pub(crate) fn refresh(&mut self, node: &Node) {
        self.rows.clear();
        for device in &node.devices {
            let mut first_device_row = true;
            if device.interfaces.is_empty() {
                self.rows.push(DeviceRow {
                    name: device.fqdn.clone(),
                    ..DeviceRow::default()
                });
                continue;
            }
            for interface in &device.interfaces {
                let mut first_interface_row = true;
                if interface.links.is_empty() {
                    self.rows.push(DeviceRow {
                        name: take_once(&device.fqdn, &mut first_device_row),
                        mac: interface.mac_address.clone(),
                        ip: String::new(),
                    });
                    continue;
                }
                for link in &interface.links {
                    self.rows.push(DeviceRow {
                        name: take_once(&device.fqdn, &mut first_device_row),
                        mac: take_once(&interface.mac_address, &mut first_interface_row),
                        ip: link.ip_address.clone().unwrap_or_default(),
                    });
                }
            }
        }
    }
}

/// Return the value on the first call, an empty string afterwards.
fn take_once(value: &str, first: &mut bool) -> String {
    if *first {
        *first = false;
        value.to_owned()
    } else {
        String::new()
    }
}
