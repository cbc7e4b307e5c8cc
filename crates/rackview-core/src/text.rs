// ── Derived text helpers ──
//
// Pure functions of current state, safe to recompute on every render.

use crate::model::{NodeEvent, OsCatalog, PowerState, PowerType};

/// Natural-language conjunction: `a`, `a and b`, `a, b and c`.
pub fn conjoin(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [first, last] => format!("{first} and {last}"),
        [head @ .., last] => format!("{} and {last}", head.join(", ")),
    }
}

/// Label for the node's power state.
pub fn power_state_label(state: PowerState) -> &'static str {
    match state {
        PowerState::On => "Power on",
        PowerState::Off => "Power off",
        PowerState::Error => "Power error",
        PowerState::Unknown => "Unknown",
    }
}

/// Display label for the node's operating system, resolved through the
/// OS catalog when possible.
pub fn os_label(catalog: &OsCatalog, osystem: &str, distro_series: &str) -> String {
    if osystem.is_empty() {
        return String::new();
    }
    if distro_series.is_empty() {
        return osystem.to_owned();
    }
    catalog.release_title(osystem, distro_series)
}

/// Warning text for a power driver with missing host packages, or
/// `None` when the driver is fully installed.
pub fn missing_packages_label(power_type: &PowerType) -> Option<String> {
    if power_type.missing_packages.is_empty() {
        return None;
    }
    let plural = if power_type.missing_packages.len() == 1 {
        "package"
    } else {
        "packages"
    };
    Some(format!(
        "Missing {plural}: {}",
        conjoin(&power_type.missing_packages)
    ))
}

/// Single-line display text for a node event.
pub fn event_text(event: &NodeEvent) -> String {
    if event.description.is_empty() {
        event.type_description.clone()
    } else {
        format!("{} - {}", event.type_description, event.description)
    }
}
