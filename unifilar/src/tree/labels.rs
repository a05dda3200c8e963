//! Display labels of protection devices.
//!
//! Labels are a pure function of the device ratings:
//! - breakers: `IGA 2P 40A` / `PIA 2P 16A`
//! - differentials: `ID 2P 40A 30mA AC` (sensitivity omitted when unknown)
//!
//! Final circuit labels depend on traversal order and are produced by
//! [`super::numbering`].

use crate::model::{DeviceKind, DeviceNode, Panel};

pub fn device_label(node: &DeviceNode) -> Option<String> {
    match node.kind {
        DeviceKind::MainBreaker | DeviceKind::ThermalMagnetic => Some(breaker_label(node)),
        DeviceKind::Differential => Some(differential_label(node)),
        DeviceKind::FinalCircuit => None,
    }
}

pub fn breaker_label(node: &DeviceNode) -> String {
    let prefix = if node.is_main() { "IGA" } else { "PIA" };
    format!("{} {} {}", prefix, node.poles, node.amp_rating)
}

pub fn differential_label(node: &DeviceNode) -> String {
    let sensitivity = node
        .sensitivity_ma
        .map(|s| format!(" {}", s))
        .unwrap_or_default();
    format!(
        "ID {} {}{} {}",
        node.poles,
        node.amp_rating,
        sensitivity,
        node.differential_type.unwrap_or_default()
    )
}

/// Label the panel's identified main breaker as `IGA`, including a
/// thermal-magnetic root that is only main by position.
pub(crate) fn label_main_breaker(panel: &mut Panel) {
    let Some(idx) = panel.main_breaker_index() else {
        return;
    };
    let main = &mut panel.roots[idx];
    if matches!(main.kind, DeviceKind::MainBreaker | DeviceKind::ThermalMagnetic) {
        let label = format!("IGA {} {}", main.poles, main.amp_rating);
        main.set_label(label);
    }
}
