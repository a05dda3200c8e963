//! Pole propagation from the main breaker.
//!
//! A bipolar IGA cannot feed tetrapolar protection, so every
//! thermal-magnetic breaker and differential of the panel is forced to
//! 2P. The pass is one-directional: a 4P main leaves descendants alone.

use super::labels;
use crate::model::{DeviceKind, DeviceNode, Panel, Poles};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropagationOutcome {
    /// No main breaker could be identified; the panel was skipped.
    NoMainBreaker,
    /// The main breaker is 4P and imposes nothing.
    Unconstrained,
    /// Descendants were forced to 2P; `changed` counts devices that were 4P.
    Forced { changed: usize },
}

fn force_two_poles(node: &mut DeviceNode, changed: &mut usize) {
    if matches!(node.kind, DeviceKind::ThermalMagnetic | DeviceKind::Differential) {
        if node.poles != Poles::Two {
            node.poles = Poles::Two;
            *changed += 1;
        }
        node.refresh_device_label();
    }
    for child in node.children_mut() {
        force_two_poles(child, changed);
    }
}

/// Force 2P on every breaker and differential below a 2P main breaker.
pub fn propagate_poles_from_main(panel: &mut Panel) -> PropagationOutcome {
    let Some(main_idx) = panel.main_breaker_index() else {
        tracing::debug!("Panel {} has no main breaker, skipping pole propagation", panel.id);
        return PropagationOutcome::NoMainBreaker;
    };
    if panel.roots[main_idx].poles != Poles::Two {
        return PropagationOutcome::Unconstrained;
    }

    let mut changed = 0;
    for root in panel.roots.iter_mut() {
        force_two_poles(root, &mut changed);
    }
    labels::label_main_breaker(panel);
    tracing::debug!("Forced {} devices to 2P in panel {}", changed, panel.id);
    PropagationOutcome::Forced { changed }
}
