//! Circuit numbering.
//!
//! Final circuits of a panel are collected in pre-order and receive a
//! panel-wide code `C1..Cn`. Their label is the category name followed
//! by a per-category running number (`Alumbrado 2`), the user's name for
//! `Otros` circuits, or the raw category for unrecognised values.
//!
//! Counters live in a [`Numbering`] accumulator owned by one pass.

use std::collections::HashMap;

use super::labels;
use crate::model::{DeviceNode, Panel, UsageCategory};

/// Fallback label for `Otros` circuits without a user-defined name.
pub const OTHER_FALLBACK_LABEL: &str = "Otros";

struct Numbering {
    next_code: usize,
    per_category: HashMap<UsageCategory, usize>,
}

impl Numbering {
    fn new() -> Self {
        Self {
            next_code: 0,
            per_category: UsageCategory::NUMBERED
                .iter()
                .cloned()
                .map(|c| (c, 0))
                .collect(),
        }
    }

    fn visit(&mut self, node: &mut DeviceNode) {
        if node.is_final() {
            self.assign(node);
        } else {
            node.set_circuit_code(None);
            node.refresh_device_label();
        }
        for child in node.children_mut() {
            self.visit(child);
        }
    }

    fn assign(&mut self, node: &mut DeviceNode) {
        self.next_code += 1;
        node.set_circuit_code(Some(format!("C{}", self.next_code)));
        let name = self.display_name(node);
        node.set_label(name);
    }

    fn display_name(&mut self, node: &DeviceNode) -> String {
        match &node.usage_category {
            None | Some(UsageCategory::Other) => node
                .user_defined_name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .unwrap_or(OTHER_FALLBACK_LABEL)
                .to_string(),
            Some(category) => match self.per_category.get_mut(category) {
                Some(counter) => {
                    *counter += 1;
                    format!("{} {}", category.display_name(), counter)
                }
                None => category.display_name().to_string(),
            },
        }
    }
}

/// Renumber every final circuit of `panel` and refresh device labels.
/// Returns the number of final circuits.
pub fn recalculate_circuit_numbering(panel: &mut Panel) -> usize {
    let mut numbering = Numbering::new();
    for root in panel.roots.iter_mut() {
        numbering.visit(root);
    }
    labels::label_main_breaker(panel);
    tracing::debug!(
        "Numbered {} final circuits in panel {}",
        numbering.next_code,
        panel.id
    );
    numbering.next_code
}
