//! Differential blocks: one residual-current device together with the
//! fan-out of circuits it protects. Blocks are the unit of pagination.

use crate::model::{DeviceKind, DeviceNode, Panel};

/// One outgoing circuit and the branch breaker directly above it.
#[derive(Debug, Clone, Copy)]
pub struct CircuitColumn<'a> {
    pub breaker: Option<&'a DeviceNode>,
    pub circuit: &'a DeviceNode,
}

#[derive(Debug, Clone)]
pub struct DifferentialBlock<'a> {
    /// `None` for circuits fed straight from the main bus.
    pub differential: Option<&'a DeviceNode>,
    pub circuits: Vec<CircuitColumn<'a>>,
}

impl<'a> DifferentialBlock<'a> {
    pub fn circuit_count(&self) -> usize {
        self.circuits.len()
    }

    /// Columns occupied on the sheet; an empty block still takes one.
    pub fn column_count(&self) -> usize {
        self.circuits.len().max(1)
    }
}

struct Extractor<'a> {
    blocks: Vec<DifferentialBlock<'a>>,
    /// Whether the last block is a bare block that may still grow.
    open_bare: bool,
}

impl<'a> Extractor<'a> {
    fn visit(&mut self, node: &'a DeviceNode, parent: Option<&'a DeviceNode>) {
        match node.kind {
            DeviceKind::Differential => self.differential(node),
            DeviceKind::FinalCircuit => {
                let column = CircuitColumn {
                    breaker: parent.filter(|p| p.kind == DeviceKind::ThermalMagnetic && !p.is_main()),
                    circuit: node,
                };
                if self.open_bare {
                    if let Some(last) = self.blocks.last_mut() {
                        last.circuits.push(column);
                        return;
                    }
                }
                self.blocks.push(DifferentialBlock {
                    differential: None,
                    circuits: vec![column],
                });
                self.open_bare = true;
            }
            DeviceKind::MainBreaker | DeviceKind::ThermalMagnetic => {
                for child in node.children() {
                    self.visit(child, Some(node));
                }
            }
        }
    }

    fn differential(&mut self, diff: &'a DeviceNode) {
        let mut circuits = Vec::new();
        let mut nested = Vec::new();
        for child in diff.children() {
            collect(child, diff, &mut circuits, &mut nested);
        }
        self.blocks.push(DifferentialBlock {
            differential: Some(diff),
            circuits,
        });
        self.open_bare = false;
        for inner in nested {
            self.differential(inner);
        }
    }
}

fn collect<'a>(
    node: &'a DeviceNode,
    parent: &'a DeviceNode,
    circuits: &mut Vec<CircuitColumn<'a>>,
    nested: &mut Vec<&'a DeviceNode>,
) {
    match node.kind {
        DeviceKind::FinalCircuit => circuits.push(CircuitColumn {
            breaker: Some(parent).filter(|p| p.is_breaker()),
            circuit: node,
        }),
        DeviceKind::Differential => nested.push(node),
        DeviceKind::MainBreaker | DeviceKind::ThermalMagnetic => {
            for child in node.children() {
                collect(child, node, circuits, nested);
            }
        }
    }
}

/// Split a panel into blocks, in pre-order of their differentials.
///
/// Circuits reachable without crossing a differential are grouped, in
/// order, into bare blocks. A differential nested inside another one
/// forms its own block right after its parent's.
pub fn differential_blocks(panel: &Panel) -> Vec<DifferentialBlock<'_>> {
    let mut extractor = Extractor {
        blocks: Vec::new(),
        open_bare: false,
    };
    for root in &panel.roots {
        extractor.visit(root, None);
    }
    extractor.blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AmpRating, Poles, Sensitivity, UsageCategory};

    fn amps(a: u16) -> AmpRating {
        AmpRating::new(a).unwrap()
    }

    fn leaf(id: &str) -> DeviceNode {
        DeviceNode::final_circuit(id, Poles::Two, amps(10), UsageCategory::Lighting)
    }

    fn pia(id: &str, child: DeviceNode) -> DeviceNode {
        DeviceNode::breaker(id, Poles::Two, amps(10)).with_child(child)
    }

    fn diff(id: &str) -> DeviceNode {
        DeviceNode::differential(id, Poles::Two, amps(40), Some(Sensitivity::Ma30))
    }

    fn summary(blocks: &[DifferentialBlock]) -> Vec<(Option<String>, Vec<String>)> {
        blocks
            .iter()
            .map(|b| {
                (
                    b.differential.map(|d| d.id.to_string()),
                    b.circuits.iter().map(|c| c.circuit.id.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_one_block_per_differential() {
        let panel = Panel::new("p", "P").with_root(
            DeviceNode::main_breaker("iga", Poles::Two, amps(40))
                .with_child(diff("d1").with_child(pia("b1", leaf("c1"))).with_child(pia("b2", leaf("c2"))))
                .with_child(diff("d2").with_child(pia("b3", leaf("c3")))),
        );
        let blocks = differential_blocks(&panel);
        assert_eq!(
            summary(&blocks),
            vec![
                (Some("d1".into()), vec!["c1".into(), "c2".into()]),
                (Some("d2".into()), vec!["c3".into()]),
            ]
        );
        assert_eq!(blocks[0].circuits[0].breaker.unwrap().id.as_str(), "b1");
    }

    #[test]
    fn test_circuits_outside_differentials_form_bare_blocks() {
        let panel = Panel::new("p", "P").with_root(
            DeviceNode::main_breaker("iga", Poles::Two, amps(40))
                .with_child(pia("b0", leaf("c0")))
                .with_child(leaf("direct"))
                .with_child(diff("d1").with_child(pia("b1", leaf("c1"))))
                .with_child(pia("b9", leaf("c9"))),
        );
        let blocks = differential_blocks(&panel);
        assert_eq!(
            summary(&blocks),
            vec![
                (None, vec!["c0".into(), "direct".into()]),
                (Some("d1".into()), vec!["c1".into()]),
                (None, vec!["c9".into()]),
            ]
        );
        // Directly under the main breaker: no branch breaker to draw.
        assert!(blocks[0].circuits[1].breaker.is_none());
    }

    #[test]
    fn test_nested_differential_is_its_own_block() {
        let panel = Panel::new("p", "P").with_root(
            DeviceNode::main_breaker("iga", Poles::Two, amps(40)).with_child(
                diff("outer")
                    .with_child(pia("b1", leaf("c1")))
                    .with_child(diff("inner").with_child(pia("b2", leaf("c2"))))
                    .with_child(pia("b3", leaf("c3"))),
            ),
        );
        let blocks = differential_blocks(&panel);
        assert_eq!(
            summary(&blocks),
            vec![
                (Some("outer".into()), vec!["c1".into(), "c3".into()]),
                (Some("inner".into()), vec!["c2".into()]),
            ]
        );
    }

    #[test]
    fn test_empty_differential_occupies_one_column() {
        let panel = Panel::new("p", "P").with_root(
            DeviceNode::main_breaker("iga", Poles::Two, amps(40)).with_child(diff("d")),
        );
        let blocks = differential_blocks(&panel);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].circuit_count(), 0);
        assert_eq!(blocks[0].column_count(), 1);
    }
}
