//! Bridge between the canonical device tree and the simplified panel shape
//! used by basic edit forms:
//!
//! ```text
//! main breaker ─┬─ differential ─┬─ breaker ── final circuit
//!               │                └─ breaker ── final circuit
//!               └─ differential ── breaker ── final circuit
//! ```
//!
//! Flattening is lossy for trees that do not have this four-level shape.
//! Nothing is discarded silently: every node that cannot be represented is
//! listed in [`Flattened::dropped`].

use serde::{Deserialize, Serialize};

use crate::model::{
    AmpRating, DeviceKind, DeviceNode, DifferentialType, NodeId, Panel, Poles, Sensitivity,
    UsageCategory,
};
use crate::tree::numbering::OTHER_FALLBACK_LABEL;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleBreaker {
    pub poles: Poles,
    pub amp: AmpRating,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleCircuit {
    pub poles: Poles,
    pub amp: AmpRating,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_mm2: Option<f64>,
    pub usage_category: UsageCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleDifferential {
    pub poles: Poles,
    pub amp: AmpRating,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensitivity: Option<Sensitivity>,
    #[serde(default)]
    pub differential_type: DifferentialType,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub circuits: Vec<SimpleCircuit>,
}

/// Flattened panel body.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimplePanel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_breaker: Option<SimpleBreaker>,
    #[serde(default)]
    pub differentials: Vec<SimpleDifferential>,
}

/// Why a node has no faithful counterpart in the flat shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// A root other than the main breaker, with its whole subtree.
    ExtraRoot,
    /// A subtree without any differential; its circuits are lost.
    OutsideDifferential,
    /// A device between two represented levels; its children are kept.
    IntermediateDevice,
    /// A differential nested in another one; promoted to the top level.
    NestedDifferential,
    /// A protection device with nothing below it.
    EmptyDevice,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedNode {
    pub id: NodeId,
    pub kind: DeviceKind,
    pub reason: DropReason,
}

/// Result of [`flatten_to_simple_shape`].
#[derive(Debug, Clone, PartialEq)]
pub struct Flattened {
    pub shape: SimplePanel,
    pub dropped: Vec<DroppedNode>,
}

impl Flattened {
    pub fn is_lossless(&self) -> bool {
        self.dropped.is_empty()
    }
}

struct Flattener {
    differentials: Vec<SimpleDifferential>,
    dropped: Vec<DroppedNode>,
}

impl Flattener {
    fn drop_node(&mut self, node: &DeviceNode, reason: DropReason) {
        self.dropped.push(DroppedNode {
            id: node.id.clone(),
            kind: node.kind,
            reason,
        });
    }

    /// Look for differentials below the main breaker.
    fn scan(&mut self, node: &DeviceNode) {
        match node.kind {
            DeviceKind::Differential => self.differential(node),
            DeviceKind::FinalCircuit => self.drop_node(node, DropReason::OutsideDifferential),
            DeviceKind::MainBreaker | DeviceKind::ThermalMagnetic => {
                if node.children().is_empty() {
                    self.drop_node(node, DropReason::EmptyDevice);
                } else if node.iter_pre_order().skip(1).any(|n| n.is_differential()) {
                    self.drop_node(node, DropReason::IntermediateDevice);
                    for child in node.children() {
                        self.scan(child);
                    }
                } else {
                    self.drop_node(node, DropReason::OutsideDifferential);
                }
            }
        }
    }

    fn differential(&mut self, diff: &DeviceNode) {
        let slot = self.differentials.len();
        self.differentials.push(SimpleDifferential {
            poles: diff.poles,
            amp: diff.amp_rating,
            sensitivity: diff.sensitivity_ma,
            differential_type: diff.differential_type.unwrap_or_default(),
            label: diff.label().to_string(),
            circuits: Vec::new(),
        });

        let mut circuits = Vec::new();
        let mut nested = Vec::new();
        for child in diff.children() {
            self.collect(child, diff, &mut circuits, &mut nested);
        }
        self.differentials[slot].circuits = circuits;

        for inner in nested {
            self.drop_node(inner, DropReason::NestedDifferential);
            self.differential(inner);
        }
    }

    fn collect<'a>(
        &mut self,
        node: &'a DeviceNode,
        parent: &DeviceNode,
        circuits: &mut Vec<SimpleCircuit>,
        nested: &mut Vec<&'a DeviceNode>,
    ) {
        match node.kind {
            DeviceKind::FinalCircuit => {
                // The immediate parent breaker carries the circuit ratings.
                let (poles, amp) = if parent.is_breaker() {
                    (parent.poles, parent.amp_rating)
                } else {
                    (node.poles, node.amp_rating)
                };
                circuits.push(SimpleCircuit {
                    poles,
                    amp,
                    description: node.label().to_string(),
                    section_mm2: node.section_mm2,
                    usage_category: node
                        .usage_category
                        .clone()
                        .unwrap_or(UsageCategory::Other),
                });
            }
            DeviceKind::Differential => nested.push(node),
            DeviceKind::MainBreaker | DeviceKind::ThermalMagnetic => {
                if node.children().is_empty() {
                    self.drop_node(node, DropReason::EmptyDevice);
                } else if node.children().iter().any(|c| !c.is_final()) {
                    self.drop_node(node, DropReason::IntermediateDevice);
                }
                for child in node.children() {
                    self.collect(child, node, circuits, nested);
                }
            }
        }
    }
}

/// Project a panel tree onto the simplified shape.
pub fn flatten_to_simple_shape(panel: &Panel) -> Flattened {
    let mut flattener = Flattener {
        differentials: Vec::new(),
        dropped: Vec::new(),
    };

    let main = panel.main_breaker();
    match main {
        Some(main) => {
            for root in &panel.roots {
                if root.id != main.id {
                    flattener.drop_node(root, DropReason::ExtraRoot);
                }
            }
            for child in main.children() {
                flattener.scan(child);
            }
        }
        None => {
            for root in &panel.roots {
                flattener.scan(root);
            }
        }
    }

    if !flattener.dropped.is_empty() {
        tracing::warn!(
            "Flattening panel {} could not represent {} nodes",
            panel.id,
            flattener.dropped.len()
        );
    }

    Flattened {
        shape: SimplePanel {
            main_breaker: main.map(|m| SimpleBreaker {
                poles: m.poles,
                amp: m.amp_rating,
            }),
            differentials: flattener.differentials,
        },
        dropped: flattener.dropped,
    }
}

fn expand_circuit(circuit: &SimpleCircuit) -> DeviceNode {
    let mut leaf = DeviceNode::final_circuit(
        NodeId::generate(),
        circuit.poles,
        circuit.amp,
        circuit.usage_category.clone(),
    );
    leaf.section_mm2 = circuit.section_mm2;
    let description = circuit.description.trim();
    if circuit.usage_category == UsageCategory::Other
        && !description.is_empty()
        && description != OTHER_FALLBACK_LABEL
    {
        leaf.user_defined_name = Some(description.to_string());
    }
    DeviceNode::breaker(NodeId::generate(), circuit.poles, circuit.amp).with_child(leaf)
}

/// Build the canonical tree for a flat panel body. Node ids are fresh;
/// codes and final-circuit labels are assigned by the next renumbering.
pub fn expand_from_simple_shape(flat: &SimplePanel) -> Vec<DeviceNode> {
    let differentials = flat.differentials.iter().map(|d| {
        d.circuits.iter().fold(
            DeviceNode::differential(NodeId::generate(), d.poles, d.amp, d.sensitivity)
                .with_type(d.differential_type),
            |diff, c| diff.with_child(expand_circuit(c)),
        )
    });

    match flat.main_breaker {
        Some(main) => {
            let root = differentials.fold(
                DeviceNode::main_breaker(NodeId::generate(), main.poles, main.amp),
                |root, diff| root.with_child(diff),
            );
            vec![root]
        }
        None => differentials.collect(),
    }
}

/// Compare two forests ignoring node ids and free-text user names
/// (their effect is already visible in the labels).
pub fn same_structure(a: &[DeviceNode], b: &[DeviceNode]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|(x, y)| {
            x.kind == y.kind
                && x.poles == y.poles
                && x.amp_rating == y.amp_rating
                && x.is_main() == y.is_main()
                && x.sensitivity_ma == y.sensitivity_ma
                && x.differential_type == y.differential_type
                && x.usage_category == y.usage_category
                && x.section_mm2 == y.section_mm2
                && x.circuit_code() == y.circuit_code()
                && x.label() == y.label()
                && same_structure(x.children(), y.children())
        })
}
