//! Panels, derivation and the schematic document.
//!
//! The persisted JSON document looks like:
//!
//! ```text
//! { "id": "...", "origin": "...",
//!   "derivacion": { "voltage": 230, "sectionMm2": 16, ... },
//!   "cuadros": [ { "id": "...", "name": "...", "roots": [ ... ] } ] }
//! ```
//!
//! A panel may carry the legacy flattened body (`simple`) instead of
//! `roots`; [`Schematic::expand_legacy_panels`] converts it.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::device::{DeviceKind, DeviceNode, NodeId};
use super::ModelError;
use crate::flat::{expand_from_simple_shape, SimplePanel};
use crate::tree::{self, TreeError, TreeOps};

/// Supply voltage of the derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Voltage {
    V230,
    V400,
}

impl Voltage {
    pub fn volts(self) -> u16 {
        match self {
            Voltage::V230 => 230,
            Voltage::V400 => 400,
        }
    }

    /// Active plus neutral conductors: single-phase 2, three-phase 4.
    pub fn live_conductors(self) -> u8 {
        match self {
            Voltage::V230 => 2,
            Voltage::V400 => 4,
        }
    }
}

impl TryFrom<u16> for Voltage {
    type Error = ModelError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            230 => Ok(Voltage::V230),
            400 => Ok(Voltage::V400),
            other => Err(ModelError::InvalidVoltage(other)),
        }
    }
}

impl From<Voltage> for u16 {
    fn from(v: Voltage) -> Self {
        v.volts()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConductorMaterial {
    Cu,
    Al,
}

impl fmt::Display for ConductorMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConductorMaterial::Cu => write!(f, "Cu"),
            ConductorMaterial::Al => write!(f, "Al"),
        }
    }
}

/// Service-entrance conductor run feeding the installation.
///
/// Only the inputs are stored. The nomenclature is computed on demand and
/// written out on serialization; any nomenclature found in an input
/// document is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "DerivationRecord", into = "DerivationRecord")]
pub struct Derivation {
    pub voltage: Voltage,
    pub section_mm2: f64,
    pub conductor_material: ConductorMaterial,
    pub insulation_type: String,
}

impl Derivation {
    pub fn new(
        voltage: Voltage,
        section_mm2: f64,
        conductor_material: ConductorMaterial,
        insulation_type: impl Into<String>,
    ) -> Self {
        Self {
            voltage,
            section_mm2,
            conductor_material,
            insulation_type: insulation_type.into(),
        }
    }

    /// e.g. `RZ1-K (AS) 2x16+TTx16 mm² Cu`
    pub fn nomenclature_text(&self) -> String {
        let section = format_section(self.section_mm2);
        let conductors = format!(
            "{}x{}+TTx{} mm² {}",
            self.voltage.live_conductors(),
            section,
            section,
            self.conductor_material
        );
        let insulation = self.insulation_type.trim();
        if insulation.is_empty() {
            conductors
        } else {
            format!("{} {}", insulation, conductors)
        }
    }
}

impl Default for Derivation {
    fn default() -> Self {
        Self::new(Voltage::V230, 16.0, ConductorMaterial::Cu, "")
    }
}

/// Cross-section with a comma decimal separator and no trailing `,0`.
pub fn format_section(section_mm2: f64) -> String {
    if section_mm2.fract() == 0.0 {
        format!("{}", section_mm2 as i64)
    } else {
        format!("{}", section_mm2).replace('.', ",")
    }
}

/// Persisted form of [`Derivation`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivationRecord {
    voltage: Voltage,
    section_mm2: f64,
    conductor_material: ConductorMaterial,
    #[serde(default)]
    insulation_type: String,
    #[serde(default, skip_deserializing)]
    nomenclature_text: String,
}

impl From<DerivationRecord> for Derivation {
    fn from(r: DerivationRecord) -> Self {
        Derivation::new(r.voltage, r.section_mm2, r.conductor_material, r.insulation_type)
    }
}

impl From<Derivation> for DerivationRecord {
    fn from(d: Derivation) -> Self {
        let nomenclature_text = d.nomenclature_text();
        DerivationRecord {
            voltage: d.voltage,
            section_mm2: d.section_mm2,
            conductor_material: d.conductor_material,
            insulation_type: d.insulation_type,
            nomenclature_text,
        }
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// One distribution board (cuadro): a forest of device trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Panel {
    pub id: String,
    pub name: String,

    #[serde(default)]
    pub roots: Vec<DeviceNode>,

    /// Draw a surge arrester next to the main bus.
    #[serde(default, skip_serializing_if = "is_false")]
    pub surge_protection: bool,

    /// Legacy flattened body, used when `roots` is empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simple: Option<SimplePanel>,
}

impl Panel {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            roots: Vec::new(),
            surge_protection: false,
            simple: None,
        }
    }

    pub fn with_root(mut self, root: DeviceNode) -> Self {
        self.roots.push(root);
        self
    }

    /// The IGA of this panel.
    ///
    /// First root explicitly marked as main (or of kind `MainBreaker`);
    /// failing that, the first thermal-magnetic root.
    pub fn main_breaker(&self) -> Option<&DeviceNode> {
        self.main_breaker_index().map(|idx| &self.roots[idx])
    }

    /// Root position of [`Self::main_breaker`].
    pub fn main_breaker_index(&self) -> Option<usize> {
        self.roots.iter().position(|n| n.is_main()).or_else(|| {
            self.roots
                .iter()
                .position(|n| n.kind == DeviceKind::ThermalMagnetic)
        })
    }

    /// Replace an empty tree with the expansion of the legacy body.
    /// Returns whether anything was expanded.
    pub fn expand_legacy(&mut self) -> bool {
        if !self.roots.is_empty() {
            return false;
        }
        match self.simple.take() {
            Some(simple) => {
                self.roots = expand_from_simple_shape(&simple);
                true
            }
            None => false,
        }
    }
}

impl TreeOps for Panel {
    fn roots(&self) -> &[DeviceNode] {
        &self.roots
    }

    fn roots_mut(&mut self) -> &mut Vec<DeviceNode> {
        &mut self.roots
    }
}

/// Top-level aggregate persisted as one JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schematic {
    pub id: String,

    #[serde(default)]
    pub origin: String,

    #[serde(rename = "derivacion", default)]
    pub derivation: Derivation,

    #[serde(rename = "cuadros", default)]
    pub panels: Vec<Panel>,
}

impl Schematic {
    pub fn new(id: impl Into<String>, origin: impl Into<String>, derivation: Derivation) -> Self {
        Self {
            id: id.into(),
            origin: origin.into(),
            derivation,
            panels: Vec::new(),
        }
    }

    pub fn with_panel(mut self, panel: Panel) -> Self {
        self.panels.push(panel);
        self
    }

    pub fn panel(&self, id: &str) -> Option<&Panel> {
        self.panels.iter().find(|p| p.id == id)
    }

    pub fn panel_mut(&mut self, id: &str) -> Option<&mut Panel> {
        self.panels.iter_mut().find(|p| p.id == id)
    }

    /// Check structural invariants of every panel: final circuits are
    /// leaves and node ids are unique across the whole schematic.
    pub fn validate(&self) -> Result<(), TreeError> {
        let mut seen: HashSet<&NodeId> = HashSet::new();
        for panel in &self.panels {
            for node in panel.iter_pre_order() {
                if node.is_final() && !node.children().is_empty() {
                    return Err(TreeError::InvalidParent {
                        id: node.id.clone(),
                        kind: node.kind,
                    });
                }
                if !seen.insert(&node.id) {
                    return Err(TreeError::DuplicateId(node.id.clone()));
                }
            }
        }
        Ok(())
    }

    pub fn expand_legacy_panels(&mut self) -> usize {
        self.panels
            .iter_mut()
            .map(|p| p.expand_legacy())
            .filter(|&expanded| expanded)
            .count()
    }

    /// Expand legacy bodies, force pole constraints and renumber every
    /// panel, in place.
    pub fn prepare(&mut self) {
        self.expand_legacy_panels();
        for panel in &mut self.panels {
            tree::propagate_poles_from_main(panel);
            tree::recalculate_circuit_numbering(panel);
        }
    }

    /// Same as [`Self::prepare`] on a copy; `self` is left untouched.
    pub fn prepared(&self) -> Schematic {
        let mut copy = self.clone();
        copy.prepare();
        copy
    }
}
