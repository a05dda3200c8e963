//! Protection Device Data Types
//!
//! A single-line diagram is a forest of [`DeviceNode`]s. Every node is a
//! protection device (main breaker, branch breaker, residual-current
//! device) or a final circuit leaf. Children are owned by value: the tree
//! has no back-references and no sharing.
//!
//! Rated values are closed commercial sets, so decoding goes through
//! `TryFrom` and rejects anything outside them.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ModelError;
use crate::tree::labels;

/// Opaque node identifier, unique within a schematic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random identifier (UUID v4).
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Role of a node in the protection hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    MainBreaker,
    ThermalMagnetic,
    Differential,
    FinalCircuit,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::MainBreaker => write!(f, "main breaker"),
            DeviceKind::ThermalMagnetic => write!(f, "thermal-magnetic breaker"),
            DeviceKind::Differential => write!(f, "differential"),
            DeviceKind::FinalCircuit => write!(f, "final circuit"),
        }
    }
}

/// Number of poles. Only bipolar and tetrapolar devices exist in the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Poles {
    Two,
    Four,
}

impl Poles {
    pub fn count(self) -> u8 {
        match self {
            Poles::Two => 2,
            Poles::Four => 4,
        }
    }
}

impl TryFrom<u8> for Poles {
    type Error = ModelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(Poles::Two),
            4 => Ok(Poles::Four),
            other => Err(ModelError::InvalidPoles(other)),
        }
    }
}

impl From<Poles> for u8 {
    fn from(p: Poles) -> Self {
        p.count()
    }
}

impl fmt::Display for Poles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}P", self.count())
    }
}

/// Commercial current ratings, in amperes.
pub const COMMERCIAL_AMP_RATINGS: [u16; 15] = [
    10, 16, 20, 25, 32, 40, 50, 63, 100, 125, 160, 200, 250, 400, 600,
];

/// Rated current restricted to [`COMMERCIAL_AMP_RATINGS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct AmpRating(u16);

impl AmpRating {
    pub fn new(amps: u16) -> Result<Self, ModelError> {
        if COMMERCIAL_AMP_RATINGS.contains(&amps) {
            Ok(Self(amps))
        } else {
            Err(ModelError::InvalidAmpRating(amps))
        }
    }

    pub fn amps(self) -> u16 {
        self.0
    }

    /// All ratings in ascending order.
    pub fn all() -> impl Iterator<Item = AmpRating> {
        COMMERCIAL_AMP_RATINGS.iter().map(|&a| AmpRating(a))
    }
}

impl TryFrom<u16> for AmpRating {
    type Error = ModelError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AmpRating> for u16 {
    fn from(a: AmpRating) -> Self {
        a.0
    }
}

impl fmt::Display for AmpRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}A", self.0)
    }
}

/// Residual-current sensitivity of a differential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "SensitivityRepr", into = "SensitivityRepr")]
pub enum Sensitivity {
    Ma30,
    Ma300,
    Ma500,
    Adjustable,
}

impl Sensitivity {
    /// Fixed trip current, `None` for adjustable devices.
    pub fn milliamps(self) -> Option<u16> {
        match self {
            Sensitivity::Ma30 => Some(30),
            Sensitivity::Ma300 => Some(300),
            Sensitivity::Ma500 => Some(500),
            Sensitivity::Adjustable => None,
        }
    }
}

impl fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.milliamps() {
            Some(ma) => write!(f, "{}mA", ma),
            None => write!(f, "regulable"),
        }
    }
}

/// Wire form of [`Sensitivity`]: a number of milliamps or the word "adjustable".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SensitivityRepr {
    Milliamps(u16),
    Text(String),
}

impl TryFrom<SensitivityRepr> for Sensitivity {
    type Error = ModelError;

    fn try_from(repr: SensitivityRepr) -> Result<Self, Self::Error> {
        match repr {
            SensitivityRepr::Milliamps(30) => Ok(Sensitivity::Ma30),
            SensitivityRepr::Milliamps(300) => Ok(Sensitivity::Ma300),
            SensitivityRepr::Milliamps(500) => Ok(Sensitivity::Ma500),
            SensitivityRepr::Milliamps(other) => {
                Err(ModelError::InvalidSensitivity(other.to_string()))
            }
            SensitivityRepr::Text(text) => {
                let t = text.trim().to_lowercase();
                match t.as_str() {
                    "adjustable" | "regulable" => Ok(Sensitivity::Adjustable),
                    "30" => Ok(Sensitivity::Ma30),
                    "300" => Ok(Sensitivity::Ma300),
                    "500" => Ok(Sensitivity::Ma500),
                    _ => Err(ModelError::InvalidSensitivity(text)),
                }
            }
        }
    }
}

impl From<Sensitivity> for SensitivityRepr {
    fn from(s: Sensitivity) -> Self {
        match s.milliamps() {
            Some(ma) => SensitivityRepr::Milliamps(ma),
            None => SensitivityRepr::Text("adjustable".to_string()),
        }
    }
}

/// Residual-current device class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DifferentialType {
    #[default]
    AC,
    A,
    F,
    B,
}

impl fmt::Display for DifferentialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DifferentialType::AC => write!(f, "AC"),
            DifferentialType::A => write!(f, "A"),
            DifferentialType::F => write!(f, "F"),
            DifferentialType::B => write!(f, "B"),
        }
    }
}

/// What a final circuit feeds.
///
/// The list is closed and versioned. Values that do not match a known
/// display name are kept verbatim in `Unrecognized` so legacy documents
/// still load and render.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UsageCategory {
    Lighting,
    Emergency,
    OtherUses,
    WetAreas,
    Oven,
    Washer,
    Dishwasher,
    WaterHeater,
    AirConditioning,
    Other,
    Unrecognized(String),
}

impl UsageCategory {
    /// Categories that receive a per-category running number.
    pub const NUMBERED: [UsageCategory; 9] = [
        UsageCategory::Lighting,
        UsageCategory::Emergency,
        UsageCategory::OtherUses,
        UsageCategory::WetAreas,
        UsageCategory::Oven,
        UsageCategory::Washer,
        UsageCategory::Dishwasher,
        UsageCategory::WaterHeater,
        UsageCategory::AirConditioning,
    ];

    pub fn display_name(&self) -> &str {
        match self {
            UsageCategory::Lighting => "Alumbrado",
            UsageCategory::Emergency => "Emergencia",
            UsageCategory::OtherUses => "Otros usos",
            UsageCategory::WetAreas => "Zonas húmedas",
            UsageCategory::Oven => "Horno",
            UsageCategory::Washer => "Lavadora",
            UsageCategory::Dishwasher => "Lavavajillas",
            UsageCategory::WaterHeater => "Termo",
            UsageCategory::AirConditioning => "Aire acondicionado",
            UsageCategory::Other => "Otros",
            UsageCategory::Unrecognized(raw) => raw,
        }
    }

    pub fn is_numbered(&self) -> bool {
        Self::NUMBERED.contains(self)
    }

    /// Language-neutral identifier, accepted on input next to the display name.
    pub fn identifier(&self) -> Option<&'static str> {
        match self {
            UsageCategory::Lighting => Some("lighting"),
            UsageCategory::Emergency => Some("emergency"),
            UsageCategory::OtherUses => Some("other-uses"),
            UsageCategory::WetAreas => Some("wet-areas"),
            UsageCategory::Oven => Some("oven"),
            UsageCategory::Washer => Some("washer"),
            UsageCategory::Dishwasher => Some("dishwasher"),
            UsageCategory::WaterHeater => Some("water-heater"),
            UsageCategory::AirConditioning => Some("air-conditioning"),
            UsageCategory::Other => Some("other"),
            UsageCategory::Unrecognized(_) => None,
        }
    }
}

/// Lowercase, with `_` and runs of whitespace folded into `-`.
fn normalize_identifier(raw: &str) -> String {
    raw.split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

impl From<String> for UsageCategory {
    fn from(raw: String) -> Self {
        let wanted = raw.trim().to_lowercase();
        let identifier = normalize_identifier(&raw);
        Self::NUMBERED
            .iter()
            .chain(std::iter::once(&UsageCategory::Other))
            .find(|c| {
                c.display_name().to_lowercase() == wanted || c.identifier() == Some(identifier.as_str())
            })
            .cloned()
            .unwrap_or(UsageCategory::Unrecognized(raw))
    }
}

impl From<&str> for UsageCategory {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<UsageCategory> for String {
    fn from(c: UsageCategory) -> Self {
        match c {
            UsageCategory::Unrecognized(raw) => raw,
            known => known.display_name().to_string(),
        }
    }
}

impl fmt::Display for UsageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// A protection device or final circuit in a panel tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceNode {
    pub id: NodeId,
    pub kind: DeviceKind,
    pub poles: Poles,
    pub amp_rating: AmpRating,

    /// Explicit main-breaker marker. Role is never inferred from the label.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_main_breaker: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensitivity_ma: Option<Sensitivity>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub differential_type: Option<DifferentialType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_category: Option<UsageCategory>,

    /// Free text, only meaningful for [`UsageCategory::Other`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_defined_name: Option<String>,

    /// Conductor section of a final circuit, in mm².
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_mm2: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    circuit_code: Option<String>,

    #[serde(default)]
    label: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<DeviceNode>,
}

impl DeviceNode {
    fn bare(id: NodeId, kind: DeviceKind, poles: Poles, amp_rating: AmpRating) -> Self {
        Self {
            id,
            kind,
            poles,
            amp_rating,
            is_main_breaker: false,
            sensitivity_ma: None,
            differential_type: None,
            usage_category: None,
            user_defined_name: None,
            section_mm2: None,
            circuit_code: None,
            label: String::new(),
            children: Vec::new(),
        }
    }

    /// Incoming general breaker (IGA) of a panel.
    pub fn main_breaker(id: impl Into<NodeId>, poles: Poles, amp_rating: AmpRating) -> Self {
        let mut node = Self::bare(id.into(), DeviceKind::MainBreaker, poles, amp_rating);
        node.is_main_breaker = true;
        node.refresh_device_label();
        node
    }

    /// Branch thermal-magnetic breaker (PIA).
    pub fn breaker(id: impl Into<NodeId>, poles: Poles, amp_rating: AmpRating) -> Self {
        let mut node = Self::bare(id.into(), DeviceKind::ThermalMagnetic, poles, amp_rating);
        node.refresh_device_label();
        node
    }

    /// Residual-current device, type AC unless changed with [`Self::with_type`].
    pub fn differential(
        id: impl Into<NodeId>,
        poles: Poles,
        amp_rating: AmpRating,
        sensitivity: Option<Sensitivity>,
    ) -> Self {
        let mut node = Self::bare(id.into(), DeviceKind::Differential, poles, amp_rating);
        node.sensitivity_ma = sensitivity;
        node.differential_type = Some(DifferentialType::default());
        node.refresh_device_label();
        node
    }

    /// Final circuit leaf. Code and label are assigned by renumbering.
    pub fn final_circuit(
        id: impl Into<NodeId>,
        poles: Poles,
        amp_rating: AmpRating,
        category: UsageCategory,
    ) -> Self {
        let mut node = Self::bare(id.into(), DeviceKind::FinalCircuit, poles, amp_rating);
        node.usage_category = Some(category);
        node
    }

    pub fn with_type(mut self, differential_type: DifferentialType) -> Self {
        self.differential_type = Some(differential_type);
        self.refresh_device_label();
        self
    }

    pub fn with_user_name(mut self, name: impl Into<String>) -> Self {
        self.user_defined_name = Some(name.into());
        self
    }

    pub fn with_section(mut self, section_mm2: f64) -> Self {
        self.section_mm2 = Some(section_mm2);
        self
    }

    /// Builder-style child append. Final circuits silently refuse children
    /// here; use [`crate::tree::TreeOps::insert_child`] when the error matters.
    pub fn with_child(mut self, child: DeviceNode) -> Self {
        if !self.is_final() {
            self.children.push(child);
        }
        self
    }

    pub fn is_final(&self) -> bool {
        self.kind == DeviceKind::FinalCircuit
    }

    pub fn is_differential(&self) -> bool {
        self.kind == DeviceKind::Differential
    }

    /// Main or branch breaker.
    pub fn is_breaker(&self) -> bool {
        matches!(self.kind, DeviceKind::MainBreaker | DeviceKind::ThermalMagnetic)
    }

    /// Whether this node plays the IGA role.
    pub fn is_main(&self) -> bool {
        self.is_main_breaker || self.kind == DeviceKind::MainBreaker
    }

    pub fn circuit_code(&self) -> Option<&str> {
        self.circuit_code.as_deref()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn children(&self) -> &[DeviceNode] {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<DeviceNode> {
        &mut self.children
    }

    pub(crate) fn set_circuit_code(&mut self, code: Option<String>) {
        self.circuit_code = code;
    }

    pub(crate) fn set_label(&mut self, label: String) {
        self.label = label;
    }

    /// Re-derive the label of a protection device from its ratings.
    /// Final circuit labels depend on their position and are left alone.
    pub(crate) fn refresh_device_label(&mut self) {
        if let Some(label) = labels::device_label(self) {
            self.label = label;
        }
    }

    /// Usage category name shown in the circuit table.
    pub fn category_name(&self) -> Option<&str> {
        self.usage_category.as_ref().map(|c| c.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poles_decoding() {
        assert_eq!(Poles::try_from(2).unwrap(), Poles::Two);
        assert_eq!(Poles::try_from(4).unwrap(), Poles::Four);
        assert!(matches!(Poles::try_from(3), Err(ModelError::InvalidPoles(3))));
    }

    #[test]
    fn test_amp_rating_is_closed_set() {
        assert!(AmpRating::new(40).is_ok());
        assert!(AmpRating::new(600).is_ok());
        assert!(AmpRating::new(35).is_err());
        assert_eq!(AmpRating::all().count(), 15);

        let parsed: Result<AmpRating, _> = serde_json::from_str("45");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_sensitivity_wire_forms() {
        let s: Sensitivity = serde_json::from_str("30").unwrap();
        assert_eq!(s, Sensitivity::Ma30);
        let s: Sensitivity = serde_json::from_str("\"adjustable\"").unwrap();
        assert_eq!(s, Sensitivity::Adjustable);
        assert!(serde_json::from_str::<Sensitivity>("100").is_err());

        assert_eq!(serde_json::to_string(&Sensitivity::Ma300).unwrap(), "300");
        assert_eq!(
            serde_json::to_string(&Sensitivity::Adjustable).unwrap(),
            "\"adjustable\""
        );
    }

    #[test]
    fn test_usage_category_names() {
        assert_eq!(UsageCategory::from("Alumbrado"), UsageCategory::Lighting);
        assert_eq!(UsageCategory::from("  alumbrado "), UsageCategory::Lighting);
        assert_eq!(UsageCategory::from("Otros"), UsageCategory::Other);
        assert_eq!(
            UsageCategory::from("Piscina"),
            UsageCategory::Unrecognized("Piscina".to_string())
        );
        assert!(!UsageCategory::Other.is_numbered());
        assert!(UsageCategory::Oven.is_numbered());
        assert!(!UsageCategory::Unrecognized("x".into()).is_numbered());
    }

    #[test]
    fn test_usage_category_identifiers() {
        assert_eq!(UsageCategory::from("Lighting"), UsageCategory::Lighting);
        assert_eq!(UsageCategory::from("other-uses"), UsageCategory::OtherUses);
        assert_eq!(UsageCategory::from("Other uses"), UsageCategory::OtherUses);
        assert_eq!(UsageCategory::from("WET_AREAS"), UsageCategory::WetAreas);
        assert_eq!(UsageCategory::from("Air-Conditioning"), UsageCategory::AirConditioning);
        assert_eq!(UsageCategory::from("other"), UsageCategory::Other);

        // Output keeps the display name.
        assert_eq!(String::from(UsageCategory::from("Water-heater")), "Termo");
    }

    #[test]
    fn test_builders_derive_labels() {
        let iga = DeviceNode::main_breaker("m", Poles::Two, AmpRating::new(40).unwrap());
        assert!(iga.is_main());
        assert_eq!(iga.label(), "IGA 2P 40A");

        let id = DeviceNode::differential(
            "d",
            Poles::Four,
            AmpRating::new(40).unwrap(),
            Some(Sensitivity::Ma30),
        )
        .with_type(DifferentialType::A);
        assert_eq!(id.label(), "ID 4P 40A 30mA A");
    }

    #[test]
    fn test_final_circuit_refuses_children() {
        let amps = AmpRating::new(10).unwrap();
        let leaf = DeviceNode::final_circuit("c", Poles::Two, amps, UsageCategory::Lighting)
            .with_child(DeviceNode::breaker("b", Poles::Two, amps));
        assert!(leaf.children().is_empty());
    }
}
