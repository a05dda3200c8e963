//! Integration tests for the unifilar library

use unifilar::flat::{same_structure, DropReason};
use unifilar::layout::{DrawCommand, Symbol};
use unifilar::prelude::*;
use unifilar::tree::PropagationOutcome;
use unifilar::{expand_from_simple_shape, flatten_to_simple_shape, NodeId, TreeError};
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn codes_and_labels(panel: &Panel) -> Vec<(String, String)> {
    panel
        .final_circuits()
        .into_iter()
        .map(|c| {
            (
                c.circuit_code().unwrap_or_default().to_string(),
                c.label().to_string(),
            )
        })
        .collect()
}

fn pair(code: &str, label: &str) -> (String, String) {
    (code.to_string(), label.to_string())
}

#[test]
fn test_prepare_house_panel() {
    let schematic = UnifilarCore::load_schematic(&fixture_path("vivienda.json"))
        .expect("fixture should load");
    let prepared = UnifilarCore::prepare(&schematic);
    let panel = prepared.panel("cgmp").unwrap();

    assert_eq!(
        codes_and_labels(panel),
        vec![
            pair("C1", "Alumbrado 1"),
            pair("C2", "Alumbrado 2"),
            pair("C3", "Horno"),
        ]
    );

    let diff = panel.find(&NodeId::from("id1")).unwrap();
    assert_eq!(diff.poles, Poles::Two);
    assert_eq!(diff.label(), "ID 2P 40A 30mA AC");
    assert_eq!(panel.main_breaker().unwrap().label(), "IGA 2P 40A");

    let pia = panel.find(&NodeId::from("pia1")).unwrap();
    assert_eq!(pia.poles, Poles::Two);
    assert_eq!(pia.label(), "PIA 2P 10A");

    // Loading never mutates derived data by itself.
    let raw = schematic.panel("cgmp").unwrap();
    assert_eq!(raw.find(&NodeId::from("id1")).unwrap().poles, Poles::Four);
    assert_eq!(raw.find(&NodeId::from("pia1")).unwrap().poles, Poles::Four);
}

#[test]
fn test_prepare_is_idempotent() {
    let schematic = UnifilarCore::load_schematic(&fixture_path("vivienda.json")).unwrap();
    let once = schematic.prepared();
    let twice = once.prepared();
    assert_eq!(once, twice);
}

#[test]
fn test_prepared_document_round_trips_through_json() {
    let schematic = UnifilarCore::load_schematic(&fixture_path("vivienda.json")).unwrap();
    let prepared = schematic.prepared();
    let json = UnifilarCore::to_json(&prepared).unwrap();

    assert!(json.contains("\"derivacion\""));
    assert!(json.contains("RZ1-K (AS) 2x16+TTx16 mm² Cu"));

    let reloaded = UnifilarCore::from_json(&json).unwrap();
    assert_eq!(reloaded, prepared);
}

#[test]
fn test_legacy_panel_is_expanded_on_load() {
    let schematic = UnifilarCore::load_schematic(&fixture_path("legacy_simple.json")).unwrap();
    let panel = schematic.panel("cg").unwrap();
    assert!(panel.simple.is_none());
    assert_eq!(panel.roots.len(), 1);
    assert_eq!(panel.node_count(), 1 + 2 + 5 * 2);
    assert_eq!(
        schematic.derivation.nomenclature_text(),
        "XZ1 (S) 4x25+TTx25 mm² Al"
    );

    let prepared = schematic.prepared();
    let panel = prepared.panel("cg").unwrap();
    assert_eq!(
        codes_and_labels(panel),
        vec![
            pair("C1", "Aire acondicionado 1"),
            pair("C2", "Otros usos 1"),
            pair("C3", "Alumbrado 1"),
            pair("C4", "Rótulo"),
            pair("C5", "Frío industrial"),
        ]
    );
    // 4P main imposes nothing.
    assert!(panel.iter_pre_order().any(|n| n.is_differential() && n.poles == Poles::Four));
}

#[test]
fn test_final_circuit_with_children_is_rejected() {
    let err = UnifilarCore::load_schematic(&fixture_path("final_with_children.json")).unwrap_err();
    assert!(matches!(
        err,
        UnifilarError::Tree(TreeError::InvalidParent { ref id, .. }) if id.as_str() == "c1"
    ));
}

#[test]
fn test_missing_file_is_io_error() {
    let err = UnifilarCore::load_schematic(&fixture_path("does_not_exist.json")).unwrap_err();
    assert!(matches!(err, UnifilarError::Io(_)));
}

#[test]
fn test_flat_round_trip_preserves_structure() {
    let schematic = UnifilarCore::load_schematic(&fixture_path("vivienda.json")).unwrap();
    let prepared = schematic.prepared();
    let panel = prepared.panel("cgmp").unwrap();

    let flattened = flatten_to_simple_shape(panel);
    assert!(flattened.is_lossless());
    assert_eq!(flattened.shape.differentials.len(), 1);
    assert_eq!(flattened.shape.differentials[0].circuits[2].description, "Horno");

    let mut rebuilt = Panel::new("copy", "Copia");
    rebuilt.roots = expand_from_simple_shape(&flattened.shape);
    unifilar::recalculate_circuit_numbering(&mut rebuilt);

    assert!(same_structure(&panel.roots, &rebuilt.roots));
    assert_eq!(codes_and_labels(&rebuilt), codes_and_labels(panel));
}

#[test]
fn test_flatten_reports_unrepresentable_nodes() {
    let amps = |a| AmpRating::new(a).unwrap();
    let panel = Panel::new("p", "Cuadro")
        .with_root(
            DeviceNode::main_breaker("iga", Poles::Two, amps(40)).with_child(
                DeviceNode::breaker("pia", Poles::Two, amps(16)).with_child(
                    DeviceNode::final_circuit("c", Poles::Two, amps(16), UsageCategory::Lighting),
                ),
            ),
        )
        .with_root(DeviceNode::breaker("extra", Poles::Two, amps(16)));

    let flattened = flatten_to_simple_shape(&panel);
    assert!(!flattened.is_lossless());
    let reasons: Vec<DropReason> = flattened.dropped.iter().map(|d| d.reason).collect();
    assert!(reasons.contains(&DropReason::ExtraRoot));
    assert!(reasons.contains(&DropReason::OutsideDifferential));
}

#[test]
fn test_pole_propagation_reports_outcome() {
    let amps = |a| AmpRating::new(a).unwrap();
    let mut panel = Panel::new("p", "Cuadro").with_root(
        DeviceNode::main_breaker("iga", Poles::Two, amps(40))
            .with_child(DeviceNode::differential("d", Poles::Four, amps(40), Some(Sensitivity::Ma30))),
    );
    assert_eq!(
        unifilar::propagate_poles_from_main(&mut panel),
        PropagationOutcome::Forced { changed: 1 }
    );

    let mut orphan = Panel::new("q", "Sin IGA").with_root(DeviceNode::differential(
        "d2",
        Poles::Four,
        AmpRating::new(40).unwrap(),
        None,
    ));
    assert_eq!(
        unifilar::propagate_poles_from_main(&mut orphan),
        PropagationOutcome::NoMainBreaker
    );
    assert_eq!(orphan.roots[0].poles, Poles::Four);
}

#[test]
fn test_render_house_panel() {
    let schematic = UnifilarCore::load_schematic(&fixture_path("vivienda.json")).unwrap();
    let diagram = UnifilarCore::render(&schematic, &SheetConfig::default()).unwrap();

    assert_eq!(diagram.page_count, 1);
    let symbols: Vec<Symbol> = diagram
        .commands
        .iter()
        .filter_map(|c| match c {
            DrawCommand::PlaceSymbol { symbol, .. } => Some(*symbol),
            _ => None,
        })
        .collect();
    assert_eq!(
        symbols,
        vec![
            Symbol::MainBreaker,
            Symbol::SurgeArrester,
            Symbol::Differential,
            Symbol::Breaker,
            Symbol::Breaker,
            Symbol::Breaker,
        ]
    );

    let has_text = |wanted: &str| {
        diagram
            .commands
            .iter()
            .any(|c| matches!(c, DrawCommand::DrawText { text, .. } if text == wanted))
    };
    assert!(has_text("Cuadro general"));
    assert!(has_text("Horno"));
    assert!(has_text("1,5 mm²"));
    assert!(has_text("2P 25A"));
}
