//! Build a small dwelling panel in code, prepare it and print the result.

use unifilar::layout::DrawCommand;
use unifilar::prelude::*;
use unifilar::{Derivation, NodeId};
use unifilar::model::{ConductorMaterial, Voltage};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let amps = AmpRating::new;

    let lighting = DeviceNode::differential("id-1", Poles::Four, amps(40)?, Some(Sensitivity::Ma30))
        .with_child(
            DeviceNode::breaker("pia-1", Poles::Two, amps(10)?).with_child(
                DeviceNode::final_circuit("luz-1", Poles::Two, amps(10)?, UsageCategory::Lighting)
                    .with_section(1.5),
            ),
        )
        .with_child(
            DeviceNode::breaker("pia-2", Poles::Two, amps(16)?).with_child(
                DeviceNode::final_circuit("banos", Poles::Two, amps(16)?, UsageCategory::WetAreas)
                    .with_section(2.5),
            ),
        );

    let mut panel = Panel::new("cg", "Cuadro general")
        .with_root(DeviceNode::main_breaker("iga", Poles::Two, amps(40)?).with_child(lighting));

    // Structural edits go through TreeOps and are checked.
    panel.insert_child(
        &NodeId::from("id-1"),
        DeviceNode::breaker("pia-3", Poles::Two, amps(25)?).with_child(
            DeviceNode::final_circuit("horno", Poles::Two, amps(25)?, UsageCategory::Other)
                .with_user_name("Horno")
                .with_section(6.0),
        ),
    )?;

    let derivation = Derivation::new(Voltage::V230, 16.0, ConductorMaterial::Cu, "RZ1-K (AS)");
    let schematic = Schematic::new("demo", "Vivienda", derivation).with_panel(panel).prepared();

    println!("Derivation: {}", schematic.derivation.nomenclature_text());
    for panel in &schematic.panels {
        println!("{}", panel.name);
        for node in panel.iter_pre_order() {
            println!(
                "  {:<4} {:<10} {}",
                node.circuit_code().unwrap_or(""),
                node.id,
                node.label()
            );
        }
    }

    let diagram = UnifilarCore::render(&schematic, &SheetConfig::default())?;
    let symbols = diagram
        .commands
        .iter()
        .filter(|c| matches!(c, DrawCommand::PlaceSymbol { .. }))
        .count();
    println!();
    println!("{} pages, {} symbols", diagram.page_count, symbols);
    Ok(())
}
