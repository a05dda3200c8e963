//! Unifilar - single-line diagram engine for low-voltage installations
//!
//! A panel (cuadro) is a forest of protection devices: the main breaker
//! (IGA) feeds residual-current devices (ID), which feed branch breakers
//! (PIA), which feed final circuits. This crate keeps the derived data of
//! those trees consistent and lays them out on fixed-size sheets.
//!
//! # Quick Start
//!
//! ```no_run
//! use unifilar::{SheetConfig, UnifilarCore};
//! use std::path::Path;
//!
//! let schematic = UnifilarCore::load_schematic(Path::new("vivienda.json")).unwrap();
//! let diagram = UnifilarCore::render(&schematic, &SheetConfig::default()).unwrap();
//!
//! println!("{} pages, {} draw commands", diagram.page_count, diagram.commands.len());
//! ```
//!
//! # Features
//!
//! - **Tree operations**: insert, delete, move and pre-order traversal
//! - **Derived data**: circuit codes, labels and pole propagation
//! - **Legacy bridge**: conversion to and from the flat panel shape
//! - **Layout**: greedy page planning and canvas-agnostic draw commands

pub mod core;
pub mod flat;
pub mod layout;
pub mod model;
pub mod tree;

// Re-export main types
pub use crate::core::{PanelPlan, UnifilarCore, UnifilarError};
pub use flat::{expand_from_simple_shape, flatten_to_simple_shape, Flattened, SimplePanel};
pub use layout::{Canvas, Diagram, DiagramRenderer, DrawCommand, PageLayoutPlanner, SheetConfig};
pub use model::{
    AmpRating, Derivation, DeviceKind, DeviceNode, NodeId, Panel, Poles, Schematic, Sensitivity,
    UsageCategory,
};
pub use tree::{propagate_poles_from_main, recalculate_circuit_numbering, TreeError, TreeOps};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        AmpRating, DeviceNode, Panel, Poles, Schematic, Sensitivity, SheetConfig, TreeOps,
        UnifilarCore, UnifilarError, UsageCategory,
    };
}
