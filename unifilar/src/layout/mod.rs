//! Sheet layout: splitting a panel into differential blocks, packing the
//! blocks into fixed-width pages and turning pages into draw commands for
//! an external canvas.
//!
//! ```text
//! Panel ──▶ differential_blocks ──▶ PageLayoutPlanner ──▶ DiagramRenderer ──▶ [DrawCommand] ──▶ Canvas
//! ```

pub mod blocks;
pub mod canvas;
pub mod config;
pub mod planner;
pub mod renderer;

use thiserror::Error;

pub use blocks::{differential_blocks, CircuitColumn, DifferentialBlock};
pub use canvas::{replay, Canvas, DrawCommand, Symbol, TextAnchor, TextStyle};
pub use config::SheetConfig;
pub use planner::{PageLayout, PageLayoutPlanner, PlannedPage};
pub use renderer::{Diagram, DiagramRenderer};

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Invalid sheet configuration: {0}")]
    InvalidSheet(String),
}
