//! Entry points shared by the CLI and any embedding application.
//! No file format other than the JSON schematic document is involved.

use std::path::Path;

use crate::flat::{flatten_to_simple_shape, Flattened};
use crate::layout::{differential_blocks, Diagram, DiagramRenderer, LayoutError, PlannedPage, SheetConfig};
use crate::model::Schematic;
use crate::tree::TreeError;

#[derive(Debug, thiserror::Error)]
pub enum UnifilarError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid tree: {0}")]
    Tree(#[from] TreeError),
    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),
    #[error("Panel not found: {0}")]
    PanelNotFound(String),
}

/// Page plan of one panel.
#[derive(Debug, Clone)]
pub struct PanelPlan {
    pub panel_id: String,
    pub panel_name: String,
    pub block_count: usize,
    pub circuit_count: usize,
    pub pages: Vec<PlannedPage>,
}

/// Stateless facade over the engine passes.
pub struct UnifilarCore;

impl UnifilarCore {
    /// Read and validate a schematic document. Legacy panels are expanded.
    pub fn load_schematic(path: &Path) -> Result<Schematic, UnifilarError> {
        let content = std::fs::read_to_string(path)?;
        let schematic = Self::from_json(&content)?;
        tracing::info!(
            "Loaded schematic {} from {} ({} panels)",
            schematic.id,
            path.display(),
            schematic.panels.len()
        );
        Ok(schematic)
    }

    pub fn from_json(content: &str) -> Result<Schematic, UnifilarError> {
        let mut schematic: Schematic = serde_json::from_str(content)?;
        let expanded = schematic.expand_legacy_panels();
        if expanded > 0 {
            tracing::info!("Expanded {} legacy panels", expanded);
        }
        schematic.validate()?;
        Ok(schematic)
    }

    pub fn to_json(schematic: &Schematic) -> Result<String, UnifilarError> {
        Ok(serde_json::to_string_pretty(schematic)?)
    }

    /// Poles and numbering brought up to date on a copy.
    pub fn prepare(schematic: &Schematic) -> Schematic {
        schematic.prepared()
    }

    pub fn flatten(schematic: &Schematic, panel_id: &str) -> Result<Flattened, UnifilarError> {
        let panel = schematic
            .panel(panel_id)
            .ok_or_else(|| UnifilarError::PanelNotFound(panel_id.to_string()))?;
        Ok(flatten_to_simple_shape(panel))
    }

    /// Page plan of every panel, in document order.
    pub fn plan(schematic: &Schematic, config: &SheetConfig) -> Result<Vec<PanelPlan>, UnifilarError> {
        let renderer = DiagramRenderer::new(config)?;
        Ok(schematic
            .panels
            .iter()
            .map(|panel| {
                let blocks = differential_blocks(panel);
                PanelPlan {
                    panel_id: panel.id.clone(),
                    panel_name: panel.name.clone(),
                    block_count: blocks.len(),
                    circuit_count: blocks.iter().map(|b| b.circuit_count()).sum(),
                    pages: renderer.planner().plan(&blocks),
                }
            })
            .collect())
    }

    /// Prepare and render the whole schematic.
    pub fn render(schematic: &Schematic, config: &SheetConfig) -> Result<Diagram, UnifilarError> {
        let renderer = DiagramRenderer::new(config)?;
        let prepared = schematic.prepared();
        let diagram = renderer.render(&prepared);
        tracing::info!(
            "Rendered schematic {}: {} pages",
            schematic.id,
            diagram.page_count
        );
        Ok(diagram)
    }
}
