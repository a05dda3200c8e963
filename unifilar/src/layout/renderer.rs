//! Diagram rendering.
//!
//! Each planned page becomes a horizontal strip with fixed vertical bands:
//!
//! ```text
//! title
//! feed (derivation)        │
//! main breaker            [IGA]
//! surge arrester (opt.)    ├──[SPD]
//! main bus                 ┴────┬──────────────┬─────
//! differential row             [ID]           [ID]
//! sub-bus                   ┌───┴───┐          │
//! breaker row             [PIA]   [PIA]      [PIA]
//! circuit table           | C1  |  C2  |     | C3  |
//! ```
//!
//! Strips stack down a sheet; when the next strip does not fit the
//! remaining height a page break is emitted and stacking restarts at the
//! top of a new sheet. Each panel starts on a fresh sheet.

use serde::Serialize;

use super::blocks::{differential_blocks, DifferentialBlock};
use super::canvas::{DrawCommand, Symbol, TextAnchor, TextStyle};
use super::config::{SheetConfig, TABLE_ROWS};
use super::planner::{PageLayoutPlanner, PlannedPage};
use super::LayoutError;
use crate::model::{format_section, Derivation, DeviceNode, Panel, Schematic};

/// Ordered drawing instructions for a whole schematic.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagram {
    pub page_count: usize,
    pub commands: Vec<DrawCommand>,
}

impl Diagram {
    /// Commands of each sheet, split at page breaks.
    pub fn pages(&self) -> Vec<&[DrawCommand]> {
        if self.commands.is_empty() {
            return Vec::new();
        }
        self.commands
            .split(|c| matches!(c, DrawCommand::NewPage))
            .collect()
    }
}

/// Vertical cursor over the current sheet plus the command sink.
struct Sheet<'c> {
    config: &'c SheetConfig,
    commands: Vec<DrawCommand>,
    y: f64,
    used: bool,
}

impl<'c> Sheet<'c> {
    fn new(config: &'c SheetConfig) -> Self {
        Self {
            config,
            commands: Vec::new(),
            y: config.margin_top,
            used: false,
        }
    }

    fn fits(&self, height: f64) -> bool {
        !self.used || self.y + height <= self.config.page_height - self.config.margin_bottom
    }

    fn break_page(&mut self) {
        if self.used {
            self.commands.push(DrawCommand::NewPage);
            self.y = self.config.margin_top;
            self.used = false;
        }
    }

    fn advance(&mut self, height: f64) {
        self.y += height + self.config.strip_gap;
        self.used = true;
    }

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.commands.push(DrawCommand::DrawLine { x1, y1, x2, y2 });
    }

    fn text(&mut self, text: &str, x: f64, y: f64, style: TextStyle) {
        if text.is_empty() {
            return;
        }
        self.commands.push(DrawCommand::DrawText {
            text: text.to_string(),
            x,
            y,
            style,
        });
    }

    fn symbol(&mut self, symbol: Symbol, x: f64, y: f64, width: f64, height: f64) {
        self.commands.push(DrawCommand::PlaceSymbol {
            symbol,
            x,
            y,
            width,
            height,
        });
    }

    fn finish(self) -> Diagram {
        let page_count = if self.commands.is_empty() {
            0
        } else {
            1 + self
                .commands
                .iter()
                .filter(|c| matches!(c, DrawCommand::NewPage))
                .count()
        };
        Diagram {
            page_count,
            commands: self.commands,
        }
    }
}

/// Band positions of one strip, absolute y.
struct Bands {
    title_baseline: f64,
    feed_top: f64,
    main_top: f64,
    main_bottom: f64,
    surge_top: Option<f64>,
    bus_y: f64,
    differential_top: f64,
    sub_bus_y: f64,
    breaker_top: f64,
    table_top: f64,
}

impl Bands {
    fn new(config: &SheetConfig, top: f64, surge_protection: bool) -> Self {
        let feed_top = top + config.title_height;
        let main_top = feed_top + config.feed_height;
        let main_bottom = main_top + config.main_breaker_height;
        let (surge_top, bus_y) = if surge_protection {
            (Some(main_bottom), main_bottom + config.surge_arrester_height)
        } else {
            (None, main_bottom)
        };
        let differential_top = bus_y + config.main_bus_height;
        let sub_bus_top = differential_top + config.differential_height;
        let breaker_top = sub_bus_top + config.sub_bus_height;
        Self {
            title_baseline: top + config.title_height * 0.7,
            feed_top,
            main_top,
            main_bottom,
            surge_top,
            bus_y,
            differential_top,
            sub_bus_y: sub_bus_top + config.sub_bus_height / 2.0,
            breaker_top,
            table_top: breaker_top + config.breaker_height,
        }
    }
}

pub struct DiagramRenderer<'c> {
    config: &'c SheetConfig,
    planner: PageLayoutPlanner,
}

impl<'c> DiagramRenderer<'c> {
    pub fn new(config: &'c SheetConfig) -> Result<Self, LayoutError> {
        config.validate()?;
        Ok(Self {
            config,
            planner: PageLayoutPlanner::new(config.page_layout()),
        })
    }

    pub fn planner(&self) -> &PageLayoutPlanner {
        &self.planner
    }

    /// Render every panel of a prepared schematic.
    pub fn render(&self, schematic: &Schematic) -> Diagram {
        let mut sheet = Sheet::new(self.config);
        for panel in &schematic.panels {
            sheet.break_page();
            self.render_panel(panel, &schematic.derivation, &mut sheet);
        }
        let diagram = sheet.finish();
        tracing::debug!(
            "Rendered {} panels into {} pages ({} commands)",
            schematic.panels.len(),
            diagram.page_count,
            diagram.commands.len()
        );
        diagram
    }

    /// Render a single panel on its own.
    pub fn render_single(&self, panel: &Panel, derivation: &Derivation) -> Diagram {
        let mut sheet = Sheet::new(self.config);
        self.render_panel(panel, derivation, &mut sheet);
        sheet.finish()
    }

    fn render_panel(&self, panel: &Panel, derivation: &Derivation, sheet: &mut Sheet<'_>) {
        let blocks = differential_blocks(panel);
        let pages = self.planner.plan(&blocks);
        let height = self.config.strip_height(panel.surge_protection);

        for (index, page) in pages.iter().enumerate() {
            if !sheet.fits(height) {
                sheet.break_page();
            }
            let title = if index == 0 {
                panel.name.clone()
            } else {
                format!("{} (cont. {}/{})", panel.name, index + 1, pages.len())
            };
            let feed = (index == 0).then(|| derivation.nomenclature_text());
            let top = sheet.y;
            self.paint_strip(sheet, panel, &title, feed.as_deref(), &blocks, page, top);
            sheet.advance(height);
        }
    }

    fn symbol_top(&self, band_top: f64, band_height: f64) -> f64 {
        band_top + band_height * (1.0 - self.config.symbol_scale) / 2.0
    }

    #[allow(clippy::too_many_arguments)]
    fn paint_strip(
        &self,
        sheet: &mut Sheet<'_>,
        panel: &Panel,
        title: &str,
        feed: Option<&str>,
        blocks: &[DifferentialBlock<'_>],
        page: &PlannedPage,
        top: f64,
    ) {
        let c = self.config;
        let bands = Bands::new(c, top, panel.surge_protection);
        let small = TextStyle::new(c.font_size, TextAnchor::Start);
        let centered = TextStyle::new(c.font_size, TextAnchor::Middle);
        let sym_w = c.symbol_width;

        let blocks_left = c.margin_left + c.main_column_width;
        let main_x = c.margin_left + c.main_column_width / 2.0;

        sheet.text(
            title,
            c.margin_left,
            bands.title_baseline,
            TextStyle::new(c.title_font_size, TextAnchor::Start).bold(),
        );

        // Main breaker column.
        let main = panel.main_breaker();
        if let Some(main) = main {
            if let Some(feed) = feed {
                sheet.text(
                    feed,
                    main_x + 4.0,
                    bands.feed_top + c.feed_height / 2.0,
                    small,
                );
            }
            let h = c.main_breaker_height * c.symbol_scale;
            let sym_y = self.symbol_top(bands.main_top, c.main_breaker_height);
            sheet.line(main_x, bands.feed_top, main_x, sym_y);
            sheet.symbol(Symbol::MainBreaker, main_x, sym_y, sym_w, h);
            sheet.text(main.label(), main_x + sym_w / 2.0 + 3.0, sym_y + h / 2.0, small);
            sheet.line(main_x, sym_y + h, main_x, bands.main_bottom);

            if let Some(surge_top) = bands.surge_top {
                let tap_y = surge_top + c.surge_arrester_height * 0.3;
                let arrester_x = main_x - c.main_column_width / 4.0;
                sheet.line(main_x, surge_top, main_x, bands.bus_y);
                sheet.line(main_x, tap_y, arrester_x, tap_y);
                sheet.symbol(
                    Symbol::SurgeArrester,
                    arrester_x,
                    tap_y,
                    sym_w * 0.75,
                    c.surge_arrester_height * 0.6,
                );
            }
        }

        // Row titles of the circuit table.
        let row_h = c.table_row_height;
        for (row, name) in TABLE_ROWS.iter().enumerate() {
            let y = bands.table_top + row as f64 * row_h + row_h * 0.7;
            sheet.text(name, blocks_left - 3.0, y, TextStyle::new(c.font_size, TextAnchor::End));
        }

        let table_bottom = bands.table_top + c.table_height();
        let mut x = blocks_left;
        let mut bus_end = if main.is_some() { main_x } else { blocks_left };
        let mut table_right = blocks_left;

        for block in &blocks[page.blocks.clone()] {
            let inner = block.column_count() as f64 * c.column_width;
            let center = x + inner / 2.0;
            bus_end = bus_end.max(center);

            match block.differential {
                Some(diff) => {
                    let h = c.differential_height * c.symbol_scale;
                    let sym_y = self.symbol_top(bands.differential_top, c.differential_height);
                    sheet.line(center, bands.bus_y, center, sym_y);
                    sheet.symbol(Symbol::Differential, center, sym_y, sym_w, h);
                    sheet.text(diff.label(), center + sym_w / 2.0 + 2.0, sym_y + h / 2.0, small);
                    if !block.circuits.is_empty() {
                        sheet.line(center, sym_y + h, center, bands.sub_bus_y);
                    }
                }
                None => sheet.line(center, bands.bus_y, center, bands.sub_bus_y),
            }

            let column_x = |i: usize| x + i as f64 * c.column_width + c.column_width / 2.0;
            if block.circuits.len() > 1 {
                let last = column_x(block.circuits.len() - 1);
                sheet.line(column_x(0), bands.sub_bus_y, last, bands.sub_bus_y);
            }

            for (i, column) in block.circuits.iter().enumerate() {
                let cx = column_x(i);
                match column.breaker {
                    Some(breaker) => {
                        let h = c.breaker_height * c.symbol_scale;
                        let sym_y = self.symbol_top(bands.breaker_top, c.breaker_height);
                        sheet.line(cx, bands.sub_bus_y, cx, sym_y);
                        sheet.symbol(Symbol::Breaker, cx, sym_y, sym_w, h);
                        sheet.text(breaker.label(), cx + sym_w / 2.0 + 1.0, sym_y + h / 2.0, small);
                        sheet.line(cx, sym_y + h, cx, bands.table_top);
                    }
                    None => sheet.line(cx, bands.sub_bus_y, cx, bands.table_top),
                }

                let left = x + i as f64 * c.column_width;
                sheet.line(left, bands.table_top, left, table_bottom);
                for (row, value) in table_cells(column.breaker, column.circuit)
                    .iter()
                    .enumerate()
                {
                    let y = bands.table_top + row as f64 * row_h + row_h * 0.7;
                    sheet.text(value, cx, y, centered);
                }
                table_right = table_right.max(left + c.column_width);
            }
            if !block.circuits.is_empty() {
                sheet.line(table_right, bands.table_top, table_right, table_bottom);
            }

            x += inner + c.block_gap;
        }

        // Main bus across every drop of the strip.
        let bus_start = if main.is_some() { main_x } else { blocks_left };
        let bus_end = bus_end.max(bus_start + c.column_width / 2.0);
        sheet.line(bus_start, bands.bus_y, bus_end, bands.bus_y);

        if table_right > blocks_left {
            for row in 0..=TABLE_ROWS.len() {
                let y = bands.table_top + row as f64 * row_h;
                sheet.line(blocks_left, y, table_right, y);
            }
        }
    }
}

/// Circuit table values, in [`TABLE_ROWS`] order.
fn table_cells(breaker: Option<&DeviceNode>, circuit: &DeviceNode) -> [String; 5] {
    let rated = breaker.unwrap_or(circuit);
    [
        circuit.circuit_code().unwrap_or_default().to_string(),
        circuit.label().to_string(),
        format!("{} {}", rated.poles, rated.amp_rating),
        circuit
            .section_mm2
            .map(|s| format!("{} mm²", format_section(s)))
            .unwrap_or_default(),
        circuit.category_name().unwrap_or_default().to_string(),
    ]
}
