//! Draw commands and the canvas collaborator.
//!
//! The renderer only decides what goes where; a [`Canvas`] implementation
//! (PDF writer, SVG builder, test recorder...) does the drawing. Symbol
//! positions are the top-centre of the symbol box.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symbol {
    MainBreaker,
    Breaker,
    Differential,
    SurgeArrester,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAnchor {
    #[default]
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub size: f64,
    pub anchor: TextAnchor,
    pub bold: bool,
}

impl TextStyle {
    pub fn new(size: f64, anchor: TextAnchor) -> Self {
        Self {
            size,
            anchor,
            bold: false,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DrawCommand {
    PlaceSymbol {
        symbol: Symbol,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    DrawLine {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    DrawText {
        text: String,
        x: f64,
        y: f64,
        style: TextStyle,
    },
    NewPage,
}

/// Vector drawing surface in page coordinates (origin top-left, y down).
pub trait Canvas {
    fn move_to(&mut self, x: f64, y: f64);

    fn line_to(&mut self, x: f64, y: f64);

    fn stroke(&mut self);

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    fn ellipse(&mut self, cx: f64, cy: f64, rx: f64, ry: f64);

    fn text(&mut self, text: &str, x: f64, y: f64, style: &TextStyle);

    fn new_page(&mut self);

    /// Draw a symbol from primitives. Override for richer glyphs.
    fn place_symbol(&mut self, symbol: Symbol, x: f64, y: f64, width: f64, height: f64) {
        let left = x - width / 2.0;
        match symbol {
            Symbol::MainBreaker | Symbol::Breaker => {
                self.rect(left, y, width, height);
                // Open contact.
                self.move_to(x, y + height * 0.8);
                self.line_to(left + width * 0.8, y + height * 0.2);
                self.stroke();
                if symbol == Symbol::MainBreaker {
                    self.move_to(left, y + height / 2.0);
                    self.line_to(left + width, y + height / 2.0);
                    self.stroke();
                }
            }
            Symbol::Differential => {
                self.rect(left, y, width, height);
                let r = width.min(height) * 0.3;
                self.ellipse(x, y + height / 2.0, r, r);
            }
            Symbol::SurgeArrester => {
                self.rect(left, y, width, height * 0.7);
                self.move_to(x, y + height * 0.15);
                self.line_to(x, y + height * 0.55);
                self.stroke();
                // Earth.
                self.move_to(x, y + height * 0.7);
                self.line_to(x, y + height);
                self.move_to(left, y + height);
                self.line_to(left + width, y + height);
                self.stroke();
            }
        }
    }
}

/// Feed a command list to a canvas, in order.
pub fn replay(commands: &[DrawCommand], canvas: &mut dyn Canvas) {
    for command in commands {
        match command {
            DrawCommand::PlaceSymbol {
                symbol,
                x,
                y,
                width,
                height,
            } => canvas.place_symbol(*symbol, *x, *y, *width, *height),
            DrawCommand::DrawLine { x1, y1, x2, y2 } => {
                canvas.move_to(*x1, *y1);
                canvas.line_to(*x2, *y2);
                canvas.stroke();
            }
            DrawCommand::DrawText { text, x, y, style } => canvas.text(text, *x, *y, style),
            DrawCommand::NewPage => canvas.new_page(),
        }
    }
}
