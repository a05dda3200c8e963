//! SVG canvas: one standalone SVG document per sheet.

use unifilar::layout::{Canvas, TextAnchor, TextStyle};

const FONT_FAMILY: &str = "Helvetica, Arial, sans-serif";
const STROKE: &str = r#"fill="none" stroke="black" stroke-width="0.8""#;

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn anchor(a: TextAnchor) -> &'static str {
    match a {
        TextAnchor::Start => "start",
        TextAnchor::Middle => "middle",
        TextAnchor::End => "end",
    }
}

pub struct SvgCanvas {
    width: f64,
    height: f64,
    pages: Vec<Vec<String>>,
    path: String,
}

impl SvgCanvas {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            pages: vec![Vec::new()],
            path: String::new(),
        }
    }

    fn current(&mut self) -> &mut Vec<String> {
        if self.pages.is_empty() {
            self.pages.push(Vec::new());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// Finished documents, one per sheet.
    pub fn finish(mut self) -> Vec<String> {
        self.stroke();
        let (w, h) = (self.width, self.height);
        self.pages
            .into_iter()
            .map(|elements| {
                let mut parts = vec![
                    format!(
                        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
                    ),
                    format!(r#"<rect width="{w}" height="{h}" fill="white"/>"#),
                ];
                parts.extend(elements);
                parts.push("</svg>".to_string());
                parts.join("\n")
            })
            .collect()
    }
}

impl Canvas for SvgCanvas {
    fn move_to(&mut self, x: f64, y: f64) {
        self.path.push_str(&format!("M{x} {y} "));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.path.push_str(&format!("L{x} {y} "));
    }

    fn stroke(&mut self) {
        if self.path.is_empty() {
            return;
        }
        let d = std::mem::take(&mut self.path);
        let element = format!(r#"<path d="{}" {STROKE}/>"#, d.trim_end());
        self.current().push(element);
    }

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let element = format!(r#"<rect x="{x}" y="{y}" width="{width}" height="{height}" {STROKE}/>"#);
        self.current().push(element);
    }

    fn ellipse(&mut self, cx: f64, cy: f64, rx: f64, ry: f64) {
        let element = format!(r#"<ellipse cx="{cx}" cy="{cy}" rx="{rx}" ry="{ry}" {STROKE}/>"#);
        self.current().push(element);
    }

    fn text(&mut self, text: &str, x: f64, y: f64, style: &TextStyle) {
        let weight = if style.bold { r#" font-weight="bold""# } else { "" };
        let element = format!(
            r#"<text x="{x}" y="{y}" font-family="{FONT_FAMILY}" font-size="{}" text-anchor="{}"{weight}>{}</text>"#,
            style.size,
            anchor(style.anchor),
            escape(text)
        );
        self.current().push(element);
    }

    fn new_page(&mut self) {
        self.stroke();
        self.pages.push(Vec::new());
    }
}
