//! Sheet geometry.
//!
//! All lengths are in canvas units (PDF points for the default A4
//! landscape sheet). Every field has a default, so a configuration file
//! only needs the values it overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::planner::PageLayout;
use super::LayoutError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SheetConfig {
    pub page_width: f64,
    pub page_height: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,

    /// Left column holding the main breaker and the table row titles.
    pub main_column_width: f64,
    /// Width of one circuit column (`W`).
    pub column_width: f64,
    /// Gap after every differential block (`G`).
    pub block_gap: f64,

    pub title_height: f64,
    pub feed_height: f64,
    pub main_breaker_height: f64,
    pub surge_arrester_height: f64,
    pub main_bus_height: f64,
    pub differential_height: f64,
    pub sub_bus_height: f64,
    pub breaker_height: f64,
    pub table_row_height: f64,
    /// Vertical space between two strips stacked on one sheet.
    pub strip_gap: f64,

    /// Symbol box as a fraction of the band height.
    pub symbol_scale: f64,
    pub symbol_width: f64,

    pub title_font_size: f64,
    pub font_size: f64,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            page_width: 842.0,
            page_height: 595.0,
            margin_left: 30.0,
            margin_right: 30.0,
            margin_top: 30.0,
            margin_bottom: 30.0,
            main_column_width: 70.0,
            column_width: 48.0,
            block_gap: 16.0,
            title_height: 18.0,
            feed_height: 24.0,
            main_breaker_height: 44.0,
            surge_arrester_height: 28.0,
            main_bus_height: 12.0,
            differential_height: 52.0,
            sub_bus_height: 16.0,
            breaker_height: 48.0,
            table_row_height: 14.0,
            strip_gap: 12.0,
            symbol_scale: 0.6,
            symbol_width: 16.0,
            title_font_size: 10.0,
            font_size: 6.5,
        }
    }
}

/// Rows of the circuit data table.
pub const TABLE_ROWS: [&str; 5] = ["Circuito", "Denominación", "Protección", "Sección", "Uso"];

impl SheetConfig {
    /// Load overrides from a JSON file; missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, crate::UnifilarError> {
        let content = std::fs::read_to_string(path)?;
        let config: SheetConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Width available to differential blocks on one strip (`Max`).
    pub fn usable_width(&self) -> f64 {
        self.page_width - self.margin_left - self.margin_right - self.main_column_width
    }

    pub fn usable_height(&self) -> f64 {
        self.page_height - self.margin_top - self.margin_bottom
    }

    pub fn table_height(&self) -> f64 {
        self.table_row_height * TABLE_ROWS.len() as f64
    }

    /// Height of one strip, with or without the surge-arrester band.
    pub fn strip_height(&self, surge_protection: bool) -> f64 {
        let surge = if surge_protection {
            self.surge_arrester_height
        } else {
            0.0
        };
        self.title_height
            + self.feed_height
            + self.main_breaker_height
            + surge
            + self.main_bus_height
            + self.differential_height
            + self.sub_bus_height
            + self.breaker_height
            + self.table_height()
    }

    pub fn page_layout(&self) -> PageLayout {
        PageLayout {
            column_width: self.column_width,
            gap: self.block_gap,
            max_width: self.usable_width(),
        }
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.column_width <= 0.0 {
            return Err(LayoutError::InvalidSheet(format!(
                "column width must be positive, got {}",
                self.column_width
            )));
        }
        if self.block_gap < 0.0 {
            return Err(LayoutError::InvalidSheet(format!(
                "block gap cannot be negative, got {}",
                self.block_gap
            )));
        }
        if self.usable_width() <= 0.0 {
            return Err(LayoutError::InvalidSheet(format!(
                "no usable width left: page {} minus margins and main column",
                self.page_width
            )));
        }
        if self.strip_height(true) > self.usable_height() {
            return Err(LayoutError::InvalidSheet(format!(
                "strip height {} exceeds usable page height {}",
                self.strip_height(true),
                self.usable_height()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_sheet_is_valid() {
        let config = SheetConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.usable_width(), 712.0);
        assert_eq!(config.page_layout().max_width, 712.0);
    }

    #[test]
    fn test_partial_json_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"pageWidth": 1191.0, "columnWidth": 40}}"#).unwrap();

        let config = SheetConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.page_width, 1191.0);
        assert_eq!(config.column_width, 40.0);
        assert_eq!(config.block_gap, SheetConfig::default().block_gap);
    }

    #[test]
    fn test_degenerate_sheets_are_rejected() {
        let narrow = SheetConfig {
            page_width: 100.0,
            ..SheetConfig::default()
        };
        assert!(matches!(narrow.validate(), Err(LayoutError::InvalidSheet(_))));

        let short = SheetConfig {
            page_height: 200.0,
            ..SheetConfig::default()
        };
        assert!(short.validate().is_err());

        let zero_column = SheetConfig {
            column_width: 0.0,
            ..SheetConfig::default()
        };
        assert!(zero_column.validate().is_err());
    }
}
