use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{CampError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channels scaled to 0.0..=1.0 for PDF colour operators.
    pub fn as_unit(&self) -> (f32, f32, f32) {
        (
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        )
    }
}

pub const BLACK: Rgb = Rgb::new(0, 0, 0);
pub const LIGHT_BLUE: Rgb = Rgb::new(173, 216, 230);
pub const LIGHT_CORAL: Rgb = Rgb::new(240, 128, 128);
pub const LIGHT_GREEN: Rgb = Rgb::new(144, 238, 144);
pub const LIGHT_GOLDENROD_YELLOW: Rgb = Rgb::new(250, 250, 210);
pub const THISTLE: Rgb = Rgb::new(216, 191, 216);
pub const LIGHT_PINK: Rgb = Rgb::new(255, 182, 193);
pub const LIGHT_CYAN: Rgb = Rgb::new(224, 255, 255);
pub const WHEAT: Rgb = Rgb::new(245, 222, 179);
pub const LAVENDER: Rgb = Rgb::new(230, 230, 250);
pub const KHAKI: Rgb = Rgb::new(240, 230, 140);

/// Card background colour per group name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub colors: BTreeMap<String, Rgb>,
    pub fallback: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        let colors = [
            ("A", LIGHT_BLUE),
            ("B", LIGHT_CORAL),
            ("C", LIGHT_GREEN),
            ("D", LIGHT_GOLDENROD_YELLOW),
            ("E", THISTLE),
            ("F", LIGHT_PINK),
            ("G", LIGHT_CYAN),
            ("H", WHEAT),
            ("I", LAVENDER),
            ("O", KHAKI),
        ]
        .into_iter()
        .map(|(name, color)| (name.to_string(), color))
        .collect();

        Self {
            colors,
            fallback: LIGHT_BLUE,
        }
    }
}

impl Palette {
    pub fn color_for(&self, group_name: &str) -> Rgb {
        self.colors.get(group_name).copied().unwrap_or(self.fallback)
    }
}

/// Geometry and typography of the card sheet. All lengths in millimetres,
/// font sizes in points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardLayout {
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub card_width_mm: f32,
    pub card_height_mm: f32,
    pub margin_x_mm: f32,
    pub margin_y_mm: f32,
    pub gap_x_mm: f32,
    pub gap_y_mm: f32,
    pub columns: usize,
    pub rows: usize,
    /// Horizontal space not available to text, split across both sides
    pub text_padding_mm: f32,
    pub name_font_size: f32,
    pub body_font_size: f32,
    /// Added to the font size to get the line height
    pub line_gap_pt: f32,
    pub name_max_chars: usize,
    pub name_offset_mm: f32,
    pub group_offset_mm: f32,
    pub origin_offset_mm: f32,
    pub room_offset_mm: f32,
    pub palette: Palette,
}

impl Default for CardLayout {
    fn default() -> Self {
        Self {
            // A4
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            card_width_mm: 85.0,
            card_height_mm: 54.0,
            margin_x_mm: 10.0,
            margin_y_mm: 15.0,
            gap_x_mm: 5.0,
            gap_y_mm: 10.0,
            columns: 2,
            rows: 3,
            text_padding_mm: 10.0,
            name_font_size: 12.0,
            body_font_size: 10.0,
            line_gap_pt: 2.0,
            name_max_chars: 20,
            name_offset_mm: 40.0,
            group_offset_mm: 30.0,
            origin_offset_mm: 20.0,
            room_offset_mm: 10.0,
            palette: Palette::default(),
        }
    }
}

impl CardLayout {
    pub fn cards_per_page(&self) -> usize {
        self.columns * self.rows
    }

    /// Lower-left corner of slot `slot` on a page. Slots fill left to right,
    /// then top to bottom.
    pub fn slot_origin(&self, slot: usize) -> (f32, f32) {
        let col = (slot % self.columns) as f32;
        let row = (slot / self.columns) as f32;
        let x = self.margin_x_mm + col * (self.card_width_mm + self.gap_x_mm);
        let y = self.page_height_mm
            - self.margin_y_mm
            - (row + 1.0) * self.card_height_mm
            - row * self.gap_y_mm;
        (x, y)
    }

    /// Width available to a line of text on a card.
    pub fn text_width_mm(&self) -> f32 {
        self.card_width_mm - self.text_padding_mm
    }

    pub fn validate(&self) -> Result<()> {
        if self.columns == 0 || self.rows == 0 {
            return Err(CampError::InvalidConfig(
                "card layout needs at least one column and one row".to_string(),
            ));
        }
        if self.card_width_mm <= 0.0 || self.card_height_mm <= 0.0 {
            return Err(CampError::InvalidConfig("card size must be positive".to_string()));
        }
        if self.text_width_mm() <= 0.0 {
            return Err(CampError::InvalidConfig(
                "text padding leaves no room for text".to_string(),
            ));
        }
        if self.name_max_chars < 4 {
            return Err(CampError::InvalidConfig(
                "name budget must allow at least one character plus an ellipsis".to_string(),
            ));
        }
        Ok(())
    }
}
