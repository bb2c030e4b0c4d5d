//! Read-only geometry the annotations are laid out against.
//!
//! The full stave and tick formatting engines live elsewhere; this module only
//! describes what the text layout needs from them, plus small concrete
//! implementations for standalone use.

use serde::{Deserialize, Serialize};

/// Where a stave modifier attaches relative to its stave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModifierPosition {
    Center,
    Left,
    Right,
    Above,
    Below,
    Begin,
    End,
}

/// Vertical and horizontal queries answered by a stave.
pub trait StaveGeometry {
    fn get_x(&self) -> f64;
    fn get_width(&self) -> f64;
    /// Pixel y of a stave line; fractional and negative lines are allowed.
    fn get_y_for_line(&self, line: f64) -> f64;
    fn get_bottom_line_y(&self) -> f64;
    /// Reserved y-slot `lines` text lines above the stave.
    fn get_y_for_top_text(&self, lines: u32) -> f64;
    /// Reserved y-slot `lines` text lines below the stave.
    fn get_y_for_bottom_text(&self, lines: u32) -> f64;
}

/// The horizontal time slot an annotation occupies.
pub trait TickContext {
    /// Absolute x of the slot.
    fn get_x(&self) -> f64;
    /// Pixel width reserved for the slot's primary glyph.
    fn glyph_px(&self) -> f64;
}

// ═══════════════════════════════════════════════════════════════════════
// Stave
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaveOptions {
    pub spacing_between_lines_px: f64,
    pub space_above_staff_ln: f64,
    pub num_lines: u32,
    pub top_text_position: f64,
    pub bottom_text_position: f64,
}

impl Default for StaveOptions {
    fn default() -> Self {
        Self {
            spacing_between_lines_px: 10.0,
            space_above_staff_ln: 4.0,
            num_lines: 5,
            top_text_position: 1.0,
            bottom_text_position: 4.0,
        }
    }
}

/// A plain five-line stave positioned at `(x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stave {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    #[serde(default)]
    pub options: StaveOptions,
}

impl Stave {
    pub fn new(x: f64, y: f64, width: f64) -> Self {
        Self {
            x,
            y,
            width,
            options: StaveOptions::default(),
        }
    }
}

impl StaveGeometry for Stave {
    fn get_x(&self) -> f64 {
        self.x
    }

    fn get_width(&self) -> f64 {
        self.width
    }

    fn get_y_for_line(&self, line: f64) -> f64 {
        let spacing = self.options.spacing_between_lines_px;
        self.y + line * spacing + self.options.space_above_staff_ln * spacing
    }

    fn get_bottom_line_y(&self) -> f64 {
        self.get_y_for_line(f64::from(self.options.num_lines))
    }

    fn get_y_for_top_text(&self, lines: u32) -> f64 {
        self.get_y_for_line(-f64::from(lines) - self.options.top_text_position)
    }

    fn get_y_for_bottom_text(&self, lines: u32) -> f64 {
        self.get_y_for_line(self.options.bottom_text_position + f64::from(lines))
    }
}

/// A resolved tick slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TickSlot {
    pub x: f64,
    pub glyph_px: f64,
}

impl TickSlot {
    pub fn new(x: f64, glyph_px: f64) -> Self {
        Self { x, glyph_px }
    }
}

impl TickContext for TickSlot {
    fn get_x(&self) -> f64 {
        self.x
    }

    fn glyph_px(&self) -> f64 {
        self.glyph_px
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stave_line_positions() {
        let stave = Stave::new(10.0, 40.0, 300.0);
        // Four line-spaces of headroom above the top line.
        assert_eq!(stave.get_y_for_line(0.0), 80.0);
        assert_eq!(stave.get_y_for_line(4.0), 120.0);
        assert_eq!(stave.get_y_for_line(-3.0), 50.0);
        assert_eq!(stave.get_bottom_line_y(), 130.0);
    }

    #[test]
    fn text_slots_sit_outside_the_stave() {
        let stave = Stave::new(0.0, 0.0, 300.0);
        assert_eq!(stave.get_y_for_top_text(2), stave.get_y_for_line(-3.0));
        assert_eq!(stave.get_y_for_bottom_text(2), stave.get_y_for_line(6.0));
        assert!(stave.get_y_for_top_text(2) < stave.get_y_for_line(0.0));
        assert!(stave.get_y_for_bottom_text(2) > stave.get_bottom_line_y());
    }
}
