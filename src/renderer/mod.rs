//! Annotation renderer: lays out text against the timeline and the stave.
//!
//! [`TextNote`] sits in a tick slot like any other note and is drawn relative
//! to its time position. [`StaveText`] hangs off a stave edge and is laid out
//! again on every draw.

mod constants;
mod stave_text;
mod text_note;

use serde::{Deserialize, Serialize};

use crate::context::RenderContext;

pub use constants::{
    GLYPH_POINT, SCRIPT_GAP, SCRIPT_SCALE, STAVE_TEXT_BASELINE_NUDGE, STAVE_TEXT_LINES,
    STAVE_TEXT_MARGIN, STAVE_TEXT_WIDTH, TEXT_LINE_OFFSET,
};
pub use stave_text::{stave_text_position, StaveText, StaveTextOptions};
pub use text_note::{glyph_code, FormatMetrics, TextNote, TextNoteState, TextNoteStruct, GLYPHS};

// ═══════════════════════════════════════════════════════════════════════
// Shared value types
// ═══════════════════════════════════════════════════════════════════════

/// Horizontal alignment relative to an anchor point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Justification {
    #[default]
    Left,
    Center,
    Right,
}

impl Justification {
    /// How far the left edge moves left of the anchor for content `width` wide.
    pub fn offset(self, width: f64) -> f64 {
        match self {
            Justification::Left => 0.0,
            Justification::Center => width / 2.0,
            Justification::Right => width,
        }
    }
}

/// Per-element drawing style; unset fields leave the context untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementStyle {
    pub fill_style: Option<String>,
    pub stroke_style: Option<String>,
    pub shadow_color: Option<String>,
    pub shadow_blur: Option<f64>,
    pub line_width: Option<f64>,
}

impl ElementStyle {
    pub fn is_empty(&self) -> bool {
        *self == ElementStyle::default()
    }

    pub fn apply<C: RenderContext>(&self, ctx: &mut C) {
        if let Some(color) = &self.shadow_color {
            ctx.set_shadow_color(color);
        }
        if let Some(blur) = self.shadow_blur {
            ctx.set_shadow_blur(blur);
        }
        if let Some(style) = &self.fill_style {
            ctx.set_fill_style(style);
        }
        if let Some(style) = &self.stroke_style {
            ctx.set_stroke_style(style);
        }
        if let Some(width) = self.line_width {
            ctx.set_line_width(width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{CanvasContext, DrawCommand, RecordingCanvas};
    use pretty_assertions::assert_eq;

    #[test]
    fn justification_offsets() {
        assert_eq!(Justification::Left.offset(30.0), 0.0);
        assert_eq!(Justification::Center.offset(30.0), 15.0);
        assert_eq!(Justification::Right.offset(30.0), 30.0);
        let j: Justification = serde_json::from_str(r#""center""#).unwrap();
        assert_eq!(j, Justification::Center);
    }

    #[test]
    fn style_applies_only_set_fields() {
        let style = ElementStyle {
            fill_style: Some("red".into()),
            line_width: Some(3.0),
            ..Default::default()
        };
        let mut ctx = CanvasContext::new(RecordingCanvas::new(10, 10));
        style.apply(&mut ctx);
        assert_eq!(
            ctx.surface().commands(),
            &[
                DrawCommand::SetFillStyle { style: "red".into() },
                DrawCommand::SetLineWidth { width: 3.0 },
            ]
        );
        assert!(ElementStyle::default().is_empty());
        assert!(!style.is_empty());
    }
}
