//! Stave-attached text: tempo marks, section labels, instrument names.

use kurbo::Point;
use serde::{Deserialize, Serialize};

use super::constants::*;
use super::Justification;
use crate::context::RenderContext;
use crate::error::{RenderError, Result};
use crate::font::{FontDescriptor, FontInfo, FontStyle, FontWeight};
use crate::stave::{ModifierPosition, StaveGeometry};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaveTextOptions {
    pub shift_x: f64,
    pub shift_y: f64,
    pub justification: Justification,
}

impl Default for StaveTextOptions {
    fn default() -> Self {
        Self {
            shift_x: 0.0,
            shift_y: 0.0,
            justification: Justification::Center,
        }
    }
}

/// Where text `text_width` wide is drawn for `position` against `stave`,
/// before the baseline nudge.
pub fn stave_text_position(
    stave: &dyn StaveGeometry,
    position: ModifierPosition,
    options: &StaveTextOptions,
    text_width: f64,
) -> Result<Point> {
    match position {
        ModifierPosition::Left | ModifierPosition::Right => {
            let y = (stave.get_y_for_line(0.0) + stave.get_bottom_line_y()) / 2.0 + options.shift_y;
            let x = if position == ModifierPosition::Left {
                stave.get_x() - text_width - STAVE_TEXT_MARGIN + options.shift_x
            } else {
                stave.get_x() + stave.get_width() + STAVE_TEXT_MARGIN + options.shift_x
            };
            Ok(Point::new(x, y))
        }
        ModifierPosition::Above | ModifierPosition::Below => {
            let free = stave.get_width() - text_width;
            let x = stave.get_x()
                + options.shift_x
                + match options.justification {
                    Justification::Left => 0.0,
                    Justification::Center => free / 2.0,
                    Justification::Right => free,
                };
            let slot = if position == ModifierPosition::Above {
                stave.get_y_for_top_text(STAVE_TEXT_LINES)
            } else {
                stave.get_y_for_bottom_text(STAVE_TEXT_LINES)
            };
            Ok(Point::new(x, slot + options.shift_y))
        }
        other => Err(RenderError::InvalidPosition(other)),
    }
}

/// Text attached to one side of a stave. Holds no layout between draws.
#[derive(Debug, Clone, PartialEq)]
pub struct StaveText {
    text: String,
    position: ModifierPosition,
    options: StaveTextOptions,
    font: FontDescriptor,
    width: f64,
    rendered: bool,
}

impl StaveText {
    /// Serif 16pt.
    pub fn default_font() -> FontDescriptor {
        FontDescriptor::new(
            STAVE_TEXT_FONT_FAMILY,
            STAVE_TEXT_FONT_SIZE,
            FontWeight::Normal,
            FontStyle::Normal,
        )
    }

    pub fn new(text: impl Into<String>, position: ModifierPosition, options: StaveTextOptions) -> Self {
        Self {
            text: text.into(),
            position,
            options,
            font: Self::default_font(),
            width: STAVE_TEXT_WIDTH,
            rendered: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn position(&self) -> ModifierPosition {
        self.position
    }

    pub fn options(&self) -> &StaveTextOptions {
        &self.options
    }

    pub fn font(&self) -> &FontDescriptor {
        &self.font
    }

    /// Width reserved in the stave's modifier area.
    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn is_rendered(&self) -> bool {
        self.rendered
    }

    pub fn set_text(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = text.into();
        self
    }

    pub fn set_shift_x(&mut self, x: f64) -> &mut Self {
        self.options.shift_x = x;
        self
    }

    pub fn set_shift_y(&mut self, y: f64) -> &mut Self {
        self.options.shift_y = y;
        self
    }

    pub fn set_justification(&mut self, justification: Justification) -> &mut Self {
        self.options.justification = justification;
        self
    }

    pub fn set_position(&mut self, position: ModifierPosition) -> &mut Self {
        self.position = position;
        self
    }

    /// Merge `font` over the default font.
    pub fn set_font(&mut self, font: &FontInfo) -> &mut Self {
        self.font = Self::default_font().merged(font);
        self
    }

    pub fn draw<C: RenderContext>(&mut self, ctx: &mut C, stave: &dyn StaveGeometry) -> Result<()> {
        let mut ctx = ctx.saved();
        ctx.set_line_width(STAVE_TEXT_LINE_WIDTH).set_font(&self.font);
        let text_width = ctx.measure_text(&self.text).width;

        let at = stave_text_position(stave, self.position, &self.options, text_width)?;
        ctx.fill_text(&self.text, at.x, at.y + STAVE_TEXT_BASELINE_NUDGE);
        self.rendered = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{CanvasContext, DrawCommand, RecordingCanvas, SvgContext};
    use crate::stave::Stave;
    use pretty_assertions::assert_eq;

    fn at(stave: &Stave, position: ModifierPosition, justification: Justification, width: f64) -> Point {
        let options = StaveTextOptions { justification, ..Default::default() };
        stave_text_position(stave, position, &options, width).unwrap()
    }

    #[test]
    fn left_text_ends_a_margin_before_the_stave() {
        let stave = Stave::new(100.0, 0.0, 200.0);
        let p = at(&stave, ModifierPosition::Left, Justification::Center, 50.0);
        assert_eq!(p.x, 26.0);
        // midway between line 0 (40) and the bottom line (90)
        assert_eq!(p.y, 65.0);
    }

    #[test]
    fn right_text_starts_a_margin_after_the_stave() {
        let stave = Stave::new(100.0, 0.0, 200.0);
        let p = at(&stave, ModifierPosition::Right, Justification::Center, 50.0);
        assert_eq!(p.x, 324.0);
        assert_eq!(p.y, 65.0);
    }

    #[test]
    fn below_text_is_justified_across_the_stave() {
        let stave = Stave::new(0.0, 0.0, 300.0);
        let center = at(&stave, ModifierPosition::Below, Justification::Center, 60.0);
        assert_eq!(center.x, 120.0);
        assert_eq!(center.y, stave.get_y_for_bottom_text(2));
        assert_eq!(at(&stave, ModifierPosition::Below, Justification::Left, 60.0).x, 0.0);
        assert_eq!(at(&stave, ModifierPosition::Below, Justification::Right, 60.0).x, 240.0);
    }

    #[test]
    fn above_text_uses_top_slot_and_shifts() {
        let stave = Stave::new(10.0, 0.0, 300.0);
        let options = StaveTextOptions { shift_x: 3.0, shift_y: -5.0, justification: Justification::Left };
        let p = stave_text_position(&stave, ModifierPosition::Above, &options, 60.0).unwrap();
        assert_eq!(p, Point::new(13.0, stave.get_y_for_top_text(2) - 5.0));
    }

    #[test]
    fn other_positions_are_rejected() {
        let stave = Stave::new(0.0, 0.0, 300.0);
        for position in [ModifierPosition::Center, ModifierPosition::Begin, ModifierPosition::End] {
            assert_eq!(
                stave_text_position(&stave, position, &StaveTextOptions::default(), 10.0),
                Err(RenderError::InvalidPosition(position))
            );
        }
    }

    #[test]
    fn defaults() {
        let text = StaveText::new("Allegro", ModifierPosition::Above, StaveTextOptions::default());
        assert_eq!(text.width(), 16.0);
        assert_eq!(text.options().justification, Justification::Center);
        assert_eq!(text.font().family, "Times New Roman, serif");
        assert!(!text.is_rendered());
    }

    #[test]
    fn draw_fills_text_with_nudge_inside_save_restore() {
        let stave = Stave::new(100.0, 0.0, 200.0);
        let mut text = StaveText::new("Fine", ModifierPosition::Right, StaveTextOptions::default());
        let mut ctx = CanvasContext::new(RecordingCanvas::new(400, 200));
        text.draw(&mut ctx, &stave).unwrap();
        assert!(text.is_rendered());

        let cmds = ctx.surface().commands();
        assert_eq!(cmds[0], DrawCommand::Save);
        assert_eq!(cmds[1], DrawCommand::SetLineWidth { width: 2.0 });
        assert_eq!(cmds[2], DrawCommand::SetFont { font: "normal normal 16pt Times New Roman, serif".into() });
        match &cmds[3] {
            DrawCommand::FillText { text, x, y, .. } => {
                assert_eq!(text, "Fine");
                assert_eq!(*x, 324.0);
                assert_eq!(*y, 69.0);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(cmds[4], DrawCommand::Restore);
        assert_eq!(ctx.surface().line_width(), 1.0);
    }

    #[test]
    fn invalid_position_still_restores_state() {
        let stave = Stave::new(0.0, 0.0, 300.0);
        let mut text = StaveText::new("?", ModifierPosition::Begin, StaveTextOptions::default());
        let mut ctx = SvgContext::new(300.0, 200.0);
        let mut canvas = CanvasContext::new(RecordingCanvas::new(300, 200));

        assert!(matches!(text.draw(&mut ctx, &stave), Err(RenderError::InvalidPosition(_))));
        assert!(matches!(text.draw(&mut canvas, &stave), Err(RenderError::InvalidPosition(_))));
        assert_eq!(canvas.surface().save_depth(), 0);
        assert_eq!(canvas.surface().commands().last(), Some(&DrawCommand::Restore));
        assert!(!text.is_rendered());
        assert!(ctx.root().children.is_empty());
    }

    #[test]
    fn setters_update_layout_inputs() {
        let stave = Stave::new(100.0, 0.0, 200.0);
        let mut text = StaveText::new("x", ModifierPosition::Left, StaveTextOptions::default());
        text.set_shift_x(4.0).set_shift_y(-2.0).set_text("Coda").set_position(ModifierPosition::Right);
        text.set_font(&FontInfo { weight: Some(FontWeight::Bold), ..Default::default() });
        assert_eq!(text.font().weight, FontWeight::Bold);
        assert_eq!(text.font().family, STAVE_TEXT_FONT_FAMILY);

        let mut ctx = CanvasContext::new(RecordingCanvas::new(400, 200));
        text.draw(&mut ctx, &stave).unwrap();
        let fill = ctx
            .surface()
            .commands()
            .iter()
            .find_map(|c| match c {
                DrawCommand::FillText { text, x, y, .. } => Some((text.clone(), *x, *y)),
                _ => None,
            })
            .unwrap();
        assert_eq!(fill, ("Coda".to_string(), 328.0, 67.0));
    }
}
