//! Rendering contexts: one drawing contract over heterogeneous surfaces.
//!
//! [`RenderContext`] is the surface the layout code draws through. Every
//! operation returns the context so calls chain:
//!
//! ```
//! use scoretext::{CanvasContext, RecordingCanvas, RenderContext};
//!
//! let mut ctx = CanvasContext::new(RecordingCanvas::new(400, 200));
//! ctx.begin_path().move_to(0.0, 0.0).line_to(10.0, 10.0).stroke();
//! ```
//!
//! Backends:
//! - [`CanvasContext`] adapts an immediate-mode raster surface ([`Canvas2D`]);
//!   grouping calls are no-ops there.
//! - [`SvgContext`] builds a retained element tree and serializes it to SVG.

mod canvas;
mod recording;
mod svg;

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::font::{FontDescriptor, FontInfo, FontSize, FontStyle, FontWeight};
use crate::metrics::TextMeasure;

pub use canvas::{CanvasContext, Canvas2D, CanvasElement, CANVAS_SIZE_LIMIT, DEFAULT_HEIGHT, DEFAULT_WIDTH};
pub use recording::{DrawCommand, RecordingCanvas};
pub use svg::{SvgContext, SvgNode};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

impl fmt::Display for LineCap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LineCap::Butt => "butt",
            LineCap::Round => "round",
            LineCap::Square => "square",
        })
    }
}

/// Extra attributes for a group opened with [`RenderContext::open_group`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupAttributes {
    /// Hit-test the group by its bounding box instead of its painted shapes.
    pub pointer_bbox: bool,
    pub attrs: BTreeMap<String, String>,
}

/// The drawing contract every backend implements.
pub trait RenderContext {
    /// Retained child element accepted by [`add`](RenderContext::add).
    type Node;

    /// Reset the whole surface to transparent.
    fn clear(&mut self) -> &mut Self;

    fn open_group(&mut self, class: &str, id: Option<&str>, attrs: Option<&GroupAttributes>) -> &mut Self;
    fn close_group(&mut self) -> &mut Self;
    fn add(&mut self, child: Self::Node) -> &mut Self;

    /// Set the current font and cache its line height for [`measure_text`].
    ///
    /// [`measure_text`]: RenderContext::measure_text
    fn set_font(&mut self, font: &FontDescriptor) -> &mut Self;
    /// Set the font from a CSS shorthand string such as `italic bold 15pt Arial`.
    fn set_raw_font(&mut self, css: &str) -> &mut Self;

    fn set_fill_style(&mut self, style: &str) -> &mut Self;
    fn set_background_fill_style(&mut self, style: &str) -> &mut Self;
    fn set_stroke_style(&mut self, style: &str) -> &mut Self;
    fn set_shadow_color(&mut self, color: &str) -> &mut Self;
    fn set_shadow_blur(&mut self, blur: f64) -> &mut Self;
    fn set_line_width(&mut self, width: f64) -> &mut Self;
    fn set_line_cap(&mut self, cap: LineCap) -> &mut Self;
    fn set_line_dash(&mut self, dash: &[f64]) -> &mut Self;

    fn scale(&mut self, x: f64, y: f64) -> &mut Self;
    fn resize(&mut self, width: f64, height: f64) -> &mut Self;

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> &mut Self;
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> &mut Self;
    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> &mut Self;
    fn begin_path(&mut self) -> &mut Self;
    fn move_to(&mut self, x: f64, y: f64) -> &mut Self;
    fn line_to(&mut self, x: f64, y: f64) -> &mut Self;
    fn bezier_curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64) -> &mut Self;
    fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64) -> &mut Self;
    fn arc(&mut self, x: f64, y: f64, radius: f64, start_angle: f64, end_angle: f64, counterclockwise: bool) -> &mut Self;
    fn close_path(&mut self) -> &mut Self;
    fn fill(&mut self) -> &mut Self;
    fn stroke(&mut self) -> &mut Self;

    /// Width of `text` under the current font. The height is the line height
    /// from the last `set_font`/`set_raw_font`, not the glyph ink bounds.
    fn measure_text(&self, text: &str) -> TextMeasure;
    fn fill_text(&mut self, text: &str, x: f64, y: f64) -> &mut Self;

    fn save(&mut self) -> &mut Self;
    fn restore(&mut self) -> &mut Self;

    /// Set the font from individual parts; missing parts take the defaults
    /// (sans-serif, 10pt, normal weight and style).
    fn set_font_parts(
        &mut self,
        family: Option<&str>,
        size: Option<FontSize>,
        weight: Option<FontWeight>,
        style: Option<FontStyle>,
    ) -> &mut Self {
        let font = FontInfo {
            family: family.map(str::to_string),
            size,
            weight,
            style,
        }
        .resolve();
        self.set_font(&font)
    }

    /// Save the graphics state and restore it when the guard drops, on every
    /// exit path.
    fn saved(&mut self) -> Saved<'_, Self>
    where
        Self: Sized,
    {
        self.save();
        Saved { ctx: self }
    }
}

/// Guard returned by [`RenderContext::saved`].
pub struct Saved<'a, C: RenderContext> {
    ctx: &'a mut C,
}

impl<C: RenderContext> Deref for Saved<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.ctx
    }
}

impl<C: RenderContext> DerefMut for Saved<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.ctx
    }
}

impl<C: RenderContext> Drop for Saved<'_, C> {
    fn drop(&mut self) {
        self.ctx.restore();
    }
}

/// Font selected by a CSS shorthand, or `None` when the string does not
/// parse and the current font stays in effect.
pub(crate) fn parse_raw_font(css: &str) -> Option<FontDescriptor> {
    match FontDescriptor::parse_css(css) {
        Ok(font) => Some(font),
        Err(e) => {
            log::warn!("{e}; keeping the current font");
            None
        }
    }
}

/// Format a coordinate without trailing zeros (`26`, `120.5`, `9.09`).
pub(crate) fn fmt_num(v: f64) -> String {
    let s = format!("{v:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// Sweep of a canvas-style arc, normalized the way a 2D canvas does it.
pub(crate) fn arc_sweep(start_angle: f64, end_angle: f64, counterclockwise: bool) -> f64 {
    let tau = std::f64::consts::TAU;
    if counterclockwise {
        let sweep = start_angle - end_angle;
        if sweep >= tau {
            -tau
        } else {
            -sweep.rem_euclid(tau)
        }
    } else {
        let sweep = end_angle - start_angle;
        if sweep >= tau {
            tau
        } else {
            sweep.rem_euclid(tau)
        }
    }
}
