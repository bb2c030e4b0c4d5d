//! Raster adapter: wraps an immediate-mode 2D canvas surface.

use kurbo::Affine;
use serde::{Deserialize, Serialize};

use super::{parse_raw_font, GroupAttributes, LineCap, RenderContext};
use crate::font::FontDescriptor;
use crate::metrics::TextMeasure;

/// Size of the virtual surface synthesized for a canvas without a backing store.
pub const DEFAULT_WIDTH: u32 = 600;
pub const DEFAULT_HEIGHT: u32 = 400;
/// Largest backing-store dimension browsers accept, per axis.
pub const CANVAS_SIZE_LIMIT: f64 = 32767.0;

/// The backing store of a raster surface: physical pixel size plus the
/// logical (display) size it is shown at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasElement {
    pub width: u32,
    pub height: u32,
    pub style_width: String,
    pub style_height: String,
}

impl CanvasElement {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            style_width: format!("{width}px"),
            style_height: format!("{height}px"),
        }
    }
}

/// An immediate-mode 2D raster drawing API.
///
/// Mirrors the shape of a browser `CanvasRenderingContext2D`: state setters,
/// path construction, fill/stroke and text. Shadow blur is applied in device
/// space and is *not* scaled by the current transform.
pub trait Canvas2D {
    /// The backing element, if the surface has one.
    fn canvas(&mut self) -> Option<&mut CanvasElement>;

    fn font(&self) -> &str;
    fn set_font(&mut self, css: &str);
    fn fill_style(&self) -> &str;
    fn set_fill_style(&mut self, style: &str);
    fn stroke_style(&self) -> &str;
    fn set_stroke_style(&mut self, style: &str);
    fn set_shadow_color(&mut self, color: &str);
    fn set_shadow_blur(&mut self, blur: f64);
    fn set_line_width(&mut self, width: f64);
    fn set_line_cap(&mut self, cap: LineCap);
    fn set_line_dash(&mut self, dash: &[f64]);

    fn get_transform(&self) -> Affine;
    fn scale(&mut self, x: f64, y: f64);
    fn save(&mut self);
    fn restore(&mut self);

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn bezier_curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64);
    fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64);
    fn arc(&mut self, x: f64, y: f64, radius: f64, start_angle: f64, end_angle: f64, counterclockwise: bool);
    fn close_path(&mut self);
    fn fill(&mut self);
    fn stroke(&mut self);

    /// Advance width of `text` under the current font.
    fn measure_text(&self, text: &str) -> f64;
    fn fill_text(&mut self, text: &str, x: f64, y: f64);
}

// ═══════════════════════════════════════════════════════════════════════
// CanvasContext
// ═══════════════════════════════════════════════════════════════════════

/// [`RenderContext`] over a [`Canvas2D`] surface.
#[derive(Debug)]
pub struct CanvasContext<S: Canvas2D> {
    surface: S,
    /// Stands in for the backing element when the surface has none.
    fallback: Option<CanvasElement>,
    device_pixel_ratio: f64,
    /// Height of one line of text, in pixels.
    text_height: f64,
}

impl<S: Canvas2D> CanvasContext<S> {
    pub fn new(surface: S) -> Self {
        Self::with_pixel_ratio(surface, 1.0)
    }

    pub fn with_pixel_ratio(mut surface: S, device_pixel_ratio: f64) -> Self {
        let fallback = if surface.canvas().is_none() {
            log::debug!(
                "surface has no backing canvas; using a {DEFAULT_WIDTH}x{DEFAULT_HEIGHT} virtual surface"
            );
            Some(CanvasElement::new(DEFAULT_WIDTH, DEFAULT_HEIGHT))
        } else {
            None
        };
        let device_pixel_ratio = if device_pixel_ratio > 0.0 { device_pixel_ratio } else { 1.0 };
        Self {
            surface,
            fallback,
            device_pixel_ratio,
            text_height: 0.0,
        }
    }

    /// Clamp physical dimensions to [`CANVAS_SIZE_LIMIT`], cropping rather than
    /// failing.
    pub fn sanitize_canvas_dims(width: f64, height: f64) -> (f64, f64) {
        if width.max(height) > CANVAS_SIZE_LIMIT {
            log::warn!("Canvas dimensions exceed browser limit. Cropping to {CANVAS_SIZE_LIMIT}");
        }
        (width.min(CANVAS_SIZE_LIMIT), height.min(CANVAS_SIZE_LIMIT))
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    /// The backing element, or the synthesized virtual one.
    pub fn canvas(&mut self) -> &CanvasElement {
        self.canvas_mut()
    }

    fn canvas_mut(&mut self) -> &mut CanvasElement {
        match self.surface.canvas() {
            Some(element) => element,
            None => self
                .fallback
                .get_or_insert_with(|| CanvasElement::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)),
        }
    }

    pub fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    pub fn text_height(&self) -> f64 {
        self.text_height
    }

    pub fn font(&self) -> &str {
        self.surface.font()
    }

    pub fn fill_style(&self) -> &str {
        self.surface.fill_style()
    }

    pub fn stroke_style(&self) -> &str {
        self.surface.stroke_style()
    }
}

impl<S: Canvas2D> RenderContext for CanvasContext<S> {
    type Node = ();

    fn clear(&mut self) -> &mut Self {
        let (width, height) = {
            let canvas = self.canvas_mut();
            (f64::from(canvas.width), f64::from(canvas.height))
        };
        self.surface.clear_rect(0.0, 0.0, width, height);
        self
    }

    // Containers are not representable on a raster surface.
    fn open_group(&mut self, _class: &str, _id: Option<&str>, _attrs: Option<&GroupAttributes>) -> &mut Self {
        self
    }

    fn close_group(&mut self) -> &mut Self {
        self
    }

    fn add(&mut self, _child: ()) -> &mut Self {
        self
    }

    fn set_font(&mut self, font: &FontDescriptor) -> &mut Self {
        self.text_height = font.pixel_size();
        self.surface.set_font(&font.to_css());
        self
    }

    fn set_raw_font(&mut self, css: &str) -> &mut Self {
        if let Some(font) = parse_raw_font(css) {
            self.text_height = font.pixel_size();
            self.surface.set_font(css);
        }
        self
    }

    fn set_fill_style(&mut self, style: &str) -> &mut Self {
        self.surface.set_fill_style(style);
        self
    }

    /// Ignored: a raster surface has no background layer.
    fn set_background_fill_style(&mut self, _style: &str) -> &mut Self {
        self
    }

    fn set_stroke_style(&mut self, style: &str) -> &mut Self {
        self.surface.set_stroke_style(style);
        self
    }

    fn set_shadow_color(&mut self, color: &str) -> &mut Self {
        self.surface.set_shadow_color(color);
        self
    }

    fn set_shadow_blur(&mut self, blur: f64) -> &mut Self {
        // Uniform scale of the current transform (rotation allowed).
        let [a, b, c, d, _, _] = self.surface.get_transform().as_coeffs();
        let scale = ((a * a + b * b + c * c + d * d) / 2.0).sqrt();
        self.surface.set_shadow_blur(scale * blur);
        self
    }

    fn set_line_width(&mut self, width: f64) -> &mut Self {
        self.surface.set_line_width(width);
        self
    }

    fn set_line_cap(&mut self, cap: LineCap) -> &mut Self {
        self.surface.set_line_cap(cap);
        self
    }

    fn set_line_dash(&mut self, dash: &[f64]) -> &mut Self {
        self.surface.set_line_dash(dash);
        self
    }

    fn scale(&mut self, x: f64, y: f64) -> &mut Self {
        self.surface.scale(x, y);
        self
    }

    /// Size the backing store for the device pixel ratio and scale drawing
    /// back to logical units.
    fn resize(&mut self, width: f64, height: f64) -> &mut Self {
        let ratio = self.device_pixel_ratio;
        let (physical_width, physical_height) =
            Self::sanitize_canvas_dims(width * ratio, height * ratio);
        let logical_width = (physical_width / ratio).floor();
        let logical_height = (physical_height / ratio).floor();

        let canvas = self.canvas_mut();
        canvas.width = physical_width as u32;
        canvas.height = physical_height as u32;
        canvas.style_width = format!("{logical_width}px");
        canvas.style_height = format!("{logical_height}px");

        self.scale(ratio, ratio)
    }

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> &mut Self {
        self.surface.rect(x, y, width, height);
        self
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> &mut Self {
        self.surface.fill_rect(x, y, width, height);
        self
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> &mut Self {
        self.surface.clear_rect(x, y, width, height);
        self
    }

    fn begin_path(&mut self) -> &mut Self {
        self.surface.begin_path();
        self
    }

    fn move_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.surface.move_to(x, y);
        self
    }

    fn line_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.surface.line_to(x, y);
        self
    }

    fn bezier_curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64) -> &mut Self {
        self.surface.bezier_curve_to(cp1x, cp1y, cp2x, cp2y, x, y);
        self
    }

    fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64) -> &mut Self {
        self.surface.quadratic_curve_to(cpx, cpy, x, y);
        self
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start_angle: f64, end_angle: f64, counterclockwise: bool) -> &mut Self {
        self.surface.arc(x, y, radius, start_angle, end_angle, counterclockwise);
        self
    }

    fn close_path(&mut self) -> &mut Self {
        self.surface.close_path();
        self
    }

    fn fill(&mut self) -> &mut Self {
        self.surface.fill();
        self
    }

    fn stroke(&mut self) -> &mut Self {
        self.surface.stroke();
        self
    }

    fn measure_text(&self, text: &str) -> TextMeasure {
        TextMeasure {
            width: self.surface.measure_text(text),
            height: self.text_height,
        }
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) -> &mut Self {
        self.surface.fill_text(text, x, y);
        self
    }

    fn save(&mut self) -> &mut Self {
        self.surface.save();
        self
    }

    fn restore(&mut self) -> &mut Self {
        self.surface.restore();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{DrawCommand, RecordingCanvas};
    use crate::font::{FontSize, FontStyle, FontWeight};
    use pretty_assertions::assert_eq;

    #[test]
    fn detached_surface_gets_virtual_canvas() {
        let mut ctx = CanvasContext::new(RecordingCanvas::detached());
        assert_eq!(ctx.canvas(), &CanvasElement::new(600, 400));
        ctx.clear();
        assert_eq!(
            ctx.surface().commands().last(),
            Some(&DrawCommand::ClearRect { x: 0.0, y: 0.0, width: 600.0, height: 400.0 })
        );
    }

    #[test]
    fn clear_covers_the_backing_store() {
        let mut ctx = CanvasContext::new(RecordingCanvas::new(320, 240));
        ctx.clear();
        assert_eq!(
            ctx.surface().commands(),
            &[DrawCommand::ClearRect { x: 0.0, y: 0.0, width: 320.0, height: 240.0 }]
        );
    }

    #[test]
    fn set_font_caches_line_height() {
        let mut ctx = CanvasContext::new(RecordingCanvas::new(100, 100));
        let font = FontDescriptor::new("Arial", 12.0, FontWeight::Bold, FontStyle::Normal);
        ctx.set_font(&font);
        assert_eq!(ctx.font(), "normal bold 12pt Arial");
        assert_eq!(ctx.text_height(), 16.0);

        let m = ctx.measure_text("mf");
        assert_eq!(m.height, 16.0);
        assert!(m.width > 0.0);
    }

    #[test]
    fn set_font_parts_fills_defaults() {
        let mut ctx = CanvasContext::new(RecordingCanvas::new(100, 100));
        ctx.set_font_parts(None, Some(FontSize::px(20.0)), None, Some(FontStyle::Italic));
        assert_eq!(ctx.font(), "italic normal 20px Arial, sans-serif");
        assert_eq!(ctx.text_height(), 20.0);
    }

    #[test]
    fn raw_font_sets_height_and_keeps_font_on_error() {
        let mut ctx = CanvasContext::new(RecordingCanvas::new(100, 100));
        ctx.set_raw_font("italic bold 15pt Arial");
        assert_eq!(ctx.font(), "italic bold 15pt Arial");
        assert_eq!(ctx.text_height(), 20.0);

        ctx.set_raw_font("garbage");
        assert_eq!(ctx.font(), "italic bold 15pt Arial");
        assert_eq!(ctx.text_height(), 20.0);
    }

    #[test]
    fn shadow_blur_scales_with_transform() {
        let mut ctx = CanvasContext::new(RecordingCanvas::new(100, 100));
        ctx.scale(2.0, 2.0).set_shadow_blur(3.0);
        assert_eq!(
            ctx.surface().commands().last(),
            Some(&DrawCommand::SetShadowBlur { blur: 6.0 })
        );
    }

    #[test]
    fn resize_applies_pixel_ratio() {
        let mut ctx = CanvasContext::with_pixel_ratio(RecordingCanvas::new(10, 10), 2.0);
        ctx.resize(300.0, 150.0);
        assert_eq!(ctx.canvas(), &CanvasElement {
            width: 600,
            height: 300,
            style_width: "300px".into(),
            style_height: "150px".into(),
        });
        assert_eq!(ctx.surface().transform(), Affine::scale(2.0));
    }

    #[test]
    fn resize_clamps_oversized_dimensions() {
        let mut ctx = CanvasContext::with_pixel_ratio(RecordingCanvas::new(10, 10), 2.0);
        ctx.resize(20_000.0, 1_000.0);
        let canvas = ctx.canvas().clone();
        assert_eq!(canvas.width, 32767);
        assert_eq!(canvas.height, 2000);
        assert_eq!(canvas.style_width, "16383px");
        assert_eq!(canvas.style_height, "1000px");
    }

    #[test]
    fn sanitize_keeps_small_dims() {
        type Ctx = CanvasContext<RecordingCanvas>;
        assert_eq!(Ctx::sanitize_canvas_dims(100.0, 200.0), (100.0, 200.0));
        assert_eq!(Ctx::sanitize_canvas_dims(40_000.0, 50_000.0), (32767.0, 32767.0));
    }

    #[test]
    fn groups_are_no_ops() {
        let mut ctx = CanvasContext::new(RecordingCanvas::new(100, 100));
        ctx.open_group("stavetext", Some("t1"), None)
            .add(())
            .close_group();
        assert!(ctx.surface().commands().is_empty());
    }
}
