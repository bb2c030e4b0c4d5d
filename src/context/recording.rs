//! A headless [`Canvas2D`] that records every call.
//!
//! Used where no real raster surface exists (tests, server-side layout checks,
//! dumping a draw list as JSON). Graphics state is tracked like a browser
//! canvas so getters and `measure_text` answer correctly.

use kurbo::Affine;
use serde::{Deserialize, Serialize};

use super::canvas::{Canvas2D, CanvasElement};
use super::LineCap;
use crate::font::FontDescriptor;
use crate::metrics::{FontMetrics, TextFont};

/// One recorded canvas call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum DrawCommand {
    SetFont { font: String },
    SetFillStyle { style: String },
    SetStrokeStyle { style: String },
    SetShadowColor { color: String },
    SetShadowBlur { blur: f64 },
    SetLineWidth { width: f64 },
    SetLineCap { cap: LineCap },
    SetLineDash { dash: Vec<f64> },
    Scale { x: f64, y: f64 },
    Save,
    Restore,
    Rect { x: f64, y: f64, width: f64, height: f64 },
    FillRect { x: f64, y: f64, width: f64, height: f64, style: String },
    ClearRect { x: f64, y: f64, width: f64, height: f64 },
    BeginPath,
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
    BezierCurveTo { cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64 },
    QuadraticCurveTo { cpx: f64, cpy: f64, x: f64, y: f64 },
    Arc {
        x: f64,
        y: f64,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        counterclockwise: bool,
    },
    ClosePath,
    Fill { style: String },
    Stroke { style: String, line_width: f64 },
    FillText { text: String, x: f64, y: f64, font: String, style: String },
}

#[derive(Debug, Clone, PartialEq)]
struct CanvasState {
    font: String,
    fill_style: String,
    stroke_style: String,
    shadow_color: String,
    shadow_blur: f64,
    line_width: f64,
    line_cap: LineCap,
    line_dash: Vec<f64>,
    transform: Affine,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            font: "10px sans-serif".to_string(),
            fill_style: "#000000".to_string(),
            stroke_style: "#000000".to_string(),
            shadow_color: "rgba(0, 0, 0, 0)".to_string(),
            shadow_blur: 0.0,
            line_width: 1.0,
            line_cap: LineCap::Butt,
            line_dash: Vec::new(),
            transform: Affine::IDENTITY,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingCanvas {
    element: Option<CanvasElement>,
    state: CanvasState,
    stack: Vec<CanvasState>,
    commands: Vec<DrawCommand>,
}

impl RecordingCanvas {
    /// A surface backed by a `width` x `height` element.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            element: Some(CanvasElement::new(width, height)),
            ..Self::default()
        }
    }

    /// A surface with no backing element.
    pub fn detached() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn transform(&self) -> Affine {
        self.state.transform
    }

    pub fn line_width(&self) -> f64 {
        self.state.line_width
    }

    pub fn shadow_blur(&self) -> f64 {
        self.state.shadow_blur
    }

    /// Depth of the save stack.
    pub fn save_depth(&self) -> usize {
        self.stack.len()
    }

    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string_pretty(&self.commands)
            .map_err(|e| format!("Failed to serialize draw commands: {e}"))
    }

    fn record(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }
}

impl Canvas2D for RecordingCanvas {
    fn canvas(&mut self) -> Option<&mut CanvasElement> {
        self.element.as_mut()
    }

    fn font(&self) -> &str {
        &self.state.font
    }

    fn set_font(&mut self, css: &str) {
        self.state.font = css.to_string();
        self.record(DrawCommand::SetFont { font: css.to_string() });
    }

    fn fill_style(&self) -> &str {
        &self.state.fill_style
    }

    fn set_fill_style(&mut self, style: &str) {
        self.state.fill_style = style.to_string();
        self.record(DrawCommand::SetFillStyle { style: style.to_string() });
    }

    fn stroke_style(&self) -> &str {
        &self.state.stroke_style
    }

    fn set_stroke_style(&mut self, style: &str) {
        self.state.stroke_style = style.to_string();
        self.record(DrawCommand::SetStrokeStyle { style: style.to_string() });
    }

    fn set_shadow_color(&mut self, color: &str) {
        self.state.shadow_color = color.to_string();
        self.record(DrawCommand::SetShadowColor { color: color.to_string() });
    }

    fn set_shadow_blur(&mut self, blur: f64) {
        self.state.shadow_blur = blur;
        self.record(DrawCommand::SetShadowBlur { blur });
    }

    fn set_line_width(&mut self, width: f64) {
        self.state.line_width = width;
        self.record(DrawCommand::SetLineWidth { width });
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.state.line_cap = cap;
        self.record(DrawCommand::SetLineCap { cap });
    }

    fn set_line_dash(&mut self, dash: &[f64]) {
        self.state.line_dash = dash.to_vec();
        self.record(DrawCommand::SetLineDash { dash: dash.to_vec() });
    }

    fn get_transform(&self) -> Affine {
        self.state.transform
    }

    fn scale(&mut self, x: f64, y: f64) {
        self.state.transform = self.state.transform * Affine::scale_non_uniform(x, y);
        self.record(DrawCommand::Scale { x, y });
    }

    fn save(&mut self) {
        self.stack.push(self.state.clone());
        self.record(DrawCommand::Save);
    }

    fn restore(&mut self) {
        // An unbalanced restore is ignored, as on a browser canvas.
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
        self.record(DrawCommand::Restore);
    }

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.record(DrawCommand::Rect { x, y, width, height });
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let style = self.state.fill_style.clone();
        self.record(DrawCommand::FillRect { x, y, width, height, style });
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.record(DrawCommand::ClearRect { x, y, width, height });
    }

    fn begin_path(&mut self) {
        self.record(DrawCommand::BeginPath);
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.record(DrawCommand::MoveTo { x, y });
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.record(DrawCommand::LineTo { x, y });
    }

    fn bezier_curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64) {
        self.record(DrawCommand::BezierCurveTo { cp1x, cp1y, cp2x, cp2y, x, y });
    }

    fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64) {
        self.record(DrawCommand::QuadraticCurveTo { cpx, cpy, x, y });
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start_angle: f64, end_angle: f64, counterclockwise: bool) {
        self.record(DrawCommand::Arc {
            x,
            y,
            radius,
            start_angle,
            end_angle,
            counterclockwise,
        });
    }

    fn close_path(&mut self) {
        self.record(DrawCommand::ClosePath);
    }

    fn fill(&mut self) {
        let style = self.state.fill_style.clone();
        self.record(DrawCommand::Fill { style });
    }

    fn stroke(&mut self) {
        let style = self.state.stroke_style.clone();
        let line_width = self.state.line_width;
        self.record(DrawCommand::Stroke { style, line_width });
    }

    fn measure_text(&self, text: &str) -> f64 {
        let font = FontDescriptor::parse_css(&self.state.font).unwrap_or_else(|e| {
            log::warn!("{e}; measuring with the default font");
            FontDescriptor::default()
        });
        TextFont::shared().measure(text, &font).width
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        let command = DrawCommand::FillText {
            text: text.to_string(),
            x,
            y,
            font: self.state.font.clone(),
            style: self.state.fill_style.clone(),
        };
        self.record(command);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_a_fresh_canvas() {
        let canvas = RecordingCanvas::new(10, 10);
        assert_eq!(canvas.font(), "10px sans-serif");
        assert_eq!(canvas.fill_style(), "#000000");
        assert_eq!(canvas.stroke_style(), "#000000");
        assert_eq!(canvas.line_width(), 1.0);
        assert_eq!(canvas.get_transform(), Affine::IDENTITY);
    }

    #[test]
    fn save_restore_round_trips_state() {
        let mut canvas = RecordingCanvas::new(10, 10);
        canvas.save();
        canvas.set_fill_style("red");
        canvas.set_line_width(3.0);
        canvas.scale(2.0, 3.0);
        assert_eq!(canvas.save_depth(), 1);
        canvas.restore();
        assert_eq!(canvas.fill_style(), "#000000");
        assert_eq!(canvas.line_width(), 1.0);
        assert_eq!(canvas.transform(), Affine::IDENTITY);
        assert_eq!(canvas.save_depth(), 0);
    }

    #[test]
    fn unbalanced_restore_is_ignored() {
        let mut canvas = RecordingCanvas::new(10, 10);
        canvas.set_stroke_style("blue");
        canvas.restore();
        assert_eq!(canvas.stroke_style(), "blue");
    }

    #[test]
    fn paint_commands_capture_current_style() {
        let mut canvas = RecordingCanvas::detached();
        canvas.set_fill_style("#333");
        canvas.set_font("bold 12pt Arial");
        canvas.fill_text("p", 4.0, 8.0);
        canvas.set_line_width(2.0);
        canvas.stroke();
        let tail = &canvas.commands()[canvas.commands().len() - 3..];
        assert_eq!(
            tail,
            &[
                DrawCommand::FillText {
                    text: "p".into(),
                    x: 4.0,
                    y: 8.0,
                    font: "bold 12pt Arial".into(),
                    style: "#333".into(),
                },
                DrawCommand::SetLineWidth { width: 2.0 },
                DrawCommand::Stroke { style: "#000000".into(), line_width: 2.0 },
            ]
        );
    }

    #[test]
    fn measures_with_the_current_font() {
        let mut canvas = RecordingCanvas::detached();
        canvas.set_font("10px Arial");
        // A = 667
        assert!((canvas.measure_text("A") - 6.67).abs() < 1e-9);
        canvas.set_font("20px Arial");
        assert!((canvas.measure_text("A") - 13.34).abs() < 1e-9);
    }

    #[test]
    fn commands_serialize_with_op_tags() {
        let mut canvas = RecordingCanvas::detached();
        canvas.move_to(1.0, 2.0);
        canvas.fill_rect(0.0, 0.0, 5.0, 5.0);
        let value: serde_json::Value = serde_json::from_str(&canvas.to_json().unwrap()).unwrap();
        assert_eq!(value[0]["op"], "moveTo");
        assert_eq!(value[1]["op"], "fillRect");
        assert_eq!(value[1]["style"], "#000000");
        assert_eq!(canvas.take_commands().len(), 2);
        assert!(canvas.commands().is_empty());
    }

    #[test]
    fn command_fields_are_camel_case() {
        let mut canvas = RecordingCanvas::detached();
        canvas.arc(0.0, 0.0, 4.0, 0.0, 1.0, true);
        canvas.stroke();
        let value: serde_json::Value = serde_json::from_str(&canvas.to_json().unwrap()).unwrap();
        assert_eq!(value[0]["startAngle"], 0.0);
        assert_eq!(value[0]["counterclockwise"], true);
        assert_eq!(value[1]["lineWidth"], 1.0);
        assert!(value[0].get("start_angle").is_none());

        let back: Vec<DrawCommand> = serde_json::from_value(value).unwrap();
        assert_eq!(back, canvas.commands());
    }
}
