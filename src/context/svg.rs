//! Vector adapter: builds a retained SVG element tree.
//!
//! Paths accumulate in a [`BezPath`] until `fill`/`stroke` emits them as a
//! `<path>`. Every emitted element carries the current transform (when not the
//! identity) and shadow, so the tree renders the same as the raster backend.

use std::fmt;

use kurbo::{Affine, Arc, BezPath, PathEl, Point, Vec2};

use super::{arc_sweep, fmt_num, parse_raw_font, GroupAttributes, LineCap, RenderContext};
use crate::font::FontDescriptor;
use crate::metrics::{FontMetrics, SharedTextFont, TextMeasure};

const SVG_NS: &str = "http://www.w3.org/2000/svg";
/// Flattening tolerance when converting arcs to cubic segments.
const ARC_TOLERANCE: f64 = 0.1;

// ═══════════════════════════════════════════════════════════════════════
// SvgNode
// ═══════════════════════════════════════════════════════════════════════

/// One element of the retained tree. Attributes keep insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SvgNode {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<SvgNode>,
    pub text: Option<String>,
}

impl SvgNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder-style attribute setter.
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set `key`, replacing an existing value in place.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((key, value)),
        }
    }

    pub fn get_attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn write_to(&self, out: &mut String, depth: usize) {
        for _ in 0..depth {
            out.push_str("  ");
        }
        out.push('<');
        out.push_str(&self.name);
        for (k, v) in &self.attrs {
            out.push_str(&format!(r#" {}="{}""#, k, escape(v)));
        }
        match (&self.text, self.children.is_empty()) {
            (None, true) => out.push_str("/>\n"),
            (Some(text), true) => {
                out.push('>');
                out.push_str(&escape(text));
                out.push_str(&format!("</{}>\n", self.name));
            }
            (text, false) => {
                out.push_str(">\n");
                if let Some(text) = text {
                    out.push_str(&escape(text));
                    out.push('\n');
                }
                for child in &self.children {
                    child.write_to(out, depth + 1);
                }
                for _ in 0..depth {
                    out.push_str("  ");
                }
                out.push_str(&format!("</{}>\n", self.name));
            }
        }
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Serialize a path as SVG path data.
fn path_data(path: &BezPath) -> String {
    let p = |pt: Point| format!("{} {}", fmt_num(pt.x), fmt_num(pt.y));
    let mut d = String::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(a) => d.push_str(&format!("M{}", p(a))),
            PathEl::LineTo(a) => d.push_str(&format!("L{}", p(a))),
            PathEl::QuadTo(c, a) => d.push_str(&format!("Q{} {}", p(c), p(a))),
            PathEl::CurveTo(c1, c2, a) => d.push_str(&format!("C{} {} {}", p(c1), p(c2), p(a))),
            PathEl::ClosePath => d.push('Z'),
        }
    }
    d
}

// ═══════════════════════════════════════════════════════════════════════
// SvgContext
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
struct SvgState {
    fill_style: String,
    background_fill_style: String,
    stroke_style: String,
    shadow_color: String,
    shadow_blur: f64,
    line_width: f64,
    line_cap: LineCap,
    line_dash: Vec<f64>,
    font: FontDescriptor,
    transform: Affine,
}

impl Default for SvgState {
    fn default() -> Self {
        Self {
            fill_style: "black".to_string(),
            background_fill_style: "white".to_string(),
            stroke_style: "black".to_string(),
            shadow_color: "black".to_string(),
            shadow_blur: 0.0,
            line_width: 1.0,
            line_cap: LineCap::Butt,
            line_dash: Vec::new(),
            font: FontDescriptor::default(),
            transform: Affine::IDENTITY,
        }
    }
}

/// [`RenderContext`] that produces an SVG document.
pub struct SvgContext {
    /// `groups[0]` is the `<svg>` root; later entries are open `<g>` elements.
    groups: Vec<SvgNode>,
    state: SvgState,
    stack: Vec<SvgState>,
    path: BezPath,
    pen: Option<Point>,
    subpath_start: Point,
    metrics: Box<dyn FontMetrics>,
    width: f64,
    height: f64,
}

impl fmt::Debug for SvgContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SvgContext")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("open_groups", &(self.groups.len() - 1))
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl SvgContext {
    pub fn new(width: f64, height: f64) -> Self {
        Self::with_metrics(width, height, Box::new(SharedTextFont))
    }

    /// Build a context that measures text with `metrics`.
    pub fn with_metrics(width: f64, height: f64, metrics: Box<dyn FontMetrics>) -> Self {
        let mut ctx = Self {
            groups: vec![SvgNode::new("svg").attr("xmlns", SVG_NS)],
            state: SvgState::default(),
            stack: Vec::new(),
            path: BezPath::new(),
            pen: None,
            subpath_start: Point::ZERO,
            metrics,
            width,
            height,
        };
        ctx.resize(width, height);
        ctx
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// The document tree, with any still-open groups closed.
    pub fn root(&self) -> SvgNode {
        let mut open = self.groups.iter().rev();
        let mut node = match open.next() {
            Some(node) => node.clone(),
            None => return SvgNode::new("svg"),
        };
        for parent in open {
            let mut parent = parent.clone();
            parent.children.push(node);
            node = parent;
        }
        node
    }

    pub fn to_svg(&self) -> String {
        let mut out = String::new();
        self.root().write_to(&mut out, 0);
        out
    }

    fn parent(&mut self) -> &mut SvgNode {
        let last = self.groups.len() - 1;
        &mut self.groups[last]
    }

    fn push(&mut self, node: SvgNode) {
        let node = self.decorate(node);
        self.parent().children.push(node);
    }

    /// Apply the current transform and shadow to an emitted element.
    fn decorate(&self, mut node: SvgNode) -> SvgNode {
        if self.state.transform != Affine::IDENTITY {
            let c = self.state.transform.as_coeffs();
            let coeffs: Vec<String> = c.iter().map(|v| fmt_num(*v)).collect();
            node.set_attr("transform", format!("matrix({})", coeffs.join(" ")));
        }
        if self.state.shadow_blur > 0.0 {
            node.set_attr(
                "style",
                format!(
                    "filter: drop-shadow(0 0 {}px {})",
                    fmt_num(self.state.shadow_blur),
                    self.state.shadow_color
                ),
            );
        }
        node
    }

    fn stroke_attrs(&self, mut node: SvgNode) -> SvgNode {
        node.set_attr("stroke", self.state.stroke_style.clone());
        node.set_attr("stroke-width", fmt_num(self.state.line_width));
        if self.state.line_cap != LineCap::Butt {
            node.set_attr("stroke-linecap", self.state.line_cap.to_string());
        }
        if !self.state.line_dash.is_empty() {
            let dash: Vec<String> = self.state.line_dash.iter().map(|v| fmt_num(*v)).collect();
            node.set_attr("stroke-dasharray", dash.join(","));
        }
        node
    }

    fn rect_node(x: f64, y: f64, width: f64, height: f64) -> SvgNode {
        SvgNode::new("rect")
            .attr("x", fmt_num(x))
            .attr("y", fmt_num(y))
            .attr("width", fmt_num(width))
            .attr("height", fmt_num(height))
    }
}

impl RenderContext for SvgContext {
    type Node = SvgNode;

    fn clear(&mut self) -> &mut Self {
        if self.groups.len() > 1 {
            log::debug!("clearing with {} open group(s)", self.groups.len() - 1);
            self.groups.truncate(1);
        }
        self.groups[0].children.clear();
        self
    }

    fn open_group(&mut self, class: &str, id: Option<&str>, attrs: Option<&GroupAttributes>) -> &mut Self {
        let mut group = SvgNode::new("g").attr("class", format!("vf-{class}"));
        if let Some(id) = id {
            group.set_attr("id", format!("vf-{id}"));
        }
        if let Some(attrs) = attrs {
            if attrs.pointer_bbox {
                group.set_attr("pointer-events", "bounding-box");
            }
            for (k, v) in &attrs.attrs {
                group.set_attr(k.as_str(), v.as_str());
            }
        }
        self.groups.push(group);
        self
    }

    fn close_group(&mut self) -> &mut Self {
        if self.groups.len() > 1 {
            if let Some(group) = self.groups.pop() {
                self.parent().children.push(group);
            }
        } else {
            log::warn!("close_group called with no open group");
        }
        self
    }

    fn add(&mut self, child: SvgNode) -> &mut Self {
        self.parent().children.push(child);
        self
    }

    fn set_font(&mut self, font: &FontDescriptor) -> &mut Self {
        self.state.font = font.clone();
        self
    }

    fn set_raw_font(&mut self, css: &str) -> &mut Self {
        if let Some(font) = parse_raw_font(css) {
            self.state.font = font;
        }
        self
    }

    fn set_fill_style(&mut self, style: &str) -> &mut Self {
        self.state.fill_style = style.to_string();
        self
    }

    fn set_background_fill_style(&mut self, style: &str) -> &mut Self {
        self.state.background_fill_style = style.to_string();
        self
    }

    fn set_stroke_style(&mut self, style: &str) -> &mut Self {
        self.state.stroke_style = style.to_string();
        self
    }

    fn set_shadow_color(&mut self, color: &str) -> &mut Self {
        self.state.shadow_color = color.to_string();
        self
    }

    fn set_shadow_blur(&mut self, blur: f64) -> &mut Self {
        self.state.shadow_blur = blur;
        self
    }

    fn set_line_width(&mut self, width: f64) -> &mut Self {
        self.state.line_width = width;
        self
    }

    fn set_line_cap(&mut self, cap: LineCap) -> &mut Self {
        self.state.line_cap = cap;
        self
    }

    fn set_line_dash(&mut self, dash: &[f64]) -> &mut Self {
        self.state.line_dash = dash.to_vec();
        self
    }

    fn scale(&mut self, x: f64, y: f64) -> &mut Self {
        self.state.transform = self.state.transform * Affine::scale_non_uniform(x, y);
        self
    }

    fn resize(&mut self, width: f64, height: f64) -> &mut Self {
        self.width = width;
        self.height = height;
        let root = &mut self.groups[0];
        root.set_attr("width", fmt_num(width));
        root.set_attr("height", fmt_num(height));
        root.set_attr("viewBox", format!("0 0 {} {}", fmt_num(width), fmt_num(height)));
        self
    }

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> &mut Self {
        self.move_to(x, y)
            .line_to(x + width, y)
            .line_to(x + width, y + height)
            .line_to(x, y + height)
            .close_path()
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> &mut Self {
        let node = Self::rect_node(x, y, width, height).attr("fill", self.state.fill_style.clone());
        self.push(node);
        self
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> &mut Self {
        let node = Self::rect_node(x, y, width, height)
            .attr("fill", self.state.background_fill_style.clone());
        self.push(node);
        self
    }

    fn begin_path(&mut self) -> &mut Self {
        self.path = BezPath::new();
        self.pen = None;
        self
    }

    fn move_to(&mut self, x: f64, y: f64) -> &mut Self {
        let p = Point::new(x, y);
        self.path.move_to(p);
        self.pen = Some(p);
        self.subpath_start = p;
        self
    }

    fn line_to(&mut self, x: f64, y: f64) -> &mut Self {
        if self.pen.is_none() {
            return self.move_to(x, y);
        }
        let p = Point::new(x, y);
        self.path.line_to(p);
        self.pen = Some(p);
        self
    }

    fn bezier_curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64) -> &mut Self {
        if self.pen.is_none() {
            self.move_to(cp1x, cp1y);
        }
        let p = Point::new(x, y);
        self.path.curve_to(Point::new(cp1x, cp1y), Point::new(cp2x, cp2y), p);
        self.pen = Some(p);
        self
    }

    fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64) -> &mut Self {
        if self.pen.is_none() {
            self.move_to(cpx, cpy);
        }
        let p = Point::new(x, y);
        self.path.quad_to(Point::new(cpx, cpy), p);
        self.pen = Some(p);
        self
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start_angle: f64, end_angle: f64, counterclockwise: bool) -> &mut Self {
        let arc = Arc {
            center: Point::new(x, y),
            radii: Vec2::new(radius, radius),
            start_angle,
            sweep_angle: arc_sweep(start_angle, end_angle, counterclockwise),
            x_rotation: 0.0,
        };
        let start = arc.center + Vec2::from_angle(start_angle) * radius;
        match self.pen {
            Some(_) => self.line_to(start.x, start.y),
            None => self.move_to(start.x, start.y),
        };
        for el in arc.append_iter(ARC_TOLERANCE) {
            self.path.push(el);
        }
        let end_angle = start_angle + arc.sweep_angle;
        self.pen = Some(arc.center + Vec2::from_angle(end_angle) * radius);
        self
    }

    fn close_path(&mut self) -> &mut Self {
        if self.pen.is_some() {
            self.path.close_path();
            self.pen = Some(self.subpath_start);
        }
        self
    }

    fn fill(&mut self) -> &mut Self {
        let node = SvgNode::new("path")
            .attr("d", path_data(&self.path))
            .attr("fill", self.state.fill_style.clone())
            .attr("stroke", "none");
        self.push(node);
        self
    }

    fn stroke(&mut self) -> &mut Self {
        let node = SvgNode::new("path")
            .attr("d", path_data(&self.path))
            .attr("fill", "none");
        let node = self.stroke_attrs(node);
        self.push(node);
        self
    }

    fn measure_text(&self, text: &str) -> TextMeasure {
        self.metrics.measure(text, &self.state.font)
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) -> &mut Self {
        let font = &self.state.font;
        let node = SvgNode::new("text")
            .attr("x", fmt_num(x))
            .attr("y", fmt_num(y))
            .attr("font-family", font.family.clone())
            .attr("font-size", font.size.to_string())
            .attr("font-weight", font.weight.to_string())
            .attr("font-style", font.style.to_string())
            .attr("fill", self.state.fill_style.clone())
            .with_text(text);
        self.push(node);
        self
    }

    fn save(&mut self) -> &mut Self {
        self.stack.push(self.state.clone());
        self
    }

    fn restore(&mut self) -> &mut Self {
        match self.stack.pop() {
            Some(state) => self.state = state,
            None => log::warn!("restore called without a matching save"),
        }
        self
    }
}
