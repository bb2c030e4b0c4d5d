//! Glyph rendering service: music-font symbols drawn as filled outlines.
//!
//! Fonts use the VexFlow glyph JSON layout:
//!
//! ```json
//! { "resolution": 1000,
//!   "glyphs": { "segno": { "x_min": 0, "x_max": 500, "ha": 600, "o": "m 0 0 l 500 0 ..." } } }
//! ```
//!
//! Outline tokens are `m x y`, `l x y`, `q ex ey cx cy` and
//! `b ex ey c1x c1y c2x c2y`, in font units with y pointing up.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::context::RenderContext;
use crate::error::{RenderError, Result};

/// One outline drawing step, in font units (y up).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OutlineCommand {
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
    QuadTo { cx: f64, cy: f64, x: f64, y: f64 },
    CubicTo { c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64 },
}

/// Parse a VexFlow outline string.
pub fn parse_outline(outline: &str) -> Result<Vec<OutlineCommand>> {
    let tokens: Vec<&str> = outline.split_whitespace().collect();
    let mut commands = Vec::new();
    let mut i = 0;

    let args = |i: usize, n: usize| -> Result<Vec<f64>> {
        let slice = tokens.get(i + 1..i + 1 + n).ok_or_else(|| {
            RenderError::InvalidFontData(format!("truncated '{}' command in outline", tokens[i]))
        })?;
        slice
            .iter()
            .map(|t| {
                t.parse::<f64>()
                    .map_err(|_| RenderError::InvalidFontData(format!("bad outline number '{t}'")))
            })
            .collect()
    };

    while i < tokens.len() {
        match tokens[i] {
            "m" => {
                let a = args(i, 2)?;
                commands.push(OutlineCommand::MoveTo { x: a[0], y: a[1] });
                i += 3;
            }
            "l" => {
                let a = args(i, 2)?;
                commands.push(OutlineCommand::LineTo { x: a[0], y: a[1] });
                i += 3;
            }
            "q" => {
                let a = args(i, 4)?;
                commands.push(OutlineCommand::QuadTo { x: a[0], y: a[1], cx: a[2], cy: a[3] });
                i += 5;
            }
            "b" => {
                let a = args(i, 6)?;
                commands.push(OutlineCommand::CubicTo {
                    x: a[0],
                    y: a[1],
                    c1x: a[2],
                    c1y: a[3],
                    c2x: a[4],
                    c2y: a[5],
                });
                i += 7;
            }
            // `z` closes implicitly on fill.
            "z" => i += 1,
            other => {
                return Err(RenderError::InvalidFontData(format!(
                    "unknown outline command '{other}'"
                )))
            }
        }
    }
    Ok(commands)
}

// ═══════════════════════════════════════════════════════════════════════
// Outline fonts
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
struct RawGlyph {
    x_min: f64,
    x_max: f64,
    #[serde(default)]
    ha: f64,
    #[serde(default)]
    o: String,
}

#[derive(Debug, Deserialize)]
struct RawFont {
    resolution: f64,
    glyphs: HashMap<String, RawGlyph>,
}

/// A parsed glyph in font units.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphOutline {
    pub x_min: f64,
    pub x_max: f64,
    pub ha: f64,
    pub commands: Vec<OutlineCommand>,
}

/// Looks up glyphs by music-font code.
pub trait GlyphSource {
    /// Build `code` at `point` size, or `None` if the font lacks it.
    fn glyph(&self, code: &str, point: f64) -> Option<Glyph>;
}

/// A source with no glyphs; every lookup misses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGlyphs;

impl GlyphSource for NoGlyphs {
    fn glyph(&self, _code: &str, _point: f64) -> Option<Glyph> {
        None
    }
}

/// A music font loaded from VexFlow glyph JSON.
#[derive(Debug, Clone)]
pub struct OutlineFont {
    resolution: f64,
    glyphs: HashMap<String, Arc<GlyphOutline>>,
}

impl OutlineFont {
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawFont = serde_json::from_str(json)
            .map_err(|e| RenderError::InvalidFontData(format!("Failed to parse glyph font: {e}")))?;
        if raw.resolution <= 0.0 {
            return Err(RenderError::InvalidFontData(format!(
                "resolution must be positive, got {}",
                raw.resolution
            )));
        }

        let mut glyphs = HashMap::with_capacity(raw.glyphs.len());
        for (code, g) in raw.glyphs {
            let commands = parse_outline(&g.o)
                .map_err(|e| RenderError::InvalidFontData(format!("glyph '{code}': {e}")))?;
            glyphs.insert(
                code,
                Arc::new(GlyphOutline {
                    x_min: g.x_min,
                    x_max: g.x_max,
                    ha: g.ha,
                    commands,
                }),
            );
        }
        Ok(Self { resolution: raw.resolution, glyphs })
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn contains(&self, code: &str) -> bool {
        self.glyphs.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

impl GlyphSource for OutlineFont {
    fn glyph(&self, code: &str, point: f64) -> Option<Glyph> {
        let outline = self.glyphs.get(code)?;
        Some(Glyph::new(code, Arc::clone(outline), point, self.resolution))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Glyph
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlyphMetrics {
    pub width: f64,
    pub height: f64,
    pub x_min: f64,
    pub x_max: f64,
    /// Font units to pixels.
    pub scale: f64,
}

/// A glyph sized for drawing.
#[derive(Debug, Clone)]
pub struct Glyph {
    code: String,
    point: f64,
    outline: Arc<GlyphOutline>,
    metrics: GlyphMetrics,
}

impl Glyph {
    pub fn new(code: impl Into<String>, outline: Arc<GlyphOutline>, point: f64, resolution: f64) -> Self {
        let scale = point * 72.0 / (resolution * 100.0);
        let metrics = GlyphMetrics {
            width: (outline.x_max - outline.x_min) * scale,
            height: outline.ha * scale,
            x_min: outline.x_min * scale,
            x_max: outline.x_max * scale,
            scale,
        };
        Self {
            code: code.into(),
            point,
            outline,
            metrics,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn point(&self) -> f64 {
        self.point
    }

    pub fn get_metrics(&self) -> &GlyphMetrics {
        &self.metrics
    }

    /// Fill the outline with its origin at `(x, y)`.
    pub fn render<C: RenderContext>(&self, ctx: &mut C, x: f64, y: f64) {
        let s = self.metrics.scale;
        let px = |fx: f64| x + fx * s;
        let py = |fy: f64| y - fy * s;

        ctx.begin_path();
        for cmd in &self.outline.commands {
            match *cmd {
                OutlineCommand::MoveTo { x, y } => ctx.move_to(px(x), py(y)),
                OutlineCommand::LineTo { x, y } => ctx.line_to(px(x), py(y)),
                OutlineCommand::QuadTo { cx, cy, x, y } => {
                    ctx.quadratic_curve_to(px(cx), py(cy), px(x), py(y))
                }
                OutlineCommand::CubicTo { c1x, c1y, c2x, c2y, x, y } => {
                    ctx.bezier_curve_to(px(c1x), py(c1y), px(c2x), py(c2y), px(x), py(y))
                }
            };
        }
        ctx.fill();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{CanvasContext, DrawCommand, RecordingCanvas};
    use pretty_assertions::assert_eq;

    const FONT: &str = r#"{
        "resolution": 1000,
        "fontFamily": "Test",
        "glyphs": {
            "segno": { "x_min": 0, "x_max": 500, "ha": 600, "o": "m 0 0 l 500 0 q 500 600 250 700 b 0 0 0 300 0 100" }
        }
    }"#;

    #[test]
    fn parses_outline_tokens() {
        let cmds = parse_outline("m 1 2 l 3 4 q 5 6 7 8 b 1 1 2 2 3 3 z").unwrap();
        assert_eq!(
            cmds,
            vec![
                OutlineCommand::MoveTo { x: 1.0, y: 2.0 },
                OutlineCommand::LineTo { x: 3.0, y: 4.0 },
                OutlineCommand::QuadTo { cx: 7.0, cy: 8.0, x: 5.0, y: 6.0 },
                OutlineCommand::CubicTo { c1x: 2.0, c1y: 2.0, c2x: 3.0, c2y: 3.0, x: 1.0, y: 1.0 },
            ]
        );
    }

    #[test]
    fn rejects_malformed_outlines() {
        assert!(matches!(parse_outline("m 1"), Err(RenderError::InvalidFontData(_))));
        assert!(matches!(parse_outline("m 1 x"), Err(RenderError::InvalidFontData(_))));
        assert!(matches!(parse_outline("k 1 2"), Err(RenderError::InvalidFontData(_))));
    }

    #[test]
    fn glyph_metrics_scale_with_point_size() {
        let font = OutlineFont::from_json(FONT).unwrap();
        assert_eq!(font.len(), 1);
        let glyph = font.glyph("segno", 40.0).unwrap();
        let m = glyph.get_metrics();
        assert!((m.scale - 0.0288).abs() < 1e-12);
        assert!((m.width - 14.4).abs() < 1e-9);
        assert!(font.glyph("coda", 40.0).is_none());
        assert!(NoGlyphs.glyph("segno", 40.0).is_none());
    }

    #[test]
    fn bad_font_json_is_reported() {
        assert!(matches!(OutlineFont::from_json("{"), Err(RenderError::InvalidFontData(_))));
        let bad = r#"{"resolution": 1000, "glyphs": {"x": {"x_min": 0, "x_max": 1, "o": "m 0"}}}"#;
        assert!(matches!(OutlineFont::from_json(bad), Err(RenderError::InvalidFontData(_))));
        let zero = r#"{"resolution": 0, "glyphs": {}}"#;
        assert!(matches!(OutlineFont::from_json(zero), Err(RenderError::InvalidFontData(_))));
    }

    #[test]
    fn render_inverts_y_and_fills() {
        let json = r#"{"resolution": 1000, "glyphs": {"dot": {"x_min": 0, "x_max": 1000, "ha": 0, "o": "m 0 0 l 1000 500"}}}"#;
        let glyph = OutlineFont::from_json(json).unwrap().glyph("dot", 100.0).unwrap();
        // scale = 100 * 72 / 100000 = 0.072
        let mut ctx = CanvasContext::new(RecordingCanvas::new(100, 100));
        glyph.render(&mut ctx, 10.0, 50.0);
        let cmds = ctx.surface().commands();
        assert_eq!(cmds[0], DrawCommand::BeginPath);
        assert_eq!(cmds[1], DrawCommand::MoveTo { x: 10.0, y: 50.0 });
        match cmds[2] {
            DrawCommand::LineTo { x, y } => {
                assert!((x - 82.0).abs() < 1e-9);
                assert!((y - 14.0).abs() < 1e-9);
            }
            ref other => panic!("unexpected {other:?}"),
        }
        assert_eq!(cmds[3], DrawCommand::Fill { style: "#000000".into() });
    }
}
