//! Time-positioned text: dynamics, ornaments, chord names, free text.
//!
//! A [`TextNote`] is built from its content alone and picks up geometry as it
//! is placed: a stave for vertical position, then a tick slot for horizontal
//! position. `pre_format` resolves the reserved width once a tick slot is
//! known; `draw` needs all three.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::constants::*;
use super::{ElementStyle, Justification};
use crate::context::RenderContext;
use crate::error::{RenderError, Result};
use crate::font::{FontDescriptor, FontInfo, FontSize, FontStyle, FontWeight};
use crate::glyph::{Glyph, GlyphSource, NoGlyphs};
use crate::metrics::FontMetrics;
use crate::stave::{StaveGeometry, TickContext};

/// Symbolic glyph names accepted by [`TextNoteStruct::glyph`] and the
/// music-font code each one draws.
pub const GLYPHS: &[(&str, &str)] = &[
    ("segno", "segno"),
    ("tr", "ornamentTrill"),
    ("mordent", "ornamentMordent"),
    ("mordent_upper", "ornamentShortTrill"),
    ("mordent_lower", "ornamentMordent"),
    ("f", "dynamicForte"),
    ("p", "dynamicPiano"),
    ("m", "dynamicMezzo"),
    ("s", "dynamicSforzando"),
    ("z", "dynamicZ"),
    ("coda", "coda"),
    ("pedal_open", "keyboardPedalPed"),
    ("pedal_close", "keyboardPedalUp"),
    ("caesura_straight", "caesura"),
    ("caesura_curved", "caesuraCurved"),
    ("breath", "breathMarkComma"),
    ("tick", "breathMarkTick"),
    ("turn", "ornamentTurn"),
    ("turn_inverted", "ornamentTurnSlash"),
];

pub fn glyph_code(name: &str) -> Option<&'static str> {
    GLYPHS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, code)| *code)
}

/// Construction options. Everything is optional so scores assembled elsewhere
/// can pass a partial JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextNoteStruct {
    pub text: Option<String>,
    /// Symbolic glyph name (see [`GLYPHS`]); draws a music symbol instead of text.
    pub glyph: Option<String>,
    pub superscript: Option<String>,
    pub subscript: Option<String>,
    /// Partial font merged over [`TextNote::default_font`].
    pub font: Option<FontInfo>,
    pub line: f64,
    /// Reserve no width, so neighbours are spaced as if the note were absent.
    pub smooth: bool,
    pub ignore_ticks: bool,
    pub justification: Option<Justification>,
    pub style: Option<ElementStyle>,
}

/// Layout resolved by [`TextNote::pre_format`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FormatMetrics {
    /// Reserved width.
    pub width: f64,
    /// Space the note extends left of its anchor.
    pub left_displaced_head_px: f64,
    /// Offset from the slot origin to the centre of the slot's glyph.
    pub right_displaced_head_px: f64,
}

/// Lifecycle phase, for inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextNoteState {
    Created,
    StaveAssigned,
    TickAssigned,
    PreFormatted,
    Drawn,
}

enum Phase<'a> {
    Created,
    StaveAssigned {
        stave: &'a dyn StaveGeometry,
    },
    TickAssigned {
        stave: Option<&'a dyn StaveGeometry>,
        tick: &'a dyn TickContext,
    },
    PreFormatted {
        stave: Option<&'a dyn StaveGeometry>,
        tick: &'a dyn TickContext,
        layout: FormatMetrics,
    },
    Drawn {
        stave: &'a dyn StaveGeometry,
        tick: &'a dyn TickContext,
        layout: FormatMetrics,
    },
}

impl<'a> Phase<'a> {
    fn state(&self) -> TextNoteState {
        match self {
            Phase::Created => TextNoteState::Created,
            Phase::StaveAssigned { .. } => TextNoteState::StaveAssigned,
            Phase::TickAssigned { .. } => TextNoteState::TickAssigned,
            Phase::PreFormatted { .. } => TextNoteState::PreFormatted,
            Phase::Drawn { .. } => TextNoteState::Drawn,
        }
    }

    fn stave(&self) -> Option<&'a dyn StaveGeometry> {
        match *self {
            Phase::Created => None,
            Phase::StaveAssigned { stave } | Phase::Drawn { stave, .. } => Some(stave),
            Phase::TickAssigned { stave, .. } | Phase::PreFormatted { stave, .. } => stave,
        }
    }

    fn tick(&self) -> Option<&'a dyn TickContext> {
        match *self {
            Phase::Created | Phase::StaveAssigned { .. } => None,
            Phase::TickAssigned { tick, .. }
            | Phase::PreFormatted { tick, .. }
            | Phase::Drawn { tick, .. } => Some(tick),
        }
    }

    fn layout(&self) -> Option<FormatMetrics> {
        match *self {
            Phase::PreFormatted { layout, .. } | Phase::Drawn { layout, .. } => Some(layout),
            _ => None,
        }
    }

    /// Drop any resolved layout, keeping the assigned geometry.
    fn invalidated(self) -> Self {
        match self {
            Phase::PreFormatted { stave, tick, .. } => Phase::TickAssigned { stave, tick },
            Phase::Drawn { stave, tick, .. } => Phase::TickAssigned { stave: Some(stave), tick },
            other => other,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// TextNote
// ═══════════════════════════════════════════════════════════════════════

/// A text or music-symbol annotation positioned in time.
pub struct TextNote<'a> {
    text: String,
    glyph: Option<Glyph>,
    superscript: Option<String>,
    subscript: Option<String>,
    font: FontDescriptor,
    justification: Justification,
    line: f64,
    x_shift: f64,
    smooth: bool,
    ignore_ticks: bool,
    style: ElementStyle,
    /// Width known before pre-format: the glyph width, else zero.
    initial_width: f64,
    /// Superscript/subscript size, scaled by the metrics service at pre-format.
    script_size: FontSize,
    phase: Phase<'a>,
}

impl fmt::Debug for TextNote<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextNote")
            .field("text", &self.text)
            .field("glyph", &self.glyph.as_ref().map(Glyph::code))
            .field("superscript", &self.superscript)
            .field("subscript", &self.subscript)
            .field("font", &self.font)
            .field("justification", &self.justification)
            .field("line", &self.line)
            .field("state", &self.phase.state())
            .finish_non_exhaustive()
    }
}

impl<'a> TextNote<'a> {
    /// Sans-serif 12pt.
    pub fn default_font() -> FontDescriptor {
        FontDescriptor::new(
            TEXT_NOTE_FONT_FAMILY,
            TEXT_NOTE_FONT_SIZE,
            FontWeight::Normal,
            FontStyle::Normal,
        )
    }

    /// Build a note with no music font; any `glyph` option fails.
    pub fn new(opts: TextNoteStruct) -> Result<Self> {
        Self::new_with_glyphs(opts, &NoGlyphs)
    }

    /// Build a note whose `glyph` option is looked up in `glyphs`.
    pub fn new_with_glyphs(opts: TextNoteStruct, glyphs: &dyn GlyphSource) -> Result<Self> {
        let glyph = match opts.glyph.as_deref() {
            Some(name) => {
                let code =
                    glyph_code(name).ok_or_else(|| RenderError::InvalidGlyph(name.to_string()))?;
                let glyph = glyphs.glyph(code, GLYPH_POINT).ok_or_else(|| {
                    RenderError::InvalidGlyph(format!("{name} ({code} is not in the music font)"))
                })?;
                Some(glyph)
            }
            None => None,
        };
        let initial_width = glyph.as_ref().map_or(0.0, |g| g.get_metrics().width);
        let font = match &opts.font {
            Some(info) => Self::default_font().merged(info),
            None => Self::default_font(),
        };
        let script_size = font.size.scaled(SCRIPT_SCALE);

        Ok(Self {
            text: opts.text.unwrap_or_default(),
            glyph,
            superscript: opts.superscript,
            subscript: opts.subscript,
            font,
            justification: opts.justification.unwrap_or_default(),
            line: opts.line,
            x_shift: 0.0,
            smooth: opts.smooth,
            ignore_ticks: opts.ignore_ticks,
            style: opts.style.unwrap_or_default(),
            initial_width,
            script_size,
            phase: Phase::Created,
        })
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn glyph(&self) -> Option<&Glyph> {
        self.glyph.as_ref()
    }

    pub fn superscript(&self) -> Option<&str> {
        self.superscript.as_deref()
    }

    pub fn subscript(&self) -> Option<&str> {
        self.subscript.as_deref()
    }

    pub fn font(&self) -> &FontDescriptor {
        &self.font
    }

    pub fn justification(&self) -> Justification {
        self.justification
    }

    pub fn line(&self) -> f64 {
        self.line
    }

    /// The stave line text is drawn on.
    pub fn text_line(&self) -> f64 {
        self.line + TEXT_LINE_OFFSET
    }

    pub fn x_shift(&self) -> f64 {
        self.x_shift
    }

    pub fn is_smooth(&self) -> bool {
        self.smooth
    }

    pub fn ignore_ticks(&self) -> bool {
        self.ignore_ticks
    }

    pub fn style(&self) -> &ElementStyle {
        &self.style
    }

    pub fn state(&self) -> TextNoteState {
        self.phase.state()
    }

    /// Reserved width: the resolved width once pre-formatted, else the
    /// construction-time estimate.
    pub fn width(&self) -> f64 {
        self.phase.layout().map_or(self.initial_width, |l| l.width)
    }

    pub fn format_metrics(&self) -> Option<FormatMetrics> {
        self.phase.layout()
    }

    // ── Setters ─────────────────────────────────────────────────────

    pub fn set_text(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = text.into();
        self.invalidate();
        self
    }

    /// Merge `font` over the default font.
    pub fn set_font(&mut self, font: &FontInfo) -> &mut Self {
        self.font = Self::default_font().merged(font);
        self.invalidate();
        self
    }

    pub fn set_justification(&mut self, justification: Justification) -> &mut Self {
        if self.justification != justification {
            self.justification = justification;
            self.invalidate();
        }
        self
    }

    pub fn set_line(&mut self, line: f64) -> &mut Self {
        self.line = line;
        self
    }

    pub fn set_x_shift(&mut self, x: f64) -> &mut Self {
        self.x_shift = x;
        self
    }

    pub fn set_style(&mut self, style: ElementStyle) -> &mut Self {
        self.style = style;
        self
    }

    pub fn set_stave(&mut self, stave: &'a dyn StaveGeometry) -> &mut Self {
        self.phase = match std::mem::replace(&mut self.phase, Phase::Created) {
            Phase::Created | Phase::StaveAssigned { .. } => Phase::StaveAssigned { stave },
            Phase::TickAssigned { tick, .. } => Phase::TickAssigned { stave: Some(stave), tick },
            Phase::PreFormatted { tick, layout, .. } => Phase::PreFormatted {
                stave: Some(stave),
                tick,
                layout,
            },
            Phase::Drawn { tick, layout, .. } => Phase::Drawn { stave, tick, layout },
        };
        self
    }

    /// Place the note in a tick slot. A new slot discards any resolved layout.
    pub fn set_tick_context(&mut self, tick: &'a dyn TickContext) -> &mut Self {
        let stave = self.phase.stave();
        self.phase = Phase::TickAssigned { stave, tick };
        log::debug!("text note '{}' assigned to tick slot at x={}", self.text, tick.get_x());
        self
    }

    fn invalidate(&mut self) {
        let phase = std::mem::replace(&mut self.phase, Phase::Created);
        self.phase = phase.invalidated();
    }

    // ── Layout ──────────────────────────────────────────────────────

    /// Resolve the reserved width. Runs once; later calls are no-ops until a
    /// setter invalidates the layout.
    pub fn pre_format(&mut self, metrics: &dyn FontMetrics) -> Result<()> {
        let (stave, tick) = match self.phase {
            Phase::Created | Phase::StaveAssigned { .. } => {
                return Err(RenderError::MissingContext("tick context"))
            }
            Phase::PreFormatted { .. } | Phase::Drawn { .. } => {
                log::debug!("text note '{}' already pre-formatted", self.text);
                return Ok(());
            }
            Phase::TickAssigned { stave, tick } => (stave, tick),
        };

        let width = if self.smooth {
            0.0
        } else if self.glyph.is_some() {
            self.initial_width
        } else {
            metrics.measure(&self.text, &self.font).width
        };
        self.script_size = metrics.scale_size(self.font.size, SCRIPT_SCALE);
        let layout = FormatMetrics {
            width,
            left_displaced_head_px: self.justification.offset(width),
            right_displaced_head_px: tick.glyph_px() / 2.0,
        };
        self.phase = Phase::PreFormatted { stave, tick, layout };
        log::debug!("text note '{}' pre-formatted: {:?}", self.text, layout);
        Ok(())
    }

    /// Draw at the position resolved from the tick slot and stave.
    pub fn draw<C: RenderContext>(&mut self, ctx: &mut C) -> Result<()> {
        let tick = self.phase.tick().ok_or(RenderError::MissingContext("tick context"))?;
        let stave = self.phase.stave().ok_or(RenderError::MissingContext("stave"))?;
        let layout = self
            .phase
            .layout()
            .ok_or(RenderError::MissingContext("pre-formatted layout"))?;

        let anchor = tick.get_x() + self.x_shift + tick.glyph_px() / 2.0;
        let x = anchor - self.justification.offset(layout.width);
        let y = stave.get_y_for_line(self.text_line());

        match &self.glyph {
            Some(glyph) => glyph.render(ctx, x, y),
            None => self.draw_text(ctx, x, y, layout.width),
        }

        self.phase = Phase::Drawn { stave, tick, layout };
        Ok(())
    }

    fn draw_text<C: RenderContext>(&self, ctx: &mut C, x: f64, y: f64, width: f64) {
        let mut ctx = ctx.saved();
        self.style.apply(&mut *ctx);
        ctx.set_font(&self.font).fill_text(&self.text, x, y);

        // Line-height approximation, not ink bounds.
        let height = ctx.measure_text(&self.text).height;
        if self.superscript.is_none() && self.subscript.is_none() {
            return;
        }

        let script_font = self.font.with_size(self.script_size);
        let script_x = x + width + SCRIPT_GAP;

        if let Some(sup) = &self.superscript {
            ctx.set_font(&script_font)
                .fill_text(sup, script_x, y - height / SCRIPT_RISE_DIVISOR);
        }
        if let Some(sub) = &self.subscript {
            ctx.set_font(&script_font).fill_text(
                sub,
                script_x,
                y + height / SCRIPT_RISE_DIVISOR - SUBSCRIPT_LIFT,
            );
        }
    }
}
