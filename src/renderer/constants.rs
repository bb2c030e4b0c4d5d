//! Layout constants for annotations (all in pixels unless noted).

use crate::font::{SANS_SERIF, SERIF};

// ── Time-positioned text ────────────────────────────────────────────
pub(super) const TEXT_NOTE_FONT_FAMILY: &str = SANS_SERIF;
pub(super) const TEXT_NOTE_FONT_SIZE: f64 = 12.0; // points
/// Text sits this many stave lines above its assigned line.
pub const TEXT_LINE_OFFSET: f64 = -3.0;
/// Point size music-font glyphs are drawn at.
pub const GLYPH_POINT: f64 = 40.0;

// ── Superscript / subscript ─────────────────────────────────────────
/// Script font size relative to the main font (1 / 1.3).
pub const SCRIPT_SCALE: f64 = 1.0 / 1.3;
/// Gap between main text and its scripts.
pub const SCRIPT_GAP: f64 = 2.0;
pub(super) const SCRIPT_RISE_DIVISOR: f64 = 2.2;
pub(super) const SUBSCRIPT_LIFT: f64 = 1.0;

// ── Stave-attached text ─────────────────────────────────────────────
pub(super) const STAVE_TEXT_FONT_FAMILY: &str = SERIF;
pub(super) const STAVE_TEXT_FONT_SIZE: f64 = 16.0; // points
/// Distance from the stave edge for left/right text.
pub const STAVE_TEXT_MARGIN: f64 = 24.0;
/// Text-line slot used above/below the stave.
pub const STAVE_TEXT_LINES: u32 = 2;
pub const STAVE_TEXT_BASELINE_NUDGE: f64 = 4.0;
pub const STAVE_TEXT_WIDTH: f64 = 16.0;
pub(super) const STAVE_TEXT_LINE_WIDTH: f64 = 2.0;
