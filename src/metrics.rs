//! Font metrics service: text measurement independent of any drawing surface.
//!
//! [`TextFont`] measures text from per-character advance tables (Helvetica- and
//! Times-compatible widths, in 1/1000 em). Measurements are cached by
//! `(text, font)`; the cache only grows, since both keys are immutable values.
//! The reported height is the font's pixel size, i.e. a line-height
//! approximation rather than ink bounds.

use std::collections::HashMap;
use std::sync::Mutex;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::font::{FontDescriptor, FontSize};

/// Width and height of a piece of text, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TextMeasure {
    pub width: f64,
    pub height: f64,
}

/// Text measurement contract consumed by the layout code.
pub trait FontMetrics {
    fn measure(&self, text: &str, font: &FontDescriptor) -> TextMeasure;

    /// Canonical size scaling: the numeric part is multiplied, the unit kept.
    fn scale_size(&self, size: FontSize, factor: f64) -> FontSize {
        size.scaled(factor)
    }

    fn to_pixels(&self, size: FontSize) -> f64 {
        size.to_pixels()
    }
}

// ── Advance tables (ASCII 0x20..=0x7E, 1/1000 em) ──────────────────

const SANS_ADVANCES: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a..m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n..z
    334, 260, 334, 584, // {..~
];

const SERIF_ADVANCES: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278, // ' '../
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, // 0..9
    278, 278, 564, 564, 564, 444, 921, // :..@
    722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, // A..M
    722, 722, 556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, // N..Z
    333, 278, 333, 469, 500, 333, // [..`
    444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, // a..m
    500, 500, 500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, // n..z
    480, 200, 480, 541, // {..~
];

const MONO_ADVANCE: u16 = 600;
const FALLBACK_ADVANCE: u16 = 556;
const WIDE_ADVANCE: u16 = 1000;
/// Wide (CJK and beyond) characters start here.
const WIDE_CHAR_START: u32 = 0x2E80;
const BOLD_WIDTH_FACTOR: f64 = 1.07;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FamilyClass {
    Sans,
    Serif,
    Mono,
}

impl FamilyClass {
    /// Classify by the first family in a CSS family list.
    fn of(family: &str) -> Self {
        let first = family
            .split(',')
            .next()
            .unwrap_or(family)
            .trim()
            .trim_matches(|c| c == '\'' || c == '"')
            .to_ascii_lowercase();
        if first.contains("mono") || first.contains("courier") {
            FamilyClass::Mono
        } else if first.contains("sans") {
            FamilyClass::Sans
        } else if first.contains("serif")
            || first.contains("times")
            || first.contains("georgia")
            || first.contains("garamond")
            || first.contains("roboto slab")
        {
            FamilyClass::Serif
        } else {
            FamilyClass::Sans
        }
    }

    fn advance(self, c: char) -> u16 {
        let code = c as u32;
        if code >= WIDE_CHAR_START {
            return WIDE_ADVANCE;
        }
        if self == FamilyClass::Mono {
            return MONO_ADVANCE;
        }
        let table = match self {
            FamilyClass::Serif => &SERIF_ADVANCES,
            _ => &SANS_ADVANCES,
        };
        match code {
            0x20..=0x7E => table[(code - 0x20) as usize],
            _ => FALLBACK_ADVANCE,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// TextFont
// ═══════════════════════════════════════════════════════════════════════

static SHARED: Lazy<TextFont> = Lazy::new(TextFont::new);

/// Table-driven metrics service with an append-only measurement cache.
#[derive(Debug, Default)]
pub struct TextFont {
    cache: Mutex<HashMap<(String, FontDescriptor), TextMeasure>>,
}

impl TextFont {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide instance.
    pub fn shared() -> &'static TextFont {
        &SHARED
    }

    /// Number of cached measurements.
    pub fn cached_entries(&self) -> usize {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn compute(text: &str, font: &FontDescriptor) -> TextMeasure {
        let class = FamilyClass::of(&font.family);
        let units: u32 = text.chars().map(|c| u32::from(class.advance(c))).sum();
        let px = font.pixel_size();
        let mut width = f64::from(units) / 1000.0 * px;
        if font.weight.is_bold() {
            width *= BOLD_WIDTH_FACTOR;
        }
        TextMeasure { width, height: px }
    }
}

impl FontMetrics for TextFont {
    fn measure(&self, text: &str, font: &FontDescriptor) -> TextMeasure {
        let key = (text.to_string(), font.clone());
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        *cache
            .entry(key)
            .or_insert_with(|| TextFont::compute(text, font))
    }
}

/// Handle to [`TextFont::shared`] for owners that want a `FontMetrics` value.
#[derive(Debug, Clone, Copy, Default)]
pub struct SharedTextFont;

impl FontMetrics for SharedTextFont {
    fn measure(&self, text: &str, font: &FontDescriptor) -> TextMeasure {
        TextFont::shared().measure(text, font)
    }
}
