//! Font descriptors: family, size (with unit), weight and style.
//!
//! A [`FontDescriptor`] is an immutable value: changing the size produces a new
//! descriptor. Sizes keep their unit so that scaling is exact
//! (`16pt × 0.5 = 8pt`), and a bare number is read as points.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RenderError, Result};

// ── Defaults ────────────────────────────────────────────────────────
pub const SANS_SERIF: &str = "Arial, sans-serif";
pub const SERIF: &str = "Times New Roman, serif";
/// Default font size in points.
pub const DEFAULT_SIZE: f64 = 10.0;

// ═══════════════════════════════════════════════════════════════════════
// FontUnit / FontSize
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontUnit {
    Pt,
    Px,
    Em,
    Percent,
    In,
    Mm,
    Cm,
}

impl FontUnit {
    /// CSS pixels per one unit.
    pub fn px_per_unit(self) -> f64 {
        match self {
            FontUnit::Pt => 4.0 / 3.0,
            FontUnit::Px => 1.0,
            FontUnit::Em => 16.0,
            FontUnit::Percent => 16.0 / 100.0,
            FontUnit::In => 96.0,
            FontUnit::Mm => 96.0 / 25.4,
            FontUnit::Cm => 96.0 / 2.54,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            FontUnit::Pt => "pt",
            FontUnit::Px => "px",
            FontUnit::Em => "em",
            FontUnit::Percent => "%",
            FontUnit::In => "in",
            FontUnit::Mm => "mm",
            FontUnit::Cm => "cm",
        }
    }

    fn from_suffix(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            // No unit means points, for compatibility with numeric sizes.
            "" | "pt" => Some(FontUnit::Pt),
            "px" => Some(FontUnit::Px),
            "em" => Some(FontUnit::Em),
            "%" => Some(FontUnit::Percent),
            "in" => Some(FontUnit::In),
            "mm" => Some(FontUnit::Mm),
            "cm" => Some(FontUnit::Cm),
            _ => None,
        }
    }
}

/// A font size with its unit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "RawFontSize", into = "String")]
pub struct FontSize {
    pub value: f64,
    pub unit: FontUnit,
}

impl FontSize {
    pub const fn new(value: f64, unit: FontUnit) -> Self {
        Self { value, unit }
    }

    pub const fn pt(value: f64) -> Self {
        Self::new(value, FontUnit::Pt)
    }

    pub const fn px(value: f64) -> Self {
        Self::new(value, FontUnit::Px)
    }

    /// Size in CSS pixels.
    pub fn to_pixels(self) -> f64 {
        self.value * self.unit.px_per_unit()
    }

    /// Multiply the numeric part by `factor`, keeping the unit.
    pub fn scaled(self, factor: f64) -> Self {
        Self::new(self.value * factor, self.unit)
    }
}

impl PartialEq for FontSize {
    fn eq(&self, other: &Self) -> bool {
        self.unit == other.unit && self.value.to_bits() == other.value.to_bits()
    }
}

impl Eq for FontSize {}

impl Hash for FontSize {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.to_bits().hash(state);
        self.unit.hash(state);
    }
}

impl From<f64> for FontSize {
    fn from(points: f64) -> Self {
        FontSize::pt(points)
    }
}

impl FromStr for FontSize {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let split = s
            .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
            .unwrap_or(s.len());
        let (number, suffix) = s.split_at(split);
        let value: f64 = number
            .parse()
            .map_err(|_| RenderError::InvalidFont(format!("bad font size '{s}'")))?;
        let unit = FontUnit::from_suffix(suffix.trim())
            .ok_or_else(|| RenderError::InvalidFont(format!("unknown font size unit in '{s}'")))?;
        Ok(FontSize::new(value, unit))
    }
}

impl fmt::Display for FontSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

impl From<FontSize> for String {
    fn from(size: FontSize) -> Self {
        size.to_string()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFontSize {
    Number(f64),
    Text(String),
}

impl TryFrom<RawFontSize> for FontSize {
    type Error = RenderError;

    fn try_from(raw: RawFontSize) -> Result<Self> {
        match raw {
            RawFontSize::Number(n) => Ok(FontSize::pt(n)),
            RawFontSize::Text(s) => s.parse(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// FontWeight / FontStyle
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawFontWeight", into = "String")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
    Bolder,
    Lighter,
    Numeric(u16),
}

impl FontWeight {
    /// True for weights rendered heavier than regular text.
    pub fn is_bold(self) -> bool {
        match self {
            FontWeight::Bold | FontWeight::Bolder => true,
            FontWeight::Numeric(n) => n >= 600,
            FontWeight::Normal | FontWeight::Lighter => false,
        }
    }
}

impl FromStr for FontWeight {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(FontWeight::Normal),
            "bold" => Ok(FontWeight::Bold),
            "bolder" => Ok(FontWeight::Bolder),
            "lighter" => Ok(FontWeight::Lighter),
            other => match other.parse::<u16>() {
                Ok(n) if (1..=1000).contains(&n) => Ok(FontWeight::Numeric(n)),
                _ => Err(RenderError::InvalidFont(format!("unknown font weight '{s}'"))),
            },
        }
    }
}

impl fmt::Display for FontWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontWeight::Normal => f.write_str("normal"),
            FontWeight::Bold => f.write_str("bold"),
            FontWeight::Bolder => f.write_str("bolder"),
            FontWeight::Lighter => f.write_str("lighter"),
            FontWeight::Numeric(n) => write!(f, "{n}"),
        }
    }
}

impl From<FontWeight> for String {
    fn from(weight: FontWeight) -> Self {
        weight.to_string()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFontWeight {
    Number(u16),
    Text(String),
}

impl TryFrom<RawFontWeight> for FontWeight {
    type Error = RenderError;

    fn try_from(raw: RawFontWeight) -> Result<Self> {
        match raw {
            RawFontWeight::Number(n) => n.to_string().parse(),
            RawFontWeight::Text(s) => s.parse(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

impl FromStr for FontStyle {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(FontStyle::Normal),
            "italic" => Ok(FontStyle::Italic),
            "oblique" => Ok(FontStyle::Oblique),
            _ => Err(RenderError::InvalidFont(format!("unknown font style '{s}'"))),
        }
    }
}

impl fmt::Display for FontStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FontStyle::Normal => "normal",
            FontStyle::Italic => "italic",
            FontStyle::Oblique => "oblique",
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════
// FontDescriptor / FontInfo
// ═══════════════════════════════════════════════════════════════════════

/// A fully resolved font.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FontDescriptor {
    pub family: String,
    pub size: FontSize,
    pub weight: FontWeight,
    pub style: FontStyle,
}

impl Default for FontDescriptor {
    fn default() -> Self {
        Self {
            family: SANS_SERIF.to_string(),
            size: FontSize::pt(DEFAULT_SIZE),
            weight: FontWeight::Normal,
            style: FontStyle::Normal,
        }
    }
}

impl FontDescriptor {
    pub fn new(
        family: impl Into<String>,
        size: impl Into<FontSize>,
        weight: FontWeight,
        style: FontStyle,
    ) -> Self {
        Self {
            family: family.into(),
            size: size.into(),
            weight,
            style,
        }
    }

    /// Same font at a different size.
    pub fn with_size(&self, size: FontSize) -> Self {
        Self {
            size,
            ..self.clone()
        }
    }

    /// Overlay the fields present in `info` onto this descriptor.
    pub fn merged(&self, info: &FontInfo) -> Self {
        Self {
            family: info.family.clone().unwrap_or_else(|| self.family.clone()),
            size: info.size.unwrap_or(self.size),
            weight: info.weight.unwrap_or(self.weight),
            style: info.style.unwrap_or(self.style),
        }
    }

    /// Size in CSS pixels; also the approximate line height.
    pub fn pixel_size(&self) -> f64 {
        self.size.to_pixels()
    }

    /// CSS font shorthand, e.g. `italic bold 16pt Arial, sans-serif`.
    pub fn to_css(&self) -> String {
        format!("{} {} {} {}", self.style, self.weight, self.size, self.family)
    }

    /// Parse a CSS font shorthand such as `italic bold 15pt Arial`.
    ///
    /// Style and weight are optional and may come in either order; the size is
    /// mandatory (a `/line-height` suffix is accepted and ignored); everything
    /// after the size is the family.
    pub fn parse_css(css: &str) -> Result<Self> {
        let mut font = FontDescriptor::default();
        let mut tokens = css.split_whitespace().peekable();
        let mut size = None;

        while let Some(token) = tokens.next() {
            let next_is_size = tokens
                .peek()
                .is_some_and(|next| next.starts_with(|c: char| c.is_ascii_digit() || c == '.'));
            if next_is_size {
                // `700 12px Arial`: a numeric weight followed by the size.
                if let Ok(weight) = token.parse::<FontWeight>() {
                    font.weight = weight;
                    continue;
                }
            }
            if token.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
                let size_part = token.split('/').next().unwrap_or(token);
                size = Some(size_part.parse::<FontSize>()?);
                break;
            }
            let lower = token.to_ascii_lowercase();
            match lower.as_str() {
                "normal" | "small-caps" => {}
                _ => {
                    if let Ok(style) = lower.parse::<FontStyle>() {
                        font.style = style;
                    } else if let Ok(weight) = lower.parse::<FontWeight>() {
                        font.weight = weight;
                    } else {
                        return Err(RenderError::InvalidFont(format!(
                            "no size in font shorthand '{css}'"
                        )));
                    }
                }
            }
        }

        font.size = size.ok_or_else(|| {
            RenderError::InvalidFont(format!("no size in font shorthand '{css}'"))
        })?;

        let family: Vec<&str> = tokens.collect();
        if family.is_empty() {
            return Err(RenderError::InvalidFont(format!(
                "no family in font shorthand '{css}'"
            )));
        }
        font.family = family.join(" ");
        Ok(font)
    }
}

/// A partial font: any field left `None` is taken from the font it is merged
/// onto (or from the defaults when resolved on its own).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontInfo {
    pub family: Option<String>,
    pub size: Option<FontSize>,
    pub weight: Option<FontWeight>,
    pub style: Option<FontStyle>,
}

impl FontInfo {
    /// Fill every missing field from the documented defaults.
    pub fn resolve(&self) -> FontDescriptor {
        FontDescriptor::default().merged(self)
    }
}

impl From<&FontDescriptor> for FontInfo {
    fn from(font: &FontDescriptor) -> Self {
        Self {
            family: Some(font.family.clone()),
            size: Some(font.size),
            weight: Some(font.weight),
            style: Some(font.style),
        }
    }
}
