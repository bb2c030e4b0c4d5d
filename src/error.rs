//! Error types for layout and rendering.
//!
//! Every variant describes caller misuse of the API contract (a missing setup
//! step or an invalid configuration). Nothing here is transient, so nothing
//! is retried: the first violated precondition aborts the operation.

use thiserror::Error;

use crate::stave::ModifierPosition;

/// Top-level error type for the crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    /// A required collaborator (stave, tick context, formatted layout) has not
    /// been assigned yet.
    #[error("Missing context: can't proceed without a {0}")]
    MissingContext(&'static str),

    /// Unknown symbolic glyph name, or a code the music font doesn't carry.
    #[error("Invalid glyph type: {0}")]
    InvalidGlyph(String),

    /// Attachment side outside left/right/above/below.
    #[error("Invalid position: {0:?} must be one of left, right, above, below")]
    InvalidPosition(ModifierPosition),

    /// Font size or CSS font shorthand that can't be parsed.
    #[error("Invalid font: {0}")]
    InvalidFont(String),

    /// Malformed glyph font data.
    #[error("Invalid font data: {0}")]
    InvalidFontData(String),
}

pub type Result<T> = std::result::Result<T, RenderError>;
