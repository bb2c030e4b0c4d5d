//! scoretext: backend-agnostic render contexts and text layout for music
//! notation.
//!
//! Layout code draws through [`RenderContext`], implemented by a raster
//! adapter ([`CanvasContext`] over any [`Canvas2D`] surface) and a vector
//! adapter ([`SvgContext`]). On top of that sit two annotation types:
//! time-positioned [`TextNote`]s and stave-attached [`StaveText`].
//!
//! # Example
//! ```
//! use scoretext::{
//!     ModifierPosition, Stave, StaveText, StaveTextOptions, SvgContext, TextFont, TextNote,
//!     TextNoteStruct, TickSlot,
//! };
//!
//! let stave = Stave::new(10.0, 40.0, 300.0);
//! let tick = TickSlot::new(120.0, 12.0);
//! let mut ctx = SvgContext::new(400.0, 200.0);
//!
//! let mut note = TextNote::new(TextNoteStruct {
//!     text: Some("cresc.".into()),
//!     ..Default::default()
//! })?;
//! note.set_stave(&stave).set_tick_context(&tick);
//! note.pre_format(TextFont::shared())?;
//! note.draw(&mut ctx)?;
//!
//! StaveText::new("Allegro", ModifierPosition::Above, StaveTextOptions::default())
//!     .draw(&mut ctx, &stave)?;
//!
//! assert!(ctx.to_svg().contains("cresc."));
//! # Ok::<(), scoretext::RenderError>(())
//! ```

pub mod context;
pub mod error;
pub mod font;
pub mod glyph;
pub mod metrics;
pub mod renderer;
pub mod stave;

pub use context::{
    Canvas2D, CanvasContext, CanvasElement, DrawCommand, GroupAttributes, LineCap, RecordingCanvas,
    RenderContext, Saved, SvgContext, SvgNode,
};
pub use error::{RenderError, Result};
pub use font::{FontDescriptor, FontInfo, FontSize, FontStyle, FontUnit, FontWeight};
pub use glyph::{Glyph, GlyphMetrics, GlyphSource, NoGlyphs, OutlineFont};
pub use metrics::{FontMetrics, SharedTextFont, TextFont, TextMeasure};
pub use renderer::{
    ElementStyle, FormatMetrics, Justification, StaveText, StaveTextOptions, TextNote,
    TextNoteState, TextNoteStruct,
};
pub use stave::{ModifierPosition, Stave, StaveGeometry, StaveOptions, TickContext, TickSlot};
