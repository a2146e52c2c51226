//! Unicode utilities: grapheme segmentation and glyph advance estimation.

mod grapheme;
mod width;

pub use grapheme::{
    BREAK_CHARS, Graphemes, Segment, Segments, graphemes, is_break_char, is_whitespace_unit, segments,
};
pub use width::{advance_em, display_width};
