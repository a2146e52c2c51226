//! Grapheme cluster segmentation.
//!
//! The segmenter is the leaf of the split pipeline: it turns raw text into
//! user-perceived characters. Multi-codepoint sequences (combining marks,
//! ZWJ emoji, flags) are always a single unit. Whitespace is reported as a
//! boundary rather than a unit.

use unicode_segmentation::{GraphemeIndices, UnicodeSegmentation};

/// Characters that end the current word but stay attached to it.
///
/// The word that follows a break character is joined without a space.
pub const BREAK_CHARS: [char; 2] = ['\u{2014}', '\u{2013}'];

/// Iterator over grapheme clusters in a string.
pub struct Graphemes<'a> {
    inner: unicode_segmentation::Graphemes<'a>,
}

impl<'a> Iterator for Graphemes<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// Iterate over extended grapheme clusters in a string.
#[must_use]
pub fn graphemes(s: &str) -> Graphemes<'_> {
    Graphemes {
        inner: s.graphemes(true),
    }
}

/// One step of segmentation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Segment<'a> {
    /// A visible grapheme cluster starting at `offset` bytes into the text.
    Unit { offset: usize, text: &'a str },
    /// A run of one whitespace grapheme; closes the current word.
    Boundary,
}

/// Lazy segmentation of a text into units and boundaries.
///
/// Each call to [`segments`] starts fresh, so the sequence is restartable.
pub struct Segments<'a> {
    inner: GraphemeIndices<'a>,
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (offset, text) = self.inner.next()?;
        if is_whitespace_unit(text) {
            Some(Segment::Boundary)
        } else {
            Some(Segment::Unit { offset, text })
        }
    }
}

/// Segment `s` into visible units and whitespace boundaries.
#[must_use]
pub fn segments(s: &str) -> Segments<'_> {
    Segments {
        inner: s.grapheme_indices(true),
    }
}

/// Whether a grapheme is layout whitespace (space, tab, newline, CR, FF).
///
/// Non-breaking spaces are deliberately not whitespace here: they keep words
/// together.
#[must_use]
pub fn is_whitespace_unit(grapheme: &str) -> bool {
    !grapheme.is_empty() && grapheme.chars().all(|c| c.is_ascii_whitespace())
}

/// Whether a grapheme is a word-terminating break character.
#[must_use]
pub fn is_break_char(grapheme: &str) -> bool {
    let mut chars = grapheme.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if BREAK_CHARS.contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units(s: &str) -> Vec<&str> {
        segments(s)
            .filter_map(|seg| match seg {
                Segment::Unit { text, .. } => Some(text),
                Segment::Boundary => None,
            })
            .collect()
    }

    #[test]
    fn test_graphemes_ascii() {
        let g: Vec<_> = graphemes("hello").collect();
        assert_eq!(g, vec!["h", "e", "l", "l", "o"]);
    }

    #[test]
    fn test_family_emoji_is_one_unit() {
        let u = units("Hello 👨‍👩‍👦 World 🎉✨");
        assert!(u.contains(&"👨‍👩‍👦"));
        assert_eq!(u.len(), 5 + 1 + 5 + 2);
    }

    #[test]
    fn test_graphemes_combining() {
        assert_eq!(units("e\u{0301}"), vec!["e\u{0301}"]);
    }

    #[test]
    fn test_whitespace_is_boundary() {
        let segs: Vec<_> = segments("a b\tc\r\nd").collect();
        let boundaries = segs.iter().filter(|s| **s == Segment::Boundary).count();
        assert_eq!(boundaries, 3);
        assert_eq!(units("a b\tc\r\nd"), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_offsets_point_into_source() {
        let text = "añb";
        for seg in segments(text) {
            if let Segment::Unit { offset, text: unit } = seg {
                assert_eq!(&text[offset..offset + unit.len()], unit);
            }
        }
    }

    #[test]
    fn test_restartable() {
        let text = "one two";
        assert_eq!(segments(text).count(), segments(text).count());
    }

    #[test]
    fn test_nbsp_is_not_whitespace() {
        assert!(!is_whitespace_unit("\u{00A0}"));
        assert!(is_whitespace_unit(" "));
        assert!(is_whitespace_unit("\r\n"));
        assert!(!is_whitespace_unit(""));
    }

    #[test]
    fn test_break_chars() {
        assert!(is_break_char("\u{2014}"));
        assert!(is_break_char("\u{2013}"));
        assert!(!is_break_char("-"));
        assert!(!is_break_char("\u{2014}\u{0301}"));
    }
}
