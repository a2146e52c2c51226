//! Display width and glyph advance estimation.

use unicode_width::UnicodeWidthStr;

/// Advance of a single-column glyph, in em.
const COLUMN_ADVANCE_EM: f32 = 0.55;

/// Get the display width of a string in columns.
#[must_use]
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Estimated horizontal advance of a grapheme, in em.
///
/// Zero-width clusters advance by nothing, wide (CJK, emoji) clusters by two
/// columns. Used by the in-memory surface as its font metrics.
#[must_use]
pub fn advance_em(grapheme: &str) -> f32 {
    // Emoji sequences report the sum of their parts; a cluster never spans
    // more than two columns on screen.
    let cols = display_width(grapheme).min(2);
    cols as f32 * COLUMN_ADVANCE_EM
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_width() {
        assert_eq!(display_width("hello"), 5);
        assert!((advance_em("a") - 0.55).abs() < f32::EPSILON);
    }

    #[test]
    fn test_wide_advance() {
        assert!((advance_em("漢") - 1.1).abs() < 1e-6);
        assert!((advance_em("👨‍👩‍👦") - 1.1).abs() < 1e-6);
    }

    #[test]
    fn test_zero_width_advance() {
        assert!(advance_em("\u{0301}").abs() < f32::EPSILON);
    }
}
