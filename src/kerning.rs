//! Kerning compensation for isolated glyphs.
//!
//! Once every grapheme sits in its own element the renderer stops applying
//! pair kerning between them. The drift is measured after insertion and
//! undone with a `margin-left` on each affected char, which shifts that char
//! and everything after it, so each correction only changes its own gap.

use tracing::debug;

use crate::build::BuiltWord;
use crate::error::Diagnostic;
use crate::surface::Surface;

/// Deltas at or above this many layout units are treated as measurement
/// noise (fallback fonts, zero-width boxes) and skipped.
pub const DEFAULT_KERNING_BOUND: f32 = 20.0;

/// Round to two decimal places.
fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

/// Correct inter-character spacing of every word with two or more chars.
///
/// Returns a diagnostic for every delta rejected by `bound`.
pub(crate) fn compensate<S: Surface>(
    surface: &mut S,
    words: &mut [BuiltWord<S::Node>],
    bound: f32,
) -> Vec<Diagnostic> {
    // Read every position before writing any margin.
    let positions: Vec<Vec<f32>> = words
        .iter()
        .map(|word| {
            if word.chars.len() < 2 {
                return Vec::new();
            }
            word.chars
                .iter()
                .map(|c| surface.element_rect(&c.outer).left)
                .collect()
        })
        .collect();

    let mut anomalies = Vec::new();
    for (word_index, (word, pos)) in words.iter_mut().zip(&positions).enumerate() {
        if pos.is_empty() {
            continue;
        }
        for (i, ch) in word.chars.iter_mut().enumerate().skip(1) {
            let Some(expected) = ch.expected_gap.take() else {
                continue;
            };
            let current = pos[i] - pos[i - 1];
            let delta = expected - current;
            if delta.abs() >= bound {
                debug!(word = word_index, index = i, delta, "kerning delta out of bounds");
                anomalies.push(Diagnostic::MeasurementAnomaly {
                    word: word_index,
                    index: i,
                    delta,
                });
                continue;
            }
            let delta = round2(delta);
            if delta != 0.0 {
                surface.set_style(&ch.outer, "margin-left", &format!("{delta}px"));
            }
        }
    }
    anomalies
}
