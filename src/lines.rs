//! Line clustering and re-wrapping.
//!
//! Words are grouped by their rendered top edge. The tolerance scales with
//! font size: large display type sits on taller line boxes and its words'
//! top edges wobble more with mixed glyph heights.

use crate::build::{BuiltWord, WILL_CHANGE, append_words, masked, unit_element};
use crate::config::{BuildConfig, MaskTier};
use crate::surface::Surface;

/// Floor for the clustering tolerance, in layout units.
pub const MIN_LINE_TOLERANCE: f32 = 5.0;

/// Fraction of the font size two words' tops may differ by on one line.
pub const LINE_TOLERANCE_RATIO: f32 = 0.3;

/// Clustering tolerance for a font size.
#[must_use]
pub fn line_tolerance(font_size: f32) -> f32 {
    MIN_LINE_TOLERANCE.max(font_size * LINE_TOLERANCE_RATIO)
}

/// Group word indices into lines by top coordinate.
///
/// Each line's reference is the rounded top of its first word; a word whose
/// rounded top differs from it by `tolerance` or more starts a new line.
#[must_use]
pub fn group_by_top(tops: &[f32], tolerance: f32) -> Vec<Vec<usize>> {
    let mut lines: Vec<Vec<usize>> = Vec::new();
    let mut reference: Option<f32> = None;
    for (i, top) in tops.iter().map(|t| t.round()).enumerate() {
        if reference.is_some_and(|r| (top - r).abs() < tolerance) {
            if let Some(line) = lines.last_mut() {
                line.push(i);
                continue;
            }
        }
        lines.push(vec![i]);
        reference = Some(top);
    }
    lines
}

/// Cluster built words into lines using their current geometry.
pub(crate) fn cluster<S: Surface>(
    surface: &S,
    words: &[BuiltWord<S::Node>],
    font_size: f32,
) -> Vec<Vec<usize>> {
    let tops: Vec<f32> = words
        .iter()
        .map(|w| surface.element_rect(&w.outer).top)
        .collect();
    group_by_top(&tops, line_tolerance(font_size))
}

/// Replace the flat word sequence in `target` with one block per line.
///
/// Words move into their line first; clearing the target then only discards
/// the separators between them. Returns the line nodes in order.
pub(crate) fn rewrap<S: Surface>(
    surface: &mut S,
    target: &S::Node,
    words: &[BuiltWord<S::Node>],
    lines: &[Vec<usize>],
    config: &BuildConfig,
) -> Vec<S::Node> {
    let mut nodes = Vec::with_capacity(lines.len());
    let mut outers = Vec::with_capacity(lines.len());
    for (line_index, line) in lines.iter().enumerate() {
        let node = unit_element(surface, Some(&config.line_class), "block");
        if config.prop_index {
            surface.set_style(&node, "--line-index", &line_index.to_string());
        }
        if config.will_change {
            surface.set_style(&node, "will-change", WILL_CHANGE);
        }
        // A line block already starts on a new line, which stands in for one
        // of the breaks before its first word.
        let skip_breaks = usize::from(line_index > 0);
        append_words(
            surface,
            &node,
            line.iter().filter_map(|&i| words.get(i)),
            skip_breaks,
        );
        let outer = masked(surface, config, MaskTier::Lines, &node, "block");
        surface.set_attribute(&outer, "aria-hidden", "true");
        outers.push(outer);
        nodes.push(node);
    }

    surface.clear_children(target);
    for outer in &outers {
        surface.append_child(target, outer);
    }
    nodes
}
