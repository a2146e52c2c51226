//! Position measurement of the original, unsplit text.
//!
//! Every visible grapheme is measured for its left edge before anything in
//! the target subtree is mutated; once the subtree changes, range queries
//! against the original text nodes are meaningless.
//!
//! Each grapheme also records the inline elements it sat in between the
//! target and its text node, so the build can re-create that styling around
//! the generated units.

use crate::surface::Surface;
use crate::unicode::{Segment, is_break_char, segments};

/// An element enclosing text inside the split target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineAncestor {
    pub tag: String,
    /// Attributes without `id`, which must stay unique.
    pub attributes: Vec<(String, String)>,
}

/// One grapheme cluster and where it started in the original render.
#[derive(Clone, Debug, PartialEq)]
pub struct AtomicUnit {
    pub text: String,
    pub left: f32,
    /// Enclosing elements below the target, outermost first.
    pub context: Vec<InlineAncestor>,
}

/// A run of atomic units rendered without whitespace between them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WordUnit {
    pub chars: Vec<AtomicUnit>,
    /// Left edge of the first unit.
    pub start_left: f32,
    /// Continuation after a break character: no space goes before it.
    pub no_space_before: bool,
    /// Forced line breaks (`<br>`) between the previous word and this one.
    pub line_breaks_before: usize,
}

impl WordUnit {
    /// The word's text.
    #[must_use]
    pub fn text(&self) -> String {
        self.chars.iter().map(|c| c.text.as_str()).collect()
    }

    /// Gap from the previous unit's original left edge, for every unit after
    /// the first.
    #[must_use]
    pub fn expected_gap(&self, index: usize) -> Option<f32> {
        if index == 0 {
            return None;
        }
        let prev = self.chars.get(index - 1)?;
        let cur = self.chars.get(index)?;
        Some(cur.left - prev.left)
    }
}

/// Enclosing elements of `node` below `root`, outermost first.
fn inline_context<S: Surface>(
    surface: &S,
    root: &S::Node,
    node: &S::Node,
) -> Vec<InlineAncestor> {
    let mut context = Vec::new();
    let mut current = surface.parent_element(node);
    while let Some(element) = current {
        if element == *root {
            break;
        }
        if let Some(tag) = surface.tag_name(&element) {
            let attributes = surface
                .attributes(&element)
                .into_iter()
                .filter(|(name, _)| name != "id")
                .collect();
            context.push(InlineAncestor { tag, attributes });
        }
        current = surface.parent_element(&element);
    }
    context.reverse();
    context
}

/// Measure the text under `root` into words.
///
/// Word state carries across text node boundaries, so inline markup inside a
/// word (`foo<em>bar</em>`) still yields one word. Whitespace, break
/// characters and forced line breaks close a word.
pub fn measure<S: Surface>(surface: &S, root: &S::Node) -> Vec<WordUnit> {
    let mut words = Vec::new();
    let mut current = WordUnit::default();
    let mut continuation = false;
    let mut line_breaks = 0usize;

    for node in surface.inline_leaves(root) {
        if surface.is_element(&node) {
            if !current.chars.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continuation = false;
            line_breaks += 1;
            continue;
        }
        let context = inline_context(surface, root, &node);
        let text = surface.text(&node);
        for segment in segments(&text) {
            match segment {
                Segment::Boundary => {
                    if !current.chars.is_empty() {
                        words.push(std::mem::take(&mut current));
                    }
                    continuation = false;
                }
                Segment::Unit { offset, text: unit } => {
                    let left = surface.range_rect(&node, offset..offset + unit.len()).left;
                    if current.chars.is_empty() {
                        current.start_left = left;
                        current.no_space_before = continuation;
                        current.line_breaks_before = line_breaks;
                        continuation = false;
                        line_breaks = 0;
                    }
                    current.chars.push(AtomicUnit {
                        text: unit.to_string(),
                        left,
                        context: context.clone(),
                    });
                    if is_break_char(unit) {
                        words.push(std::mem::take(&mut current));
                        continuation = true;
                    }
                }
            }
        }
    }

    if !current.chars.is_empty() {
        words.push(current);
    }
    words
}
