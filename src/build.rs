//! Construction of the nested unit hierarchy.
//!
//! Words are always materialized as `inline-block` wrappers because spacing,
//! kerning compensation and line clustering all operate on them. Whether the
//! wrappers are exposed (and tagged) depends on the requested tiers.
//!
//! Text that sat inside inline elements (`<em>`, `<a>`, styled spans) is
//! wrapped in fresh copies of those elements inside each unit, so it keeps
//! its styling and metrics.

use crate::config::{BuildConfig, MaskTier};
use crate::measure::{InlineAncestor, WordUnit};
use crate::surface::Surface;

pub(crate) const WILL_CHANGE: &str = "transform, opacity";

const LINE_BREAK_TAG: &str = "br";

/// Box properties dropped from copied ancestors; each unit copy would
/// otherwise repeat them.
const BOX_PROPERTIES: &[&str] = &[
    "display",
    "width",
    "margin",
    "margin-left",
    "margin-right",
    "padding",
    "padding-left",
    "padding-right",
    "border",
    "border-left",
    "border-right",
];

/// A generated char unit.
#[derive(Clone, Debug)]
pub(crate) struct BuiltChar<N> {
    /// The exposed unit.
    pub node: N,
    /// The node participating in layout (the mask, when masked).
    pub outer: N,
    /// Original distance from the previous char's left edge. Taken by the
    /// kerning pass.
    pub expected_gap: Option<f32>,
}

/// A generated word wrapper.
#[derive(Clone, Debug)]
pub(crate) struct BuiltWord<N> {
    pub node: N,
    pub outer: N,
    pub chars: Vec<BuiltChar<N>>,
    pub no_space_before: bool,
    pub line_breaks_before: usize,
}

/// Create a span tagged with `class` and `display`.
pub(crate) fn unit_element<S: Surface>(surface: &mut S, class: Option<&str>, display: &str) -> S::Node {
    let node = surface.create_element("span");
    if let Some(class) = class.filter(|c| !c.is_empty()) {
        surface.set_attribute(&node, "class", class);
    }
    surface.set_style(&node, "display", display);
    node
}

/// Wrap `node` in a clipping mask when `tier` is the masked tier.
pub(crate) fn masked<S: Surface>(
    surface: &mut S,
    config: &BuildConfig,
    tier: MaskTier,
    node: &S::Node,
    display: &str,
) -> S::Node {
    if config.mask != Some(tier) {
        return node.clone();
    }
    let mask = unit_element(surface, Some(&config.mask_class), display);
    surface.set_style(&mask, "overflow", "clip");
    surface.append_child(&mask, node);
    mask
}

/// Wrap `content` in fresh copies of `context`; returns the outermost node.
fn wrap_in_context<S: Surface>(
    surface: &mut S,
    context: &[InlineAncestor],
    content: S::Node,
) -> S::Node {
    context.iter().rev().fold(content, |inner, ancestor| {
        let element = surface.create_element(&ancestor.tag);
        for (name, value) in &ancestor.attributes {
            surface.set_attribute(&element, name, value);
        }
        for property in BOX_PROPERTIES {
            if surface.style(&element, property).is_some() {
                surface.set_style(&element, property, "");
            }
        }
        surface.append_child(&element, &inner);
        element
    })
}

/// Append `words` to `parent`.
///
/// Words are separated by their forced line breaks, or else by a single
/// space unless they continue a break character. The first word's first
/// `skip_breaks` line breaks are left out.
pub(crate) fn append_words<'a, S>(
    surface: &mut S,
    parent: &S::Node,
    words: impl IntoIterator<Item = &'a BuiltWord<S::Node>>,
    skip_breaks: usize,
) where
    S: Surface,
    S::Node: 'a,
{
    for (i, word) in words.into_iter().enumerate() {
        let breaks = if i == 0 {
            word.line_breaks_before.saturating_sub(skip_breaks)
        } else {
            word.line_breaks_before
        };
        for _ in 0..breaks {
            let br = surface.create_element(LINE_BREAK_TAG);
            surface.append_child(parent, &br);
        }
        if i > 0 && word.line_breaks_before == 0 && !word.no_space_before {
            let space = surface.create_text(" ");
            surface.append_child(parent, &space);
        }
        surface.append_child(parent, &word.outer);
    }
}

/// Clear `target` and rebuild it from measured words.
pub(crate) fn build<S: Surface>(
    surface: &mut S,
    target: &S::Node,
    words: &[WordUnit],
    config: &BuildConfig,
) -> Vec<BuiltWord<S::Node>> {
    surface.clear_children(target);

    let mut built = Vec::with_capacity(words.len());
    let mut char_index = 0usize;

    for (word_index, word) in words.iter().enumerate() {
        let class = config.words().then_some(config.word_class.as_str());
        let wrapper = unit_element(surface, class, "inline-block");
        if config.words() {
            if config.prop_index {
                surface.set_style(&wrapper, "--word-index", &word_index.to_string());
            }
            if config.will_change {
                surface.set_style(&wrapper, "will-change", WILL_CHANGE);
            }
        }

        let mut chars = Vec::new();
        if config.chars() {
            for (i, unit) in word.chars.iter().enumerate() {
                let node = unit_element(surface, Some(&config.char_class), "inline-block");
                let text = surface.create_text(&unit.text);
                let content = wrap_in_context(surface, &unit.context, text);
                surface.append_child(&node, &content);
                if config.prop_index {
                    surface.set_style(&node, "--char-index", &char_index.to_string());
                }
                if config.will_change {
                    surface.set_style(&node, "will-change", WILL_CHANGE);
                }
                let outer = masked(surface, config, MaskTier::Chars, &node, "inline-block");
                surface.set_attribute(&outer, "aria-hidden", "true");
                surface.append_child(&wrapper, &outer);
                chars.push(BuiltChar {
                    node,
                    outer,
                    expected_gap: word.expected_gap(i),
                });
                char_index += 1;
            }
        } else {
            // One text node per run of chars sharing the same ancestors.
            for run in word.chars.chunk_by(|a, b| a.context == b.context) {
                let text: String = run.iter().map(|c| c.text.as_str()).collect();
                let text = surface.create_text(&text);
                let content = wrap_in_context(surface, &run[0].context, text);
                surface.append_child(&wrapper, &content);
            }
        }

        let outer = masked(surface, config, MaskTier::Words, &wrapper, "inline-block");
        surface.set_attribute(&outer, "aria-hidden", "true");
        built.push(BuiltWord {
            node: wrapper,
            outer,
            chars,
            no_space_before: word.no_space_before,
            line_breaks_before: word.line_breaks_before,
        });
    }

    append_words(surface, target, &built, 0);
    built
}
