//! The host rendering surface the splitter reads layout from and mutates.
//!
//! The splitter never lays text out itself. Everything it knows about
//! geometry comes through [`Surface`], which a host implements over its own
//! document model. [`MemorySurface`] is a self-contained implementation with a
//! deterministic layout engine.

mod markup;
mod memory;

pub use memory::{MemorySurface, NodeId};

use std::fmt::Debug;
use std::ops::Range;

/// Axis-aligned bounding box in layout units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle.
    #[must_use]
    pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Smallest rectangle containing both.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let left = self.left.min(other.left);
        let top = self.top.min(other.top);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Self::new(left, top, right - left, bottom - top)
    }
}

/// Computed text styling relevant to splitting.
#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    /// Font size in pixels.
    pub font_size: f32,
    /// Extra spacing between characters in pixels.
    pub letter_spacing: f32,
    /// Extra spacing between words in pixels.
    pub word_spacing: f32,
    /// Font smoothing mode, if the host exposes one (`antialiased`, `auto`...).
    pub font_smoothing: Option<String>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 16.0,
            letter_spacing: 0.0,
            word_spacing: 0.0,
            font_smoothing: None,
        }
    }
}

/// Capabilities the splitter needs from the host.
///
/// Text node offsets are byte offsets into the node's text.
pub trait Surface {
    /// Handle to a node (element or text) in the host document.
    type Node: Clone + PartialEq + Debug;

    /// Whether `node` is an element (not a text node).
    fn is_element(&self, node: &Self::Node) -> bool;

    /// Whether `node` is attached to the rendered document.
    fn is_connected(&self, node: &Self::Node) -> bool;

    /// Parent element, if any.
    fn parent_element(&self, node: &Self::Node) -> Option<Self::Node>;

    /// All text nodes under `root`, in document order.
    fn text_nodes(&self, root: &Self::Node) -> Vec<Self::Node>;

    /// Text nodes and forced line breaks (`<br>`) under `root`, in document
    /// order. Hosts without line break elements keep the default.
    fn inline_leaves(&self, root: &Self::Node) -> Vec<Self::Node> {
        self.text_nodes(root)
    }

    /// Text content of a text node.
    fn text(&self, text_node: &Self::Node) -> String;

    /// Bounding box of a byte range within a text node.
    fn range_rect(&self, text_node: &Self::Node, range: Range<usize>) -> Rect;

    /// Border box of an element.
    fn element_rect(&self, node: &Self::Node) -> Rect;

    /// Computed text styling for an element.
    fn computed_style(&self, node: &Self::Node) -> TextStyle;

    /// Whether font metrics are final. Hosts that never swap fonts keep the
    /// default.
    fn fonts_ready(&self) -> bool {
        true
    }

    /// Serialized markup of the children of `node`.
    fn inner_markup(&self, node: &Self::Node) -> String;

    /// Replace the children of `node` by parsing `markup`.
    fn set_inner_markup(&mut self, node: &Self::Node, markup: &str);

    /// Remove every child of `node`. Removed subtrees are discarded; move
    /// nodes that must survive elsewhere first.
    fn clear_children(&mut self, node: &Self::Node);

    /// Create a detached element.
    fn create_element(&mut self, tag: &str) -> Self::Node;

    /// Create a detached text node.
    fn create_text(&mut self, text: &str) -> Self::Node;

    /// Append `child` as the last child of `parent`.
    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node);

    /// Lowercase tag name of an element.
    fn tag_name(&self, node: &Self::Node) -> Option<String>;

    /// Every attribute of an element, in source order.
    fn attributes(&self, node: &Self::Node) -> Vec<(String, String)>;

    /// Read an attribute.
    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    /// Set an attribute.
    fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str);

    /// Remove an attribute.
    fn remove_attribute(&mut self, node: &Self::Node, name: &str);

    /// Read an inline style property.
    fn style(&self, node: &Self::Node, property: &str) -> Option<String>;

    /// Set an inline style property.
    fn set_style(&mut self, node: &Self::Node, property: &str, value: &str);
}
