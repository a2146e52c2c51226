//! In-memory document with a deterministic inline layout engine.
//!
//! [`MemorySurface`] is an arena of element and text nodes plus just enough
//! layout to make splitting observable:
//!
//! - glyph advances come from Unicode display width scaled by `font-size`,
//! - adjacent glyphs of the *same text node* are pair-kerned, so isolating
//!   glyphs into separate elements drifts the way a browser does,
//! - lines wrap greedily at whitespace, after break characters and between
//!   `inline-block` atoms; `inline-block` content never wraps internally,
//! - `block` elements (by tag or `display`) stack vertically,
//! - `margin-left`, `width`, `font-size` and `letter-spacing` inline styles
//!   are honoured (pixels only),
//! - `<br>` forces a line break.
//!
//! Layout is computed lazily and cached until the next mutation. Removed
//! subtrees are freed and their slots reused; a handle to a freed node
//! resolves to nothing.

use std::cell::OnceCell;
use std::collections::HashMap;
use std::io;
use std::ops::Range;

use html5ever::QualName;
use html5ever::serialize::{Serialize, Serializer, TraversalScope};

use super::markup::{self, Fragment};
use super::{Rect, Surface, TextStyle};
use crate::unicode::{advance_em, graphemes, is_break_char, is_whitespace_unit};

/// Line height as a multiple of font size.
const LINE_HEIGHT: f32 = 1.2;

/// Space advance in em.
const SPACE_EM: f32 = 0.25;

/// Pair kerning adjustments in em, applied between glyphs of one text node.
const KERNING_PAIRS: &[(&str, &str, f32)] = &[
    ("A", "V", -0.08),
    ("V", "A", -0.08),
    ("A", "W", -0.06),
    ("W", "A", -0.06),
    ("A", "T", -0.05),
    ("T", "A", -0.05),
    ("A", "Y", -0.07),
    ("Y", "A", -0.07),
    ("L", "T", -0.08),
    ("T", "o", -0.07),
    ("T", "a", -0.07),
    ("T", "e", -0.07),
    ("V", "o", -0.05),
    ("W", "o", -0.04),
    ("Y", "o", -0.06),
    ("P", "a", -0.04),
    ("F", "a", -0.04),
    ("y", ".", -0.05),
    ("r", ".", -0.04),
];

const LINE_BREAK_TAG: &str = "br";

const BLOCK_TAGS: &[&str] = &[
    "body",
    "div",
    "p",
    "section",
    "article",
    "header",
    "footer",
    "blockquote",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "ul",
    "ol",
    "li",
];

/// Handle to a node in a [`MemorySurface`].
///
/// The generation tells a live node apart from an earlier occupant of the
/// same slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

#[derive(Clone, Debug)]
enum NodeData {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Clone, Debug)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

#[derive(Clone, Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Display {
    Block,
    InlineBlock,
    Inline,
    None,
}

/// In-memory document implementing [`Surface`].
#[derive(Debug)]
pub struct MemorySurface {
    slots: Vec<Slot>,
    free: Vec<usize>,
    body: NodeId,
    viewport_width: f32,
    font_size: f32,
    kerning: bool,
    fonts_ready: bool,
    layout: OnceCell<Layout>,
}

impl MemorySurface {
    /// Create an empty document whose body is `viewport_width` pixels wide.
    #[must_use]
    pub fn new(viewport_width: f32) -> Self {
        let body = Node {
            parent: None,
            children: Vec::new(),
            data: NodeData::Element {
                tag: "body".to_string(),
                attrs: Vec::new(),
            },
        };
        Self {
            slots: vec![Slot {
                generation: 0,
                node: Some(body),
            }],
            free: Vec::new(),
            body: NodeId {
                index: 0,
                generation: 0,
            },
            viewport_width,
            font_size: 16.0,
            kerning: true,
            fonts_ready: true,
            layout: OnceCell::new(),
        }
    }

    /// Default font size for nodes without an inherited `font-size`.
    #[must_use]
    pub fn with_font_size(mut self, font_size: f32) -> Self {
        self.font_size = font_size;
        self
    }

    /// Enable or disable pair kerning.
    #[must_use]
    pub fn with_kerning(mut self, kerning: bool) -> Self {
        self.kerning = kerning;
        self
    }

    /// The document body.
    #[must_use]
    pub const fn body(&self) -> NodeId {
        self.body
    }

    /// Parse `markup` into the body and return the first element created.
    ///
    /// Falls back to the body when the markup holds no element.
    pub fn mount(&mut self, markup: &str) -> NodeId {
        let body = self.body;
        let created = self.append_markup(body, markup);
        created
            .into_iter()
            .find(|id| self.is_element(id))
            .unwrap_or(body)
    }

    /// Parse `markup` and append the resulting nodes to `parent`.
    pub fn append_markup(&mut self, parent: NodeId, markup: &str) -> Vec<NodeId> {
        let fragments = markup::parse(markup);
        let mut created = Vec::with_capacity(fragments.len());
        for fragment in fragments {
            let id = self.build_fragment(fragment);
            self.append_child(&parent, &id);
            created.push(id);
        }
        created
    }

    fn build_fragment(&mut self, fragment: Fragment) -> NodeId {
        match fragment {
            Fragment::Text(text) => self.create_text(&text),
            Fragment::Element {
                tag,
                attrs,
                children,
            } => {
                let id = self.push_node(NodeData::Element { tag, attrs });
                for child in children {
                    let child = self.build_fragment(child);
                    self.append_child(&id, &child);
                }
                id
            }
        }
    }

    fn push_node(&mut self, data: NodeData) -> NodeId {
        self.layout.take();
        let node = Node {
            parent: None,
            children: Vec::new(),
            data,
        };
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.node = Some(node);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index: self.slots.len() - 1,
            generation: 0,
        }
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    /// Free `id` and its whole subtree. The caller unlinks it from its parent.
    fn release(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let Some(slot) = self
                .slots
                .get_mut(id.index)
                .filter(|slot| slot.generation == id.generation)
            else {
                continue;
            };
            let Some(node) = slot.node.take() else {
                continue;
            };
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(id.index);
            stack.extend(node.children);
        }
    }

    /// Number of live nodes, the body included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.node.is_some()).count()
    }

    /// Children of a node, in order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id).map(|n| n.children.clone()).unwrap_or_default()
    }

    /// Tag name of an element.
    #[must_use]
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.node(id)?.data {
            NodeData::Element { tag, .. } => Some(tag),
            NodeData::Text(_) => None,
        }
    }

    /// Concatenated text of every text node under `id`.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        match self.node(id).map(|n| &n.data) {
            Some(NodeData::Text(text)) => text.clone(),
            Some(NodeData::Element { .. }) => self
                .text_nodes(&id)
                .iter()
                .map(|t| self.text(t))
                .collect(),
            None => String::new(),
        }
    }

    /// Serialized markup of `id` including its own tag.
    #[must_use]
    pub fn outer_markup(&self, id: NodeId) -> String {
        markup::serialize(&self.subtree(id), TraversalScope::IncludeNode)
    }

    const fn subtree(&self, id: NodeId) -> Subtree<'_> {
        Subtree { surface: self, id }
    }

    /// Detach a node from its parent.
    pub fn detach(&mut self, id: NodeId) {
        self.layout.take();
        let Some(parent) = self.node(id).and_then(|n| n.parent) else {
            return;
        };
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|c| *c != id);
        }
        if let Some(n) = self.node_mut(id) {
            n.parent = None;
        }
    }

    /// Set an element's `width` in pixels.
    pub fn set_width(&mut self, id: NodeId, width: f32) {
        self.set_style(&id, "width", &format!("{width}px"));
    }

    /// Set the viewport width used by the body.
    pub fn set_viewport_width(&mut self, width: f32) {
        self.layout.take();
        self.viewport_width = width;
    }

    /// Mark font metrics as final (or pending).
    pub fn set_fonts_ready(&mut self, ready: bool) {
        self.layout.take();
        self.fonts_ready = ready;
    }

    fn attrs_mut(&mut self, id: NodeId) -> Option<&mut Vec<(String, String)>> {
        match &mut self.node_mut(id)?.data {
            NodeData::Element { attrs, .. } => Some(attrs),
            NodeData::Text(_) => None,
        }
    }

    fn display(&self, id: NodeId) -> Display {
        let Some(tag) = self.tag(id) else {
            return Display::Inline;
        };
        match self.style(&id, "display").as_deref() {
            Some("block") => Display::Block,
            Some("inline-block") => Display::InlineBlock,
            Some("inline") => Display::Inline,
            Some("none") => Display::None,
            _ if BLOCK_TAGS.contains(&tag) => Display::Block,
            _ => Display::Inline,
        }
    }

    /// Inherited pixel value of a style property, or `fallback`.
    fn inherited_px(&self, id: NodeId, property: &str, fallback: f32) -> f32 {
        let mut current = Some(id);
        while let Some(node) = current {
            if let Some(px) = self.style(&node, property).as_deref().and_then(parse_px) {
                return px;
            }
            current = self.node(node).and_then(|n| n.parent);
        }
        fallback
    }

    fn own_px(&self, id: NodeId, property: &str) -> Option<f32> {
        self.style(&id, property).as_deref().and_then(parse_px)
    }

    fn font_size_of(&self, id: NodeId) -> f32 {
        self.inherited_px(id, "font-size", self.font_size)
    }

    fn layout(&self) -> &Layout {
        self.layout.get_or_init(|| {
            let mut layout = Layout::default();
            let body = self.body;
            let width = self.own_px(body, "width").unwrap_or(self.viewport_width);
            let height = self.layout_block(body, 0.0, width, 0.0, &mut layout);
            layout.boxes.insert(body, Rect::new(0.0, 0.0, width, height));
            layout
        })
    }

    /// Lay out the children of a block; returns the bottom edge.
    fn layout_block(&self, id: NodeId, x0: f32, width: f32, top: f32, out: &mut Layout) -> f32 {
        let line_height = self.font_size_of(id) * LINE_HEIGHT;
        let mut flow = InlineFlow::new(x0, width, top, line_height);

        for child in self.children(id) {
            match self.display(child) {
                Display::None => {}
                Display::Block => {
                    let y = flow.finish(out);
                    let margin = self.own_px(child, "margin-left").unwrap_or(0.0);
                    let child_width = self.own_px(child, "width").unwrap_or(width - margin);
                    let bottom = self.layout_block(child, x0 + margin, child_width, y, out);
                    out.boxes
                        .insert(child, Rect::new(x0 + margin, y, child_width, bottom - y));
                    flow = InlineFlow::new(x0, width, bottom, line_height);
                }
                Display::Inline | Display::InlineBlock => {
                    self.collect_inline(child, false, &mut flow.pieces);
                }
            }
        }
        flow.finish(out)
    }

    fn collect_inline(&self, id: NodeId, atomic: bool, pieces: &mut Vec<Piece>) {
        let Some(node) = self.node(id) else {
            return;
        };
        match &node.data {
            NodeData::Text(text) => {
                let parent = node.parent.unwrap_or(self.body);
                let font_size = self.font_size_of(parent);
                let letter_spacing = self.inherited_px(parent, "letter-spacing", 0.0);
                let height = font_size * LINE_HEIGHT;
                let mut prev: Option<&str> = None;
                let mut offset = 0;
                for g in graphemes(text) {
                    let range = offset..offset + g.len();
                    offset += g.len();
                    if is_whitespace_unit(g) {
                        pieces.push(Piece::Space {
                            node: id,
                            range,
                            advance: font_size * SPACE_EM,
                            breakable: !atomic,
                        });
                        prev = None;
                        continue;
                    }
                    let kern = match prev {
                        Some(p) if self.kerning => kern_pair(p, g) * font_size,
                        _ => 0.0,
                    };
                    pieces.push(Piece::Glyph {
                        node: id,
                        range,
                        advance: advance_em(g) * font_size + letter_spacing,
                        kern,
                        height,
                    });
                    if is_break_char(g) && !atomic {
                        pieces.push(Piece::Opportunity);
                    }
                    prev = Some(g);
                }
            }
            NodeData::Element { tag, .. } if tag == LINE_BREAK_TAG => {
                pieces.push(Piece::LineBreak);
            }
            NodeData::Element { .. } => {
                let display = self.display(id);
                if display == Display::None {
                    return;
                }
                let boxed = display != Display::Inline;
                if boxed && !atomic {
                    pieces.push(Piece::Opportunity);
                }
                if let Some(margin) = self.own_px(id, "margin-left") {
                    pieces.push(Piece::Margin(margin));
                }
                pieces.push(Piece::Open(id));
                for child in &node.children {
                    self.collect_inline(*child, atomic || boxed, pieces);
                }
                pieces.push(Piece::Close(id));
                if boxed && !atomic {
                    pieces.push(Piece::Opportunity);
                }
            }
        }
    }
}

fn kern_pair(left: &str, right: &str) -> f32 {
    KERNING_PAIRS
        .iter()
        .find(|(l, r, _)| *l == left && *r == right)
        .map_or(0.0, |(_, _, k)| *k)
}

fn parse_px(value: &str) -> Option<f32> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value).trim();
    number.parse().ok()
}

fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim();
            (!name.is_empty()).then(|| (name.to_ascii_lowercase(), value.trim().to_string()))
        })
        .collect()
}

fn write_style(decls: &[(String, String)]) -> String {
    decls
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// A node viewed as an html5ever serialization root.
struct Subtree<'a> {
    surface: &'a MemorySurface,
    id: NodeId,
}

impl Serialize for Subtree<'_> {
    fn serialize<S: Serializer>(
        &self,
        serializer: &mut S,
        traversal_scope: TraversalScope,
    ) -> io::Result<()> {
        let Some(node) = self.surface.node(self.id) else {
            return Ok(());
        };
        let include_node = matches!(traversal_scope, TraversalScope::IncludeNode);
        match &node.data {
            NodeData::Text(text) if include_node => serializer.write_text(text)?,
            NodeData::Text(_) => {}
            NodeData::Element { tag, attrs } => {
                let name = markup::element_name(tag);
                let attrs: Vec<(QualName, &str)> = attrs
                    .iter()
                    .map(|(n, v)| (markup::attribute_name(n), v.as_str()))
                    .collect();
                if include_node {
                    serializer.start_elem(name.clone(), attrs.iter().map(|(n, v)| (n, *v)))?;
                }
                for child in &node.children {
                    self.surface
                        .subtree(*child)
                        .serialize(serializer, TraversalScope::IncludeNode)?;
                }
                if include_node {
                    serializer.end_elem(name)?;
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Layout {
    glyphs: Vec<GlyphBox>,
    boxes: HashMap<NodeId, Rect>,
}

#[derive(Debug)]
struct GlyphBox {
    node: NodeId,
    range: Range<usize>,
    rect: Rect,
}

#[derive(Debug)]
enum Piece {
    Glyph {
        node: NodeId,
        range: Range<usize>,
        advance: f32,
        kern: f32,
        height: f32,
    },
    Space {
        node: NodeId,
        range: Range<usize>,
        advance: f32,
        breakable: bool,
    },
    Margin(f32),
    Open(NodeId),
    Close(NodeId),
    Opportunity,
    LineBreak,
}

impl Piece {
    fn width(&self) -> f32 {
        match self {
            Self::Glyph { advance, kern, .. } => advance + kern,
            Self::Space { advance, .. } => *advance,
            Self::Margin(m) => *m,
            Self::Open(_) | Self::Close(_) | Self::Opportunity | Self::LineBreak => 0.0,
        }
    }

    fn is_break(&self) -> bool {
        matches!(
            self,
            Self::Opportunity
                | Self::LineBreak
                | Self::Space {
                    breakable: true,
                    ..
                }
        )
    }
}

/// Greedy line filling for one block's inline content.
struct InlineFlow {
    x0: f32,
    width: f32,
    top: f32,
    default_height: f32,
    pieces: Vec<Piece>,
}

impl InlineFlow {
    const fn new(x0: f32, width: f32, top: f32, default_height: f32) -> Self {
        Self {
            x0,
            width,
            top,
            default_height,
            pieces: Vec::new(),
        }
    }

    /// Place the collected pieces; returns the bottom of the last line.
    fn finish(&mut self, out: &mut Layout) -> f32 {
        let pieces = std::mem::take(&mut self.pieces);
        if pieces.is_empty() {
            return self.top;
        }

        let mut x = 0.0_f32;
        let mut top = self.top;
        let mut line_height = self.default_height;
        let mut line_has_content = false;
        let mut open: Vec<(NodeId, Option<Rect>)> = Vec::new();

        let mut i = 0;
        while i < pieces.len() {
            if pieces[i].is_break() {
                match &pieces[i] {
                    Piece::Space {
                        node,
                        range,
                        advance,
                        ..
                    } => {
                        // Spaces collapse at the start of a line.
                        let advance = if line_has_content { *advance } else { 0.0 };
                        let rect = Rect::new(self.x0 + x, top, advance, line_height);
                        out.glyphs.push(GlyphBox {
                            node: *node,
                            range: range.clone(),
                            rect,
                        });
                        x += advance;
                    }
                    Piece::LineBreak => {
                        top += line_height;
                        line_height = self.default_height;
                        x = 0.0;
                        line_has_content = false;
                    }
                    _ => {}
                }
                i += 1;
                continue;
            }

            let end = pieces[i..]
                .iter()
                .position(Piece::is_break)
                .map_or(pieces.len(), |p| i + p);
            let chunk_width: f32 = pieces[i..end].iter().map(Piece::width).sum();
            if line_has_content && x + chunk_width > self.width + 0.01 {
                top += line_height;
                line_height = self.default_height;
                x = 0.0;
                line_has_content = false;
            }

            for piece in &pieces[i..end] {
                match piece {
                    Piece::Glyph {
                        node,
                        range,
                        advance,
                        kern,
                        height,
                    } => {
                        x += kern;
                        line_height = line_height.max(*height);
                        let rect = Rect::new(self.x0 + x, top, *advance, *height);
                        for (_, bounds) in &mut open {
                            *bounds = Some(bounds.map_or(rect, |b| b.union(&rect)));
                        }
                        out.glyphs.push(GlyphBox {
                            node: *node,
                            range: range.clone(),
                            rect,
                        });
                        x += advance;
                        line_has_content = true;
                    }
                    Piece::Space {
                        node,
                        range,
                        advance,
                        ..
                    } => {
                        let rect = Rect::new(self.x0 + x, top, *advance, line_height);
                        out.glyphs.push(GlyphBox {
                            node: *node,
                            range: range.clone(),
                            rect,
                        });
                        x += advance;
                    }
                    Piece::Margin(m) => x += m,
                    Piece::Open(node) => open.push((*node, None)),
                    Piece::Close(node) => {
                        if let Some(pos) = open.iter().rposition(|(id, _)| id == node) {
                            let (id, bounds) = open.remove(pos);
                            let rect = bounds
                                .unwrap_or_else(|| Rect::new(self.x0 + x, top, 0.0, line_height));
                            out.boxes.insert(id, rect);
                        }
                    }
                    Piece::Opportunity | Piece::LineBreak => {}
                }
            }
            i = end;
        }

        for (id, bounds) in open {
            let rect = bounds.unwrap_or_else(|| Rect::new(self.x0 + x, top, 0.0, line_height));
            out.boxes.insert(id, rect);
        }

        let bottom = top + line_height;
        self.top = bottom;
        bottom
    }
}

impl Surface for MemorySurface {
    type Node = NodeId;

    fn is_element(&self, node: &NodeId) -> bool {
        matches!(
            self.node(*node).map(|n| &n.data),
            Some(NodeData::Element { .. })
        )
    }

    fn is_connected(&self, node: &NodeId) -> bool {
        let mut current = Some(*node);
        while let Some(id) = current {
            if id == self.body {
                return true;
            }
            current = self.node(id).and_then(|n| n.parent);
        }
        false
    }

    fn parent_element(&self, node: &NodeId) -> Option<NodeId> {
        self.node(*node).and_then(|n| n.parent)
    }

    fn text_nodes(&self, root: &NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![*root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            match &node.data {
                NodeData::Text(_) => found.push(id),
                NodeData::Element { .. } => stack.extend(node.children.iter().rev()),
            }
        }
        found
    }

    fn inline_leaves(&self, root: &NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![*root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            match &node.data {
                NodeData::Text(_) => found.push(id),
                NodeData::Element { tag, .. } if tag == LINE_BREAK_TAG && id != *root => {
                    found.push(id);
                }
                NodeData::Element { .. } => stack.extend(node.children.iter().rev()),
            }
        }
        found
    }

    fn text(&self, text_node: &NodeId) -> String {
        match self.node(*text_node).map(|n| &n.data) {
            Some(NodeData::Text(text)) => text.clone(),
            _ => String::new(),
        }
    }

    fn range_rect(&self, text_node: &NodeId, range: Range<usize>) -> Rect {
        if !self.is_connected(text_node) {
            return Rect::default();
        }
        self.layout()
            .glyphs
            .iter()
            .filter(|g| g.node == *text_node && g.range.start < range.end && range.start < g.range.end)
            .map(|g| g.rect)
            .reduce(|a, b| a.union(&b))
            .unwrap_or_default()
    }

    fn element_rect(&self, node: &NodeId) -> Rect {
        if !self.is_connected(node) {
            return Rect::default();
        }
        self.layout().boxes.get(node).copied().unwrap_or_default()
    }

    fn computed_style(&self, node: &NodeId) -> TextStyle {
        let mut smoothing = None;
        let mut current = Some(*node);
        while let Some(id) = current {
            if let Some(value) = self.style(&id, "-webkit-font-smoothing") {
                smoothing = Some(value);
                break;
            }
            current = self.node(id).and_then(|n| n.parent);
        }
        TextStyle {
            font_size: self.font_size_of(*node),
            letter_spacing: self.inherited_px(*node, "letter-spacing", 0.0),
            word_spacing: self.inherited_px(*node, "word-spacing", 0.0),
            font_smoothing: smoothing,
        }
    }

    fn fonts_ready(&self) -> bool {
        self.fonts_ready
    }

    fn inner_markup(&self, node: &NodeId) -> String {
        markup::serialize(&self.subtree(*node), TraversalScope::ChildrenOnly(None))
    }

    fn set_inner_markup(&mut self, node: &NodeId, markup: &str) {
        self.clear_children(node);
        self.append_markup(*node, markup);
    }

    fn clear_children(&mut self, node: &NodeId) {
        self.layout.take();
        let Some(n) = self.node_mut(*node) else {
            return;
        };
        let children = std::mem::take(&mut n.children);
        for child in children {
            self.release(child);
        }
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        self.push_node(NodeData::Element {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        })
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        self.push_node(NodeData::Text(text.to_string()))
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) {
        if !self.is_element(parent) || self.node(*child).is_none() || parent == child {
            return;
        }
        self.detach(*child);
        self.layout.take();
        if let Some(p) = self.node_mut(*parent) {
            p.children.push(*child);
        }
        if let Some(c) = self.node_mut(*child) {
            c.parent = Some(*parent);
        }
    }

    fn tag_name(&self, node: &NodeId) -> Option<String> {
        self.tag(*node).map(str::to_string)
    }

    fn attributes(&self, node: &NodeId) -> Vec<(String, String)> {
        match self.node(*node).map(|n| &n.data) {
            Some(NodeData::Element { attrs, .. }) => attrs.clone(),
            _ => Vec::new(),
        }
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        match &self.node(*node)?.data {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone()),
            NodeData::Text(_) => None,
        }
    }

    fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) {
        self.layout.take();
        let Some(attrs) = self.attrs_mut(*node) else {
            return;
        };
        match attrs.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => attrs.push((name.to_string(), value.to_string())),
        }
    }

    fn remove_attribute(&mut self, node: &NodeId, name: &str) {
        self.layout.take();
        if let Some(attrs) = self.attrs_mut(*node) {
            attrs.retain(|(n, _)| n != name);
        }
    }

    fn style(&self, node: &NodeId, property: &str) -> Option<String> {
        let style = self.attribute(node, "style")?;
        parse_style(&style)
            .into_iter()
            .find(|(name, _)| name == property)
            .map(|(_, value)| value)
    }

    fn set_style(&mut self, node: &NodeId, property: &str, value: &str) {
        if !self.is_element(node) {
            return;
        }
        let mut decls = self
            .attribute(node, "style")
            .map(|s| parse_style(&s))
            .unwrap_or_default();
        if value.is_empty() {
            decls.retain(|(name, _)| name != property);
        } else {
            match decls.iter_mut().find(|(name, _)| name == property) {
                Some((_, v)) => *v = value.to_string(),
                None => decls.push((property.to_string(), value.to_string())),
            }
        }
        if decls.is_empty() {
            self.remove_attribute(node, "style");
        } else {
            let style = write_style(&decls);
            self.set_attribute(node, "style", &style);
        }
    }
}
