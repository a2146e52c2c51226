//! HTML parsing and serialization for [`MemorySurface`], backed by `html5ever`.
//!
//! Markup is parsed as the body of a standards-mode document through a small
//! [`TreeSink`] that records elements and text, then handed to the surface as
//! a [`Fragment`] tree. Comments, doctypes and processing instructions are
//! dropped.
//!
//! [`MemorySurface`]: super::MemorySurface

use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::Rc;

use html5ever::serialize::{Serialize, SerializeOpts, TraversalScope};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute, ExpandedName, LocalName, Namespace, ParseOpts, QualName};
use tracing::trace;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Parsed markup tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Fragment {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        children: Vec<Fragment>,
    },
    Text(String),
}

/// Qualified name of an HTML element.
pub(crate) fn element_name(tag: &str) -> QualName {
    QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from(tag))
}

/// Qualified name of an attribute in no namespace.
pub(crate) fn attribute_name(name: &str) -> QualName {
    QualName::new(None, Namespace::from(""), LocalName::from(name))
}

/// Parse body content into top-level fragments.
pub(crate) fn parse(markup: &str) -> Vec<Fragment> {
    let document = format!("<!DOCTYPE html><body>{markup}");
    html5ever::parse_document(FragmentSink::new(), ParseOpts::default()).one(document)
}

/// Serialize `node` as HTML.
pub(crate) fn serialize<T: Serialize>(node: &T, traversal_scope: TraversalScope) -> String {
    let mut out = Vec::new();
    let opts = SerializeOpts {
        traversal_scope,
        ..SerializeOpts::default()
    };
    if let Err(err) = html5ever::serialize::serialize(&mut out, node, opts) {
        trace!(%err, "markup serialization stopped early");
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// A sink node handle. Carries the element name so the tree builder can
/// borrow it without touching the arena.
#[derive(Debug)]
pub(crate) struct SinkHandle {
    id: usize,
    name: QualName,
}

#[derive(Debug)]
enum SinkData {
    Document,
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
    Ignored,
}

#[derive(Debug)]
struct SinkNode {
    parent: Option<usize>,
    children: Vec<usize>,
    data: SinkData,
}

/// Tree builder target collecting nodes into an index arena.
struct FragmentSink {
    nodes: RefCell<Vec<SinkNode>>,
}

impl FragmentSink {
    fn new() -> Self {
        Self {
            nodes: RefCell::new(vec![SinkNode {
                parent: None,
                children: Vec::new(),
                data: SinkData::Document,
            }]),
        }
    }

    fn push(&self, data: SinkData) -> usize {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(SinkNode {
            parent: None,
            children: Vec::new(),
            data,
        });
        nodes.len() - 1
    }

    fn handle(id: usize, name: QualName) -> Rc<SinkHandle> {
        Rc::new(SinkHandle { id, name })
    }

    fn detach(nodes: &mut [SinkNode], id: usize) {
        if let Some(parent) = nodes[id].parent.take() {
            nodes[parent].children.retain(|c| *c != id);
        }
    }

    fn insert(&self, parent: usize, index: Option<usize>, child: usize) {
        let mut nodes = self.nodes.borrow_mut();
        Self::detach(&mut nodes, child);
        nodes[child].parent = Some(parent);
        let children = &mut nodes[parent].children;
        match index {
            Some(index) => children.insert(index, child),
            None => children.push(child),
        }
    }

    /// Add text at `index` among `parent`'s children, merging into a text
    /// node directly before that position.
    fn insert_text(&self, parent: usize, index: Option<usize>, text: &str) {
        {
            let mut nodes = self.nodes.borrow_mut();
            let at = index.unwrap_or(nodes[parent].children.len());
            let previous = at.checked_sub(1).map(|i| nodes[parent].children[i]);
            if let Some(previous) = previous {
                if let SinkData::Text(existing) = &mut nodes[previous].data {
                    existing.push_str(text);
                    return;
                }
            }
        }
        let id = self.push(SinkData::Text(text.to_string()));
        self.insert(parent, index, id);
    }

    fn child_element(nodes: &[SinkNode], parent: usize, tag: &str) -> Option<usize> {
        nodes[parent].children.iter().copied().find(|c| {
            matches!(&nodes[*c].data, SinkData::Element { tag: t, .. } if t == tag)
        })
    }

    fn fragment(nodes: &[SinkNode], id: usize) -> Option<Fragment> {
        match &nodes[id].data {
            SinkData::Element { tag, attrs } => Some(Fragment::Element {
                tag: tag.clone(),
                attrs: attrs.clone(),
                children: nodes[id]
                    .children
                    .iter()
                    .filter_map(|c| Self::fragment(nodes, *c))
                    .collect(),
            }),
            SinkData::Text(text) => Some(Fragment::Text(text.clone())),
            SinkData::Document | SinkData::Ignored => None,
        }
    }
}

fn convert_attrs(attrs: Vec<Attribute>) -> Vec<(String, String)> {
    attrs
        .into_iter()
        .map(|a| (a.name.local.to_string(), a.value.to_string()))
        .collect()
}

impl TreeSink for FragmentSink {
    type Handle = Rc<SinkHandle>;
    type Output = Vec<Fragment>;
    type ElemName<'a>
        = ExpandedName<'a>
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        let nodes = self.nodes.into_inner();
        let body = Self::child_element(&nodes, 0, "html")
            .and_then(|html| Self::child_element(&nodes, html, "body"));
        body.map(|body| {
            nodes[body]
                .children
                .iter()
                .filter_map(|c| Self::fragment(&nodes, *c))
                .collect()
        })
        .unwrap_or_default()
    }

    fn parse_error(&self, msg: Cow<'static, str>) {
        trace!(%msg, "markup parse error");
    }

    fn get_document(&self) -> Self::Handle {
        Self::handle(0, attribute_name(""))
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        target.name.expanded()
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let id = self.push(SinkData::Element {
            tag: name.local.to_string(),
            attrs: convert_attrs(attrs),
        });
        Self::handle(id, name)
    }

    fn create_comment(&self, _text: StrTendril) -> Self::Handle {
        Self::handle(self.push(SinkData::Ignored), attribute_name(""))
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Self::Handle {
        Self::handle(self.push(SinkData::Ignored), attribute_name(""))
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        match child {
            NodeOrText::AppendNode(node) => self.insert(parent.id, None, node.id),
            NodeOrText::AppendText(text) => self.insert_text(parent.id, None, &text),
        }
    }

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        let position = {
            let nodes = self.nodes.borrow();
            nodes[sibling.id].parent.and_then(|parent| {
                nodes[parent]
                    .children
                    .iter()
                    .position(|c| *c == sibling.id)
                    .map(|index| (parent, index))
            })
        };
        let Some((parent, index)) = position else {
            return;
        };
        match new_node {
            NodeOrText::AppendNode(node) => self.insert(parent, Some(index), node.id),
            NodeOrText::AppendText(text) => self.insert_text(parent, Some(index), &text),
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        let has_parent = self.nodes.borrow()[element.id].parent.is_some();
        if has_parent {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        _name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        Rc::clone(target)
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        x.id == y.id
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Attribute>) {
        let mut nodes = self.nodes.borrow_mut();
        if let SinkData::Element { attrs: existing, .. } = &mut nodes[target.id].data {
            for (name, value) in convert_attrs(attrs) {
                if !existing.iter().any(|(n, _)| *n == name) {
                    existing.push((name, value));
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        Self::detach(&mut self.nodes.borrow_mut(), target.id);
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let mut nodes = self.nodes.borrow_mut();
        let children = std::mem::take(&mut nodes[node.id].children);
        for child in &children {
            nodes[*child].parent = Some(new_parent.id);
        }
        nodes[new_parent.id].children.extend(children);
    }
}
