//! Render tree model.
//!
//! The render tree is the intermediate representation between rendered markup
//! text and the final serialized output. Markup is parsed by a pluggable
//! [`MarkupParser`] into a flat forest of [`Node`]s, transformed by
//! [`walk`], and written back out with [`Node::to_html`].
//!
//! Nodes are immutable by convention: every mutator returns a modified copy.
//! Children are reference-counted, so [`Tag::copy`] is shallow and untouched
//! subtrees are shared between the original and the copy.
//!
//! ```rust
//! use stencil_render::tree::{Node, Tag, TextTag};
//!
//! let tag = Tag::new("p")
//!     .with_attribute("title", "say \"hi\"")
//!     .with_children(vec![Node::Text(TextTag::new("a < b"))]);
//!
//! assert_eq!(
//!     Node::Element(tag).to_html(),
//!     r#"<p title="say &quot;hi&quot;">a &lt; b</p>"#
//! );
//! ```

mod parse;

use std::sync::Arc;

use indexmap::IndexMap;

use crate::css::{CssScope, Stylesheet};

pub use parse::{Html5Parser, MarkupParser};

/// Ordered attribute map of a rendered element.
pub type TagAttributes = IndexMap<String, String>;

/// Element names that never have children or a closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "command", "embed", "frame", "hr",
    "image", "img", "input", "isindex", "keygen", "link", "menuitem", "meta", "nextid",
    "param", "source", "track", "wbr",
];

/// Elements whose text content is written without escaping.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Returns true if `name` is a void element.
pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name.to_ascii_lowercase().as_str())
}

/// A node of the render tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A markup element.
    Element(Tag),
    /// Literal text.
    Text(TextTag),
    /// A `<style>` element carrying parsed stylesheets.
    Style(CssTag),
    /// Stylesheet text with its parsed form.
    StyleText(CssText),
}

impl Node {
    /// Returns the element, if this node is one.
    pub fn as_element(&self) -> Option<&Tag> {
        match self {
            Node::Element(tag) => Some(tag),
            _ => None,
        }
    }

    /// Returns the literal text, if this node is a text node.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Text(text) => Some(text.text()),
            _ => None,
        }
    }

    /// Serializes this node and its descendants.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_node(&mut out, self, false);
        out
    }
}

impl From<Tag> for Node {
    fn from(tag: Tag) -> Self {
        Node::Element(tag)
    }
}

impl From<TextTag> for Node {
    fn from(text: TextTag) -> Self {
        Node::Text(text)
    }
}

impl From<CssTag> for Node {
    fn from(tag: CssTag) -> Self {
        Node::Style(tag)
    }
}

/// Serializes a forest of nodes.
pub fn to_html(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(&mut out, node, false);
    }
    out
}

/// A markup element.
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    name: String,
    attributes: TagAttributes,
    self_closing: bool,
    children: Arc<[Node]>,
    expanded: bool,
}

impl Tag {
    /// Creates an empty element. Void element names are self-closing.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let self_closing = is_void_element(&name);
        Self {
            name,
            attributes: TagAttributes::new(),
            self_closing,
            children: Arc::from(Vec::new()),
            expanded: false,
        }
    }

    /// Returns the element name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the attributes in insertion order.
    pub fn attributes(&self) -> &TagAttributes {
        &self.attributes
    }

    /// Looks up one attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|v| v.as_str())
    }

    /// Returns true for void elements.
    pub fn is_self_closing(&self) -> bool {
        self.self_closing
    }

    /// Returns the children.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Returns true once a custom element has been fully expanded.
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Shallow copy: the copy shares its children with `self`.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Returns true if both tags share the same child storage.
    pub fn shares_children_with(&self, other: &Tag) -> bool {
        Arc::ptr_eq(&self.children, &other.children)
    }

    /// Returns a copy with one attribute set (replacing in place if present).
    pub fn with_attribute(&self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut tag = self.copy();
        tag.attributes.insert(name.into(), value.into());
        tag
    }

    /// Returns a copy with the attribute map replaced.
    pub fn with_attributes(&self, attributes: TagAttributes) -> Self {
        let mut tag = self.copy();
        tag.attributes = attributes;
        tag
    }

    /// Returns a copy with the children replaced.
    pub fn with_children(&self, children: impl Into<Arc<[Node]>>) -> Self {
        let mut tag = self.copy();
        tag.children = children.into();
        tag
    }

    /// Returns a copy with `classes` appended to the `class` attribute.
    pub fn with_classes(&self, classes: &[String]) -> Self {
        if classes.is_empty() {
            return self.copy();
        }
        let appended = classes.join(" ");
        let value = match self.attribute("class") {
            Some(existing) if !existing.trim().is_empty() => {
                format!("{} {}", existing.trim(), appended)
            }
            _ => appended,
        };
        self.with_attribute("class", value)
    }

    /// Returns a copy marked as a resolved leaf.
    pub fn mark_expanded(&self) -> Self {
        let mut tag = self.copy();
        tag.expanded = true;
        tag
    }

    /// Returns a copy with `self_closing` overridden.
    pub fn with_self_closing(&self, self_closing: bool) -> Self {
        let mut tag = self.copy();
        tag.self_closing = self_closing;
        tag
    }
}

/// Literal text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextTag {
    text: String,
}

impl TextTag {
    /// Creates a text node.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Returns the text.
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// A `<style>` element holding one or more scoped stylesheets.
#[derive(Debug, Clone, PartialEq)]
pub struct CssTag {
    attributes: TagAttributes,
    children: Arc<[Node]>,
    scope: CssScope,
}

impl CssTag {
    /// Creates a `<style>` element around one stylesheet.
    pub fn new(stylesheet: Stylesheet, scope: CssScope) -> Self {
        let text = Node::StyleText(CssText::new(stylesheet, scope));
        Self {
            attributes: TagAttributes::new(),
            children: Arc::from(vec![text]),
            scope,
        }
    }

    /// Returns the scope mode.
    pub fn scope(&self) -> CssScope {
        self.scope
    }

    /// Returns the attributes.
    pub fn attributes(&self) -> &TagAttributes {
        &self.attributes
    }

    /// Returns the children (stylesheet text nodes).
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Returns a copy with one attribute set.
    pub fn with_attribute(&self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut tag = self.clone();
        tag.attributes.insert(name.into(), value.into());
        tag
    }

    /// Iterates over the stylesheets held by this element.
    pub fn stylesheets(&self) -> impl Iterator<Item = &Stylesheet> {
        self.children.iter().filter_map(|child| match child {
            Node::StyleText(text) => Some(text.stylesheet()),
            _ => None,
        })
    }
}

/// Stylesheet text together with its parsed form.
#[derive(Debug, Clone, PartialEq)]
pub struct CssText {
    stylesheet: Stylesheet,
    scope: CssScope,
}

impl CssText {
    /// Wraps a parsed stylesheet.
    pub fn new(stylesheet: Stylesheet, scope: CssScope) -> Self {
        Self { stylesheet, scope }
    }

    /// Returns the parsed stylesheet.
    pub fn stylesheet(&self) -> &Stylesheet {
        &self.stylesheet
    }

    /// Returns the scope mode.
    pub fn scope(&self) -> CssScope {
        self.scope
    }

    /// Returns the serialized stylesheet.
    pub fn text(&self) -> String {
        self.stylesheet.to_css()
    }
}

/// What [`walk`] does after visiting a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Visit {
    /// Descend into the given node's children and rebuild it from the results.
    Continue(Node),
    /// Use the given node as-is; its children are not visited.
    Stop(Node),
}

/// Depth-first, pre-order rebuild of a tree.
///
/// The handler sees every node before its children. Returning
/// [`Visit::Continue`] descends into the returned node and rebuilds it
/// bottom-up from the walked children; [`Visit::Stop`] replaces the node and
/// skips its subtree. Text and style nodes are always leaves.
pub fn walk<E, F>(node: &Node, handler: &mut F) -> Result<Node, E>
where
    F: FnMut(&Node) -> Result<Visit, E>,
{
    match handler(node)? {
        Visit::Stop(replacement) => Ok(replacement),
        Visit::Continue(Node::Element(tag)) => {
            if tag.children().is_empty() {
                return Ok(Node::Element(tag));
            }
            let children = walk_all(tag.children(), handler)?;
            Ok(Node::Element(tag.with_children(children)))
        }
        Visit::Continue(leaf) => Ok(leaf),
    }
}

/// Walks every node of a forest with the same handler.
pub fn walk_all<E, F>(nodes: &[Node], handler: &mut F) -> Result<Vec<Node>, E>
where
    F: FnMut(&Node) -> Result<Visit, E>,
{
    nodes.iter().map(|node| walk(node, handler)).collect()
}

fn write_node(out: &mut String, node: &Node, raw_text: bool) {
    match node {
        Node::Element(tag) => {
            write_open(out, tag.name(), tag.attributes());
            if tag.is_self_closing() {
                return;
            }
            let raw = RAW_TEXT_ELEMENTS.contains(&tag.name());
            for child in tag.children() {
                write_node(out, child, raw);
            }
            out.push_str("</");
            out.push_str(tag.name());
            out.push('>');
        }
        Node::Text(text) => {
            if raw_text {
                out.push_str(text.text());
            } else {
                out.push_str(&escape_text(text.text()));
            }
        }
        Node::Style(style) => {
            write_open(out, "style", style.attributes());
            for child in style.children() {
                write_node(out, child, true);
            }
            out.push_str("</style>");
        }
        Node::StyleText(text) => out.push_str(&text.text()),
    }
}

fn write_open(out: &mut String, name: &str, attributes: &TagAttributes) {
    out.push('<');
    out.push_str(name);
    if !attributes.is_empty() {
        out.push(' ');
        out.push_str(&serialize_attributes(attributes));
    }
    out.push('>');
}

/// Serializes attributes as space-joined `key="value"` pairs.
pub fn serialize_attributes(attributes: &TagAttributes) -> String {
    attributes
        .iter()
        .map(|(key, value)| format!("{}=\"{}\"", key, escape_attribute(value)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Escapes `"` for use inside a double-quoted attribute value.
pub fn escape_attribute(value: &str) -> String {
    value.replace('"', "&quot;")
}

/// Escapes `&`, `<` and `>` in text content.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}
