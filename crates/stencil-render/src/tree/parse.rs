//! Markup parsing collaborators.

use scraper::{ElementRef, Html};

use super::{Node, Tag, TagAttributes, TextTag};

/// Turns markup text into a flat forest of render-tree nodes.
///
/// Parsers are collaborators of the renderer: any HTML parser can be plugged
/// in, as long as element names are reported in lowercase and attribute
/// order is stable. Comments are not part of the render tree and should be
/// dropped.
pub trait MarkupParser: Send + Sync {
    /// Parses a markup fragment.
    fn parse(&self, markup: &str) -> Vec<Node>;
}

/// HTML5 fragment parser backed by `scraper`/html5ever.
#[derive(Debug, Clone, Copy, Default)]
pub struct Html5Parser;

impl Html5Parser {
    /// Creates the parser.
    pub fn new() -> Self {
        Self
    }
}

impl MarkupParser for Html5Parser {
    fn parse(&self, markup: &str) -> Vec<Node> {
        if markup.is_empty() {
            return Vec::new();
        }
        let fragment = Html::parse_fragment(markup);
        // html5ever wraps fragments in a synthetic <html> root.
        convert_children(fragment.root_element())
    }
}

fn convert_children(element: ElementRef<'_>) -> Vec<Node> {
    let mut nodes = Vec::new();
    for child in element.children() {
        match child.value() {
            scraper::Node::Text(text) => nodes.push(Node::Text(TextTag::new(&**text))),
            scraper::Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    nodes.push(Node::Element(convert_element(child)));
                }
            }
            _ => {}
        }
    }
    nodes
}

fn convert_element(element: ElementRef<'_>) -> Tag {
    let value = element.value();
    let attributes: TagAttributes = value
        .attrs()
        .map(|(name, val)| (name.to_string(), val.to_string()))
        .collect();

    Tag::new(value.name())
        .with_attributes(attributes)
        .with_children(convert_children(element))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::to_html;

    #[test]
    fn test_parse_forest() {
        let nodes = Html5Parser.parse(r#"<span slot="a">X</span><b>Y</b>"#);
        assert_eq!(nodes.len(), 2);
        let span = nodes[0].as_element().unwrap();
        assert_eq!(span.name(), "span");
        assert_eq!(span.attribute("slot"), Some("a"));
        assert_eq!(span.children()[0].as_text(), Some("X"));
    }

    #[test]
    fn test_parse_round_trip() {
        let markup = r#"<div class="a" id="b"><slot name="x"></slot><br><my-el n="1">t</my-el></div>"#;
        assert_eq!(to_html(&Html5Parser.parse(markup)), markup);
    }

    #[test]
    fn test_parse_text_only() {
        let nodes = Html5Parser.parse("hello");
        assert_eq!(nodes, vec![Node::Text(TextTag::new("hello"))]);
    }

    #[test]
    fn test_parse_drops_comments() {
        let nodes = Html5Parser.parse("<p><!-- note -->x</p>");
        assert_eq!(to_html(&nodes), "<p>x</p>");
    }

    #[test]
    fn test_parse_void_classification() {
        let nodes = Html5Parser.parse(r#"<input value="1">"#);
        assert!(nodes[0].as_element().unwrap().is_self_closing());
    }

    #[test]
    fn test_parse_empty() {
        assert!(Html5Parser.parse("").is_empty());
    }
}
