//! Stylesheet classification and markup scoping.

use std::convert::Infallible;

use super::parse_stylesheet;
use crate::change::{Change, ChangeMask};
use crate::component::{ComponentDefinition, ComponentInstance};
use crate::error::RenderError;
use crate::session::DocumentSession;
use crate::tree::{walk_all, CssTag, Node, Visit};

/// How a stylesheet is shared between instances of a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CssScope {
    /// One sheet per definition, emitted once per session.
    Global,
    /// One sheet per instance.
    Unique,
}

impl CssScope {
    /// Classifies a stylesheet by the mask of the template producing it.
    pub fn for_mask(mask: ChangeMask) -> Self {
        if mask.is_global_style() {
            CssScope::Global
        } else {
            CssScope::Unique
        }
    }
}

/// Scoping identifier shared by every instance: `<prefix>-<tag>`.
pub fn global_id(prefix: &str, tag: &str) -> String {
    format!("{}-{}", prefix, tag)
}

/// Scoping identifier of one instance: `<prefix>-<tag>-<n>`.
pub fn unique_id(prefix: &str, tag: &str, index: u32) -> String {
    format!("{}-{}-{}", prefix, tag, index)
}

/// Outcome of scoping one instance's stylesheets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleScoping {
    /// Identifier of the instance's unique sheets, if it has any.
    pub unique_id: Option<String>,
    /// Identifier of the definition's global sheets, if it has any.
    pub global_id: Option<String>,
    /// `<style>` elements to emit for this instance, in declaration order.
    pub styles: Vec<CssTag>,
}

impl StyleScoping {
    /// Classes to add to the instance's markup: unique id, then global id.
    pub fn classes(&self) -> Vec<String> {
        self.unique_id
            .iter()
            .chain(self.global_id.iter())
            .cloned()
            .collect()
    }
}

/// Renders, classifies and rewrites the stylesheets of one instance.
///
/// Every CSS template is rendered with [`Change::FORCE`]. Global sheets are
/// rendered and returned only on the definition's first expansion in the
/// session; unique sheets are returned for every instance and share one
/// index, drawn from the session only if the instance has a unique sheet.
pub fn scope_styles(
    definition: &ComponentDefinition,
    instance: &ComponentInstance,
    session: &mut DocumentSession,
    class_prefix: &str,
) -> Result<StyleScoping, RenderError> {
    let tag = instance.tag_name();
    let emit_global = !session.is_global_emitted(definition.id());
    let mut scoping = StyleScoping::default();

    for template in definition.css() {
        let scope = CssScope::for_mask(template.mask());
        let id = match scope {
            CssScope::Global => scoping
                .global_id
                .get_or_insert_with(|| global_id(class_prefix, tag))
                .clone(),
            CssScope::Unique => match &scoping.unique_id {
                Some(id) => id.clone(),
                None => {
                    let id = unique_id(class_prefix, tag, session.next_unique_index(definition.id()));
                    scoping.unique_id = Some(id.clone());
                    id
                }
            },
        };
        if scope == CssScope::Global && !emit_global {
            continue;
        }

        let Some(text) = session.render_text(template, Change::FORCE, instance)?.value else {
            continue;
        };
        let stylesheet = parse_stylesheet(&text.text)?;
        tracing::debug!(tag, id = %id, scope = ?scope, rules = stylesheet.rules().len(), "stylesheet scoped");
        scoping
            .styles
            .push(CssTag::new(stylesheet.prefixed(&id), scope));
    }

    if emit_global && scoping.global_id.is_some() {
        session.mark_global_emitted(definition.id());
    }
    Ok(scoping)
}

/// Appends `classes` to every element of `nodes`.
///
/// Elements for which `is_custom` returns true receive the classes but are
/// not descended into: their content is scoped by their own expansion.
/// Already expanded elements are left untouched.
pub fn scope_markup<F>(nodes: &[Node], classes: &[String], is_custom: F) -> Vec<Node>
where
    F: Fn(&str) -> bool,
{
    if classes.is_empty() {
        return nodes.to_vec();
    }
    let mut handler = |node: &Node| -> Result<Visit, Infallible> {
        Ok(match node {
            Node::Element(tag) if tag.is_expanded() => Visit::Stop(node.clone()),
            Node::Element(tag) if is_custom(tag.name()) => {
                Visit::Stop(Node::Element(tag.with_classes(classes)))
            }
            Node::Element(tag) => Visit::Continue(Node::Element(tag.with_classes(classes))),
            other => Visit::Stop(other.clone()),
        })
    };
    match walk_all(nodes, &mut handler) {
        Ok(nodes) => nodes,
        Err(never) => match never {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::AttributeBag;
    use crate::template::TemplateDefinition;
    use crate::tree::{to_html, Html5Parser, MarkupParser, Tag};

    fn css(source: &'static str, mask: Change) -> TemplateDefinition {
        TemplateDefinition::new(mask, move |html, _, _, _| Ok(html.text(source)))
    }

    #[test]
    fn test_classification() {
        assert_eq!(CssScope::for_mask(Change::THEME), CssScope::Global);
        assert_eq!(CssScope::for_mask(Change::NEVER), CssScope::Global);
        assert_eq!(CssScope::for_mask(Change::PROP), CssScope::Unique);
        assert_eq!(CssScope::for_mask(Change::THEME | Change::LANG), CssScope::Unique);
        assert_eq!(CssScope::for_mask(Change::FORCE), CssScope::Unique);
        assert_eq!(CssScope::for_mask(Change::PROP | Change::NEVER), CssScope::Unique);
    }

    #[test]
    fn test_ids() {
        assert_eq!(global_id("css", "my-el"), "css-my-el");
        assert_eq!(unique_id("css", "my-el", 0), "css-my-el-0");
    }

    #[test]
    fn test_scope_styles_across_instances() {
        let definition = ComponentDefinition::builder()
            .tag_name("my-el")
            .css(css(".g { color: red; }", Change::THEME))
            .css(css(".u { width: 1px; }", Change::PROP))
            .css(css(".v { height: 1px; }", Change::PROP))
            .build();
        let mut session = DocumentSession::new();

        let first = ComponentInstance::new(&definition, "my-el", AttributeBag::new(), None, "en");
        let scoped = scope_styles(&definition, &first, &mut session, "css").unwrap();
        assert_eq!(scoped.classes(), vec!["css-my-el-0", "css-my-el"]);
        let texts: Vec<_> = scoped
            .styles
            .iter()
            .map(|s| Node::Style(s.clone()).to_html())
            .collect();
        assert_eq!(
            texts,
            vec![
                "<style>.css-my-el-.g { color: red; }</style>",
                "<style>.css-my-el-0-.u { width: 1px; }</style>",
                "<style>.css-my-el-0-.v { height: 1px; }</style>",
            ]
        );

        let second = ComponentInstance::new(&definition, "my-el", AttributeBag::new(), None, "en");
        let scoped = scope_styles(&definition, &second, &mut session, "css").unwrap();
        assert_eq!(scoped.classes(), vec!["css-my-el-1", "css-my-el"]);
        assert_eq!(scoped.styles.len(), 2);
        assert!(scoped.styles.iter().all(|s| s.scope() == CssScope::Unique));
    }

    #[test]
    fn test_force_masked_sheet_is_per_instance() {
        let definition = ComponentDefinition::builder()
            .tag_name("x-f")
            .css(css("p { margin: 0; }", Change::FORCE))
            .build();
        let mut session = DocumentSession::new();
        for n in 0..2 {
            let instance = ComponentInstance::new(&definition, "x-f", AttributeBag::new(), None, "en");
            let scoped = scope_styles(&definition, &instance, &mut session, "css").unwrap();
            assert_eq!(scoped.classes(), vec![format!("css-x-f-{}", n)]);
            assert_eq!(scoped.styles.len(), 1);
        }
        assert!(!session.is_global_emitted(definition.id()));
    }

    #[test]
    fn test_global_only_definition_draws_no_index() {
        let definition = ComponentDefinition::builder()
            .tag_name("x-g")
            .css(css("p { margin: 0; }", Change::NEVER))
            .build();
        let mut session = DocumentSession::new();
        let instance = ComponentInstance::new(&definition, "x-g", AttributeBag::new(), None, "en");
        let scoped = scope_styles(&definition, &instance, &mut session, "css").unwrap();
        assert_eq!(scoped.unique_id, None);
        assert_eq!(session.next_unique_index(definition.id()), 0);
    }

    #[test]
    fn test_parse_failure_carries_source() {
        let definition = ComponentDefinition::builder()
            .tag_name("x-bad")
            .css(css("{ color: red; }", Change::PROP))
            .build();
        let mut session = DocumentSession::new();
        let instance = ComponentInstance::new(&definition, "x-bad", AttributeBag::new(), None, "en");
        let err = scope_styles(&definition, &instance, &mut session, "css").unwrap_err();
        assert_eq!(err.css_source(), Some("{ color: red; }"));
    }

    #[test]
    fn test_scope_markup_stops_at_custom_elements() {
        let nodes = Html5Parser.parse(
            r#"<div class="box"><p>a</p><x-inner><span>b</span></x-inner></div>"#,
        );
        let scoped = scope_markup(&nodes, &["css-a-0".into(), "css-a".into()], |name| name == "x-inner");
        assert_eq!(
            to_html(&scoped),
            r#"<div class="box css-a-0 css-a"><p class="css-a-0 css-a">a</p><x-inner class="css-a-0 css-a"><span>b</span></x-inner></div>"#
        );
    }

    #[test]
    fn test_scope_markup_skips_expanded() {
        let expanded = Tag::new("x-done").mark_expanded();
        let nodes = vec![Node::Element(expanded.clone())];
        let scoped = scope_markup(&nodes, &["c".into()], |_| false);
        assert_eq!(scoped, vec![Node::Element(expanded)]);
    }
}
