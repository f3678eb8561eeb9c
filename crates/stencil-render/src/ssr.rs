//! Server-side rendering.
//!
//! [`SsrRenderer`] expands a component definition into a fully resolved
//! render tree: markup rendered through the session's cache, stylesheets
//! scoped, caller content distributed into slots and nested custom elements
//! expanded recursively. The result is serialized to one HTML string.
//!
//! # Expansion Order
//!
//! For every component instance:
//!
//! 1. Render the HTML template and parse it.
//! 2. Render, classify and rewrite the CSS templates.
//! 3. Add the scoping classes to the instance's own markup.
//! 4. Distribute the (already expanded) caller content into the slots.
//! 5. Expand nested custom elements, their children first.
//! 6. Merge host attributes: explicit, then reflected, then self-set.
//! 7. Emit `[<style>..., content...]` as the host's children.
//!
//! # Example
//!
//! ```rust
//! use stencil_render::component::{AttributeBag, ComponentDefinition};
//! use stencil_render::template::TemplateDefinition;
//! use stencil_render::{Change, DocumentSession, SsrRenderer};
//!
//! let card = ComponentDefinition::builder()
//!     .tag_name("x-card")
//!     .html(TemplateDefinition::jinja("<div><slot></slot></div>", Change::PROP))
//!     .css(TemplateDefinition::jinja("div { padding: 1em; }", Change::NEVER))
//!     .build();
//!
//! let renderer = SsrRenderer::new();
//! let mut session = DocumentSession::new();
//! let html = renderer.render(&card, &AttributeBag::new(), None, &mut session).unwrap();
//! assert_eq!(
//!     html,
//!     r#"<x-card><style>.css-x-card-div { padding: 1em; }</style><div class="css-x-card"><slot class="css-x-card"></slot></div></x-card>"#
//! );
//! ```

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::change::Change;
use crate::component::{AttributeBag, ComponentDefinition, ComponentInstance};
use crate::config::SsrOptions;
use crate::css::{scope_markup, scope_styles};
use crate::error::RenderError;
use crate::session::DocumentSession;
use crate::slot::resolve_slots;
use crate::template::Attach;
use crate::theme::Theme;
use crate::tree::{walk_all, Html5Parser, MarkupParser, Node, Tag, Visit};

/// Expands component definitions into HTML.
pub struct SsrRenderer {
    options: SsrOptions,
    parser: Box<dyn MarkupParser>,
}

impl Default for SsrRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SsrRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SsrRenderer")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl SsrRenderer {
    /// Creates a renderer with default options and the HTML5 parser.
    pub fn new() -> Self {
        Self::with_options(SsrOptions::default())
    }

    /// Creates a renderer with custom options.
    pub fn with_options(options: SsrOptions) -> Self {
        Self {
            options,
            parser: Box::new(Html5Parser::new()),
        }
    }

    /// Replaces the markup parser.
    pub fn with_parser(mut self, parser: impl MarkupParser + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }

    /// Returns the options.
    pub fn options(&self) -> &SsrOptions {
        &self.options
    }

    /// Expands `definition` into its host element.
    ///
    /// The definition's dependency graph is added to the session's tag map
    /// first. Any failure aborts the whole expansion, and global sheets
    /// recorded during it are forgotten so a later call emits them.
    pub fn element_to_tag(
        &self,
        definition: &Arc<ComponentDefinition>,
        attributes: &AttributeBag,
        theme: Option<&Theme>,
        session: &mut DocumentSession,
    ) -> Result<Tag, RenderError> {
        session.register(definition);
        let tag_name = definition.resolved_tag_name(&self.options.anonymous_tag_prefix);
        let checkpoint = session.checkpoint();
        let result = self.expand(definition, tag_name, attributes.clone(), theme, Vec::new(), session);
        if result.is_err() {
            session.rollback(checkpoint);
        }
        result
    }

    /// Expands `definition` and serializes the result.
    pub fn render(
        &self,
        definition: &Arc<ComponentDefinition>,
        attributes: &AttributeBag,
        theme: Option<&Theme>,
        session: &mut DocumentSession,
    ) -> Result<String, RenderError> {
        let tag = self.element_to_tag(definition, attributes, theme, session)?;
        Ok(Node::Element(tag).to_html())
    }

    /// Renders with a private session.
    pub fn render_fresh(
        &self,
        definition: &Arc<ComponentDefinition>,
        attributes: &AttributeBag,
        theme: Option<&Theme>,
    ) -> Result<String, RenderError> {
        let mut session = DocumentSession::new();
        self.render(definition, attributes, theme, &mut session)
    }

    fn expand(
        &self,
        definition: &Arc<ComponentDefinition>,
        tag_name: String,
        attributes: AttributeBag,
        theme: Option<&Theme>,
        content: Vec<Node>,
        session: &mut DocumentSession,
    ) -> Result<Tag, RenderError> {
        let instance = ComponentInstance::new(
            definition,
            tag_name,
            attributes,
            theme.cloned(),
            &self.options.lang,
        );
        let result = self.expand_instance(definition, &instance, theme, content, session);
        // The stand-in is discarded after expansion.
        session.end_instance(instance.id());
        result
    }

    fn expand_instance(
        &self,
        definition: &ComponentDefinition,
        instance: &ComponentInstance,
        theme: Option<&Theme>,
        content: Vec<Node>,
        session: &mut DocumentSession,
    ) -> Result<Tag, RenderError> {
        tracing::debug!(tag = instance.tag_name(), component = %instance.id(), "expanding component");

        let own = match definition.html() {
            Some(template) => {
                let rendered = session.render_text(template, Change::FORCE, instance)?;
                match template.attach_mode() {
                    Attach::Children => rendered.value.map(|text| self.parser.parse(&text.text)),
                    Attach::Detached => None,
                }
            }
            None => None,
        };

        let styles = scope_styles(definition, instance, session, &self.options.class_prefix)?;

        let body = match own {
            Some(own) => {
                let tag_map = session.tag_map();
                let scoped = scope_markup(&own, &styles.classes(), |name| tag_map.contains_key(name));
                let slotted = resolve_slots(&scoped, &content);
                self.expand_children(&slotted.nodes, theme, session)?
            }
            None => content,
        };

        let mut children = Vec::with_capacity(styles.styles.len() + body.len());
        if self.options.emit_styles {
            children.extend(styles.styles.into_iter().map(Node::Style));
        }
        children.extend(body);

        Ok(Tag::new(instance.tag_name())
            .with_self_closing(false)
            .with_attributes(instance.host_attributes())
            .with_children(children)
            .mark_expanded())
    }

    /// Replaces every registered custom element in `nodes` with its
    /// expansion. Children are expanded before being handed to the nested
    /// component as slot content.
    fn expand_children(
        &self,
        nodes: &[Node],
        theme: Option<&Theme>,
        session: &mut DocumentSession,
    ) -> Result<Vec<Node>, RenderError> {
        let mut handler = |node: &Node| -> Result<Visit, RenderError> {
            let Node::Element(tag) = node else {
                return Ok(Visit::Stop(node.clone()));
            };
            if tag.is_expanded() {
                return Ok(Visit::Stop(node.clone()));
            }
            let Some(nested) = session.lookup(tag.name()) else {
                return Ok(Visit::Continue(node.clone()));
            };

            let content = self.expand_children(tag.children(), theme, session)?;
            let attributes: AttributeBag = tag
                .attributes()
                .iter()
                .map(|(name, value)| (name.clone(), Value::String(value.clone())))
                .collect();
            let expanded = self.expand(
                &nested,
                tag.name().to_string(),
                attributes,
                theme,
                content,
                session,
            )?;
            Ok(Visit::Stop(Node::Element(expanded)))
        };
        walk_all(nodes, &mut handler)
    }
}

/// Expands `definition` with default options.
pub fn element_to_tag(
    definition: &Arc<ComponentDefinition>,
    attributes: &AttributeBag,
    theme: Option<&Theme>,
    session: &mut DocumentSession,
) -> Result<Tag, RenderError> {
    SsrRenderer::new().element_to_tag(definition, attributes, theme, session)
}

/// Renders `definition` to HTML with default options.
pub fn render(
    definition: &Arc<ComponentDefinition>,
    attributes: &AttributeBag,
    theme: Option<&Theme>,
    session: &mut DocumentSession,
) -> Result<String, RenderError> {
    SsrRenderer::new().render(definition, attributes, theme, session)
}
