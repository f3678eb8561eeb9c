//! Template definitions, render results and the render memoizer.
//!
//! A [`TemplateDefinition`] pairs a pure render function with a change mask.
//! The [`Memoizer`] decides, per component instance, whether a definition
//! must be recomputed for a given change reason or whether the previous
//! result can be reused.
//!
//! # Render Functions
//!
//! A render function receives a [`MarkupBuilder`] bound to the component
//! instance, a snapshot of the instance's props, the resolved theme (only
//! for theme-capable components) and the change reason:
//!
//! ```rust
//! use stencil_render::template::{Fragment, TemplateDefinition};
//! use stencil_render::Change;
//!
//! let greeting = TemplateDefinition::new(Change::PROP, |html, props, _theme, _reason| {
//!     let name = props.get("name").cloned().unwrap_or_default();
//!     Ok(html.fragment().push_static("<p>Hello ").push(name).push_static("</p>").into())
//! });
//! assert_eq!(greeting.mask(), Change::PROP);
//! ```
//!
//! # Text Templates
//!
//! Definitions can also be backed by a MiniJinja template. The context holds
//! every prop, plus `theme` (an object, or none) and `change` (the reason
//! bits):
//!
//! ```rust
//! use stencil_render::template::TemplateDefinition;
//! use stencil_render::Change;
//!
//! let card = TemplateDefinition::jinja("<div>{{ title }}<slot></slot></div>", Change::PROP);
//! # let _ = card;
//! ```

mod engine;
mod memo;
mod result;

use std::fmt;
use std::sync::Arc;

pub use crate::id::{TemplateId, TemplaterId};
pub use engine::{default_engine, register_filters, JinjaContext, MiniJinjaEngine, TemplateEngine};
pub use memo::{CacheKey, Memoized, Memoizer};
pub use result::{coerce_text, CoercedText, Fragment, Interpolation, PendingText, RenderResult};

use crate::change::ChangeReason;
use crate::change::ChangeMask;
use crate::component::{AttributeBag, ComponentInstance};
use crate::error::BoxError;
use crate::theme::Theme;
use crate::tree::Tag;

/// Props snapshot handed to render functions.
pub type Props = AttributeBag;

/// A render function.
pub type RenderFn = Arc<
    dyn Fn(&MarkupBuilder<'_>, &Props, Option<&Theme>, ChangeReason) -> Result<RenderResult, BoxError>
        + Send
        + Sync,
>;

/// Where a template's output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Attach {
    /// The output becomes the host element's children.
    #[default]
    Children,
    /// The output is computed and memoized but never emitted.
    Detached,
}

/// An immutable template: render function, change mask and attach strategy.
///
/// Cloning is cheap and preserves identity; the memoizer keys its cache by
/// [`TemplateDefinition::id`].
#[derive(Clone)]
pub struct TemplateDefinition {
    inner: Arc<TemplateInner>,
}

struct TemplateInner {
    id: TemplateId,
    mask: ChangeMask,
    render: Option<RenderFn>,
    attach: Attach,
}

impl TemplateDefinition {
    /// Creates a definition from a render function.
    pub fn new<F>(mask: ChangeMask, render: F) -> Self
    where
        F: Fn(&MarkupBuilder<'_>, &Props, Option<&Theme>, ChangeReason) -> Result<RenderResult, BoxError>
            + Send
            + Sync
            + 'static,
    {
        Self::from_parts(mask, Some(Arc::new(render)), Attach::default())
    }

    /// Creates a definition without a render function. It always renders
    /// to nothing.
    pub fn empty(mask: ChangeMask) -> Self {
        Self::from_parts(mask, None, Attach::default())
    }

    /// Creates a definition rendered by the shared MiniJinja engine.
    pub fn jinja(source: impl Into<String>, mask: ChangeMask) -> Self {
        Self::jinja_with_engine(default_engine(), source, mask)
    }

    /// Creates a definition rendered by the given engine.
    pub fn jinja_with_engine(
        engine: Arc<dyn TemplateEngine>,
        source: impl Into<String>,
        mask: ChangeMask,
    ) -> Self {
        let source = source.into();
        Self::new(mask, move |_html, props, theme, change| {
            let text = engine.render_source(&source, JinjaContext { props, theme, change })?;
            Ok(RenderResult::Fragment(Fragment::from(text)))
        })
    }

    /// Creates a definition rendered from a template registered on `engine`.
    ///
    /// A missing template surfaces as a render failure.
    pub fn jinja_named(
        engine: Arc<dyn TemplateEngine>,
        name: impl Into<String>,
        mask: ChangeMask,
    ) -> Self {
        let name = name.into();
        Self::new(mask, move |_html, props, theme, change| {
            let text = engine.render_named(&name, JinjaContext { props, theme, change })?;
            Ok(RenderResult::Fragment(Fragment::from(text)))
        })
    }

    fn from_parts(mask: ChangeMask, render: Option<RenderFn>, attach: Attach) -> Self {
        Self {
            inner: Arc::new(TemplateInner {
                id: TemplateId::next(),
                mask,
                render,
                attach,
            }),
        }
    }

    /// Sets the attach strategy.
    ///
    /// Definitions are immutable once shared: if this handle has been
    /// cloned, the result is a new definition with its own identity.
    pub fn attach(mut self, attach: Attach) -> Self {
        match Arc::get_mut(&mut self.inner) {
            Some(inner) => {
                inner.attach = attach;
                self
            }
            None => Self::from_parts(self.inner.mask, self.inner.render.clone(), attach),
        }
    }

    /// Returns the identity of this definition.
    pub fn id(&self) -> TemplateId {
        self.inner.id
    }

    /// Returns the change mask.
    pub fn mask(&self) -> ChangeMask {
        self.inner.mask
    }

    /// Returns the attach strategy.
    pub fn attach_mode(&self) -> Attach {
        self.inner.attach
    }

    /// Returns false for definitions created with [`empty`](Self::empty).
    pub fn has_render_fn(&self) -> bool {
        self.inner.render.is_some()
    }

    pub(crate) fn render_fn(&self) -> Option<&RenderFn> {
        self.inner.render.as_ref()
    }
}

impl fmt::Debug for TemplateDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateDefinition")
            .field("id", &self.inner.id)
            .field("mask", &self.inner.mask)
            .field("attach", &self.inner.attach)
            .field("render", &self.inner.render.is_some())
            .finish()
    }
}

/// Markup factory bound to the component being rendered.
#[derive(Debug, Clone, Copy)]
pub struct MarkupBuilder<'a> {
    component: &'a ComponentInstance,
}

impl<'a> MarkupBuilder<'a> {
    /// Binds a builder to a component instance.
    pub fn new(component: &'a ComponentInstance) -> Self {
        Self { component }
    }

    /// Returns the component instance being rendered.
    pub fn component(&self) -> &'a ComponentInstance {
        self.component
    }

    /// Starts an empty fragment.
    pub fn fragment(&self) -> Fragment {
        Fragment::new()
    }

    /// Wraps static markup.
    pub fn text(&self, markup: impl Into<String>) -> RenderResult {
        RenderResult::Fragment(Fragment::from(markup.into()))
    }

    /// Creates an element.
    pub fn element(&self, name: impl Into<String>) -> Tag {
        Tag::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::Change;
    use crate::component::ComponentDefinition;
    use serde_json::json;

    fn instance() -> ComponentInstance {
        let definition = ComponentDefinition::builder().tag_name("x-test").build();
        ComponentInstance::new(&definition, "x-test", AttributeBag::new(), None, "en")
    }

    fn call(template: &TemplateDefinition, component: &ComponentInstance) -> RenderResult {
        let builder = MarkupBuilder::new(component);
        let render = template.render_fn().unwrap();
        render(&builder, &component.props(), component.theme(), Change::FORCE).unwrap()
    }

    #[test]
    fn test_identity_preserved_by_clone() {
        let a = TemplateDefinition::empty(Change::PROP);
        let b = a.clone();
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), TemplateDefinition::empty(Change::PROP).id());
    }

    #[test]
    fn test_attach_on_shared_handle_gets_new_identity() {
        let a = TemplateDefinition::empty(Change::NEVER);
        let id = a.id();
        let unique = a.attach(Attach::Detached);
        assert_eq!(unique.id(), id);
        assert_eq!(unique.attach_mode(), Attach::Detached);

        let kept = unique.clone();
        let changed = unique.attach(Attach::Children);
        assert_ne!(changed.id(), kept.id());
        assert_eq!(kept.attach_mode(), Attach::Detached);
    }

    #[test]
    fn test_empty_has_no_render_fn() {
        assert!(!TemplateDefinition::empty(Change::ALWAYS).has_render_fn());
    }

    #[test]
    fn test_builder_render_fn() {
        let template = TemplateDefinition::new(Change::PROP, |html, _props, _theme, _reason| {
            Ok(html
                .fragment()
                .push_static("<b>")
                .push(html.component().tag_name())
                .push_static("</b>")
                .into())
        });
        let component = instance();
        let text = coerce_text(&call(&template, &component)).unwrap().text;
        assert_eq!(text, "<b>x-test</b>");
    }

    #[test]
    fn test_jinja_context() {
        let template = TemplateDefinition::jinja(
            "{{ title }}|{{ theme.accent if theme else 'none' }}|{{ change }}",
            Change::PROP,
        );
        let definition = ComponentDefinition::builder().tag_name("x-jinja").build();
        let mut attrs = AttributeBag::new();
        attrs.insert("title".into(), json!("Hi"));
        let component = ComponentInstance::new(&definition, "x-jinja", attrs, None, "en");

        let text = coerce_text(&call(&template, &component)).unwrap().text;
        assert_eq!(text, format!("Hi|none|{}", Change::FORCE.bits()));
    }

    #[test]
    fn test_jinja_error_is_reported() {
        let template = TemplateDefinition::jinja("{% if %}", Change::PROP);
        let component = instance();
        let builder = MarkupBuilder::new(&component);
        let render = template.render_fn().unwrap();
        assert!(render(&builder, &component.props(), None, Change::PROP).is_err());
    }

    #[test]
    fn test_jinja_named() {
        let mut engine = MiniJinjaEngine::new();
        engine.add_template("row", "<tr>{{ cells | attr }}</tr>").unwrap();
        let engine: Arc<dyn TemplateEngine> = Arc::new(engine);

        let row = TemplateDefinition::jinja_named(engine.clone(), "row", Change::PROP);
        let mut attrs = AttributeBag::new();
        attrs.insert("cells".into(), json!(["a", "b"]));
        let definition = ComponentDefinition::builder().tag_name("x-row").build();
        let component = ComponentInstance::new(&definition, "x-row", attrs, None, "en");
        assert_eq!(coerce_text(&call(&row, &component)).unwrap().text, "<tr>ab</tr>");

        let missing = TemplateDefinition::jinja_named(engine, "nope", Change::PROP);
        let render = missing.render_fn().unwrap();
        let builder = MarkupBuilder::new(&component);
        assert!(render(&builder, &component.props(), None, Change::PROP).is_err());
    }
}
