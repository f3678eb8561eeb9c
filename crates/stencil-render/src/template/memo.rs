//! Change-gated render cache.
//!
//! The [`Memoizer`] keeps the last result of every
//! (templater, component, template) triple. A request reuses the cached
//! result unless the change reason intersects the template's mask;
//! never-masked templates compute once and are reused forever.
//!
//! ```rust
//! use stencil_render::component::{AttributeBag, ComponentDefinition, ComponentInstance};
//! use stencil_render::template::{Memoizer, TemplateDefinition, TemplaterId};
//! use stencil_render::Change;
//!
//! let definition = ComponentDefinition::builder().tag_name("x-count").build();
//! let component = ComponentInstance::new(&definition, "x-count", AttributeBag::new(), None, "en");
//! let template = TemplateDefinition::new(Change::PROP, |html, _, _, _| Ok(html.text("<i></i>")));
//!
//! let mut memo = Memoizer::new();
//! let templater = TemplaterId::next();
//! assert!(memo.render(&template, Change::PROP, &component, templater).unwrap().changed);
//! assert!(!memo.render(&template, Change::THEME, &component, templater).unwrap().changed);
//! ```

use std::collections::HashMap;

use super::result::{coerce_text, CoercedText, RenderResult};
use super::{MarkupBuilder, TemplateDefinition, TemplateId, TemplaterId};
use crate::change::ChangeReason;
use crate::component::{ComponentId, ComponentInstance};
use crate::error::RenderError;

/// Cache key: whose cache, which instance, which template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Owner of the cache namespace.
    pub templater: TemplaterId,
    /// Component instance being rendered.
    pub component: ComponentId,
    /// Template definition.
    pub template: TemplateId,
}

/// Result of a memoized render.
#[derive(Debug, Clone)]
pub struct Memoized<T> {
    /// True if the value was computed by this call.
    pub changed: bool,
    /// The current value; `None` for templates without a render function.
    pub value: Option<T>,
}

impl<T> Memoized<T> {
    fn fresh(value: T) -> Self {
        Self {
            changed: true,
            value: Some(value),
        }
    }

    fn cached(value: T) -> Self {
        Self {
            changed: false,
            value: Some(value),
        }
    }

    fn none() -> Self {
        Self {
            changed: false,
            value: None,
        }
    }

    /// Maps the value, keeping the `changed` flag.
    pub fn map<U, F>(self, f: F) -> Result<Memoized<U>, RenderError>
    where
        F: FnOnce(T) -> Result<U, RenderError>,
    {
        Ok(Memoized {
            changed: self.changed,
            value: self.value.map(f).transpose()?,
        })
    }
}

/// Identity-keyed render cache.
///
/// Entries live until they are released explicitly with
/// [`release_component`](Self::release_component) or
/// [`release_templater`](Self::release_templater), or the memoizer is
/// dropped.
#[derive(Debug, Default)]
pub struct Memoizer {
    cache: HashMap<CacheKey, RenderResult>,
}

impl Memoizer {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders `template` for `component`, reusing the cached result when
    /// the change reason allows it.
    ///
    /// A failing render function leaves the cache untouched.
    pub fn render(
        &mut self,
        template: &TemplateDefinition,
        reason: ChangeReason,
        component: &ComponentInstance,
        templater: TemplaterId,
    ) -> Result<Memoized<RenderResult>, RenderError> {
        let Some(render) = template.render_fn() else {
            return Ok(Memoized::none());
        };

        let key = CacheKey {
            templater,
            component: component.id(),
            template: template.id(),
        };

        let mask = template.mask();
        if let Some(cached) = self.cache.get(&key) {
            if mask.is_never() || !reason.intersects(mask) {
                tracing::trace!(template = %key.template, component = %key.component, "memo hit");
                return Ok(Memoized::cached(cached.clone()));
            }
        }

        tracing::trace!(
            template = %key.template,
            component = %key.component,
            reason = ?reason,
            "memo miss"
        );
        let builder = MarkupBuilder::new(component);
        let props = component.props();
        let result = render(&builder, &props, component.theme(), reason)
            .map_err(|source| RenderError::render(template.id(), source))?;

        self.cache.insert(key, result.clone());
        Ok(Memoized::fresh(result))
    }

    /// Renders and flattens the result to text.
    pub fn render_text(
        &mut self,
        template: &TemplateDefinition,
        reason: ChangeReason,
        component: &ComponentInstance,
        templater: TemplaterId,
    ) -> Result<Memoized<CoercedText>, RenderError> {
        self.render(template, reason, component, templater)?
            .map(|result| coerce_text(&result))
    }

    /// Returns true if a result is cached for the key.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.cache.contains_key(key)
    }

    /// Drops every entry of a component instance. Returns the number removed.
    pub fn release_component(&mut self, component: ComponentId) -> usize {
        let before = self.cache.len();
        self.cache.retain(|key, _| key.component != component);
        before - self.cache.len()
    }

    /// Drops every entry of a templater. Returns the number removed.
    pub fn release_templater(&mut self, templater: TemplaterId) -> usize {
        let before = self.cache.len();
        self.cache.retain(|key, _| key.templater != templater);
        before - self.cache.len()
    }

    /// Drops all entries.
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// Returns the number of cached results.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::Change;
    use crate::component::{AttributeBag, ComponentDefinition};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn instance() -> ComponentInstance {
        let definition = ComponentDefinition::builder().tag_name("x-memo").build();
        ComponentInstance::new(&definition, "x-memo", AttributeBag::new(), None, "en")
    }

    fn counting(mask: Change) -> (TemplateDefinition, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let template = TemplateDefinition::new(mask, move |html, _props, _theme, _reason| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            Ok(html.text(format!("<i>{}</i>", n)))
        });
        (template, calls)
    }

    fn text(memoized: &Memoized<RenderResult>) -> String {
        coerce_text(memoized.value.as_ref().unwrap()).unwrap().text
    }

    #[test]
    fn test_prop_mask_gating() {
        let (template, calls) = counting(Change::PROP);
        let component = instance();
        let templater = TemplaterId::next();
        let mut memo = Memoizer::new();

        let first = memo.render(&template, Change::PROP, &component, templater).unwrap();
        assert!(first.changed);
        assert_eq!(text(&first), "<i>0</i>");

        let theme = memo.render(&template, Change::THEME, &component, templater).unwrap();
        assert!(!theme.changed);
        assert_eq!(text(&theme), "<i>0</i>");

        let prop = memo.render(&template, Change::PROP, &component, templater).unwrap();
        assert!(prop.changed);
        assert_eq!(text(&prop), "<i>1</i>");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_first_render_computes_regardless_of_reason() {
        let (template, calls) = counting(Change::PROP);
        let component = instance();
        let mut memo = Memoizer::new();
        let result = memo
            .render(&template, Change::LANG, &component, TemplaterId::next())
            .unwrap();
        assert!(result.changed);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_never_mask_computes_once() {
        let (template, calls) = counting(Change::NEVER);
        let component = instance();
        let templater = TemplaterId::next();
        let mut memo = Memoizer::new();

        assert!(memo.render(&template, Change::FORCE, &component, templater).unwrap().changed);
        for reason in [Change::FORCE, Change::NEVER, Change::ALWAYS, Change::PROP] {
            let result = memo.render(&template, reason, &component, templater).unwrap();
            assert!(!result.changed);
            assert_eq!(text(&result), "<i>0</i>");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_never_composites_still_recompute() {
        for mask in [Change::FORCE, Change::PROP | Change::NEVER] {
            let (template, calls) = counting(mask);
            let component = instance();
            let templater = TemplaterId::next();
            let mut memo = Memoizer::new();

            memo.render(&template, Change::PROP, &component, templater).unwrap();
            let second = memo.render(&template, Change::PROP, &component, templater).unwrap();
            assert!(second.changed, "{:?} must react to PROP", mask);
            assert_eq!(text(&second), "<i>1</i>");

            let lang = memo.render(&template, Change::LANG, &component, templater).unwrap();
            assert_eq!(lang.changed, mask.intersects(Change::LANG));
        }
    }

    #[test]
    fn test_keys_are_independent() {
        let (template, calls) = counting(Change::NEVER);
        let a = instance();
        let b = instance();
        let templater = TemplaterId::next();
        let mut memo = Memoizer::new();

        memo.render(&template, Change::FORCE, &a, templater).unwrap();
        memo.render(&template, Change::FORCE, &b, templater).unwrap();
        memo.render(&template, Change::FORCE, &a, TemplaterId::next()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(memo.len(), 3);
    }

    #[test]
    fn test_null_render_fn() {
        let template = TemplateDefinition::empty(Change::ALWAYS);
        let component = instance();
        let mut memo = Memoizer::new();
        let result = memo
            .render(&template, Change::FORCE, &component, TemplaterId::next())
            .unwrap();
        assert!(!result.changed);
        assert!(result.value.is_none());
        assert!(memo.is_empty());
    }

    #[test]
    fn test_failure_leaves_cache_untouched() {
        let fail = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = fail.clone();
        let template = TemplateDefinition::new(Change::PROP, move |html, _, _, _| {
            if flag.load(Ordering::SeqCst) {
                return Err("render exploded".into());
            }
            Ok(html.text("ok"))
        });
        let component = instance();
        let templater = TemplaterId::next();
        let mut memo = Memoizer::new();

        memo.render(&template, Change::PROP, &component, templater).unwrap();
        fail.store(true, Ordering::SeqCst);

        let err = memo
            .render(&template, Change::PROP, &component, templater)
            .unwrap_err();
        match &err {
            RenderError::Render { template: id, source } => {
                assert_eq!(*id, template.id());
                assert_eq!(source.to_string(), "render exploded");
            }
            other => panic!("expected Render, got {:?}", other),
        }

        let cached = memo.render(&template, Change::THEME, &component, templater).unwrap();
        assert!(!cached.changed);
        assert_eq!(text(&cached), "ok");
    }

    #[test]
    fn test_failure_on_first_render_caches_nothing() {
        let template =
            TemplateDefinition::new(Change::PROP, |_, _, _, _| Err("nope".into()));
        let component = instance();
        let mut memo = Memoizer::new();
        assert!(memo
            .render(&template, Change::PROP, &component, TemplaterId::next())
            .is_err());
        assert!(memo.is_empty());
    }

    #[test]
    fn test_render_text() {
        let (template, _) = counting(Change::PROP);
        let component = instance();
        let mut memo = Memoizer::new();
        let result = memo
            .render_text(&template, Change::PROP, &component, TemplaterId::next())
            .unwrap();
        assert!(result.changed);
        assert_eq!(result.value.unwrap().text, "<i>0</i>");
    }

    #[test]
    fn test_render_text_missing_serializer() {
        let template = TemplateDefinition::new(Change::PROP, |_, _, _, _| {
            Ok(RenderResult::Data(serde_json::json!({"not": "text"})))
        });
        let component = instance();
        let mut memo = Memoizer::new();
        let err = memo
            .render_text(&template, Change::PROP, &component, TemplaterId::next())
            .unwrap_err();
        assert!(matches!(err, RenderError::MissingSerializer { .. }));
    }

    #[test]
    fn test_release() {
        let (template, _) = counting(Change::NEVER);
        let a = instance();
        let b = instance();
        let t1 = TemplaterId::next();
        let t2 = TemplaterId::next();
        let mut memo = Memoizer::new();
        memo.render(&template, Change::FORCE, &a, t1).unwrap();
        memo.render(&template, Change::FORCE, &b, t1).unwrap();
        memo.render(&template, Change::FORCE, &a, t2).unwrap();

        assert!(memo.contains(&CacheKey {
            templater: t1,
            component: a.id(),
            template: template.id(),
        }));
        assert_eq!(memo.release_component(a.id()), 2);
        assert_eq!(memo.len(), 1);
        assert_eq!(memo.release_templater(t1), 1);
        assert!(memo.is_empty());
    }
}
