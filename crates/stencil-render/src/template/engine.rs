//! Text template backends.
//!
//! [`TemplateDefinition::jinja`](super::TemplateDefinition::jinja) and
//! [`TemplateDefinition::jinja_named`](super::TemplateDefinition::jinja_named)
//! turn a text template into a render function. The text is rendered by a
//! [`TemplateEngine`] against a [`JinjaContext`]: every prop at the top
//! level, plus `theme` and `change`.

use std::collections::HashMap;
use std::sync::Arc;

use minijinja::{Environment, Error, ErrorKind, Value};
use once_cell::sync::Lazy;

use super::Props;
use crate::change::ChangeReason;
use crate::component::attribute_text;
use crate::theme::Theme;

static SHARED: Lazy<Arc<MiniJinjaEngine>> = Lazy::new(|| Arc::new(MiniJinjaEngine::new()));

/// Returns the engine behind [`TemplateDefinition::jinja`](super::TemplateDefinition::jinja).
pub fn default_engine() -> Arc<dyn TemplateEngine> {
    SHARED.clone()
}

/// Values visible to a text template.
///
/// Props shadow `theme` and `change` when a component declares a prop with
/// one of those names.
#[derive(Debug, Clone, Copy)]
pub struct JinjaContext<'a> {
    /// The instance's props.
    pub props: &'a Props,
    /// The resolved theme, if the component is theme-capable.
    pub theme: Option<&'a Theme>,
    /// Why the render was requested.
    pub change: ChangeReason,
}

impl JinjaContext<'_> {
    fn entries(self) -> HashMap<String, Value> {
        let mut entries = HashMap::with_capacity(self.props.len() + 2);
        let theme = match self.theme {
            Some(theme) => Value::from_serialize(theme),
            None => Value::from(()),
        };
        entries.insert("theme".to_string(), theme);
        entries.insert("change".to_string(), Value::from(self.change.bits()));
        for (name, value) in self.props {
            entries.insert(name.clone(), Value::from_serialize(value));
        }
        entries
    }
}

/// A backend that renders text templates for component render functions.
pub trait TemplateEngine: Send + Sync {
    /// Compiles and renders `source` in one step.
    fn render_source(&self, source: &str, context: JinjaContext<'_>) -> Result<String, Error>;

    /// Registers a named template for [`render_named`](Self::render_named).
    fn add_template(&mut self, name: &str, source: &str) -> Result<(), Error>;

    /// Renders a registered template.
    fn render_named(&self, name: &str, context: JinjaContext<'_>) -> Result<String, Error>;

    /// Returns true if `name` is registered.
    fn has_template(&self, name: &str) -> bool;
}

/// [`TemplateEngine`] on top of a MiniJinja [`Environment`].
///
/// The environment starts with the `attr` filter, which applies the
/// attribute string rule (`none` is empty, sequences concatenate).
///
/// ```rust
/// use std::sync::Arc;
/// use stencil_render::template::{MiniJinjaEngine, TemplateEngine};
/// use stencil_render::{Change, TemplateDefinition};
///
/// let mut engine = MiniJinjaEngine::new();
/// engine.add_template("badge", "<b>{{ tags | attr }}</b>").unwrap();
///
/// let badge = TemplateDefinition::jinja_named(Arc::new(engine), "badge", Change::PROP);
/// assert!(badge.has_render_fn());
/// ```
pub struct MiniJinjaEngine {
    env: Environment<'static>,
}

impl MiniJinjaEngine {
    /// An engine with the crate's filters registered.
    pub fn new() -> Self {
        let mut env = Environment::new();
        register_filters(&mut env);
        Self { env }
    }

    /// The underlying MiniJinja environment.
    pub fn environment(&self) -> &Environment<'static> {
        &self.env
    }

    /// Gives access to the environment, e.g. to add filters or a loader.
    pub fn environment_mut(&mut self) -> &mut Environment<'static> {
        &mut self.env
    }
}

impl Default for MiniJinjaEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MiniJinjaEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiniJinjaEngine").finish_non_exhaustive()
    }
}

impl TemplateEngine for MiniJinjaEngine {
    fn render_source(&self, source: &str, context: JinjaContext<'_>) -> Result<String, Error> {
        self.env.render_str(source, context.entries())
    }

    fn add_template(&mut self, name: &str, source: &str) -> Result<(), Error> {
        self.env
            .add_template_owned(name.to_string(), source.to_string())
    }

    fn render_named(&self, name: &str, context: JinjaContext<'_>) -> Result<String, Error> {
        self.env.get_template(name)?.render(context.entries())
    }

    fn has_template(&self, name: &str) -> bool {
        self.env.get_template(name).is_ok()
    }
}

/// Adds the crate's filters to `env`.
pub fn register_filters(env: &mut Environment<'static>) {
    env.add_filter("attr", |value: Value| -> Result<String, Error> {
        serde_json::to_value(&value)
            .map(|json| attribute_text(&json))
            .map_err(|e| Error::new(ErrorKind::InvalidOperation, e.to_string()))
    });
}
