//! Component definitions and the server-side instance stand-in.
//!
//! A [`ComponentDefinition`] describes a reusable custom element: its tag
//! name, HTML and CSS templates, declared properties, capabilities and the
//! definitions it depends on. During server-side rendering each occurrence
//! of a definition is represented by a [`ComponentInstance`], a minimal
//! stand-in exposing the given attributes, the resolved theme and the
//! attributes the instance sets on itself while rendering.
//!
//! ```rust
//! use stencil_render::component::{Capabilities, ComponentDefinition, PropertyDecl};
//! use stencil_render::template::TemplateDefinition;
//! use stencil_render::Change;
//!
//! let badge = ComponentDefinition::builder()
//!     .tag_name("x-badge")
//!     .html(TemplateDefinition::jinja("<span>{{ label }}</span>", Change::PROP))
//!     .css(TemplateDefinition::jinja("span { color: red; }", Change::NEVER))
//!     .property(PropertyDecl::new("label").reflect())
//!     .capabilities(Capabilities::REFLECT)
//!     .build();
//!
//! assert_eq!(badge.tag_name(), Some("x-badge"));
//! ```

use std::cell::RefCell;
use std::fmt;
use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;
use serde_json::Value;

pub use crate::id::{ComponentId, DefinitionId};

use crate::error::DefinitionError;
use crate::template::{Props, TemplateDefinition};
use crate::theme::Theme;
use crate::tree::TagAttributes;

/// String-keyed attribute/property bag.
pub type AttributeBag = IndexMap<String, Value>;

/// Converts a value to attribute text.
///
/// Strings are used as-is, numbers and booleans use their usual text form,
/// `null` is empty, arrays concatenate the text of their items and objects
/// use their JSON text.
pub fn attribute_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(attribute_text).collect(),
        Value::Object(_) => value.to_string(),
    }
}

bitflags::bitflags! {
    /// Optional features of a component, checked by presence.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u8 {
        /// Receives the resolved theme. Without it render functions see no theme.
        const THEME = 1 << 0;
        /// Receives the active language as the `lang` prop.
        const I18N = 1 << 1;
        /// Writes properties declared with `reflect` back as attributes.
        const REFLECT = 1 << 2;
    }
}

/// A declared public property.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDecl {
    /// Property name as seen by render functions.
    pub name: String,
    /// Attribute the property is read from and reflected to.
    pub attribute: String,
    /// Whether the property is reflected as an attribute.
    pub reflect: bool,
    /// Value used when the attribute is absent.
    pub default: Option<Value>,
}

impl PropertyDecl {
    /// Declares a property. The attribute name is the kebab-case of `name`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let attribute = kebab_case(&name);
        Self {
            name,
            attribute,
            reflect: false,
            default: None,
        }
    }

    /// Overrides the attribute name.
    pub fn attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = attribute.into();
        self
    }

    /// Marks the property as reflected.
    pub fn reflect(mut self) -> Self {
        self.reflect = true;
        self
    }

    /// Sets the default value.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

fn kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch == '_' {
            out.push('-');
        } else if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('-');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// A reusable component.
///
/// Definitions are shared as `Arc<ComponentDefinition>` and compared by
/// [`id`](Self::id).
pub struct ComponentDefinition {
    id: DefinitionId,
    tag_name: Option<String>,
    html: Option<TemplateDefinition>,
    css: Vec<TemplateDefinition>,
    dependencies: OnceLock<Vec<Arc<ComponentDefinition>>>,
    properties: Vec<PropertyDecl>,
    capabilities: Capabilities,
}

impl ComponentDefinition {
    /// Starts a definition.
    pub fn builder() -> ComponentDefinitionBuilder {
        ComponentDefinitionBuilder::default()
    }

    /// Returns the identity of this definition.
    pub fn id(&self) -> DefinitionId {
        self.id
    }

    /// Returns the declared tag name.
    pub fn tag_name(&self) -> Option<&str> {
        self.tag_name.as_deref()
    }

    /// Returns the declared tag name, or `<anonymous_prefix>-<id>`.
    pub fn resolved_tag_name(&self, anonymous_prefix: &str) -> String {
        match &self.tag_name {
            Some(name) => name.clone(),
            None => format!("{}-{}", anonymous_prefix, self.id.get()),
        }
    }

    /// Returns the HTML template.
    pub fn html(&self) -> Option<&TemplateDefinition> {
        self.html.as_ref()
    }

    /// Returns the CSS templates in declaration order.
    pub fn css(&self) -> &[TemplateDefinition] {
        &self.css
    }

    /// Returns the direct dependencies.
    pub fn dependencies(&self) -> &[Arc<ComponentDefinition>] {
        self.dependencies.get().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Binds the dependencies after construction, which allows cycles.
    ///
    /// Fails if dependencies were already bound, either here or through the
    /// builder.
    pub fn set_dependencies(
        &self,
        dependencies: Vec<Arc<ComponentDefinition>>,
    ) -> Result<(), DefinitionError> {
        self.dependencies
            .set(dependencies)
            .map_err(|_| DefinitionError::DependenciesAlreadySet {
                definition: self.id,
            })
    }

    /// Returns the declared properties.
    pub fn properties(&self) -> &[PropertyDecl] {
        &self.properties
    }

    /// Returns the capability set.
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }
}

impl fmt::Debug for ComponentDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dependencies: Vec<_> = self.dependencies().iter().map(|d| d.id).collect();
        f.debug_struct("ComponentDefinition")
            .field("id", &self.id)
            .field("tag_name", &self.tag_name)
            .field("html", &self.html)
            .field("css", &self.css)
            .field("dependencies", &dependencies)
            .field("properties", &self.properties)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

/// Builder for [`ComponentDefinition`].
#[derive(Debug, Default)]
pub struct ComponentDefinitionBuilder {
    tag_name: Option<String>,
    html: Option<TemplateDefinition>,
    css: Vec<TemplateDefinition>,
    dependencies: Option<Vec<Arc<ComponentDefinition>>>,
    properties: Vec<PropertyDecl>,
    capabilities: Capabilities,
}

impl ComponentDefinitionBuilder {
    /// Sets the custom element tag name.
    pub fn tag_name(mut self, name: impl Into<String>) -> Self {
        self.tag_name = Some(name.into());
        self
    }

    /// Sets the HTML template.
    pub fn html(mut self, template: TemplateDefinition) -> Self {
        self.html = Some(template);
        self
    }

    /// Adds a CSS template.
    pub fn css(mut self, template: TemplateDefinition) -> Self {
        self.css.push(template);
        self
    }

    /// Adds a dependency.
    pub fn dependency(mut self, definition: Arc<ComponentDefinition>) -> Self {
        self.dependencies.get_or_insert_with(Vec::new).push(definition);
        self
    }

    /// Adds several dependencies.
    pub fn dependencies<I>(mut self, definitions: I) -> Self
    where
        I: IntoIterator<Item = Arc<ComponentDefinition>>,
    {
        self.dependencies
            .get_or_insert_with(Vec::new)
            .extend(definitions);
        self
    }

    /// Declares a property.
    pub fn property(mut self, property: PropertyDecl) -> Self {
        self.properties.push(property);
        self
    }

    /// Adds capabilities.
    pub fn capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities |= capabilities;
        self
    }

    /// Finishes the definition.
    ///
    /// Dependencies given to the builder are bound now; otherwise they can
    /// be bound once with [`ComponentDefinition::set_dependencies`].
    pub fn build(self) -> Arc<ComponentDefinition> {
        let dependencies = OnceLock::new();
        if let Some(deps) = self.dependencies {
            let _ = dependencies.set(deps);
        }
        Arc::new(ComponentDefinition {
            id: DefinitionId::next(),
            tag_name: self.tag_name,
            html: self.html,
            css: self.css,
            dependencies,
            properties: self.properties,
            capabilities: self.capabilities,
        })
    }
}

/// Server-side stand-in for a rendered component.
#[derive(Debug)]
pub struct ComponentInstance {
    id: ComponentId,
    definition: DefinitionId,
    tag_name: String,
    capabilities: Capabilities,
    properties: Vec<PropertyDecl>,
    attributes: AttributeBag,
    props: Props,
    theme: Option<Theme>,
    self_attributes: RefCell<TagAttributes>,
}

impl ComponentInstance {
    /// Creates a stand-in for one occurrence of `definition`.
    ///
    /// Declared properties are read from their attribute (or their name),
    /// falling back to the declared default. The theme is kept only for
    /// theme-capable definitions and `lang` is exposed only to I18N-capable
    /// ones.
    pub fn new(
        definition: &ComponentDefinition,
        tag_name: impl Into<String>,
        attributes: AttributeBag,
        theme: Option<Theme>,
        lang: &str,
    ) -> Self {
        let capabilities = definition.capabilities();
        let mut props = attributes.clone();
        for decl in definition.properties() {
            let value = attributes
                .get(&decl.attribute)
                .or_else(|| attributes.get(&decl.name))
                .or(decl.default.as_ref());
            if let Some(value) = value {
                props.insert(decl.name.clone(), value.clone());
            }
        }
        if capabilities.contains(Capabilities::I18N) {
            props
                .entry("lang".to_string())
                .or_insert_with(|| Value::String(lang.to_string()));
        }

        Self {
            id: ComponentId::next(),
            definition: definition.id(),
            tag_name: tag_name.into(),
            capabilities,
            properties: definition.properties().to_vec(),
            attributes,
            props,
            theme: theme.filter(|_| capabilities.contains(Capabilities::THEME)),
            self_attributes: RefCell::new(TagAttributes::new()),
        }
    }

    /// Returns the identity of this instance.
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Returns the identity of the definition this instance renders.
    pub fn definition_id(&self) -> DefinitionId {
        self.definition
    }

    /// Returns the host tag name.
    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    /// Returns the attributes given by the caller.
    pub fn attributes(&self) -> &AttributeBag {
        &self.attributes
    }

    /// Returns a snapshot of the props.
    pub fn props(&self) -> Props {
        self.props.clone()
    }

    /// Returns the resolved theme, for theme-capable components.
    pub fn theme(&self) -> Option<&Theme> {
        self.theme.as_ref()
    }

    /// Sets an attribute on the host element.
    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<String>) {
        self.self_attributes
            .borrow_mut()
            .insert(name.into(), value.into());
    }

    /// Removes an attribute previously set with [`set_attribute`](Self::set_attribute).
    pub fn remove_attribute(&self, name: &str) -> Option<String> {
        self.self_attributes.borrow_mut().shift_remove(name)
    }

    /// Returns the attributes the instance set on itself.
    pub fn self_attributes(&self) -> TagAttributes {
        self.self_attributes.borrow().clone()
    }

    /// Returns the caller's attributes converted to text.
    pub fn explicit_attributes(&self) -> TagAttributes {
        self.attributes
            .iter()
            .map(|(name, value)| (name.clone(), attribute_text(value)))
            .collect()
    }

    /// Returns the reflected properties as attributes.
    ///
    /// Empty unless the definition has the `REFLECT` capability.
    pub fn reflected_attributes(&self) -> TagAttributes {
        if !self.capabilities.contains(Capabilities::REFLECT) {
            return TagAttributes::new();
        }
        self.properties
            .iter()
            .filter(|decl| decl.reflect)
            .filter_map(|decl| {
                self.props
                    .get(&decl.name)
                    .map(|value| (decl.attribute.clone(), attribute_text(value)))
            })
            .collect()
    }

    /// Merges host attributes: explicit, then reflected, then self-set.
    /// Later sources win; first-seen names keep their position.
    pub fn host_attributes(&self) -> TagAttributes {
        let mut merged = self.explicit_attributes();
        merged.extend(self.reflected_attributes());
        merged.extend(self.self_attributes());
        merged
    }
}
