//! Render results and their text form.
//!
//! A render function returns a [`RenderResult`]. Before markup can be parsed
//! into a render tree it is flattened to text with [`coerce_text`], which
//! concatenates static segments and interpolated values in source order.
//! Concatenation is verbatim: escaping is the render function's job.

use std::fmt;
use std::sync::{Arc, OnceLock};

use serde_json::Value;

use crate::component::attribute_text;
use crate::error::RenderError;
use crate::tree::{Node, Tag};

/// Output of a render function.
#[derive(Clone)]
pub enum RenderResult {
    /// Static markup segments interleaved with interpolated values.
    Fragment(Fragment),
    /// A raw element, serialized as-is.
    Element(Node),
    /// Any value with a text form.
    Display(Arc<dyn fmt::Display + Send + Sync>),
    /// Plain data. Strings, numbers, booleans and arrays of those have a
    /// text form; objects and `null` do not.
    Data(Value),
}

impl RenderResult {
    /// Wraps any displayable value.
    pub fn display(value: impl fmt::Display + Send + Sync + 'static) -> Self {
        RenderResult::Display(Arc::new(value))
    }

    /// Flattens the result to text. See [`coerce_text`].
    pub fn to_text(&self) -> Result<CoercedText, RenderError> {
        coerce_text(self)
    }
}

impl fmt::Debug for RenderResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderResult::Fragment(fragment) => f.debug_tuple("Fragment").field(fragment).finish(),
            RenderResult::Element(node) => f.debug_tuple("Element").field(node).finish(),
            RenderResult::Display(value) => {
                f.debug_tuple("Display").field(&value.to_string()).finish()
            }
            RenderResult::Data(value) => f.debug_tuple("Data").field(value).finish(),
        }
    }
}

impl From<Fragment> for RenderResult {
    fn from(fragment: Fragment) -> Self {
        RenderResult::Fragment(fragment)
    }
}

impl From<Node> for RenderResult {
    fn from(node: Node) -> Self {
        RenderResult::Element(node)
    }
}

impl From<Tag> for RenderResult {
    fn from(tag: Tag) -> Self {
        RenderResult::Element(Node::Element(tag))
    }
}

impl From<Value> for RenderResult {
    fn from(value: Value) -> Self {
        RenderResult::Data(value)
    }
}

/// Static segments interleaved with interpolations.
///
/// There is always exactly one more static segment than interpolations;
/// the text form is `s0 v0 s1 v1 ... sN`.
#[derive(Debug, Clone)]
pub struct Fragment {
    statics: Vec<String>,
    values: Vec<Interpolation>,
}

impl Fragment {
    /// Creates an empty fragment.
    pub fn new() -> Self {
        Self {
            statics: vec![String::new()],
            values: Vec::new(),
        }
    }

    /// Appends static markup.
    pub fn push_static(mut self, text: impl AsRef<str>) -> Self {
        if let Some(last) = self.statics.last_mut() {
            last.push_str(text.as_ref());
        }
        self
    }

    /// Appends an interpolated value.
    pub fn push(mut self, value: impl Into<Interpolation>) -> Self {
        self.values.push(value.into());
        self.statics.push(String::new());
        self
    }

    /// Returns the static segments.
    pub fn statics(&self) -> &[String] {
        &self.statics
    }

    /// Returns the interpolated values.
    pub fn values(&self) -> &[Interpolation] {
        &self.values
    }

    fn write(&self, out: &mut CoercedText) -> Result<(), RenderError> {
        for (index, segment) in self.statics.iter().enumerate() {
            out.text.push_str(segment);
            if let Some(value) = self.values.get(index) {
                value.write(out)?;
            }
        }
        Ok(())
    }
}

impl Default for Fragment {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for Fragment {
    fn from(text: &str) -> Self {
        Fragment::new().push_static(text)
    }
}

impl From<String> for Fragment {
    fn from(text: String) -> Self {
        Fragment::new().push_static(text)
    }
}

/// A value interpolated into a [`Fragment`].
#[derive(Debug, Clone)]
pub enum Interpolation {
    /// Literal text.
    Text(String),
    /// Data, converted with the attribute string rule.
    Value(Value),
    /// A nested fragment.
    Fragment(Fragment),
    /// An element, serialized as markup.
    Element(Node),
    /// A sequence; items are concatenated.
    List(Vec<Interpolation>),
    /// Text that may not be available yet.
    Pending(PendingText),
}

impl Interpolation {
    fn write(&self, out: &mut CoercedText) -> Result<(), RenderError> {
        match self {
            Interpolation::Text(text) => out.text.push_str(text),
            Interpolation::Value(value) => out.text.push_str(&attribute_text(value)),
            Interpolation::Fragment(fragment) => fragment.write(out)?,
            Interpolation::Element(node) => out.text.push_str(&node.to_html()),
            Interpolation::List(items) => {
                for item in items {
                    item.write(out)?;
                }
            }
            Interpolation::Pending(pending) => {
                out.text.push_str(&pending.current());
                out.pending.push(pending.clone());
            }
        }
        Ok(())
    }
}

impl From<&str> for Interpolation {
    fn from(text: &str) -> Self {
        Interpolation::Text(text.to_string())
    }
}

impl From<String> for Interpolation {
    fn from(text: String) -> Self {
        Interpolation::Text(text)
    }
}

impl From<Value> for Interpolation {
    fn from(value: Value) -> Self {
        Interpolation::Value(value)
    }
}

impl From<Fragment> for Interpolation {
    fn from(fragment: Fragment) -> Self {
        Interpolation::Fragment(fragment)
    }
}

impl From<Node> for Interpolation {
    fn from(node: Node) -> Self {
        Interpolation::Element(node)
    }
}

impl From<Tag> for Interpolation {
    fn from(tag: Tag) -> Self {
        Interpolation::Element(Node::Element(tag))
    }
}

impl From<PendingText> for Interpolation {
    fn from(pending: PendingText) -> Self {
        Interpolation::Pending(pending)
    }
}

impl<T: Into<Interpolation>> From<Vec<T>> for Interpolation {
    fn from(items: Vec<T>) -> Self {
        Interpolation::List(items.into_iter().map(Into::into).collect())
    }
}

/// Deferred text, such as a localized message that is still loading.
///
/// The synchronous pipeline never waits for it: until [`resolve`] is called,
/// the placeholder is serialized. Clones share the resolution, so whoever
/// delivers the text to a live surface can patch it later.
///
/// [`resolve`]: PendingText::resolve
#[derive(Debug, Clone)]
pub struct PendingText {
    placeholder: String,
    resolved: Arc<OnceLock<String>>,
}

impl PendingText {
    /// Creates an unresolved payload.
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
            resolved: Arc::new(OnceLock::new()),
        }
    }

    /// Delivers the final text. Returns false if it was already delivered.
    pub fn resolve(&self, text: impl Into<String>) -> bool {
        self.resolved.set(text.into()).is_ok()
    }

    /// Returns the placeholder text.
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Returns the delivered text, if any.
    pub fn resolved(&self) -> Option<&str> {
        self.resolved.get().map(String::as_str)
    }

    /// Returns true once the final text has been delivered.
    pub fn is_ready(&self) -> bool {
        self.resolved.get().is_some()
    }

    /// Returns the text to serialize right now.
    pub fn current(&self) -> String {
        self.resolved()
            .unwrap_or(&self.placeholder)
            .to_string()
    }

    /// Returns true if both handles refer to the same payload.
    pub fn same_payload(&self, other: &PendingText) -> bool {
        Arc::ptr_eq(&self.resolved, &other.resolved)
    }
}

/// Text form of a render result.
#[derive(Debug, Clone, Default)]
pub struct CoercedText {
    /// The flattened text.
    pub text: String,
    /// Deferred payloads whose current text was written into `text`.
    pub pending: Vec<PendingText>,
}

/// Flattens a render result to text.
///
/// Fails with [`RenderError::MissingSerializer`] for data without a text
/// form (objects and `null`).
pub fn coerce_text(result: &RenderResult) -> Result<CoercedText, RenderError> {
    let mut out = CoercedText::default();
    match result {
        RenderResult::Fragment(fragment) => fragment.write(&mut out)?,
        RenderResult::Element(node) => out.text = node.to_html(),
        RenderResult::Display(value) => out.text = value.to_string(),
        RenderResult::Data(value) => write_data(value, &mut out.text)?,
    }
    Ok(out)
}

fn write_data(value: &Value, out: &mut String) -> Result<(), RenderError> {
    match value {
        Value::String(s) => out.push_str(s),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Array(items) => {
            for item in items {
                write_data(item, out)?;
            }
        }
        Value::Object(_) => return Err(RenderError::MissingSerializer { kind: "object" }),
        Value::Null => return Err(RenderError::MissingSerializer { kind: "null" }),
    }
    Ok(())
}
