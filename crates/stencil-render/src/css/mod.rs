//! CSS scoping engine.
//!
//! Component stylesheets are parsed into a small [`Stylesheet`] tree, their
//! selectors are prefixed with a scoping identifier, and the rewritten sheets
//! are serialized back to text. The markup of each component receives the
//! matching identifiers as classes.
//!
//! # Scopes
//!
//! Every stylesheet is classified by the change mask of the template that
//! produced it:
//!
//! | Mask | Scope | Identifier | Emitted |
//! |------|-------|------------|---------|
//! | `THEME` only, `NEVER` | [`CssScope::Global`] | `css-<tag>` | once per session |
//! | anything else | [`CssScope::Unique`] | `css-<tag>-<n>` | once per instance |
//!
//! # Selector Rewriting
//!
//! ```rust
//! use stencil_render::css::parse_stylesheet;
//!
//! let sheet = parse_stylesheet(".foo { color: red; }").unwrap();
//! assert_eq!(sheet.prefixed("css-my-el-0").to_css(), ".css-my-el-0-.foo { color: red; }");
//! ```
//!
//! Rules nested in grouping at-rules (`@media`, `@supports`, ...) are
//! rewritten too; other at-rules such as `@keyframes` or `@font-face` are
//! kept verbatim.

mod parser;
mod scope;

pub use parser::parse_stylesheet;
pub use scope::{global_id, scope_markup, scope_styles, unique_id, CssScope, StyleScoping};

/// At-rules whose blocks contain nested style rules.
pub const GROUPING_AT_RULES: &[&str] = &["media", "supports", "container", "layer", "document"];

/// A parsed stylesheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stylesheet {
    rules: Vec<CssRule>,
}

impl Stylesheet {
    /// Creates a stylesheet from rules.
    pub fn new(rules: Vec<CssRule>) -> Self {
        Self { rules }
    }

    /// Returns the top-level rules.
    pub fn rules(&self) -> &[CssRule] {
        &self.rules
    }

    /// Returns true if the stylesheet has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns a copy with every selector rewritten to `.<id>-<selector>`.
    pub fn prefixed(&self, id: &str) -> Stylesheet {
        Stylesheet {
            rules: self.rules.iter().map(|rule| rule.prefixed(id)).collect(),
        }
    }

    /// Serializes the stylesheet, one top-level rule per line.
    pub fn to_css(&self) -> String {
        self.rules
            .iter()
            .map(CssRule::to_css)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A rule of a stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CssRule {
    /// `selector, selector { declarations }`
    Style(StyleRule),
    /// A grouping at-rule with nested rules, e.g. `@media`.
    Group(GroupRule),
    /// Any other at-rule, kept as written.
    Verbatim(AtRule),
}

impl CssRule {
    fn prefixed(&self, id: &str) -> CssRule {
        match self {
            CssRule::Style(rule) => CssRule::Style(StyleRule {
                selectors: rule
                    .selectors
                    .iter()
                    .map(|selector| format!(".{}-{}", id, selector))
                    .collect(),
                declarations: rule.declarations.clone(),
            }),
            CssRule::Group(group) => CssRule::Group(GroupRule {
                name: group.name.clone(),
                prelude: group.prelude.clone(),
                rules: group.rules.iter().map(|rule| rule.prefixed(id)).collect(),
            }),
            CssRule::Verbatim(rule) => CssRule::Verbatim(rule.clone()),
        }
    }

    /// Serializes the rule.
    pub fn to_css(&self) -> String {
        match self {
            CssRule::Style(rule) => {
                let selectors = rule.selectors.join(", ");
                if rule.declarations.is_empty() {
                    return format!("{} {{}}", selectors);
                }
                let body = rule
                    .declarations
                    .iter()
                    .map(Declaration::to_css)
                    .collect::<Vec<_>>()
                    .join(" ");
                format!("{} {{ {} }}", selectors, body)
            }
            CssRule::Group(group) => {
                let body = group
                    .rules
                    .iter()
                    .map(CssRule::to_css)
                    .collect::<Vec<_>>()
                    .join(" ");
                format!("{} {{ {} }}", at_rule_head(&group.name, &group.prelude), body)
            }
            CssRule::Verbatim(rule) => {
                let head = at_rule_head(&rule.name, &rule.prelude);
                match &rule.block {
                    Some(block) if block.is_empty() => format!("{} {{}}", head),
                    Some(block) => format!("{} {{ {} }}", head, block),
                    None => format!("{};", head),
                }
            }
        }
    }
}

fn at_rule_head(name: &str, prelude: &str) -> String {
    if prelude.is_empty() {
        format!("@{}", name)
    } else {
        format!("@{} {}", name, prelude)
    }
}

/// A style rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRule {
    /// Comma-separated selectors, trimmed.
    pub selectors: Vec<String>,
    /// Declarations in source order.
    pub declarations: Vec<Declaration>,
}

/// `name: value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Property name.
    pub name: String,
    /// Raw value text, including any `!important`.
    pub value: String,
}

impl Declaration {
    fn to_css(&self) -> String {
        format!("{}: {};", self.name, self.value)
    }
}

/// A grouping at-rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRule {
    /// At-rule name without `@`.
    pub name: String,
    /// Prelude text, e.g. `(min-width: 600px)`.
    pub prelude: String,
    /// Nested rules.
    pub rules: Vec<CssRule>,
}

/// A non-grouping at-rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtRule {
    /// At-rule name without `@`.
    pub name: String,
    /// Prelude text.
    pub prelude: String,
    /// Raw block contents, if the rule has a block.
    pub block: Option<String>,
}
