//! # Stencil Render - Memoized Templates and Server-Side Rendering of Components
//!
//! `stencil-render` renders reusable UI components to HTML. It has two
//! tightly coupled halves:
//!
//! - a change-gated template memoizer that decides when a component's markup
//!   or style must be recomputed and when the previous result can be reused;
//! - a server-side renderer that expands a tree of component definitions into
//!   scoped, slot-resolved, de-duplicated markup text.
//!
//! ## Core Concepts
//!
//! - [`Change`]: bitmask used both as a template's change mask and as the
//!   reason for a render request
//! - [`TemplateDefinition`]: a pure render function plus its change mask
//! - [`Memoizer`]: identity-keyed cache of the last result per
//!   (templater, component, template)
//! - [`ComponentDefinition`]: tag name, HTML/CSS templates, properties,
//!   capabilities and dependencies of a custom element
//! - [`DocumentSession`]: per-document state (unique CSS counters, global CSS
//!   de-duplication, dependency map, render cache)
//! - [`SsrRenderer`]: expands a definition into HTML
//!
//! ## Quick Start
//!
//! ```rust
//! use stencil_render::component::{AttributeBag, ComponentDefinition};
//! use stencil_render::template::TemplateDefinition;
//! use stencil_render::{Change, DocumentSession, SsrRenderer};
//!
//! let item = ComponentDefinition::builder()
//!     .tag_name("todo-item")
//!     .html(TemplateDefinition::jinja("<li>{{ label }}</li>", Change::PROP))
//!     .css(TemplateDefinition::jinja("li { list-style: none; }", Change::NEVER))
//!     .build();
//!
//! let list = ComponentDefinition::builder()
//!     .tag_name("todo-list")
//!     .html(TemplateDefinition::jinja(
//!         r#"<ul><todo-item label="a"></todo-item><todo-item label="b"></todo-item></ul>"#,
//!         Change::PROP,
//!     ))
//!     .dependency(item)
//!     .build();
//!
//! let mut session = DocumentSession::new();
//! let html = SsrRenderer::new()
//!     .render(&list, &AttributeBag::new(), None, &mut session)
//!     .unwrap();
//!
//! // The global stylesheet of `todo-item` is emitted once.
//! assert_eq!(html.matches("<style>").count(), 1);
//! assert!(html.contains(r#"<li class="css-todo-item">a</li>"#));
//! ```
//!
//! ## Memoization
//!
//! ```rust
//! use stencil_render::component::{AttributeBag, ComponentDefinition, ComponentInstance};
//! use stencil_render::template::{TemplateDefinition, TemplaterId};
//! use stencil_render::{Change, Memoizer};
//!
//! let definition = ComponentDefinition::builder().tag_name("x-clock").build();
//! let clock = ComponentInstance::new(&definition, "x-clock", AttributeBag::new(), None, "en");
//! let face = TemplateDefinition::new(Change::NEVER, |html, _, _, _| Ok(html.text("<svg></svg>")));
//!
//! let mut memo = Memoizer::new();
//! let templater = TemplaterId::next();
//! assert!(memo.render(&face, Change::FORCE, &clock, templater).unwrap().changed);
//! assert!(!memo.render(&face, Change::FORCE, &clock, templater).unwrap().changed);
//! ```
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events (`trace` for cache hits and misses,
//! `debug` for component expansion and stylesheet scoping, `warn` when
//! caller content is dropped). It never installs a subscriber.

pub mod change;
pub mod component;
mod config;
pub mod css;
pub mod deps;
mod error;
mod id;
pub mod prelude;
mod session;
pub mod slot;
pub mod ssr;
pub mod template;
mod theme;
pub mod tree;

// Error types
pub use error::{BoxError, ConfigError, DefinitionError, RenderError};

// Change masks
pub use change::{Change, ChangeMask, ChangeReason};

// Configuration
pub use config::{SsrOptions, CONFIG_EXTENSIONS};
pub use theme::Theme;

// Components
pub use component::{
    AttributeBag, Capabilities, ComponentDefinition, ComponentId, ComponentInstance, DefinitionId,
    PropertyDecl,
};

// Templates and memoization
pub use template::{
    coerce_text, Attach, Fragment, Memoized, Memoizer, RenderResult, TemplateDefinition,
    TemplateId, TemplaterId,
};

// Rendering
pub use deps::{build_map, TagNameMap};
pub use session::DocumentSession;
pub use slot::{resolve_slots, SlotResolution};
pub use ssr::{element_to_tag, render, SsrRenderer};
