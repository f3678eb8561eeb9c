//! Prelude for convenient imports.
//!
//! ```rust
//! use stencil_render::prelude::*;
//!
//! let badge = ComponentDefinition::builder()
//!     .tag_name("x-badge")
//!     .html(TemplateDefinition::jinja("<span>{{ text }}</span>", Change::PROP))
//!     .build();
//!
//! let mut attrs = AttributeBag::new();
//! attrs.insert("text".into(), "new".into());
//! let html = SsrRenderer::new().render_fresh(&badge, &attrs, None).unwrap();
//! assert_eq!(html, r#"<x-badge text="new"><span>new</span></x-badge>"#);
//! ```

pub use crate::{
    AttributeBag, Attach, Capabilities, Change, ComponentDefinition, ComponentInstance,
    DocumentSession, Fragment, PropertyDecl, RenderError, RenderResult, SsrOptions, SsrRenderer,
    TemplateDefinition, Theme,
};
