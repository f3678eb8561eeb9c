//! Process-wide identities.
//!
//! Caches and session bookkeeping are keyed by identity rather than by
//! value. Each identity type draws from its own monotonic counter, so two
//! values compare equal only if they were handed out by the same call to
//! `next()`.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

macro_rules! identity {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $name {
            /// Hands out a fresh identity.
            pub fn next() -> Self {
                static COUNTER: AtomicU64 = AtomicU64::new(0);
                Self(COUNTER.fetch_add(1, Ordering::Relaxed))
            }

            /// Returns the raw counter value.
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

identity!(
    /// Identity of a [`TemplateDefinition`](crate::TemplateDefinition).
    TemplateId,
    "template"
);

identity!(
    /// Identity of a [`ComponentDefinition`](crate::ComponentDefinition).
    DefinitionId,
    "definition"
);

identity!(
    /// Identity of a rendered component instance.
    ComponentId,
    "component"
);

identity!(
    /// Identity of a templater, the owner of one render cache namespace.
    TemplaterId,
    "templater"
);
