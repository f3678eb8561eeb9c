//! Change reasons and change masks.
//!
//! A [`Change`] value plays two roles. As a *reason* it describes which input
//! categories changed since the last render. As a *mask* it declares which
//! categories a template reacts to. A cached render is reused when the reason
//! does not intersect the mask.
//!
//! ```rust
//! use stencil_render::Change;
//!
//! let mask = Change::PROP;
//! assert!(!Change::THEME.intersects(mask));
//! assert!(Change::FORCE.intersects(mask));
//! ```

bitflags::bitflags! {
    /// Bitmask of input categories.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Change: u8 {
        /// Component properties or attributes.
        const PROP = 1 << 0;
        /// The resolved theme.
        const THEME = 1 << 1;
        /// The active language.
        const LANG = 1 << 2;
        /// Compute once, never recompute.
        const NEVER = 1 << 3;
        /// Every regular input category.
        const ALWAYS = Self::PROP.bits() | Self::THEME.bits() | Self::LANG.bits();
        /// Render everything.
        const FORCE = Self::ALWAYS.bits() | Self::NEVER.bits();
    }
}

/// A [`Change`] used as a template's reactivity mask.
pub type ChangeMask = Change;

/// A [`Change`] used as the reason for a render request.
pub type ChangeReason = Change;

impl Change {
    /// Returns true for masks that compute once and are then reused forever.
    ///
    /// Only `NEVER` itself qualifies; composites such as `FORCE` or
    /// `PROP | NEVER` still recompute when the reason intersects them. The
    /// empty mask reacts to nothing, so it behaves like `NEVER`.
    pub fn is_never(self) -> bool {
        self.is_empty() || self == Change::NEVER
    }

    /// Returns true when a stylesheet with this mask is shared by every
    /// instance of a definition (theme-only or never-masked).
    pub fn is_global_style(self) -> bool {
        self == Change::THEME || self.is_never()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composites() {
        assert!(Change::ALWAYS.contains(Change::PROP | Change::THEME | Change::LANG));
        assert!(!Change::ALWAYS.contains(Change::NEVER));
        assert_eq!(Change::FORCE, Change::all());
    }

    #[test]
    fn test_is_never() {
        assert!(Change::NEVER.is_never());
        assert!(Change::empty().is_never());
        assert!(!Change::PROP.is_never());
        assert!(!(Change::NEVER | Change::PROP).is_never());
        assert!(!Change::FORCE.is_never());
    }

    #[test]
    fn test_global_style_classification() {
        assert!(Change::THEME.is_global_style());
        assert!(Change::NEVER.is_global_style());
        assert!(!Change::PROP.is_global_style());
        assert!(!(Change::THEME | Change::PROP).is_global_style());
        assert!(!Change::ALWAYS.is_global_style());
        assert!(!Change::FORCE.is_global_style());
        assert!(!(Change::PROP | Change::NEVER).is_global_style());
        assert!(!(Change::THEME | Change::NEVER).is_global_style());
    }
}
