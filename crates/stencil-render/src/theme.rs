//! Theme objects passed through to render functions.
//!
//! A [`Theme`] is an opaque, string-keyed map of JSON values. The rendering
//! pipeline never interprets it; it is handed unchanged to components that
//! declare the [`THEME`](crate::Capabilities::THEME) capability.
//!
//! # Construction Methods
//!
//! ## Programmatic (Builder API)
//!
//! ```rust
//! use stencil_render::Theme;
//!
//! let theme = Theme::new()
//!     .insert("accent", "#ff00ff")
//!     .insert("radius", 4);
//!
//! assert_eq!(theme.get("radius"), Some(&serde_json::json!(4)));
//! ```
//!
//! ## From YAML
//!
//! ```rust
//! use stencil_render::Theme;
//!
//! let theme = Theme::from_yaml(r##"
//! accent: "#ff00ff"
//! spacing:
//!   small: 4px
//!   large: 16px
//! "##).unwrap();
//!
//! assert_eq!(theme.len(), 2);
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::load_file;
use crate::error::ConfigError;

/// An opaque collection of named theme values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    /// Set explicitly or taken from the file stem.
    #[serde(skip)]
    name: Option<String>,
    /// File the values were read from; [`Theme::refresh`] re-reads it.
    #[serde(skip)]
    source_path: Option<PathBuf>,
    #[serde(flatten)]
    values: Map<String, Value>,
}

impl Theme {
    /// An empty, unnamed theme.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty theme called `name`.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Renames the theme.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets `key`, replacing any previous value.
    pub fn insert(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Parses a YAML mapping into an unnamed theme.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let values: Map<String, Value> = serde_yaml::from_str(yaml)?;
        Ok(Self::from_values(values))
    }

    /// Parses a JSON object into an unnamed theme.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let values: Map<String, Value> = serde_json::from_str(json)?;
        Ok(Self::from_values(values))
    }

    /// Wraps an existing map as an unnamed theme.
    pub fn from_values(values: Map<String, Value>) -> Self {
        Self {
            values,
            ..Self::default()
        }
    }

    /// Reads a theme file (`.yaml`, `.yml` or `.json`).
    ///
    /// `brand.yaml` yields a theme named `brand`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let values: Map<String, Value> = load_file(path)?;
        let name = path.file_stem().map(|stem| stem.to_string_lossy().into_owned());

        Ok(Self {
            name,
            source_path: Some(path.to_path_buf()),
            values,
        })
    }

    /// Re-reads the values from the file the theme was loaded from.
    ///
    /// Fails with [`ConfigError::NoSource`] for themes built in code.
    pub fn refresh(&mut self) -> Result<(), ConfigError> {
        let path = self.source_path.as_ref().ok_or(ConfigError::NoSource)?;
        self.values = load_file(path)?;
        Ok(())
    }

    /// The theme's name, if it has one.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The file the theme was loaded from, if any.
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Looks up a top-level value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// All top-level values.
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// True when the theme holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of top-level values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Overlays `other` on top of this theme; its keys win.
    pub fn merge(mut self, other: Theme) -> Self {
        self.values.extend(other.values);
        self
    }
}
