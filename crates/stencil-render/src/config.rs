//! Rendering options.
//!
//! [`SsrOptions`] controls naming and emission details of server-side
//! rendering. Options can be built in code or loaded from YAML/JSON:
//!
//! ```rust
//! use stencil_render::SsrOptions;
//!
//! let options = SsrOptions::from_yaml(r#"
//! class_prefix: scoped
//! lang: fr
//! "#).unwrap();
//!
//! assert_eq!(options.class_prefix, "scoped");
//! assert!(options.emit_styles);
//! ```

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Extensions recognized by [`load_file`], in lookup order.
pub const CONFIG_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Options for server-side rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SsrOptions {
    /// Prefix of the scoping identifiers (`<prefix>-<tag>`, `<prefix>-<tag>-<n>`).
    pub class_prefix: String,
    /// Prefix of the placeholder tag name given to definitions without one.
    pub anonymous_tag_prefix: String,
    /// Whether `<style>` nodes are emitted into the output.
    ///
    /// Scoping classes and selector rewriting happen either way.
    pub emit_styles: bool,
    /// Language exposed to components with the `I18N` capability.
    pub lang: String,
}

impl Default for SsrOptions {
    fn default() -> Self {
        Self {
            class_prefix: "css".to_string(),
            anonymous_tag_prefix: "stencil-anonymous".to_string(),
            emit_styles: true,
            lang: "en".to_string(),
        }
    }
}

impl SsrOptions {
    /// Creates default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the scoping identifier prefix.
    pub fn class_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.class_prefix = prefix.into();
        self
    }

    /// Sets the placeholder tag-name prefix.
    pub fn anonymous_tag_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.anonymous_tag_prefix = prefix.into();
        self
    }

    /// Disables `<style>` emission.
    pub fn without_styles(mut self) -> Self {
        self.emit_styles = false;
        self
    }

    /// Sets the language.
    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    /// Parses options from YAML. Missing keys take their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parses options from JSON. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads options from a `.yaml`, `.yml` or `.json` file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        load_file(path.as_ref())
    }
}

/// Reads and deserializes a YAML or JSON file, chosen by extension.
pub(crate) fn load_file<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let is_json = match extension.as_deref() {
        Some("json") => true,
        Some(ext) if CONFIG_EXTENSIONS.contains(&ext) => false,
        _ => {
            return Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    };

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if is_json {
        Ok(serde_json::from_str(&content)?)
    } else {
        Ok(serde_yaml::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = SsrOptions::default();
        assert_eq!(opts.class_prefix, "css");
        assert_eq!(opts.anonymous_tag_prefix, "stencil-anonymous");
        assert!(opts.emit_styles);
        assert_eq!(opts.lang, "en");
    }

    #[test]
    fn test_builder() {
        let opts = SsrOptions::new()
            .class_prefix("s")
            .anonymous_tag_prefix("anon")
            .without_styles()
            .lang("de");
        assert_eq!(opts.class_prefix, "s");
        assert_eq!(opts.anonymous_tag_prefix, "anon");
        assert!(!opts.emit_styles);
        assert_eq!(opts.lang, "de");
    }

    #[test]
    fn test_from_yaml_partial() {
        let opts = SsrOptions::from_yaml("emit_styles: false\n").unwrap();
        assert!(!opts.emit_styles);
        assert_eq!(opts.class_prefix, "css");
    }

    #[test]
    fn test_from_json() {
        let opts = SsrOptions::from_json(r#"{"lang": "ja"}"#).unwrap();
        assert_eq!(opts.lang, "ja");
    }

    #[test]
    fn test_from_yaml_invalid() {
        let result = SsrOptions::from_yaml("emit_styles: [");
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_from_file() {
        use std::fs;
        use tempfile::TempDir;

        let temp_dir = TempDir::new().unwrap();
        let yaml_path = temp_dir.path().join("ssr.yml");
        fs::write(&yaml_path, "class_prefix: scoped\n").unwrap();
        let opts = SsrOptions::from_file(&yaml_path).unwrap();
        assert_eq!(opts.class_prefix, "scoped");

        let json_path = temp_dir.path().join("ssr.json");
        fs::write(&json_path, r#"{"anonymous_tag_prefix": "x"}"#).unwrap();
        let opts = SsrOptions::from_file(&json_path).unwrap();
        assert_eq!(opts.anonymous_tag_prefix, "x");
    }

    #[test]
    fn test_from_file_unsupported_extension() {
        let result = SsrOptions::from_file("options.toml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat { .. })));
    }

    #[test]
    fn test_from_file_not_found() {
        let result = SsrOptions::from_file("/nonexistent/path/ssr.yaml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
