//! Configuration file support
//!
//! Settings live in `<home>/config.toml`. Every key is optional:
//!
//! ```toml
//! line_numbers = true
//! precedence = "highest-priority"   # or "last-applied"
//! incremental = true
//! plugins_enabled = true
//! disabled_plugins = ["noisy"]
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{EditorError, Result};
use crate::syntax::Precedence;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Show the line-number gutter
    pub line_numbers: bool,
    /// Which rule wins where highlight spans overlap
    pub precedence: Precedence,
    /// Re-highlight only the edited lines after each edit
    pub incremental: bool,
    /// Load and invoke plugins at startup
    pub plugins_enabled: bool,
    /// Plugins loaded but not invoked
    pub disabled_plugins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            line_numbers: true,
            precedence: Precedence::default(),
            incremental: true,
            plugins_enabled: true,
            disabled_plugins: Vec::new(),
        }
    }
}

impl Config {
    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load the config file. A missing file gives the defaults; a malformed
    /// one gives the defaults plus the error.
    pub fn load(path: &Path) -> (Self, Option<EditorError>) {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return (Self::default(), None),
            Err(e) => return (Self::default(), Some(e.into())),
        };
        match Self::parse(&contents) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "loaded config");
                (config, None)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "ignoring malformed config: {}", e);
                (Self::default(), Some(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let config = Config::parse(
            r#"
            # Comment
            line_numbers = false
            precedence = "highest-priority"
            disabled_plugins = ["a", "b"]
            "#,
        )
        .unwrap();

        assert!(!config.line_numbers);
        assert_eq!(config.precedence, Precedence::HighestPriority);
        assert!(config.incremental);
        assert!(config.plugins_enabled);
        assert_eq!(config.disabled_plugins, vec!["a", "b"]);
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
        assert_eq!(Config::default().precedence, Precedence::LastApplied);
    }

    #[test]
    fn test_bad_values_rejected() {
        assert!(Config::parse("precedence = \"loudest\"").is_err());
        assert!(Config::parse("line_numbers = \"yes\"").is_err());
    }

    #[test]
    fn test_load_missing_and_malformed() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");

        let (config, err) = Config::load(&path);
        assert_eq!(config, Config::default());
        assert!(err.is_none());

        fs::write(&path, "incremental = [").unwrap();
        let (config, err) = Config::load(&path);
        assert_eq!(config, Config::default());
        assert!(matches!(err, Some(EditorError::Config(_))));

        fs::write(&path, "incremental = false").unwrap();
        let (config, err) = Config::load(&path);
        assert!(!config.incremental);
        assert!(err.is_none());
    }
}
