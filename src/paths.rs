//! Locations of the editor's home directory and its subdirectories
//!
//! ```text
//! <home>/
//!   config.toml
//!   themes/        scheme files and the .schemelog marker
//!   extensions/    syntax rule files
//!   plugins/       plugin scripts
//!   logs/          daily log files
//! ```

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{EditorError, Result};

const APP_DIR: &str = "gvim";

/// Environment variable overriding the home directory
pub const HOME_ENV: &str = "GVIM_HOME";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    home: PathBuf,
}

impl Paths {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    /// `--home` wins, then `$GVIM_HOME`, then the platform config directory
    pub fn resolve(explicit: Option<PathBuf>) -> Result<Self> {
        Self::resolve_from(explicit, env::var_os(HOME_ENV), dirs::config_dir())
    }

    fn resolve_from(
        explicit: Option<PathBuf>,
        from_env: Option<OsString>,
        config_dir: Option<PathBuf>,
    ) -> Result<Self> {
        explicit
            .or_else(|| from_env.filter(|v| !v.is_empty()).map(PathBuf::from))
            .or_else(|| config_dir.map(|dir| dir.join(APP_DIR)))
            .map(Self::new)
            .ok_or(EditorError::NoHome)
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn config_file(&self) -> PathBuf {
        self.home.join("config.toml")
    }

    pub fn themes(&self) -> PathBuf {
        self.home.join("themes")
    }

    pub fn extensions(&self) -> PathBuf {
        self.home.join("extensions")
    }

    pub fn plugins(&self) -> PathBuf {
        self.home.join("plugins")
    }

    pub fn logs(&self) -> PathBuf {
        self.home.join("logs")
    }

    /// Create the home directory and every subdirectory
    pub fn ensure(&self) -> Result<()> {
        for dir in [self.themes(), self.extensions(), self.plugins(), self.logs()] {
            fs::create_dir_all(&dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_order() {
        let explicit = Paths::resolve_from(
            Some(PathBuf::from("/a")),
            Some(OsString::from("/b")),
            Some(PathBuf::from("/c")),
        )
        .unwrap();
        assert_eq!(explicit.home(), Path::new("/a"));

        let from_env = Paths::resolve_from(None, Some(OsString::from("/b")), Some(PathBuf::from("/c"))).unwrap();
        assert_eq!(from_env.home(), Path::new("/b"));

        let fallback = Paths::resolve_from(None, Some(OsString::new()), Some(PathBuf::from("/c"))).unwrap();
        assert_eq!(fallback.home(), Path::new("/c/gvim"));

        assert!(matches!(Paths::resolve_from(None, None, None), Err(EditorError::NoHome)));
    }

    #[test]
    fn test_ensure_creates_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = Paths::new(tmp.path().join("home"));
        paths.ensure().unwrap();
        assert!(paths.themes().is_dir());
        assert!(paths.extensions().is_dir());
        assert!(paths.plugins().is_dir());
        assert!(paths.logs().is_dir());
        assert_eq!(paths.config_file(), tmp.path().join("home/config.toml"));
    }
}
