//! Color schemes
//!
//! A scheme is a bundle of font, color and gutter settings. Scheme files in
//! the themes directory may be partial: applying a scheme merges the fields it
//! sets onto the current scheme and leaves every other field as it was. The
//! current scheme itself is never edited in place; each change produces a new
//! value that replaces the old one.
//!
//! The name of the last selected scheme is kept in `themes/.schemelog` and
//! re-applied at startup.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Deserializer};

use crate::error::{read_json, EditorError, Result};
use crate::syntax::Color;

/// Name of the built-in scheme
pub const DEFAULT_SCHEME: &str = "default";

/// File recording the last applied scheme name
pub const SCHEME_LOG: &str = ".schemelog";

/// Fully specified editor scheme
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorScheme {
    pub font_face: String,
    pub font_size: u16,
    pub background_color: Color,
    pub foreground_color: Color,
    /// Caret color
    pub insertbackground_color: Color,
    pub default_terminal_path: Option<String>,
    /// Gutter background
    pub line_bar_color: Color,
    pub line_number_color: Color,
    pub tab_size: usize,
    pub line_number_font_size: u16,
    pub line_number_bold: bool,
    pub line_number_italic: bool,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            font_face: "Fira Code".to_string(),
            font_size: 14,
            background_color: Color::Rgb(0x1e, 0x1e, 0x1e),
            foreground_color: Color::Rgb(0xc6, 0xc6, 0xc6),
            insertbackground_color: Color::Rgb(0xff, 0xff, 0xff),
            default_terminal_path: None,
            line_bar_color: Color::Rgb(0x3e, 0x3e, 0x3e),
            line_number_color: Color::Rgb(0x5a, 0x5a, 0x5a),
            tab_size: 4,
            line_number_font_size: 11,
            line_number_bold: false,
            line_number_italic: false,
        }
    }
}

impl ColorScheme {
    /// A new scheme with every field `partial` sets taken from it
    pub fn merged(&self, partial: &PartialScheme) -> ColorScheme {
        let mut next = self.clone();
        if let Some(v) = &partial.font_face {
            next.font_face = v.clone();
        }
        if let Some(v) = partial.font_size {
            next.font_size = v;
        }
        if let Some(v) = partial.background_color {
            next.background_color = v;
        }
        if let Some(v) = partial.foreground_color {
            next.foreground_color = v;
        }
        if let Some(v) = partial.insertbackground_color {
            next.insertbackground_color = v;
        }
        if let Some(v) = &partial.default_terminal_path {
            next.default_terminal_path = v.clone();
        }
        if let Some(v) = partial.line_bar_color {
            next.line_bar_color = v;
        }
        if let Some(v) = partial.line_number_color {
            next.line_number_color = v;
        }
        if let Some(v) = partial.tab_size {
            next.tab_size = v;
        }
        if let Some(v) = partial.line_number_font_size {
            next.line_number_font_size = v;
        }
        if let Some(v) = partial.line_number_bold {
            next.line_number_bold = v;
        }
        if let Some(v) = partial.line_number_italic {
            next.line_number_italic = v;
        }
        next
    }

    /// Background for the status bar, slightly lighter than the text area
    pub fn status_bar_color(&self) -> Color {
        self.background_color.shifted(7)
    }
}

/// A scheme file: any subset of the [`ColorScheme`] fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PartialScheme {
    pub font_face: Option<String>,
    pub font_size: Option<u16>,
    pub background_color: Option<Color>,
    pub foreground_color: Option<Color>,
    #[serde(alias = "insert_caret_color")]
    pub insertbackground_color: Option<Color>,
    /// `Some(None)` when the file sets the path to `null`
    #[serde(deserialize_with = "present")]
    pub default_terminal_path: Option<Option<String>>,
    pub line_bar_color: Option<Color>,
    pub line_number_color: Option<Color>,
    pub tab_size: Option<usize>,
    pub line_number_font_size: Option<u16>,
    pub line_number_bold: Option<bool>,
    pub line_number_italic: Option<bool>,
}

/// Distinguish an explicit `null` from an absent field
fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl From<&ColorScheme> for PartialScheme {
    fn from(s: &ColorScheme) -> Self {
        Self {
            font_face: Some(s.font_face.clone()),
            font_size: Some(s.font_size),
            background_color: Some(s.background_color),
            foreground_color: Some(s.foreground_color),
            insertbackground_color: Some(s.insertbackground_color),
            default_terminal_path: Some(s.default_terminal_path.clone()),
            line_bar_color: Some(s.line_bar_color),
            line_number_color: Some(s.line_number_color),
            tab_size: Some(s.tab_size),
            line_number_font_size: Some(s.line_number_font_size),
            line_number_bold: Some(s.line_number_bold),
            line_number_italic: Some(s.line_number_italic),
        }
    }
}

/// Named schemes plus the current one
pub struct SchemeRegistry {
    dir: PathBuf,
    schemes: BTreeMap<String, PartialScheme>,
    current: Arc<ColorScheme>,
    current_name: String,
}

impl SchemeRegistry {
    /// Create a registry holding only the built-in scheme
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let mut schemes = BTreeMap::new();
        schemes.insert(DEFAULT_SCHEME.to_string(), PartialScheme::from(&ColorScheme::default()));
        Self {
            dir: dir.into(),
            schemes,
            current: Arc::new(ColorScheme::default()),
            current_name: DEFAULT_SCHEME.to_string(),
        }
    }

    /// Create a registry and read every `*.json` scheme in `dir`.
    ///
    /// Returns the registry and the files that failed to load.
    pub fn load(dir: impl Into<PathBuf>) -> (Self, Vec<EditorError>) {
        let mut registry = Self::new(dir);
        let errors = registry.reload();
        (registry, errors)
    }

    /// Re-read the themes directory. A file named like an existing scheme
    /// replaces it; malformed files are skipped and returned.
    pub fn reload(&mut self) -> Vec<EditorError> {
        let mut errors = Vec::new();
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                if self.dir.exists() {
                    errors.push(e.into());
                }
                return errors;
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
            .collect();
        paths.sort();

        for path in paths {
            let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            match read_json::<PartialScheme>(&path) {
                Ok(scheme) => {
                    self.schemes.insert(name, scheme);
                }
                Err(e) => {
                    tracing::warn!("skipping scheme file: {}", e);
                    errors.push(e);
                }
            }
        }

        tracing::debug!(count = self.schemes.len(), "loaded color schemes");
        errors
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Scheme names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.schemes.keys().map(String::as_str).collect()
    }

    /// The current scheme
    pub fn current(&self) -> Arc<ColorScheme> {
        Arc::clone(&self.current)
    }

    /// Name of the scheme applied last
    pub fn current_name(&self) -> &str {
        &self.current_name
    }

    /// Merge a named scheme onto the current one.
    ///
    /// Unknown names are an error and leave the current scheme untouched.
    pub fn apply(&mut self, name: &str) -> Result<Arc<ColorScheme>> {
        let partial = self
            .schemes
            .get(name)
            .ok_or_else(|| EditorError::NoSuchScheme(name.to_string()))?;
        self.current = Arc::new(self.current.merged(partial));
        self.current_name = name.to_string();
        tracing::info!(scheme = name, "applied color scheme");
        Ok(self.current())
    }

    /// Apply a scheme and remember it for the next start
    pub fn select(&mut self, name: &str) -> Result<Arc<ColorScheme>> {
        let scheme = self.apply(name)?;
        fs::create_dir_all(&self.dir)?;
        fs::write(self.dir.join(SCHEME_LOG), name)?;
        Ok(scheme)
    }

    /// Name stored in the last-scheme marker, if any
    pub fn last_selected(&self) -> Option<String> {
        fs::read_to_string(self.dir.join(SCHEME_LOG))
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Apply the remembered scheme, falling back to the default one
    pub fn restore_last(&mut self) -> Arc<ColorScheme> {
        if let Some(name) = self.last_selected() {
            match self.apply(&name) {
                Ok(scheme) => return scheme,
                Err(e) => tracing::warn!("cannot restore last scheme: {}", e),
            }
        }
        self.apply(DEFAULT_SCHEME).unwrap_or_else(|_| self.current())
    }
}
