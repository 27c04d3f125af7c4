//! Syntax rule library
//!
//! Rule files live in the extensions directory, one JSON file per language.
//! The manager picks the file whose `scope` covers the open document's
//! extension and keeps a [`Highlighter`] plus the painted [`StyleLayer`]
//! for it.

use std::fs;
use std::path::{Path, PathBuf};

use super::highlighter::{Highlighter, Precedence, RuleDiagnostic, StyleLayer, TextEdit};
use super::rules::RuleFile;
use crate::error::{read_json, Result};

/// Rule files shipped with the editor, written to an empty extensions directory
const BUILTIN_RULE_FILES: &[(&str, &str)] = &[
    ("rust.json", include_str!("../../syntaxes/rust.json")),
    ("python.json", include_str!("../../syntaxes/python.json")),
    ("json.json", include_str!("../../syntaxes/json.json")),
    ("toml.json", include_str!("../../syntaxes/toml.json")),
    ("markdown.json", include_str!("../../syntaxes/markdown.json")),
];

/// A rule file and where it was loaded from
#[derive(Debug, Clone)]
pub struct LoadedRuleFile {
    pub path: PathBuf,
    pub file: RuleFile,
}

/// Coordinates rule-file lookup and highlighting for the open document
pub struct SyntaxManager {
    dir: PathBuf,
    /// Rule files sorted by file name
    files: Vec<LoadedRuleFile>,
    highlighter: Highlighter,
    layer: StyleLayer,
    /// Rule file currently driving the highlighter
    active: Option<PathBuf>,
    /// Whether syntax highlighting is enabled
    pub enabled: bool,
}

impl SyntaxManager {
    /// Create a manager with no rule files
    pub fn new(dir: impl Into<PathBuf>, precedence: Precedence) -> Self {
        Self {
            dir: dir.into(),
            files: Vec::new(),
            highlighter: Highlighter::new(&[], precedence),
            layer: StyleLayer::new(),
            active: None,
            enabled: true,
        }
    }

    /// Create a manager and load every rule file in `dir`.
    ///
    /// Returns the manager and the files that failed to load.
    pub fn load_dir(dir: impl Into<PathBuf>, precedence: Precedence) -> (Self, Vec<crate::error::EditorError>) {
        let mut manager = Self::new(dir, precedence);
        let errors = manager.reload();
        (manager, errors)
    }

    /// Write the built-in rule files if the directory has no rule files yet
    pub fn install_builtins(dir: &Path) -> Result<usize> {
        fs::create_dir_all(dir)?;
        if json_files(dir)?.next().is_some() {
            return Ok(0);
        }
        for (name, contents) in BUILTIN_RULE_FILES {
            fs::write(dir.join(name), contents)?;
        }
        tracing::info!(dir = %dir.display(), count = BUILTIN_RULE_FILES.len(), "installed built-in rule files");
        Ok(BUILTIN_RULE_FILES.len())
    }

    /// Re-read the extensions directory. Malformed files are skipped and
    /// returned; the other files still load.
    pub fn reload(&mut self) -> Vec<crate::error::EditorError> {
        let mut errors = Vec::new();
        self.files.clear();

        let paths = match json_files(&self.dir) {
            Ok(paths) => paths.collect::<Vec<_>>(),
            Err(e) => {
                if self.dir.exists() {
                    errors.push(e);
                }
                Vec::new()
            }
        };

        for path in paths {
            match read_json::<RuleFile>(&path) {
                Ok(file) => self.files.push(LoadedRuleFile { path, file }),
                Err(e) => {
                    tracing::warn!("skipping rule file: {}", e);
                    errors.push(e);
                }
            }
        }

        tracing::debug!(dir = %self.dir.display(), files = self.files.len(), "loaded rule files");
        errors
    }

    /// Directory the rule files are read from
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All loaded rule files
    pub fn files(&self) -> &[LoadedRuleFile] {
        &self.files
    }

    /// Find the rule file covering a document's extension
    pub fn rule_file_for(&self, document: &Path) -> Option<&LoadedRuleFile> {
        let ext = document.extension()?.to_str()?;
        self.files.iter().find(|f| f.file.covers(ext))
    }

    /// Point the highlighter at the rule file for `document`, or at nothing.
    ///
    /// Returns the path of the chosen rule file.
    pub fn select_for(&mut self, document: Option<&Path>) -> Option<&Path> {
        let chosen = document.and_then(|d| self.rule_file_for(d)).cloned();
        match chosen {
            Some(loaded) => {
                self.highlighter.set_rules(&loaded.file.rules);
                tracing::info!(
                    rules = %loaded.path.display(),
                    compiled = self.highlighter.rule_count(),
                    skipped = self.highlighter.diagnostics().len(),
                    "selected syntax rules"
                );
                self.active = Some(loaded.path);
            }
            None => {
                self.highlighter.set_rules(&[]);
                self.active = None;
            }
        }
        self.active.as_deref()
    }

    /// Rule file currently in use
    pub fn active(&self) -> Option<&Path> {
        self.active.as_deref()
    }

    /// Rules of the active file that failed to compile
    pub fn diagnostics(&self) -> &[RuleDiagnostic] {
        self.highlighter.diagnostics()
    }

    /// Full pass over the document (file load, rule change)
    pub fn highlight(&mut self, text: &str) {
        if !self.enabled {
            self.layer.clear(0);
            return;
        }
        self.highlighter.highlight(text);
        self.highlighter.paint(&mut self.layer, text.chars().count());
    }

    /// Re-highlight after a single edit
    pub fn rehighlight(&mut self, text: &str, edit: &TextEdit, incremental: bool) {
        if !self.enabled {
            self.layer.clear(0);
            return;
        }
        if incremental {
            self.highlighter.rehighlight(text, edit);
        } else {
            self.highlighter.highlight(text);
        }
        self.highlighter.paint(&mut self.layer, text.chars().count());
    }

    /// Painted styles for the current document
    pub fn layer(&self) -> &StyleLayer {
        &self.layer
    }

    /// Toggle syntax highlighting on/off
    pub fn toggle(&mut self, text: &str) {
        self.enabled = !self.enabled;
        self.highlighter.invalidate();
        self.highlight(text);
    }
}

/// `*.json` files in `dir`, sorted by name
fn json_files(dir: &Path) -> Result<impl Iterator<Item = PathBuf>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("json"))
        .collect();
    paths.sort();
    Ok(paths.into_iter())
}
