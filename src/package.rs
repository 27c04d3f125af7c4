//! Scheme packages
//!
//! A package bundles a color scheme with optional syntax rule files and
//! plugin scripts:
//!
//! ```json
//! {
//!   "name": "solarized",
//!   "theme": { "background_color": "#002b36", "foreground_color": "#839496" },
//!   "syntaxes": { "python": [ { "scope": ["py"], "rules": [] } ] },
//!   "plugins": ["stamp.toml"]
//! }
//! ```
//!
//! Installing writes `themes/<name>.json`. A syntax block replaces the rule
//! file that has the same scope only when the user confirms; a block whose
//! scope no rule file has yet is written as `extensions/<lang>.json`. Plugin
//! paths are relative to the package file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{read_json, EditorError, Result};
use crate::plugin::{PluginError, PluginHost};
use crate::syntax::{RuleFile, SyntaxManager};
use crate::theme::{PartialScheme, SchemeRegistry};

#[derive(Debug, Deserialize)]
pub struct Package {
    pub name: String,
    /// Kept as written so the installed scheme file matches the package
    pub theme: serde_json::Value,
    #[serde(default)]
    pub syntaxes: BTreeMap<String, Vec<RuleFile>>,
    #[serde(default)]
    pub plugins: Vec<PathBuf>,
}

/// What an installation changed
#[derive(Debug, Default)]
pub struct InstallReport {
    pub scheme: String,
    pub syntaxes_written: Vec<PathBuf>,
    /// Existing rule files the user chose to keep
    pub syntaxes_kept: Vec<PathBuf>,
    pub plugins_installed: Vec<String>,
    pub plugin_errors: Vec<PluginError>,
    /// Files that failed to load when the registries were reloaded
    pub reload_errors: Vec<EditorError>,
}

impl Package {
    /// Read and validate a package file; nothing is written
    pub fn read(path: &Path) -> Result<Self> {
        let package: Package = read_json(path)?;
        if package.name.is_empty()
            || package.name.starts_with('.')
            || package.name.contains(['/', '\\'])
        {
            return Err(EditorError::Message(format!("Invalid scheme name: {:?}", package.name)));
        }
        serde_json::from_value::<PartialScheme>(package.theme.clone()).map_err(|e| EditorError::json(path, e))?;
        Ok(package)
    }
}

/// Install a package. `confirm(rule_file, lang)` is asked before an
/// existing rule file is overwritten.
pub fn install_package(
    path: &Path,
    schemes: &mut SchemeRegistry,
    syntax: &mut SyntaxManager,
    plugins: &mut PluginHost,
    confirm: &mut dyn FnMut(&Path, &str) -> bool,
) -> Result<InstallReport> {
    let package = Package::read(path)?;
    let mut report = InstallReport {
        scheme: package.name.clone(),
        ..InstallReport::default()
    };

    fs::create_dir_all(schemes.dir())?;
    let scheme_file = schemes.dir().join(format!("{}.json", package.name));
    let contents = serde_json::to_string_pretty(&package.theme).map_err(|e| EditorError::json(&scheme_file, e))?;
    fs::write(&scheme_file, contents)?;
    tracing::info!(scheme = %package.name, file = %scheme_file.display(), "installed scheme");

    for (lang, blocks) in &package.syntaxes {
        for block in blocks {
            install_rule_file(syntax, lang, block, confirm, &mut report)?;
        }
    }

    let base = path.parent().unwrap_or(Path::new("."));
    for plugin in &package.plugins {
        let source = base.join(plugin);
        match plugins.install(&source) {
            Ok(loaded) => report.plugins_installed.push(loaded.name.clone()),
            Err(e) => {
                tracing::warn!("package plugin not installed: {}", e);
                report.plugin_errors.push(e);
            }
        }
    }

    report.reload_errors.extend(schemes.reload());
    report.reload_errors.extend(syntax.reload());
    Ok(report)
}

fn same_scope(a: &[String], b: &[String]) -> bool {
    let normalize = |scope: &[String]| {
        let mut v: Vec<String> = scope
            .iter()
            .map(|s| s.trim_start_matches('.').to_ascii_lowercase())
            .collect();
        v.sort();
        v.dedup();
        v
    };
    normalize(a) == normalize(b)
}

fn install_rule_file(
    syntax: &SyntaxManager,
    lang: &str,
    block: &RuleFile,
    confirm: &mut dyn FnMut(&Path, &str) -> bool,
    report: &mut InstallReport,
) -> Result<()> {
    let contents = serde_json::to_string_pretty(block).map_err(|e| EditorError::json(syntax.dir(), e))?;
    let matching: Vec<PathBuf> = syntax
        .files()
        .iter()
        .filter(|f| same_scope(&f.file.scope, &block.scope))
        .map(|f| f.path.clone())
        .collect();

    if matching.is_empty() {
        fs::create_dir_all(syntax.dir())?;
        let target = syntax.dir().join(format!("{}.json", lang));
        if target.exists() && !confirm(&target, lang) {
            report.syntaxes_kept.push(target);
            return Ok(());
        }
        fs::write(&target, &contents)?;
        report.syntaxes_written.push(target);
        return Ok(());
    }

    for file in matching {
        if confirm(&file, lang) {
            fs::write(&file, &contents)?;
            tracing::info!(lang, file = %file.display(), "replaced rule file");
            report.syntaxes_written.push(file);
        } else {
            report.syntaxes_kept.push(file);
        }
    }
    Ok(())
}
