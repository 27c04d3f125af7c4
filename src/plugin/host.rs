//! Plugin discovery, registration and invocation

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::script::ScriptPlugin;
use super::{EditorApi, Plugin, PluginError};

/// Where a plugin came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginSource {
    /// A script file in the plugins directory
    Script(PathBuf),
    /// Registered in-process
    Native,
}

pub struct LoadedPlugin {
    pub name: String,
    pub source: PluginSource,
    pub description: Option<String>,
    pub enabled: bool,
    plugin: Rc<dyn Plugin>,
}

/// Outcome of a directory scan
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: Vec<String>,
    pub errors: Vec<PluginError>,
}

/// Outcome of invoking the enabled plugins
#[derive(Debug, Default)]
pub struct InvokeReport {
    pub ran: Vec<String>,
    pub failed: Vec<(String, PluginError)>,
}

pub struct PluginHost {
    dir: PathBuf,
    /// Discovery order
    plugins: Vec<LoadedPlugin>,
}

impl PluginHost {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            plugins: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn plugins(&self) -> &[LoadedPlugin] {
        &self.plugins
    }

    pub fn get(&self, name: &str) -> Option<&LoadedPlugin> {
        self.plugins.iter().find(|p| p.name == name)
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.get(name).is_some_and(|p| p.enabled)
    }

    /// Scan the plugins directory (creating it if needed) and register every
    /// script with an entry point. Names already registered are skipped.
    pub fn load_all(&mut self) -> LoadReport {
        let mut report = LoadReport::default();

        if let Err(e) = fs::create_dir_all(&self.dir) {
            report.errors.push(PluginError::io(&self.dir, e));
            return report;
        }

        let mut paths: Vec<PathBuf> = match fs::read_dir(&self.dir) {
            Ok(entries) => entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| path.is_file() && is_script(path))
                .collect(),
            Err(e) => {
                report.errors.push(PluginError::io(&self.dir, e));
                return report;
            }
        };
        paths.sort();

        for path in paths {
            let Some(name) = script_name(&path) else {
                continue;
            };
            if self.get(&name).is_some() {
                continue;
            }
            match load_script(&name, &path) {
                Ok(script) => {
                    tracing::info!(plugin = %name, entry = script.entry(), "loaded plugin");
                    self.push_script(script, path);
                    report.loaded.push(name);
                }
                Err(e) => {
                    tracing::warn!("failed to load plugin: {}", e);
                    report.errors.push(e);
                }
            }
        }
        report
    }

    /// Register an in-process plugin
    pub fn register(&mut self, name: &str, plugin: impl Plugin + 'static) -> Result<(), PluginError> {
        if self.get(name).is_some() {
            return Err(PluginError::Duplicate(name.to_string()));
        }
        self.plugins.push(LoadedPlugin {
            name: name.to_string(),
            source: PluginSource::Native,
            description: None,
            enabled: true,
            plugin: Rc::new(plugin),
        });
        tracing::debug!(plugin = %name, "registered native plugin");
        Ok(())
    }

    /// Copy a script into the plugins directory and load it. The script is
    /// checked before anything is copied.
    pub fn install(&mut self, source: &Path) -> Result<&LoadedPlugin, PluginError> {
        if !is_script(source) {
            return Err(PluginError::NotAScript(source.to_path_buf()));
        }
        let name = script_name(source).ok_or_else(|| PluginError::NotAScript(source.to_path_buf()))?;
        if self.get(&name).is_some() {
            return Err(PluginError::Duplicate(name));
        }

        let script = load_script(&name, source)?;
        fs::create_dir_all(&self.dir).map_err(|e| PluginError::io(&self.dir, e))?;
        let target = self.dir.join(format!("{}.toml", name));
        fs::copy(source, &target).map_err(|e| PluginError::io(&target, e))?;

        tracing::info!(plugin = %name, from = %source.display(), "installed plugin");
        self.push_script(script, target);
        Ok(&self.plugins[self.plugins.len() - 1])
    }

    /// Enable or disable a plugin; the cached entry point is kept
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> Result<(), PluginError> {
        let plugin = self
            .plugins
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| PluginError::NotFound(name.to_string()))?;
        plugin.enabled = enabled;
        tracing::info!(plugin = %name, enabled, "plugin state changed");
        Ok(())
    }

    /// Remove a plugin's record and its script file
    pub fn delete(&mut self, name: &str) -> Result<(), PluginError> {
        let index = self
            .plugins
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| PluginError::NotFound(name.to_string()))?;

        if let PluginSource::Script(path) = &self.plugins[index].source {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(PluginError::io(path, e)),
            }
        }
        self.plugins.remove(index);
        tracing::info!(plugin = %name, "deleted plugin");
        Ok(())
    }

    /// Run every enabled plugin once, in discovery order. A failing plugin
    /// is recorded and the others still run.
    pub fn invoke_enabled(&self, api: &mut dyn EditorApi) -> InvokeReport {
        let mut report = InvokeReport::default();
        for loaded in self.plugins.iter().filter(|p| p.enabled) {
            api.begin_plugin(&loaded.name);
            match loaded.plugin.run(api) {
                Ok(()) => report.ran.push(loaded.name.clone()),
                Err(e) => {
                    tracing::error!(plugin = %loaded.name, "plugin failed: {}", e);
                    report.failed.push((loaded.name.clone(), e));
                }
            }
        }
        report
    }

    fn push_script(&mut self, script: ScriptPlugin, path: PathBuf) {
        self.plugins.push(LoadedPlugin {
            name: script.name().to_string(),
            source: PluginSource::Script(path),
            description: script.description().map(str::to_string),
            enabled: true,
            plugin: Rc::new(script),
        });
    }
}

fn is_script(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("toml")
}

fn script_name(path: &Path) -> Option<String> {
    path.file_stem().and_then(|s| s.to_str()).map(str::to_string)
}

fn load_script(name: &str, path: &Path) -> Result<ScriptPlugin, PluginError> {
    let source = fs::read_to_string(path).map_err(|e| PluginError::io(path, e))?;
    ScriptPlugin::parse(name, &source)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::command::KeyTable;
    use crate::document::Document;
    use crate::plugin::{ApiContext, EventQueue, PluginBindings};

    const APPEND_A: &str = "[[run.steps]]\naction = \"insert\"\nat = \"end\"\ntext = \"a\"\n";
    const APPEND_B: &str = "[[run.steps]]\naction = \"insert\"\nat = \"end\"\ntext = \"b\"\n";

    fn run_all(host: &PluginHost, document: &mut Document) -> InvokeReport {
        let keys = KeyTable::with_defaults();
        let mut bindings = PluginBindings::new();
        let mut events = EventQueue::default();
        let mut api = ApiContext {
            document,
            keys: &keys,
            bindings: &mut bindings,
            events: &mut events,
            owner: String::new(),
        };
        host.invoke_enabled(&mut api)
    }

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_creates_dir_and_sorts() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("plugins");
        let mut host = PluginHost::new(&dir);
        assert!(host.load_all().loaded.is_empty());
        assert!(dir.is_dir());

        write(&dir, "b.toml", APPEND_B);
        write(&dir, "a.toml", APPEND_A);
        write(&dir, "notes.txt", "ignored");
        let report = host.load_all();
        assert_eq!(report.loaded, vec!["a", "b"]);

        let mut doc = Document::new();
        let ran = run_all(&host, &mut doc);
        assert_eq!(ran.ran, vec!["a", "b"]);
        assert_eq!(doc.text(), "ab");

        // Rescanning skips what is already registered
        assert!(host.load_all().loaded.is_empty());
        assert_eq!(host.plugins().len(), 2);
    }

    #[test]
    fn test_missing_entry_is_never_registered() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "empty.toml", "[plugin]\ndescription = \"nothing to run\"\n");
        write(tmp.path(), "ok.toml", APPEND_A);
        let mut host = PluginHost::new(tmp.path());
        let report = host.load_all();

        assert_eq!(report.loaded, vec!["ok"]);
        assert_eq!(report.errors.len(), 1);
        assert!(matches!(report.errors[0], PluginError::MissingEntry { .. }));
        assert!(host.get("empty").is_none());
    }

    #[test]
    fn test_disable_and_reenable_uses_cached_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write(tmp.path(), "a.toml", APPEND_A);
        let mut host = PluginHost::new(tmp.path());
        host.load_all();

        host.set_enabled("a", false).unwrap();
        let mut doc = Document::new();
        assert!(run_all(&host, &mut doc).ran.is_empty());
        assert_eq!(doc.text(), "");

        fs::write(&path, "this is no longer toml [").unwrap();
        host.set_enabled("a", true).unwrap();
        run_all(&host, &mut doc);
        assert_eq!(doc.text(), "a");

        fs::remove_file(&path).unwrap();
        run_all(&host, &mut doc);
        assert_eq!(doc.text(), "aa");
        assert!(matches!(host.set_enabled("zzz", true), Err(PluginError::NotFound(_))));
    }

    #[test]
    fn test_delete_removes_record_and_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write(tmp.path(), "a.toml", APPEND_A);
        let mut host = PluginHost::new(tmp.path());
        host.load_all();

        host.delete("a").unwrap();
        assert!(!path.exists());
        assert!(host.plugins().is_empty());
        assert!(host.load_all().loaded.is_empty());
        assert!(matches!(host.delete("a"), Err(PluginError::NotFound(_))));
    }

    #[test]
    fn test_install_copies_and_loads() {
        let tmp = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let source = write(outside.path(), "stamp.toml", APPEND_B);
        let mut host = PluginHost::new(tmp.path().join("plugins"));

        let installed = host.install(&source).unwrap();
        assert_eq!(installed.name, "stamp");
        assert!(tmp.path().join("plugins/stamp.toml").is_file());
        assert!(matches!(host.install(&source), Err(PluginError::Duplicate(_))));

        let bad = write(outside.path(), "bad.toml", "[plugin]\n");
        assert!(host.install(&bad).is_err());
        assert!(!tmp.path().join("plugins/bad.toml").exists());

        let not_script = write(outside.path(), "x.py", "print()");
        assert!(matches!(host.install(&not_script), Err(PluginError::NotAScript(_))));
    }

    #[test]
    fn test_failures_are_contained() {
        let mut host = PluginHost::new("unused");
        let calls = Rc::new(Cell::new(0));

        host.register("broken", |_: &mut dyn EditorApi| -> Result<(), PluginError> {
            Err(PluginError::NotFound("helper".to_string()))
        })
        .unwrap();
        let counter = calls.clone();
        host.register("counter", move |api: &mut dyn EditorApi| -> Result<(), PluginError> {
            counter.set(counter.get() + 1);
            api.insert_text(0, "ok");
            Ok(())
        })
        .unwrap();
        assert!(matches!(
            host.register("counter", |_: &mut dyn EditorApi| -> Result<(), PluginError> { Ok(()) }),
            Err(PluginError::Duplicate(_))
        ));

        let mut doc = Document::new();
        let report = run_all(&host, &mut doc);
        assert_eq!(report.ran, vec!["counter"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "broken");
        assert_eq!(calls.get(), 1);
        assert_eq!(doc.text(), "ok");
    }
}
