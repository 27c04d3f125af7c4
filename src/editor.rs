//! Editor state and main loop

use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::command::{CommandStatus, KeyTable};
use crate::config::Config;
use crate::display::{Display, View};
use crate::document::Document;
use crate::error::{EditorError, Result};
use crate::input::{InputState, Key};
use crate::package;
use crate::paths::Paths;
use crate::plugin::{ApiContext, EventQueue, KeyAction, Plugin, PluginBindings, PluginHost};
use crate::syntax::SyntaxManager;
use crate::terminal::Terminal;
use crate::theme::{ColorScheme, SchemeRegistry};

/// Rows moved by a page scroll when no terminal is attached
const HEADLESS_PAGE: usize = 20;

pub struct EditorState {
    pub document: Document,
    /// `None` when running headless
    pub terminal: Option<Terminal>,
    pub display: Display,
    pub input: InputState,
    /// Built-in key bindings
    pub keytab: KeyTable,
    /// Key bindings made by plugins
    pub plugin_keys: PluginBindings,
    pub events: EventQueue,
    pub schemes: SchemeRegistry,
    pub syntax: SyntaxManager,
    pub plugins: PluginHost,
    pub config: Config,
    pub running: bool,
    pub prompt: PromptState,
    /// Set after a first quit on a modified document
    pub quit_armed: bool,
}

/// What to do when a prompt completes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptAction {
    None,
    FindFile,
    WriteFile,
    SelectScheme,
    InstallPackage,
    InstallPlugin,
    TogglePlugin,
    DeletePlugin,
}

/// Minibuffer prompt state
#[derive(Debug, Clone)]
pub struct PromptState {
    pub active: bool,
    pub prompt: String,
    pub input: String,
    pub action: PromptAction,
    /// Used when the input is left empty
    pub default: Option<String>,
}

impl Default for PromptState {
    fn default() -> Self {
        Self {
            active: false,
            prompt: String::new(),
            input: String::new(),
            action: PromptAction::None,
            default: None,
        }
    }
}

impl EditorState {
    /// Load schemes and syntax rules from `paths`. No terminal is attached
    /// and no plugins are loaded yet.
    pub fn new(paths: &Paths, config: Config) -> Self {
        let (mut schemes, mut errors) = SchemeRegistry::load(paths.themes());
        schemes.restore_last();

        if let Err(e) = SyntaxManager::install_builtins(&paths.extensions()) {
            errors.push(e);
        }
        let (syntax, syntax_errors) = SyntaxManager::load_dir(paths.extensions(), config.precedence);
        errors.extend(syntax_errors);

        let mut editor = Self {
            document: Document::new(),
            terminal: None,
            display: Display::new(config.line_numbers),
            input: InputState::new(),
            keytab: KeyTable::with_defaults(),
            plugin_keys: PluginBindings::new(),
            events: EventQueue::default(),
            schemes,
            syntax,
            plugins: PluginHost::new(paths.plugins()),
            config,
            running: true,
            prompt: PromptState::default(),
            quit_armed: false,
        };
        editor.report_errors(&errors);
        editor
    }

    pub fn attach(&mut self, terminal: Terminal) {
        self.terminal = Some(terminal);
        self.display.force_redraw();
    }

    /// Put the first of `errors` on the message line
    fn report_errors(&mut self, errors: &[EditorError]) {
        match errors {
            [] => {}
            [only] => self.display.set_message(only.to_string()),
            [first, rest @ ..] => self
                .display
                .set_message(format!("{} (and {} more, see log)", first, rest.len())),
        }
    }

    /// Load the plugins directory and run every enabled plugin once
    pub fn start_plugins(&mut self) {
        let loaded = self.plugins.load_all();
        for name in &self.config.disabled_plugins {
            if let Err(e) = self.plugins.set_enabled(name, false) {
                tracing::debug!("disabled_plugins: {}", e);
            }
        }

        let mut api = ApiContext {
            document: &mut self.document,
            keys: &self.keytab,
            bindings: &mut self.plugin_keys,
            events: &mut self.events,
            owner: String::new(),
        };
        let invoked = self.plugins.invoke_enabled(&mut api);
        self.after_edit();

        tracing::info!(
            loaded = loaded.loaded.len(),
            load_errors = loaded.errors.len(),
            ran = invoked.ran.len(),
            failed = invoked.failed.len(),
            "plugins started"
        );
        if let Some((name, e)) = invoked.failed.first() {
            self.display.set_message(format!("Plugin {} failed: {}", name, e));
        } else if let Some(e) = loaded.errors.first() {
            self.display.set_message(e.to_string());
        }
    }

    /// Replace the document and highlight it from scratch
    fn install_document(&mut self, mut document: Document) {
        document.take_edit();
        self.document = document;
        self.syntax.select_for(self.document.path());
        self.syntax.highlight(self.document.text());
        self.display.force_redraw();
    }

    /// Open `path`. On error the current document is kept.
    pub fn open_file(&mut self, path: &Path) -> Result<()> {
        let document = Document::open(path)?;
        self.install_document(document);
        self.events.post("open_file", &path.to_string_lossy());
        Ok(())
    }

    /// Start an empty document, optionally bound to a file name
    pub fn new_document(&mut self, path: Option<&Path>) {
        let document = match path {
            Some(path) => Document::with_path(path),
            None => Document::new(),
        };
        self.install_document(document);
    }

    /// Save to the document's path; prompts for one if it has none
    pub fn save(&mut self) -> Result<CommandStatus> {
        if self.document.path().is_none() {
            self.start_prompt("Write file", PromptAction::WriteFile, None);
            return Ok(CommandStatus::Success);
        }
        self.document.save()?;
        self.report_saved();
        Ok(CommandStatus::Success)
    }

    pub fn save_as(&mut self, path: &Path) -> Result<()> {
        self.document.save_as(path)?;
        self.syntax.select_for(Some(path));
        self.syntax.highlight(self.document.text());
        self.report_saved();
        Ok(())
    }

    fn report_saved(&mut self) {
        if let Some(path) = self.document.path() {
            let msg = format!("Wrote {}", path.display());
            self.display.set_message(msg);
        }
    }

    /// Re-highlight whatever changed since the last call
    pub fn after_edit(&mut self) {
        if let Some(edit) = self.document.take_edit() {
            self.syntax
                .rehighlight(self.document.text(), &edit, self.config.incremental);
        }
    }

    pub fn toggle_syntax(&mut self) {
        self.syntax.toggle(self.document.text());
        let state = if self.syntax.enabled { "on" } else { "off" };
        self.display.set_message(format!("Syntax highlighting {}", state));
    }

    pub fn select_scheme(&mut self, name: &str) {
        match self.schemes.select(name) {
            Ok(_) => {
                self.display.set_message(format!("Scheme: {}", name));
                self.display.force_redraw();
            }
            Err(e) => self.display.set_message(e.to_string()),
        }
    }

    /// Install a scheme package and switch to its scheme
    pub fn install_package(&mut self, path: &Path) {
        let scheme = self.schemes.current();
        let terminal = &mut self.terminal;
        let display = &mut self.display;
        let result = package::install_package(
            path,
            &mut self.schemes,
            &mut self.syntax,
            &mut self.plugins,
            &mut |file: &Path, lang: &str| {
                let question = format!("Replace {} rules in {}? (y/n)", lang, file.display());
                ask_yes_no(terminal, display, &scheme, &question)
            },
        );

        match result {
            Ok(report) => {
                for e in &report.reload_errors {
                    tracing::warn!("after package install: {}", e);
                }
                self.syntax.select_for(self.document.path());
                self.syntax.highlight(self.document.text());
                self.select_scheme(&report.scheme);
                let mut msg = format!(
                    "Installed {}: {} rule file(s) written, {} kept, {} plugin(s)",
                    report.scheme,
                    report.syntaxes_written.len(),
                    report.syntaxes_kept.len(),
                    report.plugins_installed.len()
                );
                if let Some(e) = report.plugin_errors.first() {
                    msg.push_str(&format!("; {}", e));
                }
                self.display.set_message(msg);
            }
            Err(e) => {
                tracing::warn!("package install failed: {}", e);
                self.display.set_message(e.to_string());
            }
        }
    }

    /// Copy a script into the plugins directory; it runs from the next start
    pub fn install_plugin(&mut self, path: &Path) -> Result<()> {
        let loaded = self.plugins.install(path)?;
        let msg = format!("Installed plugin {}", loaded.name);
        self.display.set_message(msg);
        Ok(())
    }

    pub fn toggle_plugin(&mut self, name: &str) -> Result<()> {
        let enabled = !self.plugins.is_enabled(name);
        self.plugins.set_enabled(name, enabled)?;
        let state = if enabled { "enabled" } else { "disabled" };
        self.display.set_message(format!("Plugin {} {}", name, state));
        Ok(())
    }

    pub fn delete_plugin(&mut self, name: &str) -> Result<()> {
        self.plugins.delete(name)?;
        self.plugin_keys.remove_owner(name);
        self.display.set_message(format!("Deleted plugin {}", name));
        Ok(())
    }

    pub fn list_plugins(&mut self) {
        let names: Vec<String> = self
            .plugins
            .plugins()
            .iter()
            .map(|p| {
                if p.enabled {
                    p.name.clone()
                } else {
                    format!("{} (off)", p.name)
                }
            })
            .collect();
        if names.is_empty() {
            self.display.set_message("No plugins");
        } else {
            self.display.set_message(format!("Plugins: {}", names.join(", ")));
        }
    }

    /// Ask to quit; a modified document needs the request twice in a row
    pub fn request_quit(&mut self) -> CommandStatus {
        if self.document.is_modified() && !self.quit_armed {
            self.quit_armed = true;
            self.display
                .set_message("Modified buffer; C-x C-c again to quit");
            return CommandStatus::Failure;
        }
        self.running = false;
        CommandStatus::Success
    }

    /// Rows moved by a page scroll
    pub fn page_rows(&self) -> usize {
        match &self.terminal {
            Some(terminal) => (terminal.rows() as usize).saturating_sub(3).max(1),
            None => HEADLESS_PAGE,
        }
    }

    fn beep(&mut self) -> Result<()> {
        if let Some(terminal) = self.terminal.as_mut() {
            terminal.beep()?;
        }
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let Some(terminal) = self.terminal.as_mut() else {
            return Ok(());
        };
        let scheme = self.schemes.current();
        let view = View {
            document: &self.document,
            layer: self.syntax.layer(),
            scheme: &scheme,
        };
        self.display.render(terminal, &view)
    }

    /// Run the main editor loop
    pub fn run(&mut self) -> Result<()> {
        self.display.force_redraw();

        while self.running {
            self.render()?;

            let Some(terminal) = self.terminal.as_mut() else {
                return Ok(());
            };
            let Some(event) = terminal.read_key()? else {
                self.display.force_redraw();
                continue;
            };

            if let Some(key) = self.input.translate_key(event) {
                self.handle_key(key)?;
            } else if let Some(prefix) = self.input.pending_prefix() {
                self.display.set_message(format!("{} -", prefix));
            }
        }

        Ok(())
    }

    /// Handle a key press
    pub fn handle_key(&mut self, key: Key) -> Result<()> {
        if self.prompt.active {
            return self.handle_prompt_key(key);
        }

        self.display.clear_message();
        if self.keytab.lookup_name(key) != Some("save-buffers-kill-editor") {
            self.quit_armed = false;
        }

        if let Some(cmd) = self.keytab.lookup(key) {
            match cmd(self)? {
                CommandStatus::Success => {}
                CommandStatus::Failure => self.beep()?,
                CommandStatus::Abort => {
                    self.display.set_message("Quit");
                    self.beep()?;
                }
            }
        } else if let Some((owner, action)) = self.plugin_action(key) {
            self.run_plugin_action(&owner, action);
        } else if let Some(ch) = key.self_insert() {
            self.document.insert_at_cursor(ch.encode_utf8(&mut [0; 4]));
        } else {
            self.beep()?;
            self.display.set_message("Key not bound");
        }

        self.after_edit();
        Ok(())
    }

    /// Plugin binding for `key`, if its owner is enabled
    fn plugin_action(&self, key: Key) -> Option<(String, KeyAction)> {
        let binding = self.plugin_keys.get(key)?;
        if !self.plugins.is_enabled(&binding.owner) {
            return None;
        }
        Some((binding.owner.clone(), Rc::clone(&binding.action)))
    }

    fn run_plugin_action(&mut self, owner: &str, action: KeyAction) {
        let mut api = ApiContext {
            document: &mut self.document,
            keys: &self.keytab,
            bindings: &mut self.plugin_keys,
            events: &mut self.events,
            owner: owner.to_string(),
        };
        if let Err(e) = action.run(&mut api) {
            tracing::error!(plugin = %owner, "key action failed: {}", e);
            self.display.set_message(format!("Plugin {}: {}", owner, e));
        }
    }

    /// Start a minibuffer prompt
    pub fn start_prompt(&mut self, prompt: &str, action: PromptAction, default: Option<String>) {
        self.prompt.active = true;
        self.prompt.prompt = prompt.to_string();
        self.prompt.input.clear();
        self.prompt.action = action;
        self.prompt.default = default;
        self.update_prompt_display();
    }

    fn update_prompt_display(&mut self) {
        let display = match &self.prompt.default {
            Some(def) if self.prompt.input.is_empty() => format!("{} (default {}): ", self.prompt.prompt, def),
            _ => format!("{}: {}", self.prompt.prompt, self.prompt.input),
        };
        self.display.set_message(display);
    }

    fn handle_prompt_key(&mut self, key: Key) -> Result<()> {
        if key == Key::ctrl('g') {
            self.prompt.active = false;
            self.prompt.action = PromptAction::None;
            self.display.set_message("Quit");
            return Ok(());
        }

        if key == Key::enter() {
            let input = if self.prompt.input.is_empty() {
                self.prompt.default.clone().unwrap_or_default()
            } else {
                self.prompt.input.clone()
            };
            let action = self.prompt.action;
            self.prompt.active = false;
            self.prompt.action = PromptAction::None;
            self.display.clear_message();
            self.complete_prompt(action, input.trim());
            return Ok(());
        }

        if key == Key::backspace() || key == Key::ctrl('h') {
            self.prompt.input.pop();
            self.update_prompt_display();
            return Ok(());
        }

        if let Some(ch) = key.self_insert() {
            self.prompt.input.push(ch);
            self.update_prompt_display();
            return Ok(());
        }

        self.beep()
    }

    fn complete_prompt(&mut self, action: PromptAction, input: &str) {
        if input.is_empty() {
            if action != PromptAction::None {
                self.display.set_message("Nothing entered");
            }
            return;
        }
        let path = PathBuf::from(input);

        match action {
            PromptAction::FindFile => {
                if let Err(e) = self.open_file(&path) {
                    tracing::warn!("open failed: {}", e);
                    self.display.set_message(e.to_string());
                }
            }
            PromptAction::WriteFile => {
                if let Err(e) = self.save_as(&path) {
                    tracing::warn!("save failed: {}", e);
                    self.display.set_message(e.to_string());
                }
            }
            PromptAction::SelectScheme => self.select_scheme(input),
            PromptAction::InstallPackage => self.install_package(&path),
            PromptAction::InstallPlugin => {
                let result = self.install_plugin(&path);
                self.report_failure(result);
            }
            PromptAction::TogglePlugin => {
                let result = self.toggle_plugin(input);
                self.report_failure(result);
            }
            PromptAction::DeletePlugin => {
                let result = self.delete_plugin(input);
                self.report_failure(result);
            }
            PromptAction::None => {}
        }
    }

    fn report_failure(&mut self, result: Result<()>) {
        if let Err(e) = result {
            tracing::warn!("{}", e);
            self.display.set_message(e.to_string());
        }
    }
}

/// Ask a yes/no question on the message line. Without a terminal the answer
/// is no.
fn ask_yes_no(
    terminal: &mut Option<Terminal>,
    display: &mut Display,
    scheme: &ColorScheme,
    question: &str,
) -> bool {
    let Some(terminal) = terminal.as_mut() else {
        return false;
    };
    display.set_message(question);
    let mut input = InputState::new();

    loop {
        if let Err(e) = display.render_message(terminal, scheme) {
            tracing::warn!("cannot show question: {}", e);
            return false;
        }
        let event = match terminal.read_key() {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!("cannot read answer: {}", e);
                return false;
            }
        };
        match input.translate_key(event) {
            Some(key) if key == Key::char('y') || key == Key::char('Y') => return true,
            Some(key) if key == Key::char('n') || key == Key::char('N') || key == Key::ctrl('g') => {
                return false
            }
            _ => input.reset(),
        }
    }
}
