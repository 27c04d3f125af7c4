//! Declarative plugin scripts
//!
//! ```toml
//! [plugin]
//! entry = "run"            # optional, defaults to "run"
//! description = "Stamp a header"
//!
//! [[run.steps]]
//! action = "insert"
//! at = "start"
//! text = "// generated\n"
//!
//! [[run.steps]]
//! action = "bind-key"
//! key = "C-x u"
//!
//! [[run.steps.steps]]
//! action = "transform-selection"
//! case = "upper"
//! ```
//!
//! The script is parsed and compiled once when it is loaded. Running it
//! never touches the file again.

use std::rc::Rc;

use regex::Regex;
use serde::Deserialize;

use super::{EditorApi, Plugin, PluginError};
use crate::input::Key;

/// Entry table used when `[plugin] entry` is not given
pub const DEFAULT_ENTRY: &str = "run";

/// A step as written in a script
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Step {
    Insert {
        #[serde(default)]
        at: Position,
        text: String,
    },
    SetText {
        text: String,
    },
    ReplaceSelection {
        text: String,
    },
    TransformSelection {
        case: Case,
    },
    ReplaceAll {
        pattern: String,
        #[serde(default)]
        with: String,
    },
    SetCursor {
        at: Position,
    },
    BindKey {
        key: String,
        #[serde(default)]
        steps: Vec<Step>,
    },
    Event {
        name: String,
        #[serde(default)]
        value: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Position {
    Offset(usize),
    Named(Anchor),
}

impl Default for Position {
    fn default() -> Self {
        Position::Named(Anchor::Cursor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Cursor,
    Start,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Case {
    Upper,
    Lower,
}

#[derive(Deserialize)]
struct Header {
    entry: Option<String>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct EntryTable {
    steps: Vec<Step>,
}

/// A step with its key parsed and its pattern compiled
#[derive(Debug, Clone)]
enum Op {
    Insert(Position, String),
    SetText(String),
    ReplaceSelection(String),
    Transform(Case),
    ReplaceAll(Regex, String),
    SetCursor(Position),
    BindKey(Key, Rc<Ops>),
    Event(String, String),
}

/// A compiled step list; also what a script key binding runs
#[derive(Debug, Clone)]
struct Ops {
    plugin: String,
    ops: Vec<Op>,
}

impl Ops {
    fn compile(plugin: &str, steps: &[Step]) -> Result<Self, PluginError> {
        let bad = |message: String| PluginError::BadEntry {
            name: plugin.to_string(),
            message,
        };
        let ops = steps
            .iter()
            .map(|step| {
                Ok(match step {
                    Step::Insert { at, text } => Op::Insert(*at, text.clone()),
                    Step::SetText { text } => Op::SetText(text.clone()),
                    Step::ReplaceSelection { text } => Op::ReplaceSelection(text.clone()),
                    Step::TransformSelection { case } => Op::Transform(*case),
                    Step::ReplaceAll { pattern, with } => {
                        let regex = Regex::new(pattern).map_err(|e| bad(format!("replace-all pattern: {}", e)))?;
                        Op::ReplaceAll(regex, with.clone())
                    }
                    Step::SetCursor { at } => Op::SetCursor(*at),
                    Step::BindKey { key, steps } => {
                        let key = Key::parse(key).ok_or_else(|| bad(format!("invalid key `{}`", key)))?;
                        Op::BindKey(key, Rc::new(Ops::compile(plugin, steps)?))
                    }
                    Step::Event { name, value } => Op::Event(name.clone(), value.clone()),
                })
            })
            .collect::<Result<Vec<_>, PluginError>>()?;
        Ok(Self {
            plugin: plugin.to_string(),
            ops,
        })
    }
}

fn resolve(api: &dyn EditorApi, at: Position) -> usize {
    match at {
        Position::Offset(n) => n,
        Position::Named(Anchor::Cursor) => api.cursor(),
        Position::Named(Anchor::Start) => 0,
        Position::Named(Anchor::End) => api.text().chars().count(),
    }
}

impl Plugin for Ops {
    fn run(&self, api: &mut dyn EditorApi) -> Result<(), PluginError> {
        for op in &self.ops {
            match op {
                Op::Insert(at, text) => {
                    let pos = resolve(api, *at);
                    api.insert_text(pos, text);
                }
                Op::SetText(text) => api.set_text(text),
                Op::ReplaceSelection(text) => api.replace_selection(text),
                Op::Transform(case) => {
                    let selected = api.selection();
                    if !selected.is_empty() {
                        let changed = match case {
                            Case::Upper => selected.to_uppercase(),
                            Case::Lower => selected.to_lowercase(),
                        };
                        api.replace_selection(&changed);
                    }
                }
                Op::ReplaceAll(regex, with) => {
                    let text = api.text();
                    let replaced = regex.replace_all(&text, with.as_str());
                    if replaced != text {
                        api.set_text(&replaced);
                    }
                }
                Op::SetCursor(at) => {
                    let pos = resolve(api, *at);
                    api.set_cursor(pos);
                }
                Op::BindKey(key, ops) => {
                    if !api.bind_key(*key, ops.clone()) {
                        tracing::info!(plugin = %self.plugin, key = %key, "bind-key skipped");
                    }
                }
                Op::Event(name, value) => api.post_event(name, value),
            }
        }
        Ok(())
    }
}

/// A loaded TOML script plugin
#[derive(Debug, Clone)]
pub struct ScriptPlugin {
    name: String,
    entry: String,
    description: Option<String>,
    ops: Ops,
}

impl ScriptPlugin {
    /// Parse and compile a script. A script whose entry table is missing is
    /// [`PluginError::MissingEntry`].
    pub fn parse(name: &str, source: &str) -> Result<Self, PluginError> {
        let mut table: toml::Table = toml::from_str(source).map_err(|source| PluginError::Parse {
            name: name.to_string(),
            source,
        })?;

        let bad = |message: String| PluginError::BadEntry {
            name: name.to_string(),
            message,
        };

        let header = match table.remove("plugin") {
            Some(value) => value
                .try_into::<Header>()
                .map_err(|e| bad(format!("[plugin] table: {}", e)))?,
            None => Header {
                entry: None,
                description: None,
            },
        };
        let entry = header.entry.unwrap_or_else(|| DEFAULT_ENTRY.to_string());

        let entry_value = table.remove(&entry).ok_or_else(|| PluginError::MissingEntry {
            name: name.to_string(),
            entry: entry.clone(),
        })?;
        let entry_table: EntryTable = entry_value
            .try_into()
            .map_err(|e| bad(format!("[{}] table: {}", entry, e)))?;

        Ok(Self {
            name: name.to_string(),
            ops: Ops::compile(name, &entry_table.steps)?,
            entry,
            description: header.description,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl Plugin for ScriptPlugin {
    fn run(&self, api: &mut dyn EditorApi) -> Result<(), PluginError> {
        self.ops.run(api)
    }
}
