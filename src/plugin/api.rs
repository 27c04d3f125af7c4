//! The capability object plugins receive

use std::collections::{BTreeMap, VecDeque};
use std::path::PathBuf;
use std::rc::Rc;

use super::Plugin;
use crate::command::KeyTable;
use crate::document::Document;
use crate::input::Key;

/// What a plugin key binding runs
pub type KeyAction = Rc<dyn Plugin>;

/// Everything a plugin may do to the editor. Positions are character
/// offsets and are clamped to the text.
pub trait EditorApi {
    fn text(&self) -> String;
    fn set_text(&mut self, text: &str);
    fn insert_text(&mut self, pos: usize, text: &str);
    /// Selected text, empty when nothing is selected
    fn selection(&self) -> String;
    /// Replace the selection; does nothing when nothing is selected
    fn replace_selection(&mut self, text: &str);
    fn cursor(&self) -> usize;
    fn set_cursor(&mut self, pos: usize);
    /// Bind a key to an action. Returns false when a built-in command owns
    /// the key; the binding is not made.
    fn bind_key(&mut self, key: Key, action: KeyAction) -> bool;
    fn file_path(&self) -> Option<PathBuf>;
    fn post_event(&mut self, name: &str, value: &str);
    fn pop_event(&mut self) -> Option<Event>;

    /// Called by the host before running the named plugin
    fn begin_plugin(&mut self, _name: &str) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub name: String,
    pub value: String,
}

/// Bounded FIFO of editor events; the oldest event is dropped when full
#[derive(Debug)]
pub struct EventQueue {
    events: VecDeque<Event>,
    capacity: usize,
}

impl EventQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn post(&mut self, name: &str, value: &str) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(Event {
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    pub fn pop(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new(64)
    }
}

/// A key bound by a plugin
pub struct PluginBinding {
    pub owner: String,
    pub action: KeyAction,
}

/// Key bindings made by plugins, kept apart from the built-in table
#[derive(Default)]
pub struct PluginBindings {
    map: BTreeMap<Key, PluginBinding>,
}

impl PluginBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, key: Key, owner: &str, action: KeyAction) {
        self.map.insert(
            key,
            PluginBinding {
                owner: owner.to_string(),
                action,
            },
        );
    }

    pub fn get(&self, key: Key) -> Option<&PluginBinding> {
        self.map.get(&key)
    }

    /// Drop every binding a plugin made
    pub fn remove_owner(&mut self, owner: &str) {
        self.map.retain(|_, b| b.owner != owner);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Key, &PluginBinding)> {
        self.map.iter().map(|(k, b)| (*k, b))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// [`EditorApi`] over the editor's document, key tables and event queue
pub struct ApiContext<'a> {
    pub document: &'a mut Document,
    pub keys: &'a KeyTable,
    pub bindings: &'a mut PluginBindings,
    pub events: &'a mut EventQueue,
    /// Plugin on whose behalf calls are made
    pub owner: String,
}

impl EditorApi for ApiContext<'_> {
    fn text(&self) -> String {
        self.document.text().to_string()
    }

    fn set_text(&mut self, text: &str) {
        self.document.set_text(text);
    }

    fn insert_text(&mut self, pos: usize, text: &str) {
        self.document.insert(pos, text);
    }

    fn selection(&self) -> String {
        self.document.selection()
    }

    fn replace_selection(&mut self, text: &str) {
        self.document.replace_selection(text);
    }

    fn cursor(&self) -> usize {
        self.document.cursor()
    }

    fn set_cursor(&mut self, pos: usize) {
        self.document.set_cursor(pos);
    }

    fn bind_key(&mut self, key: Key, action: KeyAction) -> bool {
        if self.keys.is_bound(key) || key.self_insert().is_some() {
            tracing::warn!(plugin = %self.owner, key = %key, "key is reserved; binding refused");
            return false;
        }
        tracing::debug!(plugin = %self.owner, key = %key, "plugin key binding");
        self.bindings.bind(key, &self.owner, action);
        true
    }

    fn file_path(&self) -> Option<PathBuf> {
        self.document.path().map(|p| p.to_path_buf())
    }

    fn post_event(&mut self, name: &str, value: &str) {
        self.events.post(name, value);
    }

    fn pop_event(&mut self) -> Option<Event> {
        self.events.pop()
    }

    fn begin_plugin(&mut self, name: &str) {
        self.owner = name.to_string();
    }
}
