//! Command dispatch
//!
//! Built-in commands are plain functions over the editor state, bound to
//! keys in a [`KeyTable`]. Plugin bindings live in a separate table and can
//! never shadow an entry here.

mod editing;
mod files;
mod navigation;
mod plugins;
mod schemes;

use std::collections::HashMap;

use crate::editor::EditorState;
use crate::error::Result;
use crate::input::{special, Key};

/// Command result status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    Failure,
    Abort,
}

pub type CommandFn = fn(&mut EditorState) -> Result<CommandStatus>;

struct BindingEntry {
    function: CommandFn,
    name: &'static str,
}

/// Built-in key bindings
pub struct KeyTable {
    bindings: HashMap<Key, BindingEntry>,
}

impl KeyTable {
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        table.setup_defaults();
        table
    }

    pub fn bind_named(&mut self, key: Key, function: CommandFn, name: &'static str) {
        self.bindings.insert(key, BindingEntry { function, name });
    }

    pub fn lookup(&self, key: Key) -> Option<CommandFn> {
        self.bindings.get(&key).map(|e| e.function)
    }

    pub fn lookup_name(&self, key: Key) -> Option<&'static str> {
        self.bindings.get(&key).map(|e| e.name)
    }

    /// Whether a built-in command owns `key`
    pub fn is_bound(&self, key: Key) -> bool {
        self.bindings.contains_key(&key)
    }

    fn setup_defaults(&mut self) {
        use editing::*;
        use files::*;
        use navigation::*;
        use plugins::*;
        use schemes::*;

        // Movement
        self.bind_named(Key::ctrl('f'), forward_char, "forward-char");
        self.bind_named(Key::ctrl('b'), backward_char, "backward-char");
        self.bind_named(Key::ctrl('n'), next_line, "next-line");
        self.bind_named(Key::ctrl('p'), previous_line, "previous-line");
        self.bind_named(Key::ctrl('a'), beginning_of_line, "beginning-of-line");
        self.bind_named(Key::ctrl('e'), end_of_line, "end-of-line");
        self.bind_named(Key::ctrl('v'), scroll_down, "scroll-down");
        self.bind_named(Key::meta('v'), scroll_up, "scroll-up");
        self.bind_named(Key::meta('<'), beginning_of_buffer, "beginning-of-buffer");
        self.bind_named(Key::meta('>'), end_of_buffer, "end-of-buffer");
        self.bind_named(Key::special(special::RIGHT), forward_char, "forward-char");
        self.bind_named(Key::special(special::LEFT), backward_char, "backward-char");
        self.bind_named(Key::special(special::DOWN), next_line, "next-line");
        self.bind_named(Key::special(special::UP), previous_line, "previous-line");
        self.bind_named(Key::special(special::PAGE_UP), scroll_up, "scroll-up");
        self.bind_named(Key::special(special::PAGE_DOWN), scroll_down, "scroll-down");
        self.bind_named(Key::special(special::HOME), beginning_of_line, "beginning-of-line");
        self.bind_named(Key::special(special::END), end_of_line, "end-of-line");

        // Editing
        self.bind_named(Key::backspace(), delete_char_backward, "delete-backward-char");
        self.bind_named(Key::ctrl('h'), delete_char_backward, "delete-backward-char");
        self.bind_named(Key::ctrl('d'), delete_char_forward, "delete-char");
        self.bind_named(Key::special(special::DELETE), delete_char_forward, "delete-char");
        self.bind_named(Key::enter(), newline, "newline");
        self.bind_named(Key::tab(), insert_tab, "tab-to-tab-stop");
        self.bind_named(Key::ctrl(' '), set_mark, "set-mark-command");
        self.bind_named(Key::ctrl('g'), abort, "keyboard-quit");

        // Files
        self.bind_named(Key::ctlx_ctrl('f'), find_file, "find-file");
        self.bind_named(Key::ctlx_ctrl('s'), save_buffer, "save-buffer");
        self.bind_named(Key::ctlx_ctrl('w'), write_file, "write-file");
        self.bind_named(Key::ctlx_ctrl('n'), new_buffer, "new-buffer");
        self.bind_named(Key::ctlx_ctrl('c'), quit, "save-buffers-kill-editor");

        // Display and schemes
        self.bind_named(Key::ctrl('l'), redraw_display, "redraw-display");
        self.bind_named(Key::ctlx('n'), toggle_line_numbers, "toggle-line-numbers");
        self.bind_named(Key::ctlx('h'), toggle_syntax_highlighting, "toggle-syntax-highlighting");
        self.bind_named(Key::ctlx('t'), select_scheme, "select-scheme");
        self.bind_named(Key::ctlx('i'), install_package, "install-package");

        // Plugins
        self.bind_named(Key::ctlx('p'), install_plugin, "install-plugin");
        self.bind_named(Key::ctlx('e'), toggle_plugin, "toggle-plugin");
        self.bind_named(Key::ctlx('d'), delete_plugin, "delete-plugin");
        self.bind_named(Key::ctlx('l'), list_plugins, "list-plugins");
    }
}

impl Default for KeyTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bindings() {
        let keys = KeyTable::with_defaults();
        assert_eq!(keys.lookup_name(Key::parse("C-x C-f").unwrap()), Some("find-file"));
        assert_eq!(keys.lookup_name(Key::parse("C-x C-s").unwrap()), Some("save-buffer"));
        assert_eq!(keys.lookup_name(Key::parse("C-x t").unwrap()), Some("select-scheme"));
        assert_eq!(keys.lookup_name(Key::parse("C-x l").unwrap()), Some("list-plugins"));
        assert_eq!(keys.lookup_name(Key::parse("C-SPC").unwrap()), Some("set-mark-command"));
        assert_eq!(keys.lookup_name(Key::parse("TAB").unwrap()), Some("tab-to-tab-stop"));
        assert!(!keys.is_bound(Key::parse("C-x u").unwrap()));
    }
}
