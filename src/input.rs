//! Keys, key names and terminal key translation

use std::fmt;
use std::str::FromStr;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Modifier bits packed above the character code
pub mod key_flags {
    pub const CONTROL: u32 = 0x1000_0000;
    pub const META: u32 = 0x2000_0000;
    pub const CTLX: u32 = 0x4000_0000;
    pub const SPEC: u32 = 0x8000_0000;
    pub const MODIFIERS: u32 = 0xF000_0000;
}

/// Codes of non-character keys, used with [`Key::special`]
pub mod special {
    pub const HOME: u32 = 0x01;
    pub const END: u32 = 0x02;
    pub const UP: u32 = 0x03;
    pub const DOWN: u32 = 0x04;
    pub const LEFT: u32 = 0x05;
    pub const RIGHT: u32 = 0x06;
    pub const PAGE_UP: u32 = 0x07;
    pub const PAGE_DOWN: u32 = 0x08;
    pub const DELETE: u32 = 0x09;
    /// F1 is `FN_BASE + 1`
    pub const FN_BASE: u32 = 0x40;
}

const SPECIAL_NAMES: &[(&str, u32)] = &[
    ("Home", special::HOME),
    ("End", special::END),
    ("Up", special::UP),
    ("Down", special::DOWN),
    ("Left", special::LEFT),
    ("Right", special::RIGHT),
    ("PageUp", special::PAGE_UP),
    ("PageDown", special::PAGE_DOWN),
    ("Delete", special::DELETE),
];

const BACKSPACE: u32 = 0x7f;

/// A key press with its modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(pub u32);

impl Key {
    pub fn char(ch: char) -> Self {
        Key(ch as u32)
    }

    /// `C-<ch>`
    pub fn ctrl(ch: char) -> Self {
        Key(key_flags::CONTROL | ch.to_ascii_lowercase() as u32)
    }

    /// `M-<ch>` (Alt or ESC prefix)
    pub fn meta(ch: char) -> Self {
        Key(key_flags::META | ch as u32)
    }

    /// `C-x <ch>`
    pub fn ctlx(ch: char) -> Self {
        Key(key_flags::CTLX | ch as u32)
    }

    /// `C-x C-<ch>`
    pub fn ctlx_ctrl(ch: char) -> Self {
        Key(key_flags::CTLX | key_flags::CONTROL | ch.to_ascii_lowercase() as u32)
    }

    pub fn special(code: u32) -> Self {
        Key(key_flags::SPEC | code)
    }

    pub fn backspace() -> Self {
        Key(BACKSPACE)
    }

    /// Enter arrives as `C-m`
    pub fn enter() -> Self {
        Key::ctrl('m')
    }

    /// Tab arrives as `C-i`
    pub fn tab() -> Self {
        Key::ctrl('i')
    }

    pub fn is_ctrl(&self) -> bool {
        self.0 & key_flags::CONTROL != 0
    }

    pub fn is_meta(&self) -> bool {
        self.0 & key_flags::META != 0
    }

    pub fn is_ctlx(&self) -> bool {
        self.0 & key_flags::CTLX != 0
    }

    pub fn is_special(&self) -> bool {
        self.0 & key_flags::SPEC != 0
    }

    fn base(&self) -> u32 {
        self.0 & !key_flags::MODIFIERS
    }

    /// The character this key inserts, if it is a plain printable key
    pub fn self_insert(&self) -> Option<char> {
        if self.0 & key_flags::MODIFIERS != 0 {
            return None;
        }
        char::from_u32(self.0).filter(|&ch| ch >= ' ' && ch != '\x7f')
    }

    /// Parse a key name such as `C-x C-s`, `M-f`, `C-SPC`, `PageDown` or `C-x l`
    pub fn parse(name: &str) -> Option<Key> {
        let mut tokens: Vec<&str> = name.split_whitespace().collect();
        let mut flags = 0;
        match tokens.as_slice() {
            [prefix, _] if prefix.eq_ignore_ascii_case("C-x") => {
                flags |= key_flags::CTLX;
                tokens.remove(0);
            }
            [_] => {}
            _ => return None,
        }

        let mut rest = tokens[0];
        loop {
            if let Some(r) = rest.strip_prefix("C-").filter(|r| !r.is_empty()) {
                flags |= key_flags::CONTROL;
                rest = r;
            } else if let Some(r) = rest.strip_prefix("M-").filter(|r| !r.is_empty()) {
                flags |= key_flags::META;
                rest = r;
            } else {
                break;
            }
        }

        let base = match rest {
            "SPC" => ' ' as u32,
            "TAB" => return Some(Key(flags | Key::tab().0)),
            "RET" => return Some(Key(flags | Key::enter().0)),
            "Backspace" | "DEL" => BACKSPACE,
            _ => {
                if let Some(&(_, code)) = SPECIAL_NAMES.iter().find(|(n, _)| n.eq_ignore_ascii_case(rest)) {
                    key_flags::SPEC | code
                } else if let Some(n) = rest.strip_prefix('F').and_then(|n| n.parse::<u32>().ok()) {
                    if !(1..=12).contains(&n) {
                        return None;
                    }
                    key_flags::SPEC | (special::FN_BASE + n)
                } else {
                    let mut chars = rest.chars();
                    let ch = chars.next()?;
                    if chars.next().is_some() {
                        return None;
                    }
                    if flags & key_flags::CONTROL != 0 {
                        ch.to_ascii_lowercase() as u32
                    } else {
                        ch as u32
                    }
                }
            }
        };
        Some(Key(flags | base))
    }
}

impl FromStr for Key {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Key::parse(s).ok_or_else(|| format!("invalid key name `{}`", s))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ctlx() {
            write!(f, "C-x ")?;
        }
        if self.is_ctrl() {
            write!(f, "C-")?;
        }
        if self.is_meta() {
            write!(f, "M-")?;
        }

        let base = self.base();
        if self.is_special() {
            let code = base & !key_flags::SPEC;
            if let Some((name, _)) = SPECIAL_NAMES.iter().find(|(_, c)| *c == code) {
                return write!(f, "{}", name);
            }
            return write!(f, "F{}", code.saturating_sub(special::FN_BASE));
        }
        match base {
            BACKSPACE => write!(f, "Backspace"),
            0x20 => write!(f, "SPC"),
            _ => match char::from_u32(base) {
                Some(ch) => write!(f, "{}", ch),
                None => write!(f, "0x{:x}", base),
            },
        }
    }
}

/// Tracks the `C-x` and ESC prefixes across key events
#[derive(Default)]
pub struct InputState {
    ctlx_pending: bool,
    meta_pending: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.ctlx_pending = false;
        self.meta_pending = false;
    }

    /// Name of the prefix waiting for its continuation
    pub fn pending_prefix(&self) -> Option<&'static str> {
        if self.ctlx_pending {
            Some("C-x")
        } else if self.meta_pending {
            Some("ESC")
        } else {
            None
        }
    }

    /// Translate a crossterm key event. Returns `None` for releases and
    /// for prefix keys that wait for the next event.
    pub fn translate_key(&mut self, event: KeyEvent) -> Option<Key> {
        let KeyEvent { code, modifiers, kind, .. } = event;
        if kind != KeyEventKind::Press {
            return None;
        }

        if self.meta_pending {
            self.meta_pending = false;
            return translate(code, modifiers).map(|k| Key(k.0 | key_flags::META));
        }

        if self.ctlx_pending {
            self.ctlx_pending = false;
            if code == KeyCode::Esc {
                return None;
            }
            return translate(code, modifiers).map(|k| Key(k.0 | key_flags::CTLX));
        }

        match code {
            KeyCode::Esc => {
                self.meta_pending = true;
                None
            }
            KeyCode::Char('x') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.ctlx_pending = true;
                None
            }
            _ => translate(code, modifiers),
        }
    }
}

fn translate(code: KeyCode, modifiers: KeyModifiers) -> Option<Key> {
    let ctrl = modifiers.contains(KeyModifiers::CONTROL);
    let alt = modifiers.contains(KeyModifiers::ALT);

    let key = match code {
        KeyCode::Char(ch) if ctrl => Key::ctrl(ch),
        KeyCode::Char(ch) => Key::char(ch),
        KeyCode::Enter => Key::enter(),
        KeyCode::Tab => Key::tab(),
        KeyCode::Backspace => Key::backspace(),
        KeyCode::Delete => Key::special(special::DELETE),
        KeyCode::Home => Key::special(special::HOME),
        KeyCode::End => Key::special(special::END),
        KeyCode::PageUp => Key::special(special::PAGE_UP),
        KeyCode::PageDown => Key::special(special::PAGE_DOWN),
        KeyCode::Up => Key::special(special::UP),
        KeyCode::Down => Key::special(special::DOWN),
        KeyCode::Left => Key::special(special::LEFT),
        KeyCode::Right => Key::special(special::RIGHT),
        KeyCode::F(n) => Key::special(special::FN_BASE + n as u32),
        _ => return None,
    };
    Some(if alt { Key(key.0 | key_flags::META) } else { key })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(Key::parse("C-x C-s"), Some(Key::ctlx_ctrl('s')));
        assert_eq!(Key::parse("C-x l"), Some(Key::ctlx('l')));
        assert_eq!(Key::parse("C-f"), Some(Key::ctrl('f')));
        assert_eq!(Key::parse("C-F"), Some(Key::ctrl('f')));
        assert_eq!(Key::parse("M-x"), Some(Key::meta('x')));
        assert_eq!(Key::parse("C-SPC"), Some(Key::ctrl(' ')));
        assert_eq!(Key::parse("RET"), Some(Key::enter()));
        assert_eq!(Key::parse("PageDown"), Some(Key::special(special::PAGE_DOWN)));
        assert_eq!(Key::parse("F5"), Some(Key::special(special::FN_BASE + 5)));
        assert_eq!(Key::parse("a"), Some(Key::char('a')));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Key::parse(""), None);
        assert_eq!(Key::parse("C-"), None);
        assert_eq!(Key::parse("abc"), None);
        assert_eq!(Key::parse("C-x C-x C-x"), None);
        assert_eq!(Key::parse("F13"), None);
        assert!("C-x nope".parse::<Key>().is_err());
    }

    #[test]
    fn test_display_round_trips_names() {
        for name in ["C-x C-s", "C-x l", "C-f", "M-x", "C-SPC", "PageDown", "F5", "Backspace", "C-M-v"] {
            let key = Key::parse(name).unwrap();
            assert_eq!(key.to_string(), name);
            assert_eq!(Key::parse(&key.to_string()), Some(key));
        }
    }

    #[test]
    fn test_self_insert() {
        assert_eq!(Key::char('a').self_insert(), Some('a'));
        assert_eq!(Key::char('é').self_insert(), Some('é'));
        assert_eq!(Key::ctrl('a').self_insert(), None);
        assert_eq!(Key::backspace().self_insert(), None);
    }

    #[test]
    fn test_ctlx_prefix_sequence() {
        let mut input = InputState::new();
        assert_eq!(input.translate_key(press(KeyCode::Char('x'), KeyModifiers::CONTROL)), None);
        assert_eq!(input.pending_prefix(), Some("C-x"));
        assert_eq!(
            input.translate_key(press(KeyCode::Char('s'), KeyModifiers::CONTROL)),
            Some(Key::ctlx_ctrl('s'))
        );
        assert_eq!(input.pending_prefix(), None);
    }

    #[test]
    fn test_escape_is_meta() {
        let mut input = InputState::new();
        assert_eq!(input.translate_key(press(KeyCode::Esc, KeyModifiers::NONE)), None);
        assert_eq!(input.translate_key(press(KeyCode::Char('f'), KeyModifiers::NONE)), Some(Key::meta('f')));
        assert_eq!(input.translate_key(press(KeyCode::Char('f'), KeyModifiers::ALT)), Some(Key::meta('f')));
    }
}
