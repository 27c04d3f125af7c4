//! Style types for text rendering
//!
//! Colors come from JSON scheme and rule files, so they are parsed from
//! strings: either `#rgb` / `#rrggbb` hex or one of the ANSI color names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};

/// A display color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Color {
    /// Inherit the surrounding color
    #[default]
    Default,
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    BrightBlack,
    BrightRed,
    BrightGreen,
    BrightYellow,
    BrightBlue,
    BrightMagenta,
    BrightCyan,
    BrightWhite,
    /// 24-bit color
    Rgb(u8, u8, u8),
}

const NAMED: &[(&str, Color)] = &[
    ("default", Color::Default),
    ("black", Color::Black),
    ("red", Color::Red),
    ("green", Color::Green),
    ("yellow", Color::Yellow),
    ("blue", Color::Blue),
    ("magenta", Color::Magenta),
    ("cyan", Color::Cyan),
    ("white", Color::White),
    ("gray", Color::BrightBlack),
    ("grey", Color::BrightBlack),
    ("bright-black", Color::BrightBlack),
    ("bright-red", Color::BrightRed),
    ("bright-green", Color::BrightGreen),
    ("bright-yellow", Color::BrightYellow),
    ("bright-blue", Color::BrightBlue),
    ("bright-magenta", Color::BrightMagenta),
    ("bright-cyan", Color::BrightCyan),
    ("bright-white", Color::BrightWhite),
];

/// Error returned for an unrecognised color string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseColorError(pub String);

impl fmt::Display for ParseColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid color: {:?}", self.0)
    }
}

impl std::error::Error for ParseColorError {}

impl Color {
    /// Parse `#rgb` or `#rrggbb`
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        match digits.len() {
            3 => {
                let mut parts = digits.chars().map(|c| {
                    let v = c.to_digit(16).unwrap_or(0) as u8;
                    v * 16 + v
                });
                Some(Color::Rgb(parts.next()?, parts.next()?, parts.next()?))
            }
            6 => {
                let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
                Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
            }
            _ => None,
        }
    }

    /// Brighten (positive) or darken (negative) each channel, clamped to 0..=255.
    ///
    /// Named colors have no channels and are returned unchanged.
    pub fn shifted(&self, delta: i16) -> Self {
        match *self {
            Color::Rgb(r, g, b) => {
                let shift = |c: u8| (c as i16 + delta).clamp(0, 255) as u8;
                Color::Rgb(shift(r), shift(g), shift(b))
            }
            other => other,
        }
    }
}

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.starts_with('#') {
            return Color::from_hex(trimmed).ok_or_else(|| ParseColorError(s.to_string()));
        }
        let lower = trimmed.to_ascii_lowercase().replace('_', "-");
        NAMED
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, color)| *color)
            .ok_or_else(|| ParseColorError(s.to_string()))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Rgb(r, g, b) => write!(f, "#{:02x}{:02x}{:02x}", r, g, b),
            named => {
                let name = NAMED
                    .iter()
                    .find(|(_, c)| c == named)
                    .map(|(n, _)| *n)
                    .unwrap_or("default");
                f.write_str(name)
            }
        }
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl serde::Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Text style attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Style {
    /// Foreground color
    pub fg: Color,
    /// Background color
    pub bg: Color,
    /// Bold text
    pub bold: bool,
    /// Italic text
    pub italic: bool,
    /// Underlined text
    pub underline: bool,
    /// Reverse video (swap fg/bg)
    pub reverse: bool,
}

impl Style {
    /// Create a style with just foreground color
    pub fn fg(color: Color) -> Self {
        Self {
            fg: color,
            ..Default::default()
        }
    }

    /// Builder: set background color
    pub fn with_bg(mut self, color: Color) -> Self {
        self.bg = color;
        self
    }

    /// Builder: set bold
    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    /// Builder: set italic
    pub fn with_italic(mut self, italic: bool) -> Self {
        self.italic = italic;
        self
    }

    /// Builder: set underline
    pub fn with_underline(mut self, underline: bool) -> Self {
        self.underline = underline;
        self
    }

    /// Lay `self` over `base`: default colors inherit from `base`
    pub fn over(&self, base: &Style) -> Style {
        Style {
            fg: if self.fg == Color::Default { base.fg } else { self.fg },
            bg: if self.bg == Color::Default { base.bg } else { self.bg },
            bold: self.bold || base.bold,
            italic: self.italic || base.italic,
            underline: self.underline || base.underline,
            reverse: self.reverse || base.reverse,
        }
    }
}

/// A styled range of the buffer, in character offsets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// Character offset where this span starts (inclusive)
    pub start: usize,
    /// Character offset where this span ends (exclusive)
    pub end: usize,
    /// Style to apply to this span
    pub style: Style,
}

impl Span {
    /// Create a new span
    pub fn new(start: usize, end: usize, style: Style) -> Self {
        Self { start, end, style }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_from_hex() {
        assert_eq!(Color::from_hex("#1E1E1E"), Some(Color::Rgb(0x1e, 0x1e, 0x1e)));
        assert_eq!(Color::from_hex("#fff"), Some(Color::Rgb(255, 255, 255)));
        assert_eq!(Color::from_hex("1E1E1E"), None);
        assert_eq!(Color::from_hex("#12345"), None);
        assert_eq!(Color::from_hex("#zzzzzz"), None);
    }

    #[test]
    fn test_color_names() {
        assert_eq!("red".parse::<Color>(), Ok(Color::Red));
        assert_eq!("Bright_Blue".parse::<Color>(), Ok(Color::BrightBlue));
        assert_eq!("grey".parse::<Color>(), Ok(Color::BrightBlack));
        assert!("chartreuse-ish".parse::<Color>().is_err());
    }

    #[test]
    fn test_color_display() {
        assert_eq!(Color::Rgb(0x1e, 0x1e, 0x1e).to_string(), "#1e1e1e");
        assert_eq!(Color::BrightCyan.to_string(), "bright-cyan");
    }

    #[test]
    fn test_color_shift_clamps() {
        assert_eq!(Color::Rgb(250, 10, 128).shifted(7), Color::Rgb(255, 17, 135));
        assert_eq!(Color::Rgb(3, 10, 128).shifted(-5), Color::Rgb(0, 5, 123));
        assert_eq!(Color::Red.shifted(7), Color::Red);
    }

    #[test]
    fn test_style_over_inherits_defaults() {
        let base = Style::fg(Color::White).with_bg(Color::Black);
        let top = Style::fg(Color::Red).with_bold(true);
        let merged = top.over(&base);
        assert_eq!(merged.fg, Color::Red);
        assert_eq!(merged.bg, Color::Black);
        assert!(merged.bold);
    }
}
