//! Pattern rules for syntax highlighting
//!
//! Rules come from JSON rule files:
//!
//! ```json
//! {
//!   "scope": ["py", "pyw"],
//!   "rules": [
//!     { "pattern": "#.*$", "color": "#6A9955", "italic": true },
//!     { "pattern": "\\b(def|class)\\b", "color": "#569CD6", "priority": 10, "bold": true }
//!   ]
//! }
//! ```

use regex::{Regex, RegexBuilder};
use regex_syntax::hir::{Class, Hir, HirKind, Look};
use regex_syntax::ParserBuilder;
use serde::{Deserialize, Serialize};

use super::style::{Color, Style};

/// A single pattern-to-style mapping
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SyntaxRule {
    /// Regular expression, matched in multi-line mode
    pub pattern: String,
    /// Foreground color for matches
    pub color: Color,
    /// Higher priorities are applied first
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
}

impl SyntaxRule {
    /// Create a plain rule with default priority and no font flags
    pub fn new(pattern: &str, color: Color) -> Self {
        Self {
            pattern: pattern.to_string(),
            color,
            priority: 0,
            bold: false,
            italic: false,
            underline: false,
        }
    }

    /// The style this rule paints over its matches
    pub fn style(&self) -> Style {
        Style::fg(self.color)
            .with_bold(self.bold)
            .with_italic(self.italic)
            .with_underline(self.underline)
    }
}

/// A rule file: the rule set and the file extensions it applies to
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RuleFile {
    /// Extensions without the leading dot
    pub scope: Vec<String>,
    #[serde(default)]
    pub rules: Vec<SyntaxRule>,
}

impl RuleFile {
    /// Check whether this rule file covers a file extension
    pub fn covers(&self, extension: &str) -> bool {
        let extension = extension.trim_start_matches('.');
        self.scope
            .iter()
            .any(|s| s.trim_start_matches('.').eq_ignore_ascii_case(extension))
    }
}

/// A rule whose pattern compiled successfully
#[derive(Debug, Clone)]
pub struct CompiledRule {
    /// Position of the rule in its source rule set
    pub index: usize,
    pub priority: i32,
    pub regex: Regex,
    pub style: Style,
    /// Whether a match might cross a line boundary
    pub spans_lines: bool,
}

impl CompiledRule {
    /// Compile a rule in multi-line mode (`^` and `$` match at line boundaries)
    pub fn compile(index: usize, rule: &SyntaxRule) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(&rule.pattern).multi_line(true).build()?;
        Ok(Self {
            index,
            priority: rule.priority,
            regex,
            style: rule.style(),
            spans_lines: may_span_lines(&rule.pattern),
        })
    }
}

/// Check whether a match of `pattern` may cross a line boundary.
///
/// The pattern is parsed with the flags it is compiled with. It crosses lines
/// when a literal or class can match `\n`, or when it anchors to the start or
/// end of the whole text. A pattern that fails to parse counts as crossing.
pub fn may_span_lines(pattern: &str) -> bool {
    match ParserBuilder::new().multi_line(true).build().parse(pattern) {
        Ok(hir) => crosses_lines(&hir),
        Err(_) => true,
    }
}

fn crosses_lines(hir: &Hir) -> bool {
    match hir.kind() {
        HirKind::Empty => false,
        HirKind::Literal(literal) => literal.0.contains(&b'\n'),
        HirKind::Class(Class::Unicode(class)) => class
            .ranges()
            .iter()
            .any(|r| r.start() <= '\n' && '\n' <= r.end()),
        HirKind::Class(Class::Bytes(class)) => class
            .ranges()
            .iter()
            .any(|r| r.start() <= b'\n' && b'\n' <= r.end()),
        HirKind::Look(look) => matches!(look, Look::Start | Look::End),
        HirKind::Repetition(repetition) => crosses_lines(&repetition.sub),
        HirKind::Capture(capture) => crosses_lines(&capture.sub),
        HirKind::Concat(hirs) | HirKind::Alternation(hirs) => hirs.iter().any(crosses_lines),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_defaults_from_json() {
        let rule: SyntaxRule = serde_json::from_str(r##"{"pattern": "\\d+", "color": "#ff0000"}"##).unwrap();
        assert_eq!(rule.priority, 0);
        assert!(!rule.bold && !rule.italic && !rule.underline);
        assert_eq!(rule.color, Color::Rgb(255, 0, 0));
    }

    #[test]
    fn test_rule_style_flags() {
        let rule: SyntaxRule = serde_json::from_str(
            r#"{"pattern": "x", "color": "blue", "bold": true, "underline": true}"#,
        )
        .unwrap();
        let style = rule.style();
        assert_eq!(style.fg, Color::Blue);
        assert!(style.bold);
        assert!(!style.italic);
        assert!(style.underline);
    }

    #[test]
    fn test_rule_file_covers() {
        let file: RuleFile =
            serde_json::from_str(r#"{"scope": ["py", ".PYW"], "rules": []}"#).unwrap();
        assert!(file.covers("py"));
        assert!(file.covers("pyw"));
        assert!(file.covers(".py"));
        assert!(!file.covers("rs"));
    }

    #[test]
    fn test_compile_is_multiline() {
        let rule = CompiledRule::compile(0, &SyntaxRule::new("^#.*$", Color::Green)).unwrap();
        let matches: Vec<_> = rule.regex.find_iter("a\n# one\nb\n# two").map(|m| m.as_str()).collect();
        assert_eq!(matches, vec!["# one", "# two"]);
    }

    #[test]
    fn test_compile_rejects_bad_pattern() {
        assert!(CompiledRule::compile(0, &SyntaxRule::new("(unclosed", Color::Red)).is_err());
    }

    #[test]
    fn test_may_span_lines() {
        assert!(!may_span_lines(r"\b(fn|let)\b"));
        assert!(!may_span_lines(r"//.*$"));
        assert!(!may_span_lines(r#""[a-z]*""#));
        assert!(may_span_lines(r"^\s*$"));
        assert!(may_span_lines(r#""[^"]*""#));
        assert!(may_span_lines(r"/\*[\s\S]*?\*/"));
        assert!(may_span_lines(r"(?s)/\*.*?\*/"));
        assert!(may_span_lines(r"(?ms:a.b)"));
        assert!(may_span_lines(r"(?-m)^x"));
        assert!(may_span_lines(r"\Aabc"));
        assert!(may_span_lines("a\nb"));
        assert!(!may_span_lines(r"(?i)select"));
    }

    #[test]
    fn test_ranges_containing_newline_span_lines() {
        assert!(may_span_lines(r"[\t-~]+"));
        assert!(may_span_lines(r"[\a-z]+"));
        assert!(may_span_lines("[\u{1}-~]+"));
        assert!(!may_span_lines(r"[ -~]+"));
    }

    #[test]
    fn test_excluded_newline_stays_on_line() {
        assert!(!may_span_lines(r#""(?:[^"\\\n]|\\.)*""#));
        assert!(!may_span_lines(r"\p{L}+"));
        assert!(!may_span_lines(r"[^\n]+"));
    }
}
