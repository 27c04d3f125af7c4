//! Regex highlighter
//!
//! A pass clears every previously applied style, sorts the rules by
//! descending priority (stable), runs each rule over the whole buffer and
//! paints its matches in that order. Painting is last-write-wins per
//! character, so with [`Precedence::LastApplied`] a lower-priority rule that
//! overlaps a higher-priority one ends up visible at the overlap. That is the
//! long-standing behavior and stays the default; [`Precedence::HighestPriority`]
//! paints in reverse so the higher-priority rule wins instead.
//!
//! After the first pass, edits can be re-highlighted incrementally: matches of
//! single-line rules are recomputed only on the edited lines, while rules
//! that may match across lines are rerun over the whole buffer.

use serde::{Deserialize, Serialize};

use super::rules::{CompiledRule, SyntaxRule};
use super::style::{Span, Style};

/// Which rule wins where spans of different rules overlap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Precedence {
    /// The rule applied last (lowest priority) wins
    #[default]
    LastApplied,
    /// The rule with the highest priority wins
    HighestPriority,
}

/// A rule that could not be compiled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDiagnostic {
    /// Position of the rule in its rule set
    pub index: usize,
    pub pattern: String,
    pub message: String,
}

/// A text change in character offsets: `start..old_end` was replaced by
/// `start..new_end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextEdit {
    pub start: usize,
    pub old_end: usize,
    pub new_end: usize,
}

impl TextEdit {
    /// `len` characters inserted at `at`
    pub fn insert(at: usize, len: usize) -> Self {
        Self {
            start: at,
            old_end: at,
            new_end: at + len,
        }
    }

    /// `start..end` removed
    pub fn delete(start: usize, end: usize) -> Self {
        Self {
            start,
            old_end: end,
            new_end: start,
        }
    }

    /// The single edit equivalent to `self` followed by `next`.
    ///
    /// `next` is in the coordinates of the text after `self`. The result may
    /// cover more than was strictly changed, never less.
    pub fn then(self, next: TextEdit) -> TextEdit {
        let start = self.start.min(next.start);
        let carried = if self.new_end <= next.start {
            self.new_end
        } else if self.new_end >= next.old_end {
            (self.new_end as isize + next.delta()) as usize
        } else {
            next.new_end
        };
        let new_end = next.new_end.max(carried).max(start);
        let old_end = (new_end as isize - self.delta() - next.delta()).max(start as isize) as usize;
        TextEdit {
            start,
            old_end,
            new_end,
        }
    }

    fn delta(&self) -> isize {
        self.new_end as isize - self.old_end as isize
    }
}

/// The display's styling surface: one optional style per character.
///
/// This mirrors how a text widget applies tags by range: a later `apply`
/// overwrites whatever an earlier one left on the same characters.
#[derive(Debug, Clone, Default)]
pub struct StyleLayer {
    cells: Vec<Option<Style>>,
}

impl StyleLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every applied style and size the layer for `len` characters
    pub fn clear(&mut self, len: usize) {
        self.cells.clear();
        self.cells.resize(len, None);
    }

    /// Paint a span; out-of-range parts are ignored
    pub fn apply(&mut self, span: &Span) {
        let end = span.end.min(self.cells.len());
        for cell in self.cells.iter_mut().take(end).skip(span.start) {
            *cell = Some(span.style);
        }
    }

    /// Style at a character offset, if any span covers it
    pub fn style_at(&self, pos: usize) -> Option<Style> {
        self.cells.get(pos).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Byte/character offset conversion for one text snapshot
struct CharMap<'a> {
    text: &'a str,
    /// Byte offset of every char; empty for ASCII text
    starts: Vec<usize>,
}

impl<'a> CharMap<'a> {
    fn new(text: &'a str) -> Self {
        let starts = if text.is_ascii() {
            Vec::new()
        } else {
            text.char_indices().map(|(i, _)| i).collect()
        };
        Self { text, starts }
    }

    fn char_len(&self) -> usize {
        if self.starts.is_empty() {
            self.text.len()
        } else {
            self.starts.len()
        }
    }

    fn to_char(&self, byte: usize) -> usize {
        if self.starts.is_empty() {
            byte
        } else {
            self.starts.partition_point(|&b| b < byte)
        }
    }

    fn to_byte(&self, ch: usize) -> usize {
        if self.starts.is_empty() {
            ch.min(self.text.len())
        } else {
            self.starts.get(ch).copied().unwrap_or(self.text.len())
        }
    }

    /// Start of the line containing char `pos`
    fn line_start(&self, pos: usize) -> usize {
        let byte = self.to_byte(pos);
        self.text[..byte]
            .rfind('\n')
            .map(|i| self.to_char(i + 1))
            .unwrap_or(0)
    }

    /// Position of the newline ending the line containing char `pos`, or the
    /// end of the text
    fn line_end(&self, pos: usize) -> usize {
        let byte = self.to_byte(pos);
        self.text[byte..]
            .find('\n')
            .map(|i| self.to_char(byte + i))
            .unwrap_or_else(|| self.char_len())
    }
}

/// Highlighter state: the compiled rule set and the spans of the last pass
#[derive(Debug, Clone, Default)]
pub struct Highlighter {
    /// Compiled rules in application order
    rules: Vec<CompiledRule>,
    diagnostics: Vec<RuleDiagnostic>,
    precedence: Precedence,
    /// Spans of the last pass, one list per compiled rule
    cache: Vec<Vec<Span>>,
    /// Whether `cache` describes the current text
    valid: bool,
}

impl Highlighter {
    /// Create a highlighter for a rule set
    pub fn new(rules: &[SyntaxRule], precedence: Precedence) -> Self {
        let mut highlighter = Self {
            precedence,
            ..Default::default()
        };
        highlighter.set_rules(rules);
        highlighter
    }

    /// Replace the rule set; malformed patterns are reported and skipped
    pub fn set_rules(&mut self, rules: &[SyntaxRule]) {
        self.rules.clear();
        self.diagnostics.clear();

        for (index, rule) in rules.iter().enumerate() {
            match CompiledRule::compile(index, rule) {
                Ok(compiled) => self.rules.push(compiled),
                Err(e) => {
                    tracing::warn!(index, pattern = %rule.pattern, "skipping syntax rule: {}", e);
                    self.diagnostics.push(RuleDiagnostic {
                        index,
                        pattern: rule.pattern.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        // Vec::sort_by is stable: equal priorities keep their file order
        self.rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        self.invalidate();
    }

    /// Rules that failed to compile in the current rule set
    pub fn diagnostics(&self) -> &[RuleDiagnostic] {
        &self.diagnostics
    }

    /// Number of rules that compiled
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Forget the last pass; the next `rehighlight` does a full pass
    pub fn invalidate(&mut self) {
        self.cache.clear();
        self.valid = false;
    }

    /// Full pass over `text`. Returns the spans in application order.
    pub fn highlight(&mut self, text: &str) -> Vec<Span> {
        let map = CharMap::new(text);
        self.cache = self
            .rules
            .iter()
            .map(|rule| scan(rule, &map, 0, map.char_len()))
            .collect();
        self.valid = true;
        self.spans()
    }

    /// Re-highlight after `edit`, reusing the last pass where possible.
    ///
    /// `text` is the buffer after the edit. The result is identical to a full
    /// [`highlight`](Self::highlight) of `text`.
    pub fn rehighlight(&mut self, text: &str, edit: &TextEdit) -> Vec<Span> {
        if !self.valid || self.cache.len() != self.rules.len() {
            return self.highlight(text);
        }

        let map = CharMap::new(text);
        let len = map.char_len();
        let start = edit.start.min(len);
        let new_end = edit.new_end.clamp(start, len);

        // Damaged lines in the new text. The text after the edit is the same
        // in both versions, so the old window end is the new one shifted back.
        let window_start = map.line_start(start);
        let window_end = map.line_end(new_end);
        let delta = edit.delta();
        let old_window_end = (window_end as isize - delta).max(window_start as isize) as usize;

        let mut full = 0;
        for (rule, cached) in self.rules.iter().zip(self.cache.iter_mut()) {
            if rule.spans_lines {
                *cached = scan(rule, &map, 0, len);
                full += 1;
                continue;
            }

            let mut spans: Vec<Span> = cached
                .iter()
                .filter(|s| s.end <= window_start)
                .cloned()
                .collect();
            spans.extend(scan(rule, &map, window_start, window_end));
            spans.extend(cached.iter().filter(|s| s.start >= old_window_end).map(|s| {
                Span::new(
                    (s.start as isize + delta) as usize,
                    (s.end as isize + delta) as usize,
                    s.style,
                )
            }));
            *cached = spans;
        }

        tracing::trace!(
            window_start,
            window_end,
            full_rescans = full,
            rules = self.rules.len(),
            "incremental highlight"
        );
        self.spans()
    }

    /// Spans of the last pass in application order
    pub fn spans(&self) -> Vec<Span> {
        self.cache.iter().flatten().cloned().collect()
    }

    /// Clear `layer` and paint the last pass onto it
    pub fn paint(&self, layer: &mut StyleLayer, text_len: usize) {
        layer.clear(text_len);
        match self.precedence {
            Precedence::LastApplied => {
                for span in self.cache.iter().flatten() {
                    layer.apply(span);
                }
            }
            Precedence::HighestPriority => {
                for span in self.cache.iter().rev().flat_map(|spans| spans.iter()) {
                    layer.apply(span);
                }
            }
        }
    }
}

/// Run one rule over the chars `from..to` of the text
fn scan(rule: &CompiledRule, map: &CharMap<'_>, from: usize, to: usize) -> Vec<Span> {
    let byte_from = map.to_byte(from);
    let byte_to = map.to_byte(to);
    let haystack = &map.text[byte_from..byte_to];

    rule.regex
        .find_iter(haystack)
        .filter(|m| !m.is_empty())
        .map(|m| {
            Span::new(
                map.to_char(byte_from + m.start()),
                map.to_char(byte_from + m.end()),
                rule.style,
            )
        })
        .collect()
}

/// One-shot highlight: clear `layer`, paint `rules` over `text`, and return
/// the rules that failed to compile.
pub fn highlight(
    text: &str,
    rules: &[SyntaxRule],
    precedence: Precedence,
    layer: &mut StyleLayer,
) -> Vec<RuleDiagnostic> {
    let mut highlighter = Highlighter::new(rules, precedence);
    highlighter.highlight(text);
    highlighter.paint(layer, text.chars().count());
    highlighter.diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::style::Color;

    fn rule(pattern: &str, color: Color, priority: i32) -> SyntaxRule {
        SyntaxRule {
            priority,
            ..SyntaxRule::new(pattern, color)
        }
    }

    fn sample_rules() -> Vec<SyntaxRule> {
        vec![
            rule(r"\b\d+\b", Color::Cyan, 0),
            rule(r"\b(let|fn)\b", Color::Magenta, 10),
            rule(r"//.*$", Color::BrightBlack, 20),
            rule(r#""[^"]*""#, Color::Green, 5),
        ]
    }

    #[test]
    fn test_spans_in_priority_order() {
        let mut h = Highlighter::new(&sample_rules(), Precedence::LastApplied);
        let spans = h.highlight("let x = 42; // note");
        let colors: Vec<Color> = spans.iter().map(|s| s.style.fg).collect();
        assert_eq!(colors, vec![Color::BrightBlack, Color::Magenta, Color::Cyan]);
        assert_eq!((spans[0].start, spans[0].end), (12, 19));
        assert_eq!((spans[1].start, spans[1].end), (0, 3));
        assert_eq!((spans[2].start, spans[2].end), (8, 10));
    }

    #[test]
    fn test_ties_keep_file_order() {
        let rules = vec![rule("a", Color::Red, 1), rule("b", Color::Blue, 1), rule("c", Color::Green, 2)];
        let mut h = Highlighter::new(&rules, Precedence::LastApplied);
        let colors: Vec<Color> = h.highlight("abc").iter().map(|s| s.style.fg).collect();
        assert_eq!(colors, vec![Color::Green, Color::Red, Color::Blue]);
    }

    #[test]
    fn test_highlight_is_idempotent() {
        let text = "fn main() {\n    let x = 1; // one\n    \"two\"\n}\n";
        let mut h = Highlighter::new(&sample_rules(), Precedence::LastApplied);
        let first = h.highlight(text);
        let second = h.highlight(text);
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn test_overlap_last_applied_wins() {
        // "42" is covered by both rules; the number rule has lower priority,
        // is applied later and therefore shows.
        let rules = vec![rule(r"x = 42", Color::Red, 10), rule(r"\d+", Color::Blue, 0)];
        let mut layer = StyleLayer::new();
        let diags = highlight("x = 42", &rules, Precedence::LastApplied, &mut layer);
        assert!(diags.is_empty());
        assert_eq!(layer.style_at(0).map(|s| s.fg), Some(Color::Red));
        assert_eq!(layer.style_at(4).map(|s| s.fg), Some(Color::Blue));
        assert_eq!(layer.style_at(5).map(|s| s.fg), Some(Color::Blue));
    }

    #[test]
    fn test_overlap_highest_priority_wins() {
        let rules = vec![rule(r"x = 42", Color::Red, 10), rule(r"\d+", Color::Blue, 0)];
        let mut layer = StyleLayer::new();
        highlight("x = 42", &rules, Precedence::HighestPriority, &mut layer);
        assert_eq!(layer.style_at(4).map(|s| s.fg), Some(Color::Red));
        assert_eq!(layer.style_at(5).map(|s| s.fg), Some(Color::Red));
    }

    #[test]
    fn test_bad_pattern_is_skipped() {
        let rules = vec![rule("(unclosed", Color::Red, 50), rule(r"\d+", Color::Blue, 0)];
        let mut layer = StyleLayer::new();
        let diags = highlight("abc 123", &rules, Precedence::LastApplied, &mut layer);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].index, 0);
        assert_eq!(diags[0].pattern, "(unclosed");
        assert_eq!(layer.style_at(4).map(|s| s.fg), Some(Color::Blue));
    }

    #[test]
    fn test_paint_clears_previous_styles() {
        let rules = vec![rule(r"\d+", Color::Blue, 0)];
        let mut h = Highlighter::new(&rules, Precedence::LastApplied);
        let mut layer = StyleLayer::new();

        h.highlight("123 abc");
        h.paint(&mut layer, 7);
        assert!(layer.style_at(0).is_some());

        h.highlight("abc abc");
        h.paint(&mut layer, 7);
        assert!((0..7).all(|i| layer.style_at(i).is_none()));
    }

    #[test]
    fn test_char_offsets_not_bytes() {
        let rules = vec![rule(r"\d+", Color::Blue, 0)];
        let mut h = Highlighter::new(&rules, Precedence::LastApplied);
        let spans = h.highlight("héllo wörld 42");
        assert_eq!(spans.len(), 1);
        assert_eq!((spans[0].start, spans[0].end), (12, 14));
    }

    #[test]
    fn test_empty_matches_ignored() {
        let rules = vec![rule(r"x*", Color::Blue, 0)];
        let mut h = Highlighter::new(&rules, Precedence::LastApplied);
        let spans = h.highlight("abxxc");
        assert_eq!(spans, vec![Span::new(2, 4, Style::fg(Color::Blue))]);
    }

    fn assert_incremental_matches(before: &str, after: &str, edit: TextEdit) {
        assert_incremental_matches_with(&sample_rules(), before, after, edit);
    }

    fn assert_incremental_matches_with(rules: &[SyntaxRule], before: &str, after: &str, edit: TextEdit) {
        let mut incremental = Highlighter::new(rules, Precedence::LastApplied);
        incremental.highlight(before);
        let got = incremental.rehighlight(after, &edit);

        let mut full = Highlighter::new(rules, Precedence::LastApplied);
        let expected = full.highlight(after);
        assert_eq!(got, expected, "before={:?} after={:?}", before, after);
    }

    #[test]
    fn test_incremental_insert_matches_full() {
        assert_incremental_matches(
            "let a = 1;\nlet b = 2;\nlet c = 3;",
            "let a = 1;\nlet bb = 2;\nlet c = 3;",
            TextEdit::insert(15, 1),
        );
    }

    #[test]
    fn test_incremental_multiline_insert_matches_full() {
        let before = "fn a() {}\n// x\nfn b() {}";
        let after = "fn a() {}\n// x\nlet q = 7;\n\nfn b() {}";
        assert_incremental_matches(before, after, TextEdit::insert(15, 12));
    }

    #[test]
    fn test_incremental_delete_matches_full() {
        let before = "let a = 1;\nlet b = 2; // two\nlet c = 3;";
        let after = "let a = 1;\nlet c = 3;";
        assert_incremental_matches(before, after, TextEdit::delete(11, 29));
    }

    #[test]
    fn test_incremental_cross_line_rule_rescans() {
        // Opening a quote changes string matches on later lines
        let before = "let a = 1;\nx\n\"b\"";
        let after = "let a = \"1;\nx\n\"b\"";
        assert_incremental_matches(before, after, TextEdit::insert(8, 1));
    }

    #[test]
    fn test_range_over_newline_rescans() {
        for pattern in [r"[\t-~]+", r"[\a-z]+", "[\u{1}-~]+"] {
            let rules = [SyntaxRule::new(pattern, Color::Yellow)];
            assert_incremental_matches_with(&rules, "ab\ncd", "xab\ncd", TextEdit::insert(0, 1));
        }
    }

    #[test]
    fn test_full_span_over_newline_after_insert() {
        let rules = [SyntaxRule::new(r"[\t-~]+", Color::Yellow)];
        let mut h = Highlighter::new(&rules, Precedence::LastApplied);
        h.highlight("ab\ncd");
        let spans = h.rehighlight("xab\ncd", &TextEdit::insert(0, 1));
        assert_eq!(spans, vec![Span::new(0, 6, Style::fg(Color::Yellow))]);
    }

    #[test]
    fn test_merged_edits_match_full() {
        let before = "let a = 1;\nlet b = 2;\nlet c = 3;";
        let after = "a = 1;\nlet bb = 2;\nlet c = 3;";
        let edit = TextEdit::insert(15, 1).then(TextEdit::delete(0, 4));
        assert_eq!(
            edit,
            TextEdit {
                start: 0,
                old_end: 15,
                new_end: 12
            }
        );
        assert_incremental_matches(before, after, edit);
    }

    #[test]
    fn test_merged_insert_then_undo_is_empty() {
        let edit = TextEdit::insert(5, 1).then(TextEdit::delete(5, 6));
        assert_eq!(edit, TextEdit::insert(5, 0));
    }

    #[test]
    fn test_incremental_without_cache_is_full() {
        let mut h = Highlighter::new(&sample_rules(), Precedence::LastApplied);
        let text = "let x = 5;";
        let spans = h.rehighlight(text, &TextEdit::insert(0, 10));
        let mut full = Highlighter::new(&sample_rules(), Precedence::LastApplied);
        assert_eq!(spans, full.highlight(text));
    }

    #[test]
    fn test_incremental_unicode_matches_full() {
        let before = "// é\nlet ü = 1;";
        let after = "// é\nlet üü = 12;";
        let mut incremental = Highlighter::new(&sample_rules(), Precedence::LastApplied);
        incremental.highlight(before);
        // "ü = 1" became "üü = 12"
        let combined = TextEdit {
            start: 10,
            old_end: 14,
            new_end: 16,
        };
        let got = incremental.rehighlight(after, &combined);
        let mut full = Highlighter::new(&sample_rules(), Precedence::LastApplied);
        assert_eq!(got, full.highlight(after));
    }
}
