//! Display rendering
//!
//! Screen layout, top to bottom: the status bar with the window title, the
//! text rows with the line-number gutter on the left, and the message line.

use unicode_width::UnicodeWidthChar;

use crate::document::Document;
use crate::error::Result;
use crate::syntax::{Style, StyleLayer};
use crate::terminal::Terminal;
use crate::theme::ColorScheme;

/// Everything a frame is drawn from
pub struct View<'a> {
    pub document: &'a Document,
    pub layer: &'a StyleLayer,
    pub scheme: &'a ColorScheme,
}

impl View<'_> {
    fn base_style(&self) -> Style {
        Style::fg(self.scheme.foreground_color).with_bg(self.scheme.background_color)
    }

    fn gutter_style(&self) -> Style {
        Style::fg(self.scheme.line_number_color)
            .with_bg(self.scheme.line_bar_color)
            .with_bold(self.scheme.line_number_bold)
            .with_italic(self.scheme.line_number_italic)
    }

    fn caret_style(&self) -> Style {
        Style::fg(self.scheme.background_color).with_bg(self.scheme.insertbackground_color)
    }

    /// Style of the character at `pos`: highlight spans over the scheme
    /// colors, then selection, then the caret
    fn style_at(&self, pos: usize, selection: Option<(usize, usize)>) -> Style {
        if pos == self.document.cursor() {
            return self.caret_style();
        }
        let base = self.base_style();
        let mut style = match self.layer.style_at(pos) {
            Some(span) => span.over(&base),
            None => base,
        };
        if selection.is_some_and(|(start, end)| pos >= start && pos < end) {
            style.reverse = true;
        }
        style
    }
}

pub struct Display {
    needs_redraw: bool,
    message: Option<String>,
    pub show_line_numbers: bool,
    /// First document line on screen
    top_line: usize,
    /// First display column on screen
    left_col: usize,
}

impl Display {
    pub fn new(show_line_numbers: bool) -> Self {
        Self {
            needs_redraw: true,
            message: None,
            show_line_numbers,
            top_line: 0,
            left_col: 0,
        }
    }

    pub fn toggle_line_numbers(&mut self) {
        self.show_line_numbers = !self.show_line_numbers;
        self.needs_redraw = true;
    }

    pub fn force_redraw(&mut self) {
        self.needs_redraw = true;
    }

    pub fn set_message(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
    }

    pub fn clear_message(&mut self) {
        self.message = None;
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Gutter width including the separating space; zero when hidden
    fn gutter_width(&self, line_count: usize) -> usize {
        if !self.show_line_numbers {
            return 0;
        }
        line_count.to_string().len().max(3) + 1
    }

    /// Keep the cursor line inside `text_rows` rows
    fn scroll_to(&mut self, cursor_line: usize, text_rows: usize) {
        if cursor_line < self.top_line {
            self.top_line = cursor_line;
        } else if text_rows > 0 && cursor_line >= self.top_line + text_rows {
            self.top_line = cursor_line + 1 - text_rows;
        }
    }

    /// Keep the cell at `col`, `width` columns wide, inside `text_cols`
    fn scroll_to_column(&mut self, col: usize, width: usize, text_cols: usize) {
        if col < self.left_col {
            self.left_col = col;
        } else if text_cols > 0 && col + width > self.left_col + text_cols {
            self.left_col = (col + width).saturating_sub(text_cols);
        }
    }

    pub fn render(&mut self, terminal: &mut Terminal, view: &View) -> Result<()> {
        let cols = terminal.cols() as usize;
        let rows = terminal.rows() as usize;
        let text_rows = rows.saturating_sub(2);
        let document = view.document;

        if self.needs_redraw {
            terminal.clear_screen()?;
        }

        let (cursor_line, cursor_char) = document.line_col(document.cursor());
        self.scroll_to(cursor_line, text_rows);

        // Status bar
        let mut title = document.title();
        if document.is_modified() {
            title.push_str(" *");
        }
        let status = Style::fg(view.scheme.foreground_color)
            .with_bg(view.scheme.status_bar_color())
            .with_bold(true);
        terminal.move_cursor(0, 0)?;
        terminal.write_styled(&pad_to_width(&format!(" {}", title), cols), &status)?;

        let lines: Vec<(usize, &str)> = document.lines().collect();
        let gutter = self.gutter_width(lines.len());
        let text_cols = cols.saturating_sub(gutter);
        let selection = document.selection_range();
        let tab_size = view.scheme.tab_size.max(1);

        if let Some(&(_, text)) = lines.get(cursor_line) {
            let col = display_width_of(text.chars().take(cursor_char), tab_size);
            let width = text.chars().nth(cursor_char).map_or(1, |ch| char_width(ch, tab_size));
            self.scroll_to_column(col, width, text_cols);
        }
        let window = Columns {
            left: self.left_col,
            width: text_cols,
            tab_size,
        };

        for row in 0..text_rows {
            terminal.move_cursor((row + 1) as u16, 0)?;
            let line_idx = self.top_line + row;
            let line = lines.get(line_idx);

            if gutter > 0 {
                let number = match line {
                    Some(_) => format!("{:>width$} ", line_idx + 1, width = gutter - 1),
                    None => " ".repeat(gutter),
                };
                terminal.write_styled(&number, &view.gutter_style())?;
            }

            let mut used = 0;
            if let Some(&(start, text)) = line {
                for (run, style) in styled_runs(view, text, start, selection, &window) {
                    used += display_width(&run, tab_size);
                    terminal.write_styled(&run, &style)?;
                }
            }
            if used < text_cols {
                terminal.write_styled(&" ".repeat(text_cols - used), &view.base_style())?;
            }
        }

        self.render_message(terminal, view.scheme)?;
        terminal.flush()?;
        self.needs_redraw = false;
        Ok(())
    }

    /// Draw only the message line
    pub fn render_message(&mut self, terminal: &mut Terminal, scheme: &ColorScheme) -> Result<()> {
        let cols = terminal.cols() as usize;
        let row = terminal.rows().saturating_sub(1);
        let style = Style::fg(scheme.foreground_color).with_bg(scheme.background_color);
        terminal.move_cursor(row, 0)?;
        terminal.write_styled(&pad_to_width(self.message.as_deref().unwrap_or(""), cols), &style)?;
        terminal.flush()
    }
}

/// The horizontal slice of a line that is on screen
struct Columns {
    /// First visible display column
    left: usize,
    width: usize,
    tab_size: usize,
}

/// Split one document line into runs of equal style, limited to the visible
/// columns. Tabs expand to `tab_size` spaces and control characters are
/// drawn in caret notation. A caret past the last character is drawn as one
/// extra cell.
fn styled_runs(
    view: &View,
    text: &str,
    start: usize,
    selection: Option<(usize, usize)>,
    window: &Columns,
) -> Vec<(String, Style)> {
    let mut runs: Vec<(String, Style)> = Vec::new();
    // Absolute column of the next character, and columns written so far
    let mut col = 0;
    let mut width = 0;
    let mut count = 0;

    for (i, ch) in text.chars().enumerate() {
        let w = char_width(ch, window.tab_size);
        count = i + 1;
        if col + w <= window.left {
            col += w;
            continue;
        }
        // A wide character cut by the left edge shows as blanks
        let shown = if col < window.left {
            " ".repeat(col + w - window.left)
        } else {
            glyph(ch, window.tab_size)
        };
        let shown_width = display_width(&shown, window.tab_size);
        if width + shown_width > window.width {
            return runs;
        }
        let style = view.style_at(start + i, selection);
        match runs.last_mut() {
            Some((run, last)) if *last == style => run.push_str(&shown),
            _ => runs.push((shown, style)),
        }
        col += w;
        width += shown_width;
    }

    if start + count == view.document.cursor() && col >= window.left && width < window.width {
        runs.push((" ".to_string(), view.caret_style()));
    }
    runs
}

/// What the terminal is sent for one character
fn glyph(ch: char, tab_size: usize) -> String {
    match ch {
        '\t' => " ".repeat(tab_size),
        '\0'..='\x1f' | '\x7f' => format!("^{}", char::from(ch as u8 ^ 0x40)),
        c if c.is_control() => "?".to_string(),
        c => c.to_string(),
    }
}

fn char_width(ch: char, tab_size: usize) -> usize {
    match ch {
        '\t' => tab_size,
        '\0'..='\x1f' | '\x7f' => 2,
        c if c.is_control() => 1,
        c => c.width().unwrap_or(1),
    }
}

fn display_width(s: &str, tab_size: usize) -> usize {
    display_width_of(s.chars(), tab_size)
}

fn display_width_of(chars: impl Iterator<Item = char>, tab_size: usize) -> usize {
    chars.map(|ch| char_width(ch, tab_size)).sum()
}

/// Truncate or pad with spaces to exactly `width` columns
fn pad_to_width(s: &str, width: usize) -> String {
    let mut result = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(1);
        if used + w > width {
            break;
        }
        result.push(ch);
        used += w;
    }
    result.extend(std::iter::repeat(' ').take(width - used));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{highlight, Color, Precedence, SyntaxRule};

    fn columns(left: usize, width: usize) -> Columns {
        Columns {
            left,
            width,
            tab_size: 4,
        }
    }

    fn layer_for(text: &str, rules: &[SyntaxRule]) -> StyleLayer {
        let mut layer = StyleLayer::new();
        highlight(text, rules, Precedence::LastApplied, &mut layer);
        layer
    }

    #[test]
    fn test_runs_follow_spans() {
        let mut document = Document::from_text("let x");
        document.set_cursor(5);
        let layer = layer_for(document.text(), &[SyntaxRule::new(r"\blet\b", Color::Blue)]);
        let scheme = ColorScheme::default();
        let view = View {
            document: &document,
            layer: &layer,
            scheme: &scheme,
        };

        let runs = styled_runs(&view, "let x", 0, None, &columns(0, 80));
        let texts: Vec<&str> = runs.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(texts, vec!["let", " x", " "]);
        assert_eq!(runs[0].1.fg, Color::Blue);
        assert_eq!(runs[0].1.bg, scheme.background_color);
        assert_eq!(runs[1].1.fg, scheme.foreground_color);
        assert_eq!(runs[2].1.bg, scheme.insertbackground_color);
    }

    #[test]
    fn test_runs_truncate_and_expand_tabs() {
        let mut document = Document::from_text("\tabcdef");
        document.set_cursor(0);
        let layer = StyleLayer::new();
        let scheme = ColorScheme::default();
        let view = View {
            document: &document,
            layer: &layer,
            scheme: &scheme,
        };
        let runs = styled_runs(&view, "\tabcdef", 0, None, &columns(0, 6));
        let text: String = runs.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(text, "    ab");
        assert_eq!(runs[0].1, view.caret_style());
    }

    #[test]
    fn test_selection_is_reversed() {
        let mut document = Document::from_text("abcd");
        document.set_cursor(1);
        document.set_mark();
        document.set_cursor(3);
        let layer = StyleLayer::new();
        let scheme = ColorScheme::default();
        let view = View {
            document: &document,
            layer: &layer,
            scheme: &scheme,
        };
        let runs = styled_runs(&view, "abcd", 0, document.selection_range(), &columns(0, 80));
        let flags: Vec<(String, bool)> = runs.into_iter().map(|(t, s)| (t, s.reverse)).collect();
        assert_eq!(
            flags,
            vec![
                ("a".to_string(), false),
                ("bc".to_string(), true),
                ("d".to_string(), false)
            ]
        );
    }

    #[test]
    fn test_control_characters_use_caret_notation() {
        let mut document = Document::from_text("ab\rc\x7f");
        document.set_cursor(0);
        let layer = StyleLayer::new();
        let scheme = ColorScheme::default();
        let view = View {
            document: &document,
            layer: &layer,
            scheme: &scheme,
        };
        let runs = styled_runs(&view, "ab\rc\x7f", 0, None, &columns(0, 80));
        let text: String = runs.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(text, "ab^Mc^?");
        assert!(!text.contains('\r'));
        assert_eq!(display_width(&text, 4), display_width_of("ab\rc\x7f".chars(), 4));

        let runs = styled_runs(&view, "ab\rc", 0, None, &columns(0, 3));
        let text: String = runs.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(text, "ab");
    }

    #[test]
    fn test_runs_start_at_left_column() {
        let text = "0123456789";
        let mut document = Document::from_text(text);
        document.set_cursor(10);
        let layer = StyleLayer::new();
        let scheme = ColorScheme::default();
        let view = View {
            document: &document,
            layer: &layer,
            scheme: &scheme,
        };
        let runs = styled_runs(&view, text, 0, None, &columns(6, 5));
        let shown: String = runs.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(shown, "6789 ");
        assert_eq!(runs.last().map(|(_, s)| *s), Some(view.caret_style()));

        // A wide character cut by the left edge leaves a blank
        let runs = styled_runs(&view, "a日b", 0, None, &columns(2, 5));
        let shown: String = runs.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(shown, " b");
    }

    #[test]
    fn test_horizontal_scroll_follows_cursor() {
        let mut display = Display::new(false);
        display.scroll_to_column(5, 1, 10);
        assert_eq!(display.left_col, 0);
        display.scroll_to_column(10, 1, 10);
        assert_eq!(display.left_col, 1);
        display.scroll_to_column(30, 2, 10);
        assert_eq!(display.left_col, 22);
        display.scroll_to_column(25, 1, 10);
        assert_eq!(display.left_col, 22);
        display.scroll_to_column(4, 1, 10);
        assert_eq!(display.left_col, 4);
    }

    #[test]
    fn test_gutter_and_scroll() {
        let mut display = Display::new(true);
        assert_eq!(display.gutter_width(7), 4);
        assert_eq!(display.gutter_width(12345), 6);
        display.toggle_line_numbers();
        assert_eq!(display.gutter_width(7), 0);

        display.scroll_to(30, 10);
        assert_eq!(display.top_line, 21);
        display.scroll_to(25, 10);
        assert_eq!(display.top_line, 21);
        display.scroll_to(3, 10);
        assert_eq!(display.top_line, 3);
    }

    #[test]
    fn test_pad_to_width() {
        assert_eq!(pad_to_width("abc", 5), "abc  ");
        assert_eq!(pad_to_width("abcdef", 3), "abc");
        assert_eq!(pad_to_width("日本", 3), "日 ");
    }
}
