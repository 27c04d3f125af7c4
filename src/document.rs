//! The edited document: text, cursor, mark and backing file
//!
//! Positions are character offsets into the text. Every mutation records a
//! [`TextEdit`] so the highlighter can re-run only over what changed.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{read_file, EditorError, Result};
use crate::syntax::TextEdit;

#[derive(Debug, Default)]
pub struct Document {
    text: String,
    /// Cursor as a character offset
    cursor: usize,
    /// Other end of the selection, if a mark is set
    mark: Option<usize>,
    path: Option<PathBuf>,
    modified: bool,
    /// Edits since the last [`take_edit`](Self::take_edit), merged
    pending: Option<TextEdit>,
    /// Column kept while moving vertically
    goal_column: Option<usize>,
    /// File used `\r\n` line endings; the text itself holds only `\n`
    crlf: bool,
}

impl Document {
    /// An empty, untitled document
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Read a file. A missing file is [`EditorError::FileNotFound`].
    ///
    /// `\r\n` line endings become `\n` and are written back on save.
    pub fn open(path: &Path) -> Result<Self> {
        let text = read_file(path)?;
        let crlf = text.contains("\r\n");
        let mut document = if crlf {
            Self::from_text(text.replace("\r\n", "\n"))
        } else {
            Self::from_text(text)
        };
        document.path = Some(path.to_path_buf());
        document.crlf = crlf;
        tracing::info!(path = %path.display(), chars = document.len_chars(), crlf, "opened file");
        Ok(document)
    }

    /// An empty document that saves to `path`
    pub fn with_path(path: &Path) -> Self {
        Self {
            path: Some(path.to_path_buf()),
            ..Self::default()
        }
    }

    /// Write to the document's own path
    pub fn save(&mut self) -> Result<()> {
        let path = self
            .path
            .clone()
            .ok_or_else(|| EditorError::Message("No file name".to_string()))?;
        self.save_as(&path)
    }

    /// Write to `path` and make it the document's path
    pub fn save_as(&mut self, path: &Path) -> Result<()> {
        if self.crlf {
            fs::write(path, self.text.replace('\n', "\r\n"))?;
        } else {
            fs::write(path, &self.text)?;
        }
        self.path = Some(path.to_path_buf());
        self.modified = false;
        tracing::info!(path = %path.display(), "saved file");
        Ok(())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len_chars(&self) -> usize {
        self.text.chars().count()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// `gVim - <path>` or `gVim - Untitled`
    pub fn title(&self) -> String {
        match &self.path {
            Some(path) => format!("gVim - {}", path.display()),
            None => "gVim - Untitled".to_string(),
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move the cursor, clamped to the text
    pub fn set_cursor(&mut self, pos: usize) {
        self.cursor = pos.min(self.len_chars());
        self.goal_column = None;
    }

    pub fn mark(&self) -> Option<usize> {
        self.mark
    }

    pub fn set_mark(&mut self) {
        self.mark = Some(self.cursor);
    }

    pub fn clear_mark(&mut self) {
        self.mark = None;
    }

    /// Selected range between mark and cursor, ordered; `None` without a mark
    /// or when the range is empty
    pub fn selection_range(&self) -> Option<(usize, usize)> {
        let mark = self.mark?.min(self.len_chars());
        let (start, end) = if mark <= self.cursor {
            (mark, self.cursor)
        } else {
            (self.cursor, mark)
        };
        (start < end).then_some((start, end))
    }

    /// Selected text, empty without a selection
    pub fn selection(&self) -> String {
        match self.selection_range() {
            Some((start, end)) => self.text.chars().skip(start).take(end - start).collect(),
            None => String::new(),
        }
    }

    /// Edits since the last call, merged into one
    pub fn take_edit(&mut self) -> Option<TextEdit> {
        self.pending.take()
    }

    fn byte_offset(&self, pos: usize) -> usize {
        self.text
            .char_indices()
            .nth(pos)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    fn record(&mut self, edit: TextEdit) {
        self.modified = true;
        self.goal_column = None;
        self.pending = Some(match self.pending {
            Some(prev) => prev.then(edit),
            None => edit,
        });
    }

    /// Replace `start..end` with `text`. Offsets are clamped. The cursor and
    /// mark move with the text around them.
    pub fn replace(&mut self, start: usize, end: usize, text: &str) -> TextEdit {
        let len = self.len_chars();
        let end = end.min(len);
        let start = start.min(end);
        let (from, to) = (self.byte_offset(start), self.byte_offset(end));
        self.text.replace_range(from..to, text);

        let inserted = text.chars().count();
        let edit = TextEdit {
            start,
            old_end: end,
            new_end: start + inserted,
        };
        let shift = |pos: usize| {
            if pos >= end {
                pos - (end - start) + inserted
            } else if pos > start {
                start + inserted
            } else {
                pos
            }
        };
        self.cursor = shift(self.cursor);
        self.mark = self.mark.map(shift);
        self.record(edit);
        edit
    }

    pub fn insert(&mut self, pos: usize, text: &str) -> TextEdit {
        self.replace(pos, pos, text)
    }

    /// Replace the whole text; the cursor is clamped and the mark dropped
    pub fn set_text(&mut self, text: &str) -> TextEdit {
        let cursor = self.cursor;
        let edit = self.replace(0, usize::MAX, text);
        self.mark = None;
        self.cursor = cursor.min(self.len_chars());
        edit
    }

    /// Insert at the cursor and move past the insertion
    pub fn insert_at_cursor(&mut self, text: &str) {
        let at = self.cursor;
        self.insert(at, text);
        self.cursor = at + text.chars().count();
    }

    /// Replace the selection with `text`; nothing happens without a selection
    pub fn replace_selection(&mut self, text: &str) -> bool {
        let Some((start, end)) = self.selection_range() else {
            return false;
        };
        self.replace(start, end, text);
        self.cursor = start + text.chars().count();
        self.mark = None;
        true
    }

    /// Delete the character before the cursor (or the selection)
    pub fn backspace(&mut self) -> bool {
        if self.replace_selection("") {
            return true;
        }
        if self.cursor == 0 {
            return false;
        }
        let at = self.cursor;
        self.replace(at - 1, at, "");
        true
    }

    /// Delete the character under the cursor (or the selection)
    pub fn delete_forward(&mut self) -> bool {
        if self.replace_selection("") {
            return true;
        }
        if self.cursor >= self.len_chars() {
            return false;
        }
        let at = self.cursor;
        self.replace(at, at + 1, "");
        true
    }

    /// Line and column of a character offset, both zero-based
    pub fn line_col(&self, pos: usize) -> (usize, usize) {
        let mut line = 0;
        let mut col = 0;
        for ch in self.text.chars().take(pos) {
            if ch == '\n' {
                line += 1;
                col = 0;
            } else {
                col += 1;
            }
        }
        (line, col)
    }

    pub fn line_count(&self) -> usize {
        self.text.split('\n').count()
    }

    /// Lines with the character offset each one starts at
    pub fn lines(&self) -> impl Iterator<Item = (usize, &str)> {
        let mut offset = 0;
        self.text.split('\n').map(move |line| {
            let start = offset;
            offset += line.chars().count() + 1;
            (start, line)
        })
    }

    /// Character offset of the start of `line`, clamped to the last line
    fn line_start_offset(&self, line: usize) -> usize {
        self.lines()
            .take(line + 1)
            .last()
            .map(|(start, _)| start)
            .unwrap_or(0)
    }

    fn line_len(&self, line: usize) -> usize {
        self.text
            .split('\n')
            .nth(line)
            .map(|l| l.chars().count())
            .unwrap_or(0)
    }

    pub fn forward_char(&mut self) {
        self.set_cursor(self.cursor + 1);
    }

    pub fn backward_char(&mut self) {
        self.set_cursor(self.cursor.saturating_sub(1));
    }

    pub fn beginning_of_line(&mut self) {
        let (line, _) = self.line_col(self.cursor);
        self.set_cursor(self.line_start_offset(line));
    }

    pub fn end_of_line(&mut self) {
        let (line, _) = self.line_col(self.cursor);
        self.set_cursor(self.line_start_offset(line) + self.line_len(line));
    }

    pub fn beginning_of_buffer(&mut self) {
        self.set_cursor(0);
    }

    pub fn end_of_buffer(&mut self) {
        self.set_cursor(self.len_chars());
    }

    /// Move `lines` lines up (negative) or down, keeping the column
    pub fn move_lines(&mut self, lines: isize) {
        let (line, col) = self.line_col(self.cursor);
        let goal = self.goal_column.unwrap_or(col);
        let last = self.line_count() - 1;
        let target = (line as isize + lines).clamp(0, last as isize) as usize;
        let pos = self.line_start_offset(target) + goal.min(self.line_len(target));
        self.cursor = pos;
        self.goal_column = Some(goal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_moves_cursor_and_records_edit() {
        let mut doc = Document::from_text("héllo");
        doc.set_cursor(2);
        doc.insert_at_cursor("XY");
        assert_eq!(doc.text(), "héXYllo");
        assert_eq!(doc.cursor(), 4);
        assert!(doc.is_modified());
        assert_eq!(doc.take_edit(), Some(TextEdit::insert(2, 2)));
        assert_eq!(doc.take_edit(), None);
    }

    #[test]
    fn test_edits_merge_until_taken() {
        let mut doc = Document::from_text("abc\ndef");
        doc.set_cursor(7);
        doc.insert_at_cursor("g");
        doc.set_cursor(0);
        doc.delete_forward();
        assert_eq!(doc.text(), "bc\ndefg");
        let edit = doc.take_edit().unwrap();
        assert_eq!(edit.start, 0);
        assert_eq!(edit.new_end as isize - edit.old_end as isize, 0);
        assert!(edit.new_end >= 7);
    }

    #[test]
    fn test_selection_and_replace() {
        let mut doc = Document::from_text("one two three");
        assert_eq!(doc.selection(), "");
        assert!(!doc.replace_selection("x"));

        doc.set_cursor(4);
        doc.set_mark();
        doc.set_cursor(7);
        assert_eq!(doc.selection(), "two");
        assert!(doc.replace_selection("2"));
        assert_eq!(doc.text(), "one 2 three");
        assert_eq!(doc.cursor(), 5);
        assert_eq!(doc.mark(), None);
    }

    #[test]
    fn test_backspace_and_delete() {
        let mut doc = Document::from_text("ab\ncd");
        doc.set_cursor(3);
        assert!(doc.backspace());
        assert_eq!(doc.text(), "abcd");
        assert_eq!(doc.cursor(), 2);
        doc.end_of_buffer();
        assert!(!doc.delete_forward());
        doc.beginning_of_buffer();
        assert!(!doc.backspace());
    }

    #[test]
    fn test_set_text_clamps_cursor() {
        let mut doc = Document::from_text("a long line");
        doc.set_cursor(9);
        doc.set_mark();
        doc.set_text("short");
        assert_eq!(doc.cursor(), 5);
        assert_eq!(doc.mark(), None);
        assert_eq!(doc.take_edit(), Some(TextEdit { start: 0, old_end: 11, new_end: 5 }));
    }

    #[test]
    fn test_line_movement_keeps_column() {
        let mut doc = Document::from_text("abcdef\nab\nabcdef");
        doc.set_cursor(4);
        doc.move_lines(1);
        assert_eq!(doc.line_col(doc.cursor()), (1, 2));
        doc.move_lines(1);
        assert_eq!(doc.line_col(doc.cursor()), (2, 4));
        doc.move_lines(5);
        assert_eq!(doc.line_col(doc.cursor()), (2, 4));
        doc.end_of_line();
        assert_eq!(doc.cursor(), 16);
        doc.beginning_of_line();
        assert_eq!(doc.cursor(), 10);
    }

    #[test]
    fn test_open_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope.txt");
        assert!(matches!(Document::open(&missing), Err(EditorError::FileNotFound(_))));
    }

    #[test]
    fn test_save_as_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out.txt");
        let mut doc = Document::from_text("x");
        doc.insert(1, "y");
        doc.save_as(&path).unwrap();
        assert!(!doc.is_modified());
        assert_eq!(doc.title(), format!("gVim - {}", path.display()));

        let reopened = Document::open(&path).unwrap();
        assert_eq!(reopened.text(), "xy");
    }

    #[test]
    fn test_crlf_file_keeps_its_line_endings() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("dos.txt");
        std::fs::write(&path, "ab\r\ncd\r\n").unwrap();

        let mut doc = Document::open(&path).unwrap();
        assert_eq!(doc.text(), "ab\ncd\n");
        assert_eq!(doc.lines().next(), Some((0, "ab")));

        doc.insert(2, "!");
        doc.save().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "ab!\r\ncd\r\n");
    }
}
