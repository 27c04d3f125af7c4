//! Navigation commands - cursor movement

use crate::editor::EditorState;
use crate::error::Result;
use super::CommandStatus;

/// Move cursor forward one character
pub fn forward_char(editor: &mut EditorState) -> Result<CommandStatus> {
    if editor.document.cursor() >= editor.document.len_chars() {
        return Ok(CommandStatus::Failure);
    }
    editor.document.forward_char();
    Ok(CommandStatus::Success)
}

/// Move cursor backward one character
pub fn backward_char(editor: &mut EditorState) -> Result<CommandStatus> {
    if editor.document.cursor() == 0 {
        return Ok(CommandStatus::Failure);
    }
    editor.document.backward_char();
    Ok(CommandStatus::Success)
}

pub fn next_line(editor: &mut EditorState) -> Result<CommandStatus> {
    editor.document.move_lines(1);
    Ok(CommandStatus::Success)
}

pub fn previous_line(editor: &mut EditorState) -> Result<CommandStatus> {
    editor.document.move_lines(-1);
    Ok(CommandStatus::Success)
}

pub fn beginning_of_line(editor: &mut EditorState) -> Result<CommandStatus> {
    editor.document.beginning_of_line();
    Ok(CommandStatus::Success)
}

pub fn end_of_line(editor: &mut EditorState) -> Result<CommandStatus> {
    editor.document.end_of_line();
    Ok(CommandStatus::Success)
}

/// Scroll down one page
pub fn scroll_down(editor: &mut EditorState) -> Result<CommandStatus> {
    let page = editor.page_rows() as isize;
    editor.document.move_lines(page);
    Ok(CommandStatus::Success)
}

/// Scroll up one page
pub fn scroll_up(editor: &mut EditorState) -> Result<CommandStatus> {
    let page = editor.page_rows() as isize;
    editor.document.move_lines(-page);
    Ok(CommandStatus::Success)
}

pub fn beginning_of_buffer(editor: &mut EditorState) -> Result<CommandStatus> {
    editor.document.beginning_of_buffer();
    Ok(CommandStatus::Success)
}

pub fn end_of_buffer(editor: &mut EditorState) -> Result<CommandStatus> {
    editor.document.end_of_buffer();
    Ok(CommandStatus::Success)
}
