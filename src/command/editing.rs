//! Editing commands

use crate::editor::EditorState;
use crate::error::Result;
use super::CommandStatus;

/// Delete the character before the cursor, or the selection
pub fn delete_char_backward(editor: &mut EditorState) -> Result<CommandStatus> {
    if editor.document.backspace() {
        Ok(CommandStatus::Success)
    } else {
        Ok(CommandStatus::Failure)
    }
}

/// Delete the character under the cursor, or the selection
pub fn delete_char_forward(editor: &mut EditorState) -> Result<CommandStatus> {
    if editor.document.delete_forward() {
        Ok(CommandStatus::Success)
    } else {
        Ok(CommandStatus::Failure)
    }
}

pub fn newline(editor: &mut EditorState) -> Result<CommandStatus> {
    editor.document.insert_at_cursor("\n");
    Ok(CommandStatus::Success)
}

/// Insert `tab_size` spaces of the current scheme
pub fn insert_tab(editor: &mut EditorState) -> Result<CommandStatus> {
    let width = editor.schemes.current().tab_size.max(1);
    editor.document.insert_at_cursor(&" ".repeat(width));
    Ok(CommandStatus::Success)
}

pub fn set_mark(editor: &mut EditorState) -> Result<CommandStatus> {
    editor.document.set_mark();
    editor.display.set_message("Mark set");
    Ok(CommandStatus::Success)
}

/// Drop the mark and give up
pub fn abort(editor: &mut EditorState) -> Result<CommandStatus> {
    editor.document.clear_mark();
    Ok(CommandStatus::Abort)
}
