//! File and document commands

use crate::editor::{EditorState, PromptAction};
use crate::error::Result;
use super::CommandStatus;

/// Prompt for a file to open
pub fn find_file(editor: &mut EditorState) -> Result<CommandStatus> {
    editor.start_prompt("Find file", PromptAction::FindFile, None);
    Ok(CommandStatus::Success)
}

/// Save to the current file name
pub fn save_buffer(editor: &mut EditorState) -> Result<CommandStatus> {
    editor.save()
}

/// Prompt for a file name and save to it
pub fn write_file(editor: &mut EditorState) -> Result<CommandStatus> {
    let default = editor.document.path().map(|p| p.display().to_string());
    editor.start_prompt("Write file", PromptAction::WriteFile, default);
    Ok(CommandStatus::Success)
}

pub fn new_buffer(editor: &mut EditorState) -> Result<CommandStatus> {
    editor.new_document(None);
    editor.display.set_message("New document");
    Ok(CommandStatus::Success)
}

pub fn quit(editor: &mut EditorState) -> Result<CommandStatus> {
    Ok(editor.request_quit())
}
