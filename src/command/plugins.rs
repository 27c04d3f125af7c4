//! Plugin management commands

use crate::editor::{EditorState, PromptAction};
use crate::error::Result;
use super::CommandStatus;

/// Prompt for a script to copy into the plugins directory
pub fn install_plugin(editor: &mut EditorState) -> Result<CommandStatus> {
    editor.start_prompt("Install plugin", PromptAction::InstallPlugin, None);
    Ok(CommandStatus::Success)
}

pub fn toggle_plugin(editor: &mut EditorState) -> Result<CommandStatus> {
    if editor.plugins.plugins().is_empty() {
        editor.display.set_message("No plugins");
        return Ok(CommandStatus::Failure);
    }
    let default = first_plugin(editor);
    editor.start_prompt("Toggle plugin", PromptAction::TogglePlugin, default);
    Ok(CommandStatus::Success)
}

pub fn delete_plugin(editor: &mut EditorState) -> Result<CommandStatus> {
    if editor.plugins.plugins().is_empty() {
        editor.display.set_message("No plugins");
        return Ok(CommandStatus::Failure);
    }
    editor.start_prompt("Delete plugin", PromptAction::DeletePlugin, None);
    Ok(CommandStatus::Success)
}

pub fn list_plugins(editor: &mut EditorState) -> Result<CommandStatus> {
    editor.list_plugins();
    Ok(CommandStatus::Success)
}

fn first_plugin(editor: &EditorState) -> Option<String> {
    editor.plugins.plugins().first().map(|p| p.name.clone())
}
