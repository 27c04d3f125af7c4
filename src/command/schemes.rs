//! Display, scheme and package commands

use crate::editor::{EditorState, PromptAction};
use crate::error::Result;
use super::CommandStatus;

pub fn redraw_display(editor: &mut EditorState) -> Result<CommandStatus> {
    editor.display.force_redraw();
    Ok(CommandStatus::Success)
}

pub fn toggle_line_numbers(editor: &mut EditorState) -> Result<CommandStatus> {
    editor.display.toggle_line_numbers();
    Ok(CommandStatus::Success)
}

pub fn toggle_syntax_highlighting(editor: &mut EditorState) -> Result<CommandStatus> {
    editor.toggle_syntax();
    Ok(CommandStatus::Success)
}

/// Prompt for a scheme name; the available names are listed in the prompt
pub fn select_scheme(editor: &mut EditorState) -> Result<CommandStatus> {
    let prompt = format!("Scheme [{}]", editor.schemes.names().join(" "));
    let current = editor.schemes.current_name().to_string();
    editor.start_prompt(&prompt, PromptAction::SelectScheme, Some(current));
    Ok(CommandStatus::Success)
}

/// Prompt for a package file to install
pub fn install_package(editor: &mut EditorState) -> Result<CommandStatus> {
    editor.start_prompt("Install package", PromptAction::InstallPackage, None);
    Ok(CommandStatus::Success)
}
