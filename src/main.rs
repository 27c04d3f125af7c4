//! gvim - a small terminal text editor with JSON color schemes, regex syntax
//! rules and script plugins

mod cli;
mod command;
mod config;
mod display;
mod document;
mod editor;
mod error;
mod input;
mod logging;
mod package;
mod paths;
mod plugin;
mod syntax;
mod terminal;
mod theme;

use std::process;

use clap::Parser;

use cli::CliArgs;
use config::Config;
use editor::EditorState;
use error::{EditorError, Result};
use paths::Paths;
use terminal::Terminal;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = CliArgs::parse();

    let paths = Paths::resolve(args.home)?;
    paths.ensure()?;
    let _log_guard = logging::init(&paths.logs());
    tracing::info!(home = %paths.home().display(), version = env!("CARGO_PKG_VERSION"), "starting");

    let (config, config_error) = Config::load(&paths.config_file());
    let mut editor = EditorState::new(&paths, config);

    if let Some(path) = &args.file {
        match editor.open_file(path) {
            Ok(()) => {}
            Err(EditorError::FileNotFound(_)) => {
                editor.new_document(Some(path));
                editor.display.set_message(format!("(New file) {}", path.display()));
            }
            Err(e) => return Err(e),
        }
    }

    if !args.no_plugins && editor.config.plugins_enabled {
        editor.start_plugins();
    }
    if let Some(e) = config_error {
        editor.display.set_message(e.to_string());
    }

    editor.attach(Terminal::new()?);
    let result = editor.run();
    tracing::info!("exiting");
    result
}
