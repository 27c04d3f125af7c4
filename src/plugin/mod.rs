//! Plugin host
//!
//! A plugin is anything implementing [`Plugin`]. File plugins are TOML
//! scripts in the plugins directory: each one names an entry table whose
//! steps call the [`EditorApi`] capability object. Scripts never execute
//! code of their own; they can only reach the editor through that object.

mod api;
mod host;
mod script;

use std::path::PathBuf;

use thiserror::Error;

pub use api::{ApiContext, EditorApi, Event, EventQueue, KeyAction, PluginBindings};
pub use host::{InvokeReport, LoadReport, LoadedPlugin, PluginHost, PluginSource};
pub use script::{ScriptPlugin, Step, DEFAULT_ENTRY};

/// Plugin loading and invocation errors
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("I/O error for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Plugin {name} is not valid TOML: {source}")]
    Parse {
        name: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Plugin {name} has no entry point `{entry}`")]
    MissingEntry { name: String, entry: String },

    #[error("Plugin {name} has a malformed entry point: {message}")]
    BadEntry { name: String, message: String },

    #[error("Plugin {0} is already loaded")]
    Duplicate(String),

    #[error("No such plugin: {0}")]
    NotFound(String),

    #[error("Not a plugin script: {}", .0.display())]
    NotAScript(PathBuf),
}

impl PluginError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PluginError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Something the host can invoke with the capability object
pub trait Plugin {
    fn run(&self, api: &mut dyn EditorApi) -> Result<(), PluginError>;
}

impl<F> Plugin for F
where
    F: Fn(&mut dyn EditorApi) -> Result<(), PluginError>,
{
    fn run(&self, api: &mut dyn EditorApi) -> Result<(), PluginError> {
        self(api)
    }
}
