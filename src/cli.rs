//! Command-line arguments

use std::path::PathBuf;

use clap::Parser;

/// A small terminal text editor with regex highlighting, color schemes and
/// script plugins
#[derive(Parser, Debug)]
#[command(name = "gvim", version, about)]
pub struct CliArgs {
    /// File to open
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Directory holding config.toml, themes/, extensions/, plugins/ and logs/
    #[arg(long, value_name = "DIR")]
    pub home: Option<PathBuf>,

    /// Do not load or invoke plugins
    #[arg(long)]
    pub no_plugins: bool,
}
