//! Syntax highlighting
//!
//! Regex rule sets loaded from JSON rule files, a highlighter that turns them
//! into styled spans, and the per-character style layer the display reads.

mod highlighter;
mod manager;
mod rules;
mod style;

pub use highlighter::{highlight, Highlighter, Precedence, RuleDiagnostic, StyleLayer, TextEdit};
pub use manager::{LoadedRuleFile, SyntaxManager};
pub use rules::{RuleFile, SyntaxRule};
pub use style::{Color, ParseColorError, Span, Style};
