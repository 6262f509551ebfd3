//! # Bracelight Syntax
//!
//! Tree-sitter services for the brace matcher: a classification oracle
//! that knows where comments and string literals are, and a parse error
//! relay that turns recognizer errors into span-located events.
//!
//! ## Why Tree-sitter?
//!
//! Tree-sitter is a parser generator tool and incremental parsing library:
//! - **Error-tolerant**: Produces valid syntax trees even with errors
//! - **Fast**: Written in C with Rust bindings
//! - **Accurate**: Real parsing, not regex-based classification
//!
//! ## Learning: FFI (Foreign Function Interface)
//!
//! Tree-sitter is written in C. Rust's FFI allows calling C functions:
//! - `extern "C"` blocks declare C functions
//! - `unsafe` blocks required for calling them
//! - The `tree-sitter` crate provides safe wrappers

mod classifier;
mod relay;

pub use classifier::{SyntaxClassifier, TokenClass};
pub use relay::{
    DiagnosticListener, ErrorListener, ErrorProvidingParser, GrammarSyntaxMessage, Message,
    ParseErrorEvent, RecognitionError, RecognitionErrorKind, Token, TokenStream, ToolMessage,
};

use std::path::Path;
use tree_sitter::{Language, Parser};

/// Errors that can occur while parsing.
#[derive(Debug, thiserror::Error)]
pub enum SyntaxError {
    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    #[error("Parser error")]
    ParseError,

    #[error("Buffer error: {0}")]
    Buffer(#[from] bracelight_buffer::BufferError),
}

/// Returns supported languages.
pub fn supported_languages() -> &'static [&'static str] {
    &["rust", "javascript", "python", "json"]
}

/// Guesses a language name from a file extension.
pub fn language_for_path(path: &Path) -> Option<&'static str> {
    match path.extension()?.to_str()? {
        "rs" => Some("rust"),
        "js" | "jsx" | "mjs" => Some("javascript"),
        "py" => Some("python"),
        "json" => Some("json"),
        _ => None,
    }
}

/// Gets the tree-sitter language.
fn get_language(lang: &str) -> Result<Language, SyntaxError> {
    match lang {
        "rust" | "rs" => Ok(tree_sitter_rust::LANGUAGE.into()),
        "javascript" | "js" | "jsx" => Ok(tree_sitter_javascript::LANGUAGE.into()),
        "python" | "py" => Ok(tree_sitter_python::LANGUAGE.into()),
        "json" => Ok(tree_sitter_json::LANGUAGE.into()),
        _ => Err(SyntaxError::UnknownLanguage(lang.to_string())),
    }
}

/// Creates a parser configured for `lang`.
fn new_parser(lang: &str) -> Result<Parser, SyntaxError> {
    let language = get_language(lang)?;
    let mut parser = Parser::new();
    parser
        .set_language(&language)
        .map_err(|_| SyntaxError::ParseError)?;
    Ok(parser)
}
