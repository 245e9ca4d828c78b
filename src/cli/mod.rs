//! CLI support for cfn-script
//!
//! Programmatic access to the `compile` and `decompile` commands, so other
//! tools can embed them without spawning the binary.

mod compile;
mod decompile;

pub use compile::{execute_compile, CompileOptions};
pub use decompile::{execute_decompile, DecompileOptions};

use std::io;

use crate::{CompileError, DecodeError, DocumentError};

/// Errors that can occur during CLI operations
#[derive(Debug)]
pub enum CliError {
    /// Lex, parse or render error in source text
    Compile(CompileError),
    /// Document tree that cannot be expressed as source
    Decode(DecodeError),
    /// JSON / YAML reading or writing error
    Document(DocumentError),
    /// IO error
    Io(io::Error),
    /// No input file and nothing piped to stdin
    NoInput,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Compile(e) => write!(f, "{}", e),
            CliError::Decode(e) => write!(f, "Decompile error: {}", e),
            CliError::Document(e) => write!(f, "{}", e),
            CliError::Io(e) => write!(f, "IO error: {}", e),
            CliError::NoInput => {
                write!(f, "No input provided. Pass an input file or pipe it to stdin.")
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Compile(e) => Some(e),
            CliError::Decode(e) => Some(e),
            CliError::Document(e) => Some(e),
            CliError::Io(e) => Some(e),
            CliError::NoInput => None,
        }
    }
}

impl From<CompileError> for CliError {
    fn from(e: CompileError) -> Self {
        CliError::Compile(e)
    }
}

impl From<DecodeError> for CliError {
    fn from(e: DecodeError) -> Self {
        CliError::Decode(e)
    }
}

impl From<DocumentError> for CliError {
    fn from(e: DocumentError) -> Self {
        CliError::Document(e)
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}
