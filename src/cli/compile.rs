//! Compile source text into a JSON or YAML document

use super::CliError;
use crate::{compile, render_document, Format};

/// Options for the compile command
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Source text
    pub source: String,
    /// Output document format
    pub format: Format,
}

/// Compile `options.source` and serialize the resulting document
pub fn execute_compile(options: &CompileOptions) -> Result<String, CliError> {
    let tree = compile(&options.source)?;
    Ok(render_document(&tree, options.format)?)
}
