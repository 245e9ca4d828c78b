//! Decompile a JSON or YAML document into source text

use super::CliError;
use crate::{decompile, parse_document};

/// Options for the decompile command
#[derive(Debug, Clone, Default)]
pub struct DecompileOptions {
    /// JSON or YAML document text
    pub document: String,
}

pub fn execute_decompile(options: &DecompileOptions) -> Result<String, CliError> {
    let tree = parse_document(&options.document)?;
    Ok(decompile(&tree)?)
}
