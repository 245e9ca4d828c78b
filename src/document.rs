//! Document codec: JSON / YAML text to and from the document tree.
//!
//! YAML short-form tags (`!Ref Env`, `!GetAtt Bucket.Arn`, `!Sub "..."`) are
//! expanded into the same subtrees the compiler produces.

use std::fmt;

use serde_json::{Map, Number, Value};

use crate::ast::intrinsics;

/// Output format of `compile`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Format {
    Json,
    #[default]
    Yaml,
}

#[derive(Debug)]
pub enum DocumentError {
    Json(serde_json::Error),
    Yaml(serde_yaml::Error),
    /// Mapping key that is itself a collection or tagged value
    UnsupportedKey(String),
    /// NaN or an infinity
    InvalidNumber(String),
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentError::Json(e) => write!(f, "Invalid JSON: {}", e),
            DocumentError::Yaml(e) => write!(f, "Invalid YAML: {}", e),
            DocumentError::UnsupportedKey(key) => write!(f, "Unsupported mapping key {}", key),
            DocumentError::InvalidNumber(n) => write!(f, "Unsupported number {}", n),
        }
    }
}

impl std::error::Error for DocumentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DocumentError::Json(e) => Some(e),
            DocumentError::Yaml(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for DocumentError {
    fn from(e: serde_json::Error) -> Self {
        DocumentError::Json(e)
    }
}

impl From<serde_yaml::Error> for DocumentError {
    fn from(e: serde_yaml::Error) -> Self {
        DocumentError::Yaml(e)
    }
}

/// Parse JSON or YAML text. Text that looks like JSON is tried as JSON
/// first; anything else (or JSON that fails) is read as YAML.
pub fn parse_document(text: &str) -> Result<Value, DocumentError> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Ok(tree) = serde_json::from_str(text) {
            return Ok(tree);
        }
    }

    let yaml: serde_yaml::Value = serde_yaml::from_str(text)?;
    from_yaml(yaml)
}

pub fn render_document(tree: &Value, format: Format) -> Result<String, DocumentError> {
    match format {
        Format::Json => Ok(serde_json::to_string_pretty(tree)? + "\n"),
        Format::Yaml => Ok(serde_yaml::to_string(tree)?),
    }
}

fn from_yaml(value: serde_yaml::Value) -> Result<Value, DocumentError> {
    use serde_yaml::Value as Yaml;

    Ok(match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => Value::Number(number(&n)?),
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(from_yaml)
                .collect::<Result<_, _>>()?,
        ),
        Yaml::Mapping(mapping) => {
            let mut map = Map::new();
            for (key, value) in mapping {
                map.insert(key_string(key)?, from_yaml(value)?);
            }
            Value::Object(map)
        }
        Yaml::Tagged(tagged) => {
            let tag = tagged.tag.to_string();
            expand_tag(tag.trim_start_matches('!'), from_yaml(tagged.value)?)
        }
    })
}

/// `!Name value` to its long form.
fn expand_tag(name: &str, value: Value) -> Value {
    let (key, value) = match name {
        intrinsics::REF_KEY | intrinsics::CONDITION_KEY => (name.to_string(), value),
        intrinsics::GET_ATT => {
            let value = match value {
                Value::String(path) => match path.split_once('.') {
                    Some((resource, attribute)) => Value::Array(vec![
                        Value::String(resource.to_string()),
                        Value::String(attribute.to_string()),
                    ]),
                    None => Value::Array(vec![Value::String(path)]),
                },
                other => other,
            };
            (intrinsics::document_key(name), value)
        }
        _ => (intrinsics::document_key(name), value),
    };

    let mut map = Map::new();
    map.insert(key, value);
    Value::Object(map)
}

fn number(n: &serde_yaml::Number) -> Result<Number, DocumentError> {
    if let Some(i) = n.as_i64() {
        return Ok(Number::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Ok(Number::from(u));
    }
    n.as_f64()
        .and_then(Number::from_f64)
        .ok_or_else(|| DocumentError::InvalidNumber(n.to_string()))
}

fn key_string(key: serde_yaml::Value) -> Result<String, DocumentError> {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::String(s) => Ok(s),
        Yaml::Number(n) => Ok(n.to_string()),
        Yaml::Bool(b) => Ok(b.to_string()),
        Yaml::Null => Ok("null".to_string()),
        other => Err(DocumentError::UnsupportedKey(format!("{:?}", other))),
    }
}
