//! Decompile direction: document tree to source text.
//!
//! The tree is external input. Every shape that has sugar is printed with it;
//! everything else falls back to an object literal with quoted keys, which
//! compiles back to the same subtree.

use std::fmt;

use serde_json::{Map, Number, Value};

use crate::{
    ast::{intrinsics, AttributeKind, DeclarationKind, SectionKind},
    parser,
    pretty::pretty_print,
    source::{
        array, bracket_names, call, equality, format_key, is_identifier, logical, not, object,
        quote, wrap, Fragment, PREC_AND, PREC_OR, PREC_POSTFIX,
    },
    symbols::{Reference, SymbolTable},
};

/// Nesting limit for tree values. A level prints as at most two levels of
/// parser nesting (`!(...)`), so accepted trees always reparse.
pub const MAX_DEPTH: usize = parser::MAX_DEPTH / 2 - 2;

#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// The document root is not a mapping
    NotAnObject,

    UnsupportedSection(String),

    InvalidSection {
        section: &'static str,
        expected: &'static str,
    },

    InvalidEntry {
        section: &'static str,
        name: String,
        expected: &'static str,
    },

    /// Resource field outside `Type`, `Properties` and the attribute list
    UnsupportedField { resource: String, field: String },

    InvalidField {
        entry: String,
        field: &'static str,
        expected: &'static str,
    },

    /// `Fn::GetAtt` that is not an array of at least two strings
    MalformedAttributePath(String),

    TooDeep,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::NotAnObject => write!(f, "Document root must be a mapping"),
            DecodeError::UnsupportedSection(key) => {
                write!(f, "Unsupported top-level section `{}`", key)
            }
            DecodeError::InvalidSection { section, expected } => {
                write!(f, "{} must be {}", section, expected)
            }
            DecodeError::InvalidEntry {
                section,
                name,
                expected,
            } => write!(f, "{} entry `{}` must be {}", section, name, expected),
            DecodeError::UnsupportedField { resource, field } => {
                write!(f, "Resource `{}` has unsupported field `{}`", resource, field)
            }
            DecodeError::InvalidField {
                entry,
                field,
                expected,
            } => write!(f, "`{}` of `{}` must be {}", field, entry, expected),
            DecodeError::MalformedAttributePath(value) => write!(
                f,
                "Fn::GetAtt must be an array of at least two strings, found {}",
                value
            ),
            DecodeError::TooDeep => {
                write!(f, "Document nesting exceeds {} levels", MAX_DEPTH)
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// Decompile a document tree into formatted source text.
pub fn decompile(tree: &Value) -> Result<String, DecodeError> {
    let raw = Decompiler::new(tree)?.render()?;
    Ok(pretty_print(&raw))
}

pub struct Decompiler<'a> {
    root: &'a Map<String, Value>,
    symbols: SymbolTable,
}

impl<'a> Decompiler<'a> {
    pub fn new(tree: &'a Value) -> Result<Self, DecodeError> {
        let Value::Object(root) = tree else {
            return Err(DecodeError::NotAnObject);
        };
        Ok(Decompiler {
            root,
            symbols: SymbolTable::from_tree(tree),
        })
    }

    /// Unformatted source, one statement per line.
    pub fn render(&self) -> Result<String, DecodeError> {
        for key in self.root.keys() {
            let known = SectionKind::from_keyword(key).is_some()
                || DeclarationKind::ALL
                    .iter()
                    .any(|kind| kind.section_key() == key);
            if !known {
                return Err(DecodeError::UnsupportedSection(key.clone()));
            }
        }

        let mut groups: Vec<Vec<String>> = vec![];

        let mut header = vec![];
        for kind in SectionKind::ALL {
            if let Some(value) = self.root.get(kind.keyword()) {
                header.push(self.section(kind, value)?);
            }
        }
        groups.push(header);

        for kind in DeclarationKind::ALL {
            let section = kind.section_key();
            let Some(entries) = self.root.get(section) else {
                continue;
            };
            let Value::Object(entries) = entries else {
                return Err(DecodeError::InvalidSection {
                    section,
                    expected: "a mapping of named entries",
                });
            };

            let mut lines = vec![];
            for (name, entry) in entries {
                lines.push(format!(
                    "{} = {}",
                    format_key(name),
                    self.declaration(kind, name, entry)?
                ));
            }
            groups.push(lines);
        }

        let blocks: Vec<String> = groups
            .into_iter()
            .filter(|lines| !lines.is_empty())
            .map(|lines| lines.join("\n") + "\n")
            .collect();
        Ok(blocks.join("\n"))
    }

    fn section(&self, kind: SectionKind, value: &Value) -> Result<String, DecodeError> {
        let invalid = |expected| DecodeError::InvalidSection {
            section: kind.keyword(),
            expected,
        };

        let text = match kind {
            SectionKind::FormatVersion | SectionKind::Description => match value {
                Value::String(s) => quote(s),
                _ => return Err(invalid("a string")),
            },
            SectionKind::Transform => match value {
                Value::String(s) => quote(s),
                Value::Array(items) => {
                    let mut names = vec![];
                    for item in items {
                        let Value::String(s) = item else {
                            return Err(invalid("a string or a list of strings"));
                        };
                        names.push(quote(s));
                    }
                    array(names)
                }
                _ => return Err(invalid("a string or a list of strings")),
            },
            SectionKind::Metadata | SectionKind::Globals => match value {
                Value::Object(map) => self.object_literal(map, 0)?,
                _ => return Err(invalid("a mapping")),
            },
        };
        Ok(format!("{} {}", kind.keyword(), text))
    }

    fn declaration(
        &self,
        kind: DeclarationKind,
        name: &str,
        entry: &Value,
    ) -> Result<String, DecodeError> {
        let keyword = kind.keyword();

        if kind == DeclarationKind::Condition {
            return Ok(format!(
                "{} {}",
                keyword,
                wrap(self.value(entry, 0)?, PREC_OR)
            ));
        }

        let Value::Object(body) = entry else {
            return Err(DecodeError::InvalidEntry {
                section: kind.section_key(),
                name: name.to_string(),
                expected: "a mapping",
            });
        };

        match kind {
            DeclarationKind::Resource => self.resource(name, body),
            DeclarationKind::Output => Ok(format!("{} {}", keyword, self.output(name, body)?)),
            _ => Ok(format!("{} {}", keyword, self.object_literal(body, 0)?)),
        }
    }

    fn resource(&self, name: &str, body: &Map<String, Value>) -> Result<String, DecodeError> {
        let invalid = |field, expected| DecodeError::InvalidField {
            entry: name.to_string(),
            field,
            expected,
        };

        for field in body.keys() {
            let known = field == "Type"
                || field == "Properties"
                || AttributeKind::from_name(field).is_some();
            if !known {
                return Err(DecodeError::UnsupportedField {
                    resource: name.to_string(),
                    field: field.clone(),
                });
            }
        }

        let Some(Value::String(resource_type)) = body.get("Type") else {
            return Err(invalid("Type", "a string"));
        };
        let mut out = format!("Resource {}", resource_type_source(resource_type));

        match body.get("Properties") {
            None => {}
            Some(Value::Object(properties)) => {
                out.push(' ');
                out.push_str(&self.object_literal(properties, 0)?);
            }
            Some(_) => return Err(invalid("Properties", "a mapping")),
        }

        for kind in AttributeKind::ALL {
            let Some(value) = body.get(kind.name()) else {
                continue;
            };

            let argument = match kind {
                AttributeKind::DependsOn => match value {
                    Value::String(target) => self.name_or_string(target),
                    Value::Array(targets) => {
                        let mut names = vec![];
                        for target in targets {
                            let Value::String(target) = target else {
                                return Err(invalid("DependsOn", "a name or a list of names"));
                            };
                            names.push(self.name_or_string(target));
                        }
                        array(names)
                    }
                    _ => return Err(invalid("DependsOn", "a name or a list of names")),
                },
                AttributeKind::Condition => match value {
                    Value::String(condition) => self.name_or_string(condition),
                    _ => return Err(invalid("Condition", "a condition name")),
                },
                _ => self.value(value, 0)?.0,
            };

            out.push(' ');
            out.push_str(&call(kind.name(), vec![argument]));
        }

        Ok(out)
    }

    /// Output bodies print like any object, except that their `Condition`
    /// is a bare condition name.
    fn output(&self, name: &str, body: &Map<String, Value>) -> Result<String, DecodeError> {
        let mut properties = vec![];
        for (key, value) in body {
            let text = if key == intrinsics::CONDITION_KEY {
                let Value::String(condition) = value else {
                    return Err(DecodeError::InvalidField {
                        entry: name.to_string(),
                        field: intrinsics::CONDITION_KEY,
                        expected: "a condition name",
                    });
                };
                if self.usable(condition)
                    && self.symbols.resolve(condition) == Some(Reference::Condition)
                {
                    condition.clone()
                } else {
                    quote(condition)
                }
            } else {
                self.value(value, 1)?.0
            };
            properties.push((key.clone(), text));
        }
        Ok(object(properties))
    }

    /// Declared names print bare when they can be reparsed as identifiers.
    fn usable(&self, name: &str) -> bool {
        is_identifier(name) && !intrinsics::is_reserved(name) && self.symbols.is_declared(name)
    }

    fn name_or_string(&self, name: &str) -> String {
        if self.usable(name) {
            name.to_string()
        } else {
            quote(name)
        }
    }

    fn object_literal(&self, map: &Map<String, Value>, depth: usize) -> Result<String, DecodeError> {
        let mut properties = vec![];
        for (key, value) in map {
            properties.push((key.clone(), self.value(value, depth + 1)?.0));
        }
        Ok(object(properties))
    }

    fn values(&self, items: &[Value], depth: usize) -> Result<Vec<Fragment>, DecodeError> {
        items.iter().map(|item| self.value(item, depth + 1)).collect()
    }

    fn value(&self, value: &Value, depth: usize) -> Result<Fragment, DecodeError> {
        if depth > MAX_DEPTH {
            return Err(DecodeError::TooDeep);
        }

        let text = match value {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => number_source(n),
            Value::String(s) => quote(s),
            Value::Array(items) => array(
                self.values(items, depth)?
                    .into_iter()
                    .map(|(text, _)| text)
                    .collect(),
            ),
            Value::Object(map) => {
                if map.len() == 1 {
                    if let Some((key, inner)) = map.iter().next() {
                        if let Some(fragment) = self.intrinsic(key, inner, depth)? {
                            return Ok(fragment);
                        }
                    }
                }
                self.object_literal(map, depth)?
            }
        };
        Ok((text, PREC_POSTFIX))
    }

    /// Sugar for a single-key object, or `None` to fall back to a literal.
    fn intrinsic(
        &self,
        key: &str,
        inner: &Value,
        depth: usize,
    ) -> Result<Option<Fragment>, DecodeError> {
        match key {
            intrinsics::REF_KEY => return Ok(self.reference(inner)),
            intrinsics::CONDITION_KEY => return Ok(self.condition(inner)),
            _ => {}
        }

        let Some(name) = intrinsics::function_name(key) else {
            return Ok(None);
        };
        if name == intrinsics::GET_ATT {
            return self.attribute(inner);
        }
        if !is_identifier(name)
            || intrinsics::is_reserved(name)
            || intrinsics::forbidden_call_hint(name).is_some()
        {
            return Ok(None);
        }

        if let Some(fragment) = self.operator(name, inner, depth)? {
            return Ok(Some(fragment));
        }
        self.function(name, inner, depth)
    }

    fn reference(&self, inner: &Value) -> Option<Fragment> {
        let Value::String(name) = inner else {
            return None;
        };
        if let Some(pseudo) = name.strip_prefix(intrinsics::PSEUDO_PREFIX) {
            return is_identifier(pseudo).then(|| {
                (
                    format!("{}.{}", intrinsics::PSEUDO_MARKER, pseudo),
                    PREC_POSTFIX,
                )
            });
        }
        (self.usable(name) && self.symbols.resolve(name) == Some(Reference::Ref))
            .then(|| (name.clone(), PREC_POSTFIX))
    }

    fn condition(&self, inner: &Value) -> Option<Fragment> {
        let Value::String(name) = inner else {
            return None;
        };
        (self.usable(name) && self.symbols.resolve(name) == Some(Reference::Condition))
            .then(|| (name.clone(), PREC_POSTFIX))
    }

    fn attribute(&self, inner: &Value) -> Result<Option<Fragment>, DecodeError> {
        let malformed = || DecodeError::MalformedAttributePath(inner.to_string());

        let Value::Array(items) = inner else {
            return Err(malformed());
        };
        if items.len() < 2 {
            return Err(malformed());
        }
        let mut segments = vec![];
        for item in items {
            let Value::String(segment) = item else {
                return Err(malformed());
            };
            segments.push(segment.clone());
        }

        let base = &segments[0];
        if !self.usable(base) {
            return Ok(None);
        }

        let text = match &segments[1..] {
            [attribute] if is_identifier(attribute) => format!("{}.{}", base, attribute),
            rest => format!("{}{}", base, bracket_names(rest)),
        };
        Ok(Some((text, PREC_POSTFIX)))
    }

    fn operator(
        &self,
        name: &str,
        inner: &Value,
        depth: usize,
    ) -> Result<Option<Fragment>, DecodeError> {
        let Value::Array(items) = inner else {
            return Ok(None);
        };

        let fragment = match (name, items.as_slice()) {
            (intrinsics::EQUALS, [left, right]) => equality(
                self.value(left, depth + 1)?,
                "==",
                self.value(right, depth + 1)?,
            ),
            (intrinsics::NOT, [operand]) => match not_equal_operands(operand) {
                Some((left, right)) => equality(
                    self.value(left, depth + 2)?,
                    "!=",
                    self.value(right, depth + 2)?,
                ),
                None => not(self.value(operand, depth + 1)?),
            },
            (intrinsics::AND, [_, _, ..]) => logical(self.values(items, depth)?, PREC_AND),
            (intrinsics::OR, [_, _, ..]) => logical(self.values(items, depth)?, PREC_OR),
            _ => return Ok(None),
        };
        Ok(Some(fragment))
    }

    /// Generic `Name(args)` form.
    fn function(
        &self,
        name: &str,
        inner: &Value,
        depth: usize,
    ) -> Result<Option<Fragment>, DecodeError> {
        let args = match inner {
            Value::Array(items) if items.len() >= 2 && intrinsics::takes_name_argument(name) => {
                let Value::String(first) = &items[0] else {
                    return Ok(None);
                };
                let declared = if name == intrinsics::IF {
                    self.symbols.is_condition(first)
                } else {
                    self.symbols.is_mapping(first)
                };
                let first = if declared && is_identifier(first) && !intrinsics::is_reserved(first)
                {
                    first.clone()
                } else {
                    quote(first)
                };

                let mut args = vec![first];
                for item in &items[1..] {
                    args.push(self.value(item, depth + 1)?.0);
                }
                args
            }
            Value::Array(items) if intrinsics::always_array(name) || items.len() >= 2 => self
                .values(items, depth)?
                .into_iter()
                .map(|(text, _)| text)
                .collect(),
            _ if intrinsics::always_array(name) => return Ok(None),
            single => vec![self.value(single, depth + 1)?.0],
        };
        Ok(Some((call(name, args), PREC_POSTFIX)))
    }
}

/// `{"Fn::Equals": [a, b]}` as the operand of a `Not`.
fn not_equal_operands(operand: &Value) -> Option<(&Value, &Value)> {
    let Value::Object(map) = operand else {
        return None;
    };
    if map.len() != 1 {
        return None;
    }
    match map.get(&intrinsics::document_key(intrinsics::EQUALS)) {
        Some(Value::Array(items)) if items.len() == 2 => Some((&items[0], &items[1])),
        _ => None,
    }
}

fn resource_type_source(resource_type: &str) -> String {
    let segments: Vec<&str> = resource_type.split("::").collect();
    if segments.len() >= 2 && segments.iter().all(|segment| is_identifier(segment)) {
        resource_type.to_string()
    } else {
        quote(resource_type)
    }
}

/// Integers as-is; floats always carry a fractional part so they reparse as
/// floats.
fn number_source(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) => {
            let text = f.to_string();
            if text.contains('.') {
                text
            } else {
                format!("{}.0", text)
            }
        }
        None => n.to_string(),
    }
}
