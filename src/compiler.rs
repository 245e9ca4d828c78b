//! Compile direction: AST to document tree.
//!
//! [`render_document`] builds a [`SymbolTable`] from the top-level
//! assignments, then renders every statement with a read-only
//! [`RenderContext`]. Bare identifiers are resolved against that table, so a
//! document that parses can still fail here.

use std::fmt;

use serde_json::{Map, Number, Value};

use crate::{
    ast::{
        intrinsics, Declaration, DeclarationKind, Document, Expr, Literal, Resource, Statement,
    },
    lexer::Lexer,
    parser::{ParseError, Parser},
    symbols::{Reference, SymbolTable},
};

#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// Bare name that is neither declared nor a pseudo parameter
    UndeclaredIdentifier(String),

    /// Attribute access on something other than a name
    InvalidMemberAccess(&'static str),

    /// Declaration nested inside an expression
    MisplacedDeclaration(DeclarationKind),

    /// `Name = <expr>` where the expression is not a declaration
    NotADeclaration { name: String, found: &'static str },

    DuplicateDeclaration { name: String, section: &'static str },

    DuplicateSection(&'static str),

    /// Number literal outside the range of the document's numbers
    InvalidNumber(String),

    /// `If`/`FindInMap` naming something that is not a condition/mapping
    InvalidNameArgument { function: String, name: String },

    /// Any of the above, tagged with the line of the failing statement
    InStatement { line: usize, source: Box<RenderError> },
}

impl RenderError {
    /// The underlying error without statement context.
    pub fn root(&self) -> &RenderError {
        match self {
            RenderError::InStatement { source, .. } => source.root(),
            other => other,
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::UndeclaredIdentifier(name) => {
                write!(f, "Undeclared identifier `{}`", name)
            }
            RenderError::InvalidMemberAccess(base) => {
                write!(f, "Attribute access requires a declared name, found {}", base)
            }
            RenderError::MisplacedDeclaration(kind) => write!(
                f,
                "{} declarations are only allowed as `Name = {} ...`",
                kind.keyword(),
                kind.keyword()
            ),
            RenderError::NotADeclaration { name, found } => {
                write!(f, "`{}` must be assigned a declaration, found {}", name, found)
            }
            RenderError::DuplicateDeclaration { name, section } => {
                write!(f, "`{}` is declared twice in {}", name, section)
            }
            RenderError::DuplicateSection(section) => {
                write!(f, "{} is given more than once", section)
            }
            RenderError::InvalidNumber(text) => write!(f, "Number `{}` is out of range", text),
            RenderError::InvalidNameArgument { function, name } => {
                let expected = if function == intrinsics::IF {
                    "condition"
                } else {
                    "mapping"
                };
                write!(
                    f,
                    "{}: `{}` is not a declared {}",
                    function, name, expected
                )
            }
            RenderError::InStatement { line, source } => write!(f, "line {}: {}", line, source),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::InStatement { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    Parse(ParseError),
    Render(RenderError),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Parse(e) => write!(f, "Parse error: {}", e),
            CompileError::Render(e) => write!(f, "Render error: {}", e),
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompileError::Parse(e) => Some(e),
            CompileError::Render(e) => Some(e),
        }
    }
}

impl From<ParseError> for CompileError {
    fn from(e: ParseError) -> Self {
        CompileError::Parse(e)
    }
}

impl From<RenderError> for CompileError {
    fn from(e: RenderError) -> Self {
        CompileError::Render(e)
    }
}

/// Compile source text into a document tree.
pub fn compile(source: &str) -> Result<Value, CompileError> {
    let mut parser = Parser::new(Lexer::new(source))?;
    let document = parser.parse()?;
    Ok(render_document(&document)?)
}

pub fn render_document(document: &Document) -> Result<Value, RenderError> {
    let symbols = SymbolTable::from_document(document);
    let ctx = RenderContext::new(&symbols);

    let mut root = Map::new();
    for statement in &document.statements {
        let line = match statement {
            Statement::Assignment(assignment) => assignment.line,
            Statement::Section(section) => section.line,
        };
        render_statement(statement, &ctx, &mut root).map_err(|source| {
            RenderError::InStatement {
                line,
                source: Box::new(source),
            }
        })?;
    }
    Ok(Value::Object(root))
}

fn render_statement(
    statement: &Statement,
    ctx: &RenderContext,
    root: &mut Map<String, Value>,
) -> Result<(), RenderError> {
    match statement {
        Statement::Section(section) => {
            let key = section.kind.keyword();
            if root.contains_key(key) {
                return Err(RenderError::DuplicateSection(key));
            }
            root.insert(key.to_string(), section.value.render(ctx)?);
        }
        Statement::Assignment(assignment) => {
            let Expr::Declaration(declaration) = &assignment.value else {
                return Err(RenderError::NotADeclaration {
                    name: assignment.name.clone(),
                    found: assignment.value.describe(),
                });
            };

            let section = declaration.kind().section_key();
            let value = render_declaration(declaration, ctx)?;
            let entries = root
                .entry(section)
                .or_insert_with(|| Value::Object(Map::new()))
                .as_object_mut()
                .ok_or(RenderError::DuplicateSection(section))?;

            if entries.contains_key(&assignment.name) {
                return Err(RenderError::DuplicateDeclaration {
                    name: assignment.name.clone(),
                    section,
                });
            }
            entries.insert(assignment.name.clone(), value);
        }
    }
    Ok(())
}

fn render_declaration(declaration: &Declaration, ctx: &RenderContext) -> Result<Value, RenderError> {
    match declaration {
        Declaration::Resource(resource) => render_resource(resource, ctx),
        Declaration::Output(body) => {
            let mut value = body.render(ctx)?;
            if let Some(condition) = value.get_mut(intrinsics::CONDITION_KEY) {
                *condition = unwrap_reference(condition.take());
            }
            Ok(value)
        }
        Declaration::Parameter(body)
        | Declaration::Mapping(body)
        | Declaration::Condition(body)
        | Declaration::Rule(body) => body.render(ctx),
    }
}

fn render_resource(resource: &Resource, ctx: &RenderContext) -> Result<Value, RenderError> {
    let mut entry = Map::new();
    entry.insert(
        "Type".to_string(),
        Value::String(resource.resource_type.to_string()),
    );

    if let Some(properties) = &resource.properties {
        entry.insert("Properties".to_string(), properties.render(ctx)?);
    }

    for attribute in &resource.attributes {
        let mut value = attribute.value.render(ctx)?;
        if attribute.kind.takes_names() {
            value = unwrap_reference(value);
        }
        entry.insert(attribute.kind.name().to_string(), value);
    }

    Ok(Value::Object(entry))
}

/// `{"Ref": n}` / `{"Condition": n}` to the bare name `n`, element-wise for
/// arrays. Anything else is returned unchanged.
pub fn unwrap_reference(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(unwrap_name).collect()),
        other => unwrap_name(other),
    }
}

fn unwrap_name(value: Value) -> Value {
    if let Value::Object(map) = &value {
        if map.len() == 1 {
            for key in [intrinsics::REF_KEY, intrinsics::CONDITION_KEY] {
                if let Some(Value::String(name)) = map.get(key) {
                    return Value::String(name.clone());
                }
            }
        }
    }
    value
}

/// Read-only state shared by every render call.
pub struct RenderContext<'a> {
    symbols: &'a SymbolTable,
}

impl<'a> RenderContext<'a> {
    pub fn new(symbols: &'a SymbolTable) -> Self {
        RenderContext { symbols }
    }

    pub fn symbols(&self) -> &SymbolTable {
        self.symbols
    }

    fn reference(&self, name: &str) -> Result<Value, RenderError> {
        let key = match self.symbols.resolve(name) {
            Some(Reference::Ref) => intrinsics::REF_KEY,
            Some(Reference::Condition) => intrinsics::CONDITION_KEY,
            None => return Err(RenderError::UndeclaredIdentifier(name.to_string())),
        };
        Ok(single(key, Value::String(name.to_string())))
    }

    /// First argument of `If`/`FindInMap`: names render as bare strings.
    fn name_argument(&self, function: &str, arg: &Expr) -> Result<Value, RenderError> {
        match arg {
            Expr::Identifier(name) => {
                let declared = if function == intrinsics::IF {
                    self.symbols.is_condition(name)
                } else {
                    self.symbols.is_mapping(name)
                };
                if !declared {
                    return Err(RenderError::InvalidNameArgument {
                        function: function.to_string(),
                        name: name.clone(),
                    });
                }
                Ok(Value::String(name.clone()))
            }
            other => other.render(self),
        }
    }

    /// `A.b["c"]` -> `["A", "b", "c"]`
    fn attribute_path(&self, expr: &Expr) -> Result<Vec<String>, RenderError> {
        match expr {
            Expr::Identifier(name) => {
                if !intrinsics::is_pseudo(name) && !self.symbols.is_declared(name) {
                    return Err(RenderError::UndeclaredIdentifier(name.clone()));
                }
                Ok(vec![name.clone()])
            }
            Expr::MemberAccess { object, path } => {
                let mut segments = self.attribute_path(object)?;
                segments.extend(path.iter().cloned());
                Ok(segments)
            }
            Expr::BracketAccess { object, names } => {
                let mut segments = self.attribute_path(object)?;
                segments.extend(names.iter().cloned());
                Ok(segments)
            }
            other => Err(RenderError::InvalidMemberAccess(other.describe())),
        }
    }
}

fn single(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Value::Object(map)
}

fn render_number(text: &str) -> Result<Value, RenderError> {
    if let Ok(n) = text.parse::<i64>() {
        return Ok(Value::from(n));
    }
    if let Ok(n) = text.parse::<u64>() {
        return Ok(Value::from(n));
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| RenderError::InvalidNumber(text.to_string()))
}

fn render_call(name: &str, args: &[Expr], ctx: &RenderContext) -> Result<Value, RenderError> {
    let value = match args {
        [first, rest @ ..] if !rest.is_empty() && intrinsics::takes_name_argument(name) => {
            let mut rendered = vec![ctx.name_argument(name, first)?];
            for arg in rest {
                rendered.push(arg.render(ctx)?);
            }
            Value::Array(rendered)
        }
        [only] if !intrinsics::always_array(name) => only.render(ctx)?,
        _ => Value::Array(render_all(args, ctx)?),
    };
    Ok(single(&intrinsics::document_key(name), value))
}

fn render_all(items: &[Expr], ctx: &RenderContext) -> Result<Vec<Value>, RenderError> {
    items.iter().map(|item| item.render(ctx)).collect()
}

impl Expr {
    /// Render this node into a document subtree.
    pub fn render(&self, ctx: &RenderContext) -> Result<Value, RenderError> {
        match self {
            Expr::Literal(Literal::String(s)) => Ok(Value::String(s.clone())),
            Expr::Literal(Literal::Number(n)) => render_number(n),
            Expr::Literal(Literal::Boolean(b)) => Ok(Value::Bool(*b)),
            Expr::Literal(Literal::Null) => Ok(Value::Null),
            Expr::Identifier(name) => ctx.reference(name),
            Expr::Object(pairs) => {
                let mut map = Map::new();
                for (key, value) in pairs {
                    map.insert(key.clone(), value.render(ctx)?);
                }
                Ok(Value::Object(map))
            }
            Expr::Array(items) => Ok(Value::Array(render_all(items, ctx)?)),
            Expr::MemberAccess { .. } | Expr::BracketAccess { .. } => {
                let path = ctx.attribute_path(self)?;
                Ok(single(
                    &intrinsics::document_key(intrinsics::GET_ATT),
                    Value::Array(path.into_iter().map(Value::String).collect()),
                ))
            }
            Expr::Call { name, args } => render_call(name, args, ctx),
            Expr::Declaration(declaration) => {
                Err(RenderError::MisplacedDeclaration(declaration.kind()))
            }
        }
    }
}
