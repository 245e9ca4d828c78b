//! Source direction: AST back to source text.
//!
//! Operator-shaped calls print as operators, with parentheses only where the
//! binding power of an operand is too low to reparse into the same tree.

use std::sync::OnceLock;

use regex::Regex;

use crate::ast::{
    intrinsics, Declaration, Document, Expr, Literal, Resource, ResourceType, Statement,
};

/// Binding power of printed forms, loosest first.
pub(crate) const PREC_DECLARATION: u8 = 0;
pub(crate) const PREC_OR: u8 = 1;
pub(crate) const PREC_AND: u8 = 2;
pub(crate) const PREC_EQUALITY: u8 = 3;
pub(crate) const PREC_UNARY: u8 = 4;
pub(crate) const PREC_POSTFIX: u8 = 5;

/// A printed fragment and the binding power of its outermost form.
pub(crate) type Fragment = (String, u8);

pub(crate) fn is_identifier(name: &str) -> bool {
    static IDENTIFIER: OnceLock<Regex> = OnceLock::new();
    IDENTIFIER
        .get_or_init(|| {
            Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("identifier pattern compiles")
        })
        .is_match(name)
}

/// Double-quoted string literal; inverts the lexer's escapes.
pub(crate) fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Object keys and assignment names: bare when they lex as one identifier.
pub(crate) fn format_key(key: &str) -> String {
    if is_identifier(key) {
        key.to_string()
    } else {
        quote(key)
    }
}

pub(crate) fn wrap((text, prec): Fragment, min: u8) -> String {
    if prec < min {
        format!("({})", text)
    } else {
        text
    }
}

pub(crate) fn object(properties: Vec<(String, String)>) -> String {
    if properties.is_empty() {
        return "{}".to_string();
    }
    let body: Vec<String> = properties
        .into_iter()
        .map(|(key, value)| format!("{}: {}", format_key(&key), value))
        .collect();
    format!("{{ {} }}", body.join(", "))
}

pub(crate) fn array(items: Vec<String>) -> String {
    format!("[{}]", items.join(", "))
}

pub(crate) fn call(name: &str, args: Vec<String>) -> String {
    format!("{}({})", name, args.join(", "))
}

pub(crate) fn bracket_names(names: &[String]) -> String {
    let quoted: Vec<String> = names.iter().map(|name| quote(name)).collect();
    format!("[{}]", quoted.join(", "))
}

pub(crate) fn equality(left: Fragment, operator: &str, right: Fragment) -> Fragment {
    (
        format!(
            "{} {} {}",
            wrap(left, PREC_UNARY),
            operator,
            wrap(right, PREC_UNARY)
        ),
        PREC_EQUALITY,
    )
}

pub(crate) fn not(operand: Fragment) -> Fragment {
    (format!("!{}", wrap(operand, PREC_UNARY)), PREC_UNARY)
}

/// `a && b && c` / `a || b`. Operands bind strictly tighter than the
/// operator so a nested chain keeps its parentheses.
pub(crate) fn logical(operands: Vec<Fragment>, prec: u8) -> Fragment {
    let operator = if prec == PREC_AND { " && " } else { " || " };
    let parts: Vec<String> = operands
        .into_iter()
        .map(|operand| wrap(operand, prec + 1))
        .collect();
    (parts.join(operator), prec)
}

impl Expr {
    pub fn to_source(&self) -> String {
        self.fragment().0
    }

    fn fragment(&self) -> Fragment {
        match self {
            Expr::Literal(literal) => (literal_source(literal), PREC_POSTFIX),
            Expr::Identifier(name) => match name.strip_prefix(intrinsics::PSEUDO_PREFIX) {
                Some(pseudo) => (
                    format!("{}.{}", intrinsics::PSEUDO_MARKER, pseudo),
                    PREC_POSTFIX,
                ),
                None => (name.clone(), PREC_POSTFIX),
            },
            Expr::Object(pairs) => (
                object(
                    pairs
                        .iter()
                        .map(|(key, value)| (key.clone(), value.to_source()))
                        .collect(),
                ),
                PREC_POSTFIX,
            ),
            Expr::Array(items) => (
                array(items.iter().map(Expr::to_source).collect()),
                PREC_POSTFIX,
            ),
            Expr::MemberAccess { object, path } => (
                format!("{}.{}", wrap(object.fragment(), PREC_POSTFIX), path.join(".")),
                PREC_POSTFIX,
            ),
            Expr::BracketAccess { object, names } => (
                format!(
                    "{}{}",
                    wrap(object.fragment(), PREC_POSTFIX),
                    bracket_names(names)
                ),
                PREC_POSTFIX,
            ),
            Expr::Call { name, args } => call_fragment(name, args),
            Expr::Declaration(declaration) => (declaration.to_source(), PREC_DECLARATION),
        }
    }
}

fn literal_source(literal: &Literal) -> String {
    match literal {
        Literal::String(s) => quote(s),
        Literal::Number(n) => n.clone(),
        Literal::Boolean(b) => b.to_string(),
        Literal::Null => "null".to_string(),
    }
}

fn call_fragment(name: &str, args: &[Expr]) -> Fragment {
    match (name, args) {
        (intrinsics::EQUALS, [left, right]) => {
            equality(left.fragment(), "==", right.fragment())
        }
        (intrinsics::NOT, [operand]) => match operand {
            Expr::Call { name, args } if name == intrinsics::EQUALS && args.len() == 2 => {
                equality(args[0].fragment(), "!=", args[1].fragment())
            }
            other => not(other.fragment()),
        },
        (intrinsics::AND, [_, _, ..]) => {
            logical(args.iter().map(Expr::fragment).collect(), PREC_AND)
        }
        (intrinsics::OR, [_, _, ..]) => {
            logical(args.iter().map(Expr::fragment).collect(), PREC_OR)
        }
        _ => (
            call(name, args.iter().map(Expr::to_source).collect()),
            PREC_POSTFIX,
        ),
    }
}

impl ResourceType {
    pub fn to_source(&self) -> String {
        match self {
            ResourceType::Path(segments) => segments.join("::"),
            ResourceType::Quoted(name) => quote(name),
        }
    }
}

impl Resource {
    pub fn to_source(&self) -> String {
        let mut out = format!("Resource {}", self.resource_type.to_source());
        if let Some(properties) = &self.properties {
            out.push(' ');
            out.push_str(&properties.to_source());
        }
        for attribute in &self.attributes {
            out.push(' ');
            out.push_str(&call(attribute.kind.name(), vec![attribute.value.to_source()]));
        }
        out
    }
}

impl Declaration {
    pub fn to_source(&self) -> String {
        let body = match self {
            Declaration::Resource(resource) => return resource.to_source(),
            Declaration::Condition(expr) => expr.fragment(),
            Declaration::Parameter(body)
            | Declaration::Output(body)
            | Declaration::Mapping(body)
            | Declaration::Rule(body) => body.fragment(),
        };
        format!("{} {}", self.kind().keyword(), wrap(body, PREC_OR))
    }
}

impl Statement {
    pub fn to_source(&self) -> String {
        match self {
            Statement::Assignment(assignment) => format!(
                "{} = {}",
                format_key(&assignment.name),
                assignment.value.to_source()
            ),
            Statement::Section(section) => {
                format!("{} {}", section.kind.keyword(), section.value.to_source())
            }
        }
    }
}

impl Document {
    /// One statement per line.
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        for statement in &self.statements {
            out.push_str(&statement.to_source());
            out.push('\n');
        }
        out
    }
}
