use std::fmt;

use crate::lexer::Position;

/// A token produced by the lexer, together with where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, position: Position) -> Self {
        Token { kind, position }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    /// Identifier or keyword
    ///
    /// Keywords (`Resource`, `Condition`, `true`, ...) are plain identifiers at
    /// this level; the parser decides what they mean from context.
    ///
    /// # Examples
    /// ```text
    /// Bucket
    /// _internal
    /// $root
    /// 3Bucket
    /// ```
    Identifier(String),

    /// String literal with escapes already decoded
    ///
    /// # Examples
    /// ```text
    /// "hello"
    /// 'it\'s'
    /// ```
    String(String),

    /// Numeric literal, kept as written so the renderer decides integer vs float
    ///
    /// # Examples
    /// ```text
    /// 42
    /// -1
    /// 3.25
    /// ```
    Number(String),

    // Punctuation
    /// Assignment `=`
    Equal,

    /// Left parenthesis for grouping, calls and resource modifiers
    LParen,

    /// Right parenthesis
    RParen,

    /// Left brace for object literals
    LBrace,

    /// Right brace
    RBrace,

    /// Left bracket for array literals and bracket attribute access
    LBracket,

    /// Right bracket
    RBracket,

    /// Comma separating arguments, elements and properties
    Comma,

    /// Dot for attribute access
    Dot,

    /// Colon for object literal key-value pairs
    Colon,

    /// Namespace separator `::` inside resource types
    ///
    /// # Examples
    /// ```text
    /// AWS::S3::Bucket
    /// ```
    ColonColon,

    // Operators
    /// Equality `==`
    EqEq,

    /// Inequality `!=`
    NotEq,

    /// Logical and `&&`
    AndAnd,

    /// Logical or `||`
    OrOr,

    /// Logical not `!`
    Bang,

    /// End of input
    Eof,
}

impl TokenKind {
    /// Human-readable name used in parse error messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Identifier(name) => format!("identifier `{}`", name),
            TokenKind::String(s) => format!("string {:?}", s),
            TokenKind::Number(n) => format!("number `{}`", n),
            TokenKind::Eof => "end of input".to_string(),
            other => format!("`{}`", other),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::Identifier(name) => return write!(f, "{}", name),
            TokenKind::String(s) => return write!(f, "{:?}", s),
            TokenKind::Number(n) => return write!(f, "{}", n),
            TokenKind::Equal => "=",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::Colon => ":",
            TokenKind::ColonColon => "::",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::AndAnd => "&&",
            TokenKind::OrOr => "||",
            TokenKind::Bang => "!",
            TokenKind::Eof => "<eof>",
        };
        f.write_str(text)
    }
}
