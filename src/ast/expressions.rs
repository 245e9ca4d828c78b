use crate::ast::Declaration;

/// Scalar literal values.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// String literal
    ///
    /// # Example
    /// ```text
    /// "production"
    /// ```
    String(String),

    /// Number kept as its source spelling (`42`, `-1`, `0.5`)
    Number(String),

    /// `true` / `false`
    Boolean(bool),

    /// `null`
    Null,
}

/// Abstract Syntax Tree node for an expression.
///
/// Every node renders two ways: into a document subtree (see
/// [`crate::compiler`]) and back into source text (see [`crate::source`]).
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),

    /// Bare name: a parameter, resource, condition or mapping.
    ///
    /// Which one is decided at render time from the symbol table. Pseudo
    /// parameters are stored with their namespaced spelling (`AWS::Region`).
    ///
    /// # Examples
    /// ```text
    /// Env
    /// AWS.Region      // Identifier("AWS::Region")
    /// ```
    Identifier(String),

    /// Object literal; keys keep their source order
    ///
    /// # Example
    /// ```text
    /// { Type: "String", Default: "dev" }
    /// ```
    Object(Vec<(String, Expr)>),

    /// Array literal
    ///
    /// # Example
    /// ```text
    /// [Env, "suffix"]
    /// ```
    Array(Vec<Expr>),

    /// Dot attribute access; `a.b.c` is one node with `path = ["b", "c"]`
    ///
    /// # Examples
    /// ```text
    /// Bucket.Arn
    /// Widget.Compliance.Type
    /// ```
    MemberAccess { object: Box<Expr>, path: Vec<String> },

    /// Bracket attribute access with quoted segment names
    ///
    /// # Examples
    /// ```text
    /// Db["Endpoint.Address"]
    /// Widget["Compliance", "Type"]
    /// ```
    BracketAccess { object: Box<Expr>, names: Vec<String> },

    /// Intrinsic operation; operators desugar to these too
    ///
    /// # Examples
    /// ```text
    /// Join("-", [AWS.StackName, Env])
    /// Env == "prod"          // Call { name: "Equals", .. }
    /// ```
    Call { name: String, args: Vec<Expr> },

    /// Declaration; only meaningful as the right-hand side of an assignment
    Declaration(Box<Declaration>),
}

impl Expr {
    pub fn string(value: impl Into<String>) -> Self {
        Expr::Literal(Literal::String(value.into()))
    }

    pub fn identifier(name: impl Into<String>) -> Self {
        Expr::Identifier(name.into())
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            name: name.into(),
            args,
        }
    }

    /// Short noun phrase naming the node kind, for error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Expr::Literal(Literal::String(_)) => "a string",
            Expr::Literal(Literal::Number(_)) => "a number",
            Expr::Literal(Literal::Boolean(_)) => "a boolean",
            Expr::Literal(Literal::Null) => "null",
            Expr::Identifier(_) => "an identifier",
            Expr::Object(_) => "an object literal",
            Expr::Array(_) => "an array literal",
            Expr::MemberAccess { .. } | Expr::BracketAccess { .. } => "an attribute access",
            Expr::Call { .. } => "a function call",
            Expr::Declaration(_) => "a declaration",
        }
    }
}
