//! # cfn-script - Abstract Syntax Tree
//!
//! The AST for cfn-script, a scripting syntax for CloudFormation-style
//! template documents.
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Expression nodes (literals, references, calls)
//! - **[declarations]** - Resource, Parameter, Output, Mapping, Condition, Rule
//! - **[statements]** - Assignments, sections and the document root
//! - **[intrinsics]** - Intrinsic function naming and argument-shape rules
//!
//! ## Quick Start
//!
//! ```text
//! Env = Parameter { Type: "String" }
//! IsProd = Condition Env == "production"
//! Bucket = Resource AWS::S3::Bucket { BucketName: Join("-", [AWS.StackName, Env]) } Condition(IsProd)
//! ```
//!
//! ## Operators
//!
//! Operators are sugar for intrinsic calls and bind, tightest first:
//!
//! - `.name` and `["a", "b"]` attribute access
//! - `!x` -> `Not(x)`
//! - `a == b` -> `Equals(a, b)`, `a != b` -> `Not(Equals(a, b))`
//! - `a && b && c` -> `And(a, b, c)`
//! - `a || b` -> `Or(a, b)`
//!
//! The tree is immutable once parsed and owns all of its children.
pub mod declarations;
pub mod expressions;
pub mod intrinsics;
pub mod statements;
pub mod tokens;

pub use declarations::{
    AttributeKind, Declaration, DeclarationKind, Resource, ResourceAttribute, ResourceType,
};
pub use expressions::{Expr, Literal};
pub use statements::{Assignment, Document, Section, SectionKind, Statement};
pub use tokens::{Token, TokenKind};
