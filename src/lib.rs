pub mod ast;
pub mod cli;
pub mod compiler;
pub mod decompiler;
pub mod document;
pub mod lexer;
pub mod parser;
pub mod pretty;
pub mod source;
pub mod symbols;

pub use ast::{Declaration, Document, Expr, Literal, Statement, Token, TokenKind};
pub use compiler::{compile, CompileError, RenderContext, RenderError};
pub use decompiler::{decompile, DecodeError, Decompiler};
pub use document::{parse_document, render_document, DocumentError, Format};
pub use lexer::{LexError, Lexer, Position};
pub use parser::{ParseError, Parser};
pub use pretty::pretty_print;
pub use symbols::{Reference, SymbolTable};
