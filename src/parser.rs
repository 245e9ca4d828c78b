use std::{fmt, mem};

use crate::{
    ast::{
        intrinsics, Assignment, AttributeKind, Declaration, DeclarationKind, Document, Expr,
        Literal, Resource, ResourceAttribute, ResourceType, Section, SectionKind, Statement, Token,
        TokenKind,
    },
    lexer::{LexError, Lexer, Position},
};

/// Nesting limit for expressions. Every level costs about a dozen frames, so
/// this stays well inside a 2 MiB thread stack in debug builds.
pub const MAX_DEPTH: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The lexer failed while the parser was pulling tokens
    Lex(LexError),

    /// Wrong token at an `expect` point
    Unexpected {
        expected: String,
        found: String,
        position: Position,
    },

    /// Call syntax for a name that has dedicated syntax
    ForbiddenCall {
        name: String,
        hint: &'static str,
        position: Position,
    },

    InvalidResourceType {
        message: String,
        position: Position,
    },

    /// Section keyword followed by a value of the wrong shape
    InvalidSection {
        section: &'static str,
        expected: &'static str,
        position: Position,
    },

    /// Repeated object key or resource attribute
    Duplicate { what: String, position: Position },

    TooDeep { position: Position },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Lex(e) => write!(f, "{}", e),
            ParseError::Unexpected {
                expected,
                found,
                position,
            } => write!(f, "Expected {}, found {} at {}", expected, found, position),
            ParseError::ForbiddenCall {
                name,
                hint,
                position,
            } => write!(f, "{}(...) cannot be called; {} at {}", name, hint, position),
            ParseError::InvalidResourceType { message, position } => {
                write!(f, "{} at {}", message, position)
            }
            ParseError::InvalidSection {
                section,
                expected,
                position,
            } => write!(f, "{} expects {} at {}", section, expected, position),
            ParseError::Duplicate { what, position } => {
                write!(f, "Duplicate {} at {}", what, position)
            }
            ParseError::TooDeep { position } => write!(
                f,
                "Expression nesting exceeds {} levels at {}",
                MAX_DEPTH, position
            ),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Lex(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LexError> for ParseError {
    fn from(e: LexError) -> Self {
        ParseError::Lex(e)
    }
}

pub struct Parser {
    lexer: Lexer,
    current_token: Token,
    depth: usize,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Result<Self, ParseError> {
        let current_token = lexer.next_token()?;
        Ok(Parser {
            lexer,
            current_token,
            depth: 0,
        })
    }

    /// Move to the next token, returning the one just consumed.
    fn advance(&mut self) -> Result<Token, ParseError> {
        let next = self.lexer.next_token()?;
        Ok(mem::replace(&mut self.current_token, next))
    }

    /// The token after the current one.
    fn peek(&mut self) -> Result<Token, ParseError> {
        Ok(self.lexer.peek()?)
    }

    fn check(&self, kind: &TokenKind) -> bool {
        mem::discriminant(&self.current_token.kind) == mem::discriminant(kind)
    }

    fn position(&self) -> Position {
        self.current_token.position
    }

    fn unexpected(&self, expected: impl Into<String>) -> ParseError {
        ParseError::Unexpected {
            expected: expected.into(),
            found: self.current_token.kind.describe(),
            position: self.position(),
        }
    }

    fn expect(&mut self, expected: TokenKind) -> Result<Token, ParseError> {
        if !self.check(&expected) {
            return Err(self.unexpected(format!("`{}`", expected)));
        }
        self.advance()
    }

    fn expect_identifier(&mut self, what: &str) -> Result<String, ParseError> {
        match &self.current_token.kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance()?;
                Ok(name)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(ParseError::TooDeep {
                position: self.position(),
            });
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Parse a complete document
    pub fn parse(&mut self) -> Result<Document, ParseError> {
        let mut statements = vec![];
        while !self.check(&TokenKind::Eof) {
            statements.push(self.parse_statement()?);
        }
        Ok(Document { statements })
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        let line = self.position().line;

        match &self.current_token.kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                // `Metadata { ... }` is a section, `Metadata = ...` an assignment.
                if self.peek()?.kind != TokenKind::Equal {
                    if let Some(kind) = SectionKind::from_keyword(&name) {
                        return self.parse_section(kind);
                    }
                }
                self.advance()?;
                self.parse_assignment(name, line)
            }
            TokenKind::String(name) => {
                let name = name.clone();
                self.advance()?;
                self.parse_assignment(name, line)
            }
            _ => Err(self.unexpected("a statement (`Name = ...` or a section keyword)")),
        }
    }

    fn parse_assignment(&mut self, name: String, line: usize) -> Result<Statement, ParseError> {
        self.expect(TokenKind::Equal)?;
        let value = self.parse_expression()?;
        Ok(Statement::Assignment(Assignment { name, value, line }))
    }

    fn parse_section(&mut self, kind: SectionKind) -> Result<Statement, ParseError> {
        let position = self.position();
        self.advance()?; // keyword
        let value = self.parse_expression()?;

        let is_string = |expr: &Expr| matches!(expr, Expr::Literal(Literal::String(_)));
        let (valid, expected) = match kind {
            SectionKind::FormatVersion | SectionKind::Description => (is_string(&value), "a string"),
            SectionKind::Transform => (
                match &value {
                    Expr::Array(items) => items.iter().all(is_string),
                    other => is_string(other),
                },
                "a string or an array of strings",
            ),
            SectionKind::Metadata | SectionKind::Globals => {
                (matches!(value, Expr::Object(_)), "an object literal")
            }
        };
        if !valid {
            return Err(ParseError::InvalidSection {
                section: kind.keyword(),
                expected,
                position,
            });
        }

        Ok(Statement::Section(Section {
            kind,
            value,
            line: position.line,
        }))
    }

    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.nested(Self::parse_or)
    }

    /// `a op b op c` flattened into one call with every operand.
    fn parse_chain(
        &mut self,
        operator: TokenKind,
        name: &str,
        operand: fn(&mut Self) -> Result<Expr, ParseError>,
    ) -> Result<Expr, ParseError> {
        let first = operand(self)?;
        if !self.check(&operator) {
            return Ok(first);
        }

        let mut operands = vec![first];
        while self.check(&operator) {
            self.advance()?;
            operands.push(operand(self)?);
        }
        Ok(Expr::call(name, operands))
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        self.parse_chain(TokenKind::OrOr, intrinsics::OR, Self::parse_and)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        self.parse_chain(TokenKind::AndAnd, intrinsics::AND, Self::parse_equality)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_unary()?;

        let negate = match self.current_token.kind {
            TokenKind::EqEq => false,
            TokenKind::NotEq => true,
            _ => return Ok(left),
        };
        self.advance()?;
        let right = self.parse_unary()?;

        let equals = Expr::call(intrinsics::EQUALS, vec![left, right]);
        Ok(if negate {
            Expr::call(intrinsics::NOT, vec![equals])
        } else {
            equals
        })
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if self.check(&TokenKind::Bang) {
            self.advance()?;
            let operand = self.nested(Self::parse_unary)?;
            return Ok(Expr::call(intrinsics::NOT, vec![operand]));
        }
        self.parse_postfix()
    }

    /// Attribute access: `.name` chains and `["a", "b"]` brackets
    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        let mut wraps = 0;

        loop {
            if self.depth + wraps > MAX_DEPTH {
                return Err(ParseError::TooDeep {
                    position: self.position(),
                });
            }

            if self.check(&TokenKind::Dot) {
                self.advance()?;
                let name = self.expect_identifier("an attribute name after `.`")?;

                expr = match expr {
                    Expr::Identifier(base) if base == intrinsics::PSEUDO_MARKER => {
                        Expr::Identifier(format!("{}{}", intrinsics::PSEUDO_PREFIX, name))
                    }
                    Expr::MemberAccess { object, mut path } => {
                        path.push(name);
                        Expr::MemberAccess { object, path }
                    }
                    other => {
                        wraps += 1;
                        Expr::MemberAccess {
                            object: Box::new(other),
                            path: vec![name],
                        }
                    }
                };
            } else if self.check(&TokenKind::LBracket) {
                self.advance()?;
                let names = self.parse_bracket_names()?;
                wraps += 1;
                expr = Expr::BracketAccess {
                    object: Box::new(expr),
                    names,
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_bracket_names(&mut self) -> Result<Vec<String>, ParseError> {
        let mut names = vec![];

        loop {
            match &self.current_token.kind {
                TokenKind::String(name) => {
                    let name = name.clone();
                    self.advance()?;
                    names.push(name);
                }
                _ => return Err(self.unexpected("a quoted attribute name")),
            }

            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance()?;
            if self.check(&TokenKind::RBracket) {
                break;
            }
        }

        self.expect(TokenKind::RBracket)?;
        Ok(names)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let position = self.position();

        match &self.current_token.kind {
            TokenKind::String(s) => {
                let literal = Literal::String(s.clone());
                self.advance()?;
                Ok(Expr::Literal(literal))
            }
            TokenKind::Number(n) => {
                let literal = Literal::Number(n.clone());
                self.advance()?;
                Ok(Expr::Literal(literal))
            }
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.parse_identifier(name, position)
            }
            TokenKind::LParen => {
                self.advance()?;
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::LBrace => self.parse_object_literal(),
            TokenKind::LBracket => self.parse_array_literal(),
            _ => Err(self.unexpected("an expression")),
        }
    }

    /// Literal words, declarations, calls and bare references.
    fn parse_identifier(&mut self, name: String, position: Position) -> Result<Expr, ParseError> {
        match name.as_str() {
            "true" | "false" => {
                self.advance()?;
                Ok(Expr::Literal(Literal::Boolean(name == "true")))
            }
            "null" => {
                self.advance()?;
                Ok(Expr::Literal(Literal::Null))
            }
            _ => match DeclarationKind::from_keyword(&name) {
                Some(kind) => self.parse_declaration(kind),
                None => {
                    self.advance()?;
                    if self.check(&TokenKind::LParen) {
                        self.parse_call(name, position)
                    } else {
                        Ok(Expr::Identifier(name))
                    }
                }
            },
        }
    }

    fn parse_object_literal(&mut self) -> Result<Expr, ParseError> {
        self.expect(TokenKind::LBrace)?;
        let mut pairs: Vec<(String, Expr)> = vec![];

        while !self.check(&TokenKind::RBrace) {
            let position = self.position();
            let key = match &self.current_token.kind {
                TokenKind::Identifier(s) | TokenKind::String(s) => s.clone(),
                _ => return Err(self.unexpected("a property name or `}`")),
            };
            self.advance()?;

            if pairs.iter().any(|(existing, _)| *existing == key) {
                return Err(ParseError::Duplicate {
                    what: format!("property `{}`", key),
                    position,
                });
            }

            self.expect(TokenKind::Colon)?;
            let value = self.parse_expression()?;
            pairs.push((key, value));

            if !self.check(&TokenKind::RBrace) {
                self.expect(TokenKind::Comma)?;
            }
        }

        self.expect(TokenKind::RBrace)?;
        Ok(Expr::Object(pairs))
    }

    fn parse_array_literal(&mut self) -> Result<Expr, ParseError> {
        self.expect(TokenKind::LBracket)?;
        let elements = self.parse_list(TokenKind::RBracket)?;
        Ok(Expr::Array(elements))
    }

    /// Comma-separated expressions up to and including `close`.
    fn parse_list(&mut self, close: TokenKind) -> Result<Vec<Expr>, ParseError> {
        let mut elements = vec![];

        while !self.check(&close) {
            elements.push(self.parse_expression()?);

            if !self.check(&close) {
                self.expect(TokenKind::Comma)?;
            }
        }

        self.expect(close)?;
        Ok(elements)
    }

    fn parse_call(&mut self, name: String, position: Position) -> Result<Expr, ParseError> {
        if let Some(hint) = intrinsics::forbidden_call_hint(&name) {
            return Err(ParseError::ForbiddenCall {
                name,
                hint,
                position,
            });
        }

        self.expect(TokenKind::LParen)?;
        let args = self.parse_list(TokenKind::RParen)?;
        Ok(Expr::Call { name, args })
    }

    fn parse_declaration(&mut self, kind: DeclarationKind) -> Result<Expr, ParseError> {
        self.advance()?; // keyword

        let declaration = match kind {
            DeclarationKind::Resource => Declaration::Resource(self.parse_resource()?),
            DeclarationKind::Condition => Declaration::Condition(self.parse_expression()?),
            DeclarationKind::Parameter => Declaration::Parameter(self.parse_body(kind)?),
            DeclarationKind::Output => Declaration::Output(self.parse_body(kind)?),
            DeclarationKind::Mapping => Declaration::Mapping(self.parse_body(kind)?),
            DeclarationKind::Rule => Declaration::Rule(self.parse_body(kind)?),
        };
        Ok(Expr::Declaration(Box::new(declaration)))
    }

    fn parse_body(&mut self, kind: DeclarationKind) -> Result<Expr, ParseError> {
        if !self.check(&TokenKind::LBrace) {
            return Err(self.unexpected(format!("`{{` to open the {} body", kind.keyword())));
        }
        self.parse_object_literal()
    }

    /// `Resource <Type> [{ props }] [Modifier(expr)]*`
    fn parse_resource(&mut self) -> Result<Resource, ParseError> {
        let resource_type = self.parse_resource_type()?;

        // Absent and `{}` stay distinct all the way to the document.
        let properties = if self.check(&TokenKind::LBrace) {
            Some(self.parse_object_literal()?)
        } else {
            None
        };

        let mut attributes: Vec<ResourceAttribute> = vec![];
        loop {
            let kind = match &self.current_token.kind {
                TokenKind::Identifier(name) => AttributeKind::from_name(name),
                _ => None,
            };
            let Some(kind) = kind else { break };
            // `Condition = ...` on the next line starts a new statement.
            if self.peek()?.kind != TokenKind::LParen {
                break;
            }

            let position = self.position();
            self.advance()?;
            if attributes.iter().any(|attribute| attribute.kind == kind) {
                return Err(ParseError::Duplicate {
                    what: format!("resource attribute `{}`", kind.name()),
                    position,
                });
            }

            self.expect(TokenKind::LParen)?;
            let value = self.parse_expression()?;
            self.expect(TokenKind::RParen)?;
            attributes.push(ResourceAttribute { kind, value });
        }

        Ok(Resource {
            resource_type,
            properties,
            attributes,
        })
    }

    fn parse_resource_type(&mut self) -> Result<ResourceType, ParseError> {
        let position = self.position();

        match self.current_token.kind.clone() {
            TokenKind::String(name) => {
                self.advance()?;
                Ok(ResourceType::Quoted(name))
            }
            TokenKind::Identifier(first) => {
                self.advance()?;
                let mut segments = vec![first];
                while self.check(&TokenKind::ColonColon) {
                    self.advance()?;
                    segments.push(self.expect_identifier("a resource type segment after `::`")?);
                }

                if segments.len() < 2 {
                    return Err(ParseError::InvalidResourceType {
                        message: format!(
                            "Resource type `{}` must be a `::` path such as AWS::S3::Bucket",
                            segments.join("::")
                        ),
                        position,
                    });
                }
                Ok(ResourceType::Path(segments))
            }
            other => Err(ParseError::InvalidResourceType {
                message: format!(
                    "Expected a resource type such as AWS::S3::Bucket, found {}",
                    other.describe()
                ),
                position,
            }),
        }
    }
}
