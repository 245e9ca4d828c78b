//! Lexer for cfn-script source text.
//!
//! Produces one [`Token`] per call to [`Lexer::next_token`]. Whitespace and
//! comments (`# ...` and `// ...` to end of line) are skipped before each token.
//!
//! Numbers that run straight into identifier characters (`3Bucket`) are lexed
//! as a single identifier, so declaration names may start with a digit. A
//! fractional or negative number followed by identifier characters is an error.

use std::fmt;

use crate::ast::{Token, TokenKind};

/// A 1-based line/column location in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Position { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A malformed character run or unterminated string.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub message: String,
    pub position: Position,
}

impl LexError {
    fn new(message: impl Into<String>, position: Position) -> Self {
        LexError {
            message: message.into(),
            position,
        }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.position)
    }
}

impl std::error::Error for LexError {}

fn is_identifier_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == '$'
}

fn is_identifier_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '$'
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Where the next unread character sits.
    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            self.position += 1;
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn skip_trivia(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else if ch == '#' || (ch == '/' && self.peek_char(1) == Some('/')) {
                while let Some(c) = self.current_char() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn read_while(&mut self, text: &mut String, accept: fn(char) -> bool) {
        while let Some(ch) = self.current_char() {
            if !accept(ch) {
                break;
            }
            text.push(ch);
            self.advance();
        }
    }

    fn read_string(&mut self, quote: char, start: Position) -> Result<TokenKind, LexError> {
        let mut result = String::new();
        self.advance(); // opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == quote => {
                    self.advance();
                    return Ok(TokenKind::String(result));
                }
                '\\' => {
                    let escape_at = self.position();
                    self.advance();
                    let decoded = match self.current_char() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('\\') => '\\',
                        Some('"') => '"',
                        Some('\'') => '\'',
                        Some(other) => {
                            return Err(LexError::new(
                                format!("Invalid escape sequence '\\{}'", other),
                                escape_at,
                            ));
                        }
                        None => break,
                    };
                    result.push(decoded);
                    self.advance();
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(LexError::new("Unterminated string", start))
    }

    fn read_number(&mut self, start: Position) -> Result<TokenKind, LexError> {
        let mut text = String::new();
        let negative = self.current_char() == Some('-');
        if negative {
            text.push('-');
            self.advance();
        }
        self.read_while(&mut text, |c| c.is_ascii_digit());

        // Digits running into a name: the whole run is an identifier.
        if self.current_char().is_some_and(is_identifier_start) {
            if negative {
                return Err(self.malformed_number(text, start));
            }
            self.read_while(&mut text, is_identifier_continue);
            return Ok(TokenKind::Identifier(text));
        }

        if self.current_char() == Some('.') && self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) {
            text.push('.');
            self.advance();
            self.read_while(&mut text, |c| c.is_ascii_digit());
            if self.current_char().is_some_and(is_identifier_continue) {
                return Err(self.malformed_number(text, start));
            }
        }

        Ok(TokenKind::Number(text))
    }

    fn malformed_number(&mut self, mut text: String, start: Position) -> LexError {
        self.read_while(&mut text, is_identifier_continue);
        LexError::new(format!("Malformed number '{}'", text), start)
    }

    /// Consume `first` (and `second` when it follows) as one operator token.
    fn operator(
        &mut self,
        second: char,
        double: TokenKind,
        single: Option<TokenKind>,
        start: Position,
    ) -> Result<TokenKind, LexError> {
        let first = self.current_char();
        self.advance();
        if self.current_char() == Some(second) {
            self.advance();
            return Ok(double);
        }
        single.ok_or_else(|| {
            LexError::new(
                format!(
                    "Unexpected character '{}' (did you mean '{}'?)",
                    first.unwrap_or_default(),
                    double
                ),
                start,
            )
        })
    }

    fn single(&mut self, kind: TokenKind) -> Result<TokenKind, LexError> {
        self.advance();
        Ok(kind)
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_trivia();
        let start = self.position();

        let kind = match self.current_char() {
            None => Ok(TokenKind::Eof),
            Some('(') => self.single(TokenKind::LParen),
            Some(')') => self.single(TokenKind::RParen),
            Some('{') => self.single(TokenKind::LBrace),
            Some('}') => self.single(TokenKind::RBrace),
            Some('[') => self.single(TokenKind::LBracket),
            Some(']') => self.single(TokenKind::RBracket),
            Some(',') => self.single(TokenKind::Comma),
            Some('.') => self.single(TokenKind::Dot),
            Some('=') => self.operator('=', TokenKind::EqEq, Some(TokenKind::Equal), start),
            Some('!') => self.operator('=', TokenKind::NotEq, Some(TokenKind::Bang), start),
            Some(':') => self.operator(':', TokenKind::ColonColon, Some(TokenKind::Colon), start),
            Some('&') => self.operator('&', TokenKind::AndAnd, None, start),
            Some('|') => self.operator('|', TokenKind::OrOr, None, start),
            Some(quote @ ('"' | '\'')) => self.read_string(quote, start),
            Some('-') if self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.read_number(start)
            }
            Some(ch) if ch.is_ascii_digit() => self.read_number(start),
            Some(ch) if is_identifier_start(ch) => {
                let mut name = String::new();
                self.read_while(&mut name, is_identifier_continue);
                Ok(TokenKind::Identifier(name))
            }
            Some(ch) => Err(LexError::new(
                format!("Unexpected character '{}'", ch),
                start,
            )),
        }?;

        Ok(Token::new(kind, start))
    }

    /// Look at the next token without consuming it.
    pub fn peek(&mut self) -> Result<Token, LexError> {
        let saved = (self.position, self.line, self.column);
        let token = self.next_token();
        (self.position, self.line, self.column) = saved;
        token
    }
}

#[test]
fn test_operators_longest_match() {
    let mut lexer = Lexer::new("= == ! != : :: && ||");
    let kinds: Vec<TokenKind> = std::iter::from_fn(|| {
        let token = lexer.next_token().unwrap();
        (token.kind != TokenKind::Eof).then_some(token.kind)
    })
    .collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Equal,
            TokenKind::EqEq,
            TokenKind::Bang,
            TokenKind::NotEq,
            TokenKind::Colon,
            TokenKind::ColonColon,
            TokenKind::AndAnd,
            TokenKind::OrOr,
        ]
    );
}

#[test]
fn test_peek_does_not_advance() {
    let mut lexer = Lexer::new("Env\n  = 1");
    lexer.next_token().unwrap();
    let peeked = lexer.peek().unwrap();
    assert_eq!(peeked.kind, TokenKind::Equal);
    assert_eq!(peeked.position, Position::new(2, 3));
    assert_eq!(lexer.next_token().unwrap(), peeked);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Number("1".into()));
}

#[test]
fn test_digit_leading_identifier() {
    let mut lexer = Lexer::new("3Bucket 42");
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Identifier("3Bucket".into()));
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Number("42".into()));
}
