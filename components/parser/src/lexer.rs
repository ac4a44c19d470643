//! C0 lexer - tokenizes source code into tokens
//!
//! The lexer is pull-based with one token of lookahead: [`Lexer::peek_token`]
//! scans ahead without consuming, [`Lexer::next_token`] consumes.

use crate::error::{lex_error, LexResult};
use core_types::{ErrorKind, SourcePosition};
use std::fmt;

/// C0 keyword types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    /// fn keyword
    Fn,
    /// let keyword
    Let,
    /// const keyword
    Const,
    /// as keyword
    As,
    /// while keyword
    While,
    /// if keyword
    If,
    /// else keyword
    Else,
    /// return keyword
    Return,
    /// break keyword
    Break,
    /// continue keyword
    Continue,
}

impl Keyword {
    fn from_ident(ident: &str) -> Option<Self> {
        match ident {
            "fn" => Some(Keyword::Fn),
            "let" => Some(Keyword::Let),
            "const" => Some(Keyword::Const),
            "as" => Some(Keyword::As),
            "while" => Some(Keyword::While),
            "if" => Some(Keyword::If),
            "else" => Some(Keyword::Else),
            "return" => Some(Keyword::Return),
            "break" => Some(Keyword::Break),
            "continue" => Some(Keyword::Continue),
            _ => None,
        }
    }

    /// Source spelling
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Fn => "fn",
            Keyword::Let => "let",
            Keyword::Const => "const",
            Keyword::As => "as",
            Keyword::While => "while",
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::Return => "return",
            Keyword::Break => "break",
            Keyword::Continue => "continue",
        }
    }
}

/// C0 punctuators (operators and delimiters)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punctuator {
    /// Plus
    Plus,
    /// Minus
    Minus,
    /// Multiply
    Star,
    /// Divide
    Slash,
    /// Assignment
    Assign,
    /// Equality
    EqEq,
    /// Inequality
    NotEq,
    /// Less than
    Lt,
    /// Greater than
    Gt,
    /// Less than or equal
    LtEq,
    /// Greater than or equal
    GtEq,
    /// Return type arrow
    Arrow,
    /// Opening parenthesis
    LParen,
    /// Closing parenthesis
    RParen,
    /// Opening brace
    LBrace,
    /// Closing brace
    RBrace,
    /// Comma
    Comma,
    /// Colon
    Colon,
    /// Semicolon
    Semicolon,
}

impl Punctuator {
    /// Source spelling
    pub fn as_str(self) -> &'static str {
        match self {
            Punctuator::Plus => "+",
            Punctuator::Minus => "-",
            Punctuator::Star => "*",
            Punctuator::Slash => "/",
            Punctuator::Assign => "=",
            Punctuator::EqEq => "==",
            Punctuator::NotEq => "!=",
            Punctuator::Lt => "<",
            Punctuator::Gt => ">",
            Punctuator::LtEq => "<=",
            Punctuator::GtEq => ">=",
            Punctuator::Arrow => "->",
            Punctuator::LParen => "(",
            Punctuator::RParen => ")",
            Punctuator::LBrace => "{",
            Punctuator::RBrace => "}",
            Punctuator::Comma => ",",
            Punctuator::Colon => ":",
            Punctuator::Semicolon => ";",
        }
    }

    /// Whether this is one of the six comparison operators
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Punctuator::EqEq
                | Punctuator::NotEq
                | Punctuator::Lt
                | Punctuator::Gt
                | Punctuator::LtEq
                | Punctuator::GtEq
        )
    }
}

/// The kind and payload of a token
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Identifier, including the type names `int`, `double` and `void`
    Identifier(String),
    /// Unsigned integer literal
    UInt(u64),
    /// Double literal
    Double(f64),
    /// String literal with escapes resolved
    String(String),
    /// Char literal with escapes resolved
    Char(char),
    /// Keyword
    Keyword(Keyword),
    /// Punctuator/operator
    Punctuator(Punctuator),
    /// End of file
    EOF,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Identifier(name) => write!(f, "identifier '{}'", name),
            TokenKind::UInt(value) => write!(f, "integer {}", value),
            TokenKind::Double(value) => write!(f, "double {}", value),
            TokenKind::String(text) => write!(f, "string {:?}", text),
            TokenKind::Char(c) => write!(f, "char {:?}", c),
            TokenKind::Keyword(kw) => write!(f, "'{}'", kw.as_str()),
            TokenKind::Punctuator(p) => write!(f, "'{}'", p.as_str()),
            TokenKind::EOF => write!(f, "end of file"),
        }
    }
}

/// Token produced by the lexer, with the positions it spans
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// What was scanned
    pub kind: TokenKind,
    /// Position of the first character
    pub start: SourcePosition,
    /// Position just past the last character
    pub end: SourcePosition,
}

impl Token {
    /// Whether this token is the given punctuator
    pub fn is_punct(&self, p: Punctuator) -> bool {
        self.kind == TokenKind::Punctuator(p)
    }

    /// Whether this token is the given keyword
    pub fn is_keyword(&self, kw: Keyword) -> bool {
        self.kind == TokenKind::Keyword(kw)
    }
}

/// Lexer for C0 source code
pub struct Lexer {
    chars: Vec<char>,
    position: usize,
    line: u32,
    column: u32,
    current_token: Option<Token>,
    finished: bool,
}

impl Lexer {
    /// Create a new lexer for the given source code
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            current_token: None,
            finished: false,
        }
    }

    /// Get the next token from the source
    pub fn next_token(&mut self) -> LexResult<Token> {
        if let Some(token) = self.current_token.take() {
            return Ok(token);
        }
        self.scan_token()
    }

    /// Peek at the next token without consuming it
    pub fn peek_token(&mut self) -> LexResult<&Token> {
        let token = match self.current_token.take() {
            Some(token) => token,
            None => self.scan_token()?,
        };
        Ok(self.current_token.insert(token))
    }

    /// Position of the next unscanned character
    pub fn position(&self) -> SourcePosition {
        self.current_position()
    }

    fn scan_token(&mut self) -> LexResult<Token> {
        self.skip_whitespace_and_comments();

        let start = self.current_position();
        if self.is_at_end() {
            return Ok(Token {
                kind: TokenKind::EOF,
                start,
                end: start,
            });
        }

        let ch = self.advance();
        let kind = match ch {
            '+' => TokenKind::Punctuator(Punctuator::Plus),
            '*' => TokenKind::Punctuator(Punctuator::Star),
            '/' => TokenKind::Punctuator(Punctuator::Slash),
            '(' => TokenKind::Punctuator(Punctuator::LParen),
            ')' => TokenKind::Punctuator(Punctuator::RParen),
            '{' => TokenKind::Punctuator(Punctuator::LBrace),
            '}' => TokenKind::Punctuator(Punctuator::RBrace),
            ',' => TokenKind::Punctuator(Punctuator::Comma),
            ':' => TokenKind::Punctuator(Punctuator::Colon),
            ';' => TokenKind::Punctuator(Punctuator::Semicolon),

            '-' => {
                if self.match_char('>') {
                    TokenKind::Punctuator(Punctuator::Arrow)
                } else {
                    TokenKind::Punctuator(Punctuator::Minus)
                }
            }

            '=' => {
                if self.match_char('=') {
                    TokenKind::Punctuator(Punctuator::EqEq)
                } else {
                    TokenKind::Punctuator(Punctuator::Assign)
                }
            }

            '!' => {
                if self.match_char('=') {
                    TokenKind::Punctuator(Punctuator::NotEq)
                } else {
                    return Err(lex_error(ErrorKind::UnexpectedCharacter('!'), start));
                }
            }

            '<' => {
                if self.match_char('=') {
                    TokenKind::Punctuator(Punctuator::LtEq)
                } else {
                    TokenKind::Punctuator(Punctuator::Lt)
                }
            }

            '>' => {
                if self.match_char('=') {
                    TokenKind::Punctuator(Punctuator::GtEq)
                } else {
                    TokenKind::Punctuator(Punctuator::Gt)
                }
            }

            '"' => self.scan_string(start)?,

            '\'' => self.scan_char(start)?,

            _ if ch.is_ascii_digit() => self.scan_number(ch, start)?,

            _ if is_id_start(ch) => self.scan_identifier(ch),

            _ => return Err(lex_error(ErrorKind::UnexpectedCharacter(ch), start)),
        };

        Ok(Token {
            kind,
            start,
            end: self.current_position(),
        })
    }

    fn scan_string(&mut self, start: SourcePosition) -> LexResult<TokenKind> {
        let mut value = String::new();

        loop {
            if self.is_at_end() || is_line_terminator(self.peek()) {
                return Err(lex_error(ErrorKind::UnterminatedLiteral, start));
            }
            match self.advance() {
                '"' => break,
                '\\' => value.push(self.scan_escape(start)?),
                c => value.push(c),
            }
        }

        Ok(TokenKind::String(value))
    }

    fn scan_char(&mut self, start: SourcePosition) -> LexResult<TokenKind> {
        if self.is_at_end() || is_line_terminator(self.peek()) {
            return Err(lex_error(ErrorKind::UnterminatedLiteral, start));
        }

        let value = match self.advance() {
            '\'' => return Err(lex_error(ErrorKind::InvalidCharLiteral, start)),
            '\\' => self.scan_escape(start)?,
            c => c,
        };

        if self.is_at_end() || is_line_terminator(self.peek()) {
            return Err(lex_error(ErrorKind::UnterminatedLiteral, start));
        }
        if !self.match_char('\'') {
            return Err(lex_error(ErrorKind::InvalidCharLiteral, start));
        }

        Ok(TokenKind::Char(value))
    }

    /// Resolve the character after a backslash
    fn scan_escape(&mut self, start: SourcePosition) -> LexResult<char> {
        if self.is_at_end() {
            return Err(lex_error(ErrorKind::UnterminatedLiteral, start));
        }
        let at = self.current_position();
        match self.advance() {
            '\'' => Ok('\''),
            '"' => Ok('"'),
            '\\' => Ok('\\'),
            'n' => Ok('\n'),
            'r' => Ok('\r'),
            't' => Ok('\t'),
            other => Err(lex_error(ErrorKind::InvalidEscape(other), at)),
        }
    }

    fn scan_number(&mut self, first: char, start: SourcePosition) -> LexResult<TokenKind> {
        let mut num_str = first.to_string();
        self.scan_digits(&mut num_str);

        let is_double = self.peek() == '.' && self.peek_next().is_some_and(|c| c.is_ascii_digit());
        if !is_double {
            return num_str
                .parse::<u64>()
                .map(TokenKind::UInt)
                .map_err(|_| lex_error(ErrorKind::IntegerOverflow(num_str), start));
        }

        num_str.push(self.advance());
        self.scan_digits(&mut num_str);

        if matches!(self.peek(), 'e' | 'E') {
            let exponent_follows = match self.peek_next() {
                Some(c) if c.is_ascii_digit() => true,
                Some('+') | Some('-') => self
                    .chars
                    .get(self.position + 2)
                    .is_some_and(|c| c.is_ascii_digit()),
                _ => false,
            };
            if exponent_follows {
                num_str.push(self.advance());
                if matches!(self.peek(), '+' | '-') {
                    num_str.push(self.advance());
                }
                self.scan_digits(&mut num_str);
            }
        }

        // The scanned text always matches f64 syntax
        let value = num_str.parse::<f64>().unwrap_or_default();
        Ok(TokenKind::Double(value))
    }

    fn scan_digits(&mut self, num_str: &mut String) {
        while !self.is_at_end() && self.peek().is_ascii_digit() {
            num_str.push(self.advance());
        }
    }

    fn scan_identifier(&mut self, first: char) -> TokenKind {
        let mut ident = first.to_string();
        while !self.is_at_end() && is_id_continue(self.peek()) {
            ident.push(self.advance());
        }
        match Keyword::from_ident(&ident) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Identifier(ident),
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        while !self.is_at_end() {
            match self.peek() {
                ' ' | '\t' => {
                    self.advance();
                }
                '\n' => {
                    self.advance();
                    self.line += 1;
                    self.column = 1;
                }
                '\r' => {
                    // CRLF counts as one line terminator
                    self.advance();
                    if self.peek() == '\n' {
                        self.advance();
                    }
                    self.line += 1;
                    self.column = 1;
                }
                '/' if self.peek_next() == Some('/') => {
                    while !self.is_at_end() && !is_line_terminator(self.peek()) {
                        self.advance();
                    }
                }
                c if c.is_whitespace() => {
                    self.advance();
                }
                _ => break,
            }
        }
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.chars.len()
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.chars[self.position]
        }
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.position + 1).copied()
    }

    fn advance(&mut self) -> char {
        let ch = self.chars[self.position];
        self.position += 1;
        self.column += 1;
        ch
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.chars[self.position] != expected {
            false
        } else {
            self.position += 1;
            self.column += 1;
            true
        }
    }

    fn current_position(&self) -> SourcePosition {
        SourcePosition {
            line: self.line,
            column: self.column,
            offset: self.position,
        }
    }
}

/// Yields every token through the first EOF, or up to and including the
/// first error, then ends.
impl Iterator for Lexer {
    type Item = LexResult<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = self.next_token();
        match &result {
            Ok(token) if token.kind == TokenKind::EOF => self.finished = true,
            Err(_) => self.finished = true,
            Ok(_) => {}
        }
        Some(result)
    }
}

fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r')
}

fn is_id_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_id_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}
