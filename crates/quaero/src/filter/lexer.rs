//! Lexer (tokenizer) for filter expressions.

use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

use num_bigint::BigInt;
use uuid::Uuid;

use super::error::{FilterError, FilterResult, Position};
use super::value::Value;

/// A byte range in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset just past the last character.
    pub end: usize,
}

/// A token with its location in the input.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedToken {
    /// The token.
    pub token: FilterToken,
    /// Where the token appears in the input.
    pub span: Span,
}

/// A token in a filter expression.
///
/// Keywords (`and`, `eq`, `true`, ...) are plain identifiers here; the parser
/// decides what they mean from their position.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterToken {
    /// A C-style identifier, optionally with dotted segments (`name.givenName`).
    Identifier(String),

    /// A double-quoted string with escapes already decoded.
    String(String),

    /// A double-quoted UUID, with the literal body as written.
    Uuid { value: Uuid, text: String },

    /// An integer without fraction or exponent.
    Integer(BigInt),

    /// A number with a fraction or exponent.
    Decimal(f64),

    /// Opening parenthesis `(`.
    OpenParen,

    /// Closing parenthesis `)`.
    CloseParen,

    /// Opening bracket `[`.
    OpenBracket,

    /// Closing bracket `]`.
    CloseBracket,

    /// List separator `,`.
    Comma,
}

impl fmt::Display for FilterToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterToken::Identifier(name) => write!(f, "'{}'", name),
            FilterToken::String(s) => write!(f, "string \"{}\"", s),
            FilterToken::Uuid { text, .. } => write!(f, "uuid \"{}\"", text),
            FilterToken::Integer(i) => write!(f, "number {}", i),
            FilterToken::Decimal(d) => write!(f, "number {:?}", d),
            FilterToken::OpenParen => f.write_str("'('"),
            FilterToken::CloseParen => f.write_str("')'"),
            FilterToken::OpenBracket => f.write_str("'['"),
            FilterToken::CloseBracket => f.write_str("']'"),
            FilterToken::Comma => f.write_str("','"),
        }
    }
}

/// Lexer for tokenizing filter expressions.
pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input string.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    /// Peeks at the next character without consuming it.
    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    /// Peeks one character past the next one.
    fn peek_second(&self) -> Option<char> {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.next().map(|(_, c)| c)
    }

    /// Consumes and returns the next character.
    fn next_char(&mut self) -> Option<char> {
        self.chars.next().map(|(_, c)| c)
    }

    /// Returns the byte offset of the next character.
    fn offset(&mut self) -> usize {
        self.chars
            .peek()
            .map(|&(i, _)| i)
            .unwrap_or(self.input.len())
    }

    fn error(&self, message: impl Into<String>, offset: usize) -> FilterError {
        FilterError::lex(message, Position::at(self.input, offset))
    }

    /// Skips whitespace characters.
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.next_char();
            } else {
                break;
            }
        }
    }

    /// Reads an identifier, including dotted sub-attribute segments.
    fn read_identifier(&mut self) -> String {
        let mut ident = String::new();
        loop {
            while let Some(c) = self.peek() {
                if c.is_ascii_alphanumeric() || c == '_' {
                    ident.push(c);
                    self.next_char();
                } else {
                    break;
                }
            }
            let continues = self.peek() == Some('.')
                && self
                    .peek_second()
                    .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
            if !continues {
                return ident;
            }
            ident.push('.');
            self.next_char();
        }
    }

    /// Reads a quoted string; the opening quote is at `start`.
    ///
    /// Only a body written without escapes can be a UUID literal, so any
    /// string can be spelled unambiguously by escaping one character.
    fn read_string(&mut self, start: usize) -> FilterResult<FilterToken> {
        self.next_char(); // consume opening quote

        let mut result = String::new();
        let mut escaped = false;
        loop {
            let escape_at = self.offset();
            let Some(c) = self.next_char() else {
                return Err(self.error("unterminated string literal", start));
            };
            match c {
                '"' => break,
                '\\' => {
                    let decoded = self.read_escape(escape_at)?;
                    result.push(decoded);
                    escaped = true;
                }
                c => result.push(c),
            }
        }

        if !escaped && Value::looks_like_uuid(&result) {
            return match Uuid::try_parse(&result) {
                Ok(value) => Ok(FilterToken::Uuid {
                    value,
                    text: result,
                }),
                Err(_) => Err(self.error(
                    format!("malformed UUID literal \"{}\"", result),
                    start,
                )),
            };
        }
        Ok(FilterToken::String(result))
    }

    /// Decodes the escape sequence following a backslash at `start`.
    fn read_escape(&mut self, start: usize) -> FilterResult<char> {
        let Some(c) = self.next_char() else {
            return Err(self.error("unterminated escape sequence", start));
        };
        match c {
            '\\' => Ok('\\'),
            '"' => Ok('"'),
            '/' => Ok('/'),
            'b' => Ok('\u{8}'),
            'f' => Ok('\u{c}'),
            'n' => Ok('\n'),
            'r' => Ok('\r'),
            't' => Ok('\t'),
            'u' => {
                let unit = self.read_hex4(start)?;
                match unit {
                    0xD800..=0xDBFF => {
                        let low_start = self.offset();
                        if self.next_char() != Some('\\') || self.next_char() != Some('u') {
                            return Err(self.error("unpaired surrogate in \\u escape", start));
                        }
                        let low = self.read_hex4(low_start)?;
                        if !(0xDC00..=0xDFFF).contains(&low) {
                            return Err(self.error("unpaired surrogate in \\u escape", start));
                        }
                        let code = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                        char::from_u32(code)
                            .ok_or_else(|| self.error("invalid \\u escape", start))
                    }
                    0xDC00..=0xDFFF => Err(self.error("unpaired surrogate in \\u escape", start)),
                    _ => char::from_u32(unit)
                        .ok_or_else(|| self.error("invalid \\u escape", start)),
                }
            }
            other => Err(self.error(format!("invalid escape sequence '\\{}'", other), start)),
        }
    }

    /// Reads exactly four hex digits.
    fn read_hex4(&mut self, start: usize) -> FilterResult<u32> {
        let mut value = 0;
        for _ in 0..4 {
            let digit = self
                .peek()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error("\\u escape needs four hex digits", start))?;
            self.next_char();
            value = value * 16 + digit;
        }
        Ok(value)
    }

    /// Reads a number with optional sign, fraction and exponent.
    fn read_number(&mut self, start: usize) -> FilterResult<FilterToken> {
        let mut text = String::new();
        let mut is_decimal = false;

        if let Some(sign @ ('+' | '-')) = self.peek() {
            if sign == '-' {
                text.push(sign);
            }
            self.next_char();
        }
        self.read_digits(&mut text);

        if self.peek() == Some('.') {
            if !self.peek_second().is_some_and(|c| c.is_ascii_digit()) {
                return Err(self.error("malformed number literal", start));
            }
            is_decimal = true;
            text.push('.');
            self.next_char();
            self.read_digits(&mut text);
        }

        if let Some(e @ ('e' | 'E')) = self.peek() {
            is_decimal = true;
            text.push(e);
            self.next_char();
            if let Some(sign @ ('+' | '-')) = self.peek() {
                text.push(sign);
                self.next_char();
            }
            if !self.read_digits(&mut text) {
                return Err(self.error("malformed number literal", start));
            }
        }

        if self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '.')
        {
            return Err(self.error("malformed number literal", start));
        }

        if is_decimal {
            text.parse::<f64>()
                .ok()
                .filter(|d| d.is_finite())
                .map(FilterToken::Decimal)
                .ok_or_else(|| self.error(format!("malformed number literal {}", text), start))
        } else {
            text.parse::<BigInt>()
                .map(FilterToken::Integer)
                .map_err(|_| self.error(format!("malformed number literal {}", text), start))
        }
    }

    /// Appends ASCII digits to `text`, returning whether any were read.
    fn read_digits(&mut self, text: &mut String) -> bool {
        let mut any = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.next_char();
                any = true;
            } else {
                break;
            }
        }
        any
    }

    /// Returns the next token, `None` at end of input.
    pub fn next_token(&mut self) -> FilterResult<Option<PositionedToken>> {
        self.skip_whitespace();

        let Some(c) = self.peek() else {
            return Ok(None);
        };
        let start = self.offset();

        let token = match c {
            '(' => self.single(FilterToken::OpenParen),
            ')' => self.single(FilterToken::CloseParen),
            '[' => self.single(FilterToken::OpenBracket),
            ']' => self.single(FilterToken::CloseBracket),
            ',' => self.single(FilterToken::Comma),
            '"' => self.read_string(start)?,
            '0'..='9' => self.read_number(start)?,
            '+' | '-' if self.peek_second().is_some_and(|c| c.is_ascii_digit()) => {
                self.read_number(start)?
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                FilterToken::Identifier(self.read_identifier())
            }
            other => {
                return Err(self.error(format!("unexpected character '{}'", other), start));
            }
        };

        let span = Span {
            start,
            end: self.offset(),
        };
        tracing::trace!(?token, start = span.start, end = span.end, "token");
        Ok(Some(PositionedToken { token, span }))
    }

    fn single(&mut self, token: FilterToken) -> FilterToken {
        self.next_char();
        token
    }

    /// Collects all tokens, stopping at the first error.
    pub fn tokenize(mut self) -> FilterResult<Vec<PositionedToken>> {
        let mut tokens = Vec::new();
        while let Some(positioned_token) = self.next_token()? {
            tokens.push(positioned_token);
        }
        Ok(tokens)
    }
}
