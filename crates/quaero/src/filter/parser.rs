//! Recursive descent parser for filter expressions.

use std::str::FromStr;

use super::ast::Filter;
use super::error::{FilterError, FilterResult, Position};
use super::lexer::{FilterToken, Lexer, PositionedToken};
use super::value::Value;

/// Operator keywords, in the spelling used for suggestions.
const OPERATOR_KEYWORDS: &[&str] = &[
    "eq",
    "ne",
    "gt",
    "ge",
    "lt",
    "le",
    "sw",
    "ew",
    "co",
    "in",
    "pr",
    "startsWith",
    "endsWith",
    "contains",
];

/// Deepest nesting of parenthesized groups and negations accepted.
pub const MAX_NESTING: usize = 256;

/// Deepest filter tree the parser builds.
///
/// Every consumer of a filter walks it recursively, so deeper input is
/// rejected with a parse error instead of exhausting the stack later.
pub const MAX_TREE_DEPTH: usize = 1024;

/// A parsed sub-expression with the depth of its tree.
type Node = (Filter, usize);

/// A property operator recognized by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    StartsWith,
    EndsWith,
    Contains,
    In,
    Presence,
}

impl Operator {
    fn from_keyword(keyword: &str) -> Option<Self> {
        let op = match keyword.to_ascii_lowercase().as_str() {
            "eq" => Operator::Equal,
            "ne" => Operator::NotEqual,
            "gt" => Operator::GreaterThan,
            "ge" => Operator::GreaterThanOrEqual,
            "lt" => Operator::LessThan,
            "le" => Operator::LessThanOrEqual,
            "sw" | "startswith" => Operator::StartsWith,
            "ew" | "endswith" => Operator::EndsWith,
            "co" | "contains" => Operator::Contains,
            "in" => Operator::In,
            "pr" => Operator::Presence,
            _ => return None,
        };
        Some(op)
    }
}

/// Parser for textual filter expressions.
///
/// # Grammar
///
/// ```text
/// expression ::= or_expr
/// or_expr    ::= and_expr ("or" and_expr)*
/// and_expr   ::= term ("and" term)*
/// term       ::= "not" term | factor
/// factor     ::= "(" expression ")" | predicate
/// predicate  ::= identifier "pr"
///              | identifier operator value
///              | identifier "in" list
/// operator   ::= "eq" | "ne" | "gt" | "ge" | "lt" | "le" | "sw" | "ew" | "co"
/// list       ::= "[" value ("," value)* "]" | "(" value ("," value)* ")"
/// value      ::= string | uuid | integer | decimal | "true" | "false" | "null"
/// ```
///
/// Keywords are case-insensitive. `startsWith`, `endsWith` and `contains` are
/// accepted as long forms of `sw`, `ew` and `co`.
///
/// # Operator Precedence (highest to lowest)
///
/// 1. `not` - unary
/// 2. `and` - binary, left-associative
/// 3. `or` - binary, left-associative
///
/// `not` directly followed by an operator keyword is a property named `not`,
/// so `not pr` tests that property while `not pr pr` negates `pr pr`.
///
/// Input nested deeper than [`MAX_NESTING`] groups and negations, or
/// producing a tree deeper than [`MAX_TREE_DEPTH`], is rejected.
///
/// # Example
///
/// ```
/// use quaero::filter::{Filter, FilterParser};
///
/// let filter = FilterParser::parse("age gt 18").unwrap();
/// assert_eq!(filter, Filter::greater_than("age", 18).unwrap());
///
/// let filter = FilterParser::parse("a pr or b pr and c pr").unwrap();
/// assert!(matches!(filter, Filter::Or(_, _)));
/// ```
pub struct FilterParser<'a> {
    input: &'a str,
    tokens: Vec<PositionedToken>,
    position: usize,
    nesting: usize,
}

impl<'a> FilterParser<'a> {
    /// Parses a filter expression string into a Filter AST.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Lex`] if the input contains malformed tokens and
    /// [`FilterError::Parse`] if the tokens do not form an expression. Both
    /// carry the position of the offending input.
    pub fn parse(input: &'a str) -> FilterResult<Filter> {
        tracing::debug!(input, "parsing filter expression");

        let tokens = Lexer::new(input).tokenize()?;
        if tokens.is_empty() {
            return Err(FilterError::parse(
                "empty filter expression",
                Position::at(input, 0),
            ));
        }

        let mut parser = Self {
            input,
            tokens,
            position: 0,
            nesting: 0,
        };
        let (filter, _) = parser.parse_expression()?;

        // Check that we consumed all tokens
        if let Some(remaining) = parser.peek() {
            return Err(parser.error_at(
                remaining.span.start,
                format!("unexpected {} after complete expression", remaining.token),
            ));
        }

        tracing::debug!(%filter, "parsed filter expression");
        Ok(filter)
    }

    /// Returns the current token without consuming it.
    fn peek(&self) -> Option<&PositionedToken> {
        self.tokens.get(self.position)
    }

    /// Consumes and returns the current token.
    fn advance(&mut self) -> Option<PositionedToken> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    /// Checks if the current token matches the expected token.
    fn check(&self, expected: &FilterToken) -> bool {
        self.peek().is_some_and(|t| &t.token == expected)
    }

    /// Checks if the current token is the given keyword (case-insensitive).
    fn check_keyword(&self, keyword: &str) -> bool {
        matches!(
            self.peek(),
            Some(PositionedToken { token: FilterToken::Identifier(ident), .. })
                if ident.eq_ignore_ascii_case(keyword)
        )
    }

    fn error_at(&self, offset: usize, message: impl Into<String>) -> FilterError {
        FilterError::parse(message, Position::at(self.input, offset))
    }

    fn end_of_input(&self, expected: &str) -> FilterError {
        self.error_at(
            self.input.len(),
            format!("unexpected end of input, expected {}", expected),
        )
    }

    /// Checks if the token at `index` is an operator keyword.
    fn is_operator_at(&self, index: usize) -> bool {
        matches!(
            self.tokens.get(index),
            Some(PositionedToken { token: FilterToken::Identifier(ident), .. })
                if Operator::from_keyword(ident).is_some()
        )
    }

    /// Checks if the current `not` starts a predicate on a property named `not`.
    fn not_names_property(&self) -> bool {
        self.is_operator_at(self.position + 1) && !self.is_operator_at(self.position + 2)
    }

    /// Enters a group or negation starting at `offset`.
    fn enter(&mut self, offset: usize) -> FilterResult<()> {
        self.nesting += 1;
        if self.nesting > MAX_NESTING {
            return Err(self.error_at(
                offset,
                format!("expression is nested deeper than {} levels", MAX_NESTING),
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.nesting -= 1;
    }

    /// Returns the depth of a node one level above `depth`.
    fn deepen(&self, depth: usize, offset: usize) -> FilterResult<usize> {
        let depth = depth + 1;
        if depth > MAX_TREE_DEPTH {
            return Err(self.error_at(
                offset,
                format!("expression is deeper than {} operators", MAX_TREE_DEPTH),
            ));
        }
        Ok(depth)
    }

    /// Consumes the current token, failing at end of input.
    fn expect_any(&mut self, expected: &str) -> FilterResult<PositionedToken> {
        self.advance().ok_or_else(|| self.end_of_input(expected))
    }

    /// Parses the top-level expression (OR expression).
    fn parse_expression(&mut self) -> FilterResult<Node> {
        self.parse_or_expr()
    }

    /// Parses OR expressions: `and_expr ("or" and_expr)*`
    fn parse_or_expr(&mut self) -> FilterResult<Node> {
        let (mut left, mut depth) = self.parse_and_expr()?;

        while self.check_keyword("or") {
            let or = self.expect_any("'or'")?;
            let (right, right_depth) = self.parse_and_expr()?;
            depth = self.deepen(depth.max(right_depth), or.span.start)?;
            left = Filter::or(left, right);
        }

        Ok((left, depth))
    }

    /// Parses AND expressions: `term ("and" term)*`
    fn parse_and_expr(&mut self) -> FilterResult<Node> {
        let (mut left, mut depth) = self.parse_term()?;

        while self.check_keyword("and") {
            let and = self.expect_any("'and'")?;
            let (right, right_depth) = self.parse_term()?;
            depth = self.deepen(depth.max(right_depth), and.span.start)?;
            left = Filter::and(left, right);
        }

        Ok((left, depth))
    }

    /// Parses terms: `"not" term | factor`
    fn parse_term(&mut self) -> FilterResult<Node> {
        if self.check_keyword("not") && !self.not_names_property() {
            let not = self.expect_any("'not'")?;
            self.enter(not.span.start)?;
            let (inner, depth) = self.parse_term()?;
            self.leave();
            let depth = self.deepen(depth, not.span.start)?;
            return Ok((Filter::negate(inner), depth));
        }

        self.parse_factor()
    }

    /// Parses factors: `"(" expression ")" | predicate`
    fn parse_factor(&mut self) -> FilterResult<Node> {
        if self.check(&FilterToken::OpenParen) {
            let open = self.expect_any("'('")?;
            self.enter(open.span.start)?;
            let inner = self.parse_expression()?;
            self.leave();
            return match self.advance() {
                Some(PositionedToken {
                    token: FilterToken::CloseParen,
                    ..
                }) => Ok(inner),
                Some(other) => Err(self.error_at(
                    other.span.start,
                    format!(
                        "expected ')' to close '(' at {}, found {}",
                        Position::at(self.input, open.span.start),
                        other.token
                    ),
                )),
                None => Err(self.end_of_input("')'")),
            };
        }

        Ok((self.parse_predicate()?, 1))
    }

    /// Parses a property predicate.
    fn parse_predicate(&mut self) -> FilterResult<Filter> {
        let name_token = self.expect_any("a property name")?;
        let name = match name_token.token {
            FilterToken::Identifier(name) => name,
            other => {
                return Err(self.error_at(
                    name_token.span.start,
                    format!("expected a property name, found {}", other),
                ));
            }
        };

        let op_token = self.expect_any("an operator")?;
        let operator = match &op_token.token {
            FilterToken::Identifier(keyword) => Operator::from_keyword(keyword).ok_or_else(|| {
                let mut message = format!("unknown operator '{}' after '{}'", keyword, name);
                if let Some(suggestion) = suggest_operator(keyword) {
                    message.push_str(&format!(", did you mean '{}'?", suggestion));
                }
                self.error_at(op_token.span.start, message)
            })?,
            other => {
                return Err(self.error_at(
                    op_token.span.start,
                    format!("expected an operator after '{}', found {}", name, other),
                ));
            }
        };
        let input = self.input;
        let keyword = &input[op_token.span.start..op_token.span.end];

        tracing::trace!(name = %name, ?operator, "predicate");

        let filter = match operator {
            Operator::Presence => Filter::presence(name),
            Operator::In => {
                let values = self.parse_list(keyword)?;
                Filter::in_values(name, values)
            }
            Operator::Equal | Operator::NotEqual => {
                let value = self.parse_value(keyword)?;
                match (operator, value) {
                    (Operator::Equal, Some(v)) => Filter::equal(name, v),
                    (Operator::Equal, None) => Filter::equal_null(name),
                    (_, Some(v)) => Filter::not_equal(name, v),
                    (_, None) => Filter::not_equal_null(name),
                }
            }
            Operator::GreaterThan
            | Operator::GreaterThanOrEqual
            | Operator::LessThan
            | Operator::LessThanOrEqual => {
                let value_start = self.peek().map(|t| t.span.start);
                let value = self.parse_value(keyword)?.ok_or_else(|| {
                    self.error_at(
                        value_start.unwrap_or(self.input.len()),
                        format!("'{}' does not accept null", keyword),
                    )
                })?;
                match operator {
                    Operator::GreaterThan => Filter::greater_than(name, value),
                    Operator::GreaterThanOrEqual => Filter::greater_than_or_equal(name, value),
                    Operator::LessThan => Filter::less_than(name, value),
                    _ => Filter::less_than_or_equal(name, value),
                }
            }
            Operator::StartsWith | Operator::EndsWith | Operator::Contains => {
                let value = self.parse_string(keyword)?;
                match operator {
                    Operator::StartsWith => Filter::starts_with(name, value),
                    Operator::EndsWith => Filter::ends_with(name, value),
                    _ => Filter::contains(name, value),
                }
            }
        };

        filter.map_err(|e| self.error_at(name_token.span.start, e.message()))
    }

    /// Parses a scalar value; `null` yields `None`.
    fn parse_value(&mut self, keyword: &str) -> FilterResult<Option<Value>> {
        let expected = format!("a value after '{}'", keyword);
        let token = self.expect_any(&expected)?;
        let value = match token.token {
            FilterToken::String(s) => Value::String(s),
            FilterToken::Uuid { value, .. } => Value::Uuid(value),
            FilterToken::Integer(i) => Value::from(i),
            FilterToken::Decimal(d) => Value::Float(d),
            FilterToken::Identifier(ident) if ident.eq_ignore_ascii_case("true") => {
                Value::Bool(true)
            }
            FilterToken::Identifier(ident) if ident.eq_ignore_ascii_case("false") => {
                Value::Bool(false)
            }
            FilterToken::Identifier(ident) if ident.eq_ignore_ascii_case("null") => {
                return Ok(None);
            }
            other => {
                return Err(self.error_at(
                    token.span.start,
                    format!("expected {}, found {}", expected, other),
                ));
            }
        };
        Ok(Some(value))
    }

    /// Parses a string value for `sw`, `ew` and `co`.
    ///
    /// A UUID literal is taken as the text it was written with.
    fn parse_string(&mut self, keyword: &str) -> FilterResult<String> {
        if let Some(PositionedToken {
            token: FilterToken::Uuid { text, .. },
            ..
        }) = self.peek()
        {
            let text = text.clone();
            self.advance();
            return Ok(text);
        }

        let start = self.peek().map(|t| t.span.start);
        match self.parse_value(keyword)? {
            Some(Value::String(s)) => Ok(s),
            Some(other) => Err(self.error_at(
                start.unwrap_or(self.input.len()),
                format!("'{}' requires a string value, found {}", keyword, other.kind()),
            )),
            None => Err(self.error_at(
                start.unwrap_or(self.input.len()),
                format!("'{}' does not accept null", keyword),
            )),
        }
    }

    /// Parses a bracketed or parenthesized list of values for `in`.
    fn parse_list(&mut self, keyword: &str) -> FilterResult<Vec<Value>> {
        let open = self.expect_any("a list of values")?;
        let close = match open.token {
            FilterToken::OpenBracket => FilterToken::CloseBracket,
            FilterToken::OpenParen => FilterToken::CloseParen,
            other => {
                return Err(self.error_at(
                    open.span.start,
                    format!("'{}' requires a list of values, found {}", keyword, other),
                ));
            }
        };

        if self.check(&close) {
            let empty = self.expect_any("a value")?;
            return Err(self.error_at(
                empty.span.start,
                format!("'{}' needs at least one value", keyword),
            ));
        }

        let mut values = Vec::new();
        loop {
            let start = self.peek().map(|t| t.span.start);
            let value = self.parse_value(keyword)?.ok_or_else(|| {
                self.error_at(
                    start.unwrap_or(self.input.len()),
                    format!("'{}' lists must not contain null", keyword),
                )
            })?;
            values.push(value);

            let separator = self.expect_any(&format!("',' or {}", close))?;
            match separator.token {
                FilterToken::Comma => continue,
                ref token if *token == close => break,
                other => {
                    return Err(self.error_at(
                        separator.span.start,
                        format!("expected ',' or {} in list, found {}", close, other),
                    ));
                }
            }
        }

        Ok(values)
    }
}

/// Suggests the closest operator keyword for a misspelled one.
fn suggest_operator(input: &str) -> Option<&'static str> {
    let lower = input.to_ascii_lowercase();
    OPERATOR_KEYWORDS
        .iter()
        .map(|kw| (*kw, strsim::jaro_winkler(&lower, &kw.to_ascii_lowercase())))
        .filter(|(_, score)| *score >= 0.8)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(kw, _)| kw)
}

impl FromStr for Filter {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterParser::parse(s)
    }
}
