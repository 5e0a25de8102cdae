//! Error types for filter construction, parsing and rendering.

use std::fmt;

use thiserror::Error;

/// A specialized Result type for filter operations.
pub type FilterResult<T> = Result<T, FilterError>;

/// A location in the source text of a filter expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Byte offset into the input (0-indexed).
    pub offset: usize,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number, counted in characters (1-indexed).
    pub column: usize,
}

impl Position {
    /// Computes the position of a byte offset within `input`.
    pub fn at(input: &str, offset: usize) -> Self {
        let offset = offset.min(input.len());
        let before = &input[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = before[line_start..].chars().count() + 1;
        Self {
            offset,
            line,
            column,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Errors that can occur while building, parsing or rendering filters.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FilterError {
    /// The input contains a character sequence no token rule matches.
    #[error("syntax error ({position}): {message}")]
    Lex {
        /// What went wrong.
        message: String,
        /// Where it went wrong.
        position: Position,
    },

    /// The token stream does not form a valid filter expression.
    #[error("syntax error ({position}): {message}")]
    Parse {
        /// What went wrong.
        message: String,
        /// Where it went wrong.
        position: Position,
    },

    /// A filter factory was given invalid operands.
    #[error("invalid filter: {message}")]
    Construction {
        /// What went wrong.
        message: String,
    },

    /// A backend was asked to render something its dialect cannot express.
    #[error("{dialect} filters cannot express {construct}")]
    Unsupported {
        /// The target dialect.
        dialect: &'static str,
        /// The construct that could not be rendered.
        construct: String,
    },
}

impl FilterError {
    /// Creates a lexer error.
    pub fn lex(message: impl Into<String>, position: Position) -> Self {
        FilterError::Lex {
            message: message.into(),
            position,
        }
    }

    /// Creates a parser error.
    pub fn parse(message: impl Into<String>, position: Position) -> Self {
        FilterError::Parse {
            message: message.into(),
            position,
        }
    }

    /// Creates a construction error.
    pub fn construction(message: impl Into<String>) -> Self {
        FilterError::Construction {
            message: message.into(),
        }
    }

    /// Creates an unsupported-construct error.
    pub fn unsupported(dialect: &'static str, construct: impl Into<String>) -> Self {
        FilterError::Unsupported {
            dialect,
            construct: construct.into(),
        }
    }

    /// Returns the source position for lexer and parser errors.
    pub fn position(&self) -> Option<Position> {
        match self {
            FilterError::Lex { position, .. } | FilterError::Parse { position, .. } => {
                Some(*position)
            }
            _ => None,
        }
    }

    /// Returns the bare message without the position prefix.
    pub fn message(&self) -> String {
        match self {
            FilterError::Lex { message, .. }
            | FilterError::Parse { message, .. }
            | FilterError::Construction { message } => message.clone(),
            FilterError::Unsupported { .. } => self.to_string(),
        }
    }
}
