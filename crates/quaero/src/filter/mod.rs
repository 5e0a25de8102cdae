//! Filter expressions: the AST, its parser, optimizer and evaluator.
//!
//! A [`Filter`] is an immutable tree of boolean predicates over named
//! properties. Filters come from two places: the validating factories on
//! [`Filter`], or [`FilterParser`] reading the textual query grammar.
//!
//! # Supported Syntax
//!
//! ## Comparison operators
//! - `eq`, `ne` - Equality; `null` tests absence (`eq`) or presence (`ne`)
//! - `gt`, `ge`, `lt`, `le` - Ordering
//! - `sw`, `ew`, `co` - Starts with, ends with, contains (strings only)
//! - `pr` - Property has a value
//! - `in` - Property equals one of a list: `dept in ("Sales", "Retail")`
//!
//! ## Values
//! - Strings: `"bjensen"`, with JSON-style escapes
//! - UUIDs: `"94957019-fc7d-417d-bd1b-147cc6113ed3"`
//! - Numbers: `18`, `-3`, `1.5e3`
//! - `true`, `false`, `null`
//!
//! ## Boolean Operators
//! - `and`, `or` - Left-associative, `and` binds tighter
//! - `not` - Negation
//! - `()` - Grouping
//!
//! # Example
//!
//! ```
//! use quaero::filter::{Filter, FilterParser};
//!
//! let filter = FilterParser::parse(r#"not(userName eq "admin")"#).unwrap();
//! assert!(matches!(filter, Filter::Not(_)));
//!
//! let optimized = filter.optimize();
//! assert_eq!(optimized, Filter::not_equal("userName", "admin").unwrap());
//! ```

mod ast;
mod error;
mod evaluator;
mod lexer;
mod optimizer;
mod parser;
mod value;
mod visitor;

pub use ast::Filter;
pub use error::{FilterError, FilterResult, Position};
pub use evaluator::{FilterEvaluator, Record};
pub use lexer::{FilterToken, Lexer, PositionedToken, Span};
pub use optimizer::{optimize, Optimizer, OptimizerOptions};
pub use parser::{FilterParser, MAX_NESTING, MAX_TREE_DEPTH};
pub use value::Value;
pub use visitor::{FilterStateVisitor, FilterVisitor};


#[cfg(test)]
mod evaluator_tests;
