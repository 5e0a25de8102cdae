//! Portable filter expressions.
//!
//! Author a query once in a small textual grammar (or build it with the
//! [`Filter`] factories), simplify it, and compile it to the filter dialect a
//! downstream system speaks.
//!
//! ```
//! use quaero::{Dialect, FilterParser};
//!
//! let filter = FilterParser::parse(r#"not(userName eq "admin") and age gt 18"#)
//!     .unwrap()
//!     .optimize();
//!
//! assert_eq!(
//!     filter.render(Dialect::Scim).unwrap(),
//!     r#"(userName ne "admin" and age gt 18)"#
//! );
//! assert_eq!(
//!     filter.render(Dialect::Ldap).unwrap(),
//!     "(&(!(userName=admin))(age>=19))"
//! );
//! ```

pub mod filter;
pub mod render;

pub use filter::{
    Filter, FilterError, FilterEvaluator, FilterParser, FilterResult, OptimizerOptions, Record,
    Value,
};
pub use render::{render, render_graph, render_ldap, render_scim, Dialect};
