//! String backends that compile a [`Filter`] into a target query dialect.
//!
//! Each backend is a [`FilterStateVisitor`] whose state is the output buffer.
//! A render call owns its buffer, so a filter can be rendered from any number
//! of threads at once.
//!
//! | Dialect | Used by | Example |
//! |---|---|---|
//! | [`Dialect::Ldap`] | Directory servers | `(&(age>=19)(mail=*))` |
//! | [`Dialect::Scim`] | Provisioning endpoints | `(age gt 18 and mail pr)` |
//! | [`Dialect::Graph`] | `$filter` query parameters | `(age gt 18 and mail ne null)` |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::filter::{Filter, FilterError, FilterResult, FilterStateVisitor};

mod graph;
mod ldap;
mod scim;

pub use graph::GraphRenderer;
pub use ldap::LdapRenderer;
pub use scim::ScimRenderer;

/// A target query syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Query-parameter filters in the OData style used by Microsoft Graph.
    Graph,
    /// Directory search filters (RFC 4515).
    Ldap,
    /// Provisioning filters (RFC 7644).
    Scim,
}

impl Dialect {
    /// All dialects, in display order.
    pub const ALL: [Dialect; 3] = [Dialect::Graph, Dialect::Ldap, Dialect::Scim];

    /// Returns the display label for this dialect.
    pub fn label(self) -> &'static str {
        match self {
            Dialect::Graph => "Graph",
            Dialect::Ldap => "LDAP",
            Dialect::Scim => "SCIM",
        }
    }

    /// Returns the lowercase identifier used in configuration and flags.
    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::Graph => "graph",
            Dialect::Ldap => "ldap",
            Dialect::Scim => "scim",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a dialect name is not recognized.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown dialect '{0}', expected one of: graph, ldap, scim")]
pub struct ParseDialectError(String);

impl FromStr for Dialect {
    type Err = ParseDialectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "graph" => Ok(Dialect::Graph),
            "ldap" => Ok(Dialect::Ldap),
            "scim" => Ok(Dialect::Scim),
            _ => Err(ParseDialectError(s.to_string())),
        }
    }
}

/// Runs a string backend over a filter with a fresh buffer.
fn run<V>(visitor: &V, filter: &Filter) -> FilterResult<String>
where
    V: FilterStateVisitor<State = String, Error = FilterError>,
{
    filter.accept_with(visitor, String::new())
}

/// Renders a filter into the given dialect.
///
/// # Errors
///
/// Returns [`FilterError::Unsupported`] if the dialect cannot express part of
/// the filter.
///
/// # Example
///
/// ```
/// use quaero::filter::Filter;
/// use quaero::render::{render, Dialect};
///
/// let filter = Filter::greater_than("age", 18).unwrap();
/// assert_eq!(render(&filter, Dialect::Graph).unwrap(), "age gt 18");
/// assert_eq!(render(&filter, Dialect::Ldap).unwrap(), "(age>=19)");
/// ```
pub fn render(filter: &Filter, dialect: Dialect) -> FilterResult<String> {
    let rendered = match dialect {
        Dialect::Graph => run(&GraphRenderer, filter),
        Dialect::Ldap => run(&LdapRenderer, filter),
        Dialect::Scim => run(&ScimRenderer, filter),
    };
    tracing::trace!(%dialect, ok = rendered.is_ok(), "rendered filter");
    rendered
}

/// Renders a filter as a directory search filter.
pub fn render_ldap(filter: &Filter) -> FilterResult<String> {
    render(filter, Dialect::Ldap)
}

/// Renders a filter as a provisioning filter.
pub fn render_scim(filter: &Filter) -> FilterResult<String> {
    render(filter, Dialect::Scim)
}

/// Renders a filter as a query-parameter filter.
pub fn render_graph(filter: &Filter) -> FilterResult<String> {
    render(filter, Dialect::Graph)
}

impl Filter {
    /// Renders this filter into the given dialect.
    pub fn render(&self, dialect: Dialect) -> FilterResult<String> {
        render(self, dialect)
    }

    /// Renders this filter as a directory search filter.
    pub fn to_ldap(&self) -> FilterResult<String> {
        render_ldap(self)
    }

    /// Renders this filter as a provisioning filter.
    pub fn to_scim(&self) -> FilterResult<String> {
        render_scim(self)
    }

    /// Renders this filter as a query-parameter filter.
    pub fn to_graph(&self) -> FilterResult<String> {
        render_graph(self)
    }
}
