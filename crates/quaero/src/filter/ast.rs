//! Abstract Syntax Tree (AST) for filter expressions.

use std::fmt;
use std::ops;

use serde::{Deserialize, Serialize};

use super::error::{FilterError, FilterResult};
use super::value::Value;
use super::visitor::{FilterStateVisitor, FilterVisitor};

/// Represents a filter expression.
///
/// Each variant is a boolean-valued predicate over named properties, or a
/// combination of other filters. Filters are plain immutable values: every
/// transformation builds a new tree, so a filter can be shared freely and
/// rendered any number of times.
///
/// Build leaves through the validating factories ([`Filter::equal`],
/// [`Filter::starts_with`], [`Filter::in_values`], ...) and combine them with
/// [`Filter::and`], [`Filter::or`] and [`Filter::negate`] (or `!filter`).
///
/// Deserialized trees go through the same factories, so a payload with a
/// blank name or an empty `in` set is rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "op",
    content = "args",
    rename_all = "snake_case",
    try_from = "RawFilter"
)]
pub enum Filter {
    // ==================== Boolean Operators ====================
    /// Logical AND of two filters.
    And(Box<Filter>, Box<Filter>),

    /// Logical OR of two filters.
    Or(Box<Filter>, Box<Filter>),

    /// Logical NOT of a filter.
    Not(Box<Filter>),

    // ==================== Equality ====================
    /// The property equals the value. Without a value this tests that the
    /// property is absent.
    Equal { name: String, value: Option<Value> },

    /// The property does not equal the value. Without a value this tests that
    /// the property is present.
    NotEqual { name: String, value: Option<Value> },

    // ==================== Ordering ====================
    /// The property is strictly greater than the value.
    GreaterThan { name: String, value: Value },

    /// The property is greater than or equal to the value.
    GreaterThanOrEqual { name: String, value: Value },

    /// The property is strictly less than the value.
    LessThan { name: String, value: Value },

    /// The property is less than or equal to the value.
    LessThanOrEqual { name: String, value: Value },

    // ==================== Substrings ====================
    /// The property starts with the value.
    StartsWith { name: String, value: String },

    /// The property ends with the value.
    EndsWith { name: String, value: String },

    /// The property contains the value.
    Contains { name: String, value: String },

    // ==================== Sets ====================
    /// The property has a value.
    Presence { name: String },

    /// The property equals one of the values.
    In { name: String, values: Vec<Value> },
}

impl Filter {
    // ==================== Factories ====================

    /// Creates an equality filter.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Construction`] if the name is blank or the value
    /// is a non-finite float.
    ///
    /// # Example
    ///
    /// ```
    /// use quaero::filter::Filter;
    ///
    /// let filter = Filter::equal("userName", "bjensen").unwrap();
    /// assert_eq!(filter.to_string(), r#"userName eq "bjensen""#);
    /// ```
    pub fn equal(name: impl Into<String>, value: impl Into<Value>) -> FilterResult<Self> {
        Ok(Filter::Equal {
            name: checked_name(name)?,
            value: Some(checked_value(value)?),
        })
    }

    /// Creates a filter matching items where the property is absent.
    pub fn equal_null(name: impl Into<String>) -> FilterResult<Self> {
        Ok(Filter::Equal {
            name: checked_name(name)?,
            value: None,
        })
    }

    /// Creates an inequality filter.
    pub fn not_equal(name: impl Into<String>, value: impl Into<Value>) -> FilterResult<Self> {
        Ok(Filter::NotEqual {
            name: checked_name(name)?,
            value: Some(checked_value(value)?),
        })
    }

    /// Creates a filter matching items where the property is present.
    pub fn not_equal_null(name: impl Into<String>) -> FilterResult<Self> {
        Ok(Filter::NotEqual {
            name: checked_name(name)?,
            value: None,
        })
    }

    /// Creates a `>` filter.
    pub fn greater_than(name: impl Into<String>, value: impl Into<Value>) -> FilterResult<Self> {
        Ok(Filter::GreaterThan {
            name: checked_name(name)?,
            value: checked_value(value)?,
        })
    }

    /// Creates a `>=` filter.
    pub fn greater_than_or_equal(
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> FilterResult<Self> {
        Ok(Filter::GreaterThanOrEqual {
            name: checked_name(name)?,
            value: checked_value(value)?,
        })
    }

    /// Creates a `<` filter.
    pub fn less_than(name: impl Into<String>, value: impl Into<Value>) -> FilterResult<Self> {
        Ok(Filter::LessThan {
            name: checked_name(name)?,
            value: checked_value(value)?,
        })
    }

    /// Creates a `<=` filter.
    pub fn less_than_or_equal(
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> FilterResult<Self> {
        Ok(Filter::LessThanOrEqual {
            name: checked_name(name)?,
            value: checked_value(value)?,
        })
    }

    /// Creates a prefix filter.
    pub fn starts_with(name: impl Into<String>, value: impl Into<String>) -> FilterResult<Self> {
        Ok(Filter::StartsWith {
            name: checked_name(name)?,
            value: value.into(),
        })
    }

    /// Creates a suffix filter.
    pub fn ends_with(name: impl Into<String>, value: impl Into<String>) -> FilterResult<Self> {
        Ok(Filter::EndsWith {
            name: checked_name(name)?,
            value: value.into(),
        })
    }

    /// Creates a substring filter.
    pub fn contains(name: impl Into<String>, value: impl Into<String>) -> FilterResult<Self> {
        Ok(Filter::Contains {
            name: checked_name(name)?,
            value: value.into(),
        })
    }

    /// Creates a presence filter.
    pub fn presence(name: impl Into<String>) -> FilterResult<Self> {
        Ok(Filter::Presence {
            name: checked_name(name)?,
        })
    }

    /// Creates a set membership filter.
    ///
    /// Duplicate values are dropped; the first occurrence keeps its position.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Construction`] if the name is blank, the set is
    /// empty, or a value is a non-finite float.
    ///
    /// # Example
    ///
    /// ```
    /// use quaero::filter::Filter;
    ///
    /// let filter = Filter::in_values("dept", ["Sales", "Retail", "Sales"]).unwrap();
    /// assert_eq!(filter.to_string(), r#"dept in ("Sales", "Retail")"#);
    /// ```
    pub fn in_values<I>(name: impl Into<String>, values: I) -> FilterResult<Self>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let name = checked_name(name)?;
        let mut unique: Vec<Value> = Vec::new();
        for value in values {
            let value = checked_value(value)?;
            if !unique.contains(&value) {
                unique.push(value);
            }
        }
        if unique.is_empty() {
            return Err(FilterError::construction(format!(
                "'in' filter on '{}' needs at least one value",
                name
            )));
        }
        Ok(Filter::In {
            name,
            values: unique,
        })
    }

    // ==================== Combinators ====================

    /// Creates an AND filter from two filters.
    ///
    /// # Example
    ///
    /// ```
    /// use quaero::filter::Filter;
    ///
    /// let a = Filter::presence("mail").unwrap();
    /// let b = Filter::equal("active", true).unwrap();
    /// let filter = Filter::and(a, b);
    /// assert!(matches!(filter, Filter::And(_, _)));
    /// ```
    pub fn and(self, other: Filter) -> Self {
        Filter::And(Box::new(self), Box::new(other))
    }

    /// Creates an OR filter from two filters.
    pub fn or(self, other: Filter) -> Self {
        Filter::Or(Box::new(self), Box::new(other))
    }

    /// Creates a NOT filter from another filter.
    ///
    /// This wraps the filter as-is; use the optimizer to simplify negations.
    pub fn negate(self) -> Self {
        Filter::Not(Box::new(self))
    }

    /// Combines filters into a left-nested AND chain.
    ///
    /// Returns `None` if the iterator is empty.
    pub fn all<I: IntoIterator<Item = Filter>>(filters: I) -> Option<Self> {
        filters.into_iter().reduce(Filter::and)
    }

    /// Combines filters into a left-nested OR chain.
    ///
    /// Returns `None` if the iterator is empty.
    pub fn any<I: IntoIterator<Item = Filter>>(filters: I) -> Option<Self> {
        filters.into_iter().reduce(Filter::or)
    }

    // ==================== Accessors ====================

    /// Returns the property name for predicate filters.
    pub fn name(&self) -> Option<&str> {
        match self {
            Filter::And(..) | Filter::Or(..) | Filter::Not(_) => None,
            Filter::Equal { name, .. }
            | Filter::NotEqual { name, .. }
            | Filter::GreaterThan { name, .. }
            | Filter::GreaterThanOrEqual { name, .. }
            | Filter::LessThan { name, .. }
            | Filter::LessThanOrEqual { name, .. }
            | Filter::StartsWith { name, .. }
            | Filter::EndsWith { name, .. }
            | Filter::Contains { name, .. }
            | Filter::Presence { name }
            | Filter::In { name, .. } => Some(name),
        }
    }

    /// Returns true for predicates, false for boolean operators.
    pub fn is_leaf(&self) -> bool {
        self.name().is_some()
    }

    // ==================== Dispatch ====================

    /// Folds the tree bottom-up with a visitor.
    ///
    /// Operands of `And`, `Or` and `Not` are visited first and their results
    /// handed to the visitor.
    pub fn accept<V: FilterVisitor + ?Sized>(&self, visitor: &V) -> V::Output {
        match self {
            Filter::And(left, right) => {
                let left = left.accept(visitor);
                let right = right.accept(visitor);
                visitor.visit_and(left, right)
            }
            Filter::Or(left, right) => {
                let left = left.accept(visitor);
                let right = right.accept(visitor);
                visitor.visit_or(left, right)
            }
            Filter::Not(operand) => {
                let operand = operand.accept(visitor);
                visitor.visit_not(operand)
            }
            Filter::Equal { name, value } => visitor.visit_equal(name, value.as_ref()),
            Filter::NotEqual { name, value } => visitor.visit_not_equal(name, value.as_ref()),
            Filter::GreaterThan { name, value } => visitor.visit_greater_than(name, value),
            Filter::GreaterThanOrEqual { name, value } => {
                visitor.visit_greater_than_or_equal(name, value)
            }
            Filter::LessThan { name, value } => visitor.visit_less_than(name, value),
            Filter::LessThanOrEqual { name, value } => {
                visitor.visit_less_than_or_equal(name, value)
            }
            Filter::StartsWith { name, value } => visitor.visit_starts_with(name, value),
            Filter::EndsWith { name, value } => visitor.visit_ends_with(name, value),
            Filter::Contains { name, value } => visitor.visit_contains(name, value),
            Filter::Presence { name } => visitor.visit_presence(name),
            Filter::In { name, values } => visitor.visit_in(name, values),
        }
    }

    /// Dispatches this node to a state-threading visitor.
    ///
    /// Only this node is dispatched; the visitor decides whether and how to
    /// descend into operands.
    pub fn accept_with<V: FilterStateVisitor + ?Sized>(
        &self,
        visitor: &V,
        state: V::State,
    ) -> Result<V::State, V::Error> {
        match self {
            Filter::And(left, right) => visitor.visit_and(left, right, state),
            Filter::Or(left, right) => visitor.visit_or(left, right, state),
            Filter::Not(operand) => visitor.visit_not(operand, state),
            Filter::Equal { name, value } => visitor.visit_equal(name, value.as_ref(), state),
            Filter::NotEqual { name, value } => {
                visitor.visit_not_equal(name, value.as_ref(), state)
            }
            Filter::GreaterThan { name, value } => visitor.visit_greater_than(name, value, state),
            Filter::GreaterThanOrEqual { name, value } => {
                visitor.visit_greater_than_or_equal(name, value, state)
            }
            Filter::LessThan { name, value } => visitor.visit_less_than(name, value, state),
            Filter::LessThanOrEqual { name, value } => {
                visitor.visit_less_than_or_equal(name, value, state)
            }
            Filter::StartsWith { name, value } => visitor.visit_starts_with(name, value, state),
            Filter::EndsWith { name, value } => visitor.visit_ends_with(name, value, state),
            Filter::Contains { name, value } => visitor.visit_contains(name, value, state),
            Filter::Presence { name } => visitor.visit_presence(name, state),
            Filter::In { name, values } => visitor.visit_in(name, values, state),
        }
    }
}

/// Serialized form of [`Filter`] before validation.
#[derive(Deserialize)]
#[serde(tag = "op", content = "args", rename_all = "snake_case")]
enum RawFilter {
    And(Box<Filter>, Box<Filter>),
    Or(Box<Filter>, Box<Filter>),
    Not(Box<Filter>),
    Equal { name: String, value: Option<Value> },
    NotEqual { name: String, value: Option<Value> },
    GreaterThan { name: String, value: Value },
    GreaterThanOrEqual { name: String, value: Value },
    LessThan { name: String, value: Value },
    LessThanOrEqual { name: String, value: Value },
    StartsWith { name: String, value: String },
    EndsWith { name: String, value: String },
    Contains { name: String, value: String },
    Presence { name: String },
    In { name: String, values: Vec<Value> },
}

impl TryFrom<RawFilter> for Filter {
    type Error = FilterError;

    fn try_from(raw: RawFilter) -> FilterResult<Self> {
        match raw {
            RawFilter::And(left, right) => Ok(Filter::And(left, right)),
            RawFilter::Or(left, right) => Ok(Filter::Or(left, right)),
            RawFilter::Not(operand) => Ok(Filter::Not(operand)),
            RawFilter::Equal { name, value } => match value {
                Some(value) => Filter::equal(name, value),
                None => Filter::equal_null(name),
            },
            RawFilter::NotEqual { name, value } => match value {
                Some(value) => Filter::not_equal(name, value),
                None => Filter::not_equal_null(name),
            },
            RawFilter::GreaterThan { name, value } => Filter::greater_than(name, value),
            RawFilter::GreaterThanOrEqual { name, value } => {
                Filter::greater_than_or_equal(name, value)
            }
            RawFilter::LessThan { name, value } => Filter::less_than(name, value),
            RawFilter::LessThanOrEqual { name, value } => Filter::less_than_or_equal(name, value),
            RawFilter::StartsWith { name, value } => Filter::starts_with(name, value),
            RawFilter::EndsWith { name, value } => Filter::ends_with(name, value),
            RawFilter::Contains { name, value } => Filter::contains(name, value),
            RawFilter::Presence { name } => Filter::presence(name),
            RawFilter::In { name, values } => Filter::in_values(name, values),
        }
    }
}

impl ops::Not for Filter {
    type Output = Filter;

    fn not(self) -> Filter {
        self.negate()
    }
}

fn checked_name(name: impl Into<String>) -> FilterResult<String> {
    let name = name.into();
    if name.trim().is_empty() {
        return Err(FilterError::construction("property name must not be empty"));
    }
    Ok(name)
}

fn checked_value(value: impl Into<Value>) -> FilterResult<Value> {
    let value = value.into();
    if !value.is_valid() {
        return Err(FilterError::construction(format!(
            "{} is not a usable filter value",
            value
        )));
    }
    Ok(value)
}

/// Writes the filter in the textual grammar accepted by the parser.
impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::And(left, right) => write!(f, "({} and {})", left, right),
            Filter::Or(left, right) => write!(f, "({} or {})", left, right),
            Filter::Not(operand) => write!(f, "not({})", operand),
            Filter::Equal { name, value } => write_optional(f, name, "eq", value.as_ref()),
            Filter::NotEqual { name, value } => write_optional(f, name, "ne", value.as_ref()),
            Filter::GreaterThan { name, value } => write!(f, "{} gt {}", name, value),
            Filter::GreaterThanOrEqual { name, value } => write!(f, "{} ge {}", name, value),
            Filter::LessThan { name, value } => write!(f, "{} lt {}", name, value),
            Filter::LessThanOrEqual { name, value } => write!(f, "{} le {}", name, value),
            Filter::StartsWith { name, value } => {
                write!(f, "{} sw {}", name, Value::String(value.clone()))
            }
            Filter::EndsWith { name, value } => {
                write!(f, "{} ew {}", name, Value::String(value.clone()))
            }
            Filter::Contains { name, value } => {
                write!(f, "{} co {}", name, Value::String(value.clone()))
            }
            Filter::Presence { name } => write!(f, "{} pr", name),
            Filter::In { name, values } => {
                write!(f, "{} in (", name)?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                f.write_str(")")
            }
        }
    }
}

fn write_optional(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    operator: &str,
    value: Option<&Value>,
) -> fmt::Result {
    match value {
        Some(value) => write!(f, "{} {} {}", name, operator, value),
        None => write!(f, "{} {} null", name, operator),
    }
}
