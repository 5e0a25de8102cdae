//! Algebraic simplification of filter trees.
//!
//! The optimizer pushes every negation down to the predicates, so the result
//! is in negation normal form: `Not` only ever wraps a predicate that has no
//! negated counterpart (`sw`, `ew`, `co`, `pr` and multi-valued `in`).
//!
//! | Input                     | Output              |
//! |---------------------------|---------------------|
//! | `not (a and b)`           | `not a or not b`    |
//! | `not (a or b)`            | `not a and not b`   |
//! | `not not a`               | `a`                 |
//! | `not (n eq v)`            | `n ne v`            |
//! | `not (n gt v)`            | `n le v`            |
//! | `not (n ge v)`            | `n lt v`            |
//! | `n in (v)`                | `n eq v`            |
//!
//! Running the optimizer twice gives the same tree as running it once.

use serde::{Deserialize, Serialize};

use super::ast::Filter;
use super::value::Value;
use super::visitor::FilterVisitor;

/// Settings for optional rewrite rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerOptions {
    /// Collapse `x and x` and `x or x` to `x`.
    pub collapse_duplicates: bool,
}

/// Rewrites filters into a simpler, equivalent form.
#[derive(Debug, Clone, Copy, Default)]
pub struct Optimizer {
    options: OptimizerOptions,
}

impl Optimizer {
    /// Creates an optimizer with the given options.
    pub fn new(options: OptimizerOptions) -> Self {
        Self { options }
    }

    /// Returns a simplified copy of the filter.
    pub fn optimize(&self, filter: &Filter) -> Filter {
        let optimized = filter.accept(self);
        tracing::debug!(input = %filter, output = %optimized, "optimized filter");
        optimized
    }
}

impl FilterVisitor for Optimizer {
    type Output = Filter;

    fn visit_and(&self, left: Filter, right: Filter) -> Filter {
        if self.options.collapse_duplicates && left == right {
            return left;
        }
        Filter::and(left, right)
    }

    fn visit_or(&self, left: Filter, right: Filter) -> Filter {
        if self.options.collapse_duplicates && left == right {
            return left;
        }
        Filter::or(left, right)
    }

    fn visit_not(&self, operand: Filter) -> Filter {
        negate(operand)
    }

    fn visit_equal(&self, name: &str, value: Option<&Value>) -> Filter {
        Filter::Equal {
            name: name.to_string(),
            value: value.cloned(),
        }
    }

    fn visit_not_equal(&self, name: &str, value: Option<&Value>) -> Filter {
        Filter::NotEqual {
            name: name.to_string(),
            value: value.cloned(),
        }
    }

    fn visit_greater_than(&self, name: &str, value: &Value) -> Filter {
        Filter::GreaterThan {
            name: name.to_string(),
            value: value.clone(),
        }
    }

    fn visit_greater_than_or_equal(&self, name: &str, value: &Value) -> Filter {
        Filter::GreaterThanOrEqual {
            name: name.to_string(),
            value: value.clone(),
        }
    }

    fn visit_less_than(&self, name: &str, value: &Value) -> Filter {
        Filter::LessThan {
            name: name.to_string(),
            value: value.clone(),
        }
    }

    fn visit_less_than_or_equal(&self, name: &str, value: &Value) -> Filter {
        Filter::LessThanOrEqual {
            name: name.to_string(),
            value: value.clone(),
        }
    }

    fn visit_starts_with(&self, name: &str, value: &str) -> Filter {
        Filter::StartsWith {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    fn visit_ends_with(&self, name: &str, value: &str) -> Filter {
        Filter::EndsWith {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    fn visit_contains(&self, name: &str, value: &str) -> Filter {
        Filter::Contains {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    fn visit_presence(&self, name: &str) -> Filter {
        Filter::Presence {
            name: name.to_string(),
        }
    }

    fn visit_in(&self, name: &str, values: &[Value]) -> Filter {
        match values {
            [single] => Filter::Equal {
                name: name.to_string(),
                value: Some(single.clone()),
            },
            _ => Filter::In {
                name: name.to_string(),
                values: values.to_vec(),
            },
        }
    }
}

/// Negates an already optimized filter, keeping it in negation normal form.
///
/// On optimized input this is an involution: negating twice gives back the
/// original tree.
fn negate(filter: Filter) -> Filter {
    match filter {
        Filter::And(left, right) => Filter::or(negate(*left), negate(*right)),
        Filter::Or(left, right) => Filter::and(negate(*left), negate(*right)),
        Filter::Not(operand) => *operand,
        Filter::Equal { name, value } => Filter::NotEqual { name, value },
        Filter::NotEqual { name, value } => Filter::Equal { name, value },
        Filter::GreaterThan { name, value } => Filter::LessThanOrEqual { name, value },
        Filter::GreaterThanOrEqual { name, value } => Filter::LessThan { name, value },
        Filter::LessThan { name, value } => Filter::GreaterThanOrEqual { name, value },
        Filter::LessThanOrEqual { name, value } => Filter::GreaterThan { name, value },
        leaf @ (Filter::StartsWith { .. }
        | Filter::EndsWith { .. }
        | Filter::Contains { .. }
        | Filter::Presence { .. }
        | Filter::In { .. }) => Filter::negate(leaf),
    }
}

/// Simplifies a filter with the default options.
pub fn optimize(filter: &Filter) -> Filter {
    Optimizer::default().optimize(filter)
}

impl Filter {
    /// Returns a simplified, equivalent copy of this filter.
    ///
    /// # Example
    ///
    /// ```
    /// use quaero::filter::Filter;
    ///
    /// let filter = !Filter::equal("userName", "admin").unwrap();
    /// assert_eq!(filter.optimize(), Filter::not_equal("userName", "admin").unwrap());
    /// ```
    pub fn optimize(&self) -> Filter {
        optimize(self)
    }

    /// Returns a simplified copy using the given options.
    pub fn optimize_with(&self, options: OptimizerOptions) -> Filter {
        Optimizer::new(options).optimize(self)
    }
}
