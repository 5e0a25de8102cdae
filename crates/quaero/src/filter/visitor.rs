//! Visitor contracts for consuming filter trees.
//!
//! Two forms exist:
//!
//! - [`FilterVisitor`] is a bottom-up fold. [`Filter::accept`] visits the
//!   operands of `And`, `Or` and `Not` first and passes their results in, so
//!   the visitor only combines results. The optimizer and the in-memory
//!   evaluator are folds.
//! - [`FilterStateVisitor`] threads a state value through the traversal and
//!   receives the operand nodes themselves. [`Filter::accept_with`]
//!   dispatches a single node; the visitor recurses as it sees fit. The
//!   string backends use this form with an output buffer as the state.
//!
//! Both traits have one required method per [`Filter`] variant and no
//! defaults, so adding a variant breaks every visitor until it handles it.

use super::ast::Filter;
use super::value::Value;

/// A stateless, bottom-up visitor over a filter tree.
pub trait FilterVisitor {
    /// The result produced for every node.
    type Output;

    /// Combines the results of both operands of an AND.
    fn visit_and(&self, left: Self::Output, right: Self::Output) -> Self::Output;

    /// Combines the results of both operands of an OR.
    fn visit_or(&self, left: Self::Output, right: Self::Output) -> Self::Output;

    /// Transforms the result of a negated operand.
    fn visit_not(&self, operand: Self::Output) -> Self::Output;

    /// Visits an equality test; `None` means the property is absent.
    fn visit_equal(&self, name: &str, value: Option<&Value>) -> Self::Output;

    /// Visits an inequality test; `None` means the property is present.
    fn visit_not_equal(&self, name: &str, value: Option<&Value>) -> Self::Output;

    fn visit_greater_than(&self, name: &str, value: &Value) -> Self::Output;

    fn visit_greater_than_or_equal(&self, name: &str, value: &Value) -> Self::Output;

    fn visit_less_than(&self, name: &str, value: &Value) -> Self::Output;

    fn visit_less_than_or_equal(&self, name: &str, value: &Value) -> Self::Output;

    fn visit_starts_with(&self, name: &str, value: &str) -> Self::Output;

    fn visit_ends_with(&self, name: &str, value: &str) -> Self::Output;

    fn visit_contains(&self, name: &str, value: &str) -> Self::Output;

    fn visit_presence(&self, name: &str) -> Self::Output;

    fn visit_in(&self, name: &str, values: &[Value]) -> Self::Output;
}

/// A visitor that threads a state value through the traversal.
///
/// Each method takes ownership of the state and returns the updated state,
/// or an error that aborts the traversal.
pub trait FilterStateVisitor {
    /// The state carried through the traversal.
    type State;
    /// The error that aborts a traversal.
    type Error;

    fn visit_and(
        &self,
        left: &Filter,
        right: &Filter,
        state: Self::State,
    ) -> Result<Self::State, Self::Error>;

    fn visit_or(
        &self,
        left: &Filter,
        right: &Filter,
        state: Self::State,
    ) -> Result<Self::State, Self::Error>;

    fn visit_not(&self, operand: &Filter, state: Self::State) -> Result<Self::State, Self::Error>;

    fn visit_equal(
        &self,
        name: &str,
        value: Option<&Value>,
        state: Self::State,
    ) -> Result<Self::State, Self::Error>;

    fn visit_not_equal(
        &self,
        name: &str,
        value: Option<&Value>,
        state: Self::State,
    ) -> Result<Self::State, Self::Error>;

    fn visit_greater_than(
        &self,
        name: &str,
        value: &Value,
        state: Self::State,
    ) -> Result<Self::State, Self::Error>;

    fn visit_greater_than_or_equal(
        &self,
        name: &str,
        value: &Value,
        state: Self::State,
    ) -> Result<Self::State, Self::Error>;

    fn visit_less_than(
        &self,
        name: &str,
        value: &Value,
        state: Self::State,
    ) -> Result<Self::State, Self::Error>;

    fn visit_less_than_or_equal(
        &self,
        name: &str,
        value: &Value,
        state: Self::State,
    ) -> Result<Self::State, Self::Error>;

    fn visit_starts_with(
        &self,
        name: &str,
        value: &str,
        state: Self::State,
    ) -> Result<Self::State, Self::Error>;

    fn visit_ends_with(
        &self,
        name: &str,
        value: &str,
        state: Self::State,
    ) -> Result<Self::State, Self::Error>;

    fn visit_contains(
        &self,
        name: &str,
        value: &str,
        state: Self::State,
    ) -> Result<Self::State, Self::Error>;

    fn visit_presence(&self, name: &str, state: Self::State) -> Result<Self::State, Self::Error>;

    fn visit_in(
        &self,
        name: &str,
        values: &[Value],
        state: Self::State,
    ) -> Result<Self::State, Self::Error>;
}
