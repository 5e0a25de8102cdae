//! In-memory filter evaluation.
//!
//! This module provides the [`FilterEvaluator`] for testing records against a
//! parsed or constructed [`Filter`] without a backend. Property access goes
//! through the [`Record`] trait, so any type that can look up a value by name
//! can be filtered.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use quaero::filter::{FilterEvaluator, FilterParser, Value};
//!
//! let filter = FilterParser::parse(r#"age ge 18 and mail ew "@example.com""#).unwrap();
//!
//! let mut record = HashMap::new();
//! record.insert("age".to_string(), Value::from(21));
//! record.insert("mail".to_string(), Value::from("bjensen@example.com"));
//!
//! let evaluator = FilterEvaluator::new(&filter);
//! assert!(evaluator.matches(&record));
//! ```

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::DateTime;
use uuid::Uuid;

use super::ast::Filter;
use super::value::Value;
use super::visitor::FilterVisitor;

/// Something whose properties can be looked up by name.
pub trait Record {
    /// Returns the value of a property, or `None` if it is absent.
    ///
    /// Implementations in this crate match names case-insensitively.
    fn property(&self, name: &str) -> Option<Value>;
}

impl<R: Record + ?Sized> Record for &R {
    fn property(&self, name: &str) -> Option<Value> {
        (**self).property(name)
    }
}

impl Record for HashMap<String, Value> {
    fn property(&self, name: &str) -> Option<Value> {
        self.get(name)
            .or_else(|| {
                self.iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, value)| value)
            })
            .cloned()
    }
}

impl Record for BTreeMap<String, Value> {
    fn property(&self, name: &str) -> Option<Value> {
        self.get(name)
            .or_else(|| {
                self.iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, value)| value)
            })
            .cloned()
    }
}

/// JSON objects are records; dotted names walk into nested objects.
///
/// `null`, arrays and objects count as absent.
impl Record for serde_json::Value {
    fn property(&self, name: &str) -> Option<Value> {
        let mut current = self;
        for segment in name.split('.') {
            let object = current.as_object()?;
            current = object.get(segment).or_else(|| {
                object
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(segment))
                    .map(|(_, value)| value)
            })?;
        }
        json_scalar(current)
    }
}

fn json_scalar(value: &serde_json::Value) -> Option<Value> {
    match value {
        serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
        serde_json::Value::Number(n) => n
            .as_i64()
            .map(Value::Int)
            .or_else(|| n.as_u64().map(Value::from))
            .or_else(|| n.as_f64().map(Value::Float)),
        serde_json::Value::String(s) => Some(Value::String(s.clone())),
        serde_json::Value::Null | serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
            None
        }
    }
}

/// Evaluates a filter against records.
///
/// The evaluator borrows the filter; it can be reused for any number of
/// records and shared across threads.
#[derive(Debug, Clone, Copy)]
pub struct FilterEvaluator<'a> {
    filter: &'a Filter,
}

impl<'a> FilterEvaluator<'a> {
    /// Creates a new filter evaluator.
    pub fn new(filter: &'a Filter) -> Self {
        Self { filter }
    }

    /// Returns true if the record matches the filter.
    pub fn matches<R: Record + ?Sized>(&self, record: &R) -> bool {
        self.filter.accept(&RecordMatcher { record })
    }

    /// Filters a slice of records, returning only those that match.
    pub fn filter_records<'b, R: Record>(&self, records: &'b [R]) -> Vec<&'b R> {
        let matched: Vec<&R> = records.iter().filter(|r| self.matches(*r)).collect();
        tracing::debug!(
            total = records.len(),
            matched = matched.len(),
            "filtered records"
        );
        matched
    }
}

/// Fold that answers whether a single record matches.
struct RecordMatcher<'r, R: ?Sized> {
    record: &'r R,
}

impl<R: Record + ?Sized> RecordMatcher<'_, R> {
    /// Looks up a property, converting strings to the kind of `expected`
    /// where they hold a UUID or RFC 3339 date.
    fn lookup(&self, name: &str, expected: &Value) -> Option<Value> {
        let actual = self.record.property(name)?;
        Some(match (actual, expected) {
            (Value::String(s), Value::Uuid(_)) => match Uuid::try_parse(&s) {
                Ok(u) => Value::Uuid(u),
                Err(_) => Value::String(s),
            },
            (Value::String(s), Value::DateTime(_)) => match DateTime::parse_from_rfc3339(&s) {
                Ok(dt) => Value::DateTime(dt),
                Err(_) => Value::String(s),
            },
            (actual, _) => actual,
        })
    }

    fn compare(&self, name: &str, value: &Value) -> Option<Ordering> {
        self.lookup(name, value)?.compare(value)
    }

    fn string_property(&self, name: &str) -> Option<String> {
        match self.record.property(name)? {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    fn is_equal(&self, name: &str, value: Option<&Value>) -> bool {
        match value {
            Some(value) => self.compare(name, value) == Some(Ordering::Equal),
            None => self.record.property(name).is_none(),
        }
    }
}

impl<R: Record + ?Sized> FilterVisitor for RecordMatcher<'_, R> {
    type Output = bool;

    fn visit_and(&self, left: bool, right: bool) -> bool {
        left && right
    }

    fn visit_or(&self, left: bool, right: bool) -> bool {
        left || right
    }

    fn visit_not(&self, operand: bool) -> bool {
        !operand
    }

    fn visit_equal(&self, name: &str, value: Option<&Value>) -> bool {
        self.is_equal(name, value)
    }

    fn visit_not_equal(&self, name: &str, value: Option<&Value>) -> bool {
        !self.is_equal(name, value)
    }

    fn visit_greater_than(&self, name: &str, value: &Value) -> bool {
        self.compare(name, value) == Some(Ordering::Greater)
    }

    fn visit_greater_than_or_equal(&self, name: &str, value: &Value) -> bool {
        matches!(
            self.compare(name, value),
            Some(Ordering::Greater | Ordering::Equal)
        )
    }

    fn visit_less_than(&self, name: &str, value: &Value) -> bool {
        self.compare(name, value) == Some(Ordering::Less)
    }

    fn visit_less_than_or_equal(&self, name: &str, value: &Value) -> bool {
        matches!(
            self.compare(name, value),
            Some(Ordering::Less | Ordering::Equal)
        )
    }

    fn visit_starts_with(&self, name: &str, value: &str) -> bool {
        !value.is_empty()
            && self
                .string_property(name)
                .is_some_and(|s| s.starts_with(value))
    }

    fn visit_ends_with(&self, name: &str, value: &str) -> bool {
        !value.is_empty()
            && self
                .string_property(name)
                .is_some_and(|s| s.ends_with(value))
    }

    fn visit_contains(&self, name: &str, value: &str) -> bool {
        !value.is_empty()
            && self
                .string_property(name)
                .is_some_and(|s| s.contains(value))
    }

    fn visit_presence(&self, name: &str) -> bool {
        match self.record.property(name) {
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
            None => false,
        }
    }

    fn visit_in(&self, name: &str, values: &[Value]) -> bool {
        values.iter().any(|value| self.is_equal(name, Some(value)))
    }
}
