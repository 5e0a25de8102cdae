//! Tests for filter evaluation.

use super::*;
use chrono::{TimeZone, Utc};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

// ==================== Test Helpers ====================

fn make_record(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn user() -> HashMap<String, Value> {
    make_record(&[
        ("userName", Value::from("bjensen")),
        ("age", Value::from(34)),
        ("score", Value::from(7.5)),
        ("mail", Value::from("bjensen@example.com")),
        ("active", Value::from(true)),
        ("nickName", Value::from("")),
    ])
}

fn matches(expression: &str, record: &impl Record) -> bool {
    let filter = FilterParser::parse(expression).unwrap();
    FilterEvaluator::new(&filter).matches(record)
}

// ==================== Equality ====================

#[test]
fn test_equal_string() {
    assert!(matches(r#"userName eq "bjensen""#, &user()));
    assert!(!matches(r#"userName eq "BJENSEN""#, &user()));
}

#[test]
fn test_equal_numeric_kinds_cross_compare() {
    assert!(matches("age eq 34", &user()));
    assert!(matches("age eq 34.0", &user()));
    assert!(matches("score eq 7.5", &user()));
}

#[test]
fn test_equal_mismatched_kinds_is_false() {
    assert!(!matches(r#"age eq "34""#, &user()));
    assert!(!matches("active eq 1", &user()));
}

#[test]
fn test_equal_null_matches_absent() {
    assert!(matches("disabledDate eq null", &user()));
    assert!(!matches("userName eq null", &user()));
}

#[test]
fn test_not_equal_is_negated_equal() {
    assert!(matches(r#"userName ne "admin""#, &user()));
    assert!(!matches(r#"userName ne "bjensen""#, &user()));
    assert!(matches(r#"missing ne "x""#, &user()));
    assert!(matches("userName ne null", &user()));
}

#[test]
fn test_property_names_are_case_insensitive() {
    assert!(matches(r#"USERNAME eq "bjensen""#, &user()));
}

// ==================== Ordering ====================

#[test]
fn test_comparisons() {
    assert!(matches("age gt 18", &user()));
    assert!(!matches("age gt 34", &user()));
    assert!(matches("age ge 34", &user()));
    assert!(matches("age lt 35", &user()));
    assert!(matches("age le 34", &user()));
    assert!(!matches("age lt 34", &user()));
}

#[test]
fn test_comparison_against_absent_is_false() {
    assert!(!matches("height gt 0", &user()));
    assert!(!matches("height le 0", &user()));
}

#[test]
fn test_comparison_of_strings_is_ordinal() {
    assert!(matches(r#"userName gt "a""#, &user()));
    assert!(!matches(r#"userName gt "c""#, &user()));
}

// ==================== Substrings ====================

#[test]
fn test_substring_operators() {
    assert!(matches(r#"mail sw "bjensen""#, &user()));
    assert!(matches(r#"mail ew "example.com""#, &user()));
    assert!(matches(r#"mail co "@""#, &user()));
    assert!(!matches(r#"mail sw "example""#, &user()));
}

#[test]
fn test_substring_operators_are_case_sensitive() {
    assert!(!matches(r#"mail sw "BJENSEN""#, &user()));
}

#[test]
fn test_substring_with_empty_value_is_false() {
    assert!(!matches(r#"mail sw """#, &user()));
    assert!(!matches(r#"mail co """#, &user()));
}

#[test]
fn test_substring_on_non_string_is_false() {
    assert!(!matches(r#"age sw "3""#, &user()));
}

// ==================== Presence and Sets ====================

#[test]
fn test_presence() {
    assert!(matches("userName pr", &user()));
    assert!(matches("active pr", &user()));
    assert!(!matches("nickName pr", &user()));
    assert!(!matches("title pr", &user()));
}

#[test]
fn test_in_matches_any_member() {
    assert!(matches(r#"userName in ("admin", "bjensen")"#, &user()));
    assert!(!matches(r#"userName in ["admin", "root"]"#, &user()));
    assert!(matches("age in [1, 34.0]", &user()));
}

// ==================== Boolean Operators ====================

#[test]
fn test_boolean_operators() {
    assert!(matches("age gt 18 and active eq true", &user()));
    assert!(!matches("age gt 50 and active eq true", &user()));
    assert!(matches("age gt 50 or active eq true", &user()));
    assert!(matches("not (age gt 50)", &user()));
}

#[test]
fn test_optimized_filter_agrees_with_original() {
    let filter =
        FilterParser::parse(r#"not (age gt 50 or mail ew "@example.org") and title eq null"#)
            .unwrap();
    let optimized = filter.optimize();
    let record = user();
    assert_eq!(
        FilterEvaluator::new(&filter).matches(&record),
        FilterEvaluator::new(&optimized).matches(&record)
    );
    assert!(FilterEvaluator::new(&optimized).matches(&record));
}

#[test]
fn test_filter_records() {
    let records = vec![
        make_record(&[("age", Value::from(12))]),
        make_record(&[("age", Value::from(40))]),
        make_record(&[("name", Value::from("no age"))]),
    ];
    let filter = Filter::greater_than_or_equal("age", 18).unwrap();
    let adults = FilterEvaluator::new(&filter).filter_records(&records);
    assert_eq!(adults.len(), 1);
    assert_eq!(adults[0].get("age"), Some(&Value::Int(40)));
}

// ==================== Typed Values ====================

#[test]
fn test_uuid_property_compares_with_string_storage() {
    let id = Uuid::parse_str("94957019-fc7d-417d-bd1b-147cc6113ed3").unwrap();
    let record = make_record(&[("id", Value::from(id.to_string()))]);
    let filter = Filter::equal("id", id).unwrap();
    assert!(FilterEvaluator::new(&filter).matches(&record));
}

#[test]
fn test_date_time_ordering() {
    let record = make_record(&[("created", Value::from("2024-03-05T12:00:00Z"))]);
    let cutoff = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let filter = Filter::greater_than("created", cutoff).unwrap();
    assert!(FilterEvaluator::new(&filter).matches(&record));
}

// ==================== Record Implementations ====================

#[test]
fn test_btree_map_record() {
    let mut record = BTreeMap::new();
    record.insert("Department".to_string(), Value::from("Sales"));
    assert!(matches(r#"department eq "Sales""#, &record));
}

#[test]
fn test_json_record() {
    let record = json!({
        "userName": "bjensen",
        "age": 34,
        "name": { "givenName": "Barbara", "familyName": "Jensen" },
        "emails": ["bjensen@example.com"],
        "manager": null
    });
    assert!(matches(r#"userName eq "bjensen" and age gt 30"#, &record));
    assert!(matches(r#"name.givenName sw "Bar""#, &record));
    assert!(matches("manager eq null", &record));
    assert!(!matches("emails pr", &record));
    assert!(!matches("name pr", &record));
}

#[test]
fn test_json_large_unsigned_number() {
    let record = json!({ "size": u64::MAX });
    assert!(matches("size gt 9223372036854775807", &record));
}
