//! Match command implementation.
//!
//! Evaluates a filter against JSON records in memory.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use quaero::{Filter, FilterEvaluator};
use serde_json::Value as Json;

use super::render::prepare;
use super::{CommandContext, CommandError, Result};

/// Reads the record array from a file, or from stdin when no path is given.
fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => Ok(fs::read_to_string(path)?),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Parses the input as a JSON array of objects.
fn parse_records(input: &str) -> Result<Vec<Json>> {
    let records = match serde_json::from_str(input)? {
        Json::Array(records) => records,
        other => {
            return Err(CommandError::Input(format!(
                "expected a JSON array of objects, found {}",
                json_kind(&other)
            )))
        }
    };

    if let Some((index, record)) = records.iter().enumerate().find(|(_, r)| !r.is_object()) {
        return Err(CommandError::Input(format!(
            "record {} is {}, expected an object",
            index,
            json_kind(record)
        )));
    }

    Ok(records)
}

fn json_kind(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}

/// Returns the records the filter matches, in input order.
pub fn select<'a>(filter: &Filter, records: &'a [Json]) -> Vec<&'a Json> {
    FilterEvaluator::new(filter).filter_records(records)
}

/// Executes the match command.
pub fn execute(ctx: &CommandContext, expression: &str, input: Option<&Path>) -> Result<()> {
    let filter = prepare(ctx, expression, ctx.optimize)?;
    let records = parse_records(&read_input(input)?)?;
    let matched = select(&filter, &records);

    tracing::debug!(
        total = records.len(),
        matched = matched.len(),
        "evaluated records"
    );

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&matched)?);
    } else {
        for record in matched {
            println!("{}", serde_json::to_string(record)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quaero::FilterParser;
    use serde_json::json;
    use tempfile::TempDir;

    const PEOPLE: &str = r#"[
        {"userName": "alice", "age": 34, "mail": "alice@example.com"},
        {"userName": "bob", "age": 17},
        {"userName": "admin", "age": 50, "mail": "root@example.org"}
    ]"#;

    #[test]
    fn test_select_in_input_order() {
        let records = parse_records(PEOPLE).unwrap();
        let filter = FilterParser::parse(r#"age gt 18 and userName ne "admin""#).unwrap();
        let matched = select(&filter, &records);
        assert_eq!(matched, vec![&records[0]]);
    }

    #[test]
    fn test_select_presence_and_suffix() {
        let records = parse_records(PEOPLE).unwrap();
        let filter = FilterParser::parse(r#"mail pr and not(mail ew "example.org")"#).unwrap();
        let matched = select(&filter, &records);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0]["userName"], json!("alice"));
    }

    #[test]
    fn test_parse_records_rejects_non_arrays() {
        let err = parse_records(r#"{"age": 1}"#).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid input: expected a JSON array of objects, found an object"
        );
    }

    #[test]
    fn test_parse_records_rejects_non_object_members() {
        let err = parse_records(r#"[{"age": 1}, 42]"#).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid input: record 1 is a number, expected an object"
        );
    }

    #[test]
    fn test_parse_records_reports_bad_json() {
        assert!(matches!(
            parse_records("[{").unwrap_err(),
            CommandError::Json(_)
        ));
    }

    #[test]
    fn test_read_input_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("people.json");
        fs::write(&path, PEOPLE).unwrap();
        assert_eq!(read_input(Some(&path)).unwrap(), PEOPLE);
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = read_input(Some(&temp_dir.path().join("missing.json"))).unwrap_err();
        assert!(matches!(err, CommandError::Io(_)));
    }
}
