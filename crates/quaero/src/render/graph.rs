//! Query-parameter filters in the OData style.

use crate::filter::{Filter, FilterError, FilterStateVisitor, Value};

/// Renders filters for `$filter` query parameters.
///
/// Substring tests use function syntax (`startsWith(mail, "a")`) and set
/// membership uses `in` with a parenthesized list.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphRenderer;

type Output = Result<String, FilterError>;

impl GraphRenderer {
    fn binary(&self, left: &Filter, op: &str, right: &Filter, mut out: String) -> Output {
        out.push('(');
        let mut out = left.accept_with(self, out)?;
        out.push(' ');
        out.push_str(op);
        out.push(' ');
        let mut out = right.accept_with(self, out)?;
        out.push(')');
        Ok(out)
    }
}

fn infix(mut out: String, name: &str, op: &str, value: Option<&Value>) -> Output {
    out.push_str(name);
    out.push(' ');
    out.push_str(op);
    out.push(' ');
    write_optional(&mut out, value);
    Ok(out)
}

fn function(mut out: String, func: &str, name: &str, value: &str) -> Output {
    out.push_str(func);
    out.push('(');
    out.push_str(name);
    out.push_str(", ");
    write_string(&mut out, value);
    out.push(')');
    Ok(out)
}

impl FilterStateVisitor for GraphRenderer {
    type State = String;
    type Error = FilterError;

    fn visit_and(&self, left: &Filter, right: &Filter, out: String) -> Output {
        self.binary(left, "and", right, out)
    }

    fn visit_or(&self, left: &Filter, right: &Filter, out: String) -> Output {
        self.binary(left, "or", right, out)
    }

    fn visit_not(&self, operand: &Filter, mut out: String) -> Output {
        out.push_str("not(");
        let mut out = operand.accept_with(self, out)?;
        out.push(')');
        Ok(out)
    }

    fn visit_equal(&self, name: &str, value: Option<&Value>, out: String) -> Output {
        infix(out, name, "eq", value)
    }

    fn visit_not_equal(&self, name: &str, value: Option<&Value>, out: String) -> Output {
        infix(out, name, "ne", value)
    }

    fn visit_greater_than(&self, name: &str, value: &Value, out: String) -> Output {
        infix(out, name, "gt", Some(value))
    }

    fn visit_greater_than_or_equal(&self, name: &str, value: &Value, out: String) -> Output {
        infix(out, name, "ge", Some(value))
    }

    fn visit_less_than(&self, name: &str, value: &Value, out: String) -> Output {
        infix(out, name, "lt", Some(value))
    }

    fn visit_less_than_or_equal(&self, name: &str, value: &Value, out: String) -> Output {
        infix(out, name, "le", Some(value))
    }

    fn visit_starts_with(&self, name: &str, value: &str, out: String) -> Output {
        function(out, "startsWith", name, value)
    }

    fn visit_ends_with(&self, name: &str, value: &str, out: String) -> Output {
        function(out, "endsWith", name, value)
    }

    fn visit_contains(&self, name: &str, value: &str, out: String) -> Output {
        function(out, "contains", name, value)
    }

    fn visit_presence(&self, name: &str, out: String) -> Output {
        infix(out, name, "ne", None)
    }

    fn visit_in(&self, name: &str, values: &[Value], mut out: String) -> Output {
        out.push_str(name);
        out.push_str(" in (");
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            write_value(&mut out, value);
        }
        out.push(')');
        Ok(out)
    }
}

fn write_optional(out: &mut String, value: Option<&Value>) {
    match value {
        Some(value) => write_value(out, value),
        None => out.push_str("null"),
    }
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Int(_) | Value::BigInt(_) | Value::Float(_) => {
            out.push_str(&value.format_number().unwrap_or_default())
        }
        Value::String(s) => write_string(out, s),
        Value::DateTime(dt) => out.push_str(&Value::format_date_time(dt)),
        Value::Uuid(u) => {
            out.push('"');
            out.push_str(&u.hyphenated().to_string());
            out.push('"');
        }
    }
}

/// Writes a quoted string literal; embedded quotes are doubled.
fn write_string(out: &mut String, value: &str) {
    out.push('"');
    out.push_str(&value.replace('"', "\"\""));
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterParser;
    use crate::render::render_graph;
    use chrono::{TimeZone, Utc};

    fn graph(input: &str) -> String {
        render_graph(&FilterParser::parse(input).unwrap()).unwrap()
    }

    #[test]
    fn test_infix_operators() {
        assert_eq!(graph("age gt 18"), "age gt 18");
        assert_eq!(graph("age ge 18"), "age ge 18");
        assert_eq!(graph("age lt 18"), "age lt 18");
        assert_eq!(graph("age le 18"), "age le 18");
        assert_eq!(graph(r#"userName ne "x""#), r#"userName ne "x""#);
    }

    #[test]
    fn test_null_and_presence() {
        assert_eq!(graph("manager eq null"), "manager eq null");
        assert_eq!(graph("manager ne null"), "manager ne null");
        assert_eq!(graph("manager pr"), "manager ne null");
    }

    #[test]
    fn test_substring_functions() {
        assert_eq!(graph(r#"mail sw "admin""#), r#"startsWith(mail, "admin")"#);
        assert_eq!(graph(r#"mail ew "example.com""#), r#"endsWith(mail, "example.com")"#);
        assert_eq!(graph(r#"displayName co "Jo""#), r#"contains(displayName, "Jo")"#);
    }

    #[test]
    fn test_in_list() {
        assert_eq!(
            graph(r#"domain in ("a.com","b.com")"#),
            r#"domain in ("a.com", "b.com")"#
        );
        assert_eq!(graph("id in [1, 2]"), "id in (1, 2)");
    }

    #[test]
    fn test_boolean_operators() {
        assert_eq!(
            graph("not (a pr or b eq true) and c lt 2.5"),
            "(not((a ne null or b eq true)) and c lt 2.5)"
        );
    }

    #[test]
    fn test_quotes_are_doubled() {
        let filter = Filter::equal("title", "the \"boss\"").unwrap();
        assert_eq!(render_graph(&filter).unwrap(), r#"title eq "the ""boss""""#);
    }

    #[test]
    fn test_date_time_is_unquoted() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let filter = Filter::greater_than_or_equal("createdDateTime", at).unwrap();
        assert_eq!(
            render_graph(&filter).unwrap(),
            "createdDateTime ge 2024-01-02T03:04:05Z"
        );
    }
}
