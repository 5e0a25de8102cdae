//! Provisioning filters (RFC 7644 section 3.4.2.2).

use crate::filter::{Filter, FilterError, FilterStateVisitor, Value};

/// Renders filters in the SCIM filter syntax.
///
/// The output is itself valid input for [`FilterParser`], and parses back
/// to a filter that renders to the same string.
///
/// [`FilterParser`]: crate::filter::FilterParser
#[derive(Debug, Clone, Copy, Default)]
pub struct ScimRenderer;

type Output = Result<String, FilterError>;

impl ScimRenderer {
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

fn operator(mut out: String, name: &str, op: &str, value: Option<&Value>) -> Output {
    out.push_str(name);
    out.push(' ');
    out.push_str(op);
    out.push(' ');
    match value {
        Some(value) => write_value(&mut out, value),
        None => out.push_str("null"),
    }
    Ok(out)
}

fn string_operator(out: String, name: &str, op: &str, value: &str) -> Output {
    operator(out, name, op, Some(&Value::String(value.to_string())))
}

impl FilterStateVisitor for ScimRenderer {
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
        operator(out, name, "eq", value)
    }

    fn visit_not_equal(&self, name: &str, value: Option<&Value>, out: String) -> Output {
        match value {
            Some(_) => operator(out, name, "ne", value),
            None => self.visit_presence(name, out),
        }
    }

    fn visit_greater_than(&self, name: &str, value: &Value, out: String) -> Output {
        operator(out, name, "gt", Some(value))
    }

    fn visit_greater_than_or_equal(&self, name: &str, value: &Value, out: String) -> Output {
        operator(out, name, "ge", Some(value))
    }

    fn visit_less_than(&self, name: &str, value: &Value, out: String) -> Output {
        operator(out, name, "lt", Some(value))
    }

    fn visit_less_than_or_equal(&self, name: &str, value: &Value, out: String) -> Output {
        operator(out, name, "le", Some(value))
    }

    fn visit_starts_with(&self, name: &str, value: &str, out: String) -> Output {
        string_operator(out, name, "sw", value)
    }

    fn visit_ends_with(&self, name: &str, value: &str, out: String) -> Output {
        string_operator(out, name, "ew", value)
    }

    fn visit_contains(&self, name: &str, value: &str, out: String) -> Output {
        string_operator(out, name, "co", value)
    }

    fn visit_presence(&self, name: &str, mut out: String) -> Output {
        out.push_str(name);
        out.push_str(" pr");
        Ok(out)
    }

    /// SCIM has no list operator, so only a single value can be written (as `eq`).
    fn visit_in(&self, name: &str, values: &[Value], out: String) -> Output {
        match values {
            [single] => operator(out, name, "eq", Some(single)),
            _ => Err(FilterError::unsupported(
                "SCIM",
                format!("'in' with {} values on '{}'", values.len(), name),
            )),
        }
    }
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Int(_) | Value::BigInt(_) | Value::Float(_) => {
            out.push_str(&value.format_number().unwrap_or_default())
        }
        Value::String(s) => {
            out.push('"');
            escape_into(out, s);
            out.push('"');
        }
        Value::DateTime(dt) => {
            out.push('"');
            out.push_str(&Value::format_date_time(dt));
            out.push('"');
        }
        Value::Uuid(u) => {
            out.push('"');
            out.push_str(&u.hyphenated().to_string());
            out.push('"');
        }
    }
}

/// Escapes a string the way JavaScript string encoders do: quotes and
/// backslashes get a backslash, HTML-sensitive and non-ASCII characters become
/// `\uXXXX` (surrogate pairs above the BMP).
///
/// A string shaped like a UUID also gets its first character escaped so it
/// reads back as a string.
fn escape_into(out: &mut String, value: &str) {
    let uuid_shaped = Value::looks_like_uuid(value);
    for (i, c) in value.chars().enumerate() {
        match c {
            c if i == 0 && uuid_shaped => push_unit(out, c as u16),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '&' | '<' | '>' | '\'' | '+' | '`' => push_unit(out, c as u16),
            c if c.is_ascii_control() || !c.is_ascii() => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    push_unit(out, *unit);
                }
            }
            c => out.push(c),
        }
    }
}

fn push_unit(out: &mut String, unit: u16) {
    out.push_str(&format!("\\u{:04X}", unit));
}
