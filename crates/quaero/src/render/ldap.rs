//! Directory search filters (RFC 4515).

use chrono::{DateTime, FixedOffset};
use uuid::Uuid;

use crate::filter::{Filter, FilterError, FilterStateVisitor, Value};

/// Seconds between 1601-01-01 (the FILETIME epoch) and the Unix epoch.
const FILETIME_EPOCH_OFFSET: i128 = 11_644_473_600;

/// FILETIME ticks (100ns) per second.
const TICKS_PER_SECOND: i128 = 10_000_000;

/// Renders filters as LDAP search filters.
///
/// Nested chains of the same boolean operator are flattened, so
/// `(a and b) and c` renders as `(&a b c)`. Strict integer comparisons are
/// rewritten to inclusive bounds, since LDAP has only `>=` and `<=`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LdapRenderer;

type Output = Result<String, FilterError>;

impl LdapRenderer {
    /// Writes the operands of a chain of `And` (or `Or`) nodes in order.
    fn chain(&self, filter: &Filter, conjunction: bool, out: String) -> Output {
        match (filter, conjunction) {
            (Filter::And(left, right), true) | (Filter::Or(left, right), false) => {
                let out = self.chain(left, conjunction, out)?;
                self.chain(right, conjunction, out)
            }
            _ => filter.accept_with(self, out),
        }
    }
}

/// Writes `(name<op><value>)`.
fn item(mut out: String, name: &str, op: &str, value: &str) -> Output {
    out.push('(');
    out.push_str(name);
    out.push_str(op);
    out.push_str(value);
    out.push(')');
    Ok(out)
}

fn negated(mut out: String, inner: impl FnOnce(String) -> Output) -> Output {
    out.push_str("(!");
    let mut out = inner(out)?;
    out.push(')');
    Ok(out)
}

impl FilterStateVisitor for LdapRenderer {
    type State = String;
    type Error = FilterError;

    fn visit_and(&self, left: &Filter, right: &Filter, mut out: String) -> Output {
        out.push_str("(&");
        let out = self.chain(left, true, out)?;
        let mut out = self.chain(right, true, out)?;
        out.push(')');
        Ok(out)
    }

    fn visit_or(&self, left: &Filter, right: &Filter, mut out: String) -> Output {
        out.push_str("(|");
        let out = self.chain(left, false, out)?;
        let mut out = self.chain(right, false, out)?;
        out.push(')');
        Ok(out)
    }

    fn visit_not(&self, operand: &Filter, out: String) -> Output {
        match operand {
            Filter::Equal { name, value } => self.visit_not_equal(name, value.as_ref(), out),
            _ => negated(out, |out| operand.accept_with(self, out)),
        }
    }

    fn visit_equal(&self, name: &str, value: Option<&Value>, out: String) -> Output {
        match value {
            Some(value) => item(out, name, "=", &format_value(value)),
            None => negated(out, |out| item(out, name, "=", "*")),
        }
    }

    fn visit_not_equal(&self, name: &str, value: Option<&Value>, out: String) -> Output {
        match value {
            Some(value) => negated(out, |out| item(out, name, "=", &format_value(value))),
            None => item(out, name, "=", "*"),
        }
    }

    fn visit_greater_than(&self, name: &str, value: &Value, out: String) -> Output {
        match value.successor() {
            Some(next) => item(out, name, ">=", &format_value(&next)),
            None => negated(out, |out| item(out, name, "<=", &format_value(value))),
        }
    }

    fn visit_greater_than_or_equal(&self, name: &str, value: &Value, out: String) -> Output {
        item(out, name, ">=", &format_value(value))
    }

    fn visit_less_than(&self, name: &str, value: &Value, out: String) -> Output {
        match value.predecessor() {
            Some(prev) => item(out, name, "<=", &format_value(&prev)),
            None => negated(out, |out| item(out, name, ">=", &format_value(value))),
        }
    }

    fn visit_less_than_or_equal(&self, name: &str, value: &Value, out: String) -> Output {
        item(out, name, "<=", &format_value(value))
    }

    fn visit_starts_with(&self, name: &str, value: &str, out: String) -> Output {
        item(out, name, "=", &format!("{}*", escape(value)))
    }

    fn visit_ends_with(&self, name: &str, value: &str, out: String) -> Output {
        item(out, name, "=", &format!("*{}", escape(value)))
    }

    fn visit_contains(&self, name: &str, value: &str, out: String) -> Output {
        item(out, name, "=", &format!("*{}*", escape(value)))
    }

    fn visit_presence(&self, name: &str, out: String) -> Output {
        item(out, name, "=", "*")
    }

    fn visit_in(&self, name: &str, values: &[Value], mut out: String) -> Output {
        out.push_str("(|");
        for value in values {
            out = item(out, name, "=", &format_value(value))?;
        }
        out.push(')');
        Ok(out)
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Int(_) | Value::BigInt(_) | Value::Float(_) => {
            value.format_number().unwrap_or_default()
        }
        Value::String(s) => escape(s),
        Value::DateTime(dt) => file_time(dt).to_string(),
        Value::Uuid(u) => format_uuid(u),
    }
}

/// Escapes an assertion value per RFC 4515.
///
/// Filter metacharacters, control characters and every byte of non-ASCII
/// characters are written as `\xx`.
fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '*' | '(' | ')' | '\\' | '\0' => escaped.push_str(&format!("\\{:02x}", c as u32)),
            c if c.is_ascii_control() || !c.is_ascii() => {
                let mut buf = [0u8; 4];
                for byte in c.encode_utf8(&mut buf).bytes() {
                    escaped.push_str(&format!("\\{:02x}", byte));
                }
            }
            c => escaped.push(c),
        }
    }
    escaped
}

/// Formats a UUID as escaped bytes in the little-endian field order used by
/// Active Directory `objectGUID`.
fn format_uuid(value: &Uuid) -> String {
    value
        .to_bytes_le()
        .iter()
        .map(|byte| format!("\\{:02X}", byte))
        .collect()
}

/// Converts a date/time to Windows FILETIME ticks.
fn file_time(value: &DateTime<FixedOffset>) -> i128 {
    let seconds = i128::from(value.timestamp()) + FILETIME_EPOCH_OFFSET;
    seconds * TICKS_PER_SECOND + i128::from(value.timestamp_subsec_nanos() / 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterParser;
    use crate::render::render_ldap;
    use chrono::{TimeZone, Utc};

    fn ldap(input: &str) -> String {
        render_ldap(&FilterParser::parse(input).unwrap()).unwrap()
    }

    #[test]
    fn test_integer_greater_than_becomes_inclusive() {
        assert_eq!(ldap("age gt 18"), "(age>=19)");
        assert_eq!(ldap("age lt 18"), "(age<=17)");
    }

    #[test]
    fn test_non_integer_strict_comparisons_negate() {
        assert_eq!(ldap("score gt 1.5"), "(!(score<=1.5))");
        assert_eq!(ldap(r#"name lt "m""#), "(!(name>=m))");
    }

    #[test]
    fn test_inclusive_comparisons() {
        assert_eq!(ldap("age ge 21"), "(age>=21)");
        assert_eq!(ldap("age le 21"), "(age<=21)");
    }

    #[test]
    fn test_null_equality() {
        let eq = Filter::equal_null("disabledDate").unwrap();
        let ne = Filter::not_equal_null("disabledDate").unwrap();
        assert_eq!(render_ldap(&eq).unwrap(), "(!(disabledDate=*))");
        assert_eq!(render_ldap(&ne).unwrap(), "(disabledDate=*)");
        assert_eq!(render_ldap(&!eq).unwrap(), "(disabledDate=*)");
    }

    #[test]
    fn test_not_equal_and_negated_equal() {
        assert_eq!(ldap(r#"userName ne "admin""#), "(!(userName=admin))");
        assert_eq!(ldap(r#"not(userName eq "admin")"#), "(!(userName=admin))");
        assert_eq!(ldap("not(title pr)"), "(!(title=*))");
    }

    #[test]
    fn test_chains_are_flattened() {
        assert_eq!(ldap("a pr and b pr and c pr"), "(&(a=*)(b=*)(c=*))");
        assert_eq!(ldap("a pr or (b pr or c pr)"), "(|(a=*)(b=*)(c=*))");
        assert_eq!(ldap("a pr and (b pr or c pr)"), "(&(a=*)(|(b=*)(c=*)))");
    }

    #[test]
    fn test_substring_operators() {
        assert_eq!(ldap(r#"domain sw "example""#), "(domain=example*)");
        assert_eq!(ldap(r#"mail ew "outlook.com""#), "(mail=*outlook.com)");
        assert_eq!(ldap(r#"name co "John""#), "(name=*John*)");
    }

    #[test]
    fn test_in_becomes_disjunction() {
        assert_eq!(
            ldap(r#"domain in ("a.com","b.com")"#),
            "(|(domain=a.com)(domain=b.com))"
        );
    }

    #[test]
    fn test_boolean_values() {
        assert_eq!(ldap("isEnabled eq true"), "(isEnabled=TRUE)");
        assert_eq!(ldap("isEnabled ne false"), "(!(isEnabled=FALSE))");
    }

    #[test]
    fn test_string_escaping() {
        assert_eq!(escape("a*b(c)d\\e"), "a\\2ab\\28c\\29d\\5ce");
        assert_eq!(escape("nul\0"), "nul\\00");
        assert_eq!(escape("Lučić"), "Lu\\c4\\8di\\c4\\87");
        assert_eq!(ldap(r#"cn sw "a*""#), "(cn=a\\2a*)");
    }

    #[test]
    fn test_uuid_bytes_little_endian() {
        let filter = FilterParser::parse(r#"objectGUID eq "00112233-4455-6677-8899-aabbccddeeff""#)
            .unwrap();
        assert_eq!(
            render_ldap(&filter).unwrap(),
            "(objectGUID=\\33\\22\\11\\00\\55\\44\\77\\66\\88\\99\\AA\\BB\\CC\\DD\\EE\\FF)"
        );
    }

    #[test]
    fn test_date_time_as_file_time() {
        let epoch = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap();
        let filter = Filter::greater_than_or_equal("pwdLastSet", epoch).unwrap();
        assert_eq!(render_ldap(&filter).unwrap(), "(pwdLastSet>=116444736000000000)");
    }

    #[test]
    fn test_big_integer_successor() {
        assert_eq!(
            ldap("usn gt 9223372036854775807"),
            "(usn>=9223372036854775808)"
        );
    }
}
