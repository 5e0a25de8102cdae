//! End-to-end scenarios: text in, dialect strings out.

use quaero::filter::OptimizerOptions;
use quaero::{render, Dialect, Filter, FilterError, FilterParser};
use rstest::rstest;

fn parse(input: &str) -> Filter {
    FilterParser::parse(input).unwrap()
}

#[test]
fn test_integer_greater_than() {
    let filter = parse("age gt 18");
    assert_eq!(filter, Filter::greater_than("age", 18).unwrap());
    assert_eq!(render(&filter, Dialect::Graph).unwrap(), "age gt 18");
    assert_eq!(render(&filter, Dialect::Ldap).unwrap(), "(age>=19)");
}

#[test]
fn test_negated_equality_optimizes_to_not_equal() {
    let filter = parse(r#"not(userName eq "admin")"#).optimize();
    assert_eq!(filter, Filter::not_equal("userName", "admin").unwrap());
    assert_eq!(render(&filter, Dialect::Scim).unwrap(), r#"userName ne "admin""#);
}

#[test]
fn test_in_list() {
    let filter = parse(r#"domain in ("a.com","b.com")"#);
    assert_eq!(
        render(&filter, Dialect::Graph).unwrap(),
        r#"domain in ("a.com", "b.com")"#
    );
    assert_eq!(
        render(&filter, Dialect::Ldap).unwrap(),
        "(|(domain=a.com)(domain=b.com))"
    );
}

#[test]
fn test_null_equality_in_directory_dialect() {
    let absent = Filter::equal_null("disabledDate").unwrap();
    let present = Filter::not_equal_null("disabledDate").unwrap();
    assert_eq!(render(&absent, Dialect::Ldap).unwrap(), "(!(disabledDate=*))");
    assert_eq!(render(&present, Dialect::Ldap).unwrap(), "(disabledDate=*)");
}

#[test]
fn test_duplicate_collapse_is_opt_in() {
    let x = parse("id eq 60 and id eq 1188");
    let filter = x.clone().or(x.clone());

    assert_eq!(filter.optimize(), filter);

    let options = OptimizerOptions {
        collapse_duplicates: true,
    };
    assert_eq!(filter.optimize_with(options), x);
}

#[rstest]
#[case(
    r#"userName eq "khellang""#,
    r#"userName eq "khellang""#,
    "(userName=khellang)",
    r#"userName eq "khellang""#
)]
#[case("userName ne null", "userName ne null", "(userName=*)", "userName pr")]
#[case("age le 21", "age le 21", "(age<=21)", "age le 21")]
#[case(
    "timestamp ge 1709586325",
    "timestamp ge 1709586325",
    "(timestamp>=1709586325)",
    "timestamp ge 1709586325"
)]
#[case(
    "timestamp lt 1709586325",
    "timestamp lt 1709586325",
    "(timestamp<=1709586324)",
    "timestamp lt 1709586325"
)]
#[case(
    r#"mail ew "outlook.com""#,
    r#"endsWith(mail, "outlook.com")"#,
    "(mail=*outlook.com)",
    r#"mail ew "outlook.com""#
)]
#[case(
    r#"domain sw "example.com""#,
    r#"startsWith(domain, "example.com")"#,
    "(domain=example.com*)",
    r#"domain sw "example.com""#
)]
#[case(r#"name co "John""#, r#"contains(name, "John")"#, "(name=*John*)", r#"name co "John""#)]
#[case(
    "id eq 60 and id eq 1188",
    "(id eq 60 and id eq 1188)",
    "(&(id=60)(id=1188))",
    "(id eq 60 and id eq 1188)"
)]
#[case(
    "id eq 60 or id eq 1188",
    "(id eq 60 or id eq 1188)",
    "(|(id=60)(id=1188))",
    "(id eq 60 or id eq 1188)"
)]
#[case("isEnabled eq true", "isEnabled eq true", "(isEnabled=TRUE)", "isEnabled eq true")]
#[case("isEnabled ne false", "isEnabled ne false", "(!(isEnabled=FALSE))", "isEnabled ne false")]
#[case("title pr", "title ne null", "(title=*)", "title pr")]
#[case(
    r#"not(userName eq "admin")"#,
    r#"not(userName eq "admin")"#,
    "(!(userName=admin))",
    r#"not(userName eq "admin")"#
)]
fn test_render_all_dialects(
    #[case] input: &str,
    #[case] graph: &str,
    #[case] ldap: &str,
    #[case] scim: &str,
) {
    let filter = parse(input);
    assert_eq!(render(&filter, Dialect::Graph).unwrap(), graph, "graph: {}", input);
    assert_eq!(render(&filter, Dialect::Ldap).unwrap(), ldap, "ldap: {}", input);
    assert_eq!(render(&filter, Dialect::Scim).unwrap(), scim, "scim: {}", input);
}

#[rstest]
#[case("")]
#[case("age")]
#[case("age gt")]
#[case("age gt 18 and")]
#[case("(age gt 18")]
#[case("age gt 18)")]
#[case("age between 1")]
#[case("name sw 42")]
#[case("dept in \"Sales\"")]
fn test_parse_errors_carry_position(#[case] input: &str) {
    let err = FilterParser::parse(input).unwrap_err();
    assert!(matches!(err, FilterError::Parse { .. }), "{}: {:?}", input, err);
    assert!(err.position().is_some());
}

#[rstest]
#[case("age ! 1")]
#[case("name eq \"unterminated")]
#[case(r#"name eq "bad \x escape""#)]
#[case("n eq 12abc")]
#[case(r#"id eq "94957019-fc7d-417d-bd1b147cc6113e-d3""#)]
fn test_lex_errors(#[case] input: &str) {
    let err = FilterParser::parse(input).unwrap_err();
    assert!(matches!(err, FilterError::Lex { .. }), "{}: {:?}", input, err);
}

#[test]
fn test_unsupported_construct_is_reported_not_rendered() {
    let filter = parse(r#"dept in ("Sales", "Retail")"#);
    let err = render(&filter, Dialect::Scim).unwrap_err();
    assert_eq!(
        err.to_string(),
        "SCIM filters cannot express 'in' with 2 values on 'dept'"
    );
}

#[test]
fn test_filter_serializes_with_tagged_ops() {
    let filter = parse(r#"age gt 18 and not(name sw "x")"#);
    let json = serde_json::to_value(&filter).unwrap();
    assert_eq!(json["op"], "and");
    assert_eq!(json["args"][0]["op"], "greater_than");
    assert_eq!(json["args"][0]["args"]["value"]["type"], "int");

    let back: Filter = serde_json::from_value(json).unwrap();
    assert_eq!(back, filter);
}
