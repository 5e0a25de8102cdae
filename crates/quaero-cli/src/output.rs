//! Text formatting for command output.

use owo_colors::OwoColorize;
use quaero::{Dialect, FilterError};

/// Formats one translated filter as `Label: text`.
pub fn format_rendered(dialect: Dialect, rendered: &str, use_colors: bool) -> String {
    if !use_colors {
        return format!("{}: {}", dialect.label(), rendered);
    }
    let text = match dialect {
        Dialect::Graph => rendered.blue().to_string(),
        Dialect::Ldap => rendered.purple().to_string(),
        Dialect::Scim => rendered.green().to_string(),
    };
    format!("{}: {}", dialect.label(), text)
}

/// Formats an error message, red when colors are on.
pub fn format_error(message: &str, use_colors: bool) -> String {
    if use_colors {
        message.red().to_string()
    } else {
        message.to_string()
    }
}

/// Formats a caret pointing at a 1-based column, shifted right by `indent`
/// characters (the width of whatever precedes the echoed input).
pub fn format_caret(indent: usize, column: usize, use_colors: bool) -> String {
    let padding = " ".repeat(indent + column.saturating_sub(1));
    format!("{}{}", padding, format_error("^", use_colors))
}

/// Formats a filter error for interactive display.
///
/// Syntax errors get a caret line under the offending column followed by the
/// bare message; other errors print only the message.
pub fn format_filter_error(err: &FilterError, indent: usize, use_colors: bool) -> Vec<String> {
    match err.position() {
        Some(position) => vec![
            format_caret(indent, position.column, use_colors),
            format_error(&err.message(), use_colors),
        ],
        None => vec![format_error(&err.to_string(), use_colors)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quaero::FilterParser;

    #[test]
    fn test_format_rendered_plain() {
        assert_eq!(
            format_rendered(Dialect::Ldap, "(age>=19)", false),
            "LDAP: (age>=19)"
        );
        assert_eq!(
            format_rendered(Dialect::Graph, "age gt 18", false),
            "Graph: age gt 18"
        );
    }

    #[test]
    fn test_format_rendered_colored_keeps_label_plain() {
        let line = format_rendered(Dialect::Scim, "age gt 18", true);
        assert!(line.starts_with("SCIM: "));
        assert!(line.contains("age gt 18"));
        assert!(line.contains('\u{1b}'));
    }

    #[test]
    fn test_format_caret() {
        assert_eq!(format_caret(0, 1, false), "^");
        assert_eq!(format_caret(7, 5, false), "           ^");
        assert_eq!(format_caret(2, 0, false), "  ^");
    }

    #[test]
    fn test_syntax_error_points_at_column() {
        let err = FilterParser::parse("age between 1").unwrap_err();
        let lines = format_filter_error(&err, 0, false);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "    ^");
        assert!(lines[1].starts_with("unknown operator 'between'"));
    }

    #[test]
    fn test_render_error_has_no_caret() {
        let err = FilterError::unsupported("SCIM", "'in' with 2 values on 'dept'");
        let lines = format_filter_error(&err, 7, false);
        assert_eq!(lines, vec!["SCIM filters cannot express 'in' with 2 values on 'dept'"]);
    }
}
