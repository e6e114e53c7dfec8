//! Format specifiers
//!
//! A format specifier controls how a variable's value renders into text,
//! mainly how a multi-value selection is joined. Scalar values ignore the
//! multi-only wrapping but still receive per-value transforms (escaping,
//! quoting, encoding).

use std::str::FromStr;

/// How a variable value renders during interpolation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VariableFormat {
    /// Values joined with `,`. The default.
    #[default]
    Raw,
    /// Values joined with `,`.
    Csv,
    /// Values joined with `|`.
    Pipe,
    /// JSON array literal.
    Json,
    /// Regex alternation `(v1|v2)`, individual values regex-escaped.
    Regex,
    /// Glob braces `{v1,v2}`.
    Glob,
    /// Each value percent-encoded, joined with `,`.
    PercentEncode,
    /// Each value single-quoted with internal quotes doubled, joined
    /// with `,`.
    SqlString,
    /// Graphite-style `v1,name=v2,name=v3`.
    Distributed,
    /// Lucene `("v1" OR "v2")`, values Lucene-escaped.
    Lucene,
    /// Display texts joined with ` + `.
    Text,
    /// `var-name=v1&var-name=v2`, values percent-encoded.
    QueryParam,
}

impl FromStr for VariableFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "raw" => Ok(Self::Raw),
            "csv" => Ok(Self::Csv),
            "pipe" => Ok(Self::Pipe),
            "json" => Ok(Self::Json),
            "regex" => Ok(Self::Regex),
            "glob" => Ok(Self::Glob),
            "percentencode" | "percent-encode" | "uriencode" | "uri-encode" => {
                Ok(Self::PercentEncode)
            }
            "sqlstring" | "sql-string" => Ok(Self::SqlString),
            "distributed" => Ok(Self::Distributed),
            "lucene" => Ok(Self::Lucene),
            "text" => Ok(Self::Text),
            "queryparam" => Ok(Self::QueryParam),
            _ => Err(()),
        }
    }
}

fn sql_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn lucene_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(
            c,
            '+' | '-' | '&' | '|' | '!' | '(' | ')' | '{' | '}' | '[' | ']' | '^' | '"' | '~'
                | '*' | '?' | ':' | '\\' | '/'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Renders values under the given format.
///
/// `name` is the variable name, consumed by the name-carrying formats
/// (`distributed`, `queryparam`). `texts` are the display texts backing the
/// `text` format; pass the values again when no distinct texts exist.
#[must_use]
pub fn format_values(
    format: VariableFormat,
    name: &str,
    values: &[String],
    texts: &[String],
) -> String {
    let multi = values.len() > 1;
    match format {
        VariableFormat::Raw | VariableFormat::Csv => values.join(","),
        VariableFormat::Pipe => values.join("|"),
        VariableFormat::Json => {
            if multi {
                serde_json::to_string(values).unwrap_or_default()
            } else {
                values.join(",")
            }
        }
        VariableFormat::Regex => {
            let escaped: Vec<String> = values.iter().map(|v| regex::escape(v)).collect();
            if multi {
                format!("({})", escaped.join("|"))
            } else {
                escaped.join("")
            }
        }
        VariableFormat::Glob => {
            if multi {
                format!("{{{}}}", values.join(","))
            } else {
                values.join(",")
            }
        }
        VariableFormat::PercentEncode => values
            .iter()
            .map(|v| urlencoding::encode(v).into_owned())
            .collect::<Vec<_>>()
            .join(","),
        VariableFormat::SqlString => values
            .iter()
            .map(|v| sql_quote(v))
            .collect::<Vec<_>>()
            .join(","),
        VariableFormat::Distributed => {
            let mut out = String::new();
            for (idx, v) in values.iter().enumerate() {
                if idx == 0 {
                    out.push_str(v);
                } else {
                    out.push(',');
                    out.push_str(name);
                    out.push('=');
                    out.push_str(v);
                }
            }
            out
        }
        VariableFormat::Lucene => {
            if multi {
                let quoted: Vec<String> = values
                    .iter()
                    .map(|v| format!("\"{}\"", lucene_escape(v)))
                    .collect();
                format!("({})", quoted.join(" OR "))
            } else {
                values.iter().map(|v| lucene_escape(v)).collect()
            }
        }
        VariableFormat::Text => texts.join(" + "),
        VariableFormat::QueryParam => values
            .iter()
            .map(|v| format!("var-{name}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&"),
    }
}

/// Renders values under a raw specifier string, tolerating unknown names.
///
/// An unknown specifier falls back to the glob-style join for multi values
/// and the raw value for scalars, with a debug log. Errors never surface.
#[must_use]
pub fn render(spec: Option<&str>, name: &str, values: &[String], texts: &[String]) -> String {
    let format = match spec {
        None => VariableFormat::Raw,
        Some(text) => text.parse().unwrap_or_else(|()| {
            tracing::debug!(specifier = text, variable = name, "unknown format specifier");
            VariableFormat::Glob
        }),
    };
    format_values(format, name, values, texts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ab() -> Vec<String> {
        vec!["a".to_string(), "b".to_string()]
    }

    #[test]
    fn test_multi_joins() {
        let texts = ab();
        assert_eq!(format_values(VariableFormat::Csv, "x", &ab(), &texts), "a,b");
        assert_eq!(format_values(VariableFormat::Pipe, "x", &ab(), &texts), "a|b");
        assert_eq!(
            format_values(VariableFormat::Json, "x", &ab(), &texts),
            r#"["a","b"]"#
        );
        assert_eq!(format_values(VariableFormat::Regex, "x", &ab(), &texts), "(a|b)");
        assert_eq!(format_values(VariableFormat::Glob, "x", &ab(), &texts), "{a,b}");
    }

    #[test]
    fn test_scalar_ignores_multi_wrapping() {
        let one = vec!["v".to_string()];
        assert_eq!(format_values(VariableFormat::Json, "x", &one, &one), "v");
        assert_eq!(format_values(VariableFormat::Glob, "x", &one, &one), "v");
        assert_eq!(format_values(VariableFormat::Regex, "x", &one, &one), "v");
    }

    #[test]
    fn test_regex_escapes_values() {
        let vals = vec!["a.b".to_string(), "c+d".to_string()];
        assert_eq!(
            format_values(VariableFormat::Regex, "x", &vals, &vals),
            r"(a\.b|c\+d)"
        );
    }

    #[test]
    fn test_sql_string_doubles_quotes() {
        let vals = vec!["it's".to_string(), "ok".to_string()];
        assert_eq!(
            format_values(VariableFormat::SqlString, "x", &vals, &vals),
            "'it''s','ok'"
        );
    }

    #[test]
    fn test_percent_encode() {
        let vals = vec!["a b".to_string(), "c/d".to_string()];
        assert_eq!(
            format_values(VariableFormat::PercentEncode, "x", &vals, &vals),
            "a%20b,c%2Fd"
        );
    }

    #[test]
    fn test_distributed() {
        let vals = vec!["one".to_string(), "two".to_string(), "three".to_string()];
        assert_eq!(
            format_values(VariableFormat::Distributed, "host", &vals, &vals),
            "one,host=two,host=three"
        );
    }

    #[test]
    fn test_lucene() {
        let vals = vec!["a:1".to_string(), "b".to_string()];
        assert_eq!(
            format_values(VariableFormat::Lucene, "x", &vals, &vals),
            r#"("a\:1" OR "b")"#
        );
    }

    #[test]
    fn test_queryparam() {
        let vals = ab();
        assert_eq!(
            format_values(VariableFormat::QueryParam, "host", &vals, &vals),
            "var-host=a&var-host=b"
        );
    }

    #[test]
    fn test_text_uses_display_texts() {
        let vals = ab();
        let texts = vec!["Alpha".to_string(), "Beta".to_string()];
        assert_eq!(
            format_values(VariableFormat::Text, "x", &vals, &texts),
            "Alpha + Beta"
        );
    }

    #[test]
    fn test_hyphenated_specifier_aliases() {
        assert_eq!("sql-string".parse(), Ok(VariableFormat::SqlString));
        assert_eq!("percent-encode".parse(), Ok(VariableFormat::PercentEncode));
        assert_eq!("uri-encode".parse(), Ok(VariableFormat::PercentEncode));
        assert_eq!("uriencode".parse(), Ok(VariableFormat::PercentEncode));
        let vals = vec!["a b".to_string()];
        assert_eq!(render(Some("percent-encode"), "x", &vals, &vals), "a%20b");
    }

    #[test]
    fn test_render_unknown_specifier_falls_back() {
        let vals = ab();
        assert_eq!(render(Some("bogus"), "x", &vals, &vals), "{a,b}");
        let one = vec!["v".to_string()];
        assert_eq!(render(Some("bogus"), "x", &one, &one), "v");
    }
}
