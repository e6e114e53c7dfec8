//! Reference-token parser
//!
//! Scans text for variable reference tokens with their byte spans:
//! `$name`, `${name}`, and `${name:format}`. Names are word characters
//! (ASCII alphanumeric and underscore); the format part of a braced token
//! runs to the closing brace and may itself contain colons
//! (`${__from:date:iso}`).
//!
//! This is a static text scan, not semantic parsing: text that merely
//! resembles a reference inside a literal is still picked up.

use std::ops::Range;

/// A parsed variable reference token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableToken {
    /// Referenced variable name, without `$` or braces.
    pub name: String,

    /// Raw format specifier text, when the braced form carries one.
    pub format: Option<String>,

    /// Byte range of the whole token in the original text.
    pub span: Range<usize>,
}

const fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Parses a string and extracts all reference tokens in order.
///
/// Malformed candidates (`$` alone, `${}`, an unterminated `${name`) are
/// skipped, never reported as errors.
///
/// # Examples
///
/// ```
/// use templar_application::interpolate::parse_tokens;
///
/// let tokens = parse_tokens("cpu{host=\"$host\"} and ${region:csv}");
/// assert_eq!(tokens.len(), 2);
/// assert_eq!(tokens[0].name, "host");
/// assert_eq!(tokens[1].format.as_deref(), Some("csv"));
/// ```
#[must_use]
pub fn parse_tokens(input: &str) -> Vec<VariableToken> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'$' {
            i += 1;
            continue;
        }
        let start = i;
        i += 1;
        if i >= bytes.len() {
            break;
        }

        if bytes[i] == b'{' {
            i += 1;
            let name_start = i;
            while i < bytes.len() && is_word_byte(bytes[i]) {
                i += 1;
            }
            if i == name_start {
                continue;
            }
            let name = &input[name_start..i];

            let mut format = None;
            if i < bytes.len() && bytes[i] == b':' {
                let fmt_start = i + 1;
                while i < bytes.len() && bytes[i] != b'}' {
                    i += 1;
                }
                if i >= bytes.len() {
                    break;
                }
                format = Some(input[fmt_start..i].to_string());
            }

            if i < bytes.len() && bytes[i] == b'}' {
                i += 1;
                tokens.push(VariableToken {
                    name: name.to_string(),
                    format,
                    span: start..i,
                });
            }
        } else {
            let name_start = i;
            while i < bytes.len() && is_word_byte(bytes[i]) {
                i += 1;
            }
            if i == name_start {
                continue;
            }
            tokens.push(VariableToken {
                name: input[name_start..i].to_string(),
                format: None,
                span: start..i,
            });
        }
    }

    tokens
}

/// Extracts the distinct referenced names, in first-occurrence order.
#[must_use]
pub fn referenced_names(input: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for token in parse_tokens(input) {
        if !names.iter().any(|n| n == &token.name) {
            names.push(token.name);
        }
    }
    names
}
