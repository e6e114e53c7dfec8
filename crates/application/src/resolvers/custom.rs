//! Custom-list resolver

use async_trait::async_trait;
use templar_domain::{ExecutionContext, VariableDefinition, VariableOption};

use super::{KindResolver, ResolveDeps, ResolveError};

/// Resolves a Custom variable by parsing its comma-separated list.
///
/// Items are either `value` or `label : value`; a backslash escapes a
/// comma inside an item.
pub struct CustomResolver;

/// Splits on unescaped commas and trims items; `\,` becomes a literal
/// comma.
pub(crate) fn split_items(input: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&',') => {
                chars.next();
                current.push(',');
            }
            ',' => {
                items.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    items.push(current.trim().to_string());
    items.retain(|i| !i.is_empty());
    items
}

fn parse_item(item: &str) -> VariableOption {
    // `label : value` form; a plain `a:b` (no spaces) stays one value so
    // URLs and metric selectors survive.
    item.split_once(" : ").map_or_else(
        || VariableOption::from_value(item),
        |(label, value)| VariableOption::new(label.trim(), value.trim()),
    )
}

#[async_trait]
impl KindResolver for CustomResolver {
    async fn resolve(
        &self,
        def: &VariableDefinition,
        _deps: &ResolveDeps<'_>,
        _ctx: &ExecutionContext,
    ) -> Result<Vec<VariableOption>, ResolveError> {
        Ok(split_items(&def.query).iter().map(|i| parse_item(i)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolvers::testsupport::{deps_fixture, resolve_blocking};
    use pretty_assertions::assert_eq;

    fn resolve(query: &str) -> Vec<VariableOption> {
        let def = VariableDefinition::custom("x", query);
        resolve_blocking(&CustomResolver, &def, &deps_fixture()).unwrap()
    }

    #[test]
    fn test_plain_values() {
        let options = resolve("a, b ,c");
        let values: Vec<String> = options.iter().map(|o| o.value.to_string()).collect();
        assert_eq!(values, ["a", "b", "c"]);
    }

    #[test]
    fn test_label_value_pairs() {
        let options = resolve("Production : prod, Staging : stg");
        assert_eq!(options[0].text.to_string(), "Production");
        assert_eq!(options[0].value.to_string(), "prod");
        assert_eq!(options[1].value.to_string(), "stg");
    }

    #[test]
    fn test_escaped_comma() {
        let options = resolve(r"a\,b, c");
        let values: Vec<String> = options.iter().map(|o| o.value.to_string()).collect();
        assert_eq!(values, ["a,b", "c"]);
    }

    #[test]
    fn test_colon_without_spaces_is_one_value() {
        let options = resolve("http://example:9090");
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].value.to_string(), "http://example:9090");
    }

    #[test]
    fn test_empty_items_dropped() {
        let options = resolve("a,,b,");
        assert_eq!(options.len(), 2);
    }
}
