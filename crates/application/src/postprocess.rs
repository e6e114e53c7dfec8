//! Option post-processing
//!
//! Pipeline applied to every raw option list a kind resolver produces:
//! regex filter, sort, synthetic "All" injection, and reconciliation of
//! the current selection against the new list.

use std::cmp::Ordering;
use std::collections::HashSet;

use regex::Regex;
use templar_domain::{OptionValue, SortMode, VariableDefinition, VariableOption};

/// Runs the full pipeline and returns finalized options plus the
/// reconciled current selection.
#[must_use]
pub fn postprocess(
    raw: Vec<VariableOption>,
    def: &VariableDefinition,
    previous_current: Option<&VariableOption>,
) -> (Vec<VariableOption>, Option<VariableOption>) {
    let mut options = apply_regex_filter(raw, def);
    dedupe_by_value(&mut options);
    sort_options(&mut options, def.sort);
    if def.include_all {
        options.insert(0, VariableOption::all(def.all_value.as_deref()));
    }
    let current = reconcile_current(&mut options, def, previous_current);
    (options, current)
}

fn apply_regex_filter(
    raw: Vec<VariableOption>,
    def: &VariableDefinition,
) -> Vec<VariableOption> {
    let Some(pattern) = def.regex_filter.as_deref().filter(|p| !p.is_empty()) else {
        return raw;
    };
    let regex = match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(err) => {
            // Invalid pattern is non-fatal: skip filtering entirely.
            tracing::warn!(
                variable = %def.name,
                pattern,
                error = %err,
                "invalid regex filter, returning unfiltered options"
            );
            return raw;
        }
    };

    let named_groups: Vec<&str> = regex.capture_names().flatten().collect();
    let extracts = regex.captures_len() > 1
        || named_groups.contains(&"text")
        || named_groups.contains(&"value");

    if !extracts {
        return raw
            .into_iter()
            .filter(|o| regex.is_match(&o.text.to_string()))
            .collect();
    }

    // Capture-group mode: the matched text/value are taken from named
    // groups `text`/`value`, or group 1 when unnamed.
    let mut out = Vec::new();
    for option in raw {
        let display = option.text.to_string();
        let Some(caps) = regex.captures(&display) else {
            continue;
        };
        let group_1 = caps.get(1).map(|m| m.as_str());
        let text = caps
            .name("text")
            .map(|m| m.as_str())
            .or(group_1)
            .unwrap_or(&display);
        let value = caps
            .name("value")
            .map(|m| m.as_str())
            .or(group_1)
            .unwrap_or(&display);
        out.push(VariableOption::new(text, value));
    }
    out
}

fn dedupe_by_value(options: &mut Vec<VariableOption>) {
    let mut seen: HashSet<OptionValue> = HashSet::new();
    options.retain(|o| seen.insert(o.value.clone()));
}

fn leading_number(text: &str) -> Option<f64> {
    if let Ok(n) = text.parse::<f64>() {
        return Some(n);
    }
    let end = text
        .find(|c: char| !c.is_ascii_digit() && c != '.' && c != '-')
        .unwrap_or(text.len());
    text[..end].parse().ok()
}

fn sort_options(options: &mut [VariableOption], mode: SortMode) {
    if mode == SortMode::Disabled {
        return;
    }
    options.sort_by(|a, b| {
        let (a, b) = (a.text.to_string(), b.text.to_string());
        let ordering = match mode {
            SortMode::Disabled => Ordering::Equal,
            SortMode::AlphabeticalAsc | SortMode::AlphabeticalDesc => a.cmp(&b),
            SortMode::AlphabeticalCiAsc | SortMode::AlphabeticalCiDesc => {
                a.to_lowercase().cmp(&b.to_lowercase())
            }
            SortMode::NumericalAsc | SortMode::NumericalDesc => {
                match (leading_number(&a), leading_number(&b)) {
                    (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                    // Numeric parse failure falls back to alphabetical
                    // comparison for that pair.
                    _ => a.cmp(&b),
                }
            }
        };
        match mode {
            SortMode::AlphabeticalDesc
            | SortMode::AlphabeticalCiDesc
            | SortMode::NumericalDesc => ordering.reverse(),
            _ => ordering,
        }
    });
}

fn reconcile_current(
    options: &mut [VariableOption],
    def: &VariableDefinition,
    previous: Option<&VariableOption>,
) -> Option<VariableOption> {
    for option in options.iter_mut() {
        option.selected = false;
    }
    if options.is_empty() {
        return None;
    }

    if let Some(prev) = previous {
        if prev.is_all() && def.include_all {
            options[0].selected = true;
            return Some(wrap_for(def, &options[0]));
        }

        let prev_values = prev.value.to_vec();
        if def.multi {
            let mut texts = Vec::new();
            let mut values = Vec::new();
            for option in options.iter_mut() {
                if option.is_all() {
                    continue;
                }
                if let OptionValue::Scalar(v) = &option.value {
                    if prev_values.iter().any(|pv| pv == v) {
                        option.selected = true;
                        texts.push(option.text.to_string());
                        values.push(v.clone());
                    }
                }
            }
            if !values.is_empty() {
                return Some(
                    VariableOption::new(OptionValue::List(texts), OptionValue::List(values))
                        .selected(),
                );
            }
        } else if let Some(prev_value) = prev_values.first() {
            if let Some(option) = options
                .iter_mut()
                .find(|o| o.value.contains(prev_value))
            {
                option.selected = true;
                return Some(option.clone());
            }
        }
    }

    options[0].selected = true;
    Some(wrap_for(def, &options[0]))
}

/// Multi variables carry list-shaped selections even for a single pick.
fn wrap_for(def: &VariableDefinition, option: &VariableOption) -> VariableOption {
    if def.multi {
        VariableOption::new(
            OptionValue::List(option.text.to_vec()),
            OptionValue::List(option.value.to_vec()),
        )
        .selected()
    } else {
        option.clone().selected()
    }
}
