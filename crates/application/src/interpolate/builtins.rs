//! Built-in variables
//!
//! Built-ins are read-only variables computed purely from the execution
//! context. They live outside the user-defined graph and never require a
//! collaborator call.

use templar_domain::ExecutionContext;

/// Interval ladder in milliseconds, ascending. Auto intervals snap to the
/// largest step not exceeding the raw value.
const INTERVAL_LADDER_MS: &[u64] = &[
    1,
    10,
    100,
    500,
    1_000,
    5_000,
    10_000,
    15_000,
    30_000,
    60_000,
    120_000,
    300_000,
    600_000,
    900_000,
    1_800_000,
    3_600_000,
    7_200_000,
    10_800_000,
    21_600_000,
    43_200_000,
    86_400_000,
    172_800_000,
    604_800_000,
    2_592_000_000,
    31_536_000_000,
];

/// Default number of interval steps across the range when the consumer
/// supplies no interval hint.
const DEFAULT_STEPS: u64 = 100;

/// Assumed scrape interval behind `$__rate_interval`.
const SCRAPE_INTERVAL_MS: u64 = 15_000;

/// Snaps a raw interval to the ladder.
#[must_use]
pub fn rounded_interval_ms(raw_ms: u64) -> u64 {
    let mut rounded = INTERVAL_LADDER_MS[0];
    for &step in INTERVAL_LADDER_MS {
        if step <= raw_ms {
            rounded = step;
        } else {
            break;
        }
    }
    rounded
}

/// Formats a millisecond duration with its largest exact unit, e.g.
/// `120000 -> "2m"`.
#[must_use]
pub fn format_interval(ms: u64) -> String {
    const UNITS: &[(u64, &str)] = &[
        (31_536_000_000, "y"),
        (604_800_000, "w"),
        (86_400_000, "d"),
        (3_600_000, "h"),
        (60_000, "m"),
        (1_000, "s"),
    ];
    for &(unit, suffix) in UNITS {
        if ms >= unit && ms % unit == 0 {
            return format!("{}{suffix}", ms / unit);
        }
    }
    format!("{ms}ms")
}

/// Parses a duration literal such as `"30s"`, `"5m"`, `"1h"` into
/// milliseconds. Bare numbers are treated as seconds.
#[must_use]
pub fn parse_duration_ms(text: &str) -> Option<u64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let split = text.find(|c: char| !c.is_ascii_digit()).unwrap_or(text.len());
    let (digits, unit) = text.split_at(split);
    let amount: u64 = digits.parse().ok()?;
    let factor = match unit {
        "ms" => 1,
        "" | "s" => 1_000,
        "m" => 60_000,
        "h" => 3_600_000,
        "d" => 86_400_000,
        "w" => 604_800_000,
        "y" => 31_536_000_000,
        _ => return None,
    };
    Some(amount * factor)
}

/// Computes the auto interval for a range: range divided by the target
/// step count, floored at `min_interval`, snapped to the ladder.
#[must_use]
pub fn auto_interval_ms(range_ms: u64, steps: u64, min_interval_ms: Option<u64>) -> u64 {
    let raw = range_ms / steps.max(1);
    let floored = raw.max(min_interval_ms.unwrap_or(0)).max(1);
    rounded_interval_ms(floored)
}

fn interval_ms(ctx: &ExecutionContext) -> u64 {
    ctx.interval_ms
        .unwrap_or_else(|| auto_interval_ms(ctx.time_range.duration_ms(), DEFAULT_STEPS, None))
}

fn format_range(ms: u64) -> String {
    if ms % 1_000 == 0 {
        format_interval(ms)
    } else {
        format!("{ms}ms")
    }
}

fn format_timestamp(epoch_ms: i64, format: Option<&str>) -> String {
    match format {
        None => epoch_ms.to_string(),
        Some(spec) => {
            let arg = spec.strip_prefix("date").map(|rest| rest.trim_start_matches(':'));
            match arg {
                Some("seconds") => (epoch_ms / 1_000).to_string(),
                // `date` and `date:iso` render ISO 8601; unknown date
                // arguments fall back to ISO as well.
                Some(_) => chrono::DateTime::from_timestamp_millis(epoch_ms)
                    .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
                    .unwrap_or_else(|| epoch_ms.to_string()),
                None => epoch_ms.to_string(),
            }
        }
    }
}

/// Resolves a built-in variable from the context alone.
///
/// Returns `None` when the name is not a built-in or the context lacks the
/// identity field it needs, in which case the token is left verbatim.
#[must_use]
pub fn resolve(name: &str, format: Option<&str>, ctx: &ExecutionContext) -> Option<String> {
    let range_ms = ctx.time_range.duration_ms();
    match name {
        "__interval" => Some(format_interval(interval_ms(ctx))),
        "__interval_ms" => Some(interval_ms(ctx).to_string()),
        "__range" => Some(format_range(range_ms)),
        "__range_s" => Some((range_ms / 1_000).to_string()),
        "__range_ms" => Some(range_ms.to_string()),
        "__rate_interval" => {
            let rate = (interval_ms(ctx) + SCRAPE_INTERVAL_MS).max(4 * SCRAPE_INTERVAL_MS);
            Some(format_interval(rate))
        }
        "__from" => Some(format_timestamp(ctx.time_range.from.timestamp_millis(), format)),
        "__to" => Some(format_timestamp(ctx.time_range.to.timestamp_millis(), format)),
        "__user" => ctx.user_login.clone(),
        "__org" => ctx.org_name.clone(),
        "__dashboard" => ctx.dashboard.clone(),
        _ => None,
    }
}

/// Returns true when the built-in consumes its format specifier itself
/// (timestamp date rendering) rather than receiving standard formatting.
#[must_use]
pub fn consumes_format(name: &str) -> bool {
    matches!(name, "__from" | "__to")
}
