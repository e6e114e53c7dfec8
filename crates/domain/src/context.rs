//! Execution context for resolution and interpolation
//!
//! The context carries everything built-in variables and interval
//! computation need: the active time range, a request-local scoped-variable
//! overlay, and identity fields. It is passed by reference into every
//! engine operation; the engine never stores it.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::option::OptionValue;

/// A closed time interval `[from, to]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Start of the range.
    pub from: DateTime<Utc>,
    /// End of the range.
    pub to: DateTime<Utc>,
}

impl TimeRange {
    /// Creates a range, validating that `from` is not after `to`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidTimeRange`] when `from > to`.
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> DomainResult<Self> {
        if from > to {
            return Err(DomainError::InvalidTimeRange {
                from: from.to_rfc3339(),
                to: to.to_rfc3339(),
            });
        }
        Ok(Self { from, to })
    }

    /// Creates the range ending now with the given lookback.
    #[must_use]
    pub fn last(duration: Duration) -> Self {
        let to = Utc::now();
        let from = to
            - chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::zero());
        Self { from, to }
    }

    /// Range length. Zero-width ranges are allowed.
    #[must_use]
    pub fn duration(&self) -> Duration {
        (self.to - self.from).to_std().unwrap_or(Duration::ZERO)
    }

    /// Range length in whole milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        u64::try_from((self.to - self.from).num_milliseconds().max(0)).unwrap_or(0)
    }
}

impl Default for TimeRange {
    fn default() -> Self {
        // Last six hours, the conventional dashboard default.
        Self::last(Duration::from_secs(6 * 3600))
    }
}

/// A request-local override injected into one interpolation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopedValue {
    /// Display text.
    pub text: OptionValue,
    /// Substituted value.
    pub value: OptionValue,
}

impl ScopedValue {
    /// Creates a scoped value whose text equals its value.
    #[must_use]
    pub fn new(value: impl Into<OptionValue>) -> Self {
        let value = value.into();
        Self {
            text: value.clone(),
            value,
        }
    }

    /// Creates a scoped value with distinct text and value.
    #[must_use]
    pub fn with_text(text: impl Into<OptionValue>, value: impl Into<OptionValue>) -> Self {
        Self {
            text: text.into(),
            value: value.into(),
        }
    }
}

/// Request-local name -> value overlay, highest interpolation precedence.
pub type ScopedVars = HashMap<String, ScopedValue>;

/// Ambient inputs for one resolution or interpolation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// Active time range.
    pub time_range: TimeRange,

    /// Interval hint in milliseconds, used by `$__interval` when the
    /// consumer has already computed a panel interval. When absent the
    /// interval is derived from the range.
    #[serde(default)]
    pub interval_ms: Option<u64>,

    /// Login of the acting user, for the `$__user` built-in.
    #[serde(default)]
    pub user_login: Option<String>,

    /// Email of the acting user.
    #[serde(default)]
    pub user_email: Option<String>,

    /// Organization name, for the `$__org` built-in.
    #[serde(default)]
    pub org_name: Option<String>,

    /// Dashboard title, for the `$__dashboard` built-in.
    #[serde(default)]
    pub dashboard: Option<String>,
}

impl ExecutionContext {
    /// Creates a context with the given time range and no identity fields.
    #[must_use]
    pub const fn new(time_range: TimeRange) -> Self {
        Self {
            time_range,
            interval_ms: None,
            user_login: None,
            user_email: None,
            org_name: None,
            dashboard: None,
        }
    }

    /// Creates a fixed context useful in tests: 2024-01-01 00:00..06:00 UTC.
    #[must_use]
    pub fn fixed() -> Self {
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single();
        let to = Utc.with_ymd_and_hms(2024, 1, 1, 6, 0, 0).single();
        match (from, to) {
            (Some(from), Some(to)) => Self::new(TimeRange { from, to }),
            _ => Self::default(),
        }
    }

    /// Returns a copy with the given time range.
    #[must_use]
    pub const fn with_time_range(mut self, time_range: TimeRange) -> Self {
        self.time_range = time_range;
        self
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new(TimeRange::default())
    }
}
