//! Variable option types
//!
//! An option is one selectable entry of a resolved variable. Both its
//! display text and its value may be a scalar or an ordered list of
//! strings (multi-select grouping).

use serde::{Deserialize, Serialize};

/// Value of the synthetic "All" option when no custom all-value is set.
pub const ALL_VALUE: &str = "$__all";

/// Display text of the synthetic "All" option.
pub const ALL_TEXT: &str = "All";

/// A scalar string or an ordered list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// A single value.
    Scalar(String),
    /// An ordered list of values (multi-select).
    List(Vec<String>),
}

impl OptionValue {
    /// Returns the contained values as a slice-like iterator.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        match self {
            Self::Scalar(v) => std::slice::from_ref(v).iter().map(String::as_str),
            Self::List(vs) => vs[..].iter().map(String::as_str),
        }
    }

    /// Returns all contained values as an owned vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Self::Scalar(v) => vec![v.clone()],
            Self::List(vs) => vs.clone(),
        }
    }

    /// Returns the scalar value, or the first list element.
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::Scalar(v) => Some(v),
            Self::List(vs) => vs.first().map(String::as_str),
        }
    }

    /// Returns true for an empty list (the multi "none selected" sentinel).
    #[must_use]
    pub const fn is_empty_list(&self) -> bool {
        matches!(self, Self::List(vs) if vs.is_empty())
    }

    /// Returns true if any contained value equals `candidate`.
    #[must_use]
    pub fn contains(&self, candidate: &str) -> bool {
        self.values().any(|v| v == candidate)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<String>> for OptionValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values)
    }
}

impl std::fmt::Display for OptionValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scalar(v) => f.write_str(v),
            Self::List(vs) => f.write_str(&vs.join(",")),
        }
    }
}

/// One selectable entry of a resolved variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableOption {
    /// Display text.
    pub text: OptionValue,

    /// Underlying value substituted during interpolation.
    pub value: OptionValue,

    /// Whether this option is part of the current selection.
    #[serde(default)]
    pub selected: bool,
}

impl VariableOption {
    /// Creates an unselected option with distinct text and value.
    #[must_use]
    pub fn new(text: impl Into<OptionValue>, value: impl Into<OptionValue>) -> Self {
        Self {
            text: text.into(),
            value: value.into(),
            selected: false,
        }
    }

    /// Creates an unselected option whose text equals its value.
    #[must_use]
    pub fn from_value(value: impl Into<String>) -> Self {
        let value = value.into();
        Self::new(value.clone(), value)
    }

    /// Creates the synthetic "All" option.
    #[must_use]
    pub fn all(all_value: Option<&str>) -> Self {
        Self::new(ALL_TEXT, all_value.unwrap_or(ALL_VALUE))
    }

    /// Creates the "none selected" sentinel used by multi-value variables
    /// when zero options are selected.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            text: OptionValue::List(Vec::new()),
            value: OptionValue::List(Vec::new()),
            selected: true,
        }
    }

    /// Returns a copy with the `selected` flag set.
    #[must_use]
    pub fn selected(mut self) -> Self {
        self.selected = true;
        self
    }

    /// Returns true if this is the synthetic "All" option (or a selection
    /// wrapping it).
    #[must_use]
    pub fn is_all(&self) -> bool {
        self.value.contains(ALL_VALUE) || self.text.contains(ALL_TEXT)
    }

    /// Returns true if this is the multi "none selected" sentinel.
    #[must_use]
    pub const fn is_none_sentinel(&self) -> bool {
        self.value.is_empty_list()
    }
}
