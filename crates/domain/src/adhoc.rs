//! Ad-hoc filter types
//!
//! Ad-hoc variables carry key/operator/value filters that consumers apply
//! directly to their queries. They are never part of the dependency graph
//! and require no resolution.

use serde::{Deserialize, Serialize};

/// Comparison operator of an ad-hoc filter, with its wire display form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    /// `=`
    Eq,
    /// `!=`
    Neq,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `=~`
    RegexMatch,
    /// `!~`
    RegexNotMatch,
}

impl FilterOperator {
    /// The operator as it appears in query text.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Neq => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::RegexMatch => "=~",
            Self::RegexNotMatch => "!~",
        }
    }
}

impl std::fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One key/operator/value filter of an ad-hoc variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdHocFilter {
    /// Label or column the filter applies to.
    pub key: String,
    /// Comparison operator.
    pub operator: FilterOperator,
    /// Comparison value.
    pub value: String,
}

impl AdHocFilter {
    /// Creates a filter.
    #[must_use]
    pub fn new(
        key: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            operator,
            value: value.into(),
        }
    }
}

impl std::fmt::Display for AdHocFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.key, self.operator, self.value)
    }
}
