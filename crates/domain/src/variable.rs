//! Variable definition types
//!
//! A definition describes how a variable obtains its options; it carries
//! no resolved state. Resolution state lives in [`crate::ResolvedVariable`].

use std::collections::HashSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};

/// Resolution strategy tag. Closed set: adding a kind means adding one
/// resolver implementation in the application layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableKind {
    /// Options come from delegating an interpolated query to a datasource.
    Query,
    /// Options are a comma-separated list in the definition itself.
    Custom,
    /// A single fixed value.
    Constant,
    /// One option per registered datasource, optionally filtered by type.
    DataSourceList,
    /// A list of duration literals, optionally with a computed `auto` entry.
    Interval,
    /// A single free-text value the user can edit.
    TextBox,
    /// Pass-through filter definitions applied directly by consumers.
    AdHoc,
}

impl FromStr for VariableKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "query" => Ok(Self::Query),
            "custom" => Ok(Self::Custom),
            "constant" => Ok(Self::Constant),
            "datasource" | "data_source_list" => Ok(Self::DataSourceList),
            "interval" => Ok(Self::Interval),
            "textbox" | "text_box" => Ok(Self::TextBox),
            "adhoc" | "ad_hoc" => Ok(Self::AdHoc),
            other => Err(DomainError::UnknownKind(other.to_string())),
        }
    }
}

/// Ordering applied to resolved options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Keep the order the resolver produced.
    #[default]
    Disabled,
    /// Alphabetical, case-sensitive, ascending.
    AlphabeticalAsc,
    /// Alphabetical, case-sensitive, descending.
    AlphabeticalDesc,
    /// Numeric by leading number, ascending.
    NumericalAsc,
    /// Numeric by leading number, descending.
    NumericalDesc,
    /// Alphabetical, case-insensitive, ascending.
    AlphabeticalCiAsc,
    /// Alphabetical, case-insensitive, descending.
    AlphabeticalCiDesc,
}

/// When a variable is re-resolved without an explicit user action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshTrigger {
    /// Only resolved when a dependency cascade reaches it.
    #[default]
    Never,
    /// Resolved during session initialization.
    OnLoad,
    /// Resolved during initialization and on every time-range change.
    OnTimeRangeChange,
}

/// Display visibility of the variable in consuming UIs. The engine itself
/// only stores this; it never alters resolution behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HideMode {
    /// Show label and value selector.
    #[default]
    Visible,
    /// Hide the label, show the selector.
    HideLabel,
    /// Hide the variable entirely.
    HideVariable,
}

/// A named, resolvable source of one or more selectable values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableDefinition {
    /// Stable identifier.
    pub id: Uuid,

    /// Name referenced by `$name` / `${name}` tokens. Unique per scope.
    pub name: String,

    /// Resolution strategy.
    pub kind: VariableKind,

    /// Raw query/expression text. Meaning depends on `kind`: the query
    /// string for Query, the comma-separated list for Custom/Interval,
    /// the literal for Constant/TextBox, the type filter for
    /// DataSourceList.
    #[serde(default)]
    pub query: String,

    /// Datasource reference for Query variables; may itself contain
    /// variable tokens.
    #[serde(default)]
    pub datasource: Option<String>,

    /// Optional display label.
    #[serde(default)]
    pub label: Option<String>,

    /// Display visibility for consumers.
    #[serde(default)]
    pub hide: HideMode,

    /// Whether multiple options may be selected at once.
    #[serde(default)]
    pub multi: bool,

    /// Whether a synthetic "All" option is injected.
    #[serde(default)]
    pub include_all: bool,

    /// Custom value substituted when "All" is selected.
    #[serde(default)]
    pub all_value: Option<String>,

    /// Optional regex applied to option text before sorting.
    #[serde(default)]
    pub regex_filter: Option<String>,

    /// Option ordering.
    #[serde(default)]
    pub sort: SortMode,

    /// Refresh behavior.
    #[serde(default)]
    pub refresh: RefreshTrigger,

    /// Interval kind: whether to prepend a computed `auto` entry.
    #[serde(default)]
    pub auto: bool,

    /// Interval kind: target step count for the `auto` entry.
    #[serde(default = "default_auto_count")]
    pub auto_count: u32,

    /// Interval kind: lower bound for the `auto` entry, e.g. `"10s"`.
    #[serde(default)]
    pub auto_min: Option<String>,
}

const fn default_auto_count() -> u32 {
    30
}

impl VariableDefinition {
    /// Creates a definition with the given name and kind and default flags.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: VariableKind, query: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            kind,
            query: query.into(),
            datasource: None,
            label: None,
            hide: HideMode::default(),
            multi: false,
            include_all: false,
            all_value: None,
            regex_filter: None,
            sort: SortMode::default(),
            refresh: RefreshTrigger::default(),
            auto: false,
            auto_count: default_auto_count(),
            auto_min: None,
        }
    }

    /// Creates a Constant definition.
    #[must_use]
    pub fn constant(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, VariableKind::Constant, value)
    }

    /// Creates a Custom definition from its comma-separated list.
    #[must_use]
    pub fn custom(name: impl Into<String>, values: impl Into<String>) -> Self {
        Self::new(name, VariableKind::Custom, values)
    }

    /// Creates a Query definition against the given datasource reference.
    #[must_use]
    pub fn query(
        name: impl Into<String>,
        query: impl Into<String>,
        datasource: impl Into<String>,
    ) -> Self {
        let mut def = Self::new(name, VariableKind::Query, query);
        def.datasource = Some(datasource.into());
        def
    }

    /// Creates a DataSourceList definition with an optional type filter.
    #[must_use]
    pub fn datasource_list(name: impl Into<String>, type_filter: impl Into<String>) -> Self {
        Self::new(name, VariableKind::DataSourceList, type_filter)
    }

    /// Creates an Interval definition from its comma-separated durations.
    #[must_use]
    pub fn interval(name: impl Into<String>, values: impl Into<String>) -> Self {
        Self::new(name, VariableKind::Interval, values)
    }

    /// Creates a TextBox definition with a default value.
    #[must_use]
    pub fn text_box(name: impl Into<String>, default: impl Into<String>) -> Self {
        Self::new(name, VariableKind::TextBox, default)
    }

    /// Creates an AdHoc definition for the given datasource reference.
    #[must_use]
    pub fn ad_hoc(name: impl Into<String>, datasource: impl Into<String>) -> Self {
        let mut def = Self::new(name, VariableKind::AdHoc, "");
        def.datasource = Some(datasource.into());
        def
    }

    /// Returns a copy with multi-select enabled.
    #[must_use]
    pub const fn with_multi(mut self) -> Self {
        self.multi = true;
        self
    }

    /// Returns a copy with the "All" option enabled.
    #[must_use]
    pub fn with_include_all(mut self, all_value: Option<String>) -> Self {
        self.include_all = true;
        self.all_value = all_value;
        self
    }

    /// Returns a copy with the given regex filter.
    #[must_use]
    pub fn with_regex_filter(mut self, pattern: impl Into<String>) -> Self {
        self.regex_filter = Some(pattern.into());
        self
    }

    /// Returns a copy with the given sort mode.
    #[must_use]
    pub const fn with_sort(mut self, sort: SortMode) -> Self {
        self.sort = sort;
        self
    }

    /// Returns a copy with the given refresh trigger.
    #[must_use]
    pub const fn with_refresh(mut self, refresh: RefreshTrigger) -> Self {
        self.refresh = refresh;
        self
    }

    /// Returns a copy with the `auto` interval entry enabled.
    #[must_use]
    pub fn with_auto(mut self, count: u32, min: Option<String>) -> Self {
        self.auto = true;
        self.auto_count = count;
        self.auto_min = min;
        self
    }
}

/// Returns true if the name can be expressed by the reference grammar
/// (`$name` tokens only reach across word characters).
#[must_use]
pub fn is_valid_variable_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validates a definition set before any resolution begins.
///
/// # Errors
///
/// Returns an error for an invalid name or a duplicate name within the set.
pub fn validate_definitions(definitions: &[VariableDefinition]) -> DomainResult<()> {
    let mut seen = HashSet::new();
    for def in definitions {
        if !is_valid_variable_name(&def.name) {
            return Err(DomainError::InvalidVariableName(def.name.clone()));
        }
        if !seen.insert(def.name.as_str()) {
            return Err(DomainError::DuplicateVariableName(def.name.clone()));
        }
    }
    Ok(())
}
