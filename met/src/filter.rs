//! Sample filtering by metric name and label equality.
//!
//! Name filtering is substring based: a name passes when it contains any of
//! the include substrings (if there are any) and none of the exclude
//! substrings. Exclusion always wins. Label filtering is exact: every
//! configured `name=value` pair must be present on the sample.

use std::{fmt, str::FromStr};

/// Errors produced when parsing a [`LabelFilter`]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No `=` separating label name and value
    #[error("Bad label filter {0:?}, want name=value")]
    Malformed(String),
    /// Nothing before the `=`
    #[error("Label filter {0:?} has an empty label name")]
    EmptyName(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Require a label with exactly this name and value
pub struct LabelFilter {
    name: String,
    value: String,
}

impl LabelFilter {
    /// Create a new [`LabelFilter`]
    #[must_use]
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    fn matches(&self, labels: &[(String, String)]) -> bool {
        labels
            .iter()
            .any(|(name, value)| *name == self.name && *value == self.value)
    }
}

impl FromStr for LabelFilter {
    type Err = Error;

    /// Split on the first `=`. The value may be empty and may itself
    /// contain `=`.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (name, value) = input
            .split_once('=')
            .ok_or_else(|| Error::Malformed(input.to_string()))?;
        if name.is_empty() {
            return Err(Error::EmptyName(input.to_string()));
        }
        Ok(Self::new(name, value))
    }
}

impl fmt::Display for LabelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// The active filter configuration
pub struct Filter {
    includes: Vec<String>,
    excludes: Vec<String>,
    labels: Vec<LabelFilter>,
}

impl Filter {
    /// Create a new [`Filter`]. Empty lists impose no constraint.
    #[must_use]
    pub fn new(includes: Vec<String>, excludes: Vec<String>, labels: Vec<LabelFilter>) -> Self {
        Self {
            includes,
            excludes,
            labels,
        }
    }

    /// Whether a sample with this name and label set should be shown.
    #[must_use]
    pub fn passes(&self, name: &str, labels: &[(String, String)]) -> bool {
        self.passes_name(name) && self.passes_labels(labels)
    }

    fn passes_name(&self, name: &str) -> bool {
        if !self.includes.is_empty() && !self.includes.iter().any(|inc| name.contains(inc.as_str()))
        {
            return false;
        }
        !self.excludes.iter().any(|exc| name.contains(exc.as_str()))
    }

    fn passes_labels(&self, labels: &[(String, String)]) -> bool {
        self.labels.iter().all(|filter| filter.matches(labels))
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.includes.is_empty() && self.excludes.is_empty() && self.labels.is_empty()
    }
}
