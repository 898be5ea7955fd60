//! Series identity.
//!
//! A series is one metric family instance at one label combination. Its
//! identity is the family name plus the label pairs sorted by label name, so
//! the order an endpoint happens to print labels in never matters.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// Canonical identity of a series
///
/// Equality and hashing are structural over the name and the sorted pairs;
/// separator characters inside label values cannot make two distinct series
/// collide.
pub struct SeriesKey {
    name: String,
    labels: Vec<(String, String)>,
}

impl SeriesKey {
    /// Derive the key for `name` at `labels`, in any label order.
    #[must_use]
    pub fn derive(name: &str, labels: &[(String, String)]) -> Self {
        let mut labels = labels.to_vec();
        // Ties on label name fall back to the value so that a repeated label
        // still sorts deterministically.
        labels.sort_unstable();
        Self {
            name: name.to_string(),
            labels,
        }
    }

    /// The metric name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human readable labels, `a="1" b="2"`. Empty when there are no labels.
    #[must_use]
    pub fn label_string(&self) -> String {
        self.render_labels(" ")
    }

    fn render_labels(&self, separator: &str) -> String {
        self.labels
            .iter()
            .map(|(name, value)| format!("{name}=\"{value}\""))
            .collect::<Vec<_>>()
            .join(separator)
    }
}

impl fmt::Display for SeriesKey {
    /// `name{a="1",b="2"}`, or the bare name when there are no labels.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.labels.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}{{{}}}", self.name, self.render_labels(","))
        }
    }
}
