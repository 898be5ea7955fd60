//! Reconciliation of scraped samples into per-series state
//!
//! This module turns an unordered batch of raw samples into a stable,
//! deduplicated table of series. The interesting part is counter handling.
//! An endpoint reports counters as absolute values since its own process
//! start, which tells a viewer nothing about recent activity and goes
//! backwards whenever the target restarts. Each counter series therefore
//! keeps a running total of the increments this viewer has observed:
//!
//! ```text
//! raw:          10   15    4    9
//! diff:          -   +5   -11  +5
//! applied:       0   +5   +4   +5    (a decrease is a reset: the new raw
//! accumulated:   0    5    9   14     value is the increment since it)
//! ```
//!
//! The first observation of a counter is a baseline and never a visible
//! jump. Every other kind passes its latest value straight through.
//!
//! Each pass ends by collecting stale series: anything not seen in the batch,
//! because the endpoint stopped exporting it or the filter no longer admits
//! it, is removed.
//!
//! ## Memory
//!
//! Every series keeps at most [`HISTORY_CAPACITY`] displayed values. The table
//! holds exactly the series present in the latest batch.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Deserialize;
use tracing::{debug, trace};

use crate::{filter::Filter, sample::RawSample, series::SeriesKey};

/// How many displayed values each series remembers for graphing.
pub const HISTORY_CAPACITY: usize = 30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
/// What a counter shows as its last delta when a scrape brings no change
pub enum DeltaPolicy {
    /// The last delta drops to zero
    #[default]
    Reset,
    /// The last non-zero delta stays visible until the next change
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Kind specific state of a series, fixed at creation
enum Reading {
    /// A counter folded into a restart tolerant running total
    Counter {
        /// Last raw value seen
        prev_raw: f64,
        /// Sum of observed increments, never decreases
        accumulated: f64,
        /// Increment applied by the most recent update
        last_delta: f64,
    },
    /// Latest value passthrough, used by every non-counter kind
    Gauge {
        /// Latest raw value
        current: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
/// Everything remembered about one series
pub struct SeriesState {
    key: SeriesKey,
    label_string: String,
    reading: Reading,
    last_scraped_raw: f64,
    history: VecDeque<f64>,
}

impl SeriesState {
    /// Seed a series from its first observation. No history is recorded
    /// until [`SeriesState::observe`] is called.
    #[must_use]
    pub fn new(key: SeriesKey, is_counter: bool, raw: f64) -> Self {
        let reading = if is_counter {
            Reading::Counter {
                prev_raw: raw,
                accumulated: 0.0,
                last_delta: 0.0,
            }
        } else {
            Reading::Gauge { current: raw }
        };
        let label_string = key.label_string();
        Self {
            key,
            label_string,
            reading,
            last_scraped_raw: raw,
            history: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    /// Fold a raw observation into this series, returning whether a counter
    /// reset was detected.
    pub fn observe(&mut self, raw: f64, policy: DeltaPolicy) -> bool {
        let mut reset = false;
        match &mut self.reading {
            Reading::Counter {
                prev_raw,
                accumulated,
                last_delta,
            } => {
                let diff = raw - *prev_raw;
                if diff > 0.0 {
                    *accumulated += diff;
                    *last_delta = diff;
                } else if diff < 0.0 {
                    // The target restarted or wrapped; everything it reports
                    // now accrued since then. A negative raw contributes
                    // nothing so the total never goes down.
                    let applied = raw.max(0.0);
                    *accumulated += applied;
                    *last_delta = applied;
                    reset = true;
                } else if policy == DeltaPolicy::Reset {
                    *last_delta = 0.0;
                }
                *prev_raw = raw;
            }
            Reading::Gauge { current } => *current = raw,
        }
        self.last_scraped_raw = raw;

        let displayed = self.displayed_value();
        if self.history.len() == HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(displayed);
        reset
    }

    /// The series identity.
    #[must_use]
    pub fn key(&self) -> &SeriesKey {
        &self.key
    }

    /// The metric name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.key.name()
    }

    /// Human readable labels, see [`SeriesKey::label_string`].
    #[must_use]
    pub fn label_string(&self) -> &str {
        &self.label_string
    }

    #[cfg(test)]
    fn is_counter(&self) -> bool {
        matches!(self.reading, Reading::Counter { .. })
    }

    /// The most recent raw value, whatever the kind.
    #[must_use]
    pub fn last_scraped_raw(&self) -> f64 {
        self.last_scraped_raw
    }

    /// Running total for counters, current value for everything else. This
    /// is what history records.
    #[must_use]
    pub fn displayed_value(&self) -> f64 {
        match self.reading {
            Reading::Counter { accumulated, .. } => accumulated,
            Reading::Gauge { current } => current,
        }
    }

    /// Increment applied by the latest update, `None` for non-counters.
    #[must_use]
    pub fn last_delta(&self) -> Option<f64> {
        match self.reading {
            Reading::Counter { last_delta, .. } => Some(last_delta),
            Reading::Gauge { .. } => None,
        }
    }

    /// Running total, `None` for non-counters.
    #[must_use]
    pub fn accumulated(&self) -> Option<f64> {
        match self.reading {
            Reading::Counter { accumulated, .. } => Some(accumulated),
            Reading::Gauge { .. } => None,
        }
    }

    /// Displayed values, oldest first.
    #[must_use]
    pub fn history(&self) -> &VecDeque<f64> {
        &self.history
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// What a single reconciliation pass did
pub struct Reconciled {
    /// Series seen for the first time
    pub created: usize,
    /// Existing series updated
    pub updated: usize,
    /// Counter resets detected
    pub resets: usize,
    /// Series removed as stale
    pub pruned: usize,
}

#[derive(Debug, Clone, Default)]
/// Ordered series list plus a key to position lookup
///
/// The list and the lookup always agree: every key in one is in the other at
/// the same position, and no key appears twice.
pub struct SeriesTable {
    series: Vec<SeriesState>,
    index: FxHashMap<SeriesKey, usize>,
}

impl SeriesTable {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one batch of samples.
    ///
    /// Samples failing `filter` are skipped. New keys are appended in arrival
    /// order. After the batch every series that was not touched is removed.
    pub fn reconcile<'a, I>(&mut self, samples: I, filter: &Filter, policy: DeltaPolicy) -> Reconciled
    where
        I: IntoIterator<Item = &'a RawSample>,
    {
        let mut summary = Reconciled::default();
        let mut seen: FxHashSet<SeriesKey> = FxHashSet::default();

        for sample in samples {
            if !filter.passes(&sample.name, &sample.labels) {
                trace!(metric = %sample.name, "filtered out");
                continue;
            }

            let key = SeriesKey::derive(&sample.name, &sample.labels);
            let idx = if let Some(&idx) = self.index.get(&key) {
                summary.updated += 1;
                idx
            } else {
                let idx = self.series.len();
                self.series.push(SeriesState::new(
                    key.clone(),
                    sample.is_counter(),
                    sample.value,
                ));
                self.index.insert(key.clone(), idx);
                summary.created += 1;
                idx
            };

            if self.series[idx].observe(sample.value, policy) {
                debug!(series = %key, raw = sample.value, "counter reset detected");
                summary.resets += 1;
            }
            seen.insert(key);
        }

        summary.pruned = self.collect_stale(&seen);
        summary
    }

    /// Drop every series whose key is not in `seen`, preserving the relative
    /// order of survivors. Returns how many were dropped.
    fn collect_stale(&mut self, seen: &FxHashSet<SeriesKey>) -> usize {
        let before = self.series.len();
        let series = std::mem::take(&mut self.series);
        self.series = series
            .into_iter()
            .filter(|state| seen.contains(&state.key))
            .collect();
        self.rebuild_index();
        before - self.series.len()
    }

    /// Sort by name, then by label string.
    pub fn sort_by_identity(&mut self) {
        self.series.sort_by(|a, b| {
            a.name()
                .cmp(b.name())
                .then_with(|| a.label_string.cmp(&b.label_string))
        });
        self.rebuild_index();
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .series
            .iter()
            .enumerate()
            .map(|(idx, state)| (state.key.clone(), idx))
            .collect();
    }

    /// Number of series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Whether the table holds no series.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Series at `idx`, if any.
    #[must_use]
    pub fn get(&self, idx: usize) -> Option<&SeriesState> {
        self.series.get(idx)
    }

    #[cfg(test)]
    fn position(&self, key: &SeriesKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// All series in display order.
    #[must_use]
    pub fn as_slice(&self) -> &[SeriesState] {
        &self.series
    }

    #[cfg(test)]
    fn is_consistent(&self) -> bool {
        self.series.len() == self.index.len()
            && self
                .series
                .iter()
                .enumerate()
                .all(|(idx, state)| self.index.get(&state.key) == Some(&idx))
    }
}
