//! Projection of the view into display rows.
//!
//! Everything here is a read of [`View`]; the renderer only formats what it
//! is handed.

use crate::{reconcile::SeriesState, series::SeriesKey, view::View};

#[derive(Debug, Clone, Copy, PartialEq)]
/// Increment since the previous scrape
pub enum Delta {
    /// Counter went up by this much
    Increase(f64),
    /// Counter did not move
    Unchanged,
    /// Not a counter
    NotApplicable,
}

impl Delta {
    fn of(state: &SeriesState) -> Self {
        match state.last_delta() {
            None => Delta::NotApplicable,
            Some(delta) if delta > 0.0 => Delta::Increase(delta),
            Some(_) => Delta::Unchanged,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// One visible table row
pub struct Row<'a> {
    /// Whether the cursor is on this row
    pub selected: bool,
    /// Series identity
    pub key: &'a SeriesKey,
    /// Last raw value scraped
    pub value: f64,
    /// Increment since the previous scrape
    pub delta: Delta,
    /// Running total for counters
    pub total: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
/// History of the selected series, for plotting
pub struct Graph {
    /// `name{labels}` of the selected series
    pub title: String,
    /// Displayed values, oldest first
    pub history: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Which rows are on screen, one-based and inclusive
pub struct Pagination {
    /// First visible row number, zero when there are no rows
    pub first: usize,
    /// Last visible row number, zero when there are no rows
    pub last: usize,
    /// Total number of series
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq)]
/// Everything the renderer draws
pub struct Projection<'a> {
    /// Rows of the visible page
    pub rows: Vec<Row<'a>>,
    /// Graph for the selected series, when enabled
    pub graph: Option<Graph>,
    /// Page position summary
    pub pagination: Pagination,
    /// Error from the latest scrape
    pub error: Option<&'a str>,
}

impl<'a> Projection<'a> {
    /// Project `view`.
    #[must_use]
    pub fn of(view: &'a View) -> Self {
        let all = view.table().as_slice();
        let start = view.page_start().min(all.len());
        let end = (start + view.page_size().get()).min(all.len());

        let rows = all[start..end]
            .iter()
            .enumerate()
            .map(|(offset, state)| Row {
                selected: start + offset == view.selected(),
                key: state.key(),
                value: state.last_scraped_raw(),
                delta: Delta::of(state),
                total: state.accumulated(),
            })
            .collect();

        let graph = if view.show_graph() {
            view.table().get(view.selected()).map(|state| Graph {
                title: format!("{}{{{}}}", state.name(), state.label_string()),
                history: state.history().iter().copied().collect(),
            })
        } else {
            None
        };

        let pagination = if start == end {
            Pagination {
                first: 0,
                last: 0,
                total: all.len(),
            }
        } else {
            Pagination {
                first: start + 1,
                last: end,
                total: all.len(),
            }
        };

        Self {
            rows,
            graph,
            pagination,
            error: view.error(),
        }
    }
}
