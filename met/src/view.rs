//! Pure state machine for the viewer
//!
//! [`View`] holds everything the screen shows and changes only through
//! [`View::next`]. The state machine does no IO and keeps no clock: the caller
//! owns the ticker, the scrape tasks and the terminal, and simply does what
//! the returned [`Operation`] asks.
//!
//! ```text
//! Format: Event --> effect (Operation)
//!
//! Tick            --> mark scrape in flight (Scrape)
//! Tick            --> nothing, a scrape is already in flight (Wait)
//! Scraped(Ok)     --> reconcile, sort on first batch, revalidate selection (Wait)
//! Scraped(Err)    --> keep series, remember the error (Wait)
//! Input(Up/Down)  --> move selection, slide page window (Wait)
//! Input(PageUp/PageDown) --> move page window, snap selection (Wait)
//! Input(Quit)     --> (Quit)
//! ```

use std::num::NonZeroUsize;

use tracing::{debug, warn};

use crate::{
    filter::Filter,
    reconcile::{DeltaPolicy, Reconciled, SeriesTable},
    sample::Batch,
    scrape,
};

/// Navigation input from the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Select the previous row
    Up,
    /// Select the next row
    Down,
    /// Show the previous page
    PageUp,
    /// Show the next page
    PageDown,
    /// Leave the viewer
    Quit,
}

/// Events that can drive the state machine
#[derive(Debug)]
pub enum Event {
    /// The poll interval elapsed
    Tick,
    /// A scrape finished
    Scraped(Result<Batch, scrape::Error>),
    /// The user pressed a key
    Input(Navigation),
}

/// Operations the state machine can request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Start a scrape and deliver its result as [`Event::Scraped`]
    Scrape,
    /// Nothing to start; wait for the next event
    Wait,
    /// Exit the viewer
    Quit,
}

#[derive(Debug)]
/// The viewer state
pub struct View {
    table: SeriesTable,
    filter: Filter,
    policy: DeltaPolicy,
    page_size: NonZeroUsize,
    show_graph: bool,
    selected: usize,
    page_start: usize,
    initialized: bool,
    in_flight: bool,
    error: Option<String>,
    last_pass: Reconciled,
}

impl View {
    /// Create a new, empty view
    #[must_use]
    pub fn new(
        filter: Filter,
        policy: DeltaPolicy,
        page_size: NonZeroUsize,
        show_graph: bool,
    ) -> Self {
        Self {
            table: SeriesTable::new(),
            filter,
            policy,
            page_size,
            show_graph,
            selected: 0,
            page_start: 0,
            initialized: false,
            in_flight: false,
            error: None,
            last_pass: Reconciled::default(),
        }
    }

    /// Process an event and return the next operation
    pub fn next(&mut self, event: Event) -> Operation {
        match event {
            Event::Tick => {
                if self.in_flight {
                    debug!("previous scrape still in flight, skipping tick");
                    Operation::Wait
                } else {
                    self.in_flight = true;
                    Operation::Scrape
                }
            }
            Event::Scraped(Ok(batch)) => {
                self.in_flight = false;
                self.error = None;
                self.apply(&batch);
                Operation::Wait
            }
            Event::Scraped(Err(err)) => {
                self.in_flight = false;
                warn!("scrape failed: {err}");
                self.error = Some(err.to_string());
                Operation::Wait
            }
            Event::Input(Navigation::Up) => {
                self.select(self.selected.saturating_sub(1));
                Operation::Wait
            }
            Event::Input(Navigation::Down) => {
                self.select(self.selected.saturating_add(1));
                Operation::Wait
            }
            Event::Input(Navigation::PageUp) => {
                self.page(false);
                Operation::Wait
            }
            Event::Input(Navigation::PageDown) => {
                self.page(true);
                Operation::Wait
            }
            Event::Input(Navigation::Quit) => Operation::Quit,
        }
    }

    fn apply(&mut self, batch: &Batch) {
        self.last_pass = self
            .table
            .reconcile(batch.samples(), &self.filter, self.policy);
        debug!(
            samples = batch.len(),
            series = self.table.len(),
            created = self.last_pass.created,
            pruned = self.last_pass.pruned,
            resets = self.last_pass.resets,
            "batch reconciled"
        );

        // Stable positions matter more than order for later arrivals, so the
        // table is sorted exactly once.
        if !self.initialized {
            self.table.sort_by_identity();
            self.initialized = true;
        }
        self.select(self.selected);
    }

    /// Move the selection to `index`, clamped to the list, and slide the page
    /// window by the least amount that keeps it visible.
    fn select(&mut self, index: usize) {
        let len = self.table.len();
        self.selected = if len == 0 { 0 } else { index.min(len - 1) };

        let size = self.page_size.get();
        if self.selected < self.page_start {
            self.page_start = self.selected;
        } else if self.selected >= self.page_start + size {
            self.page_start = self.selected + 1 - size;
        }
        self.page_start = self.page_start.min(self.max_page_start());
    }

    /// Move the window a full page and snap the selection into it.
    fn page(&mut self, forward: bool) {
        let size = self.page_size.get();
        self.page_start = if forward {
            self.page_start.saturating_add(size).min(self.max_page_start())
        } else {
            self.page_start.saturating_sub(size)
        };

        let last_visible = (self.page_start + size - 1).min(self.table.len().saturating_sub(1));
        self.selected = self.selected.max(self.page_start).min(last_visible);
    }

    fn max_page_start(&self) -> usize {
        self.table.len().saturating_sub(self.page_size.get())
    }

    /// The series table.
    #[must_use]
    pub fn table(&self) -> &SeriesTable {
        &self.table
    }

    /// Index of the selected series. Zero when the table is empty.
    #[must_use]
    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Index of the first row on the visible page.
    #[must_use]
    pub fn page_start(&self) -> usize {
        self.page_start
    }

    /// Rows per page.
    #[must_use]
    pub fn page_size(&self) -> NonZeroUsize {
        self.page_size
    }

    /// Whether the selected series should be graphed.
    #[must_use]
    pub fn show_graph(&self) -> bool {
        self.show_graph
    }

    /// Whether the first batch has been applied.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether a scrape has been requested and not yet delivered.
    #[must_use]
    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// The error from the latest scrape, cleared by the next success.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Summary of the most recent reconciliation pass.
    #[must_use]
    pub fn last_pass(&self) -> Reconciled {
        self.last_pass
    }
}
