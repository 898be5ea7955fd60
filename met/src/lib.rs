//! The met interactive Prometheus metrics viewer.
//!
//! This library supports the met binary found elsewhere in this project. A
//! single endpoint is polled on a fixed interval and every scrape is
//! reconciled against what was seen before: counters accumulate increments
//! across resets, series that vanish are dropped, and each series keeps a
//! short history for graphing. The state machine in [`view`] owns all of
//! that state and can be driven without a terminal; [`app`] wires it to the
//! ticker, the scraper and the screen.

#![deny(clippy::all)]
#![deny(clippy::cargo)]
#![deny(clippy::pedantic)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
#![deny(clippy::dbg_macro)]
#![deny(unused_extern_crates)]
#![deny(unused_allocation)]
#![deny(unused_assignments)]
#![deny(unused_comparisons)]
#![deny(unreachable_pub)]
#![deny(missing_docs)]
#![deny(missing_copy_implementations)]
#![deny(missing_debug_implementations)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::multiple_crate_versions)]

pub mod app;
pub mod config;
pub mod filter;
pub mod project;
pub mod reconcile;
pub mod render;
pub mod sample;
pub mod scrape;
pub mod series;
pub mod view;
