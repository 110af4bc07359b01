//! Pipeline stages for the perp position monitor.
//!
//! This crate provides:
//! - `normalizer`: per-exchange raw records into the common position model
//! - `metrics`: derived risk fields (margin, PnL%, distances, risk flags)
//! - `rules`: the fixed alert rule table
//! - `cycle`: the fetch -> normalize -> enrich -> alert -> snapshot loop

pub mod cycle;
pub mod metrics;
pub mod normalizer;
pub mod rules;

pub use cycle::{CycleReport, Monitor};
