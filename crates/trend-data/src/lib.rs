//! Data layer for powertrain trend analysis.
//!
//! Discovers and reads forecast CSV tables, aggregates production volumes by
//! powertrain type, computes market shares, analyses the EV transition, fans
//! the same pipeline out per region and runs the whole thing end to end.

pub mod aggregator;
pub mod analysis;
pub mod reader;
pub mod regional;
pub mod transition;

pub use trend_core as core;
