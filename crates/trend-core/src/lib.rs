//! Core types for the powertrain trend analysis.
//!
//! Holds the record model, the rule-based powertrain classifier, the error
//! type shared by every crate, CLI settings, and number formatting helpers.

pub mod classifier;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;

pub use error::{Result, TrendError};
