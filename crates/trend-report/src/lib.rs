//! Reporting layer: console summary and JSON/CSV exports.

pub mod export;
pub mod summary;

pub use export::write_all;
pub use summary::{render_summary, SummaryOptions};
