//! EV transition analysis between two reference years.
//!
//! Read-only over rows that already carry shares; nothing here aggregates.

use tracing::info;

use trend_core::error::{Result, TrendError};
use trend_core::models::{
    AggregateRow, PowertrainType, RegionTransition, RegionalResult, TransitionSummary,
};

use crate::aggregator::find_row;

/// Default length of the regional transition ranking.
pub const DEFAULT_TRANSITION_TOP_N: usize = 10;

/// Compare EV share and volume between `start_year` and `end_year`.
///
/// # Errors
///
/// * [`TrendError::InvalidYear`] when either year is not in `years`.
/// * [`TrendError::MissingCategory`] when `rows` has no EV row.
///
/// A year that is in the dataset but has no EV contribution reads as `0.0`
/// share and volume.
pub fn analyze_transition(
    rows: &[AggregateRow],
    years: &[i32],
    start_year: i32,
    end_year: i32,
) -> Result<TransitionSummary> {
    for year in [start_year, end_year] {
        if !years.contains(&year) {
            return Err(TrendError::invalid_year(year, years));
        }
    }

    let ev = find_row(rows, PowertrainType::Ev)
        .ok_or(TrendError::MissingCategory(PowertrainType::Ev))?;

    let endpoint = |year: i32| {
        (
            year,
            ev.share(year).unwrap_or(0.0),
            ev.volume(year).unwrap_or(0.0),
        )
    };
    let summary = TransitionSummary::new(endpoint(start_year), endpoint(end_year));

    info!(
        "Transition analysis complete: {}→{}, EV share change {:.2}%p",
        start_year, end_year, summary.share_change
    );
    Ok(summary)
}

/// Rank regions by how far their EV share moved between the two years.
///
/// Only regions with an EV row are included; a missing year reads as `0.0`.
/// Sorted by `share_change` descending (stable, so ties keep region order)
/// and truncated to `top_n`.
pub fn region_transitions(
    regional: &RegionalResult,
    start_year: i32,
    end_year: i32,
    top_n: usize,
) -> Vec<RegionTransition> {
    let mut transitions: Vec<RegionTransition> = regional
        .iter()
        .filter_map(|(region, rows)| {
            let ev = find_row(rows, PowertrainType::Ev)?;
            let start_share = ev.share(start_year).unwrap_or(0.0);
            let end_share = ev.share(end_year).unwrap_or(0.0);
            Some(RegionTransition {
                region: region.clone(),
                start_share,
                end_share,
                share_change: end_share - start_share,
            })
        })
        .collect();

    transitions.sort_by(|a, b| b.share_change.total_cmp(&a.share_change));
    transitions.truncate(top_n);
    transitions
}
