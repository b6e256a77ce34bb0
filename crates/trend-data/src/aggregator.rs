//! Per-powertrain volume aggregation and market-share normalisation.

use std::collections::BTreeMap;

use trend_core::models::{AggregateRow, ClassifiedRecord, PowertrainType};

/// The default category set: every [`PowertrainType`] in canonical order.
pub const ALL_TYPES: [PowertrainType; 3] = PowertrainType::ALL;

// ── CompensatedSum ────────────────────────────────────────────────────────────

/// Neumaier compensated summation, so long columns of large volumes do not
/// drift with the order rows arrive in.
#[derive(Debug, Clone, Copy, Default)]
struct CompensatedSum {
    sum: f64,
    compensation: f64,
}

impl CompensatedSum {
    fn add(&mut self, value: f64) {
        let t = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - t) + value;
        } else {
            self.compensation += (value - t) + self.sum;
        }
        self.sum = t;
    }

    fn value(&self) -> f64 {
        self.sum + self.compensation
    }
}

// ── Aggregation ───────────────────────────────────────────────────────────────

/// Sum each requested year's volume per powertrain type.
///
/// * A record lacking a year contributes nothing to it; it is never read as 0.
/// * A year no matching record has is absent from that row's `year_volume`.
/// * A type with no matching record is left out of the output entirely.
///
/// Rows come back in canonical order (`EV, HEV, ICE`), filtered to the types
/// present. Volumes are summed as-is; negative inputs are not clipped.
pub fn aggregate<'a, I>(records: I, years: &[i32], types: &[PowertrainType]) -> Vec<AggregateRow>
where
    I: IntoIterator<Item = &'a ClassifiedRecord>,
{
    // BTreeMap keyed by type gives canonical order for free.
    let mut sums: BTreeMap<PowertrainType, BTreeMap<i32, CompensatedSum>> = BTreeMap::new();

    for record in records {
        let powertrain_type = record.powertrain_type();
        if !types.contains(&powertrain_type) {
            continue;
        }
        let per_year = sums.entry(powertrain_type).or_default();
        for &year in years {
            if let Some(volume) = record.volume(year) {
                per_year.entry(year).or_default().add(volume);
            }
        }
    }

    sums.into_iter()
        .map(|(powertrain_type, per_year)| {
            let mut row = AggregateRow::new(powertrain_type);
            row.year_volume = per_year
                .into_iter()
                .map(|(year, sum)| (year, sum.value()))
                .collect();
            row
        })
        .collect()
}

/// Compute each row's percentage share of the per-year total.
///
/// For every requested year the total is summed over the rows that have that
/// year. A row with the year gets `volume / total * 100`, or `0` when the
/// total is not positive; a row without it gets no share for that year.
///
/// Existing shares are discarded and recomputed from volumes, so running this
/// twice gives the same result. The total is summed in type order with
/// compensation, so it does not depend on the order of `rows`.
pub fn with_shares(rows: &[AggregateRow], years: &[i32]) -> Vec<AggregateRow> {
    let mut shared: Vec<AggregateRow> = rows
        .iter()
        .cloned()
        .map(|mut row| {
            row.year_share.clear();
            row
        })
        .collect();

    for &year in years {
        let mut contributions: Vec<(PowertrainType, f64)> = shared
            .iter()
            .filter_map(|row| row.volume(year).map(|v| (row.powertrain_type, v)))
            .collect();
        if contributions.is_empty() {
            continue;
        }
        contributions.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));

        let mut total = CompensatedSum::default();
        for (_, volume) in &contributions {
            total.add(*volume);
        }
        let total = total.value();

        for row in shared.iter_mut() {
            if let Some(volume) = row.volume(year) {
                let share = if total > 0.0 {
                    volume / total * 100.0
                } else {
                    0.0
                };
                row.year_share.insert(year, share);
            }
        }
    }

    shared
}

/// Total volume across all rows for `year`, or `None` when no row has it.
pub fn total_volume(rows: &[AggregateRow], year: i32) -> Option<f64> {
    let mut total = CompensatedSum::default();
    let mut seen = false;
    for row in rows {
        if let Some(volume) = row.volume(year) {
            total.add(volume);
            seen = true;
        }
    }
    seen.then(|| total.value())
}

/// The row for `powertrain_type`, if that type is present.
pub fn find_row(rows: &[AggregateRow], powertrain_type: PowertrainType) -> Option<&AggregateRow> {
    rows.iter().find(|r| r.powertrain_type == powertrain_type)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
