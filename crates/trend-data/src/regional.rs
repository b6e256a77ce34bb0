//! Per-region fan-out of the aggregation pipeline, and the EV-share ranking.

use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::{info, warn};

use trend_core::error::{Result, TrendError};
use trend_core::models::{ClassifiedRecord, PowertrainType, RegionalResult, TopRegionEntry};

use crate::aggregator::{aggregate, find_row, with_shares, ALL_TYPES};

/// Default length of the EV-share region ranking.
pub const DEFAULT_TOP_N: usize = 5;

/// Run aggregation and share calculation separately for every region.
///
/// Records with no region (or a blank one) are left out of every bucket.
/// Shares are shares *within* the region: each region's totals come from its
/// own volumes only, never from the global aggregate.
///
/// Regions are processed in parallel and collected into a map keyed by region
/// name, so the result is the same whatever order the workers finish in.
///
/// # Errors
///
/// [`TrendError::EmptyRegionSet`] when no record has a region. `region_field`
/// names the source column in that error.
pub fn try_regional_analysis(
    records: &[ClassifiedRecord],
    years: &[i32],
    region_field: &str,
) -> Result<RegionalResult> {
    let mut partitions: BTreeMap<&str, Vec<&ClassifiedRecord>> = BTreeMap::new();
    for record in records {
        if let Some(region) = record.region() {
            partitions.entry(region).or_default().push(record);
        }
    }

    if partitions.is_empty() {
        return Err(TrendError::EmptyRegionSet(region_field.to_string()));
    }

    let regional: RegionalResult = partitions
        .into_par_iter()
        .map(|(region, members)| {
            let rows = aggregate(members, years, &ALL_TYPES);
            (region.to_string(), with_shares(&rows, years))
        })
        .collect();

    info!("Regional analysis complete: {} regions", regional.len());
    Ok(regional)
}

/// [`try_regional_analysis`], logging an empty region set as a warning and
/// returning an empty map instead of failing.
pub fn regional_analysis(
    records: &[ClassifiedRecord],
    years: &[i32],
    region_field: &str,
) -> RegionalResult {
    try_regional_analysis(records, years, region_field).unwrap_or_else(|e| {
        warn!("{e}; skipping regional analysis");
        RegionalResult::new()
    })
}

/// Rank regions by EV share in `target_year`.
///
/// A region is included only when its EV row has a share for that year;
/// others are skipped rather than ranked as zero. The sort is stable, so
/// regions with equal shares keep their map (alphabetical) order.
pub fn top_regions(
    regional: &RegionalResult,
    target_year: i32,
    top_n: usize,
) -> Vec<TopRegionEntry> {
    let mut entries: Vec<TopRegionEntry> = regional
        .iter()
        .filter_map(|(region, rows)| {
            let ev = find_row(rows, PowertrainType::Ev)?;
            let ev_share = ev.share(target_year)?;
            Some(TopRegionEntry {
                region: region.clone(),
                ev_share,
                ev_volume: ev.volume(target_year).unwrap_or(0.0),
            })
        })
        .collect();

    entries.sort_by(|a, b| b.ev_share.total_cmp(&a.ev_share));
    entries.truncate(top_n);

    info!("Selected top {} regions by {} EV share", entries.len(), target_year);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use trend_core::classifier::classify_all;
    use trend_core::models::{AggregateRow, RawRecord};

    const REGION_FIELD: &str = "S: Region";

    fn ev(region: Option<&str>, year: i32, volume: f64) -> RawRecord {
        let rec = RawRecord::default().with_fuel_type("BEV").with_volume(year, volume);
        match region {
            Some(r) => rec.with_region(r),
            None => rec,
        }
    }

    fn ice(region: Option<&str>, year: i32, volume: f64) -> RawRecord {
        let rec = RawRecord::default().with_fuel_type("Gasoline").with_volume(year, volume);
        match region {
            Some(r) => rec.with_region(r),
            None => rec,
        }
    }

    fn ev_share_row(share: f64, volume: f64) -> Vec<AggregateRow> {
        let mut row = AggregateRow::new(PowertrainType::Ev);
        row.year_volume.insert(2030, volume);
        row.year_share.insert(2030, share);
        vec![row]
    }

    // ── regional_analysis ─────────────────────────────────────────────────

    #[test]
    fn test_regional_shares_use_regional_totals() {
        let records = classify_all(vec![
            ev(Some("Europe"), 2030, 30.0),
            ice(Some("Europe"), 2030, 70.0),
            ev(Some("Asia"), 2030, 10.0),
            ice(Some("Asia"), 2030, 890.0),
        ]);
        let regional = regional_analysis(&records, &[2030], REGION_FIELD);

        assert_eq!(regional.len(), 2);
        let europe_ev = find_row(&regional["Europe"], PowertrainType::Ev).unwrap();
        assert!((europe_ev.share(2030).unwrap() - 30.0).abs() < 1e-9);
        let asia_ev = find_row(&regional["Asia"], PowertrainType::Ev).unwrap();
        assert!((asia_ev.share(2030).unwrap() - 10.0 / 900.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_regionless_records_excluded_from_buckets() {
        let records = classify_all(vec![
            ev(Some("Europe"), 2030, 30.0),
            ev(None, 2030, 500.0),
            ice(Some("  "), 2030, 700.0),
        ]);
        let regional = regional_analysis(&records, &[2030], REGION_FIELD);

        assert_eq!(regional.keys().collect::<Vec<_>>(), vec!["Europe"]);
        let europe_ev = find_row(&regional["Europe"], PowertrainType::Ev).unwrap();
        assert_eq!(europe_ev.volume(2030), Some(30.0));
        assert!(find_row(&regional["Europe"], PowertrainType::Ice).is_none());

        // The global aggregate still counts every record.
        let global = aggregate(&records, &[2030], &ALL_TYPES);
        assert_eq!(find_row(&global, PowertrainType::Ev).unwrap().volume(2030), Some(530.0));
        assert_eq!(find_row(&global, PowertrainType::Ice).unwrap().volume(2030), Some(700.0));
    }

    #[test]
    fn test_region_values_compared_verbatim() {
        let records = classify_all(vec![
            ev(Some("Europe"), 2030, 30.0),
            ev(Some(" Europe"), 2030, 10.0),
        ]);
        let regional = regional_analysis(&records, &[2030], REGION_FIELD);

        assert_eq!(regional.keys().collect::<Vec<_>>(), vec![" Europe", "Europe"]);
        let padded = find_row(&regional[" Europe"], PowertrainType::Ev).unwrap();
        assert_eq!(padded.volume(2030), Some(10.0));
        let plain = find_row(&regional["Europe"], PowertrainType::Ev).unwrap();
        assert_eq!(plain.volume(2030), Some(30.0));
    }

    #[test]
    fn test_empty_region_set_errors() {
        let records = classify_all(vec![ev(None, 2030, 1.0)]);
        let err = try_regional_analysis(&records, &[2030], REGION_FIELD).unwrap_err();
        assert!(matches!(err, TrendError::EmptyRegionSet(ref f) if f == REGION_FIELD));
    }

    #[test]
    fn test_empty_region_set_returns_empty_map() {
        let records = classify_all(vec![ice(None, 2030, 1.0)]);
        assert!(regional_analysis(&records, &[2030], REGION_FIELD).is_empty());
    }

    #[test]
    fn test_regional_analysis_is_deterministic() {
        let records = classify_all(
            (0..200)
                .map(|i| {
                    let region = format!("R{:02}", i % 17);
                    if i % 3 == 0 {
                        ev(Some(region.as_str()), 2030, i as f64)
                    } else {
                        ice(Some(region.as_str()), 2030, (i * 7) as f64)
                    }
                })
                .collect(),
        );
        let first = regional_analysis(&records, &[2030], REGION_FIELD);
        let second = regional_analysis(&records, &[2030], REGION_FIELD);
        assert_eq!(first, second);
        assert_eq!(first.len(), 17);
    }

    // ── top_regions ───────────────────────────────────────────────────────

    #[test]
    fn test_top_regions_ranks_and_excludes() {
        let mut regional = RegionalResult::new();
        regional.insert("A".to_string(), ev_share_row(20.0, 200.0));
        regional.insert("B".to_string(), ev_share_row(35.0, 350.0));
        let mut c = AggregateRow::new(PowertrainType::Ice);
        c.year_volume.insert(2030, 1_000.0);
        c.year_share.insert(2030, 100.0);
        regional.insert("C".to_string(), vec![c]);

        let top = top_regions(&regional, 2030, 2);
        let names: Vec<_> = top.iter().map(|e| e.region.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(top[0].ev_volume, 350.0);
    }

    #[test]
    fn test_top_regions_skips_missing_target_year() {
        let mut regional = RegionalResult::new();
        regional.insert("A".to_string(), ev_share_row(20.0, 200.0));
        let top = top_regions(&regional, 2035, DEFAULT_TOP_N);
        assert!(top.is_empty());
    }

    #[test]
    fn test_top_regions_stable_ties() {
        let mut regional = RegionalResult::new();
        regional.insert("Zeta".to_string(), ev_share_row(10.0, 1.0));
        regional.insert("Alpha".to_string(), ev_share_row(10.0, 2.0));
        regional.insert("Mid".to_string(), ev_share_row(50.0, 3.0));

        let top = top_regions(&regional, 2030, DEFAULT_TOP_N);
        let names: Vec<_> = top.iter().map(|e| e.region.as_str()).collect();
        assert_eq!(names, vec!["Mid", "Alpha", "Zeta"]);
    }

    #[test]
    fn test_top_regions_end_to_end() {
        let records = classify_all(vec![
            ev(Some("A"), 2030, 20.0),
            ice(Some("A"), 2030, 80.0),
            ev(Some("B"), 2030, 35.0),
            ice(Some("B"), 2030, 65.0),
            ice(Some("C"), 2030, 100.0),
        ]);
        let regional = regional_analysis(&records, &[2030], REGION_FIELD);
        let top = top_regions(&regional, 2030, 2);
        let names: Vec<_> = top.iter().map(|e| e.region.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
    }
}
