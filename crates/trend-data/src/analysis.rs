//! Main analysis pipeline.
//!
//! Takes a [`LoadedTable`] through classification, aggregation, share
//! calculation, transition analysis and the regional fan-out, returning an
//! [`AnalysisResult`] ready for the report layer.

use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use trend_core::classifier::{classification_samples, classify_all, powertrain_distribution};
use trend_core::models::{
    AggregateRow, ClassificationSample, PowertrainDistribution, RegionTransition, RegionalResult,
    TopRegionEntry, TransitionSummary,
};
use trend_core::error::TrendError;
use trend_core::settings::Settings;

use crate::aggregator::{aggregate, with_shares, ALL_TYPES};
use crate::reader::LoadedTable;
use crate::regional::{regional_analysis, top_regions, DEFAULT_TOP_N};
use crate::transition::{analyze_transition, region_transitions, DEFAULT_TRANSITION_TOP_N};

/// Samples kept per powertrain type for the classification check.
pub const DEFAULT_SAMPLES_PER_TYPE: usize = 5;

// ── Public types ──────────────────────────────────────────────────────────────

/// Knobs for [`run_analysis`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisOptions {
    pub start_year: i32,
    pub end_year: i32,
    /// Year used for the top-region ranking.
    pub target_year: i32,
    pub top_n: usize,
    pub transition_top_n: usize,
    /// Source column name, only used in log and error messages.
    pub region_field: String,
    pub samples_per_type: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            start_year: 2023,
            end_year: 2037,
            target_year: 2030,
            top_n: DEFAULT_TOP_N,
            transition_top_n: DEFAULT_TRANSITION_TOP_N,
            region_field: "S: Region".to_string(),
            samples_per_type: DEFAULT_SAMPLES_PER_TYPE,
        }
    }
}

impl From<&Settings> for AnalysisOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            start_year: settings.start_year,
            end_year: settings.end_year,
            target_year: settings.target_year,
            top_n: settings.top_n,
            transition_top_n: settings.transition_top_n,
            region_field: settings.region_field.clone(),
            samples_per_type: DEFAULT_SAMPLES_PER_TYPE,
        }
    }
}

/// Metadata produced alongside the analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    /// RFC 3339 timestamp when this result was generated.
    pub generated_at: String,
    pub source_files: Vec<String>,
    pub records_processed: usize,
    /// Sorted forecast years found in the input.
    pub years: Vec<i32>,
    pub regions_analyzed: usize,
    /// Year the top-region ranking was taken at.
    pub target_year: i32,
    pub rows_skipped: usize,
    pub cells_skipped: usize,
    pub classify_time_seconds: f64,
    pub aggregate_time_seconds: f64,
    pub regional_time_seconds: f64,
}

impl AnalysisMetadata {
    /// First and last forecast year, if any.
    pub fn year_range(&self) -> Option<(i32, i32)> {
        Some((*self.years.first()?, *self.years.last()?))
    }
}

/// The complete output of [`run_analysis`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub metadata: AnalysisMetadata,
    pub distribution: PowertrainDistribution,
    pub samples: Vec<ClassificationSample>,
    /// Global rows with shares, in `EV, HEV, ICE` order.
    pub aggregates: Vec<AggregateRow>,
    pub transition: Option<TransitionSummary>,
    /// Why `transition` is missing, when it is.
    pub transition_error: Option<String>,
    pub regional: RegionalResult,
    pub top_regions: Vec<TopRegionEntry>,
    /// Why `top_regions` could not be ranked, when the target year is not in
    /// the dataset.
    pub top_regions_error: Option<String>,
    pub region_transitions: Vec<RegionTransition>,
}

// ── Public function ───────────────────────────────────────────────────────────

/// Run the full analysis pipeline.
///
/// 1. Classify every record.
/// 2. Count the distribution and pick classification samples.
/// 3. Aggregate volumes by powertrain type and year.
/// 4. Compute shares.
/// 5. Compare EV share between the start and end years.
/// 6. Repeat 3 and 4 per region.
/// 7. Rank regions by EV share in the target year.
/// 8. Rank regions by EV share change.
///
/// A failed transition analysis is recorded in `transition_error`, and a
/// target year missing from the dataset in `top_regions_error`; every other
/// output is still produced.
pub fn run_analysis(table: LoadedTable, options: &AnalysisOptions) -> AnalysisResult {
    let LoadedTable {
        records,
        years,
        files,
        rows_skipped,
        cells_skipped,
    } = table;

    // ── Step 1-2: Classification ─────────────────────────────────────────────
    let classify_start = Instant::now();
    let classified = classify_all(records);
    let distribution = powertrain_distribution(&classified);
    let samples = classification_samples(&classified, options.samples_per_type);
    let classify_time = classify_start.elapsed().as_secs_f64();
    info!("Powertrain distribution: {distribution}");

    // ── Step 3-4: Aggregation and shares ─────────────────────────────────────
    let aggregate_start = Instant::now();
    let rows = aggregate(&classified, &years, &ALL_TYPES);
    let aggregates = with_shares(&rows, &years);
    let aggregate_time = aggregate_start.elapsed().as_secs_f64();
    debug!("Aggregated {} powertrain rows over {} years", aggregates.len(), years.len());

    // ── Step 5: Transition ───────────────────────────────────────────────────
    let (transition, transition_error) =
        match analyze_transition(&aggregates, &years, options.start_year, options.end_year) {
            Ok(summary) => (Some(summary), None),
            Err(e) => {
                warn!("Transition analysis skipped: {e}");
                (None, Some(e.to_string()))
            }
        };

    // ── Step 6-8: Regions ────────────────────────────────────────────────────
    let regional_start = Instant::now();
    let regional = regional_analysis(&classified, &years, &options.region_field);
    let (top, top_regions_error) = if !years.contains(&options.target_year) {
        let e = TrendError::invalid_year(options.target_year, &years);
        warn!("Top region ranking skipped: {e}");
        (Vec::new(), Some(e.to_string()))
    } else {
        (top_regions(&regional, options.target_year, options.top_n), None)
    };
    let transitions = region_transitions(
        &regional,
        options.start_year,
        options.end_year,
        options.transition_top_n,
    );
    let regional_time = regional_start.elapsed().as_secs_f64();

    let metadata = AnalysisMetadata {
        generated_at: Utc::now().to_rfc3339(),
        source_files: files.iter().map(|p| p.display().to_string()).collect(),
        records_processed: classified.len(),
        years,
        regions_analyzed: regional.len(),
        target_year: options.target_year,
        rows_skipped,
        cells_skipped,
        classify_time_seconds: classify_time,
        aggregate_time_seconds: aggregate_time,
        regional_time_seconds: regional_time,
    };

    info!(
        "Analysis complete: {} records, {} regions",
        metadata.records_processed, metadata.regions_analyzed
    );

    AnalysisResult {
        metadata,
        distribution,
        samples,
        aggregates,
        transition,
        transition_error,
        regional,
        top_regions: top,
        top_regions_error,
        region_transitions: transitions,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
