//! JSON and CSV persistence for analysis results.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use trend_core::error::Result;
use trend_core::models::{AggregateRow, RegionalResult, TopRegionEntry};
use trend_data::analysis::AnalysisResult;

pub const ANALYSIS_JSON: &str = "analysis.json";
pub const MARKET_SHARE_CSV: &str = "market_share.csv";
pub const REGIONAL_MARKET_SHARE_CSV: &str = "regional_market_share.csv";
pub const TOP_REGIONS_CSV: &str = "top_regions.csv";

/// Long-format row of the market share tables.
#[derive(Debug, Serialize)]
struct ShareRow<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<&'a str>,
    powertrain_type: &'static str,
    year: i32,
    volume: f64,
    /// Empty when the share was never computed for this year.
    share: Option<f64>,
}

#[derive(Debug, Serialize)]
struct TopRegionRow<'a> {
    rank: usize,
    region: &'a str,
    ev_share: f64,
    ev_volume: f64,
}

/// Write the full result as pretty-printed JSON.
pub fn export_json(path: &Path, result: &AnalysisResult) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, result)?;
    debug!(path = %path.display(), "Wrote analysis JSON");
    Ok(())
}

/// Write one CSV row per powertrain type and year:
/// `powertrain_type,year,volume,share`.
///
/// Years the row has no volume for are skipped.
pub fn export_share_table(path: &Path, rows: &[AggregateRow], years: &[i32]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in share_rows(None, rows, years) {
        writer.serialize(row)?;
    }
    writer.flush()?;
    debug!(path = %path.display(), "Wrote market share table");
    Ok(())
}

/// Same layout as [`export_share_table`] with a leading `region` column,
/// regions in alphabetical order.
pub fn export_regional_share_table(
    path: &Path,
    regional: &RegionalResult,
    years: &[i32],
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for (region, rows) in regional {
        for row in share_rows(Some(region.as_str()), rows, years) {
            writer.serialize(row)?;
        }
    }
    writer.flush()?;
    debug!(path = %path.display(), regions = regional.len(), "Wrote regional market share table");
    Ok(())
}

/// Write the EV-share region ranking, rank starting at 1.
pub fn export_top_regions(path: &Path, entries: &[TopRegionEntry]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for (i, entry) in entries.iter().enumerate() {
        writer.serialize(TopRegionRow {
            rank: i + 1,
            region: &entry.region,
            ev_share: entry.ev_share,
            ev_volume: entry.ev_volume,
        })?;
    }
    writer.flush()?;
    debug!(path = %path.display(), "Wrote top regions");
    Ok(())
}

/// Create `output_dir` if needed and write every export into it.
///
/// Returns the written paths in the order they were created. The regional
/// files are skipped when there is no regional data.
pub fn write_all(output_dir: &Path, result: &AnalysisResult) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir)?;
    let years = &result.metadata.years;
    let mut written = Vec::new();

    let path = output_dir.join(ANALYSIS_JSON);
    export_json(&path, result)?;
    written.push(path);

    let path = output_dir.join(MARKET_SHARE_CSV);
    export_share_table(&path, &result.aggregates, years)?;
    written.push(path);

    if !result.regional.is_empty() {
        let path = output_dir.join(REGIONAL_MARKET_SHARE_CSV);
        export_regional_share_table(&path, &result.regional, years)?;
        written.push(path);

        let path = output_dir.join(TOP_REGIONS_CSV);
        export_top_regions(&path, &result.top_regions)?;
        written.push(path);
    }

    info!("Exported {} files to {}", written.len(), output_dir.display());
    Ok(written)
}

fn share_rows<'a>(
    region: Option<&'a str>,
    rows: &'a [AggregateRow],
    years: &'a [i32],
) -> impl Iterator<Item = ShareRow<'a>> + 'a {
    rows.iter().flat_map(move |row| {
        years.iter().filter_map(move |&year| {
            Some(ShareRow {
                region,
                powertrain_type: row.powertrain_type.as_str(),
                year,
                volume: row.volume(year)?,
                share: row.share(year),
            })
        })
    })
}
