//! Plain-text console summary of an [`AnalysisResult`].

use std::fmt;
use std::path::PathBuf;

use trend_core::formatting::{format_millions, format_number, format_percent, format_points};
use trend_core::models::PowertrainType;
use trend_data::aggregator::{find_row, total_volume};
use trend_data::analysis::AnalysisResult;

const RULE_WIDTH: usize = 60;

/// What to include in [`render_summary`].
#[derive(Debug, Clone)]
pub struct SummaryOptions {
    /// Decimals for shares and point changes.
    pub decimals: usize,
    /// Files written by the export step, listed at the end.
    pub exported_files: Vec<PathBuf>,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            decimals: 1,
            exported_files: Vec::new(),
        }
    }
}

/// Build the console summary.
///
/// Sections with nothing to show (no regions, no transition) are replaced by
/// a one-line note instead of being dropped, so the layout stays predictable.
pub fn render_summary(result: &AnalysisResult, options: &SummaryOptions) -> String {
    Summary { result, options }.to_string()
}

struct Summary<'a> {
    result: &'a AnalysisResult,
    options: &'a SummaryOptions,
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(RULE_WIDTH);
        writeln!(f, "{rule}")?;
        writeln!(f, "Powertrain Production Trend Summary")?;
        writeln!(f, "{rule}")?;

        self.write_dataset(f)?;
        self.write_distribution(f)?;
        self.write_transition(f)?;
        self.write_ev_share_by_year(f)?;
        self.write_top_regions(f)?;
        self.write_region_transitions(f)?;
        self.write_files(f)
    }
}

impl Summary<'_> {
    fn decimals(&self) -> usize {
        self.options.decimals
    }

    fn write_dataset(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let meta = &self.result.metadata;
        writeln!(f)?;
        writeln!(f, "Records: {}", format_number(meta.records_processed as f64, 0))?;
        if let Some((first, last)) = meta.year_range() {
            writeln!(f, "Years:   {first} ~ {last} ({} years)", meta.years.len())?;
        }
        Ok(())
    }

    fn write_distribution(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let distribution = &self.result.distribution;
        let total = distribution.total();
        writeln!(f)?;
        writeln!(f, "Powertrain distribution (records)")?;
        for powertrain_type in PowertrainType::ALL {
            let count = distribution.get(powertrain_type);
            let pct = if total > 0 {
                count as f64 / total as f64 * 100.0
            } else {
                0.0
            };
            writeln!(
                f,
                "   {:<4} {:>10}  ({})",
                powertrain_type.as_str(),
                format_number(count as f64, 0),
                format_percent(pct, self.decimals())
            )?;
        }
        Ok(())
    }

    fn write_transition(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = self.decimals();
        writeln!(f)?;
        match (&self.result.transition, &self.result.transition_error) {
            (Some(t), _) => {
                writeln!(f, "Pace of transition ({} -> {})", t.start_year, t.end_year)?;
                writeln!(f, "   - Start EV share:      {}", format_percent(t.start_ev_share, d))?;
                writeln!(f, "   - End EV share:        {}", format_percent(t.end_ev_share, d))?;
                writeln!(f, "   - Change:              {}", format_points(t.share_change, d))?;
                writeln!(f, "   - EV volume change:    {}", format_millions(t.volume_change, d))
            }
            (None, Some(err)) => writeln!(f, "Pace of transition: unavailable ({err})"),
            (None, None) => writeln!(f, "Pace of transition: unavailable"),
        }
    }

    fn write_ev_share_by_year(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let aggregates = &self.result.aggregates;
        let Some(ev) = find_row(aggregates, PowertrainType::Ev) else {
            return Ok(());
        };
        if ev.year_share.is_empty() {
            return Ok(());
        }
        let d = self.decimals();
        writeln!(f)?;
        writeln!(f, "Global EV share by year")?;
        for (year, share) in &ev.year_share {
            let total = total_volume(aggregates, *year).unwrap_or(0.0);
            writeln!(
                f,
                "   {year}: {} of {}",
                format_percent(*share, d),
                format_millions(total, d)
            )?;
        }
        Ok(())
    }

    fn write_top_regions(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.result;
        writeln!(f)?;
        writeln!(f, "Top regions by {} EV share", result.metadata.target_year)?;
        if let Some(err) = &result.top_regions_error {
            return writeln!(f, "   unavailable ({err})");
        }
        if result.top_regions.is_empty() {
            return writeln!(f, "   (no regional data)");
        }
        for (i, entry) in result.top_regions.iter().enumerate() {
            writeln!(
                f,
                "   {}. {}: {}",
                i + 1,
                entry.region,
                format_percent(entry.ev_share, self.decimals())
            )?;
        }
        Ok(())
    }

    fn write_region_transitions(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let transitions = &self.result.region_transitions;
        if transitions.is_empty() {
            return Ok(());
        }
        let d = self.decimals();
        writeln!(f)?;
        writeln!(f, "Fastest EV transitions by region")?;
        for (i, t) in transitions.iter().enumerate() {
            writeln!(
                f,
                "   {}. {}: {} -> {} ({})",
                i + 1,
                t.region,
                format_percent(t.start_share, d),
                format_percent(t.end_share, d),
                format_points(t.share_change, d)
            )?;
        }
        Ok(())
    }

    fn write_files(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.options.exported_files.is_empty() {
            return Ok(());
        }
        writeln!(f)?;
        writeln!(f, "Files created:")?;
        for path in &self.options.exported_files {
            writeln!(f, "   - {}", path.display())?;
        }
        Ok(())
    }
}
