mod bootstrap;

use std::time::Instant;

use anyhow::{Context, Result};
use trend_core::settings::Settings;
use trend_data::analysis::{run_analysis, AnalysisOptions};
use trend_data::reader::{load_table, ColumnMapping};
use trend_report::{render_summary, write_all, SummaryOptions};

fn main() -> Result<()> {
    let settings = Settings::load()?;

    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_deref())?;

    tracing::info!("Powertrain Trends v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Input: {}, years {}→{}, target {}",
        settings.input.display(),
        settings.start_year,
        settings.end_year,
        settings.target_year
    );

    let started = Instant::now();

    let mapping = ColumnMapping::from(&settings);
    let table = load_table(&settings.input, &mapping)
        .with_context(|| format!("loading {}", settings.input.display()))?;

    let result = run_analysis(table, &AnalysisOptions::from(&settings));

    let exported_files = if settings.no_export {
        Vec::new()
    } else {
        bootstrap::ensure_output_dir(&settings.output_dir)?;
        write_all(&settings.output_dir, &result).context("exporting results")?
    };

    match settings.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => {
            let options = SummaryOptions {
                exported_files,
                ..Default::default()
            };
            print!("{}", render_summary(&result, &options));
        }
    }

    tracing::info!(
        "Analysis complete in {:.2}s",
        started.elapsed().as_secs_f64()
    );

    Ok(())
}
