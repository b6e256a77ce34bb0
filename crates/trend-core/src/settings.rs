use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, TrendError};

/// Default header pattern for forecast-year columns, e.g. `"CY 2023"` or `"2023"`.
pub const DEFAULT_YEAR_PATTERN: &str = r"(?:^|\D)(\d{4})(?:\D|$)";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Powertrain production trend analysis for light-vehicle forecasts
#[derive(Parser, Debug, Clone)]
#[command(
    name = "powertrain-trends",
    about = "Powertrain production trend analysis for light-vehicle forecasts",
    version
)]
pub struct Settings {
    /// CSV file, or directory of CSV files, holding the forecast table
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Column holding the region of each row
    #[arg(long, default_value = "S: Region")]
    pub region_field: String,

    /// Column holding the fuel type of each row
    #[arg(long, default_value = "S: Fuel Type")]
    pub fuel_type_field: String,

    /// Column holding the powertrain main category of each row
    #[arg(long, default_value = "S: Powertrain Main Category")]
    pub category_field: String,

    /// Regex locating year columns; the first capture group is the year
    #[arg(long, default_value = DEFAULT_YEAR_PATTERN)]
    pub year_pattern: String,

    /// First year of the transition analysis
    #[arg(long, default_value = "2023")]
    pub start_year: i32,

    /// Last year of the transition analysis
    #[arg(long, default_value = "2037")]
    pub end_year: i32,

    /// Year used to rank regions by EV share
    #[arg(long, default_value = "2030")]
    pub target_year: i32,

    /// Number of regions in the EV share ranking
    #[arg(long, default_value = "5")]
    pub top_n: usize,

    /// Number of regions in the transition speed ranking
    #[arg(long, default_value = "10")]
    pub transition_top_n: usize,

    /// Directory for exported JSON and CSV reports
    #[arg(long, default_value = "outputs")]
    pub output_dir: PathBuf,

    /// Console output format
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Skip writing report files
    #[arg(long)]
    pub no_export: bool,

    /// JSON file with analysis defaults; explicit flags take precedence
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Logging level
    #[arg(
        long,
        env = "POWERTRAIN_TRENDS_LOG_LEVEL",
        default_value = "INFO",
        value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"]
    )]
    pub log_level: String,

    /// Log file path (in addition to stderr)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

// ── AnalysisConfig ─────────────────────────────────────────────────────────────

/// Analysis defaults read from a JSON config file.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct AnalysisConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_type_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_n: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition_top_n: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

impl AnalysisConfig {
    /// Read a config file. Unlike CLI flags, a config the user named must parse.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| TrendError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse the process arguments, merge the optional config file, and validate.
    pub fn load() -> Result<Self> {
        Self::load_from_args(std::env::args_os().collect())
    }

    /// Same as [`Settings::load`] but with an explicit argument list, so tests
    /// need not spawn a process.
    pub fn load_from_args(args: Vec<std::ffi::OsString>) -> Result<Self> {
        // Raw matches tell us which values came from the command line.
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if let Some(path) = settings.config.clone() {
            let config = AnalysisConfig::load_from(&path)?;
            settings.merge_config(config, &matches);
        }

        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Fill every field not set explicitly on the command line from `config`.
    fn merge_config(&mut self, config: AnalysisConfig, matches: &clap::ArgMatches) {
        // clap keys args by field name (underscores), not the long flag.
        macro_rules! merge {
            ($field:ident) => {
                if !is_arg_explicitly_set(matches, stringify!($field)) {
                    if let Some(v) = config.$field {
                        self.$field = v;
                    }
                }
            };
        }
        merge!(region_field);
        merge!(fuel_type_field);
        merge!(category_field);
        merge!(year_pattern);
        merge!(start_year);
        merge!(end_year);
        merge!(target_year);
        merge!(top_n);
        merge!(transition_top_n);
        merge!(output_dir);
    }

    /// Reject combinations the analysis cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(TrendError::Config("top_n must be at least 1".to_string()));
        }
        if self.transition_top_n == 0 {
            return Err(TrendError::Config(
                "transition_top_n must be at least 1".to_string(),
            ));
        }
        if self.start_year > self.end_year {
            return Err(TrendError::Config(format!(
                "start_year {} is after end_year {}",
                self.start_year, self.end_year
            )));
        }
        Ok(())
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(list: &[&str]) -> Vec<std::ffi::OsString> {
        list.iter().map(|s| s.into()).collect()
    }

    // ── defaults ──────────────────────────────────────────────────────────

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::parse_from(["powertrain-trends", "data.csv"]);

        assert_eq!(settings.input, PathBuf::from("data.csv"));
        assert_eq!(settings.region_field, "S: Region");
        assert_eq!(settings.fuel_type_field, "S: Fuel Type");
        assert_eq!(settings.category_field, "S: Powertrain Main Category");
        assert_eq!(settings.year_pattern, DEFAULT_YEAR_PATTERN);
        assert_eq!(settings.start_year, 2023);
        assert_eq!(settings.end_year, 2037);
        assert_eq!(settings.target_year, 2030);
        assert_eq!(settings.top_n, 5);
        assert_eq!(settings.transition_top_n, 10);
        assert_eq!(settings.output_dir, PathBuf::from("outputs"));
        assert_eq!(settings.format, "text");
        assert!(!settings.no_export);
        assert!(settings.config.is_none());
        assert!(settings.log_file.is_none());
        assert!(!settings.debug);
    }

    #[test]
    fn test_settings_cli_years() {
        let settings = Settings::parse_from([
            "powertrain-trends",
            "data.csv",
            "--start-year",
            "2025",
            "--end-year",
            "2035",
            "--target-year",
            "2032",
        ]);
        assert_eq!(settings.start_year, 2025);
        assert_eq!(settings.end_year, 2035);
        assert_eq!(settings.target_year, 2032);
    }

    // ── load_from_args ────────────────────────────────────────────────────

    #[test]
    fn test_load_debug_overrides_log_level() {
        let settings =
            Settings::load_from_args(args(&["powertrain-trends", "data.csv", "--debug"])).unwrap();
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_load_merges_config_file() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("analysis.json");
        let config = AnalysisConfig {
            region_field: Some("Region".to_string()),
            target_year: Some(2035),
            top_n: Some(3),
            ..Default::default()
        };
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).expect("write config");

        let settings = Settings::load_from_args(args(&[
            "powertrain-trends",
            "data.csv",
            "--config",
            path.to_str().unwrap(),
        ]))
        .unwrap();

        assert_eq!(settings.region_field, "Region");
        assert_eq!(settings.target_year, 2035);
        assert_eq!(settings.top_n, 3);
        // Untouched by the config.
        assert_eq!(settings.start_year, 2023);
    }

    #[test]
    fn test_load_cli_overrides_config_file() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("analysis.json");
        let config = AnalysisConfig {
            top_n: Some(3),
            ..Default::default()
        };
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).expect("write config");

        let settings = Settings::load_from_args(args(&[
            "powertrain-trends",
            "data.csv",
            "--config",
            path.to_str().unwrap(),
            "--top-n",
            "8",
        ]))
        .unwrap();

        assert_eq!(settings.top_n, 8);
    }

    #[test]
    fn test_load_missing_config_file_errors() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("absent.json");
        let err = Settings::load_from_args(args(&[
            "powertrain-trends",
            "data.csv",
            "--config",
            path.to_str().unwrap(),
        ]))
        .unwrap_err();
        assert!(matches!(err, TrendError::FileRead { .. }));
    }

    #[test]
    fn test_load_malformed_config_file_errors() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = Settings::load_from_args(args(&[
            "powertrain-trends",
            "data.csv",
            "--config",
            path.to_str().unwrap(),
        ]))
        .unwrap_err();
        assert!(matches!(err, TrendError::JsonParse(_)));
    }

    // ── validate ──────────────────────────────────────────────────────────

    #[test]
    fn test_validate_rejects_zero_top_n() {
        let err = Settings::load_from_args(args(&["powertrain-trends", "data.csv", "--top-n", "0"]))
            .unwrap_err();
        assert!(matches!(err, TrendError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_reversed_years() {
        let err = Settings::load_from_args(args(&[
            "powertrain-trends",
            "data.csv",
            "--start-year",
            "2037",
            "--end-year",
            "2023",
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("after end_year"));
    }

    // ── AnalysisConfig ────────────────────────────────────────────────────

    #[test]
    fn test_analysis_config_skips_unset_fields() {
        let config = AnalysisConfig {
            start_year: Some(2024),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"start_year":2024}"#);
    }
}
