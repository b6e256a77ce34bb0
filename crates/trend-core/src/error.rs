use std::path::PathBuf;
use thiserror::Error;

use crate::models::PowertrainType;

/// All errors produced by the powertrain trend pipeline.
#[derive(Error, Debug)]
pub enum TrendError {
    /// A requested analysis year is not one of the dataset's year columns.
    #[error("Year {year} is not in the dataset (available: {available})")]
    InvalidYear { year: i32, available: String },

    /// No record was classified under a category the analysis depends on.
    #[error("No records classified as {0}")]
    MissingCategory(PowertrainType),

    /// Regional analysis found no record with a usable region value.
    #[error("No region values found in field '{0}'")]
    EmptyRegionSet(String),

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input path does not exist.
    #[error("Data path not found: {0}")]
    DataPathNotFound(PathBuf),

    /// No CSV files were found under the given path.
    #[error("No CSV files found in {0}")]
    NoDataFiles(PathBuf),

    /// A CSV file has no header that looks like a forecast year.
    #[error("No year columns found in {0}")]
    NoYearColumns(PathBuf),

    /// A column required by the classifier is absent from the header row.
    #[error("Required column '{column}' missing from {path}")]
    MissingColumn { column: String, path: PathBuf },

    /// The year-column pattern is not a valid regular expression.
    #[error("Invalid year pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// A CSV document could not be read or written.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A JSON document could not be parsed or written.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TrendError {
    /// Build a [`TrendError::InvalidYear`] listing the years that do exist.
    pub fn invalid_year(year: i32, available: &[i32]) -> Self {
        let available = match (available.first(), available.last()) {
            (Some(first), Some(last)) => format!("{first}..={last}"),
            _ => "none".to_string(),
        };
        TrendError::InvalidYear { year, available }
    }
}

/// Convenience alias used throughout the trend crates.
pub type Result<T> = std::result::Result<T, TrendError>;
