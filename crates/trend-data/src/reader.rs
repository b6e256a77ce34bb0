//! CSV discovery and loading for forecast tables.
//!
//! A forecast table has one row per model/region/powertrain variant, a few
//! descriptive text columns, and one volume column per forecast year. Year
//! columns are found by matching their header against a regex.

use std::collections::BTreeSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use regex::Regex;
use tracing::{debug, info, warn};

use trend_core::error::{Result, TrendError};
use trend_core::models::RawRecord;
use trend_core::settings::{Settings, DEFAULT_YEAR_PATTERN};

// ── Public types ──────────────────────────────────────────────────────────────

/// Which source columns feed the record model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub fuel_type: String,
    pub category: String,
    pub region: String,
    /// Regex whose first capture group is a 4-digit year.
    pub year_pattern: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            fuel_type: "S: Fuel Type".to_string(),
            category: "S: Powertrain Main Category".to_string(),
            region: "S: Region".to_string(),
            year_pattern: DEFAULT_YEAR_PATTERN.to_string(),
        }
    }
}

impl From<&Settings> for ColumnMapping {
    fn from(settings: &Settings) -> Self {
        Self {
            fuel_type: settings.fuel_type_field.clone(),
            category: settings.category_field.clone(),
            region: settings.region_field.clone(),
            year_pattern: settings.year_pattern.clone(),
        }
    }
}

/// A header recognised as a forecast-year volume column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearColumn {
    pub index: usize,
    pub header: String,
    pub year: i32,
}

/// Everything read from the input path.
#[derive(Debug, Clone, Default)]
pub struct LoadedTable {
    pub records: Vec<RawRecord>,
    /// Sorted union of the year columns across all files.
    pub years: Vec<i32>,
    pub files: Vec<PathBuf>,
    /// Rows the CSV parser could not read.
    pub rows_skipped: usize,
    /// Non-empty volume cells that were not numbers.
    pub cells_skipped: usize,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Resolve the input into a sorted list of CSV files.
///
/// A file path is returned as-is. A directory is walked recursively for
/// `.csv` files (case-insensitive extension).
pub fn find_csv_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.to_path_buf()];
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(path)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Find the headers that name a forecast year, sorted by year.
///
/// When two headers resolve to the same year the first one wins.
pub fn extract_year_columns(headers: &StringRecord, pattern: &Regex) -> Vec<YearColumn> {
    let mut seen = BTreeSet::new();
    let mut columns = Vec::new();

    for (index, header) in headers.iter().enumerate() {
        let Some(year) = pattern
            .captures(header)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<i32>().ok())
        else {
            continue;
        };
        if !seen.insert(year) {
            warn!("Duplicate column for year {year} ignored: '{header}'");
            continue;
        }
        columns.push(YearColumn {
            index,
            header: header.to_string(),
            year,
        });
    }

    columns.sort_by_key(|c| c.year);
    columns
}

/// Load every CSV file under `path` into [`RawRecord`]s.
///
/// # Errors
///
/// * [`TrendError::DataPathNotFound`] when `path` does not exist.
/// * [`TrendError::NoDataFiles`] when no CSV file is found.
/// * [`TrendError::InvalidPattern`] when the year pattern does not compile.
/// * [`TrendError::NoYearColumns`] / [`TrendError::MissingColumn`] when a
///   file lacks year headers or the fuel-type / category column.
///
/// A missing region column is not an error: it is logged and every record
/// gets `region: None`.
pub fn load_table(path: &Path, mapping: &ColumnMapping) -> Result<LoadedTable> {
    if !path.exists() {
        return Err(TrendError::DataPathNotFound(path.to_path_buf()));
    }

    let files = find_csv_files(path);
    if files.is_empty() {
        return Err(TrendError::NoDataFiles(path.to_path_buf()));
    }

    let pattern = Regex::new(&mapping.year_pattern)?;
    let mut table = LoadedTable::default();
    let mut years = BTreeSet::new();

    for file_path in &files {
        let loaded = load_file(file_path, mapping, &pattern)?;
        years.extend(loaded.years);
        table.records.extend(loaded.records);
        table.rows_skipped += loaded.rows_skipped;
        table.cells_skipped += loaded.cells_skipped;
    }

    table.years = years.into_iter().collect();
    table.files = files;

    info!(
        "Loaded {} records from {} files ({} years)",
        table.records.len(),
        table.files.len(),
        table.years.len()
    );
    if table.cells_skipped > 0 {
        warn!("{} non-numeric volume cells were ignored", table.cells_skipped);
    }

    Ok(table)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Outcome of reading one volume cell.
#[derive(Debug, Clone, Copy, PartialEq)]
enum VolumeCell {
    Empty,
    Value(f64),
    Invalid,
}

/// Parse a volume cell, accepting thousands separators (`"1,234"`).
fn parse_volume(raw: &str) -> VolumeCell {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return VolumeCell::Empty;
    }
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => VolumeCell::Value(v),
        _ => VolumeCell::Invalid,
    }
}

/// Text cell to `Option<String>`, mapping blanks to `None`.
fn text_cell(record: &StringRecord, index: Option<usize>) -> Option<String> {
    index
        .and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

fn required_column(headers: &StringRecord, name: &str, path: &Path) -> Result<usize> {
    column_index(headers, name).ok_or_else(|| TrendError::MissingColumn {
        column: name.to_string(),
        path: path.to_path_buf(),
    })
}

/// Per-file result before merging.
struct LoadedFile {
    records: Vec<RawRecord>,
    years: Vec<i32>,
    rows_skipped: usize,
    cells_skipped: usize,
}

fn load_file(path: &Path, mapping: &ColumnMapping, pattern: &Regex) -> Result<LoadedFile> {
    let file = File::open(path).map_err(|source| TrendError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(file);

    let headers = reader.headers()?.clone();

    let year_columns = extract_year_columns(&headers, pattern);
    if year_columns.is_empty() {
        return Err(TrendError::NoYearColumns(path.to_path_buf()));
    }

    let fuel_idx = required_column(&headers, &mapping.fuel_type, path)?;
    let category_idx = required_column(&headers, &mapping.category, path)?;
    let region_idx = column_index(&headers, &mapping.region);
    if region_idx.is_none() {
        warn!(
            "Region column '{}' not found in {}; regional analysis will be empty",
            mapping.region,
            path.display()
        );
    }

    let mut records = Vec::new();
    let mut rows_skipped = 0usize;
    let mut cells_skipped = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: 1-based lines, plus the header row.
        let line = idx + 2;
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("Skipping unreadable row {} in {}: {}", line, path.display(), e);
                rows_skipped += 1;
                continue;
            }
        };

        let mut record = RawRecord {
            fuel_type: text_cell(&row, Some(fuel_idx)),
            powertrain_category: text_cell(&row, Some(category_idx)),
            region: text_cell(&row, region_idx),
            ..Default::default()
        };

        for column in &year_columns {
            match parse_volume(row.get(column.index).unwrap_or("")) {
                VolumeCell::Value(v) => {
                    record.year_volumes.insert(column.year, v);
                }
                VolumeCell::Empty => {}
                VolumeCell::Invalid => {
                    debug!(
                        "Non-numeric volume in {} line {} column '{}'",
                        path.display(),
                        line,
                        column.header
                    );
                    cells_skipped += 1;
                }
            }
        }

        records.push(record);
    }

    debug!("Read {} records from {}", records.len(), path.display());

    Ok(LoadedFile {
        records,
        years: year_columns.iter().map(|c| c.year).collect(),
        rows_skipped,
        cells_skipped,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
