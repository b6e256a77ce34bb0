use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Propulsion category assigned to every forecast row.
///
/// Declaration order is the canonical output order (`EV, HEV, ICE`); the
/// derived `Ord` follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum PowertrainType {
    /// Battery electric vehicle.
    #[serde(rename = "EV")]
    Ev,
    /// Hybrid electric vehicle, including plug-in and mild hybrids.
    #[serde(rename = "HEV")]
    Hev,
    /// Internal combustion engine. Assigned when no other rule matches.
    #[default]
    #[serde(rename = "ICE")]
    Ice,
}

impl PowertrainType {
    /// Every category in canonical order.
    pub const ALL: [PowertrainType; 3] = [PowertrainType::Ev, PowertrainType::Hev, PowertrainType::Ice];

    /// Short upper-case label, e.g. `"EV"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            PowertrainType::Ev => "EV",
            PowertrainType::Hev => "HEV",
            PowertrainType::Ice => "ICE",
        }
    }
}

impl fmt::Display for PowertrainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One forecast row as read from the source table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Free-text fuel type, e.g. `"BEV"` or `"Gasoline"`.
    #[serde(default)]
    pub fuel_type: Option<String>,
    /// Free-text powertrain main category, e.g. `"Mild Hybrid"`.
    #[serde(default)]
    pub powertrain_category: Option<String>,
    /// Geographic region; `None` when the cell is blank or the column is absent.
    #[serde(default)]
    pub region: Option<String>,
    /// Production volume per forecast year. Years with no value are absent.
    #[serde(default)]
    pub year_volumes: BTreeMap<i32, f64>,
}

impl RawRecord {
    /// Builder helper: set the fuel type.
    pub fn with_fuel_type(mut self, fuel_type: impl Into<String>) -> Self {
        self.fuel_type = Some(fuel_type.into());
        self
    }

    /// Builder helper: set the powertrain category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.powertrain_category = Some(category.into());
        self
    }

    /// Builder helper: set the region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Builder helper: add a volume for `year`.
    pub fn with_volume(mut self, year: i32, volume: f64) -> Self {
        self.year_volumes.insert(year, volume);
        self
    }
}

/// A [`RawRecord`] paired with the category the classifier assigned to it.
///
/// Only [`crate::classifier::classify_record`] can build one, so the
/// category is set exactly once and cannot be changed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedRecord {
    record: RawRecord,
    powertrain_type: PowertrainType,
}

impl ClassifiedRecord {
    pub(crate) fn new(record: RawRecord, powertrain_type: PowertrainType) -> Self {
        Self {
            record,
            powertrain_type,
        }
    }

    pub fn powertrain_type(&self) -> PowertrainType {
        self.powertrain_type
    }

    pub fn fuel_type(&self) -> Option<&str> {
        self.record.fuel_type.as_deref()
    }

    pub fn powertrain_category(&self) -> Option<&str> {
        self.record.powertrain_category.as_deref()
    }

    /// Region value as stored, treating blank strings the same as a missing
    /// value. No other normalisation is applied.
    pub fn region(&self) -> Option<&str> {
        self.record
            .region
            .as_deref()
            .filter(|r| !r.trim().is_empty())
    }

    /// Volume for `year`, or `None` when the row has no value for it.
    pub fn volume(&self, year: i32) -> Option<f64> {
        self.record.year_volumes.get(&year).copied()
    }
}

/// Per-category volume totals, and (once computed) market shares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub powertrain_type: PowertrainType,
    /// Summed volume per year. Years no record contributed to are absent.
    pub year_volume: BTreeMap<i32, f64>,
    /// Percentage share per year in `[0, 100]`. Empty until shares are computed.
    #[serde(default)]
    pub year_share: BTreeMap<i32, f64>,
}

impl AggregateRow {
    pub fn new(powertrain_type: PowertrainType) -> Self {
        Self {
            powertrain_type,
            year_volume: BTreeMap::new(),
            year_share: BTreeMap::new(),
        }
    }

    pub fn volume(&self, year: i32) -> Option<f64> {
        self.year_volume.get(&year).copied()
    }

    pub fn share(&self, year: i32) -> Option<f64> {
        self.year_share.get(&year).copied()
    }
}

/// EV adoption between two reference years.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionSummary {
    pub start_year: i32,
    pub end_year: i32,
    pub start_ev_share: f64,
    pub end_ev_share: f64,
    /// `end_ev_share - start_ev_share`, in percentage points.
    pub share_change: f64,
    pub start_ev_volume: f64,
    pub end_ev_volume: f64,
    /// `end_ev_volume - start_ev_volume`.
    pub volume_change: f64,
}

impl TransitionSummary {
    /// Build a summary, deriving both deltas from the endpoints.
    pub fn new(
        (start_year, start_ev_share, start_ev_volume): (i32, f64, f64),
        (end_year, end_ev_share, end_ev_volume): (i32, f64, f64),
    ) -> Self {
        Self {
            start_year,
            end_year,
            start_ev_share,
            end_ev_share,
            share_change: end_ev_share - start_ev_share,
            start_ev_volume,
            end_ev_volume,
            volume_change: end_ev_volume - start_ev_volume,
        }
    }
}

/// Shared aggregate rows per region, keyed and iterated in region order.
pub type RegionalResult = BTreeMap<String, Vec<AggregateRow>>;

/// One line of the EV-share region ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopRegionEntry {
    pub region: String,
    pub ev_share: f64,
    pub ev_volume: f64,
}

/// EV share movement of a single region between two years.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionTransition {
    pub region: String,
    pub start_share: f64,
    pub end_share: f64,
    pub share_change: f64,
}

/// Number of classified records per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowertrainDistribution {
    pub ev: usize,
    pub hev: usize,
    pub ice: usize,
}

impl PowertrainDistribution {
    pub fn get(&self, powertrain_type: PowertrainType) -> usize {
        match powertrain_type {
            PowertrainType::Ev => self.ev,
            PowertrainType::Hev => self.hev,
            PowertrainType::Ice => self.ice,
        }
    }

    pub fn increment(&mut self, powertrain_type: PowertrainType) {
        match powertrain_type {
            PowertrainType::Ev => self.ev += 1,
            PowertrainType::Hev => self.hev += 1,
            PowertrainType::Ice => self.ice += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.ev + self.hev + self.ice
    }
}

impl fmt::Display for PowertrainDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EV: {}, HEV: {}, ICE: {}", self.ev, self.hev, self.ice)
    }
}

/// A spot-check of how one row was classified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationSample {
    pub fuel_type: Option<String>,
    pub powertrain_category: Option<String>,
    pub classified_as: PowertrainType,
}
