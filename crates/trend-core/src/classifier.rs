//! Rule-based powertrain classification.
//!
//! Each row carries two free-text fields, fuel type and powertrain main
//! category. They are matched case-insensitively against ordered rule tables:
//! the EV rules run first, the HEV rules only on rows that are not EV, and
//! everything else falls through to ICE.

use tracing::{debug, info};

use crate::models::{
    ClassificationSample, ClassifiedRecord, PowertrainDistribution, PowertrainType, RawRecord,
};

// ── Rule tables ───────────────────────────────────────────────────────────────

/// Which text field a rule inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    FuelType,
    Category,
}

/// A case-insensitive substring test against one field.
#[derive(Debug, Clone, Copy)]
struct Rule {
    field: Field,
    /// Lower-case needle.
    needle: &'static str,
}

const fn rule(field: Field, needle: &'static str) -> Rule {
    Rule { field, needle }
}

const EV_RULES: &[Rule] = &[
    rule(Field::FuelType, "bev"),
    rule(Field::Category, "battery electric"),
    rule(Field::FuelType, "electric"),
];

const HEV_RULES: &[Rule] = &[
    rule(Field::Category, "hybrid"),
    rule(Field::Category, "phev"),
    rule(Field::Category, "mild hybrid"),
    rule(Field::FuelType, "phev"),
    rule(Field::FuelType, "hev"),
];

/// Label tables in priority order. The first table with a matching rule wins.
const PRIORITY: &[(PowertrainType, &[Rule])] = &[
    (PowertrainType::Ev, EV_RULES),
    (PowertrainType::Hev, HEV_RULES),
];

/// Lower-cased copies of the two inspected fields.
struct Fields {
    fuel_type: Option<String>,
    category: Option<String>,
}

impl Fields {
    fn new(fuel_type: Option<&str>, category: Option<&str>) -> Self {
        Self {
            fuel_type: fuel_type.map(str::to_lowercase),
            category: category.map(str::to_lowercase),
        }
    }

    fn matches(&self, rule: &Rule) -> bool {
        let value = match rule.field {
            Field::FuelType => self.fuel_type.as_deref(),
            Field::Category => self.category.as_deref(),
        };
        value.is_some_and(|v| v.contains(rule.needle))
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Classify a row from its fuel type and powertrain category.
///
/// Total over its input: a missing field simply fails every rule, so a row
/// with neither field is [`PowertrainType::Ice`].
///
/// # Examples
///
/// ```
/// use trend_core::classifier::classify;
/// use trend_core::models::PowertrainType;
///
/// assert_eq!(classify(Some("BEV"), Some("Hybrid")), PowertrainType::Ev);
/// assert_eq!(classify(Some("Gasoline"), Some("Mild Hybrid")), PowertrainType::Hev);
/// assert_eq!(classify(None, None), PowertrainType::Ice);
/// ```
pub fn classify(fuel_type: Option<&str>, powertrain_category: Option<&str>) -> PowertrainType {
    let fields = Fields::new(fuel_type, powertrain_category);
    PRIORITY
        .iter()
        .find(|(_, rules)| rules.iter().any(|r| fields.matches(r)))
        .map(|(label, _)| *label)
        .unwrap_or_default()
}

/// Classify one raw row, producing a new [`ClassifiedRecord`].
pub fn classify_record(record: RawRecord) -> ClassifiedRecord {
    let powertrain_type = classify(
        record.fuel_type.as_deref(),
        record.powertrain_category.as_deref(),
    );
    ClassifiedRecord::new(record, powertrain_type)
}

/// Classify every row of a table.
pub fn classify_all(records: Vec<RawRecord>) -> Vec<ClassifiedRecord> {
    let classified: Vec<ClassifiedRecord> = records.into_iter().map(classify_record).collect();
    info!("Powertrain classification complete: {} records", classified.len());
    classified
}

/// Count classified rows per category.
pub fn powertrain_distribution(records: &[ClassifiedRecord]) -> PowertrainDistribution {
    let mut distribution = PowertrainDistribution::default();
    for record in records {
        distribution.increment(record.powertrain_type());
    }
    distribution
}

/// Take up to `per_type` example rows of each category, in canonical order,
/// so the classification can be eyeballed in logs.
pub fn classification_samples(
    records: &[ClassifiedRecord],
    per_type: usize,
) -> Vec<ClassificationSample> {
    let mut samples = Vec::new();
    for powertrain_type in PowertrainType::ALL {
        samples.extend(
            records
                .iter()
                .filter(|r| r.powertrain_type() == powertrain_type)
                .take(per_type)
                .map(|r| ClassificationSample {
                    fuel_type: r.fuel_type().map(str::to_string),
                    powertrain_category: r.powertrain_category().map(str::to_string),
                    classified_as: powertrain_type,
                }),
        );
    }
    for sample in &samples {
        debug!(
            "Sample {}: fuel_type={:?}, category={:?}",
            sample.classified_as, sample.fuel_type, sample.powertrain_category
        );
    }
    samples
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── EV rules ──────────────────────────────────────────────────────────

    #[test]
    fn test_bev_fuel_type_is_ev() {
        assert_eq!(classify(Some("BEV"), None), PowertrainType::Ev);
    }

    #[test]
    fn test_battery_electric_category_is_ev() {
        assert_eq!(classify(None, Some("Battery Electric Vehicle")), PowertrainType::Ev);
    }

    #[test]
    fn test_electric_fuel_type_is_ev() {
        assert_eq!(classify(Some("Electric"), Some("Other")), PowertrainType::Ev);
    }

    #[test]
    fn test_ev_match_is_case_insensitive() {
        assert_eq!(classify(Some("bev"), None), PowertrainType::Ev);
        assert_eq!(classify(None, Some("BATTERY ELECTRIC")), PowertrainType::Ev);
    }

    #[test]
    fn test_ev_takes_precedence_over_hybrid() {
        assert_eq!(classify(Some("BEV"), Some("Hybrid")), PowertrainType::Ev);
    }

    #[test]
    fn test_electric_fuel_with_phev_category_is_ev() {
        // "Electric" in the fuel type wins even when the category says PHEV.
        assert_eq!(classify(Some("Gasoline/Electric"), Some("PHEV")), PowertrainType::Ev);
    }

    // ── HEV rules ─────────────────────────────────────────────────────────

    #[test]
    fn test_hybrid_category_is_hev() {
        assert_eq!(classify(Some("Gasoline"), Some("Hybrid")), PowertrainType::Hev);
    }

    #[test]
    fn test_mild_hybrid_category_is_hev() {
        assert_eq!(classify(Some("Diesel"), Some("Mild Hybrid")), PowertrainType::Hev);
    }

    #[test]
    fn test_phev_fuel_type_is_hev() {
        assert_eq!(classify(Some("PHEV"), None), PowertrainType::Hev);
    }

    #[test]
    fn test_hev_fuel_type_is_hev() {
        assert_eq!(classify(Some("hev"), Some("Conventional")), PowertrainType::Hev);
    }

    #[test]
    fn test_phev_category_is_hev() {
        assert_eq!(classify(None, Some("phev")), PowertrainType::Hev);
    }

    // ── ICE default ───────────────────────────────────────────────────────

    #[test]
    fn test_missing_fields_is_ice() {
        assert_eq!(classify(None, None), PowertrainType::Ice);
    }

    #[test]
    fn test_conventional_is_ice() {
        assert_eq!(classify(Some("Gasoline"), Some("Conventional")), PowertrainType::Ice);
    }

    #[test]
    fn test_empty_strings_are_ice() {
        assert_eq!(classify(Some(""), Some("")), PowertrainType::Ice);
    }

    #[test]
    fn test_classify_is_total() {
        let fuels = [None, Some("BEV"), Some("PHEV"), Some("Diesel"), Some("")];
        let categories = [None, Some("Hybrid"), Some("Battery Electric"), Some("ICE")];
        for fuel in fuels {
            for category in categories {
                let t = classify(fuel, category);
                assert!(PowertrainType::ALL.contains(&t));
            }
        }
    }

    // ── classify_record / classify_all ────────────────────────────────────

    #[test]
    fn test_classify_record_keeps_fields() {
        let raw = RawRecord::default()
            .with_fuel_type("BEV")
            .with_region("Europe")
            .with_volume(2023, 100.0);
        let rec = classify_record(raw);
        assert_eq!(rec.powertrain_type(), PowertrainType::Ev);
        assert_eq!(rec.fuel_type(), Some("BEV"));
        assert_eq!(rec.powertrain_category(), None);
        assert_eq!(rec.region(), Some("Europe"));
        assert_eq!(rec.volume(2023), Some(100.0));
    }

    #[test]
    fn test_classify_all_preserves_order() {
        let records = vec![
            RawRecord::default().with_fuel_type("Gasoline"),
            RawRecord::default().with_fuel_type("BEV"),
            RawRecord::default().with_category("Hybrid"),
        ];
        let types: Vec<_> = classify_all(records)
            .iter()
            .map(|r| r.powertrain_type())
            .collect();
        assert_eq!(
            types,
            vec![PowertrainType::Ice, PowertrainType::Ev, PowertrainType::Hev]
        );
    }

    // ── distribution / samples ────────────────────────────────────────────

    #[test]
    fn test_powertrain_distribution() {
        let records = classify_all(vec![
            RawRecord::default().with_fuel_type("BEV"),
            RawRecord::default().with_fuel_type("BEV"),
            RawRecord::default().with_category("Hybrid"),
            RawRecord::default(),
        ]);
        let dist = powertrain_distribution(&records);
        assert_eq!(dist.ev, 2);
        assert_eq!(dist.hev, 1);
        assert_eq!(dist.ice, 1);
    }

    #[test]
    fn test_classification_samples_capped_per_type() {
        let records = classify_all(vec![
            RawRecord::default().with_fuel_type("BEV"),
            RawRecord::default().with_fuel_type("Electric"),
            RawRecord::default().with_fuel_type("BEV"),
            RawRecord::default().with_fuel_type("Diesel"),
        ]);
        let samples = classification_samples(&records, 2);
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].classified_as, PowertrainType::Ev);
        assert_eq!(samples[1].classified_as, PowertrainType::Ev);
        assert_eq!(samples[2].classified_as, PowertrainType::Ice);
        assert_eq!(samples[2].fuel_type.as_deref(), Some("Diesel"));
    }
}
