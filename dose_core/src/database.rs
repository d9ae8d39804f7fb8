//! Drug database: loading, lookup and validation.
//!
//! A database file is a table keyed by drug name, in TOML, YAML or JSON:
//!
//! ```toml
//! [Butorphanol]
//! concentration = 10.0
//! default_dose = 0.2
//! dose_options = [0.1, 0.2, 0.3, 0.4]
//! ```

use crate::{DrugRecord, Error, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Cached sample database - built once and reused across all operations
static DEFAULT_DATABASE: Lazy<DrugDatabase> = Lazy::new(build_default_database);

/// Get a reference to the built-in sample database
///
/// Used when no database file is configured.
pub fn get_default_database() -> &'static DrugDatabase {
    &DEFAULT_DATABASE
}

/// Read-only mapping from drug name to record
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct DrugDatabase {
    drugs: BTreeMap<String, DrugRecord>,
}

impl DrugDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, record: DrugRecord) {
        self.drugs.insert(name.into(), record);
    }

    /// Look up a drug, failing with `UnknownDrug` when absent
    pub fn get(&self, name: &str) -> Result<&DrugRecord> {
        self.drugs.get(name).ok_or_else(|| Error::UnknownDrug {
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.drugs.contains_key(name)
    }

    /// Drug names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.drugs.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DrugRecord)> {
        self.drugs.iter().map(|(name, record)| (name.as_str(), record))
    }

    pub fn len(&self) -> usize {
        self.drugs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drugs.is_empty()
    }

    /// Load a database file; the format is chosen by extension
    /// (`.toml`, `.yaml`/`.yml` or `.json`)
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        let database: DrugDatabase = match extension.as_deref() {
            Some("toml") => toml::from_str(&contents)?,
            Some("yaml") | Some("yml") => serde_yaml::from_str(&contents)?,
            Some("json") => serde_json::from_str(&contents)?,
            _ => {
                return Err(Error::Config(format!(
                    "Unsupported database format for {:?} (expected .toml, .yaml or .json)",
                    path
                )))
            }
        };

        tracing::info!("Loaded {} drugs from {:?}", database.len(), path);
        Ok(database)
    }

    /// Validate the database for consistency
    ///
    /// Returns a list of problems, or an empty Vec if valid. Zero
    /// concentrations are still rejected at compute time.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.drugs.is_empty() {
            errors.push("Database has no drugs".to_string());
        }

        for (name, record) in &self.drugs {
            if name.trim().is_empty() {
                errors.push("Drug has empty name".to_string());
            }

            if !record.concentration.is_finite() || record.concentration <= 0.0 {
                errors.push(format!(
                    "Drug '{}': concentration {} must be a positive number",
                    name, record.concentration
                ));
            }

            if !record.default_dose.is_finite() || record.default_dose < 0.0 {
                errors.push(format!(
                    "Drug '{}': default dose {} must be a nonnegative number",
                    name, record.default_dose
                ));
            }

            if let Some(options) = &record.dose_options {
                if options.len() < 2 {
                    errors.push(format!(
                        "Drug '{}': dose_options needs at least two entries",
                        name
                    ));
                }
                if options.windows(2).any(|w| w[1] <= w[0]) {
                    errors.push(format!(
                        "Drug '{}': dose_options must be strictly ascending",
                        name
                    ));
                }
            }

            if let Some(scale) = record.dose_scale() {
                if !scale.contains(record.default_dose) {
                    errors.push(format!(
                        "Drug '{}': default dose {} is outside its scale of {} to {}",
                        name, record.default_dose, scale.min, scale.max
                    ));
                }
            }
        }

        errors
    }
}

impl FromIterator<(String, DrugRecord)> for DrugDatabase {
    fn from_iter<I: IntoIterator<Item = (String, DrugRecord)>>(iter: I) -> Self {
        Self {
            drugs: iter.into_iter().collect(),
        }
    }
}

/// Builds the built-in sample database
///
/// Contains the volume-matched sedative/reversal pair so the coupling
/// rule is usable out of the box.
fn build_default_database() -> DrugDatabase {
    let mut db = DrugDatabase::new();

    db.insert(
        "Dexmedetomidine",
        DrugRecord::new(0.5, 0.005).with_dose_options(vec![0.002, 0.004, 0.006, 0.008, 0.010]),
    );
    db.insert("Atipamezole", DrugRecord::new(5.0, 0.05));
    db.insert(
        "Butorphanol",
        DrugRecord::new(10.0, 0.2).with_dose_options(vec![0.1, 0.2, 0.3, 0.4]),
    );
    db.insert(
        "Methadone",
        DrugRecord::new(10.0, 0.3).with_dose_options(vec![0.1, 0.2, 0.3, 0.4, 0.5]),
    );
    db.insert("Meloxicam", DrugRecord::new(5.0, 0.2));
    db.insert("Ketamine", DrugRecord::new(100.0, 5.0));

    db
}
