//! Batch evaluation of a drug selection.
//!
//! A pass computes one row per selected drug, in selection order. Any
//! error aborts the whole pass and no rows are returned.

use crate::dose::{self, compute_row, match_volume};
use crate::{ComputationRow, DoseRequest, DrugDatabase, Error, Notice, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// Everything the shell supplies for one calculation pass
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchRequest {
    /// kg
    pub weight: f64,
    /// Drug names in evaluation order
    pub selected: Vec<String>,
    /// Per-drug dose overrides (mg/kg); missing or zero means default
    pub overrides: BTreeMap<String, f64>,
}

impl BatchRequest {
    pub fn new(weight: f64) -> Self {
        Self {
            weight,
            ..Self::default()
        }
    }

    pub fn select(mut self, name: impl Into<String>) -> Self {
        self.selected.push(name.into());
        self
    }

    pub fn with_dose(mut self, name: impl Into<String>, dose: f64) -> Self {
        self.overrides.insert(name.into(), dose);
        self
    }
}

/// Result of a completed pass
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Batch {
    pub weight: f64,
    pub rows: Vec<ComputationRow>,
    pub notices: Vec<Notice>,
}

impl Batch {
    /// Sum of all row volumes (ml)
    pub fn total_volume(&self) -> f64 {
        self.rows.iter().map(|row| row.volume).sum()
    }
}

/// Evaluate every selected drug against the database
///
/// The volume-coupled drug must come after its reference drug in
/// `request.selected`; otherwise the pass fails with `MissingDependency`.
/// Repeated names are computed once.
pub fn evaluate(db: &DrugDatabase, request: &BatchRequest) -> Result<Batch> {
    let weight = request.weight;
    if !weight.is_finite() || weight < 0.0 {
        return Err(Error::InvalidInput(format!(
            "weight must be a nonnegative number, got {}",
            weight
        )));
    }

    let mut rows: Vec<ComputationRow> = Vec::with_capacity(request.selected.len());
    let mut notices = Vec::new();

    for name in &request.selected {
        if rows.iter().any(|row| &row.drug == name) {
            tracing::debug!("Skipping repeated selection of {}", name);
            continue;
        }

        if let Some(reference) = dose::reference_for(name) {
            if request.overrides.contains_key(name) {
                tracing::warn!(
                    "Ignoring dose override for {}: its volume follows {}",
                    name,
                    reference
                );
            }

            let row = match_volume(db, name, reference, weight, &rows)?;
            notices.push(Notice::VolumeMatched {
                drug: name.clone(),
                reference: reference.to_string(),
                volume: row.volume,
            });
            rows.push(row);
            continue;
        }

        let (row, row_notices) = compute_row(
            db,
            &DoseRequest {
                name: name.clone(),
                weight,
                user_dose: request.overrides.get(name).copied(),
            },
        )?;
        notices.extend(row_notices);
        rows.push(row);
    }

    tracing::info!("Computed {} rows for {} kg", rows.len(), weight);

    Ok(Batch {
        weight,
        rows,
        notices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dose::{DEPENDENT_DRUG, REFERENCE_DRUG};
    use crate::{get_default_database, DoseSource, DrugRecord};

    fn drug_a_database() -> DrugDatabase {
        let mut db = DrugDatabase::new();
        db.insert("DrugA", DrugRecord::new(10.0, 1.0));
        db.insert("DrugB", DrugRecord::new(2.0, 0.5));
        db
    }

    #[test]
    fn test_rows_follow_selection_order() {
        let db = drug_a_database();
        let request = BatchRequest::new(20.0)
            .select("DrugB")
            .select("DrugA")
            .with_dose("DrugA", 2.0);

        let batch = evaluate(&db, &request).unwrap();
        let names: Vec<_> = batch.rows.iter().map(|r| r.drug.as_str()).collect();
        assert_eq!(names, vec!["DrugB", "DrugA"]);

        assert!((batch.rows[0].volume - 0.5 * 20.0 / 2.0).abs() < 1e-12);
        assert_eq!(batch.rows[0].source, DoseSource::Default);
        assert!((batch.rows[1].volume - 4.0).abs() < 1e-12);
        assert_eq!(batch.rows[1].source, DoseSource::User);

        assert_eq!(batch.notices.len(), 1);
        assert!((batch.total_volume() - 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_duplicates_computed_once() {
        let db = drug_a_database();
        let request = BatchRequest::new(10.0).select("DrugA").select("DrugA");

        let batch = evaluate(&db, &request).unwrap();
        assert_eq!(batch.rows.len(), 1);
    }

    #[test]
    fn test_empty_selection() {
        let db = drug_a_database();
        let batch = evaluate(&db, &BatchRequest::new(10.0)).unwrap();
        assert!(batch.rows.is_empty());
        assert_eq!(batch.total_volume(), 0.0);
    }

    #[test]
    fn test_invalid_weight() {
        let db = drug_a_database();
        for weight in [-1.0, f64::NAN, f64::INFINITY] {
            let request = BatchRequest::new(weight).select("DrugA");
            assert!(matches!(
                evaluate(&db, &request),
                Err(Error::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_error_aborts_pass() {
        let mut db = drug_a_database();
        db.insert("Empty", DrugRecord::new(0.0, 1.0));

        let request = BatchRequest::new(10.0).select("DrugA").select("Empty");
        assert!(matches!(
            evaluate(&db, &request),
            Err(Error::DivisionUndefined { .. })
        ));

        let request = BatchRequest::new(10.0).select("DrugA").select("Missing");
        assert!(matches!(
            evaluate(&db, &request),
            Err(Error::UnknownDrug { .. })
        ));
    }

    #[test]
    fn test_dependent_drug_matches_reference_volume() {
        let db = get_default_database();
        let weight = 18.0;
        let request = BatchRequest::new(weight)
            .select(REFERENCE_DRUG)
            .select(DEPENDENT_DRUG)
            .with_dose(DEPENDENT_DRUG, 99.0);

        let batch = evaluate(db, &request).unwrap();
        let reference = &batch.rows[0];
        let dependent = &batch.rows[1];

        assert_eq!(dependent.volume, reference.volume);
        let expected_dose =
            reference.volume * db.get(DEPENDENT_DRUG).unwrap().concentration / weight;
        assert!((dependent.dose - expected_dose).abs() < 1e-12);
        assert!(batch
            .notices
            .iter()
            .any(|n| matches!(n, Notice::VolumeMatched { .. })));
    }

    #[test]
    fn test_dependent_drug_before_reference_fails() {
        let db = get_default_database();
        let request = BatchRequest::new(18.0)
            .select(DEPENDENT_DRUG)
            .select(REFERENCE_DRUG);

        assert!(matches!(
            evaluate(db, &request),
            Err(Error::MissingDependency { .. })
        ));
    }

    #[test]
    fn test_dependent_drug_alone_fails() {
        let db = get_default_database();
        let request = BatchRequest::new(18.0).select(DEPENDENT_DRUG);

        assert!(matches!(
            evaluate(db, &request),
            Err(Error::MissingDependency { .. })
        ));
    }
}
