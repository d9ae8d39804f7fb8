//! Dose resolution and volume computation.
//!
//! `volume (ml) = dose (mg/kg) * weight (kg) / concentration (mg/ml)`
//!
//! One drug pair is coupled by volume rather than by dose: the reversal
//! agent is given at the same volume as the sedative computed earlier in
//! the same pass. See [`match_volume`].

use crate::{ComputationRow, DoseRequest, DoseSource, DrugDatabase, Error, Notice, Result};

/// User doses with a smaller magnitude are treated as "not entered"
pub const DEFAULT_DOSE_EPSILON: f64 = 1e-8;

/// Drug whose computed volume is reused by [`DEPENDENT_DRUG`]
pub const REFERENCE_DRUG: &str = "Dexmedetomidine";

/// Drug given at the same volume as [`REFERENCE_DRUG`]
pub const DEPENDENT_DRUG: &str = "Atipamezole";

/// Reference drug whose volume `name` must match, if `name` is volume-coupled
pub fn reference_for(name: &str) -> Option<&'static str> {
    (name == DEPENDENT_DRUG).then_some(REFERENCE_DRUG)
}

/// A resolved dose and how it was obtained
#[derive(Clone, Debug, PartialEq)]
pub struct Resolution {
    /// mg/kg
    pub dose: f64,
    pub source: DoseSource,
    pub notices: Vec<Notice>,
}

/// Resolve the dose to use for `name`
///
/// An absent dose, or one within [`DEFAULT_DOSE_EPSILON`] of zero, is
/// replaced by the configured default and reported as a notice. A dose
/// outside the drug's scale is reported but still used.
pub fn resolve_dose(db: &DrugDatabase, name: &str, user_dose: Option<f64>) -> Result<Resolution> {
    let record = db.get(name)?;
    let mut notices = Vec::new();

    if let Some(dose) = user_dose.filter(|d| !d.is_finite()) {
        return Err(Error::InvalidInput(format!(
            "dose for '{}' must be a finite number, got {}",
            name, dose
        )));
    }

    let (dose, source) = match user_dose {
        Some(dose) if dose.abs() >= DEFAULT_DOSE_EPSILON => (dose, DoseSource::User),
        _ => {
            tracing::info!(
                "Using the default dose for {} of {} (mg/kg)",
                name,
                record.default_dose
            );
            notices.push(Notice::DefaultDoseUsed {
                drug: name.to_string(),
                dose: record.default_dose,
            });
            (record.default_dose, DoseSource::Default)
        }
    };

    if !dose.is_finite() || dose < 0.0 {
        return Err(Error::InvalidInput(format!(
            "dose for '{}' must be a nonnegative number, got {}",
            name, dose
        )));
    }

    if source == DoseSource::User {
        if let Some(scale) = record.dose_scale() {
            if !scale.contains(dose) {
                tracing::warn!(
                    "Dose {} for {} is outside its scale [{}, {}]",
                    dose,
                    name,
                    scale.min,
                    scale.max
                );
                notices.push(Notice::OutsideDoseScale {
                    drug: name.to_string(),
                    dose,
                    min: scale.min,
                    max: scale.max,
                });
            }
        }
    }

    Ok(Resolution {
        dose,
        source,
        notices,
    })
}

/// Volume (ml) of `name` to give at `dose` (mg/kg) for an animal of `weight` (kg)
///
/// Weight and dose are taken as given; only the concentration is checked.
/// It must be a finite positive number.
pub fn compute_volume(db: &DrugDatabase, name: &str, weight: f64, dose: f64) -> Result<f64> {
    let record = db.get(name)?;

    if record.concentration == 0.0 {
        return Err(Error::DivisionUndefined {
            drug: name.to_string(),
        });
    }
    if !record.concentration.is_finite() || record.concentration < 0.0 {
        return Err(Error::InvalidConcentration {
            drug: name.to_string(),
            concentration: record.concentration,
        });
    }

    let volume = dose * weight / record.concentration;
    tracing::debug!(
        "{}: {} mg/kg * {} kg / {} mg/ml = {} ml",
        name,
        dose,
        weight,
        record.concentration,
        volume
    );
    Ok(volume)
}

/// Resolve the dose and compute the volume for a single request
pub fn compute_row(db: &DrugDatabase, request: &DoseRequest) -> Result<(ComputationRow, Vec<Notice>)> {
    let resolution = resolve_dose(db, &request.name, request.user_dose)?;
    let volume = compute_volume(db, &request.name, request.weight, resolution.dose)?;
    let concentration = db.get(&request.name)?.concentration;

    let row = ComputationRow {
        drug: request.name.clone(),
        concentration,
        dose: resolution.dose,
        volume,
        source: resolution.source,
    };
    Ok((row, resolution.notices))
}

/// Build the row for a volume-coupled drug from the rows computed so far
///
/// The dependent drug takes the reference row's volume unchanged. Its dose
/// is back-calculated for display as `volume * concentration / weight`,
/// and shown as zero when the weight is zero.
pub fn match_volume(
    db: &DrugDatabase,
    name: &str,
    reference: &str,
    weight: f64,
    rows: &[ComputationRow],
) -> Result<ComputationRow> {
    let record = db.get(name)?;

    let reference_row = rows
        .iter()
        .find(|row| row.drug == reference)
        .ok_or_else(|| Error::MissingDependency {
            drug: name.to_string(),
            reference: reference.to_string(),
        })?;

    let volume = reference_row.volume;
    let dose = if weight > 0.0 {
        volume * record.concentration / weight
    } else {
        0.0
    };

    tracing::info!(
        "Giving {} at the same volume as {} ({} ml)",
        name,
        reference,
        volume
    );

    Ok(ComputationRow {
        drug: name.to_string(),
        concentration: record.concentration,
        dose,
        volume,
        source: DoseSource::MatchedVolume {
            reference: reference.to_string(),
        },
    })
}
