//! Core domain types for the dose calculator.
//!
//! Units are fixed across the crate: dose in mg/kg, concentration in mg/ml,
//! weight in kg and volume in ml.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Drug Records
// ============================================================================

/// One database entry, keyed by drug name in [`crate::DrugDatabase`]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DrugRecord {
    /// mg/ml
    pub concentration: f64,

    /// mg/kg, used when the user supplies no dose
    #[serde(alias = "dose")]
    pub default_dose: f64,

    /// Linear dose scale: first = min, last = max, spacing of the first two = step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dose_options: Option<Vec<f64>>,
}

impl DrugRecord {
    pub fn new(concentration: f64, default_dose: f64) -> Self {
        Self {
            concentration,
            default_dose,
            dose_options: None,
        }
    }

    pub fn with_dose_options(mut self, options: Vec<f64>) -> Self {
        self.dose_options = Some(options);
        self
    }

    /// Dose scale derived from `dose_options`, if any
    pub fn dose_scale(&self) -> Option<DoseScale> {
        self.dose_options
            .as_deref()
            .and_then(DoseScale::from_options)
    }
}

/// Allowed dose range for drugs that use a discretized dose scale
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct DoseScale {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl DoseScale {
    /// Build a scale from an ordered option list.
    ///
    /// Uniform spacing is assumed and not checked. A single entry gives a
    /// zero step; an empty list gives no scale.
    pub fn from_options(options: &[f64]) -> Option<Self> {
        let min = *options.first()?;
        let max = *options.last()?;
        let step = match options.get(1) {
            Some(second) => second - min,
            None => 0.0,
        };
        Some(Self { min, max, step })
    }

    pub fn contains(&self, dose: f64) -> bool {
        dose >= self.min && dose <= self.max
    }
}

// ============================================================================
// Requests and Results
// ============================================================================

/// A single-drug calculation request
#[derive(Clone, Debug, PartialEq)]
pub struct DoseRequest {
    pub name: String,
    /// kg
    pub weight: f64,
    /// Absent or zero means "use the default dose"
    pub user_dose: Option<f64>,
}

/// Where the dose shown in a row came from
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DoseSource {
    User,
    Default,
    /// Volume copied from an earlier row; dose back-calculated for display
    MatchedVolume { reference: String },
}

/// One output row per selected drug
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ComputationRow {
    pub drug: String,
    pub concentration: f64,
    pub dose: f64,
    pub volume: f64,
    pub source: DoseSource,
}

/// Human-readable events raised during a calculation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    DefaultDoseUsed {
        drug: String,
        dose: f64,
    },
    OutsideDoseScale {
        drug: String,
        dose: f64,
        min: f64,
        max: f64,
    },
    VolumeMatched {
        drug: String,
        reference: String,
        volume: f64,
    },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::DefaultDoseUsed { drug, dose } => {
                write!(f, "Using the default dose for {} of {} (mg/kg)", drug, dose)
            }
            Notice::OutsideDoseScale {
                drug,
                dose,
                min,
                max,
            } => write!(
                f,
                "Dose {} (mg/kg) for {} is outside its scale of {} to {} (mg/kg)",
                dose, drug, min, max
            ),
            Notice::VolumeMatched {
                drug,
                reference,
                volume,
            } => write!(
                f,
                "Giving {} at the same volume as {} ({} ml)",
                drug, reference, volume
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dose_scale_from_options() {
        let scale = DoseScale::from_options(&[0.1, 0.2, 0.3, 0.4]).unwrap();
        assert_eq!(scale.min, 0.1);
        assert_eq!(scale.max, 0.4);
        assert!((scale.step - 0.1).abs() < 1e-12);
        assert!(scale.contains(0.25));
        assert!(!scale.contains(0.5));
    }

    #[test]
    fn test_dose_scale_edge_lists() {
        assert!(DoseScale::from_options(&[]).is_none());

        let single = DoseScale::from_options(&[2.0]).unwrap();
        assert_eq!(single.min, 2.0);
        assert_eq!(single.max, 2.0);
        assert_eq!(single.step, 0.0);
    }

    #[test]
    fn test_record_accepts_dose_alias() {
        let record: DrugRecord = toml::from_str("concentration = 10.0\ndose = 1.5\n").unwrap();
        assert_eq!(record.default_dose, 1.5);
        assert!(record.dose_scale().is_none());
    }

    #[test]
    fn test_notice_display() {
        let notice = Notice::DefaultDoseUsed {
            drug: "Meloxicam".into(),
            dose: 0.2,
        };
        assert_eq!(
            notice.to_string(),
            "Using the default dose for Meloxicam of 0.2 (mg/kg)"
        );
    }
}
