//! Error types for the dose_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for dose_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Drug name is not present in the database
    #[error("Drug '{name}' is not in the database")]
    UnknownDrug { name: String },

    /// A volume-matched drug was evaluated before its reference drug
    #[error("Drug '{drug}' requires '{reference}' to be selected and computed before it")]
    MissingDependency { drug: String, reference: String },

    /// Concentration of zero makes the volume undefined
    #[error("Volume for '{drug}' is undefined: concentration is zero")]
    DivisionUndefined { drug: String },

    /// Concentration is negative or not a finite number
    #[error("Concentration {concentration} for '{drug}' must be a positive number")]
    InvalidConcentration { drug: String, concentration: f64 },

    /// Caller-supplied value rejected before computation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database validation error
    #[error("Database validation error: {0}")]
    DatabaseValidation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_drug() {
        let err = Error::UnknownDrug {
            name: "Ketamine".into(),
        };
        assert!(err.to_string().contains("Ketamine"));

        let err = Error::MissingDependency {
            drug: "Atipamezole".into(),
            reference: "Dexmedetomidine".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Atipamezole"));
        assert!(msg.contains("Dexmedetomidine"));
    }
}
