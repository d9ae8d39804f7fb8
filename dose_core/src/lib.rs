#![forbid(unsafe_code)]

//! Core domain model and calculation logic for the dose calculator.
//!
//! This crate provides:
//! - Domain types (drug records, dose scales, computation rows, notices)
//! - Drug database loading and validation
//! - Dose resolution and volume computation
//! - Batch evaluation over a selection of drugs
//! - Report rendering (table, CSV, JSON)

pub mod types;
pub mod error;
pub mod database;
pub mod config;
pub mod logging;
pub mod dose;
pub mod batch;
pub mod report;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use database::{get_default_database, DrugDatabase};
pub use config::Config;
pub use dose::{compute_row, compute_volume, match_volume, resolve_dose, Resolution};
pub use batch::{evaluate, Batch, BatchRequest};
pub use report::OutputFormat;
