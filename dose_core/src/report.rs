//! Rendering computed rows for display.
//!
//! Rows can be shown as an aligned text table, written as CSV, or
//! serialized to JSON together with the notices of the pass.

use crate::{Batch, ComputationRow, Error, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::str::FromStr;

const HEADERS: [&str; 4] = [
    "Drug",
    "Concentration (mg/ml)",
    "Dose (mg/kg)",
    "Volume to Give (ml)",
];

/// Output format for calculation results
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            other => Err(Error::InvalidInput(format!(
                "unknown output format '{}' (expected table, csv or json)",
                other
            ))),
        }
    }
}

/// A row in the CSV output
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Drug")]
    drug: &'a str,
    #[serde(rename = "Concentration (mg/ml)")]
    concentration: String,
    #[serde(rename = "Dose (mg/kg)")]
    dose: String,
    #[serde(rename = "Volume to Give (ml)")]
    volume: String,
}

impl<'a> CsvRow<'a> {
    fn new(row: &'a ComputationRow, precision: usize) -> Self {
        CsvRow {
            drug: &row.drug,
            concentration: row.concentration.to_string(),
            dose: format!("{:.*}", precision, row.dose),
            volume: format!("{:.*}", precision, row.volume),
        }
    }
}

fn cells(row: &ComputationRow, precision: usize) -> [String; 4] {
    [
        row.drug.clone(),
        row.concentration.to_string(),
        format!("{:.*}", precision, row.dose),
        format!("{:.*}", precision, row.volume),
    ]
}

/// Render rows as an aligned text table
///
/// Dose and volume are rounded to `precision` decimal places;
/// concentration is shown as configured.
pub fn render_table(rows: &[ComputationRow], precision: usize) -> String {
    let body: Vec<[String; 4]> = rows.iter().map(|row| cells(row, precision)).collect();

    let mut widths = HEADERS.map(str::len);
    for line in &body {
        for (width, cell) in widths.iter_mut().zip(line) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header: Vec<String> = HEADERS
        .iter()
        .zip(widths)
        .map(|(h, w)| format!("{:<w$}", h, w = w))
        .collect();
    out.push_str(header.join("  ").trim_end());
    out.push('\n');

    let rule: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
    out.push_str(&rule.join("  "));
    out.push('\n');

    for line in &body {
        // Drug name left-aligned, numbers right-aligned
        let formatted: Vec<String> = line
            .iter()
            .zip(widths)
            .enumerate()
            .map(|(i, (cell, w))| {
                if i == 0 {
                    format!("{:<w$}", cell, w = w)
                } else {
                    format!("{:>w$}", cell, w = w)
                }
            })
            .collect();
        out.push_str(formatted.join("  ").trim_end());
        out.push('\n');
    }

    out
}

/// Write rows as CSV with a header line
pub fn write_csv<W: Write>(writer: W, rows: &[ComputationRow], precision: usize) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    writer.write_record(HEADERS)?;
    for row in rows {
        writer.serialize(CsvRow::new(row, precision))?;
    }
    writer.flush()?;
    Ok(())
}

/// Serialize a whole pass (rows and notices) as pretty JSON
pub fn to_json(batch: &Batch) -> Result<String> {
    Ok(serde_json::to_string_pretty(batch)?)
}
