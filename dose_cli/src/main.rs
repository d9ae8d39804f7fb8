use clap::{Parser, Subcommand};
use dose_core::report::{self, OutputFormat};
use dose_core::*;
use std::borrow::Cow;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "dosecalc")]
#[command(about = "Injectable drug volume calculator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Drug database file (.toml, .yaml or .json)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the volume to give for each selected drug
    Calc {
        /// Animal weight (kg)
        #[arg(long, short, allow_hyphen_values = true)]
        weight: f64,

        /// Drug to include; repeat in the order the drugs should be computed
        #[arg(long = "drug", short = 'd')]
        drugs: Vec<String>,

        /// Dose override as NAME=MG_PER_KG; omitted or zero uses the default
        #[arg(long = "dose", value_parser = parse_dose_override)]
        doses: Vec<(String, f64)>,

        /// Output format (table, csv, json)
        #[arg(long)]
        format: Option<String>,

        /// Decimal places for dose and volume
        #[arg(long)]
        precision: Option<usize>,
    },

    /// List the drugs in the database
    List,

    /// Check the database for problems
    Validate,
}

fn main() -> ExitCode {
    dose_core::logging::init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let database = load_database(cli.database.or_else(|| config.database.path.clone()))?;

    match cli.command {
        Commands::Calc {
            weight,
            drugs,
            doses,
            format,
            precision,
        } => {
            let format = match format {
                Some(f) => f.parse()?,
                None => config.output.format,
            };
            let precision = precision.unwrap_or(config.output.precision);
            cmd_calc(&database, weight, drugs, doses, format, precision)
        }
        Commands::List => cmd_list(&database),
        Commands::Validate => cmd_validate(&database),
    }
}

fn load_database(path: Option<PathBuf>) -> Result<Cow<'static, DrugDatabase>> {
    match path {
        Some(path) => Ok(Cow::Owned(DrugDatabase::load_from(&path)?)),
        None => {
            tracing::warn!("No database file configured, using the built-in sample database");
            Ok(Cow::Borrowed(get_default_database()))
        }
    }
}

fn parse_dose_override(s: &str) -> std::result::Result<(String, f64), String> {
    let (name, value) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing drug name in '{}'", s));
    }
    let dose: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid dose '{}': {}", value, e))?;
    Ok((name.to_string(), dose))
}

fn cmd_calc(
    database: &DrugDatabase,
    weight: f64,
    drugs: Vec<String>,
    doses: Vec<(String, f64)>,
    format: OutputFormat,
    precision: usize,
) -> Result<()> {
    for (name, _) in &doses {
        if !drugs.contains(name) {
            tracing::warn!("Dose given for {} but it is not selected", name);
        }
    }

    let request = BatchRequest {
        weight,
        selected: drugs,
        overrides: doses.into_iter().collect(),
    };

    let batch = evaluate(database, &request)?;

    match format {
        OutputFormat::Table => {
            print_notices(&batch);
            print!("{}", report::render_table(&batch.rows, precision));
            if batch.rows.len() > 1 {
                println!();
                println!("  Total volume: {:.*} ml", precision, batch.total_volume());
            }
        }
        OutputFormat::Csv => {
            print_notices(&batch);
            report::write_csv(io::stdout().lock(), &batch.rows, precision)?;
        }
        OutputFormat::Json => {
            println!("{}", report::to_json(&batch)?);
        }
    }

    Ok(())
}

fn print_notices(batch: &Batch) {
    for notice in &batch.notices {
        eprintln!("ℹ {}", notice);
    }
}

fn cmd_list(database: &DrugDatabase) -> Result<()> {
    if database.is_empty() {
        println!("No drugs in the database.");
        return Ok(());
    }

    for (name, record) in database.iter() {
        print!(
            "  {:<20} {:>8} mg/ml   default {} mg/kg",
            name, record.concentration, record.default_dose
        );
        if let Some(scale) = record.dose_scale() {
            print!("   scale {} to {} step {}", scale.min, scale.max, scale.step);
        }
        if let Some(reference) = dose::reference_for(name) {
            print!("   (same volume as {})", reference);
        }
        println!();
    }

    Ok(())
}

fn cmd_validate(database: &DrugDatabase) -> Result<()> {
    let errors = database.validate();
    if !errors.is_empty() {
        eprintln!("Database validation errors:");
        for error in &errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::DatabaseValidation(format!(
            "{} problem(s) found",
            errors.len()
        )));
    }

    println!("✓ Database OK ({} drugs)", database.len());
    Ok(())
}
