use clap::{ArgAction, Parser, Subcommand};
use color_eyre::Result;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use hvac_classifier::bas::{self, Standard};
use hvac_classifier::classify::Classifier;
use hvac_classifier::export::{export_csv, export_json};
use hvac_classifier::inventory::Inventory;
use hvac_classifier::model::Conversion;
use hvac_classifier::parser::load_ifc_file;
use hvac_classifier::rules::Rules;

#[derive(Parser, Debug)]
#[command(name = "hvac-classifier")]
#[command(about = "HVAC Classifier - locate HVAC equipment in IFC models and derive BAS codes")]
#[command(version)]
struct Args {
    /// More log output (-v info, -vv debug, -vvv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify the HVAC elements of an IFC file
    Classify {
        /// Path to IFC file
        file: PathBuf,

        /// BAS standard for the generated codes (amev or vdi)
        #[arg(long, default_value = "amev")]
        standard: Standard,

        /// Include elements without electronic control
        #[arg(long)]
        all: bool,

        /// JSON file overriding the classification tables
        #[arg(long, value_name = "FILE")]
        rules: Option<PathBuf>,

        /// Export flat results to CSV
        #[arg(long, value_name = "FILE")]
        csv: Option<PathBuf>,

        /// Export the full run (flat results and hierarchy) to JSON
        #[arg(long, value_name = "FILE")]
        json: Option<PathBuf>,
    },

    /// Convert a BAS code between AMEV and VDI layouts
    Convert {
        code: String,

        #[arg(long)]
        from: String,

        #[arg(long)]
        to: String,

        /// Print the conversion record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Count HVAC elements per type
    Stats {
        file: PathBuf,

        #[arg(long, value_name = "FILE")]
        rules: Option<PathBuf>,

        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// List HVAC elements whose name matches a regular expression
    Search {
        file: PathBuf,

        /// Case-insensitive regular expression
        pattern: String,

        #[arg(long, value_name = "FILE")]
        rules: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Classify {
            file,
            standard,
            all,
            rules,
            csv,
            json,
        } => classify(
            &file,
            standard,
            all,
            rules.as_deref(),
            csv.as_deref(),
            json.as_deref(),
        ),
        Command::Convert {
            code,
            from,
            to,
            json,
        } => convert(&code, &from, &to, json),
        Command::Stats { file, rules, json } => stats(&file, rules.as_deref(), json),
        Command::Search {
            file,
            pattern,
            rules,
        } => search(&file, &pattern, rules.as_deref()),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_rules(path: Option<&Path>) -> Result<Rules> {
    Ok(match path {
        Some(path) => Rules::load(path)?,
        None => Rules::default(),
    })
}

fn classify(
    file: &Path,
    standard: Standard,
    all: bool,
    rules: Option<&Path>,
    csv: Option<&Path>,
    json: Option<&Path>,
) -> Result<()> {
    let rules = load_rules(rules)?;
    let model = load_ifc_file(file)?;
    let run = Classifier::new(&model, &rules).classify_all(standard, !all);

    if let Some(csv_path) = csv {
        export_csv(&run, csv_path)?;
        println!("Exported to CSV: {}", csv_path.display());
    }

    if let Some(json_path) = json {
        export_json(&run, json_path)?;
        println!("Exported to JSON: {}", json_path.display());
    }

    if csv.is_some() || json.is_some() {
        return Ok(());
    }

    for result in &run.flat_results {
        let place = result.location.as_ref().map_or_else(String::new, |l| {
            format!("{} / {}", l.storey_name_or_empty(), l.space_name_or_empty())
        });
        println!(
            "{:<45} {:<30} {:<28} {}",
            result.bas_code, result.element_name, result.element_type, place
        );
    }
    println!(
        "{} elements classified ({} electronic), {} skipped",
        run.flat_results.len(),
        run.electronic_count(),
        run.diagnostics.len()
    );
    Ok(())
}

fn convert(code: &str, from: &str, to: &str, json: bool) -> Result<()> {
    if json {
        let conversion = Conversion::new(code, from.parse()?, to.parse()?);
        println!("{}", serde_json::to_string_pretty(&conversion)?);
    } else {
        println!("{}", bas::convert_named(code, from, to)?);
    }
    Ok(())
}

fn stats(file: &Path, rules: Option<&Path>, json: bool) -> Result<()> {
    let rules = load_rules(rules)?;
    let model = load_ifc_file(file)?;
    let stats = Inventory::new(&model, &rules).statistics();

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!(
        "{} HVAC elements, {} electronic ({:.1}%)",
        stats.total_elements,
        stats.electronic_elements,
        stats.electronic_percentage()
    );
    for (element_type, count) in &stats.by_type {
        println!(
            "  {element_type:<30} {:>6} {:>6}",
            count.total, count.electronic
        );
    }
    Ok(())
}

fn search(file: &Path, pattern: &str, rules: Option<&Path>) -> Result<()> {
    let rules = load_rules(rules)?;
    let model = load_ifc_file(file)?;

    for element in Inventory::new(&model, &rules).search_by_name(pattern)? {
        let marker = if element.is_electronic { "*" } else { " " };
        println!(
            "{marker} #{:<8} {:<30} {}",
            element.element_id, element.element_type, element.element_name
        );
    }
    Ok(())
}
