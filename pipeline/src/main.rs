//! Tidyload CLI - reshape wide tables and aggregate event logs
//!
//! # Main Commands
//!
//! ```bash
//! tidyload reshape MiddleEastDeath.csv           # Wide ages to long CSV
//! tidyload aggregate events.csv -o charts/data   # Event-log projections
//! tidyload filter-geo world.geojson me.geojson Iraq Yemen
//! ```
//!
//! # Helper Commands
//!
//! ```bash
//! tidyload convert population.xlsx               # First sheet to CSV
//! tidyload parse input.csv                       # Show what was detected
//! tidyload presets                               # Built-in dataset specs
//! ```

use clap::{Parser, Subcommand};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tidyload::logs::{log_error, log_info, log_info_indent, log_success, LogFormat, LOG_SINK};
use tidyload::transform::pipeline::format_delimiter;
use tidyload::transform::PRESET_NAMES;
use tidyload::{
    aggregate_file, convert_spreadsheet, filter_file, parse_cutoff, parse_file_auto, reshape_file,
    AggregateOptions, DatasetSpec, ReshapeOptions,
};

#[derive(Parser)]
#[command(name = "tidyload")]
#[command(about = "Reshape wide demographic tables and aggregate event logs", long_about = None)]
struct Cli {
    /// Silence progress output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Emit progress as one JSON object per line
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reshape a wide table (one column per age) into long format
    Reshape {
        /// Input CSV or spreadsheet
        input: PathBuf,

        /// Built-in dataset preset
        #[arg(short, long, env = "TIDYLOAD_PRESET", default_value = "deaths")]
        preset: String,

        /// Dataset spec JSON file (overrides --preset)
        #[arg(short, long)]
        spec: Option<PathBuf>,

        /// Output file (default: <input stem>_long_format.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Aggregate a weekly event log into projection CSVs
    Aggregate {
        /// Input event-log CSV
        input: PathBuf,

        /// Ignore events before this date (YYYY-MM-DD, inclusive)
        #[arg(short, long, env = "TIDYLOAD_CUTOFF")]
        cutoff: Option<String>,

        /// Directory for the projection CSVs
        #[arg(short, long, env = "TIDYLOAD_OUTPUT_DIR", default_value = ".")]
        output_dir: PathBuf,

        /// Minimum events per country for the yearly projection
        #[arg(long)]
        min_total_events: Option<f64>,

        /// First year of the yearly projection
        #[arg(long)]
        yearly_since: Option<i32>,
    },

    /// Convert the first sheet of a spreadsheet to CSV
    Convert {
        /// Input workbook (.xlsx, .xls, .ods, ...)
        input: PathBuf,
    },

    /// Keep only the GeoJSON features of the given countries
    FilterGeo {
        /// Input GeoJSON file
        input: PathBuf,

        /// Output GeoJSON file
        output: PathBuf,

        /// Country names or ISO codes
        #[arg(required = true)]
        countries: Vec<String>,
    },

    /// Parse a file and show the detected encoding, delimiter and columns
    Parse {
        /// Input CSV or spreadsheet
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the built-in dataset specs as JSON
    Presets,
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if cli.quiet {
        LOG_SINK.set_format(LogFormat::Quiet);
    } else if cli.log_json {
        LOG_SINK.set_format(LogFormat::Json);
    }

    let result = match cli.command {
        Commands::Reshape {
            input,
            preset,
            spec,
            output,
        } => cmd_reshape(&input, preset, spec, output),

        Commands::Aggregate {
            input,
            cutoff,
            output_dir,
            min_total_events,
            yearly_since,
        } => cmd_aggregate(&input, cutoff.as_deref(), &output_dir, min_total_events, yearly_since),

        Commands::Convert { input } => cmd_convert(&input),

        Commands::FilterGeo {
            input,
            output,
            countries,
        } => cmd_filter_geo(&input, &output, &countries),

        Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()),

        Commands::Presets => cmd_presets(),
    };

    if let Err(e) = result {
        log_error(format!("Error: {}", e));
        std::process::exit(1);
    }
}

fn cmd_reshape(
    input: &Path,
    preset: String,
    spec_path: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = ReshapeOptions {
        preset,
        spec_path,
        output,
    };
    reshape_file(input, &options)?;
    Ok(())
}

fn cmd_aggregate(
    input: &Path,
    cutoff: Option<&str>,
    output_dir: &Path,
    min_total_events: Option<f64>,
    yearly_since: Option<i32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = AggregateOptions::default();
    if let Some(raw) = cutoff {
        options.cutoff = parse_cutoff(raw)?;
    }
    if let Some(min) = min_total_events {
        options.min_total_events = min;
    }
    if let Some(year) = yearly_since {
        options.yearly_since = year;
    }

    let summary = aggregate_file(input, output_dir, &options)?;
    log_success(format!(
        "{} of {} events on or after {}",
        summary.recent_events, summary.total_events, options.cutoff
    ));
    Ok(())
}

fn cmd_convert(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let output = convert_spreadsheet(input)?;
    log_success(format!("Converted {} → {}", input.display(), output.display()));
    Ok(())
}

fn cmd_filter_geo(input: &Path, output: &Path, countries: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    filter_file(input, output, countries)?;
    Ok(())
}

fn cmd_parse(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    log_info(format!("📄 Parsing: {}", input.display()));

    let result = parse_file_auto(input)?;
    log_info_indent(format!("Encoding: {}", result.encoding), 1);
    if let Some(d) = result.delimiter {
        log_info_indent(format!("Delimiter: '{}'", format_delimiter(d)), 1);
    }
    log_info_indent(format!("Columns: {}", result.table.headers.join(", ")), 1);
    log_success(format!("Parsed {} rows", result.table.len()));

    let info = json!({
        "encoding": result.encoding,
        "delimiter": result.delimiter.map(|d| d.to_string()),
        "headers": result.table.headers,
        "rowCount": result.table.len(),
    });
    write_output(&serde_json::to_string_pretty(&info)?, output)
}

fn cmd_presets() -> Result<(), Box<dyn std::error::Error>> {
    let mut presets = serde_json::Map::new();
    for name in PRESET_NAMES {
        if let Some(spec) = DatasetSpec::preset(name) {
            presets.insert(name.to_string(), serde_json::to_value(spec)?);
        }
    }
    println!("{}", serde_json::to_string_pretty(&presets)?);
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            log_success(format!("Output written to: {}", p.display()));
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
