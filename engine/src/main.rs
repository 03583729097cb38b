//! Footfall CLI - Reduce point-of-sale exports to population counts
//!
//! # Main Commands
//!
//! ```bash
//! footfall run PointOfSaleSimulation.csv      # Reduced table, run summary and averages
//! footfall reduce PointOfSaleSimulation.csv   # Deduplicated visits only
//! footfall normalize PointOfSaleSimulation.csv
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! footfall schema PointOfSaleSimulation.csv   # Show resolved header positions
//! footfall slice 35                           # Interval index to clock range
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use footfall::config::{parse_delimiter, Config};
use footfall::logs::{log_info_indent, log_success, LogLevel, LOG_BROADCASTER};
use footfall::output::{
    write_averages, write_file, write_json, write_normalized, write_summary, write_summary_json,
    write_visits,
};
use footfall::transform::pipeline::{extract_and_reduce_with, run_file, PipelineOptions};
use footfall::{
    normalize, read_table_file, resolve, time_slice, AggregationPolicy, OutputError,
    PipelineError,
};
use std::env;
use std::fs::File;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "footfall")]
#[command(about = "Reduce point-of-sale exports to per-interval population counts", long_about = None)]
struct Cli {
    /// Suppress progress output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full pipeline: reduced table, run summary and global averages
    Run {
        /// Input CSV file
        input: PathBuf,

        /// Input field delimiter
        #[arg(short, long, value_parser = parse_delimiter)]
        delimiter: Option<char>,

        /// Reduced table file
        #[arg(long)]
        reduced: Option<PathBuf>,

        /// Run summary file
        #[arg(long)]
        summary: Option<PathBuf>,

        /// Global averages file
        #[arg(long)]
        averages: Option<PathBuf>,

        /// Aggregations to produce
        #[arg(short, long, value_enum, default_value = "both")]
        policy: PolicyArg,

        /// Format of the summary file
        #[arg(short, long, value_enum, default_value = "csv")]
        format: Format,

        /// Keep every line item, even when redundancy columns are present
        #[arg(long)]
        no_dedupe: bool,

        /// Use defaults instead of asking for missing file names
        #[arg(long)]
        no_prompt: bool,
    },

    /// Deduplicated visit table only
    Reduce {
        /// Input CSV file
        input: PathBuf,

        /// Input field delimiter
        #[arg(short, long, value_parser = parse_delimiter)]
        delimiter: Option<char>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: Format,

        /// Keep every line item, even when redundancy columns are present
        #[arg(long)]
        no_dedupe: bool,
    },

    /// Normalized table: date, day index and interval per visit
    Normalize {
        /// Input CSV file
        input: PathBuf,

        /// Input field delimiter
        #[arg(short, long, value_parser = parse_delimiter)]
        delimiter: Option<char>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: Format,
    },

    /// Show the clock range of an interval index
    Slice {
        /// Interval index (0-47)
        #[arg(allow_negative_numbers = true)]
        index: i64,
    },

    /// Show which header positions a file resolves to
    Schema {
        /// Input CSV file
        input: PathBuf,

        /// Input field delimiter
        #[arg(short, long, value_parser = parse_delimiter)]
        delimiter: Option<char>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PolicyArg {
    Runs,
    Global,
    Both,
}

impl PolicyArg {
    fn policies(self) -> Vec<AggregationPolicy> {
        match self {
            PolicyArg::Runs => vec![AggregationPolicy::Runs],
            PolicyArg::Global => vec![AggregationPolicy::Global],
            PolicyArg::Both => vec![AggregationPolicy::Runs, AggregationPolicy::Global],
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Csv,
    Json,
}

/// Exit status for invalid configuration or arguments.
const EXIT_USAGE: i32 = 64;

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            process::exit(EXIT_USAGE);
        }
    };
    let quiet = cli.quiet || config.quiet;
    LOG_BROADCASTER.set_quiet(quiet);

    let result = match cli.command {
        Commands::Run {
            input,
            delimiter,
            reduced,
            summary,
            averages,
            policy,
            format,
            no_dedupe,
            no_prompt,
        } => {
            let options = PipelineOptions {
                delimiter: delimiter.unwrap_or(config.delimiter),
                deduplicate: !no_dedupe,
                policies: policy.policies(),
            };
            let names = OutputNames {
                reduced,
                summary,
                averages,
            };
            let prompt = !no_prompt && io::stdin().is_terminal();
            let mut ask = |what: &str, default: &Path| {
                if prompt {
                    prompt_filename(what, default)
                } else {
                    None
                }
            };
            cmd_run(&input, &options, names, &config, &mut ask, format)
        }

        Commands::Reduce {
            input,
            delimiter,
            output,
            format,
            no_dedupe,
        } => {
            let options = PipelineOptions {
                delimiter: delimiter.unwrap_or(config.delimiter),
                deduplicate: !no_dedupe,
                policies: Vec::new(),
            };
            cmd_reduce(&input, &options, output.as_deref(), format)
        }

        Commands::Normalize {
            input,
            delimiter,
            output,
            format,
        } => {
            let options = PipelineOptions {
                delimiter: delimiter.unwrap_or(config.delimiter),
                policies: Vec::new(),
                ..PipelineOptions::default()
            };
            cmd_normalize(&input, &options, output.as_deref(), format)
        }

        Commands::Slice { index } => match time_slice(index) {
            Ok(slice) => {
                println!("{}", slice);
                Ok(())
            }
            Err(e) => {
                eprintln!("❌ Error: {}", e);
                process::exit(EXIT_USAGE);
            }
        },

        Commands::Schema { input, delimiter } => {
            cmd_schema(&input, delimiter.unwrap_or(config.delimiter))
        }
    };

    if let Err(e) = result {
        if quiet {
            // Warnings leading up to the failure were not shown
            for entry in LOG_BROADCASTER.recent() {
                if entry.level != LogLevel::Info {
                    eprintln!("{}", entry.render());
                }
            }
        }
        eprintln!("❌ Error: {}", e);
        process::exit(e.exit_code());
    }
}

/// Output file names given on the command line.
struct OutputNames {
    reduced: Option<PathBuf>,
    summary: Option<PathBuf>,
    averages: Option<PathBuf>,
}

/// Operator hook returning a file name, `None` to keep the default.
type AskFilename<'a> = dyn FnMut(&str, &Path) -> Option<PathBuf> + 'a;

/// Flag first, then environment, then the operator, then the default.
fn choose_output(
    flag: Option<PathBuf>,
    var: &str,
    configured: &Path,
    what: &str,
    ask: &mut AskFilename,
) -> PathBuf {
    if let Some(path) = flag {
        return path;
    }
    if env::var_os(var).is_some() {
        return configured.to_path_buf();
    }
    ask(what, configured).unwrap_or_else(|| configured.to_path_buf())
}

fn prompt_filename(what: &str, default: &Path) -> Option<PathBuf> {
    eprint!("File name for the {} [{}]: ", what, default.display());
    io::stderr().flush().ok()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer).ok()?;
    let answer = answer.trim();
    (!answer.is_empty()).then(|| PathBuf::from(answer))
}

fn cmd_run(
    input: &Path,
    options: &PipelineOptions,
    names: OutputNames,
    config: &Config,
    ask: &mut AskFilename,
    format: Format,
) -> Result<(), PipelineError> {
    // Everything is computed before the operator is asked for file names.
    let output = run_file(input, options)?;

    let reduced = choose_output(names.reduced, "FOOTFALL_REDUCED_FILE", &config.reduced_file, "reduced table", ask);
    write_file(&reduced, |w| write_visits(w, &output.reduced.visits))?;
    log_success(format!("💾 Reduced table saved to: {}", reduced.display()));

    if let Some(runs) = &output.runs {
        let summary = choose_output(names.summary, "FOOTFALL_SUMMARY_FILE", &config.summary_file, "run summary", ask);
        write_file(&summary, |w| match format {
            Format::Csv => write_summary(w, runs),
            Format::Json => write_summary_json(w, runs),
        })?;
        log_success(format!("💾 Run summary saved to: {}", summary.display()));
    }

    if let Some(global) = &output.global {
        let averages = choose_output(names.averages, "FOOTFALL_AVERAGES_FILE", &config.averages_file, "averages", ask);
        write_file(&averages, |w| match format {
            Format::Csv => write_averages(w, global),
            Format::Json => write_json(w, global),
        })?;
        log_success(format!("💾 Averages saved to: {}", averages.display()));
    }

    log_success("✨ Done!");
    Ok(())
}

fn cmd_reduce(
    input: &Path,
    options: &PipelineOptions,
    output: Option<&Path>,
    format: Format,
) -> Result<(), PipelineError> {
    let file = open_input(input)?;
    let reduced = extract_and_reduce_with(file, options)?;

    emit(output, |w| match format {
        Format::Csv => write_visits(w, &reduced.visits),
        Format::Json => write_json(w, &reduced.visits),
    })
}

fn cmd_normalize(
    input: &Path,
    options: &PipelineOptions,
    output: Option<&Path>,
    format: Format,
) -> Result<(), PipelineError> {
    let file = open_input(input)?;
    let reduced = extract_and_reduce_with(file, options)?;
    let rows = normalize(reduced.visits)?;

    emit(output, |w| match format {
        Format::Csv => write_normalized(w, &rows),
        Format::Json => write_json(w, &rows),
    })
}

fn cmd_schema(input: &Path, delimiter: char) -> Result<(), PipelineError> {
    let table = read_table_file(input, delimiter)?;
    let resolution = resolve(&table.header);

    println!("Encoding: {}", table.encoding);
    for (field, position) in resolution.positions() {
        println!("{:<28} {}", field.header(), position);
    }
    for field in resolution.missing() {
        let status = if field.is_mandatory() { "missing" } else { "absent" };
        println!("{:<28} {}", field.header(), status);
    }
    log_info_indent(
        if resolution.has_witness() {
            "Redundant line items will be collapsed"
        } else {
            "No redundancy columns"
        },
        1,
    );

    resolution.into_schema()?;
    Ok(())
}

fn open_input(path: &Path) -> Result<File, PipelineError> {
    File::open(path).map_err(|source| {
        footfall::InputError::MissingInput {
            path: path.display().to_string(),
            source,
        }
        .into()
    })
}

/// Write to `path`, or to stdout when no path is given.
fn emit<F>(path: Option<&Path>, write: F) -> Result<(), PipelineError>
where
    F: FnOnce(&mut dyn Write) -> Result<(), OutputError>,
{
    match path {
        Some(p) => {
            write_file(p, |w| write(w))?;
            log_success(format!("💾 Saved to: {}", p.display()));
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            write(&mut lock)?;
        }
    }
    Ok(())
}
