//! Command-line host for the XPath transformer.
//!
//! Reads XML values from files or stdin, runs the configured expressions
//! over each value, and writes one output record per value.

use std::fs;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{ArgAction, Parser, ValueEnum};
use serde::Serialize;

use xmlselect::config::{ConfigError, ExtractConfig};
use xmlselect::extract::{OutputColumn, TracingReporter, XPathTransformer};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Select values from XML using a number of XPath expressions.
///
/// Each input file is one row, unless --lines is given, in which case each
/// line is one row. With no files, stdin is read.
#[derive(Parser, Debug)]
#[command(name = "xmlselect", version, about, long_about = None)]
struct Cli {
    /// Input files (use `-` for stdin).
    files: Vec<PathBuf>,

    /// Name of the input field, used in output column names [default: xml].
    #[arg(long, value_name = "NAME")]
    column: Option<String>,

    /// XPath expression to evaluate; repeat for several columns.
    #[arg(long = "xpath", value_name = "EXPR")]
    xpaths: Vec<String>,

    /// JSON configuration file. --column and --xpath add to it.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Treat every input line as a separate row.
    #[arg(long)]
    lines: bool,

    /// Print the output columns and exit.
    #[arg(long)]
    describe: bool,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Log more; repeat for more detail. `RUST_LOG` overrides.
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Log errors only.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// One JSON array per row holding `{"column", "values"}` objects in
    /// column order.
    Json,
    /// Tab-separated columns; a cell's values are joined with `|`.
    Tsv,
}

// ---------------------------------------------------------------------------
// Exit codes
// ---------------------------------------------------------------------------

const EXIT_SUCCESS: u8 = 0;
const EXIT_IO_ERROR: u8 = 1;
const EXIT_CONFIG_ERROR: u8 = 2;

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("xmlselect: {e}");
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    let transformer = XPathTransformer::new(&config, Arc::new(TracingReporter));
    let columns = transformer.output_columns();

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    if cli.describe {
        let written = describe(&mut out, cli.format, &columns).and_then(|()| out.flush());
        return ExitCode::from(finish(written));
    }

    let (inputs, mut exit) = read_inputs(&cli);
    let rows: Vec<Option<&str>> = if cli.lines {
        inputs
            .iter()
            .flat_map(|text| text.lines())
            .map(Some)
            .collect()
    } else {
        inputs.iter().map(|text| Some(text.as_str())).collect()
    };
    tracing::debug!(rows = rows.len(), "read input rows");

    let results = transformer.transform_batch(&rows);
    let written = write_rows(&mut out, cli.format, &columns, &results).and_then(|()| out.flush());
    if finish(written) != EXIT_SUCCESS {
        exit = EXIT_IO_ERROR;
    }
    ExitCode::from(exit)
}

fn init_logging(cli: &Cli) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .init();
}

/// Loads the config file, if any, then applies the command-line options.
fn build_config(cli: &Cli) -> Result<ExtractConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => ExtractConfig::from_path(path)?,
        None => ExtractConfig::new("xml"),
    };
    if let Some(column) = &cli.column {
        config.column.clone_from(column);
    }
    config.expressions.extend(cli.xpaths.iter().cloned());
    config.validate()?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Input reading
// ---------------------------------------------------------------------------

/// Reads every input. Unreadable inputs are reported and skipped.
fn read_inputs(cli: &Cli) -> (Vec<String>, u8) {
    let stdin_only = [PathBuf::from("-")];
    let files: &[PathBuf] = if cli.files.is_empty() {
        &stdin_only
    } else {
        &cli.files
    };

    let mut exit = EXIT_SUCCESS;
    let mut inputs = Vec::with_capacity(files.len());
    for file in files {
        match read_input(file) {
            Ok(text) => inputs.push(text),
            Err(e) => {
                eprintln!("{}: failed to read: {e}", file.display());
                exit = EXIT_IO_ERROR;
            }
        }
    }
    (inputs, exit)
}

/// Reads input from a file or stdin (when the path is `-`).
fn read_input(path: &Path) -> io::Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        fs::read_to_string(path)
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// One cell of a JSON row. Rows are arrays rather than objects because two
/// columns share a name when an expression is repeated.
#[derive(Serialize)]
struct Cell<'a> {
    column: &'a str,
    values: &'a [String],
}

fn describe(out: &mut impl Write, format: OutputFormat, columns: &[OutputColumn]) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, columns)?;
            writeln!(out)
        }
        OutputFormat::Tsv => {
            for column in columns {
                writeln!(out, "{}\t{}", column.name, column.kind)?;
            }
            Ok(())
        }
    }
}

fn write_rows(
    out: &mut impl Write,
    format: OutputFormat,
    columns: &[OutputColumn],
    rows: &[Vec<Vec<String>>],
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            for cells in rows {
                let record: Vec<Cell<'_>> = columns
                    .iter()
                    .zip(cells)
                    .map(|(column, values)| Cell {
                        column: &column.name,
                        values,
                    })
                    .collect();
                serde_json::to_writer(&mut *out, &record)?;
                writeln!(out)?;
            }
        }
        OutputFormat::Tsv => {
            let header: Vec<String> = columns.iter().map(|c| tsv_escape(&c.name)).collect();
            writeln!(out, "{}", header.join("\t"))?;
            for cells in rows {
                let fields: Vec<String> = cells
                    .iter()
                    .map(|cell| {
                        let values: Vec<String> = cell.iter().map(|v| tsv_escape(v)).collect();
                        values.join("|")
                    })
                    .collect();
                writeln!(out, "{}", fields.join("\t"))?;
            }
        }
    }
    Ok(())
}

/// Escapes the characters that would break a TSV field.
fn tsv_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '\t' => escaped.push_str("\\t"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '|' => escaped.push_str("\\|"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Maps the outcome of writing the output to an exit code.
fn finish(result: io::Result<()>) -> u8 {
    match result {
        Ok(()) => EXIT_SUCCESS,
        // A closed pipe is not an error for a filter.
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("xmlselect: failed to write output: {e}");
            EXIT_IO_ERROR
        }
    }
}
