use anyhow::{Context, Result};
use clap::Parser;
use json_tools_core::{
    flatten, generate_schema, parse, paths_with_types, print, remove_empty_strings, remove_nulls,
    replace_keys, replace_values, Pipeline,
};
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

/// One action per invocation; when several action flags are given, the last
/// one on the command line wins. The two filter flags (`-e`, `-n`) compose
/// with each other and run as a single pass.
#[derive(Parser)]
#[command(name = "json-tools")]
#[command(about = "Structural JSON transformations: flatten, filter, rewrite, and schema inference")]
#[command(version)]
struct Cli {
    /// Input file, or `-` for stdin
    input: String,

    /// Flatten the document to dotted/bracketed key paths
    #[arg(
        short = 'f',
        long,
        overrides_with_all = ["schema", "remove_empty", "remove_nulls", "replace_keys", "replace_values"]
    )]
    flatten: bool,

    /// Generate a Draft-07 JSON Schema (arrays merge per element)
    #[arg(
        short = 's',
        long,
        overrides_with_all = ["flatten", "remove_empty", "remove_nulls", "replace_keys", "replace_values"]
    )]
    schema: bool,

    /// Remove empty-string values recursively
    #[arg(
        short = 'e',
        long = "remove-empty",
        overrides_with_all = ["flatten", "schema", "replace_keys", "replace_values"]
    )]
    remove_empty: bool,

    /// Remove null values recursively
    #[arg(
        short = 'n',
        long = "remove-nulls",
        overrides_with_all = ["flatten", "schema", "replace_keys", "replace_values"]
    )]
    remove_nulls: bool,

    /// Replace matching object keys (whole-key replacement)
    #[arg(
        short = 'r',
        long = "replace-keys",
        num_args = 2,
        value_names = ["PATTERN", "REPLACEMENT"],
        overrides_with_all = ["flatten", "schema", "remove_empty", "remove_nulls", "replace_values"]
    )]
    replace_keys: Option<Vec<String>>,

    /// Replace matching string values (whole-value replacement)
    #[arg(
        short = 'v',
        long = "replace-values",
        num_args = 2,
        value_names = ["PATTERN", "REPLACEMENT"],
        overrides_with_all = ["flatten", "schema", "remove_empty", "remove_nulls", "replace_keys"]
    )]
    replace_values: Option<Vec<String>>,

    /// Worker threads for batch inputs; omit the value for auto
    #[arg(short = 't', long, num_args = 0..=1, default_missing_value = "0", value_name = "N")]
    threads: Option<usize>,

    /// Pretty-print the output (two-space indentation)
    #[arg(short = 'p', long)]
    pretty: bool,

    /// Write output to a file instead of stdout
    #[arg(short = 'o', long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Enable verbose logging (sets log level to debug)
    #[arg(long)]
    verbose: bool,

    /// Extra paths-with-types action (no short flag in the classic surface)
    #[arg(
        long = "paths-with-types",
        overrides_with_all = ["flatten", "schema", "remove_empty", "remove_nulls", "replace_keys", "replace_values"]
    )]
    paths_with_types: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing — logs go to stderr so stdout stays clean for JSON
    let log_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    let input = read_input(&cli.input)?;

    let output = if cli.flatten {
        flatten(&input, cli.pretty, cli.threads).context("Flatten failed")?
    } else if cli.schema {
        generate_schema(&input, cli.pretty, cli.threads).context("Schema generation failed")?
    } else if cli.paths_with_types {
        paths_with_types(&input).context("Path extraction failed")?
    } else if let Some(args) = &cli.replace_keys {
        replace_keys(&input, &args[0], &args[1], cli.pretty).context("Key replacement failed")?
    } else if let Some(args) = &cli.replace_values {
        replace_values(&input, &args[0], &args[1], cli.pretty)
            .context("Value replacement failed")?
    } else if cli.remove_empty && cli.remove_nulls {
        Pipeline::new()
            .add_json(&input)
            .context("Parse failed")?
            .remove_empty_strings()
            .remove_nulls()
            .pretty_print(cli.pretty)
            .build()
            .context("Filtering failed")?
    } else if cli.remove_empty {
        remove_empty_strings(&input, cli.pretty).context("Filtering failed")?
    } else if cli.remove_nulls {
        remove_nulls(&input, cli.pretty).context("Filtering failed")?
    } else {
        // No action: validate and re-serialize.
        let v = parse(&input).context("Parse failed")?;
        print(&v, cli.pretty).context("Serialization failed")?.into_bytes()
    };

    write_output(&output, cli.output.as_ref())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Read the input document from a file or stdin (`-`).
fn read_input(input: &str) -> Result<Vec<u8>> {
    if input == "-" {
        let mut bytes = Vec::new();
        io::stdin()
            .read_to_end(&mut bytes)
            .context("Failed to read stdin")?;
        Ok(bytes)
    } else {
        fs::read(input).with_context(|| format!("Failed to read input file: {input}"))
    }
}

/// Write the result to stdout or `--output`, with a trailing newline.
fn write_output(bytes: &[u8], path: Option<&PathBuf>) -> Result<()> {
    let mut writer: Box<dyn Write> = if let Some(p) = path {
        let file = File::create(p)
            .with_context(|| format!("Failed to create output file: {}", p.display()))?;
        Box::new(BufWriter::new(file))
    } else {
        Box::new(BufWriter::new(io::stdout()))
    };
    writer.write_all(bytes).context("Failed to write output")?;
    writeln!(writer).context("Failed to write trailing newline")?;
    Ok(())
}
