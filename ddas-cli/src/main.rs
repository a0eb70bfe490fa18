//! DDAS hit dump CLI application.
//!
//! Decodes a file of back-to-back DDAS hit records and writes the hits as
//! CSV or JSON lines.

mod output;
mod reader;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use output::{HitWriter, OutputFormat};
use reader::{HitStream, StreamItem};
use std::fs::File;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Decoder for DDAS Pixie-16 hit records.
///
/// The input is a raw file of little-endian 32-bit words holding hit records
/// back to back, each starting with its body size word.
#[derive(Parser, Debug)]
#[command(name = "ddas-dump")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input file of 32-bit words
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file path
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Output format: csv or json (one JSON object per line)
    #[arg(short, long, default_value = "csv")]
    format: String,

    /// Skip bad records by resynchronising one word later instead of stopping
    #[arg(long)]
    skip_bad: bool,

    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Default)]
struct Summary {
    hits: usize,
    warnings: usize,
    skipped: usize,
}

/// Default filter directives for the decoder library and this binary.
fn log_directives(verbose: bool) -> [&'static str; 2] {
    if verbose {
        ["ddas_core=debug", "ddas_dump=debug"]
    } else {
        ["ddas_core=info", "ddas_dump=info"]
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let mut filter = EnvFilter::from_default_env();
    for directive in log_directives(verbose) {
        filter = filter.add_directive(directive.parse()?);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    let format = OutputFormat::from_str(&args.format).context("Invalid output format")?;

    let progress = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .context("Invalid progress template")?,
        );
        pb
    };

    let start_time = Instant::now();

    progress.set_message(format!(
        "Reading {:?}...",
        args.input.file_name().unwrap_or_default()
    ));
    let words = reader::read_words(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    info!(words = words.len(), "loaded input");

    let file = File::create(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    let mut writer = HitWriter::new(file, format);
    writer.write_header().context("Failed to write output")?;

    let mut summary = Summary::default();
    let mut stream = HitStream::new(&words, args.skip_bad);
    for item in stream.by_ref() {
        match item {
            StreamItem::Hit {
                offset,
                hit,
                warning,
            } => {
                writer.write_hit(&hit).context("Failed to write output")?;
                summary.hits += 1;
                if warning.is_some() {
                    summary.warnings += 1;
                }
                if summary.hits % 10_000 == 0 {
                    progress.set_message(format!(
                        "Decoded {} hits (word {} of {})",
                        summary.hits,
                        offset,
                        words.len()
                    ));
                    progress.tick();
                }
            }
            StreamItem::Skipped { offset, error } => {
                summary.skipped += 1;
                if !args.skip_bad {
                    writer.flush().context("Failed to write output")?;
                    progress.abandon();
                    return Err(error)
                        .with_context(|| format!("Bad hit record at word {}", offset));
                }
            }
        }
    }
    writer.flush().context("Failed to write output")?;
    debug!(offset = stream.offset(), "reached end of input");

    let duration = start_time.elapsed();
    progress.finish_with_message(format!(
        "Done! Decoded {} hits in {:.2}s",
        summary.hits,
        duration.as_secs_f64()
    ));

    if !args.quiet {
        eprintln!();
        eprintln!("Summary:");
        eprintln!("  Input:        {:?}", args.input);
        eprintln!("  Output:       {:?}", args.output);
        eprintln!("  Words:        {}", words.len());
        eprintln!("  Hits:         {}", summary.hits);
        eprintln!("  Warnings:     {}", summary.warnings);
        eprintln!("  Skipped:      {}", summary.skipped);
        eprintln!("  Duration:     {:.3}s", duration.as_secs_f64());
    }

    Ok(())
}
