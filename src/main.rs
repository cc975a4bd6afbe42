//! imagemin CLI - batch image conversion and optimization
//!
//! Converts every qualifying image below a source directory to WebP or
//! JPEG, downscaled to a maximum dimension.

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use imagemin::{
    BatchConverter, BatchReport, CodecRegistry, Config, FileOutcome, ImageminError, TargetFormat,
    init_with_config,
};

/// imagemin - image conversion and optimization
#[derive(Parser)]
#[command(
    name = "imagemin",
    version,
    about = "A tool for batch image conversion and optimization",
    long_about = "Walks the source directory recursively, downscales every qualifying image so \
                  its longer side fits --max_size, and writes it to the target directory as \
                  WebP (from JPEG/PNG/HEIC) or JPEG (from WebP/HEIC)."
)]
struct Cli {
    /// Source (input) directory
    #[arg(value_name = "SOURCE")]
    source_directory: Option<PathBuf>,

    /// Target (output) directory
    #[arg(value_name = "TARGET")]
    destination_directory: Option<PathBuf>,

    /// Conversion type: "webp" or "jpg" [default: webp]
    #[arg(long, value_name = "TYPE")]
    conversion: Option<String>,

    /// Maximum image size, width or height [default: 1600]
    #[arg(long = "max_size", visible_alias = "max-size", value_name = "PIXELS")]
    max_size: Option<u32>,

    /// Output quality (1-100) [default: 85]
    #[arg(short, long, value_name = "QUALITY")]
    quality: Option<u8>,

    /// Recreate source subdirectories in the target instead of flattening
    #[arg(long)]
    preserve_structure: bool,

    /// Configuration file path (.toml or .yaml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print one JSON object per processed file
    #[arg(long)]
    json: bool,

    /// Show codec support and exit
    #[arg(long)]
    codecs: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short = 'Q', long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        let message = match e.downcast_ref::<ImageminError>() {
            Some(err) => err.user_message(),
            None => format!("{:#}", e),
        };
        eprintln!("{}: {}", style("Error").red().bold(), message);
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = build_config(&cli)?;
    init_with_config(&config)?;
    debug!("Effective configuration: {:?}", config.conversion);

    let codecs = CodecRegistry::new()?;
    if cli.codecs {
        show_codecs(&codecs, cli.json)?;
        return Ok(());
    }

    if !codecs.supports_heic() && config.conversion.target.accepts_heic() {
        warn!("Built without the `heic` feature: a tree containing .heic files will be refused");
    }

    let request = config.request(
        cli.source_directory.clone().unwrap_or_default(),
        cli.destination_directory.clone().unwrap_or_default(),
    );
    let converter = BatchConverter::new(codecs);

    let progress = if !cli.json && !cli.quiet && Term::stderr().is_term() {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {pos} files {msg}")?
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    } else {
        None
    };

    let report = converter.convert_with(&request, |outcome| {
        let line = render_outcome(outcome, cli.json);
        match &progress {
            Some(pb) => {
                pb.suspend(|| println!("{}", line));
                pb.inc(1);
            }
            None if cli.quiet && outcome.is_converted() => {}
            None => println!("{}", line),
        }
    })?;

    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }

    if !cli.json && !cli.quiet {
        print_summary(&report);
    }

    Ok(())
}

/// Merge the config file (if any) with command line overrides
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(conversion) = &cli.conversion {
        config.conversion.target = conversion.parse::<TargetFormat>()?;
    }
    if let Some(max_size) = cli.max_size {
        config.conversion.max_size = max_size;
    }
    if let Some(quality) = cli.quality {
        config.conversion.quality = quality;
    }
    if cli.preserve_structure {
        config.conversion.preserve_structure = true;
    }

    if std::env::var_os("RUST_LOG").is_none() {
        if cli.quiet {
            config.logging.level = "error".to_string();
        } else if cli.verbose {
            config.logging.level = "debug".to_string();
        }
    }

    Ok(config)
}

fn render_outcome(outcome: &FileOutcome, json: bool) -> String {
    if json {
        return serde_json::to_string(outcome).unwrap_or_else(|e| {
            format!("{{\"status\":\"failed\",\"reason\":\"serialization error: {}\"}}", e)
        });
    }

    match outcome {
        FileOutcome::Converted { .. } => outcome.message(),
        FileOutcome::Failed { .. } => style(outcome.message()).red().to_string(),
    }
}

/// Show codec availability
fn show_codecs(codecs: &CodecRegistry, json: bool) -> anyhow::Result<()> {
    let capabilities = codecs.capabilities();

    if json {
        println!("{}", serde_json::to_string(&capabilities)?);
        return Ok(());
    }

    println!("{}", style("Codec Support:").bold());
    for codec in &capabilities {
        let mark = |supported: bool| if supported { style("yes").green() } else { style("no").red() };
        println!(
            "  {:<5} decode: {}  encode: {}",
            codec.name,
            mark(codec.decode),
            mark(codec.encode)
        );
    }

    if !codecs.supports_heic() {
        println!();
        println!("Rebuild with {} to enable HEIC input", style("--features heic").dim());
    }

    Ok(())
}

/// Print processing summary
fn print_summary(report: &BatchReport) {
    println!();
    println!("{}", style("Processing Summary:").bold());
    println!("  {}: {}", style("Converted").green(), report.converted());
    if report.failed() > 0 {
        println!("  {}: {}", style("Failed").red(), report.failed());
    }
    if report.skipped > 0 {
        println!("  {}: {}", style("Skipped").dim(), report.skipped);
    }
    if !report.collisions.is_empty() {
        println!("  {}: {}", style("Overwritten").yellow(), report.collisions.len());
        for path in &report.collisions {
            println!("    {}", path.display());
        }
    }
    println!("  {}: {:.2}s", style("Duration").blue(), report.duration_secs);
    println!(
        "  {}: {:.2}MB written",
        style("Size").cyan(),
        report.total_output_bytes() as f64 / 1024.0 / 1024.0
    );
}
