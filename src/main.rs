//! PDF Redaction Tool - Command-Line Interface
//! Author: kartik4091
//!
//! Finds sensitive text with a classifier, places it on the page and paints
//! opaque boxes over it. Overlay-only: covered text stays in the file.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Arg, ArgAction, ArgMatches, Command, ValueEnum};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, error, info, warn};

use pdx_redact::classifier::{ChatCompletionClassifier, Classifier, StaticClassifier};
use pdx_redact::report::{write_manifest, RedactionManifest};
use pdx_redact::{
    BoundingBox, Error, LayoutExtractor, ManualRegion, PageRasterizer, RedactionConfig, RedactionPipeline,
    RedactionRecord, Result,
};

lazy_static! {
    static ref MANUAL_REGION: Regex = Regex::new(
        r"^\s*(\d+)\s*:\s*(-?\d+(?:\.\d+)?)\s*,\s*(-?\d+(?:\.\d+)?)\s*,\s*(\d+(?:\.\d+)?)\s*,\s*(\d+(?:\.\d+)?)\s*$"
    )
    .unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Identify, mask and paint overlays (default)
    Redact,
    /// Write the extracted layout as JSON
    Extract,
    /// Write an approximate PNG preview of one page
    Preview,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    /// Error messages only
    Error,
    /// Warning and error messages
    Warn,
    /// Info, warning, and error messages (default)
    Info,
    /// Debug and all messages
    Debug,
    /// Trace and all messages (most verbose)
    Trace,
}

#[tokio::main]
async fn main() {
    let matches = build_cli().get_matches();

    let log_level = matches.get_one::<LogLevel>("verbose").copied().unwrap_or(LogLevel::Info);
    init_logging(log_level);

    info!("🚀 PDF Redaction Tool v{} - Starting...", env!("CARGO_PKG_VERSION"));

    // only files this run created are cleaned up on failure
    let fresh_output = matches
        .get_one::<PathBuf>("output")
        .filter(|output| !output.exists())
        .cloned();
    let start_time = std::time::Instant::now();

    match run(&matches).await {
        Ok(()) => {
            info!("🎉 Completed in {:.2?}", start_time.elapsed());
        }
        Err(e) => {
            error!("❌ {}", e);
            if let Some(output) = fresh_output.filter(|output| output.exists()) {
                if let Err(cleanup_err) = fs::remove_file(&output) {
                    error!("❌ Failed to clean up partial output file: {}", cleanup_err);
                }
            }
            process::exit(1);
        }
    }
}

fn build_cli() -> Command {
    Command::new("pdx-redact")
        .version(env!("CARGO_PKG_VERSION"))
        .author("kartik4091")
        .about("Locate sensitive text in PDF documents and cover it with opaque boxes")
        .long_about(
            "Extracts the text layout of a PDF, asks a classifier for names, ID numbers, \
             phone numbers, addresses and custom keywords, places each finding on the page \
             and paints an opaque rectangle over it in a new PDF.\n\n\
             Redaction is overlay-only: the covered text is NOT removed from the file and \
             can still be extracted by copy/paste or text tools.",
        )
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Input PDF file path")
                .required(true),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Output file path (PDF, JSON layout or PNG depending on mode)")
                .required_unless_present("dry-run"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Configuration file (JSON/YAML)"),
        )
        .arg(
            Arg::new("mode")
                .long("mode")
                .value_parser(clap::value_parser!(Mode))
                .default_value("redact")
                .help("Processing mode"),
        )
        .arg(
            Arg::new("manual")
                .long("manual")
                .value_name("PAGE:LEFT,TOP,WIDTH,HEIGHT")
                .action(ArgAction::Append)
                .help("Extra region to cover, in top-down points (repeatable)"),
        )
        .arg(
            Arg::new("spans")
                .long("spans")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf))
                .help("JSON list of {type, text} used instead of the network classifier"),
        )
        .arg(
            Arg::new("manifest")
                .short('r')
                .long("manifest")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Write a JSON manifest of the redaction records"),
        )
        .arg(
            Arg::new("page")
                .short('p')
                .long("page")
                .value_parser(clap::value_parser!(u32).range(1..))
                .help("Page for preview, or a single page for extract"),
        )
        .arg(
            Arg::new("dpi")
                .long("dpi")
                .value_parser(clap::value_parser!(u32).range(1..=1200))
                .default_value("144")
                .help("Preview resolution"),
        )
        .arg(
            Arg::new("force")
                .long("force")
                .action(ArgAction::SetTrue)
                .help("Force overwrite existing output files"),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .action(ArgAction::SetTrue)
                .help("Identify and report without writing output"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .value_parser(clap::value_parser!(LogLevel))
                .default_value("info")
                .help("Set logging verbosity"),
        )
}

fn init_logging(level: LogLevel) {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    let filter_level = match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::new(format!("pdx_redact={}", filter_level)))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

async fn run(matches: &ArgMatches) -> Result<()> {
    let input = matches
        .get_one::<PathBuf>("input")
        .ok_or_else(|| Error::Config("--input is required".into()))?;
    let output = matches.get_one::<PathBuf>("output");
    let mode = matches.get_one::<Mode>("mode").copied().unwrap_or(Mode::Redact);
    let dry_run = matches.get_flag("dry-run");

    if !input.exists() {
        return Err(Error::Parse(format!("Input file does not exist: {}", input.display())));
    }
    if let Some(output) = output {
        if output.exists() && !matches.get_flag("force") && !dry_run {
            return Err(Error::Write(format!(
                "Output file already exists: {} (use --force to overwrite)",
                output.display()
            )));
        }
    }

    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => RedactionConfig::load(path)?,
        None => RedactionConfig::default(),
    };

    match mode {
        Mode::Extract => extract(input, output, matches.get_one::<u32>("page").copied(), dry_run),
        Mode::Preview => {
            let page = matches.get_one::<u32>("page").copied().unwrap_or(1);
            let dpi = matches.get_one::<u32>("dpi").copied().unwrap_or(144);
            preview(input, output, page, dpi, dry_run)
        }
        Mode::Redact => {
            let manual = parse_manual_regions(matches)?;
            redact(matches, config, input, output, &manual, dry_run).await
        }
    }
}

fn extract(input: &Path, output: Option<&PathBuf>, page: Option<u32>, dry_run: bool) -> Result<()> {
    let extractor = LayoutExtractor::new();
    let pages = match page {
        Some(number) => vec![extractor.extract_page(input, number)?],
        None => extractor.extract(input)?,
    };
    info!(
        "📄 Extracted {} pages, {} runs",
        pages.len(),
        pages.iter().map(|p| p.runs.len()).sum::<usize>()
    );

    let json = serde_json::to_string_pretty(&pages).map_err(Error::write)?;
    match (output, dry_run) {
        (Some(output), false) => fs::write(output, json).map_err(Error::write),
        _ => {
            println!("{}", json);
            Ok(())
        }
    }
}

fn preview(input: &Path, output: Option<&PathBuf>, page: u32, dpi: u32, dry_run: bool) -> Result<()> {
    let png = PageRasterizer::new().rasterize(input, page, dpi);
    if png.is_empty() {
        return Err(Error::Write(format!("Could not render page {}", page)));
    }
    info!("🖼️ Rendered page {} at {} dpi ({} bytes)", page, dpi, png.len());
    match (output, dry_run) {
        (Some(output), false) => fs::write(output, png).map_err(Error::write),
        _ => Ok(()),
    }
}

async fn redact(
    matches: &ArgMatches,
    config: RedactionConfig,
    input: &Path,
    output: Option<&PathBuf>,
    manual: &[ManualRegion],
    dry_run: bool,
) -> Result<()> {
    let classifier: Arc<dyn Classifier> = match matches.get_one::<PathBuf>("spans") {
        Some(path) => {
            info!("📋 Using classifier spans from {}", path.display());
            Arc::new(StaticClassifier::from_json(&fs::read_to_string(path)?)?)
        }
        None => Arc::new(ChatCompletionClassifier::new(config.classifier.clone())?),
    };

    display_config_summary(&config, input, output, manual.len());
    let pipeline = RedactionPipeline::new(config, classifier);
    let manifest_path = matches.get_one::<PathBuf>("manifest");

    let (records, output) = match (output, dry_run) {
        (Some(output), false) => {
            let outcome = pipeline.execute(input, output, manual).await?;
            (outcome.records, Some(output.as_path()))
        }
        _ => {
            info!("🔍 Dry run mode - no files will be modified");
            let spans = pipeline.identify(input).await?;
            (pipeline.records(&spans, manual), None)
        }
    };

    display_records(&records);
    warn!("⚠️  Overlay-only redaction: covered text remains extractable from the output");

    if let Some(manifest_path) = manifest_path {
        let manifest = RedactionManifest::new(input, output, records)?;
        write_manifest(&manifest, manifest_path)?;
    }
    Ok(())
}

fn parse_manual_regions(matches: &ArgMatches) -> Result<Vec<ManualRegion>> {
    matches
        .get_many::<String>("manual")
        .into_iter()
        .flatten()
        .map(|value| parse_manual_region(value))
        .collect()
}

fn parse_manual_region(value: &str) -> Result<ManualRegion> {
    let captures = MANUAL_REGION
        .captures(value)
        .ok_or_else(|| Error::Config(format!("Invalid manual region '{}', expected PAGE:LEFT,TOP,WIDTH,HEIGHT", value)))?;
    let number = |i: usize| -> Result<f64> {
        captures[i]
            .parse::<f64>()
            .map_err(|e| Error::Config(format!("Invalid number in '{}': {}", value, e)))
    };
    let page = captures[1]
        .parse::<u32>()
        .map_err(|e| Error::Config(format!("Invalid page in '{}': {}", value, e)))?;
    if page == 0 {
        return Err(Error::Config(format!("Pages are numbered from 1 in '{}'", value)));
    }
    Ok(ManualRegion::new(
        page,
        BoundingBox::new(number(2)?, number(3)?, number(4)?, number(5)?),
    ))
}

fn display_config_summary(config: &RedactionConfig, input: &Path, output: Option<&PathBuf>, manual: usize) {
    info!("📋 Configuration Summary:");
    info!("   Input:  {}", input.display());
    if let Some(output) = output {
        info!("   Output: {}", output.display());
    }
    let categories: Vec<String> = config
        .enabled_categories()
        .categories()
        .iter()
        .map(|c| c.to_string())
        .collect();
    info!("   Categories: {}", categories.join(", "));
    info!("   Match policy: {:?} (> {})", config.matching.policy, config.matching.threshold);
    if manual > 0 {
        info!("   Manual regions: {}", manual);
    }
}

fn display_records(records: &[RedactionRecord]) {
    info!("📊 Redaction Records ({}):", records.len());
    for record in records {
        info!("{}", record_line(record));
        debug!("   original text: {}", record.original_text);
    }
}

/// Summary line for a record; carries only the masked text
fn record_line(record: &RedactionRecord) -> String {
    format!(
        "   [{}] {}  page {} {}",
        record.category, record.masked_text, record.page, record.position
    )
}
