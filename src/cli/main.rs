use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use dream_png::{config, naming, pipeline, png};

#[derive(Parser, Debug)]
#[command(
    name = "dream-png",
    version,
    about = "Name generated images sequentially and read or write their prompt metadata"
)]
struct Cli {
    /// PNG files or directories to show metadata for
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Path to config file (default: config.json next to binary)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Initialize a default config.json and exit
    #[arg(long)]
    init: bool,

    /// Output directory (overrides the config file)
    #[arg(short, long, value_name = "DIR")]
    outdir: Option<PathBuf>,

    /// Print the next unused filename prefix in the output directory and exit
    #[arg(long = "next-prefix")]
    next_prefix: bool,

    /// Save an existing image into the output directory with prompt metadata
    #[arg(long, value_name = "IMAGE", requires = "prompt")]
    import: Option<PathBuf>,

    /// Prompt text stored under `Dream` (used with --import)
    #[arg(long, value_name = "TEXT")]
    prompt: Option<String>,

    /// JSON object stored under `sd-metadata` (used with --import)
    #[arg(long, value_name = "JSON", default_value = "{}")]
    metadata: String,

    /// Filename suffix between prefix and extension (used with --import)
    #[arg(long, value_name = "SUFFIX", default_value = "0")]
    suffix: String,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Handle --init
    if cli.init {
        let config = config::Config::default();
        let path = cli.config.as_deref();
        config.save(path)?;
        let save_path = match path {
            Some(p) => p.to_path_buf(),
            None => config::Config::config_path()?,
        };
        println!("Default config written to {}", save_path.display());
        return Ok(());
    }

    // Load config
    let mut config = config::Config::load(cli.config.as_deref())?;
    if let Some(ref outdir) = cli.outdir {
        config.outdir = outdir.clone();
    }

    // Handle --next-prefix
    if cli.next_prefix {
        let writer = pipeline::PngWriter::new(&config)?;
        let prefix = writer.unique_prefix()?;
        if cli.json {
            println!("{}", serde_json::json!({ "prefix": prefix }));
        } else {
            println!("{prefix}");
        }
        return Ok(());
    }

    // Handle --import
    if let Some(ref source) = cli.import {
        let writer = pipeline::PngWriter::new(&config)?;
        let prompt = cli.prompt.as_deref().unwrap_or_default();
        return import_image(&writer, source, prompt, &cli.metadata, &cli.suffix, cli.json);
    }

    if cli.paths.is_empty() {
        anyhow::bail!("No input files or directories specified. Use --help for usage.");
    }

    let images = pipeline::collect_pngs(&cli.paths);
    if images.is_empty() {
        anyhow::bail!("No PNG files found in the specified paths.");
    }
    log::debug!("Found {} PNG(s)", images.len());

    let mut results = Vec::new();
    let mut failed = 0;
    for image_path in &images {
        match png::retrieve_metadata(image_path) {
            Ok(md) => {
                if !cli.json {
                    print_metadata(image_path, &md)?;
                }
                results.push(serde_json::json!({
                    "path": image_path.display().to_string(),
                    "sd-metadata": md.sd_metadata,
                    "Dream": md.dream,
                }));
            }
            Err(e) => {
                log::error!("{e}");
                failed += 1;
            }
        }
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} file(s) could not be read", images.len());
    }
    Ok(())
}

/// Decode `source`, then save it under the next prefix with prompt metadata.
fn import_image(
    writer: &pipeline::PngWriter,
    source: &Path,
    prompt: &str,
    metadata: &str,
    suffix: &str,
    json: bool,
) -> Result<()> {
    let metadata: serde_json::Value =
        serde_json::from_str(metadata).context("--metadata is not valid JSON")?;
    let image = image::open(source)
        .with_context(|| format!("Failed to open image {}", source.display()))?;

    let prefix = writer.unique_prefix()?;
    let name = naming::output_filename(&prefix, suffix);
    let path = writer.save_image_and_prompt_to_png(&image, prompt, &metadata, &name)?;

    if json {
        println!("{}", serde_json::json!({ "path": path.display().to_string() }));
    } else {
        log::info!("Saved {}", path.display());
    }
    Ok(())
}

// ANSI color codes
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

/// Max width for the value column before wrapping.
const VAL_WIDTH: usize = 56;
/// Indent for continuation lines (tag column width + " : " + 2 leading spaces).
const INDENT: &str = "                 ";

/// Print the stored prompt and generation parameters for one file.
fn print_metadata(path: &Path, md: &png::DreamMetadata) -> Result<()> {
    println!();
    println!("{BOLD}File:{RESET} {}", path.display());
    println!("{DIM}{}{RESET}", "═".repeat(72));

    if md.dream.is_empty() {
        println!("  {DIM}(no Dream prompt){RESET}");
    } else {
        print_row(png::DREAM_KEY, &md.dream);
    }

    match md.sd_metadata.as_object() {
        Some(obj) if obj.is_empty() => println!("  {DIM}(no sd-metadata){RESET}"),
        _ => {
            println!("  {BOLD}{}{RESET}", png::SD_METADATA_KEY);
            println!("  {DIM}{}{RESET}", "─".repeat(70));
            let pretty = serde_json::to_string_pretty(&md.sd_metadata)?;
            for line in pretty.lines() {
                println!("  {line}");
            }
        }
    }
    println!();
    Ok(())
}

/// Print a single row in the metadata display table.
fn print_row(tag: &str, val: &str) {
    let tag_col = format!("{:<12}", tag);
    let lines = wrap_text(val, VAL_WIDTH);
    for (i, line) in lines.iter().enumerate() {
        if i == 0 {
            println!("  {tag_col} : {line}");
        } else {
            println!("  {INDENT}{line}");
        }
    }
}

/// Wrap a prompt into lines of at most `max_width` characters.
///
/// Breaks at whitespace. A token wider than a whole line (long paths, seeds
/// glued to flags) is split across lines instead of overflowing the column.
fn wrap_text(s: &str, max_width: usize) -> Vec<String> {
    let max_width = max_width.max(1);
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();
    let mut line_width = 0;

    for word in s.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();
        for piece in chars.chunks(max_width) {
            if line_width > 0 && line_width + 1 + piece.len() > max_width {
                lines.push(std::mem::take(&mut line));
                line_width = 0;
            }
            if line_width > 0 {
                line.push(' ');
                line_width += 1;
            }
            line.extend(piece);
            line_width += piece.len();
        }
    }

    if line_width > 0 {
        lines.push(line);
    }
    if lines.is_empty() {
        lines.push(s.to_string());
    }
    lines
}
