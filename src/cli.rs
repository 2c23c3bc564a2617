// ============================================================================
// canvas-engine CLI: headless batch painting via command-line arguments
// ============================================================================
//
// Usage examples:
//   canvas-engine --input photo.png --script strokes.json --output result.png
//   canvas-engine -i photo.jpg -o out.png                    (format inferred from output ext)
//   canvas-engine -i "*.jpg" --script invert.json --output-dir processed/ --format png
//   canvas-engine --new 640x480 --script sketch.json -o sketch.png
//
// Everything runs synchronously on the calling thread; only the filter passes
// inside the engine fan out over rayon.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Parser;

use canvas_engine::{CanvasEngine, EngineConfig};

use crate::io::{SaveFormat, encode_and_write, engine_to_image, load_into_engine};
use crate::script::{CanvasOp, parse_script, run_script};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// Headless raster canvas: replay brush, fill and filter scripts on images.
#[derive(Parser, Debug)]
#[command(
    name = "canvas-engine",
    about = "Headless raster canvas engine",
    long_about = "Replay JSON operation scripts (strokes, fills, filters, undo/redo) on\n\
                  image files and write the result. Reads anything the image crate\n\
                  decodes; writes PNG, JPEG, WEBP, BMP, TGA and TIFF.\n\n\
                  Example:\n  \
                  canvas-engine --input photo.png --script strokes.json --output result.png\n  \
                  canvas-engine --new 800x600 --script sketch.json -o sketch.png"
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "*.png", "shots/*.jpg").
    #[arg(short, long, num_args = 1.., required_unless_present = "new", conflicts_with = "new")]
    pub input: Vec<String>,

    /// Start from a blank transparent canvas of the given size instead of a file.
    #[arg(long, value_name = "WxH", value_parser = parse_size)]
    pub new: Option<(u32, u32)>,

    /// JSON operation script to replay on each image.
    /// If omitted, images are only loaded and re-saved (useful for format conversion).
    #[arg(short, long, value_name = "SCRIPT.json")]
    pub script: Option<PathBuf>,

    /// Output file path. Only valid for single-file input.
    /// For batch input use --output-dir instead.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing.
    /// Files are written here with the original stem and the target format's extension.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output format: png, jpeg, webp, bmp, tga, tiff.
    /// When omitted, the format is inferred from --output's extension, defaulting to png.
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// JPEG quality (1-100, default 90).
    #[arg(short, long, default_value_t = 90, value_name = "1-100")]
    pub quality: u8,

    /// Engine settings (history depth, memory cap, fill tolerance) as TOML.
    #[arg(short, long, value_name = "ENGINE.toml")]
    pub config: Option<PathBuf>,

    /// Write the session log here instead of the data directory.
    #[arg(long, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Print per-file timing and debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Parse `WIDTHxHEIGHT` (either `x` or `X`).
fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
    let w: u32 = w.trim().parse().map_err(|_| format!("bad width '{}'", w))?;
    let h: u32 = h.trim().parse().map_err(|_| format!("bad height '{}'", h))?;
    if w == 0 || h == 0 {
        return Err("canvas dimensions must be non-zero".to_string());
    }
    Ok((w, h))
}

/// Where a job's starting raster comes from.
enum Source {
    File(PathBuf),
    Blank(u32, u32),
}

impl Source {
    fn label(&self) -> String {
        match self {
            Source::File(p) => p.display().to_string(),
            Source::Blank(w, h) => format!("<new {}x{}>", w, h),
        }
    }
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs) -> ExitCode {
    match run_all(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// `Ok(false)` when at least one file failed; `Err` for setup problems that
/// stop the whole run.
fn run_all(args: &CliArgs) -> Result<bool> {
    let sources: Vec<Source> = match args.new {
        Some((w, h)) => vec![Source::Blank(w, h)],
        None => resolve_inputs(&args.input)
            .into_iter()
            .map(Source::File)
            .collect(),
    };
    if sources.is_empty() {
        bail!("no input files matched the given pattern(s)");
    }

    // Multiple inputs require --output-dir, not --output
    if sources.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        bail!(
            "{} input files given but --output only accepts a single file path; \
             use --output-dir for batch processing",
            sources.len()
        );
    }

    let format = parse_format(args.format.as_deref(), args.output.as_deref())?;

    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let ops: Vec<CanvasOp> = match &args.script {
        Some(path) => {
            let src = std::fs::read_to_string(path)
                .with_context(|| format!("could not read script '{}'", path.display()))?;
            parse_script(&src).with_context(|| format!("in script '{}'", path.display()))?
        }
        None => Vec::new(),
    };

    if let Some(dir) = &args.output_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("could not create output directory '{}'", dir.display()))?;
    }

    let total = sources.len();
    let multi = total > 1;
    let mut all_ok = true;

    for (idx, source) in sources.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, source.label());
        }
        let file_start = Instant::now();

        let result = build_output_path(
            source,
            args.output.as_deref(),
            args.output_dir.as_deref(),
            format,
        )
        .and_then(|out| {
            run_one(source, &out, &ops, &config, format, args.quality, args.verbose)?;
            Ok(out)
        });

        match result {
            Ok(out) => {
                log::info!("{} -> {}", source.label(), out.display());
                if args.verbose || multi {
                    println!(
                        "  → {} ({:.0}ms)",
                        out.display(),
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                log::error!("{}: {:#}", source.label(), e);
                all_ok = false;
            }
        }
    }

    Ok(all_ok)
}

// ============================================================================
// Per-file processing pipeline
// ============================================================================

fn run_one(
    source: &Source,
    output: &Path,
    ops: &[CanvasOp],
    config: &EngineConfig,
    format: SaveFormat,
    quality: u8,
    verbose: bool,
) -> Result<()> {
    // -- Step 1: Load ----------------------------------------------------
    let mut engine = match source {
        Source::File(path) => load_into_engine(path, config.clone())?,
        Source::Blank(w, h) => CanvasEngine::with_config(*w, *h, config.clone()),
    };

    // -- Step 2: Replay script (optional) --------------------------------
    if !ops.is_empty() {
        let report = run_script(&mut engine, ops);
        if verbose {
            println!(
                "  {} ops, {} pixels filled, {} undo/redo on empty history",
                report.applied, report.filled_pixels, report.empty_history
            );
        }
    }

    // -- Step 3: Save ----------------------------------------------------
    let image = engine_to_image(&engine)?;
    encode_and_write(&image, output, format, quality)
        .with_context(|| format!("could not write '{}'", output.display()))?;
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    log::warn!("pattern '{}' matched no files", pattern);
                }
            }
            Err(e) => {
                log::warn!("invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// Choose the [`SaveFormat`] from the `--format` string or infer it from the
/// output file extension. An unknown `--format` is an error; an unknown
/// extension falls back to PNG.
fn parse_format(format_arg: Option<&str>, output: Option<&Path>) -> Result<SaveFormat> {
    if let Some(f) = format_arg {
        return SaveFormat::from_name(f).with_context(|| format!("unsupported format '{}'", f));
    }

    let from_ext = output
        .and_then(|out| out.extension())
        .and_then(|e| e.to_str())
        .and_then(SaveFormat::from_name);
    Ok(from_ext.unwrap_or_default())
}

/// Compute the output path for one job.
///
/// Priority:
/// 1. `--output` (explicit path, used for single-file input)
/// 2. `--output-dir` (batch directory, derives filename from input stem)
/// 3. Fallback: same directory as input, same stem, new extension
///    (appends `_out` to stem if it would collide with the input path)
fn build_output_path(
    source: &Source,
    output: Option<&Path>,
    output_dir: Option<&Path>,
    format: SaveFormat,
) -> Result<PathBuf> {
    if let Some(out) = output {
        return Ok(out.to_path_buf());
    }

    let ext = format.extension();
    let input = match source {
        Source::File(path) => path.as_path(),
        Source::Blank(..) => {
            let dir = output_dir.unwrap_or(Path::new("."));
            return Ok(dir.join(format!("canvas.{}", ext)));
        }
    };
    let stem = input
        .file_stem()
        .with_context(|| format!("cannot derive an output name from '{}'", input.display()))?
        .to_string_lossy()
        .into_owned();

    if let Some(dir) = output_dir {
        return Ok(dir.join(format!("{}.{}", stem, ext)));
    }

    let parent = input.parent().unwrap_or(Path::new("."));
    let candidate = parent.join(format!("{}.{}", stem, ext));

    // Avoid silent overwrite of the input
    if candidate == input {
        Ok(parent.join(format!("{}_out.{}", stem, ext)))
    } else {
        Ok(candidate)
    }
}
